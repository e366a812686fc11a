//! Defines the Axum API routes and handlers.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, post, put},
};
use tokio::sync::{mpsc::Sender, oneshot};

use crate::motion::{Axis, Geometry, JoystickSample};
use crate::web::arm_channel::ArmRequest;
use crate::web::models::{
    GeometryRequest, JogRequest, SpeedRequest, StatusResponse, TrajectoryRequest, ZRequest,
};

pub type AppState = Sender<ArmRequest>;

/// Creates the Axum router with all the API endpoints.
pub fn create_router(arm_tx: AppState) -> Router {
    Router::new()
        .route("/api/v1/status", get(get_status))
        .route("/api/v1/jog/start", post(jog_start))
        .route("/api/v1/jog", post(jog))
        .route("/api/v1/jog/stop", post(jog_stop))
        .route("/api/v1/z", post(set_z))
        .route("/api/v1/home", post(start_homing))
        .route("/api/v1/trajectory", post(start_trajectory))
        .route("/api/v1/cancel", post(cancel))
        .route("/api/v1/speed", put(set_speed))
        .route("/api/v1/geometry", put(set_geometry))
        .with_state(arm_tx)
}

/// Send one request to the arm task and wait for its reply.
async fn ask<T>(
    arm_tx: &AppState,
    make: impl FnOnce(oneshot::Sender<T>) -> ArmRequest,
) -> Result<T, StatusCode> {
    let (resp_tx, resp_rx) = oneshot::channel();
    if arm_tx.send(make(resp_tx)).await.is_err() {
        return Err(StatusCode::INTERNAL_SERVER_ERROR);
    }
    resp_rx.await.map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
}

async fn get_status(
    State(arm_tx): State<AppState>,
) -> Result<Json<StatusResponse>, StatusCode> {
    let status = ask(&arm_tx, |respond_to| ArmRequest::GetStatus { respond_to }).await?;
    Ok(Json(status))
}

async fn jog_start(State(arm_tx): State<AppState>) -> Result<StatusCode, StatusCode> {
    ask(&arm_tx, |respond_to| ArmRequest::JogStart { respond_to }).await?;
    Ok(StatusCode::OK)
}

async fn jog(
    State(arm_tx): State<AppState>,
    Json(payload): Json<JogRequest>,
) -> Result<StatusCode, StatusCode> {
    let sample = JoystickSample {
        x: payload.x,
        y: payload.y,
    };
    if !sample.in_range() {
        return Err(StatusCode::BAD_REQUEST);
    }
    ask(&arm_tx, |respond_to| ArmRequest::Jog {
        x: payload.x,
        y: payload.y,
        respond_to,
    })
    .await?;
    Ok(StatusCode::OK)
}

async fn jog_stop(State(arm_tx): State<AppState>) -> Result<StatusCode, StatusCode> {
    ask(&arm_tx, |respond_to| ArmRequest::JogStop { respond_to }).await?;
    Ok(StatusCode::OK)
}

async fn set_z(
    State(arm_tx): State<AppState>,
    Json(payload): Json<ZRequest>,
) -> Result<StatusCode, StatusCode> {
    if !payload.z.is_finite() {
        return Err(StatusCode::BAD_REQUEST);
    }
    ask(&arm_tx, |respond_to| ArmRequest::SetZ {
        z: payload.z,
        respond_to,
    })
    .await?;
    Ok(StatusCode::OK)
}

async fn start_homing(State(arm_tx): State<AppState>) -> Result<StatusCode, StatusCode> {
    ask(&arm_tx, |respond_to| ArmRequest::StartHoming { respond_to }).await?;
    Ok(StatusCode::OK)
}

async fn start_trajectory(
    State(arm_tx): State<AppState>,
    Json(payload): Json<TrajectoryRequest>,
) -> Result<StatusCode, StatusCode> {
    if payload.axes.is_empty() {
        return Err(StatusCode::UNPROCESSABLE_ENTITY);
    }
    let mut axes = Vec::with_capacity(payload.axes.len());
    for name in &payload.axes {
        axes.push(parse_axis(name).ok_or(StatusCode::UNPROCESSABLE_ENTITY)?);
    }
    let result = ask(&arm_tx, |respond_to| ArmRequest::StartTrajectory {
        axes,
        speed: payload.speed,
        respond_to,
    })
    .await?;
    match result {
        Ok(()) => Ok(StatusCode::OK),
        Err(_) => Err(StatusCode::UNPROCESSABLE_ENTITY),
    }
}

async fn cancel(State(arm_tx): State<AppState>) -> Result<StatusCode, StatusCode> {
    ask(&arm_tx, |respond_to| ArmRequest::Cancel { respond_to }).await?;
    Ok(StatusCode::OK)
}

async fn set_speed(
    State(arm_tx): State<AppState>,
    Json(payload): Json<SpeedRequest>,
) -> Result<StatusCode, StatusCode> {
    let result = ask(&arm_tx, |respond_to| ArmRequest::SetSpeed {
        speed: payload.speed,
        respond_to,
    })
    .await?;
    match result {
        Ok(()) => Ok(StatusCode::OK),
        Err(_) => Err(StatusCode::UNPROCESSABLE_ENTITY),
    }
}

async fn set_geometry(
    State(arm_tx): State<AppState>,
    Json(payload): Json<GeometryRequest>,
) -> Result<StatusCode, StatusCode> {
    let geometry = Geometry {
        end_effector_radius: payload.end_effector_radius,
        mid_joint_length: payload.mid_joint_length,
        base_arm_length: payload.base_arm_length,
        base_radius: payload.base_radius,
    };
    let result = ask(&arm_tx, |respond_to| ArmRequest::SetGeometry {
        geometry,
        respond_to,
    })
    .await?;
    match result {
        Ok(()) => Ok(StatusCode::OK),
        Err(_) => Err(StatusCode::UNPROCESSABLE_ENTITY),
    }
}

fn parse_axis(name: &str) -> Option<Axis> {
    match name {
        "x" => Some(Axis::X),
        "y" => Some(Axis::Y),
        "z" => Some(Axis::Z),
        _ => None,
    }
}
