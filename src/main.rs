// src/main.rs - Console host entry point

mod arm;
mod config;
mod motion;
mod transport;
mod web;

use arm::Arm;
use clap::Parser;
use config::Config;
use std::path::PathBuf;
use tokio::sync::{broadcast, mpsc};
use tokio::task::LocalSet;
use web::arm_channel::ArmRequest;

#[derive(Parser)]
#[command(name = "delta-host", about = "Operator console host for a delta parallel arm")]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(default_value = "arm.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync + 'static>> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let args = Args::parse();
    tracing::info!("loading configuration from {}", args.config.display());
    let config = Config::load(&args.config).map_err(|e| {
        tracing::error!("failed to load config from '{}': {e}", args.config.display());
        Box::new(e) as Box<dyn std::error::Error + Send + Sync + 'static>
    })?;

    tracing::info!(
        "arm: {} (r={}, l={}, L={}, R={})",
        config.arm.name,
        config.geometry.end_effector_radius,
        config.geometry.mid_joint_length,
        config.geometry.base_arm_length,
        config.geometry.base_radius,
    );
    tracing::info!("robot controller: {} ({:?} mode)", config.robot.address, config.robot.mode);

    let (shutdown_tx, _) = broadcast::channel(1);
    let link = transport::spawn(&config.robot, shutdown_tx.subscribe());

    let arm = Arm::new(&config, link).map_err(|e| {
        tracing::error!("failed to initialize arm: {e}");
        Box::new(e) as Box<dyn std::error::Error + Send + Sync + 'static>
    })?;

    // Channel between the Axum handlers and the arm task.
    let (arm_tx, arm_rx) = mpsc::channel::<ArmRequest>(16);

    let local = LocalSet::new();
    local.spawn_local(arm.run(arm_rx));

    let app = web::api::create_router(arm_tx);
    let listener = tokio::net::TcpListener::bind(&config.web.bind_address).await?;
    tracing::info!("web API listening on http://{}", listener.local_addr()?);
    local.spawn_local(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!("web server error: {e}");
        }
    });

    tokio::select! {
        _ = local => {}
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("shutting down");
            let _ = shutdown_tx.send(());
        }
    }

    Ok(())
}
