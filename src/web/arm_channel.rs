//! Communication channel messages between the web handlers and the
//! arm task.

use tokio::sync::oneshot;

use crate::motion::{Axis, Geometry};
use crate::web::models::StatusResponse;

/// A request sent from a web handler to the arm task. Every variant
/// carries a oneshot for the reply.
#[derive(Debug)]
pub enum ArmRequest {
    /// Snapshot of position, angles, link state.
    GetStatus {
        respond_to: oneshot::Sender<StatusResponse>,
    },
    /// Joystick pressed: start the sampler tick.
    JogStart { respond_to: oneshot::Sender<()> },
    /// A joystick move event (already range-checked by the handler).
    Jog {
        x: f64,
        y: f64,
        respond_to: oneshot::Sender<()>,
    },
    /// Joystick released: stop the sampler and discard the sample.
    JogStop { respond_to: oneshot::Sender<()> },
    /// Absolute z from the slider.
    SetZ {
        z: f64,
        respond_to: oneshot::Sender<()>,
    },
    /// Ease back to the configured home position.
    StartHoming { respond_to: oneshot::Sender<()> },
    /// Bounded ping-pong oscillation on the selected axes.
    StartTrajectory {
        axes: Vec<Axis>,
        speed: Option<u8>,
        respond_to: oneshot::Sender<Result<(), String>>,
    },
    /// Stop any running animation.
    Cancel { respond_to: oneshot::Sender<()> },
    /// Speed selector, [1, 10].
    SetSpeed {
        speed: u8,
        respond_to: oneshot::Sender<Result<(), String>>,
    },
    /// Replace the arm geometry. Rejected while an animation runs.
    SetGeometry {
        geometry: Geometry,
        respond_to: oneshot::Sender<Result<(), String>>,
    },
}
