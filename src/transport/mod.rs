// src/transport/mod.rs - Angle delivery to the robot controller
//
// The motion core only knows "send these three numbers" and
// "optionally read three numbers back"; everything network-shaped
// lives behind `LinkHandle`.

pub mod channel;
pub mod request;
pub mod wire;

use serde::Serialize;
use tokio::sync::{broadcast, mpsc, watch};

use crate::config::{RobotConfig, TransportMode};
use crate::motion::JointAngles;

/// Connection state of the robot link, surfaced to the operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelStatus {
    Uninitialized,
    Connecting,
    Open,
    Closing,
    Closed,
}

/// Handle owned by the arm task. Sending never blocks and never
/// assumes delivery succeeded.
#[derive(Debug, Clone)]
pub struct LinkHandle {
    mode: TransportMode,
    angles_tx: mpsc::Sender<JointAngles>,
    telemetry_rx: watch::Receiver<Option<JointAngles>>,
    status_rx: watch::Receiver<ChannelStatus>,
}

impl LinkHandle {
    /// One-shot update for a discrete action (slider commit, geometry
    /// edit, animation completion). Delivered in both modes.
    pub fn send(&self, angles: JointAngles) {
        if let Err(e) = self.angles_tx.try_send(angles) {
            // Backpressure or a dead link; the next tick resends anyway.
            tracing::debug!("dropping outbound angle frame: {e}");
        }
    }

    /// Per-tick update from a held joystick or a running animation.
    /// The persistent channel streams every accepted tick; request
    /// mode stays quiet until the next discrete action, so a held
    /// input never turns into a connection per frame.
    pub fn stream(&self, angles: JointAngles) {
        if self.mode == TransportMode::Request {
            return;
        }
        self.send(angles);
    }

    pub fn measured(&self) -> Option<JointAngles> {
        *self.telemetry_rx.borrow()
    }

    pub fn status(&self) -> ChannelStatus {
        *self.status_rx.borrow()
    }
}

/// Spawn the transport task for the configured mode and hand back the
/// arm-facing link handle.
pub fn spawn(robot: &RobotConfig, shutdown: broadcast::Receiver<()>) -> LinkHandle {
    let (angles_tx, angles_rx) = mpsc::channel(32);
    let (telemetry_tx, telemetry_rx) = watch::channel(None);
    let (status_tx, status_rx) = watch::channel(ChannelStatus::Uninitialized);

    let address = robot.address.clone();
    match robot.mode {
        TransportMode::Channel => {
            tokio::spawn(channel::run(
                address,
                angles_rx,
                telemetry_tx,
                status_tx,
                shutdown,
            ));
        }
        TransportMode::Request => {
            tokio::spawn(request::run(address, angles_rx, shutdown));
        }
    }

    LinkHandle {
        mode: robot.mode,
        angles_tx,
        telemetry_rx,
        status_rx,
    }
}
