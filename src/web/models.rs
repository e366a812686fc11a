//! Data models for API requests and responses.

use serde::{Deserialize, Serialize};

use crate::motion::{JointAngles, Position};
use crate::transport::ChannelStatus;

/// Snapshot of the arm for the operator display. Angle fields are
/// `null` rather than absent when unknown, so the display can show
/// them as empty instead of crashing.
#[derive(Debug, Clone, Serialize)]
pub struct StatusResponse {
    pub name: String,
    pub position: Position,
    /// Solved angles for the current position; `null` while the pose
    /// is unreachable at the current geometry.
    pub angles: Option<JointAngles>,
    /// Measured angles reported by the robot; `null` when telemetry is
    /// absent or malformed.
    pub measured: Option<JointAngles>,
    pub link: ChannelStatus,
    pub speed: u8,
    /// `"trajectory"`, `"homing"`, or `null` when idle.
    pub animation: Option<&'static str>,
}

/// One normalized joystick sample, each component in [-1, 1].
#[derive(Debug, Deserialize)]
pub struct JogRequest {
    pub x: f64,
    pub y: f64,
}

/// Absolute z position in millimeters (clamped server-side).
#[derive(Debug, Deserialize)]
pub struct ZRequest {
    pub z: f64,
}

/// Start a preset trajectory on the named axes. Ranges default to the
/// configured envelope; speed defaults to the current selector.
#[derive(Debug, Deserialize)]
pub struct TrajectoryRequest {
    pub axes: Vec<String>,
    #[serde(default)]
    pub speed: Option<u8>,
}

#[derive(Debug, Deserialize)]
pub struct SpeedRequest {
    pub speed: u8,
}

/// Operator-editable arm dimensions, millimeters.
#[derive(Debug, Deserialize)]
pub struct GeometryRequest {
    pub end_effector_radius: f64,
    pub mid_joint_length: f64,
    pub base_arm_length: f64,
    pub base_radius: f64,
}
