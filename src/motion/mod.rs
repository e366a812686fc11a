// src/motion/mod.rs - Motion core: IK solver, controller, input sampler

pub mod animation;
pub mod controller;
pub mod kinematics;
pub mod sampler;

pub use animation::{FinishReason, TickOutcome};
pub use controller::{Bounds, JogSteps, MotionController};
pub use kinematics::{Geometry, JointAngles, KinematicsError, solve};
pub use sampler::{JoystickSample, RateLimitedInputSampler};

use serde::Serialize;

/// Cartesian end-effector position in the robot base frame, millimeters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Position {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

/// Inclusive travel range for one axis. `min <= max` is enforced at the
/// configuration boundary.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisRange {
    pub min: f64,
    pub max: f64,
}

impl AxisRange {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.min, self.max)
    }
}

/// One of the three Cartesian axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    pub fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Axis::X => "x",
            Axis::Y => "y",
            Axis::Z => "z",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_is_idempotent() {
        let range = AxisRange::new(-270.0, 270.0);
        for v in [-1000.0, -270.0, -269.9, 0.0, 123.4, 270.0, 9999.0] {
            let once = range.clamp(v);
            assert_eq!(range.clamp(once), once);
            assert!(once >= range.min && once <= range.max);
        }
    }

    #[test]
    fn clamp_passes_through_in_range_values() {
        let range = AxisRange::new(350.0, 530.0);
        assert_eq!(range.clamp(432.0), 432.0);
        assert_eq!(range.clamp(349.0), 350.0);
        assert_eq!(range.clamp(531.0), 530.0);
    }
}
