// src/motion/controller.rs - Owns the authoritative end-effector position

use std::time::{Duration, Instant};

use thiserror::Error;

use crate::motion::animation::{AnimationState, TickOutcome};
use crate::motion::{Axis, AxisRange, Geometry, Position};

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum GeometryUpdateError {
    #[error("all geometry dimensions must be strictly positive")]
    InvalidDimensions,
    /// No defined semantics for a geometry change mid-trajectory, so
    /// edits are refused until the animation ends.
    #[error("cannot edit geometry while an animation is running")]
    AnimationRunning,
}

/// Reachable travel envelope, one range per axis. The position is
/// clamped into this box after every mutation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub x: AxisRange,
    pub y: AxisRange,
    pub z: AxisRange,
}

impl Bounds {
    pub fn range(&self, axis: Axis) -> AxisRange {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
            Axis::Z => self.z,
        }
    }

    pub fn clamp(&self, position: Position) -> Position {
        Position {
            x: self.x.clamp(position.x),
            y: self.y.clamp(position.y),
            z: self.z.clamp(position.z),
        }
    }
}

/// Jog step sizes per joystick axis, millimeters per sampler tick at
/// unit deflection and speed 1.
#[derive(Debug, Clone, Copy)]
pub struct JogSteps {
    pub x: f64,
    pub y: f64,
}

/// Integrates input into position updates, clamps to the envelope, and
/// runs the single active animation (trajectory or homing).
///
/// All mutation happens on one logical thread; the animation tick takes
/// an explicit `now` so tests can drive it without real time passing.
pub struct MotionController {
    position: Position,
    bounds: Bounds,
    geometry: Geometry,
    home: Position,
    jog_steps: JogSteps,
    speed: u8,
    base_interval: Duration,
    animation: Option<AnimationState>,
}

impl MotionController {
    pub fn new(
        home: Position,
        bounds: Bounds,
        geometry: Geometry,
        jog_steps: JogSteps,
        base_interval: Duration,
        speed: u8,
    ) -> Self {
        let home = bounds.clamp(home);
        Self {
            position: home,
            bounds,
            geometry,
            home,
            jog_steps,
            speed: speed.clamp(1, 10),
            base_interval,
            animation: None,
        }
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    pub fn geometry(&self) -> Geometry {
        self.geometry
    }

    /// Replace the arm geometry. The position is re-clamped right away
    /// so it never sits outside the envelope implied by a new setup.
    pub fn set_geometry(&mut self, geometry: Geometry) -> Result<(), GeometryUpdateError> {
        if !geometry.is_valid() {
            return Err(GeometryUpdateError::InvalidDimensions);
        }
        if self.animation.is_some() {
            return Err(GeometryUpdateError::AnimationRunning);
        }
        self.geometry = geometry;
        self.position = self.bounds.clamp(self.position);
        Ok(())
    }

    pub fn home(&self) -> Position {
        self.home
    }

    pub fn speed(&self) -> u8 {
        self.speed
    }

    pub fn set_speed(&mut self, speed: u8) {
        self.speed = speed.clamp(1, 10);
    }

    /// Restore a previously observed position, e.g. after the solver
    /// rejected the mutated one as unreachable.
    pub fn restore(&mut self, position: Position) {
        self.position = self.bounds.clamp(position);
    }

    /// Integrate one joystick sample. Components are normalized to
    /// [-1, 1]; a zero component means no motion on that axis. Updates
    /// are rounded to whole millimeters and clamped to the envelope.
    pub fn apply_velocity_sample(&mut self, dx: f64, dy: f64) {
        let scale = f64::from(self.speed);
        if dx != 0.0 {
            let next = (self.position.x + self.jog_steps.x * dx * scale).round();
            self.position.x = self.bounds.x.clamp(next);
        }
        if dy != 0.0 {
            let next = (self.position.y + self.jog_steps.y * dy * scale).round();
            self.position.y = self.bounds.y.clamp(next);
        }
    }

    /// Absolute z set from the slider, clamped to the z range.
    pub fn set_z(&mut self, value: f64) {
        self.position.z = self.bounds.z.clamp(value);
    }

    /// Start a bounded ping-pong trajectory on the selected axes.
    /// Cancels any running animation first.
    pub fn start_trajectory(&mut self, axes: &[Axis], ranges: Bounds, speed: u8) {
        self.cancel();
        self.animation = Some(AnimationState::trajectory(
            axes,
            ranges,
            self.base_interval,
            speed,
        ));
    }

    /// Start easing back to the home position, one unit per tick per
    /// axis. Cancels any running animation first.
    pub fn start_homing(&mut self) {
        self.cancel();
        self.animation = Some(AnimationState::homing(
            self.home,
            self.base_interval,
            self.speed,
        ));
    }

    /// Stop any in-flight animation immediately. Idempotent.
    pub fn cancel(&mut self) {
        self.animation = None;
    }

    pub fn is_animating(&self) -> bool {
        self.animation.is_some()
    }

    /// Name of the running animation for status reporting.
    pub fn animation_kind(&self) -> Option<&'static str> {
        self.animation.as_ref().map(|a| {
            if a.is_homing() {
                "homing"
            } else {
                "trajectory"
            }
        })
    }

    /// Drive the animation state machine one tick. The caller supplies
    /// the current instant; ticks arriving before the minimum wait
    /// interval return `Waiting` without mutating the position.
    pub fn tick(&mut self, now: Instant) -> TickOutcome {
        use crate::motion::animation::ClockStep;

        let Some(animation) = self.animation.as_mut() else {
            return TickOutcome::Idle;
        };
        match animation.advance_clock(now) {
            ClockStep::Waiting => TickOutcome::Waiting,
            ClockStep::TimedOut => {
                self.animation = None;
                TickOutcome::Finished(crate::motion::FinishReason::TimedOut)
            }
            ClockStep::Apply => {
                let converged = animation.apply_step(&mut self.position, &self.bounds);
                if converged {
                    self.animation = None;
                    TickOutcome::Finished(crate::motion::FinishReason::Converged)
                } else {
                    TickOutcome::Moved
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::motion::FinishReason;
    use crate::motion::animation::TRAJECTORY_BUDGET;

    fn test_bounds() -> Bounds {
        Bounds {
            x: AxisRange::new(-270.0, 270.0),
            y: AxisRange::new(-270.0, 270.0),
            z: AxisRange::new(350.0, 530.0),
        }
    }

    fn test_geometry() -> Geometry {
        Geometry {
            end_effector_radius: 45.0,
            mid_joint_length: 100.0,
            base_arm_length: 446.0,
            base_radius: 52.5,
        }
    }

    fn test_controller() -> MotionController {
        MotionController::new(
            Position::new(0.0, 0.0, 432.0),
            test_bounds(),
            test_geometry(),
            JogSteps { x: 10.0, y: 10.0 },
            Duration::from_millis(16),
            1,
        )
    }

    #[test]
    fn zero_samples_leave_position_unchanged() {
        let mut controller = test_controller();
        let start = controller.position();
        for _ in 0..100 {
            controller.apply_velocity_sample(0.0, 0.0);
        }
        assert_eq!(controller.position(), start);
    }

    #[test]
    fn sustained_unit_sample_stops_exactly_at_bound() {
        let mut controller = test_controller();
        let mut previous = controller.position().x;
        for _ in 0..100 {
            controller.apply_velocity_sample(1.0, 0.0);
            let current = controller.position().x;
            assert!(current >= previous, "x must move monotonically");
            assert!(current <= 270.0, "x must never overshoot the bound");
            previous = current;
        }
        assert_eq!(controller.position().x, 270.0);
        // y was zero the whole time, so it never moved
        assert_eq!(controller.position().y, 0.0);
    }

    #[test]
    fn slider_z_is_clamped_before_anyone_reads_it() {
        let mut controller = test_controller();
        controller.set_z(9999.0);
        assert_eq!(controller.position().z, 530.0);
        controller.set_z(-5.0);
        assert_eq!(controller.position().z, 350.0);
        controller.set_z(400.0);
        assert_eq!(controller.position().z, 400.0);
    }

    #[test]
    fn speed_is_clamped_into_selector_range() {
        let mut controller = test_controller();
        controller.set_speed(0);
        assert_eq!(controller.speed(), 1);
        controller.set_speed(255);
        assert_eq!(controller.speed(), 10);
        controller.set_speed(7);
        assert_eq!(controller.speed(), 7);
    }

    #[test]
    fn homing_converges_within_bounded_ticks_and_snaps_exactly() {
        let mut controller = test_controller();
        controller.restore(Position::new(250.0, -250.0, 530.0));
        controller.start_homing();

        let mut now = Instant::now();
        let mut applied = 0u32;
        loop {
            now += Duration::from_millis(16);
            match controller.tick(now) {
                TickOutcome::Moved => applied += 1,
                TickOutcome::Finished(FinishReason::Converged) => {
                    applied += 1;
                    break;
                }
                other => panic!("unexpected outcome {other:?}"),
            }
            assert!(applied <= 250, "homing must be bounded by the largest axis delta");
        }
        assert_eq!(controller.position(), Position::new(0.0, 0.0, 432.0));
        assert!(!controller.is_animating());
    }

    #[test]
    fn trajectory_bounces_inside_range_and_times_out() {
        let mut controller = test_controller();
        let ranges = controller.bounds();
        controller.start_trajectory(&[Axis::X], ranges, 10);

        let start = Instant::now();
        let mut now = start;
        assert_eq!(controller.tick(now), TickOutcome::Moved);
        assert_eq!(controller.position().x, 1.0);

        // throttled ticks do not move the position but the timeout
        // clock keeps running from the first tick
        now += Duration::from_micros(100);
        assert_eq!(controller.tick(now), TickOutcome::Waiting);
        assert_eq!(controller.position().x, 1.0);

        now = start + TRAJECTORY_BUDGET;
        assert_eq!(
            controller.tick(now),
            TickOutcome::Finished(FinishReason::TimedOut)
        );
        // position stays wherever the trajectory left it
        assert_eq!(controller.position().x, 1.0);
        assert_eq!(controller.tick(now), TickOutcome::Idle);
    }

    #[test]
    fn trajectory_reverses_direction_at_range_edges() {
        let mut controller = test_controller();
        let mut ranges = controller.bounds();
        ranges.x = AxisRange::new(-2.0, 2.0);
        controller.start_trajectory(&[Axis::X], ranges, 1);

        let mut now = Instant::now();
        let mut seen = Vec::new();
        for _ in 0..8 {
            now += Duration::from_millis(16);
            assert_eq!(controller.tick(now), TickOutcome::Moved);
            seen.push(controller.position().x);
        }
        // 0 -> 1 -> 2 (bounce) -> 1 -> 0 -> -1 -> -2 (bounce) -> -1 -> 0
        assert_eq!(seen, vec![1.0, 2.0, 1.0, 0.0, -1.0, -2.0, -1.0, 0.0]);
    }

    #[test]
    fn geometry_edits_are_validated_and_blocked_while_animating() {
        let mut controller = test_controller();
        let mut geometry = test_geometry();

        geometry.base_radius = -1.0;
        assert_eq!(
            controller.set_geometry(geometry),
            Err(GeometryUpdateError::InvalidDimensions)
        );

        geometry.base_radius = 60.0;
        controller.start_homing();
        assert_eq!(
            controller.set_geometry(geometry),
            Err(GeometryUpdateError::AnimationRunning)
        );

        controller.cancel();
        assert_eq!(controller.set_geometry(geometry), Ok(()));
        assert_eq!(controller.geometry().base_radius, 60.0);
    }

    #[test]
    fn starting_a_new_animation_replaces_the_running_one() {
        let mut controller = test_controller();
        controller.start_trajectory(&[Axis::Y], controller.bounds(), 1);
        assert_eq!(controller.animation_kind(), Some("trajectory"));
        controller.start_homing();
        assert_eq!(controller.animation_kind(), Some("homing"));
        controller.cancel();
        controller.cancel();
        assert_eq!(controller.animation_kind(), None);
        assert_eq!(controller.tick(Instant::now()), TickOutcome::Idle);
    }
}
