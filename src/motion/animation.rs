//! Autonomous animation state: bounded ping-pong trajectories and
//! linear homing. The state machine is driven by an injected clock
//! (`tick(now)` on the controller) so it can be unit-tested without
//! real time passing and is independent of any scheduling primitive.

use std::time::{Duration, Instant};

use crate::motion::controller::Bounds;
use crate::motion::{Axis, AxisRange, Position};

/// Hard wall-clock budget for a preset trajectory, measured from its
/// first tick. The trajectory self-cancels once this elapses.
pub const TRAJECTORY_BUDGET: Duration = Duration::from_millis(10_000);

/// An axis is considered home once it is within this distance, at which
/// point it snaps exactly to the home value.
pub const HOMING_EPSILON: f64 = 1.0;

/// Result of one controller tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// No animation is running.
    Idle,
    /// An animation is running but the minimum wait interval has not
    /// elapsed; no state was mutated.
    Waiting,
    /// One step was applied; the position changed.
    Moved,
    /// The animation ended on this tick.
    Finished(FinishReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishReason {
    /// Homing reached the target on every axis.
    Converged,
    /// A trajectory exhausted its wall-clock budget.
    TimedOut,
}

#[derive(Debug, Clone)]
pub(crate) enum AnimationKind {
    Trajectory { ranges: [Option<AxisRange>; 3] },
    Homing { target: Position },
}

pub(crate) enum ClockStep {
    Waiting,
    TimedOut,
    Apply,
}

/// Mutable state of the single active animation. At most one instance
/// exists at a time; starting a new animation replaces it.
#[derive(Debug, Clone)]
pub(crate) struct AnimationState {
    kind: AnimationKind,
    /// Ping-pong direction sign per axis; homing recomputes direction
    /// from the current position each tick instead.
    directions: [f64; 3],
    /// Minimum wait between applied steps: base interval / speed.
    min_wait: Duration,
    /// Set on the first tick; the trajectory timeout is measured from
    /// here regardless of how many ticks were throttled.
    started: Option<Instant>,
    /// Advanced only when a step is actually applied.
    last_tick: Option<Instant>,
}

impl AnimationState {
    pub(crate) fn trajectory(
        axes: &[Axis],
        ranges: Bounds,
        base_interval: Duration,
        speed: u8,
    ) -> Self {
        let mut selected = [None; 3];
        for axis in axes {
            selected[axis.index()] = Some(ranges.range(*axis));
        }
        Self {
            kind: AnimationKind::Trajectory { ranges: selected },
            directions: [1.0; 3],
            min_wait: wait_interval(base_interval, speed),
            started: None,
            last_tick: None,
        }
    }

    pub(crate) fn homing(target: Position, base_interval: Duration, speed: u8) -> Self {
        Self {
            kind: AnimationKind::Homing { target },
            directions: [1.0; 3],
            min_wait: wait_interval(base_interval, speed),
            started: None,
            last_tick: None,
        }
    }

    pub(crate) fn is_homing(&self) -> bool {
        matches!(self.kind, AnimationKind::Homing { .. })
    }

    /// Advance the animation clock. Ticks arriving before `min_wait`
    /// reschedule without mutating state or advancing `last_tick`, but
    /// the trajectory timeout still runs from the first tick.
    pub(crate) fn advance_clock(&mut self, now: Instant) -> ClockStep {
        let started = *self.started.get_or_insert(now);
        if matches!(self.kind, AnimationKind::Trajectory { .. })
            && now.duration_since(started) >= TRAJECTORY_BUDGET
        {
            return ClockStep::TimedOut;
        }
        if let Some(last) = self.last_tick {
            if now.duration_since(last) < self.min_wait {
                return ClockStep::Waiting;
            }
        }
        self.last_tick = Some(now);
        ClockStep::Apply
    }

    /// Apply one step to the position. Returns true when the animation
    /// has converged (homing only; trajectories never converge).
    pub(crate) fn apply_step(&mut self, position: &mut Position, bounds: &Bounds) -> bool {
        match &self.kind {
            AnimationKind::Trajectory { ranges } => {
                for axis in Axis::ALL {
                    let i = axis.index();
                    let Some(range) = ranges[i] else { continue };
                    let value = axis_mut(position, axis);
                    let next = range.clamp(*value + self.directions[i]);
                    // bounce at either end of the range
                    if next >= range.max {
                        self.directions[i] = -1.0;
                    } else if next <= range.min {
                        self.directions[i] = 1.0;
                    }
                    *value = next;
                }
                false
            }
            AnimationKind::Homing { target } => {
                let target = *target;
                for axis in Axis::ALL {
                    let home = axis_value(target, axis);
                    let range = bounds.range(axis);
                    let value = axis_mut(position, axis);
                    if (*value - home).abs() <= HOMING_EPSILON {
                        *value = home;
                        continue;
                    }
                    let direction = if *value > home { -1.0 } else { 1.0 };
                    let next = range.clamp(*value + direction);
                    *value = if (next - home).abs() <= HOMING_EPSILON {
                        home
                    } else {
                        next
                    };
                }
                *position == target
            }
        }
    }
}

fn wait_interval(base_interval: Duration, speed: u8) -> Duration {
    // Higher speed means more frequent updates, not bigger steps.
    base_interval / u32::from(speed.clamp(1, 10))
}

fn axis_value(position: Position, axis: Axis) -> f64 {
    match axis {
        Axis::X => position.x,
        Axis::Y => position.y,
        Axis::Z => position.z,
    }
}

fn axis_mut(position: &mut Position, axis: Axis) -> &mut f64 {
    match axis {
        Axis::X => &mut position.x,
        Axis::Y => &mut position.y,
        Axis::Z => &mut position.z,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wait_interval_scales_with_speed() {
        let base = Duration::from_millis(16);
        assert_eq!(wait_interval(base, 1), base);
        assert_eq!(wait_interval(base, 4), base / 4);
        // out-of-range speeds are clamped into [1, 10]
        assert_eq!(wait_interval(base, 0), base);
        assert_eq!(wait_interval(base, 200), base / 10);
    }
}
