// src/arm.rs - Arm task: owns the motion core and the robot link

use std::time::Instant;

use thiserror::Error;
use tokio::sync::mpsc;

use crate::config::{Config, ConfigError};
use crate::motion::{
    self, Axis, FinishReason, Geometry, JointAngles, KinematicsError, MotionController, Position,
    RateLimitedInputSampler, TickOutcome,
};
use crate::transport::LinkHandle;
use crate::web::arm_channel::ArmRequest;
use crate::web::models::StatusResponse;

#[derive(Debug, Error)]
pub enum ArmError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("kinematics error: {0}")]
    Kinematics(#[from] KinematicsError),
}

/// The arm task. Everything here runs on one logical thread: the
/// request handler, the sampler tick, and the animation tick all
/// mutate state from the same select loop, so no locks are needed.
pub struct Arm {
    name: String,
    controller: MotionController,
    sampler: RateLimitedInputSampler,
    link: LinkHandle,
    /// Last successfully solved angles; `None` while unreachable.
    angles: Option<JointAngles>,
    sampler_period: std::time::Duration,
    frame_interval: std::time::Duration,
}

impl Arm {
    pub fn new(config: &Config, link: LinkHandle) -> Result<Self, ArmError> {
        config.validate()?;

        let controller = MotionController::new(
            config.motion.home(),
            config.envelope.to_bounds(),
            config.geometry.to_geometry(),
            config.motion.jog_steps(),
            config.motion.frame_interval(),
            config.motion.speed,
        );
        // the home pose must solve, or the configuration is unusable
        let angles = motion::solve(controller.position(), &controller.geometry())?;

        Ok(Self {
            name: config.arm.name.clone(),
            controller,
            sampler: RateLimitedInputSampler::new(),
            link,
            angles: Some(angles),
            sampler_period: config.motion.sampler_period(),
            frame_interval: config.motion.frame_interval(),
        })
    }

    /// Run the arm task until the request channel closes.
    pub async fn run(mut self, mut requests: mpsc::Receiver<ArmRequest>) {
        let mut sampler_tick = tokio::time::interval(self.sampler_period);
        sampler_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        let mut frame_tick = tokio::time::interval(self.frame_interval);
        frame_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        // announce the initial pose so the robot starts in sync
        if let Some(angles) = self.angles {
            self.link.send(angles);
        }

        loop {
            tokio::select! {
                maybe = requests.recv() => {
                    match maybe {
                        Some(request) => self.handle_request(request),
                        None => {
                            tracing::info!("arm request channel closed, stopping");
                            break;
                        }
                    }
                }
                _ = sampler_tick.tick() => self.on_sampler_tick(),
                _ = frame_tick.tick() => self.on_frame_tick(Instant::now()),
            }
        }
    }

    /// One fixed-cadence sampler tick: consume the latest joystick
    /// sample (possibly a redelivered stale one) and integrate it.
    fn on_sampler_tick(&mut self) {
        let Some(sample) = self.sampler.poll() else {
            return;
        };
        let previous = self.controller.position();
        self.controller.apply_velocity_sample(sample.x, sample.y);
        if self.controller.position() != previous {
            if let Some(angles) = self.solve_and_publish(previous) {
                self.link.stream(angles);
            }
        }
    }

    /// One animation frame tick.
    fn on_frame_tick(&mut self, now: Instant) {
        let previous = self.controller.position();
        match self.controller.tick(now) {
            TickOutcome::Idle | TickOutcome::Waiting => {}
            TickOutcome::Moved => {
                if let Some(angles) = self.solve_and_publish(previous) {
                    self.link.stream(angles);
                }
            }
            TickOutcome::Finished(FinishReason::Converged) => {
                // the final homing step snapped exactly to home; completion
                // is a discrete action, so it goes out in both modes
                if let Some(angles) = self.solve_and_publish(previous) {
                    self.link.send(angles);
                }
                tracing::info!("homing converged at {:?}", self.controller.position());
            }
            TickOutcome::Finished(FinishReason::TimedOut) => {
                tracing::info!(
                    "trajectory timed out, holding at {:?}",
                    self.controller.position()
                );
                // commit the end pose for the request transport, which
                // stayed quiet during the streamed trajectory steps
                if let Some(angles) = self.angles {
                    self.link.send(angles);
                }
            }
        }
    }

    /// Re-solve after a position mutation. On success the angles are
    /// cached and handed back for the caller to transmit at the right
    /// cadence; an unreachable pose restores `previous` and yields
    /// nothing for this tick.
    fn solve_and_publish(&mut self, previous: Position) -> Option<JointAngles> {
        match motion::solve(self.controller.position(), &self.controller.geometry()) {
            Ok(angles) => {
                self.angles = Some(angles);
                Some(angles)
            }
            Err(e) => {
                tracing::debug!(
                    "pose {:?} rejected ({e}), keeping previous position",
                    self.controller.position()
                );
                self.controller.restore(previous);
                None
            }
        }
    }

    fn handle_request(&mut self, request: ArmRequest) {
        match request {
            ArmRequest::GetStatus { respond_to } => {
                let _ = respond_to.send(self.status());
            }
            ArmRequest::JogStart { respond_to } => {
                self.sampler.begin();
                let _ = respond_to.send(());
            }
            ArmRequest::Jog { x, y, respond_to } => {
                self.sampler.update(motion::JoystickSample { x, y });
                let _ = respond_to.send(());
            }
            ArmRequest::JogStop { respond_to } => {
                self.sampler.end();
                let _ = respond_to.send(());
            }
            ArmRequest::SetZ { z, respond_to } => {
                let previous = self.controller.position();
                self.controller.set_z(z);
                if self.controller.position() != previous {
                    // a slider commit is a discrete action
                    if let Some(angles) = self.solve_and_publish(previous) {
                        self.link.send(angles);
                    }
                }
                let _ = respond_to.send(());
            }
            ArmRequest::StartHoming { respond_to } => {
                tracing::info!("homing toward {:?}", self.controller.home());
                self.controller.start_homing();
                let _ = respond_to.send(());
            }
            ArmRequest::StartTrajectory {
                axes,
                speed,
                respond_to,
            } => {
                let _ = respond_to.send(self.start_trajectory(&axes, speed));
            }
            ArmRequest::Cancel { respond_to } => {
                self.controller.cancel();
                let _ = respond_to.send(());
            }
            ArmRequest::SetSpeed { speed, respond_to } => {
                let result = if (1..=10).contains(&speed) {
                    self.controller.set_speed(speed);
                    Ok(())
                } else {
                    Err(format!("speed must be in [1, 10], got {speed}"))
                };
                let _ = respond_to.send(result);
            }
            ArmRequest::SetGeometry {
                geometry,
                respond_to,
            } => {
                let _ = respond_to.send(self.set_geometry(geometry));
            }
        }
    }

    fn start_trajectory(&mut self, axes: &[Axis], speed: Option<u8>) -> Result<(), String> {
        if axes.is_empty() {
            return Err("trajectory needs at least one axis".to_string());
        }
        let speed = speed.unwrap_or_else(|| self.controller.speed());
        if !(1..=10).contains(&speed) {
            return Err(format!("speed must be in [1, 10], got {speed}"));
        }
        let ranges = self.controller.bounds();
        tracing::info!(
            "starting trajectory on {:?} at speed {speed}",
            axes.iter().map(|a| a.as_str()).collect::<Vec<_>>()
        );
        self.controller.start_trajectory(axes, ranges, speed);
        Ok(())
    }

    /// Geometry is operator-editable, but not while an animation is
    /// running. The position is re-clamped and re-solved right away; if
    /// the current pose is unreachable under the new geometry the angle
    /// readout goes empty instead of failing the edit.
    fn set_geometry(&mut self, geometry: Geometry) -> Result<(), String> {
        self.controller
            .set_geometry(geometry)
            .map_err(|e| e.to_string())?;
        self.angles = motion::solve(self.controller.position(), &self.controller.geometry()).ok();
        match self.angles {
            Some(angles) => self.link.send(angles),
            None => tracing::warn!("current pose unreachable under the new geometry"),
        }
        Ok(())
    }

    fn status(&self) -> StatusResponse {
        StatusResponse {
            name: self.name.clone(),
            position: self.controller.position(),
            angles: self.angles,
            measured: self.link.measured(),
            link: self.link.status(),
            speed: self.controller.speed(),
            animation: self.controller.animation_kind(),
        }
    }
}
