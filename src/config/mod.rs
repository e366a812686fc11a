// src/config/mod.rs - TOML configuration for the console host

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crate::motion::{AxisRange, Bounds, Geometry, JogSteps, Position};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    #[serde(default)]
    pub arm: ArmConfig,

    #[serde(default)]
    pub geometry: GeometryConfig,

    #[serde(default)]
    pub envelope: EnvelopeConfig,

    #[serde(default)]
    pub motion: MotionConfig,

    #[serde(default)]
    pub robot: RobotConfig,

    #[serde(default)]
    pub web: WebConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ArmConfig {
    #[serde(default = "default_arm_name")]
    pub name: String,
}

/// Arm dimensions in millimeters. All four must be strictly positive;
/// the solver's output is undefined otherwise, so this is rejected at
/// load time.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GeometryConfig {
    #[serde(default = "default_end_effector_radius")]
    pub end_effector_radius: f64,
    #[serde(default = "default_mid_joint_length")]
    pub mid_joint_length: f64,
    #[serde(default = "default_base_arm_length")]
    pub base_arm_length: f64,
    #[serde(default = "default_base_radius")]
    pub base_radius: f64,
}

/// Reachable travel envelope per axis.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EnvelopeConfig {
    #[serde(default = "default_x_min")]
    pub x_min: f64,
    #[serde(default = "default_x_max")]
    pub x_max: f64,
    #[serde(default = "default_y_min")]
    pub y_min: f64,
    #[serde(default = "default_y_max")]
    pub y_max: f64,
    #[serde(default = "default_z_min")]
    pub z_min: f64,
    #[serde(default = "default_z_max")]
    pub z_max: f64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MotionConfig {
    /// Millimeters per sampler tick at unit joystick deflection.
    #[serde(default = "default_jog_step")]
    pub jog_step_x: f64,
    #[serde(default = "default_jog_step")]
    pub jog_step_y: f64,
    /// Fixed sampler period, milliseconds.
    #[serde(default = "default_sampler_period_ms")]
    pub sampler_period_ms: u64,
    /// Base animation frame interval, milliseconds; divided by the
    /// speed selector to get the per-tick wait.
    #[serde(default = "default_frame_interval_ms")]
    pub frame_interval_ms: u64,
    /// Speed selector, integer in [1, 10].
    #[serde(default = "default_speed")]
    pub speed: u8,
    #[serde(default = "default_home_x")]
    pub home_x: f64,
    #[serde(default = "default_home_y")]
    pub home_y: f64,
    #[serde(default = "default_home_z")]
    pub home_z: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportMode {
    /// Persistent datagram channel, one message per accepted tick,
    /// with optional measured-angle telemetry back.
    Channel,
    /// Fire-and-forget HTTP-style request per discrete action.
    Request,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RobotConfig {
    /// Controller address, `host:port`.
    #[serde(default = "default_robot_address")]
    pub address: String,
    #[serde(default = "default_transport_mode")]
    pub mode: TransportMode,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WebConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
}

fn default_arm_name() -> String {
    "delta-arm".to_string()
}
fn default_end_effector_radius() -> f64 {
    45.0
}
fn default_mid_joint_length() -> f64 {
    100.0
}
fn default_base_arm_length() -> f64 {
    446.0
}
fn default_base_radius() -> f64 {
    52.5
}
fn default_x_min() -> f64 {
    -270.0
}
fn default_x_max() -> f64 {
    270.0
}
fn default_y_min() -> f64 {
    -270.0
}
fn default_y_max() -> f64 {
    270.0
}
fn default_z_min() -> f64 {
    350.0
}
fn default_z_max() -> f64 {
    530.0
}
fn default_jog_step() -> f64 {
    10.0
}
fn default_sampler_period_ms() -> u64 {
    100
}
fn default_frame_interval_ms() -> u64 {
    16
}
fn default_speed() -> u8 {
    1
}
fn default_home_x() -> f64 {
    0.0
}
fn default_home_y() -> f64 {
    0.0
}
fn default_home_z() -> f64 {
    432.0
}
fn default_robot_address() -> String {
    "192.168.4.1:3333".to_string()
}
fn default_transport_mode() -> TransportMode {
    TransportMode::Channel
}
fn default_bind_address() -> String {
    "0.0.0.0:3000".to_string()
}

impl Default for ArmConfig {
    fn default() -> Self {
        Self {
            name: default_arm_name(),
        }
    }
}

impl Default for GeometryConfig {
    fn default() -> Self {
        Self {
            end_effector_radius: default_end_effector_radius(),
            mid_joint_length: default_mid_joint_length(),
            base_arm_length: default_base_arm_length(),
            base_radius: default_base_radius(),
        }
    }
}

impl Default for EnvelopeConfig {
    fn default() -> Self {
        Self {
            x_min: default_x_min(),
            x_max: default_x_max(),
            y_min: default_y_min(),
            y_max: default_y_max(),
            z_min: default_z_min(),
            z_max: default_z_max(),
        }
    }
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            jog_step_x: default_jog_step(),
            jog_step_y: default_jog_step(),
            sampler_period_ms: default_sampler_period_ms(),
            frame_interval_ms: default_frame_interval_ms(),
            speed: default_speed(),
            home_x: default_home_x(),
            home_y: default_home_y(),
            home_z: default_home_z(),
        }
    }
}

impl Default for RobotConfig {
    fn default() -> Self {
        Self {
            address: default_robot_address(),
            mode: default_transport_mode(),
        }
    }
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
        }
    }
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.geometry.to_geometry().is_valid() {
            return Err(ConfigError::Invalid(
                "all geometry dimensions must be strictly positive".to_string(),
            ));
        }
        for (axis, min, max) in [
            ("x", self.envelope.x_min, self.envelope.x_max),
            ("y", self.envelope.y_min, self.envelope.y_max),
            ("z", self.envelope.z_min, self.envelope.z_max),
        ] {
            if min > max {
                return Err(ConfigError::Invalid(format!(
                    "envelope {axis} range is inverted: {min} > {max}"
                )));
            }
        }
        if !(1..=10).contains(&self.motion.speed) {
            return Err(ConfigError::Invalid(format!(
                "speed must be in [1, 10], got {}",
                self.motion.speed
            )));
        }
        if self.motion.sampler_period_ms == 0 || self.motion.frame_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "sampler period and frame interval must be nonzero".to_string(),
            ));
        }
        self.web
            .bind_address
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::Invalid(format!("bad web bind address: {e}")))?;
        Ok(())
    }
}

impl GeometryConfig {
    pub fn to_geometry(&self) -> Geometry {
        Geometry {
            end_effector_radius: self.end_effector_radius,
            mid_joint_length: self.mid_joint_length,
            base_arm_length: self.base_arm_length,
            base_radius: self.base_radius,
        }
    }
}

impl EnvelopeConfig {
    pub fn to_bounds(&self) -> Bounds {
        Bounds {
            x: AxisRange::new(self.x_min, self.x_max),
            y: AxisRange::new(self.y_min, self.y_max),
            z: AxisRange::new(self.z_min, self.z_max),
        }
    }
}

impl MotionConfig {
    pub fn home(&self) -> Position {
        Position::new(self.home_x, self.home_y, self.home_z)
    }

    pub fn jog_steps(&self) -> JogSteps {
        JogSteps {
            x: self.jog_step_x,
            y: self.jog_step_y,
        }
    }

    pub fn sampler_period(&self) -> Duration {
        Duration::from_millis(self.sampler_period_ms)
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.geometry.base_radius, 52.5);
        assert_eq!(config.motion.home().z, 432.0);
        assert_eq!(config.robot.mode, TransportMode::Channel);
    }

    #[test]
    fn loads_partial_toml_with_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[robot]\naddress = \"10.0.0.7:4210\"\nmode = \"request\"\n\n[motion]\nspeed = 4"
        )
        .unwrap();
        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.robot.address, "10.0.0.7:4210");
        assert_eq!(config.robot.mode, TransportMode::Request);
        assert_eq!(config.motion.speed, 4);
        // untouched sections keep their defaults
        assert_eq!(config.geometry.mid_joint_length, 100.0);
        assert_eq!(config.envelope.z_max, 530.0);
    }

    #[test]
    fn rejects_non_positive_geometry() {
        let mut config = Config::default();
        config.geometry.mid_joint_length = 0.0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
        config.geometry.mid_joint_length = -3.0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn rejects_inverted_envelope() {
        let mut config = Config::default();
        config.envelope.z_min = 600.0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn rejects_out_of_range_speed() {
        let mut config = Config::default();
        config.motion.speed = 0;
        assert!(config.validate().is_err());
        config.motion.speed = 11;
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let result = Config::load("/nonexistent/arm.toml");
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }
}
