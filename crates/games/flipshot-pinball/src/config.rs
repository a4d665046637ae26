use std::fmt;

use serde::{Deserialize, Serialize};

use flipshot_core::math::Vec3;

use crate::curve::ResponseCurve;

/// Environment variable naming an alternative table config file.
pub const CONFIG_ENV: &str = "FLIPSHOT_TABLE_CONFIG";
/// Config file read when the environment variable is unset.
pub const DEFAULT_CONFIG_PATH: &str = "config/table.toml";

/// Error raised while loading or validating a table config.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Invalid(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "failed to read table config: {e}"),
            Self::Parse(e) => write!(f, "failed to parse table config: {e}"),
            Self::Invalid(msg) => write!(f, "invalid table config: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Parse(e) => Some(e),
            Self::Invalid(_) => None,
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(e: toml::de::Error) -> Self {
        Self::Parse(e)
    }
}

/// World-level simulation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    pub gravity: Vec3,
    /// Fixed physics tick length (seconds).
    pub fixed_dt: f32,
    /// Longest frame delta fed into the fixed clock (seconds).
    pub max_frame_dt: f32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: Vec3::new(0.0, -9.81, 0.0),
            fixed_dt: 0.02,
            max_frame_dt: 0.1,
        }
    }
}

/// Per-ball tuning, including the airborne assist force.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BallConfig {
    pub radius: f32,
    pub mass: f32,
    /// Magnitude of the supplemental force applied while launched and low.
    pub assist_force: f32,
    /// Direction of the assist force (normalized on use).
    pub assist_direction: Vec3,
    /// The assist engages once a launched ball drops below this height.
    pub altitude_ceiling: f32,
}

impl Default for BallConfig {
    fn default() -> Self {
        Self {
            radius: 0.5,
            mass: 1.0,
            assist_force: 30.0,
            assist_direction: Vec3::NEG_Z,
            altitude_ceiling: 4.0,
        }
    }
}

/// When a lifted paddle launches its pending hits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DischargePolicy {
    /// During the sweep, while rotation progress is below the threshold.
    #[default]
    MidSweep,
    /// Once the paddle reaches the lifted angle.
    FullLift,
}

/// What contact-end does to a pending hit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitPolicy {
    #[default]
    ForgetOnExit,
    KeepUntilDischarge,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaddleConfig {
    /// Resting yaw (degrees).
    pub rest_angle: f32,
    /// Lifted yaw (degrees).
    pub lifted_angle: f32,
    /// Seconds to sweep from one angle to the other.
    pub rotate_time: f32,
    /// Impulse magnitude recorded for each ball that touches the paddle.
    pub hit_force: f32,
    /// Fraction of the sweep during which pending hits discharge.
    pub discharge_ratio_threshold: f32,
    pub discharge_policy: DischargePolicy,
    pub exit_policy: ExitPolicy,
    /// Angles closer than this (degrees) count as settled.
    pub settle_tolerance: f32,
}

impl Default for PaddleConfig {
    fn default() -> Self {
        Self {
            rest_angle: 0.0,
            lifted_angle: 60.0,
            rotate_time: 1.0,
            hit_force: 150.0,
            discharge_ratio_threshold: 0.95,
            discharge_policy: DischargePolicy::default(),
            exit_policy: ExitPolicy::default(),
            settle_tolerance: 0.01,
        }
    }
}

/// Drag-to-launch tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LauncherConfig {
    pub drag_radius: f32,
    /// Lower bound of the drag sector (degrees, measured from +X toward +Z).
    pub min_angle: f32,
    /// Upper bound of the drag sector (degrees).
    pub max_angle: f32,
    pub min_launch_force: f32,
    pub max_launch_force: f32,
    /// Elevation of the launch (degrees above the table plane).
    pub launch_angle: f32,
    /// Releases with a shorter drag snap back to rest.
    pub min_drag_threshold: f32,
    pub force_curve: ResponseCurve,
    /// How close (world units) a ball must be to the rest pose to be draggable.
    pub rest_tolerance: f32,
}

impl Default for LauncherConfig {
    fn default() -> Self {
        Self {
            drag_radius: 2.0,
            min_angle: 210.0,
            max_angle: 330.0,
            min_launch_force: 100.0,
            max_launch_force: 200.0,
            launch_angle: 45.0,
            min_drag_threshold: 0.5,
            force_curve: ResponseCurve::Linear,
            rest_tolerance: 1e-3,
        }
    }
}

/// Trajectory preview sampling and reflection tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrajectoryConfig {
    pub step_size: f32,
    pub step_count: usize,
    /// Radius of the swept probe. Zero means "use the ball radius".
    pub probe_radius: f32,
    /// Speed lost per unit of surface friction on a predicted bounce.
    pub friction_loss: f32,
    pub min_speed: f32,
    pub max_speed: f32,
    /// Distance to step off a surface after a predicted bounce.
    pub reflect_offset: f32,
}

impl Default for TrajectoryConfig {
    fn default() -> Self {
        Self {
            step_size: 0.02,
            step_count: 100,
            probe_radius: 0.0,
            friction_loss: 0.5,
            min_speed: 0.5,
            max_speed: 50.0,
            reflect_offset: 0.01,
        }
    }
}

/// Top-level table configuration, loadable from TOML.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableConfig {
    pub physics: PhysicsConfig,
    pub ball: BallConfig,
    pub paddle: PaddleConfig,
    pub launcher: LauncherConfig,
    pub trajectory: TrajectoryConfig,
}

impl TableConfig {
    /// Load from `FLIPSHOT_TABLE_CONFIG` or `config/table.toml`, falling back to
    /// defaults when the file is missing or unparseable.
    pub fn load() -> Self {
        let path = std::env::var(CONFIG_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        match std::fs::read_to_string(&path) {
            Ok(content) => match Self::from_toml_str(&content) {
                Ok(cfg) => {
                    tracing::info!("Loaded table configuration from {path}");
                    cfg
                },
                Err(e) => {
                    tracing::warn!("Failed to parse {path}: {e}, using defaults");
                    Self::default()
                },
            },
            Err(_) => {
                tracing::info!("No {path} found, using default table configuration");
                Self::default()
            },
        }
    }

    /// Read and parse a specific file.
    pub fn from_path(path: impl AsRef<std::path::Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str::<Self>(content)?)
    }

    /// Radius of the trajectory probe, defaulting to the ball radius.
    pub fn probe_radius(&self) -> f32 {
        if self.trajectory.probe_radius > 0.0 {
            self.trajectory.probe_radius
        } else {
            self.ball.radius
        }
    }

    /// Reject values the simulation cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        fn positive(name: &str, value: f32) -> Result<(), ConfigError> {
            if value > 0.0 && value.is_finite() {
                Ok(())
            } else {
                Err(ConfigError::Invalid(format!("{name} must be > 0, got {value}")))
            }
        }

        positive("physics.fixed_dt", self.physics.fixed_dt)?;
        positive("physics.max_frame_dt", self.physics.max_frame_dt)?;
        positive("ball.radius", self.ball.radius)?;
        positive("ball.mass", self.ball.mass)?;
        positive("paddle.rotate_time", self.paddle.rotate_time)?;
        positive("launcher.drag_radius", self.launcher.drag_radius)?;
        positive("trajectory.step_size", self.trajectory.step_size)?;

        let l = &self.launcher;
        if !(0.0 <= l.min_angle && l.min_angle <= l.max_angle && l.max_angle <= 360.0) {
            return Err(ConfigError::Invalid(format!(
                "launcher sector must satisfy 0 <= min_angle <= max_angle <= 360, got [{}, {}]",
                l.min_angle, l.max_angle
            )));
        }
        if l.min_launch_force > l.max_launch_force {
            return Err(ConfigError::Invalid(format!(
                "launcher.min_launch_force ({}) exceeds max_launch_force ({})",
                l.min_launch_force, l.max_launch_force
            )));
        }
        if !(0.0..=90.0).contains(&l.launch_angle) {
            return Err(ConfigError::Invalid(format!(
                "launcher.launch_angle must be within [0, 90], got {}",
                l.launch_angle
            )));
        }
        if l.min_drag_threshold < 0.0 {
            return Err(ConfigError::Invalid(
                "launcher.min_drag_threshold must be >= 0".to_string(),
            ));
        }
        if !l.force_curve.is_well_formed() {
            return Err(ConfigError::Invalid(
                "launcher.force_curve keyframes must be sorted and exponents positive".to_string(),
            ));
        }

        let threshold = self.paddle.discharge_ratio_threshold;
        if !(threshold > 0.0 && threshold <= 1.0) {
            return Err(ConfigError::Invalid(format!(
                "paddle.discharge_ratio_threshold must be within (0, 1], got {threshold}"
            )));
        }

        let t = &self.trajectory;
        if t.step_count == 0 {
            return Err(ConfigError::Invalid(
                "trajectory.step_count must be > 0".to_string(),
            ));
        }
        if t.min_speed < 0.0 || t.min_speed > t.max_speed {
            return Err(ConfigError::Invalid(format!(
                "trajectory speed band [{}, {}] is empty",
                t.min_speed, t.max_speed
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_tuning() {
        let cfg = TableConfig::default();
        assert_eq!(cfg.launcher.drag_radius, 2.0);
        assert_eq!(cfg.launcher.min_angle, 210.0);
        assert_eq!(cfg.launcher.max_angle, 330.0);
        assert_eq!(cfg.launcher.min_launch_force, 100.0);
        assert_eq!(cfg.launcher.max_launch_force, 200.0);
        assert_eq!(cfg.paddle.hit_force, 150.0);
        assert_eq!(cfg.paddle.discharge_policy, DischargePolicy::MidSweep);
        assert_eq!(cfg.paddle.exit_policy, ExitPolicy::ForgetOnExit);
        assert_eq!(cfg.trajectory.step_count, 100);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn probe_radius_falls_back_to_ball() {
        let mut cfg = TableConfig::default();
        assert_eq!(cfg.probe_radius(), cfg.ball.radius);
        cfg.trajectory.probe_radius = 0.2;
        assert_eq!(cfg.probe_radius(), 0.2);
    }

    #[test]
    fn parse_partial_toml_keeps_defaults() {
        let cfg = TableConfig::from_toml_str(
            r#"
[launcher]
drag_radius = 3.0
force_curve = { kind = "smooth_step" }

[paddle]
discharge_policy = "full_lift"
exit_policy = "keep_until_discharge"

[physics]
gravity = [0.0, -20.0, 0.0]
"#,
        )
        .unwrap();
        assert_eq!(cfg.launcher.drag_radius, 3.0);
        assert_eq!(cfg.launcher.force_curve, ResponseCurve::SmoothStep);
        assert_eq!(cfg.launcher.min_angle, 210.0);
        assert_eq!(cfg.paddle.discharge_policy, DischargePolicy::FullLift);
        assert_eq!(cfg.paddle.exit_policy, ExitPolicy::KeepUntilDischarge);
        assert_eq!(cfg.physics.gravity.y, -20.0);
        assert_eq!(cfg.physics.fixed_dt, 0.02);
    }

    #[test]
    fn shipped_table_config_is_valid() {
        let cfg = TableConfig::from_toml_str(include_str!("../../../../config/table.toml")).unwrap();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.ball.mass, 20.0);
        assert_eq!(cfg.launcher.force_curve, ResponseCurve::Linear);
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let err = TableConfig::from_toml_str("launcher = 5").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn validate_rejects_inverted_sector() {
        let mut cfg = TableConfig::default();
        cfg.launcher.min_angle = 300.0;
        cfg.launcher.max_angle = 200.0;
        assert!(matches!(cfg.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn validate_rejects_inverted_force_range() {
        let mut cfg = TableConfig::default();
        cfg.launcher.min_launch_force = 300.0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn validate_rejects_bad_threshold() {
        let mut cfg = TableConfig::default();
        cfg.paddle.discharge_ratio_threshold = 0.0;
        assert!(cfg.validate().is_err());
        cfg.paddle.discharge_ratio_threshold = 1.5;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_steps_and_empty_speed_band() {
        let mut cfg = TableConfig::default();
        cfg.trajectory.step_count = 0;
        assert!(cfg.validate().is_err());

        let mut cfg = TableConfig::default();
        cfg.trajectory.min_speed = 100.0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn validate_rejects_non_positive_tick() {
        let mut cfg = TableConfig::default();
        cfg.physics.fixed_dt = 0.0;
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("physics.fixed_dt"));
    }
}
