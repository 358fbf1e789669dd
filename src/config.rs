//! Configuration loading

use crate::control::controllers::PidGains;
use crate::error::{CoreError, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Clone, Debug, Deserialize, Default)]
pub struct RobotConfig {
    #[serde(default)]
    pub field: FieldConfig,
    #[serde(default)]
    pub shooter: ShooterConfig,
    #[serde(default)]
    pub feeder: FeederConfig,
    #[serde(default)]
    pub sensors: SensorConfig,
    #[serde(default)]
    pub alignment: AlignmentConfig,
    #[serde(default)]
    pub tuning: TuningDefaults,
    #[serde(default)]
    pub control_loop: LoopConfig,
}

/// Target location and shooting area
#[derive(Clone, Debug, Deserialize)]
pub struct FieldConfig {
    /// Target x in meters (default: 8.2)
    #[serde(default = "default_target_x")]
    pub target_x: f64,

    /// Target y in meters (default: 4.1)
    #[serde(default = "default_target_y")]
    pub target_y: f64,

    /// Too close to shoot inside this radius (default: 0.4)
    #[serde(default = "default_inner_radius")]
    pub inner_radius: f64,

    /// Too far to shoot outside this radius (default: 4.2)
    #[serde(default = "default_outer_radius")]
    pub outer_radius: f64,

    /// How far inside the valid area reposition points are placed (default: 0.1)
    #[serde(default = "default_alignment_margin")]
    pub alignment_margin: f64,

    /// Pose assumed until the drivetrain reports one
    #[serde(default)]
    pub start_x: f64,
    #[serde(default)]
    pub start_y: f64,
    #[serde(default)]
    pub start_heading_deg: f64,
}

/// Turret, flywheel and hood parameters
#[derive(Clone, Debug, Deserialize)]
pub struct ShooterConfig {
    /// Speed below which compensation is skipped, m/s (default: 0.15)
    #[serde(default = "default_compensation_epsilon")]
    pub compensation_epsilon: f64,

    /// Turret soft limits in degrees (default: -135 / 135)
    #[serde(default = "default_turret_min_deg")]
    pub turret_min_deg: f64,
    #[serde(default = "default_turret_max_deg")]
    pub turret_max_deg: f64,

    /// Flywheel diameter in meters (default: 0.1016)
    #[serde(default = "default_flywheel_diameter")]
    pub flywheel_diameter: f64,

    /// Flywheel must be at speed this long before feeding (default: 200)
    #[serde(default = "default_at_velocity_debounce_ms")]
    pub at_velocity_debounce_ms: u64,

    /// Fixed shot used while static shooting
    #[serde(default = "default_static_flywheel_rps")]
    pub static_flywheel_rps: f64,
    #[serde(default = "default_static_hood_deg")]
    pub static_hood_deg: f64,

    /// Distance to flywheel velocity calibration file
    #[serde(default = "default_velocity_table")]
    pub velocity_table: PathBuf,

    /// Distance to hood angle calibration file
    #[serde(default = "default_hood_table")]
    pub hood_table: PathBuf,
}

/// Roller and hopper voltages
#[derive(Clone, Debug, Deserialize)]
pub struct FeederConfig {
    #[serde(default = "default_roller_intake_volts")]
    pub roller_intake_volts: f64,
    #[serde(default = "default_hopper_intake_volts")]
    pub hopper_intake_volts: f64,
    #[serde(default = "default_hopper_shoot_volts")]
    pub hopper_shoot_volts: f64,
    #[serde(default = "default_slow_back_volts")]
    pub slow_back_volts: f64,
    /// Length of the slow-back pulse (default: 150)
    #[serde(default = "default_slow_back_ms")]
    pub slow_back_ms: u64,
}

#[derive(Clone, Debug, Deserialize)]
pub struct SensorConfig {
    /// Ball sensors must read occupied this long to count (default: 200)
    #[serde(default = "default_ball_debounce_ms")]
    pub ball_debounce_ms: u64,
}

/// Profiled alignment controller defaults; live values come from tuning
#[derive(Clone, Debug, Deserialize)]
pub struct AlignmentConfig {
    #[serde(default = "default_x_kp")]
    pub x_kp: f64,
    #[serde(default)]
    pub x_ki: f64,
    #[serde(default)]
    pub x_kd: f64,
    #[serde(default = "default_y_kp")]
    pub y_kp: f64,
    #[serde(default)]
    pub y_ki: f64,
    #[serde(default)]
    pub y_kd: f64,
    #[serde(default = "default_theta_kp")]
    pub theta_kp: f64,
    #[serde(default)]
    pub theta_ki: f64,
    #[serde(default)]
    pub theta_kd: f64,

    #[serde(default = "default_linear_max_velocity")]
    pub linear_max_velocity: f64,
    #[serde(default = "default_linear_max_acceleration")]
    pub linear_max_acceleration: f64,
    #[serde(default = "default_rotation_max_velocity")]
    pub rotation_max_velocity: f64,
    #[serde(default = "default_rotation_max_acceleration")]
    pub rotation_max_acceleration: f64,

    #[serde(default = "default_translation_tolerance")]
    pub x_tolerance: f64,
    #[serde(default = "default_translation_tolerance")]
    pub y_tolerance: f64,
    #[serde(default = "default_heading_tolerance_deg")]
    pub heading_tolerance_deg: f64,
}

/// Initial values of the live flags
#[derive(Clone, Debug, Deserialize)]
pub struct TuningDefaults {
    #[serde(default)]
    pub disable_compensation: bool,
    #[serde(default = "default_true")]
    pub disable_auto_align: bool,
    #[serde(default)]
    pub intake_by_vision: bool,
}

#[derive(Clone, Debug, Deserialize)]
pub struct LoopConfig {
    /// Control loop period in milliseconds (default: 20)
    #[serde(default = "default_period_ms")]
    pub period_ms: u64,
}

impl RobotConfig {
    /// Load and validate configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: RobotConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let f = &self.field;
        let numbers = [
            f.target_x,
            f.target_y,
            f.inner_radius,
            f.outer_radius,
            f.alignment_margin,
            f.start_x,
            f.start_y,
            f.start_heading_deg,
            self.shooter.compensation_epsilon,
            self.shooter.turret_min_deg,
            self.shooter.turret_max_deg,
            self.shooter.flywheel_diameter,
            self.shooter.static_flywheel_rps,
            self.shooter.static_hood_deg,
        ];
        if numbers.iter().any(|n| !n.is_finite()) {
            return Err(CoreError::Config("non-finite value in configuration".to_string()));
        }
        if f.inner_radius < 0.0 || f.inner_radius >= f.outer_radius {
            return Err(CoreError::Config(format!(
                "shooting area radii must satisfy 0 <= inner ({}) < outer ({})",
                f.inner_radius, f.outer_radius
            )));
        }
        if self.shooter.turret_min_deg >= self.shooter.turret_max_deg {
            return Err(CoreError::Config(format!(
                "turret range [{}, {}] is empty",
                self.shooter.turret_min_deg, self.shooter.turret_max_deg
            )));
        }
        if self.shooter.flywheel_diameter <= 0.0 {
            return Err(CoreError::Config("flywheel diameter must be positive".to_string()));
        }
        if self.shooter.compensation_epsilon < 0.0 {
            return Err(CoreError::Config("compensation epsilon must be non-negative".to_string()));
        }
        if self.control_loop.period_ms == 0 {
            return Err(CoreError::Config("control loop period must be positive".to_string()));
        }
        let a = &self.alignment;
        let limits = [
            a.linear_max_velocity,
            a.linear_max_acceleration,
            a.rotation_max_velocity,
            a.rotation_max_acceleration,
            a.x_tolerance,
            a.y_tolerance,
            a.heading_tolerance_deg,
        ];
        if limits.iter().any(|l| !l.is_finite() || *l <= 0.0) {
            return Err(CoreError::Config(
                "alignment constraints and tolerances must be positive".to_string(),
            ));
        }
        let gains = [
            ("x", a.x_kp, a.x_ki, a.x_kd),
            ("y", a.y_kp, a.y_ki, a.y_kd),
            ("theta", a.theta_kp, a.theta_ki, a.theta_kd),
        ];
        for (axis, kp, ki, kd) in gains {
            if !PidGains::new(kp, ki, kd).is_valid() {
                return Err(CoreError::Config(format!(
                    "{axis} alignment gains must be finite and non-negative (kP {kp}, kI {ki}, kD {kd})"
                )));
            }
        }
        Ok(())
    }

    pub fn period_secs(&self) -> f64 {
        self.control_loop.period_ms as f64 / 1000.0
    }
}

impl Default for FieldConfig {
    fn default() -> Self {
        FieldConfig {
            target_x: default_target_x(),
            target_y: default_target_y(),
            inner_radius: default_inner_radius(),
            outer_radius: default_outer_radius(),
            alignment_margin: default_alignment_margin(),
            start_x: 0.0,
            start_y: 0.0,
            start_heading_deg: 0.0,
        }
    }
}

impl Default for ShooterConfig {
    fn default() -> Self {
        ShooterConfig {
            compensation_epsilon: default_compensation_epsilon(),
            turret_min_deg: default_turret_min_deg(),
            turret_max_deg: default_turret_max_deg(),
            flywheel_diameter: default_flywheel_diameter(),
            at_velocity_debounce_ms: default_at_velocity_debounce_ms(),
            static_flywheel_rps: default_static_flywheel_rps(),
            static_hood_deg: default_static_hood_deg(),
            velocity_table: default_velocity_table(),
            hood_table: default_hood_table(),
        }
    }
}

impl Default for FeederConfig {
    fn default() -> Self {
        FeederConfig {
            roller_intake_volts: default_roller_intake_volts(),
            hopper_intake_volts: default_hopper_intake_volts(),
            hopper_shoot_volts: default_hopper_shoot_volts(),
            slow_back_volts: default_slow_back_volts(),
            slow_back_ms: default_slow_back_ms(),
        }
    }
}

impl Default for SensorConfig {
    fn default() -> Self {
        SensorConfig {
            ball_debounce_ms: default_ball_debounce_ms(),
        }
    }
}

impl Default for AlignmentConfig {
    fn default() -> Self {
        AlignmentConfig {
            x_kp: default_x_kp(),
            x_ki: 0.0,
            x_kd: 0.0,
            y_kp: default_y_kp(),
            y_ki: 0.0,
            y_kd: 0.0,
            theta_kp: default_theta_kp(),
            theta_ki: 0.0,
            theta_kd: 0.0,
            linear_max_velocity: default_linear_max_velocity(),
            linear_max_acceleration: default_linear_max_acceleration(),
            rotation_max_velocity: default_rotation_max_velocity(),
            rotation_max_acceleration: default_rotation_max_acceleration(),
            x_tolerance: default_translation_tolerance(),
            y_tolerance: default_translation_tolerance(),
            heading_tolerance_deg: default_heading_tolerance_deg(),
        }
    }
}

impl Default for TuningDefaults {
    fn default() -> Self {
        TuningDefaults {
            disable_compensation: false,
            disable_auto_align: true,
            intake_by_vision: false,
        }
    }
}

impl Default for LoopConfig {
    fn default() -> Self {
        LoopConfig {
            period_ms: default_period_ms(),
        }
    }
}

fn default_target_x() -> f64 {
    8.2
}
fn default_target_y() -> f64 {
    4.1
}
fn default_inner_radius() -> f64 {
    0.4
}
fn default_outer_radius() -> f64 {
    4.2
}
fn default_alignment_margin() -> f64 {
    0.1
}
fn default_compensation_epsilon() -> f64 {
    0.15
}
fn default_turret_min_deg() -> f64 {
    -135.0
}
fn default_turret_max_deg() -> f64 {
    135.0
}
fn default_flywheel_diameter() -> f64 {
    0.1016
}
fn default_at_velocity_debounce_ms() -> u64 {
    200
}
fn default_static_flywheel_rps() -> f64 {
    45.0
}
fn default_static_hood_deg() -> f64 {
    2.0
}
fn default_velocity_table() -> PathBuf {
    PathBuf::from("deploy/shoot_data/distance_to_velocity.csv")
}
fn default_hood_table() -> PathBuf {
    PathBuf::from("deploy/shoot_data/distance_to_angle.csv")
}
fn default_roller_intake_volts() -> f64 {
    8.0
}
fn default_hopper_intake_volts() -> f64 {
    3.0
}
fn default_hopper_shoot_volts() -> f64 {
    8.0
}
fn default_slow_back_volts() -> f64 {
    -1.2
}
fn default_slow_back_ms() -> u64 {
    150
}
fn default_ball_debounce_ms() -> u64 {
    200
}
fn default_x_kp() -> f64 {
    4.0
}
fn default_y_kp() -> f64 {
    4.0
}
fn default_theta_kp() -> f64 {
    6.0
}
fn default_linear_max_velocity() -> f64 {
    4.69
}
fn default_linear_max_acceleration() -> f64 {
    2.8
}
fn default_rotation_max_velocity() -> f64 {
    7.0
}
fn default_rotation_max_acceleration() -> f64 {
    20.0
}
fn default_translation_tolerance() -> f64 {
    0.05
}
fn default_heading_tolerance_deg() -> f64 {
    3.0
}
fn default_true() -> bool {
    true
}
fn default_period_ms() -> u64 {
    20
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let config: RobotConfig = toml::from_str("").unwrap();
        assert_eq!(config.field.target_x, 8.2);
        assert_eq!(config.control_loop.period_ms, 20);
        assert!(config.tuning.disable_auto_align);
        config.validate().unwrap();
    }

    #[test]
    fn partial_section_keeps_other_defaults() {
        let config: RobotConfig = toml::from_str("[shooter]\nturret_max_deg = 170.0\n").unwrap();
        assert_eq!(config.shooter.turret_max_deg, 170.0);
        assert_eq!(config.shooter.turret_min_deg, -135.0);
    }

    #[test]
    fn inverted_rings_are_rejected() {
        let config: RobotConfig = toml::from_str("[field]\ninner_radius = 5.0\nouter_radius = 4.0\n").unwrap();
        assert!(matches!(config.validate(), Err(CoreError::Config(_))));
    }

    #[test]
    fn zero_period_is_rejected() {
        let config: RobotConfig = toml::from_str("[control_loop]\nperiod_ms = 0\n").unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn invalid_alignment_gains_are_rejected() {
        let negative: RobotConfig = toml::from_str("[alignment]\nx_kp = -4.0\n").unwrap();
        assert!(matches!(negative.validate(), Err(CoreError::Config(m)) if m.starts_with("x ")));

        let not_a_number: RobotConfig = toml::from_str("[alignment]\ntheta_kd = nan\n").unwrap();
        assert!(matches!(not_a_number.validate(), Err(CoreError::Config(m)) if m.starts_with("theta ")));
    }

    #[test]
    fn bad_toml_is_config_error() {
        let err = toml::from_str::<RobotConfig>("[field\n").map_err(CoreError::from).unwrap_err();
        assert!(matches!(err, CoreError::Config(_)));
    }
}
