//! Shot compensation, calibration tables and turret aiming
pub mod aiming;
pub mod calculator;
pub mod calibration;
pub mod interpolation;

pub use aiming::{AimingGeometry, AimingState};
pub use calculator::{calculate_shot, ShotContext, ShotSolution, NO_COMPENSATION_THRESHOLD};
pub use calibration::{load_calibration_table, CalibrationTable, ShooterTables};
pub use interpolation::{Interpolate, InterpolationKey, InterpolationTable};

use crate::common::types::{ChassisVelocity, Pose2D};

/// Linear speed of a ball leaving a flywheel of `diameter` meters spinning
/// at `rotations_per_second`
pub fn exit_speed(rotations_per_second: f64, diameter: f64) -> f64 {
    rotations_per_second * std::f64::consts::PI * diameter
}

/// Shot solution and the aiming values derived from it for one snapshot.
///
/// `field_velocity` must already be field-relative. The compensation flag in
/// `ctx` also selects the applied turret bearing.
pub fn compute_aim(
    pose: &Pose2D,
    field_velocity: &ChassisVelocity,
    exit_speed: f64,
    ctx: &ShotContext,
    geometry: &AimingGeometry,
    turret_trim: f64,
) -> (ShotSolution, AimingState) {
    let shot = calculate_shot(pose, field_velocity, exit_speed, ctx);
    let aiming = AimingState::compute(pose, &shot, geometry, ctx.compensation_enabled, turret_trim);
    (shot, aiming)
}

/// Setpoints sent to the shooter actuators for one cycle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AimCommand {
    /// Turret angle relative to chassis forward, radians
    pub turret_angle: f64,
    /// Flywheel velocity, rotations per second
    pub flywheel_velocity: f64,
    /// Hood angle, degrees
    pub hood_angle: f64,
}
