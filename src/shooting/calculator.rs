//! Shoot-on-the-move aim point calculation

use crate::common::types::{ChassisVelocity, Pose2D, Translation2D};
use crate::common::{bearing, normalize_angle};
use nalgebra::Rotation2;
use tracing::trace;

/// Below this speed (m/s) either the robot or the shot is treated as stopped
pub const NO_COMPENSATION_THRESHOLD: f64 = 0.15;

/// Fixed inputs to the shot calculation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShotContext {
    /// Target location on the field
    pub target: Translation2D,
    /// Shared speed epsilon for robot velocity and exit speed
    pub epsilon: f64,
    /// Operator override; false forces the static solution
    pub compensation_enabled: bool,
}

impl ShotContext {
    pub fn new(target: Translation2D, compensation_enabled: bool) -> Self {
        ShotContext {
            target,
            epsilon: NO_COMPENSATION_THRESHOLD,
            compensation_enabled,
        }
    }
}

/// Where to aim this cycle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShotSolution {
    pub compensated_target: Translation2D,
    /// Turret bearing relative to chassis forward, radians in (-pi, pi]
    pub turret_bearing: f64,
    pub compensated_distance: f64,
    /// Whether motion compensation was applied
    pub compensated: bool,
}

/// Compute the turret aim point for a robot at `pose` moving at
/// `field_velocity` (field-relative) with the shooter launching at
/// `exit_speed` m/s.
pub fn calculate_shot(
    pose: &Pose2D,
    field_velocity: &ChassisVelocity,
    exit_speed: f64,
    ctx: &ShotContext,
) -> ShotSolution {
    let robot = pose.translation();
    let distance = (ctx.target - robot).norm();

    // Non-finite inputs are treated as a stopped robot
    let velocity = if field_velocity.vx.is_finite() && field_velocity.vy.is_finite() {
        field_velocity.linear()
    } else {
        Translation2D::zeros()
    };
    let exit_speed = if exit_speed.is_finite() { exit_speed } else { 0.0 };

    let near_zero = |v: f64| v.abs() <= ctx.epsilon;
    if near_zero(velocity.norm()) || near_zero(exit_speed) || !ctx.compensation_enabled {
        let turret_bearing = normalize_angle(bearing(robot, ctx.target) - pose.heading);
        trace!(
            target_x = ctx.target.x,
            target_y = ctx.target.y,
            distance,
            turret_bearing,
            exit_speed,
            "static shot"
        );
        return ShotSolution {
            compensated_target: ctx.target,
            turret_bearing,
            compensated_distance: distance,
            compensated: false,
        };
    }

    // The ball keeps the robot's velocity for the whole flight, so aim
    // against it by the distance the robot would cover in that time
    let shot_time = distance / exit_speed;
    let shot_offset = -velocity * shot_time;
    let x_offset = ctx.target.x - pose.x;
    let y_offset = ctx.target.y - pose.y;
    let rotation = Rotation2::new((-y_offset).atan2(x_offset));
    let compensated_target = ctx.target + rotation * shot_offset;

    let turret_bearing = normalize_angle(bearing(robot, compensated_target) - pose.heading);
    let compensated_distance = (compensated_target - robot).norm();

    trace!(
        target_x = compensated_target.x,
        target_y = compensated_target.y,
        distance = compensated_distance,
        raw_distance = distance,
        turret_bearing,
        exit_speed,
        shot_time,
        "compensated shot"
    );

    ShotSolution {
        compensated_target,
        turret_bearing,
        compensated_distance,
        compensated: true,
    }
}
