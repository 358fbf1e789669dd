//! Per-cycle aiming values derived from pose and shot solution

use super::calculator::ShotSolution;
use crate::common::geometry::Ring;
use crate::common::types::{Pose2D, Translation2D};
use crate::common::{bearing, normalize_angle};

/// Static description of the shooting area and turret travel
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AimingGeometry {
    pub target: Translation2D,
    /// Shooting is unreliable inside this ring
    pub inner_ring: Ring,
    /// Shooting is unreliable outside this ring
    pub outer_ring: Ring,
    /// Margin pulled inside the valid annulus when picking a reposition point
    pub alignment_margin: f64,
    /// Turret soft limits, radians
    pub turret_min: f64,
    pub turret_max: f64,
}

impl AimingGeometry {
    pub fn new(target: Translation2D, inner_radius: f64, outer_radius: f64) -> Self {
        AimingGeometry {
            target,
            inner_ring: Ring::new(target, inner_radius),
            outer_ring: Ring::new(target, outer_radius),
            alignment_margin: 0.1,
            turret_min: (-135.0f64).to_radians(),
            turret_max: 135.0f64.to_radians(),
        }
    }

    pub fn with_turret_limits(mut self, min: f64, max: f64) -> Self {
        self.turret_min = min;
        self.turret_max = max;
        self
    }

    pub fn with_alignment_margin(mut self, margin: f64) -> Self {
        self.alignment_margin = margin;
        self
    }

    pub fn is_in_dead_zone(&self, point: Translation2D) -> bool {
        !self.outer_ring.contains(point) || self.inner_ring.contains(point)
    }

    /// Nearest reposition point on whichever exclusion ring is closer.
    /// Equal distances pick the outer ring.
    pub fn dead_zone_alignment_setpoint(&self, point: Translation2D) -> Translation2D {
        let inner_closer =
            self.inner_ring.boundary_distance(point) < self.outer_ring.boundary_distance(point);
        let ring = if inner_closer {
            Ring::new(self.target, self.inner_ring.radius + self.alignment_margin)
        } else {
            Ring::new(self.target, (self.outer_ring.radius - self.alignment_margin).max(0.0))
        };
        ring.nearest_boundary_point(point)
    }

    /// Clamp a turret bearing into the soft limits. Never wraps.
    pub fn clamp_turret(&self, angle: f64) -> f64 {
        angle.clamp(self.turret_min, self.turret_max)
    }
}

/// Aiming values for one control cycle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AimingState {
    pub robot_distance_from_target: f64,
    /// Field-frame bearing from robot to the real target
    pub bearing_from_robot_to_target: f64,
    /// Turret bearing to the real target with no compensation
    pub static_turret_bearing: f64,
    pub applied_turret_bearing: f64,
    pub turret_command_angle: f64,
    pub is_target_in_range: bool,
    pub is_in_dead_zone: bool,
    pub dead_zone_alignment_setpoint: Translation2D,
    /// Chassis heading that lets the turret reach its bearing
    pub alignment_heading: f64,
}

impl AimingState {
    /// Derive the cycle's aiming values.
    ///
    /// `compensation_enabled` must be the same flag the shot was computed
    /// with; `turret_trim` (radians) is added before clamping.
    pub fn compute(
        pose: &Pose2D,
        shot: &ShotSolution,
        geometry: &AimingGeometry,
        compensation_enabled: bool,
        turret_trim: f64,
    ) -> Self {
        let robot = pose.translation();
        let robot_distance_from_target = (geometry.target - robot).norm();
        let bearing_from_robot_to_target = bearing(robot, geometry.target);
        let static_turret_bearing = normalize_angle(bearing_from_robot_to_target - pose.heading);

        let selected = if compensation_enabled {
            shot.turret_bearing
        } else {
            static_turret_bearing
        };
        let applied_turret_bearing = normalize_angle(selected + turret_trim);
        let turret_command_angle = geometry.clamp_turret(applied_turret_bearing);
        let is_target_in_range = applied_turret_bearing == turret_command_angle;

        let alignment_heading = if is_target_in_range {
            pose.heading
        } else {
            normalize_angle(pose.heading + (applied_turret_bearing - turret_command_angle))
        };

        AimingState {
            robot_distance_from_target,
            bearing_from_robot_to_target,
            static_turret_bearing,
            applied_turret_bearing,
            turret_command_angle,
            is_target_in_range,
            is_in_dead_zone: geometry.is_in_dead_zone(robot),
            dead_zone_alignment_setpoint: geometry.dead_zone_alignment_setpoint(robot),
            alignment_heading,
        }
    }
}
