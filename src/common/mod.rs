//! Common utilities and types for the turret core
pub mod geometry;

use std::f64::consts::PI;

/// Common types used across the codebase
pub mod types {
    use nalgebra::{Rotation2, Vector2};

    /// A 2D point or displacement in field coordinates (meters)
    pub type Translation2D = Vector2<f64>;

    /// Robot pose on the field: x, y in meters, heading in radians
    #[derive(Debug, Clone, Copy, PartialEq, Default)]
    pub struct Pose2D {
        pub x: f64,
        pub y: f64,
        pub heading: f64,
    }

    impl Pose2D {
        pub fn new(x: f64, y: f64, heading: f64) -> Self {
            Pose2D { x, y, heading }
        }

        pub fn from_translation(translation: Translation2D, heading: f64) -> Self {
            Pose2D::new(translation.x, translation.y, heading)
        }

        pub fn translation(&self) -> Translation2D {
            Translation2D::new(self.x, self.y)
        }

        pub fn is_finite(&self) -> bool {
            self.x.is_finite() && self.y.is_finite() && self.heading.is_finite()
        }

        /// Transform a point expressed in this pose's frame into the field frame
        pub fn transform_point(&self, local: Translation2D) -> Translation2D {
            self.translation() + Rotation2::new(self.heading) * local
        }
    }

    /// Chassis velocity: vx, vy in m/s, omega in rad/s
    ///
    /// Whether the linear components are robot- or field-relative depends on
    /// the producer; use the conversion helpers at frame boundaries.
    #[derive(Debug, Clone, Copy, PartialEq, Default)]
    pub struct ChassisVelocity {
        pub vx: f64,
        pub vy: f64,
        pub omega: f64,
    }

    impl ChassisVelocity {
        pub fn new(vx: f64, vy: f64, omega: f64) -> Self {
            ChassisVelocity { vx, vy, omega }
        }

        pub fn zero() -> Self {
            ChassisVelocity::default()
        }

        pub fn linear(&self) -> Translation2D {
            Translation2D::new(self.vx, self.vy)
        }

        /// Robot-relative speeds to field-relative, given the robot heading
        pub fn to_field_relative(&self, heading: f64) -> Self {
            let v = Rotation2::new(heading) * self.linear();
            ChassisVelocity::new(v.x, v.y, self.omega)
        }

        /// Field-relative speeds to robot-relative, given the robot heading
        pub fn to_robot_relative(&self, heading: f64) -> Self {
            let v = Rotation2::new(-heading) * self.linear();
            ChassisVelocity::new(v.x, v.y, self.omega)
        }
    }
}

/// Normalize an angle to (-pi, pi]
pub fn normalize_angle(angle: f64) -> f64 {
    let wrapped = (angle + PI).rem_euclid(2.0 * PI) - PI;
    if wrapped <= -PI {
        wrapped + 2.0 * PI
    } else {
        wrapped
    }
}

/// Wrap `value` into [min, max) treating the range as circular
pub fn input_modulus(value: f64, min: f64, max: f64) -> f64 {
    let span = max - min;
    min + (value - min).rem_euclid(span)
}

/// Field bearing from `from` to `to`, radians
pub fn bearing(from: types::Translation2D, to: types::Translation2D) -> f64 {
    let delta = to - from;
    delta.y.atan2(delta.x)
}

#[cfg(test)]
mod tests {
    use super::types::*;
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn normalize_keeps_range() {
        assert_abs_diff_eq!(normalize_angle(3.0 * PI), PI, epsilon = 1e-12);
        assert_abs_diff_eq!(normalize_angle(-PI), PI, epsilon = 1e-12);
        assert_abs_diff_eq!(normalize_angle(-0.5), -0.5, epsilon = 1e-12);
        assert_abs_diff_eq!(normalize_angle(2.0 * PI + 0.25), 0.25, epsilon = 1e-12);
    }

    #[test]
    fn field_relative_conversion_rotates_by_heading() {
        // Driving forward while facing +y moves the robot along +y on the field
        let robot = ChassisVelocity::new(1.0, 0.0, 0.3);
        let field = robot.to_field_relative(PI / 2.0);
        assert_abs_diff_eq!(field.vx, 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(field.vy, 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(field.omega, 0.3, epsilon = 1e-12);

        let back = field.to_robot_relative(PI / 2.0);
        assert_abs_diff_eq!(back.vx, 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(back.vy, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn strafing_left_facing_backwards_is_field_minus_y() {
        let robot = ChassisVelocity::new(0.0, 2.0, 0.0);
        let field = robot.to_field_relative(PI);
        assert_abs_diff_eq!(field.vx, 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(field.vy, -2.0, epsilon = 1e-12);
    }

    #[test]
    fn transform_point_uses_heading() {
        let pose = Pose2D::new(1.0, 1.0, PI / 2.0);
        let p = pose.transform_point(Translation2D::new(2.0, 0.0));
        assert_abs_diff_eq!(p.x, 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(p.y, 3.0, epsilon = 1e-12);
    }

    #[test]
    fn input_modulus_wraps() {
        assert_abs_diff_eq!(input_modulus(4.0, -PI, PI), 4.0 - 2.0 * PI, epsilon = 1e-12);
        assert_abs_diff_eq!(input_modulus(0.5, -PI, PI), 0.5, epsilon = 1e-12);
    }
}
