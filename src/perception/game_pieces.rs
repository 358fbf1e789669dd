//! Game pieces reported by the intake camera

use crate::common::bearing;
use crate::common::types::{Pose2D, Translation2D};

/// Convert robot-relative detections into field coordinates
pub fn to_field_frame(pose: &Pose2D, detections: &[Translation2D]) -> Vec<Translation2D> {
    detections
        .iter()
        .filter(|d| d.x.is_finite() && d.y.is_finite())
        .map(|d| pose.transform_point(*d))
        .collect()
}

/// Closest field-frame piece to the robot
pub fn nearest_piece(pose: &Pose2D, pieces: &[Translation2D]) -> Option<Translation2D> {
    let robot = pose.translation();
    pieces
        .iter()
        .copied()
        .min_by(|a, b| (a - robot).norm().total_cmp(&(b - robot).norm()))
}

/// Pose at the piece, facing it from where the robot is now
pub fn pickup_pose(pose: &Pose2D, piece: Translation2D) -> Pose2D {
    let robot = pose.translation();
    let heading = if (piece - robot).norm() < f64::EPSILON {
        pose.heading
    } else {
        bearing(robot, piece)
    };
    Pose2D::from_translation(piece, heading)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn detections_rotate_with_heading() {
        let pose = Pose2D::new(1.0, 2.0, FRAC_PI_2);
        let field = to_field_frame(&pose, &[Translation2D::new(1.0, 0.0)]);
        assert_abs_diff_eq!(field[0].x, 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(field[0].y, 3.0, epsilon = 1e-12);
    }

    #[test]
    fn non_finite_detections_are_dropped() {
        let pose = Pose2D::default();
        let field = to_field_frame(&pose, &[Translation2D::new(f64::NAN, 0.0), Translation2D::new(1.0, 1.0)]);
        assert_eq!(field.len(), 1);
    }

    #[test]
    fn nearest_and_facing() {
        let pose = Pose2D::new(0.0, 0.0, 0.0);
        let pieces = [Translation2D::new(3.0, 0.0), Translation2D::new(0.0, 1.0)];
        let piece = nearest_piece(&pose, &pieces).unwrap();
        assert_eq!(piece, Translation2D::new(0.0, 1.0));
        let goal = pickup_pose(&pose, piece);
        assert_abs_diff_eq!(goal.heading, FRAC_PI_2, epsilon = 1e-12);
        assert!(nearest_piece(&pose, &[]).is_none());
    }
}
