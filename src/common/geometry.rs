//! Target-centered shapes used for the shooting area

use super::types::Translation2D;

/// A circle around a fixed center
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ring {
    pub center: Translation2D,
    pub radius: f64,
}

impl Ring {
    pub fn new(center: Translation2D, radius: f64) -> Self {
        Ring { center, radius }
    }

    pub fn contains(&self, point: Translation2D) -> bool {
        (point - self.center).norm() <= self.radius
    }

    /// Distance from `point` to the ring boundary (zero on the boundary)
    pub fn boundary_distance(&self, point: Translation2D) -> f64 {
        ((point - self.center).norm() - self.radius).abs()
    }

    /// Closest point on the boundary to `point`.
    ///
    /// At the exact center every boundary point is equally close; +x is used.
    pub fn nearest_boundary_point(&self, point: Translation2D) -> Translation2D {
        let offset = point - self.center;
        let norm = offset.norm();
        if norm < f64::EPSILON {
            return self.center + Translation2D::new(self.radius, 0.0);
        }
        self.center + offset * (self.radius / norm)
    }
}
