//! Axis-aligned bounding boxes.

use lamina_math::{Axis, Point3, Vec3};
use serde::{Deserialize, Serialize};

/// An axis-aligned box given by its min and max corners.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Minimum corner.
    pub min: Point3,
    /// Maximum corner.
    pub max: Point3,
}

impl BoundingBox {
    /// Create a box from two corners.
    pub fn new(min: Point3, max: Point3) -> Self {
        Self { min, max }
    }

    /// A zero-size box at the origin.
    pub fn zero() -> Self {
        Self::new(Point3::origin(), Point3::origin())
    }

    /// Tightest box containing all `points`, or `None` if there are none.
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Point3>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = *iter.next()?;
        let mut bbox = Self::new(first, first);
        for p in iter {
            bbox.include(p);
        }
        Some(bbox)
    }

    /// Tightest box over a flat `[x0, y0, z0, x1, ...]` position buffer.
    ///
    /// An empty buffer yields [`BoundingBox::zero`].
    pub fn from_positions(positions: &[f32]) -> Self {
        let points: Vec<Point3> = positions
            .chunks_exact(3)
            .map(|c| Point3::new(c[0] as f64, c[1] as f64, c[2] as f64))
            .collect();
        Self::from_points(&points).unwrap_or_else(Self::zero)
    }

    /// Grow the box to contain `p`.
    pub fn include(&mut self, p: &Point3) {
        for i in 0..3 {
            self.min[i] = self.min[i].min(p[i]);
            self.max[i] = self.max[i].max(p[i]);
        }
    }

    /// `(min, max)` along `axis`.
    pub fn range(&self, axis: Axis) -> (f64, f64) {
        (axis.component(&self.min), axis.component(&self.max))
    }

    /// Length of the box along `axis`, never negative.
    pub fn extent(&self, axis: Axis) -> f64 {
        let (lo, hi) = self.range(axis);
        (hi - lo).max(0.0)
    }

    /// Size along all three axes.
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    /// True when the box has zero size along every axis.
    pub fn is_point(&self) -> bool {
        Axis::ALL.iter().all(|&a| self.extent(a) == 0.0)
    }
}
