//! Mapping from 3D slice points onto a layer's 2D plane.
//!
//! The mapping is fixed per slicing axis, Z-up:
//!
//! | slicing axis | U | V |
//! |---|---|---|
//! | Z | X | Y |
//! | Y | X | Z |
//! | X | Y | Z |
//!
//! V always grows upward; [`Orientation`] records that for renderers whose
//! vertical axis points down.

use lamina_math::{Axis, Point2, Point3};
use serde::Serialize;

/// The 2D plane a layer is expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProjectionPlane {
    /// Slicing axis (the plane normal).
    pub axis: Axis,
    /// 3D axis mapped to horizontal U.
    pub u_axis: Axis,
    /// 3D axis mapped to vertical V.
    pub v_axis: Axis,
}

impl ProjectionPlane {
    /// The plane perpendicular to `axis`.
    pub fn for_axis(axis: Axis) -> Self {
        let (u_axis, v_axis) = match axis {
            Axis::Z => (Axis::X, Axis::Y),
            Axis::Y => (Axis::X, Axis::Z),
            Axis::X => (Axis::Y, Axis::Z),
        };
        Self {
            axis,
            u_axis,
            v_axis,
        }
    }

    /// Project a 3D point to (U, V).
    pub fn project(&self, p: &Point3) -> Point2 {
        Point2::new(self.u_axis.component(p), self.v_axis.component(p))
    }

    /// Project a run of points.
    pub fn project_all(&self, points: &[Point3]) -> Vec<Point2> {
        points.iter().map(|p| self.project(p)).collect()
    }
}

/// Sign convention of the U/V axes relative to the source model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Orientation {
    /// +1 when U grows to the right.
    pub u_sign: f64,
    /// +1 when V grows upward.
    pub v_sign: f64,
}

impl Orientation {
    /// U right, V up. The only convention the slicer emits.
    pub const V_UP: Self = Self {
        u_sign: 1.0,
        v_sign: 1.0,
    };

    /// Map a (U, V) point into a frame with the same U and a downward
    /// vertical axis whose origin sits at `top` (a renderer's y = 0).
    pub fn to_y_down(&self, p: &Point2, top: f64) -> Point2 {
        Point2::new(self.u_sign * p.x, top - self.v_sign * p.y)
    }
}

impl Default for Orientation {
    fn default() -> Self {
        Self::V_UP
    }
}
