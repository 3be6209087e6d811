#![warn(missing_docs)]

//! Math types for the lamina slicing engine.
//!
//! Thin wrappers around nalgebra providing the domain types shared by
//! the mesh and slicer crates: points, vectors, principal axes, and
//! tolerance-based comparison.

use std::fmt;
use std::str::FromStr;

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A point in 3D space.
pub type Point3 = nalgebra::Point3<f64>;

/// A vector in 3D space.
pub type Vec3 = Vector3<f64>;

/// A point in a 2D projection plane.
pub type Point2 = nalgebra::Point2<f64>;

/// One of the three principal axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    /// The X axis.
    X,
    /// The Y axis.
    Y,
    /// The Z axis (up).
    #[default]
    Z,
}

impl Axis {
    /// All three axes in index order.
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    /// Component index into a coordinate triple.
    pub fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }

    /// The coordinate of `p` along this axis.
    pub fn component(self, p: &Point3) -> f64 {
        p[self.index()]
    }

    /// Lowercase axis name.
    pub fn name(self) -> &'static str {
        match self {
            Axis::X => "x",
            Axis::Y => "y",
            Axis::Z => "z",
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when parsing an [`Axis`] from text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown axis {0:?} (expected x, y or z)")]
pub struct ParseAxisError(pub String);

impl FromStr for Axis {
    type Err = ParseAxisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "x" => Ok(Axis::X),
            "y" => Ok(Axis::Y),
            "z" => Ok(Axis::Z),
            _ => Err(ParseAxisError(s.to_string())),
        }
    }
}

/// Distance tolerance for geometric comparisons.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerance {
    /// Linear distance tolerance in model units.
    pub linear: f64,
}

impl Tolerance {
    /// Default tolerance (1e-6 model units).
    pub const DEFAULT: Self = Self { linear: 1e-6 };

    /// Create a tolerance with the given linear distance.
    pub const fn new(linear: f64) -> Self {
        Self { linear }
    }

    /// Check if two points are coincident within tolerance.
    pub fn points_equal(&self, a: &Point3, b: &Point3) -> bool {
        (a - b).norm() < self.linear
    }

    /// Quantize a point onto the tolerance grid.
    ///
    /// Points closer than `linear` land in the same or an adjacent cell.
    pub fn grid_key(&self, p: &Point3) -> [i64; 3] {
        let q = |v: f64| (v / self.linear).round() as i64;
        [q(p.x), q(p.y), q(p.z)]
    }
}

impl Default for Tolerance {
    fn default() -> Self {
        Self::DEFAULT
    }
}
