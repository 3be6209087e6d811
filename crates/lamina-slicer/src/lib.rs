#![warn(missing_docs)]

//! Mesh cross-section slicing for laser cutting.
//!
//! This crate cuts a closed triangle mesh with evenly spaced planes along a
//! principal axis and turns each cross-section into 2D outlines: closed
//! where the section is closed, tagged as outer boundary or hole, and
//! expressed in a fixed U/V frame per axis.
//!
//! # Example
//!
//! ```no_run
//! use lamina_slicer::{load_mesh, slice_mesh, Axis};
//!
//! let bytes = std::fs::read("part.stl").unwrap();
//! let mesh = load_mesh(&bytes).unwrap();
//! let result = slice_mesh(&mesh, Axis::Z, 3.0);
//!
//! for model in result.models() {
//!     println!("layer {}: {} paths", model.layer_index, model.paths.len());
//! }
//! ```

pub mod classify;
pub mod contour;
pub mod error;
pub mod intersect;
pub mod model;
pub mod path;
pub mod projection;
pub mod schedule;
pub mod slice;

pub use classify::{classify_contours, point_in_polygon};
pub use contour::{reconstruct, Chain};
pub use error::{Result, SlicerError};
pub use intersect::{intersect_plane, intersect_triangle, Segment};
pub use lamina_math::{Axis, Point2, Point3};
pub use lamina_mesh::{load_mesh, BoundingBox, Mesh, MeshError};
pub use model::{Extents, PathCommand, VectorModel, VectorPath};
pub use path::{ContourKind, Polyline};
pub use projection::{Orientation, ProjectionPlane};
pub use schedule::LayerSchedule;
pub use slice::{slice_layer, slice_layers, Layer};

use serde::{Deserialize, Serialize};

/// Distances used by the intersector and the contour reconstructor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tolerances {
    /// Parallel-edge, edge-parameter and zero-length cutoff for intersection.
    pub plane_epsilon: f64,
    /// Distance under which segment endpoints merge into one node.
    pub node_tolerance: f64,
    /// Looser endpoint distance for the last-resort chaining pass.
    pub fallback_tolerance: f64,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            plane_epsilon: 1e-9,
            node_tolerance: 1e-6,
            fallback_tolerance: 1e-3,
        }
    }
}

/// Slicing parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SliceSettings {
    /// Slicing axis.
    pub axis: Axis,
    /// Target layer thickness (model units). Zero or negative gives two layers.
    pub layer_thickness: f64,
    /// Geometric tolerances.
    pub tolerances: Tolerances,
}

impl Default for SliceSettings {
    fn default() -> Self {
        Self {
            axis: Axis::Z,
            layer_thickness: 3.0,
            tolerances: Tolerances::default(),
        }
    }
}

impl SliceSettings {
    /// Validate settings.
    ///
    /// Any thickness is accepted; only tolerances can be invalid.
    pub fn validate(&self) -> Result<()> {
        let tol = &self.tolerances;
        for (name, value) in [
            ("plane_epsilon", tol.plane_epsilon),
            ("node_tolerance", tol.node_tolerance),
            ("fallback_tolerance", tol.fallback_tolerance),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(SlicerError::InvalidSettings(format!(
                    "{} must be positive and finite, got {}",
                    name, value
                )));
            }
        }
        if tol.fallback_tolerance < tol.node_tolerance {
            return Err(SlicerError::InvalidSettings(
                "fallback_tolerance must not be smaller than node_tolerance".into(),
            ));
        }
        Ok(())
    }
}

/// Counts over a whole slicing run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SliceStats {
    /// Number of layers.
    pub layer_count: usize,
    /// Number of paths over all layers.
    pub path_count: usize,
    /// Closed paths.
    pub closed_count: usize,
    /// Open paths.
    pub open_count: usize,
    /// Closed paths tagged as holes.
    pub hole_count: usize,
}

/// Result of slicing a mesh.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SliceResult {
    /// Slicing axis.
    pub axis: Axis,
    /// Bounding box of the sliced mesh.
    pub bounds: BoundingBox,
    /// Layers in index order.
    pub layers: Vec<Layer>,
}

impl SliceResult {
    /// One vector model per layer, in layer order.
    pub fn models(&self) -> Vec<VectorModel> {
        self.layers.iter().map(VectorModel::from_layer).collect()
    }

    /// Path counts.
    pub fn stats(&self) -> SliceStats {
        let paths = || self.layers.iter().flat_map(|l| l.paths.iter());
        SliceStats {
            layer_count: self.layers.len(),
            path_count: paths().count(),
            closed_count: paths().filter(|p| p.closed).count(),
            open_count: paths().filter(|p| !p.closed).count(),
            hole_count: paths().filter(|p| p.is_hole()).count(),
        }
    }
}

/// Slice a mesh along `axis` with default tolerances.
///
/// Never fails: degenerate geometry yields fewer, shorter or open paths, and
/// degenerate thickness or bounds yield exactly two layers.
pub fn slice_mesh(mesh: &Mesh, axis: Axis, layer_thickness: f64) -> SliceResult {
    slice_unchecked(mesh, axis, layer_thickness, &Tolerances::default())
}

/// Slice a mesh with explicit settings.
///
/// # Errors
///
/// Returns [`SlicerError::InvalidSettings`] if the tolerances are unusable.
pub fn slice_with_settings(mesh: &Mesh, settings: &SliceSettings) -> Result<SliceResult> {
    settings.validate()?;
    Ok(slice_unchecked(
        mesh,
        settings.axis,
        settings.layer_thickness,
        &settings.tolerances,
    ))
}

/// Load STL bytes and slice them with `settings`.
///
/// # Errors
///
/// Returns [`SlicerError::Mesh`] if the bytes do not hold a usable mesh and
/// [`SlicerError::InvalidSettings`] if the tolerances are unusable.
pub fn slice_bytes(bytes: &[u8], settings: &SliceSettings) -> Result<SliceResult> {
    settings.validate()?;
    let mesh = load_mesh(bytes)?;
    slice_with_settings(&mesh, settings)
}

fn slice_unchecked(
    mesh: &Mesh,
    axis: Axis,
    layer_thickness: f64,
    tolerances: &Tolerances,
) -> SliceResult {
    let bounds = *mesh.bounds();
    let schedule = LayerSchedule::plan(&bounds, axis, layer_thickness);
    SliceResult {
        axis,
        bounds,
        layers: slice_layers(mesh, axis, &schedule, tolerances),
    }
}
