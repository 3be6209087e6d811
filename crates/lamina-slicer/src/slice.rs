//! Mesh slicing - intersect a triangle mesh with planes along one axis.

use lamina_math::{Axis, Point3, Tolerance};
use lamina_mesh::Mesh;
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info};

use crate::classify::classify_contours;
use crate::contour::reconstruct;
use crate::error::{Result, SlicerError};
use crate::intersect::intersect_plane;
use crate::path::Polyline;
use crate::projection::ProjectionPlane;
use crate::schedule::LayerSchedule;
use crate::Tolerances;

/// A single cross-section.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Layer {
    /// Layer index (0 = at the minimum of the axis range).
    pub index: usize,
    /// Plane coordinate along the slicing axis.
    pub coordinate: f64,
    /// Requested layer thickness.
    pub thickness: f64,
    /// Actual distance between layers after fitting the range.
    pub spacing: f64,
    /// U/V mapping of the paths.
    pub plane: ProjectionPlane,
    /// Outlines, classified as outer or hole.
    pub paths: Vec<Polyline>,
}

impl Layer {
    /// Check if the plane cut nothing.
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Outer boundaries.
    pub fn outers(&self) -> impl Iterator<Item = &Polyline> {
        self.paths.iter().filter(|p| !p.is_hole())
    }

    /// Interior cutouts.
    pub fn holes(&self) -> impl Iterator<Item = &Polyline> {
        self.paths.iter().filter(|p| p.is_hole())
    }
}

/// Slice every scheduled layer of `mesh`.
///
/// Layers are computed in parallel and returned in index order.
pub fn slice_layers(
    mesh: &Mesh,
    axis: Axis,
    schedule: &LayerSchedule,
    tolerances: &Tolerances,
) -> Vec<Layer> {
    info!(
        %axis,
        layers = schedule.count(),
        spacing = schedule.spacing(),
        triangles = mesh.num_triangles(),
        "Starting mesh slicing"
    );

    let triangles: Vec<[Point3; 3]> = mesh.triangles().collect();
    let layers: Vec<Layer> = schedule
        .coordinates()
        .into_par_iter()
        .enumerate()
        .map(|(index, coordinate)| {
            build_layer(&triangles, axis, schedule, index, coordinate, tolerances)
        })
        .collect();

    info!(
        paths = layers.iter().map(|l| l.paths.len()).sum::<usize>(),
        empty_layers = layers.iter().filter(|l| l.is_empty()).count(),
        "Slicing complete"
    );
    layers
}

/// Slice a single scheduled layer.
///
/// Pure in its inputs, so callers may batch or cancel per layer.
///
/// # Errors
///
/// Returns [`SlicerError::LayerOutOfRange`] if `index` is not below
/// `schedule.count()`.
pub fn slice_layer(
    mesh: &Mesh,
    axis: Axis,
    schedule: &LayerSchedule,
    index: usize,
    tolerances: &Tolerances,
) -> Result<Layer> {
    let coordinate = schedule
        .coordinate(index)
        .ok_or(SlicerError::LayerOutOfRange {
            index,
            count: schedule.count(),
        })?;
    let triangles: Vec<[Point3; 3]> = mesh.triangles().collect();
    Ok(build_layer(
        &triangles, axis, schedule, index, coordinate, tolerances,
    ))
}

fn build_layer(
    triangles: &[[Point3; 3]],
    axis: Axis,
    schedule: &LayerSchedule,
    index: usize,
    coordinate: f64,
    tolerances: &Tolerances,
) -> Layer {
    let plane = ProjectionPlane::for_axis(axis);

    let segments = intersect_plane(
        triangles.iter().copied(),
        axis,
        coordinate,
        tolerances.plane_epsilon,
    );
    let chains = reconstruct(
        &segments,
        Tolerance::new(tolerances.node_tolerance),
        Tolerance::new(tolerances.fallback_tolerance),
    );

    let mut paths: Vec<Polyline> = chains
        .iter()
        .map(|chain| Polyline::new(plane.project_all(&chain.points), chain.closed))
        .collect();
    classify_contours(&mut paths);

    debug!(
        index,
        coordinate,
        segments = segments.len(),
        paths = paths.len(),
        "Sliced layer"
    );

    Layer {
        index,
        coordinate,
        thickness: schedule.requested_thickness(),
        spacing: schedule.spacing(),
        plane,
        paths,
    }
}
