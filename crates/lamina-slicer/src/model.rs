//! Vector models: a layer's paths packaged for renderers and exporters.

use lamina_math::Point2;
use serde::Serialize;

use crate::path::{ContourKind, Polyline};
use crate::projection::{Orientation, ProjectionPlane};
use crate::slice::Layer;

/// One drawing command of a vector path.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PathCommand {
    /// Start a new subpath.
    MoveTo(Point2),
    /// Straight line to a point.
    LineTo(Point2),
    /// Straight line back to the subpath start.
    Close,
}

/// A single outline as drawing commands.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VectorPath {
    /// Commands in drawing order.
    pub commands: Vec<PathCommand>,
    /// Outer boundary or hole.
    pub kind: ContourKind,
    /// Whether the path ends with [`PathCommand::Close`].
    pub closed: bool,
}

impl VectorPath {
    /// Convert a polyline; a closed one drops its duplicate end for `Close`.
    pub fn from_polyline(polyline: &Polyline) -> Self {
        let pts = if polyline.closed {
            polyline.vertices()
        } else {
            &polyline.points[..]
        };

        let mut commands = Vec::with_capacity(pts.len() + 1);
        if let Some((first, rest)) = pts.split_first() {
            commands.push(PathCommand::MoveTo(*first));
            commands.extend(rest.iter().map(|p| PathCommand::LineTo(*p)));
            if polyline.closed {
                commands.push(PathCommand::Close);
            }
        }

        Self {
            commands,
            kind: polyline.kind,
            closed: polyline.closed,
        }
    }

    /// Points referenced by the commands.
    pub fn points(&self) -> impl Iterator<Item = &Point2> {
        self.commands.iter().filter_map(|c| match c {
            PathCommand::MoveTo(p) | PathCommand::LineTo(p) => Some(p),
            PathCommand::Close => None,
        })
    }
}

/// Axis-aligned rectangle in U/V.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Extents {
    /// Minimum U.
    pub min_u: f64,
    /// Minimum V.
    pub min_v: f64,
    /// Maximum U.
    pub max_u: f64,
    /// Maximum V.
    pub max_v: f64,
}

impl Extents {
    /// Tightest rectangle around `points`; a zero box at the origin when empty.
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Point2>) -> Self {
        let mut iter = points.into_iter();
        let Some(first) = iter.next() else {
            return Self::default();
        };
        iter.fold(
            Self {
                min_u: first.x,
                min_v: first.y,
                max_u: first.x,
                max_v: first.y,
            },
            |e, p| Self {
                min_u: e.min_u.min(p.x),
                min_v: e.min_v.min(p.y),
                max_u: e.max_u.max(p.x),
                max_v: e.max_v.max(p.y),
            },
        )
    }

    /// Width along U.
    pub fn width(&self) -> f64 {
        self.max_u - self.min_u
    }

    /// Height along V.
    pub fn height(&self) -> f64 {
        self.max_v - self.min_v
    }
}

/// A layer's outlines with everything needed to place them in a 2D scene.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VectorModel {
    /// Source layer index.
    pub layer_index: usize,
    /// Plane coordinate along the slicing axis.
    pub coordinate: f64,
    /// Slicing axis and U/V mapping.
    pub plane: ProjectionPlane,
    /// U/V sign convention.
    pub orientation: Orientation,
    /// Bounding rectangle of all paths.
    pub extents: Extents,
    /// Outlines.
    pub paths: Vec<VectorPath>,
}

impl VectorModel {
    /// Assemble the model for one layer.
    pub fn from_layer(layer: &Layer) -> Self {
        let paths: Vec<VectorPath> = layer.paths.iter().map(VectorPath::from_polyline).collect();
        let extents = Extents::from_points(paths.iter().flat_map(|p| p.points()));
        Self {
            layer_index: layer.index,
            coordinate: layer.coordinate,
            plane: layer.plane,
            orientation: Orientation::V_UP,
            extents,
            paths,
        }
    }

    /// True when the layer cut nothing.
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}
