//! Layer scheduling along the slicing axis.

use lamina_math::Axis;
use lamina_mesh::BoundingBox;
use serde::Serialize;
use tracing::warn;

/// Upper bound on layers for absurdly small thicknesses.
pub const MAX_LAYER_COUNT: usize = 100_000;

/// Evenly spaced plane coordinates covering a mesh from face to face.
///
/// The requested thickness is a target: the spacing is recomputed so that
/// the first layer sits on the minimum and the last on the maximum.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LayerSchedule {
    start: f64,
    end: f64,
    count: usize,
    spacing: f64,
    thickness: f64,
}

impl LayerSchedule {
    /// Plan layers for `bounds` along `axis` with a target `thickness`.
    ///
    /// Zero, negative or non-finite thickness and zero-extent meshes always
    /// yield exactly two layers. A zero-extent mesh gets two layers at the
    /// same coordinate.
    pub fn plan(bounds: &BoundingBox, axis: Axis, thickness: f64) -> Self {
        let (start, end) = bounds.range(axis);
        let total = (end - start).max(0.0);

        let count = if total > 0.0 && thickness > 0.0 && thickness.is_finite() {
            let wanted = (total / thickness).ceil();
            if wanted > MAX_LAYER_COUNT as f64 {
                warn!(
                    requested = wanted,
                    max = MAX_LAYER_COUNT,
                    "layer count clamped"
                );
                MAX_LAYER_COUNT
            } else {
                (wanted as usize).max(2)
            }
        } else {
            2
        };

        let spacing = if count > 1 {
            total / (count - 1) as f64
        } else {
            0.0
        };

        Self {
            start,
            end: if total > 0.0 { end } else { start },
            count,
            spacing,
            thickness,
        }
    }

    /// Number of layers (always at least 2).
    pub fn count(&self) -> usize {
        self.count
    }

    /// Distance between consecutive layers.
    pub fn spacing(&self) -> f64 {
        self.spacing
    }

    /// The thickness that was asked for.
    pub fn requested_thickness(&self) -> f64 {
        self.thickness
    }

    /// Plane coordinate of layer `index`, or `None` past the last layer.
    ///
    /// The last layer is pinned to the range end so rounding cannot move it.
    pub fn coordinate(&self, index: usize) -> Option<f64> {
        if index >= self.count {
            None
        } else if index + 1 == self.count {
            Some(self.end)
        } else {
            Some(self.start + index as f64 * self.spacing)
        }
    }

    /// All plane coordinates in layer order.
    pub fn coordinates(&self) -> Vec<f64> {
        (0..self.count).filter_map(|i| self.coordinate(i)).collect()
    }
}
