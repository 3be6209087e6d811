//! 2D layer paths.

use lamina_math::Point2;
use serde::Serialize;

/// Whether a closed contour bounds material or cuts it away.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ContourKind {
    /// Outer boundary.
    #[default]
    Outer,
    /// Interior cutout.
    Hole,
}

/// A 2D path on a layer's projection plane.
///
/// A closed polyline repeats its first point as its last point.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Polyline {
    /// Points along the path.
    pub points: Vec<Point2>,
    /// Whether the path forms a loop.
    pub closed: bool,
    /// Outer boundary or hole; open paths are always `Outer`.
    pub kind: ContourKind,
}

impl Polyline {
    /// Create an untagged polyline.
    pub fn new(points: Vec<Point2>, closed: bool) -> Self {
        Self {
            points,
            closed,
            kind: ContourKind::Outer,
        }
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Number of points, including a closing duplicate.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Points without the closing duplicate.
    pub fn vertices(&self) -> &[Point2] {
        match self.points.split_last() {
            Some((last, rest)) if self.closed && rest.first() == Some(last) => rest,
            _ => &self.points,
        }
    }

    /// Number of distinct vertices.
    pub fn vertex_count(&self) -> usize {
        self.vertices().len()
    }

    /// Is this a hole?
    pub fn is_hole(&self) -> bool {
        self.kind == ContourKind::Hole
    }

    /// Total length of the path.
    pub fn length(&self) -> f64 {
        self.points.windows(2).map(|w| (w[1] - w[0]).norm()).sum()
    }

    /// Signed area of a closed path.
    /// Positive for counter-clockwise, negative for clockwise, zero when open.
    pub fn signed_area(&self) -> f64 {
        let pts = self.vertices();
        let n = pts.len();
        if !self.closed || n < 3 {
            return 0.0;
        }
        let mut area = 0.0;
        for i in 0..n {
            let j = (i + 1) % n;
            area += pts[i].x * pts[j].y;
            area -= pts[j].x * pts[i].y;
        }
        area / 2.0
    }

    /// Starting point.
    pub fn start(&self) -> Option<&Point2> {
        self.points.first()
    }

    /// Ending point.
    pub fn end(&self) -> Option<&Point2> {
        self.points.last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn unit_square() -> Polyline {
        Polyline::new(
            vec![
                Point2::new(0.0, 0.0),
                Point2::new(1.0, 0.0),
                Point2::new(1.0, 1.0),
                Point2::new(0.0, 1.0),
                Point2::new(0.0, 0.0),
            ],
            true,
        )
    }

    #[test]
    fn test_closed_vertices_drop_duplicate() {
        let square = unit_square();
        assert_eq!(square.len(), 5);
        assert_eq!(square.vertex_count(), 4);
        assert_eq!(square.start(), square.end());
        assert_eq!(square.kind, ContourKind::Outer);
    }

    #[test]
    fn test_area_and_length() {
        let square = unit_square();
        assert_relative_eq!(square.signed_area(), 1.0);
        assert_relative_eq!(square.length(), 4.0);

        let mut reversed = square.clone();
        reversed.points.reverse();
        assert_relative_eq!(reversed.signed_area(), -1.0);
    }

    #[test]
    fn test_open_path() {
        let line = Polyline::new(vec![Point2::new(0.0, 0.0), Point2::new(3.0, 4.0)], false);
        assert_eq!(line.vertex_count(), 2);
        assert_relative_eq!(line.length(), 5.0);
        assert_eq!(line.signed_area(), 0.0);
        assert!(!line.is_hole());
    }
}
