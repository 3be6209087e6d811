//! Plane–triangle intersection.

use lamina_math::{Axis, Point3};

/// An unordered pair of points where one triangle crosses a plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    /// First endpoint.
    pub a: Point3,
    /// Second endpoint.
    pub b: Point3,
}

impl Segment {
    /// Create a segment.
    pub fn new(a: Point3, b: Point3) -> Self {
        Self { a, b }
    }

    /// Squared length.
    pub fn length_squared(&self) -> f64 {
        (self.b - self.a).norm_squared()
    }
}

/// Intersect every triangle with the plane `axis = k`.
///
/// Output follows triangle order; triangles that do not yield exactly one
/// non-degenerate segment contribute nothing.
pub fn intersect_plane<I>(triangles: I, axis: Axis, k: f64, epsilon: f64) -> Vec<Segment>
where
    I: IntoIterator<Item = [Point3; 3]>,
{
    triangles
        .into_iter()
        .filter_map(|tri| intersect_triangle(&tri, axis, k, epsilon))
        .collect()
}

/// Intersect one triangle with the plane `axis = k`.
///
/// Each edge is tested parametrically. Edges parallel to the plane are
/// skipped. The triangle yields a segment only if exactly two edge hits are
/// found and they are not coincident; vertex-on-plane and coplanar cases
/// (one or three hits) are dropped.
pub fn intersect_triangle(tri: &[Point3; 3], axis: Axis, k: f64, epsilon: f64) -> Option<Segment> {
    let mut hits: [Point3; 3] = [Point3::origin(); 3];
    let mut count = 0;

    for (p, q) in [(tri[0], tri[1]), (tri[1], tri[2]), (tri[2], tri[0])] {
        if let Some(hit) = edge_hit(&p, &q, axis, k, epsilon) {
            hits[count] = hit;
            count += 1;
        }
    }

    if count != 2 {
        return None;
    }

    let segment = Segment::new(hits[0], hits[1]);
    if segment.length_squared() < epsilon * epsilon {
        return None;
    }
    Some(segment)
}

fn edge_hit(p: &Point3, q: &Point3, axis: Axis, k: f64, epsilon: f64) -> Option<Point3> {
    let cp = axis.component(p);
    let cq = axis.component(q);
    let delta = cq - cp;
    if delta.abs() < epsilon {
        return None;
    }

    let t = (k - cp) / delta;
    if !(-epsilon..=1.0 + epsilon).contains(&t) {
        return None;
    }

    let mut hit = p + (q - p) * t;
    // Interpolation noise must not move the point off the plane.
    hit[axis.index()] = k;
    Some(hit)
}
