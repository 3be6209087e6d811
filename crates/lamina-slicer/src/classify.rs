//! Outer/hole classification of closed contours.

use lamina_math::Point2;

use crate::path::{ContourKind, Polyline};

/// Check if a point is inside a polygon (ray casting).
///
/// `polygon` lists vertices without a closing duplicate.
pub fn point_in_polygon(point: &Point2, polygon: &[Point2]) -> bool {
    let n = polygon.len();
    if n < 3 {
        return false;
    }

    let mut inside = false;
    let mut j = n - 1;

    for i in 0..n {
        let pi = &polygon[i];
        let pj = &polygon[j];

        if ((pi.y > point.y) != (pj.y > point.y))
            && (point.x < (pj.x - pi.x) * (point.y - pi.y) / (pj.y - pi.y) + pi.x)
        {
            inside = !inside;
        }
        j = i;
    }

    inside
}

/// Tag every closed path lying wholly inside another closed path as a hole.
///
/// All other paths, open ones included, are tagged `Outer`. Quadratic in
/// the number of closed paths times their vertex count.
pub fn classify_contours(paths: &mut [Polyline]) {
    let polygons: Vec<(usize, &[Point2])> = paths
        .iter()
        .enumerate()
        .filter(|(_, p)| p.closed && p.vertex_count() >= 3)
        .map(|(i, p)| (i, p.vertices()))
        .collect();

    let mut holes = vec![false; paths.len()];
    for &(b, inner) in &polygons {
        holes[b] = polygons
            .iter()
            .any(|&(a, outer)| a != b && inner.iter().all(|p| point_in_polygon(p, outer)));
    }

    for (path, hole) in paths.iter_mut().zip(holes) {
        path.kind = if hole {
            ContourKind::Hole
        } else {
            ContourKind::Outer
        };
    }
}
