//! Contour reconstruction.
//!
//! Turns the unordered segment soup of one layer into ordered chains of
//! points. Segment endpoints are merged into graph nodes on a tolerance
//! grid; segments become edges. Chains are then extracted in passes:
//!
//! 1. clean closed loops starting from nodes with exactly two edges
//! 2. the remainder, grown in both directions from every unused node
//! 3. edges neither pass walked (chords between visited nodes), chained
//!    along each other
//! 4. if nothing came out of the graph at all, a nearest-endpoint chaining
//!    of the raw segments under a looser tolerance
//!
//! Every traversal is an explicit loop; nothing recurses, so layers with
//! thousands of segments are fine.

use std::collections::{HashMap, HashSet, VecDeque};

use lamina_math::{Point3, Tolerance};
use tracing::warn;

use crate::intersect::Segment;

/// An ordered run of points on the slicing plane.
///
/// A closed chain repeats its first point as its last point.
#[derive(Debug, Clone, PartialEq)]
pub struct Chain {
    /// Points in traversal order.
    pub points: Vec<Point3>,
    /// Whether the chain forms a loop.
    pub closed: bool,
}

impl Chain {
    /// Total length along the points.
    pub fn length(&self) -> f64 {
        self.points.windows(2).map(|w| (w[1] - w[0]).norm()).sum()
    }
}

/// Endpoint graph with tolerance-merged nodes.
struct SegmentGraph {
    nodes: Vec<Point3>,
    adjacency: Vec<Vec<usize>>,
    cells: HashMap<[i64; 3], Vec<usize>>,
    tolerance: Tolerance,
}

impl SegmentGraph {
    fn build(segments: &[Segment], tolerance: Tolerance) -> Self {
        let mut graph = Self {
            nodes: Vec::with_capacity(segments.len()),
            adjacency: Vec::with_capacity(segments.len()),
            cells: HashMap::with_capacity(segments.len()),
            tolerance,
        };
        for seg in segments {
            let a = graph.node_for(&seg.a);
            let b = graph.node_for(&seg.b);
            graph.connect(a, b);
        }
        graph
    }

    fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Id of the node within tolerance of `p`, creating one if none exists.
    fn node_for(&mut self, p: &Point3) -> usize {
        let key = self.tolerance.grid_key(p);

        // Points within tolerance are at most one grid cell apart per axis.
        let mut best: Option<(usize, f64)> = None;
        for dx in -1..=1 {
            for dy in -1..=1 {
                for dz in -1..=1 {
                    let cell = [key[0] + dx, key[1] + dy, key[2] + dz];
                    let Some(ids) = self.cells.get(&cell) else {
                        continue;
                    };
                    for &id in ids {
                        let d = (self.nodes[id] - p).norm();
                        if d < self.tolerance.linear && best.map_or(true, |(_, bd)| d < bd) {
                            best = Some((id, d));
                        }
                    }
                }
            }
        }
        if let Some((id, _)) = best {
            return id;
        }

        let id = self.nodes.len();
        self.nodes.push(*p);
        self.adjacency.push(Vec::new());
        self.cells.entry(key).or_default().push(id);
        id
    }

    fn connect(&mut self, a: usize, b: usize) {
        // Self-loops come from segments shorter than the merge tolerance.
        if a == b || self.adjacency[a].contains(&b) {
            return;
        }
        self.adjacency[a].push(b);
        self.adjacency[b].push(a);
    }

    fn neighbors(&self, n: usize) -> &[usize] {
        &self.adjacency[n]
    }

    fn degree(&self, n: usize) -> usize {
        self.adjacency[n].len()
    }

    fn adjacent(&self, a: usize, b: usize) -> bool {
        self.adjacency[a].contains(&b)
    }

    fn unused_degree(&self, n: usize, used: &[bool]) -> usize {
        self.adjacency[n].iter().filter(|&&m| !used[m]).count()
    }

    fn positions(&self, ids: &[usize]) -> Vec<Point3> {
        ids.iter().map(|&id| self.nodes[id]).collect()
    }
}

/// Graph edges already emitted as part of a chain.
#[derive(Default)]
struct Traversed(HashSet<(usize, usize)>);

impl Traversed {
    fn key(a: usize, b: usize) -> (usize, usize) {
        (a.min(b), a.max(b))
    }

    fn mark_path(&mut self, ids: &[usize]) {
        for w in ids.windows(2) {
            self.0.insert(Self::key(w[0], w[1]));
        }
    }

    fn contains(&self, a: usize, b: usize) -> bool {
        self.0.contains(&Self::key(a, b))
    }

    fn insert(&mut self, a: usize, b: usize) {
        self.0.insert(Self::key(a, b));
    }
}

/// Stitch one layer's segments into chains.
///
/// `node_tolerance` merges endpoints into graph nodes; `fallback_tolerance`
/// is the looser distance used only when the graph yields nothing. Never
/// fails: ambiguous input produces more, shorter or open chains.
pub fn reconstruct(
    segments: &[Segment],
    node_tolerance: Tolerance,
    fallback_tolerance: Tolerance,
) -> Vec<Chain> {
    if segments.is_empty() {
        return Vec::new();
    }

    let graph = SegmentGraph::build(segments, node_tolerance);
    let mut used = vec![false; graph.len()];
    let mut traversed = Traversed::default();

    let mut chains = closed_loops(&graph, &mut used, &mut traversed);
    chains.extend(remainder_paths(&graph, &mut used, &mut traversed));
    chains.extend(leftover_edges(&graph, &mut traversed));

    let tolerance = if chains.is_empty() {
        warn!(
            segments = segments.len(),
            "graph stitching found no contours, chaining raw segments"
        );
        chains = chain_nearest(segments, fallback_tolerance);
        fallback_tolerance
    } else {
        node_tolerance
    };

    for chain in &mut chains {
        close_coincident_ends(chain, tolerance);
    }
    chains
}

/// Closed-loop pass: walk from every unused two-edge node until the walk
/// comes back around.
fn closed_loops(
    graph: &SegmentGraph,
    used: &mut [bool],
    traversed: &mut Traversed,
) -> Vec<Chain> {
    let mut loops = Vec::new();

    for start in 0..graph.len() {
        if used[start] || graph.degree(start) != 2 {
            continue;
        }

        used[start] = true;
        let mut walk = vec![start];
        let mut current = start;
        let closed = loop {
            if walk.len() >= 3 && graph.adjacent(current, start) {
                break true;
            }
            match graph.neighbors(current).iter().copied().find(|&n| !used[n]) {
                Some(next) => {
                    used[next] = true;
                    walk.push(next);
                    current = next;
                }
                None => break false,
            }
        };

        if closed {
            walk.push(start);
            let chain = Chain {
                points: graph.positions(&walk),
                closed: true,
            };
            if chain.length() > 0.0 {
                traversed.mark_path(&walk);
                loops.push(chain);
                continue;
            }
        }

        // Leave the nodes for the remainder pass.
        for &n in &walk {
            used[n] = false;
        }
    }

    loops
}

/// Remainder pass: grow a path both ways from every unused node, preferring
/// the neighbour with the fewest remaining connections at branch points.
fn remainder_paths(
    graph: &SegmentGraph,
    used: &mut [bool],
    traversed: &mut Traversed,
) -> Vec<Chain> {
    let mut paths = Vec::new();

    for seed in 0..graph.len() {
        if used[seed] || graph.degree(seed) == 0 {
            continue;
        }
        used[seed] = true;

        let mut forward = vec![seed];
        grow(graph, used, &mut forward);
        let mut backward = vec![seed];
        grow(graph, used, &mut backward);

        let mut ids: Vec<usize> = backward.into_iter().skip(1).rev().collect();
        ids.extend(forward);
        attach_ends(graph, &mut ids);
        if ids.len() < 2 {
            continue;
        }

        let first = ids[0];
        let last = ids[ids.len() - 1];
        let closed = ids.len() >= 3
            && (graph
                .tolerance
                .points_equal(&graph.nodes[first], &graph.nodes[last])
                || graph.adjacent(first, last));
        if closed {
            ids.push(first);
        }

        traversed.mark_path(&ids);
        paths.push(Chain {
            points: graph.positions(&ids),
            closed,
        });
    }

    paths
}

fn grow(graph: &SegmentGraph, used: &mut [bool], path: &mut Vec<usize>) {
    while let Some(&tail) = path.last() {
        let next = graph
            .neighbors(tail)
            .iter()
            .copied()
            .filter(|&n| !used[n])
            .min_by_key(|&n| (graph.unused_degree(n, used), n));
        let Some(next) = next else {
            break;
        };
        used[next] = true;
        path.push(next);
    }
}

/// Extend both ends of a grown path by one edge onto an already used node.
///
/// Every edge touching a node that was still unused is untraversed, so this
/// keeps spurs and loops that share a node with an earlier contour.
fn attach_ends(graph: &SegmentGraph, ids: &mut Vec<usize>) {
    let Some(&tail) = ids.last() else {
        return;
    };
    if let Some(&m) = graph.neighbors(tail).iter().find(|m| !ids.contains(m)) {
        ids.push(m);
    }
    let head = ids[0];
    if let Some(&m) = graph.neighbors(head).iter().find(|m| !ids.contains(m)) {
        ids.insert(0, m);
    }
}

/// Chord pass: chain every edge no earlier pass walked.
///
/// Each chain follows untraversed edges from a starting edge, lowest node
/// id first, and is closed when it returns to its first node.
fn leftover_edges(graph: &SegmentGraph, traversed: &mut Traversed) -> Vec<Chain> {
    let mut chains = Vec::new();

    for start in 0..graph.len() {
        loop {
            let next = graph
                .neighbors(start)
                .iter()
                .copied()
                .filter(|&m| !traversed.contains(start, m))
                .min();
            let Some(next) = next else {
                break;
            };
            traversed.insert(start, next);
            let mut ids = VecDeque::from([start, next]);
            extend_untraversed(graph, traversed, &mut ids);

            let ids: Vec<usize> = ids.into();
            let closed = ids.len() >= 4 && ids[0] == ids[ids.len() - 1];
            chains.push(Chain {
                points: graph.positions(&ids),
                closed,
            });
        }
    }

    chains
}

fn extend_untraversed(
    graph: &SegmentGraph,
    traversed: &mut Traversed,
    ids: &mut VecDeque<usize>,
) {
    let untraversed = |traversed: &Traversed, n: usize| {
        graph
            .neighbors(n)
            .iter()
            .copied()
            .filter(|&m| !traversed.contains(n, m))
            .min()
    };

    while let Some(&tail) = ids.back() {
        if ids.len() > 2 && ids.front() == Some(&tail) {
            return;
        }
        let Some(next) = untraversed(traversed, tail) else {
            break;
        };
        traversed.insert(tail, next);
        ids.push_back(next);
    }
    while let Some(&head) = ids.front() {
        let Some(prev) = untraversed(traversed, head) else {
            break;
        };
        traversed.insert(head, prev);
        ids.push_front(prev);
    }
}

/// Fallback pass: chain raw segments by nearest endpoint within `tolerance`.
fn chain_nearest(segments: &[Segment], tolerance: Tolerance) -> Vec<Chain> {
    let mut used = vec![false; segments.len()];
    let mut chains = Vec::new();

    for start in 0..segments.len() {
        if used[start] {
            continue;
        }
        used[start] = true;

        let mut points = VecDeque::from([segments[start].a, segments[start].b]);
        while let Some(&tail) = points.back() {
            let Some(far) = take_nearest(segments, &mut used, &tail, tolerance) else {
                break;
            };
            points.push_back(far);
        }
        while let Some(&head) = points.front() {
            let Some(far) = take_nearest(segments, &mut used, &head, tolerance) else {
                break;
            };
            points.push_front(far);
        }

        let points: Vec<Point3> = points.into();
        let closed = points.len() >= 4 && points[0] == points[points.len() - 1];
        chains.push(Chain { points, closed });
    }

    chains
}

/// Claim the free segment with an endpoint nearest to `p` and return its
/// other endpoint.
fn take_nearest(
    segments: &[Segment],
    used: &mut [bool],
    p: &Point3,
    tolerance: Tolerance,
) -> Option<Point3> {
    let mut best: Option<(usize, f64, Point3)> = None;
    for (i, seg) in segments.iter().enumerate() {
        if used[i] {
            continue;
        }
        for (near, far) in [(seg.a, seg.b), (seg.b, seg.a)] {
            let d = (near - p).norm();
            if d < tolerance.linear && best.map_or(true, |(_, bd, _)| d < bd) {
                best = Some((i, d, far));
            }
        }
    }
    let (i, _, far) = best?;
    used[i] = true;
    Some(far)
}

/// Force-close a chain whose ends meet within tolerance.
fn close_coincident_ends(chain: &mut Chain, tolerance: Tolerance) {
    let n = chain.points.len();
    if n < 3 {
        return;
    }
    let first = chain.points[0];
    let last = chain.points[n - 1];
    if first == last {
        chain.closed = n >= 4;
    } else if tolerance.points_equal(&first, &last) {
        chain.points.push(first);
        chain.closed = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const NODE: Tolerance = Tolerance::new(1e-6);
    const LOOSE: Tolerance = Tolerance::new(1e-3);

    fn p(x: f64, y: f64) -> Point3 {
        Point3::new(x, y, 0.0)
    }

    fn polygon_segments(points: &[Point3]) -> Vec<Segment> {
        (0..points.len())
            .map(|i| Segment::new(points[i], points[(i + 1) % points.len()]))
            .collect()
    }

    fn square(offset: f64, size: f64) -> Vec<Point3> {
        vec![
            p(offset, offset),
            p(offset + size, offset),
            p(offset + size, offset + size),
            p(offset, offset + size),
        ]
    }

    #[test]
    fn test_empty_input() {
        assert!(reconstruct(&[], NODE, LOOSE).is_empty());
    }

    #[test]
    fn test_shuffled_square_closes() {
        let mut segments = polygon_segments(&square(0.0, 1.0));
        segments.swap(0, 2);
        // Flip one segment's direction.
        segments[1] = Segment::new(segments[1].b, segments[1].a);

        let chains = reconstruct(&segments, NODE, LOOSE);
        assert_eq!(chains.len(), 1);
        let chain = &chains[0];
        assert!(chain.closed);
        assert_eq!(chain.points.len(), 5);
        assert_eq!(chain.points[0], chain.points[4]);
        assert_relative_eq!(chain.length(), 4.0);
    }

    #[test]
    fn test_near_endpoints_merge() {
        let mut segments = polygon_segments(&square(0.0, 1.0));
        segments[1].a.x += 4e-7;
        segments[2].b.y -= 3e-7;
        let chains = reconstruct(&segments, NODE, LOOSE);
        assert_eq!(chains.len(), 1);
        assert!(chains[0].closed);
    }

    #[test]
    fn test_merge_across_grid_boundary() {
        // 0.6e-6 rounds to a different grid cell than 0.0 but is within tolerance.
        let segments = vec![
            Segment::new(p(0.0, 0.0), p(1.0, 0.0)),
            Segment::new(p(1.0, 0.0), p(0.5, 1.0)),
            Segment::new(p(0.5, 1.0), p(0.6e-6, 0.0)),
        ];
        let chains = reconstruct(&segments, NODE, LOOSE);
        assert_eq!(chains.len(), 1);
        assert!(chains[0].closed);
        assert_eq!(chains[0].points.len(), 4);
    }

    #[test]
    fn test_two_disjoint_loops() {
        let mut segments = polygon_segments(&square(0.0, 1.0));
        segments.extend(polygon_segments(&square(5.0, 2.0)));
        let chains = reconstruct(&segments, NODE, LOOSE);
        assert_eq!(chains.len(), 2);
        assert!(chains.iter().all(|c| c.closed));
    }

    #[test]
    fn test_open_polyline_stays_open() {
        let segments = vec![
            Segment::new(p(0.0, 0.0), p(1.0, 0.0)),
            Segment::new(p(2.0, 0.0), p(1.0, 0.0)),
            Segment::new(p(2.0, 0.0), p(3.0, 1.0)),
        ];
        let chains = reconstruct(&segments, NODE, LOOSE);
        assert_eq!(chains.len(), 1);
        let chain = &chains[0];
        assert!(!chain.closed);
        assert_eq!(chain.points.len(), 4);
        let ends = [chain.points[0], chain.points[3]];
        assert!(ends.contains(&p(0.0, 0.0)));
        assert!(ends.contains(&p(3.0, 1.0)));
    }

    #[test]
    fn test_loop_with_tail_keeps_every_edge() {
        // Square with a spur hanging off one corner: the corner has degree 3.
        let mut segments = polygon_segments(&square(0.0, 1.0));
        segments.push(Segment::new(p(1.0, 1.0), p(2.0, 2.0)));
        let chains = reconstruct(&segments, NODE, LOOSE);
        let edges: usize = chains.iter().map(|c| c.points.len() - 1).sum();
        assert_eq!(edges, 5);
        assert!(chains.iter().any(|c| c.closed));
    }

    #[test]
    fn test_figure_eight_shares_a_node() {
        // Two triangles touching at the origin.
        let segments = vec![
            Segment::new(p(0.0, 0.0), p(1.0, 1.0)),
            Segment::new(p(1.0, 1.0), p(1.0, -1.0)),
            Segment::new(p(1.0, -1.0), p(0.0, 0.0)),
            Segment::new(p(0.0, 0.0), p(-1.0, 1.0)),
            Segment::new(p(-1.0, 1.0), p(-1.0, -1.0)),
            Segment::new(p(-1.0, -1.0), p(0.0, 0.0)),
        ];
        let chains = reconstruct(&segments, NODE, LOOSE);
        let edges: usize = chains.iter().map(|c| c.points.len() - 1).sum();
        assert_eq!(edges, 6);
        assert!(chains.iter().all(|c| c.closed));
    }

    #[test]
    fn test_duplicate_segments_collapse() {
        let mut segments = polygon_segments(&square(0.0, 1.0));
        segments.push(segments[0]);
        let chains = reconstruct(&segments, NODE, LOOSE);
        assert_eq!(chains.len(), 1);
        assert_eq!(chains[0].points.len(), 5);
    }

    #[test]
    fn test_fallback_for_tiny_segments() {
        // Every segment is shorter than the merge tolerance, so the graph is
        // all self-loops and the raw chaining takes over.
        let step = 4e-7;
        let segments = vec![
            Segment::new(p(0.0, 0.0), p(step, 0.0)),
            Segment::new(p(step, 0.0), p(step, step)),
            Segment::new(p(step, step), p(0.0, step)),
        ];
        let chains = reconstruct(&segments, NODE, LOOSE);
        assert_eq!(chains.len(), 1);
        let chain = &chains[0];
        // The open ends are 4e-7 apart, well inside the loose tolerance.
        assert!(chain.closed);
        assert_eq!(
            chain.points,
            vec![
                p(0.0, 0.0),
                p(step, 0.0),
                p(step, step),
                p(0.0, step),
                p(0.0, 0.0),
            ]
        );
    }

    #[test]
    fn test_loop_found_after_walk_into_spur() {
        // The walk from A turns into the spur at C and dead-ends; the walk
        // from B goes the other way round and closes.
        let (a, b, c, d) = (p(0.0, 0.0), p(1.0, 0.0), p(1.0, 1.0), p(0.0, 1.0));
        let spur = p(2.0, 2.0);
        let segments = vec![
            Segment::new(a, b),
            Segment::new(b, c),
            Segment::new(c, spur),
            Segment::new(c, d),
            Segment::new(d, a),
        ];
        let chains = reconstruct(&segments, NODE, LOOSE);
        assert_eq!(chains.len(), 2);
        assert!(chains[0].closed);
        assert_eq!(chains[0].points, vec![b, a, d, c, b]);
        assert!(!chains[1].closed);
        assert_eq!(chains[1].points, vec![spur, c]);
    }

    #[test]
    fn test_loop_without_two_edge_nodes_closes() {
        // Square with both diagonals: every node has three edges, so the
        // perimeter comes out of the remainder walk and the diagonals follow.
        let (a, b, c, d) = (p(0.0, 0.0), p(1.0, 0.0), p(1.0, 1.0), p(0.0, 1.0));
        let segments = vec![
            Segment::new(a, b),
            Segment::new(b, c),
            Segment::new(c, d),
            Segment::new(d, a),
            Segment::new(a, c),
            Segment::new(b, d),
        ];
        let chains = reconstruct(&segments, NODE, LOOSE);
        assert_eq!(chains.len(), 3);
        assert!(chains[0].closed);
        assert_eq!(chains[0].points, vec![a, b, c, d, a]);
        assert_eq!(chains[1].points, vec![a, c]);
        assert_eq!(chains[2].points, vec![b, d]);
        assert!(!chains[1].closed && !chains[2].closed);
    }

    #[test]
    fn test_triangle_with_spurs_keeps_every_edge() {
        let (a, b, c) = (p(0.0, 0.0), p(2.0, 0.0), p(1.0, 2.0));
        let spurs = [p(-1.0, -1.0), p(3.0, -1.0), p(1.0, 3.0)];
        let segments = vec![
            Segment::new(a, b),
            Segment::new(b, c),
            Segment::new(c, a),
            Segment::new(a, spurs[0]),
            Segment::new(b, spurs[1]),
            Segment::new(c, spurs[2]),
        ];
        let chains = reconstruct(&segments, NODE, LOOSE);
        let edges: usize = chains.iter().map(|c| c.points.len() - 1).sum();
        assert_eq!(edges, 6);
        for seg in &segments {
            assert!(chains.iter().any(|chain| chain
                .points
                .windows(2)
                .any(|w| (w[0] == seg.a && w[1] == seg.b) || (w[0] == seg.b && w[1] == seg.a))));
        }
    }

    #[test]
    fn test_force_close_near_coincident_ends() {
        let mut chain = Chain {
            points: vec![p(0.0, 0.0), p(1.0, 0.0), p(1.0, 1.0), p(1e-7, 0.0)],
            closed: false,
        };
        close_coincident_ends(&mut chain, NODE);
        assert!(chain.closed);
        assert_eq!(chain.points.len(), 5);
        assert_eq!(chain.points[0], chain.points[4]);
    }

    #[test]
    fn test_deterministic() {
        let mut segments = polygon_segments(&square(0.0, 1.0));
        segments.extend(polygon_segments(&square(0.25, 0.5)));
        let a = reconstruct(&segments, NODE, LOOSE);
        let b = reconstruct(&segments, NODE, LOOSE);
        assert_eq!(a, b);
    }

    #[test]
    fn test_long_loop_does_not_recurse() {
        let n = 20_000;
        let points: Vec<Point3> = (0..n)
            .map(|i| {
                let a = i as f64 / n as f64 * std::f64::consts::TAU;
                p(100.0 * a.cos(), 100.0 * a.sin())
            })
            .collect();
        let chains = reconstruct(&polygon_segments(&points), NODE, LOOSE);
        assert_eq!(chains.len(), 1);
        assert_eq!(chains[0].points.len(), n + 1);
    }
}
