//! Indexed triangle meshes and their normalization.

use lamina_math::{Point3, Vec3};
use tracing::{debug, warn};

use crate::bounds::BoundingBox;
use crate::error::{MeshError, Result};

/// A triangle mesh with flat vertex/index/normal buffers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TriangleMesh {
    /// Flat array of vertex positions: `[x0, y0, z0, x1, y1, z1, ...]` (f32).
    pub vertices: Vec<f32>,
    /// Flat array of triangle indices: `[i0, i1, i2, ...]` (u32).
    pub indices: Vec<u32>,
    /// Flat array of vertex normals: `[nx0, ny0, nz0, ...]` (f32). Same length as vertices.
    pub normals: Vec<f32>,
}

impl TriangleMesh {
    /// Number of triangles.
    pub fn num_triangles(&self) -> usize {
        self.indices.len() / 3
    }

    /// Number of vertices.
    pub fn num_vertices(&self) -> usize {
        self.vertices.len() / 3
    }

    /// Position of vertex `i`.
    pub fn position(&self, i: usize) -> Point3 {
        Point3::new(
            self.vertices[i * 3] as f64,
            self.vertices[i * 3 + 1] as f64,
            self.vertices[i * 3 + 2] as f64,
        )
    }

    /// Normal of vertex `i`.
    pub fn normal(&self, i: usize) -> Vec3 {
        Vec3::new(
            self.normals[i * 3] as f64,
            self.normals[i * 3 + 1] as f64,
            self.normals[i * 3 + 2] as f64,
        )
    }

    /// Corner positions of triangle `t`.
    pub fn triangle(&self, t: usize) -> [Point3; 3] {
        let i = &self.indices[t * 3..t * 3 + 3];
        [
            self.position(i[0] as usize),
            self.position(i[1] as usize),
            self.position(i[2] as usize),
        ]
    }
}

/// Raw geometry as handed over by a file parser.
///
/// Every buffer is optional; [`normalize`] fills in what is missing.
#[derive(Debug, Clone, Default)]
pub struct GeometryBuffer {
    /// Flat vertex positions.
    pub positions: Option<Vec<f32>>,
    /// Flat triangle indices.
    pub indices: Option<Vec<u32>>,
    /// Flat per-vertex normals.
    pub normals: Option<Vec<f32>>,
    /// Bounding box, if the parser already knows it.
    pub bounds: Option<BoundingBox>,
}

impl GeometryBuffer {
    /// A buffer holding only positions; every other buffer is derived.
    pub fn from_positions(positions: Vec<f32>) -> Self {
        Self {
            positions: Some(positions),
            ..Self::default()
        }
    }
}

/// A normalized, read-only mesh paired with its bounding box.
///
/// Guarantees an index buffer whose length is a multiple of 3 with every
/// index in range, and one normal per vertex.
#[derive(Debug, Clone)]
pub struct Mesh {
    geometry: TriangleMesh,
    bounds: BoundingBox,
}

impl Mesh {
    /// The underlying buffers.
    pub fn geometry(&self) -> &TriangleMesh {
        &self.geometry
    }

    /// Axis-aligned bounding box.
    pub fn bounds(&self) -> &BoundingBox {
        &self.bounds
    }

    /// Number of triangles.
    pub fn num_triangles(&self) -> usize {
        self.geometry.num_triangles()
    }

    /// Number of vertices.
    pub fn num_vertices(&self) -> usize {
        self.geometry.num_vertices()
    }

    /// Iterate over triangle corner positions.
    pub fn triangles(&self) -> impl Iterator<Item = [Point3; 3]> + '_ {
        (0..self.num_triangles()).map(move |t| self.geometry.triangle(t))
    }
}

/// Turn a parser's geometry buffer into a [`Mesh`].
///
/// Synthesizes sequential triangles when no index is present, computes
/// vertex normals from face winding when none are supplied, and derives the
/// bounding box from vertex extents when the parser did not provide one.
///
/// # Errors
///
/// Returns [`MeshError::InvalidMesh`] if positions are absent, not a whole
/// number of xyz triples, non-finite, or referenced out of range.
pub fn normalize(buffer: GeometryBuffer) -> Result<Mesh> {
    let positions = buffer
        .positions
        .ok_or_else(|| MeshError::InvalidMesh("missing position buffer".into()))?;

    if positions.len() % 3 != 0 {
        return Err(MeshError::InvalidMesh(format!(
            "position buffer length {} is not a multiple of 3",
            positions.len()
        )));
    }
    if positions.iter().any(|v| !v.is_finite()) {
        return Err(MeshError::InvalidMesh(
            "position buffer contains non-finite values".into(),
        ));
    }

    let vertex_count = positions.len() / 3;
    let mut indices = match buffer.indices {
        Some(indices) => indices,
        None => sequential_indices(vertex_count)?,
    };

    if indices.len() % 3 != 0 {
        let keep = indices.len() - indices.len() % 3;
        warn!(
            dropped = indices.len() - keep,
            "index buffer has a partial trailing triangle"
        );
        indices.truncate(keep);
    }

    if let Some(&bad) = indices.iter().find(|&&i| i as usize >= vertex_count) {
        return Err(MeshError::InvalidMesh(format!(
            "index {} out of range for {} vertices",
            bad, vertex_count
        )));
    }

    let normals = match buffer.normals {
        Some(normals) if normals.len() == positions.len() => normals,
        Some(normals) => {
            warn!(
                normals = normals.len(),
                positions = positions.len(),
                "normal buffer length mismatch, recomputing"
            );
            compute_vertex_normals(&positions, &indices)
        }
        None => compute_vertex_normals(&positions, &indices),
    };

    let bounds = buffer
        .bounds
        .unwrap_or_else(|| BoundingBox::from_positions(&positions));

    debug!(
        vertices = vertex_count,
        triangles = indices.len() / 3,
        "Normalized mesh"
    );

    Ok(Mesh {
        geometry: TriangleMesh {
            vertices: positions,
            indices,
            normals,
        },
        bounds,
    })
}

/// Index buffer treating each consecutive vertex triple as a triangle.
fn sequential_indices(vertex_count: usize) -> Result<Vec<u32>> {
    let whole = vertex_count - vertex_count % 3;
    if whole != vertex_count {
        warn!(
            dropped = vertex_count - whole,
            "vertex count is not a multiple of 3, ignoring trailing vertices"
        );
    }
    let last = u32::try_from(whole).map_err(|_| {
        MeshError::InvalidMesh(format!("{} vertices exceed the u32 index range", whole))
    })?;
    Ok((0..last).collect())
}

/// Area-weighted vertex normals from triangle winding.
///
/// Vertices touched only by degenerate triangles get `(0, 0, 1)`.
pub fn compute_vertex_normals(positions: &[f32], indices: &[u32]) -> Vec<f32> {
    let vertex_count = positions.len() / 3;
    let mut accum = vec![Vec3::zeros(); vertex_count];
    let point = |i: usize| {
        Point3::new(
            positions[i * 3] as f64,
            positions[i * 3 + 1] as f64,
            positions[i * 3 + 2] as f64,
        )
    };

    for tri in indices.chunks_exact(3) {
        let (a, b, c) = (tri[0] as usize, tri[1] as usize, tri[2] as usize);
        // Unnormalized cross product: length is twice the face area.
        let n = (point(b) - point(a)).cross(&(point(c) - point(a)));
        accum[a] += n;
        accum[b] += n;
        accum[c] += n;
    }

    let mut normals = Vec::with_capacity(positions.len());
    for n in accum {
        let len = n.norm();
        let n = if len > 1e-12 { n / len } else { Vec3::z() };
        normals.extend_from_slice(&[n.x as f32, n.y as f32, n.z as f32]);
    }
    normals
}
