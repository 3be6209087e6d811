#![warn(missing_docs)]

//! Mesh ingestion for the lamina slicing engine.
//!
//! Parses STL bytes into a [`GeometryBuffer`], then normalizes it into a
//! read-only [`Mesh`]: a guaranteed triangle index, per-vertex normals and
//! a bounding box.
//!
//! # Example
//!
//! ```no_run
//! use lamina_mesh::load_mesh_file;
//!
//! let mesh = load_mesh_file("part.stl").unwrap();
//! println!("{} triangles, bounds {:?}", mesh.num_triangles(), mesh.bounds());
//! ```

pub mod bounds;
pub mod error;
pub mod mesh;
pub mod stl;

use std::path::Path;

pub use bounds::BoundingBox;
pub use error::{MeshError, Result};
pub use mesh::{compute_vertex_normals, normalize, GeometryBuffer, Mesh, TriangleMesh};
pub use stl::{parse_stl, to_binary_stl};

/// Parse and normalize raw STL bytes.
///
/// # Errors
///
/// Fails if the bytes are not STL or carry no usable vertex positions.
pub fn load_mesh(bytes: &[u8]) -> Result<Mesh> {
    normalize(parse_stl(bytes)?)
}

/// Read a file and [`load_mesh`] its contents.
///
/// # Errors
///
/// Fails on I/O errors as well as everything [`load_mesh`] rejects.
pub fn load_mesh_file(path: impl AsRef<Path>) -> Result<Mesh> {
    let bytes = std::fs::read(path)?;
    load_mesh(&bytes)
}
