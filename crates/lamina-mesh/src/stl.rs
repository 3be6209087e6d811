//! STL (stereolithography) parsing.
//!
//! Both encodings are accepted:
//! - ASCII files start with "solid" (after optional whitespace) and use
//!   `facet` / `outer loop` / `vertex` / `endloop` / `endfacet` records
//! - Binary files have an 80-byte header, a little-endian u32 triangle
//!   count, then 50 bytes per triangle (normal, 3 vertices, attribute)
//!
//! Facet normals are ignored; normals are recomputed during normalization.

use tracing::debug;

use crate::error::{MeshError, Result};
use crate::mesh::{GeometryBuffer, TriangleMesh};

const HEADER_SIZE: usize = 80;
const TRIANGLE_SIZE: usize = 50;

/// Parse STL bytes into a position-only geometry buffer.
///
/// # Errors
///
/// Returns [`MeshError::InvalidStl`] if the bytes are neither a well-formed
/// binary STL nor a parseable ASCII STL.
pub fn parse_stl(bytes: &[u8]) -> Result<GeometryBuffer> {
    let positions = if is_ascii_stl(bytes) {
        parse_ascii(bytes)?
    } else {
        parse_binary(bytes)?
    };
    debug!(triangles = positions.len() / 9, "Parsed STL");
    Ok(GeometryBuffer::from_positions(positions))
}

/// Decide between the two encodings.
///
/// Some binary exporters write "solid" into the header, so a size that
/// matches the binary layout exactly wins over the keyword.
fn is_ascii_stl(bytes: &[u8]) -> bool {
    if bytes.len() >= HEADER_SIZE + 4 {
        let count = read_u32(&bytes[HEADER_SIZE..HEADER_SIZE + 4]) as usize;
        if count
            .checked_mul(TRIANGLE_SIZE)
            .and_then(|body| body.checked_add(HEADER_SIZE + 4))
            == Some(bytes.len())
        {
            return false;
        }
    }

    let header = &bytes[..bytes.len().min(HEADER_SIZE)];
    if header.contains(&0) {
        return false;
    }
    String::from_utf8_lossy(header)
        .trim_start()
        .to_ascii_lowercase()
        .starts_with("solid")
}

fn read_u32(buf: &[u8]) -> u32 {
    u32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]])
}

fn read_f32(buf: &[u8]) -> f32 {
    f32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]])
}

fn parse_binary(bytes: &[u8]) -> Result<Vec<f32>> {
    if bytes.len() < HEADER_SIZE + 4 {
        return Err(MeshError::invalid_stl(format!(
            "expected at least {} bytes, got {}",
            HEADER_SIZE + 4,
            bytes.len()
        )));
    }

    let count = read_u32(&bytes[HEADER_SIZE..HEADER_SIZE + 4]) as usize;
    let body = &bytes[HEADER_SIZE + 4..];
    let available = body.len() / TRIANGLE_SIZE;
    if available < count {
        return Err(MeshError::invalid_stl(format!(
            "header declares {} triangles but only {} are present",
            count, available
        )));
    }

    let mut positions = Vec::with_capacity(count * 9);
    for record in body.chunks_exact(TRIANGLE_SIZE).take(count) {
        // Skip normal (12 bytes), read 3 vertices (36 bytes total)
        for offset in (12..48).step_by(4) {
            positions.push(read_f32(&record[offset..offset + 4]));
        }
    }
    Ok(positions)
}

fn parse_ascii(bytes: &[u8]) -> Result<Vec<f32>> {
    let text = std::str::from_utf8(bytes)
        .map_err(|e| MeshError::invalid_stl(format!("ASCII STL is not UTF-8: {}", e)))?;

    let mut positions = Vec::new();
    let mut in_loop = false;
    let mut face: Vec<f32> = Vec::with_capacity(9);

    for (line_no, line) in text.lines().enumerate() {
        let parts: Vec<&str> = line.split_whitespace().collect();
        let Some(keyword) = parts.first() else {
            continue;
        };

        match keyword.to_ascii_lowercase().as_str() {
            "outer" => {
                if parts.get(1).is_some_and(|p| p.eq_ignore_ascii_case("loop")) {
                    in_loop = true;
                    face.clear();
                }
            }
            "vertex" => {
                if !in_loop {
                    continue;
                }
                if parts.len() < 4 {
                    return Err(MeshError::invalid_stl(format!(
                        "line {}: vertex needs three coordinates",
                        line_no + 1
                    )));
                }
                for token in &parts[1..4] {
                    let value: f32 = token.parse().map_err(|_| {
                        MeshError::invalid_stl(format!(
                            "line {}: bad coordinate {:?}",
                            line_no + 1,
                            token
                        ))
                    })?;
                    face.push(value);
                }
            }
            "endloop" => in_loop = false,
            "endfacet" => {
                if face.len() == 9 {
                    positions.extend_from_slice(&face);
                }
                face.clear();
            }
            "endsolid" => break,
            _ => {}
        }
    }

    Ok(positions)
}

/// Encode a mesh as binary STL with per-facet normals from winding.
///
/// # Errors
///
/// Returns [`MeshError::InvalidMesh`] if the mesh has more triangles than
/// the format's u32 count field can hold.
pub fn to_binary_stl(mesh: &TriangleMesh) -> Result<Vec<u8>> {
    let num_triangles = mesh.num_triangles();
    let count = triangle_count_field(num_triangles)?;
    let mut data = Vec::with_capacity(HEADER_SIZE + 4 + num_triangles * TRIANGLE_SIZE);

    let mut header = [b' '; HEADER_SIZE];
    header[..17].copy_from_slice(b"lamina STL export");
    data.extend_from_slice(&header);
    data.extend_from_slice(&count.to_le_bytes());

    for t in 0..num_triangles {
        let [v0, v1, v2] = mesh.triangle(t);
        let n = (v1 - v0).cross(&(v2 - v0));
        let len = n.norm();
        let n = if len > 1e-10 { n / len } else { n };

        for c in [n.x, n.y, n.z] {
            data.extend_from_slice(&(c as f32).to_le_bytes());
        }
        for v in [v0, v1, v2] {
            for c in [v.x, v.y, v.z] {
                data.extend_from_slice(&(c as f32).to_le_bytes());
            }
        }
        // Attribute byte count
        data.extend_from_slice(&0u16.to_le_bytes());
    }

    Ok(data)
}

fn triangle_count_field(num_triangles: usize) -> Result<u32> {
    u32::try_from(num_triangles).map_err(|_| {
        MeshError::InvalidMesh(format!(
            "{} triangles exceed the binary STL limit",
            num_triangles
        ))
    })
}
