//! Error types for mesh ingestion.

use thiserror::Error;

/// Errors that can occur while loading or normalizing a mesh.
#[derive(Error, Debug)]
pub enum MeshError {
    /// Vertex position data is missing or unusable.
    #[error("invalid mesh: {0}")]
    InvalidMesh(String),

    /// The STL parser rejected the input bytes.
    #[error("invalid STL: {message}")]
    InvalidStl {
        /// Description of what was invalid.
        message: String,
    },

    /// I/O error from the standard library.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl MeshError {
    pub(crate) fn invalid_stl(message: impl Into<String>) -> Self {
        Self::InvalidStl {
            message: message.into(),
        }
    }
}

/// Result type for mesh operations.
pub type Result<T> = std::result::Result<T, MeshError>;
