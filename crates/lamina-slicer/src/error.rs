//! Error types for the slicer.

use lamina_mesh::MeshError;
use thiserror::Error;

/// Errors that can occur around slicing.
///
/// Geometric trouble inside a layer never shows up here; it degrades to
/// fewer, shorter or open paths instead.
#[derive(Error, Debug)]
pub enum SlicerError {
    /// The mesh could not be loaded.
    #[error(transparent)]
    Mesh(#[from] MeshError),

    /// Invalid slice settings.
    #[error("invalid settings: {0}")]
    InvalidSettings(String),

    /// A layer index outside the schedule.
    #[error("layer {index} out of range ({count} layers)")]
    LayerOutOfRange {
        /// Requested index.
        index: usize,
        /// Number of scheduled layers.
        count: usize,
    },
}

/// Result type for slicer operations.
pub type Result<T> = std::result::Result<T, SlicerError>;
