//! Error types for terrain generation and export.

use thiserror::Error;

/// Errors that can occur while building, generating or exporting a heightmap.
#[derive(Error, Debug)]
pub enum TerrainError {
    /// Detail level too small to produce a subdividable grid.
    #[error("invalid configuration: detail must be at least 1, got {detail}")]
    Configuration {
        /// The rejected detail level.
        detail: u32,
    },

    /// Roughness must be a finite number.
    #[error("invalid configuration: roughness must be finite, got {roughness}")]
    InvalidRoughness {
        /// The rejected roughness.
        roughness: f32,
    },

    /// Requested grid would exceed the memory ceiling.
    #[error("detail {detail} needs {requested_cells} cells, limit is {max_cells}")]
    ResourceExhausted {
        /// The rejected detail level.
        detail: u32,
        /// Cells the grid would need (saturated on overflow).
        requested_cells: u64,
        /// Configured ceiling.
        max_cells: u64,
    },

    /// An averaging step found no in-range neighbours.
    #[error("internal invariant violated: no valid neighbours around ({x}, {y})")]
    InternalInvariant { x: usize, y: usize },

    /// The map was read before generation completed.
    #[error("heightmap has not been generated yet")]
    NotGenerated,

    /// A serialized heightmap is not a square grid.
    #[error("malformed heightmap document: {0}")]
    MalformedDocument(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for terrain operations.
pub type TerrainResult<T> = Result<T, TerrainError>;
