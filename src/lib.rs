//! Diamond-square terrain generation library
//!
//! Re-exports modules for use by binaries and tools.

pub mod config;
pub mod error;
pub mod export;
pub mod heightmap;
pub mod random;
pub mod stats;
pub mod tilemap;

pub use config::{GenerationConfig, GeneratorLimits};
pub use error::{TerrainError, TerrainResult};
pub use heightmap::HeightmapGenerator;
pub use random::{SequenceSource, UniformSource};
pub use tilemap::Tilemap;
