//! Generation parameters and resource limits.
//!
//! Parameters can be loaded from a JSON file; any missing field falls back to
//! its default. Command-line flags override file values in the binaries.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{TerrainError, TerrainResult};
use crate::heightmap;

/// Grid cells allowed by default: a detail-12 map (4097 x 4097, ~67 MB).
pub const DEFAULT_MAX_CELLS: u64 = 4097 * 4097;

/// Memory ceiling enforced before a grid is allocated.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GeneratorLimits {
    /// Maximum number of cells (`size * size`) a generator may allocate
    pub max_cells: u64,
}

impl Default for GeneratorLimits {
    fn default() -> Self {
        Self {
            max_cells: DEFAULT_MAX_CELLS,
        }
    }
}

/// Parameters for one heightmap generation run
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Grid resolution driver, size = 2^detail + 1
    pub detail: u32,
    /// Amplitude of the random displacement, usually 0.2-0.8
    pub roughness: f32,
    /// Random seed (drawn from entropy if absent)
    pub seed: Option<u64>,
    /// Memory ceiling in cells
    pub max_cells: u64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            detail: 8,
            roughness: 0.5,
            seed: None,
            max_cells: DEFAULT_MAX_CELLS,
        }
    }
}

impl GenerationConfig {
    /// Load a config from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> TerrainResult<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    pub fn from_json(contents: &str) -> TerrainResult<Self> {
        Ok(serde_json::from_str(contents)?)
    }

    pub fn limits(&self) -> GeneratorLimits {
        GeneratorLimits {
            max_cells: self.max_cells,
        }
    }

    /// Run the construction checks without allocating. Returns the grid size.
    pub fn validate(&self) -> TerrainResult<usize> {
        if !self.roughness.is_finite() {
            return Err(TerrainError::InvalidRoughness {
                roughness: self.roughness,
            });
        }
        heightmap::grid_size(self.detail, &self.limits())
    }
}
