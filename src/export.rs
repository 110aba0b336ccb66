use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use image::{GrayImage, ImageBuffer, Luma};
use serde::{Deserialize, Serialize};

use crate::error::{TerrainError, TerrainResult};
use crate::stats::normalize_heightmap;
use crate::tilemap::Tilemap;

/// Render a heightmap as 8-bit grayscale, lowest cell black, highest white.
/// Pixel (x, y) is cell [x, y].
pub fn render_heightmap(heightmap: &Tilemap<f32>) -> GrayImage {
    let normalized = normalize_heightmap(heightmap);
    let mut img: GrayImage = ImageBuffer::new(heightmap.width as u32, heightmap.height as u32);

    for (x, y, &val) in normalized.iter() {
        let level = (val.clamp(0.0, 1.0) * 255.0).round() as u8;
        img.put_pixel(x as u32, y as u32, Luma([level]));
    }

    img
}

/// Hill-shaded grayscale rendering, lit from the upper left.
pub fn render_shaded_heightmap(heightmap: &Tilemap<f32>) -> GrayImage {
    let normalized = normalize_heightmap(heightmap);
    let mut img: GrayImage = ImageBuffer::new(heightmap.width as u32, heightmap.height as u32);

    let (light_x, light_y, light_z) = (-0.7f32, -0.7f32, 0.5f32);
    let light_len = (light_x * light_x + light_y * light_y + light_z * light_z).sqrt();
    let (lx, ly, lz) = (light_x / light_len, light_y / light_len, light_z / light_len);

    // Relief exaggeration so small grids still show slopes
    let relief = normalized.width.max(1) as f32 * 0.5;

    for (x, y, &h) in normalized.iter() {
        let (xi, yi) = (x as i64, y as i64);
        let h_left = normalized.get_or(xi - 1, yi, h);
        let h_right = normalized.get_or(xi + 1, yi, h);
        let h_up = normalized.get_or(xi, yi - 1, h);
        let h_down = normalized.get_or(xi, yi + 1, h);

        let nx = (h_left - h_right) * relief;
        let ny = (h_up - h_down) * relief;
        let nz = 1.0f32;
        let nlen = (nx * nx + ny * ny + nz * nz).sqrt();

        let diffuse = ((nx * lx + ny * ly + nz * lz) / nlen).max(0.0);
        let ambient = 0.3;
        let lighting = (ambient + (1.0 - ambient) * diffuse).min(1.0);

        let base = 0.35 + 0.65 * h;
        img.put_pixel(x as u32, y as u32, Luma([(base * lighting * 255.0) as u8]));
    }

    img
}

/// Export a heightmap as a grayscale PNG.
pub fn export_heightmap_png(heightmap: &Tilemap<f32>, path: impl AsRef<Path>) -> TerrainResult<()> {
    render_heightmap(heightmap).save(path)?;
    Ok(())
}

// =============================================================================
// JSON DOCUMENT
// =============================================================================

/// Serialized form of a square heightmap. `values[y][x]` holds cell [x, y].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HeightmapDocument {
    pub size: usize,
    pub values: Vec<Vec<f32>>,
}

impl HeightmapDocument {
    pub fn from_tilemap(heightmap: &Tilemap<f32>) -> Self {
        Self {
            size: heightmap.width,
            values: heightmap.rows().map(|row| row.to_vec()).collect(),
        }
    }

    /// Rebuild the grid, rejecting documents that are not `size x size`.
    pub fn into_tilemap(self) -> TerrainResult<Tilemap<f32>> {
        let size = self.size;
        if self.values.len() != size {
            return Err(TerrainError::MalformedDocument(format!(
                "expected {} rows, found {}",
                size,
                self.values.len()
            )));
        }
        if let Some((y, row)) = self.values.iter().enumerate().find(|(_, row)| row.len() != size) {
            return Err(TerrainError::MalformedDocument(format!(
                "row {} has {} values, expected {}",
                y,
                row.len(),
                size
            )));
        }

        let data: Vec<f32> = self.values.into_iter().flatten().collect();
        Tilemap::from_vec(size, size, data)
            .ok_or_else(|| TerrainError::MalformedDocument(String::from("cell count mismatch")))
    }
}

pub fn export_heightmap_json(heightmap: &Tilemap<f32>, path: impl AsRef<Path>) -> TerrainResult<()> {
    let writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer(writer, &HeightmapDocument::from_tilemap(heightmap))?;
    Ok(())
}

pub fn load_heightmap_json(path: impl AsRef<Path>) -> TerrainResult<Tilemap<f32>> {
    let reader = BufReader::new(File::open(path)?);
    let document: HeightmapDocument = serde_json::from_reader(reader)?;
    document.into_tilemap()
}
