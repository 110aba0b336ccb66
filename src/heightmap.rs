use crate::config::{GenerationConfig, GeneratorLimits};
use crate::error::{TerrainError, TerrainResult};
use crate::random::{self, UniformSource};
use crate::tilemap::Tilemap;

const LOG_TARGET: &str = "terrain_generator::heightmap";

// =============================================================================
// GRID SIZING
// =============================================================================

/// Compute the side length `2^detail + 1` for a detail level, enforcing the
/// lower bound and the memory ceiling before anything is allocated.
pub fn grid_size(detail: u32, limits: &GeneratorLimits) -> TerrainResult<usize> {
    if detail < 1 {
        return Err(TerrainError::Configuration { detail });
    }

    let side = 1u64.checked_shl(detail).and_then(|s| s.checked_add(1));
    let cells = side.and_then(|s| s.checked_mul(s));
    let exhausted = || TerrainError::ResourceExhausted {
        detail,
        requested_cells: cells.unwrap_or(u64::MAX),
        max_cells: limits.max_cells,
    };

    match (side, cells) {
        (Some(side), Some(cells)) if cells <= limits.max_cells => {
            // The allocation itself is `side * side` in usize.
            usize::try_from(cells).map_err(|_| exhausted())?;
            usize::try_from(side).map_err(|_| exhausted())
        }
        _ => Err(exhausted()),
    }
}

// =============================================================================
// DIAMOND-SQUARE GENERATOR
// =============================================================================

/// Fractal heightmap generator using recursive midpoint displacement.
///
/// The grid is `2^detail + 1` cells on each side. Corners are seeded with a
/// fixed slope (`max/2, 0, max/2, max` clockwise from the origin) and every
/// other cell is filled by alternating square and diamond passes whose random
/// offsets shrink with the step size.
#[derive(Clone, Debug)]
pub struct HeightmapGenerator {
    detail: u32,
    size: usize,
    max: usize,
    roughness: f32,
    map: Tilemap<f32>,
    generated: bool,
}

impl HeightmapGenerator {
    /// Allocate a zeroed grid for `detail` under the default memory ceiling.
    pub fn new(detail: u32) -> TerrainResult<Self> {
        Self::with_limits(detail, &GeneratorLimits::default())
    }

    pub fn with_limits(detail: u32, limits: &GeneratorLimits) -> TerrainResult<Self> {
        let size = grid_size(detail, limits)?;
        Ok(Self {
            detail,
            size,
            max: size - 1,
            roughness: 0.0,
            map: Tilemap::new_with(size, size, 0.0f32),
            generated: false,
        })
    }

    pub fn detail(&self) -> u32 {
        self.detail
    }

    /// Side length of the grid.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Largest valid coordinate (`size - 1`).
    pub fn max(&self) -> usize {
        self.max
    }

    /// Roughness used by the last `generate` call.
    pub fn roughness(&self) -> f32 {
        self.roughness
    }

    pub fn is_generated(&self) -> bool {
        self.generated
    }

    /// The finished grid, indexed `[x, y]`.
    pub fn map(&self) -> TerrainResult<&Tilemap<f32>> {
        if !self.generated {
            return Err(TerrainError::NotGenerated);
        }
        Ok(&self.map)
    }

    /// Take ownership of the finished grid.
    pub fn into_map(self) -> TerrainResult<Tilemap<f32>> {
        if !self.generated {
            return Err(TerrainError::NotGenerated);
        }
        Ok(self.map)
    }

    /// Bounds-checked read. `None` means the coordinate is outside `[0, max]`.
    pub fn value_at(&self, x: i64, y: i64) -> Option<f32> {
        self.map.get_checked(x, y).copied()
    }

    /// Fill the grid. Roughness is not clamped: zero gives a deterministic
    /// surface and negative values invert the displacement. NaN and infinite
    /// roughness are rejected before any cell is touched.
    ///
    /// One value is drawn from `rng` per non-corner cell, square pass before
    /// diamond pass at each level, row by row. On error the grid is left
    /// partially written and `map()` keeps reporting `NotGenerated`.
    pub fn generate<R: UniformSource + ?Sized>(
        &mut self,
        roughness: f32,
        rng: &mut R,
    ) -> TerrainResult<()> {
        if !roughness.is_finite() {
            return Err(TerrainError::InvalidRoughness { roughness });
        }
        self.generated = false;
        self.roughness = roughness;

        let max = self.max;
        let corner = max as f32 / 2.0;
        self.map.set(0, 0, corner);
        self.map.set(max, 0, 0.0);
        self.map.set(max, max, corner);
        self.map.set(0, max, max as f32);

        self.divide(max, rng)?;
        self.generated = true;

        tracing::info!(
            target: LOG_TARGET,
            size = self.size,
            roughness,
            "heightmap.generated"
        );
        Ok(())
    }

    /// Generate with a seeded ChaCha stream.
    pub fn generate_seeded(&mut self, roughness: f32, seed: u64) -> TerrainResult<()> {
        let mut rng = random::seeded_rng(seed);
        self.generate(roughness, &mut rng)
    }

    fn divide<R: UniformSource + ?Sized>(&mut self, size: usize, rng: &mut R) -> TerrainResult<()> {
        let half = size / 2;
        let scale = self.roughness * size as f32;
        if half < 1 {
            return Ok(());
        }

        tracing::debug!(target: LOG_TARGET, size, half, scale, "heightmap.divide");

        for y in (half..self.max).step_by(size) {
            for x in (half..self.max).step_by(size) {
                let offset = displacement(rng, scale);
                self.square(x, y, half, offset)?;
            }
        }

        for y in (0..=self.max).step_by(half) {
            for x in ((y + half) % size..=self.max).step_by(size) {
                let offset = displacement(rng, scale);
                self.diamond(x, y, half, offset)?;
            }
        }

        self.divide(half, rng)
    }

    /// Centre of a square: mean of the four diagonal corners.
    fn square(&mut self, x: usize, y: usize, half: usize, offset: f32) -> TerrainResult<()> {
        let (cx, cy, d) = (x as i64, y as i64, half as i64);
        let corners = [
            self.value_at(cx - d, cy - d),
            self.value_at(cx + d, cy - d),
            self.value_at(cx + d, cy + d),
            self.value_at(cx - d, cy + d),
        ];
        let mean = average(&corners).ok_or(TerrainError::InternalInvariant { x, y })?;
        self.map.set(x, y, mean + offset);
        Ok(())
    }

    /// Edge midpoint: mean of the orthogonal neighbours that exist.
    fn diamond(&mut self, x: usize, y: usize, half: usize, offset: f32) -> TerrainResult<()> {
        let (cx, cy, d) = (x as i64, y as i64, half as i64);
        let edges = [
            self.value_at(cx, cy - d),
            self.value_at(cx + d, cy),
            self.value_at(cx, cy + d),
            self.value_at(cx - d, cy),
        ];
        let mean = average(&edges).ok_or(TerrainError::InternalInvariant { x, y })?;
        self.map.set(x, y, mean + offset);
        Ok(())
    }
}

/// Uniform offset in `[-scale, scale)`.
#[inline]
fn displacement<R: UniformSource + ?Sized>(rng: &mut R, scale: f32) -> f32 {
    rng.next_unit() * scale * 2.0 - scale
}

/// Mean of the in-range samples. `None` when every sample is out of range.
pub fn average(samples: &[Option<f32>]) -> Option<f32> {
    let (total, count) = samples
        .iter()
        .flatten()
        .fold((0.0f32, 0u32), |(total, count), &v| (total + v, count + 1));
    if count == 0 {
        return None;
    }
    Some(total / count as f32)
}

/// Build and generate a heightmap from a config.
/// Returns the grid and the seed that produced it.
pub fn generate_heightmap(config: &GenerationConfig) -> TerrainResult<(Tilemap<f32>, u64)> {
    let seed = random::resolve_seed(config.seed);
    let mut generator = HeightmapGenerator::with_limits(config.detail, &config.limits())?;
    generator.generate_seeded(config.roughness, seed)?;
    Ok((generator.into_map()?, seed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::SequenceSource;

    const EPS: f32 = 1e-4;

    fn assert_close(actual: f32, expected: f32) {
        assert!(
            (actual - expected).abs() < EPS,
            "expected {}, got {}",
            expected,
            actual
        );
    }

    fn flat_generator(detail: u32) -> HeightmapGenerator {
        let mut generator = HeightmapGenerator::new(detail).unwrap();
        generator.generate(0.0, &mut SequenceSource::new(vec![0.5])).unwrap();
        generator
    }

    #[test]
    fn test_size_and_max() {
        for detail in 1..=10 {
            let generator = HeightmapGenerator::new(detail).unwrap();
            assert_eq!(generator.size(), (1usize << detail) + 1);
            assert_eq!(generator.max(), generator.size() - 1);
            assert_eq!(generator.detail(), detail);
        }
    }

    #[test]
    fn test_zero_detail_is_rejected() {
        let err = HeightmapGenerator::new(0).unwrap_err();
        assert!(matches!(err, TerrainError::Configuration { detail: 0 }));
    }

    #[test]
    fn test_memory_ceiling() {
        assert_eq!(grid_size(12, &GeneratorLimits::default()).unwrap(), 4097);
        assert!(matches!(
            HeightmapGenerator::new(13),
            Err(TerrainError::ResourceExhausted { detail: 13, .. })
        ));
        assert!(matches!(
            HeightmapGenerator::new(64),
            Err(TerrainError::ResourceExhausted { requested_cells: u64::MAX, .. })
        ));

        let unbounded = GeneratorLimits { max_cells: u64::MAX };
        assert!(matches!(
            grid_size(32, &unbounded),
            Err(TerrainError::ResourceExhausted { detail: 32, requested_cells: u64::MAX, .. })
        ));
        assert!(matches!(
            HeightmapGenerator::with_limits(32, &unbounded),
            Err(TerrainError::ResourceExhausted { .. })
        ));
        assert!(grid_size(10, &unbounded).is_ok());

        let tight = GeneratorLimits { max_cells: 25 };
        assert!(HeightmapGenerator::with_limits(2, &tight).is_ok());
        assert!(HeightmapGenerator::with_limits(3, &tight).is_err());
    }

    #[test]
    fn test_map_unavailable_before_generate() {
        let generator = HeightmapGenerator::new(2).unwrap();
        assert!(!generator.is_generated());
        assert!(matches!(generator.map(), Err(TerrainError::NotGenerated)));
        assert!(matches!(generator.into_map(), Err(TerrainError::NotGenerated)));
    }

    #[test]
    fn test_corners_are_fixed() {
        for (roughness, seed) in [(0.0, 1), (0.5, 2), (0.8, 3), (-1.0, 4)] {
            let mut generator = HeightmapGenerator::new(4).unwrap();
            generator.generate_seeded(roughness, seed).unwrap();
            let max = generator.max();
            let map = generator.map().unwrap();
            assert_eq!(*map.get(0, 0), max as f32 / 2.0);
            assert_eq!(*map.get(max, 0), 0.0);
            assert_eq!(*map.get(max, max), max as f32 / 2.0);
            assert_eq!(*map.get(0, max), max as f32);
        }
    }

    #[test]
    fn test_detail_one_without_roughness() {
        let generator = flat_generator(1);
        assert_eq!(generator.size(), 3);
        let map = generator.map().unwrap();

        let expected = [
            [1.0, 2.0 / 3.0, 0.0],
            [4.0 / 3.0, 1.0, 2.0 / 3.0],
            [2.0, 4.0 / 3.0, 1.0],
        ];
        for (y, row) in expected.iter().enumerate() {
            for (x, &value) in row.iter().enumerate() {
                assert_close(*map.get(x, y), value);
            }
        }
    }

    #[test]
    fn test_detail_one_with_scripted_offsets() {
        // roughness 1 at size 2 gives scale 2, so offset = u * 4 - 2
        let mut generator = HeightmapGenerator::new(1).unwrap();
        let mut seq = SequenceSource::new(vec![0.75, 0.5, 0.25, 0.5, 0.5]);
        generator.generate(1.0, &mut seq).unwrap();
        let map = generator.map().unwrap();

        assert_close(*map.get(1, 1), 2.0);
        assert_close(*map.get(1, 0), 1.0);
        assert_close(*map.get(0, 1), 2.0 / 3.0);
        assert_close(*map.get(2, 1), 1.0);
        assert_close(*map.get(1, 2), 5.0 / 3.0);
        assert_eq!(seq.draws(), 5);
    }

    #[test]
    fn test_one_draw_per_generated_cell() {
        for detail in 1..=6 {
            let mut generator = HeightmapGenerator::new(detail).unwrap();
            let mut seq = SequenceSource::new(vec![0.1, 0.9, 0.4]);
            generator.generate(0.5, &mut seq).unwrap();
            let size = generator.size();
            assert_eq!(seq.draws(), size * size - 4);
        }
    }

    #[test]
    fn test_flat_cells_are_neighbour_means() {
        let generator = flat_generator(4);
        let max = generator.max();
        let map = generator.map().unwrap();

        let mut size = max;
        while size / 2 >= 1 {
            let half = size / 2;
            let d = half as i64;

            for y in (half..max).step_by(size) {
                for x in (half..max).step_by(size) {
                    let (cx, cy) = (x as i64, y as i64);
                    let corners = [
                        generator.value_at(cx - d, cy - d),
                        generator.value_at(cx + d, cy - d),
                        generator.value_at(cx + d, cy + d),
                        generator.value_at(cx - d, cy + d),
                    ];
                    assert_eq!(corners.iter().flatten().count(), 4);
                    assert_close(*map.get(x, y), average(&corners).unwrap());
                }
            }

            for y in (0..=max).step_by(half) {
                for x in ((y + half) % size..=max).step_by(size) {
                    let (cx, cy) = (x as i64, y as i64);
                    let edges = [
                        generator.value_at(cx, cy - d),
                        generator.value_at(cx + d, cy),
                        generator.value_at(cx, cy + d),
                        generator.value_at(cx - d, cy),
                    ];
                    let on_border = x == 0 || y == 0 || x == max || y == max;
                    let valid = edges.iter().flatten().count();
                    assert_eq!(valid, if on_border { 3 } else { 4 }, "at ({}, {})", x, y);
                    assert_close(*map.get(x, y), average(&edges).unwrap());
                }
            }

            size = half;
        }
    }

    #[test]
    fn test_zero_roughness_ignores_randomness() {
        let mut a = HeightmapGenerator::new(5).unwrap();
        let mut b = HeightmapGenerator::new(5).unwrap();
        a.generate_seeded(0.0, 1).unwrap();
        b.generate_seeded(0.0, 999).unwrap();
        assert_eq!(a.map().unwrap(), b.map().unwrap());
    }

    #[test]
    fn test_full_coverage() {
        let mut generator = HeightmapGenerator::new(6).unwrap();
        generator.generate_seeded(0.6, 42).unwrap();
        let map = generator.map().unwrap();
        assert_eq!(map.as_slice().len(), generator.size() * generator.size());
        for (x, y, &h) in map.iter() {
            assert!(h.is_finite(), "non-finite height at ({}, {})", x, y);
        }
    }

    #[test]
    fn test_same_seed_same_terrain() {
        let mut a = HeightmapGenerator::new(6).unwrap();
        let mut b = HeightmapGenerator::new(6).unwrap();
        a.generate_seeded(0.5, 12345).unwrap();
        b.generate_seeded(0.5, 12345).unwrap();
        assert_eq!(a.map().unwrap(), b.map().unwrap());

        let mut c = HeightmapGenerator::new(6).unwrap();
        c.generate_seeded(0.5, 54321).unwrap();
        assert_ne!(a.map().unwrap(), c.map().unwrap());
    }

    #[test]
    fn test_regenerate_overwrites() {
        let mut generator = HeightmapGenerator::new(4).unwrap();
        generator.generate_seeded(0.8, 7).unwrap();
        generator.generate(0.0, &mut SequenceSource::new(vec![0.5])).unwrap();
        assert_eq!(generator.map().unwrap(), flat_generator(4).map().unwrap());
        assert_eq!(generator.roughness(), 0.0);
    }

    #[test]
    fn test_negative_roughness_stays_finite() {
        let mut generator = HeightmapGenerator::new(5).unwrap();
        generator.generate_seeded(-0.7, 3).unwrap();
        assert!(generator.map().unwrap().as_slice().iter().all(|h| h.is_finite()));
    }

    #[test]
    fn test_non_finite_roughness_rejected() {
        let mut generator = HeightmapGenerator::new(3).unwrap();
        generator.generate_seeded(0.5, 1).unwrap();
        let before = generator.map().unwrap().clone();

        for roughness in [f32::NAN, f32::INFINITY, f32::NEG_INFINITY] {
            let err = generator.generate_seeded(roughness, 1).unwrap_err();
            assert!(matches!(err, TerrainError::InvalidRoughness { .. }));
        }
        // the previous terrain is untouched
        assert_eq!(generator.map().unwrap(), &before);
        assert_eq!(generator.roughness(), 0.5);
    }

    #[test]
    fn test_value_at_bounds() {
        let generator = flat_generator(2);
        assert_eq!(generator.value_at(0, 0), Some(2.0));
        assert_eq!(generator.value_at(4, 4), Some(2.0));
        assert_eq!(generator.value_at(-1, 0), None);
        assert_eq!(generator.value_at(0, 5), None);
        assert_eq!(generator.value_at(5, 5), None);
    }

    #[test]
    fn test_average_skips_out_of_range() {
        assert_eq!(average(&[Some(-1.0), None, Some(3.0), None]), Some(1.0));
        assert_eq!(average(&[Some(0.0), Some(0.0), Some(0.0), Some(0.0)]), Some(0.0));
        assert_eq!(average(&[None, None, None, None]), None);
    }

    #[test]
    fn test_generate_from_config() {
        let config = GenerationConfig {
            detail: 3,
            roughness: 0.4,
            seed: Some(77),
            ..Default::default()
        };
        let (map, seed) = generate_heightmap(&config).unwrap();
        assert_eq!(seed, 77);
        assert_eq!(map.width, 9);

        let mut generator = HeightmapGenerator::new(3).unwrap();
        generator.generate_seeded(0.4, 77).unwrap();
        assert_eq!(&map, generator.map().unwrap());
    }
}
