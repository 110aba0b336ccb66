//! Read-only analysis of finished heightmaps.

use crate::tilemap::Tilemap;

/// Summary statistics over every cell of a heightmap.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HeightStats {
    pub min: f32,
    pub max: f32,
    pub mean: f64,
    pub std_dev: f64,
    pub count: usize,
}

impl HeightStats {
    pub fn from_map(heightmap: &Tilemap<f32>) -> Self {
        let mut min_h = f32::MAX;
        let mut max_h = f32::MIN;
        let mut sum = 0.0f64;

        for (_, _, &h) in heightmap.iter() {
            min_h = min_h.min(h);
            max_h = max_h.max(h);
            sum += h as f64;
        }

        let count = heightmap.as_slice().len();
        if count == 0 {
            return Self { min: 0.0, max: 0.0, mean: 0.0, std_dev: 0.0, count };
        }

        let mean = sum / count as f64;
        let variance = heightmap
            .as_slice()
            .iter()
            .map(|&h| {
                let diff = h as f64 - mean;
                diff * diff
            })
            .sum::<f64>()
            / count as f64;

        Self {
            min: min_h,
            max: max_h,
            mean,
            std_dev: variance.sqrt(),
            count,
        }
    }

    pub fn range(&self) -> f32 {
        self.max - self.min
    }
}

/// Water plane height used when rendering a grid of side `size`.
pub fn default_water_level(size: usize) -> f32 {
    size as f32 * 0.5
}

/// Fraction of cells strictly below `level`.
pub fn coverage_below(heightmap: &Tilemap<f32>, level: f32) -> f64 {
    let cells = heightmap.as_slice();
    if cells.is_empty() {
        return 0.0;
    }
    let below = cells.iter().filter(|&&h| h < level).count();
    below as f64 / cells.len() as f64
}

/// Normalize heightmap values to 0.0-1.0 range.
/// A flat map normalizes to all zeros.
pub fn normalize_heightmap(heightmap: &Tilemap<f32>) -> Tilemap<f32> {
    let stats = HeightStats::from_map(heightmap);
    let range = stats.range();

    let mut normalized = Tilemap::new_with(heightmap.width, heightmap.height, 0.0f32);
    if range < 0.0001 {
        return normalized;
    }

    for (x, y, &val) in heightmap.iter() {
        normalized.set(x, y, (val - stats.min) / range);
    }
    normalized
}

/// Print a histogram of height values.
/// Shows distribution across bins and key statistics, marking the bin that
/// holds `water_level`.
pub fn print_height_histogram(heightmap: &Tilemap<f32>, num_bins: usize, water_level: f32) {
    print!("{}", format_height_histogram(heightmap, num_bins, water_level));
}

pub fn format_height_histogram(heightmap: &Tilemap<f32>, num_bins: usize, water_level: f32) -> String {
    let num_bins = num_bins.clamp(5, 50);
    let stats = HeightStats::from_map(heightmap);
    if stats.count == 0 {
        return String::from("(empty heightmap)\n");
    }

    let mut sorted: Vec<f32> = heightmap.as_slice().to_vec();
    sorted.sort_by(f32::total_cmp);
    let count = sorted.len();
    let median = if count % 2 == 0 {
        (sorted[count / 2 - 1] + sorted[count / 2]) / 2.0
    } else {
        sorted[count / 2]
    };

    let range = stats.range();
    let bin_width = if range > 0.0 { range / num_bins as f32 } else { 1.0 };
    let mut bins = vec![0usize; num_bins];
    for h in &sorted {
        let bin_idx = ((*h - stats.min) / bin_width) as usize;
        bins[bin_idx.min(num_bins - 1)] += 1;
    }

    let max_bin = bins.iter().copied().max().unwrap_or(1).max(1);
    let bar_max_width = 40;
    let below = coverage_below(heightmap, water_level);

    let mut out = String::new();
    out.push_str("\nHeight distribution\n");
    out.push_str(&format!(
        "  Min: {:.3}  Max: {:.3}  Range: {:.3}\n",
        stats.min, stats.max, range
    ));
    out.push_str(&format!(
        "  Mean: {:.3}  Median: {:.3}  Std Dev: {:.3}\n",
        stats.mean, median, stats.std_dev
    ));
    out.push_str(&format!(
        "  Below water ({:.1}): {:.1}%\n",
        water_level,
        below * 100.0
    ));

    for (i, &bin_count) in bins.iter().enumerate() {
        let bin_start = stats.min + i as f32 * bin_width;
        let bin_end = bin_start + bin_width;
        let bar_len = bin_count * bar_max_width / max_bin;
        let pct = 100.0 * bin_count as f64 / count as f64;
        let marker = if bin_start <= water_level && water_level < bin_end { " <WATER" } else { "" };

        out.push_str(&format!(
            "  {:>9.2} - {:>9.2} |{:<40}| {:>5.1}%{}\n",
            bin_start,
            bin_end,
            "#".repeat(bar_len),
            pct,
            marker
        ));
    }
    out
}
