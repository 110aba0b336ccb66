//! Debug tool for comparing roughness values visually
//! Generates a 3x3 grid of shaded heightmaps from the same seed, each topped
//! by a bar showing its roughness

use clap::Parser;
use image::{GrayImage, ImageBuffer, Luma};
use rayon::prelude::*;
use terrain_generator::export::render_shaded_heightmap;
use terrain_generator::{HeightmapGenerator, TerrainResult};

const ROUGHNESS_VALUES: [f32; 9] = [0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7, 0.8, 0.9];
const COLS: usize = 3;
const LABEL_HEIGHT: u32 = 16;

#[derive(Parser, Debug)]
#[command(name = "roughness_grid")]
#[command(about = "Render one seed at several roughness values side by side")]
struct Args {
    /// Detail level of each cell (size = 2^detail + 1)
    #[arg(short, long, default_value = "7")]
    detail: u32,

    /// Random seed shared by every cell
    #[arg(short, long, default_value = "42")]
    seed: u64,

    /// Output PNG path
    #[arg(short, long, default_value = "roughness_comparison.png")]
    output: String,
}

fn main() {
    let args = Args::parse();
    if let Err(e) = run(&args) {
        eprintln!("roughness_grid failed: {}", e);
        std::process::exit(1);
    }
}

fn run(args: &Args) -> TerrainResult<()> {
    println!("Generating roughness comparison grid...");

    let images = ROUGHNESS_VALUES
        .par_iter()
        .map(|&roughness| -> TerrainResult<(f32, GrayImage)> {
            let mut generator = HeightmapGenerator::new(args.detail)?;
            generator.generate_seeded(roughness, args.seed)?;
            let img = render_shaded_heightmap(generator.map()?);
            Ok((roughness, img))
        })
        .collect::<TerrainResult<Vec<_>>>()?;

    for (roughness, _) in &images {
        println!("  Rendered: roughness {:.1}", roughness);
    }

    let grid = create_grid(&images, COLS);
    grid.save(&args.output)?;
    println!("Saved {} ({}x{})", args.output, grid.width(), grid.height());
    Ok(())
}

fn create_grid(images: &[(f32, GrayImage)], cols: usize) -> GrayImage {
    if images.is_empty() {
        return ImageBuffer::new(1, 1);
    }

    let rows = images.len().div_ceil(cols);
    let cell_width = images[0].1.width();
    let cell_height = images[0].1.height();
    let total_cell_height = cell_height + LABEL_HEIGHT;

    let mut grid: GrayImage = ImageBuffer::from_pixel(
        cell_width * cols as u32,
        total_cell_height * rows as u32,
        Luma([30]),
    );

    for (idx, (roughness, img)) in images.iter().enumerate() {
        let x_offset = (idx % cols) as u32 * cell_width;
        let row_top = (idx / cols) as u32 * total_cell_height;

        for (x, y, pixel) in img.enumerate_pixels() {
            grid.put_pixel(x_offset + x, row_top + LABEL_HEIGHT + y, *pixel);
        }

        draw_roughness_bar(
            &mut grid,
            x_offset + 2,
            row_top + 4,
            cell_width.saturating_sub(4),
            *roughness,
        );
    }

    grid
}

/// Fill the label strip above a cell with a bar as long as the roughness
/// fraction, with a tick every tenth so values can be read off.
fn draw_roughness_bar(img: &mut GrayImage, x: u32, y: u32, width: u32, roughness: f32) {
    let filled = (width as f32 * roughness.clamp(0.0, 1.0)).round() as u32;
    let bar_height = LABEL_HEIGHT / 2;

    for dy in 0..bar_height {
        for dx in 0..width {
            let tick = dx > 0 && (dx * 10) % width < 10 && dy < bar_height / 2;
            let level = if dx < filled { 220 } else if tick { 120 } else { 60 };
            img.put_pixel(x + dx, y + dy, Luma([level]));
        }
    }
}
