use clap::Parser;

use terrain_generator::config::GenerationConfig;
use terrain_generator::stats::{self, HeightStats};
use terrain_generator::{export, random, HeightmapGenerator, TerrainResult};

#[derive(Parser, Debug)]
#[command(name = "terrain_generator")]
#[command(about = "Generate fractal heightmaps with the diamond-square algorithm")]
struct Args {
    /// Detail level, map size is 2^detail + 1 (default: 8)
    #[arg(short, long)]
    detail: Option<u32>,

    /// Surface roughness, usually 0.2-0.8 (default: 0.5)
    #[arg(short, long, allow_negative_numbers = true)]
    roughness: Option<f32>,

    /// Random seed (uses random seed if not specified)
    #[arg(short, long)]
    seed: Option<u64>,

    /// JSON file with generation parameters; flags override its values
    #[arg(short, long)]
    config: Option<String>,

    /// Export the heightmap as a grayscale PNG
    #[arg(long)]
    png: Option<String>,

    /// Export the heightmap as JSON
    #[arg(long)]
    json: Option<String>,

    /// Print a height histogram
    #[arg(long)]
    histogram: bool,
}

fn main() {
    let args = Args::parse();
    if let Err(e) = run(args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn resolve_config(args: &Args) -> TerrainResult<GenerationConfig> {
    let mut config = match args.config {
        Some(ref path) => GenerationConfig::load(path)?,
        None => GenerationConfig::default(),
    };
    if let Some(detail) = args.detail {
        config.detail = detail;
    }
    if let Some(roughness) = args.roughness {
        config.roughness = roughness;
    }
    if args.seed.is_some() {
        config.seed = args.seed;
    }
    Ok(config)
}

fn run(args: Args) -> TerrainResult<()> {
    let config = resolve_config(&args)?;
    let size = config.validate()?;
    let seed = random::resolve_seed(config.seed);

    println!("Generating heightmap with seed: {}", seed);
    println!(
        "Map size: {}x{} (detail {}, roughness {})",
        size, size, config.detail, config.roughness
    );

    let mut generator = HeightmapGenerator::with_limits(config.detail, &config.limits())?;
    generator.generate_seeded(config.roughness, seed)?;
    let heightmap = generator.map()?;

    let summary = HeightStats::from_map(heightmap);
    let water_level = stats::default_water_level(size);
    println!(
        "Heightmap range: {:.2} to {:.2} (mean {:.2}, std dev {:.2})",
        summary.min, summary.max, summary.mean, summary.std_dev
    );
    println!(
        "Water level {:.1}: {:.1}% of cells below",
        water_level,
        100.0 * stats::coverage_below(heightmap, water_level)
    );

    if args.histogram {
        stats::print_height_histogram(heightmap, 20, water_level);
    }

    if let Some(ref path) = args.png {
        export::export_heightmap_png(heightmap, path)?;
        println!("Exported PNG to: {}", path);
    }

    if let Some(ref path) = args.json {
        export::export_heightmap_json(heightmap, path)?;
        println!("Exported JSON to: {}", path);
    }

    Ok(())
}
