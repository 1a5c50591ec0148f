use clap::{Parser, Subcommand};
use cli::SpriteSheetConfig;
use color_eyre::eyre::{eyre, Result};
use sprite_geometry::{extract_source_region_from_point, extract_sprite_rects, load_alpha_image};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::{self, EnvFilter};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build geometry for every sprite in a sheet configuration
    Build {
        /// Path to the TOML or JSON configuration file
        #[arg(short, long)]
        config: PathBuf,
        /// Overrides the configured output path
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print the sprite rects found by auto-slicing an image
    Slice {
        /// Path to the sprite sheet image
        #[arg(short, long)]
        input: PathBuf,
    },
    /// Print the sprite rect under a point
    Select {
        /// Path to the sprite sheet image
        #[arg(short, long)]
        input: PathBuf,
        #[arg(short)]
        x: f32,
        #[arg(short)]
        y: f32,
    },
    /// Print the JSON schema of the configuration file
    Schema,
}

fn main() -> Result<()> {
    color_eyre::install()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info"))
        )
        .init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Build { config, output } => build_sheet(config, output.as_deref())?,
        Commands::Slice { input } => slice_sheet(input)?,
        Commands::Select { input, x, y } => select_sprite(input, *x, *y)?,
        Commands::Schema => {
            let schema = schemars::schema_for!(SpriteSheetConfig);
            println!("{}", serde_json::to_string_pretty(&schema)?);
        }
    }

    Ok(())
}

fn build_sheet(config_path: &Path, output: Option<&Path>) -> Result<()> {
    let config = SpriteSheetConfig::from_file(config_path)?;
    info!("Building {} sprites from {}", config.sprites.len(), config.input_path);

    // Relative paths in the config are relative to the config file
    let base = config_path.parent().unwrap_or_else(|| Path::new("."));
    let sheet = load_alpha_image(base.join(&config.input_path))?;
    let built = config.build(&sheet);

    for sprite in &built.sprites {
        if sprite.geometry.triangles.is_empty() {
            warn!("Sprite '{}' produced no triangles", sprite.name);
        } else {
            info!(
                "Sprite '{}': {} polygons, {} triangles",
                sprite.name,
                sprite.geometry.polygons.polygons.len(),
                sprite.geometry.triangle_count()
            );
        }
    }

    let output_path = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| base.join(&config.output_path));
    std::fs::write(&output_path, serde_json::to_string_pretty(&built)?)?;

    info!("Geometry saved to: {:?}", output_path);
    Ok(())
}

fn slice_sheet(input: &Path) -> Result<()> {
    let sheet = load_alpha_image(input)?;
    let rects = extract_sprite_rects(&sheet);
    info!("Found {} sprites", rects.len());
    println!("{}", serde_json::to_string_pretty(&rects)?);
    Ok(())
}

fn select_sprite(input: &Path, x: f32, y: f32) -> Result<()> {
    let sheet = load_alpha_image(input)?;
    let rect = extract_source_region_from_point(&sheet, x, y)
        .ok_or_else(|| eyre!("No sprite found near ({x}, {y})"))?;
    println!("{}", serde_json::to_string_pretty(&rect)?);
    Ok(())
}
