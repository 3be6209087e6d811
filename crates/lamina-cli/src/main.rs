//! lamina CLI - slice STL meshes into laser-cut layers
//!
//! Reads a mesh, slices it along one axis and writes the layers as JSON.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use lamina_math::Axis;
use lamina_mesh::{load_mesh_file, BoundingBox};
use lamina_slicer::{slice_with_settings, Layer, SliceSettings, SliceStats, VectorModel};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "lamina")]
#[command(about = "Slice triangle meshes into 2D layers for laser cutting", long_about = None)]
struct Cli {
    /// Log debug output (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Display information about a mesh file
    Info {
        /// Path to the STL file
        file: PathBuf,
    },
    /// Slice a mesh and write the layers as JSON
    Slice {
        /// Input STL file
        input: PathBuf,
        /// Slicing axis (x, y or z)
        #[arg(short, long)]
        axis: Option<Axis>,
        /// Target layer thickness in model units
        #[arg(short, long)]
        thickness: Option<f64>,
        /// TOML file with slicing settings
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Pretty-print the JSON
        #[arg(long)]
        pretty: bool,
    },
}

/// JSON document written by `slice`.
#[derive(Serialize)]
struct SliceReport<'a> {
    axis: Axis,
    bounds: &'a BoundingBox,
    stats: SliceStats,
    layers: &'a [Layer],
    models: Vec<VectorModel>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Info { file } => {
            show_info(&file)?;
        }
        Commands::Slice {
            input,
            axis,
            thickness,
            config,
            output,
            pretty,
        } => {
            let settings = resolve_settings(config.as_deref(), axis, thickness)?;
            slice_file(&input, &settings, output.as_deref(), pretty)?;
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Settings from an optional TOML file, with flags taking precedence.
fn resolve_settings(
    config: Option<&Path>,
    axis: Option<Axis>,
    thickness: Option<f64>,
) -> Result<SliceSettings> {
    let mut settings = match config {
        Some(path) => load_settings(path)?,
        None => SliceSettings::default(),
    };
    if let Some(axis) = axis {
        settings.axis = axis;
    }
    if let Some(thickness) = thickness {
        settings.layer_thickness = thickness;
    }
    settings.validate()?;
    Ok(settings)
}

fn load_settings(path: &Path) -> Result<SliceSettings> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    toml::from_str(&text).with_context(|| format!("Invalid config {}", path.display()))
}

fn show_info(file: &Path) -> Result<()> {
    let mesh =
        load_mesh_file(file).with_context(|| format!("Failed to load {}", file.display()))?;
    let bounds = mesh.bounds();
    let size = bounds.size();

    println!("File: {}", file.display());
    println!("Triangles: {}", mesh.num_triangles());
    println!("Vertices: {}", mesh.num_vertices());
    println!(
        "Bounds: ({:.3}, {:.3}, {:.3}) .. ({:.3}, {:.3}, {:.3})",
        bounds.min.x, bounds.min.y, bounds.min.z, bounds.max.x, bounds.max.y, bounds.max.z
    );
    println!("Size: {:.3} x {:.3} x {:.3}", size.x, size.y, size.z);

    Ok(())
}

fn slice_file(
    input: &Path,
    settings: &SliceSettings,
    output: Option<&Path>,
    pretty: bool,
) -> Result<()> {
    let mesh =
        load_mesh_file(input).with_context(|| format!("Failed to load {}", input.display()))?;
    let result = slice_with_settings(&mesh, settings)?;
    let stats = result.stats();

    info!(
        layers = stats.layer_count,
        paths = stats.path_count,
        closed = stats.closed_count,
        open = stats.open_count,
        holes = stats.hole_count,
        "Sliced {}",
        input.display()
    );

    let report = SliceReport {
        axis: result.axis,
        bounds: &result.bounds,
        stats,
        layers: &result.layers,
        models: result.models(),
    };
    let json = if pretty {
        serde_json::to_string_pretty(&report)?
    } else {
        serde_json::to_string(&report)?
    };

    match output {
        Some(path) => {
            fs::write(path, json)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!("Wrote {}", path.display());
        }
        None => println!("{}", json),
    }

    Ok(())
}
