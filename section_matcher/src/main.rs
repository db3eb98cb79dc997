//! Command-line front end: load a dataset preset, run the registration
//! search, and persist the JSON record plus a comparison image.

mod loader;
mod output;
mod params;
mod visualize;

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use ncc_register::{register, DeConfig, SliceAxis};
use params::TestType;

#[derive(Parser, Debug)]
#[command(
    name = "section_matcher",
    about = "Register a 2D section image against a 3D volume"
)]
struct Args {
    /// Half-width of the rotation-angle search interval in degrees
    /// (overrides the preset's angle bounds)
    #[arg(long)]
    angle_range: Option<f64>,

    /// Rescale factor applied to volume and template before matching
    #[arg(long, default_value_t = 1.0)]
    zoom: f64,

    /// Raw binary volume file
    #[arg(long)]
    volume: PathBuf,

    /// Template file (raw binary for real-berea, any image format otherwise)
    #[arg(long)]
    template: PathBuf,

    /// Worker threads for population evaluation (default: all cores)
    #[arg(long)]
    workers: Option<usize>,

    /// Dataset preset selecting loaders and search bounds
    #[arg(long, value_enum, default_value = "real-berea")]
    test_type: TestType,

    /// Axis along which 2D sections are extracted (0, 1 or 2)
    #[arg(long, default_value_t = 2)]
    section_axis: usize,

    /// Directory for the JSON record and comparison image
    #[arg(long, default_value = "results")]
    output_dir: PathBuf,

    /// RNG seed for reproducible runs
    #[arg(long)]
    seed: Option<u64>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    let args = Args::parse();

    let axis = SliceAxis::try_from(args.section_axis)?;
    let preset = params::load_preset(
        args.test_type,
        &args.volume,
        &args.template,
        &params::PresetOptions {
            angle_range: args.angle_range,
            zoom: args.zoom,
            seed: args.seed,
        },
    )?;

    info!(
        test_type = ?args.test_type,
        volume_shape = ?preset.volume.dim(),
        template_shape = ?preset.template.dim(),
        "starting optimization"
    );

    let config = DeConfig {
        seed: args.seed,
        workers: args.workers,
        ..Default::default()
    };
    let run = register(
        &preset.volume,
        &preset.template,
        axis,
        &preset.bounds,
        &preset.init,
        &config,
    )?;

    info!(
        theta_x = run.params.angles.theta_x,
        theta_y = run.params.angles.theta_y,
        theta_z = run.params.angles.theta_z,
        section = run.params.section,
        correlation = run.correlation,
        elapsed_secs = run.elapsed.as_secs_f64(),
        "optimization finished"
    );

    std::fs::create_dir_all(&args.output_dir)?;

    let record = output::RunRecord::from_registration(&run);
    let json_path = args
        .output_dir
        .join(format!("optimization_results_zoom_{}.json", args.zoom));
    record.write(&json_path)?;

    let image_path = args
        .output_dir
        .join(format!("registration_zoom_{}.png", args.zoom));
    visualize::write_comparison(
        &run.artifacts.section,
        &preset.template,
        run.peak_row,
        run.peak_col,
        &image_path,
    )?;

    info!(
        record = %json_path.display(),
        image = %image_path.display(),
        "results written"
    );
    Ok(())
}
