//! Dataset presets: shapes, search bounds and initial populations.

use std::path::Path;

use anyhow::Result;
use clap::ValueEnum;
use ndarray::{Array2, Array3};
use ncc_register::{init_population, SearchBounds};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::loader;

/// Which dataset and bounds preset to run.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum TestType {
    /// Berea sandstone thin section against its micro-CT scan.
    RealBerea,
    /// Synthetic sphere-pack validation volume.
    SpherePack,
}

/// Everything the registration run needs, loaded and resampled.
pub struct PresetData {
    pub volume: Array3<u8>,
    pub template: Array2<f64>,
    pub bounds: SearchBounds,
    pub init: Array2<f64>,
}

/// Caller-tunable knobs shared by all presets.
pub struct PresetOptions {
    /// Overrides each preset's angle intervals with `(-r, r)` when set.
    pub angle_range: Option<f64>,
    /// Rescale factor applied to volume and template.
    pub zoom: f64,
    /// Seed for the initial population.
    pub seed: Option<u64>,
}

// Berea dataset geometry: thin-section pixels are much finer than CT voxels
// and must be brought to the CT pitch before matching.
const BEREA_TEMPLATE_SHAPE: (usize, usize) = (8460, 13776);
const BEREA_VOLUME_SHAPE: (usize, usize, usize) = (1234, 748, 748);
const BEREA_TEMPLATE_PIXEL_M: f64 = 0.65e-6;
const BEREA_VOLUME_VOXEL_M: f64 = 8.02e-6;
const BEREA_POPULATION: usize = 50;

const SPHEREPACK_VOLUME_SHAPE: (usize, usize, usize) = (300, 300, 300);
const SPHEREPACK_POPULATION: usize = 20;

pub fn load_preset(
    test_type: TestType,
    volume_path: &Path,
    template_path: &Path,
    options: &PresetOptions,
) -> Result<PresetData> {
    match test_type {
        TestType::RealBerea => berea(volume_path, template_path, options),
        TestType::SpherePack => sphere_pack(volume_path, template_path, options),
    }
}

fn population_rng(options: &PresetOptions) -> StdRng {
    match options.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

fn angle_bounds(options: &PresetOptions, default: [(f64, f64); 3]) -> [(f64, f64); 3] {
    match options.angle_range {
        Some(half_width) => [(-half_width, half_width); 3],
        None => default,
    }
}

fn berea(
    volume_path: &Path,
    template_path: &Path,
    options: &PresetOptions,
) -> Result<PresetData> {
    let template_raw = loader::load_raw_image(template_path, BEREA_TEMPLATE_SHAPE)?;
    let pitch_ratio = BEREA_TEMPLATE_PIXEL_M / BEREA_VOLUME_VOXEL_M;
    let template = loader::zoom_2d(&template_raw, pitch_ratio * options.zoom).mapv(f64::from);

    let volume_raw = loader::load_raw_volume(volume_path, BEREA_VOLUME_SHAPE)?;
    let volume = loader::zoom_3d(&volume_raw, options.zoom);

    // The sample was cut roughly perpendicular to axis 1; the middle half
    // of that axis avoids the degraded faces of the plug.
    let extent = volume.dim().1 as f64;
    let bounds = SearchBounds::new(
        angle_bounds(options, [(0.0, 10.0), (-3.0, 3.0), (-3.0, 3.0)]),
        (extent / 4.0, extent * 3.0 / 4.0),
    )?;

    let first = [5.0, 0.0, 0.0, (130.0 * options.zoom).round()];
    let mut rng = population_rng(options);
    let init = init_population(&bounds, &first, BEREA_POPULATION, &mut rng);

    Ok(PresetData {
        volume,
        template,
        bounds,
        init,
    })
}

fn sphere_pack(
    volume_path: &Path,
    template_path: &Path,
    options: &PresetOptions,
) -> Result<PresetData> {
    let volume_raw = loader::load_raw_volume(volume_path, SPHEREPACK_VOLUME_SHAPE)?;
    let volume = loader::zoom_3d(&volume_raw, options.zoom);
    let template = loader::load_template_image(template_path)?;

    let extent = volume.dim().0 as f64;
    let bounds = SearchBounds::new(
        angle_bounds(options, [(-7.0, 7.0); 3]),
        (extent * 2.0 / 5.0, extent * 3.0 / 5.0),
    )?;

    let first = [0.0, 0.0, 0.0, (extent / 2.0).round()];
    let mut rng = population_rng(options);
    let init = init_population(&bounds, &first, SPHEREPACK_POPULATION, &mut rng);

    Ok(PresetData {
        volume,
        template,
        bounds,
        init,
    })
}
