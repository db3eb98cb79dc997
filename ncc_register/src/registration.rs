//! High-level registration runs: search driver plus final materialization.

use std::time::Duration;

use ndarray::{Array2, Array3};
use num_traits::Zero;
use tracing::info;

use crate::correlation::{normalized_cross_correlation, CorrelationMode};
use crate::error::{RegisterError, Result};
use crate::optimization::{
    ConvergenceStatus, DeConfig, DifferentialEvolution, RegistrationProblem, SearchBounds,
    SectionParams,
};
use crate::timing::Stopwatch;
use crate::volume::{rotate_volume, slice_volume, SliceAxis};

/// Completed registration run.
#[derive(Debug)]
pub struct Registration<T> {
    /// Best parameters found.
    pub params: SectionParams,
    /// Peak correlation at the best parameters (positive; recomputed during
    /// materialization, not read back from the search).
    pub correlation: f64,
    pub peak_row: usize,
    pub peak_col: usize,
    /// Best-member objective value per generation, appended by the
    /// observational callback.
    pub loss_history: Vec<f64>,
    pub elapsed: Duration,
    pub generations: usize,
    pub evaluations: usize,
    pub status: ConvergenceStatus,
    /// Final rotate/slice/correlate artifacts for reporting.
    pub artifacts: Materialized<T>,
}

/// Artifacts of rerunning the pipeline at one parameter set.
#[derive(Debug)]
pub struct Materialized<T> {
    pub rotated_volume: Array3<T>,
    /// Extracted section, converted to f64.
    pub section: Array2<f64>,
    pub surface: Array2<f64>,
    pub peak: f64,
    pub peak_row: usize,
    pub peak_col: usize,
}

/// Run the full search and materialize the winner.
///
/// The volume and template are only ever read; population evaluation runs
/// on the solver's thread pool against shared references to them.
pub fn register<T>(
    volume: &Array3<T>,
    template: &Array2<f64>,
    axis: SliceAxis,
    bounds: &SearchBounds,
    init: &Array2<f64>,
    config: &DeConfig,
) -> Result<Registration<T>>
where
    T: Copy + Zero + Into<f64> + Send + Sync,
{
    let problem = RegistrationProblem::new(volume, template, axis)?;
    let solver = DifferentialEvolution::new(config.clone())?;

    let stopwatch = Stopwatch::start();
    let mut loss_history = Vec::new();
    let outcome = solver.solve(
        |params| problem.evaluate(params),
        bounds,
        init,
        |best| {
            // The best member was scored successfully this generation, and
            // the objective is deterministic, so this re-evaluation cannot
            // fail.
            if let Ok(loss) = problem.evaluate(best) {
                loss_history.push(loss);
            }
        },
    )?;
    let elapsed = stopwatch.elapsed();

    let params = SectionParams::from_vector(&outcome.best);
    let artifacts = materialize(volume, template, &params, axis)?;

    info!(
        theta_x = params.angles.theta_x,
        theta_y = params.angles.theta_y,
        theta_z = params.angles.theta_z,
        section = params.section,
        correlation = artifacts.peak,
        generations = outcome.generations,
        elapsed_secs = elapsed.as_secs_f64(),
        "registration finished"
    );

    Ok(Registration {
        params,
        correlation: artifacts.peak,
        peak_row: artifacts.peak_row,
        peak_col: artifacts.peak_col,
        loss_history,
        elapsed,
        generations: outcome.generations,
        evaluations: outcome.evaluations,
        status: outcome.status,
        artifacts,
    })
}

/// Rerun rotation, slicing and correlation once at `params`.
///
/// Intermediate values produced during the search are never reused: the
/// final artifacts always come from one deterministic pass over the
/// original inputs.
pub fn materialize<T>(
    volume: &Array3<T>,
    template: &Array2<f64>,
    params: &SectionParams,
    axis: SliceAxis,
) -> Result<Materialized<T>>
where
    T: Copy + Zero + Into<f64> + Send + Sync,
{
    if params.section < 0 {
        return Err(RegisterError::SectionOutOfRange {
            index: params.section,
            axis: axis.as_index(),
            extent: volume.len_of(ndarray::Axis(axis.as_index())),
        });
    }

    let rotated_volume = rotate_volume(volume, &params.angles);
    let section = slice_volume(&rotated_volume, params.section as usize, axis)?
        .mapv(|value| value.into());
    let ncc =
        normalized_cross_correlation(&template.view(), &section.view(), CorrelationMode::Valid)?;

    Ok(Materialized {
        rotated_volume,
        section,
        surface: ncc.surface,
        peak: ncc.peak,
        peak_row: ncc.peak_row,
        peak_col: ncc.peak_col,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimization::init_population;
    use crate::test_utils::make_sphere_pack;
    use ndarray::s;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_materialize_matches_objective() {
        let volume = make_sphere_pack((16, 16, 16), 4, (2.0, 3.0), 3);
        let template = slice_volume(&volume, 8, SliceAxis::Axis0)
            .unwrap()
            .mapv(f64::from)
            .slice(s![2..12, 2..12])
            .to_owned();

        let params = SectionParams::from_vector(&[2.0, -1.0, 0.5, 8.0]);
        let first = materialize(&volume, &template, &params, SliceAxis::Axis0).unwrap();
        let second = materialize(&volume, &template, &params, SliceAxis::Axis0).unwrap();

        assert_eq!(first.peak.to_bits(), second.peak.to_bits());
        assert_eq!(first.section, second.section);
        assert_eq!(first.surface, second.surface);
        assert_eq!(
            first.rotated_volume.dim(),
            volume.dim(),
            "rotation must preserve shape"
        );
    }

    #[test]
    fn test_register_small_volume() {
        let volume = make_sphere_pack((16, 16, 16), 4, (2.0, 3.0), 5);
        let template = slice_volume(&volume, 8, SliceAxis::Axis0)
            .unwrap()
            .mapv(f64::from)
            .slice(s![3..13, 3..13])
            .to_owned();

        let bounds = SearchBounds::new([(-1.0, 1.0); 3], (6.0, 10.0)).unwrap();
        let mut rng = StdRng::seed_from_u64(8);
        let init = init_population(&bounds, &[0.0, 0.0, 0.0, 7.0], 8, &mut rng);
        let config = DeConfig {
            max_generations: 10,
            seed: Some(6),
            workers: Some(2),
            ..Default::default()
        };

        let run = register(
            &volume,
            &template,
            SliceAxis::Axis0,
            &bounds,
            &init,
            &config,
        )
        .unwrap();

        assert_eq!(run.loss_history.len(), run.generations);
        assert!(run.correlation <= 1.0 + 1e-6);
        assert!(run.correlation > 0.0);
        assert!((6..=10).contains(&run.params.section));
        assert_eq!(run.artifacts.section.dim(), (16, 16));
    }
}
