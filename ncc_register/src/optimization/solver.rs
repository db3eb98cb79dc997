//! Differential evolution (best/1/bin) over the registration parameters.
//!
//! The driver loop is strictly generational: a full trial population is
//! built, evaluated, and only then compared against the frozen parent
//! generation (deferred replacement), so the comparison baseline never
//! shifts mid-generation. Trial evaluation fans out over a dedicated rayon
//! pool; everything the objective touches is read-only, so no locking is
//! involved anywhere.

use ndarray::Array2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use rayon::ThreadPool;
use tracing::debug;

use super::types::{
    round_section, ConvergenceStatus, DeConfig, SearchBounds, SearchResult, MIN_POPULATION,
    PARAM_DIM,
};
use crate::error::{RegisterError, Result};

/// Build an initial population: uniform samples within the bounds, the
/// first member replaced by `first`, and the section coordinate of every
/// member rounded half-to-even so only integer indices enter the search.
pub fn init_population<R: Rng>(
    bounds: &SearchBounds,
    first: &[f64; PARAM_DIM],
    size: usize,
    rng: &mut R,
) -> Array2<f64> {
    let flat = bounds.as_flat();
    let mut population = Array2::from_shape_fn((size, PARAM_DIM), |(_, dim)| {
        let (min, max) = flat[dim];
        if min < max {
            rng.gen_range(min..max)
        } else {
            min
        }
    });
    for (dim, value) in first.iter().enumerate() {
        population[[0, dim]] = *value;
    }
    for row in 0..size {
        population[[row, 3]] = round_section(population[[row, 3]]) as f64;
    }
    population
}

/// best/1/bin differential-evolution solver.
pub struct DifferentialEvolution {
    config: DeConfig,
    pool: ThreadPool,
}

impl DifferentialEvolution {
    /// Validate the configuration and build the evaluation thread pool
    /// (`workers` threads, or one per core when unset).
    pub fn new(config: DeConfig) -> Result<Self> {
        config.validate()?;
        let mut builder = rayon::ThreadPoolBuilder::new();
        if let Some(workers) = config.workers {
            builder = builder.num_threads(workers);
        }
        let pool = builder
            .build()
            .map_err(|err| RegisterError::InvalidConfig(err.to_string()))?;
        Ok(Self { config, pool })
    }

    /// Minimize `objective` within `bounds`, starting from `init`.
    ///
    /// `callback` runs after every generation's replacement step with the
    /// current best candidate; it observes the search but cannot steer it.
    ///
    /// # Errors
    /// Population shape problems fail before any evaluation. An objective
    /// error for any candidate aborts the whole search: deferred
    /// replacement needs the complete generation, so partial results are
    /// never salvaged.
    pub fn solve<F, C>(
        &self,
        objective: F,
        bounds: &SearchBounds,
        init: &Array2<f64>,
        mut callback: C,
    ) -> Result<SearchResult>
    where
        F: Fn(&[f64; PARAM_DIM]) -> Result<f64> + Sync,
        C: FnMut(&[f64; PARAM_DIM]),
    {
        if init.ncols() != PARAM_DIM {
            return Err(RegisterError::PopulationShape {
                got: init.ncols(),
                expected: PARAM_DIM,
            });
        }
        let popsize = init.nrows();
        if popsize < MIN_POPULATION {
            return Err(RegisterError::PopulationTooSmall {
                got: popsize,
                min: MIN_POPULATION,
            });
        }

        let flat_bounds = bounds.as_flat();
        let mut rng = match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let mut population: Vec<[f64; PARAM_DIM]> = init
            .rows()
            .into_iter()
            .map(|row| [row[0], row[1], row[2], row[3]])
            .collect();
        let mut energies = self.evaluate_generation(&objective, &population)?;
        let mut evaluations = popsize;
        let mut best = argmin(&energies);

        let mut generations = 0;
        let mut status = ConvergenceStatus::MaxGenerations;

        for generation in 1..=self.config.max_generations {
            generations = generation;

            // Mutation scale dithered once per generation.
            let (scale_min, scale_max) = self.config.mutation;
            let scale = if scale_min < scale_max {
                rng.gen_range(scale_min..scale_max)
            } else {
                scale_min
            };

            let trials: Vec<[f64; PARAM_DIM]> = (0..popsize)
                .map(|member| {
                    build_trial(
                        member,
                        best,
                        &population,
                        scale,
                        self.config.recombination,
                        &flat_bounds,
                        &mut rng,
                    )
                })
                .collect();

            let trial_energies = self.evaluate_generation(&objective, &trials)?;
            evaluations += popsize;

            // Deferred replacement: the parent generation stayed frozen
            // while all trials were scored.
            for member in 0..popsize {
                if trial_energies[member] < energies[member] {
                    population[member] = trials[member];
                    energies[member] = trial_energies[member];
                }
            }
            best = argmin(&energies);
            callback(&population[best]);

            let (mean, spread) = mean_and_std(&energies);
            debug!(
                generation,
                best_energy = energies[best],
                spread,
                "generation complete"
            );
            if spread <= self.config.tolerance * mean.abs() {
                status = ConvergenceStatus::Converged;
                break;
            }
        }

        Ok(SearchResult {
            best: population[best],
            best_energy: energies[best],
            generations,
            evaluations,
            status,
        })
    }

    fn evaluate_generation<F>(
        &self,
        objective: &F,
        candidates: &[[f64; PARAM_DIM]],
    ) -> Result<Vec<f64>>
    where
        F: Fn(&[f64; PARAM_DIM]) -> Result<f64> + Sync,
    {
        self.pool
            .install(|| candidates.par_iter().map(objective).collect())
    }
}

/// Build one trial vector: best-member base plus a scaled difference of two
/// distinct donors, binomially crossed with the parent. One dimension is
/// always taken from the mutant; mutated coordinates are clipped to the
/// bounds.
fn build_trial<R: Rng>(
    member: usize,
    best: usize,
    population: &[[f64; PARAM_DIM]],
    scale: f64,
    recombination: f64,
    bounds: &[(f64, f64); PARAM_DIM],
    rng: &mut R,
) -> [f64; PARAM_DIM] {
    let popsize = population.len();
    let mut donor_a = rng.gen_range(0..popsize);
    while donor_a == member {
        donor_a = rng.gen_range(0..popsize);
    }
    let mut donor_b = rng.gen_range(0..popsize);
    while donor_b == member || donor_b == donor_a {
        donor_b = rng.gen_range(0..popsize);
    }

    let forced = rng.gen_range(0..PARAM_DIM);
    let mut trial = population[member];
    for dim in 0..PARAM_DIM {
        if dim == forced || rng.gen::<f64>() < recombination {
            let mutant =
                population[best][dim] + scale * (population[donor_a][dim] - population[donor_b][dim]);
            trial[dim] = mutant.clamp(bounds[dim].0, bounds[dim].1);
        }
    }
    trial
}

fn argmin(energies: &[f64]) -> usize {
    let mut best = 0;
    for (index, &energy) in energies.iter().enumerate() {
        if energy < energies[best] {
            best = index;
        }
    }
    best
}

fn mean_and_std(values: &[f64]) -> (f64, f64) {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n;
    (mean, variance.sqrt())
}
