//! Parameter-space and configuration types for the global search.

use serde::Serialize;

use crate::error::{RegisterError, Result};
use crate::volume::RotationAngles;

/// Dimensionality of the search space: three angles plus the section index.
pub const PARAM_DIM: usize = 4;

/// Smallest population best/1/bin can mutate meaningfully.
pub const MIN_POPULATION: usize = 5;

/// Round a continuous section coordinate to an index, ties to even.
///
/// Matches the rounding the population initializer applies, so the same
/// fractional coordinate always maps to the same slice.
pub fn round_section(value: f64) -> i64 {
    value.round_ties_even() as i64
}

/// Typed form of a flat candidate vector.
///
/// The optimizer works on `[theta_x, theta_y, theta_z, section]` vectors;
/// everything downstream of it uses this struct so the section index is
/// rounded in exactly one place.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SectionParams {
    pub angles: RotationAngles,
    /// Section index along the slicing axis. May be out of range for the
    /// volume; consumers validate against the axis extent.
    pub section: i64,
}

impl SectionParams {
    /// Convert from the optimizer's flat vector, rounding the section
    /// coordinate half-to-even.
    pub fn from_vector(vector: &[f64; PARAM_DIM]) -> Self {
        Self {
            angles: RotationAngles::new(vector[0], vector[1], vector[2]),
            section: round_section(vector[3]),
        }
    }

    pub fn to_vector(&self) -> [f64; PARAM_DIM] {
        [
            self.angles.theta_x,
            self.angles.theta_y,
            self.angles.theta_z,
            self.section as f64,
        ]
    }
}

/// Per-dimension search domain: three angle intervals (degrees) and one
/// section-index interval.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchBounds {
    pub angles: [(f64, f64); 3],
    pub section: (f64, f64),
}

impl SearchBounds {
    /// # Errors
    /// [`RegisterError::InvalidBounds`] when any `min > max`.
    pub fn new(angles: [(f64, f64); 3], section: (f64, f64)) -> Result<Self> {
        let bounds = Self { angles, section };
        for (dim, (min, max)) in bounds.as_flat().into_iter().enumerate() {
            if min > max {
                return Err(RegisterError::InvalidBounds { dim, min, max });
            }
        }
        Ok(bounds)
    }

    /// Flat `(min, max)` pairs in optimizer dimension order.
    pub fn as_flat(&self) -> [(f64, f64); PARAM_DIM] {
        [self.angles[0], self.angles[1], self.angles[2], self.section]
    }
}

/// Differential-evolution settings.
///
/// The population itself is supplied as an explicit initial array, so its
/// size is not part of the configuration.
#[derive(Debug, Clone)]
pub struct DeConfig {
    /// Hard cap on generations.
    pub max_generations: usize,
    /// Relative fitness-spread tolerance: the search stops once
    /// `std(energies) <= tolerance * |mean(energies)|`.
    pub tolerance: f64,
    /// Mutation scale range `(min, max)`; a fresh scale is drawn uniformly
    /// from it every generation (dithering). Equal endpoints disable
    /// dithering.
    pub mutation: (f64, f64),
    /// Crossover probability for each non-forced dimension.
    pub recombination: f64,
    /// RNG seed; `None` draws from entropy.
    pub seed: Option<u64>,
    /// Worker threads for population evaluation; `None` uses all cores.
    pub workers: Option<usize>,
}

impl Default for DeConfig {
    fn default() -> Self {
        Self {
            max_generations: 2000,
            tolerance: 1e-5,
            mutation: (0.3, 1.2),
            recombination: 0.9,
            seed: None,
            workers: None,
        }
    }
}

impl DeConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_generations == 0 {
            return Err(RegisterError::InvalidConfig(
                "max_generations must be positive".into(),
            ));
        }
        let (lo, hi) = self.mutation;
        if !(0.0..2.0).contains(&lo) || !(0.0..2.0).contains(&hi) || lo > hi {
            return Err(RegisterError::InvalidConfig(format!(
                "mutation range ({lo}, {hi}) must satisfy 0 <= min <= max < 2"
            )));
        }
        if !(0.0..=1.0).contains(&self.recombination) {
            return Err(RegisterError::InvalidConfig(format!(
                "recombination {} must lie in [0, 1]",
                self.recombination
            )));
        }
        if !(self.tolerance >= 0.0) {
            return Err(RegisterError::InvalidConfig(format!(
                "tolerance {} must be non-negative",
                self.tolerance
            )));
        }
        Ok(())
    }
}

/// Why the search stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ConvergenceStatus {
    /// Population fitness spread fell below the tolerance.
    Converged,
    /// Generation cap reached first.
    MaxGenerations,
}

impl ConvergenceStatus {
    pub fn is_converged(&self) -> bool {
        matches!(self, ConvergenceStatus::Converged)
    }
}

/// Outcome of a differential-evolution run.
#[derive(Debug, Clone, Serialize)]
pub struct SearchResult {
    /// Best candidate found (flat vector form).
    pub best: [f64; PARAM_DIM],
    /// Objective value of `best` (lower is better).
    pub best_energy: f64,
    /// Generations executed.
    pub generations: usize,
    /// Total objective evaluations, including initialization.
    pub evaluations: usize,
    pub status: ConvergenceStatus,
}
