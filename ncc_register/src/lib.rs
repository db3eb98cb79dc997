//! Registration of a 2D section image against a 3D volume.
//!
//! Finds the oblique cross-section of a volumetric scan that best matches a
//! given 2D template, by searching over three rotation angles and a section
//! index with a population-based global optimizer scored by normalized
//! cross-correlation.
//!
//! # Architecture
//!
//! The pipeline splits into independent stages:
//! - Volume transform: sequential in-plane rotations (nearest-neighbor,
//!   shape-preserving) and section extraction
//! - Correlation: FFT-based normalized cross-correlation surface + peak
//! - Objective: one candidate vector in, negated peak correlation out
//! - Search: differential evolution with deferred replacement and parallel
//!   population evaluation
//! - Materialization: one deterministic rerun at the winning parameters
//!
//! # Usage
//!
//! ```ignore
//! use ncc_register::{register, DeConfig, SearchBounds, SliceAxis, init_population};
//!
//! let volume = load_volume();          // ndarray::Array3<u8>
//! let template = load_template();      // ndarray::Array2<f64>
//!
//! let bounds = SearchBounds::new([(-7.0, 7.0); 3], (120.0, 180.0))?;
//! let mut rng = rand::thread_rng();
//! let init = init_population(&bounds, &[0.0, 0.0, 0.0, 150.0], 20, &mut rng);
//!
//! let run = register(&volume, &template, SliceAxis::Axis0, &bounds, &init,
//!                    &DeConfig::default())?;
//! println!("section {} at correlation {:.3}", run.params.section, run.correlation);
//! ```

pub mod correlation;
pub mod error;
pub mod optimization;
pub mod registration;
pub mod test_utils;
pub mod timing;
pub mod volume;

pub use correlation::{normalized_cross_correlation, CorrelationMode, NccSurface};
pub use error::{RegisterError, Result};
pub use optimization::{
    init_population, ConvergenceStatus, DeConfig, DifferentialEvolution, RegistrationProblem,
    SearchBounds, SearchResult, SectionParams, PARAM_DIM,
};
pub use registration::{materialize, register, Materialized, Registration};
pub use timing::Stopwatch;
pub use volume::{
    rotate_about_axis, rotate_volume, slice_volume, RotationAngles, SliceAxis,
};
