//! Global search over rotation angles and section index.

mod objective;
mod solver;
mod types;

pub use objective::RegistrationProblem;
pub use solver::{init_population, DifferentialEvolution};
pub use types::{
    round_section, ConvergenceStatus, DeConfig, SearchBounds, SearchResult, SectionParams,
    MIN_POPULATION, PARAM_DIM,
};
