//! Error types for the registration library.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RegisterError {
    #[error("section axis must be 0, 1 or 2, got {0}")]
    InvalidAxis(usize),

    #[error("section index {index} outside [0, {extent}) along axis {axis}")]
    SectionOutOfRange {
        index: i64,
        axis: usize,
        extent: usize,
    },

    #[error(
        "template ({template_rows}x{template_cols}) exceeds search image \
         ({image_rows}x{image_cols}) in valid mode"
    )]
    TemplateTooLarge {
        template_rows: usize,
        template_cols: usize,
        image_rows: usize,
        image_cols: usize,
    },

    #[error("search bounds dimension {dim}: min {min} > max {max}")]
    InvalidBounds { dim: usize, min: f64, max: f64 },

    #[error("initial population has {got} columns, expected {expected}")]
    PopulationShape { got: usize, expected: usize },

    #[error("initial population needs at least {min} members, got {got}")]
    PopulationTooSmall { got: usize, min: usize },

    #[error("invalid optimizer configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, RegisterError>;
