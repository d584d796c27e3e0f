use crate::evaluation::ThresholdMetric;
use crate::grid::GridShape;

/// Structural failures. Any of these aborts a run; there is no meaningful
/// partial result once grid geometry or breakpoint coverage is broken.
#[derive(Debug, thiserror::Error)]
pub enum SensError {
    #[error("grid shape mismatch: expected {expected}, found {found}")]
    ShapeMismatch { expected: GridShape, found: GridShape },

    #[error("variable `{variable}`: value {value} matches {matches} breakpoint intervals (expected exactly 1)")]
    Range {
        variable: String,
        value: f32,
        matches: usize,
    },

    #[error("variable `{variable}`: invalid breakpoint table: {reason}")]
    InvalidBreakpoints { variable: String, reason: String },

    #[error("cannot aggregate an empty list of grids")]
    EmptyStack,

    #[error("model has {tables} breakpoint tables but {layers} layers were supplied")]
    LayerCount { tables: usize, layers: usize },

    #[error("grid data holds {found} cells, expected {expected}")]
    DataLength { expected: usize, found: usize },

    #[error("no {0} threshold is defined for this sample")]
    UndefinedThreshold(ThresholdMetric),
}

pub type Result<T> = std::result::Result<T, SensError>;
