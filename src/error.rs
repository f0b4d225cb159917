use thiserror::Error;

/// Errors reported by the kernel and the trainers.
///
/// Every fallible call leaves its receiver untouched when it returns `Err`.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    #[error("invalid dimension: {0}")]
    InvalidDimension(String),
    #[error("index out of bounds: {0}")]
    IndexOutOfBounds(String),
    #[error("dimension mismatch: {0}")]
    DimensionMismatch(String),
    #[error("matrix is not square: {rows}x{cols}")]
    NotSquare { rows: usize, cols: usize },
    #[error("matrix is singular: pivot {pivot:e} in column {column} is below tolerance")]
    Singular { column: usize, pivot: f64 },
    #[error("insufficient samples: {0}")]
    InsufficientSamples(String),
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
    #[error("allocation failure: {0}")]
    AllocationFailure(String),
    #[error("model is not fitted: {0}")]
    NotFitted(String),
    #[error("serialization error: {0}")]
    Serialization(String),
}

pub type Result<T> = std::result::Result<T, Error>;
