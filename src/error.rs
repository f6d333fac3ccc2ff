use thiserror::Error;

/// Crate-level error returned by the public operations.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Transform error: {0}")]
    Transform(#[from] TransformError),

    /// Invalid transform object or transformer construction arguments.
    #[error("Invalid value: {0}")]
    Value(String),

    #[error("Unexpected use of closed transformer")]
    Closed,
}

#[derive(Error, Debug)]
pub enum TransformError {
    #[error("Inputs must have matching dimensions: {0}")]
    Shape(String),

    #[error("Invalid dimensions after broadcast: {0}")]
    Dimensions(usize),

    #[error("Invalid offset: {0}")]
    InvalidOffset(String),

    #[error("Singular affine transform (determinant is zero)")]
    Singular,

    #[error("Invalid inputs: {0}")]
    InvalidInputs(String),

    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),
}

/// Errors raised by geodetic engine implementations.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Fit failed: {0}")]
    Fit(String),

    #[error("Evaluation failed: {0}")]
    Evaluate(String),

    #[error("Invalid model: {0}")]
    InvalidModel(String),

    #[error("No convergence after {0} iterations")]
    NoConvergence(usize),
}

impl From<EngineError> for Error {
    fn from(err: EngineError) -> Self {
        Error::Transform(TransformError::Engine(err))
    }
}
