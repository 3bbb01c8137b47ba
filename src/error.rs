use thiserror::Error;

/// Errors raised while configuring, fitting or applying a robust PLS model.
#[derive(Error, Debug)]
pub enum PrmError {
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    #[error("Numerical degeneracy: {0}")]
    NumericalDegeneracy(String),

    #[error("Dimension mismatch: {0}")]
    DimensionMismatch(String),

    #[error("Model has not been fitted yet")]
    NotFitted,

    /// Failure reported by the latent-variable regression engine, passed through as-is.
    #[error(transparent)]
    Engine(#[from] anyhow::Error),
}
