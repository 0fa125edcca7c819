//! Classifier error types

use thiserror::Error;

/// Invalid classifier configuration. Raised when a config is built or
/// loaded, never mid-batch.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("sigmoid steepness must be positive, got {0}")]
    NonPositiveSigmoid(f64),

    #[error("win% loss boundaries must be strictly increasing: {0}")]
    Boundaries(String),

    #[error("sacrifice thresholds invalid: {0}")]
    Sacrifice(String),

    #[error("tolerance must not be negative: {0}")]
    NegativeTolerance(&'static str),

    #[error("mate encoding invalid: {0}")]
    MateEncoding(String),

    #[error("config JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Failure reported by an evaluation collaborator.
///
/// The core only ever catches this during sacrifice verification; it is
/// never surfaced from a review.
#[derive(Error, Debug)]
#[error("evaluator error: {0}")]
pub struct EvaluatorError(pub String);

/// Caller contract violations detected before any move is classified.
#[derive(Error, Debug)]
pub enum ReviewError {
    #[error("Invalid FEN: {0}")]
    InvalidFen(String),

    #[error("Position has no candidate moves")]
    NoCandidates,

    #[error("Candidate move {0} is not legal in the position")]
    IllegalMove(String),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}
