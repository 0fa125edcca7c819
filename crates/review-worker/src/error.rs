//! Worker error types

use move_classifier::{ConfigError, ReviewError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum WorkerError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Classifier config error: {0}")]
    ClassifierConfig(#[from] ConfigError),

    #[error("Stockfish error: {0}")]
    Stockfish(String),

    #[error("Opening book error: {0}")]
    Book(String),

    #[error("Invalid game: {0}")]
    InvalidGame(String),

    #[error("Review error: {0}")]
    Review(#[from] ReviewError),
}
