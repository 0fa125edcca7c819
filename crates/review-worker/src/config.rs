//! Worker configuration from environment variables

use std::env;
use std::fs;

use move_classifier::ClassifierConfig;
use tracing::info;

use crate::error::WorkerError;

#[derive(Clone, Debug)]
pub struct WorkerConfig {
    /// Path to Stockfish binary
    pub stockfish_path: String,

    /// Search depth for every candidate evaluation
    pub engine_depth: u32,

    /// Stockfish hash table size in MB
    pub engine_hash_mb: u32,

    /// Path to the bincode opening book
    pub book_path: String,

    /// Moves after this full-move number are never book
    pub book_max_fullmove: u32,

    /// Optional JSON file overriding classifier defaults
    pub classifier_config_path: Option<String>,
}

impl WorkerConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, WorkerError> {
        let stockfish_path = env::var("STOCKFISH_PATH")
            .unwrap_or_else(|_| "/usr/local/bin/stockfish".to_string());

        let engine_depth = parse_var("ENGINE_DEPTH", 12)?;
        let engine_hash_mb = parse_var("ENGINE_HASH_MB", 256)?;
        let book_max_fullmove = parse_var("BOOK_MAX_FULLMOVE", 5)?;

        let book_path =
            env::var("BOOK_PATH").unwrap_or_else(|_| crate::book_cache::BOOK_FILE_PATH.to_string());

        let classifier_config_path = env::var("CLASSIFIER_CONFIG").ok();

        if engine_depth == 0 {
            return Err(WorkerError::Config("ENGINE_DEPTH must be at least 1".into()));
        }

        Ok(Self {
            stockfish_path,
            engine_depth,
            engine_hash_mb,
            book_path,
            book_max_fullmove,
            classifier_config_path,
        })
    }

    /// Classifier config: defaults, or the JSON override file if one is set.
    pub fn classifier_config(&self) -> Result<ClassifierConfig, WorkerError> {
        let Some(path) = &self.classifier_config_path else {
            return Ok(ClassifierConfig::default());
        };

        info!(path = %path, "Loading classifier config");
        let json = fs::read_to_string(path)
            .map_err(|e| WorkerError::Config(format!("Failed to read {path}: {e}")))?;
        Ok(ClassifierConfig::from_json_str(&json)?)
    }
}

/// Read a numeric variable; unset means `default`, unparseable is an error.
fn parse_var(name: &str, default: u32) -> Result<u32, WorkerError> {
    match env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|_| WorkerError::Config(format!("{name} is not a number: {value}"))),
        Err(_) => Ok(default),
    }
}
