//! Move classification for game review.
//!
//! Takes the engine's evaluation of a position and of every legal move
//! from it, and produces one [`MoveVerdict`] per move: a label (Brilliant,
//! Best, Book, Blunder, ...), a 0-100 accuracy and a confidence tier.

pub use chess;

pub mod accuracy;
pub mod candidates;
pub mod classify;
pub mod config;
pub mod display;
pub mod engine;
pub mod error;
pub mod eval;
pub mod material;
pub mod review;
pub mod sacrifice;

pub use accuracy::Confidence;
pub use candidates::MoveCandidate;
pub use classify::Classification;
pub use config::ClassifierConfig;
pub use engine::{BookLookup, Evaluator, NoBook};
pub use error::{ConfigError, EvaluatorError, ReviewError};
pub use eval::{EngineEvaluation, MaterialCounts};
pub use review::{review_position, MoveVerdict, PositionContext};
