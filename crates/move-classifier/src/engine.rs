//! Collaborator contracts: the evaluation engine and the opening book.

use std::future::Future;

use serde_json::{Map, Value};

use crate::candidates::MoveCandidate;
use crate::error::EvaluatorError;
use crate::eval::EngineEvaluation;

/// An engine that can score a position.
///
/// Only sacrifice verification calls `evaluate`; its errors are caught
/// and never abort a review.
pub trait Evaluator {
    /// Depth used for the regular per-move evaluations
    fn default_depth(&self) -> u32;

    /// Whether scores are given from White's point of view rather than the
    /// side to move's
    fn returns_white_perspective(&self) -> bool;

    fn evaluate(
        &mut self,
        fen: &str,
        depth: u32,
    ) -> impl Future<Output = Result<EngineEvaluation, EvaluatorError>>;
}

/// Opening book queries. A miss is "not book", never an error.
pub trait BookLookup {
    fn in_book(&self, fen: &str, candidate: &MoveCandidate) -> bool;

    fn book_meta(&self, fen: &str, candidate: &MoveCandidate) -> Map<String, Value> {
        let _ = (fen, candidate);
        Map::new()
    }
}

/// A book that knows no moves.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoBook;

impl BookLookup for NoBook {
    fn in_book(&self, _fen: &str, _candidate: &MoveCandidate) -> bool {
        false
    }
}
