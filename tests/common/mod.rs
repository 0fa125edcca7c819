#![allow(dead_code)]

use std::collections::HashSet;

use move_classifier::{BookLookup, EngineEvaluation, Evaluator, EvaluatorError, MoveCandidate};

pub const DEFAULT_DEPTH: u32 = 12;

/// Evaluator with fixed answers: `shallow` at the default depth, `deep`
/// for anything deeper (sacrifice verification).
pub struct StubEngine {
    pub shallow: EngineEvaluation,
    pub deep: Result<EngineEvaluation, String>,
    pub deep_calls: usize,
}

impl StubEngine {
    pub fn new() -> Self {
        Self {
            shallow: EngineEvaluation::cp(0),
            deep: Err("no deep search".to_string()),
            deep_calls: 0,
        }
    }

    pub fn with_deep(deep: EngineEvaluation) -> Self {
        Self {
            deep: Ok(deep),
            ..Self::new()
        }
    }

    pub fn failing() -> Self {
        Self::new()
    }
}

impl Evaluator for StubEngine {
    fn default_depth(&self) -> u32 {
        DEFAULT_DEPTH
    }

    fn returns_white_perspective(&self) -> bool {
        true
    }

    async fn evaluate(
        &mut self,
        _fen: &str,
        depth: u32,
    ) -> Result<EngineEvaluation, EvaluatorError> {
        if depth <= DEFAULT_DEPTH {
            return Ok(self.shallow.clone().with_depth(depth));
        }
        self.deep_calls += 1;
        self.deep
            .clone()
            .map(|eval| eval.with_depth(depth))
            .map_err(EvaluatorError)
    }
}

/// Book that knows a fixed set of UCI moves in any position.
pub struct StubBook(pub HashSet<String>);

impl StubBook {
    pub fn of(moves: &[&str]) -> Self {
        Self(moves.iter().map(|m| m.to_string()).collect())
    }
}

impl BookLookup for StubBook {
    fn in_book(&self, _fen: &str, candidate: &MoveCandidate) -> bool {
        self.0.contains(&candidate.move_uci)
    }
}

/// Candidate evaluated at the default depth.
pub fn candidate(uci: &str, cp: i32) -> MoveCandidate {
    MoveCandidate::new(uci, EngineEvaluation::cp(cp).with_depth(DEFAULT_DEPTH))
}
