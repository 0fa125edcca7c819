//! First pass over a position's candidate moves: normalize every
//! evaluation and find the best of the batch.

use serde::{Deserialize, Serialize};

use crate::config::ClassifierConfig;
use crate::eval::{EngineEvaluation, NormalizedEval};

/// One legal move offered for review, with the engine's view of the
/// position it leads to.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MoveCandidate {
    pub move_uci: String,
    pub move_san: Option<String>,
    /// Evaluation of the position after the move
    pub eval_after: EngineEvaluation,
    pub is_capture: bool,
    pub is_promotion: bool,
    pub is_castle: bool,
    pub is_check: bool,
    /// Engine's own ordering, 0 = engine's best. Descriptive only
    pub engine_rank: u32,
}

impl MoveCandidate {
    pub fn new(move_uci: &str, eval_after: EngineEvaluation) -> Self {
        Self {
            move_uci: move_uci.to_string(),
            eval_after,
            ..Default::default()
        }
    }
}

/// A candidate's evaluation resolved against the batch.
#[derive(Debug, Clone, Copy)]
pub struct ScoredCandidate {
    pub after: NormalizedEval,
    pub is_tied_best: bool,
}

/// Best values seen across a batch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BatchBest {
    pub cp: i32,
    pub win: f64,
    /// Second highest win% in the batch (equal to `win` on a tie, `None`
    /// for a single candidate)
    pub second_win: Option<f64>,
}

impl BatchBest {
    /// Gap between the best and second best win%, if there is a second move.
    pub fn win_gap(&self) -> Option<f64> {
        self.second_win.map(|second| self.win - second)
    }
}

/// Normalize all candidates and flag those tied for best.
///
/// A candidate ties if its centipawns are within `tie_cp_eps` of the best
/// **or** its win% is within `tie_win_eps` of the best.
pub fn aggregate(
    candidates: &[MoveCandidate],
    engine_returns_white_pov: bool,
    side_to_move_white: bool,
    config: &ClassifierConfig,
) -> (Vec<ScoredCandidate>, BatchBest) {
    let normalized: Vec<NormalizedEval> = candidates
        .iter()
        .map(|c| {
            NormalizedEval::resolve(
                &c.eval_after,
                engine_returns_white_pov,
                side_to_move_white,
                config,
            )
        })
        .collect();

    let best_cp = normalized.iter().map(|n| n.cp).max().unwrap_or(0);

    let mut wins: Vec<f64> = normalized.iter().map(|n| n.win).collect();
    wins.sort_by(|a, b| b.total_cmp(a));
    let best = BatchBest {
        cp: best_cp,
        win: wins.first().copied().unwrap_or(0.0),
        second_win: wins.get(1).copied(),
    };

    let scored = normalized
        .into_iter()
        .map(|after| {
            let is_tied_best = after.cp.abs_diff(best.cp) <= config.tie_cp_eps.unsigned_abs()
                || (after.win - best.win).abs() <= config.tie_win_eps;
            ScoredCandidate {
                after,
                is_tied_best,
            }
        })
        .collect();

    (scored, best)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(uci: &str, eval: EngineEvaluation) -> MoveCandidate {
        MoveCandidate::new(uci, eval)
    }

    #[test]
    fn test_ties_by_centipawns() {
        let config = ClassifierConfig::default();
        let batch = vec![
            candidate("e2e4", EngineEvaluation::cp(40)),
            candidate("d2d4", EngineEvaluation::cp(32)),
            candidate("a2a3", EngineEvaluation::cp(-20)),
        ];
        let (scored, best) = aggregate(&batch, true, true, &config);
        assert_eq!(best.cp, 40);
        assert!(scored[0].is_tied_best);
        assert!(scored[1].is_tied_best);
        assert!(!scored[2].is_tied_best);
    }

    #[test]
    fn test_ties_by_win_percent_when_cp_differs() {
        let config = ClassifierConfig::default();
        // Deep in winning territory 150cp apart is well under 0.7 win%
        let batch = vec![
            candidate("e2e4", EngineEvaluation::cp(2000)),
            candidate("d2d4", EngineEvaluation::cp(1850)),
        ];
        let (scored, _) = aggregate(&batch, true, true, &config);
        assert!(scored[1].is_tied_best);
    }

    #[test]
    fn test_black_perspective_flips_best() {
        let config = ClassifierConfig::default();
        let batch = vec![
            candidate("e7e5", EngineEvaluation::cp(-50)),
            candidate("f7f6", EngineEvaluation::cp(120)),
        ];
        let (scored, best) = aggregate(&batch, true, false, &config);
        assert_eq!(best.cp, 50);
        assert!(scored[0].is_tied_best);
        assert!(!scored[1].is_tied_best);
    }

    #[test]
    fn test_mate_outranks_everything() {
        let config = ClassifierConfig::default();
        let batch = vec![
            candidate("d1h5", EngineEvaluation::mate(2)),
            candidate("e2e4", EngineEvaluation::cp(900)),
        ];
        let (scored, best) = aggregate(&batch, true, true, &config);
        assert_eq!(best.win, 100.0);
        assert_eq!(best.cp, 9800);
        assert!(scored[0].is_tied_best);
        assert!(!scored[1].is_tied_best);
        assert!(best.win_gap().unwrap() > 0.0);
    }

    #[test]
    fn test_extreme_centipawns_do_not_overflow() {
        let config = ClassifierConfig::default();
        let batch = vec![
            candidate("e2e4", EngineEvaluation::cp(2_000_000_000)),
            candidate("d2d4", EngineEvaluation::cp(-2_000_000_000)),
        ];
        let (scored, best) = aggregate(&batch, true, true, &config);
        assert_eq!(best.cp, 2_000_000_000);
        assert!(scored[0].is_tied_best);
        assert!(!scored[1].is_tied_best);
    }

    #[test]
    fn test_single_candidate_has_no_gap() {
        let config = ClassifierConfig::default();
        let batch = vec![candidate("e1f1", EngineEvaluation::cp(-300))];
        let (scored, best) = aggregate(&batch, true, true, &config);
        assert!(scored[0].is_tied_best);
        assert_eq!(best.win_gap(), None);
    }
}
