//! Engine score normalization.
//!
//! Engine scores arrive as centipawns or mate distances, possibly from
//! White's point of view. Everything downstream works on mover-relative
//! centipawns and win percentages.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::ClassifierConfig;

/// Piece symbol -> count, e.g. `{"Q": 1, "r": 2}`. Symbols match case-insensitively.
pub type MaterialCounts = BTreeMap<String, u32>;

/// Raw engine output for one position.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineEvaluation {
    /// Centipawn score; ignored when `mate_distance` is present
    pub centipawns: Option<i32>,
    /// Mate in N (positive = the scored side mates)
    pub mate_distance: Option<i32>,
    /// Optional piece counts of the mover in this position
    pub material_counts: Option<MaterialCounts>,
    /// Depth the engine reached
    pub search_depth: Option<u32>,
}

impl EngineEvaluation {
    pub fn cp(cp: i32) -> Self {
        Self {
            centipawns: Some(cp),
            ..Default::default()
        }
    }

    pub fn mate(distance: i32) -> Self {
        Self {
            mate_distance: Some(distance),
            ..Default::default()
        }
    }

    pub fn with_depth(mut self, depth: u32) -> Self {
        self.search_depth = Some(depth);
        self
    }

    pub fn with_material(mut self, counts: MaterialCounts) -> Self {
        self.material_counts = Some(counts);
        self
    }
}

/// Make a centipawn score relative to the side to move.
pub fn normalize_cp(
    raw: Option<i32>,
    engine_returns_white_pov: bool,
    side_to_move_white: bool,
) -> Option<i32> {
    raw.map(|cp| flip_for_side(cp, engine_returns_white_pov, side_to_move_white))
}

fn flip_for_side(score: i32, engine_returns_white_pov: bool, side_to_move_white: bool) -> i32 {
    if engine_returns_white_pov && !side_to_move_white {
        score.saturating_neg()
    } else {
        score
    }
}

/// Large signed centipawn stand-in for a mate, used for ordering only.
///
/// Shorter mates lie further from zero. Mate-in-0 (already checkmated) maps to 0.
pub fn mate_to_cp_equiv(mate: i32, config: &ClassifierConfig) -> i32 {
    if mate == 0 {
        return 0;
    }
    let distance = i32::try_from(mate.unsigned_abs()).unwrap_or(i32::MAX);
    let magnitude = config
        .mate_cp_base
        .saturating_sub(distance.saturating_mul(config.mate_cp_step));
    mate.signum().saturating_mul(magnitude)
}

/// Win probability in [0, 100] from a mover-relative centipawn score.
pub fn win_probability(cp: i32, config: &ClassifierConfig) -> f64 {
    100.0 / (1.0 + (-config.sigmoid_k * cp as f64).exp())
}

/// An evaluation resolved to the mover's point of view.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizedEval {
    /// Mover-relative centipawns, or the mate equivalent when mating
    pub cp: i32,
    /// Win% for the mover. Categorical (win/loss score) when a mate is present
    pub win: f64,
    /// Mover-relative mate distance, if the engine reported one
    pub mate: Option<i32>,
}

impl NormalizedEval {
    /// Resolve a raw evaluation. Missing data is treated as a level position.
    pub fn resolve(
        eval: &EngineEvaluation,
        engine_returns_white_pov: bool,
        side_to_move_white: bool,
        config: &ClassifierConfig,
    ) -> Self {
        if let Some(raw_mate) = eval.mate_distance {
            let mate = flip_for_side(raw_mate, engine_returns_white_pov, side_to_move_white);
            let win = if mate > 0 {
                config.mate_win_score
            } else {
                config.mate_loss_score
            };
            return Self {
                cp: mate_to_cp_equiv(mate, config),
                win,
                mate: Some(mate),
            };
        }

        let cp = normalize_cp(eval.centipawns, engine_returns_white_pov, side_to_move_white)
            .unwrap_or(0);
        Self {
            cp,
            win: win_probability(cp, config),
            mate: None,
        }
    }

    /// True when the mover has a forced mate.
    pub fn is_mating(&self) -> bool {
        self.mate.is_some_and(|m| m > 0)
    }

    /// True when the mover is being mated.
    pub fn is_mated(&self) -> bool {
        self.mate.is_some_and(|m| m < 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_cp() {
        assert_eq!(normalize_cp(Some(35), true, true), Some(35));
        assert_eq!(normalize_cp(Some(35), true, false), Some(-35));
        assert_eq!(normalize_cp(Some(35), false, false), Some(35));
        assert_eq!(normalize_cp(None, true, false), None);
    }

    #[test]
    fn test_win_probability_symmetry() {
        let config = ClassifierConfig::default();
        assert!((win_probability(0, &config) - 50.0).abs() < 1e-9);
        for cp in [1, 37, 150, 480, 1200, 9900] {
            let sum = win_probability(cp, &config) + win_probability(-cp, &config);
            assert!((sum - 100.0).abs() < 1e-9, "cp {cp}: {sum}");
        }
    }

    #[test]
    fn test_win_probability_monotonic() {
        let config = ClassifierConfig::default();
        let mut last = -1.0;
        for cp in (-2000..=2000).step_by(50) {
            let w = win_probability(cp, &config);
            assert!((0.0..=100.0).contains(&w));
            assert!(w > last);
            last = w;
        }
    }

    #[test]
    fn test_shorter_mate_ranks_higher() {
        let config = ClassifierConfig::default();
        assert_eq!(mate_to_cp_equiv(1, &config), 9900);
        assert_eq!(mate_to_cp_equiv(-1, &config), -9900);
        assert!(mate_to_cp_equiv(2, &config) > mate_to_cp_equiv(5, &config));
        assert!(mate_to_cp_equiv(-2, &config) < mate_to_cp_equiv(-5, &config));
        assert_eq!(mate_to_cp_equiv(0, &config), 0);
    }

    #[test]
    fn test_extreme_scores_saturate() {
        let config = ClassifierConfig::default();
        assert_eq!(normalize_cp(Some(i32::MIN), true, false), Some(i32::MAX));
        assert_eq!(
            mate_to_cp_equiv(i32::MIN, &config),
            -mate_to_cp_equiv(i32::MAX, &config)
        );

        let mate = EngineEvaluation::mate(i32::MIN);
        let eval = NormalizedEval::resolve(&mate, true, false, &config);
        assert!(eval.is_mating());
        assert_eq!(eval.win, 100.0);
    }

    #[test]
    fn test_mate_win_is_categorical() {
        let config = ClassifierConfig::default();

        let won = NormalizedEval::resolve(&EngineEvaluation::mate(3), true, true, &config);
        assert_eq!(won.win, 100.0);
        assert_eq!(won.cp, 9700);
        assert!(won.is_mating());

        // White mates in 3 but Black is to move
        let lost = NormalizedEval::resolve(&EngineEvaluation::mate(3), true, false, &config);
        assert_eq!(lost.win, 0.0);
        assert_eq!(lost.cp, -9700);
        assert!(lost.is_mated());
    }

    #[test]
    fn test_missing_score_is_neutral() {
        let config = ClassifierConfig::default();
        let eval = NormalizedEval::resolve(&EngineEvaluation::default(), true, false, &config);
        assert_eq!(eval.cp, 0);
        assert!((eval.win - 50.0).abs() < 1e-9);
        assert_eq!(eval.mate, None);
    }
}
