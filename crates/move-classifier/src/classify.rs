//! Move classification decision table.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::candidates::BatchBest;
use crate::config::ClassifierConfig;
use crate::eval::NormalizedEval;

/// Final label of a reviewed move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Classification {
    Brilliant,
    Great,
    Best,
    Excellent,
    Good,
    Book,
    Inaccuracy,
    Mistake,
    Blunder,
    Forced,
}

impl Classification {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Brilliant => "Brilliant",
            Self::Great => "Great",
            Self::Best => "Best",
            Self::Excellent => "Excellent",
            Self::Good => "Good",
            Self::Book => "Book",
            Self::Inaccuracy => "Inaccuracy",
            Self::Mistake => "Mistake",
            Self::Blunder => "Blunder",
            Self::Forced => "Forced",
        }
    }

    /// Position of a win%-bucket label from best (0) to worst.
    /// `None` for labels that do not come from the bucket function.
    pub fn bucket_rank(self) -> Option<u8> {
        match self {
            Self::Best => Some(0),
            Self::Excellent => Some(1),
            Self::Good => Some(2),
            Self::Inaccuracy => Some(3),
            Self::Mistake => Some(4),
            Self::Blunder => Some(5),
            _ => None,
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Plain engine rule: bucket a non-negative win% loss. Upper bounds are
/// inclusive.
pub fn classify_by_delta(loss: f64, config: &ClassifierConfig) -> Classification {
    let b = &config.boundaries;
    if loss <= b.best {
        Classification::Best
    } else if loss <= b.excellent {
        Classification::Excellent
    } else if loss <= b.good {
        Classification::Good
    } else if loss <= b.inaccuracy {
        Classification::Inaccuracy
    } else if loss <= b.mistake {
        Classification::Mistake
    } else {
        Classification::Blunder
    }
}

/// Win% within which a move counts as the batch's top move
const TOP_MOVE_WIN_EPS: f64 = 1.0;
/// Required win% gap between the best and the second best move
const ONLY_MOVE_MIN_GAP: f64 = 20.0;
/// The best move must leave the mover better than even
const ONLY_MOVE_MIN_WIN: f64 = 50.0;

/// The move is the only one that keeps a good position: near-lossless,
/// the top move of the batch, and every alternative is far worse.
pub fn is_only_good_move(
    loss: f64,
    win_after: f64,
    best: &BatchBest,
    config: &ClassifierConfig,
) -> bool {
    if loss >= config.boundaries.excellent {
        return false;
    }
    let Some(gap) = best.win_gap() else {
        return false;
    };
    (win_after - best.win).abs() < TOP_MOVE_WIN_EPS
        && gap > ONLY_MOVE_MIN_GAP
        && best.win > ONLY_MOVE_MIN_WIN
}

/// Mate facts about a move, independent of its label.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MateFlags {
    /// Mover had a forced mate before and no longer does
    pub missed: bool,
    /// Opponent has a forced mate after the move
    pub threat: bool,
}

impl MateFlags {
    pub fn detect(before: &NormalizedEval, after: &NormalizedEval) -> Self {
        Self {
            missed: before.is_mating() && !after.is_mating(),
            threat: after.is_mated(),
        }
    }
}

/// Everything the decision table needs about one move.
#[derive(Debug, Clone, Copy)]
pub struct MoveFacts {
    pub win_before: f64,
    pub win_after: f64,
    /// `max(0, win_before - win_after)`
    pub loss: f64,
    pub is_tied_best: bool,
    pub is_forced: bool,
    pub is_book: bool,
    /// Provisional sacrifice label, present only once verified sound
    pub verified_sacrifice: Option<Classification>,
}

/// Why a label was chosen, for comments and metadata.
#[derive(Debug, Clone, PartialEq)]
pub enum Reason {
    Sacrifice,
    OnlyGoodMove,
    OnlyLegalMove,
    Book,
    /// Book move losing more than the dubious threshold; carries the plain
    /// engine label
    DubiousBook(Classification),
    TiedBest,
    PreservesWin,
    WinLoss,
}

/// Win% above which a position counts as already won
const NEAR_CERTAIN_WIN: f64 = 99.0;

/// Apply the classification precedence to one move.
pub fn decide(
    facts: &MoveFacts,
    best: &BatchBest,
    config: &ClassifierConfig,
) -> (Classification, Reason) {
    if let Some(label) = facts.verified_sacrifice {
        if !facts.is_forced {
            return (label, Reason::Sacrifice);
        }
    }

    if !facts.is_forced && is_only_good_move(facts.loss, facts.win_after, best, config) {
        return (Classification::Great, Reason::OnlyGoodMove);
    }

    if facts.is_forced {
        return (Classification::Forced, Reason::OnlyLegalMove);
    }

    if facts.is_book {
        if facts.loss > config.book_dubious_threshold {
            let engine_label = classify_by_delta(facts.loss, config);
            let label = match engine_label {
                Classification::Mistake | Classification::Blunder => engine_label,
                _ => Classification::Book,
            };
            return (label, Reason::DubiousBook(engine_label));
        }
        return (Classification::Book, Reason::Book);
    }

    if facts.is_tied_best {
        return (Classification::Best, Reason::TiedBest);
    }
    if facts.win_before > NEAR_CERTAIN_WIN && facts.win_after > NEAR_CERTAIN_WIN {
        return (Classification::Best, Reason::PreservesWin);
    }

    (classify_by_delta(facts.loss, config), Reason::WinLoss)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn facts(win_before: f64, win_after: f64) -> MoveFacts {
        MoveFacts {
            win_before,
            win_after,
            loss: (win_before - win_after).max(0.0),
            is_tied_best: false,
            is_forced: false,
            is_book: false,
            verified_sacrifice: None,
        }
    }

    fn flat_best() -> BatchBest {
        BatchBest {
            cp: 0,
            win: 60.0,
            second_win: Some(59.5),
        }
    }

    #[test]
    fn test_classify_by_delta_buckets() {
        let config = ClassifierConfig::default();
        assert_eq!(classify_by_delta(0.0, &config), Classification::Best);
        assert_eq!(classify_by_delta(1.0, &config), Classification::Best);
        assert_eq!(classify_by_delta(2.5, &config), Classification::Excellent);
        assert_eq!(classify_by_delta(5.0, &config), Classification::Good);
        assert_eq!(classify_by_delta(9.0, &config), Classification::Inaccuracy);
        assert_eq!(classify_by_delta(9.01, &config), Classification::Mistake);
        assert_eq!(classify_by_delta(20.0, &config), Classification::Mistake);
        assert_eq!(classify_by_delta(20.5, &config), Classification::Blunder);
    }

    #[test]
    fn test_classify_by_delta_monotonic() {
        let config = ClassifierConfig::default();
        let mut last = 0;
        for step in 0..=400 {
            let loss = step as f64 * 0.1;
            let rank = classify_by_delta(loss, &config).bucket_rank().unwrap();
            assert!(rank >= last, "loss {loss} ranked {rank} after {last}");
            last = rank;
        }
    }

    #[test]
    fn test_only_good_move() {
        let config = ClassifierConfig::default();
        let best = BatchBest {
            cp: 300,
            win: 75.0,
            second_win: Some(45.0),
        };
        assert!(is_only_good_move(0.5, 75.0, &best, &config));
        // not the top move
        assert!(!is_only_good_move(0.5, 70.0, &best, &config));
        // lost too much
        assert!(!is_only_good_move(3.0, 75.0, &best, &config));

        let small_gap = BatchBest {
            second_win: Some(60.0),
            ..best
        };
        assert!(!is_only_good_move(0.5, 75.0, &small_gap, &config));

        let losing = BatchBest {
            cp: -100,
            win: 45.0,
            second_win: Some(10.0),
        };
        assert!(!is_only_good_move(0.5, 45.0, &losing, &config));
    }

    #[test]
    fn test_forced_wins_over_book() {
        let config = ClassifierConfig::default();
        let mut f = facts(50.0, 50.0);
        f.is_forced = true;
        f.is_book = true;
        let best = BatchBest {
            cp: 0,
            win: 50.0,
            second_win: None,
        };
        assert_eq!(decide(&f, &best, &config).0, Classification::Forced);
    }

    #[test]
    fn test_book_move_kept_when_healthy() {
        let config = ClassifierConfig::default();
        let mut f = facts(55.0, 54.0);
        f.is_book = true;
        assert_eq!(
            decide(&f, &flat_best(), &config),
            (Classification::Book, Reason::Book)
        );
    }

    #[test]
    fn test_dubious_book_move_downgraded() {
        let config = ClassifierConfig::default();
        let mut f = facts(55.0, 30.0);
        f.is_book = true;
        f.is_tied_best = true;
        assert_eq!(
            decide(&f, &flat_best(), &config),
            (
                Classification::Blunder,
                Reason::DubiousBook(Classification::Blunder)
            )
        );

        // Dubious but only a Good by the engine rule stays Book
        let mut f = facts(55.0, 51.0);
        f.is_book = true;
        assert_eq!(
            decide(&f, &flat_best(), &config),
            (Classification::Book, Reason::DubiousBook(Classification::Good))
        );
    }

    #[test]
    fn test_tied_best_and_preserved_win() {
        let config = ClassifierConfig::default();
        let mut f = facts(60.0, 52.0);
        f.is_tied_best = true;
        assert_eq!(decide(&f, &flat_best(), &config).0, Classification::Best);

        let f = facts(99.9, 99.2);
        assert_eq!(
            decide(&f, &flat_best(), &config),
            (Classification::Best, Reason::PreservesWin)
        );
    }

    #[test]
    fn test_verified_sacrifice_first() {
        let config = ClassifierConfig::default();
        let mut f = facts(60.0, 59.0);
        f.is_book = true;
        f.verified_sacrifice = Some(Classification::Brilliant);
        assert_eq!(
            decide(&f, &flat_best(), &config),
            (Classification::Brilliant, Reason::Sacrifice)
        );
    }

    #[test]
    fn test_falls_back_to_win_loss() {
        let config = ClassifierConfig::default();
        let f = facts(60.0, 53.0);
        assert_eq!(
            decide(&f, &flat_best(), &config),
            (Classification::Inaccuracy, Reason::WinLoss)
        );
    }

    #[test]
    fn test_mate_flags() {
        let mating = NormalizedEval {
            cp: 9700,
            win: 100.0,
            mate: Some(3),
        };
        let level = NormalizedEval {
            cp: 0,
            win: 50.0,
            mate: None,
        };
        let mated = NormalizedEval {
            cp: -9800,
            win: 0.0,
            mate: Some(-2),
        };

        assert_eq!(
            MateFlags::detect(&mating, &level),
            MateFlags {
                missed: true,
                threat: false
            }
        );
        assert_eq!(MateFlags::detect(&mating, &mating), MateFlags::default());
        assert_eq!(
            MateFlags::detect(&level, &mated),
            MateFlags {
                missed: false,
                threat: true
            }
        );
    }
}
