//! Presentation lookups for verdicts.

use serde::{Deserialize, Serialize};

use crate::classify::Classification;
use crate::review::MoveVerdict;

pub fn icon(label: Classification) -> &'static str {
    match label {
        Classification::Brilliant | Classification::Great => "exclamation",
        Classification::Blunder => "skull",
        Classification::Mistake => "question",
        Classification::Inaccuracy => "question-mark-outline",
        Classification::Book => "book",
        _ => "check",
    }
}

pub fn color(label: Classification) -> &'static str {
    match label {
        Classification::Brilliant => "gold",
        Classification::Great => "orange",
        Classification::Blunder => "red",
        Classification::Mistake => "orange-red",
        Classification::Book => "blue",
        Classification::Best => "green",
        Classification::Excellent => "light-green",
        _ => "grey",
    }
}

/// One-line explanation of a verdict for the reviewer UI.
pub fn coach_reason(verdict: &MoveVerdict) -> String {
    let reason = match verdict.classification {
        Classification::Brilliant => "You sacrificed material to win the game!",
        Classification::Great => "A great finding!",
        Classification::Book => {
            let dubious = verdict
                .analysis_meta
                .get("book_health")
                .and_then(|v| v.as_str())
                == Some("dubious");
            if dubious {
                let engine = verdict
                    .analysis_meta
                    .get("engine_classification")
                    .and_then(|v| v.as_str())
                    .unwrap_or("questioned");
                return format!("Book move, but looks dubious ({engine} by engine).");
            }
            "Standard book move."
        }
        Classification::Forced => "The only legal move.",
        Classification::Best => "Excellent! Finding the optimal path.",
        Classification::Excellent => "A very strong move.",
        Classification::Good => "A solid move.",
        Classification::Inaccuracy => "A slightly passive move.",
        Classification::Mistake => "There was a much better move available.",
        Classification::Blunder if verdict.is_mate_missed => "You missed a forced mate sequence.",
        Classification::Blunder if verdict.is_mate_threat => "This move allows a forced mate.",
        Classification::Blunder => "This move gives up a significant advantage.",
    };
    reason.to_string()
}

/// Compact serializable view of a verdict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerdictSummary {
    pub move_uci: String,
    pub move_san: Option<String>,
    pub classification: Classification,
    pub accuracy: u8,
    pub win_delta: f64,
    pub cp_after: i32,
    pub is_book: bool,
    pub is_forced: bool,
    pub is_check: bool,
    pub comments: Option<String>,
    pub icon: String,
    pub color: String,
}

impl From<&MoveVerdict> for VerdictSummary {
    fn from(v: &MoveVerdict) -> Self {
        Self {
            move_uci: v.move_uci.clone(),
            move_san: v.move_san.clone(),
            classification: v.classification,
            accuracy: v.accuracy,
            win_delta: (v.win_delta * 100.0).round() / 100.0,
            cp_after: v.cp_after,
            is_book: v.is_book_move,
            is_forced: v.is_forced,
            is_check: v.is_check,
            comments: v.comments.clone(),
            icon: icon(v.classification).to_string(),
            color: color(v.classification).to_string(),
        }
    }
}
