//! Per-move accuracy (0-100) and confidence tier.

use serde::{Deserialize, Serialize};

use crate::config::ClassifierConfig;

/// How much a win% swing is weighted given the win% before the move.
/// Balanced positions punish small errors hardest; decided ones forgive.
pub fn position_volatility_scale(win_before: f64) -> f64 {
    if (45.0..=55.0).contains(&win_before) {
        1.4
    } else if (35.0..45.0).contains(&win_before) || (win_before > 55.0 && win_before <= 65.0) {
        1.1
    } else if win_before < 20.0 || win_before > 80.0 {
        0.6
    } else {
        1.0
    }
}

/// Trust in the after-move evaluation, from the depth it reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stability {
    High,
    Default,
    Low,
}

impl Stability {
    pub fn from_depth(depth: u32, default_depth: u32) -> Self {
        if depth >= default_depth.saturating_add(2) {
            Self::High
        } else if depth < 10 {
            Self::Low
        } else {
            Self::Default
        }
    }

    pub fn value(self) -> f64 {
        match self {
            Self::High => 0.8,
            Self::Default => 0.5,
            Self::Low => 0.2,
        }
    }

    /// Accuracy points granted: value scaled by 5, truncated.
    pub fn bonus(self) -> i32 {
        (5.0 * self.value()) as i32
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

impl Confidence {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

const BOOK_BONUS: f64 = 2.0;

/// Inputs to the accuracy formula.
#[derive(Debug, Clone, Copy)]
pub struct AccuracyInputs {
    pub win_before: f64,
    /// Signed win% delta, positive = worse for the mover
    pub win_delta: f64,
    pub material_delta_cp: i32,
    pub is_book: bool,
    pub stability: Stability,
}

pub fn accuracy(inputs: &AccuracyInputs, config: &ClassifierConfig) -> u8 {
    let scale = position_volatility_scale(inputs.win_before);
    let base = 100.0 - inputs.win_delta.abs() * scale;

    let book_bonus = if inputs.is_book { BOOK_BONUS } else { 0.0 };
    let stability_bonus = inputs.stability.bonus() as f64;

    // Only the mover's own net loss is penalized, never a gain
    let material_penalty =
        (-(inputs.material_delta_cp as f64) / 100.0).max(0.0) * config.material_penalty_factor;

    let raw = base + book_bonus + stability_bonus - material_penalty;
    if raw.is_nan() {
        return 0;
    }
    raw.round().clamp(0.0, 100.0) as u8
}

pub fn confidence(
    stability: Stability,
    depth: u32,
    default_depth: u32,
    is_tied_best: bool,
) -> Confidence {
    if stability.value() >= 0.8 && depth >= default_depth.saturating_add(2) && is_tied_best {
        Confidence::High
    } else if stability.value() >= 0.5 {
        Confidence::Medium
    } else {
        Confidence::Low
    }
}
