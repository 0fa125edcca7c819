//! Classifier configuration.
//!
//! One immutable [`ClassifierConfig`] is built by the caller, validated once
//! and passed by reference into every review. Any subset of fields may be
//! overridden from JSON; missing fields keep their defaults.

use chess::Piece;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Centipawn value of each piece type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PieceValues {
    pub pawn: i32,
    pub knight: i32,
    pub bishop: i32,
    pub rook: i32,
    pub queen: i32,
    pub king: i32,
}

impl Default for PieceValues {
    fn default() -> Self {
        Self {
            pawn: 100,
            knight: 320,
            bishop: 330,
            rook: 500,
            queen: 900,
            king: 0,
        }
    }
}

impl PieceValues {
    pub fn of(&self, piece: Piece) -> i32 {
        match piece {
            Piece::Pawn => self.pawn,
            Piece::Knight => self.knight,
            Piece::Bishop => self.bishop,
            Piece::Rook => self.rook,
            Piece::Queen => self.queen,
            Piece::King => self.king,
        }
    }
}

/// Upper (inclusive) win% loss bound of each bucket. Anything above
/// `mistake` is a blunder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LossBoundaries {
    pub best: f64,
    pub excellent: f64,
    pub good: f64,
    pub inaccuracy: f64,
    pub mistake: f64,
}

impl Default for LossBoundaries {
    fn default() -> Self {
        Self {
            best: 1.0,
            excellent: 3.0,
            good: 5.0,
            inaccuracy: 9.0,
            mistake: 20.0,
        }
    }
}

impl LossBoundaries {
    fn as_array(&self) -> [f64; 5] {
        [
            self.best,
            self.excellent,
            self.good,
            self.inaccuracy,
            self.mistake,
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Steepness `k` of the win probability logistic curve
    pub sigmoid_k: f64,

    /// Win% assigned to a position where the mover has a forced mate
    pub mate_win_score: f64,
    /// Win% assigned to a position where the mover is getting mated
    pub mate_loss_score: f64,
    /// Centipawn equivalent of mate-in-0, shrinking by `mate_cp_step` per move
    pub mate_cp_base: i32,
    pub mate_cp_step: i32,

    pub piece_values: PieceValues,

    /// Material given up (cp) for a provisional Brilliant
    pub big_sacrifice_cp: i32,
    /// Material given up (cp) for a provisional Great
    pub pawn_sacrifice_cp: i32,
    /// A sacrifice is sound only while its win% loss stays below this
    pub sacrifice_sound_max_win_loss: f64,

    pub tie_cp_eps: i32,
    pub tie_win_eps: f64,

    pub boundaries: LossBoundaries,

    /// Book moves losing more than this win% are re-graded by the engine rule
    pub book_dubious_threshold: f64,

    /// Accuracy points removed per pawn of material the mover gives up
    pub material_penalty_factor: f64,

    /// Extra plies added to the engine's default depth for sacrifice checks
    pub verification_depth_extra: u32,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            sigmoid_k: 0.00368,
            mate_win_score: 100.0,
            mate_loss_score: 0.0,
            mate_cp_base: 10000,
            mate_cp_step: 100,
            piece_values: PieceValues::default(),
            big_sacrifice_cp: 210,
            pawn_sacrifice_cp: 90,
            sacrifice_sound_max_win_loss: 5.0,
            tie_cp_eps: 10,
            tie_win_eps: 0.7,
            boundaries: LossBoundaries::default(),
            book_dubious_threshold: 2.0,
            material_penalty_factor: 0.8,
            verification_depth_extra: 4,
        }
    }
}

impl ClassifierConfig {
    /// Parse a partial JSON override on top of the defaults and validate it.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the invariants classification relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.sigmoid_k.is_finite() || self.sigmoid_k <= 0.0 {
            return Err(ConfigError::NonPositiveSigmoid(self.sigmoid_k));
        }

        let bounds = self.boundaries.as_array();
        if bounds.iter().any(|b| !b.is_finite() || *b < 0.0) {
            return Err(ConfigError::Boundaries(format!("{bounds:?}")));
        }
        if bounds.windows(2).any(|w| w[0] >= w[1]) {
            return Err(ConfigError::Boundaries(format!("{bounds:?}")));
        }

        if self.pawn_sacrifice_cp <= 0 || self.big_sacrifice_cp < self.pawn_sacrifice_cp {
            return Err(ConfigError::Sacrifice(format!(
                "pawn {} / big {}",
                self.pawn_sacrifice_cp, self.big_sacrifice_cp
            )));
        }
        let sound_max = self.sacrifice_sound_max_win_loss;
        if sound_max.is_nan() || sound_max <= 0.0 {
            return Err(ConfigError::Sacrifice(format!(
                "sound max win loss {sound_max}"
            )));
        }

        if self.tie_cp_eps < 0 {
            return Err(ConfigError::NegativeTolerance("tie_cp_eps"));
        }
        let tolerances = [
            ("tie_win_eps", self.tie_win_eps),
            ("book_dubious_threshold", self.book_dubious_threshold),
            ("material_penalty_factor", self.material_penalty_factor),
        ];
        if let Some((name, _)) = tolerances.iter().find(|(_, v)| v.is_nan() || *v < 0.0) {
            return Err(ConfigError::NegativeTolerance(name));
        }

        if self.mate_cp_step < 0 || self.mate_cp_base <= 0 {
            return Err(ConfigError::MateEncoding(format!(
                "base {} / step {}",
                self.mate_cp_base, self.mate_cp_step
            )));
        }
        if self.mate_win_score <= self.mate_loss_score {
            return Err(ConfigError::MateEncoding(format!(
                "win score {} must exceed loss score {}",
                self.mate_win_score, self.mate_loss_score
            )));
        }

        Ok(())
    }
}
