//! Sacrifice detection and deep re-verification.
//!
//! A sacrifice candidate is a tied-for-best move in a non-forced position
//! that gives up material, either outright or by capturing into a losing
//! trade. A candidate that looks sound on the shallow evaluation is
//! re-checked once at a greater depth before it may be called Brilliant
//! or Great.

use chess::{Board, ChessMove, EMPTY};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::classify::Classification;
use crate::config::ClassifierConfig;
use crate::engine::Evaluator;
use crate::eval::NormalizedEval;
use crate::material::attackers;

/// Label a sacrifice earns once verified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SacrificeKind {
    Brilliant,
    Great,
}

impl SacrificeKind {
    pub fn classification(self) -> Classification {
        match self {
            Self::Brilliant => Classification::Brilliant,
            Self::Great => Classification::Great,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Brilliant => "Brilliant",
            Self::Great => "Great",
        }
    }
}

/// Map a (negative) material change onto a sacrifice size.
fn kind_for_loss(delta_cp: i32, config: &ClassifierConfig) -> Option<SacrificeKind> {
    if delta_cp <= -config.big_sacrifice_cp {
        Some(SacrificeKind::Brilliant)
    } else if delta_cp <= -config.pawn_sacrifice_cp {
        Some(SacrificeKind::Great)
    } else {
        None
    }
}

/// Capture onto a square the opponent still attacks afterwards: value of
/// the captured piece minus the value of the capturing piece.
fn trade_delta(board: &Board, mv: ChessMove, config: &ClassifierConfig) -> Option<i32> {
    let victim = board.piece_on(mv.get_dest())?;
    let attacker = board.piece_on(mv.get_source())?;
    let mover = board.side_to_move();
    if board.color_on(mv.get_dest()) != Some(!mover) {
        return None;
    }

    let after = board.make_move_new(mv);
    if attackers(&after, !mover, mv.get_dest()) == EMPTY {
        return None;
    }

    Some(
        config
            .piece_values
            .of(victim)
            .saturating_sub(config.piece_values.of(attacker)),
    )
}

/// Decide whether a move is a sacrifice candidate and of which size.
///
/// `material_delta_cp` is the mover's material after minus before.
pub fn detect_sacrifice(
    board: &Board,
    mv: ChessMove,
    material_delta_cp: i32,
    is_tied_best: bool,
    is_forced: bool,
    config: &ClassifierConfig,
) -> Option<SacrificeKind> {
    if !is_tied_best || is_forced {
        return None;
    }

    kind_for_loss(material_delta_cp, config).or_else(|| {
        trade_delta(board, mv, config).and_then(|delta| kind_for_loss(delta, config))
    })
}

/// Outcome of the deep re-evaluation.
#[derive(Debug, Clone, PartialEq)]
pub enum Verification {
    /// Deep loss stayed below the soundness threshold
    Sound { depth: u32, loss: f64 },
    /// Deep loss reached the threshold
    Refuted { depth: u32, loss: f64 },
    /// The evaluator could not provide a deep result
    Failed(String),
}

impl Verification {
    pub fn is_sound(&self) -> bool {
        matches!(self, Self::Sound { .. })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sound { .. } => "sound",
            Self::Refuted { .. } => "refuted",
            Self::Failed(_) => "failed",
        }
    }
}

/// Re-evaluate the position after a sacrifice at `default + extra` depth.
///
/// Called at most once per candidate and never retried. Evaluator errors
/// come back as [`Verification::Failed`].
pub async fn verify_sacrifice<E: Evaluator>(
    evaluator: &mut E,
    fen_after: &str,
    win_before: f64,
    side_to_move_white: bool,
    config: &ClassifierConfig,
) -> Verification {
    let depth = evaluator
        .default_depth()
        .saturating_add(config.verification_depth_extra);

    let deep = match evaluator.evaluate(fen_after, depth).await {
        Ok(deep) => deep,
        Err(e) => {
            warn!(fen = fen_after, depth, error = %e, "Sacrifice verification failed");
            return Verification::Failed(e.to_string());
        }
    };

    let deep_win = NormalizedEval::resolve(
        &deep,
        evaluator.returns_white_perspective(),
        side_to_move_white,
        config,
    )
    .win;
    let loss = (win_before - deep_win).max(0.0);

    if loss < config.sacrifice_sound_max_win_loss {
        debug!(depth, loss, "Sacrifice verified sound");
        Verification::Sound { depth, loss }
    } else {
        debug!(depth, loss, "Sacrifice refuted");
        Verification::Refuted { depth, loss }
    }
}
