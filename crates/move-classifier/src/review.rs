//! Per-position review: turn one batch of candidate evaluations into one
//! verdict per candidate.
//!
//! Two explicit passes. The first normalizes every candidate and finds the
//! best of the batch; the second classifies and scores each candidate
//! against it. Output order matches input order.

use std::str::FromStr;

use chess::{Board, ChessMove, Color};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::debug;

use crate::accuracy::{self, AccuracyInputs, Confidence, Stability};
use crate::candidates::{aggregate, BatchBest, MoveCandidate, ScoredCandidate};
use crate::classify::{decide, Classification, MateFlags, MoveFacts, Reason};
use crate::config::ClassifierConfig;
use crate::engine::{BookLookup, Evaluator};
use crate::error::ReviewError;
use crate::eval::{EngineEvaluation, MaterialCounts, NormalizedEval};
use crate::material::{counts_on_board, material_value_cp, non_pawn_piece_count, parse_uci_move};
use crate::sacrifice::{detect_sacrifice, verify_sacrifice, SacrificeKind, Verification};

/// Everything known about one position before a move is played.
#[derive(Debug, Clone)]
pub struct PositionContext<'a> {
    /// FEN before the move
    pub fen: String,
    pub side_to_move: Color,
    pub eval_before: EngineEvaluation,
    /// Every legal move considered for this ply
    pub candidates: Vec<MoveCandidate>,
    pub config: &'a ClassifierConfig,
}

/// The review of one candidate move.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoveVerdict {
    pub move_uci: String,
    pub move_san: Option<String>,
    pub engine_rank: u32,

    pub cp_before: i32,
    pub cp_after: i32,
    pub win_before: f64,
    pub win_after: f64,
    /// Positive = the move made things worse for the mover
    pub win_delta: f64,

    pub material_before_cp: i32,
    pub material_after_cp: i32,
    pub material_delta_cp: i32,
    pub non_pawn_piece_loss: i32,

    pub is_capture: bool,
    pub is_promotion: bool,
    pub is_castle: bool,
    pub is_check: bool,
    pub is_forced: bool,
    pub is_book_move: bool,
    /// Opponent has a forced mate after this move
    pub is_mate_threat: bool,
    /// Mover had a forced mate and this move let it go
    pub is_mate_missed: bool,

    pub classification: Classification,
    pub accuracy: u8,
    pub confidence: Confidence,
    pub comments: Option<String>,
    pub analysis_meta: Map<String, Value>,
}

/// A candidate whose move has been checked against the board.
struct PreparedMove<'c> {
    candidate: &'c MoveCandidate,
    chess_move: ChessMove,
    board_after: Board,
}

/// Material of the mover, preferring supplied counts over the board.
fn mover_counts(
    supplied: Option<&MaterialCounts>,
    board: &Board,
    mover: Color,
) -> MaterialCounts {
    match supplied {
        Some(counts) if !counts.is_empty() => counts.clone(),
        _ => counts_on_board(board, mover),
    }
}

/// Classify every candidate of a position.
///
/// Fails only on caller contract violations (bad FEN, no candidates,
/// illegal candidate move, invalid config). Per-move problems, including a
/// failed sacrifice verification, degrade the affected verdict instead.
pub async fn review_position<E, B>(
    ctx: &PositionContext<'_>,
    evaluator: &mut E,
    book: &B,
) -> Result<Vec<MoveVerdict>, ReviewError>
where
    E: Evaluator,
    B: BookLookup,
{
    let config = ctx.config;
    config.validate()?;

    if ctx.candidates.is_empty() {
        return Err(ReviewError::NoCandidates);
    }

    let board = Board::from_str(&ctx.fen).map_err(|e| ReviewError::InvalidFen(e.to_string()))?;
    let mover = ctx.side_to_move;
    let side_white = mover == Color::White;
    let white_pov = evaluator.returns_white_perspective();
    let default_depth = evaluator.default_depth();

    let prepared = ctx
        .candidates
        .iter()
        .map(|candidate| {
            let chess_move = parse_uci_move(&candidate.move_uci)
                .filter(|m| board.legal(*m))
                .ok_or_else(|| ReviewError::IllegalMove(candidate.move_uci.clone()))?;
            Ok(PreparedMove {
                candidate,
                chess_move,
                board_after: board.make_move_new(chess_move),
            })
        })
        .collect::<Result<Vec<_>, ReviewError>>()?;

    let side = if side_white { "white" } else { "black" };
    debug!(
        fen = %ctx.fen,
        side,
        candidates = prepared.len(),
        "Reviewing position"
    );

    let before = NormalizedEval::resolve(&ctx.eval_before, white_pov, side_white, config);
    let counts_before = mover_counts(ctx.eval_before.material_counts.as_ref(), &board, mover);
    let material_before_cp = material_value_cp(&counts_before, &config.piece_values);

    // First pass: best of the batch
    let (scored, best) = aggregate(&ctx.candidates, white_pov, side_white, config);
    let is_forced = ctx.candidates.len() == 1;

    // Second pass: one verdict per candidate
    let step = MoveStep {
        ctx,
        board: &board,
        before,
        material_before_cp,
        counts_before: &counts_before,
        best,
        is_forced,
        default_depth,
    };
    let mut verdicts = Vec::with_capacity(prepared.len());
    for (prepared, scored) in prepared.iter().zip(scored) {
        verdicts.push(step.verdict(prepared, scored, evaluator, book).await);
    }

    Ok(verdicts)
}

/// Position-wide facts shared by every candidate's verdict.
struct MoveStep<'s, 'c> {
    ctx: &'s PositionContext<'c>,
    board: &'s Board,
    before: NormalizedEval,
    material_before_cp: i32,
    counts_before: &'s MaterialCounts,
    best: BatchBest,
    is_forced: bool,
    default_depth: u32,
}

impl MoveStep<'_, '_> {
    async fn verdict<E: Evaluator, B: BookLookup>(
        &self,
        prepared: &PreparedMove<'_>,
        scored: ScoredCandidate,
        evaluator: &mut E,
        book: &B,
    ) -> MoveVerdict {
        let config = self.ctx.config;
        let candidate = prepared.candidate;
        let mover = self.ctx.side_to_move;
        let after = scored.after;

        let win_before = self.before.win;
        let win_after = after.win;
        let win_delta = win_before - win_after;
        let loss = win_delta.max(0.0);

        // Material from the mover's side only
        let counts_after = mover_counts(
            candidate.eval_after.material_counts.as_ref(),
            &prepared.board_after,
            mover,
        );
        let material_after_cp = material_value_cp(&counts_after, &config.piece_values);
        let material_delta_cp = material_after_cp.saturating_sub(self.material_before_cp);
        let non_pawn_piece_loss = non_pawn_piece_count(self.counts_before)
            .saturating_sub(non_pawn_piece_count(&counts_after));

        let is_book = book.in_book(&self.ctx.fen, candidate);
        let book_meta = book.book_meta(&self.ctx.fen, candidate);

        let mut comments: Vec<String> = Vec::new();
        let mut meta = Map::new();

        // Sacrifice candidacy and verification
        let sacrifice = detect_sacrifice(
            self.board,
            prepared.chess_move,
            material_delta_cp,
            scored.is_tied_best,
            self.is_forced,
            config,
        );
        let verification = match sacrifice {
            Some(kind) if loss < config.sacrifice_sound_max_win_loss => {
                debug!(
                    move_uci = %candidate.move_uci,
                    kind = kind.as_str(),
                    shallow_loss = loss,
                    "Verifying sacrifice"
                );
                let fen_after = prepared.board_after.to_string();
                let outcome = verify_sacrifice(
                    evaluator,
                    &fen_after,
                    win_before,
                    mover == Color::White,
                    config,
                )
                .await;
                match &outcome {
                    Verification::Refuted { depth, loss } => comments.push(format!(
                        "Sacrifice unsound at depth {depth} (loss {loss:.1}%)"
                    )),
                    Verification::Failed(_) => comments.push("Verification failed".to_string()),
                    Verification::Sound { .. } => {}
                }
                Some(outcome)
            }
            _ => None,
        };
        let verified_sound = verification.as_ref().is_some_and(Verification::is_sound);

        // Classification
        let facts = MoveFacts {
            win_before,
            win_after,
            loss,
            is_tied_best: scored.is_tied_best,
            is_forced: self.is_forced,
            is_book,
            verified_sacrifice: sacrifice
                .filter(|_| verified_sound)
                .map(SacrificeKind::classification),
        };
        let (classification, reason) = decide(&facts, &self.best, config);

        match reason {
            Reason::OnlyGoodMove => comments.push("Found the only good move.".to_string()),
            Reason::OnlyLegalMove => comments.push("Only legal move.".to_string()),
            Reason::Book => {
                meta.insert("book_health".into(), json!("ok"));
            }
            Reason::DubiousBook(engine_label) => {
                meta.insert("book_health".into(), json!("dubious"));
                meta.insert("engine_classification".into(), json!(engine_label));
                comments.push(format!("Book (dubious): loses {loss:.1}%"));
            }
            Reason::WinLoss
                if win_before < 5.0
                    && matches!(
                        classification,
                        Classification::Mistake | Classification::Blunder
                    ) =>
            {
                comments.push("Already lost".to_string());
            }
            _ => {}
        }

        let mate = MateFlags::detect(&self.before, &after);

        // Scoring
        let depth = candidate.eval_after.search_depth.unwrap_or(0);
        let stability = Stability::from_depth(depth, self.default_depth);
        let accuracy = accuracy::accuracy(
            &AccuracyInputs {
                win_before,
                win_delta,
                material_delta_cp,
                is_book,
                stability,
            },
            config,
        );
        let confidence =
            accuracy::confidence(stability, depth, self.default_depth, scored.is_tied_best);

        meta.insert("original_rank".into(), json!(candidate.engine_rank));
        meta.insert("is_sac_candidate".into(), json!(sacrifice.is_some()));
        meta.insert("verified_sound".into(), json!(verified_sound));
        if let Some(kind) = sacrifice {
            meta.insert("sac_type".into(), json!(kind));
            meta.insert("verified".into(), json!(verified_sound));
        }
        if let Some(outcome) = &verification {
            meta.insert("verification".into(), json!(outcome.as_str()));
        }
        if !book_meta.is_empty() {
            meta.insert("book".into(), Value::Object(book_meta));
        }

        debug!(
            move_uci = %candidate.move_uci,
            rank = candidate.engine_rank,
            classification = %classification,
            win_delta,
            accuracy,
            "Classified move"
        );

        MoveVerdict {
            move_uci: candidate.move_uci.clone(),
            move_san: candidate.move_san.clone(),
            engine_rank: candidate.engine_rank,
            cp_before: self.before.cp,
            cp_after: after.cp,
            win_before,
            win_after,
            win_delta,
            material_before_cp: self.material_before_cp,
            material_after_cp,
            material_delta_cp,
            non_pawn_piece_loss,
            is_capture: candidate.is_capture,
            is_promotion: candidate.is_promotion,
            is_castle: candidate.is_castle,
            is_check: candidate.is_check,
            is_forced: self.is_forced,
            is_book_move: is_book,
            is_mate_threat: mate.threat,
            is_mate_missed: mate.missed,
            classification,
            accuracy,
            confidence,
            comments: (!comments.is_empty()).then(|| comments.join("; ")),
            analysis_meta: meta,
        }
    }
}
