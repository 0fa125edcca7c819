//! Whole-game review: replay a move list and classify every played move.

use std::str::FromStr;

use chess::{Board, ChessMove, Color, MoveGen, Piece};
use move_classifier::display::{coach_reason, VerdictSummary};
use move_classifier::eval::NormalizedEval;
use move_classifier::material::parse_uci_move;
use move_classifier::{
    review_position, BookLookup, Classification, ClassifierConfig, Evaluator, MoveCandidate,
    PositionContext,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::WorkerError;
use crate::san::{move_flags, san_position, uci_to_san};

/// Move classification counts for one side
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct ClassificationsOutput {
    pub brilliant: u32,
    pub great: u32,
    pub best: u32,
    pub excellent: u32,
    pub good: u32,
    pub book: u32,
    pub inaccuracy: u32,
    pub mistake: u32,
    pub blunder: u32,
    pub forced: u32,
}

/// Per-side totals
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct SideStats {
    pub classifications: ClassificationsOutput,
    /// Rounded mean accuracy of the side's moves, 0 if it made none
    pub accuracy: u32,
    pub moves: u32,
    #[serde(skip)]
    accuracy_total: u32,
}

/// One played move
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlyReview {
    pub ply: usize,
    pub side: String,
    pub fen_before: String,
    pub fen_after: String,
    pub best_move_uci: String,
    pub reason: String,
    #[serde(flatten)]
    pub verdict: VerdictSummary,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameReview {
    pub start_fen: String,
    pub moves: Vec<PlyReview>,
    pub white: SideStats,
    pub black: SideStats,
}

impl SideStats {
    fn record(&mut self, classification: Classification, accuracy: u8) {
        update_class(&mut self.classifications, classification);
        self.moves += 1;
        self.accuracy_total += accuracy as u32;
        self.accuracy = (self.accuracy_total as f64 / self.moves as f64).round() as u32;
    }
}

fn update_class(class: &mut ClassificationsOutput, classification: Classification) {
    let counter = match classification {
        Classification::Brilliant => &mut class.brilliant,
        Classification::Great => &mut class.great,
        Classification::Best => &mut class.best,
        Classification::Excellent => &mut class.excellent,
        Classification::Good => &mut class.good,
        Classification::Book => &mut class.book,
        Classification::Inaccuracy => &mut class.inaccuracy,
        Classification::Mistake => &mut class.mistake,
        Classification::Blunder => &mut class.blunder,
        Classification::Forced => &mut class.forced,
    };
    *counter += 1;
}

/// UCI text of a move, with a lowercase promotion suffix
pub fn move_to_uci(mv: ChessMove) -> String {
    let promotion = match mv.get_promotion() {
        Some(Piece::Queen) => "q",
        Some(Piece::Rook) => "r",
        Some(Piece::Bishop) => "b",
        Some(Piece::Knight) => "n",
        _ => "",
    };
    format!("{}{}{}", mv.get_source(), mv.get_dest(), promotion)
}

/// Move counters the board type does not track.
#[derive(Debug, Clone, Copy)]
struct MoveClock {
    halfmove: u32,
    fullmove: u32,
}

impl MoveClock {
    fn from_fen(fen: &str) -> Self {
        let mut fields = fen.split_whitespace().skip(4);
        let halfmove = fields.next().and_then(|n| n.parse().ok()).unwrap_or(0);
        let fullmove = fields.next().and_then(|n| n.parse().ok()).unwrap_or(1);
        Self { halfmove, fullmove }
    }

    fn advance(&mut self, board: &Board, mv: ChessMove) {
        let resets = board.piece_on(mv.get_source()) == Some(Piece::Pawn)
            || board.piece_on(mv.get_dest()).is_some();
        self.halfmove = if resets { 0 } else { self.halfmove + 1 };
        if board.side_to_move() == Color::Black {
            self.fullmove += 1;
        }
    }

    /// Full FEN of `board` with these counters
    fn fen(&self, board: &Board) -> String {
        let position = board.to_string();
        let fields: Vec<&str> = position.split_whitespace().take(4).collect();
        format!("{} {} {}", fields.join(" "), self.halfmove, self.fullmove)
    }
}

/// Evaluate every legal move of `board` and order them best-first for the
/// mover. `engine_rank` is the position in that order.
async fn legal_move_candidates<E: Evaluator>(
    engine: &mut E,
    board: &Board,
    config: &ClassifierConfig,
) -> Result<Vec<MoveCandidate>, WorkerError> {
    let depth = engine.default_depth();
    let white_pov = engine.returns_white_perspective();
    let side_white = board.side_to_move() == Color::White;

    let san_pos = san_position(&board.to_string());

    let mut scored = Vec::new();
    for mv in MoveGen::new_legal(board) {
        let after = board.make_move_new(mv);
        let eval_after = engine
            .evaluate(&after.to_string(), depth)
            .await
            .map_err(|e| WorkerError::Stockfish(e.to_string()))?;
        let normalized = NormalizedEval::resolve(&eval_after, white_pov, side_white, config);
        let move_uci = move_to_uci(mv);
        let flags = move_flags(board, mv);

        let candidate = MoveCandidate {
            move_san: san_pos.as_ref().and_then(|pos| uci_to_san(pos, &move_uci)),
            move_uci,
            eval_after,
            is_capture: flags.is_capture,
            is_promotion: flags.is_promotion,
            is_castle: flags.is_castle,
            is_check: flags.is_check,
            engine_rank: 0,
        };
        scored.push((normalized, candidate));
    }

    scored.sort_by(|(a, _), (b, _)| b.win.total_cmp(&a.win).then(b.cp.cmp(&a.cp)));

    Ok(scored
        .into_iter()
        .enumerate()
        .map(|(rank, (_, mut candidate))| {
            candidate.engine_rank = rank as u32;
            candidate
        })
        .collect())
}

/// Review a game given as a start position and a list of UCI moves.
pub async fn review_game<E, B>(
    engine: &mut E,
    book: &B,
    config: &ClassifierConfig,
    start_fen: &str,
    moves: &[String],
) -> Result<GameReview, WorkerError>
where
    E: Evaluator,
    B: BookLookup,
{
    config.validate()?;

    let mut board = Board::from_str(start_fen)
        .map_err(|e| WorkerError::InvalidGame(format!("Invalid start FEN: {e}")))?;
    let mut clock = MoveClock::from_fen(start_fen);
    let start_fen = clock.fen(&board);

    info!(plies = moves.len(), "Starting game review");

    let depth = engine.default_depth();
    let mut eval_before = engine
        .evaluate(&start_fen, depth)
        .await
        .map_err(|e| WorkerError::Stockfish(e.to_string()))?;

    let mut white = SideStats::default();
    let mut black = SideStats::default();
    let mut plies = Vec::with_capacity(moves.len());

    for (index, uci) in moves.iter().enumerate() {
        let ply = index + 1;
        let played = parse_uci_move(uci.trim())
            .filter(|m| board.legal(*m))
            .ok_or_else(|| WorkerError::InvalidGame(format!("Illegal move {uci} at ply {ply}")))?;
        let played_uci = move_to_uci(played);

        let fen_before = clock.fen(&board);
        let side_to_move = board.side_to_move();
        let candidates = legal_move_candidates(engine, &board, config).await?;

        let position = candidates.iter().position(|c| c.move_uci == played_uci);
        let Some(played_index) = position else {
            return Err(WorkerError::InvalidGame(format!(
                "Move {played_uci} missing from legal moves at ply {ply}"
            )));
        };
        let next_eval = candidates[played_index].eval_after.clone();
        let best_move_uci = candidates
            .first()
            .map(|c| c.move_uci.clone())
            .unwrap_or_default();

        let ctx = PositionContext {
            fen: fen_before.clone(),
            side_to_move,
            eval_before: std::mem::take(&mut eval_before),
            candidates,
            config,
        };
        let verdicts = review_position(&ctx, engine, book).await?;
        let verdict = &verdicts[played_index];

        debug!(
            ply,
            move_uci = %played_uci,
            classification = %verdict.classification,
            accuracy = verdict.accuracy,
            confidence = verdict.confidence.as_str(),
            "Reviewed move"
        );

        let side = if side_to_move == Color::White {
            white.record(verdict.classification, verdict.accuracy);
            "white"
        } else {
            black.record(verdict.classification, verdict.accuracy);
            "black"
        };

        clock.advance(&board, played);
        board = board.make_move_new(played);
        eval_before = next_eval;

        plies.push(PlyReview {
            ply,
            side: side.to_string(),
            fen_before,
            fen_after: clock.fen(&board),
            best_move_uci,
            reason: coach_reason(verdict),
            verdict: VerdictSummary::from(verdict),
        });
    }

    info!(
        white_accuracy = white.accuracy,
        black_accuracy = black.accuracy,
        "Game review complete"
    );

    Ok(GameReview {
        start_fen,
        moves: plies,
        white,
        black,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_class() {
        let mut class = ClassificationsOutput::default();
        update_class(&mut class, Classification::Blunder);
        update_class(&mut class, Classification::Blunder);
        update_class(&mut class, Classification::Book);
        assert_eq!(class.blunder, 2);
        assert_eq!(class.book, 1);
        assert_eq!(class.best, 0);
    }

    #[test]
    fn test_side_stats_rounded_mean() {
        let mut stats = SideStats::default();
        stats.record(Classification::Best, 90);
        stats.record(Classification::Good, 85);
        assert_eq!(stats.moves, 2);
        // 87.5 rounds up
        assert_eq!(stats.accuracy, 88);
    }

    #[test]
    fn test_move_clock() {
        let start = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";
        let mut board = Board::from_str(start).unwrap();
        let mut clock = MoveClock::from_fen(start);
        for uci in ["g1f3", "g8f6", "e2e4"] {
            let mv = parse_uci_move(uci).unwrap();
            clock.advance(&board, mv);
            board = board.make_move_new(mv);
            if uci == "g8f6" {
                assert_eq!((clock.halfmove, clock.fullmove), (2, 2));
            }
        }
        assert_eq!((clock.halfmove, clock.fullmove), (0, 2));
        assert!(clock.fen(&board).ends_with(" 0 2"));
    }

    #[test]
    fn test_move_to_uci() {
        assert_eq!(move_to_uci(parse_uci_move("e7e8q").unwrap()), "e7e8q");
        assert_eq!(move_to_uci(parse_uci_move("g1f3").unwrap()), "g1f3");
    }
}
