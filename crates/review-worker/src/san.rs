//! SAN for the opening book key, plus the move flags the classifier reports.

use chess::{Board, ChessMove, Piece, EMPTY};
use shakmaty::{fen::Fen, san::San, uci::UciMove, CastlingMode, Chess};

/// Capture, promotion, castle and check flags of a move.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MoveFlags {
    pub is_capture: bool,
    pub is_promotion: bool,
    pub is_castle: bool,
    pub is_check: bool,
}

/// Flags of a legal move on `board`.
pub fn move_flags(board: &Board, mv: ChessMove) -> MoveFlags {
    let source = mv.get_source();
    let dest = mv.get_dest();
    let piece = board.piece_on(source);

    let is_castle = piece == Some(Piece::King)
        && source.get_file().to_index().abs_diff(dest.get_file().to_index()) == 2;
    // En passant is a diagonal pawn move onto an empty square
    let is_capture = board.piece_on(dest).is_some()
        || (piece == Some(Piece::Pawn) && source.get_file() != dest.get_file());

    MoveFlags {
        is_capture,
        is_promotion: mv.get_promotion().is_some(),
        is_castle,
        is_check: *board.make_move_new(mv).checkers() != EMPTY,
    }
}

/// Position for SAN conversion, or `None` for an unparseable FEN.
pub fn san_position(fen: &str) -> Option<Chess> {
    let fen: Fen = fen.parse().ok()?;
    fen.into_position(CastlingMode::Standard).ok()
}

/// Convert a single UCI move to SAN at a given position.
pub fn uci_to_san(pos: &Chess, uci_str: &str) -> Option<String> {
    let uci_move: UciMove = uci_str.parse().ok()?;
    let legal_move = uci_move.to_move(pos).ok()?;
    Some(San::from_move(pos, legal_move).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use move_classifier::material::parse_uci_move;
    use std::str::FromStr;

    fn san(fen: &str, uci: &str) -> String {
        let pos = san_position(fen).unwrap();
        uci_to_san(&pos, uci).unwrap()
    }

    fn flags(fen: &str, uci: &str) -> MoveFlags {
        let board = Board::from_str(fen).unwrap();
        move_flags(&board, parse_uci_move(uci).unwrap())
    }

    #[test]
    fn test_san_matches_book_keys() {
        let start = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";
        assert_eq!(san(start, "e2e4"), "e4");
        assert_eq!(san(start, "g1f3"), "Nf3");
        assert_eq!(san("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1", "e1g1"), "O-O");
        assert_eq!(san("4k3/8/8/8/8/8/8/1N2KN2 w - - 0 1", "b1d2"), "Nbd2");
    }

    #[test]
    fn test_san_rejects_illegal_move() {
        let start = san_position("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1");
        assert!(uci_to_san(&start.unwrap(), "e2e5").is_none());
        assert!(san_position("not a fen").is_none());
    }

    #[test]
    fn test_capture_flags() {
        let fen = "rnbqkbnr/ppp1pppp/8/3p4/4P3/8/PPPP1PPP/RNBQKBNR w KQkq d6 0 2";
        assert!(flags(fen, "e4d5").is_capture);
        assert!(!flags(fen, "e4e5").is_capture);

        // En passant
        let ep = "rnbqkbnr/ppp1p1pp/8/3pPp2/8/8/PPPP1PPP/RNBQKBNR w KQkq f6 0 3";
        assert!(flags(ep, "e5f6").is_capture);
    }

    #[test]
    fn test_castle_promotion_and_check_flags() {
        let castle = flags("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1", "e1c1");
        assert!(castle.is_castle);
        assert!(!castle.is_check);

        let promo = flags("7k/P7/8/8/8/8/8/K7 w - - 0 1", "a7a8q");
        assert!(promo.is_promotion);
        assert!(promo.is_check);
    }
}
