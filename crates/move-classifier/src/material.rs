//! Material accounting and the board helpers sacrifice detection needs.

use chess::{BitBoard, Board, ChessMove, Color, File, Piece, Rank, Square, EMPTY};

use crate::config::PieceValues;
use crate::eval::MaterialCounts;

const COUNTED_PIECES: [Piece; 5] = [
    Piece::Pawn,
    Piece::Knight,
    Piece::Bishop,
    Piece::Rook,
    Piece::Queen,
];

fn piece_for_symbol(symbol: &str) -> Option<Piece> {
    match symbol.to_ascii_uppercase().as_str() {
        "P" => Some(Piece::Pawn),
        "N" => Some(Piece::Knight),
        "B" => Some(Piece::Bishop),
        "R" => Some(Piece::Rook),
        "Q" => Some(Piece::Queen),
        "K" => Some(Piece::King),
        _ => None,
    }
}

fn symbol_for_piece(piece: Piece) -> &'static str {
    match piece {
        Piece::Pawn => "P",
        Piece::Knight => "N",
        Piece::Bishop => "B",
        Piece::Rook => "R",
        Piece::Queen => "Q",
        Piece::King => "K",
    }
}

/// Total material in centipawns. Unknown symbols count for nothing.
pub fn material_value_cp(counts: &MaterialCounts, values: &PieceValues) -> i32 {
    counts
        .iter()
        .filter_map(|(symbol, &count)| {
            let piece = piece_for_symbol(symbol)?;
            Some(saturating_count(count).saturating_mul(values.of(piece)))
        })
        .fold(0, i32::saturating_add)
}

/// Number of pieces that are neither pawns nor kings.
pub fn non_pawn_piece_count(counts: &MaterialCounts) -> i32 {
    counts
        .iter()
        .filter(|(symbol, _)| {
            !matches!(
                piece_for_symbol(symbol),
                Some(Piece::Pawn) | Some(Piece::King) | None
            )
        })
        .map(|(_, &count)| saturating_count(count))
        .fold(0, i32::saturating_add)
}

fn saturating_count(count: u32) -> i32 {
    i32::try_from(count).unwrap_or(i32::MAX)
}

/// Piece counts for one side read straight off the board (kings excluded).
pub fn counts_on_board(board: &Board, color: Color) -> MaterialCounts {
    let color_bb = *board.color_combined(color);
    COUNTED_PIECES
        .iter()
        .map(|&piece| {
            let count = (*board.pieces(piece) & color_bb).popcnt();
            (symbol_for_piece(piece).to_string(), count)
        })
        .collect()
}

/// Pawn attack squares (just the diagonal attacks, not pushes)
fn pawn_attacks(square: Square, color: Color) -> BitBoard {
    let file = square.get_file().to_index();
    let rank = square.get_rank().to_index();

    let target_rank = match color {
        Color::White if rank < 7 => rank + 1,
        Color::Black if rank > 0 => rank - 1,
        _ => return EMPTY,
    };

    let mut result = EMPTY;
    if file > 0 {
        result |= BitBoard::from_square(Square::make_square(
            Rank::from_index(target_rank),
            File::from_index(file - 1),
        ));
    }
    if file < 7 {
        result |= BitBoard::from_square(Square::make_square(
            Rank::from_index(target_rank),
            File::from_index(file + 1),
        ));
    }
    result
}

/// All pieces of `color` attacking `square`.
pub fn attackers(board: &Board, color: Color, square: Square) -> BitBoard {
    let occupied = *board.combined();
    let color_pieces = *board.color_combined(color);
    let queens = *board.pieces(Piece::Queen);

    // Pawns: reverse lookup from the target square with the opposite color
    let mut result = pawn_attacks(square, !color) & *board.pieces(Piece::Pawn);
    result |= chess::get_knight_moves(square) & *board.pieces(Piece::Knight);
    result |= chess::get_king_moves(square) & *board.pieces(Piece::King);
    result |= chess::get_bishop_moves(square, occupied) & (*board.pieces(Piece::Bishop) | queens);
    result |= chess::get_rook_moves(square, occupied) & (*board.pieces(Piece::Rook) | queens);

    result & color_pieces
}

/// Parse a UCI move string ("e2e4", "e7e8q") without checking legality.
pub fn parse_uci_move(uci: &str) -> Option<ChessMove> {
    let bytes = uci.as_bytes();
    if bytes.len() < 4 || bytes.len() > 5 {
        return None;
    }

    let square = |file: u8, rank: u8| -> Option<Square> {
        if !(b'a'..=b'h').contains(&file) || !(b'1'..=b'8').contains(&rank) {
            return None;
        }
        Some(Square::make_square(
            Rank::from_index((rank - b'1') as usize),
            File::from_index((file - b'a') as usize),
        ))
    };

    let from = square(bytes[0], bytes[1])?;
    let to = square(bytes[2], bytes[3])?;

    let promotion = match bytes.get(4) {
        None => None,
        Some(b'q' | b'Q') => Some(Piece::Queen),
        Some(b'r' | b'R') => Some(Piece::Rook),
        Some(b'b' | b'B') => Some(Piece::Bishop),
        Some(b'n' | b'N') => Some(Piece::Knight),
        Some(_) => return None,
    };

    Some(ChessMove::new(from, to, promotion))
}
