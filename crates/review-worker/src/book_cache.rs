//! In-memory opening book for the review worker.
//!
//! The book is a bincode map: normalized FEN -> (move SAN -> stats).

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use move_classifier::{BookLookup, MoveCandidate};

use crate::error::WorkerError;

/// Stats for a single book move.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookMoveStats {
    pub games: i32,
    pub white_wins: i32,
    pub draws: i32,
    pub black_wins: i32,
}

/// Raw book contents: FEN -> (move_san -> stats)
pub type BookPositions = HashMap<String, HashMap<String, BookMoveStats>>;

/// Default path to the binary book file.
pub const BOOK_FILE_PATH: &str = "data/opening_book.bin";

/// Opening book limited to the first moves of the game.
#[derive(Debug, Clone, Default)]
pub struct OpeningBook {
    positions: BookPositions,
    max_fullmove: u32,
}

impl OpeningBook {
    pub fn new(positions: BookPositions, max_fullmove: u32) -> Self {
        Self {
            positions,
            max_fullmove,
        }
    }

    /// Load the book, falling back to an empty one if the file is missing
    /// or unreadable.
    pub fn load<P: AsRef<Path>>(path: P, max_fullmove: u32) -> Self {
        let path = path.as_ref();
        match load_book(path) {
            Ok(positions) => {
                let total_moves: usize = positions.values().map(|m| m.len()).sum();
                tracing::info!(
                    "Loaded opening book: {} positions, {} moves",
                    positions.len(),
                    total_moves
                );
                Self::new(positions, max_fullmove)
            }
            Err(e) => {
                tracing::warn!("Failed to load opening book from {}: {}", path.display(), e);
                tracing::warn!("Book move detection will be disabled");
                Self::new(HashMap::new(), max_fullmove)
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Stats for a (fen, move_san) pair within the full-move limit.
    pub fn stats(&self, fen: &str, move_san: &str) -> Option<&BookMoveStats> {
        if fullmove_number(fen) > self.max_fullmove {
            return None;
        }
        self.positions
            .get(&normalize_fen(fen))
            .and_then(|moves| moves.get(move_san))
    }
}

impl BookLookup for OpeningBook {
    fn in_book(&self, fen: &str, candidate: &MoveCandidate) -> bool {
        candidate
            .move_san
            .as_deref()
            .is_some_and(|san| self.stats(fen, san).is_some())
    }

    fn book_meta(&self, fen: &str, candidate: &MoveCandidate) -> Map<String, Value> {
        let mut meta = Map::new();
        if let Some(stats) = candidate
            .move_san
            .as_deref()
            .and_then(|san| self.stats(fen, san))
        {
            meta.insert("games".into(), json!(stats.games));
            meta.insert("white_wins".into(), json!(stats.white_wins));
            meta.insert("draws".into(), json!(stats.draws));
            meta.insert("black_wins".into(), json!(stats.black_wins));
        }
        meta
    }
}

/// Load the book from a binary file.
pub fn load_book<P: AsRef<Path>>(path: P) -> Result<BookPositions, WorkerError> {
    let file = File::open(path).map_err(|e| WorkerError::Book(e.to_string()))?;
    let reader = BufReader::new(file);
    bincode::deserialize_from(reader).map_err(|e| WorkerError::Book(e.to_string()))
}

/// Strips move counters from FEN, keeping only position + side + castling + ep.
pub fn normalize_fen(fen: &str) -> String {
    fen.split_whitespace().take(4).collect::<Vec<_>>().join(" ")
}

/// Full-move number of a FEN; a missing counter reads as move 1.
fn fullmove_number(fen: &str) -> u32 {
    fen.split_whitespace()
        .nth(5)
        .and_then(|n| n.parse().ok())
        .unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use move_classifier::EngineEvaluation;
    use std::io::Write;

    const START: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

    fn sample_positions() -> BookPositions {
        let mut moves = HashMap::new();
        moves.insert(
            "e4".to_string(),
            BookMoveStats {
                games: 1000,
                white_wins: 400,
                draws: 300,
                black_wins: 300,
            },
        );
        let mut positions = HashMap::new();
        positions.insert(normalize_fen(START), moves);
        positions
    }

    fn candidate(uci: &str, san: &str) -> MoveCandidate {
        MoveCandidate {
            move_san: Some(san.to_string()),
            ..MoveCandidate::new(uci, EngineEvaluation::cp(20))
        }
    }

    #[test]
    fn test_normalize_fen() {
        assert_eq!(
            normalize_fen(START),
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq -"
        );
    }

    #[test]
    fn test_lookup_by_san() {
        let book = OpeningBook::new(sample_positions(), 5);
        assert!(book.in_book(START, &candidate("e2e4", "e4")));
        assert!(!book.in_book(START, &candidate("a2a3", "a3")));
        assert!(!book.in_book(START, &MoveCandidate::new("e2e4", EngineEvaluation::cp(20))));

        let meta = book.book_meta(START, &candidate("e2e4", "e4"));
        assert_eq!(meta.get("games"), Some(&json!(1000)));
    }

    #[test]
    fn test_fullmove_limit() {
        let book = OpeningBook::new(sample_positions(), 5);
        // Same placement, but past the book phase
        let late = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 6";
        assert!(!book.in_book(late, &candidate("e2e4", "e4")));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        let bytes = bincode::serialize(&sample_positions()).unwrap();
        file.write_all(&bytes).unwrap();

        let book = OpeningBook::load(file.path(), 5);
        assert!(!book.is_empty());
        assert!(book.stats(START, "e4").is_some());
    }

    #[test]
    fn test_missing_file_gives_empty_book() {
        let book = OpeningBook::load("/nonexistent/book.bin", 5);
        assert!(book.is_empty());
        assert!(!book.in_book(START, &candidate("e2e4", "e4")));
    }
}
