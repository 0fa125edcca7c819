//! Game review worker: drives a local Stockfish and the move classifier
//! over a whole game.

pub mod book_cache;
pub mod config;
pub mod error;
pub mod game;
pub mod san;
pub mod stockfish;

pub use book_cache::OpeningBook;
pub use config::WorkerConfig;
pub use error::WorkerError;
pub use game::{review_game, GameReview, PlyReview, SideStats};
pub use stockfish::StockfishEngine;
