//! Review Worker
//!
//! Reviews a single game with native Stockfish and prints the result as JSON.

use review_worker::{review_game, OpeningBook, StockfishEngine, WorkerConfig};
use tracing::info;

const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// Value following `flag` in the CLI args
fn arg_value(flag: &str) -> Option<String> {
    let args: Vec<String> = std::env::args().collect();
    for i in 0..args.len() {
        if args[i] == flag {
            if let Some(value) = args.get(i + 1) {
                return Some(value.clone());
            }
        }
    }
    None
}

/// Parse --moves e2e4,e7e5,... from CLI args
fn parse_moves() -> Option<Vec<String>> {
    let moves: Vec<String> = arg_value("--moves")?
        .split(',')
        .map(|m| m.trim().to_string())
        .filter(|m| !m.is_empty())
        .collect();
    (!moves.is_empty()).then_some(moves)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    // Load .env file for local dev
    let _ = dotenvy::dotenv();

    let Some(moves) = parse_moves() else {
        anyhow::bail!("usage: review-worker --moves e2e4,e7e5,... [--fen <FEN>]");
    };
    let start_fen = arg_value("--fen").unwrap_or_else(|| START_FEN.to_string());

    let config = WorkerConfig::load()?;
    let classifier_config = config.classifier_config()?;
    info!(
        stockfish_path = %config.stockfish_path,
        depth = config.engine_depth,
        "Config loaded"
    );

    let book = OpeningBook::load(&config.book_path, config.book_max_fullmove);
    let mut engine = StockfishEngine::new(
        &config.stockfish_path,
        config.engine_depth,
        config.engine_hash_mb,
    )
    .await?;

    let result = review_game(&mut engine, &book, &classifier_config, &start_fen, &moves).await;
    engine.quit().await;

    let review = result?;
    println!("{}", serde_json::to_string_pretty(&review)?);

    Ok(())
}
