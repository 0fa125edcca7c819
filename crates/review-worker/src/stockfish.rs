//! Stockfish engine wrapper using UCI protocol (async I/O)

use std::str::FromStr;

use chess::{Board, BoardStatus, Color};
use move_classifier::{EngineEvaluation, Evaluator, EvaluatorError};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tracing::debug;

use crate::error::WorkerError;

/// Result of a single position evaluation
#[derive(Debug, Clone, Default)]
pub struct EvalResult {
    /// Centipawn score (side to move's perspective)
    pub cp: Option<i32>,
    /// Mate in N moves (positive = side to move mates)
    pub mate: Option<i32>,
    /// Deepest completed iteration
    pub depth: Option<u32>,
}

/// Stockfish engine instance
pub struct StockfishEngine {
    process: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
    default_depth: u32,
}

impl StockfishEngine {
    /// Spawn a new Stockfish process and initialize UCI
    pub async fn new(path: &str, default_depth: u32, hash_mb: u32) -> Result<Self, WorkerError> {
        let mut process = Command::new(path)
            .stdin(std::process::Stdio::piped())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::null())
            .spawn()
            .map_err(|e| WorkerError::Stockfish(format!("Failed to spawn Stockfish: {e}")))?;

        let stdin = process
            .stdin
            .take()
            .ok_or_else(|| WorkerError::Stockfish("Stockfish stdin unavailable".into()))?;
        let stdout = process
            .stdout
            .take()
            .map(BufReader::new)
            .ok_or_else(|| WorkerError::Stockfish("Stockfish stdout unavailable".into()))?;

        let mut engine = Self {
            process,
            stdin,
            stdout,
            default_depth,
        };

        // Initialize UCI
        engine.send("uci").await?;
        engine.wait_for("uciok").await?;

        // Configure for analysis
        engine.send("setoption name Threads value 1").await?;
        engine
            .send(&format!("setoption name Hash value {hash_mb}"))
            .await?;
        engine.send("setoption name UCI_AnalyseMode value true").await?;
        engine.send("isready").await?;
        engine.wait_for("readyok").await?;

        Ok(engine)
    }

    /// Send a command to Stockfish
    async fn send(&mut self, cmd: &str) -> Result<(), WorkerError> {
        debug!(cmd, "SF <");
        self.stdin
            .write_all(format!("{cmd}\n").as_bytes())
            .await
            .map_err(|e| WorkerError::Stockfish(format!("Failed to write to Stockfish: {e}")))?;
        self.stdin
            .flush()
            .await
            .map_err(|e| WorkerError::Stockfish(format!("Failed to flush stdin: {e}")))?;
        Ok(())
    }

    async fn read_line(&mut self, line: &mut String) -> Result<(), WorkerError> {
        line.clear();
        let read = self
            .stdout
            .read_line(line)
            .await
            .map_err(|e| WorkerError::Stockfish(format!("Failed to read from Stockfish: {e}")))?;
        if read == 0 {
            return Err(WorkerError::Stockfish("Stockfish closed its output".into()));
        }
        Ok(())
    }

    /// Wait for a specific response line
    async fn wait_for(&mut self, expected: &str) -> Result<(), WorkerError> {
        let mut line = String::new();
        loop {
            self.read_line(&mut line).await?;
            let trimmed = line.trim();
            debug!(line = trimmed, "SF >");
            if trimmed == expected {
                return Ok(());
            }
        }
    }

    /// Search a position to a fixed depth
    pub async fn analyse(&mut self, fen: &str, depth: u32) -> Result<EvalResult, WorkerError> {
        self.send(&format!("position fen {fen}")).await?;
        self.send(&format!("go depth {depth}")).await?;

        let mut result = EvalResult::default();
        let mut line = String::new();
        loop {
            self.read_line(&mut line).await?;
            let trimmed = line.trim();

            if trimmed.starts_with("info") && trimmed.contains(" pv ") {
                if let Some(cp) = parse_cp(trimmed) {
                    result.cp = Some(cp);
                    result.mate = None;
                }
                if let Some(mate) = parse_mate(trimmed) {
                    result.mate = Some(mate);
                    result.cp = None;
                }
                if let Some(d) = parse_depth(trimmed) {
                    result.depth = Some(d);
                }
            } else if trimmed.starts_with("bestmove") {
                break;
            }
        }

        Ok(result)
    }

    /// Send quit command and wait for process to exit
    pub async fn quit(&mut self) {
        let _ = self.send("quit").await;
        let _ = self.process.wait().await;
    }
}

impl Drop for StockfishEngine {
    fn drop(&mut self) {
        // Best-effort synchronous kill in drop
        let _ = self.process.start_kill();
    }
}

impl Evaluator for StockfishEngine {
    fn default_depth(&self) -> u32 {
        self.default_depth
    }

    fn returns_white_perspective(&self) -> bool {
        true
    }

    async fn evaluate(
        &mut self,
        fen: &str,
        depth: u32,
    ) -> Result<EngineEvaluation, EvaluatorError> {
        let board =
            Board::from_str(fen).map_err(|e| EvaluatorError(format!("Invalid FEN: {e}")))?;
        if let Some(terminal) = terminal_evaluation(&board) {
            return Ok(terminal.with_depth(depth));
        }

        let result = self
            .analyse(fen, depth)
            .await
            .map_err(|e| EvaluatorError(e.to_string()))?;
        Ok(to_white_perspective(&result, board.side_to_move()))
    }
}

/// Scores for positions the engine has no move in. A delivered checkmate
/// is reported as mate in one for the winner so it keeps the full mate score.
fn terminal_evaluation(board: &Board) -> Option<EngineEvaluation> {
    match board.status() {
        BoardStatus::Checkmate => {
            let white_won = board.side_to_move() == Color::Black;
            Some(EngineEvaluation::mate(if white_won { 1 } else { -1 }))
        }
        BoardStatus::Stalemate => Some(EngineEvaluation::cp(0)),
        BoardStatus::Ongoing => None,
    }
}

/// Convert a side-to-move score to White's perspective
pub fn to_white_perspective(result: &EvalResult, side_to_move: Color) -> EngineEvaluation {
    let sign = if side_to_move == Color::White { 1 } else { -1 };
    EngineEvaluation {
        centipawns: result.cp.map(|cp| cp.saturating_mul(sign)),
        mate_distance: result.mate.map(|m| m.saturating_mul(sign)),
        material_counts: None,
        search_depth: result.depth,
    }
}

/// Value following `key` in an info line
fn parse_field<T: FromStr>(line: &str, key: &str) -> Option<T> {
    let mut parts = line.split_whitespace();
    while let Some(part) = parts.next() {
        if part == key {
            return parts.next()?.parse().ok();
        }
    }
    None
}

/// Parse centipawn score from info line
fn parse_cp(line: &str) -> Option<i32> {
    parse_field(line, "cp")
}

/// Parse mate score from info line
fn parse_mate(line: &str) -> Option<i32> {
    parse_field(line, "mate")
}

/// Parse search depth from info line
fn parse_depth(line: &str) -> Option<u32> {
    parse_field(line, "depth")
}
