//! Off-thread searches with a deadline.
//!
//! The search runs on tokio's blocking pool against a cloned `Board`, so the
//! live game is never read while it is being mutated. The handle can cancel
//! the search or wait for it with a timeout.

use std::time::Duration;

use tokio::task::{JoinError, JoinHandle};
use tracing::{info, warn};

use crate::engine::board::Board;
use crate::engine::types::Move;

use super::engine::{CancelToken, MinimaxAi, SearchStats};

/// Result of a background search.
#[derive(Clone, Debug)]
pub struct SearchOutcome {
    pub best_move: Option<Move>,
    pub stats: SearchStats,
}

/// A search running on the blocking pool.
pub struct SearchHandle {
    cancel: CancelToken,
    task: JoinHandle<SearchOutcome>,
}

/// Start searching `board` to `depth` plies on a blocking worker.
pub fn spawn_search(board: Board, depth: u32) -> SearchHandle {
    let cancel = CancelToken::new();
    let ai = MinimaxAi::new().with_cancel(cancel.clone());

    let task = tokio::task::spawn_blocking(move || {
        let (best_move, stats) = ai.search_fixed_depth(&board, depth);
        if stats.completed {
            info!(
                depth = stats.depth,
                nodes = stats.nodes,
                score = stats.score,
                time_ms = stats.time_ms,
                best = ?best_move.map(|m| m.to_string()),
                "search finished"
            );
        }
        SearchOutcome { best_move, stats }
    });

    SearchHandle { cancel, task }
}

impl SearchHandle {
    /// Ask the search to stop; `join` then yields the best move found so far.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Wait for the search to end.
    pub async fn join(self) -> Result<SearchOutcome, JoinError> {
        self.task.await
    }

    /// Wait at most `timeout`, then cancel and collect the partial result.
    pub async fn finish_within(mut self, timeout: Duration) -> Result<SearchOutcome, JoinError> {
        tokio::select! {
            outcome = &mut self.task => outcome,
            _ = tokio::time::sleep(timeout) => {
                self.cancel.cancel();
                let outcome = self.task.await?;
                warn!(
                    timeout_ms = timeout.as_millis() as u64,
                    nodes = outcome.stats.nodes,
                    best = ?outcome.best_move.map(|m| m.to_string()),
                    "search cancelled at deadline"
                );
                Ok(outcome)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::movegen::legal_moves;

    #[tokio::test]
    async fn completes_within_generous_deadline() {
        let board = Board::starting();
        let outcome = spawn_search(board.clone(), 2)
            .finish_within(Duration::from_secs(30))
            .await
            .unwrap();
        assert!(outcome.stats.completed);
        assert!(legal_moves(&board).contains(&outcome.best_move.unwrap()));
    }

    #[tokio::test]
    async fn cancelled_search_still_returns_legal_move() {
        let board = Board::starting();
        let handle = spawn_search(board.clone(), 8);
        handle.cancel();
        let outcome = handle.join().await.unwrap();
        assert!(legal_moves(&board).contains(&outcome.best_move.unwrap()));
    }

    #[tokio::test]
    async fn deadline_cancels_deep_search() {
        let board = Board::from_fen(
            "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
        )
        .unwrap();
        let outcome = spawn_search(board.clone(), 10)
            .finish_within(Duration::from_millis(50))
            .await
            .unwrap();
        assert!(!outcome.stats.completed);
        assert!(legal_moves(&board).contains(&outcome.best_move.unwrap()));
    }

    #[tokio::test]
    async fn no_move_in_checkmate() {
        let board =
            Board::from_fen("rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 1 3")
                .unwrap();
        let outcome = spawn_search(board, 3).join().await.unwrap();
        assert_eq!(outcome.best_move, None);
    }
}
