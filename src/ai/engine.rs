//! Move advisor: the `AiEngine` trait and `MinimaxAi`.
//!
//! `MinimaxAi` runs a depth-bounded negamax with alpha-beta pruning. Root
//! moves are searched in generation order and only a strictly better score
//! replaces the current best, so equal-valued moves resolve to the first one
//! generated. Interior nodes are ordered captures-first for pruning.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use crate::engine::board::Board;
use crate::engine::movegen::{has_legal_move, legal_moves};
use crate::engine::types::{Move, PieceKind};

use super::evaluation::{INF, MATE, evaluate_relative};

/// Default depth for hints, in plies.
pub const DEFAULT_HINT_DEPTH: u32 = 2;

// =========================================================================
// AiEngine trait
// =========================================================================

/// A move advisor. Implementations must only return moves from the legal set
/// of `board` and must leave `board` untouched.
pub trait AiEngine: Send + Sync {
    /// Best move for the side to move, searching `depth` plies.
    /// `None` when the side to move has no legal move.
    fn suggest(&self, board: &Board, depth: u32) -> Option<Move>;

    /// Human-readable name for this engine.
    fn name(&self) -> &str;
}

// =========================================================================
// CancelToken
// =========================================================================

/// Shared flag a running search polls at every node.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

// =========================================================================
// Move ordering (MVV-LVA), interior nodes only
// =========================================================================

/// Score a move for ordering. Higher = searched first.
fn move_order_score(mv: &Move, board: &Board) -> i32 {
    let mut score = 0;
    if mv.flags.is_capture() {
        let victim = board
            .piece_at(mv.to)
            .map_or(PieceKind::Pawn.value(), |p| p.kind.value());
        let attacker = board.piece_at(mv.from).map_or(0, |p| p.kind.value());
        score += 10_000 + victim * 10 - attacker;
    }
    if let Some(promo) = mv.promotion {
        score += 8_000 + promo.value();
    }
    score
}

fn order_moves(moves: &mut [Move], board: &Board) {
    moves.sort_by_key(|m| std::cmp::Reverse(move_order_score(m, board)));
}

// =========================================================================
// Search
// =========================================================================

/// Search statistics.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SearchStats {
    pub nodes: u64,
    pub depth: u32,
    /// Root score from the mover's point of view.
    pub score: i32,
    pub time_ms: u64,
    /// `false` when the search was cut short by cancellation or time limit.
    pub completed: bool,
}

struct SearchContext<'a> {
    time_limit: Option<Duration>,
    start_time: Instant,
    cancel: Option<&'a CancelToken>,
    nodes: u64,
    aborted: bool,
}

impl<'a> SearchContext<'a> {
    fn new(time_limit: Option<Duration>, cancel: Option<&'a CancelToken>) -> Self {
        Self {
            time_limit,
            start_time: Instant::now(),
            cancel,
            nodes: 0,
            aborted: false,
        }
    }

    /// Poll the cancel flag every node, the clock every 1024 nodes.
    #[inline]
    fn poll(&mut self) {
        if self.cancel.is_some_and(CancelToken::is_cancelled) {
            self.aborted = true;
        } else if self.nodes & 1023 == 0
            && let Some(limit) = self.time_limit
            && self.start_time.elapsed() >= limit
        {
            self.aborted = true;
        }
    }
}

/// Negamax with alpha-beta pruning.
///
/// Returns the score from the side-to-move's perspective; `ply` is the
/// distance from the root.
fn negamax(
    board: &mut Board,
    depth: u32,
    ply: u32,
    mut alpha: i32,
    beta: i32,
    ctx: &mut SearchContext<'_>,
) -> i32 {
    ctx.nodes += 1;
    ctx.poll();
    if ctx.aborted {
        return 0;
    }

    if depth == 0 {
        if has_legal_move(board) {
            return evaluate_relative(board);
        }
        return terminal_score(board, ply);
    }

    let mut moves = legal_moves(board);
    if moves.is_empty() {
        return terminal_score(board, ply);
    }
    order_moves(&mut moves, board);

    let mut best_score = -INF;
    for mv in moves {
        let undo = board.make_move(mv);
        let score = -negamax(board, depth - 1, ply + 1, -beta, -alpha, ctx);
        board.unmake_move(mv, &undo);

        if ctx.aborted {
            return 0;
        }

        best_score = best_score.max(score);
        alpha = alpha.max(score);
        if alpha >= beta {
            break;
        }
    }
    best_score
}

/// Checkmate loses (faster mates weigh more); stalemate is level.
#[inline]
fn terminal_score(board: &Board, ply: u32) -> i32 {
    if board.is_in_check() {
        -(MATE - ply as i32)
    } else {
        0
    }
}

// =========================================================================
// MinimaxAi
// =========================================================================

/// Minimax AI engine using negamax with alpha-beta pruning.
#[derive(Clone, Debug, Default)]
pub struct MinimaxAi {
    /// Optional time limit per search (if None, depth alone limits search).
    time_limit: Option<Duration>,
    cancel: Option<CancelToken>,
}

impl MinimaxAi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_time_limit(time_limit: Duration) -> Self {
        Self {
            time_limit: Some(time_limit),
            cancel: None,
        }
    }

    /// Stop searching as soon as `token` is cancelled.
    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Run a fixed-depth search on a scratch copy of `board`.
    ///
    /// If the search is interrupted, the best root move whose subtree was
    /// fully searched is returned, or the first legal move if none was.
    pub fn search_fixed_depth(&self, board: &Board, depth: u32) -> (Option<Move>, SearchStats) {
        let mut ctx = SearchContext::new(self.time_limit, self.cancel.as_ref());
        let mut scratch = board.clone();
        let depth = depth.max(1);

        let moves = legal_moves(&scratch);
        let Some(&first) = moves.first() else {
            return (
                None,
                SearchStats {
                    nodes: 1,
                    depth,
                    score: terminal_score(board, 0),
                    time_ms: 0,
                    completed: true,
                },
            );
        };

        let mut best_move = first;
        let mut best_score = -INF;

        for mv in moves {
            let undo = scratch.make_move(mv);
            let score = -negamax(&mut scratch, depth - 1, 1, -INF, -best_score, &mut ctx);
            scratch.unmake_move(mv, &undo);

            if ctx.aborted {
                break;
            }
            if score > best_score {
                best_score = score;
                best_move = mv;
            }
        }

        let stats = SearchStats {
            nodes: ctx.nodes,
            depth,
            score: if best_score == -INF { 0 } else { best_score },
            time_ms: ctx.start_time.elapsed().as_millis() as u64,
            completed: !ctx.aborted,
        };
        (Some(best_move), stats)
    }
}

impl AiEngine for MinimaxAi {
    fn suggest(&self, board: &Board, depth: u32) -> Option<Move> {
        self.search_fixed_depth(board, depth).0
    }

    fn name(&self) -> &str {
        "MinimaxAi"
    }
}

/// Convenience: create the default AI engine.
pub fn default_engine() -> MinimaxAi {
    MinimaxAi::new()
}

// =========================================================================
// Tests
// =========================================================================
