//! Static position evaluation.
//!
//! Returns a score in centipawns from White's perspective.
//! Positive = White advantage, negative = Black advantage.
//!
//! Components:
//!   1. Material balance
//!   2. Centralisation bonus for pawns and knights

use crate::engine::board::Board;
use crate::engine::types::{Color, Piece, PieceKind, Square};

/// Infinity sentinel. Larger than any realistic eval.
pub const INF: i32 = 100_000;

/// Checkmate score base. Actual mate scores are `MATE - ply` so closer mates
/// score higher.
pub const MATE: i32 = 90_000;

/// Is this score a forced-mate score?
#[inline]
pub fn is_mate_score(score: i32) -> bool {
    score.abs() >= MATE - 500
}

// =========================================================================
// Centralisation
// =========================================================================

/// Distance of a file or rank index from the two central lines (0..=3).
#[inline]
fn line_distance(line: u8) -> i32 {
    if line < 4 { 3 - line as i32 } else { line as i32 - 4 }
}

/// Knights score by how close they stand to the d4/e4/d5/e5 block:
/// +30 in the centre, 0 in a corner.
fn knight_bonus(sq: Square) -> i32 {
    let distance = line_distance(sq.file()) + line_distance(sq.rank());
    (6 - distance) * 5
}

/// Pawns earn more the further a central-file pawn has advanced; rook-file
/// pawns earn nothing.
fn pawn_bonus(sq: Square, color: Color) -> i32 {
    let advanced = match color {
        Color::White => sq.rank() as i32 - 1,
        Color::Black => 6 - sq.rank() as i32,
    };
    (3 - line_distance(sq.file())) * advanced.max(0) * 2
}

fn piece_score(sq: Square, piece: Piece) -> i32 {
    let positional = match piece.kind {
        PieceKind::Pawn => pawn_bonus(sq, piece.color),
        PieceKind::Knight => knight_bonus(sq),
        _ => 0,
    };
    piece.kind.value() + positional
}

// =========================================================================
// Evaluation
// =========================================================================

/// Evaluate the position from White's perspective (centipawns).
pub fn evaluate(board: &Board) -> i32 {
    board
        .pieces()
        .map(|(sq, piece)| match piece.color {
            Color::White => piece_score(sq, piece),
            Color::Black => -piece_score(sq, piece),
        })
        .sum()
}

/// Evaluate relative to the side to move (for negamax).
#[inline]
pub fn evaluate_relative(board: &Board) -> i32 {
    match board.side_to_move {
        Color::White => evaluate(board),
        Color::Black => -evaluate(board),
    }
}

// =========================================================================
// Tests
// =========================================================================
