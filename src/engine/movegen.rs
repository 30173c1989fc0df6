//! Legal move generation.
//!
//! Pipeline:
//!   1. Generate pseudo-legal moves square by square, a1..h8, following the
//!      per-kind movement rules (ignoring pins / check evasion).
//!   2. Filter: make the move on a scratch copy, verify the mover's king is
//!      not attacked, unmake.
//!
//! Castling candidates are emitted without any attack test; the filter
//! rejects them when the king is in check or crosses an attacked square.

use crate::engine::attacks::{self, Movement};
use crate::engine::board::Board;
use crate::engine::types::{Color, Move, MoveFlags, Piece, PieceKind, Square};

// =========================================================================
// Public API
// =========================================================================

/// Generate all legal moves for the side to move.
pub fn legal_moves(board: &Board) -> Vec<Move> {
    let pseudo = generate_pseudo_legal(board);
    let mut scratch = board.clone();
    pseudo
        .into_iter()
        .filter(|&mv| is_legal(&mut scratch, mv))
        .collect()
}

/// Generate all legal moves originating from a specific square.
pub fn legal_moves_from(board: &Board, from: Square) -> Vec<Move> {
    match board.piece_at(from) {
        Some(piece) if piece.color == board.side_to_move => legal_moves(board)
            .into_iter()
            .filter(|m| m.from == from)
            .collect(),
        _ => Vec::new(),
    }
}

/// Does the side to move have at least one legal move?
pub fn has_legal_move(board: &Board) -> bool {
    let mut scratch = board.clone();
    generate_pseudo_legal(board)
        .into_iter()
        .any(|mv| is_legal(&mut scratch, mv))
}

/// Geometrically valid moves for the side to move, in a1..h8 square order.
pub fn generate_pseudo_legal(board: &Board) -> Vec<Move> {
    let us = board.side_to_move;
    let mut moves = Vec::with_capacity(64);
    for (from, piece) in board.pieces() {
        if piece.color != us {
            continue;
        }
        match attacks::movement(piece.kind) {
            Movement::Pawn => generate_pawn_moves(board, from, us, &mut moves),
            Movement::Leap(offsets) => generate_leaps(board, from, us, offsets, &mut moves),
            Movement::Slide(dirs) => generate_slides(board, from, us, dirs, &mut moves),
        }
        if piece.kind == PieceKind::King {
            generate_castling_moves(board, from, us, &mut moves);
        }
    }
    moves
}

// =========================================================================
// Legality
// =========================================================================

/// Make `mv` on `scratch`, test king safety, unmake. `scratch` is left as it
/// was found.
fn is_legal(scratch: &mut Board, mv: Move) -> bool {
    let us = scratch.side_to_move;
    let them = !us;

    if mv.flags.is_castle() {
        if scratch.is_square_attacked(mv.from, them) {
            return false;
        }
        let transit = Square::from_file_rank((mv.from.file() + mv.to.file()) / 2, mv.from.rank());
        if scratch.is_square_attacked(transit, them) {
            return false;
        }
    }

    let undo = scratch.make_move(mv);
    let safe = !scratch.is_color_in_check(us);
    scratch.unmake_move(mv, &undo);
    safe
}

// =========================================================================
// Pawn moves
// =========================================================================

fn generate_pawn_moves(board: &Board, from: Square, us: Color, moves: &mut Vec<Move>) {
    let forward = us.forward();
    let start_rank = match us {
        Color::White => 1,
        Color::Black => 6,
    };
    let last_rank = match us {
        Color::White => 7,
        Color::Black => 0,
    };

    // --- Pushes ---
    if let Some(one) = from.offset(0, forward)
        && board.piece_at(one).is_none()
    {
        if one.rank() == last_rank {
            add_promotions(from, one, MoveFlags::NONE, moves);
        } else {
            moves.push(Move::new(from, one));
            if from.rank() == start_rank
                && let Some(two) = one.offset(0, forward)
                && board.piece_at(two).is_none()
            {
                moves.push(Move::with_flags(from, two, MoveFlags::DOUBLE_PUSH));
            }
        }
    }

    // --- Captures ---
    for df in [-1, 1] {
        let Some(to) = from.offset(df, forward) else {
            continue;
        };
        match board.piece_at(to) {
            Some(target) if target.color != us => {
                if to.rank() == last_rank {
                    add_promotions(from, to, MoveFlags::CAPTURE, moves);
                } else {
                    moves.push(Move::with_flags(from, to, MoveFlags::CAPTURE));
                }
            }
            None if board.en_passant == Some(to) => {
                moves.push(Move::with_flags(
                    from,
                    to,
                    MoveFlags::CAPTURE | MoveFlags::EN_PASSANT,
                ));
            }
            _ => {}
        }
    }
}

fn add_promotions(from: Square, to: Square, flags: MoveFlags, moves: &mut Vec<Move>) {
    for kind in PieceKind::PROMOTIONS {
        moves.push(Move::with_promotion(from, to, kind, flags));
    }
}

// =========================================================================
// Knights, kings, sliders
// =========================================================================

fn capture_flags(board: &Board, to: Square) -> MoveFlags {
    if board.piece_at(to).is_some() {
        MoveFlags::CAPTURE
    } else {
        MoveFlags::NONE
    }
}

fn generate_leaps(
    board: &Board,
    from: Square,
    us: Color,
    offsets: &[(i8, i8)],
    moves: &mut Vec<Move>,
) {
    for &(df, dr) in offsets {
        let Some(to) = from.offset(df, dr) else {
            continue;
        };
        if board.piece_at(to).is_some_and(|p| p.color == us) {
            continue;
        }
        moves.push(Move::with_flags(from, to, capture_flags(board, to)));
    }
}

fn generate_slides(board: &Board, from: Square, us: Color, dirs: &[usize], moves: &mut Vec<Move>) {
    let t = attacks::tables();
    for &dir in dirs {
        for &to in t.ray(from, dir) {
            match board.piece_at(to) {
                None => moves.push(Move::new(from, to)),
                Some(p) => {
                    if p.color != us {
                        moves.push(Move::with_flags(from, to, MoveFlags::CAPTURE));
                    }
                    break;
                }
            }
        }
    }
}

// =========================================================================
// Castling
// =========================================================================

/// Castling candidates: right held, king and rook at home, path empty.
fn generate_castling_moves(board: &Board, king_sq: Square, us: Color, moves: &mut Vec<Move>) {
    let rank = us.back_rank();
    if king_sq != Square::from_file_rank(4, rank) {
        return;
    }
    let rook = Some(Piece::new(PieceKind::Rook, us));
    let empty = |files: &[u8]| {
        files
            .iter()
            .all(|&f| board.piece_at(Square::from_file_rank(f, rank)).is_none())
    };

    if board.castling_rights.kingside(us)
        && board.piece_at(Square::from_file_rank(7, rank)) == rook
        && empty(&[5, 6])
    {
        moves.push(Move::with_flags(
            king_sq,
            Square::from_file_rank(6, rank),
            MoveFlags::CASTLE,
        ));
    }

    if board.castling_rights.queenside(us)
        && board.piece_at(Square::from_file_rank(0, rank)) == rook
        && empty(&[1, 2, 3])
    {
        moves.push(Move::with_flags(
            king_sq,
            Square::from_file_rank(2, rank),
            MoveFlags::CASTLE,
        ));
    }
}

// =========================================================================
// Tests
// =========================================================================
