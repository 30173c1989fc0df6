//! Standard Algebraic Notation for the move history.
//!
//! SAN examples: `e4`, `Nf3`, `Bxe5`, `O-O`, `e8=Q+`, `Raxd1#`.

use crate::engine::board::Board;
use crate::engine::movegen;
use crate::engine::types::{Move, PieceKind};

/// Render `mv` (legal in `board`) as SAN, including the `+`/`#` suffix.
///
/// `legal` is the full legal move list of `board`, used for disambiguation.
pub fn move_to_san(board: &Board, mv: Move, legal: &[Move]) -> String {
    let mut san = body(board, mv, legal);

    let mut after = board.clone();
    after.make_move(mv);
    if after.is_in_check() {
        san.push(if movegen::has_legal_move(&after) { '+' } else { '#' });
    }
    san
}

fn body(board: &Board, mv: Move, legal: &[Move]) -> String {
    if mv.flags.is_castle() {
        return if mv.to.file() > mv.from.file() {
            "O-O".into()
        } else {
            "O-O-O".into()
        };
    }

    let Some(piece) = board.piece_at(mv.from) else {
        return mv.to_string();
    };

    let mut san = String::with_capacity(8);
    if piece.kind == PieceKind::Pawn {
        if mv.flags.is_capture() {
            san.push(file_char(mv.from.file()));
            san.push('x');
        }
        san.push_str(&mv.to.to_algebraic());
        if let Some(promo) = mv.promotion {
            san.push('=');
            san.push(promo.letter().to_ascii_uppercase());
        }
    } else {
        san.push(piece.kind.letter().to_ascii_uppercase());
        san.push_str(&disambiguation(board, mv, piece.kind, legal));
        if mv.flags.is_capture() {
            san.push('x');
        }
        san.push_str(&mv.to.to_algebraic());
    }
    san
}

/// File, rank, or both, when another piece of the same kind can reach the
/// same square.
fn disambiguation(board: &Board, mv: Move, kind: PieceKind, legal: &[Move]) -> String {
    let rivals: Vec<&Move> = legal
        .iter()
        .filter(|m| {
            m.to == mv.to
                && m.from != mv.from
                && board.piece_at(m.from).is_some_and(|p| p.kind == kind)
        })
        .collect();

    if rivals.is_empty() {
        return String::new();
    }

    let shares_file = rivals.iter().any(|m| m.from.file() == mv.from.file());
    let shares_rank = rivals.iter().any(|m| m.from.rank() == mv.from.rank());

    match (shares_file, shares_rank) {
        (false, _) => file_char(mv.from.file()).to_string(),
        (true, false) => rank_char(mv.from.rank()).to_string(),
        (true, true) => mv.from.to_algebraic(),
    }
}

fn file_char(file: u8) -> char {
    (b'a' + file) as char
}

fn rank_char(rank: u8) -> char {
    (b'1' + rank) as char
}
