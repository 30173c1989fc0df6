//! Movement rules per piece kind and square-attack detection.
//!
//! Every kind except the pawn is described by an entry in [`RULES`]: leapers
//! list their jump offsets, sliders list the ray directions they travel.
//! Rays for every square are pre-computed once (via `OnceLock`) so sliding
//! generation and attack lookups only walk a slice.

use std::sync::OnceLock;

use crate::engine::board::Board;
use crate::engine::types::{Color, Piece, PieceKind, Square};

// =========================================================================
// Movement rules
// =========================================================================

/// (file delta, rank delta) for the eight ray directions.
/// Indices 0..4 are orthogonal, 4..8 diagonal.
pub const DIRECTIONS: [(i8, i8); 8] = [
    (0, 1),
    (1, 0),
    (0, -1),
    (-1, 0),
    (1, 1),
    (1, -1),
    (-1, -1),
    (-1, 1),
];

pub const ORTHOGONAL: [usize; 4] = [0, 1, 2, 3];
pub const DIAGONAL: [usize; 4] = [4, 5, 6, 7];
pub const ALL_DIRECTIONS: [usize; 8] = [0, 1, 2, 3, 4, 5, 6, 7];

pub const KNIGHT_JUMPS: [(i8, i8); 8] = [
    (1, 2),
    (2, 1),
    (2, -1),
    (1, -2),
    (-1, -2),
    (-2, -1),
    (-2, 1),
    (-1, 2),
];

pub const KING_STEPS: [(i8, i8); 8] = DIRECTIONS;

/// How a piece kind moves.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Movement {
    /// Colour-dependent pushes and captures; handled by the generator.
    Pawn,
    /// One jump per offset, blocked only by friendly pieces on the target.
    Leap(&'static [(i8, i8)]),
    /// Travel along each listed direction (indices into [`DIRECTIONS`]).
    Slide(&'static [usize]),
}

/// Movement rule table, indexed by `PieceKind::index()`.
pub const RULES: [Movement; 6] = [
    Movement::Pawn,
    Movement::Leap(&KNIGHT_JUMPS),
    Movement::Slide(&DIAGONAL),
    Movement::Slide(&ORTHOGONAL),
    Movement::Slide(&ALL_DIRECTIONS),
    Movement::Leap(&KING_STEPS),
];

#[inline]
pub fn movement(kind: PieceKind) -> Movement {
    RULES[kind.index()]
}

// =========================================================================
// Ray tables
// =========================================================================

/// Pre-computed rays: `rays[square][direction]` lists the squares met when
/// walking from `square` towards the board edge, nearest first.
pub struct RayTables {
    rays: Vec<[Vec<Square>; 8]>,
}

impl RayTables {
    fn init() -> Self {
        let rays = Square::all()
            .map(|sq| {
                std::array::from_fn(|dir| {
                    let (df, dr) = DIRECTIONS[dir];
                    let mut ray = Vec::with_capacity(7);
                    let mut cur = sq;
                    while let Some(next) = cur.offset(df, dr) {
                        ray.push(next);
                        cur = next;
                    }
                    ray
                })
            })
            .collect();
        RayTables { rays }
    }

    #[inline]
    pub fn ray(&self, sq: Square, dir: usize) -> &[Square] {
        &self.rays[sq.index()][dir]
    }
}

/// Get a reference to the global ray tables.
pub fn tables() -> &'static RayTables {
    static TABLES: OnceLock<RayTables> = OnceLock::new();
    TABLES.get_or_init(RayTables::init)
}

// =========================================================================
// Attack detection
// =========================================================================

/// Is `sq` attacked by any piece of colour `by`?
///
/// Looks outward from the target square with each movement rule and checks
/// whether the first piece met is an attacker of the matching kind. This is
/// equivalent to asking whether any `by` piece's pseudo-legal generation
/// reaches `sq`, without enumerating that side's moves.
pub fn is_square_attacked(board: &Board, sq: Square, by: Color) -> bool {
    // Pawns attack diagonally forward, so look one rank *behind* the target
    // from the attacker's point of view.
    let pawn = Piece::new(PieceKind::Pawn, by);
    for df in [-1, 1] {
        if let Some(from) = sq.offset(df, -by.forward())
            && board.piece_at(from) == Some(pawn)
        {
            return true;
        }
    }

    for kind in [PieceKind::Knight, PieceKind::King] {
        let Movement::Leap(jumps) = movement(kind) else {
            continue;
        };
        let attacker = Piece::new(kind, by);
        if jumps
            .iter()
            .filter_map(|&(df, dr)| sq.offset(df, dr))
            .any(|from| board.piece_at(from) == Some(attacker))
        {
            return true;
        }
    }

    let t = tables();
    for dir in ALL_DIRECTIONS {
        let diagonal = dir >= 4;
        for &from in t.ray(sq, dir) {
            let Some(piece) = board.piece_at(from) else {
                continue;
            };
            if piece.color == by {
                let hits = match piece.kind {
                    PieceKind::Queen => true,
                    PieceKind::Rook => !diagonal,
                    PieceKind::Bishop => diagonal,
                    _ => false,
                };
                if hits {
                    return true;
                }
            }
            break;
        }
    }

    false
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn sq(name: &str) -> Square {
        Square::from_algebraic(name).unwrap()
    }

    fn board(fen: &str) -> Board {
        Board::from_fen(fen).unwrap()
    }

    #[test]
    fn rule_table_matches_kinds() {
        assert_eq!(movement(PieceKind::Pawn), Movement::Pawn);
        assert_eq!(movement(PieceKind::Knight), Movement::Leap(&KNIGHT_JUMPS));
        assert_eq!(movement(PieceKind::Rook), Movement::Slide(&ORTHOGONAL));
        assert_eq!(movement(PieceKind::Bishop), Movement::Slide(&DIAGONAL));
        assert_eq!(movement(PieceKind::Queen), Movement::Slide(&ALL_DIRECTIONS));
        assert_eq!(movement(PieceKind::King), Movement::Leap(&KING_STEPS));
    }

    #[test]
    fn rays_from_corner() {
        let t = tables();
        // North from a1: a2..a8.
        assert_eq!(t.ray(sq("a1"), 0).len(), 7);
        assert_eq!(t.ray(sq("a1"), 0)[0], sq("a2"));
        // South from a1: nothing.
        assert!(t.ray(sq("a1"), 2).is_empty());
        // North-east diagonal from a1 ends on h8.
        assert_eq!(t.ray(sq("a1"), 4).last(), Some(&sq("h8")));
    }

    #[test]
    fn rays_from_center() {
        let t = tables();
        let total: usize = ALL_DIRECTIONS.iter().map(|&d| t.ray(sq("d4"), d).len()).sum();
        // A queen on an empty board from d4 reaches 27 squares.
        assert_eq!(total, 27);
    }

    #[test]
    fn pawn_attacks_are_directional() {
        let b = board("4k3/8/8/3p4/8/8/4P3/4K3 w - - 0 1");
        // White pawn e2 attacks d3 and f3.
        assert!(is_square_attacked(&b, sq("d3"), Color::White));
        assert!(is_square_attacked(&b, sq("f3"), Color::White));
        assert!(!is_square_attacked(&b, sq("e3"), Color::White));
        // Black pawn d5 attacks c4 and e4, not c6.
        assert!(is_square_attacked(&b, sq("c4"), Color::Black));
        assert!(is_square_attacked(&b, sq("e4"), Color::Black));
        assert!(!is_square_attacked(&b, sq("c6"), Color::Black));
    }

    #[test]
    fn knight_and_king_attacks() {
        let b = board("4k3/8/8/8/3N4/8/8/4K3 w - - 0 1");
        assert!(is_square_attacked(&b, sq("e6"), Color::White));
        assert!(is_square_attacked(&b, sq("b3"), Color::White));
        assert!(!is_square_attacked(&b, sq("d5"), Color::White));
        // King e1 covers d2 and f1.
        assert!(is_square_attacked(&b, sq("d2"), Color::White));
        assert!(is_square_attacked(&b, sq("f1"), Color::White));
    }

    #[test]
    fn sliders_are_blocked() {
        let b = board("4k3/8/8/8/R2p4/8/8/4K2B w - - 0 1");
        // Rook a4 sees b4, c4, d4 (the pawn) but not e4.
        assert!(is_square_attacked(&b, sq("c4"), Color::White));
        assert!(is_square_attacked(&b, sq("d4"), Color::White));
        assert!(!is_square_attacked(&b, sq("e4"), Color::White));
        // Bishop h1 sweeps the long diagonal up to d5, blocked by nothing there.
        assert!(is_square_attacked(&b, sq("d5"), Color::White));
        assert!(is_square_attacked(&b, sq("a8"), Color::White));
    }

    #[test]
    fn rook_does_not_attack_diagonally() {
        let b = board("4k3/8/8/8/8/8/1R6/4K3 w - - 0 1");
        assert!(!is_square_attacked(&b, sq("c3"), Color::White));
        assert!(is_square_attacked(&b, sq("b7"), Color::White));
    }

    #[test]
    fn queen_attacks_both_ways() {
        let b = board("4k3/8/8/8/3q4/8/8/K7 w - - 0 1");
        assert!(is_square_attacked(&b, sq("d1"), Color::Black));
        assert!(is_square_attacked(&b, sq("a1"), Color::Black));
        assert!(is_square_attacked(&b, sq("h8"), Color::Black));
        assert!(!is_square_attacked(&b, sq("e2"), Color::Black));
    }
}
