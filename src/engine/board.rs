//! Mailbox chess board.
//!
//! `Board` stores one optional piece per square plus side to move, castling
//! rights, en-passant target and the two move counters. The square of each
//! king is cached so check detection never scans the board.

use std::fmt;

use crate::engine::attacks;
use crate::engine::types::{CastlingRights, ChessError, Color, Move, Piece, PieceKind, Square};

pub const STARTING_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

// ---------------------------------------------------------------------------
// UndoRecord: what a move overwrote
// ---------------------------------------------------------------------------

/// State overwritten by `make_move`; together with the move it restores the
/// exact prior board.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UndoRecord {
    /// Captured piece and the square it stood on (differs from `mv.to` for
    /// en passant).
    pub captured: Option<(Piece, Square)>,
    pub castling_rights: CastlingRights,
    pub en_passant: Option<Square>,
    pub halfmove_clock: u16,
    pub fullmove_number: u16,
}

// ---------------------------------------------------------------------------
// PositionKey: identity for repetition detection
// ---------------------------------------------------------------------------

/// Everything that makes two positions "the same" for threefold repetition.
/// Move counters are deliberately excluded.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PositionKey {
    squares: [Option<Piece>; 64],
    side_to_move: Color,
    castling_rights: CastlingRights,
    en_passant: Option<Square>,
}

// ---------------------------------------------------------------------------
// Board
// ---------------------------------------------------------------------------

/// A complete chess position.
///
/// Square indices follow a1 = 0, b1 = 1, … h1 = 7, a2 = 8, … h8 = 63.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Board {
    squares: [Option<Piece>; 64],

    /// Cached king squares, indexed by `Color::index()`.
    king_squares: [Square; 2],

    /// Whose turn it is.
    pub side_to_move: Color,

    /// Castling availability (K/Q/k/q).
    pub castling_rights: CastlingRights,

    /// En-passant target square (the square *behind* a pawn that just
    /// advanced two squares).
    pub en_passant: Option<Square>,

    /// Plies since the last capture or pawn move (50-move rule).
    pub halfmove_clock: u16,

    /// Starts at 1, incremented after Black moves.
    pub fullmove_number: u16,
}

impl Board {
    fn empty() -> Self {
        Board {
            squares: [None; 64],
            king_squares: [Square(4), Square(60)],
            side_to_move: Color::White,
            castling_rights: CastlingRights::NONE,
            en_passant: None,
            halfmove_clock: 0,
            fullmove_number: 1,
        }
    }

    /// Standard starting position.
    pub fn starting() -> Self {
        Self::from_fen(STARTING_FEN).expect("starting FEN is always valid")
    }

    // -----------------------------------------------------------------------
    // Piece manipulation (low-level)
    // -----------------------------------------------------------------------

    /// Place a piece on an empty square.
    #[inline]
    fn put_piece(&mut self, sq: Square, piece: Piece) {
        debug_assert!(self.squares[sq.index()].is_none(), "{sq} is occupied");
        self.squares[sq.index()] = Some(piece);
        if piece.kind == PieceKind::King {
            self.king_squares[piece.color.index()] = sq;
        }
    }

    /// Take whatever stands on `sq` off the board.
    #[inline]
    fn remove_piece(&mut self, sq: Square) -> Option<Piece> {
        self.squares[sq.index()].take()
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    #[inline]
    pub fn piece_at(&self, sq: Square) -> Option<Piece> {
        self.squares[sq.index()]
    }

    #[inline]
    pub fn king_square(&self, color: Color) -> Square {
        self.king_squares[color.index()]
    }

    /// Every occupied square with its piece, a1 first.
    pub fn pieces(&self) -> impl Iterator<Item = (Square, Piece)> + '_ {
        Square::all().filter_map(|sq| self.piece_at(sq).map(|p| (sq, p)))
    }

    /// 8×8 grid for rendering: row 0 is rank 8, column 0 is the a-file.
    pub fn grid(&self) -> [[Option<Piece>; 8]; 8] {
        let mut grid = [[None; 8]; 8];
        for (row, cells) in grid.iter_mut().enumerate() {
            for (file, cell) in cells.iter_mut().enumerate() {
                *cell = self.piece_at(Square::from_file_rank(file as u8, 7 - row as u8));
            }
        }
        grid
    }

    pub fn is_square_attacked(&self, sq: Square, by: Color) -> bool {
        attacks::is_square_attacked(self, sq, by)
    }

    /// Is the side-to-move's king currently in check?
    #[inline]
    pub fn is_in_check(&self) -> bool {
        self.is_color_in_check(self.side_to_move)
    }

    #[inline]
    pub fn is_color_in_check(&self, color: Color) -> bool {
        self.is_square_attacked(self.king_square(color), !color)
    }

    pub fn position_key(&self) -> PositionKey {
        PositionKey {
            squares: self.squares,
            side_to_move: self.side_to_move,
            castling_rights: self.castling_rights,
            en_passant: self.en_passant,
        }
    }

    /// Verify the king cache agrees with the grid and each side has one king.
    #[cfg(any(debug_assertions, test))]
    pub fn assert_consistent(&self) {
        for color in [Color::White, Color::Black] {
            let king = Piece::new(PieceKind::King, color);
            let kings: Vec<Square> = self
                .pieces()
                .filter(|&(_, p)| p == king)
                .map(|(sq, _)| sq)
                .collect();
            assert_eq!(kings, vec![self.king_square(color)], "{color} king cache");
        }
    }

    // -----------------------------------------------------------------------
    // Make / unmake
    // -----------------------------------------------------------------------

    /// Apply a pseudo-legal move and return what it overwrote.
    ///
    /// Special moves are recognised from geometry (a king travelling two
    /// files castles, a pawn landing diagonally on an empty square captures
    /// en passant), so the flags only need to be descriptive.
    pub fn make_move(&mut self, mv: Move) -> UndoRecord {
        let us = self.side_to_move;
        let them = !us;

        let mut undo = UndoRecord {
            captured: None,
            castling_rights: self.castling_rights,
            en_passant: self.en_passant,
            halfmove_clock: self.halfmove_clock,
            fullmove_number: self.fullmove_number,
        };

        let moving = self.expect_piece(mv.from);
        self.remove_piece(mv.from);

        // ---- Capture ----
        if let Some(victim) = self.remove_piece(mv.to) {
            undo.captured = Some((victim, mv.to));
        } else if moving.kind == PieceKind::Pawn && mv.from.file() != mv.to.file() {
            let cap_sq = Square::from_file_rank(mv.to.file(), mv.from.rank());
            undo.captured = self.remove_piece(cap_sq).map(|p| (p, cap_sq));
        }

        // ---- Land (promoting if requested) ----
        let landing = mv.promotion.map_or(moving, |kind| Piece::new(kind, us));
        self.put_piece(mv.to, landing);

        // ---- Castling: bring the rook across ----
        if is_castle(moving, mv) {
            let (rook_from, rook_to) = castle_rook_squares(mv.to);
            if let Some(rook) = self.remove_piece(rook_from) {
                self.put_piece(rook_to, rook);
            }
        }

        // ---- Castling rights ----
        if moving.kind == PieceKind::King {
            self.castling_rights.clear_color(us);
        }
        self.castling_rights.clear_rook_square(mv.from);
        self.castling_rights.clear_rook_square(mv.to);

        // ---- En passant target ----
        self.en_passant = if moving.kind == PieceKind::Pawn && mv.from.rank().abs_diff(mv.to.rank()) == 2 {
            mv.from.offset(0, us.forward())
        } else {
            None
        };

        // ---- Clocks ----
        if moving.kind == PieceKind::Pawn || undo.captured.is_some() {
            self.halfmove_clock = 0;
        } else {
            self.halfmove_clock = self.halfmove_clock.saturating_add(1);
        }
        if us == Color::Black {
            self.fullmove_number = self.fullmove_number.saturating_add(1);
        }

        self.side_to_move = them;
        undo
    }

    /// Reverse a move previously applied with `make_move`.
    pub fn unmake_move(&mut self, mv: Move, undo: &UndoRecord) {
        let us = !self.side_to_move;
        self.side_to_move = us;

        let landed = self.expect_piece(mv.to);
        self.remove_piece(mv.to);
        let original = if mv.promotion.is_some() {
            Piece::new(PieceKind::Pawn, us)
        } else {
            landed
        };
        self.put_piece(mv.from, original);

        if is_castle(original, mv) {
            let (rook_from, rook_to) = castle_rook_squares(mv.to);
            if let Some(rook) = self.remove_piece(rook_to) {
                self.put_piece(rook_from, rook);
            }
        }

        if let Some((victim, sq)) = undo.captured {
            self.put_piece(sq, victim);
        }

        self.castling_rights = undo.castling_rights;
        self.en_passant = undo.en_passant;
        self.halfmove_clock = undo.halfmove_clock;
        self.fullmove_number = undo.fullmove_number;
    }

    /// The piece on `sq`; callers only pass squares a generated move names.
    #[inline]
    fn expect_piece(&self, sq: Square) -> Piece {
        match self.piece_at(sq) {
            Some(piece) => piece,
            None => panic!("no piece on {sq} (board:\n{})", self.board_string()),
        }
    }

    // -----------------------------------------------------------------------
    // Board display (8×8 text grid)
    // -----------------------------------------------------------------------

    /// Render the board as an 8-line string (rank 8 at top).
    pub fn board_string(&self) -> String {
        let mut s = String::with_capacity(200);
        for rank in (0..8).rev() {
            s.push((b'1' + rank) as char);
            s.push(' ');
            for file in 0..8 {
                let ch = self
                    .piece_at(Square::from_file_rank(file, rank))
                    .map_or('.', Piece::to_char);
                s.push(ch);
                if file < 7 {
                    s.push(' ');
                }
            }
            s.push('\n');
        }
        s.push_str("  a b c d e f g h");
        s
    }
}

// ---------------------------------------------------------------------------
// Castling helpers
// ---------------------------------------------------------------------------

#[inline]
fn is_castle(piece: Piece, mv: Move) -> bool {
    piece.kind == PieceKind::King && mv.from.file().abs_diff(mv.to.file()) == 2
}

/// For a king destination after castling, return (rook_from, rook_to).
pub(crate) fn castle_rook_squares(king_to: Square) -> (Square, Square) {
    let rank = king_to.rank();
    if king_to.file() == 6 {
        (Square::from_file_rank(7, rank), Square::from_file_rank(5, rank))
    } else {
        (Square::from_file_rank(0, rank), Square::from_file_rank(3, rank))
    }
}

// ---------------------------------------------------------------------------
// FEN parsing & generation
// ---------------------------------------------------------------------------

fn invalid(msg: impl Into<String>) -> ChessError {
    ChessError::InvalidPosition(msg.into())
}

impl Board {
    /// Parse a FEN string into a `Board`.
    ///
    /// Rejects malformed fields and positions that could never arise in play:
    /// a missing or duplicated king, pawns on the first or last rank, or the
    /// side that just moved standing in check.
    pub fn from_fen(fen: &str) -> Result<Self, ChessError> {
        let fields: Vec<&str> = fen.split_whitespace().collect();
        if fields.len() != 6 {
            return Err(invalid(format!("expected 6 FEN fields, got {}", fields.len())));
        }

        let mut board = Board::empty();
        let mut king_counts = [0u32; 2];

        // ----- Field 1: Piece placement -----
        let ranks: Vec<&str> = fields[0].split('/').collect();
        if ranks.len() != 8 {
            return Err(invalid(format!("expected 8 ranks, got {}", ranks.len())));
        }

        for (rank_idx, rank_str) in ranks.iter().enumerate() {
            let rank = 7 - rank_idx as u8;
            let mut file: u8 = 0;
            for ch in rank_str.chars() {
                if file > 7 {
                    return Err(invalid(format!("too many squares in rank {}", rank + 1)));
                }
                if let Some(digit) = ch.to_digit(10) {
                    if !(1..=8).contains(&digit) {
                        return Err(invalid(format!("invalid empty count '{ch}' in rank {}", rank + 1)));
                    }
                    file += digit as u8;
                } else if let Some(piece) = Piece::from_char(ch) {
                    if piece.kind == PieceKind::Pawn && (rank == 0 || rank == 7) {
                        return Err(invalid(format!("pawn on back rank {}", rank + 1)));
                    }
                    if piece.kind == PieceKind::King {
                        king_counts[piece.color.index()] += 1;
                    }
                    board.put_piece(Square::from_file_rank(file, rank), piece);
                    file += 1;
                } else {
                    return Err(invalid(format!("invalid character '{ch}' in piece placement")));
                }
            }
            if file != 8 {
                return Err(invalid(format!(
                    "rank {} has {} squares instead of 8",
                    rank + 1,
                    file
                )));
            }
        }

        for color in [Color::White, Color::Black] {
            let count = king_counts[color.index()];
            if count != 1 {
                return Err(invalid(format!("{color} has {count} kings (expected 1)")));
            }
        }

        // ----- Field 2: Side to move -----
        board.side_to_move = match fields[1] {
            "w" => Color::White,
            "b" => Color::Black,
            other => return Err(invalid(format!("invalid side to move: '{other}'"))),
        };

        // ----- Field 3: Castling availability -----
        board.castling_rights = CastlingRights::from_fen(fields[2])
            .ok_or_else(|| invalid(format!("invalid castling string: '{}'", fields[2])))?;

        // ----- Field 4: En passant target square -----
        if fields[3] != "-" {
            let ep_sq = Square::from_algebraic(fields[3])
                .ok_or_else(|| invalid(format!("invalid en passant square: '{}'", fields[3])))?;
            board.check_en_passant(ep_sq)?;
            board.en_passant = Some(ep_sq);
        }

        // ----- Field 5: Halfmove clock -----
        board.halfmove_clock = fields[4]
            .parse::<u16>()
            .map_err(|_| invalid(format!("invalid halfmove clock: '{}'", fields[4])))?;

        // ----- Field 6: Fullmove number -----
        board.fullmove_number = fields[5]
            .parse::<u16>()
            .map_err(|_| invalid(format!("invalid fullmove number: '{}'", fields[5])))?;
        if board.fullmove_number == 0 {
            return Err(invalid("fullmove number must be >= 1"));
        }

        if board.is_color_in_check(!board.side_to_move) {
            return Err(invalid(format!(
                "{} is in check but it is {}'s turn",
                !board.side_to_move, board.side_to_move
            )));
        }

        Ok(board)
    }

    /// The target must sit behind a pawn of the side that just moved, with
    /// both the target and the pawn's start square empty.
    fn check_en_passant(&self, ep_sq: Square) -> Result<(), ChessError> {
        let mover = !self.side_to_move;
        let target_rank = match mover {
            Color::White => 2,
            Color::Black => 5,
        };
        if ep_sq.rank() != target_rank {
            return Err(invalid(format!(
                "en passant square {ep_sq} is not on rank {} with {} to move",
                target_rank + 1,
                self.side_to_move
            )));
        }

        let pawn_sq = ep_sq.offset(0, mover.forward());
        let start_sq = ep_sq.offset(0, -mover.forward());
        let pawn_in_place = pawn_sq
            .and_then(|sq| self.piece_at(sq))
            .is_some_and(|p| p == Piece::new(PieceKind::Pawn, mover));
        let path_clear = self.piece_at(ep_sq).is_none()
            && start_sq.is_some_and(|sq| self.piece_at(sq).is_none());
        if !pawn_in_place || !path_clear {
            return Err(invalid(format!(
                "en passant square {ep_sq} does not follow a {mover} double push"
            )));
        }
        Ok(())
    }

    /// Export the position as a FEN string.
    pub fn to_fen(&self) -> String {
        let mut fen = String::with_capacity(80);

        for rank in (0..8).rev() {
            let mut empty_count = 0u8;
            for file in 0..8 {
                match self.piece_at(Square::from_file_rank(file, rank)) {
                    Some(piece) => {
                        if empty_count > 0 {
                            fen.push((b'0' + empty_count) as char);
                            empty_count = 0;
                        }
                        fen.push(piece.to_char());
                    }
                    None => empty_count += 1,
                }
            }
            if empty_count > 0 {
                fen.push((b'0' + empty_count) as char);
            }
            if rank > 0 {
                fen.push('/');
            }
        }

        fen.push(' ');
        fen.push(match self.side_to_move {
            Color::White => 'w',
            Color::Black => 'b',
        });

        fen.push(' ');
        fen.push_str(&self.castling_rights.to_fen());

        fen.push(' ');
        match self.en_passant {
            Some(sq) => fen.push_str(&sq.to_algebraic()),
            None => fen.push('-'),
        }

        fen.push_str(&format!(" {} {}", self.halfmove_clock, self.fullmove_number));
        fen
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::starting()
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.board_string())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
