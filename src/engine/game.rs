//! Stateful game controller wrapping `Board`.
//!
//! `Game` validates and applies moves, keeps the undo/redo history and the
//! list of reached positions, and reclassifies the position after every
//! mutation (checkmate, stalemate, draws, check). It is the primary type the
//! API layer interacts with.

use chrono::{DateTime, Utc};
use tracing::debug;
use uuid::Uuid;

use crate::ai::engine::{AiEngine, DEFAULT_HINT_DEPTH, default_engine};
use crate::engine::board::{Board, PositionKey, UndoRecord};
use crate::engine::movegen;
use crate::engine::san;
use crate::engine::types::{
    ChessError, Color, Difficulty, DrawReason, GameResult, Move, Piece, PieceKind, Square,
};

// =========================================================================
// HistoryEntry
// =========================================================================

/// A played move together with what is needed to take it back.
#[derive(Clone, Debug)]
pub struct HistoryEntry {
    /// The move that was played.
    pub mv: Move,
    /// SAN computed when the move was played, with `+`/`#` suffix.
    pub san: String,
    undo: UndoRecord,
}

// =========================================================================
// Game
// =========================================================================

/// A chess game with history, undo/redo, and result tracking.
#[derive(Clone, Debug)]
pub struct Game {
    board: Board,
    history: Vec<HistoryEntry>,
    /// Undone moves, most recently undone last.
    redo_stack: Vec<Move>,
    /// Keys of every position reached, including the current one.
    position_keys: Vec<PositionKey>,
    status: GameResult,

    // Metadata
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub ai_difficulty: Difficulty,
}

impl Game {
    // -----------------------------------------------------------------
    // Constructors
    // -----------------------------------------------------------------

    /// Create a new game from the standard starting position.
    pub fn new() -> Self {
        Self::from_board(Board::starting())
    }

    /// Create a game from a FEN string.
    pub fn from_fen(fen: &str) -> Result<Self, ChessError> {
        Ok(Self::from_board(Board::from_fen(fen)?))
    }

    fn from_board(board: Board) -> Self {
        let mut game = Self {
            position_keys: vec![board.position_key()],
            board,
            history: Vec::new(),
            redo_stack: Vec::new(),
            status: GameResult::Ongoing,
            id: Uuid::new_v4().to_string(),
            created_at: Utc::now(),
            ai_difficulty: Difficulty::Medium,
        };
        game.status = game.compute_status();
        game
    }

    // -----------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------

    pub fn board(&self) -> &Board {
        &self.board
    }

    /// 8×8 grid, row 0 = rank 8.
    pub fn grid(&self) -> [[Option<Piece>; 8]; 8] {
        self.board.grid()
    }

    pub fn status(&self) -> &GameResult {
        &self.status
    }

    pub fn side_to_move(&self) -> Color {
        self.board.side_to_move
    }

    pub fn is_in_check(&self) -> bool {
        self.board.is_in_check()
    }

    pub fn is_game_over(&self) -> bool {
        self.status.is_game_over()
    }

    pub fn move_history(&self) -> &[HistoryEntry] {
        &self.history
    }

    pub fn last_move(&self) -> Option<&HistoryEntry> {
        self.history.last()
    }

    pub fn can_undo(&self) -> bool {
        !self.history.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn legal_moves(&self) -> Vec<Move> {
        movegen::legal_moves(&self.board)
    }

    /// Legal moves of the piece on `sq`; empty for an empty square or an
    /// opponent piece.
    pub fn legal_moves_from(&self, sq: Square) -> Vec<Move> {
        movegen::legal_moves_from(&self.board, sq)
    }

    pub fn to_fen(&self) -> String {
        self.board.to_fen()
    }

    // -----------------------------------------------------------------
    // Applying moves
    // -----------------------------------------------------------------

    /// Resolve a `(from, to)` request to a legal move. A promotion without
    /// an explicit piece promotes to a queen.
    pub fn find_move(
        &self,
        from: Square,
        to: Square,
        promotion: Option<PieceKind>,
    ) -> Result<Move, ChessError> {
        self.ensure_not_over()?;
        let promotion = promotion.or_else(|| {
            self.legal_moves_from(from)
                .iter()
                .any(|m| m.to == to && m.promotion.is_some())
                .then_some(PieceKind::Queen)
        });
        self.legal_moves_from(from)
            .into_iter()
            .find(|m| m.to == to && m.promotion == promotion)
            .ok_or_else(|| self.illegal(from, to))
    }

    /// `find_move` followed by `apply_move`.
    pub fn play(
        &mut self,
        from: Square,
        to: Square,
        promotion: Option<PieceKind>,
    ) -> Result<GameResult, ChessError> {
        let mv = self.find_move(from, to, promotion)?;
        self.apply_move(mv)
    }

    /// Play a move and return the new result. Clears the redo stack.
    ///
    /// The move is matched against the legal set by from, to and promotion;
    /// its flags are taken from the generated move. Nothing changes on error.
    pub fn apply_move(&mut self, mv: Move) -> Result<GameResult, ChessError> {
        let result = self.commit(mv)?;
        self.redo_stack.clear();
        Ok(result)
    }

    fn commit(&mut self, mv: Move) -> Result<GameResult, ChessError> {
        self.ensure_not_over()?;

        let legal = self.legal_moves();
        let Some(&mv) = legal
            .iter()
            .find(|m| m.from == mv.from && m.to == mv.to && m.promotion == mv.promotion)
        else {
            return Err(self.illegal(mv.from, mv.to));
        };

        let san = san::move_to_san(&self.board, mv, &legal);
        let undo = self.board.make_move(mv);
        self.history.push(HistoryEntry { mv, san, undo });
        self.position_keys.push(self.board.position_key());
        self.status = self.compute_status();

        debug!(game = %self.id, mv = %mv, status = %self.status, "move applied");
        Ok(self.status)
    }

    fn ensure_not_over(&self) -> Result<(), ChessError> {
        if self.status.is_game_over() {
            return Err(ChessError::GameOver(self.status.to_string()));
        }
        Ok(())
    }

    fn illegal(&self, from: Square, to: Square) -> ChessError {
        let reason = match self.board.piece_at(from) {
            None => "no piece on the source square".to_string(),
            Some(p) if p.color != self.board.side_to_move => {
                format!("it is {}'s turn", self.board.side_to_move)
            }
            Some(p) => format!("{} cannot move there", p.kind),
        };
        ChessError::IllegalMove {
            from: from.to_algebraic(),
            to: to.to_algebraic(),
            reason,
        }
    }

    // -----------------------------------------------------------------
    // Undo / redo
    // -----------------------------------------------------------------

    /// Take back the last move. Returns `false` if there is none.
    pub fn undo(&mut self) -> bool {
        self.undo_move().is_ok()
    }

    /// Take back the last move and return it.
    pub fn undo_move(&mut self) -> Result<Move, ChessError> {
        let entry = self.history.pop().ok_or(ChessError::NoHistory)?;
        self.position_keys.pop();
        self.board.unmake_move(entry.mv, &entry.undo);
        self.redo_stack.push(entry.mv);
        self.status = self.compute_status();

        debug!(game = %self.id, mv = %entry.mv, "move undone");
        Ok(entry.mv)
    }

    /// Replay the most recently undone move. Returns `false` if there is none.
    pub fn redo(&mut self) -> bool {
        self.redo_move().is_ok()
    }

    /// Replay the most recently undone move and return it.
    pub fn redo_move(&mut self) -> Result<Move, ChessError> {
        let mv = *self.redo_stack.last().ok_or(ChessError::NothingToRedo)?;
        self.commit(mv)?;
        self.redo_stack.pop();

        debug!(game = %self.id, mv = %mv, "move redone");
        Ok(mv)
    }

    // -----------------------------------------------------------------
    // Hints
    // -----------------------------------------------------------------

    /// Suggest a move for the side to move with the default engine.
    pub fn suggest_hint(&self) -> Option<Move> {
        self.suggest_hint_with(&default_engine(), DEFAULT_HINT_DEPTH)
    }

    /// Suggest a move with any engine. Never returns a move outside the legal
    /// set, and nothing once the game is over.
    pub fn suggest_hint_with(&self, engine: &dyn AiEngine, depth: u32) -> Option<Move> {
        if self.is_game_over() {
            return None;
        }
        let suggestion = engine.suggest(&self.board, depth)?;
        self.legal_moves().into_iter().find(|&m| m == suggestion)
    }

    // -----------------------------------------------------------------
    // Status detection
    // -----------------------------------------------------------------

    fn compute_status(&self) -> GameResult {
        let in_check = self.board.is_in_check();

        if !movegen::has_legal_move(&self.board) {
            return if in_check {
                GameResult::Checkmate
            } else {
                GameResult::Stalemate
            };
        }

        if self.board.halfmove_clock >= 100 {
            return GameResult::Draw(DrawReason::FiftyMoveRule);
        }

        if self.is_threefold_repetition() {
            return GameResult::Draw(DrawReason::ThreefoldRepetition);
        }

        if self.is_insufficient_material() {
            return GameResult::Draw(DrawReason::InsufficientMaterial);
        }

        if in_check {
            GameResult::Check
        } else {
            GameResult::Ongoing
        }
    }

    /// The current position has been reached three or more times.
    fn is_threefold_repetition(&self) -> bool {
        let Some(current) = self.position_keys.last() else {
            return false;
        };
        self.position_keys.iter().filter(|&k| k == current).count() >= 3
    }

    /// K vs K, K+minor vs K, or K+B vs K+B with bishops on same-coloured
    /// squares.
    fn is_insufficient_material(&self) -> bool {
        let mut minors: [Vec<(Square, PieceKind)>; 2] = [Vec::new(), Vec::new()];
        for (sq, piece) in self.board.pieces() {
            match piece.kind {
                PieceKind::King => {}
                PieceKind::Knight | PieceKind::Bishop => {
                    minors[piece.color.index()].push((sq, piece.kind));
                }
                PieceKind::Pawn | PieceKind::Rook | PieceKind::Queen => return false,
            }
        }

        match (minors[0].as_slice(), minors[1].as_slice()) {
            ([], []) | ([_], []) | ([], [_]) => true,
            ([(w, PieceKind::Bishop)], [(b, PieceKind::Bishop)]) => w.is_light() == b.is_light(),
            _ => false,
        }
    }
}

impl Default for Game {
    fn default() -> Self {
        Self::new()
    }
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

    fn play(g: &mut Game, from: &str, to: &str) -> GameResult {
        g.play(sq(from), sq(to), None).unwrap()
    }

    // -----------------------------------------------------------------
    // Construction
    // -----------------------------------------------------------------

    #[test]
    fn new_game_is_ongoing() {
        let g = Game::new();
        assert_eq!(*g.status(), GameResult::Ongoing);
        assert!(!g.is_game_over());
        assert_eq!(g.side_to_move(), Color::White);
        assert!(!g.can_undo());
        assert!(!g.can_redo());
        assert_eq!(g.legal_moves().len(), 20);
    }

    #[test]
    fn game_from_fen() {
        let g =
            Game::from_fen("rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1").unwrap();
        assert_eq!(g.side_to_move(), Color::Black);
    }

    #[test]
    fn game_from_invalid_fen() {
        assert!(matches!(
            Game::from_fen("invalid"),
            Err(ChessError::InvalidPosition(_))
        ));
    }

    #[test]
    fn game_from_fen_in_check() {
        let g = Game::from_fen("4k3/8/8/8/8/8/8/R3K2r w Q - 0 1").unwrap();
        assert_eq!(*g.status(), GameResult::Check);
        assert!(g.is_in_check());
    }

    // -----------------------------------------------------------------
    // Making moves
    // -----------------------------------------------------------------

    #[test]
    fn play_e2e4() {
        let mut g = Game::new();
        assert_eq!(play(&mut g, "e2", "e4"), GameResult::Ongoing);
        assert_eq!(g.side_to_move(), Color::Black);
        assert_eq!(g.move_history().len(), 1);
        assert_eq!(g.last_move().unwrap().san, "e4");
        assert!(g.last_move().unwrap().mv.flags.is_double_push());
    }

    #[test]
    fn apply_move_accepts_unflagged_move() {
        let mut g = Game::new();
        g.apply_move(Move::new(sq("e2"), sq("e4"))).unwrap();
        assert_eq!(g.board().en_passant, Some(sq("e3")));
    }

    #[test]
    fn illegal_move_leaves_game_untouched() {
        let mut g = Game::new();
        let before = g.to_fen();
        let err = g.apply_move(Move::new(sq("e2"), sq("e5"))).unwrap_err();
        assert!(matches!(err, ChessError::IllegalMove { .. }));
        assert_eq!(g.to_fen(), before);
        assert!(!g.can_undo());
    }

    #[test]
    fn moving_opponent_piece_is_illegal() {
        let mut g = Game::new();
        let err = g.play(sq("e7"), sq("e5"), None).unwrap_err();
        match err {
            ChessError::IllegalMove { reason, .. } => assert!(reason.contains("white")),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn promotion_defaults_to_queen() {
        let mut g = Game::from_fen("7k/4P3/8/8/8/8/8/4K3 w - - 0 1").unwrap();
        g.play(sq("e7"), sq("e8"), None).unwrap();
        assert_eq!(
            g.board().piece_at(sq("e8")),
            Some(Piece::new(PieceKind::Queen, Color::White))
        );
        assert_eq!(g.last_move().unwrap().san, "e8=Q+");
    }

    #[test]
    fn underpromotion_on_request() {
        let mut g = Game::from_fen("7k/4P3/8/8/8/8/8/4K3 w - - 0 1").unwrap();
        g.play(sq("e7"), sq("e8"), Some(PieceKind::Knight)).unwrap();
        assert_eq!(
            g.board().piece_at(sq("e8")),
            Some(Piece::new(PieceKind::Knight, Color::White))
        );
    }

    #[test]
    fn move_on_finished_game_errors() {
        // Fool's mate: 1. f3 e5 2. g4 Qh4#
        let mut g = Game::new();
        play(&mut g, "f2", "f3");
        play(&mut g, "e7", "e5");
        play(&mut g, "g2", "g4");
        assert_eq!(play(&mut g, "d8", "h4"), GameResult::Checkmate);
        assert!(g.is_game_over());
        assert!(g.legal_moves().is_empty());
        assert_eq!(g.last_move().unwrap().san, "Qh4#");

        let err = g.apply_move(Move::new(sq("e2"), sq("e4"))).unwrap_err();
        assert!(matches!(err, ChessError::GameOver(_)));
    }

    // -----------------------------------------------------------------
    // Undo / redo
    // -----------------------------------------------------------------

    #[test]
    fn undo_single_move() {
        let mut g = Game::new();
        let original = g.board().clone();
        play(&mut g, "e2", "e4");
        assert!(g.undo());
        assert_eq!(*g.board(), original);
        assert!(g.move_history().is_empty());
        assert!(g.can_redo());
    }

    #[test]
    fn undo_on_empty_history() {
        let mut g = Game::new();
        assert!(!g.undo());
        assert!(matches!(g.undo_move(), Err(ChessError::NoHistory)));
    }

    #[test]
    fn redo_replays_undone_moves() {
        let mut g = Game::new();
        play(&mut g, "e2", "e4");
        play(&mut g, "e7", "e5");
        let after_two = g.board().clone();
        assert!(g.undo());
        assert!(g.undo());
        assert!(g.redo());
        assert!(g.redo());
        assert!(!g.redo());
        assert_eq!(*g.board(), after_two);
        assert_eq!(g.move_history().len(), 2);
        assert!(matches!(g.redo_move(), Err(ChessError::NothingToRedo)));
    }

    #[test]
    fn new_move_clears_redo() {
        let mut g = Game::new();
        play(&mut g, "e2", "e4");
        g.undo();
        assert!(g.can_redo());
        play(&mut g, "d2", "d4");
        assert!(!g.can_redo());
    }

    #[test]
    fn undo_out_of_checkmate() {
        let mut g = Game::new();
        play(&mut g, "f2", "f3");
        play(&mut g, "e7", "e5");
        play(&mut g, "g2", "g4");
        play(&mut g, "d8", "h4");
        assert!(g.undo());
        assert_eq!(*g.status(), GameResult::Ongoing);
        assert_eq!(g.side_to_move(), Color::Black);
    }

    #[test]
    fn undo_restores_special_moves_exactly() {
        let mut g = Game::from_fen("r3k2r/1P6/8/3pP3/8/8/8/R3K2R w KQkq d6 0 20").unwrap();
        let mut snapshots = vec![g.board().clone()];
        // En passant, both castles, a rook move, capture-promotion.
        for (from, to) in [("e5", "d6"), ("e8", "g8"), ("e1", "c1"), ("f8", "f2"), ("b7", "a8")] {
            play(&mut g, from, to);
            snapshots.push(g.board().clone());
        }
        snapshots.pop();
        while let Some(expected) = snapshots.pop() {
            assert!(g.undo());
            assert_eq!(*g.board(), expected);
        }
        assert!(!g.can_undo());
    }

    // -----------------------------------------------------------------
    // Status detection
    // -----------------------------------------------------------------

    #[test]
    fn scholars_mate() {
        let mut g = Game::new();
        play(&mut g, "e2", "e4");
        play(&mut g, "e7", "e5");
        play(&mut g, "f1", "c4");
        play(&mut g, "b8", "c6");
        play(&mut g, "d1", "h5");
        play(&mut g, "g8", "f6");
        assert_eq!(play(&mut g, "h5", "f7"), GameResult::Checkmate);
        assert_eq!(g.last_move().unwrap().san, "Qxf7#");
    }

    #[test]
    fn check_is_reported() {
        let mut g = Game::new();
        play(&mut g, "e2", "e4");
        play(&mut g, "f7", "f6");
        assert_eq!(play(&mut g, "d1", "h5"), GameResult::Check);
        assert_eq!(g.last_move().unwrap().san, "Qh5+");
    }

    #[test]
    fn stalemate_detection() {
        let g = Game::from_fen("k7/2K5/1Q6/8/8/8/8/8 b - - 0 1").unwrap();
        assert_eq!(*g.status(), GameResult::Stalemate);
    }

    #[test]
    fn fifty_move_rule_detection() {
        let g = Game::from_fen("4k3/8/8/8/8/8/8/4K3 w - - 100 80").unwrap();
        assert_eq!(*g.status(), GameResult::Draw(DrawReason::FiftyMoveRule));
    }

    #[test]
    fn fifty_move_rule_reached_by_quiet_move() {
        let mut g = Game::from_fen("4k3/8/8/8/8/8/8/R3K3 w - - 99 60").unwrap();
        assert_eq!(*g.status(), GameResult::Ongoing);
        assert_eq!(
            play(&mut g, "a1", "a2"),
            GameResult::Draw(DrawReason::FiftyMoveRule)
        );
    }

    #[test]
    fn insufficient_material_cases() {
        for fen in [
            "4k3/8/8/8/8/8/8/4K3 w - - 0 1",
            "4k3/8/8/8/8/8/8/4KB2 w - - 0 1",
            "4k3/8/8/8/8/8/8/4KN2 w - - 0 1",
            "4kn2/8/8/8/8/8/8/4K3 w - - 0 1",
            // Both bishops on dark squares (c1, f8).
            "4kb2/8/8/8/8/8/8/2B1K3 w - - 0 1",
        ] {
            let g = Game::from_fen(fen).unwrap();
            assert_eq!(
                *g.status(),
                GameResult::Draw(DrawReason::InsufficientMaterial),
                "{fen}"
            );
        }
    }

    #[test]
    fn sufficient_material_cases() {
        for fen in [
            // Bishops on opposite colours (c1 dark, c8 light).
            "2b1k3/8/8/8/8/8/8/2B1K3 w - - 0 1",
            "4k3/8/8/8/8/8/4P3/4K3 w - - 0 1",
            "4k3/8/8/8/8/8/8/3NKN2 w - - 0 1",
            "4kn2/8/8/8/8/8/8/4KN2 w - - 0 1",
        ] {
            let g = Game::from_fen(fen).unwrap();
            assert_eq!(*g.status(), GameResult::Ongoing, "{fen}");
        }
    }

    #[test]
    fn threefold_repetition() {
        let mut g = Game::new();
        for round in 0..2 {
            play(&mut g, "g1", "f3");
            play(&mut g, "g8", "f6");
            play(&mut g, "f3", "g1");
            let status = play(&mut g, "f6", "g8");
            if round == 0 {
                assert_eq!(status, GameResult::Ongoing);
            }
        }
        assert_eq!(
            *g.status(),
            GameResult::Draw(DrawReason::ThreefoldRepetition)
        );
        assert!(g.undo());
        assert_eq!(*g.status(), GameResult::Ongoing);
    }

    #[test]
    fn repetition_draw_ignores_material() {
        let mut g = Game::from_fen("4k3/8/8/8/8/8/8/R3K3 w - - 0 1").unwrap();
        for _ in 0..2 {
            play(&mut g, "a1", "a2");
            play(&mut g, "e8", "d8");
            play(&mut g, "a2", "a1");
            play(&mut g, "d8", "e8");
        }
        assert_eq!(
            *g.status(),
            GameResult::Draw(DrawReason::ThreefoldRepetition)
        );
    }

    // -----------------------------------------------------------------
    // Hints
    // -----------------------------------------------------------------

    #[test]
    fn hint_is_legal() {
        let g = Game::new();
        let hint = g.suggest_hint().unwrap();
        assert!(g.legal_moves().contains(&hint));
    }

    #[test]
    fn hint_finds_mate() {
        let g = Game::from_fen("r1bqkb1r/pppp1ppp/2n2n2/4p2Q/2B1P3/8/PPPP1PPP/RNB1K1NR w KQkq - 4 4")
            .unwrap();
        let hint = g.suggest_hint().unwrap();
        assert_eq!((hint.from, hint.to), (sq("h5"), sq("f7")));
    }

    #[test]
    fn no_hint_after_game_over() {
        let g = Game::from_fen("k7/2K5/1Q6/8/8/8/8/8 b - - 0 1").unwrap();
        assert_eq!(g.suggest_hint(), None);
        let drawn = Game::from_fen("4k3/8/8/8/8/8/8/4K3 w - - 0 1").unwrap();
        assert_eq!(drawn.suggest_hint(), None);
    }

    struct IllegalEngine;

    impl AiEngine for IllegalEngine {
        fn suggest(&self, _board: &Board, _depth: u32) -> Option<Move> {
            Some(Move::new(Square(0), Square(63)))
        }

        fn name(&self) -> &str {
            "IllegalEngine"
        }
    }

    #[test]
    fn hint_filters_illegal_engine_output() {
        let g = Game::new();
        assert_eq!(g.suggest_hint_with(&IllegalEngine, 1), None);
    }

    // -----------------------------------------------------------------
    // Grid
    // -----------------------------------------------------------------

    #[test]
    fn grid_starting_position() {
        let grid = Game::new().grid();
        assert_eq!(grid[0][0], Some(Piece::new(PieceKind::Rook, Color::Black)));
        assert_eq!(grid[7][4], Some(Piece::new(PieceKind::King, Color::White)));
        assert_eq!(grid[3][0], None);
    }
}
