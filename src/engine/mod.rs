pub mod attacks;
pub mod board;
pub mod game;
pub mod movegen;
pub mod san;
pub mod types;

pub use board::{Board, STARTING_FEN, UndoRecord};
pub use game::{Game, HistoryEntry};
pub use movegen::{legal_moves, legal_moves_from};
pub use types::*;
