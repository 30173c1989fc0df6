use serde::{Deserialize, Serialize};

use crate::engine::game::{Game, HistoryEntry};
use crate::engine::san::move_to_san;
use crate::engine::types::{ChessError, Move, Piece, PieceKind, Square};

// ---------------------------------------------------------------------------
// Request models
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateGameRequest {
    pub fen: Option<String>,
    pub ai_difficulty: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveRequest {
    pub from: String,
    pub to: String,
    pub promotion: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiMoveRequest {
    pub difficulty: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegalMovesQuery {
    pub from: Option<String>,
}

// ---------------------------------------------------------------------------
// Response models
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub engine: String,
    pub games: usize,
    pub uptime: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameResponse {
    pub id: String,
    /// Rank 8 first, a-file first within a rank.
    pub board: Vec<Vec<Option<PieceInfo>>>,
    pub fen: String,
    pub status: String,
    pub current_player: String,
    pub check: bool,
    pub move_history: Vec<MoveEntry>,
    pub can_undo: bool,
    pub can_redo: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_move: Option<MoveEntry>,
    pub ai_difficulty: String,
    pub created_at: String,
}

#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PieceInfo {
    #[serde(rename = "type")]
    pub piece_type: String,
    pub color: String,
}

#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct MoveEntry {
    pub from: String,
    pub to: String,
    pub san: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub promotion: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LegalMovesResponse {
    pub moves: Vec<MoveEntry>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AiMoveResponse {
    #[serde(rename = "move")]
    pub ai_move: MoveEntry,
    #[serde(flatten)]
    pub game: GameResponse,
    pub evaluation: i32,
    pub nodes: u64,
    pub thinking_time: u64,
    /// `false` when the search hit its deadline.
    pub completed: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HintResponse {
    pub hint: MoveEntry,
    pub evaluation: i32,
    pub depth: u32,
    pub thinking_time: u64,
}

// ---------------------------------------------------------------------------
// Conversion helpers
// ---------------------------------------------------------------------------

impl From<Piece> for PieceInfo {
    fn from(piece: Piece) -> Self {
        PieceInfo {
            piece_type: piece.kind.to_string(),
            color: piece.color.to_string(),
        }
    }
}

/// Parse an algebraic square ("e4").
pub fn parse_square(s: &str) -> Result<Square, ChessError> {
    Square::from_algebraic(s.trim()).ok_or_else(|| ChessError::InvalidSquare(s.to_string()))
}

/// Parse a promotion choice ("q", "queen", ...).
pub fn parse_promotion(s: &str) -> Result<PieceKind, ChessError> {
    PieceKind::from_promotion_str(s.trim()).ok_or_else(|| ChessError::InvalidPromotion(s.to_string()))
}

pub fn move_entry(mv: Move, san: String) -> MoveEntry {
    MoveEntry {
        from: mv.from.to_algebraic(),
        to: mv.to.to_algebraic(),
        san,
        promotion: mv.promotion.map(|kind| kind.to_string()),
    }
}

fn history_entry(entry: &HistoryEntry) -> MoveEntry {
    move_entry(entry.mv, entry.san.clone())
}

/// SAN-annotated entry for a move legal in the game's current position.
pub fn legal_move_entry(game: &Game, mv: Move, legal: &[Move]) -> MoveEntry {
    move_entry(mv, move_to_san(game.board(), mv, legal))
}

/// Build the 8×8 board array for the API response.
pub fn board_to_api(game: &Game) -> Vec<Vec<Option<PieceInfo>>> {
    game.grid()
        .iter()
        .map(|row| row.iter().map(|cell| cell.map(PieceInfo::from)).collect())
        .collect()
}

/// Convert internal Game to full API GameResponse.
pub fn game_to_response(game: &Game) -> GameResponse {
    GameResponse {
        id: game.id.clone(),
        board: board_to_api(game),
        fen: game.to_fen(),
        status: game.status().as_str().to_string(),
        current_player: game.side_to_move().to_string(),
        check: game.is_in_check(),
        move_history: game.move_history().iter().map(history_entry).collect(),
        can_undo: game.can_undo(),
        can_redo: game.can_redo(),
        last_move: game.last_move().map(history_entry),
        ai_difficulty: game.ai_difficulty.to_string(),
        created_at: game.created_at.to_rfc3339(),
    }
}
