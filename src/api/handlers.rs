use std::time::Duration;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use tracing::info;

use crate::ai::{SearchOutcome, spawn_search};
use crate::engine::board::Board;
use crate::engine::game::Game;
use crate::engine::types::Difficulty;

use super::errors::ApiError;
use super::models::*;
use super::state::SharedState;

// =========================================================================
// Health
// =========================================================================

/// GET /health
pub async fn health(State(state): State<SharedState>) -> Json<HealthResponse> {
    let uptime = state.start_time.elapsed().as_secs();
    let games = state.games.read().await.len();
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        engine: env!("CARGO_PKG_NAME").to_string(),
        games,
        uptime,
    })
}

// =========================================================================
// Create Game
// =========================================================================

/// POST /api/games
pub async fn create_game(
    State(state): State<SharedState>,
    Json(input): Json<CreateGameRequest>,
) -> Result<(StatusCode, Json<GameResponse>), ApiError> {
    let mut game = match input.fen.as_deref() {
        Some(fen) => Game::from_fen(fen)?,
        None => Game::new(),
    };

    game.ai_difficulty = match input.ai_difficulty.as_deref() {
        Some(s) => parse_difficulty(s)?,
        None => state.config.default_difficulty,
    };

    let response = game_to_response(&game);
    info!(game = %game.id, status = %game.status(), "game created");
    state.games.write().await.insert(game.id.clone(), game);

    Ok((StatusCode::CREATED, Json(response)))
}

// =========================================================================
// Get / Delete Game
// =========================================================================

/// GET /api/games/:id
pub async fn get_game(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<GameResponse>, ApiError> {
    let games = state.games.read().await;
    let game = games
        .get(&id)
        .ok_or_else(|| ApiError::GameNotFound(id.clone()))?;
    Ok(Json(game_to_response(game)))
}

/// DELETE /api/games/:id
pub async fn delete_game(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<DeleteResponse>, ApiError> {
    let mut games = state.games.write().await;
    games
        .remove(&id)
        .ok_or_else(|| ApiError::GameNotFound(id.clone()))?;
    info!(game = %id, "game deleted");
    Ok(Json(DeleteResponse {
        success: true,
        message: "Game deleted".to_string(),
    }))
}

// =========================================================================
// Legal Moves
// =========================================================================

/// GET /api/games/:id/legal-moves
pub async fn legal_moves(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Query(query): Query<LegalMovesQuery>,
) -> Result<Json<LegalMovesResponse>, ApiError> {
    let games = state.games.read().await;
    let game = games
        .get(&id)
        .ok_or_else(|| ApiError::GameNotFound(id.clone()))?;

    let all_legal = game.legal_moves();
    let moves = match query.from.as_deref() {
        Some(from) => game.legal_moves_from(parse_square(from)?),
        None => all_legal.clone(),
    };

    let entries = moves
        .into_iter()
        .map(|mv| legal_move_entry(game, mv, &all_legal))
        .collect();

    Ok(Json(LegalMovesResponse { moves: entries }))
}

// =========================================================================
// Make Move
// =========================================================================

/// POST /api/games/:id/moves
pub async fn make_move(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Json(input): Json<MoveRequest>,
) -> Result<Json<GameResponse>, ApiError> {
    let from = parse_square(&input.from)?;
    let to = parse_square(&input.to)?;
    let promotion = input.promotion.as_deref().map(parse_promotion).transpose()?;

    let mut games = state.games.write().await;
    let game = games
        .get_mut(&id)
        .ok_or_else(|| ApiError::GameNotFound(id.clone()))?;

    let result = game.play(from, to, promotion)?;
    if result.is_game_over() {
        info!(game = %id, result = %result, "game finished");
    }

    Ok(Json(game_to_response(game)))
}

// =========================================================================
// Undo / Redo
// =========================================================================

/// POST /api/games/:id/undo
pub async fn undo_move(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<GameResponse>, ApiError> {
    let mut games = state.games.write().await;
    let game = games
        .get_mut(&id)
        .ok_or_else(|| ApiError::GameNotFound(id.clone()))?;

    game.undo_move()?;
    Ok(Json(game_to_response(game)))
}

/// POST /api/games/:id/redo
pub async fn redo_move(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<GameResponse>, ApiError> {
    let mut games = state.games.write().await;
    let game = games
        .get_mut(&id)
        .ok_or_else(|| ApiError::GameNotFound(id.clone()))?;

    game.redo_move()?;
    Ok(Json(game_to_response(game)))
}

// =========================================================================
// AI Move
// =========================================================================

/// POST /api/games/:id/ai-move
pub async fn ai_move(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    input: Option<Json<AiMoveRequest>>,
) -> Result<Json<AiMoveResponse>, ApiError> {
    // A bare POST falls back to the game's own difficulty.
    let input = input.map(|Json(r)| r).unwrap_or_default();
    // Snapshot the position; the search never touches the stored game.
    let (snapshot, difficulty) = {
        let games = state.games.read().await;
        let game = games
            .get(&id)
            .ok_or_else(|| ApiError::GameNotFound(id.clone()))?;
        ensure_in_progress(game)?;

        let difficulty = match input.difficulty.as_deref() {
            Some(s) => parse_difficulty(s)?,
            None => game.ai_difficulty,
        };
        (game.board().clone(), difficulty)
    };

    let outcome = run_search(&state, snapshot.clone(), difficulty.depth()).await?;
    let ai_mv = outcome
        .best_move
        .ok_or_else(|| ApiError::InternalError("search returned no move".into()))?;

    let mut games = state.games.write().await;
    let game = games
        .get_mut(&id)
        .ok_or_else(|| ApiError::GameNotFound(id.clone()))?;
    if game.board() != &snapshot {
        return Err(ApiError::InvalidRequest(
            "game changed while the AI was thinking".into(),
        ));
    }

    game.apply_move(ai_mv)?;
    let san = game
        .last_move()
        .map(|entry| entry.san.clone())
        .unwrap_or_else(|| ai_mv.to_string());

    info!(
        game = %id,
        difficulty = %difficulty,
        mv = %san,
        score = outcome.stats.score,
        completed = outcome.stats.completed,
        "ai move played"
    );

    Ok(Json(AiMoveResponse {
        ai_move: move_entry(ai_mv, san),
        game: game_to_response(game),
        evaluation: outcome.stats.score,
        nodes: outcome.stats.nodes,
        thinking_time: outcome.stats.time_ms,
        completed: outcome.stats.completed,
    }))
}

// =========================================================================
// AI Hint
// =========================================================================

/// POST /api/games/:id/ai-hint
///
/// Suggests a move for the side to move without changing the game.
pub async fn ai_hint(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<HintResponse>, ApiError> {
    let snapshot = {
        let games = state.games.read().await;
        let game = games
            .get(&id)
            .ok_or_else(|| ApiError::GameNotFound(id.clone()))?;
        ensure_in_progress(game)?;
        game.clone()
    };

    let depth = state.config.hint_depth;
    let outcome = run_search(&state, snapshot.board().clone(), depth).await?;

    let legal = snapshot.legal_moves();
    let hint = outcome
        .best_move
        .filter(|mv| legal.contains(mv))
        .ok_or_else(|| ApiError::InternalError("search returned no legal move".into()))?;

    Ok(Json(HintResponse {
        hint: legal_move_entry(&snapshot, hint, &legal),
        evaluation: outcome.stats.score,
        depth: outcome.stats.depth,
        thinking_time: outcome.stats.time_ms,
    }))
}

// =========================================================================
// Helpers
// =========================================================================

fn parse_difficulty(s: &str) -> Result<Difficulty, ApiError> {
    Difficulty::from_str_loose(s)
        .ok_or_else(|| ApiError::InvalidRequest(format!("invalid difficulty: {s}")))
}

fn ensure_in_progress(game: &Game) -> Result<(), ApiError> {
    if game.is_game_over() {
        return Err(ApiError::GameOver(format!(
            "game is already over: {}",
            game.status()
        )));
    }
    Ok(())
}

/// Search off the async runtime, bounded by the configured AI timeout.
async fn run_search(
    state: &SharedState,
    board: Board,
    depth: u32,
) -> Result<SearchOutcome, ApiError> {
    let timeout = Duration::from_millis(state.config.ai_timeout_ms);
    spawn_search(board, depth)
        .finish_within(timeout)
        .await
        .map_err(|e| ApiError::InternalError(format!("AI task failed: {e}")))
}

// =========================================================================
// Tests
// =========================================================================
