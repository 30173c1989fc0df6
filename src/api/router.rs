use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::handlers;
use super::state::SharedState;

/// Build the Axum router with all routes and middleware.
pub fn create_router(state: SharedState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handlers::health))
        // Game lifecycle
        .route("/api/games", post(handlers::create_game))
        .route(
            "/api/games/{id}",
            get(handlers::get_game).delete(handlers::delete_game),
        )
        // Moves and history
        .route("/api/games/{id}/legal-moves", get(handlers::legal_moves))
        .route("/api/games/{id}/moves", post(handlers::make_move))
        .route("/api/games/{id}/undo", post(handlers::undo_move))
        .route("/api/games/{id}/redo", post(handlers::redo_move))
        // Advisor
        .route("/api/games/{id}/ai-move", post(handlers::ai_move))
        .route("/api/games/{id}/ai-hint", post(handlers::ai_hint))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
