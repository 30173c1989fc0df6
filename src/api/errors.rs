use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::engine::ChessError;

/// Errors returned by the HTTP layer, rendered as
/// `{"error": {"code", "message"}}`.
#[derive(Debug)]
pub enum ApiError {
    GameNotFound(String),
    IllegalMove(ChessError),
    InvalidPosition(ChessError),
    InvalidRequest(String),
    GameOver(String),
    NoHistory,
    NothingToRedo,
    InternalError(String),
}

impl ApiError {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::GameNotFound(_) => "GAME_NOT_FOUND",
            ApiError::IllegalMove(_) => "ILLEGAL_MOVE",
            ApiError::InvalidPosition(_) => "INVALID_POSITION",
            ApiError::InvalidRequest(_) => "INVALID_REQUEST",
            ApiError::GameOver(_) => "GAME_OVER",
            ApiError::NoHistory => "NO_HISTORY",
            ApiError::NothingToRedo => "NOTHING_TO_REDO",
            ApiError::InternalError(_) => "INTERNAL_ERROR",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::GameNotFound(_) => StatusCode::NOT_FOUND,
            ApiError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        }
    }

    fn message(&self) -> String {
        match self {
            ApiError::GameNotFound(id) => format!("Game not found: {id}"),
            ApiError::IllegalMove(err) | ApiError::InvalidPosition(err) => err.to_string(),
            ApiError::InvalidRequest(msg)
            | ApiError::GameOver(msg)
            | ApiError::InternalError(msg) => msg.clone(),
            ApiError::NoHistory => ChessError::NoHistory.to_string(),
            ApiError::NothingToRedo => ChessError::NothingToRedo.to_string(),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: &'static str,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let message = self.message();
        if let ApiError::InternalError(_) = self {
            tracing::error!(%message, "internal error");
        }
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code(),
                message,
            },
        };
        (self.status(), Json(body)).into_response()
    }
}

impl From<ChessError> for ApiError {
    fn from(err: ChessError) -> Self {
        match err {
            ChessError::IllegalMove { .. } => ApiError::IllegalMove(err),
            ChessError::InvalidPosition(_) => ApiError::InvalidPosition(err),
            ChessError::InvalidSquare(_) | ChessError::InvalidPromotion(_) => {
                ApiError::InvalidRequest(err.to_string())
            }
            ChessError::GameOver(_) => ApiError::GameOver(err.to_string()),
            ChessError::NoHistory => ApiError::NoHistory,
            ChessError::NothingToRedo => ApiError::NothingToRedo,
        }
    }
}
