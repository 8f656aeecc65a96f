use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde_json::json;

use crate::engine::EngineError;

// ============================================================================
// API Errors - HTTP mapping of engine and access errors
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("Authentication required: {0}")]
    Unauthorized(String),

    #[error("Permission denied: {0}")]
    Forbidden(String),
}

impl ApiError {
    fn kind(&self) -> &'static str {
        match self {
            ApiError::Engine(e) => e.kind(),
            ApiError::Unauthorized(_) => "unauthorized",
            ApiError::Forbidden(_) => "forbidden",
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Engine(e) => match e {
                EngineError::Validation(_) | EngineError::InvalidStockLevel(_) => StatusCode::BAD_REQUEST,
                EngineError::InsufficientStock { .. } => StatusCode::CONFLICT,
                EngineError::InvalidTransition(_) => StatusCode::CONFLICT,
                EngineError::NotFound { .. } => StatusCode::NOT_FOUND,
                EngineError::ConcurrencyConflict { .. } => StatusCode::CONFLICT,
                EngineError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let retryable = matches!(self, ApiError::Engine(EngineError::ConcurrencyConflict { .. }));
        let message = match self {
            ApiError::Engine(EngineError::Storage(_)) => "An internal error occurred".to_string(),
            other => other.to_string(),
        };

        HttpResponse::build(self.status_code()).json(json!({
            "error": self.kind(),
            "message": message,
            "retryable": retryable,
        }))
    }
}
