//! Error handling

use axum::{
    response::{IntoResponse, Response},
    http::StatusCode,
    Json,
};
use serde_json::json;

use fraud_core::{ScoringError, StoreError};

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug)]
pub enum AppError {
    // Request body could not be read as a transaction
    BadRequest(String),

    // Scoring pipeline errors
    Scoring(ScoringError),

    // Dashboard reads
    DatabaseError(String),

    // Generic errors
    InternalError(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            AppError::BadRequest(msg) => {
                tracing::warn!("Rejected request body: {}", msg);
                (StatusCode::BAD_REQUEST, json!({ "error": msg }))
            }
            AppError::Scoring(err) => scoring_response(err),
            AppError::DatabaseError(msg) => {
                tracing::error!("Database error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, json!({ "error": "Database error occurred" }))
            }
            AppError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, json!({ "error": "Internal server error" }))
            }
        };

        (status, Json(body)).into_response()
    }
}

fn scoring_response(err: &ScoringError) -> (StatusCode, serde_json::Value) {
    let stage = err.stage();
    match err {
        ScoringError::Transform(_) => {
            tracing::warn!("Transform failed: {}", err);
            (
                StatusCode::UNPROCESSABLE_ENTITY,
                json!({ "error": err.to_string(), "stage": stage }),
            )
        }
        ScoringError::Inference(_) => {
            tracing::error!("Inference failed: {}", err);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": err.to_string(), "stage": stage }),
            )
        }
        // The verdict is withheld: it was never recorded
        ScoringError::Persistence(_) => {
            tracing::error!("Persistence failed: {}", err);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": err.to_string(), "stage": stage, "persisted": false }),
            )
        }
    }
}

impl From<ScoringError> for AppError {
    fn from(err: ScoringError) -> Self {
        AppError::Scoring(err)
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        AppError::DatabaseError(err.to_string())
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(err: tokio::task::JoinError) -> Self {
        AppError::InternalError(format!("blocking task failed: {}", err))
    }
}
