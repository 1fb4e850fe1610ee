//! Scoring handler

use std::sync::Arc;
use std::time::Instant;

use axum::{extract::{rejection::JsonRejection, State}, Json};
use chrono::Utc;

use fraud_core::{Transaction, Verdict};

use crate::{AppError, AppResult, AppState};

/// Score one transaction
pub async fn predict(
    State(state): State<AppState>,
    payload: Result<Json<Transaction>, JsonRejection>,
) -> AppResult<Json<Verdict>> {
    let received_at = Utc::now();
    let started = Instant::now();
    let Json(transaction) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;

    // SQLite insert and inference are synchronous
    let service = Arc::clone(&state.service);
    let verdict = tokio::task::spawn_blocking(move || {
        service.score_received(&transaction, received_at, started)
    })
    .await??;

    Ok(Json(verdict))
}
