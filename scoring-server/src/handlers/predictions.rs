//! Dashboard read handlers

use axum::{extract::{Query, State}, Json};
use serde::Deserialize;

use fraud_core::{PredictionRecord, PredictionSummary};

use crate::{AppResult, AppState};

#[derive(Debug, Default, Deserialize)]
pub struct WindowQuery {
    pub limit: Option<usize>,
}

/// Most recent predictions, newest first
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<WindowQuery>,
) -> AppResult<Json<Vec<PredictionRecord>>> {
    let limit = state.config.window(query.limit);
    let store = state.service.store().clone();

    let records = tokio::task::spawn_blocking(move || store.recent(limit)).await??;
    Ok(Json(records))
}

/// KPIs over the most recent predictions
pub async fn summary(
    State(state): State<AppState>,
    Query(query): Query<WindowQuery>,
) -> AppResult<Json<PredictionSummary>> {
    let limit = state.config.window(query.limit);
    let store = state.service.store().clone();

    let summary = tokio::task::spawn_blocking(move || store.summary(limit)).await??;
    Ok(Json(summary))
}
