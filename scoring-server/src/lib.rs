//! Fraud Scoring Server
//!
//! HTTP front for the fraud scoring service.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    SCORING SERVER                           │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ┌───────────┐     ┌──────────────────┐    ┌─────────────┐  │
//! │  │  API      │ ──▶ │  ScoringService  │ ──▶│  SQLite     │  │
//! │  │  (Axum)   │     │  scaler + model  │    │  prediction │  │
//! │  │           │     │  (blocking pool) │    │  log        │  │
//! │  └───────────┘     └──────────────────┘    └──────┬──────┘  │
//! │        ▲                                          │         │
//! │        └────────── dashboard reads ───────────────┘         │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod error;
pub mod handlers;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::{
    cors::{CorsLayer, Any},
    trace::TraceLayer,
};

use fraud_core::ScoringService;

pub use config::Config;
pub use error::{AppError, AppResult};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<ScoringService>,
    pub config: Config,
}

impl AppState {
    pub fn new(service: ScoringService, config: Config) -> Self {
        Self {
            service: Arc::new(service),
            config,
        }
    }
}

/// Create the main router with all routes
pub fn create_router(state: AppState) -> Router {
    let scoring_routes = Router::new()
        .route("/health", get(handlers::health::check))
        .route("/predict", post(handlers::predict::predict));

    // Read-only dashboard API
    let dashboard_routes = Router::new()
        .route("/api/v1/predictions", get(handlers::predictions::list))
        .route("/api/v1/predictions/summary", get(handlers::predictions::summary));

    Router::new()
        .merge(scoring_routes)
        .merge(dashboard_routes)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        )
        .with_state(state)
}
