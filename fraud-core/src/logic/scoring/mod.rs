//! Scoring Module - Online fraud scoring
//!
//! Loads the paired scaler/model artifacts once, then turns each
//! transaction into a verdict and one persisted prediction record.

pub mod service;

#[cfg(test)]
mod tests;

use thiserror::Error;

use crate::config::ConfigError;
use crate::logic::artifact::ArtifactError;
use crate::logic::features::FeatureError;
use crate::logic::model::InferenceError;
use crate::logic::store::StoreError;

pub use service::{ScoringService, ServiceState, Verdict};

/// Failure while bringing the service to Ready
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("prediction store unavailable: {0}")]
    Store(#[from] StoreError),

    #[error("failed to load scaler: {0}")]
    Scaler(#[source] ArtifactError),

    #[error("failed to load model: {0}")]
    Model(#[source] ArtifactError),

    #[error("model and scaler do not belong together: {0}")]
    Pairing(#[source] ArtifactError),
}

/// Failure while scoring one transaction
#[derive(Debug, Error)]
pub enum ScoringError {
    #[error("invalid transaction: {0}")]
    Transform(#[from] FeatureError),

    #[error("inference failed: {0}")]
    Inference(#[from] InferenceError),

    /// Verdict was computed but the record was not stored
    #[error("failed to persist prediction: {0}")]
    Persistence(#[from] StoreError),
}

impl ScoringError {
    /// Pipeline stage that failed
    pub fn stage(&self) -> &'static str {
        match self {
            ScoringError::Transform(_) => "transform",
            ScoringError::Inference(_) => "inference",
            ScoringError::Persistence(_) => "persistence",
        }
    }
}
