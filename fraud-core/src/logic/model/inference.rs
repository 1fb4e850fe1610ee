//! Inference - classifier seam and the persisted model artifact
//!
//! The scoring service only sees `FraudClassifier`; the dense network is
//! one implementation, test doubles are another.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::metrics::EvaluationMetrics;
use super::network::DenseNetwork;
use crate::constants::ARTIFACT_FORMAT_VERSION;
use crate::logic::artifact::ArtifactError;
use crate::logic::preprocessing::StandardScaler;

// ============================================================================
// ERROR HANDLING
// ============================================================================

#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("model expects {expected} features, got {actual}")]
    InputDimension { expected: usize, actual: usize },

    #[error("model produced a non-probability score: {0}")]
    InvalidScore(f64),

    #[error("invalid model: {0}")]
    InvalidModel(String),

    #[error("inference backend error: {0}")]
    Backend(String),
}

// ============================================================================
// CLASSIFIER TRAIT
// ============================================================================

/// Binary fraud classifier over a scaled feature vector.
///
/// Implementations are read-only after construction and shared across
/// request handlers.
pub trait FraudClassifier: Send + Sync {
    /// Number of scaled features expected
    fn input_dim(&self) -> usize;

    /// Fraud probability in [0, 1]
    fn predict_proba(&self, features: &[f64]) -> Result<f64, InferenceError>;
}

// ============================================================================
// MODEL ARTIFACT
// ============================================================================

/// Trained model plus what it was trained against
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub format_version: u8,
    pub model_type: String,
    /// Layout hash of the scaler used during training
    pub layout_hash: u32,
    /// Fingerprint of the scaler used during training
    pub scaler_fingerprint: String,
    pub trained_at: DateTime<Utc>,
    pub network: DenseNetwork,
    /// Held-out test metrics recorded at training time
    #[serde(default)]
    pub metrics: Option<EvaluationMetrics>,
}

impl ModelArtifact {
    pub fn new(network: DenseNetwork, scaler: &StandardScaler) -> Self {
        Self {
            format_version: ARTIFACT_FORMAT_VERSION,
            model_type: "dense".to_string(),
            layout_hash: scaler.layout_hash(),
            scaler_fingerprint: scaler.fingerprint(),
            trained_at: Utc::now(),
            network,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: EvaluationMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn validate(&self) -> Result<(), ArtifactError> {
        if self.format_version != ARTIFACT_FORMAT_VERSION {
            return Err(ArtifactError::FormatVersion {
                expected: ARTIFACT_FORMAT_VERSION,
                actual: self.format_version,
            });
        }

        self.network
            .validate()
            .map_err(|e| ArtifactError::Invalid(e.to_string()))
    }

    /// Refuse to serve a model next to a scaler it was not trained with
    pub fn verify_pairing(&self, scaler: &StandardScaler) -> Result<(), ArtifactError> {
        if self.layout_hash != scaler.layout_hash() {
            return Err(ArtifactError::Invalid(format!(
                "model trained on feature layout {:08x}, scaler has {:08x}",
                self.layout_hash,
                scaler.layout_hash()
            )));
        }

        let fingerprint = scaler.fingerprint();
        if self.scaler_fingerprint != fingerprint {
            return Err(ArtifactError::Invalid(format!(
                "model trained with scaler {}, loaded scaler is {}",
                short(&self.scaler_fingerprint),
                short(&fingerprint)
            )));
        }

        let input_dim = self.network.input_dim();
        if input_dim != scaler.feature_count() {
            return Err(ArtifactError::Invalid(format!(
                "model expects {} features, scaler produces {}",
                input_dim,
                scaler.feature_count()
            )));
        }

        Ok(())
    }
}

fn short(fingerprint: &str) -> &str {
    fingerprint.get(..12).unwrap_or(fingerprint)
}

/// Reject NaN or out-of-range classifier output
pub fn check_probability(score: f64) -> Result<f64, InferenceError> {
    if score.is_finite() && (0.0..=1.0).contains(&score) {
        Ok(score)
    } else {
        Err(InferenceError::InvalidScore(score))
    }
}
