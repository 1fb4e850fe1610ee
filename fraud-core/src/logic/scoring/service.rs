//! Scoring Service
//!
//! `Uninitialized -> Loading -> Ready`, or `Loading -> Failed`.
//! A `ScoringService` value only exists in the Ready state; it is
//! immutable afterwards and shared by reference across request handlers.

use std::fmt;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ScoringError, StartupError};
use crate::config::FraudConfig;
use crate::logic::artifact::ArtifactError;
use crate::logic::features::Transaction;
use crate::logic::model::{check_probability, load_model, DecisionThreshold, FraudClassifier};
use crate::logic::preprocessing::{load_scaler, StandardScaler};
use crate::logic::store::{NewPrediction, PredictionStore, StoreError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceState {
    Uninitialized,
    Loading,
    Ready,
    Failed,
}

impl fmt::Display for ServiceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ServiceState::Uninitialized => "uninitialized",
            ServiceState::Loading => "loading",
            ServiceState::Ready => "ready",
            ServiceState::Failed => "failed",
        };
        f.write_str(name)
    }
}

fn transition(from: ServiceState, to: ServiceState) {
    log::info!("Scoring service: {} -> {}", from, to);
}

/// Response for one scored transaction
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    pub fraud_score: f64,
    pub is_fraud: bool,
    /// Same as `is_fraud`; kept for dashboard clients
    pub alert: bool,
}

pub struct ScoringService {
    scaler: StandardScaler,
    model: Box<dyn FraudClassifier>,
    threshold: DecisionThreshold,
    store: PredictionStore,
}

impl fmt::Debug for ScoringService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScoringService")
            .field("features", &self.scaler.feature_count())
            .field("threshold", &self.threshold.value())
            .field("store", &self.store.path())
            .finish()
    }
}

impl ScoringService {
    /// Load artifacts and open the store. Fails fast on anything missing.
    pub fn start(config: &FraudConfig) -> Result<Self, StartupError> {
        transition(ServiceState::Uninitialized, ServiceState::Loading);

        match Self::load(config) {
            Ok(service) => {
                transition(ServiceState::Loading, ServiceState::Ready);
                Ok(service)
            }
            Err(e) => {
                log::error!("Startup failed: {}", e);
                transition(ServiceState::Loading, ServiceState::Failed);
                Err(e)
            }
        }
    }

    fn load(config: &FraudConfig) -> Result<Self, StartupError> {
        config.validate_serving()?;
        let threshold = DecisionThreshold::new(config.training.threshold)?;

        let store = PredictionStore::open(&config.data.db_path)?;
        store.init()?;

        log::info!("Loading scaler from {}", config.data.scaler_path.display());
        let scaler = load_scaler(&config.data.scaler_path).map_err(StartupError::Scaler)?;

        log::info!("Loading model from {}", config.model.save_path.display());
        let artifact = load_model(&config.model.save_path).map_err(StartupError::Model)?;
        artifact.verify_pairing(&scaler).map_err(StartupError::Pairing)?;

        log::info!(
            "Model ready: {} features, threshold {}, scaler {}",
            scaler.feature_count(),
            threshold.value(),
            &artifact.scaler_fingerprint[..artifact.scaler_fingerprint.len().min(12)]
        );

        Self::from_parts(scaler, Box::new(artifact.network), threshold, store)
    }

    /// Assemble a Ready service from already-loaded parts
    pub fn from_parts(
        scaler: StandardScaler,
        model: Box<dyn FraudClassifier>,
        threshold: DecisionThreshold,
        store: PredictionStore,
    ) -> Result<Self, StartupError> {
        if model.input_dim() != scaler.feature_count() {
            return Err(StartupError::Pairing(ArtifactError::Invalid(format!(
                "model expects {} features, scaler produces {}",
                model.input_dim(),
                scaler.feature_count()
            ))));
        }

        Ok(Self {
            scaler,
            model,
            threshold,
            store,
        })
    }

    /// Score one transaction and record it
    pub fn score(&self, transaction: &Transaction) -> Result<Verdict, ScoringError> {
        self.score_received(transaction, Utc::now(), Instant::now())
    }

    /// Score a transaction whose request arrived at `received_at` / `started`.
    ///
    /// Latency and the stored timestamp count from that point, so time spent
    /// waiting for a blocking thread is included.
    pub fn score_received(
        &self,
        transaction: &Transaction,
        received_at: DateTime<Utc>,
        started: Instant,
    ) -> Result<Verdict, ScoringError> {
        let features = self.scaler.transform(transaction)?;
        let fraud_score = self.model.predict_proba(&features).and_then(check_probability)?;
        let is_fraud = self.threshold.is_fraud(fraud_score);
        let latency_ms = started.elapsed().as_secs_f64() * 1000.0;

        let record = NewPrediction {
            timestamp: received_at,
            input_data: transaction.to_json().map_err(StoreError::from)?,
            prediction_score: fraud_score,
            is_fraud,
            latency_ms,
        };
        let id = self.store.insert(&record)?;

        if is_fraud {
            log::warn!("Fraud alert: prediction {} scored {:.4}", id, fraud_score);
        } else {
            log::debug!("Prediction {} scored {:.4} in {:.2}ms", id, fraud_score, latency_ms);
        }

        Ok(Verdict {
            fraud_score,
            is_fraud,
            alert: is_fraud,
        })
    }

    pub fn threshold(&self) -> DecisionThreshold {
        self.threshold
    }

    pub fn feature_count(&self) -> usize {
        self.scaler.feature_count()
    }

    pub fn feature_names(&self) -> &[String] {
        self.scaler.layout().names()
    }

    pub fn store(&self) -> &PredictionStore {
        &self.store
    }
}
