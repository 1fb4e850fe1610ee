//! Fraud Core - preprocessing, training and scoring for card fraud detection
//!
//! The `preprocess` and `train` binaries produce the scaler and model
//! artifacts; `ScoringService` loads them and serves verdicts.

pub mod config;
pub mod constants;
pub mod logic;

pub use config::{ConfigError, FraudConfig};
pub use logic::features::{FeatureError, FeatureLayout, Transaction};
pub use logic::model::{DecisionThreshold, FraudClassifier, InferenceError};
pub use logic::scoring::{ScoringError, ScoringService, StartupError, Verdict};
pub use logic::store::{PredictionRecord, PredictionStore, PredictionSummary, StoreError};
