use std::path::Path;
use std::sync::Arc;
use std::thread;
use std::time::{Duration as StdDuration, Instant};

use chrono::{Duration, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tempfile::{tempdir, TempDir};

use super::*;
use crate::config::FraudConfig;
use crate::logic::dataset::{LabeledDataset, SplitConfig};
use crate::logic::features::{FeatureError, FeatureLayout, Transaction};
use crate::logic::model::{save_model, DecisionThreshold, DenseNetwork, FraudClassifier, InferenceError, ModelArtifact};
use crate::logic::preprocessing::{prepare, save_scaler, StandardScaler};
use crate::logic::store::{PredictionStore, StoreError};

/// Returns the same score for every input
struct FixedClassifier {
    dim: usize,
    score: f64,
}

impl FraudClassifier for FixedClassifier {
    fn input_dim(&self) -> usize {
        self.dim
    }

    fn predict_proba(&self, _features: &[f64]) -> Result<f64, InferenceError> {
        Ok(self.score)
    }
}

fn fitted_scaler(seed: u64) -> StandardScaler {
    let layout = FeatureLayout::new(vec!["Amount".into(), "V1".into(), "V2".into()]).unwrap();
    let rows: Vec<Vec<f64>> = (0..40)
        .map(|i| vec![i as f64 * 3.5, (i % 7) as f64 - 3.0, (i % 5) as f64 * 0.5])
        .collect();
    let labels = (0..40).map(|i| (i % 10 == 0) as u8).collect();
    let dataset = LabeledDataset::new(layout, rows, labels).unwrap();

    let config = SplitConfig {
        test_size: 0.2,
        val_size: 0.2,
        seed,
    };
    prepare(&dataset, &config).unwrap().scaler
}

fn transaction() -> Transaction {
    Transaction::from_pairs([("Amount", 120.0), ("V1", -1.5), ("V2", 0.75)])
}

fn service_with(dir: &TempDir, score: f64, threshold: f64) -> ScoringService {
    let store = PredictionStore::open(dir.path().join("predictions.db")).unwrap();
    store.init().unwrap();

    ScoringService::from_parts(
        fitted_scaler(42),
        Box::new(FixedClassifier { dim: 3, score }),
        DecisionThreshold::new(threshold).unwrap(),
        store,
    )
    .unwrap()
}

fn write_artifacts(dir: &Path, model_seed: u64, scaler_seed: u64) -> FraudConfig {
    let mut config = FraudConfig::default();
    config.data.scaler_path = dir.join("models").join("scaler.json");
    config.model.save_path = dir.join("models").join("fraud_model.json");
    config.data.db_path = dir.join("data").join("database.db");

    let trained_with = fitted_scaler(model_seed);
    let mut rng = StdRng::seed_from_u64(1);
    let network = DenseNetwork::new(3, &[4], 0.0, &mut rng);
    save_model(&ModelArtifact::new(network, &trained_with), &config.model.save_path).unwrap();
    save_scaler(&fitted_scaler(scaler_seed), &config.data.scaler_path).unwrap();

    config
}

#[test]
fn test_fraud_verdict_is_persisted() {
    let dir = tempdir().unwrap();
    let service = service_with(&dir, 0.9, 0.5);

    let verdict = service.score(&transaction()).unwrap();
    assert_eq!(verdict.fraud_score, 0.9);
    assert!(verdict.is_fraud);
    assert!(verdict.alert);

    let records = service.store().recent(10).unwrap();
    assert_eq!(records.len(), 1);
    assert!(records[0].is_fraud);
    assert_eq!(records[0].prediction_score, 0.9);
    assert_eq!(records[0].input_data, r#"{"Amount":120.0,"V1":-1.5,"V2":0.75}"#);
}

#[test]
fn test_threshold_boundary() {
    let dir = tempdir().unwrap();

    let at = service_with(&dir, 0.5, 0.5).score(&transaction()).unwrap();
    assert!(!at.is_fraud);
    assert!(!at.alert);

    let above = service_with(&dir, 0.50001, 0.5).score(&transaction()).unwrap();
    assert!(above.is_fraud);
}

#[test]
fn test_each_call_writes_one_row() {
    let dir = tempdir().unwrap();
    let service = service_with(&dir, 0.2, 0.5);

    let before = Utc::now() - Duration::microseconds(1);
    for _ in 0..5 {
        service.score(&transaction()).unwrap();
    }
    let after = Utc::now();

    let records = service.store().recent(100).unwrap();
    assert_eq!(records.len(), 5);
    for record in &records {
        assert!(record.latency_ms >= 0.0);
        assert!(record.timestamp >= before && record.timestamp <= after);
        assert!(!record.is_fraud);
    }
}

#[test]
fn test_latency_counts_from_request_receipt() {
    let dir = tempdir().unwrap();
    let service = service_with(&dir, 0.3, 0.5);

    let received_at = Utc::now() - Duration::milliseconds(40);
    let started = Instant::now().checked_sub(StdDuration::from_millis(40)).unwrap();
    service.score_received(&transaction(), received_at, started).unwrap();

    let record = &service.store().recent(1).unwrap()[0];
    assert!(record.latency_ms >= 40.0);
    assert!((record.timestamp - received_at).num_microseconds().unwrap().abs() <= 1);
}

#[test]
fn test_start_ignores_trainer_settings() {
    let dir = tempdir().unwrap();
    let mut config = write_artifacts(dir.path(), 42, 42);
    config.model.epochs = 0;
    config.model.dropout = 2.0;
    config.data.test_size = 0.0;

    assert!(ScoringService::start(&config).is_ok());

    config.training.threshold = 1.5;
    assert!(matches!(ScoringService::start(&config), Err(StartupError::Config(_))));
}

#[test]
fn test_concurrent_scoring() {
    let dir = tempdir().unwrap();
    let service = Arc::new(service_with(&dir, 0.7, 0.5));

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let service = Arc::clone(&service);
            thread::spawn(move || {
                for _ in 0..10 {
                    service.score(&transaction()).unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(service.store().count().unwrap(), 40);
}

#[test]
fn test_missing_feature_writes_nothing() {
    let dir = tempdir().unwrap();
    let service = service_with(&dir, 0.9, 0.5);

    let partial = Transaction::from_pairs([("Amount", 120.0), ("V1", -1.5)]);
    let err = service.score(&partial).unwrap_err();

    assert!(matches!(err, ScoringError::Transform(FeatureError::MissingFeature(_))));
    assert_eq!(err.stage(), "transform");
    assert_eq!(service.store().count().unwrap(), 0);
}

#[test]
fn test_unknown_feature_rejected() {
    let dir = tempdir().unwrap();
    let service = service_with(&dir, 0.9, 0.5);

    let mut extra = transaction();
    extra.insert("Merchant", 3.0);

    assert!(matches!(service.score(&extra), Err(ScoringError::Transform(_))));
    assert_eq!(service.store().count().unwrap(), 0);
}

#[test]
fn test_out_of_range_score_is_inference_error() {
    let dir = tempdir().unwrap();
    let service = service_with(&dir, 1.5, 0.5);

    let err = service.score(&transaction()).unwrap_err();
    assert!(matches!(err, ScoringError::Inference(InferenceError::InvalidScore(_))));
    assert_eq!(err.stage(), "inference");
    assert_eq!(service.store().count().unwrap(), 0);
}

#[test]
fn test_persistence_failure_is_reported() {
    let dir = tempdir().unwrap();
    let service = service_with(&dir, 0.9, 0.5);

    rusqlite::Connection::open(service.store().path())
        .unwrap()
        .execute_batch("DROP TABLE predictions")
        .unwrap();

    let err = service.score(&transaction()).unwrap_err();
    assert!(matches!(err, ScoringError::Persistence(StoreError::Sqlite(_))));
    assert_eq!(err.stage(), "persistence");
}

#[test]
fn test_from_parts_rejects_dimension_mismatch() {
    let dir = tempdir().unwrap();
    let store = PredictionStore::open(dir.path().join("predictions.db")).unwrap();

    let result = ScoringService::from_parts(
        fitted_scaler(42),
        Box::new(FixedClassifier { dim: 5, score: 0.1 }),
        DecisionThreshold::new(0.5).unwrap(),
        store,
    );
    assert!(matches!(result, Err(StartupError::Pairing(_))));
}

#[test]
fn test_start_with_paired_artifacts() {
    let dir = tempdir().unwrap();
    let config = write_artifacts(dir.path(), 42, 42);

    let service = ScoringService::start(&config).unwrap();
    assert_eq!(service.feature_count(), 3);
    assert_eq!(service.threshold().value(), 0.5);
    assert!(config.data.db_path.exists());

    let verdict = service.score(&transaction()).unwrap();
    assert!((0.0..=1.0).contains(&verdict.fraud_score));
    assert_eq!(service.store().count().unwrap(), 1);
}

#[test]
fn test_start_fails_without_model() {
    let dir = tempdir().unwrap();
    let config = write_artifacts(dir.path(), 42, 42);
    std::fs::remove_file(&config.model.save_path).unwrap();

    let result = ScoringService::start(&config);
    assert!(matches!(result, Err(StartupError::Model(_))));
}

#[test]
fn test_start_fails_without_scaler() {
    let dir = tempdir().unwrap();
    let config = write_artifacts(dir.path(), 42, 42);
    std::fs::remove_file(&config.data.scaler_path).unwrap();

    assert!(matches!(ScoringService::start(&config), Err(StartupError::Scaler(_))));
}

#[test]
fn test_start_rejects_foreign_scaler() {
    let dir = tempdir().unwrap();
    let config = write_artifacts(dir.path(), 42, 7);

    assert!(matches!(ScoringService::start(&config), Err(StartupError::Pairing(_))));
}
