use std::fs;

use tempfile::tempdir;

use super::{load_scaler, prepare, run_preprocessing, save_scaler, PipelineError, StandardScaler};
use crate::config::FraudConfig;
use crate::logic::artifact::ArtifactError;
use crate::logic::dataset::{split, DatasetError, LabeledDataset, SplitConfig};
use crate::logic::features::{FeatureError, FeatureLayout, Transaction};

const TOLERANCE: f64 = 1e-9;

fn layout() -> FeatureLayout {
    FeatureLayout::new(vec!["Time".into(), "V1".into(), "Amount".into()]).unwrap()
}

fn synthetic(n: usize) -> LabeledDataset {
    let rows = (0..n)
        .map(|i| vec![i as f64, ((i * 37) % 11) as f64 - 5.0, 3.0 + (i % 4) as f64 * 25.0])
        .collect();
    let labels = (0..n).map(|i| (i % 9 == 0) as u8).collect();
    LabeledDataset::new(layout(), rows, labels).unwrap()
}

fn split_config() -> SplitConfig {
    SplitConfig { test_size: 0.2, val_size: 0.25, seed: 42 }
}

fn assert_close(a: &[f64], b: &[f64]) {
    assert_eq!(a.len(), b.len());
    for (x, y) in a.iter().zip(b) {
        assert!((x - y).abs() < TOLERANCE, "{} != {}", x, y);
    }
}

/// Mean and population variance computed independently of the scaler
fn reference_stats(rows: &[Vec<f64>]) -> (Vec<f64>, Vec<f64>) {
    let n = rows.len() as f64;
    let dim = rows[0].len();
    let mean: Vec<f64> = (0..dim).map(|j| rows.iter().map(|r| r[j]).sum::<f64>() / n).collect();
    let var: Vec<f64> = (0..dim)
        .map(|j| rows.iter().map(|r| (r[j] - mean[j]).powi(2)).sum::<f64>() / n)
        .collect();
    (mean, var)
}

#[test]
fn test_fit_matches_reference_on_train_only() {
    let ds = synthetic(200);
    let splits = split(&ds, &split_config()).unwrap();
    let scaler = StandardScaler::fit(&splits.layout, &splits.train).unwrap();

    let (mean, var) = reference_stats(&splits.train.as_partition().rows);
    assert_close(scaler.mean(), &mean);
    assert_close(scaler.variance(), &var);
    assert_eq!(scaler.samples_seen(), splits.train.len());

    // Applying to test equals applying the reference parameters
    let transformed = scaler.transform_partition(&splits.test).unwrap();
    for (row, out) in splits.test.rows.iter().zip(&transformed) {
        let expected: Vec<f64> = row
            .iter()
            .enumerate()
            .map(|(j, x)| (x - mean[j]) / var[j].sqrt())
            .collect();
        assert_close(out, &expected);
    }
}

#[test]
fn test_perturbing_held_out_rows_does_not_change_fit() {
    let ds = synthetic(200);
    let baseline = split(&ds, &split_config()).unwrap();

    let mut perturbed = ds.clone();
    for &i in baseline.test.indices.iter().chain(&baseline.validation.indices) {
        for v in perturbed.rows[i].iter_mut() {
            *v = *v * 1000.0 + 12345.0;
        }
    }
    let perturbed_splits = split(&perturbed, &split_config()).unwrap();
    assert_eq!(perturbed_splits.test.indices, baseline.test.indices);

    let a = StandardScaler::fit(&baseline.layout, &baseline.train).unwrap();
    let b = StandardScaler::fit(&perturbed_splits.layout, &perturbed_splits.train).unwrap();

    assert_close(a.mean(), b.mean());
    assert_close(a.variance(), b.variance());
    assert_eq!(a.fingerprint(), b.fingerprint());
}

#[test]
fn test_prepare_uses_train_statistics_everywhere() {
    let ds = synthetic(200);
    let prepared = prepare(&ds, &split_config()).unwrap();

    // Train columns are centered and unit-variance after scaling
    for j in 0..3 {
        let col = prepared.train.features.column(j);
        let mean = col.mean().unwrap();
        let var = col.mapv(|x| (x - mean).powi(2)).mean().unwrap();
        assert!(mean.abs() < 1e-9);
        assert!((var - 1.0).abs() < 1e-9);
    }

    assert_eq!(prepared.train.len() + prepared.validation.len() + prepared.test.len(), 200);
    assert_eq!(prepared.test.features.ncols(), 3);
}

#[test]
fn test_constant_feature_scales_to_zero() {
    let rows = (0..20).map(|i| vec![7.0, i as f64, 1.0]).collect();
    let ds = LabeledDataset::new(layout(), rows, vec![0; 20]).unwrap();
    let splits = split(&ds, &split_config()).unwrap();
    let scaler = StandardScaler::fit(&splits.layout, &splits.train).unwrap();

    assert_eq!(scaler.scale()[0], 1.0);
    let out = scaler.transform_row(&[7.0, 3.0, 1.0]).unwrap();
    assert_eq!(out[0], 0.0);
    assert_eq!(out[2], 0.0);
}

#[test]
fn test_fit_rejects_overflowing_statistics() {
    // Finite inputs whose sum overflows
    let rows = (0..20).map(|i| vec![1e308, i as f64, 1.0]).collect();
    let ds = LabeledDataset::new(layout(), rows, vec![0; 20]).unwrap();
    let splits = split(&ds, &split_config()).unwrap();

    let result = StandardScaler::fit(&splits.layout, &splits.train);
    assert!(matches!(result, Err(FeatureError::NonFiniteStatistic(ref name)) if name == "Time"));

    // Finite mean, squared deviations overflow
    let rows = (0..20)
        .map(|i| vec![i as f64, 1.0, if i % 2 == 0 { 1e300 } else { -1e300 }])
        .collect();
    let ds = LabeledDataset::new(layout(), rows, vec![0; 20]).unwrap();
    let splits = split(&ds, &split_config()).unwrap();

    let result = StandardScaler::fit(&splits.layout, &splits.train);
    assert!(matches!(result, Err(FeatureError::NonFiniteStatistic(ref name)) if name == "Amount"));
}

#[test]
fn test_run_preprocessing_rejects_nan_cells() {
    let dir = tempdir().unwrap();
    let raw = dir.path().join("creditcard.csv");
    let mut csv = String::from("Time,V1,Amount,Class\n");
    for i in 0..50 {
        let v1 = if i % 4 == 0 { "NaN".to_string() } else { format!("{}", i as f64 * 0.1) };
        csv.push_str(&format!("{},{},{},{}\n", i, v1, 10 + i, (i % 10 == 0) as u8));
    }
    fs::write(&raw, csv).unwrap();

    let mut config = FraudConfig::default();
    config.data.raw_file = raw;
    config.data.scaler_path = dir.path().join("scaler.json");

    let result = run_preprocessing(&config);
    assert!(matches!(result, Err(PipelineError::Dataset(DatasetError::NonFinite { .. }))));
    assert!(!config.data.scaler_path.exists());
}

#[test]
fn test_transform_transaction_by_name() {
    let ds = synthetic(100);
    let splits = split(&ds, &split_config()).unwrap();
    let scaler = StandardScaler::fit(&splits.layout, &splits.train).unwrap();

    let tx = Transaction::from_pairs([("Amount", 28.0), ("V1", 0.0), ("Time", 50.0)]);
    let by_name = scaler.transform(&tx).unwrap();
    let by_row = scaler.transform_row(&[50.0, 0.0, 28.0]).unwrap();
    assert_close(&by_name, &by_row);

    let incomplete = Transaction::from_pairs([("Time", 50.0)]);
    assert!(matches!(scaler.transform(&incomplete), Err(FeatureError::MissingFeature(_))));

    assert!(matches!(
        scaler.transform_row(&[1.0]),
        Err(FeatureError::ArityMismatch { expected: 3, actual: 1 })
    ));
}

#[test]
fn test_save_load_cycle_keeps_parameters() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("models").join("scaler.json");

    let ds = synthetic(100);
    let splits = split(&ds, &split_config()).unwrap();
    let scaler = StandardScaler::fit(&splits.layout, &splits.train).unwrap();

    save_scaler(&scaler, &path).unwrap();
    let loaded = load_scaler(&path).unwrap();

    assert_eq!(loaded, scaler);
    assert_eq!(loaded.fingerprint(), scaler.fingerprint());
}

#[test]
fn test_load_rejects_tampered_layout() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("scaler.json");

    let ds = synthetic(100);
    let splits = split(&ds, &split_config()).unwrap();
    let scaler = StandardScaler::fit(&splits.layout, &splits.train).unwrap();
    save_scaler(&scaler, &path).unwrap();

    let mut json: serde_json::Value = serde_json::from_slice(&fs::read(&path).unwrap()).unwrap();
    json["mean"] = serde_json::json!([0.0]);
    fs::write(&path, serde_json::to_vec(&json).unwrap()).unwrap();

    assert!(matches!(load_scaler(&path), Err(ArtifactError::Invalid(_))));
}

#[test]
fn test_load_missing_scaler() {
    let dir = tempdir().unwrap();
    let result = load_scaler(&dir.path().join("scaler.json"));
    assert!(matches!(result, Err(ArtifactError::NotFound(_))));
}

#[test]
fn test_run_preprocessing_persists_scaler() {
    let dir = tempdir().unwrap();
    let raw = dir.path().join("creditcard.csv");

    let mut csv = String::from("Time,V1,Amount,Class\n");
    for i in 0..50 {
        csv.push_str(&format!("{},{},{},{}\n", i, (i % 5) as f64 * 0.5, 10 + i, (i % 10 == 0) as u8));
    }
    fs::write(&raw, csv).unwrap();

    let mut config = FraudConfig::default();
    config.data.raw_file = raw;
    config.data.scaler_path = dir.path().join("models").join("scaler.json");

    let prepared = run_preprocessing(&config).unwrap();
    let loaded = load_scaler(&config.data.scaler_path).unwrap();

    assert_eq!(loaded.fingerprint(), prepared.scaler.fingerprint());
    assert_eq!(loaded.layout().names(), &["Time", "V1", "Amount"]);
}

#[test]
fn test_run_preprocessing_missing_dataset() {
    let dir = tempdir().unwrap();
    let mut config = FraudConfig::default();
    config.data.raw_file = dir.path().join("missing.csv");
    config.data.scaler_path = dir.path().join("scaler.json");

    let result = run_preprocessing(&config);
    assert!(matches!(result, Err(PipelineError::Dataset(DatasetError::NotFound(_)))));
    assert!(!config.data.scaler_path.exists());
}
