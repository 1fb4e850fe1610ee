//! Offline preprocessing run
//!
//! load -> split (test, then validation) -> fit on train -> transform all -> save scaler

use ndarray::{Array1, Array2};

use super::scaler::StandardScaler;
use super::storage::save_scaler;
use super::PipelineError;
use crate::config::FraudConfig;
use crate::logic::dataset::{load_csv, split, LabeledDataset, SplitConfig};
use crate::logic::features::FeatureError;

/// Scaled feature matrix and 0/1 labels, ready for the trainer
#[derive(Debug, Clone)]
pub struct ScaledPartition {
    pub features: Array2<f64>,
    pub labels: Array1<f64>,
}

impl ScaledPartition {
    fn from_rows(rows: Vec<Vec<f64>>, labels: &[u8], dim: usize) -> Result<Self, FeatureError> {
        let n = rows.len();
        let flat: Vec<f64> = rows.into_iter().flatten().collect();
        let actual = flat.len();
        let features = Array2::from_shape_vec((n, dim), flat).map_err(|_| FeatureError::ArityMismatch {
            expected: n * dim,
            actual,
        })?;
        let labels = labels.iter().map(|&l| l as f64).collect();

        Ok(Self { features, labels })
    }

    pub fn len(&self) -> usize {
        self.features.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.features.nrows() == 0
    }
}

#[derive(Debug, Clone)]
pub struct PreparedData {
    pub scaler: StandardScaler,
    pub train: ScaledPartition,
    pub validation: ScaledPartition,
    pub test: ScaledPartition,
}

/// Split and scale an in-memory dataset. No IO.
pub fn prepare(dataset: &LabeledDataset, split_config: &SplitConfig) -> Result<PreparedData, PipelineError> {
    let splits = split(dataset, split_config)?;
    let dim = splits.layout.len();

    let scaler = StandardScaler::fit(&splits.layout, &splits.train)?;

    let train = scaler.transform_partition(splits.train.as_partition())?;
    let validation = scaler.transform_partition(&splits.validation)?;
    let test = scaler.transform_partition(&splits.test)?;

    Ok(PreparedData {
        train: ScaledPartition::from_rows(train, &splits.train.as_partition().labels, dim)?,
        validation: ScaledPartition::from_rows(validation, &splits.validation.labels, dim)?,
        test: ScaledPartition::from_rows(test, &splits.test.labels, dim)?,
        scaler,
    })
}

/// Load the raw dataset, prepare it and persist the fitted scaler
pub fn run_preprocessing(config: &FraudConfig) -> Result<PreparedData, PipelineError> {
    log::info!("Loading data from {}...", config.data.raw_file.display());
    let dataset = load_csv(&config.data.raw_file, &config.data.label_column).map_err(|e| {
        log::error!("Failed to load dataset: {}", e);
        e
    })?;

    log::info!(
        "Dataset: {} rows, {} fraudulent",
        dataset.len(),
        dataset.fraud_count()
    );

    let prepared = prepare(&dataset, &SplitConfig::from(&config.data))?;
    save_scaler(&prepared.scaler, &config.data.scaler_path)?;

    log::info!(
        "Data shapes: train={:?}, validation={:?}, test={:?}",
        prepared.train.features.dim(),
        prepared.validation.features.dim(),
        prepared.test.features.dim()
    );

    Ok(prepared)
}
