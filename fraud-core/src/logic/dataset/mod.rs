//! Dataset Module - Raw labeled transactions for offline training
//!
//! Loads the raw CSV and partitions it into train / validation / test.
//! The train partition has its own type so nothing but the splitter can
//! produce data the scaler is allowed to fit on.

pub mod loader;
pub mod split;


use std::path::PathBuf;

use thiserror::Error;

use super::features::{FeatureError, FeatureLayout};

pub use loader::load_csv;
pub use split::{split, DatasetSplits, Partition, SplitConfig, TrainPartition};

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("dataset not found at {0}")]
    NotFound(PathBuf),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("label column {0:?} not present in header")]
    MissingLabelColumn(String),

    #[error("row {row}: column {column:?} is not numeric: {value:?}")]
    NotNumeric {
        row: usize,
        column: String,
        value: String,
    },

    #[error("row {row}: column {column:?} is not finite: {value:?}")]
    NonFinite {
        row: usize,
        column: String,
        value: String,
    },

    #[error("row {row}: label must be 0 or 1, got {value}")]
    InvalidLabel { row: usize, value: f64 },

    #[error("dataset has no rows")]
    Empty,

    #[error("{0} partition would be empty ({1} rows available)")]
    EmptyPartition(&'static str, usize),

    #[error("invalid split fraction {0}")]
    InvalidFraction(f64),

    #[error(transparent)]
    Layout(#[from] FeatureError),
}

/// Raw rows and labels, columns ordered by `layout`
#[derive(Debug, Clone)]
pub struct LabeledDataset {
    pub layout: FeatureLayout,
    pub rows: Vec<Vec<f64>>,
    pub labels: Vec<u8>,
}

impl LabeledDataset {
    pub fn new(layout: FeatureLayout, rows: Vec<Vec<f64>>, labels: Vec<u8>) -> Result<Self, DatasetError> {
        if let Some(row) = rows.iter().find(|r| r.len() != layout.len()) {
            return Err(FeatureError::ArityMismatch {
                expected: layout.len(),
                actual: row.len(),
            }
            .into());
        }
        for row in &rows {
            if let Some((i, &value)) = row.iter().enumerate().find(|(_, v)| !v.is_finite()) {
                return Err(FeatureError::NonFinite {
                    feature: layout.names()[i].clone(),
                    value,
                }
                .into());
            }
        }
        if rows.len() != labels.len() {
            return Err(FeatureError::ArityMismatch {
                expected: rows.len(),
                actual: labels.len(),
            }
            .into());
        }
        Ok(Self { layout, rows, labels })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn fraud_count(&self) -> usize {
        self.labels.iter().filter(|&&l| l == 1).count()
    }
}
