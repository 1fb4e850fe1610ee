//! Standard Scaler - per-feature standardization fitted on training data
//!
//! `z = (x - mean) / scale` with `scale = sqrt(population variance)`.
//! Constant features get `scale = 1.0` so they map to 0 instead of NaN.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::constants::ARTIFACT_FORMAT_VERSION;
use crate::logic::artifact::ArtifactError;
use crate::logic::dataset::{Partition, TrainPartition};
use crate::logic::features::{FeatureError, FeatureLayout, Transaction};

/// Fitted scaler. Only `fit` creates one; there is no refit or partial fit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    format_version: u8,
    layout: FeatureLayout,
    layout_hash: u32,
    mean: Vec<f64>,
    variance: Vec<f64>,
    scale: Vec<f64>,
    samples_seen: usize,
    fitted_at: DateTime<Utc>,
}

impl StandardScaler {
    /// Fit mean/variance on the training partition
    pub fn fit(layout: &FeatureLayout, train: &TrainPartition) -> Result<Self, FeatureError> {
        let rows = &train.as_partition().rows;
        let dim = layout.len();
        let n = rows.len();

        if n == 0 {
            return Err(FeatureError::EmptyFit);
        }
        if let Some(row) = rows.iter().find(|r| r.len() != dim) {
            return Err(FeatureError::ArityMismatch {
                expected: dim,
                actual: row.len(),
            });
        }

        let mut mean = vec![0.0; dim];
        for row in rows {
            for (m, x) in mean.iter_mut().zip(row) {
                *m += x;
            }
        }
        mean.iter_mut().for_each(|m| *m /= n as f64);

        // Two-pass variance
        let mut variance = vec![0.0; dim];
        for row in rows {
            for ((v, x), m) in variance.iter_mut().zip(row).zip(&mean) {
                *v += (x - m).powi(2);
            }
        }
        variance.iter_mut().for_each(|v| *v /= n as f64);

        // Sums of huge finite values can still overflow
        if let Some(i) = (0..dim).find(|&i| !mean[i].is_finite() || !variance[i].is_finite()) {
            return Err(FeatureError::NonFiniteStatistic(layout.names()[i].clone()));
        }

        let scale = variance
            .iter()
            .map(|v| {
                let s = v.sqrt();
                if s < 10.0 * f64::EPSILON { 1.0 } else { s }
            })
            .collect();

        Ok(Self {
            format_version: ARTIFACT_FORMAT_VERSION,
            layout: layout.clone(),
            layout_hash: layout.layout_hash(),
            mean,
            variance,
            scale,
            samples_seen: n,
            fitted_at: Utc::now(),
        })
    }

    pub fn layout(&self) -> &FeatureLayout {
        &self.layout
    }

    pub fn layout_hash(&self) -> u32 {
        self.layout_hash
    }

    pub fn mean(&self) -> &[f64] {
        &self.mean
    }

    pub fn variance(&self) -> &[f64] {
        &self.variance
    }

    pub fn scale(&self) -> &[f64] {
        &self.scale
    }

    pub fn samples_seen(&self) -> usize {
        self.samples_seen
    }

    pub fn fitted_at(&self) -> DateTime<Utc> {
        self.fitted_at
    }

    pub fn feature_count(&self) -> usize {
        self.layout.len()
    }

    /// Scale one already-ordered row
    pub fn transform_row(&self, row: &[f64]) -> Result<Vec<f64>, FeatureError> {
        if row.len() != self.mean.len() {
            return Err(FeatureError::ArityMismatch {
                expected: self.mean.len(),
                actual: row.len(),
            });
        }

        Ok(row
            .iter()
            .zip(&self.mean)
            .zip(&self.scale)
            .map(|((x, m), s)| (x - m) / s)
            .collect())
    }

    /// Apply (never refit) to every row of a partition
    pub fn transform_partition(&self, partition: &Partition) -> Result<Vec<Vec<f64>>, FeatureError> {
        partition.rows.iter().map(|r| self.transform_row(r)).collect()
    }

    /// Order a transaction by the fitted layout, then scale it
    pub fn transform(&self, transaction: &Transaction) -> Result<Vec<f64>, FeatureError> {
        let row = self.layout.vectorize(transaction)?;
        self.transform_row(&row)
    }

    /// SHA-256 over layout and fitted parameters.
    ///
    /// The trainer stores it in the model artifact; serving refuses a model
    /// whose recorded fingerprint differs.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        for name in self.layout.names() {
            hasher.update(name.as_bytes());
            hasher.update([0u8]);
        }
        for values in [&self.mean, &self.variance, &self.scale] {
            for v in values.iter() {
                hasher.update(v.to_le_bytes());
            }
        }
        hex::encode(hasher.finalize())
    }

    /// Consistency checks for a scaler read back from disk
    pub fn validate(&self) -> Result<(), ArtifactError> {
        if self.format_version != ARTIFACT_FORMAT_VERSION {
            return Err(ArtifactError::FormatVersion {
                expected: ARTIFACT_FORMAT_VERSION,
                actual: self.format_version,
            });
        }

        let dim = self.layout.len();
        if self.mean.len() != dim || self.variance.len() != dim || self.scale.len() != dim {
            return Err(ArtifactError::Invalid(format!(
                "scaler has {} features but parameter lengths {}/{}/{}",
                dim,
                self.mean.len(),
                self.variance.len(),
                self.scale.len()
            )));
        }

        if self.layout_hash != self.layout.layout_hash() {
            return Err(ArtifactError::Invalid(format!(
                "scaler layout hash {:08x} does not match its feature names ({:08x})",
                self.layout_hash,
                self.layout.layout_hash()
            )));
        }

        if self.mean.iter().any(|m| !m.is_finite())
            || self.scale.iter().any(|s| !s.is_finite() || *s <= 0.0)
        {
            return Err(ArtifactError::Invalid(
                "scaler parameters must be finite with positive scale".to_string(),
            ));
        }

        Ok(())
    }
}
