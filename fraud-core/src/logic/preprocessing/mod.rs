//! Preprocessing Module - Split, fit scaler on train, transform all partitions
//!
//! - `scaler` - StandardScaler (fit on `TrainPartition` only)
//! - `storage` - scaler artifact IO
//! - `pipeline` - end-to-end offline preprocessing run

pub mod pipeline;
pub mod scaler;
pub mod storage;

#[cfg(test)]
mod tests;

use thiserror::Error;

use super::artifact::ArtifactError;
use super::dataset::DatasetError;
use super::features::FeatureError;

pub use pipeline::{prepare, run_preprocessing, PreparedData, ScaledPartition};
pub use scaler::StandardScaler;
pub use storage::{load_scaler, save_scaler};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Dataset(#[from] DatasetError),

    #[error(transparent)]
    Feature(#[from] FeatureError),

    #[error(transparent)]
    Artifact(#[from] ArtifactError),
}
