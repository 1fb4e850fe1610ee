//! Seeded train / validation / test partitioning
//!
//! Order matters: the test set is separated from everything else first,
//! then validation is carved out of the remainder. Both steps shuffle with
//! an RNG seeded from the same value, so a seed fully determines row
//! membership for a given dataset size.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use super::{DatasetError, LabeledDataset};
use crate::config::DataConfig;
use crate::logic::features::FeatureLayout;

#[derive(Debug, Clone, Copy)]
pub struct SplitConfig {
    /// Fraction of all rows held out for test
    pub test_size: f64,
    /// Fraction of the remaining rows held out for validation
    pub val_size: f64,
    pub seed: u64,
}

impl From<&DataConfig> for SplitConfig {
    fn from(data: &DataConfig) -> Self {
        Self {
            test_size: data.test_size,
            val_size: data.val_size,
            seed: data.random_state,
        }
    }
}

/// A subset of the dataset; `indices` are row positions in the source file
#[derive(Debug, Clone, PartialEq)]
pub struct Partition {
    pub indices: Vec<usize>,
    pub rows: Vec<Vec<f64>>,
    pub labels: Vec<u8>,
}

impl Partition {
    fn gather(dataset: &LabeledDataset, indices: Vec<usize>) -> Self {
        let rows = indices.iter().map(|&i| dataset.rows[i].clone()).collect();
        let labels = indices.iter().map(|&i| dataset.labels[i]).collect();
        Self { indices, rows, labels }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// The training partition. Only `split` can build one, and it is the only
/// input `StandardScaler::fit` accepts.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainPartition(Partition);

impl TrainPartition {
    pub(crate) fn new(partition: Partition) -> Self {
        Self(partition)
    }

    pub fn as_partition(&self) -> &Partition {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct DatasetSplits {
    pub layout: FeatureLayout,
    pub train: TrainPartition,
    pub validation: Partition,
    pub test: Partition,
}

/// Partition a dataset: test first, then validation out of the remainder
pub fn split(dataset: &LabeledDataset, config: &SplitConfig) -> Result<DatasetSplits, DatasetError> {
    if dataset.is_empty() {
        return Err(DatasetError::Empty);
    }

    let all: Vec<usize> = (0..dataset.len()).collect();
    let (test_idx, rest) = hold_out(all, config.test_size, config.seed, "test")?;
    let (val_idx, train_idx) = hold_out(rest, config.val_size, config.seed, "validation")?;

    let splits = DatasetSplits {
        layout: dataset.layout.clone(),
        train: TrainPartition::new(Partition::gather(dataset, train_idx)),
        validation: Partition::gather(dataset, val_idx),
        test: Partition::gather(dataset, test_idx),
    };

    log::info!(
        "Split {} rows: train={}, validation={}, test={}",
        dataset.len(),
        splits.train.len(),
        splits.validation.len(),
        splits.test.len()
    );

    Ok(splits)
}

/// Shuffle and cut off `ceil(fraction * n)` rows. Both sides must be non-empty.
fn hold_out(
    mut indices: Vec<usize>,
    fraction: f64,
    seed: u64,
    held_name: &'static str,
) -> Result<(Vec<usize>, Vec<usize>), DatasetError> {
    if !(fraction > 0.0 && fraction < 1.0) {
        return Err(DatasetError::InvalidFraction(fraction));
    }

    let n = indices.len();
    let n_held = (fraction * n as f64).ceil() as usize;

    if n_held == 0 {
        return Err(DatasetError::EmptyPartition(held_name, n));
    }
    if n_held >= n {
        return Err(DatasetError::EmptyPartition("train", n));
    }

    let mut rng = StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let rest = indices.split_off(n_held);
    Ok((indices, rest))
}
