//! Trainer - mini-batch Adam on binary cross-entropy with early stopping
//!
//! Mirrors the offline training job: preprocess, fit with validation
//! monitoring, restore the best epoch, save, evaluate on the test set.

use ndarray::{Array1, Array2, Axis};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::inference::ModelArtifact;
use super::metrics::{binary_cross_entropy, evaluate, EvaluationMetrics};
use super::network::{DenseNetwork, Gradients};
use super::storage::save_model;
use super::threshold::DecisionThreshold;
use crate::config::{ConfigError, FraudConfig};
use crate::logic::artifact::ArtifactError;
use crate::logic::preprocessing::{run_preprocessing, PipelineError, ScaledPartition};

#[derive(Debug, Error)]
pub enum TrainError {
    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error(transparent)]
    Artifact(#[from] ArtifactError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Hyperparameters for one `fit` run
#[derive(Debug, Clone)]
pub struct TrainParams {
    pub learning_rate: f64,
    pub batch_size: usize,
    pub epochs: usize,
    pub patience: usize,
    pub seed: u64,
}

impl From<&FraudConfig> for TrainParams {
    fn from(config: &FraudConfig) -> Self {
        Self {
            learning_rate: config.model.learning_rate,
            batch_size: config.model.batch_size,
            epochs: config.model.epochs,
            patience: config.training.patience,
            seed: config.data.random_state,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpochStats {
    pub epoch: usize,
    pub loss: f64,
    pub val_loss: f64,
}

#[derive(Debug, Clone)]
pub struct TrainingHistory {
    pub epochs: Vec<EpochStats>,
    pub best_epoch: usize,
    pub best_val_loss: f64,
    pub stopped_early: bool,
}

#[derive(Debug, Clone)]
pub struct TrainingReport {
    pub history: TrainingHistory,
    pub test: EvaluationMetrics,
    pub model: ModelArtifact,
}

// ============================================================================
// ADAM
// ============================================================================

struct Adam {
    learning_rate: f64,
    beta1: f64,
    beta2: f64,
    epsilon: f64,
    step: i32,
    moments: Vec<(Array2<f64>, Array1<f64>, Array2<f64>, Array1<f64>)>,
}

impl Adam {
    fn new(network: &DenseNetwork, learning_rate: f64) -> Self {
        let moments = network
            .layers()
            .iter()
            .map(|l| {
                (
                    Array2::zeros(l.weights.raw_dim()),
                    Array1::zeros(l.biases.len()),
                    Array2::zeros(l.weights.raw_dim()),
                    Array1::zeros(l.biases.len()),
                )
            })
            .collect();

        Self {
            learning_rate,
            beta1: 0.9,
            beta2: 0.999,
            epsilon: 1e-7,
            step: 0,
            moments,
        }
    }

    fn apply(&mut self, network: &mut DenseNetwork, grads: &Gradients) {
        self.step += 1;
        let (b1, b2, eps) = (self.beta1, self.beta2, self.epsilon);
        let lr_t = self.learning_rate * (1.0 - b2.powi(self.step)).sqrt() / (1.0 - b1.powi(self.step));

        for ((layer, (gw, gb)), (mw, mb, vw, vb)) in network
            .layers_mut()
            .iter_mut()
            .zip(grads)
            .zip(self.moments.iter_mut())
        {
            mw.zip_mut_with(gw, |m, &g| *m = b1 * *m + (1.0 - b1) * g);
            vw.zip_mut_with(gw, |v, &g| *v = b2 * *v + (1.0 - b2) * g * g);
            mb.zip_mut_with(gb, |m, &g| *m = b1 * *m + (1.0 - b1) * g);
            vb.zip_mut_with(gb, |v, &g| *v = b2 * *v + (1.0 - b2) * g * g);

            ndarray::Zip::from(&mut layer.weights)
                .and(&*mw)
                .and(&*vw)
                .for_each(|w, &m, &v| *w -= lr_t * m / (v.sqrt() + eps));
            ndarray::Zip::from(&mut layer.biases)
                .and(&*mb)
                .and(&*vb)
                .for_each(|b, &m, &v| *b -= lr_t * m / (v.sqrt() + eps));
        }
    }
}

// ============================================================================
// TRAINING LOOP
// ============================================================================

/// Train `network` in place; ends with the best-validation-loss weights
pub fn fit(
    network: &mut DenseNetwork,
    train: &ScaledPartition,
    validation: &ScaledPartition,
    params: &TrainParams,
) -> TrainingHistory {
    let mut rng = StdRng::seed_from_u64(params.seed);
    let mut optimizer = Adam::new(network, params.learning_rate);
    let mut order: Vec<usize> = (0..train.len()).collect();

    let mut epochs = Vec::with_capacity(params.epochs);
    let mut best = network.clone();
    let mut best_val_loss = f64::INFINITY;
    let mut best_epoch = 0;
    let mut wait = 0;
    let mut stopped_early = false;

    for epoch in 1..=params.epochs {
        order.shuffle(&mut rng);
        let mut loss_sum = 0.0;

        for batch in order.chunks(params.batch_size.max(1)) {
            let x = train.features.select(Axis(0), batch);
            let y = train.labels.select(Axis(0), batch);

            let cache = network.forward_train(&x, &mut rng);
            loss_sum += binary_cross_entropy(&cache.probabilities(), &y) * batch.len() as f64;

            let grads = network.backward(&cache, &y);
            optimizer.apply(network, &grads);
        }

        let loss = loss_sum / train.len().max(1) as f64;
        let val_loss = binary_cross_entropy(&network.predict_batch(&validation.features), &validation.labels);
        log::info!("Epoch {}/{} - loss: {:.4} - val_loss: {:.4}", epoch, params.epochs, loss, val_loss);
        epochs.push(EpochStats { epoch, loss, val_loss });

        if val_loss < best_val_loss {
            best_val_loss = val_loss;
            best_epoch = epoch;
            best = network.clone();
            wait = 0;
        } else {
            wait += 1;
            if wait >= params.patience {
                log::info!("Early stopping at epoch {} (best epoch {})", epoch, best_epoch);
                stopped_early = true;
                break;
            }
        }
    }

    *network = best;

    TrainingHistory {
        epochs,
        best_epoch,
        best_val_loss,
        stopped_early,
    }
}

/// Full offline job: preprocess, train, save the model, evaluate on test
pub fn train_model(config: &FraudConfig) -> Result<TrainingReport, TrainError> {
    log::info!("Starting data loading...");
    let data = run_preprocessing(config)?;
    let threshold = DecisionThreshold::new(config.training.threshold)?;

    log::info!("Building model architecture...");
    let mut init_rng = StdRng::seed_from_u64(config.data.random_state);
    let mut network = DenseNetwork::new(
        data.scaler.feature_count(),
        &config.model.hidden_layers,
        config.model.dropout,
        &mut init_rng,
    );

    log::info!("Starting training...");
    let history = fit(&mut network, &data.train, &data.validation, &TrainParams::from(config));

    log::info!("Evaluating on test set...");
    let test = evaluate(&network.predict_batch(&data.test.features), &data.test.labels, threshold);
    log::info!(
        "Test results: loss={:.4} accuracy={:.4} precision={:.4} recall={:.4} auc={}",
        test.loss,
        test.accuracy,
        test.precision,
        test.recall,
        test.auc.map(|a| format!("{:.4}", a)).unwrap_or_else(|| "n/a".to_string())
    );

    let model = ModelArtifact::new(network, &data.scaler).with_metrics(test.clone());
    save_model(&model, &config.model.save_path)?;

    Ok(TrainingReport { history, test, model })
}
