//! Model Module - Fraud classifier, threshold and offline trainer
//!
//! - `inference` - `FraudClassifier` seam + persisted `ModelArtifact`
//! - `network` - dense feed-forward classifier (ndarray)
//! - `threshold` - fixed decision threshold
//! - `trainer` / `metrics` - offline training and evaluation

pub mod inference;
pub mod metrics;
pub mod network;
pub mod storage;
pub mod threshold;
pub mod trainer;


// Re-export common types
pub use inference::{check_probability, FraudClassifier, InferenceError, ModelArtifact};
pub use metrics::EvaluationMetrics;
pub use network::{Activation, DenseLayer, DenseNetwork};
pub use storage::{load_model, save_model};
pub use threshold::DecisionThreshold;
pub use trainer::{fit, train_model, TrainError, TrainParams, TrainingReport};
