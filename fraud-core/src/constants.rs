//! Central Configuration Constants
//!
//! Single source of truth for all configuration defaults.
//! Every value here can be overridden through the environment (see `config`).

/// Raw labeled dataset (Kaggle credit card fraud CSV)
pub const DEFAULT_RAW_FILE: &str = "data/raw/creditcard.csv";

/// Name of the label column in the raw dataset
pub const DEFAULT_LABEL_COLUMN: &str = "Class";

/// Fraction of all rows held out as the test partition
pub const DEFAULT_TEST_SIZE: f64 = 0.2;

/// Fraction of the remaining rows held out as the validation partition
pub const DEFAULT_VAL_SIZE: f64 = 0.2;

/// Seed for the train/validation/test partitioning
pub const DEFAULT_RANDOM_STATE: u64 = 42;

/// Fitted scaler artifact
pub const DEFAULT_SCALER_PATH: &str = "models/scaler.json";

/// SQLite prediction log
pub const DEFAULT_DB_PATH: &str = "data/database.db";

/// Trained model artifact
pub const DEFAULT_MODEL_PATH: &str = "models/fraud_model.json";

/// Hidden layer widths of the classifier
pub const DEFAULT_HIDDEN_LAYERS: &[usize] = &[32, 16];

/// Dropout applied after the first hidden layer during training
pub const DEFAULT_DROPOUT: f64 = 0.2;

pub const DEFAULT_LEARNING_RATE: f64 = 0.001;
pub const DEFAULT_BATCH_SIZE: usize = 2048;
pub const DEFAULT_EPOCHS: usize = 20;

/// Early stopping patience (epochs without validation improvement)
pub const DEFAULT_PATIENCE: usize = 3;

/// Decision threshold: score > threshold => fraud
pub const DEFAULT_THRESHOLD: f64 = 0.5;

/// Artifact format version, bumped when the JSON layout of scaler/model changes
pub const ARTIFACT_FORMAT_VERSION: u8 = 1;

/// App version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");
