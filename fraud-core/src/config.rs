//! Configuration module
//!
//! Typed settings for the offline pipeline and the scoring service.
//! Values come from environment variables (binaries call `dotenvy::dotenv()`
//! first), falling back to the defaults in `constants`.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use thiserror::Error;

use crate::constants::*;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?} ({reason})")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },

    #[error("{0}")]
    OutOfRange(String),
}

/// Main configuration
#[derive(Debug, Clone)]
pub struct FraudConfig {
    pub data: DataConfig,
    pub model: ModelConfig,
    pub training: TrainingConfig,
}

/// Dataset, split and artifact locations
#[derive(Debug, Clone)]
pub struct DataConfig {
    pub raw_file: PathBuf,
    pub label_column: String,
    /// Fraction of all rows used as test set
    pub test_size: f64,
    /// Fraction of the train+validation remainder used as validation set
    pub val_size: f64,
    pub random_state: u64,
    pub scaler_path: PathBuf,
    pub db_path: PathBuf,
}

/// Classifier shape and trainer hyperparameters
#[derive(Debug, Clone)]
pub struct ModelConfig {
    pub save_path: PathBuf,
    pub hidden_layers: Vec<usize>,
    pub dropout: f64,
    pub learning_rate: f64,
    pub batch_size: usize,
    pub epochs: usize,
}

#[derive(Debug, Clone)]
pub struct TrainingConfig {
    pub patience: usize,
    /// Decision threshold, fixed for the process lifetime
    pub threshold: f64,
}

impl FraudConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config = Self::parse(&lookup)?;
        config.validate()?;
        Ok(config)
    }

    /// Configuration for the scoring service; trainer settings are not checked
    pub fn serving_from_env() -> Result<Self, ConfigError> {
        Self::serving_from_lookup(|key| env::var(key).ok())
    }

    pub fn serving_from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config = Self::parse(&lookup)?;
        config.validate_serving()?;
        Ok(config)
    }

    fn parse<F>(lookup: &F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            data: DataConfig {
                raw_file: path_or(lookup, "FRAUD_RAW_FILE", DEFAULT_RAW_FILE),
                label_column: lookup("FRAUD_LABEL_COLUMN")
                    .unwrap_or_else(|| DEFAULT_LABEL_COLUMN.to_string()),
                test_size: parse_or(lookup, "FRAUD_TEST_SIZE", DEFAULT_TEST_SIZE)?,
                val_size: parse_or(lookup, "FRAUD_VAL_SIZE", DEFAULT_VAL_SIZE)?,
                random_state: parse_or(lookup, "FRAUD_RANDOM_STATE", DEFAULT_RANDOM_STATE)?,
                scaler_path: path_or(lookup, "FRAUD_SCALER_PATH", DEFAULT_SCALER_PATH),
                db_path: path_or(lookup, "FRAUD_DB_PATH", DEFAULT_DB_PATH),
            },
            model: ModelConfig {
                save_path: path_or(lookup, "FRAUD_MODEL_PATH", DEFAULT_MODEL_PATH),
                hidden_layers: parse_layers(lookup)?,
                dropout: parse_or(lookup, "FRAUD_DROPOUT", DEFAULT_DROPOUT)?,
                learning_rate: parse_or(lookup, "FRAUD_LEARNING_RATE", DEFAULT_LEARNING_RATE)?,
                batch_size: parse_or(lookup, "FRAUD_BATCH_SIZE", DEFAULT_BATCH_SIZE)?,
                epochs: parse_or(lookup, "FRAUD_EPOCHS", DEFAULT_EPOCHS)?,
            },
            training: TrainingConfig {
                patience: parse_or(lookup, "FRAUD_PATIENCE", DEFAULT_PATIENCE)?,
                threshold: parse_or(lookup, "FRAUD_THRESHOLD", DEFAULT_THRESHOLD)?,
            },
        })
    }

    /// Check what the scoring service uses: threshold and artifact/database paths
    pub fn validate_serving(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.training.threshold) {
            return Err(ConfigError::OutOfRange(format!(
                "threshold must be within [0, 1], got {}",
                self.training.threshold
            )));
        }

        for (name, path) in [
            ("scaler_path", &self.data.scaler_path),
            ("model_path", &self.model.save_path),
            ("db_path", &self.data.db_path),
        ] {
            if path.as_os_str().is_empty() {
                return Err(ConfigError::OutOfRange(format!("{} must not be empty", name)));
            }
        }

        Ok(())
    }

    /// Check value ranges for the offline pipeline and trainer
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_serving()?;

        for (name, fraction) in [("test_size", self.data.test_size), ("val_size", self.data.val_size)] {
            if !(fraction > 0.0 && fraction < 1.0) {
                return Err(ConfigError::OutOfRange(format!(
                    "{} must be within (0, 1), got {}",
                    name, fraction
                )));
            }
        }

        if !(0.0..1.0).contains(&self.model.dropout) {
            return Err(ConfigError::OutOfRange(format!(
                "dropout must be within [0, 1), got {}",
                self.model.dropout
            )));
        }

        if self.model.batch_size == 0 || self.model.epochs == 0 {
            return Err(ConfigError::OutOfRange(
                "batch_size and epochs must be positive".to_string(),
            ));
        }

        if !(self.model.learning_rate > 0.0) {
            return Err(ConfigError::OutOfRange(format!(
                "learning_rate must be positive, got {}",
                self.model.learning_rate
            )));
        }

        Ok(())
    }
}

impl Default for FraudConfig {
    fn default() -> Self {
        Self {
            data: DataConfig {
                raw_file: PathBuf::from(DEFAULT_RAW_FILE),
                label_column: DEFAULT_LABEL_COLUMN.to_string(),
                test_size: DEFAULT_TEST_SIZE,
                val_size: DEFAULT_VAL_SIZE,
                random_state: DEFAULT_RANDOM_STATE,
                scaler_path: PathBuf::from(DEFAULT_SCALER_PATH),
                db_path: PathBuf::from(DEFAULT_DB_PATH),
            },
            model: ModelConfig {
                save_path: PathBuf::from(DEFAULT_MODEL_PATH),
                hidden_layers: DEFAULT_HIDDEN_LAYERS.to_vec(),
                dropout: DEFAULT_DROPOUT,
                learning_rate: DEFAULT_LEARNING_RATE,
                batch_size: DEFAULT_BATCH_SIZE,
                epochs: DEFAULT_EPOCHS,
            },
            training: TrainingConfig {
                patience: DEFAULT_PATIENCE,
                threshold: DEFAULT_THRESHOLD,
            },
        }
    }
}

fn path_or<F>(lookup: &F, key: &str, default: &str) -> PathBuf
where
    F: Fn(&str) -> Option<String>,
{
    PathBuf::from(lookup(key).unwrap_or_else(|| default.to_string()))
}

/// Present-but-unparsable values are errors, never silently defaulted
fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::InvalidValue {
            key,
            value: raw.clone(),
            reason: e.to_string(),
        }),
        None => Ok(default),
    }
}

fn parse_layers<F>(lookup: &F) -> Result<Vec<usize>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup("FRAUD_HIDDEN_LAYERS") else {
        return Ok(DEFAULT_HIDDEN_LAYERS.to_vec());
    };

    let layers = raw
        .split(',')
        .map(|w| w.trim().parse::<usize>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| ConfigError::InvalidValue {
            key: "FRAUD_HIDDEN_LAYERS",
            value: raw.clone(),
            reason: e.to_string(),
        })?;

    if layers.is_empty() || layers.contains(&0) {
        return Err(ConfigError::InvalidValue {
            key: "FRAUD_HIDDEN_LAYERS",
            value: raw,
            reason: "widths must be positive".to_string(),
        });
    }

    Ok(layers)
}
