//! Decision Threshold
//!
//! Converts a fraud probability into a verdict. Fixed for the process
//! lifetime; the comparison is strict: a score equal to the threshold is
//! not fraud.

use serde::{Deserialize, Serialize};

use crate::config::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct DecisionThreshold(f64);

impl DecisionThreshold {
    pub fn new(value: f64) -> Result<Self, ConfigError> {
        if (0.0..=1.0).contains(&value) {
            Ok(Self(value))
        } else {
            Err(ConfigError::OutOfRange(format!(
                "threshold must be within [0, 1], got {}",
                value
            )))
        }
    }

    pub fn value(&self) -> f64 {
        self.0
    }

    /// `score > threshold`
    pub fn is_fraud(&self, score: f64) -> bool {
        score > self.0
    }
}

impl TryFrom<f64> for DecisionThreshold {
    type Error = ConfigError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<DecisionThreshold> for f64 {
    fn from(t: DecisionThreshold) -> Self {
        t.0
    }
}
