//! Prediction rows as written by the scorer and read by the dashboard

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One scored request, before it has a row id
#[derive(Debug, Clone, PartialEq)]
pub struct NewPrediction {
    /// Request start time
    pub timestamp: DateTime<Utc>,
    /// Raw request features as JSON (keys sorted)
    pub input_data: String,
    pub prediction_score: f64,
    pub is_fraud: bool,
    /// Transform + inference time, persistence excluded
    pub latency_ms: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRecord {
    pub id: i64,
    pub timestamp: DateTime<Utc>,
    pub input_data: String,
    pub prediction_score: f64,
    pub is_fraud: bool,
    pub latency_ms: f64,
}

/// Dashboard KPIs over a window of recent predictions
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PredictionSummary {
    pub total: u64,
    pub fraud_count: u64,
    /// Percentage of the window flagged as fraud
    pub fraud_rate: f64,
    pub avg_latency_ms: f64,
    pub max_latency_ms: f64,
    pub avg_score: f64,
}

impl PredictionSummary {
    pub(crate) fn from_window(total: u64, fraud_count: u64, avg_latency: f64, max_latency: f64, avg_score: f64) -> Self {
        let fraud_rate = if total == 0 {
            0.0
        } else {
            fraud_count as f64 / total as f64 * 100.0
        };

        Self {
            total,
            fraud_count,
            fraud_rate,
            avg_latency_ms: avg_latency,
            max_latency_ms: max_latency,
            avg_score,
        }
    }
}
