//! Configuration module

use std::env;

use fraud_core::{ConfigError, FraudConfig};

/// Hard cap on dashboard window size
pub const MAX_WINDOW: usize = 10_000;

/// Server configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Bind address
    pub host: String,

    /// Server port
    pub port: u16,

    /// Default number of recent predictions served to the dashboard
    pub dashboard_window: usize,

    /// Artifact paths, threshold and database location
    pub fraud: FraudConfig,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),

            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(5001),

            dashboard_window: env::var("DASHBOARD_WINDOW")
                .ok()
                .and_then(|w| w.parse().ok())
                .unwrap_or(1000)
                .clamp(1, MAX_WINDOW),

            fraud: FraudConfig::serving_from_env()?,
        })
    }

    /// Resolve a requested window against the default and the cap
    pub fn window(&self, requested: Option<usize>) -> usize {
        requested.unwrap_or(self.dashboard_window).clamp(1, MAX_WINDOW)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5001,
            dashboard_window: 1000,
            fraud: FraudConfig::default(),
        }
    }
}
