//! Offline preprocessing: split the raw dataset and save the fitted scaler

use anyhow::{Context, Result};

use fraud_core::logic::preprocessing::run_preprocessing;
use fraud_core::FraudConfig;

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = FraudConfig::from_env().context("Invalid configuration")?;
    let data = run_preprocessing(&config).context("Preprocessing failed")?;

    log::info!(
        "Preprocessing complete: train={} validation={} test={} features={}",
        data.train.len(),
        data.validation.len(),
        data.test.len(),
        data.scaler.feature_count()
    );
    log::info!("Scaler saved to {}", config.data.scaler_path.display());
    Ok(())
}
