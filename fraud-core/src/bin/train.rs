//! Offline training: preprocess, fit the classifier, save the model artifact

use anyhow::{Context, Result};

use fraud_core::logic::model::train_model;
use fraud_core::FraudConfig;

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = FraudConfig::from_env().context("Invalid configuration")?;
    log::info!(
        "Training with layers {:?}, dropout {}, lr {}, batch {}, epochs {}",
        config.model.hidden_layers,
        config.model.dropout,
        config.model.learning_rate,
        config.model.batch_size,
        config.model.epochs
    );

    let report = train_model(&config).context("Training failed")?;

    log::info!(
        "Best epoch {} (val_loss {:.4}){}",
        report.history.best_epoch,
        report.history.best_val_loss,
        if report.history.stopped_early { ", stopped early" } else { "" }
    );
    log::info!("Model saved to {}", config.model.save_path.display());
    Ok(())
}
