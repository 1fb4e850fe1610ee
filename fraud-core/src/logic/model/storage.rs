use std::path::Path;

use super::inference::ModelArtifact;
use crate::logic::artifact::{load_json, save_json, ArtifactError};

pub fn save_model(model: &ModelArtifact, path: &Path) -> Result<(), ArtifactError> {
    save_json(model, path)?;
    log::info!("Model saved to {}", path.display());
    Ok(())
}

/// Load model from disk with validation
pub fn load_model(path: &Path) -> Result<ModelArtifact, ArtifactError> {
    let model: ModelArtifact = load_json(path)?;
    model.validate()?;
    log::info!(
        "Model loaded from {} ({}, trained {})",
        path.display(),
        model.model_type,
        model.trained_at.format("%Y-%m-%d %H:%M:%S")
    );
    Ok(model)
}
