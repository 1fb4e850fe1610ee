use std::path::Path;

use super::scaler::StandardScaler;
use crate::logic::artifact::{load_json, save_json, ArtifactError};

/// Persist the fitted scaler for the scoring service
pub fn save_scaler(scaler: &StandardScaler, path: &Path) -> Result<(), ArtifactError> {
    save_json(scaler, path)?;
    log::info!("Scaler saved to {}", path.display());
    Ok(())
}

/// Load scaler from disk with validation
pub fn load_scaler(path: &Path) -> Result<StandardScaler, ArtifactError> {
    let scaler: StandardScaler = load_json(path)?;
    scaler.validate()?;
    log::info!(
        "Scaler loaded from {} ({} features, fitted on {} rows)",
        path.display(),
        scaler.feature_count(),
        scaler.samples_seen()
    );
    Ok(scaler)
}
