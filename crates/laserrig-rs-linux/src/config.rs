use laserrig_rs::{RigConfig, RigError};
use log::{error, info};
use std::fs;
use std::path::Path;

/// Reads a `RigConfig` from a JSON file. Missing fields take their default value.
pub fn load_config(path: impl AsRef<Path>) -> Result<RigConfig, RigError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|e| {
        error!("[CFG] Cannot read {}: {}", path.display(), e);
        RigError::IoError
    })?;
    let config = parse_config(&text)?;
    info!("[CFG] Loaded {}", path.display());
    Ok(config)
}

fn parse_config(text: &str) -> Result<RigConfig, RigError> {
    serde_json::from_str(text).map_err(|e| {
        error!("[CFG] Invalid configuration: {}", e);
        RigError::ProtocolError("Invalid configuration file")
    })
}
