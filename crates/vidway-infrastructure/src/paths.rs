//! Default storage locations.

use std::path::PathBuf;

use vidway_core::error::{GatewayError, Result};

/// Returns the default data directory (`~/.vidway`).
pub fn default_data_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| GatewayError::config("failed to determine home directory"))?;
    Ok(home.join(".vidway"))
}
