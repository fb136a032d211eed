//! CLI command implementations.

pub mod audit;
pub mod init;
pub mod session;
pub mod users;
pub mod version;

use std::path::Path;

use anyhow::{Context, Result};
use controlvault_config::{ConfigLoader, ControlVaultConfig};

/// Loads the site configuration and makes sure the data directory exists.
pub(crate) fn load_site(project_dir: &Path) -> Result<ControlVaultConfig> {
    let config = ConfigLoader::new()
        .with_project_dir(project_dir)
        .load()
        .context("Failed to load site configuration")?;

    std::fs::create_dir_all(&config.vault.data_dir)
        .context("Failed to create the vault data directory")?;

    Ok(config)
}
