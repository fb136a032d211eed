//! Initialize command - creates a new ControlVault site.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use console::style;
use controlvault_config::{ControlVaultConfig, Paths};

pub fn run(path: &Path) -> Result<()> {
    // Check if already initialized
    if Paths::is_initialized(path) {
        anyhow::bail!(
            "Site already initialized in {}. controlvault.toml already exists.",
            path.display()
        );
    }

    println!("Initializing new ControlVault site...");

    // Site directory plus the .controlvault/data tree the vault writes to
    fs::create_dir_all(path).context("Failed to create site directory")?;
    let mut config = ControlVaultConfig::default();
    let data_dir = path.join(&config.vault.data_dir);
    fs::create_dir_all(&data_dir).context("Failed to create data directory")?;

    // controlvault.toml with the defaults spelled out
    let config_path = Paths::project_config_file(path);
    config.site.name = path
        .file_name()
        .map_or_else(|| "controlvault-site".to_string(), |n| n.to_string_lossy().to_string());
    let config_content =
        toml::to_string_pretty(&config).context("Failed to serialize configuration")?;
    fs::write(&config_path, config_content).context("Failed to write controlvault.toml")?;

    // .gitignore keeping local state out of version control
    let gitignore = "\
# ControlVault local state
.controlvault/
controlvault.local.toml
";
    fs::write(path.join(".gitignore"), gitignore).context("Failed to write .gitignore")?;

    println!("{} {}", style("Initialized site in").green(), path.display());
    println!();
    println!("Next steps:");
    println!("  controlvault users register --id U001 --username <name> \\");
    println!("      --password <token> --role admin -p {}", path.display());
    println!("  controlvault session -p {}", path.display());

    Ok(())
}
