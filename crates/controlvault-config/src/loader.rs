//! Configuration loader with multi-source merging

use std::env;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::{ControlVaultConfig, Paths};

/// Configuration loader with builder pattern
pub struct ConfigLoader {
    project_dir: PathBuf,
    env_prefix: String,
}

impl ConfigLoader {
    /// Create a new config loader with default project directory (current dir)
    pub fn new() -> Self {
        Self {
            project_dir: env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            env_prefix: "CVT".to_string(),
        }
    }

    /// Set the project directory
    pub fn with_project_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.project_dir = dir.as_ref().to_path_buf();
        self
    }

    /// Set the environment variable prefix (default: "CVT")
    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    /// Load configuration from all sources with proper precedence
    pub fn load(self) -> Result<ControlVaultConfig> {
        let mut builder = config::Config::builder();

        // 1. Start with built-in defaults
        let defaults = ControlVaultConfig::default();
        builder = builder.add_source(config::Config::try_from(&defaults)?);

        // 2. User config (~/.config/controlvault/config.toml)
        let paths = Paths::new();
        if let Ok(user_config_file) = paths.user_config_file() {
            if user_config_file.exists() {
                builder = builder.add_source(
                    config::File::from(user_config_file)
                        .required(false)
                        .format(config::FileFormat::Toml),
                );
            }
        }

        // 3. Site config (controlvault.toml)
        let project_config_file = Paths::project_config_file(&self.project_dir);
        if project_config_file.exists() {
            builder = builder.add_source(
                config::File::from(project_config_file)
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // 4. Local config (controlvault.local.toml, gitignored)
        let local_config_file = Paths::local_config_file(&self.project_dir);
        if local_config_file.exists() {
            builder = builder.add_source(
                config::File::from(local_config_file)
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // 5. Environment variables (CVT_*)
        builder = builder.add_source(
            config::Environment::with_prefix(&self.env_prefix)
                .separator("_")
                .try_parsing(true),
        );

        // Build and deserialize
        let config = builder.build().context("Failed to build configuration")?;

        let mut vault_config: ControlVaultConfig = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        // Resolve relative paths
        vault_config.resolve_paths(&self.project_dir);

        vault_config
            .validate()
            .context("Configuration failed validation")?;

        Ok(vault_config)
    }

    /// Load configuration or return defaults if not found
    pub fn load_or_default(self) -> ControlVaultConfig {
        let project_dir = self.project_dir.clone();
        self.load().unwrap_or_else(|_| {
            let mut config = ControlVaultConfig::default();
            config.resolve_paths(&project_dir);
            config
        })
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::tempdir;

    use super::*;

    #[test]
    fn test_load_defaults() {
        let temp_dir = tempdir().expect("Failed to create temp dir");
        let config = ConfigLoader::new()
            .with_project_dir(temp_dir.path())
            .load()
            .expect("Failed to load config");

        assert_eq!(config.site.name, "controlvault-site");
        assert_eq!(config.session.max_login_attempts, 3);
    }

    #[test]
    fn test_load_site_config() {
        let temp_dir = tempdir().expect("Failed to create temp dir");
        let project_dir = temp_dir.path();

        let config_content = r#"
[site]
name = "zephyr-hq"

[vault]
users_file = "staff.txt"

[session]
max_login_attempts = 5
"#;
        fs::write(project_dir.join("controlvault.toml"), config_content)
            .expect("Failed to write config");

        let config = ConfigLoader::new()
            .with_project_dir(project_dir)
            .load()
            .expect("Failed to load config");

        assert_eq!(config.site.name, "zephyr-hq");
        assert_eq!(config.session.max_login_attempts, 5);
        assert!(config.vault.users_file.ends_with("staff.txt"));
    }

    #[test]
    fn test_local_overrides() {
        let temp_dir = tempdir().expect("Failed to create temp dir");
        let project_dir = temp_dir.path();

        fs::write(
            project_dir.join("controlvault.toml"),
            r#"
[site]
name = "zephyr-hq"
"#,
        )
        .expect("Failed to write site config");

        fs::write(
            project_dir.join("controlvault.local.toml"),
            r#"
[site]
name = "zephyr-hq-dev"
"#,
        )
        .expect("Failed to write local config");

        let config = ConfigLoader::new()
            .with_project_dir(project_dir)
            .load()
            .expect("Failed to load config");

        // Local config should override site config
        assert_eq!(config.site.name, "zephyr-hq-dev");
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let temp_dir = tempdir().expect("Failed to create temp dir");
        let project_dir = temp_dir.path();

        fs::write(
            project_dir.join("controlvault.toml"),
            r#"
[session]
max_login_attempts = 0
"#,
        )
        .expect("Failed to write config");

        assert!(
            ConfigLoader::new()
                .with_project_dir(project_dir)
                .load()
                .is_err()
        );
    }

    #[test]
    fn test_path_resolution() {
        let temp_dir = tempdir().expect("Failed to create temp dir");
        let project_dir = temp_dir.path();

        let config = ConfigLoader::new()
            .with_project_dir(project_dir)
            .load()
            .expect("Failed to load config");

        // Relative paths should be resolved to absolute
        assert!(config.vault.data_dir.is_absolute());
        assert!(config.vault.users_file.is_absolute());
        assert!(config.vault.attendance_file.is_absolute());
    }
}
