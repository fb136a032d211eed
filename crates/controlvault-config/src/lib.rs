//! Configuration management for ControlVault
//!
//! Provides hierarchical configuration loading from multiple sources:
//! 1. Environment variables (CVT_* prefix, highest precedence)
//! 2. controlvault.local.toml (gitignored, local overrides)
//! 3. controlvault.toml (git-tracked, site config)
//! 4. ~/.config/controlvault/config.toml (user defaults)
//! 5. Built-in defaults (lowest precedence)

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

mod error;
mod loader;
mod paths;

pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use paths::Paths;

/// Main ControlVault configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlVaultConfig {
    pub site: SiteConfig,
    pub vault: VaultConfig,
    pub session: SessionConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Human-readable name of the protected site, used in banners.
    pub name: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            name: "controlvault-site".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VaultConfig {
    /// Directory holding the vault's flat files.
    pub data_dir: PathBuf,
    /// Credential store (users file), relative to `data_dir` unless absolute.
    pub users_file: PathBuf,
    /// Audit journal (JSON lines), relative to `data_dir` unless absolute.
    pub audit_journal: PathBuf,
    /// Attendance log, relative to `data_dir` unless absolute.
    pub attendance_file: PathBuf,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(".controlvault/data"),
            users_file: PathBuf::from("users.txt"),
            audit_journal: PathBuf::from("audit.jsonl"),
            attendance_file: PathBuf::from("attendance.txt"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Login attempts allowed before the session command gives up.
    pub max_login_attempts: u32,
    /// Whether to rewrite the credential store on logout, making badge
    /// consumption durable.
    pub persist_on_logout: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_login_attempts: 3,
            persist_on_logout: true,
        }
    }
}

impl ControlVaultConfig {
    /// Resolves relative paths: `data_dir` against the project directory,
    /// the flat files against `data_dir`.
    pub fn resolve_paths(&mut self, project_dir: &Path) {
        if self.vault.data_dir.is_relative() {
            self.vault.data_dir = project_dir.join(&self.vault.data_dir);
        }
        for file in [
            &mut self.vault.users_file,
            &mut self.vault.audit_journal,
            &mut self.vault.attendance_file,
        ] {
            if file.is_relative() {
                *file = self.vault.data_dir.join(&*file);
            }
        }
    }

    /// Checks invariants that the type system cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.session.max_login_attempts == 0 {
            return Err(ConfigError::ValidationError(
                "session.max_login_attempts must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = ControlVaultConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.session.max_login_attempts, 3);
        assert!(config.session.persist_on_logout);
    }

    #[test]
    fn zero_login_attempts_fail_validation() {
        let mut config = ControlVaultConfig::default();
        config.session.max_login_attempts = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn resolve_paths_nests_files_under_the_data_dir() {
        let mut config = ControlVaultConfig::default();
        config.resolve_paths(Path::new("/site"));

        assert_eq!(
            config.vault.data_dir,
            PathBuf::from("/site/.controlvault/data")
        );
        assert_eq!(
            config.vault.users_file,
            PathBuf::from("/site/.controlvault/data/users.txt")
        );
        assert_eq!(
            config.vault.audit_journal,
            PathBuf::from("/site/.controlvault/data/audit.jsonl")
        );
    }

    #[test]
    fn absolute_paths_are_left_alone() {
        let mut config = ControlVaultConfig::default();
        config.vault.users_file = PathBuf::from("/etc/controlvault/users.txt");
        config.resolve_paths(Path::new("/site"));

        assert_eq!(
            config.vault.users_file,
            PathBuf::from("/etc/controlvault/users.txt")
        );
    }
}
