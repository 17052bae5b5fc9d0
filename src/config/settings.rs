use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::crypto::{KdfParams, DEFAULT_KDF_ITERATIONS, MIN_KDF_ITERATIONS};
use crate::errors::{CredVaultError, Result};

/// Project-level configuration, loaded from `.credvault.toml`.
///
/// Every field has a sensible default so CredVault works out-of-the-box
/// without any config file at all.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Directory (relative to the working directory) holding vault files.
    #[serde(default = "default_vault_dir")]
    pub vault_dir: String,

    /// Owner identity used when `--owner` is not given.
    #[serde(default)]
    pub default_owner: Option<String>,

    /// PBKDF2 iteration count for newly created vaults (default: 10 000).
    /// Existing vaults keep the count recorded in their header.
    #[serde(default = "default_kdf_iterations")]
    pub kdf_iterations: u32,

    /// Wrong master passwords tolerated per prompt (default: 3).
    #[serde(default = "default_max_credential_attempts")]
    pub max_credential_attempts: u32,

    /// Seconds an unlocked record stays editable.  No limit when unset.
    #[serde(default)]
    pub unlock_timeout_secs: Option<u64>,
}

// ── Serde default helpers ────────────────────────────────────────────

fn default_vault_dir() -> String {
    ".credvault".to_string()
}

fn default_kdf_iterations() -> u32 {
    DEFAULT_KDF_ITERATIONS
}

fn default_max_credential_attempts() -> u32 {
    3
}

// ── Implementation ───────────────────────────────────────────────────

impl Default for Settings {
    fn default() -> Self {
        Self {
            vault_dir: default_vault_dir(),
            default_owner: None,
            kdf_iterations: default_kdf_iterations(),
            max_credential_attempts: default_max_credential_attempts(),
            unlock_timeout_secs: None,
        }
    }
}

impl Settings {
    /// Name of the config file we look for in the project root.
    const FILE_NAME: &'static str = ".credvault.toml";

    /// Load settings from `<project_dir>/.credvault.toml`.
    ///
    /// If the file does not exist, sensible defaults are returned.
    /// If the file exists but cannot be parsed or holds out-of-range
    /// values, an error is returned.
    pub fn load(project_dir: &Path) -> Result<Self> {
        let config_path = project_dir.join(Self::FILE_NAME);

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&config_path)?;

        let settings: Settings = toml::from_str(&contents).map_err(|e| {
            CredVaultError::ConfigError(format!("Failed to parse {}: {e}", config_path.display()))
        })?;

        settings.validate()?;
        Ok(settings)
    }

    /// Check value ranges; also run after CLI overrides are applied.
    pub fn validate(&self) -> Result<()> {
        if self.kdf_iterations < MIN_KDF_ITERATIONS {
            return Err(CredVaultError::ConfigError(format!(
                "kdf_iterations must be at least {MIN_KDF_ITERATIONS} (got {})",
                self.kdf_iterations
            )));
        }
        if self.max_credential_attempts < 1 {
            return Err(CredVaultError::ConfigError(
                "max_credential_attempts must be at least 1".into(),
            ));
        }
        if self.vault_dir.trim().is_empty() {
            return Err(CredVaultError::ConfigError(
                "vault_dir cannot be empty".into(),
            ));
        }
        Ok(())
    }

    /// Build the full path to the vault directory.
    ///
    /// Example: `project_dir/.credvault`
    pub fn vault_dir(&self, project_dir: &Path) -> PathBuf {
        project_dir.join(&self.vault_dir)
    }

    /// KDF parameters for newly created vaults.
    pub fn kdf_params(&self) -> Result<KdfParams> {
        KdfParams::new(self.kdf_iterations)
    }

    /// The configured unlock window, if any.
    pub fn unlock_timeout(&self) -> Option<Duration> {
        self.unlock_timeout_secs.map(Duration::from_secs)
    }
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn default_settings_are_sensible() {
        let s = Settings::default();
        assert_eq!(s.vault_dir, ".credvault");
        assert_eq!(s.default_owner, None);
        assert_eq!(s.kdf_iterations, 10_000);
        assert_eq!(s.max_credential_attempts, 3);
        assert_eq!(s.unlock_timeout(), None);
    }

    #[test]
    fn load_returns_defaults_when_no_config_file() {
        let tmp = TempDir::new().unwrap();
        let settings = Settings::load(tmp.path()).unwrap();
        assert_eq!(settings.vault_dir, ".credvault");
    }

    #[test]
    fn load_parses_toml_file() {
        let tmp = TempDir::new().unwrap();
        let config = r#"
vault_dir = "secrets"
default_owner = "alice@example.com"
kdf_iterations = 20000
max_credential_attempts = 5
unlock_timeout_secs = 120
"#;
        fs::write(tmp.path().join(".credvault.toml"), config).unwrap();

        let settings = Settings::load(tmp.path()).unwrap();
        assert_eq!(settings.vault_dir, "secrets");
        assert_eq!(settings.default_owner.as_deref(), Some("alice@example.com"));
        assert_eq!(settings.kdf_params().unwrap().iterations, 20_000);
        assert_eq!(settings.max_credential_attempts, 5);
        assert_eq!(settings.unlock_timeout(), Some(Duration::from_secs(120)));
    }

    #[test]
    fn load_uses_defaults_for_missing_fields() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(".credvault.toml"), "vault_dir = \"v\"\n").unwrap();

        let settings = Settings::load(tmp.path()).unwrap();
        assert_eq!(settings.vault_dir, "v");
        assert_eq!(settings.kdf_iterations, 10_000);
    }

    #[test]
    fn load_errors_on_invalid_toml() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(".credvault.toml"), "not valid {{toml").unwrap();
        assert!(Settings::load(tmp.path()).is_err());
    }

    #[test]
    fn load_rejects_weak_kdf_settings() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(".credvault.toml"), "kdf_iterations = 10\n").unwrap();

        let err = Settings::load(tmp.path()).unwrap_err();
        assert!(matches!(err, CredVaultError::ConfigError(_)));
    }

    #[test]
    fn vault_dir_respects_custom_setting() {
        let s = Settings {
            vault_dir: "secrets".to_string(),
            ..Settings::default()
        };
        let project = Path::new("/home/user/project");
        assert_eq!(s.vault_dir(project), PathBuf::from("/home/user/project/secrets"));
    }
}
