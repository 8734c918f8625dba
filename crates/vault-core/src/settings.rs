//! Vault settings management
//!
//! Stores non-sensitive configuration in a plain JSON file next to the
//! vault store. Missing files and missing fields fall back to defaults.

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{Result, VaultError};
use crate::record::DEFAULT_STORAGE_KEY;

/// Where the vault record is persisted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// JSON file in the data directory
    #[default]
    File,
    /// OS keychain
    Keychain,
}

impl std::fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::File => write!(f, "file"),
            Self::Keychain => write!(f, "keychain"),
        }
    }
}

impl std::str::FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "file" => Ok(Self::File),
            "keychain" => Ok(Self::Keychain),
            other => Err(format!("Unknown storage backend: {}", other)),
        }
    }
}

/// Vault configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VaultSettings {
    /// Relying-party identifier: the application's host domain
    pub rp_id: String,
    /// Relying-party display name shown in authenticator prompts
    pub rp_name: String,
    /// Account name attached to created credentials
    pub user_name: String,
    /// Storage key of the vault record
    pub storage_key: String,
    /// Backend holding the vault record
    pub backend: StorageBackend,
}

impl Default for VaultSettings {
    fn default() -> Self {
        Self {
            rp_id: "localhost".to_string(),
            rp_name: "Freedom Family Hub".to_string(),
            user_name: "member".to_string(),
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            backend: StorageBackend::File,
        }
    }
}

/// Default data directory for the vault
pub fn default_data_dir() -> Result<PathBuf> {
    ProjectDirs::from("org", "freedom-family-hub", "hub-vault")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .ok_or_else(|| VaultError::Settings("Could not determine data directory".to_string()))
}

/// Settings manager
pub struct SettingsManager {
    settings_file: PathBuf,
    settings: VaultSettings,
}

impl SettingsManager {
    /// Load `settings.json` from `storage_dir`, or defaults when absent
    pub fn new(storage_dir: &Path) -> Result<Self> {
        let settings_file = storage_dir.join("settings.json");
        let settings = Self::load_from_file(&settings_file)?;

        Ok(Self {
            settings_file,
            settings,
        })
    }

    fn load_from_file(path: &Path) -> Result<VaultSettings> {
        if !path.exists() {
            debug!("No settings file found, using defaults");
            return Ok(VaultSettings::default());
        }

        let contents = std::fs::read_to_string(path)
            .map_err(|e| VaultError::Settings(format!("Failed to read {:?}: {}", path, e)))?;
        let settings: VaultSettings = serde_json::from_str(&contents)
            .map_err(|e| VaultError::Settings(format!("Failed to parse {:?}: {}", path, e)))?;
        debug!("Loaded settings from {:?}", path);
        Ok(settings)
    }

    /// Save settings to file
    pub async fn save(&self) -> Result<()> {
        let contents = serde_json::to_string_pretty(&self.settings)
            .map_err(|e| VaultError::Settings(e.to_string()))?;

        if let Some(parent) = self.settings_file.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| VaultError::Settings(e.to_string()))?;
        }

        // Write atomically using temp file
        let temp_path = self.settings_file.with_extension("tmp");
        tokio::fs::write(&temp_path, &contents)
            .await
            .map_err(|e| VaultError::Settings(e.to_string()))?;
        tokio::fs::rename(&temp_path, &self.settings_file)
            .await
            .map_err(|e| VaultError::Settings(e.to_string()))?;

        debug!("Saved settings to {:?}", self.settings_file);
        Ok(())
    }

    /// Get current settings
    pub fn get(&self) -> &VaultSettings {
        &self.settings
    }

    /// Get mutable settings
    pub fn get_mut(&mut self) -> &mut VaultSettings {
        &mut self.settings
    }

    /// Update settings and save
    pub async fn update(&mut self, settings: VaultSettings) -> Result<()> {
        self.settings = settings;
        self.save().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_settings_default() {
        let temp_dir = TempDir::new().unwrap();
        let manager = SettingsManager::new(temp_dir.path()).unwrap();

        let settings = manager.get();
        assert_eq!(settings.storage_key, "biometric.vault.v1");
        assert_eq!(settings.backend, StorageBackend::File);
        assert_eq!(settings.rp_id, "localhost");
    }

    #[tokio::test]
    async fn test_settings_persistence() {
        let temp_dir = TempDir::new().unwrap();

        {
            let mut manager = SettingsManager::new(temp_dir.path()).unwrap();
            manager.get_mut().rp_id = "hub.example.org".to_string();
            manager.get_mut().backend = StorageBackend::Keychain;
            manager.save().await.unwrap();
        }

        {
            let manager = SettingsManager::new(temp_dir.path()).unwrap();
            assert_eq!(manager.get().rp_id, "hub.example.org");
            assert_eq!(manager.get().backend, StorageBackend::Keychain);
        }
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(
            temp_dir.path().join("settings.json"),
            r#"{ "rpId": "hub.example.org", "backend": "keychain" }"#,
        )
        .unwrap();

        let manager = SettingsManager::new(temp_dir.path()).unwrap();
        assert_eq!(manager.get().rp_id, "hub.example.org");
        assert_eq!(manager.get().backend, StorageBackend::Keychain);
        assert_eq!(manager.get().rp_name, "Freedom Family Hub");
    }

    #[test]
    fn test_backend_from_str() {
        assert_eq!("Keychain".parse::<StorageBackend>(), Ok(StorageBackend::Keychain));
        assert_eq!("file".parse::<StorageBackend>(), Ok(StorageBackend::File));
        assert!("cloud".parse::<StorageBackend>().is_err());
    }

    #[test]
    fn test_invalid_file_is_settings_error() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join("settings.json"), "{ nope").unwrap();

        assert!(matches!(
            SettingsManager::new(temp_dir.path()),
            Err(VaultError::Settings(_))
        ));
    }
}
