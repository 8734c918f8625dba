//! OS Keychain storage backend
//!
//! Uses the system keychain for storage:
//! - macOS: Keychain
//! - Windows: Credential Manager (DPAPI)
//! - Linux: Secret Service (GNOME Keyring, KWallet)

use async_trait::async_trait;
use keyring::Entry;
use tracing::{debug, warn};

use super::KeyValueStore;
use crate::error::{Result, VaultError};

/// Default service name used for keychain entries
pub const DEFAULT_SERVICE_NAME: &str = "freedom-family-hub";

/// OS Keychain storage backend
pub struct KeychainStore {
    /// Keychain service the entries are filed under
    service: String,
    /// Whether keychain is available
    available: bool,
}

impl KeychainStore {
    /// Create a keychain store filed under `service`
    pub fn new(service: Option<&str>) -> Self {
        let service = service.unwrap_or(DEFAULT_SERVICE_NAME).to_string();
        let available = Self::test_availability(&service);

        if available {
            debug!("Keychain storage is available");
        } else {
            warn!("Keychain storage is not available");
        }

        Self { service, available }
    }

    /// Test if the keychain is available
    fn test_availability(service: &str) -> bool {
        match Entry::new(service, "__test_availability__") {
            Ok(entry) => {
                if entry.set_password("test").is_ok() {
                    let _ = entry.delete_password();
                    true
                } else {
                    false
                }
            }
            Err(_) => false,
        }
    }

    fn get_entry(&self, key: &str) -> Result<Entry> {
        if !self.available {
            return Err(VaultError::StorageError(
                "Keychain not available".to_string(),
            ));
        }

        Entry::new(&self.service, key).map_err(keychain_error)
    }

    /// Check if keychain is available
    pub fn is_available(&self) -> bool {
        self.available
    }
}

#[async_trait]
impl KeyValueStore for KeychainStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let entry = self.get_entry(key)?;

        match entry.get_password() {
            Ok(value) => {
                debug!("Retrieved key from keychain: {}", key);
                Ok(Some(value))
            }
            Err(keyring::Error::NoEntry) => {
                debug!("Key not found in keychain: {}", key);
                Ok(None)
            }
            Err(e) => Err(keychain_error(e)),
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let entry = self.get_entry(key)?;
        entry.set_password(value).map_err(keychain_error)?;

        debug!("Stored key in keychain: {}", key);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let entry = self.get_entry(key)?;

        match entry.delete_password() {
            Ok(()) => {
                debug!("Deleted key from keychain: {}", key);
                Ok(())
            }
            Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(keychain_error(e)),
        }
    }

    fn backend_name(&self) -> &'static str {
        #[cfg(target_os = "macos")]
        return "macOS Keychain";

        #[cfg(target_os = "windows")]
        return "Windows Credential Manager";

        #[cfg(target_os = "linux")]
        return "Linux Secret Service";

        #[cfg(not(any(target_os = "macos", target_os = "windows", target_os = "linux")))]
        return "System Keychain";
    }
}

fn keychain_error(err: keyring::Error) -> VaultError {
    VaultError::StorageError(format!("Keychain error: {}", err))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unavailable_keychain_reports_storage_error() {
        let store = KeychainStore::new(Some("hub-vault-test"));
        if store.is_available() {
            return;
        }

        assert!(matches!(
            store.get("anything").await,
            Err(VaultError::StorageError(_))
        ));
    }
}
