//! # vault-core
//!
//! Biometric-backed local secret vault for Freedom Family Hub:
//! - A single AES-256-GCM sealed secret (the session refresh token)
//! - Wrapping key derived from the platform authenticator's PRF output
//! - Pluggable authenticator and key-value store, injected at construction
//! - Zeroize-on-drop handling of keys and recovered secrets

pub mod authenticator;
pub mod crypto;
pub mod error;
pub mod record;
pub mod settings;
pub mod storage;
mod vault;

pub use authenticator::{Authenticator, AuthenticatorError, SoftwareAuthenticator, UserVerifier};
pub use crypto::SecretString;
pub use error::{Result, VaultError};
pub use record::{VaultRecord, DEFAULT_STORAGE_KEY};
pub use settings::{SettingsManager, StorageBackend, VaultSettings};
pub use storage::{FileStore, KeychainStore, KeyValueStore, MemoryStore};
pub use vault::{BiometricVault, VaultState};
