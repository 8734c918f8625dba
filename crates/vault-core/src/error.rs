//! Error types for vault-core

use thiserror::Error;

use crate::authenticator::AuthenticatorError;

/// Result type alias for vault operations
pub type Result<T> = std::result::Result<T, VaultError>;

/// Vault error types
///
/// Every failure is returned to the caller as one of these variants. The
/// vault never logs a failure away or repairs state on its own.
#[derive(Error, Debug)]
pub enum VaultError {
    /// The platform has no usable authenticator (or no PRF support).
    /// Callers should hide the biometric sign-in option.
    #[error("Biometric authenticator is not available on this device")]
    Unavailable,

    /// Unlock was attempted but no vault record is stored.
    #[error("Biometric vault is not configured - enable it first")]
    NotConfigured,

    /// The user dismissed the authenticator prompt.
    #[error("User cancelled the authenticator prompt")]
    UserCancelled,

    /// The authenticator or platform rejected the request
    /// (wrong device, revoked credential, missing PRF output).
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Tag verification failed: the record is corrupted or the key differs.
    #[error("Decryption failed - vault record is corrupted or was created by another credential")]
    DecryptionFailed,

    /// The persistent store could not be read or written.
    #[error("Storage error: {0}")]
    StorageError(String),

    /// The stored value could not be decoded as a vault record.
    #[error("Vault record is corrupted: {0}")]
    Corrupted(String),

    /// A cryptographic primitive failed while sealing the secret.
    #[error("Crypto error: {0}")]
    Crypto(String),

    /// `enable` was called with an empty secret.
    #[error("Secret must not be empty")]
    InvalidSecret,

    /// The settings file could not be read, parsed or written.
    #[error("Settings error: {0}")]
    Settings(String),
}

impl VaultError {
    /// Stable machine-readable code for front ends
    pub fn code(&self) -> &'static str {
        match self {
            VaultError::Unavailable => "UNAVAILABLE",
            VaultError::NotConfigured => "NOT_CONFIGURED",
            VaultError::UserCancelled => "USER_CANCELLED",
            VaultError::AuthenticationFailed(_) => "AUTHENTICATION_FAILED",
            VaultError::DecryptionFailed => "DECRYPTION_FAILED",
            VaultError::StorageError(_) => "STORAGE_ERROR",
            VaultError::Corrupted(_) => "CORRUPTED",
            VaultError::Crypto(_) => "CRYPTO_ERROR",
            VaultError::InvalidSecret => "INVALID_SECRET",
            VaultError::Settings(_) => "SETTINGS_ERROR",
        }
    }

    /// Whether re-invoking the same operation may succeed.
    ///
    /// Non-retryable failures need the caller to change something first:
    /// hide the feature, enable the vault, or clear and re-enable it.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            VaultError::UserCancelled
                | VaultError::AuthenticationFailed(_)
                | VaultError::StorageError(_)
        )
    }
}

impl From<AuthenticatorError> for VaultError {
    fn from(err: AuthenticatorError) -> Self {
        match err {
            AuthenticatorError::Cancelled => VaultError::UserCancelled,
            AuthenticatorError::Unsupported => VaultError::Unavailable,
            other => VaultError::AuthenticationFailed(other.to_string()),
        }
    }
}

// Serialized as { "code", "message" } so a UI can branch on the code
impl serde::Serialize for VaultError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeStruct;

        let mut state = serializer.serialize_struct("VaultError", 2)?;
        state.serialize_field("code", self.code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}
