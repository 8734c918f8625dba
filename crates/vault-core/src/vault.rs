//! Biometric vault orchestration

use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use zeroize::Zeroizing;

use crate::authenticator::{
    short_id, Assertion, AssertionRequest, Authenticator, Credential,
    CredentialCreationOptions, RelyingParty, UserVerification,
};
use crate::crypto::{self, SecretString, VaultKey};
use crate::error::{Result, VaultError};
use crate::record::VaultRecord;
use crate::settings::VaultSettings;
use crate::storage::KeyValueStore;

/// Vault state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VaultState {
    /// No record stored
    Unconfigured,
    /// A record is stored and unlock may be attempted
    Configured,
}

/// A single locally held secret, sealed under a key only the platform
/// authenticator can reproduce after user verification.
///
/// `enable`, `unlock` and `disable` are serialized through an internal lock,
/// so one vault may be shared between tasks behind an `Arc`.
pub struct BiometricVault {
    authenticator: Arc<dyn Authenticator>,
    store: Arc<dyn KeyValueStore>,
    settings: VaultSettings,
    /// PRF salt for this relying party
    prf_salt: [u8; 32],
    /// Serializes operations touching the record
    lock: Mutex<()>,
}

impl BiometricVault {
    /// Create a vault over the given authenticator and store
    pub fn new(
        authenticator: Arc<dyn Authenticator>,
        store: Arc<dyn KeyValueStore>,
        settings: VaultSettings,
    ) -> Self {
        let prf_salt = crypto::prf_salt(&settings.rp_id);

        Self {
            authenticator,
            store,
            settings,
            prf_salt,
            lock: Mutex::new(()),
        }
    }

    /// Whether the platform can run the vault at all.
    ///
    /// Requires an authenticator with PRF support. Never fails.
    pub fn is_available(&self) -> bool {
        self.authenticator.is_available() && self.authenticator.supports_prf()
    }

    /// Seal `secret` under a newly created credential and persist it,
    /// replacing any existing record.
    ///
    /// Prompts the user twice: once to create the credential and once to
    /// assert with it. Nothing is written unless every step succeeds. The
    /// credential of a replaced record, or the new one on failure, is handed
    /// back to the authenticator to forget.
    pub async fn enable(&self, secret: &str) -> Result<()> {
        let _guard = self.lock.lock().await;
        self.ensure_available()?;

        if secret.is_empty() {
            return Err(VaultError::InvalidSecret);
        }

        let previous = self.load_record().await.ok().flatten();

        let user_handle = crypto::generate_user_handle();
        let options = CredentialCreationOptions::platform(
            RelyingParty {
                id: self.settings.rp_id.clone(),
                name: self.settings.rp_name.clone(),
            },
            self.settings.user_name.clone(),
            user_handle.to_vec(),
            crypto::generate_challenge().to_vec(),
        );

        let credential = self.authenticator.create_credential(options).await?;
        debug!("Created vault credential {}", short_id(&credential.id));

        if let Err(err) = self.seal_and_store(&credential, secret).await {
            self.forget_credential(&credential.id).await;
            return Err(err);
        }

        info!(
            "Biometric vault enabled with credential {} ({})",
            short_id(&credential.id),
            self.store.backend_name()
        );

        if let Some(previous) = previous {
            if previous.credential_id != credential.id {
                self.forget_credential(&previous.credential_id).await;
            }
        }
        Ok(())
    }

    /// Recover the sealed secret. Prompts the user once; never mutates the
    /// stored record.
    pub async fn unlock(&self) -> Result<SecretString> {
        let _guard = self.lock.lock().await;
        self.ensure_available()?;

        let record = self.load_record().await?.ok_or(VaultError::NotConfigured)?;

        let assertion = self
            .authenticator
            .get_assertion(self.assertion_request(&record.credential_id))
            .await?;
        let key = self.key_from_assertion(&assertion, &record.credential_id)?;

        let plaintext = Zeroizing::new(crypto::decrypt(&record.sealed, &key)?);
        let secret = std::str::from_utf8(&plaintext)
            .map_err(|_| VaultError::DecryptionFailed)?
            .to_string();

        info!(
            "Biometric vault unlocked with credential {}",
            short_id(&record.credential_id)
        );
        Ok(SecretString::new(secret))
    }

    /// Erase the record and forget its credential. Succeeds when there is
    /// nothing to erase.
    pub async fn disable(&self) -> Result<()> {
        let _guard = self.lock.lock().await;

        let record = self.load_record().await.ok().flatten();
        self.store.delete(&self.settings.storage_key).await?;

        if let Some(record) = record {
            self.forget_credential(&record.credential_id).await;
        }

        info!("Biometric vault disabled");
        Ok(())
    }

    /// Whether a record is stored. No decryption, no prompt.
    pub async fn has_record(&self) -> Result<bool> {
        self.store.contains(&self.settings.storage_key).await
    }

    /// Current vault state
    pub async fn state(&self) -> Result<VaultState> {
        Ok(if self.has_record().await? {
            VaultState::Configured
        } else {
            VaultState::Unconfigured
        })
    }

    /// Settings the vault was built with
    pub fn settings(&self) -> &VaultSettings {
        &self.settings
    }

    /// Name of the backend holding the record
    pub fn backend_name(&self) -> &'static str {
        self.store.backend_name()
    }

    fn ensure_available(&self) -> Result<()> {
        if self.is_available() {
            Ok(())
        } else {
            debug!("Biometric vault requested on a platform without PRF authenticator");
            Err(VaultError::Unavailable)
        }
    }

    /// Steps of `enable` after credential creation. The single store write
    /// is the last step.
    async fn seal_and_store(&self, credential: &Credential, secret: &str) -> Result<()> {
        if !credential.prf_enabled {
            return Err(VaultError::AuthenticationFailed(
                "Credential was created without PRF support".to_string(),
            ));
        }

        let assertion = self
            .authenticator
            .get_assertion(self.assertion_request(&credential.id))
            .await?;
        let key = self.key_from_assertion(&assertion, &credential.id)?;

        let sealed = crypto::encrypt(secret.as_bytes(), &key)?;
        let record = VaultRecord::new(credential.id.clone(), sealed);

        self.store
            .set(&self.settings.storage_key, &record.to_json()?)
            .await
    }

    /// Best effort: a credential the authenticator keeps is only clutter
    async fn forget_credential(&self, credential_id: &[u8]) {
        if let Err(e) = self.authenticator.forget_credential(credential_id).await {
            warn!(
                "Could not remove credential {}: {}",
                short_id(credential_id),
                e
            );
        }
    }

    async fn load_record(&self) -> Result<Option<VaultRecord>> {
        match self.store.get(&self.settings.storage_key).await? {
            Some(json) => VaultRecord::from_json(&json).map(Some),
            None => Ok(None),
        }
    }

    fn assertion_request(&self, credential_id: &[u8]) -> AssertionRequest {
        AssertionRequest {
            rp_id: self.settings.rp_id.clone(),
            challenge: crypto::generate_challenge().to_vec(),
            allow_credentials: vec![credential_id.to_vec()],
            user_verification: UserVerification::Required,
            prf_salt: Some(self.prf_salt),
        }
    }

    /// Check the assertion came from `expected_id` with user verification
    /// and derive the wrapping key from its PRF output
    fn key_from_assertion(&self, assertion: &Assertion, expected_id: &[u8]) -> Result<VaultKey> {
        if assertion.credential_id != expected_id {
            return Err(VaultError::AuthenticationFailed(
                "Assertion came from an unexpected credential".to_string(),
            ));
        }
        if !assertion.user_verified {
            return Err(VaultError::AuthenticationFailed(
                "Authenticator did not verify the user".to_string(),
            ));
        }

        let prf_output = assertion.prf_output.as_ref().ok_or_else(|| {
            VaultError::AuthenticationFailed("Assertion carried no PRF output".to_string())
        })?;

        Ok(crypto::derive_key(&prf_output[..]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authenticator::{AutoApprove, SoftwareAuthenticator};
    use crate::storage::MemoryStore;

    fn test_vault() -> (BiometricVault, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let authenticator = Arc::new(SoftwareAuthenticator::in_memory(Arc::new(AutoApprove)));
        let vault = BiometricVault::new(authenticator, store.clone(), VaultSettings::default());
        (vault, store)
    }

    #[tokio::test]
    async fn test_enable_unlock_disable() {
        let (vault, _store) = test_vault();

        assert_eq!(vault.state().await.unwrap(), VaultState::Unconfigured);

        vault.enable("refresh-token-123").await.unwrap();
        assert_eq!(vault.state().await.unwrap(), VaultState::Configured);

        let secret = vault.unlock().await.unwrap();
        assert_eq!(secret.expose(), "refresh-token-123");
        assert_eq!(vault.state().await.unwrap(), VaultState::Configured);

        vault.disable().await.unwrap();
        assert_eq!(vault.state().await.unwrap(), VaultState::Unconfigured);
    }

    #[tokio::test]
    async fn test_unlock_without_record() {
        let (vault, _store) = test_vault();
        assert!(matches!(vault.unlock().await, Err(VaultError::NotConfigured)));
    }

    #[tokio::test]
    async fn test_empty_secret_rejected() {
        let (vault, store) = test_vault();
        assert!(matches!(vault.enable("").await, Err(VaultError::InvalidSecret)));
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_unlock_does_not_mutate_record() {
        let (vault, store) = test_vault();
        vault.enable("refresh-token-123").await.unwrap();

        let before = store.get("biometric.vault.v1").await.unwrap();
        vault.unlock().await.unwrap();
        let after = store.get("biometric.vault.v1").await.unwrap();

        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn test_custom_storage_key() {
        let store = Arc::new(MemoryStore::new());
        let authenticator = Arc::new(SoftwareAuthenticator::in_memory(Arc::new(AutoApprove)));
        let settings = VaultSettings {
            storage_key: "hub.vault.test".to_string(),
            ..VaultSettings::default()
        };
        let vault = BiometricVault::new(authenticator, store.clone(), settings);

        vault.enable("refresh-token-123").await.unwrap();
        assert!(store.contains("hub.vault.test").await.unwrap());
        assert!(!store.contains("biometric.vault.v1").await.unwrap());
    }

    #[tokio::test]
    async fn test_authenticator_without_prf_is_unavailable() {
        let store = Arc::new(MemoryStore::new());
        let authenticator =
            Arc::new(SoftwareAuthenticator::in_memory(Arc::new(AutoApprove)).with_prf(false));
        let vault = BiometricVault::new(authenticator, store.clone(), VaultSettings::default());

        assert!(!vault.is_available());
        assert!(matches!(
            vault.enable("refresh-token-123").await,
            Err(VaultError::Unavailable)
        ));
        assert!(store.is_empty().await);
    }
}
