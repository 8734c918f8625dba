//! Software platform authenticator
//!
//! Emulates a platform authenticator for hosts without WebAuthn: each
//! credential owns a random 32-byte secret, and the PRF extension is
//! HMAC-SHA256(secret, salt) - the same construction CTAP2 `hmac-secret`
//! uses. Credential secrets live in a [`KeyValueStore`] (OS keychain for
//! real use, memory for tests) and every operation is gated by a
//! [`UserVerifier`].

use async_trait::async_trait;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use rand::{rngs::OsRng, RngCore};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::sync::Arc;
use tracing::{debug, info};
use zeroize::Zeroizing;

use super::{
    Assertion, AssertionRequest, Authenticator, AuthenticatorAttachment, AuthenticatorError,
    Credential, CredentialCreationOptions, PrfOutput, ResidentKey, UserVerifier,
    VerificationPurpose, VerificationRequest, COSE_ALG_ES256,
};
use crate::storage::{KeyValueStore, MemoryStore};

type HmacSha256 = Hmac<Sha256>;

/// Key prefix for credential entries in the backing store
const CREDENTIAL_KEY_PREFIX: &str = "authenticator.credential.";

/// Length of generated credential identifiers
const CREDENTIAL_ID_LEN: usize = 16;

/// Persisted credential material
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredCredential {
    rp_id: String,
    /// base64url user handle
    user_handle: String,
    /// base64url PRF secret
    secret: String,
    created_at: DateTime<Utc>,
}

/// Software implementation of [`Authenticator`]
///
/// Every create and assert goes through the [`UserVerifier`], whatever
/// `user_verification` the request carries, so assertions always report
/// `user_verified`. Credentials are non-discoverable.
pub struct SoftwareAuthenticator {
    credentials: Arc<dyn KeyValueStore>,
    verifier: Arc<dyn UserVerifier>,
    supported: bool,
    prf: bool,
}

impl SoftwareAuthenticator {
    /// Authenticator whose credentials live in `credentials`
    pub fn new(credentials: Arc<dyn KeyValueStore>, verifier: Arc<dyn UserVerifier>) -> Self {
        Self {
            credentials,
            verifier,
            supported: true,
            prf: true,
        }
    }

    /// Authenticator with a private in-memory credential store
    pub fn in_memory(verifier: Arc<dyn UserVerifier>) -> Self {
        Self::new(Arc::new(MemoryStore::new()), verifier)
    }

    /// A platform that exposes no authenticator at all
    pub fn unsupported() -> Self {
        Self {
            supported: false,
            ..Self::in_memory(Arc::new(super::Deny))
        }
    }

    /// Toggle PRF extension support
    pub fn with_prf(mut self, prf: bool) -> Self {
        self.prf = prf;
        self
    }

    /// Delete a credential, as the OS does when the user removes a passkey
    pub async fn remove_credential(&self, credential_id: &[u8]) -> Result<(), AuthenticatorError> {
        self.credentials
            .delete(&credential_key(credential_id))
            .await
            .map_err(|e| AuthenticatorError::Platform(e.to_string()))?;
        info!("Removed credential {}", short_id(credential_id));
        Ok(())
    }

    async fn load_credential(
        &self,
        credential_id: &[u8],
    ) -> Result<Option<StoredCredential>, AuthenticatorError> {
        let value = self
            .credentials
            .get(&credential_key(credential_id))
            .await
            .map_err(|e| AuthenticatorError::Platform(e.to_string()))?;

        value
            .map(|json| {
                serde_json::from_str(&json)
                    .map_err(|e| AuthenticatorError::Platform(format!("Corrupt credential: {}", e)))
            })
            .transpose()
    }

    async fn verify_user(
        &self,
        rp_id: &str,
        purpose: VerificationPurpose,
    ) -> Result<(), AuthenticatorError> {
        let request = VerificationRequest {
            rp_id: rp_id.to_string(),
            purpose,
        };
        self.verifier.verify(&request).await
    }
}

#[async_trait]
impl Authenticator for SoftwareAuthenticator {
    fn is_available(&self) -> bool {
        self.supported
    }

    fn supports_prf(&self) -> bool {
        self.supported && self.prf
    }

    async fn create_credential(
        &self,
        options: CredentialCreationOptions,
    ) -> Result<Credential, AuthenticatorError> {
        if !self.supported {
            return Err(AuthenticatorError::Unsupported);
        }
        if options.algorithm != COSE_ALG_ES256 {
            return Err(AuthenticatorError::NotAllowed(format!(
                "Unsupported algorithm: {}",
                options.algorithm
            )));
        }
        if options.attachment != AuthenticatorAttachment::Platform {
            return Err(AuthenticatorError::NotAllowed(
                "Only platform attachment is supported".to_string(),
            ));
        }
        // Credentials are looked up by id only and cannot be discovered
        if options.resident_key == ResidentKey::Required {
            return Err(AuthenticatorError::NotAllowed(
                "Discoverable credentials are not supported".to_string(),
            ));
        }

        self.verify_user(&options.rp.id, VerificationPurpose::Register)
            .await?;

        let mut id = vec![0u8; CREDENTIAL_ID_LEN];
        OsRng.fill_bytes(&mut id);
        let mut secret = Zeroizing::new([0u8; 32]);
        OsRng.fill_bytes(&mut secret[..]);

        let stored = StoredCredential {
            rp_id: options.rp.id.clone(),
            user_handle: URL_SAFE_NO_PAD.encode(&options.user_handle),
            secret: URL_SAFE_NO_PAD.encode(&secret[..]),
            created_at: Utc::now(),
        };
        let json = serde_json::to_string(&stored)
            .map_err(|e| AuthenticatorError::Platform(e.to_string()))?;
        self.credentials
            .set(&credential_key(&id), &json)
            .await
            .map_err(|e| AuthenticatorError::Platform(e.to_string()))?;

        info!(
            "Created credential {} for {}",
            short_id(&id),
            options.rp.id
        );

        Ok(Credential {
            id,
            prf_enabled: self.prf && options.prf,
        })
    }

    async fn get_assertion(&self, request: AssertionRequest) -> Result<Assertion, AuthenticatorError> {
        if !self.supported {
            return Err(AuthenticatorError::Unsupported);
        }

        // Credentials are not enumerable, so an allow list is required
        let mut found = None;
        for id in &request.allow_credentials {
            if let Some(stored) = self.load_credential(id).await? {
                if stored.rp_id == request.rp_id {
                    found = Some((id.clone(), stored));
                    break;
                }
            }
        }
        let (credential_id, stored) = found.ok_or(AuthenticatorError::CredentialNotFound)?;

        self.verify_user(&request.rp_id, VerificationPurpose::Authenticate)
            .await?;

        let prf_output = match (self.prf, request.prf_salt) {
            (true, Some(salt)) => Some(evaluate_prf(&stored.secret, &salt)?),
            _ => None,
        };
        let user_handle = URL_SAFE_NO_PAD.decode(&stored.user_handle).ok();

        debug!("Produced assertion with credential {}", short_id(&credential_id));

        Ok(Assertion {
            credential_id,
            user_handle,
            user_verified: true,
            prf_output,
        })
    }

    async fn forget_credential(&self, credential_id: &[u8]) -> Result<(), AuthenticatorError> {
        self.remove_credential(credential_id).await
    }
}

fn evaluate_prf(encoded_secret: &str, salt: &[u8; 32]) -> Result<PrfOutput, AuthenticatorError> {
    let secret = Zeroizing::new(
        URL_SAFE_NO_PAD
            .decode(encoded_secret)
            .map_err(|e| AuthenticatorError::Platform(format!("Corrupt credential: {}", e)))?,
    );

    let mut mac = HmacSha256::new_from_slice(&secret[..])
        .map_err(|e| AuthenticatorError::Platform(e.to_string()))?;
    mac.update(salt);

    let mut output = Zeroizing::new([0u8; 32]);
    output.copy_from_slice(&mac.finalize().into_bytes());
    Ok(output)
}

fn credential_key(credential_id: &[u8]) -> String {
    format!("{}{}", CREDENTIAL_KEY_PREFIX, hex::encode(credential_id))
}

/// Log-safe credential id prefix
pub(crate) fn short_id(credential_id: &[u8]) -> String {
    hex::encode(&credential_id[..credential_id.len().min(4)])
}
