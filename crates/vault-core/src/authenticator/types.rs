//! WebAuthn-shaped request and response types

use zeroize::Zeroizing;

/// COSE algorithm identifier for ES256 (ECDSA P-256 with SHA-256)
pub const COSE_ALG_ES256: i64 = -7;

/// Where the authenticator lives relative to the client
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthenticatorAttachment {
    /// Built into the device (fingerprint reader, face sensor, TPM)
    Platform,
    /// Roaming security key
    CrossPlatform,
}

/// User verification requirement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserVerification {
    Required,
    Preferred,
    Discouraged,
}

/// Discoverable-credential requirement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResidentKey {
    Required,
    Preferred,
    Discouraged,
}

/// Relying party the credential is scoped to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelyingParty {
    /// Host domain of the application
    pub id: String,
    /// Display name shown in the platform prompt
    pub name: String,
}

/// Options for creating a new credential
#[derive(Debug, Clone)]
pub struct CredentialCreationOptions {
    pub rp: RelyingParty,
    pub user_handle: Vec<u8>,
    pub user_name: String,
    pub challenge: Vec<u8>,
    /// COSE algorithm identifier
    pub algorithm: i64,
    pub attachment: AuthenticatorAttachment,
    pub user_verification: UserVerification,
    pub resident_key: ResidentKey,
    /// Request the PRF extension at registration
    pub prf: bool,
}

impl CredentialCreationOptions {
    /// Options for a user-verified ES256 platform credential with PRF
    pub fn platform(
        rp: RelyingParty,
        user_name: impl Into<String>,
        user_handle: Vec<u8>,
        challenge: Vec<u8>,
    ) -> Self {
        Self {
            rp,
            user_handle,
            user_name: user_name.into(),
            challenge,
            algorithm: COSE_ALG_ES256,
            attachment: AuthenticatorAttachment::Platform,
            user_verification: UserVerification::Required,
            resident_key: ResidentKey::Preferred,
            prf: true,
        }
    }
}

/// A newly created credential
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    /// Raw credential identifier
    pub id: Vec<u8>,
    /// Whether the authenticator enabled the PRF extension for it
    pub prf_enabled: bool,
}

/// Request for a signed assertion
#[derive(Debug, Clone)]
pub struct AssertionRequest {
    pub rp_id: String,
    pub challenge: Vec<u8>,
    /// Credentials the assertion may come from; empty means any
    pub allow_credentials: Vec<Vec<u8>>,
    pub user_verification: UserVerification,
    /// Salt for the PRF extension evaluation
    pub prf_salt: Option<[u8; 32]>,
}

/// PRF extension result - zeroed when dropped
pub type PrfOutput = Zeroizing<[u8; 32]>;

/// Assertion returned by the authenticator
pub struct Assertion {
    /// Credential that produced the assertion
    pub credential_id: Vec<u8>,
    pub user_handle: Option<Vec<u8>>,
    /// Whether the authenticator performed user verification
    pub user_verified: bool,
    /// PRF evaluation over the requested salt, when supported
    pub prf_output: Option<PrfOutput>,
}

impl std::fmt::Debug for Assertion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Assertion")
            .field("credential_id", &hex::encode(&self.credential_id))
            .field("user_verified", &self.user_verified)
            .field("prf_output", &self.prf_output.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}
