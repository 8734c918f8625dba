//! Platform authenticator seam
//!
//! The vault talks to the authenticator only through [`Authenticator`], so
//! a WebAuthn bridge, an OS secure-enclave binding or the bundled
//! [`SoftwareAuthenticator`] can be injected interchangeably.

mod software;
mod types;
mod verifier;

use async_trait::async_trait;
use thiserror::Error;

pub use software::SoftwareAuthenticator;
pub(crate) use software::short_id;
pub use types::{
    Assertion, AssertionRequest, AuthenticatorAttachment, Credential, CredentialCreationOptions,
    PrfOutput, RelyingParty, ResidentKey, UserVerification, COSE_ALG_ES256,
};
pub use verifier::{AutoApprove, Deny, UserVerifier, VerificationPurpose, VerificationRequest};

/// Errors reported by an authenticator
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthenticatorError {
    /// The user dismissed the prompt
    #[error("User cancelled the prompt")]
    Cancelled,

    /// The platform refused the request
    #[error("Request not allowed: {0}")]
    NotAllowed(String),

    /// None of the allowed credentials exist on this authenticator
    #[error("Credential not found on this authenticator")]
    CredentialNotFound,

    /// The platform has no public-key credential capability
    #[error("Authenticator not supported on this platform")]
    Unsupported,

    /// Platform-specific internal failure
    #[error("Platform error: {0}")]
    Platform(String),
}

/// Public-key credential authenticator
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Whether the runtime exposes a public-key credential authenticator
    fn is_available(&self) -> bool;

    /// Whether assertions can carry PRF extension output
    fn supports_prf(&self) -> bool;

    /// Create a new credential. Suspends on the user prompt.
    async fn create_credential(
        &self,
        options: CredentialCreationOptions,
    ) -> Result<Credential, AuthenticatorError>;

    /// Produce an assertion from one of `request.allow_credentials`.
    /// Suspends on the user prompt.
    async fn get_assertion(&self, request: AssertionRequest) -> Result<Assertion, AuthenticatorError>;

    /// Drop a credential the vault no longer references. Platforms that
    /// cannot delete credentials programmatically keep the default no-op.
    async fn forget_credential(&self, _credential_id: &[u8]) -> Result<(), AuthenticatorError> {
        Ok(())
    }
}
