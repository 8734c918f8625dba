//! User verification gate for software authenticators

use async_trait::async_trait;

use super::AuthenticatorError;

/// Why the user is being asked to verify
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationPurpose {
    /// Registering a new credential
    Register,
    /// Producing an assertion with an existing credential
    Authenticate,
}

/// Prompt shown to the user
#[derive(Debug, Clone)]
pub struct VerificationRequest {
    pub rp_id: String,
    pub purpose: VerificationPurpose,
}

/// Stands in for the biometric sensor: approves or rejects a prompt
#[async_trait]
pub trait UserVerifier: Send + Sync {
    /// Return `Ok(())` when the user approved, `Cancelled` when dismissed
    async fn verify(&self, request: &VerificationRequest) -> Result<(), AuthenticatorError>;
}

/// Approves every prompt
#[derive(Debug, Default, Clone, Copy)]
pub struct AutoApprove;

#[async_trait]
impl UserVerifier for AutoApprove {
    async fn verify(&self, _request: &VerificationRequest) -> Result<(), AuthenticatorError> {
        Ok(())
    }
}

/// Dismisses every prompt
#[derive(Debug, Default, Clone, Copy)]
pub struct Deny;

#[async_trait]
impl UserVerifier for Deny {
    async fn verify(&self, _request: &VerificationRequest) -> Result<(), AuthenticatorError> {
        Err(AuthenticatorError::Cancelled)
    }
}
