//! Shared fakes for vault behaviour tests

#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use vault_core::authenticator::{
    Assertion, AssertionRequest, AuthenticatorError, Credential, CredentialCreationOptions,
    VerificationRequest,
};
use vault_core::{
    Authenticator, BiometricVault, MemoryStore, SoftwareAuthenticator, UserVerifier,
    VaultSettings,
};

/// Approves the first `approvals` prompts, then cancels every later one.
/// Counts every prompt it sees.
pub struct ScriptedVerifier {
    approvals: AtomicUsize,
    prompts: AtomicUsize,
}

impl ScriptedVerifier {
    pub fn approving() -> Arc<Self> {
        Arc::new(Self {
            approvals: AtomicUsize::new(usize::MAX),
            prompts: AtomicUsize::new(0),
        })
    }

    /// Approve `n` more prompts, then cancel
    pub fn cancel_after(&self, n: usize) {
        self.approvals.store(n, Ordering::SeqCst);
    }

    pub fn approve_all(&self) {
        self.approvals.store(usize::MAX, Ordering::SeqCst);
    }

    pub fn prompts(&self) -> usize {
        self.prompts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl UserVerifier for ScriptedVerifier {
    async fn verify(&self, _request: &VerificationRequest) -> Result<(), AuthenticatorError> {
        self.prompts.fetch_add(1, Ordering::SeqCst);

        let remaining = self.approvals.load(Ordering::SeqCst);
        if remaining == 0 {
            return Err(AuthenticatorError::Cancelled);
        }
        if remaining != usize::MAX {
            self.approvals.store(remaining - 1, Ordering::SeqCst);
        }
        Ok(())
    }
}

/// Never answers: models a prompt the caller abandons
pub struct HangingVerifier;

#[async_trait]
impl UserVerifier for HangingVerifier {
    async fn verify(&self, _request: &VerificationRequest) -> Result<(), AuthenticatorError> {
        std::future::pending::<()>().await;
        Ok(())
    }
}

/// How [`ImpostorAuthenticator`] forges its assertions
#[derive(Clone, Copy)]
pub enum Forgery {
    /// Answer with its own credential id
    OwnCredentialId,
    /// Claim the requested credential id but use its own PRF
    SpoofedCredentialId,
}

/// Authenticator that answers every assertion with a credential other than
/// the one requested
pub struct ImpostorAuthenticator {
    inner: SoftwareAuthenticator,
    own_credential: Vec<u8>,
    forgery: Forgery,
}

impl ImpostorAuthenticator {
    pub async fn new(settings: &VaultSettings, forgery: Forgery) -> Self {
        let inner = SoftwareAuthenticator::in_memory(ScriptedVerifier::approving());
        let options = CredentialCreationOptions::platform(
            vault_core::authenticator::RelyingParty {
                id: settings.rp_id.clone(),
                name: settings.rp_name.clone(),
            },
            "impostor",
            vec![9; 16],
            vec![0; 32],
        );
        let credential = inner.create_credential(options).await.unwrap();

        Self {
            inner,
            own_credential: credential.id,
            forgery,
        }
    }
}

#[async_trait]
impl Authenticator for ImpostorAuthenticator {
    fn is_available(&self) -> bool {
        true
    }

    fn supports_prf(&self) -> bool {
        true
    }

    async fn create_credential(
        &self,
        options: CredentialCreationOptions,
    ) -> Result<Credential, AuthenticatorError> {
        self.inner.create_credential(options).await
    }

    async fn get_assertion(&self, request: AssertionRequest) -> Result<Assertion, AuthenticatorError> {
        let requested = request.allow_credentials.first().cloned().unwrap_or_default();
        let mut assertion = self
            .inner
            .get_assertion(AssertionRequest {
                allow_credentials: vec![self.own_credential.clone()],
                ..request
            })
            .await?;

        if let Forgery::SpoofedCredentialId = self.forgery {
            assertion.credential_id = requested;
        }
        Ok(assertion)
    }
}

/// Vault over a fresh in-memory store and software authenticator
pub struct Harness {
    pub vault: Arc<BiometricVault>,
    pub store: Arc<MemoryStore>,
    pub authenticator: Arc<SoftwareAuthenticator>,
    pub verifier: Arc<ScriptedVerifier>,
}

impl Harness {
    pub fn new() -> Self {
        let verifier = ScriptedVerifier::approving();
        let authenticator = Arc::new(SoftwareAuthenticator::in_memory(verifier.clone()));
        let store = Arc::new(MemoryStore::new());
        let vault = Arc::new(BiometricVault::new(
            authenticator.clone(),
            store.clone(),
            VaultSettings::default(),
        ));

        Self {
            vault,
            store,
            authenticator,
            verifier,
        }
    }

    /// A second vault reading the same record store through `authenticator`
    pub fn vault_with(&self, authenticator: Arc<dyn Authenticator>) -> BiometricVault {
        BiometricVault::new(authenticator, self.store.clone(), VaultSettings::default())
    }
}
