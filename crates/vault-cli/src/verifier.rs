//! Terminal stand-in for the biometric prompt

use async_trait::async_trait;
use std::io::{BufRead, Write};

use vault_core::authenticator::{
    AuthenticatorError, UserVerifier, VerificationPurpose, VerificationRequest,
};

/// Asks for confirmation on the terminal before each authenticator operation
pub struct TerminalVerifier {
    /// Skip the prompt and approve (`--yes`)
    auto_approve: bool,
}

impl TerminalVerifier {
    pub fn new(auto_approve: bool) -> Self {
        Self { auto_approve }
    }
}

#[async_trait]
impl UserVerifier for TerminalVerifier {
    async fn verify(&self, request: &VerificationRequest) -> Result<(), AuthenticatorError> {
        if self.auto_approve {
            return Ok(());
        }

        let action = match request.purpose {
            VerificationPurpose::Register => "Register a new vault credential",
            VerificationPurpose::Authenticate => "Use your vault credential",
        };
        let prompt = format!("{} for {}? [y/N] ", action, request.rp_id);

        let approved = tokio::task::spawn_blocking(move || -> std::io::Result<bool> {
            let mut stderr = std::io::stderr();
            stderr.write_all(prompt.as_bytes())?;
            stderr.flush()?;

            let mut answer = String::new();
            std::io::stdin().lock().read_line(&mut answer)?;
            Ok(matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
        })
        .await
        .map_err(|e| AuthenticatorError::Platform(e.to_string()))?
        .map_err(|e| AuthenticatorError::Platform(e.to_string()))?;

        if approved {
            Ok(())
        } else {
            Err(AuthenticatorError::Cancelled)
        }
    }
}
