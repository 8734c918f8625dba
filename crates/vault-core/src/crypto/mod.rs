//! Cryptographic primitives for the biometric vault
//!
//! This module provides:
//! - AES-256-GCM authenticated encryption
//! - Wrapping-key derivation from authenticator PRF output
//! - Secure memory handling with zeroize

mod encryption;
mod key_derivation;
mod secure_memory;

pub use encryption::{decrypt, encrypt, EncryptedData, IV_LEN, TAG_LEN};
pub use key_derivation::{derive_key, generate_challenge, generate_user_handle, prf_salt};
pub use secure_memory::{SecretString, VaultKey};
