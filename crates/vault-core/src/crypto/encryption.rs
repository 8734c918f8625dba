//! AES-256-GCM authenticated encryption
//!
//! - IV: 12 bytes (96 bits), fresh from the OS RNG per call
//! - Ciphertext: encrypted bytes with the 16-byte auth tag appended

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Key, Nonce,
};
use rand::{rngs::OsRng, RngCore};

use super::VaultKey;
use crate::error::{Result, VaultError};

/// Length of the GCM nonce in bytes
pub const IV_LEN: usize = 12;

/// Length of the GCM authentication tag in bytes
pub const TAG_LEN: usize = 16;

/// Sealed data: nonce plus ciphertext-with-tag
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedData {
    /// Initialization vector (12 bytes for GCM)
    pub iv: [u8; IV_LEN],
    /// Encrypted bytes followed by the authentication tag
    pub ciphertext: Vec<u8>,
}

fn cipher(key: &VaultKey) -> Aes256Gcm {
    Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key.as_bytes()))
}

/// Encrypt plaintext using AES-256-GCM under a fresh random IV
pub fn encrypt(plaintext: &[u8], key: &VaultKey) -> Result<EncryptedData> {
    let mut iv = [0u8; IV_LEN];
    OsRng.fill_bytes(&mut iv);

    let ciphertext = cipher(key)
        .encrypt(Nonce::from_slice(&iv), plaintext)
        .map_err(|e| VaultError::Crypto(e.to_string()))?;

    Ok(EncryptedData { iv, ciphertext })
}

/// Decrypt ciphertext using AES-256-GCM
///
/// Any tag mismatch (tampered bytes, wrong key, wrong IV) is reported as
/// [`VaultError::DecryptionFailed`]; no partial plaintext is ever returned.
pub fn decrypt(encrypted: &EncryptedData, key: &VaultKey) -> Result<Vec<u8>> {
    cipher(key)
        .decrypt(Nonce::from_slice(&encrypted.iv), encrypted.ciphertext.as_slice())
        .map_err(|_| VaultError::DecryptionFailed)
}
