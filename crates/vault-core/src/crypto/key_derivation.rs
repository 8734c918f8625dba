//! Wrapping-key derivation from authenticator PRF output
//!
//! The authenticator evaluates its per-credential PRF (CTAP2 `hmac-secret`)
//! over a fixed application salt. The result is deterministic for a given
//! credential, so hashing it yields the same key on every unlock.

use rand::{rngs::OsRng, RngCore};
use sha2::{Digest, Sha256};

use super::VaultKey;

/// Domain label mixed into the PRF salt
const PRF_SALT_LABEL: &str = "biometric-vault/v1";

/// Derive the 256-bit wrapping key from the authenticator's PRF output
pub fn derive_key(prf_output: &[u8]) -> VaultKey {
    let digest = Sha256::digest(prf_output);
    let mut key = [0u8; 32];
    key.copy_from_slice(&digest);
    VaultKey::new(key)
}

/// PRF salt scoped to a relying party
///
/// Fixed per relying party so the stored record needs no salt field.
pub fn prf_salt(rp_id: &str) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(rp_id.as_bytes());
    hasher.update(b"/");
    hasher.update(PRF_SALT_LABEL.as_bytes());
    hasher.finalize().into()
}

/// Fresh 32-byte WebAuthn challenge
pub fn generate_challenge() -> [u8; 32] {
    let mut challenge = [0u8; 32];
    OsRng.fill_bytes(&mut challenge);
    challenge
}

/// Fresh 16-byte WebAuthn user handle
pub fn generate_user_handle() -> [u8; 16] {
    let mut handle = [0u8; 16];
    OsRng.fill_bytes(&mut handle);
    handle
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_key_deterministic() {
        let prf = [9u8; 32];
        assert_eq!(derive_key(&prf).as_bytes(), derive_key(&prf).as_bytes());
    }

    #[test]
    fn test_derive_key_differs_per_input() {
        assert_ne!(
            derive_key(&[1u8; 32]).as_bytes(),
            derive_key(&[2u8; 32]).as_bytes()
        );
    }

    #[test]
    fn test_derive_key_does_not_pass_input_through() {
        let prf = [3u8; 32];
        assert_ne!(derive_key(&prf).as_bytes(), &prf);
    }

    #[test]
    fn test_prf_salt_scoped_to_rp() {
        assert_eq!(prf_salt("hub.example.org"), prf_salt("hub.example.org"));
        assert_ne!(prf_salt("hub.example.org"), prf_salt("localhost"));
    }

    #[test]
    fn test_random_material_is_fresh() {
        assert_ne!(generate_challenge(), generate_challenge());
        assert_ne!(generate_user_handle(), generate_user_handle());
    }
}
