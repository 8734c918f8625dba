//! Persisted vault record
//!
//! Stored under a single fixed key as
//! `{"credId": <base64url, no padding>, "iv": <base64>, "ct": <base64>}`.

use base64::{
    engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD},
    Engine as _,
};
use serde::{Deserialize, Serialize};

use crate::crypto::{EncryptedData, IV_LEN, TAG_LEN};
use crate::error::{Result, VaultError};

/// Default storage key of the vault record
pub const DEFAULT_STORAGE_KEY: &str = "biometric.vault.v1";

/// On-disk JSON shape
#[derive(Debug, Serialize, Deserialize)]
struct WireRecord {
    #[serde(rename = "credId")]
    cred_id: String,
    iv: String,
    ct: String,
}

/// The single encrypted secret held by the vault
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VaultRecord {
    /// Raw identifier of the credential that wraps the key
    pub credential_id: Vec<u8>,
    /// Sealed secret
    pub sealed: EncryptedData,
}

impl VaultRecord {
    pub fn new(credential_id: Vec<u8>, sealed: EncryptedData) -> Self {
        Self {
            credential_id,
            sealed,
        }
    }

    /// Serialize to the stored JSON form
    pub fn to_json(&self) -> Result<String> {
        let wire = WireRecord {
            cred_id: URL_SAFE_NO_PAD.encode(&self.credential_id),
            iv: STANDARD.encode(self.sealed.iv),
            ct: STANDARD.encode(&self.sealed.ciphertext),
        };
        serde_json::to_string(&wire).map_err(|e| VaultError::StorageError(e.to_string()))
    }

    /// Parse the stored JSON form
    ///
    /// Structural problems are [`VaultError::Corrupted`]; whether the
    /// ciphertext is authentic is only known at decryption.
    pub fn from_json(json: &str) -> Result<Self> {
        let wire: WireRecord = serde_json::from_str(json)
            .map_err(|e| VaultError::Corrupted(format!("Invalid record JSON: {}", e)))?;

        let credential_id = URL_SAFE_NO_PAD
            .decode(&wire.cred_id)
            .map_err(|e| VaultError::Corrupted(format!("Invalid credId: {}", e)))?;
        if credential_id.is_empty() {
            return Err(VaultError::Corrupted("Empty credId".to_string()));
        }

        let iv_bytes = STANDARD
            .decode(&wire.iv)
            .map_err(|e| VaultError::Corrupted(format!("Invalid iv: {}", e)))?;
        let iv: [u8; IV_LEN] = iv_bytes.as_slice().try_into().map_err(|_| {
            VaultError::Corrupted(format!(
                "Invalid iv length: expected {}, got {}",
                IV_LEN,
                iv_bytes.len()
            ))
        })?;

        let ciphertext = STANDARD
            .decode(&wire.ct)
            .map_err(|e| VaultError::Corrupted(format!("Invalid ct: {}", e)))?;
        if ciphertext.len() < TAG_LEN {
            return Err(VaultError::Corrupted(format!(
                "Ciphertext shorter than the {}-byte tag",
                TAG_LEN
            )));
        }

        Ok(Self {
            credential_id,
            sealed: EncryptedData { iv, ciphertext },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> VaultRecord {
        VaultRecord::new(
            vec![0xfb, 0xff, 0x01, 0x02],
            EncryptedData {
                iv: [7u8; IV_LEN],
                ciphertext: vec![0xaa; 24],
            },
        )
    }

    #[test]
    fn test_wire_layout() {
        let json = sample().to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        let object = value.as_object().unwrap();

        assert_eq!(object.len(), 3);
        // base64url without padding
        assert_eq!(object["credId"], "-_8BAg");
        // standard base64 with padding
        assert_eq!(object["iv"], "BwcHBwcHBwcHBwcH");
        assert!(object["ct"].as_str().unwrap().starts_with("qqqq"));
    }

    #[test]
    fn test_parse_stored_form() {
        let record = sample();
        let parsed = VaultRecord::from_json(&record.to_json().unwrap()).unwrap();
        assert_eq!(parsed, record);
    }

    #[test]
    fn test_malformed_records_are_corrupted() {
        let cases = [
            "not json",
            r#"{"iv":"BwcHBwcHBwcHBwcH","ct":"qqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqq"}"#,
            r#"{"credId":"","iv":"BwcHBwcHBwcHBwcH","ct":"qqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqq"}"#,
            r#"{"credId":"-_8BAg","iv":"BwcH","ct":"qqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqq"}"#,
            r#"{"credId":"-_8BAg","iv":"BwcHBwcHBwcHBwcH","ct":"qqqq"}"#,
            r#"{"credId":"***","iv":"BwcHBwcHBwcHBwcH","ct":"qqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqq"}"#,
        ];

        for case in cases {
            assert!(
                matches!(VaultRecord::from_json(case), Err(VaultError::Corrupted(_))),
                "expected Corrupted for {}",
                case
            );
        }
    }
}
