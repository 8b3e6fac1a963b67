//! Persisted per-lock state.
//!
//! The caller owns storage (keyed by MAC address); this type fixes the
//! JSON shape so sessions can be restored across process restarts. Field
//! names are camelCase for compatibility with records written by the
//! vendor's mobile apps.

use crate::error::LockError;
use serde::{Deserialize, Serialize};

/// Admin credentials proving authorization for lock/unlock and management
/// operations. Established once during pairing, reused every session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminCredentials {
    pub admin_ps: u32,
    pub unlock_key: u32,
}

/// One offline-passcode seed written during pairing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredPasswordSeed {
    pub year: u8,
    pub code: u16,
    pub secret: u64,
}

/// Everything the core needs restored to talk to a previously paired lock.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LockRecord {
    /// Session AES key, hex encoded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aes_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin: Option<AdminCredentials>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin_passcode: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pwd_info: Vec<StoredPasswordSeed>,
}

impl LockRecord {
    /// Decode the stored AES key. `Ok(None)` when no key has been stored.
    pub fn aes_key_bytes(&self) -> Result<Option<[u8; 16]>, LockError> {
        let Some(hex_key) = &self.aes_key else {
            return Ok(None);
        };
        let bytes = hex::decode(hex_key)
            .map_err(|e| LockError::InvalidRecord(format!("aesKey is not hex: {e}")))?;
        let key: [u8; 16] = bytes
            .try_into()
            .map_err(|b: Vec<u8>| {
                LockError::InvalidRecord(format!("aesKey is {} bytes, want 16", b.len()))
            })?;
        Ok(Some(key))
    }

    pub fn set_aes_key(&mut self, key: &[u8; 16]) {
        self.aes_key = Some(hex::encode(key));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_roundtrips_through_json() {
        let mut record = LockRecord {
            admin: Some(AdminCredentials {
                admin_ps: 123456,
                unlock_key: 654321,
            }),
            admin_passcode: Some("8675309".to_string()),
            pwd_info: vec![StoredPasswordSeed {
                year: 26,
                code: 512,
                secret: 1_234_567_890,
            }],
            ..Default::default()
        };
        record.set_aes_key(&[0xe8u8; 16]);

        let json = serde_json::to_value(&record).expect("serializes");
        assert_eq!(json["aesKey"], serde_json::json!("e8".repeat(16)));
        assert_eq!(json["admin"]["adminPs"], serde_json::json!(123456));
        assert_eq!(json["pwdInfo"][0]["secret"], serde_json::json!(1_234_567_890));

        let back: LockRecord = serde_json::from_value(json).expect("deserializes");
        assert_eq!(back, record);
        assert_eq!(back.aes_key_bytes().expect("valid key"), Some([0xe8u8; 16]));
    }

    #[test]
    fn bad_stored_key_is_reported() {
        let record = LockRecord {
            aes_key: Some("not hex".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            record.aes_key_bytes(),
            Err(LockError::InvalidRecord(_))
        ));

        let record = LockRecord {
            aes_key: Some("aabb".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            record.aes_key_bytes(),
            Err(LockError::InvalidRecord(_))
        ));
    }
}
