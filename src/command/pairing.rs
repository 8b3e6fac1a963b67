//! Pairing and admin-authentication commands: key exchange, admin
//! provisioning and the challenge/response login pair.

use super::{read_u32_be, ResponsePrefix};
use crate::constants::PAIRING_SENTINEL;
use rand::Rng;

/// Key exchange, the first command of the pairing flow. Sent encrypted
/// under the well-known default key; the response carries the key used for
/// every subsequent exchange.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GetAesKeyCommand {
    /// Send the vendor sentinel instead of an empty body to announce that a
    /// key is already held.
    pub announce_existing: bool,
    pub key: Option<[u8; 16]>,
    pub(crate) prefix: Option<ResponsePrefix>,
}

impl GetAesKeyCommand {
    pub fn build(&self) -> Vec<u8> {
        if self.announce_existing {
            PAIRING_SENTINEL.to_vec()
        } else {
            Vec::new()
        }
    }

    pub fn decode(&mut self, data: &[u8]) {
        let Some((prefix, rest)) = ResponsePrefix::split(data) else {
            return;
        };
        self.prefix = Some(prefix);
        if rest.len() >= 16 {
            let mut key = [0u8; 16];
            key.copy_from_slice(&rest[..16]);
            self.key = Some(key);
        }
    }
}

/// Establish admin credentials on a freshly paired lock.
///
/// The credentials are generated locally and merely exchanged, so an
/// ordinary PRNG is fine here; losing them after pairing makes the lock
/// unreachable until factory reset.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AddAdminCommand {
    pub admin_ps: Option<u32>,
    pub unlock_key: Option<u32>,
    pub succeeded: Option<bool>,
}

impl AddAdminCommand {
    /// Fill both credentials with fresh random values, returning them so
    /// the caller can persist the pair.
    pub fn generate(&mut self) -> (u32, u32) {
        let mut rng = rand::thread_rng();
        // The wire fields are 4 bytes; draw over the full u32 range,
        // excluding 0 which some firmware treats as unset.
        let admin_ps = rng.gen_range(1..=u32::MAX);
        let unlock_key = rng.gen_range(1..=u32::MAX);
        self.admin_ps = Some(admin_ps);
        self.unlock_key = Some(unlock_key);
        (admin_ps, unlock_key)
    }

    pub fn build(&self) -> Vec<u8> {
        let (Some(admin_ps), Some(unlock_key)) = (self.admin_ps, self.unlock_key) else {
            return Vec::new();
        };
        let mut buf = Vec::with_capacity(8 + PAIRING_SENTINEL.len());
        buf.extend_from_slice(&admin_ps.to_be_bytes());
        buf.extend_from_slice(&unlock_key.to_be_bytes());
        buf.extend_from_slice(PAIRING_SENTINEL);
        buf
    }

    pub fn decode(&mut self, data: &[u8]) {
        if data.is_empty() {
            return;
        }
        // The lock echoes the sentinel on success; anything else is failure.
        self.succeeded = Some(data.ends_with(PAIRING_SENTINEL));
    }
}

/// First half of the admin challenge: fetch `psFromLock`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CheckAdminCommand {
    pub admin_ps: Option<u32>,
    pub lock_flag_pos: u32,
    pub uid: Option<u32>,
    pub ps_from_lock: Option<u32>,
}

impl CheckAdminCommand {
    /// Request layout is 11 bytes with an intentional overlap: adminPs at
    /// offset 0, lockFlagPos at offset 3 (clobbering adminPs's last byte),
    /// uid at offset 7. The overlap mirrors firmware behavior byte for
    /// byte; do not "clean it up".
    pub fn build(&self) -> Vec<u8> {
        let (Some(admin_ps), Some(uid)) = (self.admin_ps, self.uid) else {
            return Vec::new();
        };
        let mut buf = [0u8; 11];
        buf[0..4].copy_from_slice(&admin_ps.to_be_bytes());
        buf[3..7].copy_from_slice(&self.lock_flag_pos.to_be_bytes());
        buf[7..11].copy_from_slice(&uid.to_be_bytes());
        buf.to_vec()
    }

    pub fn decode(&mut self, data: &[u8]) {
        self.ps_from_lock = read_u32_be(data, 0);
    }
}

/// Second half of the admin challenge: prove knowledge of the unlock key by
/// replying with `psFromLock + unlockKey`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CheckRandomCommand {
    pub sum: Option<u32>,
    pub(crate) prefix: Option<ResponsePrefix>,
}

impl CheckRandomCommand {
    pub fn set_sum(&mut self, ps_from_lock: u32, unlock_key: u32) {
        self.sum = Some(ps_from_lock.wrapping_add(unlock_key));
    }

    pub fn build(&self) -> Vec<u8> {
        match self.sum {
            Some(sum) => sum.to_be_bytes().to_vec(),
            None => Vec::new(),
        }
    }

    pub fn decode(&mut self, data: &[u8]) {
        self.prefix = ResponsePrefix::split(data).map(|(p, _)| p);
    }
}

/// Announces initialization to a lock in setting mode. No body.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InitializationCommand {
    pub(crate) prefix: Option<ResponsePrefix>,
}

impl InitializationCommand {
    pub fn build(&self) -> Vec<u8> {
        Vec::new()
    }

    pub fn decode(&mut self, data: &[u8]) {
        self.prefix = ResponsePrefix::split(data).map(|(p, _)| p);
    }
}
