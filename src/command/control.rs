//! Lock/unlock, clock calibration, feature query and factory reset.

use super::{format_date6, read_u32_be, ResponsePrefix};
use chrono::{Datelike, NaiveDateTime, Timelike, Utc};

fn unix_now() -> u32 {
    Utc::now().timestamp() as u32
}

/// Unlock request: `sum(u32)` (psFromLock + unlockKey from the admin login)
/// followed by the current unix time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UnlockCommand {
    pub sum: Option<u32>,
    /// Overrides the wall clock in the request; tests pin this.
    pub timestamp: Option<u32>,
    pub uid: Option<u32>,
    pub unique_id: Option<u32>,
    pub lock_date: Option<String>,
    pub(crate) prefix: Option<ResponsePrefix>,
}

impl UnlockCommand {
    pub fn build(&self) -> Vec<u8> {
        let Some(sum) = self.sum else {
            return Vec::new();
        };
        let mut buf = Vec::with_capacity(8);
        buf.extend_from_slice(&sum.to_be_bytes());
        buf.extend_from_slice(&self.timestamp.unwrap_or_else(unix_now).to_be_bytes());
        buf
    }

    pub fn decode(&mut self, data: &[u8]) {
        let Some((prefix, rest)) = ResponsePrefix::split(data) else {
            return;
        };
        self.prefix = Some(prefix);
        self.uid = read_u32_be(rest, 0);
        self.unique_id = read_u32_be(rest, 4);
        self.lock_date = rest.get(8..14).and_then(format_date6);
    }
}

/// Lock request; same request and response shape as [`UnlockCommand`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LockCommand {
    pub sum: Option<u32>,
    pub timestamp: Option<u32>,
    pub uid: Option<u32>,
    pub unique_id: Option<u32>,
    pub lock_date: Option<String>,
    pub(crate) prefix: Option<ResponsePrefix>,
}

impl LockCommand {
    pub fn build(&self) -> Vec<u8> {
        let Some(sum) = self.sum else {
            return Vec::new();
        };
        let mut buf = Vec::with_capacity(8);
        buf.extend_from_slice(&sum.to_be_bytes());
        buf.extend_from_slice(&self.timestamp.unwrap_or_else(unix_now).to_be_bytes());
        buf
    }

    pub fn decode(&mut self, data: &[u8]) {
        let Some((prefix, rest)) = ResponsePrefix::split(data) else {
            return;
        };
        self.prefix = Some(prefix);
        self.uid = read_u32_be(rest, 0);
        self.unique_id = read_u32_be(rest, 4);
        self.lock_date = rest.get(8..14).and_then(format_date6);
    }
}

/// Push the current wall clock to the lock as a 6-byte packed date.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CalibrateTimeCommand {
    /// Fixed time for the request; `None` means "now".
    pub time: Option<NaiveDateTime>,
    pub(crate) prefix: Option<ResponsePrefix>,
}

impl CalibrateTimeCommand {
    pub fn build(&self) -> Vec<u8> {
        let t = self.time.unwrap_or_else(|| Utc::now().naive_utc());
        vec![
            (t.year() % 100) as u8,
            t.month() as u8,
            t.day() as u8,
            t.hour() as u8,
            t.minute() as u8,
            t.second() as u8,
        ]
    }

    pub fn decode(&mut self, data: &[u8]) {
        self.prefix = ResponsePrefix::split(data).map(|(p, _)| p);
    }
}

/// Capability bits reported by the feature query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum LockFeature {
    Passcode = 0,
    IcCard = 1,
    Fingerprint = 2,
    AutoLock = 3,
    PassageMode = 4,
    Audio = 5,
    RemoteUnlock = 6,
    OperationLog = 7,
}

/// Query the lock's capability bitmap.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeviceFeaturesCommand {
    pub features: Option<u32>,
    pub(crate) prefix: Option<ResponsePrefix>,
}

impl DeviceFeaturesCommand {
    pub fn build(&self) -> Vec<u8> {
        Vec::new()
    }

    pub fn decode(&mut self, data: &[u8]) {
        let Some((prefix, rest)) = ResponsePrefix::split(data) else {
            return;
        };
        self.prefix = Some(prefix);
        if rest.is_empty() || rest.len() > 4 {
            return;
        }
        // The bitmap is one to four bytes depending on firmware age.
        let mut value = 0u32;
        for &b in rest {
            value = (value << 8) | u32::from(b);
        }
        self.features = Some(value);
    }

    pub fn has(&self, feature: LockFeature) -> bool {
        self.features
            .map(|bits| bits & (1 << feature as u8) != 0)
            .unwrap_or(false)
    }
}

/// Factory reset. Empty body; wipes pairing and admin state on the device.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResetLockCommand {
    pub(crate) prefix: Option<ResponsePrefix>,
}

impl ResetLockCommand {
    pub fn build(&self) -> Vec<u8> {
        Vec::new()
    }

    pub fn decode(&mut self, data: &[u8]) {
        self.prefix = ResponsePrefix::split(data).map(|(p, _)| p);
    }
}
