//! Keyboard-passcode management: CRUD on individual codes, the pairing-time
//! seed table, the admin code and the show-on-screen toggle.

use super::{pack_date5, read_u16_be, ResponsePrefix};
use chrono::{Datelike, Utc};
use num_enum::{FromPrimitive, IntoPrimitive};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Sub-operation selector for [`ManageKeyboardPasswordCommand`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoPrimitive, FromPrimitive)]
#[repr(u8)]
pub enum KeyboardPasswordOp {
    Add = 0x01,
    Modify = 0x02,
    Delete = 0x03,
    Clear = 0x04,

    #[num_enum(catch_all)]
    Unknown(u8),
}

impl Default for KeyboardPasswordOp {
    fn default() -> Self {
        KeyboardPasswordOp::Add
    }
}

/// Validity window for a timed passcode, two-digit year.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PasscodeWindow {
    pub start: (u8, u8, u8, u8, u8),
    pub end: (u8, u8, u8, u8, u8),
}

/// Add, modify, delete or clear keyboard passcodes.
///
/// Request: opcode, passcode type, the ASCII digits, then the packed 5-byte
/// start/end dates. Permanent passcodes omit the dates entirely.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ManageKeyboardPasswordCommand {
    pub op: KeyboardPasswordOp,
    /// 1 = permanent, 2 = timed.
    pub passcode_type: u8,
    pub passcode: Option<String>,
    pub window: Option<PasscodeWindow>,
    pub(crate) prefix: Option<ResponsePrefix>,
}

impl ManageKeyboardPasswordCommand {
    pub fn build(&self) -> Vec<u8> {
        if self.op == KeyboardPasswordOp::Clear {
            return vec![self.op.into()];
        }
        let Some(passcode) = &self.passcode else {
            return Vec::new();
        };
        let mut buf = vec![self.op.into(), self.passcode_type];
        buf.extend_from_slice(passcode.as_bytes());
        if let Some(window) = &self.window {
            let (y, mo, d, h, mi) = window.start;
            buf.extend_from_slice(&pack_date5(y, mo, d, h, mi));
            let (y, mo, d, h, mi) = window.end;
            buf.extend_from_slice(&pack_date5(y, mo, d, h, mi));
        }
        buf
    }

    pub fn decode(&mut self, data: &[u8]) {
        self.prefix = ResponsePrefix::split(data).map(|(p, _)| p);
    }
}

/// One stored passcode as reported by the list query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasscodeEntry {
    pub passcode: String,
    pub start: Option<[u8; 5]>,
    pub end: Option<[u8; 5]>,
}

/// Paginated listing of valid keyboard passcodes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GetValidKeyboardPasswordsCommand {
    pub sequence: u16,
    pub entries: Vec<PasscodeEntry>,
    /// Sequence to request the next page with; 0 means done.
    pub next_sequence: u16,
    pub(crate) prefix: Option<ResponsePrefix>,
}

impl GetValidKeyboardPasswordsCommand {
    pub fn build(&self) -> Vec<u8> {
        self.sequence.to_be_bytes().to_vec()
    }

    /// Response: `[battery][status][next_sequence u16][records...]` where
    /// each record is `[len u8][ascii digits][start 5][end 5]`. Records run
    /// until the buffer is exhausted; a truncated trailing record is
    /// dropped rather than failing the parse.
    pub fn decode(&mut self, data: &[u8]) {
        let Some((prefix, rest)) = ResponsePrefix::split(data) else {
            return;
        };
        self.prefix = Some(prefix);
        let Some(next) = read_u16_be(rest, 0) else {
            return;
        };
        self.next_sequence = next;
        let mut cursor = &rest[2..];
        while let Some((&len, tail)) = cursor.split_first() {
            let len = len as usize;
            if tail.len() < len + 10 {
                if !tail.is_empty() {
                    debug!("dropping truncated passcode record ({} bytes left)", tail.len());
                }
                break;
            }
            let passcode = String::from_utf8_lossy(&tail[..len]).into_owned();
            let mut start = [0u8; 5];
            start.copy_from_slice(&tail[len..len + 5]);
            let mut end = [0u8; 5];
            end.copy_from_slice(&tail[len + 5..len + 10]);
            self.entries.push(PasscodeEntry {
                passcode,
                start: Some(start),
                end: Some(end),
            });
            cursor = &tail[len + 10..];
        }
    }
}

/// One pre-seeded passcode slot written during initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasswordSeed {
    /// 12-bit slot code, `[0, 1071)`.
    pub code: u16,
    /// 10-digit decimal secret.
    pub secret: u64,
}

const INIT_PASSWORD_SLOTS: usize = 10;

/// Seed the lock's offline-passcode table during pairing.
///
/// 61 bytes: one 2-digit-year byte, then ten 6-byte blocks. Within a block
/// the 12-bit code straddles the first two bytes and the secret is written
/// as a big-endian integer whose top 4 bits share the code's low nibble.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InitPasswordsCommand {
    pub year: Option<u8>,
    pub seeds: Vec<PasswordSeed>,
    pub(crate) prefix: Option<ResponsePrefix>,
}

impl InitPasswordsCommand {
    /// Fill the table with fresh random seeds for the current year.
    pub fn generate(&mut self) -> &[PasswordSeed] {
        let mut rng = rand::thread_rng();
        self.year = Some((Utc::now().year() % 100) as u8);
        self.seeds = (0..INIT_PASSWORD_SLOTS)
            .map(|_| PasswordSeed {
                code: rng.gen_range(0..1071),
                secret: rng.gen_range(1_000_000_000..10_000_000_000),
            })
            .collect();
        &self.seeds
    }

    pub fn build(&self) -> Vec<u8> {
        let Some(year) = self.year else {
            return Vec::new();
        };
        if self.seeds.len() != INIT_PASSWORD_SLOTS {
            return Vec::new();
        }
        let mut buf = Vec::with_capacity(1 + 6 * INIT_PASSWORD_SLOTS);
        buf.push(year);
        for seed in &self.seeds {
            // code bits 11..4 | code bits 3..0 + secret bits 35..32 | secret low 32.
            buf.push((seed.code >> 4) as u8);
            buf.push((((seed.code & 0x0f) << 4) as u8) | ((seed.secret >> 32) & 0x0f) as u8);
            buf.extend_from_slice(&(seed.secret as u32).to_be_bytes());
        }
        buf
    }

    pub fn decode(&mut self, data: &[u8]) {
        self.prefix = ResponsePrefix::split(data).map(|(p, _)| p);
    }
}

/// Set the admin keyboard passcode (the code typed on the keypad to enter
/// admin mode).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SetAdminKeyboardPwdCommand {
    pub passcode: Option<String>,
    pub(crate) prefix: Option<ResponsePrefix>,
}

impl SetAdminKeyboardPwdCommand {
    /// Generate a random 7-digit admin passcode.
    pub fn generate(&mut self) -> String {
        let mut rng = rand::thread_rng();
        let code: u32 = rng.gen_range(1_000_000..10_000_000);
        let passcode = code.to_string();
        self.passcode = Some(passcode.clone());
        passcode
    }

    pub fn build(&self) -> Vec<u8> {
        match &self.passcode {
            Some(p) => p.as_bytes().to_vec(),
            None => Vec::new(),
        }
    }

    pub fn decode(&mut self, data: &[u8]) {
        self.prefix = ResponsePrefix::split(data).map(|(p, _)| p);
    }
}

/// Query or toggle showing entered passcodes on the lock's screen.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScreenPasscodeManageCommand {
    /// 1 = query, 2 = set.
    pub op: Option<u8>,
    pub enabled: Option<bool>,
    /// Undecoded remainder, kept for diagnostics.
    pub raw: Vec<u8>,
    pub(crate) prefix: Option<ResponsePrefix>,
}

impl ScreenPasscodeManageCommand {
    pub fn build(&self) -> Vec<u8> {
        match (self.op, self.enabled) {
            (Some(op), Some(enabled)) => vec![op, enabled as u8],
            (Some(op), None) => vec![op],
            _ => Vec::new(),
        }
    }

    pub fn decode(&mut self, data: &[u8]) {
        let Some((prefix, rest)) = ResponsePrefix::split(data) else {
            return;
        };
        self.prefix = Some(prefix);
        if let Some(&flag) = rest.first() {
            self.enabled = Some(flag != 0);
        }
        self.raw = rest.to_vec();
    }
}
