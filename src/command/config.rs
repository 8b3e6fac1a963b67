//! Device configuration toggles: unlock audio, auto-lock delay, remote
//! unlock, and passage-mode schedules.

use super::{read_u16_be, ResponsePrefix};
use num_enum::{FromPrimitive, IntoPrimitive};
use tracing::debug;

/// Query/set selector shared by the simple configuration commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoPrimitive, FromPrimitive)]
#[repr(u8)]
pub enum ConfigOp {
    Query = 0x01,
    Set = 0x02,

    #[num_enum(catch_all)]
    Unknown(u8),
}

impl Default for ConfigOp {
    fn default() -> Self {
        ConfigOp::Query
    }
}

/// Enable or disable the lock's unlock chime.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AudioManageCommand {
    pub op: ConfigOp,
    pub enabled: Option<bool>,
    pub(crate) prefix: Option<ResponsePrefix>,
}

impl AudioManageCommand {
    pub fn build(&self) -> Vec<u8> {
        match (self.op, self.enabled) {
            (ConfigOp::Query, _) => vec![self.op.into()],
            (ConfigOp::Set, Some(enabled)) => vec![self.op.into(), enabled as u8],
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
    }
}

/// Query or set the auto-lock delay.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AutoLockManageCommand {
    pub op: ConfigOp,
    /// Delay in seconds; 0 disables auto-lock.
    pub seconds: Option<u16>,
    /// Range supported by this firmware, from the query response.
    pub min_seconds: Option<u16>,
    pub max_seconds: Option<u16>,
    pub(crate) prefix: Option<ResponsePrefix>,
}

impl AutoLockManageCommand {
    pub fn build(&self) -> Vec<u8> {
        match (self.op, self.seconds) {
            (ConfigOp::Query, _) => vec![self.op.into()],
            (ConfigOp::Set, Some(seconds)) => {
                let mut buf = vec![self.op.into()];
                buf.extend_from_slice(&seconds.to_be_bytes());
                buf
            }
            _ => Vec::new(),
        }
    }

    /// Query response: `[min u16][max u16][current u16]`. Set responses
    /// carry only the prefix.
    pub fn decode(&mut self, data: &[u8]) {
        let Some((prefix, rest)) = ResponsePrefix::split(data) else {
            return;
        };
        self.prefix = Some(prefix);
        if rest.len() >= 6 {
            self.min_seconds = read_u16_be(rest, 0);
            self.max_seconds = read_u16_be(rest, 2);
            self.seconds = read_u16_be(rest, 4);
        }
    }
}

/// Enable or disable unlocking via a paired gateway.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RemoteUnlockCommand {
    pub op: ConfigOp,
    pub enabled: Option<bool>,
    pub(crate) prefix: Option<ResponsePrefix>,
}

impl RemoteUnlockCommand {
    pub fn build(&self) -> Vec<u8> {
        match (self.op, self.enabled) {
            (ConfigOp::Query, _) => vec![self.op.into()],
            (ConfigOp::Set, Some(enabled)) => vec![self.op.into(), enabled as u8],
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
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoPrimitive, FromPrimitive)]
#[repr(u8)]
pub enum PassageModeOp {
    Query = 0x01,
    Add = 0x02,
    Delete = 0x03,
    Clear = 0x04,

    #[num_enum(catch_all)]
    Unknown(u8),
}

impl Default for PassageModeOp {
    fn default() -> Self {
        PassageModeOp::Query
    }
}

/// One scheduled always-unlocked window.
///
/// 7-byte wire form: `[type][weekOrDay][month][startHour][startMinute]
/// [endHour][endMinute]`. Weekly schedules (type 1) put a weekday in
/// `week_or_day` and 0 in `month`; monthly schedules (type 2) put a
/// day-of-month there with the month alongside.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PassageSchedule {
    pub schedule_type: u8,
    pub week_or_day: u8,
    pub month: u8,
    pub start_hour: u8,
    pub start_minute: u8,
    pub end_hour: u8,
    pub end_minute: u8,
}

impl PassageSchedule {
    pub(crate) fn to_bytes(self) -> [u8; 7] {
        [
            self.schedule_type,
            self.week_or_day,
            self.month,
            self.start_hour,
            self.start_minute,
            self.end_hour,
            self.end_minute,
        ]
    }

    pub(crate) fn from_bytes(b: &[u8]) -> Option<Self> {
        if b.len() < 7 {
            return None;
        }
        Some(PassageSchedule {
            schedule_type: b[0],
            week_or_day: b[1],
            month: b[2],
            start_hour: b[3],
            start_minute: b[4],
            end_hour: b[5],
            end_minute: b[6],
        })
    }
}

/// Manage passage-mode windows during which the lock stays open.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PassageModeCommand {
    pub op: PassageModeOp,
    pub schedule: Option<PassageSchedule>,
    /// Page cursor for query requests.
    pub sequence: u16,

    pub schedules: Vec<PassageSchedule>,
    pub next_sequence: u16,
    pub(crate) prefix: Option<ResponsePrefix>,
}

impl PassageModeCommand {
    pub fn build(&self) -> Vec<u8> {
        let mut buf = vec![self.op.into()];
        match self.op {
            PassageModeOp::Query => buf.extend_from_slice(&self.sequence.to_be_bytes()),
            PassageModeOp::Add | PassageModeOp::Delete => match self.schedule {
                Some(s) => buf.extend_from_slice(&s.to_bytes()),
                None => return Vec::new(),
            },
            PassageModeOp::Clear => {}
            PassageModeOp::Unknown(_) => return Vec::new(),
        }
        buf
    }

    /// Query response: `[next_sequence u16]` then zero or more 7-byte
    /// schedule tuples until the buffer runs out.
    pub fn decode(&mut self, data: &[u8]) {
        let Some((prefix, rest)) = ResponsePrefix::split(data) else {
            return;
        };
        self.prefix = Some(prefix);
        if self.op != PassageModeOp::Query {
            return;
        }
        let Some(next) = read_u16_be(rest, 0) else {
            return;
        };
        self.next_sequence = next;
        let mut cursor = &rest[2..];
        while let Some(schedule) = PassageSchedule::from_bytes(cursor) {
            self.schedules.push(schedule);
            cursor = &cursor[7..];
        }
        if !cursor.is_empty() {
            debug!("{} trailing bytes after passage schedules", cursor.len());
        }
    }
}
