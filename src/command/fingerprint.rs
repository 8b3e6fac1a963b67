//! Fingerprint management. Enrollment is multi-phase: after the add
//! request is acknowledged the lock pushes one progress frame per finger
//! press, then a terminal frame carrying the new template's identifier.

use super::{pack_date5, read_compact_id, ResponsePrefix};
use num_enum::{FromPrimitive, IntoPrimitive};

#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoPrimitive, FromPrimitive)]
#[repr(u8)]
pub enum FingerprintOp {
    Search = 0x01,
    Add = 0x02,
    Delete = 0x03,
    Clear = 0x04,
    Modify = 0x05,

    #[num_enum(catch_all)]
    Unknown(u8),
}

impl Default for FingerprintOp {
    fn default() -> Self {
        FingerprintOp::Search
    }
}

/// Enrollment progress carried by one response frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrAddState {
    /// Sensor armed; waiting for the first press.
    EnterAddMode,
    /// One sampling step done; the byte is the collect counter.
    Progress(u8),
    /// Terminal: template stored under this identifier.
    Added(u64),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FingerprintCommand {
    pub op: FingerprintOp,
    pub fingerprint_id: Option<u64>,
    pub window: Option<((u8, u8, u8, u8, u8), (u8, u8, u8, u8, u8))>,

    pub add_state: Option<FrAddState>,
    pub(crate) prefix: Option<ResponsePrefix>,
}

impl FingerprintCommand {
    pub fn build(&self) -> Vec<u8> {
        let mut buf = vec![self.op.into()];
        match self.op {
            FingerprintOp::Add | FingerprintOp::Clear | FingerprintOp::Search => {}
            FingerprintOp::Delete => match self.fingerprint_id {
                Some(id) => super::push_compact_id(&mut buf, id),
                None => return Vec::new(),
            },
            FingerprintOp::Modify => {
                let (Some(id), Some((start, end))) = (self.fingerprint_id, self.window) else {
                    return Vec::new();
                };
                super::push_compact_id(&mut buf, id);
                let (y, mo, d, h, mi) = start;
                buf.extend_from_slice(&pack_date5(y, mo, d, h, mi));
                let (y, mo, d, h, mi) = end;
                buf.extend_from_slice(&pack_date5(y, mo, d, h, mi));
            }
            FingerprintOp::Unknown(_) => return Vec::new(),
        }
        buf
    }

    /// Response: `[battery][status][op echo][fields...]`. In the add flow
    /// the remainder distinguishes the phases: empty = enter add mode, one
    /// byte = sampling progress, 4 or 8 bytes = the final identifier.
    pub fn decode(&mut self, data: &[u8]) {
        let Some((prefix, rest)) = ResponsePrefix::split(data) else {
            return;
        };
        self.prefix = Some(prefix);
        let Some((&op, rest)) = rest.split_first() else {
            return;
        };
        if FingerprintOp::from_primitive(op) != FingerprintOp::Add {
            return;
        }
        self.add_state = match rest.len() {
            0 => Some(FrAddState::EnterAddMode),
            1 => Some(FrAddState::Progress(rest[0])),
            _ => read_compact_id(rest).map(FrAddState::Added),
        };
    }
}
