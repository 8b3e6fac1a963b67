//! Operation-log retrieval. The lock stores a ring of variable-length
//! records; each record's trailing bytes depend on its event kind.

use super::{format_date6, read_u16_be, read_u32_be};
use num_enum::{FromPrimitive, IntoPrimitive};
use tracing::debug;

/// Event kinds observed in lock firmware logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoPrimitive, FromPrimitive)]
#[repr(u8)]
pub enum LogEventKind {
    UnlockByApp = 1,
    LockByApp = 2,
    UnlockByPasscode = 4,
    AddPasscodeOnLock = 5,
    ModifyPasscodeOnLock = 6,
    DeletePasscodeOnLock = 7,
    ClearPasscodesOnLock = 8,
    UnlockByIcCard = 10,
    AddIcCardOnLock = 11,
    DeleteIcCardOnLock = 12,
    ClearIcCardsOnLock = 13,
    UnlockByFingerprint = 17,
    AddFingerprintOnLock = 18,
    DeleteFingerprintOnLock = 19,
    ClearFingerprintsOnLock = 20,
    UnlockByWristband = 25,
    AutoLocked = 26,
    UnlockByAdminPasscode = 27,
    UnlockByGateway = 28,
    LockedByKey = 29,

    #[num_enum(catch_all)]
    Unknown(u8),
}

/// Kind-specific trailing payload of a log record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogDetail {
    /// App-driven events: the acting user and the device-side record id.
    AppUser { uid: u32, record_id: u32 },
    /// Passcode events: the length-prefixed ASCII code involved.
    Passcode(String),
    /// IC-card and fingerprint events: the credential identifier.
    CredentialId(u32),
    /// Wristband/gateway events: a 6-byte MAC-like token.
    Token([u8; 6]),
    /// Kinds with no or unrecognized trailing bytes.
    Raw(Vec<u8>),
}

/// One decoded log entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    pub kind: LogEventKind,
    pub date: Option<String>,
    pub detail: LogDetail,
}

/// Fetch one page of the operation log.
///
/// Request: `sequence(u16)` cursor. Response: `[totalLen u16]
/// [next_sequence u16]` then `totalLen` bytes of records, each
/// `[len u8][kind u8][date 6][trailing...]` where `len` counts the bytes
/// after the length byte. No battery/status prefix on this response.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OperateLogCommand {
    pub sequence: u16,

    pub records: Vec<LogRecord>,
    pub next_sequence: u16,
}

impl OperateLogCommand {
    pub fn build(&self) -> Vec<u8> {
        self.sequence.to_be_bytes().to_vec()
    }

    pub fn decode(&mut self, data: &[u8]) {
        let Some(total_len) = read_u16_be(data, 0) else {
            return;
        };
        let Some(next) = read_u16_be(data, 2) else {
            return;
        };
        self.next_sequence = next;
        if total_len == 0 {
            return;
        }
        let mut cursor = data.get(4..4 + total_len as usize).unwrap_or(&data[4..]);
        while let Some((&len, tail)) = cursor.split_first() {
            let len = len as usize;
            if len == 0 || tail.len() < len {
                if !tail.is_empty() {
                    debug!("dropping truncated log record ({} bytes left)", tail.len());
                }
                break;
            }
            let body = &tail[..len];
            if let Some(record) = decode_record(body) {
                self.records.push(record);
            } else {
                debug!("skipping malformed log record {}", hex::encode(body));
            }
            cursor = &tail[len..];
        }
    }
}

fn decode_record(body: &[u8]) -> Option<LogRecord> {
    let (&kind, rest) = body.split_first()?;
    let kind = LogEventKind::from_primitive(kind);
    if rest.len() < 6 {
        return Some(LogRecord {
            kind,
            date: None,
            detail: LogDetail::Raw(rest.to_vec()),
        });
    }
    let date = format_date6(&rest[..6]);
    let trailing = &rest[6..];
    let detail = decode_detail(kind, trailing);
    Some(LogRecord { kind, date, detail })
}

fn decode_detail(kind: LogEventKind, trailing: &[u8]) -> LogDetail {
    use LogEventKind::*;
    match kind {
        UnlockByApp | LockByApp | AutoLocked => match (
            read_u32_be(trailing, 0),
            read_u32_be(trailing, 4),
        ) {
            (Some(uid), Some(record_id)) => LogDetail::AppUser { uid, record_id },
            _ => LogDetail::Raw(trailing.to_vec()),
        },
        UnlockByPasscode | AddPasscodeOnLock | ModifyPasscodeOnLock | DeletePasscodeOnLock
        | UnlockByAdminPasscode => decode_passcode(trailing),
        UnlockByIcCard | AddIcCardOnLock | DeleteIcCardOnLock | UnlockByFingerprint
        | AddFingerprintOnLock | DeleteFingerprintOnLock => match read_u32_be(trailing, 0) {
            Some(id) => LogDetail::CredentialId(id),
            None => LogDetail::Raw(trailing.to_vec()),
        },
        UnlockByWristband | UnlockByGateway => match trailing.get(..6) {
            Some(token) => {
                let mut t = [0u8; 6];
                t.copy_from_slice(token);
                LogDetail::Token(t)
            }
            None => LogDetail::Raw(trailing.to_vec()),
        },
        _ => LogDetail::Raw(trailing.to_vec()),
    }
}

/// Passcode trailing bytes: `[len u8][ascii digits...]`.
fn decode_passcode(trailing: &[u8]) -> LogDetail {
    match trailing.split_first() {
        Some((&len, digits)) if digits.len() >= len as usize => {
            LogDetail::Passcode(String::from_utf8_lossy(&digits[..len as usize]).into_owned())
        }
        _ => LogDetail::Raw(trailing.to_vec()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_log_is_not_an_error() {
        let mut cmd = OperateLogCommand::default();
        cmd.decode(&[0x00, 0x00, 0x00, 0x00]);
        assert!(cmd.records.is_empty());
        assert_eq!(cmd.next_sequence, 0);
    }

    #[test]
    fn unknown_kind_is_skipped_by_declared_length() {
        // record 1: unknown kind 0x63, 7 bytes after len
        // record 2: app unlock with uid/recordId
        let mut data = vec![0x00, 0x18, 0x00, 0x05];
        data.extend_from_slice(&[0x07, 0x63, 24, 1, 2, 3, 4, 5]);
        data.extend_from_slice(&[0x0f, 0x01, 24, 1, 2, 3, 4, 5]);
        data.extend_from_slice(&1234u32.to_be_bytes());
        data.extend_from_slice(&77u32.to_be_bytes());
        let mut cmd = OperateLogCommand::default();
        cmd.decode(&data);
        assert_eq!(cmd.next_sequence, 5);
        assert_eq!(cmd.records.len(), 2);
        assert_eq!(cmd.records[0].kind, LogEventKind::Unknown(0x63));
        assert_eq!(
            cmd.records[1].detail,
            LogDetail::AppUser {
                uid: 1234,
                record_id: 77
            }
        );
        assert_eq!(
            cmd.records[1].date.as_deref(),
            Some("2024-01-02 03:04:05")
        );
    }

    #[test]
    fn passcode_record_reads_length_prefixed_digits() {
        // kind 4, date 2024-06-01 12:00:00, then len-prefixed digits
        let mut record = vec![0x04, 24, 6, 1, 12, 0, 0, 0x04];
        record.extend_from_slice(b"1984");
        let mut data = vec![0x00, 0x0d, 0x00, 0x00];
        data.push(record.len() as u8);
        data.extend_from_slice(&record);
        let mut cmd = OperateLogCommand::default();
        cmd.decode(&data);
        assert_eq!(cmd.records.len(), 1);
        assert_eq!(cmd.records[0].kind, LogEventKind::UnlockByPasscode);
        assert_eq!(
            cmd.records[0].detail,
            LogDetail::Passcode("1984".to_string())
        );
    }
}
