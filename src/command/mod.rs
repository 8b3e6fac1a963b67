//! Command registry and per-command payload codecs.
//!
//! One variant per known command type. Outbound commands are created blank
//! via [`Command::from_type`], have their request fields set, and are
//! serialized with [`Command::build`]. Inbound payloads are decoded via
//! [`Command::from_parts`] (frame command type plus decrypted payload) or
//! [`Command::from_data`] (leading type tag inside the payload). Unknown
//! tags degrade to [`UnknownCommand`] instead of failing the envelope.
//!
//! Decoding is deliberately lenient: a short or absent payload leaves the
//! typed fields unset so zero-length acknowledgement frames never crash.

pub mod card;
pub mod config;
pub mod control;
pub mod device;
pub mod fingerprint;
pub mod log;
pub mod pairing;
pub mod passcode;

use crate::error::LockError;
use num_enum::{FromPrimitive, IntoPrimitive};
use tracing::warn;

pub use card::{IcAddState, IcCardCommand, IcCardOp, IcCardRecord};
pub use config::{
    AudioManageCommand, AutoLockManageCommand, ConfigOp, PassageModeCommand, PassageModeOp,
    PassageSchedule, RemoteUnlockCommand,
};
pub use control::{
    CalibrateTimeCommand, DeviceFeaturesCommand, LockCommand, LockFeature, ResetLockCommand,
    UnlockCommand,
};
pub use device::{DeviceInfoCommand, InfoField};
pub use fingerprint::{FingerprintCommand, FingerprintOp, FrAddState};
pub use log::{LogDetail, LogEventKind, LogRecord, OperateLogCommand};
pub use pairing::{
    AddAdminCommand, CheckAdminCommand, CheckRandomCommand, GetAesKeyCommand,
    InitializationCommand,
};
pub use passcode::{
    GetValidKeyboardPasswordsCommand, InitPasswordsCommand, KeyboardPasswordOp,
    ManageKeyboardPasswordCommand, PasscodeEntry, PasscodeWindow, PasswordSeed,
    ScreenPasscodeManageCommand, SetAdminKeyboardPwdCommand,
};

/// Wire tag for every command the registry knows about. First-generation
/// commands use single ASCII characters, later additions small integers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoPrimitive, FromPrimitive)]
#[repr(u8)]
pub enum CommandType {
    SearchDeviceFeature = 0x01,
    ManageKeyboardPassword = 0x03,
    GetValidKeyboardPasswords = 0x04,
    IcCardManage = 0x05,
    FingerprintManage = 0x06,
    SearchBicycleStatus = 0x14,
    GetAesKey = 0x19,
    OperateLog = 0x25,
    CheckRandom = 0x30,       // '0'
    InitPasswords = 0x34,
    AutoLockManage = 0x36,
    ControlRemoteUnlock = 0x37,
    CheckAdmin = 0x41,        // 'A'
    CalibrateTime = 0x43,     // 'C'
    Initialization = 0x45,    // 'E'
    Unlock = 0x47,            // 'G'
    Lock = 0x4c,              // 'L'
    ResetLock = 0x52,         // 'R'
    SetAdminKeyboardPwd = 0x53, // 'S'
    ScreenPasscodeManage = 0x54, // 'T'
    CheckUserTime = 0x55,     // 'U'
    AddAdmin = 0x56,          // 'V'
    OperateFinished = 0x57,   // 'W'
    AudioManage = 0x62,
    GetAdminCode = 0x65,
    PassageMode = 0x66,
    ReadDeviceInfo = 0x90,

    #[num_enum(catch_all)]
    Unknown(u8),
}

/// Pass-through placeholder for command types outside the registry.
/// Decode keeps the raw bytes for diagnostics; build always fails because
/// an unknown command must never be sent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UnknownCommand {
    pub tag: u8,
    pub raw: Vec<u8>,
}

/// A logical command: the operation encoded inside a frame payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    GetAesKey(GetAesKeyCommand),
    AddAdmin(AddAdminCommand),
    CheckAdmin(CheckAdminCommand),
    CheckRandom(CheckRandomCommand),
    Initialization(InitializationCommand),
    CalibrateTime(CalibrateTimeCommand),
    Unlock(UnlockCommand),
    Lock(LockCommand),
    SearchDeviceFeature(DeviceFeaturesCommand),
    ResetLock(ResetLockCommand),
    ManageKeyboardPassword(ManageKeyboardPasswordCommand),
    GetValidKeyboardPasswords(GetValidKeyboardPasswordsCommand),
    InitPasswords(InitPasswordsCommand),
    SetAdminKeyboardPwd(SetAdminKeyboardPwdCommand),
    ScreenPasscodeManage(ScreenPasscodeManageCommand),
    IcCardManage(IcCardCommand),
    FingerprintManage(FingerprintCommand),
    AudioManage(AudioManageCommand),
    AutoLockManage(AutoLockManageCommand),
    ControlRemoteUnlock(RemoteUnlockCommand),
    PassageMode(PassageModeCommand),
    ReadDeviceInfo(DeviceInfoCommand),
    OperateLog(OperateLogCommand),
    Unknown(UnknownCommand),
}

impl Command {
    /// Blank instance for an outbound request of the given type.
    pub fn from_type(command_type: CommandType) -> Self {
        match command_type {
            CommandType::GetAesKey => Command::GetAesKey(Default::default()),
            CommandType::AddAdmin => Command::AddAdmin(Default::default()),
            CommandType::CheckAdmin => Command::CheckAdmin(Default::default()),
            CommandType::CheckRandom => Command::CheckRandom(Default::default()),
            CommandType::Initialization => Command::Initialization(Default::default()),
            CommandType::CalibrateTime => Command::CalibrateTime(Default::default()),
            CommandType::Unlock => Command::Unlock(Default::default()),
            CommandType::Lock => Command::Lock(Default::default()),
            CommandType::SearchDeviceFeature => Command::SearchDeviceFeature(Default::default()),
            CommandType::ResetLock => Command::ResetLock(Default::default()),
            CommandType::ManageKeyboardPassword => {
                Command::ManageKeyboardPassword(Default::default())
            }
            CommandType::GetValidKeyboardPasswords => {
                Command::GetValidKeyboardPasswords(Default::default())
            }
            CommandType::InitPasswords => Command::InitPasswords(Default::default()),
            CommandType::SetAdminKeyboardPwd => Command::SetAdminKeyboardPwd(Default::default()),
            CommandType::ScreenPasscodeManage => Command::ScreenPasscodeManage(Default::default()),
            CommandType::IcCardManage => Command::IcCardManage(Default::default()),
            CommandType::FingerprintManage => Command::FingerprintManage(Default::default()),
            CommandType::AudioManage => Command::AudioManage(Default::default()),
            CommandType::AutoLockManage => Command::AutoLockManage(Default::default()),
            CommandType::ControlRemoteUnlock => Command::ControlRemoteUnlock(Default::default()),
            CommandType::PassageMode => Command::PassageMode(Default::default()),
            CommandType::ReadDeviceInfo => Command::ReadDeviceInfo(Default::default()),
            CommandType::OperateLog => Command::OperateLog(Default::default()),
            other => Command::Unknown(UnknownCommand {
                tag: other.into(),
                raw: Vec::new(),
            }),
        }
    }

    /// Decode an inbound payload whose first byte is the command tag.
    /// Unrecognized tags are logged and kept as [`UnknownCommand`].
    pub fn from_data(data: &[u8]) -> Self {
        match data.split_first() {
            Some((&tag, rest)) => Self::from_parts(CommandType::from_primitive(tag), rest),
            None => Command::Unknown(UnknownCommand::default()),
        }
    }

    /// Decode an inbound payload for a known frame-level command type.
    pub fn from_parts(command_type: CommandType, data: &[u8]) -> Self {
        let mut command = Self::from_type(command_type);
        if let Command::Unknown(u) = &mut command {
            u.raw = data.to_vec();
            warn!(
                "unrecognized command tag {:#04x}, raw {}",
                u.tag,
                hex::encode(data)
            );
            return command;
        }
        command.decode(data);
        command
    }

    /// The wire tag of this command.
    pub fn command_type(&self) -> CommandType {
        match self {
            Command::GetAesKey(_) => CommandType::GetAesKey,
            Command::AddAdmin(_) => CommandType::AddAdmin,
            Command::CheckAdmin(_) => CommandType::CheckAdmin,
            Command::CheckRandom(_) => CommandType::CheckRandom,
            Command::Initialization(_) => CommandType::Initialization,
            Command::CalibrateTime(_) => CommandType::CalibrateTime,
            Command::Unlock(_) => CommandType::Unlock,
            Command::Lock(_) => CommandType::Lock,
            Command::SearchDeviceFeature(_) => CommandType::SearchDeviceFeature,
            Command::ResetLock(_) => CommandType::ResetLock,
            Command::ManageKeyboardPassword(_) => CommandType::ManageKeyboardPassword,
            Command::GetValidKeyboardPasswords(_) => CommandType::GetValidKeyboardPasswords,
            Command::InitPasswords(_) => CommandType::InitPasswords,
            Command::SetAdminKeyboardPwd(_) => CommandType::SetAdminKeyboardPwd,
            Command::ScreenPasscodeManage(_) => CommandType::ScreenPasscodeManage,
            Command::IcCardManage(_) => CommandType::IcCardManage,
            Command::FingerprintManage(_) => CommandType::FingerprintManage,
            Command::AudioManage(_) => CommandType::AudioManage,
            Command::AutoLockManage(_) => CommandType::AutoLockManage,
            Command::ControlRemoteUnlock(_) => CommandType::ControlRemoteUnlock,
            Command::PassageMode(_) => CommandType::PassageMode,
            Command::ReadDeviceInfo(_) => CommandType::ReadDeviceInfo,
            Command::OperateLog(_) => CommandType::OperateLog,
            Command::Unknown(u) => CommandType::from_primitive(u.tag),
        }
    }

    /// Serialize the outbound payload. Unset optional fields produce an
    /// empty payload; only unknown commands refuse to build.
    pub fn build(&self) -> Result<Vec<u8>, LockError> {
        match self {
            Command::GetAesKey(c) => Ok(c.build()),
            Command::AddAdmin(c) => Ok(c.build()),
            Command::CheckAdmin(c) => Ok(c.build()),
            Command::CheckRandom(c) => Ok(c.build()),
            Command::Initialization(c) => Ok(c.build()),
            Command::CalibrateTime(c) => Ok(c.build()),
            Command::Unlock(c) => Ok(c.build()),
            Command::Lock(c) => Ok(c.build()),
            Command::SearchDeviceFeature(c) => Ok(c.build()),
            Command::ResetLock(c) => Ok(c.build()),
            Command::ManageKeyboardPassword(c) => Ok(c.build()),
            Command::GetValidKeyboardPasswords(c) => Ok(c.build()),
            Command::InitPasswords(c) => Ok(c.build()),
            Command::SetAdminKeyboardPwd(c) => Ok(c.build()),
            Command::ScreenPasscodeManage(c) => Ok(c.build()),
            Command::IcCardManage(c) => Ok(c.build()),
            Command::FingerprintManage(c) => Ok(c.build()),
            Command::AudioManage(c) => Ok(c.build()),
            Command::AutoLockManage(c) => Ok(c.build()),
            Command::ControlRemoteUnlock(c) => Ok(c.build()),
            Command::PassageMode(c) => Ok(c.build()),
            Command::ReadDeviceInfo(c) => Ok(c.build()),
            Command::OperateLog(c) => Ok(c.build()),
            Command::Unknown(u) => Err(LockError::UnknownCommand(u.tag)),
        }
    }

    fn decode(&mut self, data: &[u8]) {
        match self {
            Command::GetAesKey(c) => c.decode(data),
            Command::AddAdmin(c) => c.decode(data),
            Command::CheckAdmin(c) => c.decode(data),
            Command::CheckRandom(c) => c.decode(data),
            Command::Initialization(c) => c.decode(data),
            Command::CalibrateTime(c) => c.decode(data),
            Command::Unlock(c) => c.decode(data),
            Command::Lock(c) => c.decode(data),
            Command::SearchDeviceFeature(c) => c.decode(data),
            Command::ResetLock(c) => c.decode(data),
            Command::ManageKeyboardPassword(c) => c.decode(data),
            Command::GetValidKeyboardPasswords(c) => c.decode(data),
            Command::InitPasswords(c) => c.decode(data),
            Command::SetAdminKeyboardPwd(c) => c.decode(data),
            Command::ScreenPasscodeManage(c) => c.decode(data),
            Command::IcCardManage(c) => c.decode(data),
            Command::FingerprintManage(c) => c.decode(data),
            Command::AudioManage(c) => c.decode(data),
            Command::AutoLockManage(c) => c.decode(data),
            Command::ControlRemoteUnlock(c) => c.decode(data),
            Command::PassageMode(c) => c.decode(data),
            Command::ReadDeviceInfo(c) => c.decode(data),
            Command::OperateLog(c) => c.decode(data),
            Command::Unknown(_) => {}
        }
    }

    /// Battery percentage reported in the response, if any.
    pub fn battery(&self) -> Option<u8> {
        self.prefix().map(|p| p.battery)
    }

    /// Raw status byte from the response prefix.
    pub fn status(&self) -> Option<u8> {
        self.prefix().map(|p| p.status)
    }

    /// True when the response carried a success status byte.
    pub fn succeeded(&self) -> Option<bool> {
        match self {
            // Add-admin signals success via the SCIENER echo instead.
            Command::AddAdmin(c) => c.succeeded,
            _ => self
                .prefix()
                .map(|p| p.status == crate::constants::STATUS_SUCCESS),
        }
    }

    fn prefix(&self) -> Option<ResponsePrefix> {
        match self {
            Command::GetAesKey(c) => c.prefix,
            Command::CheckRandom(c) => c.prefix,
            Command::Initialization(c) => c.prefix,
            Command::CalibrateTime(c) => c.prefix,
            Command::Unlock(c) => c.prefix,
            Command::Lock(c) => c.prefix,
            Command::SearchDeviceFeature(c) => c.prefix,
            Command::ResetLock(c) => c.prefix,
            Command::ManageKeyboardPassword(c) => c.prefix,
            Command::GetValidKeyboardPasswords(c) => c.prefix,
            Command::InitPasswords(c) => c.prefix,
            Command::SetAdminKeyboardPwd(c) => c.prefix,
            Command::ScreenPasscodeManage(c) => c.prefix,
            Command::IcCardManage(c) => c.prefix,
            Command::FingerprintManage(c) => c.prefix,
            Command::AudioManage(c) => c.prefix,
            Command::AutoLockManage(c) => c.prefix,
            Command::ControlRemoteUnlock(c) => c.prefix,
            Command::PassageMode(c) => c.prefix,
            Command::ReadDeviceInfo(c) => c.prefix,
            _ => None,
        }
    }
}

/// Leading `[battery, status]` pair most responses start with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResponsePrefix {
    pub battery: u8,
    pub status: u8,
}

impl ResponsePrefix {
    /// Split the prefix off a response payload. Returns `None` for payloads
    /// too short to carry one, leaving the command fields unset.
    pub(crate) fn split(data: &[u8]) -> Option<(ResponsePrefix, &[u8])> {
        if data.len() < 2 {
            return None;
        }
        Some((
            ResponsePrefix {
                battery: data[0],
                status: data[1],
            },
            &data[2..],
        ))
    }

    pub fn is_success(&self) -> bool {
        self.status == crate::constants::STATUS_SUCCESS
    }
}

// Byte-layout helpers shared by the payload codecs.

pub(crate) fn read_u32_be(data: &[u8], offset: usize) -> Option<u32> {
    let bytes: [u8; 4] = data.get(offset..offset + 4)?.try_into().ok()?;
    Some(u32::from_be_bytes(bytes))
}

pub(crate) fn read_u16_be(data: &[u8], offset: usize) -> Option<u16> {
    let bytes: [u8; 2] = data.get(offset..offset + 2)?.try_into().ok()?;
    Some(u16::from_be_bytes(bytes))
}

/// Append an identifier big-endian, compacted to 4 bytes when it fits.
pub(crate) fn push_compact_id(buf: &mut Vec<u8>, id: u64) {
    if id <= u32::MAX as u64 {
        buf.extend_from_slice(&(id as u32).to_be_bytes());
    } else {
        buf.extend_from_slice(&id.to_be_bytes());
    }
}

/// Read a 4- or 8-byte big-endian identifier from the remaining bytes.
pub(crate) fn read_compact_id(data: &[u8]) -> Option<u64> {
    match data.len() {
        4 => read_u32_be(data, 0).map(u64::from),
        8 => {
            let bytes: [u8; 8] = data.try_into().ok()?;
            Some(u64::from_be_bytes(bytes))
        }
        _ => None,
    }
}

/// Pack a `(year, month, day, hour, minute)` tuple into the 5-byte wire
/// form (two-digit year).
pub(crate) fn pack_date5(yy: u8, month: u8, day: u8, hour: u8, minute: u8) -> [u8; 5] {
    [yy, month, day, hour, minute]
}

/// Render the 6-byte packed date (YY MM DD HH mm ss) responses carry.
pub(crate) fn format_date6(date: &[u8]) -> Option<String> {
    if date.len() < 6 {
        return None;
    }
    Some(format!(
        "20{:02}-{:02}-{:02} {:02}:{:02}:{:02}",
        date[0], date[1], date[2], date[3], date[4], date[5]
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_tag_is_preserved_not_fatal() {
        let command = Command::from_data(&[0xfe, 0x01, 0x02]);
        match &command {
            Command::Unknown(u) => {
                assert_eq!(u.tag, 0xfe);
                assert_eq!(u.raw, vec![0x01, 0x02]);
            }
            other => panic!("expected Unknown, got {other:?}"),
        }
        assert!(matches!(command.build(), Err(LockError::UnknownCommand(0xfe))));
    }

    #[test]
    fn empty_data_yields_blank_unknown() {
        assert!(matches!(Command::from_data(&[]), Command::Unknown(_)));
    }

    #[test]
    fn op_selectors_default_to_their_query_variant() {
        // Response decoding builds default command instances, so every op
        // selector needs a usable default alongside its catch-all.
        assert_eq!(IcCardOp::default(), IcCardOp::Search);
        assert_eq!(FingerprintOp::default(), FingerprintOp::Search);
        assert_eq!(ConfigOp::default(), ConfigOp::Query);
        assert_eq!(PassageModeOp::default(), PassageModeOp::Query);
        assert_eq!(InfoField::default(), InfoField::ProductModel);
        assert_eq!(KeyboardPasswordOp::default(), KeyboardPasswordOp::Add);

        // Catch-all conversion stays intact for unmapped opcodes.
        assert_eq!(IcCardOp::from(0x7fu8), IcCardOp::Unknown(0x7f));
        assert_eq!(u8::from(ConfigOp::Unknown(0x7f)), 0x7f);
    }

    #[test]
    fn compact_id_packing() {
        let mut buf = Vec::new();
        push_compact_id(&mut buf, 0xdead_beef);
        assert_eq!(buf, vec![0xde, 0xad, 0xbe, 0xef]);

        let mut buf = Vec::new();
        push_compact_id(&mut buf, 0x01_0000_0001);
        assert_eq!(buf.len(), 8);
        assert_eq!(read_compact_id(&buf), Some(0x01_0000_0001));
    }
}
