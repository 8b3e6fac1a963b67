use crate::command::CommandType;
use thiserror::Error;

/// The primary error type for the `ttlock-ble` library.
#[derive(Error, Debug)]
pub enum LockError {
    #[error("Frame too short: {actual} bytes")]
    FrameTooShort { actual: usize },

    #[error("Invalid frame length: need at least {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("CRC mismatch: computed {computed:#04x}, frame carries {received:#04x}")]
    CrcMismatch { computed: u8, received: u8 },

    #[error("Invalid AES key length: expected 16 bytes, got {len}")]
    InvalidKey { len: usize },

    #[error("Decryption failed: {0}")]
    Decryption(String),

    #[error("Command not ready: payload or AES key missing")]
    CommandNotReady,

    #[error("Cannot encrypt payload: no AES key set on the envelope")]
    MissingAesKey,

    #[error("No admin credentials available for this lock")]
    MissingAdminCredentials,

    #[error("Lock is not in pairing/setting mode")]
    NotInPairingMode,

    #[error("Session busy: another request is already in flight")]
    SessionBusy,

    #[error("Cannot build payload for unregistered command type {0:#04x}")]
    UnknownCommand(u8),

    #[error("Pairing failed: {0}")]
    PairingFailed(String),

    #[error("Admin login rejected: psFromLock={ps_from_lock}")]
    AdminLoginFailed { ps_from_lock: u32 },

    #[error("Command {command:?} failed with status {status:#04x}")]
    OperationFailed { command: CommandType, status: u8 },

    #[error("Timed out waiting for a response frame")]
    ResponseTimeout(#[from] tokio::time::error::Elapsed),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Invalid stored lock record: {0}")]
    InvalidRecord(String),

    #[error("Advertisement payload too short: {len} bytes")]
    InvalidAdvertisement { len: usize },
}
