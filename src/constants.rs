// Protocol constants for TTLock-compatible BLE locks

/// Fixed two-byte frame header.
pub const FRAME_HEADER: [u8; 2] = [0x7f, 0x5a];

/// Header size of the modern (AES generation) frame layout.
pub const MODERN_HEADER_SIZE: usize = 12;

/// Header size of the legacy (XOR generation) frame layout.
pub const LEGACY_HEADER_SIZE: usize = 6;

/// Minimum length of any frame: legacy header plus trailing CRC byte.
pub const MIN_FRAME_SIZE: usize = 7;

/// Minimum length of a modern frame: full header plus trailing CRC byte.
pub const MIN_MODERN_FRAME_SIZE: usize = 13;

/// Encrypt-flag sentinel for app commands in the modern dialect.
pub const ENCRYPT_APP_COMMAND: u8 = 0xaa;

/// First protocol generation that uses the modern 12-byte header.
pub const MODERN_PROTOCOL_TYPE: u8 = 5;

/// Well-known AES key the firmware accepts before pairing. Only ever used
/// to carry the key-exchange command; replaced by the lock-issued key as
/// soon as pairing succeeds.
pub const DEFAULT_AES_KEY: [u8; 16] = [
    0x98, 0x76, 0x23, 0xe8, 0xa9, 0x23, 0xa1, 0xbb, 0x3d, 0x9e, 0x7d, 0x03, 0x78, 0x12, 0x45, 0x88,
];

/// Vendor sentinel string used by the pairing commands.
pub const PAIRING_SENTINEL: &[u8; 7] = b"SCIENER";

/// Response status byte for a successful operation.
pub const STATUS_SUCCESS: u8 = 0x01;
