pub mod command;
pub mod constants;
pub mod crc;
pub mod crypto;
pub mod envelope;
pub mod error;
pub mod session;
pub mod store;
pub mod transport;
pub mod version;

pub use command::{Command, CommandType};
pub use envelope::{CommandEnvelope, FrameConfig};
pub use error::LockError;
pub use session::{
    LockSession, PairingPolicy, ScanKind, SessionConfig, SessionNotification,
};
pub use store::{AdminCredentials, LockRecord, StoredPasswordSeed};
pub use transport::{frame_channel, FrameReceiver, FrameSender, LockTransport};
pub use version::{classify_advertisement, Advertisement, LockType, LockVersion};
