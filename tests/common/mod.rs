//! Common test utilities and shared fixtures

// Shared across multiple test files; not every item is used in each one.
#[allow(unused_imports)]
pub use ttlock_ble::command::{Command, CommandType};
#[allow(unused_imports)]
pub use ttlock_ble::envelope::{CommandEnvelope, FrameConfig};
#[allow(unused_imports)]
pub use ttlock_ble::error::LockError;
#[allow(unused_imports)]
pub use ttlock_ble::session::{
    LockSession, PairingPolicy, ScanKind, SessionConfig, SessionNotification,
};
#[allow(unused_imports)]
pub use ttlock_ble::version::LockVersion;

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use ttlock_ble::transport::{frame_channel, FrameReceiver, FrameSender, LockTransport};
use ttlock_ble::{crc, crypto};

/// Captured frame from a real pairing session, encrypted under
/// [`CAPTURED_AES_KEY`].
#[allow(dead_code)]
pub const CAPTURED_FRAME: &str = "7f5a0503020001000154aa1095a3bd4703fde2b76397587b6ee44b7b28";

#[allow(dead_code)]
pub const CAPTURED_AES_KEY: &str = "e817e962c7176c296403f646129f362c";

/// Decrypted payload of [`CAPTURED_FRAME`].
#[allow(dead_code)]
pub const CAPTURED_PLAINTEXT: &[u8] = &[0x05, 0x01, 0x3f, 0x02, 0x02];

#[allow(dead_code)]
pub fn hex_to_bytes(hex_data: &str) -> Vec<u8> {
    hex::decode(hex_data).expect("failed to decode hex")
}

#[allow(dead_code)]
pub fn captured_key() -> [u8; 16] {
    hex_to_bytes(CAPTURED_AES_KEY).try_into().expect("16 bytes")
}

/// Build a modern device-to-app frame around an already decoded payload.
#[allow(dead_code)]
pub fn device_frame(command_type: u8, plaintext: &[u8], key: &[u8; 16]) -> Vec<u8> {
    let payload = crypto::aes_encrypt(plaintext, key).expect("encrypts");
    let mut frame = vec![
        0x7f,
        0x5a,
        0x05,
        0x03,
        0x02,
        0x00,
        0x01,
        0x00,
        0x01,
        command_type,
        0xaa,
        payload.len() as u8,
    ];
    frame.extend_from_slice(&payload);
    frame.push(crc::crc8(&frame));
    frame
}

/// Scripted transport: records outbound frames and, after each send,
/// delivers the next batch of canned device frames through the inbound
/// channel.
pub struct MockTransport {
    pairing_mode: bool,
    connected: bool,
    sent: Arc<Mutex<Vec<Vec<u8>>>>,
    scripts: VecDeque<Vec<Vec<u8>>>,
    tx: FrameSender,
}

impl MockTransport {
    #[allow(dead_code)]
    pub fn new(
        pairing_mode: bool,
        scripts: Vec<Vec<Vec<u8>>>,
    ) -> (Self, FrameReceiver, Arc<Mutex<Vec<Vec<u8>>>>) {
        let (tx, rx) = frame_channel();
        let sent = Arc::new(Mutex::new(Vec::new()));
        let transport = MockTransport {
            pairing_mode,
            connected: true,
            sent: Arc::clone(&sent),
            scripts: scripts.into(),
            tx,
        };
        (transport, rx, sent)
    }
}

#[async_trait]
impl LockTransport for MockTransport {
    async fn connect(&mut self) -> Result<(), LockError> {
        self.connected = true;
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<(), LockError> {
        self.connected = false;
        Ok(())
    }

    async fn send_frame(&mut self, frame: &[u8]) -> Result<(), LockError> {
        self.sent.lock().expect("sent lock").push(frame.to_vec());
        if let Some(batch) = self.scripts.pop_front() {
            for frame in batch {
                self.tx
                    .try_send(bytes::Bytes::from(frame))
                    .map_err(|e| LockError::Transport(e.to_string()))?;
            }
        }
        Ok(())
    }

    fn is_in_pairing_mode(&self) -> bool {
        self.pairing_mode
    }

    fn is_connected(&self) -> bool {
        self.connected
    }
}
