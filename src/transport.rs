//! Transport abstraction over the BLE link.
//!
//! The protocol runs over GATT write-without-response plus notifications,
//! which this crate models as an outbound `send_frame` call and an inbound
//! channel of reassembled frames. Fragmentation and reassembly of the
//! 20-byte ATT chunks is the transport implementation's job; the session
//! only ever sees whole frames.

use crate::error::LockError;
use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::mpsc;

/// Frames the transport has reassembled from notifications.
pub type FrameReceiver = mpsc::Receiver<Bytes>;
pub type FrameSender = mpsc::Sender<Bytes>;

/// One BLE link to one physical lock.
#[async_trait]
pub trait LockTransport: Send + Sync {
    async fn connect(&mut self) -> Result<(), LockError>;

    async fn disconnect(&mut self) -> Result<(), LockError>;

    /// Write one complete frame to the device.
    async fn send_frame(&mut self, frame: &[u8]) -> Result<(), LockError>;

    /// Whether the device currently advertises its hardware pairing/setting
    /// mode. Pairing is refused up front when this is false.
    fn is_in_pairing_mode(&self) -> bool;

    fn is_connected(&self) -> bool;
}

/// Bounded channel pair for inbound frames. The bound only matters when a
/// burst of pushes outruns the session; 32 frames is far beyond anything
/// the firmware emits.
pub fn frame_channel() -> (FrameSender, FrameReceiver) {
    mpsc::channel(32)
}
