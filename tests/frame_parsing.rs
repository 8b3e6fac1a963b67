//! Frame codec tests against a captured golden frame and both header
//! dialects.

mod common;

use common::*;
use ttlock_ble::crypto;

#[test]
fn captured_frame_decodes_to_known_plaintext() {
    let raw = hex_to_bytes(CAPTURED_FRAME);
    let mut envelope =
        CommandEnvelope::from_raw_data(&raw, FrameConfig::default()).expect("parses");

    assert!(envelope.is_crc_ok());
    assert_eq!(envelope.command_type(), CommandType::ScreenPasscodeManage);
    assert_eq!(envelope.encrypt(), 0xaa);

    let version = *envelope.version();
    assert_eq!(version.protocol_type, 5);
    assert_eq!(version.protocol_version, 3);
    assert_eq!(version.scene, 2);
    assert_eq!(version.group_id, 1);
    assert_eq!(version.org_id, 1);

    envelope.set_aes_key(captured_key());
    assert_eq!(envelope.data().expect("decrypts"), CAPTURED_PLAINTEXT);

    let command = envelope.command().expect("decodes");
    assert_eq!(command.battery(), Some(0x05));
    assert_eq!(command.succeeded(), Some(true));
}

#[test]
fn decoded_command_is_cached() {
    let raw = hex_to_bytes(CAPTURED_FRAME);
    let mut envelope =
        CommandEnvelope::from_raw_data(&raw, FrameConfig::default()).expect("parses");
    envelope.set_aes_key(captured_key());
    let first = envelope.command().expect("decodes").clone();
    let second = envelope.command().expect("decodes").clone();
    assert_eq!(first, second);
}

#[test]
fn legacy_frame_uses_xor_cipher() {
    let plaintext = [0x64u8, 0x01, 0x11, 0x22];
    let seed = 0x2a;
    let payload = crypto::legacy_encode(&plaintext, Some(seed));

    let mut frame = vec![0x7f, 0x5a, 0x03, 0x41, seed, payload.len() as u8];
    frame.extend_from_slice(&payload);
    frame.push(ttlock_ble::crc::crc8(&frame));

    let envelope =
        CommandEnvelope::from_raw_data(&frame, FrameConfig::default()).expect("parses");
    assert!(envelope.is_crc_ok());
    assert_eq!(envelope.command_type(), CommandType::CheckAdmin);
    assert_eq!(envelope.encrypt(), seed);
    assert_eq!(envelope.data().expect("decodes"), plaintext);
}

#[test]
fn outbound_frame_parses_back() {
    let key = captured_key();
    let frame = device_frame(0x47, &[0x5a, 0x01, 0x00, 0x00, 0x04, 0xd2], &key);
    let mut envelope =
        CommandEnvelope::from_raw_data(&frame, FrameConfig::default()).expect("parses");
    assert_eq!(envelope.command_type(), CommandType::Unlock);
    envelope.set_aes_key(key);
    let command = envelope.command().expect("decodes");
    assert_eq!(command.battery(), Some(0x5a));
}
