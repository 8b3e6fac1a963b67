//! Session state-machine tests over a scripted transport.

mod common;

use common::*;
use std::time::Duration;
use ttlock_ble::constants::DEFAULT_AES_KEY;
use ttlock_ble::store::{AdminCredentials, LockRecord};

const SESSION_KEY: [u8; 16] = [0x42; 16];

fn restored_record() -> LockRecord {
    let mut record = LockRecord {
        admin: Some(AdminCredentials {
            admin_ps: 7777,
            unlock_key: 2000,
        }),
        ..Default::default()
    };
    record.set_aes_key(&SESSION_KEY);
    record
}

/// `[battery, status]` success acknowledgement.
fn ack(command_type: u8) -> Vec<u8> {
    device_frame(command_type, &[0x60, 0x01], &SESSION_KEY)
}

#[tokio::test]
async fn pairing_refused_outside_setting_mode_sends_nothing() {
    let (transport, inbound, sent) = MockTransport::new(false, vec![]);
    let (mut session, _notifications) = LockSession::new(
        transport,
        inbound,
        LockVersion::V3,
        SessionConfig::default(),
    );

    let err = session.init_lock().await;
    assert!(matches!(err, Err(LockError::NotInPairingMode)));
    assert!(sent.lock().unwrap().is_empty());
}

#[tokio::test]
async fn pairing_acquires_session_key() {
    // Response carries the lock-issued key, encrypted under the default key.
    let mut plaintext = vec![0x60, 0x01];
    plaintext.extend_from_slice(&SESSION_KEY);
    let reply = device_frame(0x19, &plaintext, &DEFAULT_AES_KEY);

    let (transport, inbound, sent) = MockTransport::new(true, vec![vec![reply]]);
    let config = SessionConfig {
        pairing_policy: PairingPolicy::DeferAdmin,
        ..Default::default()
    };
    let (mut session, _notifications) =
        LockSession::new(transport, inbound, LockVersion::V3, config);

    session.init_lock().await.expect("pairing succeeds");
    assert_eq!(sent.lock().unwrap().len(), 1);

    let record = session.persist();
    assert_eq!(
        record.aes_key_bytes().expect("valid key"),
        Some(SESSION_KEY)
    );
}

#[tokio::test]
async fn pairing_failure_status_is_fatal_to_the_attempt() {
    let reply = device_frame(0x19, &[0x60, 0x00], &DEFAULT_AES_KEY);
    let (transport, inbound, _sent) = MockTransport::new(true, vec![vec![reply]]);
    let (mut session, _notifications) = LockSession::new(
        transport,
        inbound,
        LockVersion::V3,
        SessionConfig::default(),
    );

    assert!(matches!(
        session.init_lock().await,
        Err(LockError::PairingFailed(_))
    ));
}

#[tokio::test]
async fn admin_login_runs_the_two_step_challenge() {
    let ps_from_lock = 500u32.to_be_bytes();
    let scripts = vec![
        vec![device_frame(0x41, &ps_from_lock, &SESSION_KEY)],
        vec![ack(0x30)],
    ];
    let (transport, inbound, _sent) = MockTransport::new(false, scripts);
    let (mut session, _notifications) = LockSession::new(
        transport,
        inbound,
        LockVersion::V3,
        SessionConfig::default(),
    );
    session.restore(&restored_record()).expect("restores");

    session.admin_login().await.expect("login succeeds");
    assert!(session.is_authenticated());
}

#[tokio::test]
async fn admin_login_rejected_when_ps_from_lock_is_zero() {
    let scripts = vec![vec![device_frame(0x41, &0u32.to_be_bytes(), &SESSION_KEY)]];
    let (transport, inbound, _sent) = MockTransport::new(false, scripts);
    let (mut session, _notifications) = LockSession::new(
        transport,
        inbound,
        LockVersion::V3,
        SessionConfig::default(),
    );
    session.restore(&restored_record()).expect("restores");

    assert!(matches!(
        session.admin_login().await,
        Err(LockError::AdminLoginFailed { ps_from_lock: 0 })
    ));
    assert!(!session.is_authenticated());
}

#[tokio::test]
async fn add_fingerprint_emits_two_progress_notifications() {
    let ps_from_lock = 500u32.to_be_bytes();
    let fingerprint_id = 12345u32.to_be_bytes();
    let scripts = vec![
        // admin challenge
        vec![device_frame(0x41, &ps_from_lock, &SESSION_KEY)],
        vec![ack(0x30)],
        // enter add mode, two sampling steps, then the terminal frame
        vec![
            device_frame(0x06, &[0x60, 0x01, 0x02], &SESSION_KEY),
            device_frame(0x06, &[0x60, 0x01, 0x02, 0x01], &SESSION_KEY),
            device_frame(0x06, &[0x60, 0x01, 0x02, 0x02], &SESSION_KEY),
            device_frame(
                0x06,
                &[
                    0x60,
                    0x01,
                    0x02,
                    fingerprint_id[0],
                    fingerprint_id[1],
                    fingerprint_id[2],
                    fingerprint_id[3],
                ],
                &SESSION_KEY,
            ),
        ],
    ];
    let (transport, inbound, _sent) = MockTransport::new(false, scripts);
    let (mut session, mut notifications) = LockSession::new(
        transport,
        inbound,
        LockVersion::V3,
        SessionConfig::default(),
    );
    session.restore(&restored_record()).expect("restores");

    let id = session.add_fingerprint().await.expect("enrolls");
    assert_eq!(id, 12345);

    assert_eq!(
        notifications.try_recv(),
        Ok(SessionNotification::ScanStarted(ScanKind::Fingerprint))
    );
    assert_eq!(
        notifications.try_recv(),
        Ok(SessionNotification::ScanProgress {
            kind: ScanKind::Fingerprint,
            step: 1
        })
    );
    assert_eq!(
        notifications.try_recv(),
        Ok(SessionNotification::ScanProgress {
            kind: ScanKind::Fingerprint,
            step: 2
        })
    );
    assert!(notifications.try_recv().is_err());
}

#[tokio::test]
async fn unsolicited_frame_is_routed_to_notifications() {
    let ps_from_lock = 500u32.to_be_bytes();
    // A spontaneous unlock push arrives before the pending response.
    let push = device_frame(0x47, &[0x60, 0x01], &SESSION_KEY);
    let scripts = vec![vec![push, device_frame(0x41, &ps_from_lock, &SESSION_KEY)]];
    let (transport, inbound, _sent) = MockTransport::new(false, scripts);
    // Only the first challenge step is scripted; keep the second step's
    // timeout short.
    let config = SessionConfig {
        response_timeout: Duration::from_millis(100),
        ..Default::default()
    };
    let (mut session, mut notifications) =
        LockSession::new(transport, inbound, LockVersion::V3, config);
    session.restore(&restored_record()).expect("restores");

    let _ = session.admin_login().await;
    assert_eq!(
        notifications.try_recv(),
        Ok(SessionNotification::LockStatusChanged { unlocked: true })
    );
}

#[tokio::test]
async fn missing_response_times_out() {
    let (transport, inbound, _sent) = MockTransport::new(false, vec![]);
    let config = SessionConfig {
        response_timeout: Duration::from_millis(50),
        ..Default::default()
    };
    let (mut session, _notifications) =
        LockSession::new(transport, inbound, LockVersion::V3, config);
    session.restore(&restored_record()).expect("restores");

    assert!(matches!(
        session.admin_login().await,
        Err(LockError::ResponseTimeout(_))
    ));
}
