//! Session state machine: pairing, admin authentication and the
//! request/response cycle against one lock.
//!
//! One session owns one transport and is strictly half-duplex: a single
//! request may be in flight at a time, and a response is matched to the
//! pending request by command type. Frames of any other type that arrive
//! while waiting (spontaneous lock/unlock pushes, for example) are routed
//! to the notification channel instead of being mistaken for the response.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::command::{
    AddAdminCommand, AudioManageCommand, AutoLockManageCommand, CheckAdminCommand,
    CheckRandomCommand, Command, CommandType, ConfigOp, DeviceFeaturesCommand, DeviceInfoCommand,
    FingerprintCommand, FingerprintOp, FrAddState, GetAesKeyCommand,
    GetValidKeyboardPasswordsCommand, IcAddState, IcCardCommand, IcCardOp, IcCardRecord, InfoField,
    InitPasswordsCommand, LockCommand, LogRecord, ManageKeyboardPasswordCommand, OperateLogCommand,
    PasscodeEntry, PassageModeCommand, PassageModeOp, PassageSchedule, RemoteUnlockCommand,
    ResetLockCommand, SetAdminKeyboardPwdCommand, UnlockCommand,
};
use crate::constants::DEFAULT_AES_KEY;
use crate::envelope::{CommandEnvelope, FrameConfig};
use crate::error::LockError;
use crate::store::{AdminCredentials, LockRecord, StoredPasswordSeed};
use crate::transport::{FrameReceiver, LockTransport};
use crate::version::LockVersion;

/// Whether pairing establishes admin credentials immediately after the key
/// exchange or leaves that to the first authenticated operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PairingPolicy {
    #[default]
    EstablishAdmin,
    DeferAdmin,
}

#[derive(Debug, Clone, Copy)]
pub struct SessionConfig {
    /// How long to wait for the response to a request.
    pub response_timeout: Duration,
    /// How long to wait for each push frame of a card/fingerprint scan,
    /// which is bounded by a human presenting something to the reader.
    pub scan_timeout: Duration,
    pub pairing_policy: PairingPolicy,
    pub frame: FrameConfig,
    /// App user id sent with the admin challenge.
    pub uid: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            response_timeout: Duration::from_secs(8),
            scan_timeout: Duration::from_secs(30),
            pairing_policy: PairingPolicy::default(),
            frame: FrameConfig::default(),
            uid: 0,
        }
    }
}

/// Which credential reader a scan flow is driving.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanKind {
    IcCard,
    Fingerprint,
}

/// Out-of-band events surfaced while a session is running.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionNotification {
    /// The lock reported a bolt state change we did not request.
    LockStatusChanged { unlocked: bool },
    /// A credential scan flow armed the reader.
    ScanStarted(ScanKind),
    /// One sampling step of a fingerprint enrollment completed.
    ScanProgress { kind: ScanKind, step: u8 },
    /// A frame arrived that matches no pending request and no known push.
    UnsolicitedFrame(CommandType),
}

/// Clears the in-flight flag when the operation holding it completes.
struct BusyGuard {
    flag: Arc<AtomicBool>,
}

impl BusyGuard {
    fn acquire(flag: &Arc<AtomicBool>) -> Result<Self, LockError> {
        if flag
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Acquire)
            .is_err()
        {
            return Err(LockError::SessionBusy);
        }
        Ok(BusyGuard {
            flag: Arc::clone(flag),
        })
    }
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

macro_rules! expect_response {
    ($response:expr, $variant:ident) => {
        match $response {
            Command::$variant(c) => c,
            _ => return Err(LockError::CommandNotReady),
        }
    };
}

/// One connected lock.
pub struct LockSession<T: LockTransport> {
    transport: T,
    inbound: FrameReceiver,
    notifications: mpsc::UnboundedSender<SessionNotification>,
    version: LockVersion,
    config: SessionConfig,

    aes_key: Option<[u8; 16]>,
    admin: Option<AdminCredentials>,
    admin_passcode: Option<String>,
    pwd_info: Vec<StoredPasswordSeed>,
    ps_from_lock: Option<u32>,
    authenticated: bool,
    busy: Arc<AtomicBool>,
}

impl<T: LockTransport> LockSession<T> {
    /// Create a session over a connected transport. `inbound` carries the
    /// reassembled frames the transport receives from the device.
    pub fn new(
        transport: T,
        inbound: FrameReceiver,
        version: LockVersion,
        config: SessionConfig,
    ) -> (Self, mpsc::UnboundedReceiver<SessionNotification>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let session = LockSession {
            transport,
            inbound,
            notifications: tx,
            version,
            config,
            aes_key: None,
            admin: None,
            admin_passcode: None,
            pwd_info: Vec::new(),
            ps_from_lock: None,
            authenticated: false,
            busy: Arc::new(AtomicBool::new(false)),
        };
        (session, rx)
    }

    pub fn version(&self) -> &LockVersion {
        &self.version
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    /// Load key and credentials persisted from an earlier pairing.
    pub fn restore(&mut self, record: &LockRecord) -> Result<(), LockError> {
        self.aes_key = record.aes_key_bytes()?;
        self.admin = record.admin;
        self.admin_passcode = record.admin_passcode.clone();
        self.pwd_info = record.pwd_info.clone();
        Ok(())
    }

    /// Snapshot the session's key and credentials for persistence.
    pub fn persist(&self) -> LockRecord {
        let mut record = LockRecord {
            admin: self.admin,
            admin_passcode: self.admin_passcode.clone(),
            pwd_info: self.pwd_info.clone(),
            ..Default::default()
        };
        if let Some(key) = &self.aes_key {
            record.set_aes_key(key);
        }
        record
    }

    pub async fn connect(&mut self) -> Result<(), LockError> {
        self.transport.connect().await
    }

    pub async fn disconnect(&mut self) -> Result<(), LockError> {
        self.authenticated = false;
        self.transport.disconnect().await
    }

    /// Pair with a lock in setting mode: exchange the session AES key and,
    /// per the configured policy, establish admin credentials right away.
    ///
    /// Fails before any bytes are sent when the device does not report
    /// pairing mode. A failed attempt is fatal to this call only; the
    /// caller may retry on a fresh connection.
    pub async fn init_lock(&mut self) -> Result<(), LockError> {
        if !self.transport.is_in_pairing_mode() {
            return Err(LockError::NotInPairingMode);
        }
        info!("pairing: requesting session key");
        let response = self
            .exchange(Command::GetAesKey(GetAesKeyCommand::default()))
            .await?;
        let reply = expect_response!(response, GetAesKey);
        if reply.prefix.map(|p| p.is_success()) != Some(true) {
            return Err(LockError::PairingFailed(
                "lock rejected the key exchange".to_string(),
            ));
        }
        let Some(key) = reply.key else {
            return Err(LockError::PairingFailed(
                "key exchange response carried no key".to_string(),
            ));
        };
        self.aes_key = Some(key);
        info!("pairing: session key established");

        match self.config.pairing_policy {
            PairingPolicy::EstablishAdmin => {
                self.add_admin().await?;
                self.calibrate_time().await?;
            }
            PairingPolicy::DeferAdmin => {
                debug!("pairing: deferring admin credential setup");
            }
        }
        Ok(())
    }

    /// Generate and register admin credentials on a freshly paired lock.
    pub async fn add_admin(&mut self) -> Result<AdminCredentials, LockError> {
        let mut cmd = AddAdminCommand::default();
        let (admin_ps, unlock_key) = cmd.generate();
        let response = self.exchange(Command::AddAdmin(cmd)).await?;
        let reply = expect_response!(response, AddAdmin);
        if reply.succeeded != Some(true) {
            return Err(LockError::PairingFailed(
                "lock did not confirm admin credentials".to_string(),
            ));
        }
        let credentials = AdminCredentials {
            admin_ps,
            unlock_key,
        };
        self.admin = Some(credentials);
        info!("admin credentials established");
        Ok(credentials)
    }

    /// Run the two-step admin challenge: fetch `psFromLock`, then prove
    /// knowledge of the unlock key. Failure is not fatal to the session;
    /// a later operation may retry.
    pub async fn admin_login(&mut self) -> Result<(), LockError> {
        let admin = self.admin.ok_or(LockError::MissingAdminCredentials)?;
        let mut cmd = CheckAdminCommand::default();
        cmd.admin_ps = Some(admin.admin_ps);
        cmd.uid = Some(self.config.uid);
        let response = self.exchange(Command::CheckAdmin(cmd)).await?;
        let reply = expect_response!(response, CheckAdmin);

        let ps_from_lock = reply.ps_from_lock.unwrap_or(0);
        if ps_from_lock == 0 {
            self.authenticated = false;
            warn!("admin login rejected: psFromLock={ps_from_lock}");
            return Err(LockError::AdminLoginFailed { ps_from_lock });
        }

        let mut check = CheckRandomCommand::default();
        check.set_sum(ps_from_lock, admin.unlock_key);
        let response = self.exchange(Command::CheckRandom(check)).await?;
        if response.succeeded() == Some(false) {
            self.authenticated = false;
            return Err(LockError::AdminLoginFailed { ps_from_lock });
        }

        self.ps_from_lock = Some(ps_from_lock);
        self.authenticated = true;
        debug!("admin login complete");
        Ok(())
    }

    pub async fn unlock(&mut self) -> Result<UnlockCommand, LockError> {
        self.ensure_authenticated().await?;
        let mut cmd = UnlockCommand::default();
        cmd.sum = Some(self.challenge_sum()?);
        let response = self.exchange_checked(Command::Unlock(cmd)).await?;
        let reply = expect_response!(response, Unlock);
        self.notify(SessionNotification::LockStatusChanged { unlocked: true });
        Ok(reply)
    }

    pub async fn lock(&mut self) -> Result<LockCommand, LockError> {
        self.ensure_authenticated().await?;
        let mut cmd = LockCommand::default();
        cmd.sum = Some(self.challenge_sum()?);
        let response = self.exchange_checked(Command::Lock(cmd)).await?;
        let reply = expect_response!(response, Lock);
        self.notify(SessionNotification::LockStatusChanged { unlocked: false });
        Ok(reply)
    }

    /// Push the current wall clock to the lock.
    pub async fn calibrate_time(&mut self) -> Result<(), LockError> {
        self.exchange_checked(Command::CalibrateTime(Default::default()))
            .await?;
        Ok(())
    }

    /// Query the lock's capability bitmap.
    pub async fn read_device_features(&mut self) -> Result<DeviceFeaturesCommand, LockError> {
        let response = self
            .exchange_checked(Command::SearchDeviceFeature(Default::default()))
            .await?;
        Ok(expect_response!(response, SearchDeviceFeature))
    }

    pub async fn read_device_info(
        &mut self,
        field: InfoField,
    ) -> Result<DeviceInfoCommand, LockError> {
        self.ensure_authenticated().await?;
        let cmd = DeviceInfoCommand {
            field,
            ..Default::default()
        };
        let response = self.exchange_checked(Command::ReadDeviceInfo(cmd)).await?;
        Ok(expect_response!(response, ReadDeviceInfo))
    }

    /// Factory reset; wipes pairing and admin state on the device.
    pub async fn reset_lock(&mut self) -> Result<(), LockError> {
        self.ensure_authenticated().await?;
        self.exchange_checked(Command::ResetLock(ResetLockCommand::default()))
            .await?;
        self.authenticated = false;
        self.aes_key = None;
        self.admin = None;
        Ok(())
    }

    /// Seed the lock's offline-passcode table, keeping the generated seeds
    /// for persistence.
    pub async fn init_passwords(&mut self) -> Result<(), LockError> {
        let mut cmd = InitPasswordsCommand::default();
        let seeds = cmd.generate().to_vec();
        let year = cmd.year.unwrap_or(0);
        self.exchange_checked(Command::InitPasswords(cmd)).await?;
        self.pwd_info = seeds
            .iter()
            .map(|s| StoredPasswordSeed {
                year,
                code: s.code,
                secret: s.secret,
            })
            .collect();
        Ok(())
    }

    /// Set a fresh random admin keypad passcode, returning it.
    pub async fn set_admin_keyboard_passcode(&mut self) -> Result<String, LockError> {
        let mut cmd = SetAdminKeyboardPwdCommand::default();
        let passcode = cmd.generate();
        self.exchange_checked(Command::SetAdminKeyboardPwd(cmd))
            .await?;
        self.admin_passcode = Some(passcode.clone());
        Ok(passcode)
    }

    /// Add, modify, delete or clear a keyboard passcode.
    pub async fn manage_passcode(
        &mut self,
        cmd: ManageKeyboardPasswordCommand,
    ) -> Result<(), LockError> {
        self.ensure_authenticated().await?;
        self.exchange_checked(Command::ManageKeyboardPassword(cmd))
            .await?;
        Ok(())
    }

    /// Fetch every valid keyboard passcode, following pagination.
    pub async fn get_valid_passcodes(&mut self) -> Result<Vec<PasscodeEntry>, LockError> {
        self.ensure_authenticated().await?;
        let mut entries = Vec::new();
        let mut sequence = 0u16;
        loop {
            let cmd = GetValidKeyboardPasswordsCommand {
                sequence,
                ..Default::default()
            };
            let response = self
                .exchange_checked(Command::GetValidKeyboardPasswords(cmd))
                .await?;
            let page = expect_response!(response, GetValidKeyboardPasswords);
            entries.extend(page.entries);
            if page.next_sequence == 0 || page.next_sequence <= sequence {
                break;
            }
            sequence = page.next_sequence;
        }
        Ok(entries)
    }

    /// Fetch the operation log, following pagination.
    pub async fn read_operation_log(&mut self) -> Result<Vec<LogRecord>, LockError> {
        self.ensure_authenticated().await?;
        let mut records = Vec::new();
        let mut sequence = 0u16;
        loop {
            let cmd = OperateLogCommand {
                sequence,
                ..Default::default()
            };
            let response = self.exchange(Command::OperateLog(cmd)).await?;
            let page = expect_response!(response, OperateLog);
            records.extend(page.records);
            if page.next_sequence == 0 || page.next_sequence <= sequence {
                break;
            }
            sequence = page.next_sequence;
        }
        Ok(records)
    }

    /// Enroll an IC card: arm the reader, then wait for the push frame
    /// carrying the new card's identifier.
    pub async fn add_ic_card(&mut self) -> Result<u64, LockError> {
        self.ensure_authenticated().await?;
        let _busy = BusyGuard::acquire(&self.busy)?;
        let cmd = IcCardCommand {
            op: IcCardOp::Add,
            ..Default::default()
        };
        self.send_command(Command::IcCardManage(cmd)).await?;
        loop {
            let response = self
                .recv_matching(CommandType::IcCardManage, self.config.scan_timeout)
                .await?;
            self.check_status(&response)?;
            let reply = expect_response!(response, IcCardManage);
            match reply.add_state {
                Some(IcAddState::EnterAddMode) => {
                    self.notify(SessionNotification::ScanStarted(ScanKind::IcCard));
                }
                Some(IcAddState::Added(id)) => return Ok(id),
                None => debug!("card add response without state, still waiting"),
            }
        }
    }

    pub async fn delete_ic_card(&mut self, card_id: u64) -> Result<(), LockError> {
        self.ensure_authenticated().await?;
        let cmd = IcCardCommand {
            op: IcCardOp::Delete,
            card_id: Some(card_id),
            ..Default::default()
        };
        self.exchange_checked(Command::IcCardManage(cmd)).await?;
        Ok(())
    }

    pub async fn clear_ic_cards(&mut self) -> Result<(), LockError> {
        self.ensure_authenticated().await?;
        let cmd = IcCardCommand {
            op: IcCardOp::Clear,
            ..Default::default()
        };
        self.exchange_checked(Command::IcCardManage(cmd)).await?;
        Ok(())
    }

    /// List stored IC cards, following pagination.
    pub async fn list_ic_cards(&mut self) -> Result<Vec<IcCardRecord>, LockError> {
        self.ensure_authenticated().await?;
        let mut cards = Vec::new();
        let mut sequence = 0u16;
        loop {
            let cmd = IcCardCommand {
                op: IcCardOp::Search,
                sequence,
                ..Default::default()
            };
            let response = self.exchange_checked(Command::IcCardManage(cmd)).await?;
            let page = expect_response!(response, IcCardManage);
            cards.extend(page.cards);
            if page.next_sequence == 0 || page.next_sequence <= sequence {
                break;
            }
            sequence = page.next_sequence;
        }
        Ok(cards)
    }

    /// Enroll a fingerprint. The lock pushes one progress frame per finger
    /// press before the terminal frame carrying the template id; each
    /// progress frame is surfaced as a notification.
    pub async fn add_fingerprint(&mut self) -> Result<u64, LockError> {
        self.ensure_authenticated().await?;
        let _busy = BusyGuard::acquire(&self.busy)?;
        let cmd = FingerprintCommand {
            op: FingerprintOp::Add,
            ..Default::default()
        };
        self.send_command(Command::FingerprintManage(cmd)).await?;
        loop {
            let response = self
                .recv_matching(CommandType::FingerprintManage, self.config.scan_timeout)
                .await?;
            self.check_status(&response)?;
            let reply = expect_response!(response, FingerprintManage);
            match reply.add_state {
                Some(FrAddState::EnterAddMode) => {
                    self.notify(SessionNotification::ScanStarted(ScanKind::Fingerprint));
                }
                Some(FrAddState::Progress(step)) => {
                    self.notify(SessionNotification::ScanProgress {
                        kind: ScanKind::Fingerprint,
                        step,
                    });
                }
                Some(FrAddState::Added(id)) => return Ok(id),
                None => debug!("fingerprint add response without state, still waiting"),
            }
        }
    }

    pub async fn delete_fingerprint(&mut self, fingerprint_id: u64) -> Result<(), LockError> {
        self.ensure_authenticated().await?;
        let cmd = FingerprintCommand {
            op: FingerprintOp::Delete,
            fingerprint_id: Some(fingerprint_id),
            ..Default::default()
        };
        self.exchange_checked(Command::FingerprintManage(cmd)).await?;
        Ok(())
    }

    pub async fn clear_fingerprints(&mut self) -> Result<(), LockError> {
        self.ensure_authenticated().await?;
        let cmd = FingerprintCommand {
            op: FingerprintOp::Clear,
            ..Default::default()
        };
        self.exchange_checked(Command::FingerprintManage(cmd)).await?;
        Ok(())
    }

    pub async fn set_audio(&mut self, enabled: bool) -> Result<(), LockError> {
        self.ensure_authenticated().await?;
        let cmd = AudioManageCommand {
            op: ConfigOp::Set,
            enabled: Some(enabled),
            ..Default::default()
        };
        self.exchange_checked(Command::AudioManage(cmd)).await?;
        Ok(())
    }

    pub async fn read_auto_lock(&mut self) -> Result<AutoLockManageCommand, LockError> {
        self.ensure_authenticated().await?;
        let cmd = AutoLockManageCommand {
            op: ConfigOp::Query,
            ..Default::default()
        };
        let response = self.exchange_checked(Command::AutoLockManage(cmd)).await?;
        Ok(expect_response!(response, AutoLockManage))
    }

    pub async fn set_auto_lock_seconds(&mut self, seconds: u16) -> Result<(), LockError> {
        self.ensure_authenticated().await?;
        let cmd = AutoLockManageCommand {
            op: ConfigOp::Set,
            seconds: Some(seconds),
            ..Default::default()
        };
        self.exchange_checked(Command::AutoLockManage(cmd)).await?;
        Ok(())
    }

    pub async fn set_remote_unlock(&mut self, enabled: bool) -> Result<(), LockError> {
        self.ensure_authenticated().await?;
        let cmd = RemoteUnlockCommand {
            op: ConfigOp::Set,
            enabled: Some(enabled),
            ..Default::default()
        };
        self.exchange_checked(Command::ControlRemoteUnlock(cmd))
            .await?;
        Ok(())
    }

    pub async fn add_passage_schedule(
        &mut self,
        schedule: PassageSchedule,
    ) -> Result<(), LockError> {
        self.ensure_authenticated().await?;
        let cmd = PassageModeCommand {
            op: PassageModeOp::Add,
            schedule: Some(schedule),
            ..Default::default()
        };
        self.exchange_checked(Command::PassageMode(cmd)).await?;
        Ok(())
    }

    pub async fn clear_passage_schedules(&mut self) -> Result<(), LockError> {
        self.ensure_authenticated().await?;
        let cmd = PassageModeCommand {
            op: PassageModeOp::Clear,
            ..Default::default()
        };
        self.exchange_checked(Command::PassageMode(cmd)).await?;
        Ok(())
    }

    /// List passage-mode schedules, following pagination.
    pub async fn list_passage_schedules(&mut self) -> Result<Vec<PassageSchedule>, LockError> {
        self.ensure_authenticated().await?;
        let mut schedules = Vec::new();
        let mut sequence = 0u16;
        loop {
            let cmd = PassageModeCommand {
                op: PassageModeOp::Query,
                sequence,
                ..Default::default()
            };
            let response = self.exchange_checked(Command::PassageMode(cmd)).await?;
            let page = expect_response!(response, PassageMode);
            schedules.extend(page.schedules);
            if page.next_sequence == 0 || page.next_sequence <= sequence {
                break;
            }
            sequence = page.next_sequence;
        }
        Ok(schedules)
    }

    // Request/response plumbing.

    /// One request/response cycle. Holds the in-flight flag for its whole
    /// duration; concurrent calls fail with `SessionBusy`.
    async fn exchange(&mut self, command: Command) -> Result<Command, LockError> {
        let _busy = BusyGuard::acquire(&self.busy)?;
        let pending = command.command_type();
        self.send_command(command).await?;
        self.recv_matching(pending, self.config.response_timeout)
            .await
    }

    /// [`exchange`](Self::exchange) plus a status check on the response.
    async fn exchange_checked(&mut self, command: Command) -> Result<Command, LockError> {
        let response = self.exchange(command).await?;
        self.check_status(&response)?;
        Ok(response)
    }

    async fn send_command(&mut self, command: Command) -> Result<(), LockError> {
        let mut envelope =
            CommandEnvelope::from_lock_version(&self.version).with_config(self.config.frame);
        if !self.version.is_legacy() {
            envelope.set_aes_key(self.current_key());
        }
        envelope.attach_command(command);
        let frame = envelope.build_command_buffer()?;
        self.transport.send_frame(&frame).await
    }

    /// Wait for a frame of the pending command type, routing everything
    /// else to the notification channel.
    async fn recv_matching(
        &mut self,
        pending: CommandType,
        wait: Duration,
    ) -> Result<Command, LockError> {
        loop {
            let frame = timeout(wait, self.inbound.recv())
                .await?
                .ok_or_else(|| LockError::Transport("inbound frame channel closed".to_string()))?;
            let mut envelope = match CommandEnvelope::from_raw_data(&frame, self.config.frame) {
                Ok(envelope) => envelope,
                Err(e) => {
                    warn!("dropping malformed frame: {e}");
                    continue;
                }
            };
            if !envelope.is_crc_ok() {
                warn!("dropping frame with bad CRC");
                continue;
            }
            if !self.version.is_legacy() {
                envelope.set_aes_key(self.current_key());
            }
            let command = match envelope.command() {
                Ok(command) => command.clone(),
                Err(e) => {
                    warn!("dropping undecodable frame: {e}");
                    continue;
                }
            };
            if command.command_type() == pending {
                return Ok(command);
            }
            self.route_notification(command);
        }
    }

    fn route_notification(&self, command: Command) {
        let notification = match &command {
            Command::Unlock(_) => SessionNotification::LockStatusChanged { unlocked: true },
            Command::Lock(_) => SessionNotification::LockStatusChanged { unlocked: false },
            other => {
                debug!("unsolicited frame of type {:?}", other.command_type());
                SessionNotification::UnsolicitedFrame(command.command_type())
            }
        };
        self.notify(notification);
    }

    fn notify(&self, notification: SessionNotification) {
        // A dropped receiver just means nobody is listening.
        let _ = self.notifications.send(notification);
    }

    /// Session key, falling back to the well-known default before pairing
    /// has produced one.
    fn current_key(&self) -> [u8; 16] {
        self.aes_key.unwrap_or(DEFAULT_AES_KEY)
    }

    fn challenge_sum(&self) -> Result<u32, LockError> {
        let admin = self.admin.ok_or(LockError::MissingAdminCredentials)?;
        let ps = self.ps_from_lock.ok_or(LockError::MissingAdminCredentials)?;
        Ok(ps.wrapping_add(admin.unlock_key))
    }

    async fn ensure_authenticated(&mut self) -> Result<(), LockError> {
        if self.authenticated {
            return Ok(());
        }
        self.admin_login().await
    }

    fn check_status(&self, response: &Command) -> Result<(), LockError> {
        if response.succeeded() == Some(false) {
            return Err(LockError::OperationFailed {
                command: response.command_type(),
                status: response.status().unwrap_or(0),
            });
        }
        Ok(())
    }
}
