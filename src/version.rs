//! Protocol descriptor and lock-family classification.
//!
//! Every lock advertises a `(protocolType, protocolVersion, scene, groupId,
//! orgId)` tuple that identifies the wire dialect it speaks. The tuple is
//! derived once per device, either from advertisement bytes or from stored
//! pairing data, and never changes afterwards.

use crate::constants::MODERN_PROTOCOL_TYPE;
use crate::error::LockError;
use serde::{Deserialize, Serialize};
use strum_macros::Display;

/// Wire-dialect descriptor, immutable after creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LockVersion {
    pub protocol_type: u8,
    pub protocol_version: u8,
    pub scene: u8,
    pub group_id: u16,
    pub org_id: u16,
}

impl LockVersion {
    pub const fn new(
        protocol_type: u8,
        protocol_version: u8,
        scene: u8,
        group_id: u16,
        org_id: u16,
    ) -> Self {
        Self {
            protocol_type,
            protocol_version,
            scene,
            group_id,
            org_id,
        }
    }

    /// Third-generation room lock, the most common modern descriptor.
    pub const V3: LockVersion = LockVersion::new(5, 3, 2, 1, 1);

    /// True for generations that use the 6-byte header and the XOR cipher.
    pub fn is_legacy(&self) -> bool {
        self.protocol_type >= 1 && self.protocol_type < MODERN_PROTOCOL_TYPE
    }

    /// Physical lock family for this descriptor. Pure function: the same
    /// descriptor always maps to the same variant.
    pub fn lock_type(&self) -> LockType {
        match (self.protocol_type, self.protocol_version, self.scene) {
            (5, 3, 7) => LockType::ParkingLockGen3,
            (5, 3, _) => LockType::RoomLock,
            (5, 4, _) => LockType::RoomLock,
            (10, 1, _) => LockType::ParkingLockGen2,
            (6, 1, _) => LockType::Padlock,
            (8, 1, _) => LockType::BicycleLock,
            (11, 1, _) => LockType::EBikeLock,
            _ => LockType::Unknown,
        }
    }
}

/// Physical lock families distinguished by the protocol descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Default, Serialize, Deserialize)]
pub enum LockType {
    RoomLock,
    Padlock,
    BicycleLock,
    ParkingLockGen2,
    ParkingLockGen3,
    EBikeLock,
    #[default]
    Unknown,
}

/// Result of classifying a BLE advertisement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Advertisement {
    pub version: LockVersion,
    pub lock_type: LockType,
    /// Lock is in its hardware pairing/setting mode and will accept the
    /// unauthenticated key-exchange command.
    pub is_setting_mode: bool,
    pub is_unlocked: bool,
    pub battery: u8,
}

/// Minimum manufacturer-data length we can classify.
const MIN_ADV_LEN: usize = 6;

/// Flag bits in the advertisement parameter byte.
const ADV_FLAG_UNLOCKED: u8 = 0x01;
const ADV_FLAG_SETTING_MODE: u8 = 0x04;

/// Classify a lock from its manufacturer-specific advertisement payload.
///
/// Layout (reverse engineered): protocolType at 0, protocolVersion at 1,
/// scene at 2 for modern generations, a parameter/flags byte at 4 and the
/// battery percentage at 5. Group and organization default to 1; locks
/// provisioned through the vendor cloud may override them from stored
/// pairing data instead.
pub fn classify_advertisement(data: &[u8]) -> Result<Advertisement, LockError> {
    if data.len() < MIN_ADV_LEN {
        return Err(LockError::InvalidAdvertisement { len: data.len() });
    }
    let protocol_type = data[0];
    let protocol_version = data[1];
    let scene = if protocol_type >= MODERN_PROTOCOL_TYPE {
        data[2]
    } else {
        0
    };
    let params = data[4];
    let battery = data[5];

    let version = LockVersion::new(protocol_type, protocol_version, scene, 1, 1);
    Ok(Advertisement {
        version,
        lock_type: version.lock_type(),
        is_setting_mode: params & ADV_FLAG_SETTING_MODE != 0,
        is_unlocked: params & ADV_FLAG_UNLOCKED != 0,
        battery,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lock_type_table_is_stable() {
        assert_eq!(LockVersion::new(5, 3, 2, 1, 1).lock_type(), LockType::RoomLock);
        assert_eq!(
            LockVersion::new(5, 3, 7, 1, 1).lock_type(),
            LockType::ParkingLockGen3
        );
        assert_eq!(LockVersion::new(5, 4, 2, 1, 1).lock_type(), LockType::RoomLock);
        assert_eq!(
            LockVersion::new(10, 1, 0, 1, 1).lock_type(),
            LockType::ParkingLockGen2
        );
        assert_eq!(LockVersion::new(6, 1, 0, 1, 1).lock_type(), LockType::Padlock);
        assert_eq!(LockVersion::new(8, 1, 0, 1, 1).lock_type(), LockType::BicycleLock);
        assert_eq!(LockVersion::new(11, 1, 0, 1, 1).lock_type(), LockType::EBikeLock);
        assert_eq!(LockVersion::new(3, 0, 0, 1, 1).lock_type(), LockType::Unknown);
    }

    #[test]
    fn classifier_reads_flags_and_battery() {
        let adv = classify_advertisement(&[5, 3, 2, 0, 0x05, 86]).expect("classifies");
        assert_eq!(adv.lock_type, LockType::RoomLock);
        assert!(adv.is_setting_mode);
        assert!(adv.is_unlocked);
        assert_eq!(adv.battery, 86);
    }

    #[test]
    fn classifier_rejects_short_payload() {
        assert!(matches!(
            classify_advertisement(&[5, 3]),
            Err(LockError::InvalidAdvertisement { len: 2 })
        ));
    }

    #[test]
    fn legacy_descriptor_detection() {
        assert!(LockVersion::new(3, 0, 0, 1, 1).is_legacy());
        assert!(!LockVersion::V3.is_legacy());
        assert!(!LockVersion::new(0, 0, 0, 1, 1).is_legacy());
    }
}
