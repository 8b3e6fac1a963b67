//! Payload ciphers: AES-128-CBC for the modern protocol generation and the
//! single-byte XOR obfuscation used by generations predating AES pairing.

use crate::crc::CRC8_TABLE;
use crate::error::LockError;
use aes::Aes128;
use cbc::cipher::block_padding::Pkcs7;
use cbc::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use rand::Rng;

type Aes128CbcEnc = cbc::Encryptor<Aes128>;
type Aes128CbcDec = cbc::Decryptor<Aes128>;

const AES_BLOCK_LEN: usize = 16;

fn check_key(key: &[u8]) -> Result<&[u8; 16], LockError> {
    key.try_into()
        .map_err(|_| LockError::InvalidKey { len: key.len() })
}

/// AES-128-CBC encrypt with PKCS#7 padding.
///
/// The IV is the key itself. That is a firmware-mandated deviation from
/// standard CBC practice and a known weakness of the protocol; it must not
/// be "fixed" here or the lock rejects every frame.
pub fn aes_encrypt(plaintext: &[u8], key: &[u8]) -> Result<Vec<u8>, LockError> {
    let key = check_key(key)?;
    let enc = Aes128CbcEnc::new(key.into(), key.into());
    Ok(enc.encrypt_padded_vec_mut::<Pkcs7>(plaintext))
}

/// AES-128-CBC decrypt with PKCS#7 padding, IV == key (see [`aes_encrypt`]).
pub fn aes_decrypt(ciphertext: &[u8], key: &[u8]) -> Result<Vec<u8>, LockError> {
    let key = check_key(key)?;
    if ciphertext.is_empty() || ciphertext.len() % AES_BLOCK_LEN != 0 {
        return Err(LockError::Decryption(format!(
            "ciphertext length {} is not a positive multiple of {}",
            ciphertext.len(),
            AES_BLOCK_LEN
        )));
    }
    let dec = Aes128CbcDec::new(key.into(), key.into());
    dec.decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
        .map_err(|e| LockError::Decryption(format!("bad padding: {e}")))
}

/// Pick a fresh seed for the legacy cipher.
///
/// The original firmware counterpart draws from [1,126] and adds one, which
/// lands in [2,127]. The shifted range is deliberate (it can never produce
/// the invalid seed 0) and is reproduced here rather than widened.
pub fn legacy_seed() -> u8 {
    rand::thread_rng().gen_range(1..127) + 1
}

fn legacy_xor(payload: &[u8], seed: u8) -> Vec<u8> {
    let crc_seed = CRC8_TABLE[payload.len() & 0xff];
    payload.iter().map(|&b| seed ^ b ^ crc_seed).collect()
}

/// Obfuscate a payload with the legacy XOR cipher.
///
/// When `key` is `None` a fresh seed is generated and appended as the last
/// output byte so the receiver can recover it.
pub fn legacy_encode(payload: &[u8], key: Option<u8>) -> Vec<u8> {
    match key {
        Some(seed) => legacy_xor(payload, seed),
        None => {
            let seed = legacy_seed();
            let mut out = legacy_xor(payload, seed);
            out.push(seed);
            out
        }
    }
}

/// Reverse [`legacy_encode`] given an explicit seed. XOR is self-inverse, so
/// this is the same transform as encoding.
pub fn legacy_decode(payload: &[u8], key: u8) -> Vec<u8> {
    legacy_xor(payload, key)
}

/// Decode a legacy payload whose seed was appended as the trailing byte.
pub fn legacy_decode_trailing(payload: &[u8]) -> Vec<u8> {
    match payload.split_last() {
        Some((&seed, body)) => legacy_xor(body, seed),
        None => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aes_rejects_short_key() {
        assert!(matches!(
            aes_encrypt(b"data", &[0u8; 8]),
            Err(LockError::InvalidKey { len: 8 })
        ));
        assert!(matches!(
            aes_decrypt(&[0u8; 16], &[0u8; 24]),
            Err(LockError::InvalidKey { len: 24 })
        ));
    }

    #[test]
    fn aes_rejects_ragged_ciphertext() {
        let key = [0x42u8; 16];
        assert!(matches!(
            aes_decrypt(&[0u8; 15], &key),
            Err(LockError::Decryption(_))
        ));
    }

    #[test]
    fn legacy_cipher_is_an_involution() {
        let payload = [0x00u8, 0x01, 0x7f, 0x80, 0xff, 0x55];
        for seed in 1u8..=127 {
            let encoded = legacy_encode(&payload, Some(seed));
            assert_eq!(legacy_decode(&encoded, seed), payload);
        }
    }

    #[test]
    fn legacy_trailing_seed_roundtrip() {
        let payload = [0xde, 0xad, 0xbe, 0xef];
        let encoded = legacy_encode(&payload, None);
        assert_eq!(encoded.len(), payload.len() + 1);
        assert_eq!(legacy_decode_trailing(&encoded), payload);
    }

    #[test]
    fn legacy_seed_never_zero() {
        for _ in 0..1000 {
            let seed = legacy_seed();
            assert!((1..=127).contains(&seed));
        }
    }
}
