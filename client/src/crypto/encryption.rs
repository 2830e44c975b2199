//! # AES-256-GCM Encryption
//!
//! The inner layer of the credential pipeline: the salt hash is sealed
//! under K0 before the whole envelope is wrapped for the switch. AEAD in
//! one operation, keyed directly by the device's K0 bytes.
//!
//! ## The 16-byte IV
//!
//! GCM's textbook nonce is 12 bytes. The switch contract uses 16, and the
//! IV travels beside the ciphertext in the envelope rather than prefixed
//! to it, because the verifier also needs the IV as the salt-hash prefix.
//! So unlike the usual `nonce || ciphertext` packing, this module takes
//! and returns the IV explicitly and the caller owns its placement.
//!
//! ## Nonce management
//!
//! GCM is notoriously unforgiving about nonce reuse. Encrypt two messages
//! under the same key and IV and an attacker can recover the XOR of the
//! plaintexts AND forge authentication tags. Every credential draws a
//! fresh random IV from the OS CSPRNG via [`generate_iv`]; there is no
//! counter mode and no caller-supplied randomness.
//!
//! ## Wire format
//!
//! [`encrypt_with_iv`] returns `ciphertext || tag` -- the 16-byte GCM tag
//! appended, which is what the verifier splits off before decrypting.
//! There is no decryption function here: this engine only ever produces
//! credentials, it never consumes them.

use aes_gcm::aead::consts::U16;
use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::aes::Aes256;
use aes_gcm::{AesGcm, Nonce};
use rand::RngCore;

use crate::config::{AES_KEY_LENGTH, CRED_IV_LENGTH};
use crate::error::VeloError;

/// AES-256-GCM parameterized with the switch's 16-byte IV length.
type Aes256Gcm16 = AesGcm<Aes256, U16>;

/// Draw a fresh random 16-byte IV from the OS CSPRNG.
///
/// Called once per credential. Never reuse the result under the same key;
/// see the module docs for what happens if you do.
pub fn generate_iv() -> [u8; CRED_IV_LENGTH] {
    let mut iv = [0u8; CRED_IV_LENGTH];
    rand::rngs::OsRng.fill_bytes(&mut iv);
    iv
}

/// Encrypt plaintext with AES-256-GCM under an explicit 16-byte IV.
///
/// Returns `ciphertext || tag` (16-byte tag appended). The IV is NOT
/// packed into the output; the caller carries it separately in the
/// credential envelope.
///
/// # Arguments
///
/// * `key` -- 32-byte key, the device's K0 raw bytes.
/// * `iv` -- fresh 16-byte IV from [`generate_iv`].
/// * `plaintext` -- the data to seal (in practice, a 32-byte salt hash).
///
/// # Errors
///
/// Returns [`VeloError::EncryptFailed`] if the cipher rejects the key or
/// the encryption itself fails. We don't distinguish; the difference is
/// none of the caller's business.
pub fn encrypt_with_iv(
    key: &[u8; AES_KEY_LENGTH],
    iv: &[u8; CRED_IV_LENGTH],
    plaintext: &[u8],
) -> Result<Vec<u8>, VeloError> {
    let cipher = Aes256Gcm16::new_from_slice(key).map_err(|_| VeloError::EncryptFailed)?;
    let nonce = Nonce::<U16>::from_slice(iv);
    cipher
        .encrypt(nonce, plaintext)
        .map_err(|_| VeloError::EncryptFailed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AES_TAG_LENGTH;

    fn test_key() -> [u8; 32] {
        // A fixed key for testing. Never use a predictable key in
        // production. But you knew that. Right?
        let mut key = [0u8; 32];
        for (i, byte) in key.iter_mut().enumerate() {
            *byte = i as u8;
        }
        key
    }

    /// Test-only open. The engine exports no decryption path; tests use
    /// the cipher directly so the tag is verified per the AEAD contract.
    fn open(key: &[u8; 32], iv: &[u8; 16], sealed: &[u8]) -> Option<Vec<u8>> {
        let cipher = Aes256Gcm16::new_from_slice(key).ok()?;
        cipher.decrypt(Nonce::<U16>::from_slice(iv), sealed).ok()
    }

    #[test]
    fn test_roundtrip() {
        let key = test_key();
        let iv = generate_iv();
        let sealed = encrypt_with_iv(&key, &iv, b"salt hash bytes").unwrap();
        let recovered = open(&key, &iv, &sealed).expect("tag must verify");
        assert_eq!(recovered, b"salt hash bytes");
    }

    #[test]
    fn test_tag_is_appended() {
        let key = test_key();
        let iv = generate_iv();
        let plaintext = [0xABu8; 32];
        let sealed = encrypt_with_iv(&key, &iv, &plaintext).unwrap();
        assert_eq!(sealed.len(), plaintext.len() + AES_TAG_LENGTH);
    }

    #[test]
    fn test_tampered_ciphertext_fails_to_open() {
        let key = test_key();
        let iv = generate_iv();
        let mut sealed = encrypt_with_iv(&key, &iv, b"secret").unwrap();
        sealed[0] ^= 0xFF;
        assert!(open(&key, &iv, &sealed).is_none());
    }

    #[test]
    fn test_wrong_iv_fails_to_open() {
        let key = test_key();
        let iv = generate_iv();
        let sealed = encrypt_with_iv(&key, &iv, b"secret").unwrap();
        let mut wrong_iv = iv;
        wrong_iv[0] ^= 0x01;
        assert!(open(&key, &wrong_iv, &sealed).is_none());
    }

    #[test]
    fn test_generated_ivs_are_unique() {
        // If this fails, the RNG is broken and we need to burn everything
        // down.
        let a = generate_iv();
        let b = generate_iv();
        assert_ne!(a, b);
        assert_eq!(a.len(), CRED_IV_LENGTH);
    }

    #[test]
    fn test_distinct_ivs_give_distinct_ciphertexts() {
        let key = test_key();
        let iv_a = generate_iv();
        let iv_b = generate_iv();
        let sealed_a = encrypt_with_iv(&key, &iv_a, b"same plaintext").unwrap();
        let sealed_b = encrypt_with_iv(&key, &iv_b, b"same plaintext").unwrap();
        assert_ne!(sealed_a, sealed_b);
    }
}
