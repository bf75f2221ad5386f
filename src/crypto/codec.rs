//! AES-256-GCM encryption of vault secrets.
//!
//! Each call to `encrypt` draws a fresh random 16-byte IV and produces a
//! record of the form `ivHex:cipherHex`. `decrypt` splits the record back
//! apart before decrypting; the GCM auth tag rejects tampered payloads
//! and wrong keys outright instead of returning garbage plaintext.

use aes::Aes256;
use aes_gcm::aead::consts::U16;
use aes_gcm::aead::{Aead, OsRng};
use aes_gcm::{AeadCore, AesGcm, Key, KeyInit, Nonce};
use thiserror::Error;

/// Size of the master key in bytes (AES-256).
pub const MASTER_KEY_LEN: usize = 32;

/// Size of the per-record initialization vector in bytes.
pub const IV_LEN: usize = 16;

const RECORD_SEPARATOR: char = ':';

/// AES-256-GCM parameterized with a 16-byte nonce so the IV segment of a
/// record is always 32 hex characters.
type VaultCipher = AesGcm<Aes256, U16>;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("master key must be exactly {} hex characters", MASTER_KEY_LEN * 2)]
    InvalidKey,

    #[error("encrypted record is malformed")]
    MalformedRecord,

    #[error("failed to encrypt secret")]
    Encrypt,

    #[error("failed to decrypt secret")]
    Decrypt,
}

/// The process-wide symmetric key, parsed once from configuration and
/// injected into [`SecretCodec::new`]. Key bytes never appear in `Debug`
/// output or error messages.
#[derive(Clone)]
pub struct MasterKey([u8; MASTER_KEY_LEN]);

impl MasterKey {
    /// Parses a key from its 64-hex-character form.
    pub fn from_hex(encoded: &str) -> Result<Self, CodecError> {
        let bytes = hex::decode(encoded.trim()).map_err(|_| CodecError::InvalidKey)?;
        let key: [u8; MASTER_KEY_LEN] = bytes.try_into().map_err(|_| CodecError::InvalidKey)?;
        Ok(Self(key))
    }

    /// Draws a fresh random key. Used by `callvault gen-key` and tests.
    #[must_use]
    pub fn generate() -> Self {
        use rand::Rng;

        let mut rng = rand::rng();
        Self(rng.random())
    }

    /// Hex form for operator provisioning. Handle with care: this is the
    /// raw key material.
    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl std::fmt::Debug for MasterKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("MasterKey(..)")
    }
}

/// Symmetric encrypt/decrypt of a single plaintext secret.
#[derive(Clone)]
pub struct SecretCodec {
    cipher: VaultCipher,
}

impl SecretCodec {
    #[must_use]
    pub fn new(key: &MasterKey) -> Self {
        let cipher = VaultCipher::new(Key::<VaultCipher>::from_slice(&key.0));
        Self { cipher }
    }

    /// Encrypts `plaintext` under a fresh random IV.
    ///
    /// Encrypting the same plaintext twice yields two distinct records.
    pub fn encrypt(&self, plaintext: &str) -> Result<String, CodecError> {
        let iv = VaultCipher::generate_nonce(&mut OsRng);

        let ciphertext = self
            .cipher
            .encrypt(&iv, plaintext.as_bytes())
            .map_err(|_| CodecError::Encrypt)?;

        Ok(format!(
            "{}{RECORD_SEPARATOR}{}",
            hex::encode(iv),
            hex::encode(ciphertext)
        ))
    }

    /// Exact inverse of [`encrypt`](Self::encrypt).
    ///
    /// Fails with [`CodecError::MalformedRecord`] when the record does not
    /// split into exactly two hex segments with a 16-byte IV, and with
    /// [`CodecError::Decrypt`] on a key mismatch or corrupted payload.
    pub fn decrypt(&self, record: &str) -> Result<String, CodecError> {
        let segments: Vec<&str> = record.split(RECORD_SEPARATOR).collect();
        let [iv_hex, cipher_hex] = segments[..] else {
            return Err(CodecError::MalformedRecord);
        };

        let iv = hex::decode(iv_hex).map_err(|_| CodecError::MalformedRecord)?;
        if iv.len() != IV_LEN {
            return Err(CodecError::MalformedRecord);
        }
        let ciphertext = hex::decode(cipher_hex).map_err(|_| CodecError::MalformedRecord)?;

        let plaintext = self
            .cipher
            .decrypt(Nonce::<U16>::from_slice(&iv), ciphertext.as_ref())
            .map_err(|_| CodecError::Decrypt)?;

        String::from_utf8(plaintext).map_err(|_| CodecError::Decrypt)
    }
}
