//! Identifier-bound sealing of cookie values
//!
//! Sealed values carry their own expiry: the envelope embeds the absolute
//! expiration timestamp under the authenticated encryption, so a replayed
//! cookie with a stale embedded expiry fails verification even if the
//! browser never cleared it. The cookie's identifier is bound in as
//! associated data, so a value pasted under a different cookie name fails
//! the same way.

use aes_gcm::{
    aead::{Aead, KeyInit, Payload},
    Aes256Gcm, Key, Nonce,
};
use base64::{engine::general_purpose, Engine as _};
use chrono::Utc;
use rand::RngCore;
use sha2::{Digest, Sha256};

use crate::error::SessionError;

/// Nonce size for AES-256-GCM encryption (96 bits)
pub const NONCE_SIZE: usize = 12;

/// Encryption key size for AES-256 (256 bits)
pub const ENCRYPTION_KEY_SIZE: usize = 32;

/// Byte length of the expiry prefix inside the envelope.
const EXPIRY_PREFIX_SIZE: usize = 8;

/// Symmetric sealing boundary used for every cookie this crate writes.
pub trait CookieCipher: Send + Sync {
    /// Seal `plaintext` for the cookie named `identifier`, embedding the
    /// absolute expiry timestamp (epoch seconds) into the envelope.
    ///
    /// # Errors
    ///
    /// Returns an error if encryption fails.
    fn encrypt(&self, identifier: &str, plaintext: &[u8], expires_at: i64)
        -> Result<String, SessionError>;

    /// Open a sealed value bound to `identifier`.
    ///
    /// # Errors
    ///
    /// Fails on tampered ciphertext, a wrong identifier, or an envelope
    /// whose embedded expiry has passed.
    fn decrypt(&self, identifier: &str, sealed: &str) -> Result<Vec<u8>, SessionError>;
}

/// AES-256-GCM implementation of the sealing boundary.
///
/// Envelope layout: `base64url(nonce || ciphertext)` where the ciphertext
/// covers an 8-byte big-endian expiry prefix followed by the payload, with
/// the identifier as associated data.
pub struct Aes256GcmCipher {
    key: [u8; ENCRYPTION_KEY_SIZE],
}

impl Aes256GcmCipher {
    /// Derive the AES-256 key from caller-supplied secret material of any
    /// length.
    #[must_use]
    pub fn new(secret: &[u8]) -> Self {
        Self {
            key: derive_encryption_key(secret),
        }
    }
}

impl CookieCipher for Aes256GcmCipher {
    fn encrypt(
        &self,
        identifier: &str,
        plaintext: &[u8],
        expires_at: i64,
    ) -> Result<String, SessionError> {
        let mut message = Vec::with_capacity(EXPIRY_PREFIX_SIZE + plaintext.len());
        message.extend_from_slice(&expires_at.to_be_bytes());
        message.extend_from_slice(plaintext);

        let mut nonce_bytes = [0u8; NONCE_SIZE];
        rand::rng().fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&self.key));
        let ciphertext = cipher
            .encrypt(
                nonce,
                Payload {
                    msg: &message,
                    aad: identifier.as_bytes(),
                },
            )
            .map_err(|e| SessionError::Encryption(format!("AES encryption failed: {e}")))?;

        let mut combined = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
        combined.extend_from_slice(&nonce_bytes);
        combined.extend_from_slice(&ciphertext);

        Ok(general_purpose::URL_SAFE_NO_PAD.encode(&combined))
    }

    fn decrypt(&self, identifier: &str, sealed: &str) -> Result<Vec<u8>, SessionError> {
        let combined = general_purpose::URL_SAFE_NO_PAD
            .decode(sealed)
            .map_err(|e| SessionError::Decryption(format!("invalid base64 data: {e}")))?;

        if combined.len() < NONCE_SIZE {
            return Err(SessionError::Decryption("sealed value too short".to_string()));
        }

        let (nonce_bytes, ciphertext) = combined.split_at(NONCE_SIZE);
        let nonce = Nonce::from_slice(nonce_bytes);

        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&self.key));
        let message = cipher
            .decrypt(
                nonce,
                Payload {
                    msg: ciphertext,
                    aad: identifier.as_bytes(),
                },
            )
            .map_err(|e| SessionError::Decryption(format!("AES decryption failed: {e}")))?;

        if message.len() < EXPIRY_PREFIX_SIZE {
            return Err(SessionError::Decryption("envelope too short".to_string()));
        }

        let (prefix, payload) = message.split_at(EXPIRY_PREFIX_SIZE);
        let mut expiry_bytes = [0u8; EXPIRY_PREFIX_SIZE];
        expiry_bytes.copy_from_slice(prefix);
        let expires_at = i64::from_be_bytes(expiry_bytes);

        if expires_at <= Utc::now().timestamp() {
            return Err(SessionError::Decryption("envelope expired".to_string()));
        }

        Ok(payload.to_vec())
    }
}

/// Derive a 32-byte AES-256 key from input key material of any length.
#[must_use]
pub fn derive_encryption_key(input_key: &[u8]) -> [u8; ENCRYPTION_KEY_SIZE] {
    let digest = Sha256::digest(input_key);
    let mut key = [0u8; ENCRYPTION_KEY_SIZE];
    key.copy_from_slice(&digest);
    key
}
