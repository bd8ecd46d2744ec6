//! Short-lived transaction state for login and logout flows
//!
//! One sealed cookie per flow, holding the state/nonce/verifier tuple from
//! the start of a round trip until the callback consumes it. Transactions
//! never follow the session expiration policy: whatever the session
//! configuration says, a login round trip that takes longer than an hour
//! is dead.

use std::sync::Arc;

use chrono::Utc;

use crate::error::SessionError;
use crate::models::TransactionPayload;
use crate::utils::cookie::{CookieCarrier, CookieOptions};
use crate::utils::crypto::CookieCipher;

/// Fixed transaction lifetime in seconds.
const TRANSACTION_MAX_AGE: i64 = 3600;

/// Single-cookie store for in-flight login/logout transaction data.
pub struct TransactionStore {
    cipher: Arc<dyn CookieCipher>,
    secure: bool,
}

impl TransactionStore {
    #[must_use]
    pub fn new(cipher: Arc<dyn CookieCipher>, secure: bool) -> Self {
        Self { cipher, secure }
    }

    /// Seal `payload` into the cookie named `identifier`.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or sealing fails.
    pub fn set(
        &self,
        cookies: &dyn CookieCarrier,
        identifier: &str,
        payload: &TransactionPayload,
    ) -> Result<(), SessionError> {
        let expires_at = Utc::now().timestamp() + TRANSACTION_MAX_AGE;
        let plaintext = serde_json::to_vec(payload)?;
        let sealed = self.cipher.encrypt(identifier, &plaintext, expires_at)?;

        cookies.set(
            identifier,
            sealed,
            &CookieOptions {
                secure: self.secure,
                max_age: TRANSACTION_MAX_AGE,
                ..CookieOptions::default()
            },
        );
        Ok(())
    }

    /// The transaction stored under `identifier`, or `None` when the
    /// cookie is absent, expired, or unreadable. A forged or stale cookie
    /// is a normal occurrence, not a failure of the current request.
    #[must_use]
    pub fn get(
        &self,
        cookies: &dyn CookieCarrier,
        identifier: &str,
    ) -> Option<TransactionPayload> {
        let sealed = cookies.get(identifier)?;

        match self.cipher.decrypt(identifier, &sealed) {
            Ok(plaintext) => match serde_json::from_slice(&plaintext) {
                Ok(payload) => Some(payload),
                Err(err) => {
                    log::warn!("failed to deserialize transaction cookie '{identifier}': {err}");
                    None
                }
            },
            Err(err) => {
                log::warn!("failed to open transaction cookie '{identifier}': {err}");
                None
            }
        }
    }

    /// Remove the transaction cookie.
    pub fn delete(&self, cookies: &dyn CookieCarrier, identifier: &str) {
        cookies.delete(identifier);
    }
}
