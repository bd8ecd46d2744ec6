//! Fully client-side session storage
//!
//! The entire sealed payload rides in chunked cookies; the server keeps
//! nothing. The price is the chunk budget and the inability to honor
//! backchannel logout: with no server-side index from subject to cookie,
//! an out-of-band logout has nothing to act on.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::SessionError;
use crate::expiration::ExpirationPolicy;
use crate::models::{LogoutClaims, SessionPayload};
use crate::session::{chunks, SessionStore};
use crate::utils::cookie::{CookieCarrier, CookieOptions};
use crate::utils::crypto::CookieCipher;

/// Session store persisting the sealed payload across chunked cookies.
pub struct StatelessSessionStore {
    policy: ExpirationPolicy,
    cipher: Arc<dyn CookieCipher>,
    secure: bool,
}

impl StatelessSessionStore {
    #[must_use]
    pub fn new(policy: ExpirationPolicy, cipher: Arc<dyn CookieCipher>, secure: bool) -> Self {
        Self {
            policy,
            cipher,
            secure,
        }
    }
}

#[async_trait]
impl SessionStore for StatelessSessionStore {
    /// `regenerate` is accepted for contract symmetry but has no effect:
    /// there is no server-side identifier to rotate.
    async fn set(
        &self,
        cookies: &dyn CookieCarrier,
        identifier: &str,
        payload: &SessionPayload,
        _regenerate: bool,
    ) -> Result<(), SessionError> {
        let max_age = self.policy.max_age(payload.created_at());
        let expires_at = self.policy.expires_at(payload.created_at());

        let plaintext = serde_json::to_vec(payload)?;
        let sealed = self.cipher.encrypt(identifier, &plaintext, expires_at)?;
        let pieces = chunks::split(identifier, &sealed)?;

        chunks::write(
            cookies,
            identifier,
            &pieces,
            &CookieOptions {
                secure: self.secure,
                max_age,
                ..CookieOptions::default()
            },
        );
        Ok(())
    }

    async fn get(
        &self,
        cookies: &dyn CookieCarrier,
        identifier: &str,
    ) -> Result<Option<SessionPayload>, SessionError> {
        let Some(sealed) = chunks::join(cookies, identifier) else {
            return Ok(None);
        };

        match self.cipher.decrypt(identifier, &sealed) {
            Ok(plaintext) => match serde_json::from_slice(&plaintext) {
                Ok(payload) => Ok(Some(payload)),
                Err(err) => {
                    log::warn!("failed to deserialize session '{identifier}': {err}");
                    Ok(None)
                }
            },
            Err(err) => {
                log::warn!("failed to open session '{identifier}': {err}");
                Ok(None)
            }
        }
    }

    async fn delete(
        &self,
        cookies: &dyn CookieCarrier,
        identifier: &str,
    ) -> Result<(), SessionError> {
        chunks::clear(cookies, identifier);
        Ok(())
    }

    async fn delete_by_logout_token(&self, _claims: &LogoutClaims) -> Result<(), SessionError> {
        Err(SessionError::BackchannelLogoutUnsupported)
    }

    fn supports_backchannel_logout(&self) -> bool {
        false
    }
}
