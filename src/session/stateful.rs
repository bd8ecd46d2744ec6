//! Server-side session storage behind a handle cookie
//!
//! Only a sealed `{id}` handle reaches the client; the payload lives in an
//! externally supplied store keyed by that id. Renewal after login rotates
//! the id — deleting the old server-side entry before minting the new one,
//! so a pre-login cookie captured by an attacker dies with the login.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::SessionError;
use crate::expiration::ExpirationPolicy;
use crate::models::{LogoutClaims, SessionHandle, SessionPayload};
use crate::session::{generate_session_id, SessionStore};
use crate::utils::cookie::{CookieCarrier, CookieOptions};
use crate::utils::crypto::CookieCipher;

/// External payload storage, keyed by session id.
///
/// Failures propagate unchanged; retry policy belongs to the caller.
/// Implementations own the index needed for claims-based deletion.
#[async_trait]
pub trait SessionPayloadStore: Send + Sync {
    /// The payload stored under `session_id`, or `None`.
    async fn get(&self, session_id: &str) -> anyhow::Result<Option<SessionPayload>>;

    /// Store `payload` under `session_id`, replacing any previous value.
    async fn set(&self, session_id: &str, payload: &SessionPayload) -> anyhow::Result<()>;

    /// Remove the payload stored under `session_id`, if any.
    async fn delete(&self, session_id: &str) -> anyhow::Result<()>;

    /// Remove every payload matching verified backchannel logout claims.
    async fn delete_by_logout_token(&self, claims: &LogoutClaims) -> anyhow::Result<()>;
}

/// Session store persisting a sealed handle cookie, with the payload
/// delegated to an external [`SessionPayloadStore`].
pub struct StatefulSessionStore {
    policy: ExpirationPolicy,
    cipher: Arc<dyn CookieCipher>,
    secure: bool,
    payload_store: Arc<dyn SessionPayloadStore>,
}

impl StatefulSessionStore {
    #[must_use]
    pub fn new(
        policy: ExpirationPolicy,
        cipher: Arc<dyn CookieCipher>,
        secure: bool,
        payload_store: Arc<dyn SessionPayloadStore>,
    ) -> Self {
        Self {
            policy,
            cipher,
            secure,
            payload_store,
        }
    }

    // The handle embedded in the cookie, or `None` when the cookie is
    // absent or unreadable. An unreadable handle is treated as absent: the
    // caller gets a fresh session rather than a failed request.
    fn read_handle(&self, cookies: &dyn CookieCarrier, identifier: &str) -> Option<SessionHandle> {
        let sealed = cookies.get(identifier)?;

        match self.cipher.decrypt(identifier, &sealed) {
            Ok(plaintext) => match serde_json::from_slice(&plaintext) {
                Ok(handle) => Some(handle),
                Err(err) => {
                    log::warn!("failed to deserialize session handle '{identifier}': {err}");
                    None
                }
            },
            Err(err) => {
                log::warn!("failed to open session handle '{identifier}': {err}");
                None
            }
        }
    }
}

#[async_trait]
impl SessionStore for StatefulSessionStore {
    async fn set(
        &self,
        cookies: &dyn CookieCarrier,
        identifier: &str,
        payload: &SessionPayload,
        regenerate: bool,
    ) -> Result<(), SessionError> {
        let session_id = match (self.read_handle(cookies, identifier), regenerate) {
            (Some(handle), true) => {
                // Fixation defense. The old server-side entry must be gone
                // before a new id exists; reversing this leaves a stale,
                // still-valid session reachable through the pre-login
                // cookie.
                self.payload_store.delete(&handle.id).await?;
                generate_session_id()
            }
            (Some(handle), false) => handle.id,
            (None, _) => generate_session_id(),
        };

        self.payload_store.set(&session_id, payload).await?;

        // Handle lifetime follows the payload's creation time, not the
        // handle's own age.
        let max_age = self.policy.max_age(payload.created_at());
        let expires_at = self.policy.expires_at(payload.created_at());
        let plaintext = serde_json::to_vec(&SessionHandle { id: session_id })?;
        let sealed = self.cipher.encrypt(identifier, &plaintext, expires_at)?;

        cookies.set(
            identifier,
            sealed,
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
        let Some(handle) = self.read_handle(cookies, identifier) else {
            return Ok(None);
        };

        match self.payload_store.get(&handle.id).await? {
            Some(payload) => Ok(Some(payload)),
            None => {
                // Store-side expiry or eviction left the handle dangling.
                // Drop it now so later requests stop round-tripping to the
                // store for an id known to be gone.
                cookies.delete(identifier);
                Ok(None)
            }
        }
    }

    async fn delete(
        &self,
        cookies: &dyn CookieCarrier,
        identifier: &str,
    ) -> Result<(), SessionError> {
        let handle = self.read_handle(cookies, identifier);
        cookies.delete(identifier);

        if let Some(handle) = handle {
            self.payload_store.delete(&handle.id).await?;
        }
        Ok(())
    }

    async fn delete_by_logout_token(&self, claims: &LogoutClaims) -> Result<(), SessionError> {
        self.payload_store
            .delete_by_logout_token(claims)
            .await
            .map_err(SessionError::Store)
    }

    fn supports_backchannel_logout(&self) -> bool {
        true
    }
}
