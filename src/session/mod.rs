//! Session storage: one contract, two persistence strategies
//!
//! [`StatelessSessionStore`] round-trips the whole sealed payload through
//! chunked cookies; [`StatefulSessionStore`] round-trips only a sealed
//! handle and delegates the payload to an external store. Both share the
//! expiration policy and the sealing boundary, and are selected once, at
//! construction, by [`SessionManager`].

pub mod chunks;
pub mod memory;
pub mod stateful;
pub mod stateless;

use std::fmt::Write as _;
use std::sync::Arc;

use async_trait::async_trait;
use rand::RngCore;

use crate::error::SessionError;
use crate::expiration::ExpirationPolicy;
use crate::models::{LogoutClaims, SessionPayload};
use crate::utils::cookie::CookieCarrier;
use crate::utils::crypto::CookieCipher;

pub use memory::MemoryPayloadStore;
pub use stateful::{SessionPayloadStore, StatefulSessionStore};
pub use stateless::StatelessSessionStore;

/// Uniform session persistence contract.
///
/// The carrier is an explicit parameter on every call; implementations
/// hold no request state of their own.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Persist `payload` under `identifier`, refreshing its cookie
    /// lifetime from the expiration policy. `regenerate` requests a fresh
    /// server-side identity where one exists, defeating session fixation;
    /// it must be passed when establishing a session after authentication.
    async fn set(
        &self,
        cookies: &dyn CookieCarrier,
        identifier: &str,
        payload: &SessionPayload,
        regenerate: bool,
    ) -> Result<(), SessionError>;

    /// The session stored under `identifier`, or `None`. An absent,
    /// expired, or unreadable session is not an error.
    async fn get(
        &self,
        cookies: &dyn CookieCarrier,
        identifier: &str,
    ) -> Result<Option<SessionPayload>, SessionError>;

    /// Destroy the session stored under `identifier`.
    async fn delete(&self, cookies: &dyn CookieCarrier, identifier: &str)
        -> Result<(), SessionError>;

    /// Destroy sessions matching verified backchannel logout claims,
    /// without a browser in the loop.
    async fn delete_by_logout_token(&self, claims: &LogoutClaims) -> Result<(), SessionError>;

    /// Whether [`SessionStore::delete_by_logout_token`] can succeed.
    /// Callers must branch on this before offering backchannel logout.
    fn supports_backchannel_logout(&self) -> bool;
}

/// Entry point selecting the storage strategy at construction time.
///
/// Supplying an external payload store selects stateful handle-cookie
/// storage; omitting it selects fully client-side chunked storage. Pure
/// selection: no semantics are altered on the way through.
pub struct SessionManager {
    store: Box<dyn SessionStore>,
}

impl SessionManager {
    #[must_use]
    pub fn new(
        policy: ExpirationPolicy,
        cipher: Arc<dyn CookieCipher>,
        secure: bool,
        payload_store: Option<Arc<dyn SessionPayloadStore>>,
    ) -> Self {
        let store: Box<dyn SessionStore> = match payload_store {
            Some(payload_store) => Box::new(StatefulSessionStore::new(
                policy,
                cipher,
                secure,
                payload_store,
            )),
            None => Box::new(StatelessSessionStore::new(policy, cipher, secure)),
        };

        Self { store }
    }

    /// See [`SessionStore::set`].
    ///
    /// # Errors
    ///
    /// Propagates the selected store's errors unchanged.
    pub async fn set(
        &self,
        cookies: &dyn CookieCarrier,
        identifier: &str,
        payload: &SessionPayload,
        regenerate: bool,
    ) -> Result<(), SessionError> {
        self.store.set(cookies, identifier, payload, regenerate).await
    }

    /// See [`SessionStore::get`].
    ///
    /// # Errors
    ///
    /// Propagates the selected store's errors unchanged.
    pub async fn get(
        &self,
        cookies: &dyn CookieCarrier,
        identifier: &str,
    ) -> Result<Option<SessionPayload>, SessionError> {
        self.store.get(cookies, identifier).await
    }

    /// See [`SessionStore::delete`].
    ///
    /// # Errors
    ///
    /// Propagates the selected store's errors unchanged.
    pub async fn delete(
        &self,
        cookies: &dyn CookieCarrier,
        identifier: &str,
    ) -> Result<(), SessionError> {
        self.store.delete(cookies, identifier).await
    }

    /// See [`SessionStore::delete_by_logout_token`].
    ///
    /// # Errors
    ///
    /// Propagates the selected store's errors unchanged, including the
    /// stateless store's unconditional rejection.
    pub async fn delete_by_logout_token(&self, claims: &LogoutClaims) -> Result<(), SessionError> {
        self.store.delete_by_logout_token(claims).await
    }

    /// See [`SessionStore::supports_backchannel_logout`].
    #[must_use]
    pub fn supports_backchannel_logout(&self) -> bool {
        self.store.supports_backchannel_logout()
    }
}

/// Generate a fresh session id: 16 random bytes, hex-encoded.
pub(crate) fn generate_session_id() -> String {
    let mut bytes = [0u8; 16];
    rand::rng().fill_bytes(&mut bytes);

    let mut id = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        let _ = write!(id, "{byte:02x}");
    }
    id
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_ids_are_hex_and_unique() {
        let first = generate_session_id();
        let second = generate_session_id();

        assert_eq!(first.len(), 32);
        assert!(first.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(first, second);
    }
}
