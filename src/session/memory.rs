//! In-process reference implementation of the payload store
//!
//! Suitable for single-instance deployments and tests. Anything spanning
//! more than one process wants a shared backend behind the same trait.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;

use crate::models::{LogoutClaims, SessionPayload};
use crate::session::stateful::SessionPayloadStore;

/// `RwLock`-guarded map from session id to payload.
#[derive(Debug, Default)]
pub struct MemoryPayloadStore {
    entries: RwLock<HashMap<String, SessionPayload>>,
}

impl MemoryPayloadStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored sessions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// Whether the store holds no sessions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Ids of every stored session, unordered.
    #[must_use]
    pub fn session_ids(&self) -> Vec<String> {
        self.read().keys().cloned().collect()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, HashMap<String, SessionPayload>> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<String, SessionPayload>> {
        self.entries.write().unwrap_or_else(PoisonError::into_inner)
    }

    // A payload matches claims on `sid` when both carry one, otherwise on
    // `sub`. A token naming neither matches nothing.
    fn matches(payload: &SessionPayload, claims: &LogoutClaims) -> bool {
        if let Some(sid) = &claims.sid {
            return payload.data.get("sid").and_then(|v| v.as_str()) == Some(sid.as_str());
        }
        if let Some(sub) = &claims.sub {
            return payload.data.get("sub").and_then(|v| v.as_str()) == Some(sub.as_str());
        }
        false
    }
}

#[async_trait]
impl SessionPayloadStore for MemoryPayloadStore {
    async fn get(&self, session_id: &str) -> anyhow::Result<Option<SessionPayload>> {
        Ok(self.read().get(session_id).cloned())
    }

    async fn set(&self, session_id: &str, payload: &SessionPayload) -> anyhow::Result<()> {
        self.write().insert(session_id.to_owned(), payload.clone());
        Ok(())
    }

    async fn delete(&self, session_id: &str) -> anyhow::Result<()> {
        self.write().remove(session_id);
        Ok(())
    }

    async fn delete_by_logout_token(&self, claims: &LogoutClaims) -> anyhow::Result<()> {
        self.write()
            .retain(|_, payload| !Self::matches(payload, claims));
        Ok(())
    }
}
