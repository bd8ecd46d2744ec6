//! Payload types carried through the encryption boundary
//!
//! Session payloads are opaque to the stores beyond the mandatory
//! `internal.created_at` timestamp used for expiration math. Everything
//! else round-trips untouched through a flattened map.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Bookkeeping carried inside every session payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionInternal {
    /// Unix timestamp (seconds) at which the session was established.
    /// Fixed at authentication time; never rewritten on renewal.
    pub created_at: i64,
}

/// A session payload: caller-owned data plus the creation timestamp.
///
/// Mutations are wholesale rewrites via `set`; the stores never patch
/// individual fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionPayload {
    pub internal: SessionInternal,
    #[serde(flatten)]
    pub data: Map<String, Value>,
}

impl SessionPayload {
    /// Create an empty payload established at `created_at`.
    #[must_use]
    pub fn new(created_at: i64) -> Self {
        Self {
            internal: SessionInternal { created_at },
            data: Map::new(),
        }
    }

    /// Unix timestamp (seconds) at which the session was established.
    #[must_use]
    pub const fn created_at(&self) -> i64 {
        self.internal.created_at
    }

    /// Insert a caller data field, builder-style.
    #[must_use]
    pub fn with(mut self, key: &str, value: Value) -> Self {
        self.data.insert(key.to_owned(), value);
        self
    }
}

/// In-flight login/logout round-trip state. Created when a flow starts,
/// consumed and deleted when the callback completes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionPayload {
    /// Anti-CSRF state parameter echoed back by the authorization server.
    pub state: String,
    /// Replay-protection nonce bound into the identity token.
    pub nonce: String,
    /// PKCE code verifier for the code exchange.
    pub code_verifier: String,
    /// Where to send the user after the flow completes.
    pub return_to: Option<String>,
    /// Whether the flow was started without user interaction.
    #[serde(default)]
    pub silent_login: bool,
}

/// Server-side session handle. The only part of a stateful session that is
/// visible to the client, sealed into a single cookie.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionHandle {
    /// Randomly generated 16-byte identifier, hex-encoded.
    pub id: String,
}

/// Claims from a backchannel logout token. Signature verification happens
/// upstream; these are trusted as pre-verified.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LogoutClaims {
    pub sub: Option<String>,
    pub sid: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
