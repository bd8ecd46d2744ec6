//! Error taxonomy for session and transaction storage

use thiserror::Error;

/// Errors surfaced by the session and transaction stores.
///
/// Decryption failures are deliberately absent from most read paths: an
/// expired or tampered cookie is a normal occurrence, so `get` operations
/// log and return `None` instead of propagating them.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The request-scoped cookie carrier was never installed for this
    /// request. This is an integration fault, not a runtime condition.
    #[error("request cookie context was not supplied")]
    MissingContext,

    /// The encrypted session does not fit the chunked-cookie budget. Not
    /// retriable; the fix is switching to a server-side payload store.
    #[error("encrypted session requires {required} cookies, limit is {limit}")]
    PayloadTooLarge { required: usize, limit: usize },

    /// Backchannel logout was invoked against the stateless store, which
    /// has no server-side index to honor it with.
    #[error("backchannel logout is not supported by the stateless session store")]
    BackchannelLogoutUnsupported,

    /// Sealing a cookie value failed.
    #[error("cookie encryption failed: {0}")]
    Encryption(String),

    /// Unsealing a cookie value failed: tampered, expired per the embedded
    /// envelope, or bound to a different identifier.
    #[error("cookie decryption failed: {0}")]
    Decryption(String),

    /// Payload (de)serialization failed.
    #[error("payload serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The external session payload store reported a failure. Propagated
    /// unchanged; retry policy belongs to the caller.
    #[error("session payload store failure: {0}")]
    Store(#[from] anyhow::Error),
}
