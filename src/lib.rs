#![warn(clippy::pedantic)]
#![warn(clippy::cargo)]
#![deny(warnings)]
#![allow(clippy::multiple_crate_versions)]

//! Cookie-backed session and transaction state storage for authentication
//! middleware.
//!
//! Two deployment modes share one expiration algorithm and one encryption
//! boundary: stateless (the sealed payload round-trips through chunked
//! cookies) and stateful (a sealed handle cookie points at an external
//! payload store). [`SessionManager`] selects between them at construction.

/// Version of the sessio library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod error;
pub mod expiration;
pub mod models;
pub mod session;
pub mod settings;
pub mod transaction;
pub mod utils;

/// Re-export commonly used items
pub use error::SessionError;
pub use expiration::ExpirationPolicy;
pub use models::{LogoutClaims, SessionHandle, SessionPayload, TransactionPayload};
pub use session::{
    MemoryPayloadStore, SessionManager, SessionPayloadStore, SessionStore, StatefulSessionStore,
    StatelessSessionStore,
};
pub use settings::{CookieSettings, SessionSettings};
pub use transaction::TransactionStore;
pub use utils::cookie::{CookieCarrier, CookieOptions, RequestCookies};
pub use utils::crypto::{Aes256GcmCipher, CookieCipher};
