// Test utilities shared across modules
use std::sync::Arc;

use rand::RngCore;
use serde_json::json;

use crate::models::{SessionPayload, TransactionPayload};
use crate::utils::crypto::{Aes256GcmCipher, CookieCipher};

/// Cipher seeded with a fresh random secret.
#[must_use]
pub fn test_cipher() -> Arc<dyn CookieCipher> {
    let mut secret = [0u8; 32];
    rand::rng().fill_bytes(&mut secret);
    Arc::new(Aes256GcmCipher::new(&secret))
}

/// Session payload with representative caller data.
#[must_use]
pub fn test_payload(created_at: i64) -> SessionPayload {
    SessionPayload::new(created_at)
        .with(
            "user",
            json!({"sub": "auth0|1234567890", "email": "user@example.com"}),
        )
        .with("id_token", json!("eyJhbGciOiJSUzI1NiJ9.e30.sig"))
}

/// Transaction payload as a login start would create it.
#[must_use]
pub fn test_transaction() -> TransactionPayload {
    TransactionPayload {
        state: "c3RhdGU".to_string(),
        nonce: "bm9uY2U".to_string(),
        code_verifier: "dmVyaWZpZXI".to_string(),
        return_to: Some("/dashboard".to_string()),
        silent_login: false,
    }
}
