//! Integration tests across the session store facade

use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;

use sessio::utils::test_helpers::{test_cipher, test_payload, test_transaction};
use sessio::{
    CookieCarrier, ExpirationPolicy, LogoutClaims, MemoryPayloadStore, RequestCookies,
    SessionError, SessionManager, SessionPayload, SessionPayloadStore, TransactionStore,
};

/// Simulate the browser: apply the pending response cookies and present
/// the survivors on a fresh request.
fn next_request(cookies: &RequestCookies) -> RequestCookies {
    let mut surviving: Vec<(String, String)> = cookies
        .names()
        .into_iter()
        .filter_map(|name| cookies.get(&name).map(|value| (name, value)))
        .collect();
    surviving.retain(|(_, value)| !value.is_empty());
    RequestCookies::with_cookies(surviving, false)
}

fn stateless_manager() -> SessionManager {
    SessionManager::new(ExpirationPolicy::default(), test_cipher(), false, None)
}

fn stateful_manager() -> (SessionManager, Arc<MemoryPayloadStore>) {
    let memory = Arc::new(MemoryPayloadStore::new());
    let manager = SessionManager::new(
        ExpirationPolicy::default(),
        test_cipher(),
        false,
        Some(memory.clone()),
    );
    (manager, memory)
}

/// Payload store double that records operation order.
struct RecordingStore {
    inner: MemoryPayloadStore,
    ops: Mutex<Vec<String>>,
}

impl RecordingStore {
    fn new() -> Self {
        Self {
            inner: MemoryPayloadStore::new(),
            ops: Mutex::new(Vec::new()),
        }
    }

    fn record(&self, op: String) {
        self.ops
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(op);
    }

    fn ops(&self) -> Vec<String> {
        self.ops
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl SessionPayloadStore for RecordingStore {
    async fn get(&self, session_id: &str) -> anyhow::Result<Option<SessionPayload>> {
        self.record(format!("get:{session_id}"));
        self.inner.get(session_id).await
    }

    async fn set(&self, session_id: &str, payload: &SessionPayload) -> anyhow::Result<()> {
        self.record(format!("set:{session_id}"));
        self.inner.set(session_id, payload).await
    }

    async fn delete(&self, session_id: &str) -> anyhow::Result<()> {
        self.record(format!("delete:{session_id}"));
        self.inner.delete(session_id).await
    }

    async fn delete_by_logout_token(&self, claims: &LogoutClaims) -> anyhow::Result<()> {
        self.record("delete_by_logout_token".to_string());
        self.inner.delete_by_logout_token(claims).await
    }
}

#[tokio::test]
async fn facade_selects_mode_from_configuration() {
    let stateless = stateless_manager();
    assert!(!stateless.supports_backchannel_logout());

    let (stateful, _) = stateful_manager();
    assert!(stateful.supports_backchannel_logout());
}

#[tokio::test]
async fn stateless_session_survives_a_browser_round_trip() {
    let manager = stateless_manager();
    let payload = test_payload(Utc::now().timestamp()).with("id_token", json!("t".repeat(5000)));

    let login = RequestCookies::empty(false);
    manager.set(&login, "app_session", &payload, true).await.unwrap();

    let later = next_request(&login);
    let loaded = manager.get(&later, "app_session").await.unwrap().unwrap();
    assert_eq!(loaded, payload);
}

#[tokio::test]
async fn stateless_logout_leaves_no_cookies_behind() {
    let manager = stateless_manager();
    let payload = test_payload(Utc::now().timestamp()).with("id_token", json!("t".repeat(5000)));

    let login = RequestCookies::empty(false);
    manager.set(&login, "app_session", &payload, true).await.unwrap();

    let logout = next_request(&login);
    manager.delete(&logout, "app_session").await.unwrap();

    let after = next_request(&logout);
    assert!(after.names().is_empty());
    assert!(manager.get(&after, "app_session").await.unwrap().is_none());
}

#[tokio::test]
async fn stateless_backchannel_logout_always_rejects() {
    let manager = stateless_manager();

    let err = manager
        .delete_by_logout_token(&LogoutClaims {
            sid: Some("sid-1".to_string()),
            ..LogoutClaims::default()
        })
        .await
        .unwrap_err();

    assert!(matches!(err, SessionError::BackchannelLogoutUnsupported));
}

#[tokio::test]
async fn stateful_session_survives_a_browser_round_trip() {
    let (manager, memory) = stateful_manager();
    let payload = test_payload(Utc::now().timestamp());

    let login = RequestCookies::empty(false);
    manager.set(&login, "app_session", &payload, true).await.unwrap();
    assert_eq!(memory.len(), 1);

    let later = next_request(&login);
    let loaded = manager.get(&later, "app_session").await.unwrap().unwrap();
    assert_eq!(loaded, payload);
}

#[tokio::test]
async fn login_regeneration_deletes_the_old_session_before_minting_the_new() {
    let recording = Arc::new(RecordingStore::new());
    let manager = SessionManager::new(
        ExpirationPolicy::default(),
        test_cipher(),
        false,
        Some(recording.clone()),
    );
    let created_at = Utc::now().timestamp();

    // Anonymous pre-login session, as a fixation attacker would plant.
    let pre_login = RequestCookies::empty(false);
    manager
        .set(&pre_login, "app_session", &test_payload(created_at), false)
        .await
        .unwrap();
    let old_id = recording.inner.session_ids()[0].clone();

    // Authentication completes: the session is rewritten with regenerate.
    let callback = next_request(&pre_login);
    manager
        .set(&callback, "app_session", &test_payload(created_at), true)
        .await
        .unwrap();

    let new_id = recording.inner.session_ids()[0].clone();
    assert_ne!(new_id, old_id);

    // The old id must be deleted before anything is written under the new
    // one; the reverse order would leave a stale session reachable by the
    // pre-login cookie.
    let ops = recording.ops();
    let delete_pos = ops.iter().position(|op| op == &format!("delete:{old_id}"));
    let set_pos = ops.iter().position(|op| op == &format!("set:{new_id}"));
    assert!(delete_pos.is_some());
    assert!(set_pos.is_some());
    assert!(delete_pos < set_pos);
}

#[tokio::test]
async fn stateful_get_after_store_eviction_clears_the_handle() {
    let (manager, memory) = stateful_manager();

    let login = RequestCookies::empty(false);
    manager
        .set(&login, "app_session", &test_payload(Utc::now().timestamp()), true)
        .await
        .unwrap();

    for id in memory.session_ids() {
        memory.delete(&id).await.unwrap();
    }

    let later = next_request(&login);
    assert!(manager.get(&later, "app_session").await.unwrap().is_none());
    // The dangling handle was deleted on this request.
    assert!(later.get("app_session").is_none());
    assert!(!later.take_pending().is_empty());
}

#[tokio::test]
async fn backchannel_logout_reaches_the_payload_store() {
    let (manager, memory) = stateful_manager();

    let login = RequestCookies::empty(false);
    let payload = test_payload(Utc::now().timestamp()).with("sid", json!("sid-42"));
    manager.set(&login, "app_session", &payload, true).await.unwrap();
    assert_eq!(memory.len(), 1);

    manager
        .delete_by_logout_token(&LogoutClaims {
            sid: Some("sid-42".to_string()),
            ..LogoutClaims::default()
        })
        .await
        .unwrap();

    assert!(memory.is_empty());

    // The browser still holds the handle cookie; the next request finds
    // nothing behind it and clears it.
    let later = next_request(&login);
    assert!(manager.get(&later, "app_session").await.unwrap().is_none());
}

#[tokio::test]
async fn full_login_flow_consumes_the_transaction() {
    let cipher = test_cipher();
    let transactions = TransactionStore::new(cipher.clone(), false);
    let manager = SessionManager::new(ExpirationPolicy::default(), cipher, false, None);

    // Login start: stash the round-trip state.
    let start = RequestCookies::empty(false);
    transactions.set(&start, "auth_txn", &test_transaction()).unwrap();

    // Callback: consume the transaction, establish the session.
    let callback = next_request(&start);
    let txn = transactions.get(&callback, "auth_txn").unwrap();
    assert_eq!(txn.return_to.as_deref(), Some("/dashboard"));
    transactions.delete(&callback, "auth_txn");

    manager
        .set(
            &callback,
            "app_session",
            &test_payload(Utc::now().timestamp()),
            true,
        )
        .await
        .unwrap();

    // Next request: session present, transaction gone.
    let after = next_request(&callback);
    assert!(manager.get(&after, "app_session").await.unwrap().is_some());
    assert!(transactions.get(&after, "auth_txn").is_none());
}
