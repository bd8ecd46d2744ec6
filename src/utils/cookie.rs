//! Request-scoped cookie transport
//!
//! Every storage operation takes the carrier as an explicit parameter.
//! There is no ambient per-request global: a background task holding the
//! wrong carrier is a type error, not a data leak.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use actix_web::cookie::{time::Duration, Cookie, SameSite};
use actix_web::{HttpMessage, HttpRequest};

use crate::error::SessionError;

/// Attributes applied to cookies written by the stores.
pub struct CookieOptions {
    pub http_only: bool,
    pub secure: bool,
    pub same_site: SameSite,
    pub path: String,
    /// Lifetime in seconds.
    pub max_age: i64,
}

impl Default for CookieOptions {
    fn default() -> Self {
        Self {
            http_only: true,
            secure: true,
            same_site: SameSite::Lax,
            path: "/".to_string(),
            max_age: 86_400,
        }
    }
}

/// Cookie transport for the duration of one request.
///
/// Reads observe writes made earlier in the same request, matching what the
/// browser would present on the next round trip.
pub trait CookieCarrier: Send + Sync {
    /// Current value of `name`, if present.
    fn get(&self, name: &str) -> Option<String>;

    /// Names of every cookie currently visible.
    fn names(&self) -> Vec<String>;

    /// Stage a cookie write for the response.
    fn set(&self, name: &str, value: String, options: &CookieOptions);

    /// Stage a cookie removal for the response.
    fn delete(&self, name: &str);
}

/// Carrier backed by an actix request: a snapshot of the inbound cookies
/// plus a buffer of pending response cookies. The middleware drains the
/// buffer onto the response after the handler completes.
#[derive(Debug)]
pub struct RequestCookies {
    state: Mutex<CookieState>,
    secure: bool,
}

#[derive(Debug, Default)]
struct CookieState {
    values: HashMap<String, String>,
    pending: Vec<Cookie<'static>>,
}

impl RequestCookies {
    /// Snapshot the cookies of an inbound request.
    ///
    /// An unparseable `Cookie` header is treated as empty; the stores will
    /// see "no session" rather than a failed request.
    #[must_use]
    pub fn from_request(req: &HttpRequest, secure: bool) -> Self {
        let values = match req.cookies() {
            Ok(cookies) => cookies
                .iter()
                .map(|c| (c.name().to_owned(), c.value().to_owned()))
                .collect(),
            Err(err) => {
                log::warn!("failed to parse request cookies: {err}");
                HashMap::new()
            }
        };

        Self {
            state: Mutex::new(CookieState {
                values,
                pending: Vec::new(),
            }),
            secure,
        }
    }

    /// Carrier seeded from name/value pairs, without a request.
    #[must_use]
    pub fn with_cookies<I>(pairs: I, secure: bool) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        Self {
            state: Mutex::new(CookieState {
                values: pairs.into_iter().collect(),
                pending: Vec::new(),
            }),
            secure,
        }
    }

    /// Empty carrier (a request with no cookies).
    #[must_use]
    pub fn empty(secure: bool) -> Self {
        Self::with_cookies(std::iter::empty(), secure)
    }

    /// Make the carrier reachable from request extensions, for handlers
    /// that cannot take it as a parameter directly.
    pub fn install(carrier: &Arc<Self>, req: &HttpRequest) {
        req.extensions_mut().insert(Arc::clone(carrier));
    }

    /// Fetch the carrier installed for this request.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::MissingContext`] if no middleware installed
    /// a carrier — an integration fault in the surrounding application.
    pub fn from_extensions(req: &HttpRequest) -> Result<Arc<Self>, SessionError> {
        req.extensions()
            .get::<Arc<Self>>()
            .cloned()
            .ok_or(SessionError::MissingContext)
    }

    /// Drain the buffered response cookies, in write order.
    #[must_use]
    pub fn take_pending(&self) -> Vec<Cookie<'static>> {
        std::mem::take(&mut self.state().pending)
    }

    fn state(&self) -> MutexGuard<'_, CookieState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn stage(state: &mut CookieState, cookie: Cookie<'static>) {
        // Last write wins, like a browser jar.
        state.pending.retain(|c| c.name() != cookie.name());
        state.pending.push(cookie);
    }
}

impl CookieCarrier for RequestCookies {
    fn get(&self, name: &str) -> Option<String> {
        self.state().values.get(name).cloned()
    }

    fn names(&self) -> Vec<String> {
        self.state().values.keys().cloned().collect()
    }

    fn set(&self, name: &str, value: String, options: &CookieOptions) {
        let cookie = Cookie::build(name.to_owned(), value.clone())
            .http_only(options.http_only)
            .secure(self.secure && options.secure)
            .same_site(options.same_site)
            .path(options.path.clone())
            .max_age(Duration::seconds(options.max_age))
            .finish();

        let mut state = self.state();
        state.values.insert(name.to_owned(), value);
        Self::stage(&mut state, cookie);
    }

    fn delete(&self, name: &str) {
        let cookie = Cookie::build(name.to_owned(), "")
            .http_only(true)
            .secure(self.secure)
            .same_site(SameSite::Lax)
            .path("/")
            .max_age(Duration::seconds(-1))
            .finish();

        let mut state = self.state();
        state.values.remove(name);
        Self::stage(&mut state, cookie);
    }
}
