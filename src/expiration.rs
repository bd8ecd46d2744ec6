//! Session expiration policy
//!
//! Remaining lifetime is derived from the immutable creation timestamp and
//! two configured durations; there is no mutable "last seen" state. The
//! policy is re-evaluated against the wall clock on every write, never
//! cached.

use chrono::Utc;

/// Rolling/absolute lifetime policy for established sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpirationPolicy {
    rolling: bool,
    absolute_duration: i64,
    inactivity_duration: i64,
}

impl Default for ExpirationPolicy {
    /// Rolling sessions, 1 day of inactivity, 3 days absolute.
    fn default() -> Self {
        Self {
            rolling: true,
            absolute_duration: 259_200,
            inactivity_duration: 86_400,
        }
    }
}

impl ExpirationPolicy {
    /// Durations are seconds.
    #[must_use]
    pub const fn new(rolling: bool, absolute_duration: i64, inactivity_duration: i64) -> Self {
        Self {
            rolling,
            absolute_duration,
            inactivity_duration,
        }
    }

    /// Remaining max-age in seconds for a session established at
    /// `created_at`, evaluated now.
    #[must_use]
    pub fn max_age(&self, created_at: i64) -> i64 {
        self.max_age_at(created_at, Utc::now().timestamp())
    }

    /// Remaining max-age in seconds at an explicit point in time.
    ///
    /// With rolling disabled the configured absolute duration is returned
    /// unconditionally: the expiry was fixed at creation and every rewrite
    /// reuses the same budget. With rolling enabled the session ends at
    /// whichever comes first of the inactivity window and the absolute
    /// cap, floored at zero.
    #[must_use]
    pub fn max_age_at(&self, created_at: i64, now: i64) -> i64 {
        if !self.rolling {
            return self.absolute_duration;
        }

        let expires_at = (now + self.inactivity_duration).min(created_at + self.absolute_duration);
        (expires_at - now).max(0)
    }

    /// Absolute expiry timestamp for a session established at `created_at`,
    /// evaluated now. This is what gets baked into the sealed envelope.
    #[must_use]
    pub fn expires_at(&self, created_at: i64) -> i64 {
        let now = Utc::now().timestamp();
        now + self.max_age_at(created_at, now)
    }
}
