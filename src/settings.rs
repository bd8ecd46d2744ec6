use serde::{Deserialize, Serialize};

use crate::expiration::ExpirationPolicy;

/// Session lifetime configuration.
///
/// Durations are seconds. `rolling` selects between activity-extended
/// expiry (capped by `absolute_duration_secs`) and a fixed budget set at
/// creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSettings {
    /// Extend the session lifetime on activity, up to the absolute cap.
    #[serde(default = "default_rolling")]
    pub rolling: bool,

    /// Hard ceiling on session lifetime, measured from creation.
    #[serde(default = "default_absolute_duration")]
    pub absolute_duration_secs: u64,

    /// Inactivity window for rolling sessions. Ignored when `rolling` is
    /// false.
    #[serde(default = "default_inactivity_duration")]
    pub inactivity_duration_secs: u64,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            rolling: default_rolling(),
            absolute_duration_secs: default_absolute_duration(),
            inactivity_duration_secs: default_inactivity_duration(),
        }
    }
}

/// Cookie attribute configuration shared by every cookie this crate writes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CookieSettings {
    /// Set the `Secure` attribute. Disable only for plain-HTTP development.
    #[serde(default = "default_true")]
    pub secure: bool,
}

impl Default for CookieSettings {
    fn default() -> Self {
        Self {
            secure: default_true(),
        }
    }
}

// Helper functions for serde defaults
fn default_rolling() -> bool {
    true
}
fn default_absolute_duration() -> u64 {
    259_200 // 3 days
}
fn default_inactivity_duration() -> u64 {
    86_400 // 1 day
}
fn default_true() -> bool {
    true
}

impl From<&SessionSettings> for ExpirationPolicy {
    fn from(settings: &SessionSettings) -> Self {
        Self::new(
            settings.rolling,
            i64::try_from(settings.absolute_duration_secs).unwrap_or(i64::MAX),
            i64::try_from(settings.inactivity_duration_secs).unwrap_or(i64::MAX),
        )
    }
}
