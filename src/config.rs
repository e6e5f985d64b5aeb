//! Configuration values recognized by the helpers.
//!
//! The only tunable is the fuse deadline. It is serde-deserializable so hosts can keep it
//! next to the rest of their settings; the wire name is `timeoutMs`.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Settings for a [`Fuse`](crate::Fuse).
///
/// ```
/// use std::time::Duration;
/// use cbx::FuseConfig;
///
/// let config: FuseConfig = serde_json::from_str(r#"{ "timeoutMs": 1500 }"#).unwrap();
/// assert_eq!(config.timeout(), Duration::from_millis(1500));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct FuseConfig {
    /// Milliseconds before the fuse trips and synthesizes a timeout error.
    pub timeout_ms: u64,
}

impl FuseConfig {
    pub fn new(timeout_ms: u64) -> Self {
        Self { timeout_ms }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl From<Duration> for FuseConfig {
    /// Sub-millisecond precision is truncated; durations beyond `u64::MAX` ms saturate.
    fn from(timeout: Duration) -> Self {
        Self {
            timeout_ms: saturating_millis(timeout),
        }
    }
}

/// Whole milliseconds in `duration`, saturating at `u64::MAX`.
pub(crate) fn saturating_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
