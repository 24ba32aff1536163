//! Environment configuration for the tracker connection.

use std::time::Duration;

/// Default per-request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: f64 = 30.0;

/// Connection settings for the live gateway.
///
/// Read once at process start; the gateway handle built from it is shared
/// read-only for the life of the process.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Base URL of the tracker instance, without a trailing slash.
    pub base_url: String,
    /// Permanent API token.
    pub token: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl GatewayConfig {
    /// Reads configuration from `YOUTRACK_URL`, `YOUTRACK_TOKEN`, and
    /// `YOUTRACK_TIMEOUT` (seconds), after a best-effort `.env` load.
    ///
    /// Returns `None` when URL or token is absent or empty.
    #[must_use]
    pub fn from_env() -> Option<Self> {
        dotenvy::dotenv().ok();
        Self::from_parts(
            std::env::var("YOUTRACK_URL").ok(),
            std::env::var("YOUTRACK_TOKEN").ok(),
            std::env::var("YOUTRACK_TIMEOUT").ok(),
        )
    }

    fn from_parts(url: Option<String>, token: Option<String>, timeout: Option<String>) -> Option<Self> {
        let base_url = url.filter(|u| !u.is_empty())?;
        let token = token.filter(|t| !t.is_empty())?;
        let timeout_secs = timeout
            .and_then(|raw| raw.parse::<f64>().ok())
            .filter(|secs| secs.is_finite() && *secs > 0.0)
            .unwrap_or(DEFAULT_TIMEOUT_SECS);
        Some(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
            timeout: Duration::from_secs_f64(timeout_secs),
        })
    }
}
