use std::path::PathBuf;
use std::time::Duration;

/// Application-level constants
pub const APP_NAME: &str = "tumorAI";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Backend origin used when no override is configured.
pub const DEFAULT_BACKEND_URL: &str = "http://localhost:5000";

/// Environment variable overriding the backend origin.
pub const BACKEND_URL_ENV: &str = "TUMORAI_BACKEND_URL";

/// Patient notifications are refreshed every 30 seconds.
pub const NOTIFICATION_POLL_SECS: u64 = 30;

/// Per-request timeout for backend calls.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Get the application data directory
/// ~/tumorAI/ on all platforms. Falls back to the working directory
/// when no home directory can be determined.
pub fn app_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

/// Directory holding the persisted login identity.
pub fn session_dir() -> PathBuf {
    app_data_dir().join("session")
}

/// Log filter used when `RUST_LOG` is not set.
pub fn default_log_filter() -> &'static str {
    "info,tumorai_lib=debug,reqwest=warn"
}

/// Runtime settings for the backend client and background tasks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub backend_url: String,
    pub request_timeout: Duration,
    pub poll_interval: Duration,
}

impl ClientConfig {
    /// Defaults, with the backend origin taken from `TUMORAI_BACKEND_URL` if set.
    pub fn from_env() -> Self {
        let backend_url = std::env::var(BACKEND_URL_ENV)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BACKEND_URL.to_string());
        Self {
            backend_url,
            ..Self::default()
        }
    }

    pub fn with_backend_url(mut self, url: &str) -> Self {
        self.backend_url = url.to_string();
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            poll_interval: Duration::from_secs(NOTIFICATION_POLL_SECS),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn app_data_dir_named_after_app() {
        assert!(app_data_dir().ends_with("tumorAI"));
    }

    #[test]
    fn session_dir_under_app_data() {
        let session = session_dir();
        assert!(session.starts_with(app_data_dir()));
        assert!(session.ends_with("session"));
    }

    #[test]
    fn default_config_targets_local_backend() {
        let config = ClientConfig::default();
        assert_eq!(config.backend_url, "http://localhost:5000");
        assert_eq!(config.poll_interval, Duration::from_secs(30));
        assert_eq!(config.request_timeout, Duration::from_secs(30));
    }

    #[test]
    fn builder_overrides() {
        let config = ClientConfig::default()
            .with_backend_url("http://clinic.local:8080")
            .with_poll_interval(Duration::from_millis(20));
        assert_eq!(config.backend_url, "http://clinic.local:8080");
        assert_eq!(config.poll_interval, Duration::from_millis(20));
    }

    #[test]
    fn app_version_matches_cargo() {
        assert_eq!(APP_VERSION, env!("CARGO_PKG_VERSION"));
    }
}
