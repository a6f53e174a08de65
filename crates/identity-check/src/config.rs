//! Verification client configuration.

use std::env;
use std::time::Duration;

/// Allow-list service URL (configured at compile time, overridable via env).
#[cfg(debug_assertions)]
const DEFAULT_BASE_URL: &str = "http://localhost:8787";

#[cfg(not(debug_assertions))]
const DEFAULT_BASE_URL: &str = "https://us-central1-identity-check.cloudfunctions.net";

/// Relative path of the existence/blacklist check endpoint.
const DEFAULT_CHECK_PATH: &str = "checkUser";

/// Relative path of the usage recording endpoint.
const DEFAULT_USAGE_PATH: &str = "recordUsage";

/// Upper bound for a single request, connect through body.
const DEFAULT_TIMEOUT_SECS: u64 = 10;

const ENV_BASE_URL: &str = "IDENTITY_CHECK_BASE_URL";
const ENV_TIMEOUT_SECS: &str = "IDENTITY_CHECK_TIMEOUT_SECS";

/// Configuration for the verification client.
/// Priority: explicit `with_*` setters > environment variables > defaults
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationConfig {
    /// Base URL both endpoints hang off, without a trailing slash
    pub base_url: String,
    /// Path of the check endpoint, relative to `base_url`
    pub check_path: String,
    /// Path of the usage endpoint, relative to `base_url`
    pub usage_path: String,
    /// Request timeout
    pub timeout: Duration,
}

impl VerificationConfig {
    /// Load configuration from `IDENTITY_CHECK_BASE_URL` and `IDENTITY_CHECK_TIMEOUT_SECS`,
    /// falling back to compile-time defaults.
    pub fn from_env() -> Self {
        Self::from_env_values(env::var(ENV_BASE_URL).ok(), env::var(ENV_TIMEOUT_SECS).ok())
    }

    fn from_env_values(base_url: Option<String>, timeout_secs: Option<String>) -> Self {
        let base_url = base_url
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        // Zero or unparsable values would disable the bound entirely, so they fall back
        let timeout_secs = timeout_secs
            .and_then(|v| v.trim().parse::<u64>().ok())
            .filter(|&secs| secs > 0)
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        Self {
            base_url: normalize_base_url(&base_url),
            check_path: DEFAULT_CHECK_PATH.to_string(),
            usage_path: DEFAULT_USAGE_PATH.to_string(),
            timeout: Duration::from_secs(timeout_secs),
        }
    }

    pub fn with_base_url(mut self, base_url: impl AsRef<str>) -> Self {
        self.base_url = normalize_base_url(base_url.as_ref());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Full URL of the check endpoint.
    pub fn check_url(&self) -> String {
        join_url(&self.base_url, &self.check_path)
    }

    /// Full URL of the usage endpoint.
    pub fn usage_url(&self) -> String {
        join_url(&self.base_url, &self.usage_path)
    }
}

impl Default for VerificationConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

fn normalize_base_url(base_url: &str) -> String {
    base_url.trim().trim_end_matches('/').to_string()
}

fn join_url(base_url: &str, path: &str) -> String {
    format!("{}/{}", base_url, path.trim_start_matches('/'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_without_env_values() {
        let config = VerificationConfig::from_env_values(None, None);
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.timeout, Duration::from_secs(10));
        assert_eq!(config.check_path, "checkUser");
        assert_eq!(config.usage_path, "recordUsage");
    }

    #[test]
    fn test_env_values_override_defaults() {
        let config =
            VerificationConfig::from_env_values(Some("https://example.test/api/".to_string()), Some("3".to_string()));
        assert_eq!(config.base_url, "https://example.test/api");
        assert_eq!(config.timeout, Duration::from_secs(3));
    }

    #[test]
    fn test_bad_timeout_falls_back_to_default() {
        let zero = VerificationConfig::from_env_values(None, Some("0".to_string()));
        assert_eq!(zero.timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));

        let garbage = VerificationConfig::from_env_values(None, Some("soon".to_string()));
        assert_eq!(garbage.timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));
    }

    #[test]
    fn test_blank_base_url_falls_back_to_default() {
        let config = VerificationConfig::from_env_values(Some("   ".to_string()), None);
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn test_setters_take_priority() {
        let config = VerificationConfig::from_env_values(Some("https://env.test".to_string()), None)
            .with_base_url("http://127.0.0.1:9000/")
            .with_timeout(Duration::from_millis(250));
        assert_eq!(config.base_url, "http://127.0.0.1:9000");
        assert_eq!(config.timeout, Duration::from_millis(250));
    }

    #[test]
    fn test_endpoint_urls() {
        let config = VerificationConfig::from_env_values(None, None).with_base_url("https://svc.test");
        assert_eq!(config.check_url(), "https://svc.test/checkUser");
        assert_eq!(config.usage_url(), "https://svc.test/recordUsage");
    }
}
