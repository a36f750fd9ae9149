//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `BAZAAR_API_BASE_URL` - Base URL of the storefront REST API
//!   (e.g., `https://api.example.com/api`)
//!
//! ## Optional
//! - `BAZAAR_API_TOKEN` - Bearer token sent with every API request
//! - `BAZAAR_API_TIMEOUT_SECS` - Request timeout in seconds (default: 10)
//! - `BAZAAR_DELIVERY_MODE` - `remote` to ask the API for delivery charges,
//!   `local` to fetch the rules and compute them in-process (default: remote)
//! - `BAZAAR_RULES_CACHE_TTL_SECS` - How long fetched delivery rules and
//!   products are reused (default: 300)

use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

const DEFAULT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_RULES_CACHE_TTL_SECS: u64 = 300;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Where delivery charges are computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeliveryMode {
    /// `POST /delivery-charges/calculate` on the API.
    #[default]
    Remote,
    /// Fetch the active rules and run the resolver in-process.
    Local,
}

impl std::str::FromStr for DeliveryMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "remote" => Ok(Self::Remote),
            "local" => Ok(Self::Local),
            other => Err(format!("expected `remote` or `local`, got `{other}`")),
        }
    }
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    pub api: ApiConfig,
}

/// Storefront REST API configuration.
///
/// Implements `Debug` manually to redact the token.
#[derive(Clone)]
pub struct ApiConfig {
    /// Base URL all endpoint paths are appended to.
    pub base_url: Url,
    /// Optional bearer token.
    pub token: Option<SecretString>,
    /// Per-request timeout.
    pub timeout: Duration,
    pub delivery_mode: DeliveryMode,
    /// Lifetime of cached delivery rules and products, in either delivery mode.
    pub rules_cache_ttl: Duration,
}

impl std::fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiConfig")
            .field("base_url", &self.base_url.as_str())
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("timeout", &self.timeout)
            .field("delivery_mode", &self.delivery_mode)
            .field("rules_cache_ttl", &self.rules_cache_ttl)
            .finish()
    }
}

impl ApiConfig {
    /// Configuration with defaults for everything but the base URL.
    #[must_use]
    pub const fn new(base_url: Url) -> Self {
        Self {
            base_url,
            token: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            delivery_mode: DeliveryMode::Remote,
            rules_cache_ttl: Duration::from_secs(DEFAULT_RULES_CACHE_TTL_SECS),
        }
    }

    fn from_lookup(lookup: &impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let raw_url = get_required(lookup, "BAZAAR_API_BASE_URL")?;
        let base_url = Url::parse(&raw_url).map_err(|e| {
            ConfigError::InvalidEnvVar("BAZAAR_API_BASE_URL".to_string(), e.to_string())
        })?;
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidEnvVar(
                "BAZAAR_API_BASE_URL".to_string(),
                format!("unsupported scheme `{}`", base_url.scheme()),
            ));
        }

        let token = lookup("BAZAAR_API_TOKEN")
            .filter(|t| !t.trim().is_empty())
            .map(SecretString::from);

        let timeout = get_secs(lookup, "BAZAAR_API_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS)?;
        if timeout.is_zero() {
            return Err(ConfigError::InvalidEnvVar(
                "BAZAAR_API_TIMEOUT_SECS".to_string(),
                "must be greater than zero".to_string(),
            ));
        }

        let delivery_mode = lookup("BAZAAR_DELIVERY_MODE")
            .map(|v| v.parse::<DeliveryMode>())
            .transpose()
            .map_err(|e| ConfigError::InvalidEnvVar("BAZAAR_DELIVERY_MODE".to_string(), e))?
            .unwrap_or_default();

        let rules_cache_ttl = get_secs(
            lookup,
            "BAZAAR_RULES_CACHE_TTL_SECS",
            DEFAULT_RULES_CACHE_TTL_SECS,
        )?;

        Ok(Self {
            base_url,
            token,
            timeout,
            delivery_mode,
            rules_cache_ttl,
        })
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key/value source.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        Ok(Self {
            api: ApiConfig::from_lookup(&lookup)?,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required variable.
fn get_required(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Result<String, ConfigError> {
    lookup(key).ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get a duration in whole seconds with a default.
fn get_secs(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: u64,
) -> Result<Duration, ConfigError> {
    lookup(key)
        .map_or(Ok(default), |v| v.trim().parse::<u64>())
        .map(Duration::from_secs)
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use secrecy::ExposeSecret;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<StorefrontConfig, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        StorefrontConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[("BAZAAR_API_BASE_URL", "https://api.example.com/api")]).unwrap();
        assert_eq!(config.api.base_url.as_str(), "https://api.example.com/api");
        assert!(config.api.token.is_none());
        assert_eq!(config.api.timeout, Duration::from_secs(10));
        assert_eq!(config.api.delivery_mode, DeliveryMode::Remote);
        assert_eq!(config.api.rules_cache_ttl, Duration::from_secs(300));
    }

    #[test]
    fn test_all_values() {
        let config = load(&[
            ("BAZAAR_API_BASE_URL", "http://localhost:5000/api"),
            ("BAZAAR_API_TOKEN", "tok_abc"),
            ("BAZAAR_API_TIMEOUT_SECS", "3"),
            ("BAZAAR_DELIVERY_MODE", "Local"),
            ("BAZAAR_RULES_CACHE_TTL_SECS", "60"),
        ])
        .unwrap();

        assert_eq!(config.api.token.unwrap().expose_secret(), "tok_abc");
        assert_eq!(config.api.timeout, Duration::from_secs(3));
        assert_eq!(config.api.delivery_mode, DeliveryMode::Local);
        assert_eq!(config.api.rules_cache_ttl, Duration::from_secs(60));
    }

    #[test]
    fn test_missing_base_url() {
        let err = load(&[]).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(ref k) if k == "BAZAAR_API_BASE_URL"));
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(
            load(&[("BAZAAR_API_BASE_URL", "not a url")]),
            Err(ConfigError::InvalidEnvVar(..))
        ));
        assert!(matches!(
            load(&[("BAZAAR_API_BASE_URL", "ftp://example.com")]),
            Err(ConfigError::InvalidEnvVar(..))
        ));
        assert!(matches!(
            load(&[
                ("BAZAAR_API_BASE_URL", "https://example.com"),
                ("BAZAAR_API_TIMEOUT_SECS", "0"),
            ]),
            Err(ConfigError::InvalidEnvVar(..))
        ));
        assert!(matches!(
            load(&[
                ("BAZAAR_API_BASE_URL", "https://example.com"),
                ("BAZAAR_DELIVERY_MODE", "carrier-pigeon"),
            ]),
            Err(ConfigError::InvalidEnvVar(..))
        ));
    }

    #[test]
    fn test_api_config_debug_redacts_token() {
        let config = load(&[
            ("BAZAAR_API_BASE_URL", "https://api.example.com"),
            ("BAZAAR_API_TOKEN", "super_secret_token"),
        ])
        .unwrap();

        let debug_output = format!("{:?}", config.api);
        assert!(debug_output.contains("api.example.com"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("super_secret_token"));
    }
}
