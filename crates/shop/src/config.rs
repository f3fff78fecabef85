//! Shop configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `SHOP_DATABASE_URL` - `PostgreSQL` connection string
//! - `SHOP_BASE_URL` - Public URL the mobile client reaches this service on
//! - `SHOP_SESSION_SECRET` - Session signing secret (min 32 chars, high entropy)
//! - `PAYMENTS_SECRET_KEY` - Payment-link provider secret key
//! - `MEDIA_ENDPOINT` - Object storage endpoint URL
//! - `MEDIA_BUCKET` - Object storage bucket for profile photos
//! - `MEDIA_ACCESS_TOKEN` - Object storage bearer token
//!
//! ## Optional
//! - `SHOP_HOST` - Bind address (default: 127.0.0.1)
//! - `SHOP_PORT` - Listen port (default: 3000)
//! - `PAYMENTS_BASE_URL` - Provider API base (default: https://api.paymongo.com/v1)
//! - `PAYMENTS_CURRENCY` - ISO 4217 code sent on links (default: PHP)
//! - `PAYMENTS_REDIRECT_SUCCESS` / `PAYMENTS_REDIRECT_FAILED` - Redirect
//!   targets for hosted checkout (default: derived from `SHOP_BASE_URL`)
//! - `MEDIA_PUBLIC_BASE_URL` - Public URL prefix for uploaded photos
//!   (default: `MEDIA_ENDPOINT`/`MEDIA_BUCKET`)
//! - `SENTRY_DSN` - Sentry error tracking DSN

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

const MIN_SESSION_SECRET_LENGTH: usize = 32;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Shop application configuration.
#[derive(Debug, Clone)]
pub struct ShopConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the service
    pub base_url: String,
    /// Session signing secret
    pub session_secret: SecretString,
    /// Payment-link provider configuration
    pub payments: PaymentsConfig,
    /// Profile-photo object storage configuration
    pub media: MediaConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
}

/// Payment-link provider configuration.
///
/// Implements `Debug` manually to redact the secret key. Holding the key
/// here, server-side, is what keeps it out of the mobile client.
#[derive(Clone)]
pub struct PaymentsConfig {
    /// Provider API base URL
    pub base_url: String,
    /// Provider secret key (used as the basic-auth username)
    pub secret_key: SecretString,
    /// ISO 4217 currency code sent on every link
    pub currency: String,
    /// Where the hosted checkout sends the shopper on success
    pub redirect_success: String,
    /// Where the hosted checkout sends the shopper on failure
    pub redirect_failed: String,
}

impl std::fmt::Debug for PaymentsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaymentsConfig")
            .field("base_url", &self.base_url)
            .field("secret_key", &"[REDACTED]")
            .field("currency", &self.currency)
            .field("redirect_success", &self.redirect_success)
            .field("redirect_failed", &self.redirect_failed)
            .finish()
    }
}

/// Object storage configuration for profile photos.
#[derive(Clone)]
pub struct MediaConfig {
    /// Storage endpoint URL
    pub endpoint: String,
    /// Bucket name
    pub bucket: String,
    /// Public URL prefix for retrieving uploaded objects
    pub public_base_url: String,
    /// Bearer token for uploads
    pub access_token: SecretString,
}

impl std::fmt::Debug for MediaConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaConfig")
            .field("endpoint", &self.endpoint)
            .field("bucket", &self.bucket)
            .field("public_base_url", &self.public_base_url)
            .field("access_token", &"[REDACTED]")
            .finish()
    }
}

impl ShopConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("SHOP_DATABASE_URL")?;
        let host = get_env_or_default("SHOP_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("SHOP_HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default("SHOP_PORT", "3000")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("SHOP_PORT".to_string(), e.to_string()))?;
        let base_url = get_required_env("SHOP_BASE_URL")?;
        let session_secret = get_validated_secret("SHOP_SESSION_SECRET")?;
        validate_session_secret(&session_secret, "SHOP_SESSION_SECRET")?;

        let payments = PaymentsConfig::from_env(&base_url)?;
        let media = MediaConfig::from_env()?;
        let sentry_dsn = get_optional_env("SENTRY_DSN");

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            session_secret,
            payments,
            media,
            sentry_dsn,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl PaymentsConfig {
    fn from_env(base_url: &str) -> Result<Self, ConfigError> {
        let redirect_success = get_env_or_default(
            "PAYMENTS_REDIRECT_SUCCESS",
            &format!("{base_url}/payments/success"),
        );
        let redirect_failed = get_env_or_default(
            "PAYMENTS_REDIRECT_FAILED",
            &format!("{base_url}/payments/failed"),
        );
        // The provider rejects links with unparseable redirects; fail at
        // startup instead.
        validate_url("PAYMENTS_REDIRECT_SUCCESS", &redirect_success)?;
        validate_url("PAYMENTS_REDIRECT_FAILED", &redirect_failed)?;

        Ok(Self {
            base_url: get_env_or_default("PAYMENTS_BASE_URL", "https://api.paymongo.com/v1"),
            secret_key: get_validated_secret("PAYMENTS_SECRET_KEY")?,
            currency: get_env_or_default("PAYMENTS_CURRENCY", "PHP"),
            redirect_success,
            redirect_failed,
        })
    }
}

/// Validate that a value parses as an absolute URL.
fn validate_url(var_name: &str, value: &str) -> Result<(), ConfigError> {
    url::Url::parse(value)
        .map(|_| ())
        .map_err(|e| ConfigError::InvalidEnvVar(var_name.to_string(), e.to_string()))
}

impl MediaConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let endpoint = get_required_env("MEDIA_ENDPOINT")?;
        let bucket = get_required_env("MEDIA_BUCKET")?;
        let public_base_url = get_env_or_default(
            "MEDIA_PUBLIC_BASE_URL",
            &format!("{}/{bucket}", endpoint.trim_end_matches('/')),
        );

        Ok(Self {
            endpoint,
            bucket,
            public_base_url,
            access_token: get_validated_secret("MEDIA_ACCESS_TOKEN")?,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get database URL with fallback to generic `DATABASE_URL`.
fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Validate that a session secret meets minimum length requirements.
fn validate_session_secret(secret: &SecretString, var_name: &str) -> Result<(), ConfigError> {
    let value = secret.expose_secret();
    if value.len() < MIN_SESSION_SECRET_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "must be at least {} characters (got {})",
                MIN_SESSION_SECRET_LENGTH,
                value.len()
            ),
        ));
    }
    Ok(())
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.len() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    // Real provider keys are random; low entropy means a typed-in value
    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated secret."
            ),
        ));
    }

    Ok(())
}

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_shannon_entropy_degenerate_inputs() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
        assert!((shannon_entropy("aaaaaaa") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_two_chars() {
        // "ab" has entropy of 1 bit per char (50% a, 50% b)
        let entropy = shannon_entropy("ab");
        assert!((entropy - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_shannon_entropy_random_looking_string() {
        let entropy = shannon_entropy("aB3$xY9!mK2@nL5#");
        assert!(entropy > 3.3);
    }

    #[test]
    fn test_validate_secret_strength_placeholder() {
        let result = validate_secret_strength("your-api-key-here", "TEST_VAR");
        assert!(matches!(
            result.unwrap_err(),
            ConfigError::InsecureSecret(_, _)
        ));
    }

    #[test]
    fn test_validate_secret_strength_low_entropy() {
        let result = validate_secret_strength("aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa", "TEST_VAR");
        assert!(matches!(
            result.unwrap_err(),
            ConfigError::InsecureSecret(_, _)
        ));
    }

    #[test]
    fn test_validate_secret_strength_valid() {
        let result = validate_secret_strength("aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6", "TEST_VAR");
        assert!(result.is_ok());
    }

    #[test]
    fn test_validate_url() {
        assert!(validate_url("TEST", "https://shop.example/payments/success").is_ok());
        assert!(validate_url("TEST", "not a url").is_err());
    }

    #[test]
    fn test_validate_session_secret_length() {
        let short = SecretString::from("short");
        assert!(validate_session_secret(&short, "TEST_SESSION").is_err());

        let ok = SecretString::from("a".repeat(32));
        assert!(validate_session_secret(&ok, "TEST_SESSION").is_ok());
    }

    #[test]
    fn test_socket_addr() {
        let config = test_config();
        let addr = config.socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 3000);
    }

    #[test]
    fn test_payments_config_debug_redacts_secret_key() {
        let config = test_config();
        let debug_output = format!("{:?}", config.payments);

        assert!(debug_output.contains("api.paymongo.com"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("sk_test_deadbeef"));
    }

    #[test]
    fn test_media_config_debug_redacts_token() {
        let config = test_config();
        let debug_output = format!("{:?}", config.media);

        assert!(debug_output.contains("profile-media"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("media_token_value"));
    }

    fn test_config() -> ShopConfig {
        ShopConfig {
            database_url: SecretString::from("postgres://localhost/test"),
            host: "127.0.0.1".parse().unwrap(),
            port: 3000,
            base_url: "http://localhost:3000".to_string(),
            session_secret: SecretString::from("x".repeat(32)),
            payments: PaymentsConfig {
                base_url: "https://api.paymongo.com/v1".to_string(),
                secret_key: SecretString::from("sk_test_deadbeef"),
                currency: "PHP".to_string(),
                redirect_success: "http://localhost:3000/payments/success".to_string(),
                redirect_failed: "http://localhost:3000/payments/failed".to_string(),
            },
            media: MediaConfig {
                endpoint: "https://storage.example.net".to_string(),
                bucket: "profile-media".to_string(),
                public_base_url: "https://storage.example.net/profile-media".to_string(),
                access_token: SecretString::from("media_token_value"),
            },
            sentry_dsn: None,
        }
    }
}
