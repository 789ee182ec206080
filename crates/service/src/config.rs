//! Service configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `PIZZA_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `PIZZA_JWT_SECRET` - Token signing secret (min 32 chars, high entropy)
//! - `PIZZA_FACTORY_URL` - Base URL of the pizza factory
//! - `PIZZA_FACTORY_API_KEY` - Bearer key for the pizza factory
//!
//! ## Optional
//! - `PIZZA_HOST` - Bind address (default: 127.0.0.1)
//! - `PIZZA_PORT` - Listen port (default: 3000)
//! - `PIZZA_LIST_PER_PAGE` - Order history page size (default: 10)
//! - `PIZZA_METRICS_URL` - OTLP/JSON metrics endpoint; metrics are only pushed when set
//! - `PIZZA_METRICS_API_KEY` - Bearer key for the metrics endpoint (required with the URL)
//! - `PIZZA_METRICS_SOURCE` - `source` attribute on every metric (default: jwt-pizza-service)
//! - `PIZZA_METRICS_INTERVAL_SECS` - Push period (default: 10)
//! - `PIZZA_DEFAULT_ADMIN_NAME` / `_EMAIL` / `_PASSWORD` - Admin seeded on first boot
//! - `PIZZA_LOG_JSON` - Emit JSON log lines when `true`/`1`
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use pizza_core::Email;
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

const MIN_JWT_SECRET_LENGTH: usize = 32;
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

/// Service configuration.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// HS256 signing secret for bearer tokens
    pub jwt_secret: SecretString,
    /// Page size of a diner's order history
    pub list_per_page: i64,
    /// Pizza factory connection
    pub factory: FactoryConfig,
    /// Metrics push target, if configured
    pub metrics: Option<MetricsConfig>,
    /// Admin account created when the schema is first bootstrapped
    pub default_admin: Option<DefaultAdmin>,
    /// Emit JSON log lines instead of human-readable ones
    pub log_json: bool,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
}

/// Pizza factory configuration.
///
/// Implements `Debug` manually to redact the API key.
#[derive(Clone)]
pub struct FactoryConfig {
    /// Base URL, e.g. `https://pizza-factory.cs329.click`
    pub url: String,
    /// Bearer key sent with every order
    pub api_key: SecretString,
}

impl std::fmt::Debug for FactoryConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FactoryConfig")
            .field("url", &self.url)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

/// Metrics push configuration.
///
/// Implements `Debug` manually to redact the API key.
#[derive(Clone)]
pub struct MetricsConfig {
    /// OTLP/JSON endpoint
    pub url: String,
    /// Bearer key for the endpoint
    pub api_key: SecretString,
    /// Value of the `source` attribute
    pub source: String,
    /// Push period
    pub interval: Duration,
}

impl std::fmt::Debug for MetricsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetricsConfig")
            .field("url", &self.url)
            .field("api_key", &"[REDACTED]")
            .field("source", &self.source)
            .field("interval", &self.interval)
            .finish()
    }
}

/// Credentials of the admin seeded on first boot.
#[derive(Clone)]
pub struct DefaultAdmin {
    pub name: String,
    pub email: Email,
    pub password: SecretString,
}

impl std::fmt::Debug for DefaultAdmin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DefaultAdmin")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

impl ServiceConfig {
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

        let database_url = get_database_url("PIZZA_DATABASE_URL")?;
        let host = parse_env("PIZZA_HOST", "127.0.0.1")?;
        let port = parse_env("PIZZA_PORT", "3000")?;
        let list_per_page = parse_env::<i64>("PIZZA_LIST_PER_PAGE", "10")?;
        if list_per_page < 1 {
            return Err(ConfigError::InvalidEnvVar(
                "PIZZA_LIST_PER_PAGE".to_string(),
                "must be at least 1".to_string(),
            ));
        }

        let jwt_secret = get_validated_secret("PIZZA_JWT_SECRET")?;
        validate_jwt_secret(&jwt_secret, "PIZZA_JWT_SECRET")?;

        let factory = FactoryConfig {
            url: get_required_env("PIZZA_FACTORY_URL")?,
            api_key: get_required_secret("PIZZA_FACTORY_API_KEY")?,
        };

        Ok(Self {
            database_url,
            host,
            port,
            jwt_secret,
            list_per_page,
            factory,
            metrics: MetricsConfig::from_env()?,
            default_admin: DefaultAdmin::from_env()?,
            log_json: parse_bool(&get_env_or_default("PIZZA_LOG_JSON", "false")),
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl MetricsConfig {
    fn from_env() -> Result<Option<Self>, ConfigError> {
        let Some(url) = get_optional_env("PIZZA_METRICS_URL") else {
            return Ok(None);
        };
        let interval_secs = parse_env::<u64>("PIZZA_METRICS_INTERVAL_SECS", "10")?;
        if interval_secs == 0 {
            return Err(ConfigError::InvalidEnvVar(
                "PIZZA_METRICS_INTERVAL_SECS".to_string(),
                "must be at least 1".to_string(),
            ));
        }

        Ok(Some(Self {
            url,
            api_key: get_required_secret("PIZZA_METRICS_API_KEY")?,
            source: get_env_or_default("PIZZA_METRICS_SOURCE", "jwt-pizza-service"),
            interval: Duration::from_secs(interval_secs),
        }))
    }
}

impl DefaultAdmin {
    fn from_env() -> Result<Option<Self>, ConfigError> {
        let Some(email) = get_optional_env("PIZZA_DEFAULT_ADMIN_EMAIL") else {
            return Ok(None);
        };
        let email = Email::parse(&email).map_err(|e| {
            ConfigError::InvalidEnvVar("PIZZA_DEFAULT_ADMIN_EMAIL".to_string(), e.to_string())
        })?;

        Ok(Some(Self {
            name: get_env_or_default("PIZZA_DEFAULT_ADMIN_NAME", "Admin"),
            email,
            password: get_required_secret("PIZZA_DEFAULT_ADMIN_PASSWORD")?,
        }))
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get a required environment variable as a secret.
fn get_required_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    Ok(SecretString::from(value))
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

/// Parse an environment variable, using `default` when unset.
fn parse_env<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    get_env_or_default(key, default)
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Interpret a flag value.
fn parse_bool(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// Validate that the token secret meets minimum length requirements.
fn validate_jwt_secret(secret: &SecretString, var_name: &str) -> Result<(), ConfigError> {
    let value = secret.expose_secret();
    if value.len() < MIN_JWT_SECRET_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "must be at least {} characters (got {})",
                MIN_JWT_SECRET_LENGTH,
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
    let len = s.chars().count() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)]
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
