//! Users service configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `USERS_TOKEN_SECRET` - Access token signing secret (min 32 chars, high entropy)
//! - `USERS_MONGO_URL` - `MongoDB` connection string, when the store backend is
//!   `mongo` (falls back to `MONGO_CONNECTION_STRING`)
//!
//! ## Optional
//! - `USERS_HOST` - Bind address (default: 127.0.0.1)
//! - `USERS_PORT` - Listen port (default: 8080, falls back to `PORT`)
//! - `USERS_STORE_BACKEND` - `mongo` or `memory` (default: mongo)
//! - `USERS_DATABASE` - `MongoDB` database name (default: petlife)
//! - `CLIENTS_COLLECTION` - Collection holding clients (default: clients)
//! - `SHOPS_COLLECTION` - Collection holding shops (default: shops)
//! - `USERS_UPLOAD_DIR` - Directory for uploaded pictures (default: ./uploads)
//! - `USERS_TOKEN_TTL_MINUTES` - Access token lifetime (default: 60)
//! - `USERS_LOG_JSON` - Emit JSON logs when `true` or `1`
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_TRACES_SAMPLE_RATE` - Fraction of requests traced (default: 0.0)

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use chrono::Duration;
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

use crate::models::Collections;

const MIN_TOKEN_SECRET_LENGTH: usize = 32;
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

/// Where user documents are persisted.
#[derive(Clone)]
pub enum StoreBackend {
    /// `MongoDB` server.
    Mongo {
        /// Connection string (may contain credentials).
        url: SecretString,
        /// Database name.
        database: String,
    },
    /// Process memory; everything is lost on restart.
    Memory,
}

impl std::fmt::Debug for StoreBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Mongo { database, .. } => f
                .debug_struct("Mongo")
                .field("url", &"[REDACTED]")
                .field("database", database)
                .finish(),
            Self::Memory => f.write_str("Memory"),
        }
    }
}

/// Users service configuration.
#[derive(Debug, Clone)]
pub struct UsersConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Document store backend
    pub store: StoreBackend,
    /// Physical collection names
    pub collections: Collections,
    /// Directory for uploaded pictures
    pub upload_dir: PathBuf,
    /// Access token signing secret
    pub token_secret: SecretString,
    /// Access token lifetime
    pub token_ttl: Duration,
    /// Emit JSON-formatted logs
    pub log_json: bool,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
    /// Fraction of requests sent to Sentry as transactions
    pub sentry_traces_sample_rate: f32,
}

/// Source of configuration values.
type Lookup<'a> = &'a dyn Fn(&str) -> Option<String>;

impl UsersConfig {
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
        Self::from_lookup(&|key| std::env::var(key).ok())
    }

    /// Load configuration from an explicit key/value map.
    ///
    /// # Errors
    ///
    /// Same as [`UsersConfig::from_env`].
    pub fn from_map(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        Self::from_lookup(&|key| vars.get(key).cloned())
    }

    fn from_lookup(env: Lookup<'_>) -> Result<Self, ConfigError> {
        let host = get_env_or_default(env, "USERS_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("USERS_HOST".to_string(), e.to_string()))?;
        let port = env("USERS_PORT")
            .or_else(|| env("PORT"))
            .unwrap_or_else(|| "8080".to_string())
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("USERS_PORT".to_string(), e.to_string()))?;

        let store = match get_env_or_default(env, "USERS_STORE_BACKEND", "mongo").as_str() {
            "mongo" => StoreBackend::Mongo {
                url: get_mongo_url(env, "USERS_MONGO_URL")?,
                database: get_env_or_default(env, "USERS_DATABASE", "petlife"),
            },
            "memory" => StoreBackend::Memory,
            other => {
                return Err(ConfigError::InvalidEnvVar(
                    "USERS_STORE_BACKEND".to_string(),
                    format!("expected 'mongo' or 'memory', got '{other}'"),
                ));
            }
        };

        let collections = Collections {
            clients: get_env_or_default(env, "CLIENTS_COLLECTION", "clients"),
            shops: get_env_or_default(env, "SHOPS_COLLECTION", "shops"),
        };

        let token_secret = get_validated_secret(env, "USERS_TOKEN_SECRET")?;
        validate_secret_length(&token_secret, "USERS_TOKEN_SECRET")?;

        let ttl_minutes = get_env_or_default(env, "USERS_TOKEN_TTL_MINUTES", "60")
            .parse::<u32>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("USERS_TOKEN_TTL_MINUTES".to_string(), e.to_string())
            })?;

        let sentry_traces_sample_rate = get_env_or_default(env, "SENTRY_TRACES_SAMPLE_RATE", "0.0")
            .parse::<f32>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("SENTRY_TRACES_SAMPLE_RATE".to_string(), e.to_string())
            })?;

        Ok(Self {
            host,
            port,
            store,
            collections,
            upload_dir: PathBuf::from(get_env_or_default(env, "USERS_UPLOAD_DIR", "./uploads")),
            token_secret,
            token_ttl: Duration::minutes(i64::from(ttl_minutes)),
            log_json: env("USERS_LOG_JSON").is_some_and(|v| matches!(v.as_str(), "true" | "1")),
            sentry_dsn: env("SENTRY_DSN"),
            sentry_environment: env("SENTRY_ENVIRONMENT"),
            sentry_traces_sample_rate,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(env: Lookup<'_>, key: &str) -> Result<String, ConfigError> {
    env(key).ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get the `MongoDB` URL with fallback to the generic `MONGO_CONNECTION_STRING`.
fn get_mongo_url(env: Lookup<'_>, primary_key: &str) -> Result<SecretString, ConfigError> {
    env(primary_key)
        .or_else(|| env("MONGO_CONNECTION_STRING"))
        .map(SecretString::from)
        .ok_or_else(|| ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Get an environment variable with a default value.
fn get_env_or_default(env: Lookup<'_>, key: &str, default: &str) -> String {
    env(key).unwrap_or_else(|| default.to_string())
}

/// Validate that a secret meets minimum length requirements.
fn validate_secret_length(secret: &SecretString, var_name: &str) -> Result<(), ConfigError> {
    let value = secret.expose_secret();
    if value.len() < MIN_TOKEN_SECRET_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "must be at least {} characters (got {})",
                MIN_TOKEN_SECRET_LENGTH,
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

    if let Some(pattern) = PLACEHOLDER_PATTERNS.iter().find(|p| lower.contains(*p)) {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!("appears to be a placeholder (contains '{pattern}')"),
        ));
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

/// Load and validate a secret.
fn get_validated_secret(env: Lookup<'_>, key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(env, key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const GOOD_SECRET: &str = "aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6%hJ8";

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_shannon_entropy_empty() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_two_chars() {
        // "ab" has entropy of 1 bit per char (50% a, 50% b)
        let entropy = shannon_entropy("ab");
        assert!((entropy - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_validate_secret_strength_placeholder() {
        let err = validate_secret_strength("your-token-key-here", "TEST_VAR").unwrap_err();
        assert!(matches!(err, ConfigError::InsecureSecret(_, _)));
    }

    #[test]
    fn test_validate_secret_strength_low_entropy() {
        let result = validate_secret_strength("aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa", "TEST_VAR");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_validate_secret_strength_valid() {
        assert!(validate_secret_strength(GOOD_SECRET, "TEST_VAR").is_ok());
    }

    #[test]
    fn test_validate_secret_length() {
        assert!(validate_secret_length(&SecretString::from("short"), "TEST").is_err());
        assert!(validate_secret_length(&SecretString::from("a".repeat(32)), "TEST").is_ok());
    }

    #[test]
    fn test_defaults_with_memory_backend() {
        let config = UsersConfig::from_map(&vars(&[
            ("USERS_STORE_BACKEND", "memory"),
            ("USERS_TOKEN_SECRET", GOOD_SECRET),
        ]))
        .unwrap();

        assert!(matches!(config.store, StoreBackend::Memory));
        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:8080");
        assert_eq!(config.collections, Collections::default());
        assert_eq!(config.token_ttl, Duration::minutes(60));
        assert!(!config.log_json);
    }

    #[test]
    fn test_mongo_backend_requires_url() {
        let result = UsersConfig::from_map(&vars(&[("USERS_TOKEN_SECRET", GOOD_SECRET)]));
        assert!(matches!(result, Err(ConfigError::MissingEnvVar(ref key)) if key == "USERS_MONGO_URL"));
    }

    #[test]
    fn test_mongo_url_fallback_and_overrides() {
        let config = UsersConfig::from_map(&vars(&[
            ("MONGO_CONNECTION_STRING", "mongodb://localhost:27017"),
            ("USERS_TOKEN_SECRET", GOOD_SECRET),
            ("PORT", "9000"),
            ("SHOPS_COLLECTION", "petshops"),
            ("USERS_LOG_JSON", "true"),
        ]))
        .unwrap();

        match &config.store {
            StoreBackend::Mongo { url, database } => {
                assert_eq!(url.expose_secret(), "mongodb://localhost:27017");
                assert_eq!(database, "petlife");
            }
            StoreBackend::Memory => panic!("expected mongo backend"),
        }
        assert_eq!(config.port, 9000);
        assert_eq!(config.collections.shops, "petshops");
        assert!(config.log_json);
    }

    #[test]
    fn test_invalid_backend() {
        let result = UsersConfig::from_map(&vars(&[
            ("USERS_STORE_BACKEND", "postgres"),
            ("USERS_TOKEN_SECRET", GOOD_SECRET),
        ]));
        assert!(matches!(result, Err(ConfigError::InvalidEnvVar(_, _))));
    }

    #[test]
    fn test_store_backend_debug_redacts_url() {
        let backend = StoreBackend::Mongo {
            url: SecretString::from("mongodb://user:hunter2@db"),
            database: "petlife".to_string(),
        };
        let debug = format!("{backend:?}");
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("hunter2"));
    }
}
