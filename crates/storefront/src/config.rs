//! Shell configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `STOREFRONT_NOTIFICATION_TTL_MS` - Notification display duration (default: 5000)
//! - `STOREFRONT_NOTIFICATION_CAPACITY` - Notification channel capacity (default: 64)
//! - `STOREFRONT_GUARD_TIMEOUT_MS` - How long the admin guard may stay pending (default: 3000)
//! - `STOREFRONT_SESSION_FILE` - Persist the session as JSON at this path (default: memory only)
//! - `STOREFRONT_ADMIN_EMAIL` - Seed administrator email
//! - `STOREFRONT_ADMIN_PASSWORD_HASH` - Seed administrator argon2 PHC hash
//! - `SENTRY_DSN` - Sentry error tracking DSN
//!
//! The two admin variables must be set together.

use std::path::PathBuf;
use std::time::Duration;

use argon2::password_hash::PasswordHash;
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

use clinicshop_core::Email;

const DEFAULT_NOTIFICATION_TTL_MS: u64 = 5_000;
const DEFAULT_NOTIFICATION_CAPACITY: usize = 64;
const DEFAULT_GUARD_TIMEOUT_MS: u64 = 3_000;

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

/// Storefront shell configuration.
#[derive(Debug, Clone)]
pub struct ShellConfig {
    /// How long a notification stays in the active set
    pub notification_ttl: Duration,
    /// Buffered events per notification subscriber
    pub notification_capacity: usize,
    /// Upper bound on the admin guard's pending phase and on session restore
    pub guard_timeout: Duration,
    /// JSON file backing the session; `None` keeps it in memory
    pub session_file: Option<PathBuf>,
    /// Administrator account created at startup
    pub admin_seed: Option<AdminSeed>,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
}

/// Seed administrator account.
///
/// Implements `Debug` manually to redact the password hash.
#[derive(Clone)]
pub struct AdminSeed {
    pub email: Email,
    /// Argon2 PHC string
    pub password_hash: SecretString,
}

impl std::fmt::Debug for AdminSeed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminSeed")
            .field("email", &self.email)
            .field("password_hash", &"[REDACTED]")
            .finish()
    }
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            notification_ttl: Duration::from_millis(DEFAULT_NOTIFICATION_TTL_MS),
            notification_capacity: DEFAULT_NOTIFICATION_CAPACITY,
            guard_timeout: Duration::from_millis(DEFAULT_GUARD_TIMEOUT_MS),
            session_file: None,
            admin_seed: None,
            sentry_dsn: None,
        }
    }
}

impl ShellConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is malformed, if only one of the
    /// admin seed variables is set, or if the seed hash is not a valid PHC string.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// See [`ShellConfig::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let notification_ttl = Duration::from_millis(get_parsed_or_default(
            &lookup,
            "STOREFRONT_NOTIFICATION_TTL_MS",
            DEFAULT_NOTIFICATION_TTL_MS,
        )?);
        let notification_capacity = get_parsed_or_default(
            &lookup,
            "STOREFRONT_NOTIFICATION_CAPACITY",
            DEFAULT_NOTIFICATION_CAPACITY,
        )?;
        if notification_capacity == 0 {
            return Err(ConfigError::InvalidEnvVar(
                "STOREFRONT_NOTIFICATION_CAPACITY".to_string(),
                "must be greater than zero".to_string(),
            ));
        }
        let guard_timeout = Duration::from_millis(get_parsed_or_default(
            &lookup,
            "STOREFRONT_GUARD_TIMEOUT_MS",
            DEFAULT_GUARD_TIMEOUT_MS,
        )?);
        let session_file = lookup("STOREFRONT_SESSION_FILE")
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from);
        let admin_seed = AdminSeed::from_lookup(&lookup)?;
        let sentry_dsn = lookup("SENTRY_DSN");

        Ok(Self {
            notification_ttl,
            notification_capacity,
            guard_timeout,
            session_file,
            admin_seed,
            sentry_dsn,
        })
    }
}

impl AdminSeed {
    fn from_lookup(lookup: &impl Fn(&str) -> Option<String>) -> Result<Option<Self>, ConfigError> {
        let email = lookup("STOREFRONT_ADMIN_EMAIL");
        let hash = lookup("STOREFRONT_ADMIN_PASSWORD_HASH");

        match (email, hash) {
            (None, None) => Ok(None),
            (Some(_), None) => Err(ConfigError::MissingEnvVar(
                "STOREFRONT_ADMIN_PASSWORD_HASH".to_string(),
            )),
            (None, Some(_)) => Err(ConfigError::MissingEnvVar(
                "STOREFRONT_ADMIN_EMAIL".to_string(),
            )),
            (Some(email), Some(hash)) => {
                let email = Email::parse(&email).map_err(|e| {
                    ConfigError::InvalidEnvVar("STOREFRONT_ADMIN_EMAIL".to_string(), e.to_string())
                })?;
                let password_hash = SecretString::from(hash);
                validate_password_hash(&password_hash, "STOREFRONT_ADMIN_PASSWORD_HASH")?;
                Ok(Some(Self {
                    email,
                    password_hash,
                }))
            }
        }
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Parse an optional variable, falling back to `default` when unset.
fn get_parsed_or_default<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    lookup(key).map_or(Ok(default), |raw| {
        raw.trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    })
}

/// Reject anything that is not an argon2 PHC hash, in particular a plaintext password.
fn validate_password_hash(hash: &SecretString, var_name: &str) -> Result<(), ConfigError> {
    let parsed = PasswordHash::new(hash.expose_secret()).map_err(|_| {
        ConfigError::InsecureSecret(
            var_name.to_string(),
            "must be an argon2 PHC string, not a plaintext password".to_string(),
        )
    })?;

    if !parsed.algorithm.as_str().starts_with("argon2") {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!("unsupported hash algorithm '{}'", parsed.algorithm),
        ));
    }

    Ok(())
}
