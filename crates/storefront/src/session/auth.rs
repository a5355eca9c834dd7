//! Credential checking for admin login.
//!
//! The session store only knows the [`Authenticator`] trait. The bundled
//! [`PasswordAuthenticator`] verifies argon2 hashes held in memory, seeded
//! from configuration or provisioned once through the setup page.

use std::collections::HashMap;
use std::sync::RwLock;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use tracing::{info, instrument};

use clinicshop_core::{Credentials, Email, EmailError, Identity};

/// Minimum password length.
pub const MIN_PASSWORD_LENGTH: usize = 12;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    /// Wrong password or unknown account.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Password too weak or invalid.
    #[error("password validation failed: {0}")]
    WeakPassword(String),

    /// An administrator already exists, so setup is closed.
    #[error("an administrator has already been provisioned")]
    AlreadyProvisioned,

    /// A logout or newer login happened while this login was in flight.
    #[error("login superseded by a newer session change")]
    Superseded,

    /// The authentication collaborator could not answer.
    #[error("authentication unavailable: {0}")]
    Unavailable(String),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,
}

impl AuthError {
    /// Message safe to show on the login page.
    #[must_use]
    pub fn user_message(&self) -> &str {
        match self {
            Self::InvalidEmail(_) | Self::InvalidCredentials => "Invalid email or password",
            Self::WeakPassword(msg) => msg,
            Self::AlreadyProvisioned => "Setup has already been completed",
            Self::Superseded => "Login was cancelled",
            Self::Unavailable(_) | Self::PasswordHash => "Login is temporarily unavailable",
        }
    }
}

/// External authentication collaborator.
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Check credentials and issue an identity on success.
    async fn authenticate(&self, credentials: &Credentials) -> Result<Identity, AuthError>;
}

/// In-memory argon2 password authenticator.
#[derive(Default)]
pub struct PasswordAuthenticator {
    accounts: RwLock<HashMap<Email, SecretString>>,
}

impl PasswordAuthenticator {
    /// An authenticator with no accounts. Setup must run before anyone can log in.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an account from an existing argon2 PHC hash.
    #[must_use]
    pub fn with_account(self, email: Email, password_hash: SecretString) -> Self {
        self.write_accounts().insert(email, password_hash);
        self
    }

    /// Whether any administrator exists.
    #[must_use]
    pub fn has_admin(&self) -> bool {
        !self.read_accounts().is_empty()
    }

    /// Create the first administrator account.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::AlreadyProvisioned` once any account exists,
    /// `AuthError::InvalidEmail` / `AuthError::WeakPassword` for bad input.
    #[instrument(skip(self, password))]
    pub fn provision(&self, email: &str, password: &str) -> Result<Email, AuthError> {
        let email = Email::parse(email)?;
        validate_password(password)?;
        let hash = hash_password(password)?;

        let mut accounts = self.write_accounts();
        if !accounts.is_empty() {
            return Err(AuthError::AlreadyProvisioned);
        }
        accounts.insert(email.clone(), SecretString::from(hash));
        info!(%email, "administrator provisioned");
        Ok(email)
    }

    fn read_accounts(&self) -> std::sync::RwLockReadGuard<'_, HashMap<Email, SecretString>> {
        self.accounts
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn write_accounts(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<Email, SecretString>> {
        self.accounts
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

#[async_trait]
impl Authenticator for PasswordAuthenticator {
    async fn authenticate(&self, credentials: &Credentials) -> Result<Identity, AuthError> {
        let stored = self
            .read_accounts()
            .get(credentials.email())
            .cloned()
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(credentials.password(), stored.expose_secret())?;

        Ok(Identity::issue(credentials.email().clone()))
    }
}

/// Validate password strength.
fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Hash a password using Argon2id.
///
/// # Errors
///
/// Returns `AuthError::PasswordHash` if hashing fails.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}
