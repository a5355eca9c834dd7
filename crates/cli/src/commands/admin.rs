//! `clinicshop admin ...`
//!
//! # Environment Variables
//!
//! The printed hash goes into `STOREFRONT_ADMIN_PASSWORD_HASH`, alongside
//! `STOREFRONT_ADMIN_EMAIL`.

use std::io::Write;

use clinicshop_storefront::session::{self, AuthError, MIN_PASSWORD_LENGTH};

use super::CommandError;

/// Hash `password` with argon2 and print the PHC string.
pub fn hash_password(password: &str) -> Result<(), CommandError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        ))
        .into());
    }
    let hash = session::hash_password(password)?;
    writeln!(std::io::stdout().lock(), "{hash}")?;
    Ok(())
}
