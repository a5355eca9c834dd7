//! Subcommand implementations.

pub mod admin;
pub mod render;
pub mod routes;

use thiserror::Error;

use clinicshop_core::EmailError;
use clinicshop_storefront::ShellError;
use clinicshop_storefront::config::ConfigError;
use clinicshop_storefront::routes::RouteError;
use clinicshop_storefront::session::AuthError;

/// Errors surfaced by CLI commands.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("route table error: {0}")]
    Route(#[from] RouteError),

    #[error("{0}")]
    Shell(#[from] ShellError),

    #[error("login failed: {0}")]
    Auth(#[from] AuthError),

    #[error("invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("could not write output: {0}")]
    Io(#[from] std::io::Error),
}
