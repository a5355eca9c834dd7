//! Clinic storefront shell.
//!
//! Navigation and access control for the storefront single-page app:
//!
//! - [`routes`] / [`router`]: route table and history-backed router
//! - [`layout`]: public chrome vs. bare admin content
//! - [`guard`]: the admin route guard
//! - [`session`] / [`notify`]: the two process-wide providers
//! - [`pages`]: page contracts and the bundled pages
//! - [`app`]: the composition root producing rendered frames

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod app;
pub mod config;
pub mod error;
pub mod guard;
pub mod layout;
pub mod notify;
pub mod pages;
pub mod router;
pub mod routes;
pub mod session;
pub mod view;

pub use app::{App, Frame};
pub use config::ShellConfig;
pub use error::{Result, ShellError};
