//! Clinic Storefront Core - Shared types library.
//!
//! This crate provides common types used across all shell components:
//! - `storefront` - Navigation, access control, and provider state
//! - `cli` - Command-line tools for inspecting routes and rendering frames
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no timers, no channels.
//! This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Session, credential, notification, and location types

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
