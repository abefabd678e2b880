//! geosync CLI - Command line tools for the position sync system.
//!
//! This crate provides the CLI binaries:
//! - generate_token: signed token generator
//! - send_location: single client simulator on a circular path
//! - watch_locations: prints every position broadcast

pub mod auth;
pub mod sim;

pub use auth::generate_token;
