//! Shared library surface for the geosync server and its tests.

pub mod api;
pub mod config;
pub mod loops;
pub mod persistence;
pub mod server;
pub mod state;
