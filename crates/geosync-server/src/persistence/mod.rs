//! Persistence layer for the position sync server.
//!
//! Provides SQLite-backed storage for the latest position per user.
//! The in-memory store is written through: the row is persisted first and
//! the DashMap entry is only replaced once the write succeeds.

pub mod db;
pub mod locations;

pub use db::{init_database, Database};
