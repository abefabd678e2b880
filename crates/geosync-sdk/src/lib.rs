//! geosync SDK - client library
//!
//! Provides a small API for publishing positions to a geosync server and
//! reading the periodic `userLocationUpdate` broadcasts.

pub mod client;

pub use client::{GeoSyncClient, LocationStream};
pub use geosync_core::{issue_token, LocationBroadcast, ServerEvent};
