//! Movement simulation for test clients.

pub mod paths;

pub use paths::{CircularPath, MovementPath};
