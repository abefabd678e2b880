//! Background loops for continuous processing.

pub mod broadcast_loop;

pub use broadcast_loop::{broadcast_once, run_broadcast_loop, CycleReport};
