//! Background Tasks Module
//!
//! Tasks that run for the lifetime of the server.
//!
//! # Tasks
//! - Cache sweep: evicts expired cache entries on a fixed period

mod sweep;

pub use sweep::{spawn_sweep_task, SweepHandle};
