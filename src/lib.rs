//! vfs_server - A virtual filesystem served over HTTP
//!
//! Exposes a storage root plus mount and specific directories through one
//! sandboxed virtual namespace, backed by a bounded TTL/LRU cache, a worker
//! pool for blocking I/O and directory fingerprints used as ETags.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod files;
pub mod models;
pub mod tasks;
pub mod vfs;
pub mod worker;

pub use api::{create_router, AppState};
pub use config::Config;
pub use error::{Result, VfsError};
pub use tasks::{spawn_sweep_task, SweepHandle};
