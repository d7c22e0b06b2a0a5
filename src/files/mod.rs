//! Blocking filesystem operations behind the HTTP handlers.
//!
//! Everything here does synchronous I/O. Single-shot operations are meant
//! to run as one pooled task; listing, current-scope search and batch
//! delete fan out one task per entry onto the [`WorkerPool`] and must be
//! called from a thread that may block (never from a pool worker).
//!
//! [`WorkerPool`]: crate::worker::WorkerPool

mod content;
mod listing;
mod mutate;
mod search;

pub use content::{create_file, mtime_secs, read_text, write_text, MAX_READ_SIZE};
pub use listing::{describe_entry, list_directory, mount_entries};
pub use mutate::{create_directory, delete_many, ensure_not_root, move_path, DeleteOutcome};
pub use search::{search_current, search_recursive, NameMatcher};
