//! Virtual Filesystem Module
//!
//! Maps the externally visible namespace onto the configured roots and
//! derives directory fingerprints used as ETags and listing cache keys.

mod fingerprint;
mod resolver;
mod roots;

pub use fingerprint::{Fingerprinter, EMPTY_FINGERPRINT};
pub(crate) use fingerprint::mtime_nanos;
pub use resolver::{normalize_virtual, virtual_parent, PathResolver};
pub use roots::{root_name, Roots, RootsProvider};
