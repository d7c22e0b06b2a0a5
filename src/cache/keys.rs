//! Cache key namespaces.
//!
//! The cache treats keys as opaque strings; these helpers keep the
//! `list:` / `content:` / `search:` conventions in one place so that
//! invalidation prefixes always line up with the keys that were stored.

use sha2::{Digest, Sha256};

pub const LIST_PREFIX: &str = "list:";
pub const CONTENT_PREFIX: &str = "content:";
pub const SEARCH_PREFIX: &str = "search:";

/// Listing of `dir` at directory state `fingerprint`.
pub fn listing_key(dir: &str, fingerprint: &str) -> String {
    format!("{}{}", listing_prefix(dir), fingerprint)
}

/// Prefix matching every cached listing of `dir`, whatever its state.
pub fn listing_prefix(dir: &str) -> String {
    format!("{LIST_PREFIX}{dir}@")
}

/// Prefix matching cached listings of `dir` and of everything below it.
pub fn listing_tree_prefix(dir: &str) -> String {
    format!("{LIST_PREFIX}{dir}")
}

/// Text content of `path` as of modification time `mtime_secs`.
pub fn content_key(path: &str, mtime_secs: i64) -> String {
    format!("{}{}", content_prefix(path), mtime_secs)
}

pub fn content_prefix(path: &str) -> String {
    format!("{CONTENT_PREFIX}{path}@")
}

/// Prefix matching cached contents of `path` and of everything below it.
pub fn content_tree_prefix(path: &str) -> String {
    format!("{CONTENT_PREFIX}{path}")
}

/// Digest key for a search query. Every field that changes the result set
/// takes part in the hash.
pub fn search_key(
    term: &str,
    path: &str,
    scope: &str,
    use_regex: bool,
    case_sensitive: bool,
    max_results: usize,
) -> String {
    let mut hasher = Sha256::new();
    hasher.update(
        format!("{term}\0{path}\0{scope}\0{use_regex}\0{case_sensitive}\0{max_results}")
            .as_bytes(),
    );
    format!("{SEARCH_PREFIX}{}", hex::encode(&hasher.finalize()[..16]))
}
