//! Directory state fingerprints.
//!
//! A fingerprint digests the `(name, size, mtime)` of a directory's
//! immediate children, so it changes whenever the directory's listing
//! would. It doubles as the HTTP `ETag` and as the suffix of listing cache
//! keys, which makes stale listings unreachable without an explicit
//! invalidation graph.

use std::fs::{self, Metadata};
use std::io;
use std::path::PathBuf;
use std::time::UNIX_EPOCH;

use sha2::{Digest, Sha256};
use tracing::warn;

use crate::error::Result;
use crate::vfs::resolver::{normalize_virtual, PathResolver};
use crate::vfs::roots::root_name;

/// Fingerprint of a directory that does not exist. Callers treat it as
/// "always refetch".
pub const EMPTY_FINGERPRINT: &str = "";

/// Digest bytes kept from the hash (128 bits).
const DIGEST_LEN: usize = 16;

#[derive(Debug, Clone)]
pub struct Fingerprinter {
    resolver: PathResolver,
}

impl Fingerprinter {
    pub fn new(resolver: PathResolver) -> Self {
        Self { resolver }
    }

    /// Digest of the directory at `virtual_path`.
    ///
    /// Children are folded in name order as `name:size:mtime_nanos;`. For
    /// the namespace root the mount roots' own metadata is folded in as
    /// well (sorted by path), so mount changes also change the root's
    /// fingerprint. A missing directory yields [`EMPTY_FINGERPRINT`].
    pub fn fingerprint(&self, virtual_path: &str) -> Result<String> {
        let physical = self.resolver.to_physical(virtual_path)?;

        let reader = match fs::read_dir(&physical) {
            Ok(reader) => reader,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Ok(EMPTY_FINGERPRINT.to_string())
            }
            Err(err) => return Err(err.into()),
        };

        let mut children: Vec<(String, Metadata)> = Vec::new();
        for entry in reader {
            let entry = entry?;
            match entry.metadata() {
                Ok(meta) => children.push((entry.file_name().to_string_lossy().into_owned(), meta)),
                Err(err) => warn!(
                    entry = %entry.path().display(),
                    error = %err,
                    "Skipping entry in directory fingerprint"
                ),
            }
        }
        children.sort_by(|a, b| a.0.cmp(&b.0));

        let mut hasher = Sha256::new();
        for (name, meta) in &children {
            fold(&mut hasher, "", name, meta);
        }

        if normalize_virtual(virtual_path) == "/" {
            let mut mounts: Vec<&PathBuf> = self.resolver.roots().mount_roots().iter().collect();
            mounts.sort();

            for mount in mounts {
                match fs::metadata(mount) {
                    Ok(meta) => {
                        let name = root_name(mount).unwrap_or_default();
                        fold(&mut hasher, "mount_", name, &meta);
                    }
                    Err(err) if err.kind() == io::ErrorKind::NotFound => {}
                    Err(err) => warn!(
                        mount = %mount.display(),
                        error = %err,
                        "Cannot stat mount root for fingerprint"
                    ),
                }
            }
        }

        Ok(hex::encode(&hasher.finalize()[..DIGEST_LEN]))
    }
}

fn fold(hasher: &mut Sha256, tag: &str, name: &str, meta: &Metadata) {
    hasher.update(format!("{tag}{name}:{}:{};", meta.len(), mtime_nanos(meta)).as_bytes());
}

/// Modification time as signed nanoseconds since the Unix epoch; 0 when the
/// platform cannot report it.
pub(crate) fn mtime_nanos(meta: &Metadata) -> i128 {
    match meta.modified() {
        Ok(time) => match time.duration_since(UNIX_EPOCH) {
            Ok(after) => after.as_nanos() as i128,
            Err(before) => -(before.duration().as_nanos() as i128),
        },
        Err(_) => 0,
    }
}
