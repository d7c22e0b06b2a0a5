//! Directory listings.

use std::fs::{self, DirEntry};

use crossbeam_channel::unbounded;
use tracing::{debug, warn};

use crate::error::{Result, VfsError};
use crate::models::FileInfo;
use crate::vfs::{normalize_virtual, root_name, PathResolver};
use crate::worker::{Dispatch, WorkerPool};

/// Lists the immediate children of `virtual_dir`, sorted by name.
///
/// Each entry is stat'ed as its own pooled task; the call returns once
/// every task has reported. At the namespace root the mount roots come
/// first as `is_mount` entries.
pub fn list_directory(
    resolver: &PathResolver,
    pool: &WorkerPool,
    virtual_dir: &str,
) -> Result<Vec<FileInfo>> {
    let dir = normalize_virtual(virtual_dir);
    let physical = resolver.to_physical(&dir)?;

    let meta = fs::metadata(&physical).map_err(|err| VfsError::from_io(err, &dir))?;
    if !meta.is_dir() {
        return Err(VfsError::BadRequest(format!("{dir} is not a directory")));
    }
    let reader = fs::read_dir(&physical).map_err(|err| VfsError::from_io(err, &dir))?;

    // Every task owns a sender clone; the receiver drains once all of them
    // have run (or been dropped unrun).
    let (tx, rx) = unbounded();
    let mut submitted = 0usize;
    for entry in reader {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                warn!(dir = %dir, error = %err, "Skipping unreadable directory entry");
                continue;
            }
        };

        let tx = tx.clone();
        let resolver = resolver.clone();
        if pool.submit(move || {
            let _ = tx.send(describe_entry(&resolver, &entry));
        }) != Dispatch::Rejected
        {
            submitted += 1;
        }
    }
    drop(tx);

    let mut children: Vec<FileInfo> = rx.iter().collect();
    children.sort_by(|a, b| a.name.cmp(&b.name));
    debug!(dir = %dir, submitted, listed = children.len(), "Listed directory");

    let mut listing = if dir == "/" {
        mount_entries(resolver)
    } else {
        Vec::new()
    };
    listing.extend(children);
    Ok(listing)
}

/// Metadata for one directory entry. Symlinks and other special files are
/// reported without size or modification time.
pub fn describe_entry(resolver: &PathResolver, entry: &DirEntry) -> FileInfo {
    let name = entry.file_name().to_string_lossy().into_owned();
    let file_type = entry.file_type().ok();
    let is_dir = file_type.is_some_and(|t| t.is_dir());
    let meta = file_type
        .filter(|t| t.is_file() || t.is_dir())
        .and_then(|_| entry.metadata().ok());

    FileInfo::describe(name, resolver.to_virtual(&entry.path()), meta.as_ref(), is_dir)
}

/// Mount roots that currently exist as directories.
pub fn mount_entries(resolver: &PathResolver) -> Vec<FileInfo> {
    resolver
        .roots()
        .mount_roots()
        .iter()
        .filter_map(|mount| {
            let name = root_name(mount)?;
            match fs::metadata(mount) {
                Ok(meta) if meta.is_dir() => Some(FileInfo::mount(name, format!("/{name}"), &meta)),
                Ok(_) => None,
                Err(err) => {
                    warn!(mount = %mount.display(), error = %err, "Mount root unavailable");
                    None
                }
            }
        })
        .collect()
}
