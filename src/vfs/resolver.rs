//! Virtual ⇄ physical path resolution.
//!
//! The virtual namespace is rooted at `/` (the storage root). Its first
//! segment may instead name a specific root or a mount root, which then
//! owns the rest of the path. Every accepted virtual path resolves to a
//! descendant of (or equal to) one of the configured roots.

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use tracing::warn;

use crate::error::{Result, VfsError};
use crate::vfs::roots::{root_name, RootsProvider};

// == Path Resolver ==
#[derive(Clone)]
pub struct PathResolver {
    roots: Arc<dyn RootsProvider>,
}

impl PathResolver {
    pub fn new(roots: Arc<dyn RootsProvider>) -> Self {
        Self { roots }
    }

    pub fn roots(&self) -> &dyn RootsProvider {
        self.roots.as_ref()
    }

    // == To Physical ==
    /// Maps a virtual path onto the filesystem.
    ///
    /// `""` and `"/"` are the storage root. Otherwise the first segment is
    /// matched against specific roots, then mount roots; unmatched paths
    /// fall back to the storage root. `.` and empty segments are dropped and
    /// `..` is resolved lexically, but a `..` that would climb above the
    /// selected root is rejected with [`VfsError::InvalidPath`].
    pub fn to_physical(&self, virtual_path: &str) -> Result<PathBuf> {
        if virtual_path.is_empty() || virtual_path == "/" {
            return Ok(self.roots.storage_root().to_path_buf());
        }
        if virtual_path.contains('\0') {
            return Err(VfsError::InvalidPath(virtual_path.replace('\0', "\\0")));
        }

        let trimmed = virtual_path.trim_start_matches('/');
        let (first, rest) = trimmed.split_once('/').unwrap_or((trimmed, ""));

        match self.named_root(first) {
            Some(root) => join_within(root, rest, virtual_path),
            None => join_within(self.roots.storage_root(), trimmed, virtual_path),
        }
    }

    // == To Virtual ==
    /// Best-effort inverse of [`to_physical`](Self::to_physical).
    ///
    /// Paths under the storage root map to `/<rel>`; paths under a mount or
    /// specific root map to `/<name>[/<rel>]`. Anything else comes back
    /// unchanged.
    pub fn to_virtual(&self, physical: &Path) -> String {
        if let Ok(rel) = physical.strip_prefix(self.roots.storage_root()) {
            return format!("/{}", slash_join(rel));
        }

        let named = self
            .roots
            .mount_roots()
            .iter()
            .chain(self.roots.specific_roots());
        for root in named {
            let (Ok(rel), Some(name)) = (physical.strip_prefix(root), root_name(root)) else {
                continue;
            };
            let rel = slash_join(rel);
            return if rel.is_empty() {
                format!("/{name}")
            } else {
                format!("/{name}/{rel}")
            };
        }

        physical.to_string_lossy().into_owned()
    }

    // == Build Safe Path ==
    /// Strict resolution used before touching the filesystem on a client's
    /// behalf.
    ///
    /// Rejects any `..` segment outright, resolves via
    /// [`to_physical`](Self::to_physical), then requires the absolute result
    /// to sit under one of the configured roots. Anything that cannot be
    /// proven safe is rejected.
    pub fn build_safe_path(&self, virtual_path: &str) -> Result<PathBuf> {
        if virtual_path
            .split(['/', '\\'])
            .any(|segment| segment == "..")
        {
            warn!(path = %virtual_path, "Rejected path containing '..'");
            return Err(VfsError::InvalidPath(format!(
                "{virtual_path} contains a '..' segment"
            )));
        }

        let physical = self.to_physical(virtual_path)?;
        let absolute = std::path::absolute(&physical).map_err(|err| {
            VfsError::InvalidPath(format!("{virtual_path}: cannot make absolute: {err}"))
        })?;

        let allowed = std::iter::once(self.roots.storage_root())
            .chain(self.roots.mount_roots().iter().map(PathBuf::as_path))
            .chain(self.roots.specific_roots().iter().map(PathBuf::as_path));

        for root in allowed {
            match std::path::absolute(root) {
                Ok(root) if absolute.starts_with(&root) => return Ok(physical),
                Ok(_) => {}
                Err(err) => {
                    warn!(root = %root.display(), error = %err, "Cannot absolutize configured root")
                }
            }
        }

        warn!(path = %virtual_path, resolved = %absolute.display(), "Path outside every root");
        Err(VfsError::InvalidPath(format!(
            "{virtual_path} is not inside an allowed directory"
        )))
    }

    /// Specific roots first, then mounts.
    fn named_root(&self, name: &str) -> Option<&Path> {
        if name.is_empty() {
            return None;
        }
        self.roots
            .specific_roots()
            .iter()
            .chain(self.roots.mount_roots())
            .find(|root| root_name(root) == Some(name))
            .map(PathBuf::as_path)
    }
}

impl std::fmt::Debug for PathResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PathResolver")
            .field("storage", &self.roots.storage_root())
            .field("mounts", &self.roots.mount_roots())
            .field("specifics", &self.roots.specific_roots())
            .finish()
    }
}

/// Joins `rel` (slash separated) onto `root`, refusing to climb above it.
fn join_within(root: &Path, rel: &str, original: &str) -> Result<PathBuf> {
    let mut kept: Vec<&str> = Vec::new();

    for segment in rel.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                if kept.pop().is_none() {
                    return Err(VfsError::InvalidPath(format!(
                        "{original} escapes its root"
                    )));
                }
            }
            name => {
                // A segment must stay a single plain component on every
                // platform (no drive prefixes or embedded separators).
                let mut components = Path::new(name).components();
                match (components.next(), components.next()) {
                    (Some(Component::Normal(_)), None) => kept.push(name),
                    _ => {
                        return Err(VfsError::InvalidPath(format!(
                            "{original} has an invalid segment {name:?}"
                        )))
                    }
                }
            }
        }
    }

    let mut path = root.to_path_buf();
    path.extend(kept);
    Ok(path)
}

fn slash_join(rel: &Path) -> String {
    rel.components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Canonical spelling of a virtual path for cache keys: leading slash, no
/// empty or `.` segments, no trailing slash.
pub fn normalize_virtual(path: &str) -> String {
    let segments: Vec<&str> = path
        .split('/')
        .filter(|segment| !segment.is_empty() && *segment != ".")
        .collect();
    format!("/{}", segments.join("/"))
}

/// Virtual parent directory; the root is its own parent.
pub fn virtual_parent(path: &str) -> String {
    let normalized = normalize_virtual(path);
    match normalized.rfind('/') {
        Some(0) | None => "/".to_string(),
        Some(index) => normalized[..index].to_string(),
    }
}
