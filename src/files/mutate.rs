//! Directory creation, moves and deletes.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crossbeam_channel::unbounded;
use tracing::{debug, warn};

use crate::error::{Result, VfsError};
use crate::vfs::PathResolver;
use crate::worker::{Dispatch, WorkerPool};

/// Refuses operations that would remove or replace a configured root.
pub fn ensure_not_root(resolver: &PathResolver, physical: &Path, virtual_path: &str) -> Result<()> {
    let roots = resolver.roots();
    let is_root = std::iter::once(roots.storage_root())
        .chain(roots.mount_roots().iter().map(PathBuf::as_path))
        .chain(roots.specific_roots().iter().map(PathBuf::as_path))
        .any(|root| root == physical);

    if is_root {
        return Err(VfsError::InvalidPath(format!(
            "{virtual_path} is a root directory"
        )));
    }
    Ok(())
}

/// Creates `physical` and any missing ancestors. An existing directory is
/// not an error; an existing file is.
pub fn create_directory(physical: &Path, virtual_path: &str) -> Result<()> {
    if physical.exists() && !physical.is_dir() {
        return Err(VfsError::AlreadyExists(virtual_path.to_string()));
    }
    fs::create_dir_all(physical).map_err(|err| VfsError::from_io(err, virtual_path))?;
    debug!(path = %virtual_path, "Created directory");
    Ok(())
}

/// Renames `source` onto `target`. The target's parent must exist.
pub fn move_path(source: &Path, source_virtual: &str, target: &Path, target_virtual: &str) -> Result<()> {
    if fs::symlink_metadata(source).is_err() {
        return Err(VfsError::NotFound(source_virtual.to_string()));
    }
    match target.parent() {
        Some(parent) if parent.is_dir() => {}
        _ => {
            return Err(VfsError::NotFound(format!(
                "target directory of {target_virtual}"
            )))
        }
    }
    if target.starts_with(source) {
        return Err(VfsError::BadRequest(format!(
            "cannot move {source_virtual} into itself"
        )));
    }

    fs::rename(source, target).map_err(|err| VfsError::from_io(err, source_virtual))?;
    debug!(from = %source_virtual, to = %target_virtual, "Moved entry");
    Ok(())
}

/// Result of deleting one path of a batch.
#[derive(Debug)]
pub struct DeleteOutcome {
    pub path: String,
    pub result: Result<()>,
}

/// Deletes every path in parallel on the pool and waits for all of them.
///
/// Paths are resolved with [`PathResolver::build_safe_path`]; roots are
/// never deleted. Outcomes are returned in input order.
pub fn delete_many(resolver: &PathResolver, pool: &WorkerPool, paths: &[String]) -> Vec<DeleteOutcome> {
    let (tx, rx) = unbounded();

    for (index, path) in paths.iter().enumerate() {
        let tx = tx.clone();
        let resolver = resolver.clone();
        let path = path.clone();
        let dispatch = pool.submit(move || {
            let result = delete_one(&resolver, &path);
            let _ = tx.send((index, DeleteOutcome { path, result }));
        });
        if dispatch == Dispatch::Rejected {
            warn!(path = %paths[index], "Delete not run, worker pool closed");
        }
    }
    drop(tx);

    let mut outcomes: Vec<Option<DeleteOutcome>> = paths.iter().map(|_| None).collect();
    for (index, outcome) in rx.iter() {
        outcomes[index] = Some(outcome);
    }

    outcomes
        .into_iter()
        .zip(paths)
        .map(|(outcome, path)| {
            outcome.unwrap_or_else(|| DeleteOutcome {
                path: path.clone(),
                result: Err(VfsError::TaskFailed("worker pool closed".to_string())),
            })
        })
        .collect()
}

fn delete_one(resolver: &PathResolver, virtual_path: &str) -> Result<()> {
    let physical = resolver.build_safe_path(virtual_path)?;
    ensure_not_root(resolver, &physical, virtual_path)?;

    let meta = fs::symlink_metadata(&physical).map_err(|err| VfsError::from_io(err, virtual_path))?;
    let removed = if meta.is_dir() {
        fs::remove_dir_all(&physical)
    } else {
        fs::remove_file(&physical)
    };

    match removed {
        Ok(()) => {
            debug!(path = %virtual_path, "Deleted entry");
            Ok(())
        }
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(VfsError::from_io(err, virtual_path)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vfs::Roots;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn setup() -> (TempDir, PathResolver) {
        let dir = TempDir::new().unwrap();
        let resolver = PathResolver::new(Arc::new(Roots::new(dir.path())));
        (dir, resolver)
    }

    #[test]
    fn test_create_directory_is_recursive_and_idempotent() {
        let (dir, _) = setup();
        let target = dir.path().join("a/b/c");
        create_directory(&target, "/a/b/c").unwrap();
        assert!(target.is_dir());
        create_directory(&target, "/a/b/c").unwrap();

        fs::write(dir.path().join("file"), "").unwrap();
        assert!(matches!(
            create_directory(&dir.path().join("file"), "/file"),
            Err(VfsError::AlreadyExists(_))
        ));
    }

    #[test]
    fn test_move_requires_existing_target_parent() {
        let (dir, _) = setup();
        let source = dir.path().join("a.txt");
        fs::write(&source, "x").unwrap();

        assert!(matches!(
            move_path(&source, "/a.txt", &dir.path().join("no/a.txt"), "/no/a.txt"),
            Err(VfsError::NotFound(_))
        ));

        fs::create_dir(dir.path().join("dst")).unwrap();
        move_path(&source, "/a.txt", &dir.path().join("dst/b.txt"), "/dst/b.txt").unwrap();
        assert!(!source.exists());
        assert_eq!(fs::read_to_string(dir.path().join("dst/b.txt")).unwrap(), "x");
    }

    #[test]
    fn test_move_missing_source_and_into_itself() {
        let (dir, _) = setup();
        assert!(matches!(
            move_path(&dir.path().join("nope"), "/nope", &dir.path().join("x"), "/x"),
            Err(VfsError::NotFound(_))
        ));

        fs::create_dir(dir.path().join("d")).unwrap();
        assert!(matches!(
            move_path(&dir.path().join("d"), "/d", &dir.path().join("d/inner"), "/d/inner"),
            Err(VfsError::BadRequest(_))
        ));
    }

    #[test]
    fn test_delete_many_reports_each_path() {
        let (dir, resolver) = setup();
        fs::write(dir.path().join("a.txt"), "").unwrap();
        fs::create_dir_all(dir.path().join("tree/sub")).unwrap();
        fs::write(dir.path().join("tree/sub/x"), "").unwrap();
        let pool = WorkerPool::with_workers(2);

        let paths: Vec<String> = ["/a.txt", "/tree", "/missing", "/../etc", "/"]
            .iter()
            .map(|p| p.to_string())
            .collect();
        let outcomes = delete_many(&resolver, &pool, &paths);

        assert_eq!(outcomes.len(), 5);
        assert!(outcomes[0].result.is_ok());
        assert!(outcomes[1].result.is_ok());
        assert!(matches!(outcomes[2].result, Err(VfsError::NotFound(_))));
        assert!(matches!(outcomes[3].result, Err(VfsError::InvalidPath(_))));
        assert!(matches!(outcomes[4].result, Err(VfsError::InvalidPath(_))));
        assert_eq!(outcomes[3].path, "/../etc");

        assert!(!dir.path().join("a.txt").exists());
        assert!(!dir.path().join("tree").exists());
        assert!(dir.path().exists());
    }

    #[test]
    fn test_delete_many_on_closed_pool_fails_every_path() {
        let (dir, resolver) = setup();
        fs::write(dir.path().join("keep"), "").unwrap();
        let pool = WorkerPool::with_workers(1);
        pool.close();

        let outcomes = delete_many(&resolver, &pool, &["/keep".to_string()]);
        assert!(matches!(outcomes[0].result, Err(VfsError::TaskFailed(_))));
        assert!(dir.path().join("keep").exists());
    }
}
