//! Name search below a directory.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use crossbeam_channel::unbounded;
use regex::{Regex, RegexBuilder};
use tracing::{debug, warn};

use crate::error::{Result, VfsError};
use crate::files::listing::describe_entry;
use crate::models::FileInfo;
use crate::vfs::PathResolver;
use crate::worker::WorkerPool;

// == Name Matcher ==
/// Predicate over entry names.
#[derive(Debug, Clone)]
pub enum NameMatcher {
    /// Plain substring; `term` is pre-lowercased when case-insensitive
    Substring { term: String, case_sensitive: bool },
    Pattern(Regex),
}

impl NameMatcher {
    /// An invalid regular expression is a `BadRequest`.
    pub fn new(term: &str, use_regex: bool, case_sensitive: bool) -> Result<Self> {
        if use_regex {
            let regex = RegexBuilder::new(term)
                .case_insensitive(!case_sensitive)
                .build()
                .map_err(|err| VfsError::BadRequest(format!("Invalid regular expression: {err}")))?;
            return Ok(NameMatcher::Pattern(regex));
        }

        let term = if case_sensitive {
            term.to_string()
        } else {
            term.to_lowercase()
        };
        Ok(NameMatcher::Substring {
            term,
            case_sensitive,
        })
    }

    pub fn matches(&self, name: &str) -> bool {
        match self {
            NameMatcher::Pattern(regex) => regex.is_match(name),
            NameMatcher::Substring {
                term,
                case_sensitive: true,
            } => name.contains(term.as_str()),
            NameMatcher::Substring { term, .. } => name.to_lowercase().contains(term.as_str()),
        }
    }
}

// == Current Scope ==
/// Matches the immediate children of `virtual_dir`. The first `limit`
/// matches by name are described, one pooled task per entry.
pub fn search_current(
    resolver: &PathResolver,
    pool: &WorkerPool,
    virtual_dir: &str,
    matcher: Arc<NameMatcher>,
    limit: usize,
) -> Result<Vec<FileInfo>> {
    let physical = resolver.to_physical(virtual_dir)?;
    let reader = fs::read_dir(&physical).map_err(|err| VfsError::from_io(err, virtual_dir))?;

    let mut matched: Vec<_> = reader
        .flatten()
        .filter(|entry| matcher.matches(&entry.file_name().to_string_lossy()))
        .collect();
    matched.sort_by_key(|entry| entry.file_name());
    matched.truncate(limit);

    let (tx, rx) = unbounded();
    for entry in matched {
        let tx = tx.clone();
        let resolver = resolver.clone();
        pool.submit(move || {
            let _ = tx.send(describe_entry(&resolver, &entry));
        });
    }
    drop(tx);

    let mut results: Vec<FileInfo> = rx.iter().collect();
    results.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(results)
}

// == Recursive Scope ==
/// Depth-first walk of the subtree below `virtual_dir` (excluding the
/// directory itself). Symlinked directories are not followed and
/// unreadable directories are skipped. Stops at `limit` results.
pub fn search_recursive(
    resolver: &PathResolver,
    virtual_dir: &str,
    matcher: &NameMatcher,
    limit: usize,
) -> Result<Vec<FileInfo>> {
    let physical = resolver.to_physical(virtual_dir)?;
    if !physical.is_dir() {
        return Err(VfsError::NotFound(virtual_dir.to_string()));
    }

    let mut results = Vec::new();
    let mut pending: Vec<PathBuf> = vec![physical];

    while let Some(dir) = pending.pop() {
        let reader = match fs::read_dir(&dir) {
            Ok(reader) => reader,
            Err(err) => {
                warn!(dir = %dir.display(), error = %err, "Skipping unreadable directory");
                continue;
            }
        };

        let mut entries: Vec<_> = reader.flatten().collect();
        entries.sort_by_key(|entry| entry.file_name());

        let mut subdirs = Vec::new();
        for entry in entries {
            if matcher.matches(&entry.file_name().to_string_lossy()) {
                results.push(describe_entry(resolver, &entry));
                if results.len() >= limit {
                    debug!(dir = %virtual_dir, limit, "Search hit its result limit");
                    return Ok(results);
                }
            }
            if entry.file_type().is_ok_and(|t| t.is_dir()) {
                subdirs.push(entry.path());
            }
        }
        // Reversed so the walk pops them in name order.
        pending.extend(subdirs.into_iter().rev());
    }

    Ok(results)
}
