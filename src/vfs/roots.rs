//! Namespace roots.
//!
//! The resolver and fingerprinter only ever see this narrow, read-only view
//! of the configuration.

use std::path::{Path, PathBuf};

/// Read-only capability describing the configured roots.
///
/// Roots are fixed at startup; implementations must return the same values
/// for the lifetime of the process.
pub trait RootsProvider: Send + Sync {
    /// Physical directory exposed as virtual `/`.
    fn storage_root(&self) -> &Path;

    /// Directories each exposed as `/<basename>`.
    fn mount_roots(&self) -> &[PathBuf];

    /// Well-known directories each exposed as `/<basename>`. They take
    /// precedence over mounts with the same basename.
    fn specific_roots(&self) -> &[PathBuf];

    /// Largest file, in bytes, the server will write.
    fn max_file_size(&self) -> u64;
}

/// Plain-data [`RootsProvider`], handy for tests and embedding.
#[derive(Debug, Clone, Default)]
pub struct Roots {
    pub storage: PathBuf,
    pub mounts: Vec<PathBuf>,
    pub specifics: Vec<PathBuf>,
    pub max_file_size: u64,
}

impl Roots {
    pub fn new(storage: impl Into<PathBuf>) -> Self {
        Self {
            storage: storage.into(),
            mounts: Vec::new(),
            specifics: Vec::new(),
            max_file_size: u64::MAX,
        }
    }

    pub fn with_mount(mut self, mount: impl Into<PathBuf>) -> Self {
        self.mounts.push(mount.into());
        self
    }

    pub fn with_specific(mut self, specific: impl Into<PathBuf>) -> Self {
        self.specifics.push(specific.into());
        self
    }
}

impl RootsProvider for Roots {
    fn storage_root(&self) -> &Path {
        &self.storage
    }

    fn mount_roots(&self) -> &[PathBuf] {
        &self.mounts
    }

    fn specific_roots(&self) -> &[PathBuf] {
        &self.specifics
    }

    fn max_file_size(&self) -> u64 {
        self.max_file_size
    }
}

/// The name a root is exposed under: its final path component.
pub fn root_name(root: &Path) -> Option<&str> {
    root.file_name().and_then(|name| name.to_str())
}
