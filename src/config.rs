//! Configuration Module
//!
//! Handles loading and managing server configuration from environment variables.

use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::cache::{DEFAULT_MAX_ITEMS, DEFAULT_MAX_SIZE, DEFAULT_TTL, SEARCH_TTL, SWEEP_INTERVAL};
use crate::vfs::RootsProvider;
use crate::worker::{DEFAULT_MAX_WORKERS, DEFAULT_MIN_WORKERS};

const MIB: u64 = 1024 * 1024;

/// Well-known folders under `$HOME` offered as specific roots when
/// `SPECIFIC_DIRS` is not set.
const DEFAULT_SPECIFIC_DIRS: [&str; 5] = ["Documents", "Downloads", "Pictures", "Videos", "Music"];

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory exposed as virtual `/`
    pub storage_dir: PathBuf,
    /// Extra directories exposed as `/<basename>`
    pub mount_dirs: Vec<PathBuf>,
    /// Well-known directories exposed as `/<basename>`
    pub specific_dirs: Vec<PathBuf>,
    /// HTTP server port
    pub server_port: u16,
    /// Largest file the server will write, in bytes
    pub max_file_size: u64,
    /// Cache byte bound
    pub cache_max_size: u64,
    /// Cache entry-count bound
    pub cache_max_items: usize,
    /// TTL for cached listings and contents
    pub cache_ttl: Duration,
    /// TTL for cached search results
    pub search_ttl: Duration,
    /// Period of the cache expiry sweep
    pub sweep_interval: Duration,
    /// Worker count clamp
    pub worker_min: usize,
    pub worker_max: usize,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `STORAGE_DIR` - Storage root (default: `$HOME`, else `/tmp`)
    /// - `MOUNT_DIRS` - Comma-separated mount roots (default: none)
    /// - `SPECIFIC_DIRS` - Comma-separated specific roots (default: existing
    ///   `$HOME/{Documents,Downloads,Pictures,Videos,Music}`)
    /// - `PORT` - HTTP server port (default: 8844)
    /// - `MAX_FILE_SIZE_MB` - Largest writable file (default: 10000)
    /// - `CACHE_MAX_SIZE_MB` - Cache byte bound (default: 250)
    /// - `CACHE_MAX_ITEMS` - Cache entry bound (default: 15000)
    /// - `CACHE_TTL_SECS` - Listing/content TTL (default: 300)
    /// - `SEARCH_TTL_SECS` - Search result TTL (default: 120)
    /// - `SWEEP_INTERVAL_SECS` - Expiry sweep period (default: 60)
    /// - `WORKER_MIN` / `WORKER_MAX` - Worker count clamp (default: 2 / 16)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let home = env::var("HOME").ok().filter(|h| !h.is_empty());

        let specific_dirs = match env::var("SPECIFIC_DIRS") {
            Ok(value) => split_paths(&value),
            Err(_) => home
                .as_deref()
                .map(|home| existing_dirs_under(Path::new(home)))
                .unwrap_or_default(),
        };

        Self {
            storage_dir: env::var("STORAGE_DIR")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .or(home)
                .map(PathBuf::from)
                .unwrap_or(defaults.storage_dir),
            mount_dirs: env::var("MOUNT_DIRS")
                .map(|v| split_paths(&v))
                .unwrap_or_default(),
            specific_dirs,
            server_port: parse_var("PORT").unwrap_or(defaults.server_port),
            max_file_size: parse_var::<u64>("MAX_FILE_SIZE_MB")
                .map(|mb| mb.saturating_mul(MIB))
                .unwrap_or(defaults.max_file_size),
            cache_max_size: parse_var::<u64>("CACHE_MAX_SIZE_MB")
                .map(|mb| mb.saturating_mul(MIB))
                .unwrap_or(defaults.cache_max_size),
            cache_max_items: parse_var("CACHE_MAX_ITEMS").unwrap_or(defaults.cache_max_items),
            cache_ttl: parse_var("CACHE_TTL_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.cache_ttl),
            search_ttl: parse_var("SEARCH_TTL_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.search_ttl),
            sweep_interval: parse_var::<u64>("SWEEP_INTERVAL_SECS")
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs)
                .unwrap_or(defaults.sweep_interval),
            worker_min: parse_var("WORKER_MIN").unwrap_or(defaults.worker_min),
            worker_max: parse_var("WORKER_MAX").unwrap_or(defaults.worker_max),
        }
    }

    /// Config rooted at `storage_dir` with every other value at its default.
    pub fn with_storage(storage_dir: impl Into<PathBuf>) -> Self {
        Self {
            storage_dir: storage_dir.into(),
            ..Self::default()
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storage_dir: PathBuf::from("/tmp"),
            mount_dirs: Vec::new(),
            specific_dirs: Vec::new(),
            server_port: 8844,
            max_file_size: 10_000 * MIB,
            cache_max_size: DEFAULT_MAX_SIZE,
            cache_max_items: DEFAULT_MAX_ITEMS,
            cache_ttl: DEFAULT_TTL,
            search_ttl: SEARCH_TTL,
            sweep_interval: SWEEP_INTERVAL,
            worker_min: DEFAULT_MIN_WORKERS,
            worker_max: DEFAULT_MAX_WORKERS,
        }
    }
}

impl RootsProvider for Config {
    fn storage_root(&self) -> &Path {
        &self.storage_dir
    }

    fn mount_roots(&self) -> &[PathBuf] {
        &self.mount_dirs
    }

    fn specific_roots(&self) -> &[PathBuf] {
        &self.specific_dirs
    }

    fn max_file_size(&self) -> u64 {
        self.max_file_size
    }
}

fn parse_var<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

/// Comma-separated list, entries trimmed, blanks dropped.
fn split_paths(value: &str) -> Vec<PathBuf> {
    value
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(PathBuf::from)
        .collect()
}

fn existing_dirs_under(home: &Path) -> Vec<PathBuf> {
    DEFAULT_SPECIFIC_DIRS
        .iter()
        .map(|name| home.join(name))
        .filter(|dir| dir.is_dir())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.server_port, 8844);
        assert_eq!(config.cache_max_size, 250 * MIB);
        assert_eq!(config.cache_max_items, 15_000);
        assert_eq!(config.cache_ttl, Duration::from_secs(300));
        assert_eq!(config.search_ttl, Duration::from_secs(120));
        assert_eq!(config.sweep_interval, Duration::from_secs(60));
        assert_eq!((config.worker_min, config.worker_max), (2, 16));
        assert!(config.mount_dirs.is_empty());
    }

    #[test]
    fn test_split_paths_trims_and_drops_blanks() {
        let paths = split_paths(" /mnt/a , ,/mnt/b,");
        assert_eq!(paths, vec![PathBuf::from("/mnt/a"), PathBuf::from("/mnt/b")]);
        assert!(split_paths("").is_empty());
    }

    #[test]
    fn test_existing_dirs_under_skips_missing() {
        let home = tempfile::TempDir::new().unwrap();
        std::fs::create_dir(home.path().join("Music")).unwrap();
        std::fs::create_dir(home.path().join("Documents")).unwrap();

        let dirs = existing_dirs_under(home.path());
        assert_eq!(
            dirs,
            vec![home.path().join("Documents"), home.path().join("Music")]
        );
    }

    #[test]
    fn test_config_is_a_roots_provider() {
        let mut config = Config::with_storage("/srv/data");
        config.mount_dirs.push(PathBuf::from("/mnt/media"));

        let roots: &dyn RootsProvider = &config;
        assert_eq!(roots.storage_root(), Path::new("/srv/data"));
        assert_eq!(roots.mount_roots(), &[PathBuf::from("/mnt/media")]);
        assert_eq!(roots.max_file_size(), 10_000 * MIB);
    }
}
