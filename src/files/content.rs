//! Text file reads and writes.

use std::fs::{self, Metadata, OpenOptions};
use std::io::Write;
use std::path::Path;

use tracing::debug;

use crate::error::{Result, VfsError};
use crate::vfs::mtime_nanos;

/// Largest file served by a content read (10 MiB).
pub const MAX_READ_SIZE: u64 = 10 * 1024 * 1024;

/// Modification time in whole seconds, as used in content cache keys.
pub fn mtime_secs(meta: &Metadata) -> i64 {
    mtime_nanos(meta).div_euclid(1_000_000_000) as i64
}

/// Reads the file at `physical` as text. Invalid UTF-8 is replaced.
///
/// Directories are a `BadRequest`; files over [`MAX_READ_SIZE`] are
/// `TooLarge`.
pub fn read_text(physical: &Path, virtual_path: &str) -> Result<(String, Metadata)> {
    let meta = fs::metadata(physical).map_err(|err| VfsError::from_io(err, virtual_path))?;
    if meta.is_dir() {
        return Err(VfsError::BadRequest(format!("{virtual_path} is a directory")));
    }
    if meta.len() > MAX_READ_SIZE {
        return Err(VfsError::TooLarge(format!(
            "{virtual_path} is {} bytes, limit is {MAX_READ_SIZE}",
            meta.len()
        )));
    }

    let bytes = fs::read(physical).map_err(|err| VfsError::from_io(err, virtual_path))?;
    let text = match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(err) => String::from_utf8_lossy(err.as_bytes()).into_owned(),
    };
    Ok((text, meta))
}

/// Overwrites (or creates) the file at `physical`. The parent directory
/// must already exist.
pub fn write_text(physical: &Path, virtual_path: &str, content: &str, max_size: u64) -> Result<()> {
    check_size(virtual_path, content, max_size)?;
    if physical.is_dir() {
        return Err(VfsError::BadRequest(format!("{virtual_path} is a directory")));
    }

    fs::write(physical, content).map_err(|err| VfsError::from_io(err, virtual_path))?;
    debug!(path = %virtual_path, bytes = content.len(), "Saved file");
    Ok(())
}

/// Creates a new file, failing with `AlreadyExists` if anything is at
/// `physical`.
pub fn create_file(physical: &Path, virtual_path: &str, content: &str, max_size: u64) -> Result<()> {
    check_size(virtual_path, content, max_size)?;

    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(physical)
        .map_err(|err| VfsError::from_io(err, virtual_path))?;
    file.write_all(content.as_bytes())?;
    debug!(path = %virtual_path, "Created file");
    Ok(())
}

fn check_size(virtual_path: &str, content: &str, max_size: u64) -> Result<()> {
    if content.len() as u64 > max_size {
        return Err(VfsError::TooLarge(format!(
            "{virtual_path}: {} bytes exceeds the {max_size} byte limit",
            content.len()
        )));
    }
    Ok(())
}
