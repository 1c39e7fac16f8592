// SPDX-License-Identifier: Apache-2.0 OR MIT
//! Filesystem helpers.

use std::fs::{File, OpenOptions};
use std::io;
use std::path::Path;

/// Create `path` (and any missing parents) if it does not exist yet.
pub fn ensure_directory(path: &Path) -> io::Result<()> {
    if path.is_dir() {
        return Ok(());
    }
    std::fs::create_dir_all(path)
}

/// Open a log file for appending, creating it if needed.
pub fn open_append(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

/// Rename `from` to `to`, replacing `to` if it exists.
pub fn rename_file(from: &Path, to: &Path) -> io::Result<()> {
    std::fs::rename(from, to)
}
