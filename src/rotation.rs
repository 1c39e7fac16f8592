// SPDX-License-Identifier: Apache-2.0 OR MIT
//! Per-level log files with date and size rotation.
//!
//! Layout: `<root>/<level>/<YYYY-MM-DD>.log`. Size backups are renamed to
//! `<YYYY-MM-DD>.log.<uuid>` next to the active file.
//!
//! Every level's entry sits behind its own mutex. Rotation checks, the
//! handle swap and the write itself all happen while holding it, so a
//! writer never sees a half-rotated entry and a second rotation trigger for
//! the same level finds the fresh file and does nothing.
//!
//! A failed size rotation never stops a level. If the active file vanished
//! underneath us it is simply recreated. Any other failure fails the
//! triggering write, then writes continue through the old handle and the
//! size trigger stays quiet until the file has grown by another
//! `max_file_size` or the date rolls over.

use parking_lot::Mutex;
use std::fs::File;
use std::io::{self, ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::fs::{ensure_directory, open_append, rename_file};
use crate::logging::{Clock, Level, LevelMap, LogRecord};

/// Active file of one level
#[derive(Debug)]
pub struct LevelFile {
    level: Level,
    directory: PathBuf,
    file_name: String,
    date: String,
    file: Option<File>,
    /// Size the file must reach before the size trigger is retried after a
    /// failed rotation
    size_retry_at: Option<u64>,
}

impl LevelFile {
    fn open(level: Level, directory: PathBuf, date: String) -> Result<Self> {
        let file_name = format!("{}.log", date);
        let path = directory.join(&file_name);
        let file = open_append(&path).map_err(|e| Error::io("failed to open log file", &path, e))?;

        Ok(Self {
            level,
            directory,
            file_name,
            date,
            file: Some(file),
            size_retry_at: None,
        })
    }

    pub fn path(&self) -> PathBuf {
        self.directory.join(&self.file_name)
    }

    pub fn is_open(&self) -> bool {
        self.file.is_some()
    }

    fn rotation_error(&self, path: PathBuf, source: std::io::Error) -> Error {
        Error::Rotation {
            level: self.level,
            path,
            source,
        }
    }
}

/// Filesystem calls made while rotating
#[derive(Debug, Clone, Copy)]
pub(crate) struct FileOps {
    pub open: fn(&Path) -> io::Result<File>,
    pub rename: fn(&Path, &Path) -> io::Result<()>,
}

impl Default for FileOps {
    fn default() -> Self {
        Self {
            open: open_append,
            rename: rename_file,
        }
    }
}

pub struct FileRotationManager {
    root: PathBuf,
    max_file_size: u64,
    clock: Arc<dyn Clock>,
    ops: FileOps,
    files: LevelMap<Option<Mutex<LevelFile>>>,
    date_rotations: AtomicU64,
    size_rotations: AtomicU64,
}

impl FileRotationManager {
    /// Create the level directories and open today's file for every level
    /// enabled by `max_level`.
    pub fn open(root: &Path, max_level: Level, max_file_size: u64, clock: Arc<dyn Clock>) -> Result<Self> {
        ensure_directory(root).map_err(|e| Error::io("failed to create log directory", root, e))?;

        let today = clock.today();
        let mut files = LevelMap::default();
        for level in Level::ALL {
            if !max_level.enables(level) {
                continue;
            }
            let directory = root.join(level.as_str());
            ensure_directory(&directory)
                .map_err(|e| Error::io("failed to create level directory", &directory, e))?;
            *files.get_mut(level) = Some(Mutex::new(LevelFile::open(level, directory, today.clone())?));
        }

        Ok(Self {
            root: root.to_path_buf(),
            max_file_size: max_file_size.max(1),
            clock,
            ops: FileOps::default(),
            files,
            date_rotations: AtomicU64::new(0),
            size_rotations: AtomicU64::new(0),
        })
    }

    #[cfg(test)]
    pub(crate) fn set_file_ops(&mut self, ops: FileOps) {
        self.ops = ops;
    }

    fn entry(&self, level: Level) -> Result<&Mutex<LevelFile>> {
        self.files.get(level).as_ref().ok_or(Error::LevelDisabled(level))
    }

    /// Append one record to its level's file and fsync it, rotating first if
    /// the date changed or the file reached the size limit.
    pub fn write_record(&self, record: &LogRecord) -> Result<()> {
        let mut entry = self.entry(record.level)?.lock();
        if !entry.is_open() {
            return Err(Error::Closed(record.level));
        }

        self.rotate_by_date(&mut entry)?;
        self.rotate_by_size(&mut entry)?;

        let mut line = Vec::with_capacity(record.message.len() + 40);
        record
            .write_line(&mut line)
            .map_err(|e| Error::io("failed to format log record", entry.path(), e))?;

        let path = entry.path();
        let file = entry.file.as_mut().ok_or(Error::Closed(record.level))?;
        file.write_all(&line)
            .map_err(|e| Error::io("failed to write log record", &path, e))?;
        file.sync_all()
            .map_err(|e| Error::io("failed to sync log file", &path, e))
    }

    fn rotate_by_date(&self, entry: &mut LevelFile) -> Result<()> {
        let today = self.clock.today();
        if entry.date == today {
            return Ok(());
        }

        let file_name = format!("{}.log", today);
        let path = entry.directory.join(&file_name);
        let fresh = (self.ops.open)(&path).map_err(|e| entry.rotation_error(path, e))?;

        if let Some(old) = entry.file.replace(fresh) {
            let _ = old.sync_all();
        }
        entry.date = today;
        entry.file_name = file_name;
        entry.size_retry_at = None;
        self.date_rotations.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn rotate_by_size(&self, entry: &mut LevelFile) -> Result<()> {
        let path = entry.path();
        let size = match entry.file.as_ref() {
            Some(file) => file.metadata().map_err(|e| entry.rotation_error(path.clone(), e))?.len(),
            None => return Err(Error::Closed(entry.level)),
        };
        if size < self.max_file_size || entry.size_retry_at.is_some_and(|at| size < at) {
            return Ok(());
        }

        let backup = entry
            .directory
            .join(format!("{}.{}", entry.file_name, Uuid::new_v4().simple()));
        let backed_up = match (self.ops.rename)(&path, &backup) {
            Ok(()) => true,
            // Moved or deleted by someone else; there is nothing to back up
            Err(e) if e.kind() == ErrorKind::NotFound => false,
            Err(e) => {
                entry.size_retry_at = Some(size.saturating_add(self.max_file_size));
                return Err(entry.rotation_error(path, e));
            }
        };

        match (self.ops.open)(&path) {
            Ok(fresh) => {
                if let Some(old) = entry.file.replace(fresh) {
                    let _ = old.sync_all();
                }
                entry.size_retry_at = None;
                self.size_rotations.fetch_add(1, Ordering::Relaxed);
                Ok(())
            }
            Err(e) => {
                // Put the old file back so its handle keeps writing to `path`
                if backed_up && (self.ops.rename)(&backup, &path).is_ok() {
                    entry.size_retry_at = Some(size.saturating_add(self.max_file_size));
                }
                Err(entry.rotation_error(path, e))
            }
        }
    }

    /// Sync and close one level's file; later writes fail with `Closed`.
    pub fn close(&self, level: Level) -> Result<()> {
        let mut entry = self.entry(level)?.lock();
        match entry.file.take() {
            Some(file) => file
                .sync_all()
                .map_err(|e| Error::io("failed to sync log file", entry.path(), e)),
            None => Ok(()),
        }
    }

    /// Close every open file, returning the first failure.
    pub fn close_all(&self) -> Result<()> {
        let mut first_err = None;
        for level in self.enabled_levels() {
            if let Err(e) = self.close(level) {
                first_err.get_or_insert(e);
            }
        }
        first_err.map_or(Ok(()), Err)
    }

    pub fn is_open(&self, level: Level) -> bool {
        self.entry(level).map(|e| e.lock().is_open()).unwrap_or(false)
    }

    /// Path of the level's active file
    pub fn current_path(&self, level: Level) -> Option<PathBuf> {
        self.entry(level).ok().map(|e| e.lock().path())
    }

    pub fn enabled_levels(&self) -> Vec<Level> {
        self.files
            .iter()
            .filter(|(_, entry)| entry.is_some())
            .map(|(level, _)| level)
            .collect()
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn max_file_size(&self) -> u64 {
        self.max_file_size
    }

    pub fn date_rotations(&self) -> u64 {
        self.date_rotations.load(Ordering::Relaxed)
    }

    pub fn size_rotations(&self) -> u64 {
        self.size_rotations.load(Ordering::Relaxed)
    }
}
