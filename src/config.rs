// SPDX-License-Identifier: Apache-2.0 OR MIT
//! Logger options and option-file parsing.
//!
//! Option files are JSON5, so they may carry comments and trailing commas.
//! Every field is optional; missing ones take the defaults below.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::error::Error;
use crate::logging::{Level, OverflowPolicy};
use crate::worker::default_worker_count;

pub const DEFAULT_DIRECTORY: &str = "./logs";
pub const DEFAULT_MAX_FILE_SIZE: u64 = 1024;
pub const DEFAULT_RING_BUFFER_SIZE: usize = 1024;
pub const DEFAULT_DISPATCH_CAPACITY: usize = 1024;
pub const DEFAULT_DRAIN_INTERVAL_MS: u64 = 100;
pub const DEFAULT_POOL_CAPACITY: usize = 1024;

/// Construction options for a [`Logger`](crate::Logger)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Options {
    /// Root directory; each level gets a subdirectory
    pub directory: PathBuf,

    /// Size in bytes at which the active file is backed up and replaced
    pub max_file_size: u64,

    /// Initial slot count of each level's ring buffer
    pub ring_buffer_size: usize,

    /// Most verbose level written; anything less severe is ignored
    pub level: Level,

    /// Ring buffer behavior when full
    pub overflow: OverflowPolicy,

    /// Capacity of each level's dispatch queue
    pub dispatch_capacity: usize,

    /// Worker threads performing file writes (default: available parallelism)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workers: Option<usize>,

    /// How long the drain thread waits when every ring buffer is empty
    pub drain_interval_ms: u64,

    /// Idle records kept for reuse
    pub pool_capacity: usize,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            directory: PathBuf::from(DEFAULT_DIRECTORY),
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            ring_buffer_size: DEFAULT_RING_BUFFER_SIZE,
            level: Level::Debug,
            overflow: OverflowPolicy::Grow,
            dispatch_capacity: DEFAULT_DISPATCH_CAPACITY,
            workers: None,
            drain_interval_ms: DEFAULT_DRAIN_INTERVAL_MS,
            pool_capacity: DEFAULT_POOL_CAPACITY,
        }
    }
}

impl Options {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            ..Self::default()
        }
    }

    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    pub fn with_max_file_size(mut self, bytes: u64) -> Self {
        self.max_file_size = bytes;
        self
    }

    pub fn with_ring_buffer_size(mut self, slots: usize) -> Self {
        self.ring_buffer_size = slots;
        self
    }

    pub fn with_overflow(mut self, policy: OverflowPolicy) -> Self {
        self.overflow = policy;
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = Some(workers);
        self
    }

    pub fn with_dispatch_capacity(mut self, capacity: usize) -> Self {
        self.dispatch_capacity = capacity;
        self
    }

    pub fn with_drain_interval(mut self, interval: Duration) -> Self {
        self.drain_interval_ms = u64::try_from(interval.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Load options from a JSON5 file
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e.to_string()))?;
        Self::parse(&content)
    }

    /// Parse options from a JSON5 string
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        json5::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn to_json5(&self) -> String {
        // json5 has no pretty printer; plain JSON is valid JSON5
        serde_json::to_string_pretty(self).unwrap_or_else(|_| "{}".to_string())
    }

    pub fn save_to_file(&self, path: &Path) -> Result<(), ConfigError> {
        std::fs::write(path, self.to_json5())
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e.to_string()))
    }

    /// Apply the correction rules.
    ///
    /// An empty directory is rejected; zero sizes, capacities and worker
    /// counts fall back to their defaults.
    pub fn normalize(mut self) -> Result<Self, Error> {
        if self.directory.as_os_str().is_empty() {
            return Err(Error::EmptyDirectory);
        }
        if self.max_file_size == 0 {
            self.max_file_size = DEFAULT_MAX_FILE_SIZE;
        }
        if self.ring_buffer_size == 0 {
            self.ring_buffer_size = DEFAULT_RING_BUFFER_SIZE;
        }
        if self.dispatch_capacity == 0 {
            self.dispatch_capacity = DEFAULT_DISPATCH_CAPACITY;
        }
        if self.pool_capacity == 0 {
            self.pool_capacity = DEFAULT_POOL_CAPACITY;
        }
        if self.drain_interval_ms == 0 {
            self.drain_interval_ms = DEFAULT_DRAIN_INTERVAL_MS;
        }
        if self.workers == Some(0) {
            self.workers = None;
        }
        Ok(self)
    }

    pub fn worker_count(&self) -> usize {
        self.workers.unwrap_or_else(default_worker_count)
    }

    pub fn drain_interval(&self) -> Duration {
        Duration::from_millis(self.drain_interval_ms)
    }
}

/// Errors from loading an option file
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("failed to read {0}: {1}")]
    Io(PathBuf, String),

    #[error("failed to parse options: {0}")]
    Parse(String),
}
