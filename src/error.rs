// SPDX-License-Identifier: Apache-2.0 OR MIT
//! Error types returned by the logging engine.

use std::path::PathBuf;
use thiserror::Error;

use crate::logging::Level;

/// Errors surfaced synchronously to callers.
///
/// Failures that happen after a record has been queued never show up here;
/// they go to the logger's diagnostic sink instead.
#[derive(Error, Debug)]
pub enum Error {
    #[error("log directory must not be empty")]
    EmptyDirectory,

    #[error("unknown log level: {0:?}")]
    InvalidLevel(String),

    #[error("log file for level {0} is closed")]
    Closed(Level),

    #[error("logger has been closed")]
    LoggerClosed,

    #[error("level {0} is not enabled for this logger")]
    LevelDisabled(Level),

    #[error("worker pool has been stopped")]
    PoolStopped,

    #[error("failed to rotate {level} log ({path}): {source}")]
    Rotation {
        level: Level,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{context} ({path}): {source}")]
    Io {
        context: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    pub(crate) fn io(context: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            context,
            path: path.into(),
            source,
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
