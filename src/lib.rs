// SPDX-License-Identifier: Apache-2.0 OR MIT
//! Leveled, buffered, rotating file logging.
//!
//! ```ignore
//! let logger = rotalog::Logger::new(rotalog::Options::new("/tmp/t").with_level(rotalog::Level::Debug))?;
//! logger.info("hello", "main")?;
//! logger.close_all()?;
//! // -> /tmp/t/info/<YYYY-MM-DD>.log: "[info] <YYYY-MM-DD HH:MM:SS> hello"
//! ```

pub mod config;
pub mod error;
pub mod fs;
pub mod global;
#[macro_use]
pub mod logging;
pub mod rotation;
pub mod worker;

pub use config::{ConfigError, Options};
pub use error::{Error, Result};
pub use logging::{
    Clock, Diagnostic, DiagnosticKind, DiagnosticSink, Level, LogRecord, Logger, LoggerBuilder,
    LoggerStats, ManualClock, MemorySink, OverflowPolicy, StderrSink, SystemClock,
};
pub use rotation::FileRotationManager;
pub use worker::WorkerPool;
