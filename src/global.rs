// SPDX-License-Identifier: Apache-2.0 OR MIT
//! Optional process-wide logger.
//!
//! Libraries should take a `&Logger`; this exists for applications that
//! want one default instance installed at startup. It can be installed once
//! and is never dropped, so call [`close_all`] before exiting.

use once_cell::sync::OnceCell;

use crate::config::Options;
use crate::error::{Error, Result};
use crate::logging::{Level, Logger};

static GLOBAL: OnceCell<Logger> = OnceCell::new();

/// Install `logger` as the process default.
///
/// Returns the logger back if one is already installed.
pub fn install(logger: Logger) -> std::result::Result<&'static Logger, Logger> {
    GLOBAL.try_insert(logger).map_err(|(_, rejected)| rejected)
}

/// Build a logger from `options` and install it, or return the one already
/// installed.
pub fn init(options: Options) -> Result<&'static Logger> {
    GLOBAL.get_or_try_init(|| Logger::new(options))
}

pub fn get() -> Option<&'static Logger> {
    GLOBAL.get()
}

/// Log through the installed logger; `LoggerClosed` if there is none.
pub fn log(level: Level, message: &str, source: &str) -> Result<()> {
    get().ok_or(Error::LoggerClosed)?.log(level, message, source)
}

pub fn error(message: &str, source: &str) -> Result<()> {
    log(Level::Error, message, source)
}

pub fn warning(message: &str, source: &str) -> Result<()> {
    log(Level::Warning, message, source)
}

pub fn info(message: &str, source: &str) -> Result<()> {
    log(Level::Info, message, source)
}

pub fn debug(message: &str, source: &str) -> Result<()> {
    log(Level::Debug, message, source)
}

/// Flush and close the installed logger, if any.
pub fn close_all() -> Result<()> {
    match get() {
        Some(logger) => logger.close_all(),
        None => Ok(()),
    }
}
