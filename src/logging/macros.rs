// SPDX-License-Identifier: Apache-2.0 OR MIT
// Logging macros for convenient logging
//
// Each macro takes the logger, a source tag and `format!` arguments, and
// evaluates to the `Result` returned by the logger.

/// Log a formatted message at an explicit level
///
/// # Examples
/// ```ignore
/// log_at!(logger, Level::Info, "main", "listening on {}", addr);
/// ```
#[macro_export]
macro_rules! log_at {
    ($logger:expr, $level:expr, $source:expr, $($arg:tt)+) => {
        $logger.log($level, &::std::format!($($arg)+), $source)
    };
}

/// Log a message with panic severity
///
/// # Examples
/// ```ignore
/// log_panic!(logger, "main", "state corrupted: {}", reason);
/// ```
#[macro_export]
macro_rules! log_panic {
    ($logger:expr, $source:expr, $($arg:tt)+) => {
        $crate::log_at!($logger, $crate::logging::Level::Panic, $source, $($arg)+)
    };
}

/// Log a message with fatal severity
#[macro_export]
macro_rules! log_fatal {
    ($logger:expr, $source:expr, $($arg:tt)+) => {
        $crate::log_at!($logger, $crate::logging::Level::Fatal, $source, $($arg)+)
    };
}

/// Log a message with error severity
///
/// # Examples
/// ```ignore
/// log_error!(logger, "db", "query failed after {} retries", retries);
/// ```
#[macro_export]
macro_rules! log_error {
    ($logger:expr, $source:expr, $($arg:tt)+) => {
        $crate::log_at!($logger, $crate::logging::Level::Error, $source, $($arg)+)
    };
}

/// Log a message with warning severity
#[macro_export]
macro_rules! log_warning {
    ($logger:expr, $source:expr, $($arg:tt)+) => {
        $crate::log_at!($logger, $crate::logging::Level::Warning, $source, $($arg)+)
    };
}

/// Log a message with info severity
///
/// # Examples
/// ```ignore
/// log_info!(logger, "main", "started with {} workers", n);
/// ```
#[macro_export]
macro_rules! log_info {
    ($logger:expr, $source:expr, $($arg:tt)+) => {
        $crate::log_at!($logger, $crate::logging::Level::Info, $source, $($arg)+)
    };
}

/// Log a message with debug severity
#[macro_export]
macro_rules! log_debug {
    ($logger:expr, $source:expr, $($arg:tt)+) => {
        $crate::log_at!($logger, $crate::logging::Level::Debug, $source, $($arg)+)
    };
}

/// Log a message with trace severity
#[macro_export]
macro_rules! log_trace {
    ($logger:expr, $source:expr, $($arg:tt)+) => {
        $crate::log_at!($logger, $crate::logging::Level::Trace, $source, $($arg)+)
    };
}

#[cfg(test)]
mod tests {
    use crate::config::Options;
    use crate::logging::{Level, Logger, MemorySink};

    #[test]
    fn test_log_macros() {
        let tmp = tempfile::tempdir().unwrap();
        let logger = Logger::builder(Options::new(tmp.path()).with_level(Level::Trace).with_workers(1))
            .diagnostics(MemorySink::new())
            .build()
            .unwrap();

        log_panic!(logger, "test", "panic {}", 0).unwrap();
        log_fatal!(logger, "test", "fatal {}", 1).unwrap();
        log_error!(logger, "test", "error {}", 2).unwrap();
        log_warning!(logger, "test", "warning {}", 3).unwrap();
        log_info!(logger, "test", "info {}", 4).unwrap();
        log_debug!(logger, "test", "debug {}", 5).unwrap();
        log_trace!(logger, "test", "plain trace").unwrap();
        log_at!(logger, Level::Info, "test", "{}-{}", "a", "b").unwrap();
        logger.close_all().unwrap();

        assert_eq!(logger.stats().written, 8);
        let info = std::fs::read_to_string(logger.current_path(Level::Info).unwrap()).unwrap();
        let lines: Vec<&str> = info.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with(" info 4"));
        assert!(lines[1].ends_with(" a-b"));
    }
}
