//! `format!`-style emission macros
//!
//! Each macro checks the level gate first and only formats when the level
//! passes, so a gated-out call costs one gate lookup. The value of a macro
//! call is the logger's return value, `Option<Pending>`: `None` when the
//! emission already finished (or was gated out), `Some` when asynchronous
//! lazy values are being resolved in the background.
//!
//! Macros take a plain [`Logger`](crate::Logger). For one-off metadata or
//! an error use the builders instead (`logger.with_metadata(..).info(..)`),
//! and for group routing log through a child from `logger.with_group(..)`.
//!
//! ```
//! use rust_log_layer::prelude::*;
//! use rust_log_layer::{info, warn};
//!
//! let memory = MemoryTransport::new("memory");
//! let logger = Logger::builder()
//!     .group("db", GroupConfig::new(["memory"]))
//!     .transport(memory.clone())
//!     .build();
//!
//! let port = 8080;
//! info!(logger, "listening on {}", port);
//!
//! let db = logger.with_group("db");
//! warn!(db, "pool at {}% capacity", 90);
//!
//! assert_eq!(memory.messages(), vec!["listening on 8080", "pool at 90% capacity"]);
//! ```

/// Emit a formatted message at a level chosen at runtime
///
/// ```
/// # use rust_log_layer::prelude::*;
/// use rust_log_layer::log;
///
/// let logger = Logger::builder().level(LogLevel::Warn).build();
/// let level = LogLevel::Debug;
/// assert!(log!(logger, level, "skipped {}", 1).is_none());
/// ```
#[macro_export]
macro_rules! log {
    ($logger:expr, $level:expr, $($arg:tt)+) => {{
        let logger: &$crate::Logger = &$logger;
        let level: $crate::LogLevel = $level;
        if logger.is_level_enabled(level) {
            logger.log(level, format!($($arg)+))
        } else {
            None
        }
    }};
}

/// Trace level; see [`log!`]
#[macro_export]
macro_rules! trace {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Trace, $($arg)+)
    };
}

/// Debug level; see [`log!`]
#[macro_export]
macro_rules! debug {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Debug, $($arg)+)
    };
}

/// Info level; see [`log!`]
#[macro_export]
macro_rules! info {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Info, $($arg)+)
    };
}

/// Warn level; see [`log!`]
#[macro_export]
macro_rules! warn {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Warn, $($arg)+)
    };
}

/// Error level; see [`log!`]
///
/// The error itself is not attached; use
/// `logger.with_error(err).error(..)` for that.
#[macro_export]
macro_rules! error {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Error, $($arg)+)
    };
}

/// Fatal level; see [`log!`]
///
/// Emits like any other level and never aborts the process.
#[macro_export]
macro_rules! fatal {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Fatal, $($arg)+)
    };
}

#[cfg(test)]
mod tests {
    use crate::core::{LogLevel, Logger};
    use crate::transports::MemoryTransport;

    fn logger() -> (Logger, MemoryTransport) {
        let memory = MemoryTransport::new("memory");
        (Logger::builder().transport(memory.clone()).build(), memory)
    }

    #[test]
    fn test_log_macro() {
        let (logger, memory) = logger();
        log!(logger, LogLevel::Info, "Test message");
        log!(logger, LogLevel::Info, "Formatted: {}", 42);
        assert_eq!(
            memory.messages(),
            vec!["Test message".to_string(), "Formatted: 42".to_string()]
        );
    }

    #[test]
    fn test_level_macros() {
        let (logger, memory) = logger();
        trace!(logger, "Value: {}", 10);
        debug!(logger, "Count: {}", 5);
        info!(logger, "Items: {}", 100);
        warn!(logger, "Retry {} of {}", 1, 3);
        error!(logger, "Code: {}", 500);
        fatal!(logger, "Critical failure: {}", "system");

        let levels: Vec<LogLevel> = memory.records().iter().map(|r| r.level).collect();
        assert_eq!(levels, LogLevel::ALL.to_vec());
    }

    #[test]
    fn test_gated_macro_skips_formatting() {
        struct Loud;
        impl std::fmt::Display for Loud {
            fn fmt(&self, _: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                panic!("formatted a gated-out message")
            }
        }

        let (logger, memory) = logger();
        logger.set_level(LogLevel::Error);
        assert!(debug!(logger, "{}", Loud).is_none());
        assert!(memory.is_empty());
    }
}
