//! Per-call builders: metadata, error and group tags for one emission
//!
//! Provides a builder pattern for attaching per-call data before picking
//! the level.

use super::fields::Fields;
use super::log_level::LogLevel;
use super::log_record::LogError;
use super::logger::{Emission, Logger, Pending};
use serde_json::Value;

/// Conversion into the message list of an emission
pub trait IntoMessages {
    fn into_messages(self) -> Vec<Value>;
}

impl IntoMessages for &str {
    fn into_messages(self) -> Vec<Value> {
        vec![Value::String(self.to_string())]
    }
}

impl IntoMessages for String {
    fn into_messages(self) -> Vec<Value> {
        vec![Value::String(self)]
    }
}

impl IntoMessages for &String {
    fn into_messages(self) -> Vec<Value> {
        vec![Value::String(self.clone())]
    }
}

impl IntoMessages for Value {
    fn into_messages(self) -> Vec<Value> {
        vec![self]
    }
}

impl IntoMessages for Vec<Value> {
    fn into_messages(self) -> Vec<Value> {
        self
    }
}

impl<const N: usize> IntoMessages for [Value; N] {
    fn into_messages(self) -> Vec<Value> {
        self.into_iter().collect()
    }
}

/// Conversion into a list of group tags
pub trait IntoGroups {
    fn into_groups(self) -> Vec<String>;
}

impl IntoGroups for &str {
    fn into_groups(self) -> Vec<String> {
        vec![self.to_string()]
    }
}

impl IntoGroups for String {
    fn into_groups(self) -> Vec<String> {
        vec![self]
    }
}

impl<S: Into<String>> IntoGroups for Vec<S> {
    fn into_groups(self) -> Vec<String> {
        self.into_iter().map(Into::into).collect()
    }
}

impl<S: Into<String>, const N: usize> IntoGroups for [S; N] {
    fn into_groups(self) -> Vec<String> {
        self.into_iter().map(Into::into).collect()
    }
}

/// Builder for one emission carrying metadata, an error or group tags
///
/// # Example
///
/// ```
/// use rust_log_layer::Logger;
/// use serde_json::json;
///
/// let logger = Logger::new();
///
/// logger
///     .with_metadata(json!({"latency_ms": 42}))
///     .with_group("http")
///     .info("Request processed");
/// ```
#[must_use = "a log builder does nothing until a level method is called"]
pub struct LogBuilder<'a> {
    logger: &'a Logger,
    metadata: Option<Fields>,
    error: Option<LogError>,
    groups: Vec<String>,
}

impl<'a> LogBuilder<'a> {
    pub(crate) fn new(logger: &'a Logger) -> Self {
        Self {
            logger,
            metadata: None,
            error: None,
            groups: Vec::new(),
        }
    }

    /// Attach metadata; repeated calls merge, later keys win
    pub fn with_metadata(mut self, metadata: impl Into<Fields>) -> Self {
        match self.metadata.as_mut() {
            Some(existing) => existing.merge(metadata.into()),
            None => self.metadata = Some(metadata.into()),
        }
        self
    }

    pub fn with_error(mut self, error: impl Into<LogError>) -> Self {
        self.error = Some(error.into());
        self
    }

    pub fn with_group(mut self, groups: impl IntoGroups) -> Self {
        self.groups.extend(groups.into_groups());
        self
    }

    pub fn trace(self, messages: impl IntoMessages) -> Option<Pending> {
        self.emit(LogLevel::Trace, messages)
    }

    pub fn debug(self, messages: impl IntoMessages) -> Option<Pending> {
        self.emit(LogLevel::Debug, messages)
    }

    pub fn info(self, messages: impl IntoMessages) -> Option<Pending> {
        self.emit(LogLevel::Info, messages)
    }

    pub fn warn(self, messages: impl IntoMessages) -> Option<Pending> {
        self.emit(LogLevel::Warn, messages)
    }

    pub fn error(self, messages: impl IntoMessages) -> Option<Pending> {
        self.emit(LogLevel::Error, messages)
    }

    pub fn fatal(self, messages: impl IntoMessages) -> Option<Pending> {
        self.emit(LogLevel::Fatal, messages)
    }

    /// Emit at a level chosen at runtime
    pub fn log(self, level: LogLevel, messages: impl IntoMessages) -> Option<Pending> {
        self.emit(level, messages)
    }

    fn emit(self, level: LogLevel, messages: impl IntoMessages) -> Option<Pending> {
        if !self.logger.is_level_enabled(level) {
            return None;
        }

        // Metadata hooks run only once the level is known to pass
        let metadata = match self.metadata {
            Some(metadata) => self.logger.apply_metadata_hooks(metadata),
            None => None,
        };

        let messages = self.logger.apply_prefix(messages.into_messages());
        self.logger.emit(Emission {
            level,
            messages,
            metadata,
            error: self.error,
            context: None,
            groups: self.groups,
        })
    }
}

/// A fully specified emission passed to [`Logger::raw`]
///
/// `context`, when set, replaces the logger's stored context for this
/// emission only.
#[derive(Debug, Clone, Default)]
pub struct RawEntry {
    pub level: LogLevel,
    pub messages: Vec<Value>,
    pub metadata: Option<Fields>,
    pub error: Option<LogError>,
    pub context: Option<Fields>,
    pub groups: Vec<String>,
}

impl RawEntry {
    pub fn new(level: LogLevel, messages: impl IntoMessages) -> Self {
        Self {
            level,
            messages: messages.into_messages(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn metadata(mut self, metadata: impl Into<Fields>) -> Self {
        self.metadata = Some(metadata.into());
        self
    }

    #[must_use]
    pub fn error(mut self, error: impl Into<LogError>) -> Self {
        self.error = Some(error.into());
        self
    }

    #[must_use]
    pub fn context(mut self, context: impl Into<Fields>) -> Self {
        self.context = Some(context.into());
        self
    }

    #[must_use]
    pub fn groups(mut self, groups: impl IntoGroups) -> Self {
        self.groups.extend(groups.into_groups());
        self
    }
}

/// Options for [`Logger::error_only`]
#[derive(Debug, Clone, Copy, Default)]
pub struct ErrorOnlyOptions {
    /// Level to emit at; defaults to error
    pub level: Option<LogLevel>,
    /// Copy the error's message into the messages; defaults to the
    /// logger's `copy_msg_on_only_error` setting
    pub copy_msg: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_into_messages() {
        assert_eq!("a".into_messages(), vec![json!("a")]);
        assert_eq!(json!(5).into_messages(), vec![json!(5)]);
        assert_eq!([json!("a"), json!(1)].into_messages(), vec![json!("a"), json!(1)]);
    }

    #[test]
    fn test_into_groups() {
        assert_eq!("db".into_groups(), vec!["db".to_string()]);
        assert_eq!(["db", "auth"].into_groups().len(), 2);
        assert_eq!(vec![String::from("x")].into_groups(), vec!["x".to_string()]);
    }

    #[test]
    fn test_raw_entry_builder() {
        let entry = RawEntry::new(LogLevel::Warn, "raw")
            .metadata(json!({"a": 1}))
            .context(Fields::new())
            .groups("db");
        assert_eq!(entry.level, LogLevel::Warn);
        assert!(entry.context.as_ref().is_some_and(Fields::is_empty));
        assert_eq!(entry.groups, vec!["db".to_string()]);
    }
}
