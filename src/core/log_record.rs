//! The normalized record every transport receives

use super::log_level::LogLevel;
use chrono::{DateTime, Utc};
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::{Map, Value};
use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;

/// An error attached to a single log call
///
/// Cheap to clone; every transport of one emission sees the same error.
#[derive(Clone)]
pub struct LogError(Arc<dyn StdError + Send + Sync + 'static>);

impl LogError {
    pub fn new<E>(error: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self(Arc::new(error))
    }

    /// Create an error from a plain message
    pub fn msg(message: impl Into<String>) -> Self {
        let boxed: Box<dyn StdError + Send + Sync> = message.into().into();
        Self::from_boxed(boxed)
    }

    pub fn from_boxed(error: Box<dyn StdError + Send + Sync + 'static>) -> Self {
        Self(Arc::from(error))
    }

    pub fn message(&self) -> String {
        self.0.to_string()
    }

    pub fn inner(&self) -> &(dyn StdError + Send + Sync + 'static) {
        self.0.as_ref()
    }

    /// Messages of the `source()` chain, outermost first, excluding self
    pub fn causes(&self) -> Vec<String> {
        let mut causes = Vec::new();
        let mut current = self.0.source();
        while let Some(err) = current {
            causes.push(err.to_string());
            current = err.source();
        }
        causes
    }
}

impl fmt::Debug for LogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LogError({:?})", self.0)
    }
}

impl fmt::Display for LogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl<E> From<E> for LogError
where
    E: StdError + Send + Sync + 'static,
{
    fn from(error: E) -> Self {
        Self::new(error)
    }
}

/// One emission, as delivered to transports
///
/// `data` holds the composed payload (context, metadata and error under
/// their configured field names). `error`, `metadata` and `context` are
/// the resolved inputs, kept for transports that want them separately.
#[derive(Debug, Clone)]
pub struct LogRecord {
    pub level: LogLevel,
    pub messages: Vec<Value>,
    pub data: Map<String, Value>,
    pub has_data: bool,
    pub error: Option<LogError>,
    pub metadata: Option<Map<String, Value>>,
    pub context: Map<String, Value>,
    pub groups: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

impl LogRecord {
    /// Messages joined with spaces; strings are written without quotes
    pub fn message_text(&self) -> String {
        self.messages
            .iter()
            .map(|m| match m {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn data(&self) -> Option<&Map<String, Value>> {
        self.has_data.then_some(&self.data)
    }
}

impl Serialize for LogRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("timestamp", &self.timestamp)?;
        map.serialize_entry("level", &self.level)?;
        map.serialize_entry("messages", &self.messages)?;
        if self.has_data {
            map.serialize_entry("data", &self.data)?;
        }
        if !self.groups.is_empty() {
            map.serialize_entry("groups", &self.groups)?;
        }
        map.end()
    }
}
