//! Layouts for handing a record to a text backend
//!
//! Backends disagree on argument order: some want the message first and
//! structured data after it, others want the data object first. The
//! layout is picked once when the transport is configured.
//! - MessageFirst: `Request processed latency_ms=42`
//! - DataFirst: `{"latency_ms":42} Request processed`
//! - Json: the whole record as one JSON object
//! - Logfmt: `level=INFO message="Request processed" latency_ms=42`

use crate::core::LogRecord;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Layout {
    #[default]
    MessageFirst,
    DataFirst,
    Json,
    Logfmt,
}

impl Layout {
    /// Render a record as a single line
    pub fn render(&self, record: &LogRecord) -> String {
        match self {
            Layout::MessageFirst => Self::render_message_first(record),
            Layout::DataFirst => Self::render_data_first(record),
            Layout::Json => serde_json::to_string(record).unwrap_or_default(),
            Layout::Logfmt => Self::render_logfmt(record),
        }
    }

    fn render_message_first(record: &LogRecord) -> String {
        let message = record.message_text();
        match record.data() {
            Some(data) if !data.is_empty() => {
                let fields = data
                    .iter()
                    .map(|(k, v)| format!("{}={}", k, plain(v)))
                    .collect::<Vec<_>>()
                    .join(" ");
                if message.is_empty() {
                    fields
                } else {
                    format!("{} {}", message, fields)
                }
            }
            _ => message,
        }
    }

    fn render_data_first(record: &LogRecord) -> String {
        let message = record.message_text();
        match record.data() {
            Some(data) => {
                let data = Value::Object(data.clone()).to_string();
                if message.is_empty() {
                    data
                } else {
                    format!("{} {}", data, message)
                }
            }
            None => message,
        }
    }

    fn render_logfmt(record: &LogRecord) -> String {
        let mut parts = vec![
            format!("timestamp={}", record.timestamp.to_rfc3339()),
            format!("level={}", record.level.to_str()),
        ];

        let message = record.message_text();
        if !message.is_empty() {
            parts.push(format!("message={}", quote_logfmt_value(&message)));
        }

        if let Some(data) = record.data() {
            push_logfmt_fields(&mut parts, "", data);
        }

        parts.join(" ")
    }
}

/// Strings unquoted, everything else as JSON
fn plain(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Nested objects flatten into dotted keys
fn push_logfmt_fields(parts: &mut Vec<String>, prefix: &str, data: &Map<String, Value>) {
    for (key, value) in data {
        let key = if prefix.is_empty() {
            escape_logfmt_key(key)
        } else {
            format!("{}.{}", prefix, escape_logfmt_key(key))
        };
        match value {
            Value::Object(inner) => push_logfmt_fields(parts, &key, inner),
            Value::String(s) => parts.push(format!("{}={}", key, escape_logfmt_value(s))),
            other => parts.push(format!("{}={}", key, escape_logfmt_value(&other.to_string()))),
        }
    }
}

fn escape_logfmt_key(key: &str) -> String {
    key.chars()
        .filter(|c| c.is_alphanumeric() || *c == '_' || *c == '-')
        .collect()
}

/// Quote if the value contains spaces, quotes or `=`
fn escape_logfmt_value(value: &str) -> String {
    if value.contains(' ') || value.contains('"') || value.contains('=') {
        quote_logfmt_value(value)
    } else {
        value.to_string()
    }
}

fn quote_logfmt_value(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::LogLevel;
    use chrono::Utc;
    use serde_json::json;

    fn record(messages: Vec<Value>, data: Value) -> LogRecord {
        let data = match data {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        LogRecord {
            level: LogLevel::Info,
            messages,
            has_data: !data.is_empty(),
            data,
            error: None,
            metadata: None,
            context: Map::new(),
            groups: Vec::new(),
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn test_message_first() {
        let rec = record(vec![json!("Request processed")], json!({"latency_ms": 42}));
        assert_eq!(Layout::MessageFirst.render(&rec), "Request processed latency_ms=42");
    }

    #[test]
    fn test_data_first() {
        let rec = record(vec![json!("Request processed")], json!({"latency_ms": 42}));
        assert_eq!(
            Layout::DataFirst.render(&rec),
            "{\"latency_ms\":42} Request processed"
        );
    }

    #[test]
    fn test_no_data_is_message_only() {
        let rec = record(vec![json!("plain")], Value::Null);
        assert_eq!(Layout::MessageFirst.render(&rec), "plain");
        assert_eq!(Layout::DataFirst.render(&rec), "plain");
    }

    #[test]
    fn test_json_layout() {
        let rec = record(vec![json!("hello")], json!({"user": "alice"}));
        let parsed: Value = serde_json::from_str(&Layout::Json.render(&rec)).unwrap();
        assert_eq!(parsed["level"], "info");
        assert_eq!(parsed["messages"], json!(["hello"]));
        assert_eq!(parsed["data"]["user"], "alice");
    }

    #[test]
    fn test_logfmt_escapes_and_flattens() {
        let rec = record(
            vec![json!("Query executed")],
            json!({"query": "SELECT * FROM users WHERE id=1", "ctx": {"user": "alice"}}),
        );
        let line = Layout::Logfmt.render(&rec);

        assert!(line.contains("level=INFO"));
        assert!(line.contains("message=\"Query executed\""));
        assert!(line.contains("query=\"SELECT * FROM users WHERE id=1\""));
        assert!(line.contains("ctx.user=alice"));
    }

    #[test]
    fn test_layout_deserialize() {
        let layout: Layout = serde_json::from_str("\"data_first\"").unwrap();
        assert_eq!(layout, Layout::DataFirst);
        assert_eq!(Layout::default(), Layout::MessageFirst);
    }
}
