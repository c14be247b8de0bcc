//! Bridge from log records into `tracing` events

use super::layout::Layout;
use crate::core::{LogLevel, LogRecord, Result, Transport, TransportRef};

/// Transport that re-emits records as `tracing` events
///
/// Events use the `log_layer::record` target; fatal maps to `ERROR`.
/// The rendered line is the event message and groups are attached as a
/// field.
pub struct TracingTransport {
    id: String,
    layout: Layout,
}

impl TracingTransport {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            layout: Layout::default(),
        }
    }

    #[must_use]
    pub fn with_layout(mut self, layout: Layout) -> Self {
        self.layout = layout;
        self
    }

    pub fn layout(&self) -> Layout {
        self.layout
    }
}

impl Transport for TracingTransport {
    fn id(&self) -> &str {
        &self.id
    }

    fn send(&self, record: &LogRecord) -> Result<()> {
        let line = self.layout.render(record);
        let groups = record.groups.join(",");
        let groups = groups.as_str();
        match record.level {
            LogLevel::Trace => tracing::trace!(target: "log_layer::record", groups, "{}", line),
            LogLevel::Debug => tracing::debug!(target: "log_layer::record", groups, "{}", line),
            LogLevel::Info => tracing::info!(target: "log_layer::record", groups, "{}", line),
            LogLevel::Warn => tracing::warn!(target: "log_layer::record", groups, "{}", line),
            LogLevel::Error => tracing::error!(target: "log_layer::record", groups, "{}", line),
            LogLevel::Fatal => {
                tracing::error!(target: "log_layer::record", groups, fatal = true, "{}", line)
            }
        }
        Ok(())
    }
}

impl From<TracingTransport> for TransportRef {
    fn from(transport: TracingTransport) -> Self {
        TransportRef::new(transport)
    }
}
