//! Transport backed by a closure

use crate::core::{LogRecord, Result, Transport, TransportRef};

/// Transport that hands each record to a closure
///
/// # Example
///
/// ```
/// use rust_log_layer::prelude::*;
///
/// let printer = FnTransport::new("stdout", |record: &LogRecord| {
///     println!("{} {}", record.level, record.message_text());
///     Ok(())
/// });
///
/// let logger = Logger::builder().transport(printer).build();
/// logger.info("hello");
/// ```
pub struct FnTransport<F> {
    id: String,
    send: F,
}

impl<F> FnTransport<F>
where
    F: Fn(&LogRecord) -> Result<()> + Send + Sync + 'static,
{
    pub fn new(id: impl Into<String>, send: F) -> Self {
        Self {
            id: id.into(),
            send,
        }
    }
}

impl<F> Transport for FnTransport<F>
where
    F: Fn(&LogRecord) -> Result<()> + Send + Sync + 'static,
{
    fn id(&self) -> &str {
        &self.id
    }

    fn send(&self, record: &LogRecord) -> Result<()> {
        (self.send)(record)
    }
}

impl<F> From<FnTransport<F>> for TransportRef
where
    F: Fn(&LogRecord) -> Result<()> + Send + Sync + 'static,
{
    fn from(transport: FnTransport<F>) -> Self {
        TransportRef::new(transport)
    }
}
