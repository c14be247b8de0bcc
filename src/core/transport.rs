//! Transport traits and the shared transport registry
//!
//! A transport is an external sink for finished records. Synchronous
//! transports implement [`Transport`]; transports whose emission is
//! asynchronous implement [`AsyncTransport`].

use super::error::Result;
use super::log_record::LogRecord;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::sync::Arc;

pub trait Transport: Send + Sync {
    fn id(&self) -> &str;

    /// Disabled transports never receive records
    fn enabled(&self) -> bool {
        true
    }

    fn send(&self, record: &LogRecord) -> Result<()>;

    fn flush(&self) -> Result<()> {
        Ok(())
    }

    /// Release timers, streams or handles held by the transport
    fn close(&self) -> Result<()> {
        Ok(())
    }
}

/// Trait for transports with asynchronous emission
///
/// # Example
///
/// ```no_run
/// use rust_log_layer::{AsyncTransport, LogRecord, Result};
/// use async_trait::async_trait;
///
/// struct Collector;
///
/// #[async_trait]
/// impl AsyncTransport for Collector {
///     fn id(&self) -> &str {
///         "collector"
///     }
///
///     async fn send(&self, record: &LogRecord) -> Result<()> {
///         // Ship the record somewhere
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait AsyncTransport: Send + Sync {
    fn id(&self) -> &str;

    fn enabled(&self) -> bool {
        true
    }

    async fn send(&self, record: &LogRecord) -> Result<()>;

    async fn flush(&self) -> Result<()> {
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}

/// A registered transport of either kind
#[derive(Clone)]
pub enum TransportRef {
    Sync(Arc<dyn Transport>),
    Async(Arc<dyn AsyncTransport>),
}

impl TransportRef {
    pub fn new<T: Transport + 'static>(transport: T) -> Self {
        TransportRef::Sync(Arc::new(transport))
    }

    pub fn new_async<T: AsyncTransport + 'static>(transport: T) -> Self {
        TransportRef::Async(Arc::new(transport))
    }

    pub fn id(&self) -> &str {
        match self {
            TransportRef::Sync(t) => t.id(),
            TransportRef::Async(t) => t.id(),
        }
    }

    pub fn enabled(&self) -> bool {
        match self {
            TransportRef::Sync(t) => t.enabled(),
            TransportRef::Async(t) => t.enabled(),
        }
    }
}

impl std::fmt::Debug for TransportRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransportRef::Sync(t) => write!(f, "TransportRef::Sync({})", t.id()),
            TransportRef::Async(t) => write!(f, "TransportRef::Async({})", t.id()),
        }
    }
}

impl<T: Transport + 'static> From<Arc<T>> for TransportRef {
    fn from(transport: Arc<T>) -> Self {
        TransportRef::Sync(transport)
    }
}

/// Transports keyed by id, in registration order
#[derive(Debug)]
pub struct TransportRegistry {
    transports: RwLock<Arc<[TransportRef]>>,
}

impl TransportRegistry {
    pub fn new() -> Self {
        Self::with_transports(Vec::new())
    }

    /// Later entries replace earlier ones with the same id
    pub fn with_transports(transports: Vec<TransportRef>) -> Self {
        let registry = Self {
            transports: RwLock::new(Arc::from(Vec::new())),
        };
        for transport in transports {
            registry.add(transport);
        }
        registry
    }

    /// Register a transport, replacing any with the same id
    pub fn add(&self, transport: TransportRef) {
        let mut guard = self.transports.write();
        let mut list: Vec<TransportRef> = guard.iter().cloned().collect();
        match list.iter_mut().find(|t| t.id() == transport.id()) {
            Some(existing) => *existing = transport,
            None => list.push(transport),
        }
        *guard = Arc::from(list);
    }

    pub fn remove(&self, id: &str) -> bool {
        let mut guard = self.transports.write();
        let list: Vec<TransportRef> = guard.iter().filter(|t| t.id() != id).cloned().collect();
        let removed = list.len() != guard.len();
        *guard = Arc::from(list);
        removed
    }

    pub fn get(&self, id: &str) -> Option<TransportRef> {
        self.transports.read().iter().find(|t| t.id() == id).cloned()
    }

    pub fn ids(&self) -> Vec<String> {
        self.transports
            .read()
            .iter()
            .map(|t| t.id().to_string())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.transports.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.transports.read().is_empty()
    }

    pub(crate) fn snapshot(&self) -> Arc<[TransportRef]> {
        Arc::clone(&self.transports.read())
    }
}

impl Default for TransportRegistry {
    fn default() -> Self {
        Self::new()
    }
}
