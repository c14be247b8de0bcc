//! # Rust Log Layer
//!
//! A transport-agnostic logging façade. Log calls carry messages plus
//! structured context, metadata and an error; the façade composes them
//! into one record and hands it to any number of transports.
//!
//! ## Features
//!
//! - **Level Gate**: gated-out calls do no work at all
//! - **Lazy Values**: context and metadata computed only when emitted,
//!   synchronously or asynchronously
//! - **Plugins**: six ordered hooks to rewrite, enrich, escalate or veto
//! - **Groups**: route tagged emissions to chosen transports
//! - **Isolation**: a failing transport never affects its siblings
//!
//! ## Example
//!
//! ```
//! use rust_log_layer::prelude::*;
//! use serde_json::json;
//!
//! let memory = MemoryTransport::new("memory");
//! let logger = Logger::builder()
//!     .level(LogLevel::Info)
//!     .transport(memory.clone())
//!     .build();
//!
//! logger.with_context(json!({"service": "billing"}));
//! logger.with_metadata(json!({"invoice": 42})).info("Invoice sent");
//! logger.debug("not emitted");
//!
//! assert_eq!(memory.len(), 1);
//! assert_eq!(memory.data()[0], json!({"service": "billing", "invoice": 42}));
//! ```

pub mod core;
pub mod macros;
pub mod transports;

pub mod prelude {
    pub use crate::core::{
        lazy, lazy_async, AsyncTransport, ErrorOnlyOptions, Extension, FieldValue, Fields,
        GroupConfig, GroupFilter, Lazy, LogError, LogLevel, LogRecord, Logger, LoggerBuilder,
        LoggerError, LoggerMetrics, Pending, Plugin, RawEntry, Result, Transport, TransportRef,
        Ungrouped,
    };
    pub use crate::transports::{FnTransport, Layout, MemoryTransport, TracingTransport};
}

pub use crate::core::{
    default_error_serializer, lazy, lazy_async, AsyncTransport, BoxError, DataOutParams,
    ErrorOnlyOptions, ErrorSerializer, Extension, Extensions, FieldValue, Fields, GroupConfig,
    GroupFilter, GroupRouter, IntoGroups, IntoMessages, Lazy, LevelGate, LogBuilder, LogError,
    LogLevel, LogRecord, Logger, LoggerBuilder, LoggerError, LoggerMetrics, MessageOutParams,
    Pending, Plugin, PluginManager, RawEntry, RecordComposer, Result, ShouldSendParams,
    TransformLevelParams, Transport, TransportFilter, TransportRef, TransportRegistry, Ungrouped,
    DEFAULT_ERROR_FIELD_NAME,
};
pub use transports::{FnTransport, Layout, MemoryTransport, TracingTransport};
