//! Core logger types and traits

pub mod composer;
mod dispatcher;
pub mod error;
pub mod extension;
pub mod fields;
pub mod groups;
pub mod lazy;
pub mod level_gate;
pub mod log_builder;
pub mod log_level;
pub mod log_record;
pub mod logger;
pub mod metrics;
pub mod plugin;
pub mod transport;
mod worker;

pub use composer::{default_error_serializer, ErrorSerializer, RecordComposer, DEFAULT_ERROR_FIELD_NAME};
pub use error::{BoxError, LoggerError, Result};
pub use extension::{Extension, Extensions};
pub use fields::{FieldValue, Fields};
pub use groups::{GroupConfig, GroupFilter, GroupRouter, TransportFilter, Ungrouped};
pub use lazy::{lazy, lazy_async, Lazy};
pub use level_gate::LevelGate;
pub use log_builder::{ErrorOnlyOptions, IntoGroups, IntoMessages, LogBuilder, RawEntry};
pub use log_level::LogLevel;
pub use log_record::{LogError, LogRecord};
pub use logger::{Logger, LoggerBuilder, Pending};
pub use metrics::LoggerMetrics;
pub use plugin::{
    DataOutParams, MessageOutParams, Plugin, PluginManager, ShouldSendParams,
    TransformLevelParams,
};
pub use transport::{AsyncTransport, Transport, TransportRef, TransportRegistry};
