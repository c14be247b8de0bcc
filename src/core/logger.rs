//! Main logger implementation
//!
//! An emission flows through: level gate, lazy resolution, record
//! composition, message/data plugin hooks, level transform, group
//! routing, then per-transport veto and dispatch.

use super::{
    composer::{CompositionInput, RecordComposer},
    dispatcher,
    error::{LoggerError, Result},
    extension::{Extension, Extensions},
    fields::Fields,
    groups::{GroupConfig, GroupRouter, Ungrouped},
    lazy::{resolve_fields, resolve_sync_only, Resolution},
    level_gate::LevelGate,
    log_builder::{ErrorOnlyOptions, IntoGroups, IntoMessages, LogBuilder, RawEntry},
    log_level::LogLevel,
    log_record::{LogError, LogRecord},
    metrics::LoggerMetrics,
    plugin::{Plugin, PluginManager},
    transport::{AsyncTransport, TransportRef, TransportRegistry},
    worker::Worker,
};
use chrono::Utc;
use futures::channel::oneshot;
use futures::future::{BoxFuture, FutureExt};
use parking_lot::RwLock;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

/// Completion signal of an emission that resolves asynchronous lazy values
///
/// The emission is already running in the background when the call
/// returns: on the caller's Tokio runtime if there is one, on the logger's
/// worker thread otherwise. Awaiting only waits for it, and dropping this
/// does not cancel delivery.
#[must_use = "await to wait for the emission to be delivered"]
pub struct Pending {
    inner: BoxFuture<'static, ()>,
}

impl Pending {
    fn start(worker: &Worker, work: BoxFuture<'static, ()>) -> Self {
        let (done, finished) = oneshot::channel::<()>();
        worker.spawn(
            async move {
                work.await;
                let _ = done.send(());
            }
            .boxed(),
        );
        Self {
            inner: async move {
                let _ = finished.await;
            }
            .boxed(),
        }
    }
}

impl Future for Pending {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        self.inner.poll_unpin(cx)
    }
}

impl std::fmt::Debug for Pending {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Pending")
    }
}

/// Settings fixed at construction and shared with children
struct Settings {
    composer: RecordComposer,
    copy_msg_on_only_error: bool,
    console_debug: bool,
    extensions: Extensions,
    worker: Worker,
}

/// Per-instance state, copied into children
#[derive(Clone)]
struct LoggerState {
    gate: LevelGate,
    context: Fields,
    mute_context: bool,
    mute_metadata: bool,
    prefix: Option<String>,
    groups: Vec<String>,
}

/// Registries shared by reference between a logger and its children
#[derive(Clone)]
struct Shared {
    plugins: Arc<PluginManager>,
    transports: Arc<TransportRegistry>,
    router: Arc<GroupRouter>,
    metrics: Arc<LoggerMetrics>,
}

/// One call's worth of input to the pipeline
pub(crate) struct Emission {
    pub level: LogLevel,
    pub messages: Vec<Value>,
    pub metadata: Option<Fields>,
    pub error: Option<LogError>,
    pub context: Option<Fields>,
    pub groups: Vec<String>,
}

/// Everything needed to finish an emission once values are resolved
struct Job {
    settings: Arc<Settings>,
    shared: Shared,
    level: LogLevel,
    messages: Vec<Value>,
    error: Option<LogError>,
    groups: Vec<String>,
    mute_context: bool,
    mute_metadata: bool,
}

impl Job {
    fn finish(self, context: Map<String, Value>, metadata: Option<Map<String, Value>>) {
        let plugins = self.shared.plugins.snapshot();

        let data = self.settings.composer.compose(CompositionInput {
            context: &context,
            metadata: metadata.as_ref(),
            error: self.error.as_ref(),
            mute_context: self.mute_context,
            mute_metadata: self.mute_metadata,
        });
        let data = (!data.is_empty()).then_some(data);

        let (messages, data, level) = if plugins.is_empty() {
            (self.messages, data, self.level)
        } else {
            let messages = plugins.on_before_message_out(self.messages, self.level);
            let data = plugins.on_before_data_out(
                data,
                self.level,
                metadata.as_ref(),
                self.error.as_ref(),
                &context,
            );
            let level = plugins.transform_log_level(
                self.level,
                data.as_ref(),
                metadata.as_ref(),
                self.error.as_ref(),
            );
            (messages, data, level)
        };

        let filter = self.shared.router.route(&self.groups, level);
        if filter.is_nothing() {
            self.shared.metrics.record_unrouted();
            if self.settings.console_debug {
                tracing::debug!(target: "log_layer", groups = ?self.groups, %level, "no eligible transport");
            }
            return;
        }

        let record = LogRecord {
            level,
            messages,
            has_data: data.is_some(),
            data: data.unwrap_or_default(),
            error: self.error,
            metadata,
            context,
            groups: self.groups,
            timestamp: Utc::now(),
        };

        self.shared.metrics.record_emitted();
        let transports = self.shared.transports.snapshot();
        dispatcher::dispatch(
            &transports,
            &filter,
            &plugins,
            record,
            &self.shared.metrics,
            &self.settings.worker,
        );
    }

    fn drop_on_lazy_failure(&self, error: &LoggerError) {
        self.shared.metrics.record_lazy_failure();
        if self.settings.console_debug {
            tracing::debug!(target: "log_layer", %error, level = %self.level, "dropping emission");
        }
    }
}

/// The logging façade
///
/// Holds its own context and level gate; plugins, transports and group
/// routing are shared with every child created from it.
///
/// # Example
///
/// ```
/// use rust_log_layer::prelude::*;
/// use serde_json::json;
///
/// let memory = MemoryTransport::new("memory");
/// let logger = Logger::builder()
///     .transport(memory.clone())
///     .build();
///
/// logger.with_context(json!({"request_id": "abc"}));
/// logger.info("Request started");
///
/// let records = memory.records();
/// assert_eq!(records[0].data["request_id"], json!("abc"));
/// ```
pub struct Logger {
    settings: Arc<Settings>,
    state: RwLock<LoggerState>,
    shared: RwLock<Shared>,
}

impl Logger {
    /// Logger with default settings and no transports
    #[must_use]
    pub fn new() -> Self {
        LoggerBuilder::new().build()
    }

    /// Create a builder for Logger
    #[must_use]
    pub fn builder() -> LoggerBuilder {
        LoggerBuilder::new()
    }

    fn shared(&self) -> Shared {
        self.shared.read().clone()
    }

    /// Whether an emission at `level` passes the gate
    pub fn is_level_enabled(&self, level: LogLevel) -> bool {
        self.state.read().gate.is_level_enabled(level)
    }

    /// Turn the master switch on
    pub fn enable_logging(&self) -> &Self {
        self.state.write().gate.set_enabled(true);
        self
    }

    /// Turn the master switch off; nothing is emitted until re-enabled
    pub fn disable_logging(&self) -> &Self {
        self.state.write().gate.set_enabled(false);
        self
    }

    /// Set the minimum level; clears individual level overrides
    pub fn set_level(&self, level: LogLevel) -> &Self {
        self.state.write().gate.set_level(level);
        self
    }

    /// Current minimum level
    pub fn level(&self) -> LogLevel {
        self.state.read().gate.min_level()
    }

    /// Let `level` through regardless of the minimum
    pub fn enable_individual_level(&self, level: LogLevel) -> &Self {
        self.state.write().gate.enable_individual_level(level);
        self
    }

    /// Block `level` regardless of the minimum
    pub fn disable_individual_level(&self, level: LogLevel) -> &Self {
        self.state.write().gate.disable_individual_level(level);
        self
    }

    /// Merge fields into the stored context; later values win
    pub fn with_context(&self, context: impl Into<Fields>) -> &Self {
        let context = context.into();
        let plugins = self.shared().plugins.snapshot();
        let context = if plugins.is_empty() {
            Some(context)
        } else {
            plugins.on_context_called(context)
        };
        if let Some(context) = context {
            self.state.write().context.merge(context);
        }
        self
    }

    /// Remove the given keys, or everything when `keys` is `None`
    pub fn clear_context(&self, keys: Option<&[&str]>) -> &Self {
        let mut state = self.state.write();
        match keys {
            Some(keys) => {
                for key in keys {
                    state.context.remove(key);
                }
            }
            None => state.context.clear(),
        }
        self
    }

    /// Stored context, lazy values still wrapped
    pub fn get_context(&self) -> Fields {
        self.state.read().context.clone()
    }

    /// Stored context with synchronous lazy values resolved
    ///
    /// Asynchronous lazy values stay wrapped.
    pub fn get_context_resolved(&self) -> Result<Fields> {
        resolve_sync_only(&self.state.read().context)
    }

    /// Stored context with every lazy value resolved
    pub fn get_context_resolved_async(
        &self,
    ) -> impl Future<Output = Result<Map<String, Value>>> + Send + 'static {
        let resolution = resolve_fields(&self.state.read().context);
        async move {
            match resolution? {
                Resolution::Ready(map) => Ok(map),
                Resolution::Pending(fut) => fut.await,
            }
        }
    }

    /// Leave stored context out of emissions; it stays queryable
    pub fn mute_context(&self) -> &Self {
        self.state.write().mute_context = true;
        self
    }

    pub fn unmute_context(&self) -> &Self {
        self.state.write().mute_context = false;
        self
    }

    /// Leave per-call metadata out of emissions
    pub fn mute_metadata(&self) -> &Self {
        self.state.write().mute_metadata = true;
        self
    }

    pub fn unmute_metadata(&self) -> &Self {
        self.state.write().mute_metadata = false;
        self
    }

    /// New logger with a copy of this logger's context and level state,
    /// sharing plugins, transports and groups
    #[must_use]
    pub fn child(&self) -> Logger {
        Logger {
            settings: Arc::clone(&self.settings),
            state: RwLock::new(self.state.read().clone()),
            shared: RwLock::new(self.shared()),
        }
    }

    /// Child logger whose string messages are prefixed
    #[must_use]
    pub fn with_prefix(&self, prefix: impl Into<String>) -> Logger {
        let child = self.child();
        child.state.write().prefix = Some(prefix.into());
        child
    }

    /// Child logger tagging every emission with `groups`
    #[must_use]
    pub fn with_group(&self, groups: impl IntoGroups) -> Logger {
        let child = self.child();
        {
            let mut state = child.state.write();
            for group in groups.into_groups() {
                if !state.groups.contains(&group) {
                    state.groups.push(group);
                }
            }
        }
        child
    }

    /// Groups every emission of this logger is tagged with
    pub fn default_groups(&self) -> Vec<String> {
        self.state.read().groups.clone()
    }

    pub fn prefix(&self) -> Option<String> {
        self.state.read().prefix.clone()
    }

    /// Start a call carrying one-off metadata
    pub fn with_metadata(&self, metadata: impl Into<Fields>) -> LogBuilder<'_> {
        LogBuilder::new(self).with_metadata(metadata)
    }

    /// Start a call carrying an error
    pub fn with_error(&self, error: impl Into<LogError>) -> LogBuilder<'_> {
        LogBuilder::new(self).with_error(error)
    }

    pub fn trace(&self, messages: impl IntoMessages) -> Option<Pending> {
        self.log(LogLevel::Trace, messages)
    }

    pub fn debug(&self, messages: impl IntoMessages) -> Option<Pending> {
        self.log(LogLevel::Debug, messages)
    }

    pub fn info(&self, messages: impl IntoMessages) -> Option<Pending> {
        self.log(LogLevel::Info, messages)
    }

    pub fn warn(&self, messages: impl IntoMessages) -> Option<Pending> {
        self.log(LogLevel::Warn, messages)
    }

    pub fn error(&self, messages: impl IntoMessages) -> Option<Pending> {
        self.log(LogLevel::Error, messages)
    }

    pub fn fatal(&self, messages: impl IntoMessages) -> Option<Pending> {
        self.log(LogLevel::Fatal, messages)
    }

    /// Emit at a level chosen at runtime
    ///
    /// Returns `None` when the emission completed synchronously (or was
    /// gated out) and `Some` when asynchronous lazy values are involved.
    pub fn log(&self, level: LogLevel, messages: impl IntoMessages) -> Option<Pending> {
        if !self.is_level_enabled(level) {
            return None;
        }
        let messages = self.apply_prefix(messages.into_messages());
        self.emit(Emission {
            level,
            messages,
            metadata: None,
            error: None,
            context: None,
            groups: Vec::new(),
        })
    }

    /// Log only an error, by default at error level
    pub fn error_only(&self, error: impl Into<LogError>, opts: ErrorOnlyOptions) -> Option<Pending> {
        let level = opts.level.unwrap_or(LogLevel::Error);
        if !self.is_level_enabled(level) {
            return None;
        }
        let error = error.into();
        let copy_msg = opts.copy_msg.unwrap_or(self.settings.copy_msg_on_only_error);
        let messages = if copy_msg {
            vec![Value::String(error.message())]
        } else {
            Vec::new()
        };
        self.emit(Emission {
            level,
            messages,
            metadata: None,
            error: Some(error),
            context: None,
            groups: Vec::new(),
        })
    }

    /// Log only metadata at info level; empty metadata emits nothing
    pub fn metadata_only(&self, metadata: impl Into<Fields>) -> Option<Pending> {
        self.metadata_only_at(metadata, LogLevel::Info)
    }

    pub fn metadata_only_at(&self, metadata: impl Into<Fields>, level: LogLevel) -> Option<Pending> {
        if !self.is_level_enabled(level) || self.state.read().mute_metadata {
            return None;
        }
        let metadata = metadata.into();
        if metadata.is_empty() {
            return None;
        }
        let metadata = self.apply_metadata_hooks(metadata)?;
        self.emit(Emission {
            level,
            messages: Vec::new(),
            metadata: Some(metadata),
            error: None,
            context: None,
            groups: Vec::new(),
        })
    }

    /// Emit a fully specified entry, bypassing prefix and call-time hooks
    ///
    /// A `context` on the entry replaces stored context for this
    /// emission only.
    pub fn raw(&self, entry: RawEntry) -> Option<Pending> {
        if !self.is_level_enabled(entry.level) {
            return None;
        }
        self.emit(Emission {
            level: entry.level,
            messages: entry.messages,
            metadata: entry.metadata,
            error: entry.error,
            context: entry.context,
            groups: entry.groups,
        })
    }

    pub(crate) fn apply_prefix(&self, mut messages: Vec<Value>) -> Vec<Value> {
        if let Some(prefix) = &self.state.read().prefix {
            if let Some(Value::String(first)) = messages.first_mut() {
                *first = format!("{} {}", prefix, first);
            }
        }
        messages
    }

    pub(crate) fn apply_metadata_hooks(&self, metadata: Fields) -> Option<Fields> {
        let plugins = self.shared().plugins.snapshot();
        if plugins.is_empty() {
            return Some(metadata);
        }
        plugins.on_metadata_called(metadata)
    }

    /// Run the pipeline for an emission that already passed the gate
    pub(crate) fn emit(&self, emission: Emission) -> Option<Pending> {
        let (context, mute_context, mute_metadata, groups) = {
            let state = self.state.read();
            let context = if state.mute_context {
                Fields::new()
            } else {
                emission.context.unwrap_or_else(|| state.context.clone())
            };
            let mut groups = state.groups.clone();
            for group in emission.groups {
                if !groups.contains(&group) {
                    groups.push(group);
                }
            }
            (context, state.mute_context, state.mute_metadata, groups)
        };
        let metadata = if mute_metadata { None } else { emission.metadata };

        let job = Job {
            settings: Arc::clone(&self.settings),
            shared: self.shared(),
            level: emission.level,
            messages: emission.messages,
            error: emission.error,
            groups,
            mute_context,
            mute_metadata,
        };

        let context = match resolve_fields(&context) {
            Ok(resolution) => resolution,
            Err(e) => {
                job.drop_on_lazy_failure(&e);
                return None;
            }
        };
        let metadata = match metadata.as_ref().map(resolve_fields).transpose() {
            Ok(resolution) => resolution,
            Err(e) => {
                job.drop_on_lazy_failure(&e);
                return None;
            }
        };

        match (context, metadata) {
            (Resolution::Ready(context), None) => {
                job.finish(context, None);
                None
            }
            (Resolution::Ready(context), Some(Resolution::Ready(metadata))) => {
                job.finish(context, Some(metadata));
                None
            }
            (context, metadata) => Some(Pending::start(
                &self.settings.worker,
                async move {
                    let context = match context {
                        Resolution::Ready(map) => Ok(map),
                        Resolution::Pending(fut) => fut.await,
                    };
                    let metadata = match metadata {
                        None => Ok(None),
                        Some(Resolution::Ready(map)) => Ok(Some(map)),
                        Some(Resolution::Pending(fut)) => fut.await.map(Some),
                    };
                    match (context, metadata) {
                        (Ok(context), Ok(metadata)) => job.finish(context, metadata),
                        (Err(e), _) | (_, Err(e)) => job.drop_on_lazy_failure(&e),
                    }
                }
                .boxed(),
            )),
        }
    }

    /// Register a plugin; returns its id (generated when the plugin has none)
    pub fn add_plugin(&self, plugin: Arc<dyn Plugin>) -> String {
        self.shared().plugins.add(plugin)
    }

    pub fn add_plugins(&self, plugins: Vec<Arc<dyn Plugin>>) -> &Self {
        let manager = self.shared().plugins;
        for plugin in plugins {
            manager.add(plugin);
        }
        self
    }

    pub fn remove_plugin(&self, id: &str) -> bool {
        self.shared().plugins.remove(id)
    }

    pub fn enable_plugin(&self, id: &str) -> bool {
        self.shared().plugins.enable(id)
    }

    pub fn disable_plugin(&self, id: &str) -> bool {
        self.shared().plugins.disable(id)
    }

    pub fn plugin_ids(&self) -> Vec<String> {
        self.shared().plugins.ids()
    }

    /// Replace the plugin list of this logger only
    ///
    /// Detaches this logger from the list it shared with its parent and
    /// children.
    pub fn with_fresh_plugins(&self, plugins: Vec<Arc<dyn Plugin>>) -> &Self {
        self.shared.write().plugins = Arc::new(PluginManager::with_plugins(plugins));
        self
    }

    /// Register a transport, replacing one with the same id
    pub fn add_transport(&self, transport: impl Into<TransportRef>) -> &Self {
        self.shared().transports.add(transport.into());
        self
    }

    pub fn add_async_transport<T: AsyncTransport + 'static>(&self, transport: T) -> &Self {
        self.shared().transports.add(TransportRef::new_async(transport));
        self
    }

    pub fn remove_transport(&self, id: &str) -> bool {
        self.shared().transports.remove(id)
    }

    pub fn transport(&self, id: &str) -> Option<TransportRef> {
        self.shared().transports.get(id)
    }

    pub fn transport_ids(&self) -> Vec<String> {
        self.shared().transports.ids()
    }

    /// Replace the transports of this logger only
    pub fn with_fresh_transports(&self, transports: Vec<TransportRef>) -> &Self {
        self.shared.write().transports = Arc::new(TransportRegistry::with_transports(transports));
        self
    }

    /// Wait for in-flight asynchronous emissions and deliveries, then
    /// flush every transport, continuing past failures
    ///
    /// Returns the first failure encountered. Must not be awaited from
    /// inside a transport.
    pub async fn flush(&self) -> Result<()> {
        self.settings.worker.wait_idle().await;
        let transports = self.shared().transports.snapshot();
        let mut first_error = None;
        for transport in transports.iter() {
            let outcome = match transport {
                TransportRef::Sync(t) => t.flush(),
                TransportRef::Async(t) => t.flush().await,
            };
            if let Err(e) = outcome {
                tracing::warn!(target: "log_layer", transport = transport.id(), error = %e, "flush failed");
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    /// Flush and close every transport, then stop the worker thread
    ///
    /// The owner calls this once on every exit path; transports shared
    /// with children are closed for them too.
    pub async fn shutdown(&self) -> Result<()> {
        let flushed = self.flush().await;
        let transports = self.shared().transports.snapshot();
        let mut first_error = None;
        for transport in transports.iter() {
            let outcome = match transport {
                TransportRef::Sync(t) => t.close(),
                TransportRef::Async(t) => t.close().await,
            };
            if let Err(e) = outcome {
                tracing::warn!(target: "log_layer", transport = transport.id(), error = %e, "close failed");
                first_error.get_or_insert(e);
            }
        }
        self.settings.worker.stop();
        flushed?;
        first_error.map_or(Ok(()), Err)
    }

    pub fn add_group(&self, name: impl Into<String>, config: GroupConfig) -> &Self {
        self.shared().router.add_group(name, config);
        self
    }

    pub fn remove_group(&self, name: &str) -> bool {
        self.shared().router.remove_group(name)
    }

    pub fn enable_group(&self, name: &str) -> bool {
        self.shared().router.enable_group(name)
    }

    pub fn disable_group(&self, name: &str) -> bool {
        self.shared().router.disable_group(name)
    }

    pub fn set_group_level(&self, name: &str, level: Option<LogLevel>) -> bool {
        self.shared().router.set_group_level(name, level)
    }

    pub fn set_active_groups<I, S>(&self, names: I) -> &Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.shared().router.set_active_groups(names);
        self
    }

    pub fn clear_active_groups(&self) -> &Self {
        self.shared().router.clear_active_groups();
        self
    }

    pub fn set_ungrouped(&self, ungrouped: Ungrouped) -> &Self {
        self.shared().router.set_ungrouped(ungrouped);
        self
    }

    /// Copy of the group definitions
    pub fn groups(&self) -> HashMap<String, GroupConfig> {
        self.shared().router.groups()
    }

    pub fn active_groups(&self) -> Option<Vec<String>> {
        self.shared().router.active_groups()
    }

    /// Metrics shared by this logger and its children
    pub fn metrics(&self) -> Arc<LoggerMetrics> {
        self.shared().metrics
    }

    /// Look up an extension registered on the builder
    pub fn extension<E: Extension>(&self, name: &str) -> Option<Arc<E>> {
        self.settings.extensions.get(name)
    }

    pub fn extensions(&self) -> &Extensions {
        &self.settings.extensions
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for constructing Logger with a fluent API
///
/// # Example
/// ```
/// use rust_log_layer::prelude::*;
///
/// let logger = Logger::builder()
///     .level(LogLevel::Debug)
///     .context_field_name("ctx")
///     .group("db", GroupConfig::new(["db-file"]).with_level(LogLevel::Warn))
///     .ungrouped(Ungrouped::All)
///     .transport(MemoryTransport::new("db-file"))
///     .build();
///
/// assert!(logger.is_level_enabled(LogLevel::Debug));
/// ```
pub struct LoggerBuilder {
    enabled: bool,
    level: LogLevel,
    composer: RecordComposer,
    copy_msg_on_only_error: bool,
    mute_context: bool,
    mute_metadata: bool,
    console_debug: bool,
    prefix: Option<String>,
    context: Fields,
    groups: HashMap<String, GroupConfig>,
    active_groups: Option<Vec<String>>,
    ungrouped: Ungrouped,
    group_filter: Option<String>,
    plugins: Vec<Arc<dyn Plugin>>,
    transports: Vec<TransportRef>,
    extensions: Extensions,
    extension_plugins: Vec<Arc<dyn Plugin>>,
    extension_transports: Vec<TransportRef>,
}

impl LoggerBuilder {
    /// Create a new builder with default values
    pub fn new() -> Self {
        Self {
            enabled: true,
            level: LogLevel::Trace,
            composer: RecordComposer::new(),
            copy_msg_on_only_error: false,
            mute_context: false,
            mute_metadata: false,
            console_debug: false,
            prefix: None,
            context: Fields::new(),
            groups: HashMap::new(),
            active_groups: None,
            ungrouped: Ungrouped::All,
            group_filter: None,
            plugins: Vec::new(),
            transports: Vec::new(),
            extensions: Extensions::new(),
            extension_plugins: Vec::new(),
            extension_transports: Vec::new(),
        }
    }

    #[must_use = "builder methods return a new value"]
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Minimum level (default: trace, everything passes)
    #[must_use = "builder methods return a new value"]
    pub fn level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    /// Field name for the error (default: `err`)
    #[must_use = "builder methods return a new value"]
    pub fn error_field_name(mut self, name: impl Into<String>) -> Self {
        self.composer = self.composer.with_error_field_name(name);
        self
    }

    /// Nest context under this field instead of merging it at the top level
    #[must_use = "builder methods return a new value"]
    pub fn context_field_name(mut self, name: impl Into<String>) -> Self {
        self.composer = self.composer.with_context_field_name(Some(name.into()));
        self
    }

    /// Nest metadata under this field instead of merging it at the top level
    #[must_use = "builder methods return a new value"]
    pub fn metadata_field_name(mut self, name: impl Into<String>) -> Self {
        self.composer = self.composer.with_metadata_field_name(Some(name.into()));
        self
    }

    /// Place the serialized error inside the metadata namespace
    #[must_use = "builder methods return a new value"]
    pub fn error_field_in_metadata(mut self, in_metadata: bool) -> Self {
        self.composer = self.composer.with_error_field_in_metadata(in_metadata);
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn error_serializer<F>(mut self, serializer: F) -> Self
    where
        F: Fn(&LogError) -> Value + Send + Sync + 'static,
    {
        self.composer = self.composer.with_error_serializer(Arc::new(serializer));
        self
    }

    /// Default for [`ErrorOnlyOptions::copy_msg`]
    #[must_use = "builder methods return a new value"]
    pub fn copy_msg_on_only_error(mut self, copy: bool) -> Self {
        self.copy_msg_on_only_error = copy;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn mute_context(mut self, mute: bool) -> Self {
        self.mute_context = mute;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn mute_metadata(mut self, mute: bool) -> Self {
        self.mute_metadata = mute;
        self
    }

    /// Report dropped emissions on the `log_layer` tracing target
    #[must_use = "builder methods return a new value"]
    pub fn console_debug(mut self, debug: bool) -> Self {
        self.console_debug = debug;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Initial context; plugin context hooks do not run for it
    #[must_use = "builder methods return a new value"]
    pub fn context(mut self, context: impl Into<Fields>) -> Self {
        self.context.merge(context.into());
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn group(mut self, name: impl Into<String>, config: GroupConfig) -> Self {
        self.groups.insert(name.into(), config);
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn groups(mut self, groups: HashMap<String, GroupConfig>) -> Self {
        self.groups.extend(groups);
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn active_groups<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.active_groups = Some(names.into_iter().map(Into::into).collect());
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn ungrouped(mut self, ungrouped: Ungrouped) -> Self {
        self.ungrouped = ungrouped;
        self
    }

    /// `name[:level],...` string restricting active groups and overriding
    /// group levels; malformed entries are skipped
    #[must_use = "builder methods return a new value"]
    pub fn group_filter(mut self, filter: impl Into<String>) -> Self {
        self.group_filter = Some(filter.into());
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn plugin<P: Plugin + 'static>(mut self, plugin: P) -> Self {
        self.plugins.push(Arc::new(plugin));
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn plugins(mut self, plugins: Vec<Arc<dyn Plugin>>) -> Self {
        self.plugins.extend(plugins);
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn transport(mut self, transport: impl Into<TransportRef>) -> Self {
        self.transports.push(transport.into());
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn async_transport<T: AsyncTransport + 'static>(mut self, transport: T) -> Self {
        self.transports.push(TransportRef::new_async(transport));
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn transports(mut self, transports: Vec<TransportRef>) -> Self {
        self.transports.extend(transports);
        self
    }

    /// Register an extension bundle together with its plugins and transports
    #[must_use = "builder methods return a new value"]
    pub fn extension<E: Extension>(mut self, extension: E) -> Self {
        let extension = Arc::new(extension);
        self.extension_plugins.extend(extension.plugins());
        self.extension_transports.extend(extension.transports());
        self.extensions.insert(extension);
        self
    }

    /// Build the Logger
    pub fn build(self) -> Logger {
        let mut gate = LevelGate::new(self.level);
        gate.set_enabled(self.enabled);

        let router = GroupRouter::with_groups(self.groups, self.active_groups, self.ungrouped);
        if let Some(filter) = &self.group_filter {
            router.apply_filter(&super::groups::GroupFilter::parse_lenient(filter));
        }

        let mut plugins = self.plugins;
        plugins.extend(self.extension_plugins);
        let mut transports = self.transports;
        transports.extend(self.extension_transports);

        Logger {
            settings: Arc::new(Settings {
                composer: self.composer,
                copy_msg_on_only_error: self.copy_msg_on_only_error,
                console_debug: self.console_debug,
                extensions: self.extensions,
                worker: Worker::new(),
            }),
            state: RwLock::new(LoggerState {
                gate,
                context: self.context,
                mute_context: self.mute_context,
                mute_metadata: self.mute_metadata,
                prefix: self.prefix,
                groups: Vec::new(),
            }),
            shared: RwLock::new(Shared {
                plugins: Arc::new(PluginManager::with_plugins(plugins)),
                transports: Arc::new(TransportRegistry::with_transports(transports)),
                router: Arc::new(router),
                metrics: Arc::new(LoggerMetrics::new()),
            }),
        }
    }
}

impl Default for LoggerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
