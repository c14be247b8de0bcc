//! Plugin hooks and the ordered plugin pipeline
//!
//! Plugins run in registration order. Every hook has a permissive
//! default, so a plugin implements only the hooks it cares about.

use super::fields::Fields;
use super::log_level::LogLevel;
use super::log_record::LogError;
use parking_lot::RwLock;
use serde_json::{Map, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Input of [`Plugin::on_before_message_out`]
#[derive(Debug)]
pub struct MessageOutParams<'a> {
    pub messages: &'a [Value],
    pub level: LogLevel,
}

/// Input of [`Plugin::on_before_data_out`]
#[derive(Debug)]
pub struct DataOutParams<'a> {
    pub data: Option<&'a Map<String, Value>>,
    pub level: LogLevel,
    pub metadata: Option<&'a Map<String, Value>>,
    pub error: Option<&'a LogError>,
    pub context: &'a Map<String, Value>,
}

/// Input of [`Plugin::transform_log_level`]
#[derive(Debug)]
pub struct TransformLevelParams<'a> {
    pub level: LogLevel,
    pub data: Option<&'a Map<String, Value>>,
    pub metadata: Option<&'a Map<String, Value>>,
    pub error: Option<&'a LogError>,
}

/// Input of [`Plugin::should_send_to_logger`]
#[derive(Debug)]
pub struct ShouldSendParams<'a> {
    pub messages: &'a [Value],
    pub data: Option<&'a Map<String, Value>>,
    pub level: LogLevel,
    pub transport_id: &'a str,
    pub groups: &'a [String],
}

/// A set of hooks into the emission pipeline
///
/// # Example
///
/// ```
/// use rust_log_layer::{LogLevel, Plugin, TransformLevelParams};
///
/// struct Escalate;
///
/// impl Plugin for Escalate {
///     fn id(&self) -> Option<&str> {
///         Some("escalate")
///     }
///
///     fn transform_log_level(&self, params: &TransformLevelParams<'_>) -> Option<LogLevel> {
///         params.error.map(|_| LogLevel::Error)
///     }
/// }
/// ```
pub trait Plugin: Send + Sync {
    /// Stable id used to enable, disable or remove the plugin
    fn id(&self) -> Option<&str> {
        None
    }

    /// Rewrite context passed to `with_context`; `None` drops the update
    fn on_context_called(&self, context: Fields) -> Option<Fields> {
        Some(context)
    }

    /// Rewrite per-call metadata; `None` drops the metadata
    fn on_metadata_called(&self, metadata: Fields) -> Option<Fields> {
        Some(metadata)
    }

    /// Replace the outgoing messages; `None` keeps them
    fn on_before_message_out(&self, _params: &MessageOutParams<'_>) -> Option<Vec<Value>> {
        None
    }

    /// Fields to merge into the outgoing data; `None` adds nothing
    fn on_before_data_out(&self, _params: &DataOutParams<'_>) -> Option<Map<String, Value>> {
        None
    }

    /// Opinion on the emitted level; `None` means no opinion
    fn transform_log_level(&self, _params: &TransformLevelParams<'_>) -> Option<LogLevel> {
        None
    }

    /// Veto delivery to one transport by returning `false`
    fn should_send_to_logger(&self, _params: &ShouldSendParams<'_>) -> bool {
        true
    }
}

struct Registered {
    id: String,
    plugin: Arc<dyn Plugin>,
    enabled: bool,
}

/// Ordered registry of plugins
///
/// Hooks run against a snapshot of the enabled plugins taken when an
/// emission starts, so registry changes only affect later emissions.
pub struct PluginManager {
    registered: RwLock<Vec<Registered>>,
    active: RwLock<Arc<[Arc<dyn Plugin>]>>,
    next_id: AtomicU64,
}

impl PluginManager {
    pub fn new() -> Self {
        Self {
            registered: RwLock::new(Vec::new()),
            active: RwLock::new(Arc::from(Vec::new())),
            next_id: AtomicU64::new(0),
        }
    }

    pub fn with_plugins(plugins: Vec<Arc<dyn Plugin>>) -> Self {
        let manager = Self::new();
        for plugin in plugins {
            manager.add(plugin);
        }
        manager
    }

    /// Register a plugin and return its id
    ///
    /// A plugin whose id is already registered replaces the previous one
    /// in place.
    pub fn add(&self, plugin: Arc<dyn Plugin>) -> String {
        let id = match plugin.id() {
            Some(id) => id.to_string(),
            None => format!("plugin-{}", self.next_id.fetch_add(1, Ordering::Relaxed)),
        };

        let mut registered = self.registered.write();
        let entry = Registered {
            id: id.clone(),
            plugin,
            enabled: true,
        };
        match registered.iter_mut().find(|r| r.id == id) {
            Some(existing) => *existing = entry,
            None => registered.push(entry),
        }
        self.refresh(&registered);
        id
    }

    pub fn remove(&self, id: &str) -> bool {
        let mut registered = self.registered.write();
        let before = registered.len();
        registered.retain(|r| r.id != id);
        let removed = registered.len() != before;
        self.refresh(&registered);
        removed
    }

    pub fn enable(&self, id: &str) -> bool {
        self.set_enabled(id, true)
    }

    pub fn disable(&self, id: &str) -> bool {
        self.set_enabled(id, false)
    }

    pub fn is_enabled(&self, id: &str) -> Option<bool> {
        self.registered
            .read()
            .iter()
            .find(|r| r.id == id)
            .map(|r| r.enabled)
    }

    pub fn ids(&self) -> Vec<String> {
        self.registered.read().iter().map(|r| r.id.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.registered.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.registered.read().is_empty()
    }

    fn set_enabled(&self, id: &str, enabled: bool) -> bool {
        let mut registered = self.registered.write();
        let found = match registered.iter_mut().find(|r| r.id == id) {
            Some(entry) => {
                entry.enabled = enabled;
                true
            }
            None => false,
        };
        self.refresh(&registered);
        found
    }

    fn refresh(&self, registered: &[Registered]) {
        let active: Vec<Arc<dyn Plugin>> = registered
            .iter()
            .filter(|r| r.enabled)
            .map(|r| Arc::clone(&r.plugin))
            .collect();
        *self.active.write() = Arc::from(active);
    }

    /// Snapshot of the enabled plugins in registration order
    pub(crate) fn snapshot(&self) -> PluginChain {
        PluginChain {
            plugins: Arc::clone(&self.active.read()),
        }
    }
}

impl Default for PluginManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Enabled plugins captured for one call
#[derive(Clone)]
pub(crate) struct PluginChain {
    plugins: Arc<[Arc<dyn Plugin>]>,
}

impl PluginChain {
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    pub fn on_context_called(&self, context: Fields) -> Option<Fields> {
        self.plugins
            .iter()
            .try_fold(context, |ctx, plugin| plugin.on_context_called(ctx))
    }

    pub fn on_metadata_called(&self, metadata: Fields) -> Option<Fields> {
        self.plugins
            .iter()
            .try_fold(metadata, |meta, plugin| plugin.on_metadata_called(meta))
    }

    pub fn on_before_message_out(&self, mut messages: Vec<Value>, level: LogLevel) -> Vec<Value> {
        for plugin in self.plugins.iter() {
            let params = MessageOutParams {
                messages: &messages,
                level,
            };
            if let Some(replaced) = plugin.on_before_message_out(&params) {
                messages = replaced;
            }
        }
        messages
    }

    /// Returns the data with every plugin's additions merged in
    pub fn on_before_data_out(
        &self,
        mut data: Option<Map<String, Value>>,
        level: LogLevel,
        metadata: Option<&Map<String, Value>>,
        error: Option<&LogError>,
        context: &Map<String, Value>,
    ) -> Option<Map<String, Value>> {
        for plugin in self.plugins.iter() {
            let params = DataOutParams {
                data: data.as_ref(),
                level,
                metadata,
                error,
                context,
            };
            match plugin.on_before_data_out(&params) {
                Some(additions) if !additions.is_empty() => {
                    data.get_or_insert_with(Map::new).extend(additions);
                }
                _ => {}
            }
        }
        data
    }

    /// Last concrete opinion wins; `level` is kept when nobody has one
    pub fn transform_log_level(
        &self,
        level: LogLevel,
        data: Option<&Map<String, Value>>,
        metadata: Option<&Map<String, Value>>,
        error: Option<&LogError>,
    ) -> LogLevel {
        let params = TransformLevelParams {
            level,
            data,
            metadata,
            error,
        };
        self.plugins
            .iter()
            .filter_map(|plugin| plugin.transform_log_level(&params))
            .last()
            .unwrap_or(level)
    }

    pub fn should_send_to_logger(&self, params: &ShouldSendParams<'_>) -> bool {
        self.plugins
            .iter()
            .all(|plugin| plugin.should_send_to_logger(params))
    }
}
