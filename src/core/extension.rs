//! Named extension bundles assembled once when a logger is built
//!
//! An extension may contribute plugins and transports, and stays
//! reachable from the logger (and its children) by name and type.

use super::plugin::Plugin;
use super::transport::TransportRef;
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

pub trait Extension: Any + Send + Sync {
    fn name(&self) -> &str;

    /// Plugins registered after the builder's own plugins
    fn plugins(&self) -> Vec<Arc<dyn Plugin>> {
        Vec::new()
    }

    /// Transports registered after the builder's own transports
    fn transports(&self) -> Vec<TransportRef> {
        Vec::new()
    }
}

/// Read-only registry of the extensions a logger was built with
#[derive(Clone, Default)]
pub struct Extensions {
    by_name: HashMap<String, Arc<dyn Any + Send + Sync>>,
    order: Vec<String>,
}

impl Extensions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Later registrations replace earlier ones with the same name
    pub(crate) fn insert<E: Extension>(&mut self, extension: Arc<E>) {
        let name = extension.name().to_string();
        if !self.by_name.contains_key(&name) {
            self.order.push(name.clone());
        }
        self.by_name.insert(name, extension);
    }

    /// Look up an extension by name, checking its concrete type
    pub fn get<E: Extension>(&self, name: &str) -> Option<Arc<E>> {
        self.by_name
            .get(name)
            .and_then(|ext| Arc::clone(ext).downcast::<E>().ok())
    }

    pub fn names(&self) -> &[String] {
        &self.order
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

impl fmt::Debug for Extensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(&self.order).finish()
    }
}
