//! Bundled transport implementations

pub mod callback;
pub mod layout;
pub mod memory;
pub mod tracing;

pub use callback::FnTransport;
pub use layout::Layout;
pub use memory::MemoryTransport;
pub use self::tracing::TracingTransport;
