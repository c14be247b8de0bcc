//! Error types for the logger system

pub type Result<T> = std::result::Result<T, LoggerError>;

/// Boxed error returned by fallible lazy producers and transports
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, thiserror::Error)]
pub enum LoggerError {
    /// A lazy producer returned an error
    #[error("Lazy value '{key}' failed to resolve: {source}")]
    LazyResolution {
        key: String,
        #[source]
        source: BoxError,
    },

    /// A lazy producer panicked
    #[error("Lazy value '{key}' panicked: {message}")]
    LazyPanic { key: String, message: String },

    /// A transport returned an error while emitting
    #[error("Transport '{transport_id}' failed: {message}")]
    TransportFailure {
        transport_id: String,
        message: String,
    },

    /// A transport panicked while emitting
    #[error("Transport '{transport_id}' panicked: {message}")]
    TransportPanic {
        transport_id: String,
        message: String,
    },

    /// Unknown log level name
    #[error("Invalid log level: '{0}'")]
    InvalidLevel(String),

    /// Malformed group filter string
    #[error("Invalid group filter entry '{entry}': {message}")]
    InvalidGroupFilter { entry: String, message: String },

    /// JSON serialization error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl LoggerError {
    /// Create a lazy resolution error for the given field
    pub fn lazy_resolution(key: impl Into<String>, source: BoxError) -> Self {
        LoggerError::LazyResolution {
            key: key.into(),
            source,
        }
    }

    /// Create a lazy panic error for the given field
    pub fn lazy_panic(key: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::LazyPanic {
            key: key.into(),
            message: message.into(),
        }
    }

    /// Create a transport failure error
    pub fn transport(transport_id: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::TransportFailure {
            transport_id: transport_id.into(),
            message: message.into(),
        }
    }

    /// Create a transport panic error
    pub fn transport_panic(transport_id: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::TransportPanic {
            transport_id: transport_id.into(),
            message: message.into(),
        }
    }

    /// Create a group filter parse error
    pub fn group_filter(entry: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::InvalidGroupFilter {
            entry: entry.into(),
            message: message.into(),
        }
    }

    /// Create a generic error
    pub fn other<S: Into<String>>(msg: S) -> Self {
        LoggerError::Other(msg.into())
    }
}

/// Extract a readable message from a caught panic payload
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}
