//! Error types for device operations.
//!
//! Every failure that crosses the [`DeviceSession`](crate::session::DeviceSession)
//! boundary is one of these variants: translated driver failures, lifecycle
//! misuse, lock contention, and panics raised inside a driver call.

/// Result type alias for device operations.
pub type Result<T> = std::result::Result<T, DeviceError>;

/// Errors that can occur while talking to the fingerprint device.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeviceError {
    /// An operation was attempted before `initialize()` succeeded or after
    /// `terminate()`.
    #[error("Device not initialized")]
    NotInitialized,

    /// The driver refused to initialize. Fatal at startup.
    #[error("Failed to initialize SDK: {message}")]
    InitializationFailed { message: String },

    /// A driver call returned a failure code.
    #[error("{operation} failed: {message}")]
    Driver {
        operation: &'static str,
        message: String,
    },

    /// The exclusive device lock was not acquired in time.
    #[error("Device busy: lock not acquired within {waited_ms}ms")]
    Busy { waited_ms: u64 },

    /// A driver call panicked. The panic is contained and reported here.
    #[error("Driver call panicked: {message}")]
    DriverPanicked { message: String },

    /// The blocking worker running a driver call was cancelled by the runtime.
    #[error("Device operation interrupted")]
    Interrupted,
}

impl DeviceError {
    /// Create a new initialization failed error.
    pub fn initialization_failed(message: impl Into<String>) -> Self {
        Self::InitializationFailed {
            message: message.into(),
        }
    }

    /// Create a new driver failure for the named operation.
    pub fn driver(operation: &'static str, message: impl Into<String>) -> Self {
        Self::Driver {
            operation,
            message: message.into(),
        }
    }

    /// Create a new busy error.
    pub fn busy(waited_ms: u64) -> Self {
        Self::Busy { waited_ms }
    }

    /// Create a new driver panic error.
    pub fn driver_panicked(message: impl Into<String>) -> Self {
        Self::DriverPanicked {
            message: message.into(),
        }
    }

    /// Human-readable reason without the operation prefix.
    ///
    /// For driver failures this is the translated driver message alone, which
    /// is what callers embed in their own outcome messages.
    pub fn reason(&self) -> String {
        match self {
            Self::Driver { message, .. } | Self::InitializationFailed { message } => {
                message.clone()
            }
            other => other.to_string(),
        }
    }

    /// Check if this error came from lock contention.
    pub fn is_busy(&self) -> bool {
        matches!(self, Self::Busy { .. })
    }

    pub(crate) fn from_join(error: tokio::task::JoinError) -> Self {
        if error.is_panic() {
            let payload = error.into_panic();
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| (*s).to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic payload".to_string());
            Self::driver_panicked(message)
        } else {
            Self::Interrupted
        }
    }
}
