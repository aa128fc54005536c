use bioscan_core::RecordId;
use bioscan_hardware::DeviceError;
use bioscan_storage::StorageError;
use thiserror::Error;

/// Failures reported by the caller-facing service.
///
/// A routing layer maps [`ServiceError::NotFound`] to its not-found response
/// and everything else to a server error carrying the message.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The device reported a failure; the message is the translated one.
    #[error("{message}")]
    Driver { message: String },

    /// No record with this id exists in the local store.
    #[error("Biometric record {0} not found")]
    NotFound(RecordId),

    /// The device lock was not acquired in time.
    #[error("Device busy: lock not acquired within {waited_ms}ms")]
    Busy { waited_ms: u64 },

    /// The template store failed. Surfaced verbatim.
    #[error(transparent)]
    Store(#[from] StorageError),
}

impl ServiceError {
    /// Create a driver failure with a translated message.
    pub fn driver(message: impl Into<String>) -> Self {
        Self::Driver {
            message: message.into(),
        }
    }

    /// Check if this error should be reported as not-found.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Check if this error came from lock contention.
    pub fn is_busy(&self) -> bool {
        matches!(self, Self::Busy { .. })
    }
}

impl From<DeviceError> for ServiceError {
    fn from(error: DeviceError) -> Self {
        match error {
            DeviceError::Busy { waited_ms } => Self::Busy { waited_ms },
            other => Self::driver(other.to_string()),
        }
    }
}

/// Result type alias for service operations.
pub type ServiceResult<T> = Result<T, ServiceError>;
