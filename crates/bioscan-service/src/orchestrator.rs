//! Capture followed by persistence, keeping the store consistent with the
//! device outcome.
//!
//! A successful capture inserts exactly one record. A failed capture purges
//! the whole store. Nothing else is ever done to existing records: there is
//! no row-level repair.

use crate::error::{ServiceError, ServiceResult};
use bioscan_core::{RecordId, Template};
use bioscan_hardware::{CaptureProtocol, DeviceError, NativeDriver};
use bioscan_storage::TemplateStore;
use chrono::Utc;
use std::sync::Arc;
use tracing::{error, info, warn};

/// A capture that was persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct SavedCapture {
    /// Id assigned by the store
    pub id: RecordId,

    /// The stored template
    pub template: Template,

    /// Extraction quality reported by the device
    pub quality: Option<i32>,
}

/// Composes [`CaptureProtocol`] with a [`TemplateStore`].
pub struct CaptureOrchestrator<D: NativeDriver, S: TemplateStore> {
    capture: CaptureProtocol<D>,
    store: Arc<S>,
}

impl<D: NativeDriver, S: TemplateStore> CaptureOrchestrator<D, S> {
    pub fn new(capture: CaptureProtocol<D>, store: Arc<S>) -> Self {
        Self { capture, store }
    }

    /// Capture a fingerprint and persist its template.
    ///
    /// The device window is closed before any store I/O starts, so the
    /// purge never holds up other device operations.
    ///
    /// # Errors
    ///
    /// - [`ServiceError::Driver`] with the capture message after a failed
    ///   capture; the store has been emptied
    /// - [`ServiceError::Busy`] if the device lock was not acquired; the
    ///   capture never ran and the store is untouched
    /// - [`ServiceError::Store`] if the insert or the purge failed
    pub async fn capture_and_persist(&self) -> ServiceResult<SavedCapture> {
        let outcome = match self.capture.capture().await {
            Ok(outcome) => outcome,
            Err(DeviceError::Busy { waited_ms }) => {
                warn!("Capture not attempted, device busy");
                return Err(ServiceError::Busy { waited_ms });
            }
            Err(e) => return Err(e.into()),
        };

        let quality = outcome.quality();
        match outcome.into_result() {
            Ok(template) => {
                let id = self.store.insert(&template, Utc::now()).await.map_err(|e| {
                    error!("Failed to store captured template: {}", e);
                    ServiceError::from(e)
                })?;
                info!(id = id.as_i64(), "Captured template stored");
                Ok(SavedCapture {
                    id,
                    template,
                    quality,
                })
            }
            Err(message) => {
                let purged = self.store.delete_all().await.map_err(|e| {
                    error!("Failed to purge template store after failed capture: {}", e);
                    ServiceError::from(e)
                })?;
                warn!(purged, "Capture failed, template store purged: {}", message);
                Err(ServiceError::driver(message))
            }
        }
    }
}
