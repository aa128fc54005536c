//! Caller-facing operation surface.
//!
//! [`BiometricService`] is what a routing layer (or the console binary)
//! talks to. Each operation runs in its own tracing span tagged with a fresh
//! `request_id`, so interleaved requests can be told apart in the logs.

use crate::error::{ServiceError, ServiceResult};
use crate::orchestrator::CaptureOrchestrator;
use crate::response::CaptureResponse;
use bioscan_core::{DeviceTemplateId, RecordId, Template};
use bioscan_hardware::{
    CaptureProtocol, DeviceSession, DeviceStatus, EnrollProtocol, IdentifyOutcome,
    IdentifyProtocol, NativeDriver,
};
use bioscan_storage::{BiometricRecord, TemplateStore};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// The fingerprint device plus its local template store.
pub struct BiometricService<D: NativeDriver, S: TemplateStore> {
    session: DeviceSession<D>,
    orchestrator: CaptureOrchestrator<D, S>,
    identify: IdentifyProtocol<D>,
    enroll: EnrollProtocol<D>,
    store: Arc<S>,
}

impl<D: NativeDriver, S: TemplateStore> BiometricService<D, S> {
    pub fn new(session: DeviceSession<D>, store: S) -> Self {
        Self::with_shared_store(session, Arc::new(store))
    }

    pub fn with_shared_store(session: DeviceSession<D>, store: Arc<S>) -> Self {
        Self {
            orchestrator: CaptureOrchestrator::new(
                CaptureProtocol::new(session.clone()),
                Arc::clone(&store),
            ),
            identify: IdentifyProtocol::new(session.clone()),
            enroll: EnrollProtocol::new(session.clone()),
            session,
            store,
        }
    }

    pub fn session(&self) -> &DeviceSession<D> {
        &self.session
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Initialize the device. A failure here is fatal to startup.
    #[instrument(name = "request", skip_all, fields(operation = "initialize", request_id = %Uuid::new_v4()))]
    pub async fn initialize(&self) -> bioscan_hardware::Result<()> {
        self.session.initialize().await
    }

    /// Current device status. Never fails.
    #[instrument(name = "request", skip_all, fields(operation = "status", request_id = %Uuid::new_v4()))]
    pub async fn get_status(&self) -> DeviceStatus {
        self.session.status().await
    }

    /// Capture a fingerprint and store its template.
    ///
    /// On a failed capture the whole local store is purged before the
    /// driver failure is returned.
    #[instrument(name = "request", skip_all, fields(operation = "capture", request_id = %Uuid::new_v4()))]
    pub async fn capture(&self) -> ServiceResult<CaptureResponse> {
        let saved = self.orchestrator.capture_and_persist().await?;
        Ok(CaptureResponse::saved(saved))
    }

    /// Every stored record, ordered by id.
    #[instrument(name = "request", skip_all, fields(operation = "list_templates", request_id = %Uuid::new_v4()))]
    pub async fn list_templates(&self) -> ServiceResult<Vec<BiometricRecord>> {
        let records = self.store.list_all().await?;
        info!(count = records.len(), "Listed biometric records");
        Ok(records)
    }

    #[instrument(name = "request", skip_all, fields(operation = "get_template", request_id = %Uuid::new_v4(), id = id.as_i64()))]
    pub async fn get_template(&self, id: RecordId) -> ServiceResult<BiometricRecord> {
        self.store
            .get_by_id(id)
            .await?
            .ok_or(ServiceError::NotFound(id))
    }

    /// Identify the finger on the sensor against device enrollments.
    ///
    /// A non-match is a successful call with `success = false`; only lock
    /// contention is an error.
    #[instrument(name = "request", skip_all, fields(operation = "identify", request_id = %Uuid::new_v4()))]
    pub async fn identify(&self) -> ServiceResult<IdentifyOutcome> {
        Ok(self.identify.identify().await?)
    }

    /// Remove every record from the local store. The device is untouched.
    #[instrument(name = "request", skip_all, fields(operation = "delete_all_templates", request_id = %Uuid::new_v4()))]
    pub async fn delete_all_templates(&self) -> ServiceResult<u64> {
        Ok(self.store.delete_all().await?)
    }

    /// Remove one record from the local store.
    #[instrument(name = "request", skip_all, fields(operation = "delete_template", request_id = %Uuid::new_v4(), id = id.as_i64()))]
    pub async fn delete_template(&self, id: RecordId) -> ServiceResult<()> {
        if self.store.delete_by_id(id).await? {
            Ok(())
        } else {
            warn!("Delete requested for missing record");
            Err(ServiceError::NotFound(id))
        }
    }

    /// Capture a finger and enroll it on the device under `id`.
    #[instrument(name = "request", skip_all, fields(operation = "enroll_on_device", request_id = %Uuid::new_v4()))]
    pub async fn enroll_on_device(&self, id: DeviceTemplateId) -> ServiceResult<bool> {
        Ok(self.enroll.enroll_capture(id).await?)
    }

    /// Store a template on the device under `id`.
    #[instrument(name = "request", skip_all, fields(operation = "add_template_to_device", request_id = %Uuid::new_v4()))]
    pub async fn add_template_to_device(
        &self,
        id: DeviceTemplateId,
        template: &Template,
    ) -> ServiceResult<bool> {
        Ok(self.enroll.add_template(id, template).await?)
    }

    /// Copy a stored record's template onto the device under `device_id`.
    #[instrument(name = "request", skip_all, fields(operation = "push_record_to_device", request_id = %Uuid::new_v4()))]
    pub async fn push_record_to_device(
        &self,
        record_id: RecordId,
        device_id: DeviceTemplateId,
    ) -> ServiceResult<bool> {
        let record = self
            .store
            .get_by_id(record_id)
            .await?
            .ok_or(ServiceError::NotFound(record_id))?;
        info!(
            record_id = record_id.as_i64(),
            device_id = device_id.as_i64(),
            "Pushing stored template to device"
        );
        Ok(self.enroll.add_template(device_id, &record.template).await?)
    }

    /// Remove every template enrolled on the device. The store is untouched.
    #[instrument(name = "request", skip_all, fields(operation = "delete_all_from_device", request_id = %Uuid::new_v4()))]
    pub async fn delete_all_from_device(&self) -> ServiceResult<bool> {
        Ok(self.enroll.delete_all_on_device().await?)
    }

    /// Release the device. Waits for any operation in flight.
    #[instrument(name = "request", skip_all, fields(operation = "shutdown", request_id = %Uuid::new_v4()))]
    pub async fn shutdown(&self) -> ServiceResult<()> {
        info!("Shutting down biometric service");
        Ok(self.session.terminate().await?)
    }
}
