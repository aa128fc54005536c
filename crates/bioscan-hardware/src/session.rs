//! Exclusive, serialized access to the fingerprint device.
//!
//! The [`DeviceSession`] owns the native driver for the lifetime of the
//! process. Every hardware call goes through it:
//!
//! ```text
//!  caller A ──┐
//!  caller B ──┼──► lock (FIFO) ──► spawn_blocking ──► NativeDriver ──► ErrorTranslator
//!  caller C ──┘        ▲                  │
//!                      └──── guard dropped when the driver call returns
//! ```
//!
//! The lock guard is moved into the blocking worker, so it is released when
//! the driver call returns, even if the caller stopped waiting or the call
//! panicked. A caller that gives up while the lock is held elsewhere gets
//! [`DeviceError::Busy`]; the hardware operation in progress is never
//! interrupted.
//!
//! # Examples
//!
//! ```
//! use bioscan_hardware::mock::MockDriver;
//! use bioscan_hardware::session::DeviceSession;
//!
//! #[tokio::main]
//! async fn main() -> bioscan_hardware::Result<()> {
//!     let (driver, _handle) = MockDriver::new();
//!     let session = DeviceSession::new(driver);
//!
//!     session.initialize().await?;
//!     let status = session.status().await;
//!     assert!(status.connected);
//!
//!     session.terminate().await?;
//!     Ok(())
//! }
//! ```

use crate::driver::{
    DeviceInfo, ExtractedTemplate, IdentifyReading, NativeDriver, RawImage, RetCode,
};
use crate::error::{DeviceError, Result};
use crate::translate::{ErrorTranslator, Outcome};
use crate::types::DeviceStatus;
use bioscan_core::{DeviceTemplateId, Template};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, error, info, warn};

struct SessionState<D> {
    driver: D,
    initialized: bool,
}

/// Owner of the single native device handle.
///
/// Cloning a session is cheap and yields another reference to the same
/// device; all clones share one lock.
pub struct DeviceSession<D: NativeDriver> {
    state: Arc<Mutex<SessionState<D>>>,
    lock_timeout: Option<Duration>,
}

impl<D: NativeDriver> Clone for DeviceSession<D> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            lock_timeout: self.lock_timeout,
        }
    }
}

impl<D: NativeDriver> std::fmt::Debug for DeviceSession<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceSession")
            .field("lock_timeout", &self.lock_timeout)
            .finish_non_exhaustive()
    }
}

impl<D: NativeDriver> DeviceSession<D> {
    /// Take ownership of a driver. The device is not touched until
    /// [`initialize`](Self::initialize) is called.
    pub fn new(driver: D) -> Self {
        Self {
            state: Arc::new(Mutex::new(SessionState {
                driver,
                initialized: false,
            })),
            lock_timeout: None,
        }
    }

    /// Bound how long device operations wait for the lock.
    ///
    /// Without a timeout callers wait indefinitely. Shutdown always waits.
    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = Some(timeout);
        self
    }

    /// Configured lock timeout, if any.
    pub fn lock_timeout(&self) -> Option<Duration> {
        self.lock_timeout
    }

    /// Initialize the SDK.
    ///
    /// Idempotent: once initialized, further calls succeed without touching
    /// the driver. A failed attempt leaves the session uninitialized so the
    /// caller may retry.
    ///
    /// # Errors
    ///
    /// Returns [`DeviceError::InitializationFailed`] with the translated driver
    /// message, or [`DeviceError::Busy`] if the lock was not acquired in time.
    pub async fn initialize(&self) -> Result<()> {
        let guard = self.acquire().await?;
        if guard.initialized {
            debug!("Device SDK already initialized");
            return Ok(());
        }

        info!("Initializing device SDK");
        let result = Self::run_blocking(guard, |state| {
            let code = state.driver.init();
            match ErrorTranslator::translate(&state.driver, code) {
                Outcome::Success => {
                    state.initialized = true;
                    Ok(())
                }
                Outcome::Failure(message) => Err(DeviceError::initialization_failed(message)),
            }
        })
        .await
        .and_then(|inner| inner);

        match &result {
            Ok(()) => info!("Device SDK initialized"),
            Err(e) => error!("Failed to initialize device SDK: {}", e),
        }
        result
    }

    /// Whether `initialize()` has succeeded and `terminate()` has not run since.
    pub async fn is_initialized(&self) -> bool {
        self.state.lock().await.initialized
    }

    /// Query the device status.
    ///
    /// Never fails: an unreachable device, an uninitialized session and lock
    /// contention are all reported as `connected = false` with a reason.
    pub async fn status(&self) -> DeviceStatus {
        debug!("Checking device status");
        match self.try_with_device(|device| device.device_info()).await {
            Ok(info) => {
                info!(
                    "Device connected: {}, S/N: {}, firmware: {}",
                    info.model, info.serial_number, info.firmware_version
                );
                DeviceStatus::connected(info)
            }
            Err(e) => {
                warn!("Failed to read device info: {}", e);
                DeviceStatus::disconnected(e.reason())
            }
        }
    }

    /// Run `op` with exclusive access to the device.
    ///
    /// This is the only way to reach the driver. Calls are serialized: a
    /// second caller waits until the first returns. `op` runs on a blocking
    /// worker so the async scheduler is never stalled by hardware I/O.
    ///
    /// # Errors
    ///
    /// - [`DeviceError::NotInitialized`] if the session is not initialized
    /// - [`DeviceError::Busy`] if the lock timeout elapsed
    /// - [`DeviceError::DriverPanicked`] if `op` panicked
    pub async fn with_device<T, F>(&self, op: F) -> Result<T>
    where
        F: FnOnce(&mut DeviceHandle<'_, D>) -> T + Send + 'static,
        T: Send + 'static,
    {
        let guard = self.acquire().await?;
        if !guard.initialized {
            return Err(DeviceError::NotInitialized);
        }

        Self::run_blocking(guard, move |state| {
            let mut handle = DeviceHandle {
                driver: &mut state.driver,
            };
            op(&mut handle)
        })
        .await
    }

    /// Like [`with_device`](Self::with_device) for operations that can fail.
    pub async fn try_with_device<T, F>(&self, op: F) -> Result<T>
    where
        F: FnOnce(&mut DeviceHandle<'_, D>) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        self.with_device(op).await.and_then(|inner| inner)
    }

    /// Release the native handle.
    ///
    /// Safe to call repeatedly; only the first call after a successful
    /// `initialize()` reaches the driver. Waits for the lock without a
    /// timeout, so it never overlaps an operation in flight.
    ///
    /// # Errors
    ///
    /// Returns a driver error if the SDK reported a failure while closing.
    /// The session is marked uninitialized either way.
    pub async fn terminate(&self) -> Result<()> {
        let guard = Arc::clone(&self.state).lock_owned().await;
        if !guard.initialized {
            debug!("Device SDK not initialized, nothing to terminate");
            return Ok(());
        }

        info!("Terminating device SDK");
        Self::run_blocking(guard, |state| {
            state.initialized = false;
            let code = state.driver.terminate();
            ErrorTranslator::translate(&state.driver, code)
                .into_result()
                .map_err(|message| DeviceError::driver("terminate", message))
        })
        .await
        .and_then(|inner| inner)
    }

    async fn acquire(&self) -> Result<OwnedMutexGuard<SessionState<D>>> {
        let lock = Arc::clone(&self.state).lock_owned();
        match self.lock_timeout {
            Some(limit) => tokio::time::timeout(limit, lock).await.map_err(|_| {
                warn!("Device lock not acquired within {}ms", limit.as_millis());
                DeviceError::busy(limit.as_millis() as u64)
            }),
            None => Ok(lock.await),
        }
    }

    async fn run_blocking<T, F>(guard: OwnedMutexGuard<SessionState<D>>, f: F) -> Result<T>
    where
        F: FnOnce(&mut SessionState<D>) -> T + Send + 'static,
        T: Send + 'static,
    {
        tokio::task::spawn_blocking(move || {
            let mut guard = guard;
            f(&mut guard)
        })
        .await
        .map_err(|e| {
            let error = DeviceError::from_join(e);
            error!("Device worker failed: {}", error);
            error
        })
    }
}

/// Scoped access to the initialized device.
///
/// Only exists inside a [`DeviceSession::with_device`] call and cannot
/// outlive it. Each method is one native call with its status code already
/// translated.
pub struct DeviceHandle<'a, D: NativeDriver> {
    driver: &'a mut D,
}

/// Successful on-device identification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdentifyMatch {
    pub id: DeviceTemplateId,
    pub score: i32,
    pub quality: Option<i32>,
}

/// Failed on-device identification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentifyRejection {
    pub message: String,
    pub quality: Option<i32>,
}

impl<D: NativeDriver> DeviceHandle<'_, D> {
    /// Query model, serial number and firmware version.
    pub fn device_info(&mut self) -> Result<DeviceInfo> {
        let result = self.driver.device_info();
        self.check("device_info", result)
    }

    /// Acquire a raw image from the sensor.
    pub fn capture_image(&mut self) -> Result<RawImage> {
        let result = self.driver.capture_image();
        self.check("capture_image", result)
    }

    /// Extract a template from a previously acquired image.
    pub fn extract_template(&mut self, image: &RawImage) -> Result<ExtractedTemplate> {
        let result = self.driver.extract_template(image);
        self.check("extract_template", result)
    }

    /// Capture a finger and match it against device-resident enrollments.
    pub fn capture_and_identify(
        &mut self,
    ) -> std::result::Result<IdentifyMatch, IdentifyRejection> {
        let IdentifyReading {
            code,
            id,
            score,
            quality,
        } = self.driver.capture_and_identify();

        if let Outcome::Failure(message) = ErrorTranslator::translate(&*self.driver, code) {
            return Err(IdentifyRejection { message, quality });
        }

        match DeviceTemplateId::new(id) {
            Ok(id) => Ok(IdentifyMatch { id, score, quality }),
            Err(e) => Err(IdentifyRejection {
                message: format!("driver reported a match with an unusable id: {e}"),
                quality,
            }),
        }
    }

    /// Capture a finger and enroll it on the device under `id`.
    pub fn capture_and_enroll(&mut self, id: DeviceTemplateId) -> Result<()> {
        let code = self.driver.capture_and_enroll(id);
        self.check_code("capture_and_enroll", code)
    }

    /// Store an existing template on the device under `id`.
    pub fn save_template(&mut self, id: DeviceTemplateId, template: &Template) -> Result<()> {
        let code = self.driver.save_template(id, template);
        self.check_code("save_template", code)
    }

    /// Remove every template enrolled on the device.
    pub fn delete_all_templates(&mut self) -> Result<()> {
        let code = self.driver.delete_all_templates();
        self.check_code("delete_all_templates", code)
    }

    fn check<T>(
        &self,
        operation: &'static str,
        result: std::result::Result<T, RetCode>,
    ) -> Result<T> {
        result.map_err(|code| {
            DeviceError::driver(operation, ErrorTranslator::message(&*self.driver, code))
        })
    }

    fn check_code(&self, operation: &'static str, code: RetCode) -> Result<()> {
        ErrorTranslator::translate(&*self.driver, code)
            .into_result()
            .map_err(|message| DeviceError::driver(operation, message))
    }
}
