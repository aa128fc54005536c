use crate::driver::NativeDriver;
use crate::error::{DeviceError, Result};
use crate::session::DeviceSession;
use crate::types::CaptureOutcome;
use bioscan_core::Template;
use tracing::{error, info, warn};

/// Image acquisition followed by template extraction.
///
/// Both steps run inside a single device window, so no other operation can
/// reach the sensor between them.
pub struct CaptureProtocol<D: NativeDriver> {
    session: DeviceSession<D>,
}

impl<D: NativeDriver> Clone for CaptureProtocol<D> {
    fn clone(&self) -> Self {
        Self {
            session: self.session.clone(),
        }
    }
}

impl<D: NativeDriver> std::fmt::Debug for CaptureProtocol<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptureProtocol")
            .field("session", &self.session)
            .finish()
    }
}

impl<D: NativeDriver> CaptureProtocol<D> {
    pub fn new(session: DeviceSession<D>) -> Self {
        Self { session }
    }

    /// Capture a fingerprint and extract its template.
    ///
    /// The first failing step short-circuits with its translated driver
    /// message. The returned outcome is never partially filled.
    ///
    /// # Errors
    ///
    /// Returns [`DeviceError::Busy`] if the device lock was not acquired in
    /// time. Every other failure is reported inside the outcome.
    pub async fn capture(&self) -> Result<CaptureOutcome> {
        info!("Starting fingerprint capture");

        let result = self
            .session
            .with_device(|device| {
                let image = match device.capture_image() {
                    Ok(image) => image,
                    Err(e) => {
                        return CaptureOutcome::failed(format!(
                            "Failed to capture image: {}",
                            e.reason()
                        ));
                    }
                };

                let extracted = match device.extract_template(&image) {
                    Ok(extracted) => extracted,
                    Err(e) => {
                        return CaptureOutcome::failed(format!(
                            "Failed to extract template: {}",
                            e.reason()
                        ));
                    }
                };

                match Template::new(extracted.encoded) {
                    Ok(template) => CaptureOutcome::succeeded(template, extracted.quality, image),
                    Err(e) => CaptureOutcome::failed(format!("Failed to extract template: {e}")),
                }
            })
            .await;

        let outcome = match result {
            Ok(outcome) => outcome,
            Err(e @ DeviceError::Busy { .. }) => return Err(e),
            Err(e) => {
                error!("Error during fingerprint capture: {}", e);
                CaptureOutcome::failed(format!("Error during fingerprint capture: {e}"))
            }
        };

        match outcome.error_message() {
            None => info!(
                quality = outcome.quality(),
                "Fingerprint captured and template extracted"
            ),
            Some(message) => warn!("{}", message),
        }
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::RetCode;
    use crate::mock::{DriverOp, MockDriver};

    async fn protocol() -> (CaptureProtocol<MockDriver>, crate::mock::MockDriverHandle) {
        let (driver, handle) = MockDriver::new();
        let session = DeviceSession::new(driver);
        session.initialize().await.unwrap();
        (CaptureProtocol::new(session), handle)
    }

    #[tokio::test]
    async fn test_capture_success() {
        let (protocol, handle) = protocol().await;
        handle.queue_template("abc123", 88);

        let outcome = protocol.capture().await.unwrap();
        assert!(outcome.is_success());
        assert_eq!(outcome.template().map(Template::as_str), Some("abc123"));
        assert_eq!(outcome.quality(), Some(88));
        assert!(outcome.image_width().is_some());
        assert!(outcome.image().is_some());
    }

    #[tokio::test]
    async fn test_image_failure_short_circuits() {
        let (protocol, handle) = protocol().await;
        handle.fail_next(DriverOp::CaptureImage, RetCode::ERROR_CAPTURE_TIMEOUT);

        let outcome = protocol.capture().await.unwrap();
        assert!(!outcome.is_success());
        assert_eq!(
            outcome.error_message(),
            Some("Failed to capture image: Capture timeout: no finger detected")
        );
        assert_eq!(handle.count(DriverOp::ExtractTemplate), 0);
    }

    #[tokio::test]
    async fn test_extraction_failure() {
        let (protocol, handle) = protocol().await;
        handle.fail_next(DriverOp::ExtractTemplate, RetCode::ERROR_EXTRACTION);

        let outcome = protocol.capture().await.unwrap();
        assert!(!outcome.is_success());
        assert!(outcome.template().is_none());
        assert_eq!(
            outcome.error_message(),
            Some("Failed to extract template: Template extraction failed")
        );
    }

    #[tokio::test]
    async fn test_empty_template_is_a_failure() {
        let (protocol, handle) = protocol().await;
        handle.queue_template("", 50);

        let outcome = protocol.capture().await.unwrap();
        assert!(!outcome.is_success());
        assert!(
            outcome
                .error_message()
                .unwrap()
                .starts_with("Failed to extract template:")
        );
    }

    #[tokio::test]
    async fn test_capture_before_initialize() {
        let (driver, _handle) = MockDriver::new();
        let protocol = CaptureProtocol::new(DeviceSession::new(driver));

        let outcome = protocol.capture().await.unwrap();
        assert!(!outcome.is_success());
        assert_eq!(
            outcome.error_message(),
            Some("Error during fingerprint capture: Device not initialized")
        );
    }
}
