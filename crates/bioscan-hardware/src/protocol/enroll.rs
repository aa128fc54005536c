use crate::driver::NativeDriver;
use crate::error::{DeviceError, Result};
use crate::session::DeviceSession;
use bioscan_core::{DeviceTemplateId, Template};
use tracing::{info, warn};

/// Management of templates enrolled in device memory.
///
/// These operations only touch the device. Records in the local template
/// store are never affected.
pub struct EnrollProtocol<D: NativeDriver> {
    session: DeviceSession<D>,
}

impl<D: NativeDriver> Clone for EnrollProtocol<D> {
    fn clone(&self) -> Self {
        Self {
            session: self.session.clone(),
        }
    }
}

impl<D: NativeDriver> std::fmt::Debug for EnrollProtocol<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnrollProtocol")
            .field("session", &self.session)
            .finish()
    }
}

impl<D: NativeDriver> EnrollProtocol<D> {
    pub fn new(session: DeviceSession<D>) -> Self {
        Self { session }
    }

    /// Capture a finger and enroll it on the device under `id`.
    ///
    /// # Errors
    ///
    /// Returns [`DeviceError::Busy`] on lock timeout; other failures are
    /// logged and reported as `false`.
    pub async fn enroll_capture(&self, id: DeviceTemplateId) -> Result<bool> {
        info!(id = id.as_i64(), "Enrolling fingerprint on device");
        let result = self
            .session
            .try_with_device(move |device| device.capture_and_enroll(id))
            .await;
        report(result, "enroll fingerprint", id)
    }

    /// Store an existing template on the device under `id`.
    ///
    /// Overwriting an existing device template counts as success.
    ///
    /// # Errors
    ///
    /// Returns [`DeviceError::Busy`] on lock timeout.
    pub async fn add_template(&self, id: DeviceTemplateId, template: &Template) -> Result<bool> {
        info!(id = id.as_i64(), "Adding template to device");
        let template = template.clone();
        let result = self
            .session
            .try_with_device(move |device| device.save_template(id, &template))
            .await;
        report(result, "add template to device", id)
    }

    /// Remove every template enrolled on the device.
    ///
    /// # Errors
    ///
    /// Returns [`DeviceError::Busy`] on lock timeout.
    pub async fn delete_all_on_device(&self) -> Result<bool> {
        info!("Deleting all templates from device");
        match self
            .session
            .try_with_device(|device| device.delete_all_templates())
            .await
        {
            Ok(()) => {
                info!("All templates deleted from device");
                Ok(true)
            }
            Err(e @ DeviceError::Busy { .. }) => Err(e),
            Err(e) => {
                warn!("Failed to delete templates from device: {}", e.reason());
                Ok(false)
            }
        }
    }
}

fn report(result: Result<()>, action: &str, id: DeviceTemplateId) -> Result<bool> {
    match result {
        Ok(()) => {
            info!(id = id.as_i64(), "Device {} succeeded", action);
            Ok(true)
        }
        Err(e @ DeviceError::Busy { .. }) => Err(e),
        Err(e) => {
            warn!(id = id.as_i64(), "Failed to {}: {}", action, e.reason());
            Ok(false)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockDriver, MockDriverHandle};

    async fn protocol() -> (EnrollProtocol<MockDriver>, MockDriverHandle) {
        let (driver, handle) = MockDriver::new();
        let session = DeviceSession::new(driver);
        session.initialize().await.unwrap();
        (EnrollProtocol::new(session), handle)
    }

    fn id(raw: i64) -> DeviceTemplateId {
        DeviceTemplateId::new(raw).unwrap()
    }

    #[tokio::test]
    async fn test_enroll_capture() {
        let (protocol, handle) = protocol().await;

        assert!(protocol.enroll_capture(id(4)).await.unwrap());
        assert!(!protocol.enroll_capture(id(4)).await.unwrap());
        assert_eq!(handle.enrolled_ids(), vec![4]);
    }

    #[tokio::test]
    async fn test_enroll_without_finger() {
        let (protocol, handle) = protocol().await;
        handle.lift_finger();

        assert!(!protocol.enroll_capture(id(1)).await.unwrap());
        assert!(handle.enrolled_ids().is_empty());
    }

    #[tokio::test]
    async fn test_add_template_overwrites() {
        let (protocol, handle) = protocol().await;
        let first = Template::new("abc123").unwrap();
        let second = Template::new("def456").unwrap();

        assert!(protocol.add_template(id(2), &first).await.unwrap());
        assert!(protocol.add_template(id(2), &second).await.unwrap());
        assert_eq!(handle.enrolled_template(2).as_deref(), Some("def456"));
    }

    #[tokio::test]
    async fn test_delete_all_on_device() {
        let (protocol, handle) = protocol().await;
        handle.enroll_finger(1, "left-thumb");
        handle.enroll_finger(2, "right-thumb");

        assert!(protocol.delete_all_on_device().await.unwrap());
        assert!(handle.enrolled_ids().is_empty());

        handle.set_connected(false);
        assert!(!protocol.delete_all_on_device().await.unwrap());
    }
}
