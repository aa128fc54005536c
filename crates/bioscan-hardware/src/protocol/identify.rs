use crate::driver::NativeDriver;
use crate::error::{DeviceError, Result};
use crate::session::DeviceSession;
use crate::types::IdentifyOutcome;
use tracing::{error, info, warn};

/// On-device capture and match against device-resident enrollments.
pub struct IdentifyProtocol<D: NativeDriver> {
    session: DeviceSession<D>,
}

impl<D: NativeDriver> Clone for IdentifyProtocol<D> {
    fn clone(&self) -> Self {
        Self {
            session: self.session.clone(),
        }
    }
}

impl<D: NativeDriver> std::fmt::Debug for IdentifyProtocol<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentifyProtocol")
            .field("session", &self.session)
            .finish()
    }
}

impl<D: NativeDriver> IdentifyProtocol<D> {
    pub fn new(session: DeviceSession<D>) -> Self {
        Self { session }
    }

    /// Capture a finger and identify it.
    ///
    /// A failed identification keeps the quality the driver measured, if
    /// any, and never carries a matched id or score.
    ///
    /// # Errors
    ///
    /// Returns [`DeviceError::Busy`] if the device lock was not acquired in
    /// time.
    pub async fn identify(&self) -> Result<IdentifyOutcome> {
        info!("Starting fingerprint identification");

        let result = self
            .session
            .with_device(|device| device.capture_and_identify())
            .await;

        match result {
            Ok(Ok(found)) => {
                info!(
                    id = found.id.as_i64(),
                    score = found.score,
                    quality = found.quality,
                    "Fingerprint identified"
                );
                Ok(IdentifyOutcome::matched(found.id, found.score, found.quality))
            }
            Ok(Err(rejection)) => {
                warn!(
                    quality = rejection.quality,
                    "Identification failed: {}", rejection.message
                );
                Ok(IdentifyOutcome::rejected(
                    format!("Identification failed: {}", rejection.message),
                    rejection.quality,
                ))
            }
            Err(e @ DeviceError::Busy { .. }) => Err(e),
            Err(e) => {
                error!("Error during identification: {}", e);
                Ok(IdentifyOutcome::rejected(
                    format!("Error during identification: {e}"),
                    None,
                ))
            }
        }
    }
}
