//! Outcomes produced by device operations.
//!
//! These are the typed results handed back to callers. Capture and identify
//! outcomes are built once per attempt and cannot be modified afterwards;
//! fields are private and exposed through accessors.

use crate::driver::{DeviceInfo, RawImage};
use bioscan_core::{DeviceTemplateId, Template};
use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Device status, derived fresh from the driver on every query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceStatus {
    /// Whether the device answered the info query.
    pub connected: bool,

    /// Device model identifier.
    pub model: Option<String>,

    /// Device serial number.
    pub serial_number: Option<String>,

    /// Firmware version string.
    pub firmware_version: Option<String>,

    /// Human-readable status.
    pub message: String,
}

impl DeviceStatus {
    /// Status of a device that answered the info query.
    pub fn connected(info: DeviceInfo) -> Self {
        Self {
            connected: true,
            model: Some(info.model),
            serial_number: Some(info.serial_number),
            firmware_version: Some(info.firmware_version),
            message: "Device connected and working".to_string(),
        }
    }

    /// Status of a device that could not be reached.
    pub fn disconnected(reason: impl AsRef<str>) -> Self {
        Self {
            connected: false,
            model: None,
            serial_number: None,
            firmware_version: None,
            message: format!(
                "Device not connected or communication error: {}",
                reason.as_ref()
            ),
        }
    }
}

/// Result of one capture attempt (image acquisition plus template extraction).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CaptureOutcome {
    success: bool,
    error_message: Option<String>,
    template: Option<Template>,
    quality: Option<i32>,
    image_width: Option<u32>,
    image_height: Option<u32>,
    #[serde(skip)]
    image: Option<Bytes>,
}

impl CaptureOutcome {
    /// A capture that produced a template.
    pub fn succeeded(template: Template, quality: i32, image: RawImage) -> Self {
        Self {
            success: true,
            error_message: None,
            template: Some(template),
            quality: Some(quality),
            image_width: Some(image.width),
            image_height: Some(image.height),
            image: Some(image.data),
        }
    }

    /// A capture that failed at some step.
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            error_message: Some(message.into()),
            template: None,
            quality: None,
            image_width: None,
            image_height: None,
            image: None,
        }
    }

    /// Whether a template was produced.
    pub fn is_success(&self) -> bool {
        self.success
    }

    /// Failure description, present only on failure.
    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    /// Extracted template, present only on success.
    pub fn template(&self) -> Option<&Template> {
        self.template.as_ref()
    }

    /// Extraction quality score, present only on success.
    pub fn quality(&self) -> Option<i32> {
        self.quality
    }

    /// Image width in pixels, present only on success.
    pub fn image_width(&self) -> Option<u32> {
        self.image_width
    }

    /// Image height in pixels, present only on success.
    pub fn image_height(&self) -> Option<u32> {
        self.image_height
    }

    /// Raw image buffer, present only on success. Never serialized.
    pub fn image(&self) -> Option<&Bytes> {
        self.image.as_ref()
    }

    /// Consume the outcome, returning the template on success or the
    /// failure message otherwise.
    pub fn into_result(self) -> Result<Template, String> {
        match (self.success, self.template) {
            (true, Some(template)) => Ok(template),
            _ => Err(self
                .error_message
                .unwrap_or_else(|| "capture produced no template".to_string())),
        }
    }
}

/// Result of an on-device identification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IdentifyOutcome {
    success: bool,
    message: String,
    matched_id: Option<DeviceTemplateId>,
    score: Option<i32>,
    quality: Option<i32>,
}

impl IdentifyOutcome {
    /// The finger matched a device-resident template.
    pub fn matched(id: DeviceTemplateId, score: i32, quality: Option<i32>) -> Self {
        Self {
            success: true,
            message: "Fingerprint identified successfully".to_string(),
            matched_id: Some(id),
            score: Some(score),
            quality,
        }
    }

    /// Identification failed. Quality is kept when the driver measured one.
    pub fn rejected(message: impl Into<String>, quality: Option<i32>) -> Self {
        Self {
            success: false,
            message: message.into(),
            matched_id: None,
            score: None,
            quality,
        }
    }

    /// Whether a device template matched.
    pub fn is_success(&self) -> bool {
        self.success
    }

    /// Human-readable result.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Matched device template id, present only on success.
    pub fn matched_id(&self) -> Option<DeviceTemplateId> {
        self.matched_id
    }

    /// Match score, present only on success.
    pub fn score(&self) -> Option<i32> {
        self.score
    }

    /// Capture quality, if the driver reported one.
    pub fn quality(&self) -> Option<i32> {
        self.quality
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_image() -> RawImage {
        RawImage {
            data: Bytes::from_static(&[0u8; 12]),
            width: 4,
            height: 3,
        }
    }

    #[test]
    fn test_status_connected() {
        let status = DeviceStatus::connected(DeviceInfo::new("iDBio", "SN1", "1.0.0"));
        assert!(status.connected);
        assert_eq!(status.model.as_deref(), Some("iDBio"));
        assert_eq!(status.serial_number.as_deref(), Some("SN1"));
        assert_eq!(status.firmware_version.as_deref(), Some("1.0.0"));
    }

    #[test]
    fn test_status_disconnected_carries_reason() {
        let status = DeviceStatus::disconnected("Device not found");
        assert!(!status.connected);
        assert!(status.model.is_none());
        assert!(status.message.contains("Device not found"));
    }

    #[test]
    fn test_capture_succeeded() {
        let template = Template::new("abc123").unwrap();
        let outcome = CaptureOutcome::succeeded(template.clone(), 77, sample_image());

        assert!(outcome.is_success());
        assert_eq!(outcome.template(), Some(&template));
        assert_eq!(outcome.quality(), Some(77));
        assert_eq!(outcome.image_width(), Some(4));
        assert_eq!(outcome.image_height(), Some(3));
        assert_eq!(outcome.image().map(|b| b.len()), Some(12));
        assert!(outcome.error_message().is_none());
        assert_eq!(outcome.into_result(), Ok(template));
    }

    #[test]
    fn test_capture_failed() {
        let outcome = CaptureOutcome::failed("Failed to capture image: timeout");
        assert!(!outcome.is_success());
        assert!(outcome.template().is_none());
        assert!(outcome.image_width().is_none());
        assert_eq!(
            outcome.into_result(),
            Err("Failed to capture image: timeout".to_string())
        );
    }

    #[test]
    fn test_capture_serialization_skips_image() {
        let template = Template::new("abc123").unwrap();
        let outcome = CaptureOutcome::succeeded(template, 77, sample_image());
        let json = serde_json::to_value(&outcome).unwrap();

        assert_eq!(json["success"], true);
        assert_eq!(json["template"], "abc123");
        assert_eq!(json["image_width"], 4);
        assert!(json.get("image").is_none());
    }

    #[test]
    fn test_identify_rejected_keeps_quality() {
        let outcome = IdentifyOutcome::rejected("Identification failed: no match", Some(21));
        assert!(!outcome.is_success());
        assert_eq!(outcome.quality(), Some(21));
        assert!(outcome.matched_id().is_none());
        assert!(outcome.score().is_none());
    }

    #[test]
    fn test_identify_matched() {
        let id = DeviceTemplateId::new(5).unwrap();
        let outcome = IdentifyOutcome::matched(id, 98, Some(80));
        assert!(outcome.is_success());
        assert_eq!(outcome.matched_id(), Some(id));
        assert_eq!(outcome.score(), Some(98));
        assert_eq!(outcome.quality(), Some(80));
    }
}
