//! Native driver interface.
//!
//! This module defines the contract between the device session and the vendor
//! SDK. The SDK is blocking and not reentrant; implementations are only ever
//! called from a blocking worker while the session's exclusive lock is held,
//! so they can assume single-threaded access.
//!
//! Every call reports a [`RetCode`]. Codes follow an ordered scale: anything
//! below [`RetCode::SUCCESS`] is a failure, `SUCCESS` and above (warnings)
//! count as success.

use bioscan_core::{DeviceTemplateId, Template};
use bytes::Bytes;
use std::fmt;

/// Status code returned by every native driver call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RetCode(i32);

impl RetCode {
    /// Threshold of the ordered scale; lower values are failures.
    pub const SUCCESS: RetCode = RetCode(0);

    /// Success, an existing device template was overwritten.
    pub const WARNING_OVERWRITING_TEMPLATE: RetCode = RetCode(1);

    /// Unspecified driver failure.
    pub const ERROR_UNKNOWN: RetCode = RetCode(-1);

    /// No device attached or the device stopped answering.
    pub const ERROR_NO_DEVICE: RetCode = RetCode(-2);

    /// The sensor failed to acquire an image.
    pub const ERROR_CAPTURE: RetCode = RetCode(-3);

    /// No finger was placed before the capture timed out.
    pub const ERROR_CAPTURE_TIMEOUT: RetCode = RetCode(-4);

    /// A template could not be extracted from the image.
    pub const ERROR_EXTRACTION: RetCode = RetCode(-5);

    /// The captured finger matched no enrolled template.
    pub const ERROR_NOT_IDENTIFIED: RetCode = RetCode(-6);

    /// The id is already in use by another enrolled template.
    pub const ERROR_ALREADY_ENROLLED: RetCode = RetCode(-7);

    /// The device has no room for another template.
    pub const ERROR_NO_SPACE: RetCode = RetCode(-8);

    /// The template is not in a format the device accepts.
    pub const ERROR_INVALID_TEMPLATE: RetCode = RetCode(-9);

    /// Wrap a raw code returned by the SDK.
    #[must_use]
    pub const fn new(raw: i32) -> Self {
        RetCode(raw)
    }

    /// Get the raw code.
    #[must_use]
    pub fn as_i32(&self) -> i32 {
        self.0
    }

    /// `true` for `SUCCESS` and every warning above it.
    #[must_use]
    pub fn is_success(&self) -> bool {
        *self >= Self::SUCCESS
    }

    /// `true` for every code below `SUCCESS`.
    #[must_use]
    pub fn is_failure(&self) -> bool {
        !self.is_success()
    }
}

impl fmt::Display for RetCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Result of a driver call that produces a value on success.
pub type DriverResult<T> = std::result::Result<T, RetCode>;

/// Device identification as reported by the driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    /// Device model identifier.
    pub model: String,

    /// Device serial number.
    pub serial_number: String,

    /// Firmware version string.
    pub firmware_version: String,
}

impl DeviceInfo {
    /// Create device information from the driver's three out-values.
    pub fn new(
        model: impl Into<String>,
        serial_number: impl Into<String>,
        firmware_version: impl Into<String>,
    ) -> Self {
        Self {
            model: model.into(),
            serial_number: serial_number.into(),
            firmware_version: firmware_version.into(),
        }
    }
}

/// Raw grayscale image acquired by the sensor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawImage {
    /// Pixel buffer, one byte per pixel.
    pub data: Bytes,

    /// Image width in pixels.
    pub width: u32,

    /// Image height in pixels.
    pub height: u32,
}

/// Template extracted from a raw image, before validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedTemplate {
    /// Encoded template exactly as returned by the SDK.
    pub encoded: String,

    /// Quality score of the extraction.
    pub quality: i32,
}

/// Everything the driver reports for a capture-and-identify call.
///
/// Unlike the other calls, identify reports a quality even when it fails, so
/// the code travels alongside the values instead of replacing them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdentifyReading {
    /// Status of the call.
    pub code: RetCode,

    /// Id of the matched device template; meaningful only on success.
    pub id: i64,

    /// Match score; meaningful only on success.
    pub score: i32,

    /// Capture quality, when the driver measured one.
    pub quality: Option<i32>,
}

impl IdentifyReading {
    /// A successful match.
    pub fn matched(id: i64, score: i32, quality: i32) -> Self {
        Self {
            code: RetCode::SUCCESS,
            id,
            score,
            quality: Some(quality),
        }
    }

    /// A failed identification.
    pub fn failed(code: RetCode, quality: Option<i32>) -> Self {
        Self {
            code,
            id: 0,
            score: 0,
            quality,
        }
    }
}

/// Native fingerprint SDK.
///
/// Implementations wrap the vendor's blocking entry points one-to-one. They
/// must not be called concurrently; the session guarantees this.
pub trait NativeDriver: Send + 'static {
    /// Initialize the SDK and open the device.
    fn init(&mut self) -> RetCode;

    /// Close the device and release SDK resources.
    fn terminate(&mut self) -> RetCode;

    /// Query model, serial number and firmware version.
    fn device_info(&mut self) -> DriverResult<DeviceInfo>;

    /// Wait for a finger and acquire a raw image.
    fn capture_image(&mut self) -> DriverResult<RawImage>;

    /// Extract a template and quality score from a raw image.
    fn extract_template(&mut self, image: &RawImage) -> DriverResult<ExtractedTemplate>;

    /// Capture a finger and match it against device-resident enrollments.
    fn capture_and_identify(&mut self) -> IdentifyReading;

    /// Capture a finger and enroll it on the device under `id`.
    fn capture_and_enroll(&mut self, id: DeviceTemplateId) -> RetCode;

    /// Store an existing template on the device under `id`.
    fn save_template(&mut self, id: DeviceTemplateId, template: &Template) -> RetCode;

    /// Remove every template enrolled on the device.
    fn delete_all_templates(&mut self) -> RetCode;

    /// The SDK's own description of a status code, if it knows the code.
    fn error_message(&self, code: RetCode) -> Option<String>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(RetCode::SUCCESS, true)]
    #[case(RetCode::WARNING_OVERWRITING_TEMPLATE, true)]
    #[case(RetCode::new(42), true)]
    #[case(RetCode::ERROR_UNKNOWN, false)]
    #[case(RetCode::ERROR_CAPTURE_TIMEOUT, false)]
    #[case(RetCode::new(i32::MIN), false)]
    fn test_ret_code_ordered_scale(#[case] code: RetCode, #[case] success: bool) {
        assert_eq!(code.is_success(), success);
        assert_eq!(code.is_failure(), !success);
    }

    #[test]
    fn test_identify_reading_failed_keeps_quality() {
        let reading = IdentifyReading::failed(RetCode::ERROR_NOT_IDENTIFIED, Some(23));
        assert!(reading.code.is_failure());
        assert_eq!(reading.quality, Some(23));
    }

    #[test]
    fn test_device_info_new() {
        let info = DeviceInfo::new("iDBio", "0123456789", "1.4.3");
        assert_eq!(info.model, "iDBio");
        assert_eq!(info.serial_number, "0123456789");
        assert_eq!(info.firmware_version, "1.4.3");
    }
}
