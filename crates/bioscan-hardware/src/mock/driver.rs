//! Mock native driver for testing and development.
//!
//! This module provides a simulated fingerprint SDK that can be controlled
//! programmatically for testing without requiring physical hardware. The
//! simulation models a sensor with one finger placed on it and an on-device
//! template memory, so capture, enrollment and identification behave
//! consistently with each other.

use crate::driver::{
    DeviceInfo, DriverResult, ExtractedTemplate, IdentifyReading, NativeDriver, RawImage, RetCode,
};
use bioscan_core::constants::{
    MAX_QUALITY_SCORE, MIN_QUALITY_SCORE, SIMULATED_IMAGE_HEIGHT, SIMULATED_IMAGE_WIDTH,
};
use bioscan_core::{DeviceTemplateId, Template};
use bytes::Bytes;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Number of recent calls kept in the call log. Per-op counts are exact
/// regardless.
pub const CALL_LOG_CAPACITY: usize = 256;

/// Driver entry point, as recorded in the call log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DriverOp {
    Init,
    Terminate,
    DeviceInfo,
    CaptureImage,
    ExtractTemplate,
    CaptureAndIdentify,
    CaptureAndEnroll,
    SaveTemplate,
    DeleteAllTemplates,
}

#[derive(Debug)]
struct MockState {
    connected: bool,
    info: DeviceInfo,
    finger: Option<String>,
    quality: i32,
    enrolled: BTreeMap<i64, String>,
    scripted_failures: HashMap<DriverOp, VecDeque<RetCode>>,
    scripted_templates: VecDeque<(String, i32)>,
    calls: VecDeque<DriverOp>,
    call_counts: HashMap<DriverOp, usize>,
    in_flight: usize,
    overlaps: usize,
}

impl MockState {
    fn take_failure(&mut self, op: DriverOp) -> Option<RetCode> {
        self.scripted_failures
            .get_mut(&op)
            .and_then(|queue| queue.pop_front())
    }

    /// Common preamble of every hardware call: scripted failure first, then
    /// the connection check.
    fn precheck(&mut self, op: DriverOp) -> Result<(), RetCode> {
        if let Some(code) = self.take_failure(op) {
            return Err(code);
        }
        if !self.connected {
            return Err(RetCode::ERROR_NO_DEVICE);
        }
        Ok(())
    }

    fn placed_finger(&self) -> Result<&str, RetCode> {
        self.finger.as_deref().ok_or(RetCode::ERROR_CAPTURE_TIMEOUT)
    }
}

fn lock(state: &Mutex<MockState>) -> MutexGuard<'_, MockState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Encoded template the simulated sensor produces for a finger.
fn template_for(finger: &str) -> String {
    let hex: String = finger.bytes().map(|b| format!("{:02X}", b)).collect();
    format!("MK{hex}")
}

/// Mock fingerprint SDK.
///
/// # Examples
///
/// ```
/// use bioscan_hardware::mock::MockDriver;
/// use bioscan_hardware::driver::NativeDriver;
///
/// let (mut driver, handle) = MockDriver::new();
/// assert!(driver.init().is_success());
///
/// handle.place_finger("left-thumb");
/// let image = driver.capture_image().unwrap();
/// let extracted = driver.extract_template(&image).unwrap();
/// assert!(extracted.encoded.starts_with("MK"));
/// ```
#[derive(Debug)]
pub struct MockDriver {
    state: Arc<Mutex<MockState>>,
    latency: Duration,
}

impl MockDriver {
    /// Create a connected mock device with a finger already placed.
    ///
    /// Returns a tuple of (MockDriver, MockDriverHandle) where the handle
    /// can be used to script device behavior and inspect the call log.
    pub fn new() -> (Self, MockDriverHandle) {
        let state = Arc::new(Mutex::new(MockState {
            connected: true,
            info: DeviceInfo::new("Mock iDBio", "MOCK-0001", "1.0.0"),
            finger: Some("right-index".to_string()),
            quality: 80,
            enrolled: BTreeMap::new(),
            scripted_failures: HashMap::new(),
            scripted_templates: VecDeque::new(),
            calls: VecDeque::with_capacity(CALL_LOG_CAPACITY),
            call_counts: HashMap::new(),
            in_flight: 0,
            overlaps: 0,
        }));

        let driver = Self {
            state: Arc::clone(&state),
            latency: Duration::ZERO,
        };
        let handle = MockDriverHandle { state };

        (driver, handle)
    }

    /// Simulate the time a finger takes to be read.
    ///
    /// Applied to every call that captures a finger. The worker thread
    /// sleeps, as a real SDK would block.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    fn enter(&self, op: DriverOp) -> CallGuard<'_> {
        let mut state = lock(&self.state);
        if state.calls.len() == CALL_LOG_CAPACITY {
            state.calls.pop_front();
        }
        state.calls.push_back(op);
        *state.call_counts.entry(op).or_default() += 1;
        state.in_flight += 1;
        if state.in_flight > 1 {
            state.overlaps += 1;
        }
        CallGuard { state: &self.state }
    }

    fn simulate_capture_delay(&self) {
        if !self.latency.is_zero() {
            std::thread::sleep(self.latency);
        }
    }
}

/// Marks a driver call as finished when dropped.
struct CallGuard<'a> {
    state: &'a Mutex<MockState>,
}

impl Drop for CallGuard<'_> {
    fn drop(&mut self) {
        let mut state = lock(self.state);
        state.in_flight = state.in_flight.saturating_sub(1);
    }
}

impl NativeDriver for MockDriver {
    fn init(&mut self) -> RetCode {
        let _call = self.enter(DriverOp::Init);
        let mut state = lock(&self.state);
        match state.precheck(DriverOp::Init) {
            Ok(()) => RetCode::SUCCESS,
            Err(code) => code,
        }
    }

    fn terminate(&mut self) -> RetCode {
        let _call = self.enter(DriverOp::Terminate);
        lock(&self.state)
            .take_failure(DriverOp::Terminate)
            .unwrap_or(RetCode::SUCCESS)
    }

    fn device_info(&mut self) -> DriverResult<DeviceInfo> {
        let _call = self.enter(DriverOp::DeviceInfo);
        let mut state = lock(&self.state);
        state.precheck(DriverOp::DeviceInfo)?;
        Ok(state.info.clone())
    }

    fn capture_image(&mut self) -> DriverResult<RawImage> {
        let _call = self.enter(DriverOp::CaptureImage);
        self.simulate_capture_delay();

        let mut state = lock(&self.state);
        state.precheck(DriverOp::CaptureImage)?;
        let finger = state.placed_finger()?;

        // Finger name first, zero padding after; extraction reads it back.
        let size = (SIMULATED_IMAGE_WIDTH * SIMULATED_IMAGE_HEIGHT) as usize;
        let mut pixels = finger.as_bytes().to_vec();
        pixels.resize(size.max(pixels.len()), 0);

        Ok(RawImage {
            data: Bytes::from(pixels),
            width: SIMULATED_IMAGE_WIDTH,
            height: SIMULATED_IMAGE_HEIGHT,
        })
    }

    fn extract_template(&mut self, image: &RawImage) -> DriverResult<ExtractedTemplate> {
        let _call = self.enter(DriverOp::ExtractTemplate);
        let mut state = lock(&self.state);
        if let Some(code) = state.take_failure(DriverOp::ExtractTemplate) {
            return Err(code);
        }

        if let Some((encoded, quality)) = state.scripted_templates.pop_front() {
            return Ok(ExtractedTemplate { encoded, quality });
        }

        let ridge_len = image.data.iter().position(|&b| b == 0).unwrap_or(image.data.len());
        let finger = std::str::from_utf8(&image.data[..ridge_len])
            .map_err(|_| RetCode::ERROR_EXTRACTION)?;
        if finger.is_empty() {
            return Err(RetCode::ERROR_EXTRACTION);
        }

        Ok(ExtractedTemplate {
            encoded: template_for(finger),
            quality: state.quality,
        })
    }

    fn capture_and_identify(&mut self) -> IdentifyReading {
        let _call = self.enter(DriverOp::CaptureAndIdentify);
        self.simulate_capture_delay();

        let mut state = lock(&self.state);
        if let Err(code) = state.precheck(DriverOp::CaptureAndIdentify) {
            return IdentifyReading::failed(code, None);
        }
        let template = match state.placed_finger() {
            Ok(finger) => template_for(finger),
            Err(code) => return IdentifyReading::failed(code, None),
        };

        let quality = state.quality;
        match state.enrolled.iter().find(|(_, enrolled)| **enrolled == template) {
            Some((id, _)) => IdentifyReading::matched(*id, 100, quality),
            None => IdentifyReading::failed(RetCode::ERROR_NOT_IDENTIFIED, Some(quality)),
        }
    }

    fn capture_and_enroll(&mut self, id: DeviceTemplateId) -> RetCode {
        let _call = self.enter(DriverOp::CaptureAndEnroll);
        self.simulate_capture_delay();

        let mut state = lock(&self.state);
        if let Err(code) = state.precheck(DriverOp::CaptureAndEnroll) {
            return code;
        }
        if state.enrolled.contains_key(&id.as_i64()) {
            return RetCode::ERROR_ALREADY_ENROLLED;
        }
        match state.placed_finger().map(template_for) {
            Ok(template) => {
                state.enrolled.insert(id.as_i64(), template);
                RetCode::SUCCESS
            }
            Err(code) => code,
        }
    }

    fn save_template(&mut self, id: DeviceTemplateId, template: &Template) -> RetCode {
        let _call = self.enter(DriverOp::SaveTemplate);
        let mut state = lock(&self.state);
        if let Err(code) = state.precheck(DriverOp::SaveTemplate) {
            return code;
        }
        match state
            .enrolled
            .insert(id.as_i64(), template.as_str().to_string())
        {
            Some(_) => RetCode::WARNING_OVERWRITING_TEMPLATE,
            None => RetCode::SUCCESS,
        }
    }

    fn delete_all_templates(&mut self) -> RetCode {
        let _call = self.enter(DriverOp::DeleteAllTemplates);
        let mut state = lock(&self.state);
        if let Err(code) = state.precheck(DriverOp::DeleteAllTemplates) {
            return code;
        }
        state.enrolled.clear();
        RetCode::SUCCESS
    }

    fn error_message(&self, code: RetCode) -> Option<String> {
        let message = match code {
            RetCode::SUCCESS => "Success",
            RetCode::WARNING_OVERWRITING_TEMPLATE => "Template overwritten",
            RetCode::ERROR_UNKNOWN => "Unknown error",
            RetCode::ERROR_NO_DEVICE => "Device not found",
            RetCode::ERROR_CAPTURE => "Image capture failed",
            RetCode::ERROR_CAPTURE_TIMEOUT => "Capture timeout: no finger detected",
            RetCode::ERROR_EXTRACTION => "Template extraction failed",
            RetCode::ERROR_NOT_IDENTIFIED => "Fingerprint not identified",
            RetCode::ERROR_ALREADY_ENROLLED => "Template already enrolled with this id",
            RetCode::ERROR_NO_SPACE => "No space left on device",
            RetCode::ERROR_INVALID_TEMPLATE => "Invalid template",
            _ => return None,
        };
        Some(message.to_string())
    }
}

/// Handle for controlling a mock driver.
///
/// Clones share the same simulated device.
///
/// # Examples
///
/// ```
/// use bioscan_hardware::driver::RetCode;
/// use bioscan_hardware::mock::{DriverOp, MockDriver};
///
/// let (_driver, handle) = MockDriver::new();
///
/// handle.fail_next(DriverOp::CaptureImage, RetCode::ERROR_CAPTURE_TIMEOUT);
/// handle.queue_template("abc123", 90);
/// handle.set_quality(25);
/// ```
#[derive(Debug, Clone)]
pub struct MockDriverHandle {
    state: Arc<Mutex<MockState>>,
}

impl MockDriverHandle {
    /// Plug or unplug the simulated device.
    pub fn set_connected(&self, connected: bool) {
        lock(&self.state).connected = connected;
    }

    /// Place a finger on the sensor, replacing any finger already there.
    pub fn place_finger(&self, finger: impl Into<String>) {
        lock(&self.state).finger = Some(finger.into());
    }

    /// Lift the finger; captures then time out.
    pub fn lift_finger(&self) {
        lock(&self.state).finger = None;
    }

    /// Quality reported for subsequent reads, clamped to the driver's scale.
    pub fn set_quality(&self, quality: i32) {
        lock(&self.state).quality = quality.clamp(MIN_QUALITY_SCORE, MAX_QUALITY_SCORE);
    }

    /// Make the next call to `op` return `code`. Calls queue up.
    pub fn fail_next(&self, op: DriverOp, code: RetCode) {
        lock(&self.state)
            .scripted_failures
            .entry(op)
            .or_default()
            .push_back(code);
    }

    /// Make the next extraction return this exact encoded template.
    pub fn queue_template(&self, encoded: impl Into<String>, quality: i32) {
        lock(&self.state)
            .scripted_templates
            .push_back((encoded.into(), quality));
    }

    /// Enroll a finger directly in device memory, bypassing the sensor.
    pub fn enroll_finger(&self, id: i64, finger: &str) {
        lock(&self.state).enrolled.insert(id, template_for(finger));
    }

    /// Ids currently enrolled on the device, ascending.
    pub fn enrolled_ids(&self) -> Vec<i64> {
        lock(&self.state).enrolled.keys().copied().collect()
    }

    /// Encoded template stored on the device under `id`.
    pub fn enrolled_template(&self, id: i64) -> Option<String> {
        lock(&self.state).enrolled.get(&id).cloned()
    }

    /// The most recent driver calls (up to [`CALL_LOG_CAPACITY`]), oldest first.
    pub fn calls(&self) -> Vec<DriverOp> {
        lock(&self.state).calls.iter().copied().collect()
    }

    /// Number of calls made to `op` since creation or the last `clear_calls`.
    pub fn count(&self, op: DriverOp) -> usize {
        lock(&self.state).call_counts.get(&op).copied().unwrap_or(0)
    }

    /// Number of times a call started while another was still running.
    pub fn overlap_count(&self) -> usize {
        lock(&self.state).overlaps
    }

    /// Forget the call log.
    pub fn clear_calls(&self) {
        let mut state = lock(&self.state);
        state.calls.clear();
        state.call_counts.clear();
        state.overlaps = 0;
    }

    /// Encoded template the simulated sensor produces for `finger`.
    pub fn template_for(&self, finger: &str) -> String {
        template_for(finger)
    }
}
