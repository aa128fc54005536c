//! Fingerprint capture service.
//!
//! Ties the device layer (`bioscan-hardware`) to the local template store
//! (`bioscan-storage`) and exposes the operations callers use:
//!
//! | Operation | Touches |
//! |-----------|---------|
//! | `get_status` | device |
//! | `capture` | device, then store (insert on success, purge on failure) |
//! | `list_templates`, `get_template` | store |
//! | `identify` | device |
//! | `delete_all_templates`, `delete_template` | store |
//! | `enroll_on_device`, `add_template_to_device`, `delete_all_from_device` | device |
//! | `push_record_to_device` | store (read), device |
//!
//! Configuration and logging setup for the binary live here as well.

pub mod config;
pub mod error;
pub mod logging;
pub mod orchestrator;
pub mod response;
pub mod service;

pub use config::ServiceConfig;
pub use error::{ServiceError, ServiceResult};
pub use orchestrator::{CaptureOrchestrator, SavedCapture};
pub use response::{CaptureResponse, MessageResponse};
pub use service::BiometricService;
