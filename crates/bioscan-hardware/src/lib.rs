//! Fingerprint device layer.
//!
//! This crate owns everything between callers and the vendor's native SDK:
//!
//! - [`driver`]: the [`NativeDriver`] contract the SDK binding implements,
//!   with its ordered [`RetCode`] scale.
//! - [`translate`]: [`ErrorTranslator`], turning status codes into typed
//!   outcomes using the driver's own message table.
//! - [`session`]: [`DeviceSession`], the single owner of the device handle.
//!   It serializes every hardware call and runs it on a blocking worker.
//! - [`protocol`]: capture, identify and enroll sequences built on the session.
//! - [`mock`]: a scriptable simulated driver for development and tests.
//!
//! # Example
//!
//! ```
//! use bioscan_hardware::mock::MockDriver;
//! use bioscan_hardware::protocol::CaptureProtocol;
//! use bioscan_hardware::session::DeviceSession;
//!
//! #[tokio::main]
//! async fn main() -> bioscan_hardware::Result<()> {
//!     let (driver, handle) = MockDriver::new();
//!     handle.place_finger("right-thumb");
//!
//!     let session = DeviceSession::new(driver);
//!     session.initialize().await?;
//!
//!     let outcome = CaptureProtocol::new(session.clone()).capture().await?;
//!     assert!(outcome.is_success());
//!
//!     session.terminate().await
//! }
//! ```
//!
//! # Error Handling
//!
//! Session-level failures are [`DeviceError`]s. Protocols report driver
//! failures inside their outcomes and only return an error when the device
//! lock could not be acquired in time.

pub mod driver;
pub mod error;
pub mod mock;
pub mod protocol;
pub mod session;
pub mod translate;
pub mod types;

pub use driver::{DeviceInfo, NativeDriver, RetCode};
pub use error::{DeviceError, Result};
pub use protocol::{CaptureProtocol, EnrollProtocol, IdentifyProtocol};
pub use session::{DeviceHandle, DeviceSession, IdentifyMatch, IdentifyRejection};
pub use translate::{ErrorTranslator, Outcome};
pub use types::{CaptureOutcome, DeviceStatus, IdentifyOutcome};
