//! Device operation sequences.
//!
//! Each protocol issues one serialized device window through a
//! [`DeviceSession`](crate::session::DeviceSession) and turns the translated
//! driver results into a typed outcome. Driver failures become failed
//! outcomes; only lock contention is returned as an error, since in that
//! case the device was never touched.

mod capture;
mod enroll;
mod identify;

pub use capture::CaptureProtocol;
pub use enroll::EnrollProtocol;
pub use identify::IdentifyProtocol;
