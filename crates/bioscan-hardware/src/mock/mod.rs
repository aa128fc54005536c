//! Mock device implementations for testing and development.
//!
//! This module provides a simulated native driver that can be controlled
//! programmatically without requiring physical hardware.

pub mod driver;

pub use driver::{DriverOp, MockDriver, MockDriverHandle};
