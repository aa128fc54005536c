//! Translation of native status codes into typed outcomes.

use crate::driver::{NativeDriver, RetCode};
use std::panic::{AssertUnwindSafe, catch_unwind};

/// Structured result of a single driver status code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The code is `SUCCESS` or a warning above it.
    Success,

    /// The code is below `SUCCESS`; carries the driver's description.
    Failure(String),
}

impl Outcome {
    /// Check if the outcome is a success.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }

    /// Convert into a `Result` carrying the failure message.
    pub fn into_result(self) -> Result<(), String> {
        match self {
            Self::Success => Ok(()),
            Self::Failure(message) => Err(message),
        }
    }
}

/// Maps native status codes to [`Outcome`]s using the driver's own lookup.
///
/// Translation never fails: codes the driver does not know, blank
/// descriptions, and panics inside the lookup all fall back to a generic
/// message naming the raw code.
#[derive(Debug, Clone, Copy, Default)]
pub struct ErrorTranslator;

impl ErrorTranslator {
    /// Translate a status code.
    pub fn translate<D: NativeDriver + ?Sized>(driver: &D, code: RetCode) -> Outcome {
        if code.is_success() {
            Outcome::Success
        } else {
            Outcome::Failure(Self::message(driver, code))
        }
    }

    /// Description of a status code, with a generic fallback.
    pub fn message<D: NativeDriver + ?Sized>(driver: &D, code: RetCode) -> String {
        let looked_up = catch_unwind(AssertUnwindSafe(|| driver.error_message(code)))
            .ok()
            .flatten()
            .map(|message| message.trim().to_string())
            .filter(|message| !message.is_empty());

        looked_up.unwrap_or_else(|| Self::generic_message(code))
    }

    fn generic_message(code: RetCode) -> String {
        format!("Unknown device error (code {code})")
    }
}
