//! Shared constants for the fingerprint device service.
//!
//! Limits and defaults used by more than one crate live here so the hardware
//! layer, the template store and the service agree on them.
//!
//! ```
//! use bioscan_core::constants::*;
//! use std::time::Duration;
//!
//! let timeout = Duration::from_millis(DEFAULT_LOCK_TIMEOUT_MS);
//! assert_eq!(timeout.as_secs(), 30);
//! ```

// ============================================================================
// Quality scale
// ============================================================================

/// Lowest quality score a driver reports.
pub const MIN_QUALITY_SCORE: i32 = 0;

/// Highest quality score a driver reports.
pub const MAX_QUALITY_SCORE: i32 = 100;

// ============================================================================
// Device access
// ============================================================================

/// Default time a caller waits for the exclusive device lock (milliseconds).
///
/// A capture holds the lock for as long as the user takes to place a finger.
pub const DEFAULT_LOCK_TIMEOUT_MS: u64 = 30_000;

/// Default image width produced by the simulated device.
pub const SIMULATED_IMAGE_WIDTH: u32 = 256;

/// Default image height produced by the simulated device.
pub const SIMULATED_IMAGE_HEIGHT: u32 = 288;

// ============================================================================
// Persistence
// ============================================================================

/// Default SQLite database file.
pub const DEFAULT_DATABASE_PATH: &str = "bioscan.db";

/// Default connection pool size.
pub const DEFAULT_MAX_CONNECTIONS: u32 = 10;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quality_range() {
        assert!(MIN_QUALITY_SCORE < MAX_QUALITY_SCORE);
    }

    #[test]
    fn test_simulated_image_dimensions_non_zero() {
        assert!(SIMULATED_IMAGE_WIDTH > 0);
        assert!(SIMULATED_IMAGE_HEIGHT > 0);
    }
}
