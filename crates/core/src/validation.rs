//! Range validation for stream parameters and demographics tuning.
//!
//! The remote service enforces the same bounds at its edge; checking them
//! here lets a rejected write fail before it reaches the override store.

use std::fmt::Display;

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Stream parameter bounds
// ---------------------------------------------------------------------------

pub const FRAME_DIMENSION_RANGE: (u32, u32) = (1, 2560);
pub const FPS_RANGE: (u32, u32) = (1, 120);
pub const QUALITY_RANGE: (u32, u32) = (80, 100);
pub const MAX_LENGTH_RANGE: (u32, u32) = (0, 10_000);
pub const SKIP_FRAMES_RANGE: (u32, u32) = (0, 100);

// ---------------------------------------------------------------------------
// Demographics tuning bounds
// ---------------------------------------------------------------------------

pub const CONFIDENCE_RANGE: (f64, f64) = (0.1, 1.0);
pub const BOX_AREA_RANGE: (f64, f64) = (0.05, 1.0);
pub const TRACK_HISTORY_RANGE: (u32, u32) = (1, 100);
pub const EXIT_THRESHOLD_RANGE: (u32, u32) = (1, 300);
pub const MIN_TRACK_DURATION_RANGE: (u32, u32) = (1, 60);
pub const MIN_TRACK_UPDATES_RANGE: (u32, u32) = (1, 100);
pub const SAVE_INTERVAL_RANGE: (u32, u32) = (300, 1800);
pub const FRAME_SKIP_INTERVAL_RANGE: (f64, f64) = (0.1, 5.0);

/// Validate that `value` falls within the inclusive `range`.
///
/// Returns a `CoreError::Validation` naming the field if out of range.
/// NaN never satisfies a range.
pub fn validate_range<T>(value: T, range: (T, T), name: &str) -> Result<(), CoreError>
where
    T: PartialOrd + Display + Copy,
{
    let (min, max) = range;
    if !(value >= min && value <= max) {
        return Err(CoreError::Validation(format!(
            "{name} must be between {min} and {max}, got {value}"
        )));
    }
    Ok(())
}

/// Validate an optional field; `None` means "unchanged" and always passes.
pub fn validate_optional<T>(value: Option<T>, range: (T, T), name: &str) -> Result<(), CoreError>
where
    T: PartialOrd + Display + Copy,
{
    match value {
        Some(v) => validate_range(v, range, name),
        None => Ok(()),
    }
}

/// Validate that a string field is not blank.
pub fn validate_not_blank(value: &str, name: &str) -> Result<(), CoreError> {
    if value.trim().is_empty() {
        return Err(CoreError::Validation(format!("{name} must not be empty")));
    }
    Ok(())
}
