//! Human-readable byte sizes
//!
//! Converts raw byte counts (and byte rates) into binary-unit strings
//! such as `465.66 GB`. Values too large for the biggest unit saturate
//! at TB instead of running off the end of the unit list.

use std::fmt;

use serde::Serialize;

/// Step between consecutive units
pub const UNIT_STEP: f64 = 1024.0;

/// Binary size units, smallest first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum ByteUnit {
    B,
    KB,
    MB,
    GB,
    TB,
}

impl ByteUnit {
    /// All units in ascending order
    pub const ALL: [ByteUnit; 5] = [ByteUnit::B, ByteUnit::KB, ByteUnit::MB, ByteUnit::GB, ByteUnit::TB];

    /// Unit suffix as printed in reports
    pub fn suffix(&self) -> &'static str {
        match self {
            ByteUnit::B => "B",
            ByteUnit::KB => "KB",
            ByteUnit::MB => "MB",
            ByteUnit::GB => "GB",
            ByteUnit::TB => "TB",
        }
    }

    /// The next larger unit, if any
    pub fn next(&self) -> Option<ByteUnit> {
        match self {
            ByteUnit::B => Some(ByteUnit::KB),
            ByteUnit::KB => Some(ByteUnit::MB),
            ByteUnit::MB => Some(ByteUnit::GB),
            ByteUnit::GB => Some(ByteUnit::TB),
            ByteUnit::TB => None,
        }
    }
}

impl fmt::Display for ByteUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.suffix())
    }
}

/// A byte count scaled to a display unit
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FormattedSize {
    /// Scaled value; below 1024 unless `unit` is TB
    pub magnitude: f64,

    /// Display unit
    pub unit: ByteUnit,
}

impl FormattedSize {
    /// Scale a byte count to the largest unit that keeps it below 1024.
    ///
    /// Inputs that would need a unit beyond TB stay in TB with a
    /// magnitude of 1024 or more. Negative input is a caller bug; it is
    /// clamped to zero.
    pub fn from_bytes(bytes: f64) -> Self {
        debug_assert!(bytes >= 0.0, "byte count must be non-negative, got {bytes}");

        let mut magnitude = if bytes.is_sign_negative() || bytes.is_nan() { 0.0 } else { bytes };
        let mut unit = ByteUnit::B;

        while magnitude >= UNIT_STEP {
            match unit.next() {
                Some(next) => {
                    magnitude /= UNIT_STEP;
                    unit = next;
                }
                None => break,
            }
        }

        Self { magnitude, unit }
    }
}

impl fmt::Display for FormattedSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2} {}", self.magnitude, self.unit)
    }
}

/// Format a byte count (or a byte rate) with two decimals and a binary unit
pub fn format_size(bytes: impl Into<f64>) -> String {
    FormattedSize::from_bytes(bytes.into()).to_string()
}

/// Format a `u64` byte count
///
/// `u64` has no lossless `Into<f64>`, so counters go through here.
pub fn format_bytes(bytes: u64) -> String {
    format_size(bytes as f64)
}
