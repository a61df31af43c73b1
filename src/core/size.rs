//! Human size string codec: "5MB" <-> byte counts.
//!
//! Units are binary: KB = 1024, MB = 1024^2, GB = 1024^3. There is no
//! implicit default unit — "500" is rejected, "500B" is not.

use crate::core::errors::{FqhError, Result};

const KB: u64 = 1024;
const MB: u64 = KB * 1024;
const GB: u64 = MB * 1024;

/// Parse a human size string into a byte count.
///
/// Accepts a non-negative decimal number immediately followed by one of
/// B, KB, MB, GB (case-insensitive, no intervening space). Fractional
/// values are allowed for the multi-byte units ("1.5MB").
pub fn parse_size(text: &str) -> Result<u64> {
    let trimmed = text.trim();
    let invalid = || FqhError::InvalidSizeFormat {
        input: text.to_string(),
    };

    let split = trimmed
        .char_indices()
        .find(|(_, c)| c.is_ascii_alphabetic())
        .map(|(i, _)| i)
        .ok_or_else(invalid)?;
    let (number_part, unit_part) = trimmed.split_at(split);

    if number_part.is_empty() {
        return Err(invalid());
    }
    let value: f64 = number_part.parse().map_err(|_| invalid())?;
    if value < 0.0 || !value.is_finite() {
        return Err(invalid());
    }

    let multiplier = match unit_part.to_ascii_uppercase().as_str() {
        "B" => 1,
        "KB" => KB,
        "MB" => MB,
        "GB" => GB,
        _ => return Err(invalid()),
    };

    // Whole bytes only for the base unit.
    if multiplier == 1 && number_part.contains('.') {
        return Err(invalid());
    }

    #[allow(clippy::cast_precision_loss, clippy::cast_sign_loss)]
    #[allow(clippy::cast_possible_truncation)]
    Ok((value * multiplier as f64).round() as u64)
}

/// Render a byte count using the largest unit where the value is >= 1.
///
/// Bytes below 1024 render as an integer with a "B" suffix; KB/MB/GB render
/// with two decimal places. Rounding follows Rust's `{:.2}` formatting,
/// which rounds half to even.
#[must_use]
pub fn format_size(bytes: u64) -> String {
    #[allow(clippy::cast_precision_loss)]
    let b = bytes as f64;
    if bytes < KB {
        format!("{bytes}B")
    } else if bytes < MB {
        format!("{:.2}KB", b / KB as f64)
    } else if bytes < GB {
        format!("{:.2}MB", b / MB as f64)
    } else {
        format!("{:.2}GB", b / GB as f64)
    }
}
