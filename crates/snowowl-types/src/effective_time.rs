//! RF2 effective times.
//!
//! Effective times are written as `yyyyMMdd` in release files and kept as
//! `u32` values (e.g. `20240131`) everywhere else. A blank effective time
//! marks unpublished content.

use std::fmt;

/// Error returned for malformed effective time values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectiveTimeError(pub String);

impl fmt::Display for EffectiveTimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid effective time '{}' (expected yyyyMMdd)", self.0)
    }
}

impl std::error::Error for EffectiveTimeError {}

/// Parses an RF2 effective time column.
///
/// Returns `Ok(None)` for blank values (unpublished rows).
///
/// # Examples
///
/// ```
/// use snowowl_types::parse_effective_time;
///
/// assert_eq!(parse_effective_time("20020131").unwrap(), Some(20020131));
/// assert_eq!(parse_effective_time("").unwrap(), None);
/// assert!(parse_effective_time("2002-01-31").is_err());
/// ```
pub fn parse_effective_time(value: &str) -> Result<Option<u32>, EffectiveTimeError> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    if value.len() != 8 || !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(EffectiveTimeError(value.to_string()));
    }

    let parsed = value
        .parse::<u32>()
        .map_err(|_| EffectiveTimeError(value.to_string()))?;
    let month = (parsed / 100) % 100;
    let day = parsed % 100;
    if !(1..=12).contains(&month) || day == 0 || day > days_in_month(parsed / 10000, month) {
        return Err(EffectiveTimeError(value.to_string()));
    }
    Ok(Some(parsed))
}

/// Formats an effective time as an ISO date (`yyyy-MM-dd`).
pub fn format_iso_date(effective_time: u32) -> String {
    format!(
        "{:04}-{:02}-{:02}",
        effective_time / 10000,
        (effective_time / 100) % 100,
        effective_time % 100
    )
}

fn days_in_month(year: u32, month: u32) -> u32 {
    match month {
        2 if year % 4 == 0 && (year % 100 != 0 || year % 400 == 0) => 29,
        2 => 28,
        4 | 6 | 9 | 11 => 30,
        _ => 31,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_effective_time() {
        assert_eq!(parse_effective_time("20240131"), Ok(Some(20240131)));
        assert_eq!(parse_effective_time("  "), Ok(None));
        assert_eq!(parse_effective_time("20240229"), Ok(Some(20240229)));
        assert!(parse_effective_time("20230229").is_err());
        assert!(parse_effective_time("20241301").is_err());
        assert!(parse_effective_time("2024013").is_err());
        assert!(parse_effective_time("2024013a").is_err());
    }

    #[test]
    fn test_format_iso_date() {
        assert_eq!(format_iso_date(20020131), "2002-01-31");
        assert_eq!(format_iso_date(20240701), "2024-07-01");
    }
}
