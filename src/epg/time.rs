//! XMLTV timestamp normalization
//!
//! Accepted forms, tried in order:
//! 1. `YYYYMMDDHHMMSS`, optionally followed by whitespace and `±HHMM`.
//!    Without an offset the fields are taken as UTC. Anything after the
//!    offset is ignored.
//! 2. RFC 3339 (`2024-01-15T12:00:00+01:00`)
//! 3. RFC 2822 (`Mon, 15 Jan 2024 12:00:00 +0100`)
//!
//! Everything else is rejected.

use chrono::{DateTime, FixedOffset, NaiveDate, TimeZone, Utc};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum TimeError {
    #[error("empty timestamp")]
    Empty,
    #[error("unrecognized timestamp `{0}`")]
    Unrecognized(String),
    #[error("timestamp out of range `{0}`")]
    OutOfRange(String),
}

/// Parse an XMLTV `start`/`stop` value into an absolute instant
pub fn parse_xmltv_time(time_str: &str) -> Result<DateTime<Utc>, TimeError> {
    let time_str = time_str.trim();
    if time_str.is_empty() {
        return Err(TimeError::Empty);
    }

    if let Some((datetime, offset_minutes)) = split_xmltv(time_str) {
        return from_fields(datetime, offset_minutes)
            .ok_or_else(|| TimeError::OutOfRange(time_str.to_string()));
    }

    DateTime::parse_from_rfc3339(time_str)
        .or_else(|_| DateTime::parse_from_rfc2822(time_str))
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| TimeError::Unrecognized(time_str.to_string()))
}

/// Split into the 14 digit field block and the offset in minutes east of UTC
fn split_xmltv(time_str: &str) -> Option<(&str, i32)> {
    let datetime = time_str.get(..14)?;
    if !datetime.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let offset = parse_tz_offset(time_str[14..].trim_start()).unwrap_or(0);
    Some((datetime, offset))
}

/// Parse a leading `+0100` / `-0530` into minutes
pub fn parse_tz_offset(tz: &str) -> Option<i32> {
    let bytes = tz.as_bytes();
    if bytes.len() < 5 {
        return None;
    }

    let sign = match bytes[0] {
        b'+' => 1,
        b'-' => -1,
        _ => return None,
    };
    let digits = tz.get(1..5)?;
    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let hours: i32 = digits[0..2].parse().ok()?;
    let minutes: i32 = digits[2..4].parse().ok()?;
    Some(sign * (hours * 60 + minutes))
}

fn from_fields(datetime: &str, offset_minutes: i32) -> Option<DateTime<Utc>> {
    let field = |range: std::ops::Range<usize>| datetime[range].parse::<u32>().ok();

    let year = datetime[0..4].parse::<i32>().ok()?;
    let naive = NaiveDate::from_ymd_opt(year, field(4..6)?, field(6..8)?)?
        .and_hms_opt(field(8..10)?, field(10..12)?, field(12..14)?)?;

    let offset = FixedOffset::east_opt(offset_minutes * 60)?;
    offset
        .from_local_datetime(&naive)
        .single()
        .map(|dt| dt.with_timezone(&Utc))
}
