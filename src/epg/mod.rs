//! EPG (Electronic Program Guide) module
//!
//! Contains the XMLTV parser, timestamp normalization and the now/next
//! resolver.

mod node;
mod parser;
mod sanitize;
mod schedule;
mod time;

// Re-export public types
pub use node::{TextNode, XmlElement};
pub use parser::{EpgChannel, EpgDownloader, EpgParser, Guide, Programme};
pub use sanitize::SanitizingReader;
pub use schedule::{resolve_schedule, resolve_schedule_now, Schedule, DEFAULT_UPCOMING};
pub use time::{parse_tz_offset, parse_xmltv_time, TimeError};

use chrono::{DateTime, Local, Utc};

/// Format an instant as local time HH:MM
pub fn format_time(ts: DateTime<Utc>) -> String {
    ts.with_timezone(&Local).format("%H:%M").to_string()
}

/// Format an instant as local datetime YYYY-MM-DD HH:MM
pub fn format_datetime(ts: DateTime<Utc>) -> String {
    ts.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string()
}
