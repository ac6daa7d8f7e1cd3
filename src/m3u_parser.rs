//! M3U playlist parser with HTTPS download support
//!
//! The scan is a two-state machine. `AwaitingEntry` waits for an `#EXTINF`
//! line and `EntryPending` holds the descriptor it produced until the stream
//! URL arrives. The current group is carried across entries and
//! `#EXTGRP` updates it.

use std::collections::HashMap;

use crate::config::FetchConfig;
use crate::error::{Error, Result};
use crate::fetch;
use crate::ident::{slugify, stable_id};
use crate::models::{Channel, Group, Playlist, UNCATEGORIZED};

/// Required first non-blank line
pub const HEADER: &str = "#EXTM3U";
const EXTINF: &str = "#EXTINF:";
const EXTGRP: &str = "#EXTGRP:";
const BOM: char = '\u{feff}';

/// Download and parse M3U from URL (supports HTTP and HTTPS)
pub fn download_and_parse(url: &str, config: &FetchConfig) -> Result<Playlist> {
    let content = fetch::fetch_text(url, config)?;
    parse_m3u(&content)
}

/// Read and parse an M3U file from disk
pub fn parse_file(path: &str) -> Result<Playlist> {
    let bytes = std::fs::read(path)?;
    parse_m3u(&String::from_utf8_lossy(&bytes))
}

/// Parse M3U content into channels and groups
pub fn parse_m3u(content: &str) -> Result<Playlist> {
    let content = content.trim_start_matches(BOM);
    let mut lines = content.lines().map(str::trim).skip_while(|l| l.is_empty());

    let header = match lines.next() {
        Some(first) if first.starts_with(HEADER) => first,
        _ => return Err(Error::missing_header(HEADER)),
    };

    let epg_url = extract_attr(header, "x-tvg-url").or_else(|| extract_attr(header, "url-tvg"));

    let mut scanner = Scanner::default();
    let channels: Vec<Channel> = lines
        .filter_map(|line| scanner.step(classify(line)))
        .collect();

    let groups = collect_groups(&channels);

    log::debug!(
        "Parsed playlist: {} channels in {} groups ({} URL lines without #EXTINF)",
        channels.len(),
        groups.len(),
        scanner.orphan_urls
    );

    Ok(Playlist { channels, groups, epg_url })
}

/// Kinds of line after the header
#[derive(Debug, Clone, Copy, PartialEq)]
enum Line<'a> {
    Blank,
    /// `#EXTINF:` body
    Info(&'a str),
    /// `#EXTGRP:` value
    GroupOverride(&'a str),
    /// Any other `#` line
    Directive,
    Url(&'a str),
}

fn classify(line: &str) -> Line<'_> {
    if line.is_empty() {
        Line::Blank
    } else if let Some(info) = strip_prefix_ignore_case(line, EXTINF) {
        Line::Info(info)
    } else if let Some(group) = strip_prefix_ignore_case(line, EXTGRP) {
        match group.trim() {
            "" => Line::Directive,
            group => Line::GroupOverride(group),
        }
    } else if line.starts_with('#') {
        Line::Directive
    } else {
        Line::Url(line)
    }
}

fn strip_prefix_ignore_case<'a>(line: &'a str, prefix: &str) -> Option<&'a str> {
    let head = line.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix).then(|| &line[prefix.len()..])
}

/// Descriptor built from an `#EXTINF` line, waiting for its URL
#[derive(Debug, Clone, PartialEq)]
struct PendingEntry {
    name: String,
    duration: f64,
    tvg_id: Option<String>,
    tvg_name: Option<String>,
    tvg_logo: Option<String>,
    group: Option<String>,
}

impl PendingEntry {
    fn from_extinf(info: &str) -> Self {
        let info = info.trim();
        let tvg_name = extract_attr(info, "tvg-name");

        let tvg_name_fallback = || tvg_name.clone().filter(|n| !n.is_empty());

        // Channel name is the text after the last comma
        let name = match info.rfind(',') {
            Some(pos) => match info[pos + 1..].trim() {
                "" => tvg_name_fallback().unwrap_or_default(),
                after => after.to_string(),
            },
            None => tvg_name_fallback().unwrap_or_else(|| info.to_string()),
        };

        let tvg_id = extract_attr(info, "tvg-id")
            .filter(|id| !id.is_empty())
            .or_else(|| Some(slugify(&name)).filter(|slug| !slug.is_empty()));

        Self {
            duration: parse_duration(info),
            tvg_id,
            tvg_name,
            tvg_logo: extract_attr(info, "tvg-logo"),
            group: extract_attr(info, "group-title").filter(|g| !g.is_empty()),
            name,
        }
    }

    fn finish(self, url: &str, current_group: Option<&str>) -> Channel {
        let group_title = self
            .group
            .or_else(|| current_group.map(str::to_string))
            .unwrap_or_else(|| UNCATEGORIZED.to_string());

        let id = match self.tvg_id.as_deref() {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => stable_id(&self.name, &group_title),
        };

        Channel {
            id,
            name: self.name,
            tvg_id: self.tvg_id,
            tvg_name: self.tvg_name,
            tvg_logo: self.tvg_logo,
            group_title,
            url: url.to_string(),
            duration: self.duration,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
enum ScanState {
    #[default]
    AwaitingEntry,
    EntryPending(PendingEntry),
}

#[derive(Debug, Default)]
struct Scanner {
    state: ScanState,
    current_group: Option<String>,
    orphan_urls: usize,
}

impl Scanner {
    /// Apply one line; returns a channel when a URL completes an entry.
    ///
    /// | state         | line          | next          | effect                  |
    /// |---------------|---------------|---------------|-------------------------|
    /// | any           | Info          | EntryPending  | new descriptor          |
    /// | AwaitingEntry | GroupOverride | AwaitingEntry | current group           |
    /// | EntryPending  | GroupOverride | EntryPending  | current + entry group   |
    /// | AwaitingEntry | Url           | AwaitingEntry | URL dropped             |
    /// | EntryPending  | Url           | AwaitingEntry | channel emitted         |
    /// | any           | Blank/Directive | unchanged   | none                    |
    fn step(&mut self, line: Line<'_>) -> Option<Channel> {
        let state = std::mem::take(&mut self.state);

        let (next, emitted) = match (state, line) {
            (_, Line::Info(info)) => {
                let entry = PendingEntry::from_extinf(info);
                if let Some(group) = &entry.group {
                    self.current_group = Some(group.clone());
                }
                (ScanState::EntryPending(entry), None)
            }
            (ScanState::AwaitingEntry, Line::GroupOverride(group)) => {
                self.current_group = Some(group.to_string());
                (ScanState::AwaitingEntry, None)
            }
            (ScanState::EntryPending(mut entry), Line::GroupOverride(group)) => {
                self.current_group = Some(group.to_string());
                entry.group = Some(group.to_string());
                (ScanState::EntryPending(entry), None)
            }
            (ScanState::AwaitingEntry, Line::Url(url)) => {
                log::trace!("Dropping URL without #EXTINF: {}", url);
                self.orphan_urls += 1;
                (ScanState::AwaitingEntry, None)
            }
            (ScanState::EntryPending(entry), Line::Url(url)) => {
                let channel = entry.finish(url, self.current_group.as_deref());
                (ScanState::AwaitingEntry, Some(channel))
            }
            (state, Line::Blank | Line::Directive) => (state, None),
        };

        self.state = next;
        emitted
    }
}

/// Leading numeric duration of an `#EXTINF` body, -1 when absent
fn parse_duration(info: &str) -> f64 {
    let end = info
        .find(|c: char| !(c.is_ascii_digit() || matches!(c, '-' | '+' | '.')))
        .unwrap_or(info.len());
    info[..end].parse().unwrap_or(-1.0)
}

/// Extract `key="value"` (or unquoted `key=value`), key matched
/// case-insensitively at a word boundary
fn extract_attr(line: &str, key: &str) -> Option<String> {
    // ASCII lowering keeps byte offsets aligned with `line`
    let lower = line.to_ascii_lowercase();
    let bytes = lower.as_bytes();
    let mut from = 0;

    while let Some(pos) = lower[from..].find(key) {
        let start = from + pos;
        let end = start + key.len();
        from = end;

        let at_boundary = start == 0 || matches!(bytes[start - 1], b' ' | b'\t' | b',' | b'"');
        if !at_boundary || bytes.get(end) != Some(&b'=') {
            continue;
        }

        let rest = &line[end + 1..];
        return Some(match rest.strip_prefix('"') {
            Some(quoted) => match quoted.find('"') {
                Some(close) => quoted[..close].to_string(),
                None => quoted.to_string(),
            },
            None => {
                let stop = rest
                    .find(|c: char| c.is_whitespace() || c == ',')
                    .unwrap_or(rest.len());
                rest[..stop].to_string()
            }
        });
    }

    None
}

/// Distinct group titles in first-seen order with their channel counts
fn collect_groups(channels: &[Channel]) -> Vec<Group> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<Group> = Vec::new();

    for channel in channels {
        let title = channel.group_title.as_str();
        match index.get(title) {
            Some(&i) => groups[i].channel_count += 1,
            None => {
                index.insert(title, groups.len());
                groups.push(Group {
                    id: format!("group_{}", groups.len()),
                    name: title.to_string(),
                    channel_count: 1,
                });
            }
        }
    }

    groups
}

#[cfg(test)]
#[path = "m3u_parser_tests.rs"]
mod tests;
