//! EPG (Electronic Program Guide) Parser
//! Streaming parser for XMLTV format - each `<channel>` / `<programme>` is
//! collected into a small element tree and mapped as soon as it closes.
//! Supports both plain XML and gzip-compressed (.xml.gz) input.

use chrono::{DateTime, Utc};
use flate2::read::GzDecoder;
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::{BufRead, BufReader, Read};

use super::node::{TextNode, XmlElement};
use super::sanitize::SanitizingReader;
use super::schedule::{resolve_schedule, Schedule};
use super::time::parse_xmltv_time;
use crate::config::FetchConfig;
use crate::error::{Error, Result};
use crate::fetch;

const ROOT_TAG: &str = "tv";
const CHANNEL_TAG: &str = "channel";
const PROGRAMME_TAG: &str = "programme";
const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];
const MAX_STORED_ERRORS: usize = 50;

/// A single TV programme
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Programme {
    /// Guide channel id (not the playlist's)
    pub channel_id: String,
    pub start: DateTime<Utc>,
    /// Next start on the channel when the guide omits it
    pub stop: DateTime<Utc>,
    pub title: String,
    pub subtitle: Option<String>,
    pub description: Option<String>,
    /// Category/genre list, document order
    pub category: Vec<String>,
    /// Programme icon/poster URL
    pub icon: Option<String>,
    /// Original broadcast date
    pub date: Option<String>,
    /// Free-form, e.g. "0.4." or "S01E05"
    pub episode_num: Option<String>,
}

impl Programme {
    /// True when `at` falls within [start, stop)
    pub fn is_airing(&self, at: DateTime<Utc>) -> bool {
        self.start <= at && at < self.stop
    }

    /// Episode number for display: xmltv_ns "0.4." becomes "S01E05",
    /// anything else is returned as-is
    pub fn episode_label(&self) -> Option<String> {
        self.episode_num.as_deref().map(format_episode)
    }
}

/// Channel information from EPG
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpgChannel {
    pub id: String,
    /// Display name
    pub name: String,
    /// Channel icon/logo URL
    pub icon: Option<String>,
    pub url: Option<String>,
}

/// Parsed EPG data
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Guide {
    pub channels: Vec<EpgChannel>,
    /// Document order
    pub programmes: Vec<Programme>,
    /// First 50 recoverable problems
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parse_errors: Vec<String>,
    #[serde(default)]
    pub parse_error_count: usize,
}

impl Guide {
    pub fn channel(&self, id: &str) -> Option<&EpgChannel> {
        self.channels.iter().find(|c| c.id == id)
    }

    pub fn programmes_for<'a>(&'a self, channel_id: &'a str) -> impl Iterator<Item = &'a Programme> + 'a {
        self.programmes.iter().filter(move |p| p.channel_id == channel_id)
    }

    /// Programmes for a channel overlapping [start, end)
    pub fn programmes_in_range(&self, channel_id: &str, start: DateTime<Utc>, end: DateTime<Utc>) -> Vec<&Programme> {
        let mut found: Vec<&Programme> = self
            .programmes
            .iter()
            .filter(|p| p.channel_id == channel_id && p.stop > start && p.start < end)
            .collect();
        found.sort_by_key(|p| p.start);
        found
    }

    /// Current and upcoming programmes for a channel at `at`
    pub fn schedule(&self, channel_id: &str, at: DateTime<Utc>, count: usize) -> Schedule<'_> {
        resolve_schedule(&self.programmes, channel_id, at, count)
    }

    pub fn programme_count(&self) -> usize {
        self.programmes.len()
    }

    fn record_error(&mut self, message: String) {
        log::warn!("{}", message);
        self.parse_error_count += 1;
        if self.parse_errors.len() < MAX_STORED_ERRORS {
            self.parse_errors.push(message);
        }
    }
}

/// EPG Parser for XMLTV format
pub struct EpgParser;

impl EpgParser {
    /// Parse EPG from an XMLTV string
    pub fn parse(xml: &str) -> Result<Guide> {
        Self::parse_reader(xml.as_bytes())
    }

    /// Parse raw bytes: gzip is detected by magic number and the XML is
    /// sanitized before parsing
    pub fn parse_bytes(bytes: &[u8]) -> Result<Guide> {
        if bytes.starts_with(&GZIP_MAGIC) {
            Self::parse_sanitized(GzDecoder::new(bytes))
        } else {
            Self::parse_sanitized(bytes)
        }
    }

    /// Parse EPG from file - auto-detects gzip compression
    pub fn parse_file(path: &str) -> Result<Guide> {
        let file = std::fs::File::open(path)?;
        let mut reader = BufReader::with_capacity(64 * 1024, file);

        let is_gzip = reader.fill_buf()?.starts_with(&GZIP_MAGIC);
        if is_gzip {
            Self::parse_sanitized(GzDecoder::new(reader))
        } else {
            Self::parse_sanitized(reader)
        }
    }

    fn parse_sanitized<R: Read>(raw: R) -> Result<Guide> {
        Self::parse_reader(BufReader::with_capacity(64 * 1024, SanitizingReader::new(raw)))
    }

    /// Parse EPG from a reader - streaming, handles large files
    pub fn parse_reader<R: BufRead>(reader: R) -> Result<Guide> {
        let mut xml_reader = Reader::from_reader(reader);
        // Whitespace next to entity references is significant
        xml_reader.config_mut().trim_text(false);

        let mut guide = Guide::default();
        let mut buf = Vec::with_capacity(8192);
        let mut saw_root = false;
        // Only the first element may be the root
        let mut seen_element = false;
        // Programmes whose stop is filled in once every start is known
        let mut open_stops: Vec<usize> = Vec::new();
        // Open elements of the channel/programme being collected
        let mut stack: Vec<XmlElement> = Vec::new();
        let mut last_error_at = None;

        loop {
            let position = xml_reader.buffer_position();
            match xml_reader.read_event_into(&mut buf) {
                Ok(Event::Start(ref e)) => {
                    let element = element_from(e);
                    if stack.is_empty() {
                        if !seen_element && element.name == ROOT_TAG {
                            saw_root = true;
                        } else if is_entry(&element) {
                            stack.push(element);
                        }
                    } else {
                        stack.push(element);
                    }
                    seen_element = true;
                }
                Ok(Event::Empty(ref e)) => {
                    let element = element_from(e);
                    match stack.last_mut() {
                        Some(parent) => parent.children.push(element),
                        None if !seen_element && element.name == ROOT_TAG => saw_root = true,
                        None if is_entry(&element) => finish_entry(&mut guide, element, &mut open_stops),
                        None => {}
                    }
                    seen_element = true;
                }
                Ok(Event::Text(ref e)) => {
                    if let Some(current) = stack.last_mut() {
                        let raw = String::from_utf8_lossy(e);
                        current.text.push_str(&decode_xml_entities(&raw));
                    }
                }
                Ok(Event::CData(ref e)) => {
                    if let Some(current) = stack.last_mut() {
                        current.text.push_str(&String::from_utf8_lossy(e));
                    }
                }
                Ok(Event::GeneralRef(ref e)) => {
                    if let Some(current) = stack.last_mut() {
                        let entity = format!("&{};", String::from_utf8_lossy(e));
                        current.text.push_str(&decode_xml_entities(&entity));
                    }
                }
                Ok(Event::End(_)) => {
                    if let Some(element) = stack.pop() {
                        match stack.last_mut() {
                            Some(parent) => parent.children.push(element),
                            None => finish_entry(&mut guide, element, &mut open_stops),
                        }
                    }
                }
                Ok(Event::Eof) => {
                    if let Some(open) = stack.first() {
                        guide.record_error(format!("Document ended inside unclosed <{}>", open.name));
                    }
                    break;
                }
                Err(quick_xml::Error::Io(e)) => {
                    return Err(Error::Io(std::io::Error::new(e.kind(), e.to_string())));
                }
                Err(e) => {
                    // No progress since the last error: stop instead of spinning
                    if last_error_at == Some(position) {
                        break;
                    }
                    last_error_at = Some(position);
                    guide.record_error(format!("XML error at byte {}: {}", position, e));
                    // Drop the malformed element
                    stack.clear();
                }
                _ => {}
            }
            buf.clear();
        }

        if !saw_root {
            return Err(Error::missing_root(ROOT_TAG));
        }

        infer_missing_stops(&mut guide.programmes, &open_stops);

        log::debug!(
            "Parsed guide: {} channels, {} programmes, {} problems",
            guide.channels.len(),
            guide.programmes.len(),
            guide.parse_error_count
        );

        Ok(guide)
    }
}

/// Download EPG over HTTP(S) and parse it. One attempt, no retry.
pub struct EpgDownloader;

impl EpgDownloader {
    pub fn download_and_parse(url: &str, config: &FetchConfig) -> Result<Guide> {
        let body = fetch::fetch_bytes(url, config)?;
        EpgParser::parse_bytes(&body)
    }
}

fn is_entry(element: &XmlElement) -> bool {
    element.name == CHANNEL_TAG || element.name == PROGRAMME_TAG
}

fn element_from(e: &BytesStart) -> XmlElement {
    let mut element = XmlElement::new(String::from_utf8_lossy(e.name().as_ref()));
    for attr in e.attributes().flatten() {
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let raw = String::from_utf8_lossy(attr.value.as_ref());
        element.attributes.push((key, decode_xml_entities(&raw)));
    }
    element
}

fn finish_entry(guide: &mut Guide, element: XmlElement, open_stops: &mut Vec<usize>) {
    if element.name == CHANNEL_TAG {
        if let Some(channel) = channel_from(&element) {
            guide.channels.push(channel);
        }
    } else {
        match programme_from(&element) {
            Ok((programme, has_stop)) => {
                if !has_stop {
                    open_stops.push(guide.programmes.len());
                }
                guide.programmes.push(programme);
            }
            Err(reason) => guide.record_error(reason),
        }
    }
}

/// Programmes without a usable stop end where the next programme on the same
/// channel starts, or at their own start when none follows
fn infer_missing_stops(programmes: &mut [Programme], open_stops: &[usize]) {
    if open_stops.is_empty() {
        return;
    }

    let stops: Vec<(usize, DateTime<Utc>)> = {
        let mut starts: HashMap<&str, Vec<DateTime<Utc>>> = HashMap::new();
        for p in programmes.iter() {
            starts.entry(p.channel_id.as_str()).or_default().push(p.start);
        }
        for list in starts.values_mut() {
            list.sort_unstable();
        }

        open_stops
            .iter()
            .map(|&i| {
                let p = &programmes[i];
                let next = starts.get(p.channel_id.as_str()).and_then(|list| {
                    list.get(list.partition_point(|s| *s <= p.start)).copied()
                });
                (i, next.unwrap_or(p.start))
            })
            .collect()
    };

    for (i, stop) in stops {
        programmes[i].stop = stop;
    }
}

fn channel_from(element: &XmlElement) -> Option<EpgChannel> {
    let id = element.attr("id").map(str::trim).filter(|id| !id.is_empty())?;

    Some(EpgChannel {
        id: id.to_string(),
        name: element.text_of("display-name").unwrap_or_default(),
        icon: icon_of(element),
        url: element.text_of("url"),
    })
}

/// The flag is false when `stop` was absent or unusable and still holds `start`
fn programme_from(element: &XmlElement) -> std::result::Result<(Programme, bool), String> {
    let channel_id = element.attr("channel").unwrap_or_default().trim().to_string();

    let start = parse_xmltv_time(element.attr("start").unwrap_or_default())
        .map_err(|e| format!("Skipping programme on channel '{}' (start {})", channel_id, e))?;

    let stop = match element.attr("stop").map(str::trim).filter(|s| !s.is_empty()) {
        None => None,
        Some(raw) => parse_xmltv_time(raw)
            .inspect_err(|e| log::debug!("Inferring stop on channel '{}' (stop {})", channel_id, e))
            .ok(),
    };

    let category = element
        .children_named("category")
        .map(|c| TextNode::from_element(c).resolve())
        .filter(|c| !c.is_empty())
        .collect();

    let episode_num = element
        .children_named("episode-num")
        .map(|e| TextNode::from_element(e).resolve())
        .find(|e| !e.is_empty());

    let programme = Programme {
        start,
        stop: stop.unwrap_or(start),
        title: element.text_of("title").unwrap_or_default(),
        subtitle: element.text_of("sub-title"),
        description: element.text_of("desc"),
        category,
        icon: icon_of(element),
        date: element.text_of("date"),
        episode_num,
        channel_id,
    };
    Ok((programme, stop.is_some()))
}

/// `icon` attribute, else the first `<icon>` child's `src`, else its text
fn icon_of(element: &XmlElement) -> Option<String> {
    let non_empty = |s: &str| Some(s.trim().to_string()).filter(|s| !s.is_empty());

    element.attr("icon").and_then(non_empty).or_else(|| {
        let icon = element.child("icon")?;
        icon.attr("src")
            .and_then(non_empty)
            .or_else(|| non_empty(icon.inline_text()))
    })
}

/// Decode XML entities back to normal characters
fn decode_xml_entities(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }

    let mut result = String::with_capacity(s.len());
    let mut rest = s;

    while let Some(amp) = rest.find('&') {
        result.push_str(&rest[..amp]);
        let tail = &rest[amp..];

        let decoded = tail
            .find(';')
            .filter(|&end| end <= 12)
            .and_then(|end| decode_entity(&tail[1..end]).map(|c| (c, end)));

        match decoded {
            Some((c, end)) => {
                result.push(c);
                rest = &tail[end + 1..];
            }
            None => {
                result.push('&');
                rest = &tail[1..];
            }
        }
    }
    result.push_str(rest);
    result
}

fn decode_entity(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some(' '),
        _ => {
            let num = name.strip_prefix('#')?;
            let code = match num.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => num.parse::<u32>().ok()?,
            };
            char::from_u32(code)
        }
    }
}

/// Format episode number (e.g., "0.4." -> "S01E05")
fn format_episode(episode: &str) -> String {
    let episode = episode.trim();

    // XMLTV format: "season.episode.part" (0-indexed)
    let parts: Vec<&str> = episode.split('.').collect();

    if parts.len() >= 2 {
        // "2/5" means index 2 of 5
        let index = |part: &str| part.trim().split('/').next().unwrap_or("").parse::<i32>().map(|n| n + 1);
        let season = index(parts[0]);
        let ep = index(parts[1]);

        if let (Ok(season), Ok(ep)) = (season, ep) {
            if season > 0 && ep > 0 {
                return format!("S{:02}E{:02}", season, ep);
            }
        }
    }

    episode.to_string()
}

#[cfg(test)]
#[path = "parser_tests.rs"]
mod tests;
