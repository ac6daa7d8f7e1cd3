//! M3U playlist and XMLTV guide ingestion.
//!
//! Raw text goes in, normalized channels/groups and guide
//! channels/programmes come out, and [`resolve_schedule`] answers what is
//! airing now and next on a guide channel.
//!
//! ```
//! let playlist = iptv_ingest::parse_playlist(
//!     "#EXTM3U\n#EXTINF:-1 group-title=\"News\",Channel A\nhttp://a\n",
//! ).unwrap();
//! assert_eq!(playlist.groups[0].channel_count, 1);
//! ```

pub mod config;
pub mod epg;
pub mod error;
pub mod fetch;
pub mod ident;
pub mod m3u_parser;
pub mod models;

use chrono::{DateTime, Utc};

pub use config::FetchConfig;
pub use epg::{EpgChannel, Guide, Programme, Schedule, DEFAULT_UPCOMING};
pub use error::{Error, NetworkError, Result};
pub use models::{Channel, Group, Playlist};

/// Parse M3U text into channels and groups
pub fn parse_playlist(content: &str) -> Result<Playlist> {
    m3u_parser::parse_m3u(content)
}

/// Parse XMLTV text into guide channels and programmes
pub fn parse_guide(content: &str) -> Result<Guide> {
    epg::EpgParser::parse(content)
}

/// One GET, then [`parse_playlist`]
pub fn fetch_and_parse_playlist(url: &str, config: &FetchConfig) -> Result<Playlist> {
    m3u_parser::download_and_parse(url, config)
}

/// One GET (gzip bodies accepted), then parse as XMLTV
pub fn fetch_and_parse_guide(url: &str, config: &FetchConfig) -> Result<Guide> {
    epg::EpgDownloader::download_and_parse(url, config)
}

/// Current and upcoming programmes for a guide channel
pub fn resolve_schedule<'a>(
    programmes: &'a [Programme],
    channel_id: &str,
    at: DateTime<Utc>,
    count: usize,
) -> Schedule<'a> {
    epg::resolve_schedule(programmes, channel_id, at, count)
}

/// [`resolve_schedule`] for now, with the default upcoming count
pub fn resolve_schedule_now<'a>(programmes: &'a [Programme], channel_id: &str) -> Schedule<'a> {
    epg::resolve_schedule_now(programmes, channel_id)
}
