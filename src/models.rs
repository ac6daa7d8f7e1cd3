//! Playlist data models

use serde::{Deserialize, Serialize};

/// Group title used when an entry never received one
pub const UNCATEGORIZED: &str = "Uncategorized";

/// Channel/Stream entry from an M3U playlist
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Channel {
    /// Stable id: the tvg id when non-empty, otherwise a hash of name + group
    pub id: String,
    pub name: String,
    pub tvg_id: Option<String>,
    pub tvg_name: Option<String>,
    pub tvg_logo: Option<String>,
    pub group_title: String,
    pub url: String,
    /// Informational; -1 means live
    pub duration: f64,
}

/// Category derived from the distinct group titles of a playlist
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    /// Positional, `group_N` in first-seen order
    pub id: String,
    pub name: String,
    pub channel_count: usize,
}

/// Parsed playlist
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Playlist {
    pub channels: Vec<Channel>,
    pub groups: Vec<Group>,
    /// From x-tvg-url / url-tvg in the header
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub epg_url: Option<String>,
}

impl Playlist {
    /// Channels belonging to a group, matched on the exact title
    pub fn channels_in_group<'a>(&'a self, group: &'a str) -> impl Iterator<Item = &'a Channel> + 'a {
        self.channels.iter().filter(move |c| c.group_title == group)
    }

    pub fn channel(&self, id: &str) -> Option<&Channel> {
        self.channels.iter().find(|c| c.id == id)
    }
}
