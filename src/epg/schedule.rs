//! Now/next resolution over a programme list

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::parser::Programme;

/// Upcoming entries returned when the caller does not ask for a count
pub const DEFAULT_UPCOMING: usize = 5;

/// What is airing on one channel at a reference time, and what follows
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Schedule<'a> {
    pub current: Option<&'a Programme>,
    pub upcoming: Vec<&'a Programme>,
}

/// Resolve the current and upcoming programmes for `channel_id` at `at`.
///
/// Programmes are matched on exact `channel_id` and ordered by start time
/// (stable, so equal starts keep list order). `current` is the first with
/// `start <= at < stop`; `upcoming` is at most `count` entries with
/// `start > at`. The input slice is left untouched.
pub fn resolve_schedule<'a>(
    programmes: &'a [Programme],
    channel_id: &str,
    at: DateTime<Utc>,
    count: usize,
) -> Schedule<'a> {
    let mut matching: Vec<&Programme> = programmes
        .iter()
        .filter(|p| p.channel_id == channel_id)
        .collect();
    matching.sort_by_key(|p| p.start);

    let current = matching.iter().copied().find(|p| p.is_airing(at));
    let upcoming = matching
        .into_iter()
        .filter(|p| p.start > at)
        .take(count)
        .collect();

    Schedule { current, upcoming }
}

/// [`resolve_schedule`] at the current time with [`DEFAULT_UPCOMING`]
pub fn resolve_schedule_now<'a>(programmes: &'a [Programme], channel_id: &str) -> Schedule<'a> {
    resolve_schedule(programmes, channel_id, Utc::now(), DEFAULT_UPCOMING)
}
