//! Merging independently authored broadcaster schedules into one timeline.

use crate::errors::GuideError;
use crate::records::{RawScheduleSegment, SegmentCategory};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A scheduled broadcast slot owned by one broadcaster
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LiveSegment {
    pub id: Option<String>,
    pub broadcaster_id: String,
    pub since: DateTime<Utc>,
    pub till: DateTime<Utc>,
    pub title: Option<String>,
    #[serde(default)]
    pub is_recurring: bool,
    pub category: Option<SegmentCategory>,
    #[serde(rename = "channelUuid")]
    pub channel_uuid: Option<String>,
    pub canceled_until: Option<String>,
}

impl LiveSegment {
    pub fn new(broadcaster_id: &str, since: DateTime<Utc>, till: DateTime<Utc>) -> Self {
        Self {
            id: None,
            broadcaster_id: broadcaster_id.to_string(),
            since,
            till,
            title: None,
            is_recurring: false,
            category: None,
            channel_uuid: None,
            canceled_until: None,
        }
    }

    /// Decode an upstream segment, parsing its RFC 3339 start and end.
    pub fn from_raw(broadcaster_id: &str, raw: RawScheduleSegment) -> Result<Self, GuideError> {
        let since = parse_instant(&raw.start_time, "start_time")?;
        let till = parse_instant(&raw.end_time, "end_time")?;
        Ok(Self {
            id: raw.id,
            broadcaster_id: broadcaster_id.to_string(),
            since,
            till,
            title: raw.title,
            is_recurring: raw.is_recurring,
            channel_uuid: raw.category.as_ref().map(|c| c.id.clone()),
            category: raw.category,
            canceled_until: raw.canceled_until,
        })
    }

    pub fn same_interval(&self, other: &LiveSegment) -> bool {
        self.since == other.since && self.till == other.till
    }
}

fn parse_instant(value: &str, field: &str) -> Result<DateTime<Utc>, GuideError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| GuideError::InvalidInput(format!("{} {:?}: {}", field, value, e)))
}

/// Decode every raw segment of one broadcaster. Fails on the first bad timestamp.
pub fn decode_segments(
    broadcaster_id: &str,
    raw: Vec<RawScheduleSegment>,
) -> Result<Vec<LiveSegment>, GuideError> {
    raw.into_iter()
        .map(|r| LiveSegment::from_raw(broadcaster_id, r))
        .collect()
}

fn validate(segments: &[LiveSegment]) -> Result<(), GuideError> {
    match segments.iter().find(|s| s.till < s.since) {
        Some(s) => Err(GuideError::InvalidInput(format!(
            "segment {} of broadcaster {} ends ({}) before it starts ({})",
            s.id.as_deref().unwrap_or("<no id>"),
            s.broadcaster_id,
            s.till.to_rfc3339(),
            s.since.to_rfc3339()
        ))),
        None => Ok(()),
    }
}

/// Sort segments by start and trim overlaps.
///
/// On overlap the earlier-starting segment keeps the contested time and the
/// later one has its start moved to the previous end. A segment left with no
/// time after that (fully covered by its predecessor) is dropped, as are exact
/// duplicates of the previous interval.
pub fn reconcile_live_segments(mut segments: Vec<LiveSegment>) -> Result<Vec<LiveSegment>, GuideError> {
    validate(&segments)?;

    let total = segments.len();
    // Stable: equal starts keep input order.
    segments.sort_by_key(|s| s.since);

    let mut timeline: Vec<LiveSegment> = Vec::with_capacity(total);
    let mut trimmed = 0usize;

    for mut segment in segments {
        if let Some(last) = timeline.last() {
            let clamped = segment.since < last.till;
            if clamped {
                segment.since = last.till;
            }
            if segment.same_interval(last) {
                continue;
            }
            if clamped {
                if segment.since >= segment.till {
                    continue;
                }
                trimmed += 1;
            }
        }
        timeline.push(segment);
    }

    debug!(
        input = total,
        kept = timeline.len(),
        trimmed,
        "reconciled live segments"
    );
    Ok(timeline)
}

/// Reconcile only the segments lying entirely inside `[since, till]`.
pub fn reconcile_within(
    segments: Vec<LiveSegment>,
    since: DateTime<Utc>,
    till: DateTime<Utc>,
) -> Result<Vec<LiveSegment>, GuideError> {
    if till < since {
        return Err(GuideError::InvalidInput(format!(
            "window ends ({}) before it starts ({})",
            till.to_rfc3339(),
            since.to_rfc3339()
        )));
    }
    validate(&segments)?;
    let inside = segments
        .into_iter()
        .filter(|s| s.since >= since && s.till <= till)
        .collect();
    reconcile_live_segments(inside)
}
