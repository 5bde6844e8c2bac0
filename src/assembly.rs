//! Fan-in over upstream record sources.
//!
//! The sources are whatever fetches records (HTTP client, fixture files, ...).
//! Requests are issued concurrently and awaited together; the engine then runs
//! on the flattened result.

use crate::config::Channel;
use crate::errors::GuideError;
use crate::reconciler::{decode_segments, reconcile_live_segments, LiveSegment};
use crate::records::{parse_catalog, CatalogItem, RawScheduleSegment};
use crate::scheduler::{CatalogScheduler, GuideEntry};
use async_trait::async_trait;
use futures::future::join_all;
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// Fetches one broadcaster's published schedule
#[async_trait]
pub trait ScheduleSource: Send + Sync {
    async fn fetch_schedule(&self, broadcaster_id: &str) -> Result<Vec<RawScheduleSegment>, anyhow::Error>;
}

/// Fetches the recent videos of one category
#[async_trait]
pub trait VideoSource: Send + Sync {
    async fn fetch_videos(&self, category_id: &str) -> Result<Vec<CatalogItem>, anyhow::Error>;
}

/// Fetch every broadcaster's schedule concurrently and flatten the segments,
/// in broadcaster order.
///
/// A broadcaster whose fetch fails contributes no segments. A segment with an
/// unparseable timestamp fails the whole call.
pub async fn gather_live_segments<S>(source: &S, broadcaster_ids: &[String]) -> Result<Vec<LiveSegment>, GuideError>
where
    S: ScheduleSource + ?Sized,
{
    let fetches = broadcaster_ids.iter().map(|id| async move {
        match source.fetch_schedule(id).await {
            Ok(raw) => Some((id, raw)),
            Err(e) => {
                warn!(broadcaster = %id, error = %e, "schedule fetch failed, skipping");
                None
            }
        }
    });
    let results = join_all(fetches).await;

    let mut segments = Vec::new();
    for (id, raw) in results.into_iter().flatten() {
        debug!(broadcaster = %id, segments = raw.len(), "fetched schedule");
        segments.extend(decode_segments(id, raw)?);
    }
    Ok(segments)
}

/// Gather and reconcile in one go
pub async fn live_timeline<S>(source: &S, broadcaster_ids: &[String]) -> Result<Vec<LiveSegment>, GuideError>
where
    S: ScheduleSource + ?Sized,
{
    let segments = gather_live_segments(source, broadcaster_ids).await?;
    reconcile_live_segments(segments)
}

/// A channel left out of the EPG, and why
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedChannel {
    pub uuid: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default)]
pub struct Epg {
    pub entries: Vec<GuideEntry>,
    pub skipped: Vec<SkippedChannel>,
}

/// Synthesize today's schedule for every channel.
///
/// All channels share one window so a run straddling midnight stays
/// consistent. Channels whose videos cannot be fetched or scheduled are
/// reported in [`Epg::skipped`] instead of failing the guide.
pub async fn build_epg<V>(source: &V, channels: &[Channel], scheduler: &mut CatalogScheduler) -> Epg
where
    V: VideoSource + ?Sized,
{
    let window = scheduler.current_window();
    let fetches = channels
        .iter()
        .map(|channel| async move { (channel, source.fetch_videos(&channel.uuid).await) });
    let results = join_all(fetches).await;

    let mut epg = Epg::default();
    for (channel, fetched) in results {
        let outcome = fetched
            .map_err(|e| e.to_string())
            .and_then(|videos| {
                scheduler
                    .synthesize_in(&videos, &channel.uuid, window)
                    .map_err(|e| e.to_string())
            });
        match outcome {
            Ok(entries) => {
                debug!(channel = %channel.title, slots = entries.len(), "scheduled channel");
                epg.entries.extend(entries);
            }
            Err(reason) => {
                warn!(channel = %channel.title, %reason, "channel skipped");
                epg.skipped.push(SkippedChannel {
                    uuid: channel.uuid.clone(),
                    reason,
                });
            }
        }
    }

    info!(
        channels = channels.len(),
        skipped = epg.skipped.len(),
        slots = epg.entries.len(),
        "built EPG"
    );
    epg
}

/// Video listings stored as `<root>/<category_id>.json`
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl VideoSource for DirectorySource {
    async fn fetch_videos(&self, category_id: &str) -> Result<Vec<CatalogItem>, anyhow::Error> {
        let path = self.root.join(format!("{}.json", category_id));
        let content = std::fs::read_to_string(&path)
            .map_err(|e| anyhow::anyhow!("{}: {}", path.display(), e))?;
        let value: serde_json::Value = serde_json::from_str(&content)?;
        Ok(parse_catalog(&value)?)
    }
}
