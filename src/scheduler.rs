//! Daily schedule synthesis from a looping video catalog.
//!
//! A category has no real 24/7 programme, only a list of past broadcasts.
//! The scheduler plays that list back to back, wrapping around, until one
//! full day starting at local midnight is covered.

use crate::artwork::{fill_guide_artwork, ArtworkSize};
use crate::config::{Channel, GuideConfig};
use crate::errors::GuideError;
use crate::records::CatalogItem;
use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::Serialize;
use tracing::debug;

/// Length of the synthesis window in seconds
pub const WINDOW_SECONDS: u64 = 86_400;

/// Source of "now"
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock stuck at one instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Generator for guide entry identifiers
pub trait IdSource: Send {
    fn next_id(&mut self) -> String;
}

/// Random v4 UUIDs
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidIds;

impl IdSource for UuidIds {
    fn next_id(&mut self) -> String {
        uuid::Uuid::new_v4().to_string()
    }
}

/// `<prefix>-0`, `<prefix>-1`, ...
#[derive(Debug, Clone)]
pub struct SequentialIds {
    prefix: String,
    next: u64,
}

impl SequentialIds {
    pub fn new(prefix: &str) -> Self {
        Self {
            prefix: prefix.to_string(),
            next: 0,
        }
    }
}

impl IdSource for SequentialIds {
    fn next_id(&mut self) -> String {
        let id = format!("{}-{}", self.prefix, self.next);
        self.next += 1;
        id
    }
}

/// The day being filled: `[start, start + 86400s)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SynthesisWindow {
    pub start: DateTime<Utc>,
    /// Local calendar date the window belongs to
    pub date: NaiveDate,
}

impl SynthesisWindow {
    /// Window for the local day containing `now`
    pub fn for_instant(now: DateTime<Utc>, tz: Tz) -> Self {
        Self::for_date(now.with_timezone(&tz).date_naive(), tz)
    }

    pub fn for_date(date: NaiveDate, tz: Tz) -> Self {
        Self {
            start: local_midnight(date, tz),
            date,
        }
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.at(WINDOW_SECONDS)
    }

    /// Absolute instant `offset` seconds into the window
    pub fn at(&self, offset: u64) -> DateTime<Utc> {
        self.start + chrono::Duration::seconds(offset as i64)
    }
}

/// First valid instant of `date` in `tz`.
///
/// Where midnight falls into a DST gap, the earliest local time after it is used.
fn local_midnight(date: NaiveDate, tz: Tz) -> DateTime<Utc> {
    let mut naive = date.and_time(NaiveTime::MIN);
    for _ in 0..96 {
        if let Some(t) = tz.from_local_datetime(&naive).earliest() {
            return t.with_timezone(&Utc);
        }
        naive += chrono::Duration::minutes(15);
    }
    Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN))
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CardRating {
    #[serde(rename = "Source")]
    pub source: String,
    #[serde(rename = "Value")]
    pub value: String,
}

/// Movie-card fields the guide client renders but the platform has no data for
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ProgramCard {
    pub country: String,
    #[serde(rename = "Rated")]
    pub rated: u8,
    #[serde(rename = "Writer")]
    pub writer: String,
    #[serde(rename = "Actors")]
    pub actors: String,
    #[serde(rename = "Awards")]
    pub awards: String,
    #[serde(rename = "Metascore")]
    pub metascore: String,
    #[serde(rename = "imdbRating")]
    pub imdb_rating: String,
    #[serde(rename = "imdbVotes")]
    pub imdb_votes: String,
    #[serde(rename = "Type")]
    pub kind: String,
    #[serde(rename = "totalSeasons")]
    pub total_seasons: String,
    #[serde(rename = "Response")]
    pub response: String,
    #[serde(rename = "Ratings")]
    pub ratings: Vec<CardRating>,
    pub rating: u8,
}

impl ProgramCard {
    pub fn new(country: &str) -> Self {
        let na = || "N/A".to_string();
        Self {
            country: country.to_string(),
            rated: 0,
            writer: na(),
            actors: na(),
            awards: na(),
            metascore: na(),
            imdb_rating: na(),
            imdb_votes: na(),
            kind: "movie".to_string(),
            total_seasons: na(),
            response: "True".to_string(),
            ratings: vec![CardRating {
                source: na(),
                value: na(),
            }],
            rating: 3,
        }
    }
}

/// One synthesized programme slot
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct GuideEntry {
    pub id: String,
    pub title: String,
    pub description: String,
    pub since: DateTime<Utc>,
    pub till: DateTime<Utc>,
    #[serde(rename = "channelUuid")]
    pub channel_uuid: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(rename = "Released")]
    pub released: Option<String>,
    #[serde(rename = "Runtime")]
    pub runtime: Option<String>,
    #[serde(rename = "Genre", skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
    #[serde(rename = "Director")]
    pub director: Option<String>,
    #[serde(rename = "Language")]
    pub language: Option<String>,
    #[serde(rename = "imdbID")]
    pub source_id: Option<String>,
    #[serde(rename = "Year")]
    pub year: String,
    #[serde(flatten)]
    pub card: ProgramCard,
}

impl GuideEntry {
    pub fn duration_secs(&self) -> i64 {
        (self.till - self.since).num_seconds()
    }
}

/// Builds daily schedules with an injected clock and id generator
pub struct CatalogScheduler {
    clock: Box<dyn Clock>,
    ids: Box<dyn IdSource>,
    timezone: Tz,
    placeholder_title: String,
    country: String,
    artwork: ArtworkSize,
    channels: Vec<Channel>,
}

impl CatalogScheduler {
    /// Scheduler on the system clock with random ids
    pub fn new(config: &GuideConfig) -> Self {
        Self {
            clock: Box::new(SystemClock),
            ids: Box::new(UuidIds),
            timezone: config.resolve_timezone(),
            placeholder_title: config.placeholder_title.clone(),
            country: config.country.clone(),
            artwork: config.guide_artwork,
            channels: config.channels.clone(),
        }
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn with_ids(mut self, ids: impl IdSource + 'static) -> Self {
        self.ids = Box::new(ids);
        self
    }

    pub fn with_timezone(mut self, tz: Tz) -> Self {
        self.timezone = tz;
        self
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    /// Window for the current local day
    pub fn current_window(&self) -> SynthesisWindow {
        SynthesisWindow::for_instant(self.clock.now(), self.timezone)
    }

    /// Fill today's window with `items`, looping as needed.
    pub fn synthesize(
        &mut self,
        items: &[CatalogItem],
        category_id: &str,
    ) -> Result<Vec<GuideEntry>, GuideError> {
        let window = self.current_window();
        self.synthesize_in(items, category_id, window)
    }

    /// Fill the window of a specific local date.
    pub fn synthesize_for_date(
        &mut self,
        items: &[CatalogItem],
        category_id: &str,
        date: NaiveDate,
    ) -> Result<Vec<GuideEntry>, GuideError> {
        let window = SynthesisWindow::for_date(date, self.timezone);
        self.synthesize_in(items, category_id, window)
    }

    pub fn synthesize_in(
        &mut self,
        items: &[CatalogItem],
        category_id: &str,
        window: SynthesisWindow,
    ) -> Result<Vec<GuideEntry>, GuideError> {
        if items.is_empty() {
            return Err(GuideError::EmptyCatalog);
        }

        // Validate everything before emitting anything.
        let durations = items
            .iter()
            .map(|item| item.duration.seconds())
            .collect::<Result<Vec<u64>, GuideError>>()?;

        if durations.iter().all(|&d| d == 0) {
            return Err(GuideError::ZeroDurationCatalog);
        }

        let genre = self
            .channels
            .iter()
            .find(|c| c.uuid == category_id)
            .map(|c| c.title.clone());
        let year = window.date.year().to_string();

        let mut entries = Vec::new();
        let mut elapsed: u64 = 0;
        let mut cursor: usize = 0;

        while elapsed < WINDOW_SECONDS {
            let index = cursor % items.len();
            cursor += 1;

            let duration = durations[index];
            if duration == 0 {
                continue;
            }

            let end = elapsed.saturating_add(duration).min(WINDOW_SECONDS);
            let item = &items[index];
            let title = item
                .title
                .clone()
                .unwrap_or_else(|| self.placeholder_title.clone());

            entries.push(GuideEntry {
                id: self.ids.next_id(),
                description: title.clone(),
                title,
                since: window.at(elapsed),
                till: window.at(end),
                channel_uuid: category_id.to_string(),
                image: item
                    .thumbnail_url
                    .as_deref()
                    .map(|url| fill_guide_artwork(url, self.artwork)),
                released: item.released().map(str::to_string),
                runtime: item.duration.as_token().map(str::to_string),
                genre: genre.clone(),
                director: item.user_login.clone(),
                language: item.language.clone(),
                source_id: item.id.clone(),
                year: year.clone(),
                card: ProgramCard::new(&self.country),
            });

            elapsed = end;
        }

        debug!(
            category = category_id,
            slots = entries.len(),
            videos = items.len(),
            "synthesized daily schedule"
        );
        Ok(entries)
    }
}

/// Synthesize today's schedule with the default configuration,
/// the system clock and random ids.
pub fn synthesize_daily_schedule(
    items: &[CatalogItem],
    category_id: &str,
) -> Result<Vec<GuideEntry>, GuideError> {
    CatalogScheduler::new(&GuideConfig::default()).synthesize(items, category_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::DurationField;

    fn at(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    fn scheduler(now: &str, tz: Tz) -> CatalogScheduler {
        CatalogScheduler::new(&GuideConfig::default())
            .with_clock(FixedClock(at(now)))
            .with_ids(SequentialIds::new("slot"))
            .with_timezone(tz)
    }

    #[test]
    fn test_window_starts_at_local_midnight() {
        let w = SynthesisWindow::for_instant(at("2024-03-10T15:30:00Z"), chrono_tz::UTC);
        assert_eq!(w.start, at("2024-03-10T00:00:00Z"));
        assert_eq!(w.end(), at("2024-03-11T00:00:00Z"));

        // 23:00 on May 31 in New York
        let w = SynthesisWindow::for_instant(at("2024-06-01T03:00:00Z"), chrono_tz::America::New_York);
        assert_eq!(w.date, NaiveDate::from_ymd_opt(2024, 5, 31).unwrap());
        assert_eq!(w.start, at("2024-05-31T04:00:00Z"));
    }

    #[test]
    fn test_midnight_in_dst_gap() {
        // Clocks jumped from 00:00 to 01:00 on this date.
        let date = NaiveDate::from_ymd_opt(2018, 11, 4).unwrap();
        let w = SynthesisWindow::for_date(date, chrono_tz::America::Sao_Paulo);
        assert_eq!(w.start, at("2018-11-04T03:00:00Z"));
    }

    #[test]
    fn test_contiguous_full_day() {
        let items = vec![
            CatalogItem::new("a", "5h"),
            CatalogItem::new("b", "2h30m"),
            CatalogItem::new("c", "47m13s"),
        ];
        let mut s = scheduler("2024-03-10T15:30:00Z", chrono_tz::UTC);
        let entries = s.synthesize(&items, "509658").unwrap();

        assert_eq!(entries[0].since, at("2024-03-10T00:00:00Z"));
        assert_eq!(entries.last().unwrap().till, at("2024-03-11T00:00:00Z"));
        for pair in entries.windows(2) {
            assert_eq!(pair[0].till, pair[1].since);
        }
        for e in &entries {
            assert!(e.since < e.till);
        }
        let span: i64 = entries.iter().map(GuideEntry::duration_secs).sum();
        assert_eq!(span, WINDOW_SECONDS as i64);
        assert_eq!(entries[3].title, "a");
        assert_eq!(entries[0].id, "slot-0");
        assert_eq!(entries[0].genre.as_deref(), Some("Just Chatting"));
    }

    #[test]
    fn test_last_slot_truncated() {
        let items = vec![CatalogItem::new("long", "10h")];
        let mut s = scheduler("2024-03-10T15:30:00Z", chrono_tz::UTC);
        let entries = s.synthesize(&items, "x").unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[2].duration_secs(), 4 * 3600);
        assert_eq!(entries[2].runtime.as_deref(), Some("10h"));
    }

    #[test]
    fn test_multi_day_item() {
        let items = vec![CatalogItem::new("marathon", "30h")];
        let mut s = scheduler("2024-03-10T15:30:00Z", chrono_tz::UTC);
        let entries = s.synthesize(&items, "x").unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].duration_secs(), WINDOW_SECONDS as i64);
    }

    #[test]
    fn test_errors() {
        let mut s = scheduler("2024-03-10T15:30:00Z", chrono_tz::UTC);
        assert_eq!(s.synthesize(&[], "cat1"), Err(GuideError::EmptyCatalog));
        assert_eq!(
            s.synthesize(&[CatalogItem::new("x", "0s")], "cat1"),
            Err(GuideError::ZeroDurationCatalog)
        );

        // The bad item is never reached by the loop but still fails the run.
        let items = vec![
            CatalogItem::new("ok", "30h"),
            CatalogItem::new("bad", "1q"),
        ];
        assert_eq!(
            s.synthesize(&items, "cat1"),
            Err(GuideError::MalformedDuration("1q".into()))
        );

        let missing = CatalogItem {
            duration: DurationField::Missing,
            ..Default::default()
        };
        assert!(matches!(
            s.synthesize(&[missing], "cat1"),
            Err(GuideError::MalformedDuration(_))
        ));
    }

    #[test]
    fn test_zero_duration_items_skipped() {
        let items = vec![CatalogItem::new("empty", "0s"), CatalogItem::new("real", "8h")];
        let mut s = scheduler("2024-03-10T15:30:00Z", chrono_tz::UTC);
        let entries = s.synthesize(&items, "x").unwrap();
        assert_eq!(entries.len(), 3);
        assert!(entries.iter().all(|e| e.title == "real"));
    }

    #[test]
    fn test_metadata_mapping() {
        let item = CatalogItem {
            id: Some("v1".into()),
            title: None,
            duration: DurationField::Token("12h".into()),
            created_at: Some("2024-01-01T10:00:00Z".into()),
            published_at: None,
            user_login: Some("streamer".into()),
            language: Some("en".into()),
            thumbnail_url: Some("https://cdn/t-%{width}x%{height}.jpg".into()),
            url: None,
        };
        let mut s = scheduler("2024-03-10T15:30:00Z", chrono_tz::UTC);
        let entries = s.synthesize(&[item], "unknown-cat").unwrap();
        let e = &entries[0];
        assert_eq!(e.title, "No description available");
        assert_eq!(e.description, e.title);
        assert_eq!(e.image.as_deref(), Some("https://cdn/t-1066x600.jpg"));
        assert_eq!(e.director.as_deref(), Some("streamer"));
        assert_eq!(e.source_id.as_deref(), Some("v1"));
        assert_eq!(e.year, "2024");
        assert_eq!(e.genre, None);

        let json = serde_json::to_value(e).unwrap();
        assert_eq!(json["channelUuid"], "unknown-cat");
        assert_eq!(json["since"], "2024-03-10T00:00:00Z");
        assert_eq!(json["Type"], "movie");
        assert_eq!(json["Ratings"][0]["Source"], "N/A");
        assert!(json.get("Genre").is_none());
    }

    #[test]
    fn test_deterministic_with_fixed_inputs() {
        let items = vec![CatalogItem::new("a", "3h"), CatalogItem::new("b", "1h1s")];
        let first = scheduler("2024-03-10T15:30:00Z", chrono_tz::UTC)
            .synthesize(&items, "x")
            .unwrap();
        let second = scheduler("2024-03-10T01:00:00Z", chrono_tz::UTC)
            .synthesize(&items, "x")
            .unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_synthesize_for_date() {
        let items = vec![CatalogItem::new("a", "6h")];
        let mut s = scheduler("2024-03-10T15:30:00Z", chrono_tz::Europe::Berlin);
        let date = NaiveDate::from_ymd_opt(2024, 7, 1).unwrap();
        let entries = s.synthesize_for_date(&items, "x", date).unwrap();
        assert_eq!(entries[0].since, at("2024-06-30T22:00:00Z"));
        assert_eq!(entries.len(), 4);
    }
}
