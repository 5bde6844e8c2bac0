//! Typed views of the upstream records the engine consumes.
//!
//! Upstream listings are loosely typed: ids come back as numbers or strings,
//! durations are sometimes missing, and a record may be some other JSON shape
//! entirely. Only the allow-listed fields below are decoded; everything else
//! in the payload is ignored.

use crate::artwork::{fill_preview_artwork, ArtworkSize};
use crate::duration::{format_hms, json_type_name, parse_duration};
use crate::errors::GuideError;
use serde::de::{self, DeserializeOwned, IgnoredAny, MapAccess, SeqAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::fmt;

/// The `duration` field of a video record, kept as reported
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DurationField {
    Token(String),
    /// Present but not a string; holds the JSON type name
    Invalid(&'static str),
    #[default]
    Missing,
}

impl DurationField {
    pub fn as_token(&self) -> Option<&str> {
        match self {
            DurationField::Token(t) => Some(t),
            _ => None,
        }
    }

    /// Seconds for this field.
    ///
    /// A missing field is a malformed duration; a non-string one is invalid input.
    pub fn seconds(&self) -> Result<u64, GuideError> {
        match self {
            DurationField::Token(t) => parse_duration(t),
            DurationField::Invalid(kind) => Err(GuideError::InvalidInput(format!(
                "duration must be a string, got {}",
                kind
            ))),
            DurationField::Missing => Err(GuideError::MalformedDuration("<missing>".to_string())),
        }
    }
}

impl Serialize for DurationField {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            DurationField::Token(t) => serializer.serialize_str(t),
            _ => serializer.serialize_none(),
        }
    }
}

impl<'de> Deserialize<'de> for DurationField {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct DurationVisitor;

        impl<'de> Visitor<'de> for DurationVisitor {
            type Value = DurationField;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a duration token")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
                Ok(DurationField::Token(v.to_string()))
            }

            fn visit_string<E: de::Error>(self, v: String) -> Result<Self::Value, E> {
                Ok(DurationField::Token(v))
            }

            fn visit_bool<E: de::Error>(self, _v: bool) -> Result<Self::Value, E> {
                Ok(DurationField::Invalid("a boolean"))
            }

            fn visit_i64<E: de::Error>(self, _v: i64) -> Result<Self::Value, E> {
                Ok(DurationField::Invalid("a number"))
            }

            fn visit_u64<E: de::Error>(self, _v: u64) -> Result<Self::Value, E> {
                Ok(DurationField::Invalid("a number"))
            }

            fn visit_f64<E: de::Error>(self, _v: f64) -> Result<Self::Value, E> {
                Ok(DurationField::Invalid("a number"))
            }

            fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
                Ok(DurationField::Missing)
            }

            fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
                Ok(DurationField::Missing)
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
                while seq.next_element::<IgnoredAny>()?.is_some() {}
                Ok(DurationField::Invalid("an array"))
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                while map.next_entry::<IgnoredAny, IgnoredAny>()?.is_some() {}
                Ok(DurationField::Invalid("an object"))
            }
        }

        deserializer.deserialize_any(DurationVisitor)
    }
}

/// Accept an id reported as either a number or a string
pub fn deserialize_flex_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(de::Error::custom(format!(
            "expected a string or number id, got {}",
            json_type_name(&other)
        ))),
    }
}

/// One recorded video as listed by the platform
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct CatalogItem {
    #[serde(default, deserialize_with = "deserialize_flex_string")]
    pub id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub duration: DurationField,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub published_at: Option<String>,
    #[serde(default)]
    pub user_login: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

impl CatalogItem {
    /// Convenience constructor for a titled item with a duration token
    pub fn new(title: &str, duration: &str) -> Self {
        Self {
            title: Some(title.to_string()),
            duration: DurationField::Token(duration.to_string()),
            ..Default::default()
        }
    }

    /// Release timestamp: creation time, else publication time
    pub fn released(&self) -> Option<&str> {
        self.created_at.as_deref().or(self.published_at.as_deref())
    }
}

/// Category attached to a broadcaster schedule segment
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct SegmentCategory {
    #[serde(deserialize_with = "deserialize_required_flex_string")]
    pub id: String,
    #[serde(default)]
    pub name: String,
}

fn deserialize_required_flex_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    deserialize_flex_string(deserializer)?.ok_or_else(|| de::Error::custom("id must not be null"))
}

/// A broadcaster schedule segment exactly as the schedule endpoint returns it
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct RawScheduleSegment {
    #[serde(default, deserialize_with = "deserialize_flex_string")]
    pub id: Option<String>,
    pub start_time: String,
    pub end_time: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub is_recurring: bool,
    #[serde(default)]
    pub category: Option<SegmentCategory>,
    #[serde(default)]
    pub canceled_until: Option<String>,
}

/// Decode a JSON array of records, mapping shape problems to `InvalidInput`.
pub fn decode_records<T: DeserializeOwned>(value: &Value, what: &str) -> Result<Vec<T>, GuideError> {
    let items = value.as_array().ok_or_else(|| {
        GuideError::InvalidInput(format!("{} must be an array, got {}", what, json_type_name(value)))
    })?;

    items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            if !item.is_object() {
                return Err(GuideError::InvalidInput(format!(
                    "{}[{}] must be an object, got {}",
                    what,
                    i,
                    json_type_name(item)
                )));
            }
            T::deserialize(item)
                .map_err(|e| GuideError::InvalidInput(format!("{}[{}]: {}", what, i, e)))
        })
        .collect()
}

/// Decode a video listing into catalog items
pub fn parse_catalog(value: &Value) -> Result<Vec<CatalogItem>, GuideError> {
    decode_records(value, "catalog")
}

/// A catalog line for listing screens
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct CatalogLine {
    pub id: Option<String>,
    pub title: Option<String>,
    pub runtime: String,
    pub seconds: u64,
    pub thumbnail_url: Option<String>,
}

/// Per-video runtimes plus the catalog total
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct CatalogSummary {
    pub videos: Vec<CatalogLine>,
    pub total_seconds: u64,
    pub total: String,
}

impl CatalogSummary {
    pub fn from_items(items: &[CatalogItem], preview: ArtworkSize) -> Result<Self, GuideError> {
        let mut total_seconds: u64 = 0;
        let mut videos = Vec::with_capacity(items.len());
        for item in items {
            let seconds = item.duration.seconds()?;
            total_seconds = total_seconds.saturating_add(seconds);
            videos.push(CatalogLine {
                id: item.id.clone(),
                title: item.title.clone(),
                runtime: format_hms(seconds),
                seconds,
                thumbnail_url: item
                    .thumbnail_url
                    .as_deref()
                    .map(|url| fill_preview_artwork(url, preview)),
            });
        }
        Ok(Self {
            videos,
            total_seconds,
            total: format_hms(total_seconds),
        })
    }
}
