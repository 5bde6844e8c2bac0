use crate::artwork::ArtworkSize;
use chrono_tz::Tz;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// A guide channel: one platform category rendered as a TV channel
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Channel {
    pub uuid: String,
    pub title: String,
}

impl Channel {
    pub fn new(uuid: &str, title: &str) -> Self {
        Self {
            uuid: uuid.to_string(),
            title: title.to_string(),
        }
    }
}

/// Built-in channel directory, one channel per featured category
pub fn default_channels() -> Vec<Channel> {
    [
        ("509658", "Just Chatting"),
        ("509660", "IRL"),
        ("509659", "ASMR"),
        ("26936", "Music"),
        ("509664", "Art"),
        ("1669431183", "DJs"),
        ("272263131", "Animals, Aquariums, and Zoos"),
        ("518203", "Sports"),
        ("417752", "Talk Shows and Podcasts"),
        ("1599346425", "Co-working and Studying"),
        ("1469308723", "Software and Game Development"),
        ("1397210469", "Miniatures and Models"),
        ("509673", "Makers and Crafting"),
        ("509667", "Food and Drink"),
        ("772157971", "Writing and Reading"),
    ]
    .into_iter()
    .map(|(uuid, title)| Channel::new(uuid, title))
    .collect()
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct GuideConfig {
    /// IANA zone whose midnight anchors the daily window. None = system zone.
    pub timezone: Option<String>,
    pub placeholder_title: String,
    pub country: String,
    pub guide_artwork: ArtworkSize,
    pub preview_artwork: ArtworkSize,
    pub channels: Vec<Channel>,
}

impl Default for GuideConfig {
    fn default() -> Self {
        Self {
            timezone: None,
            placeholder_title: "No description available".to_string(),
            country: "United States".to_string(),
            guide_artwork: ArtworkSize::GUIDE,
            preview_artwork: ArtworkSize::PREVIEW,
            channels: default_channels(),
        }
    }
}

impl GuideConfig {
    /// `<config_dir>/config.json` for this user, if a home directory exists
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("tv", "streamguide", "stream-guide")
            .map(|dirs| dirs.config_dir().join("config.json"))
    }

    /// Load from `path`, or from the default location.
    ///
    /// An explicit path must exist; a missing default file yields defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, anyhow::Error> {
        if let Some(path) = path {
            let content = fs::read_to_string(path)?;
            return Ok(serde_json::from_str(&content)?);
        }

        if let Some(config_path) = Self::default_path() {
            if config_path.exists() {
                let content = fs::read_to_string(&config_path)?;
                let config: GuideConfig = serde_json::from_str(&content)?;
                tracing::debug!(path = %config_path.display(), "loaded guide config");
                return Ok(config);
            }
        }
        Ok(GuideConfig::default())
    }

    pub fn save(&self, path: Option<&Path>) -> Result<(), anyhow::Error> {
        let config_path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::default_path()
                .ok_or_else(|| anyhow::anyhow!("Cannot determine config directory"))?,
        };
        if let Some(dir) = config_path.parent() {
            fs::create_dir_all(dir)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        fs::write(config_path, content)?;
        Ok(())
    }

    pub fn get_timezone_name(&self) -> String {
        if let Some(tz) = &self.timezone {
            return tz.clone();
        }

        if let Ok(tz) = iana_time_zone::get_timezone() {
            return tz;
        }

        "UTC".to_string()
    }

    /// Zone for the daily window. Unknown names fall back to UTC.
    pub fn resolve_timezone(&self) -> Tz {
        let name = self.get_timezone_name();
        name.parse::<Tz>().unwrap_or_else(|_| {
            tracing::warn!(timezone = %name, "unknown time zone, using UTC");
            chrono_tz::UTC
        })
    }

    pub fn set_timezone(&mut self, tz: String) {
        self.timezone = Some(tz);
    }

    pub fn channel_title(&self, uuid: &str) -> Option<&str> {
        self.channels
            .iter()
            .find(|c| c.uuid == uuid)
            .map(|c| c.title.as_str())
    }
}
