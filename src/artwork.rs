use serde::{Deserialize, Serialize};

/// Pixel size substituted into thumbnail URL templates
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct ArtworkSize {
    pub width: u32,
    pub height: u32,
}

impl ArtworkSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Poster size used by guide entries
    pub const GUIDE: ArtworkSize = ArtworkSize::new(1066, 600);

    /// Preview size used by stream and video listings
    pub const PREVIEW: ArtworkSize = ArtworkSize::new(960, 540);
}

/// Fill a VOD thumbnail template (`...-%{width}x%{height}.jpg`).
pub fn fill_guide_artwork(url: &str, size: ArtworkSize) -> String {
    url.replace("%{width}", &size.width.to_string())
        .replace("%{height}", &size.height.to_string())
}

/// Fill a live/preview thumbnail template (`...-{width}x{height}.jpg`).
///
/// VOD templates use the `%{..}` form, so those are filled too rather than
/// leaving a stray `%` in front of the number.
pub fn fill_preview_artwork(url: &str, size: ArtworkSize) -> String {
    fill_guide_artwork(url, size)
        .replace("{width}", &size.width.to_string())
        .replace("{height}", &size.height.to_string())
}
