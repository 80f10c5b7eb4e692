use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::layout::HasDimensions;

/// Width used when the upstream record omits its dimensions.
pub const FALLBACK_WIDTH: u32 = 1600;
/// Height used when the upstream record omits its dimensions.
pub const FALLBACK_HEIGHT: u32 = 900;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
    Image,
    Video,
}

impl AssetKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Video => "video",
        }
    }

    /// Parses a comma separated kinds list such as `image,video`.
    ///
    /// Blank segments are ignored, `all` expands to both kinds and an empty
    /// list falls back to images only. The result is sorted and free of
    /// duplicates.
    pub fn parse_list(raw: &str) -> Result<Vec<Self>, String> {
        let mut kinds = Vec::new();
        for part in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            if part.eq_ignore_ascii_case("all") {
                kinds.push(Self::Image);
                kinds.push(Self::Video);
            } else {
                kinds.push(part.parse()?);
            }
        }
        if kinds.is_empty() {
            kinds.push(Self::Image);
        }
        kinds.sort();
        kinds.dedup();
        Ok(kinds)
    }

    /// Joins kinds back into the wire form accepted by `parse_list`.
    pub fn join(kinds: &[Self]) -> String {
        kinds
            .iter()
            .map(|k| k.as_str())
            .collect::<Vec<_>>()
            .join(",")
    }
}

impl FromStr for AssetKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "image" => Ok(Self::Image),
            "video" => Ok(Self::Video),
            other => Err(format!("Unknown asset kind: {other}")),
        }
    }
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One media item as surfaced to galleries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetRecord {
    /// Public identifier assigned by the media store.
    pub identity: String,
    pub kind: AssetKind,
    pub width: u32,
    pub height: u32,
    pub created_at: DateTime<Utc>,
    pub source_url: String,
    /// Logical folder of the asset, e.g. `Folder/Sub`.
    pub folder_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
}

impl AssetRecord {
    /// Creates a record, substituting the fallback pair for missing dimensions.
    pub fn new(
        identity: impl Into<String>,
        kind: AssetKind,
        width: Option<u32>,
        height: Option<u32>,
    ) -> Self {
        let (width, height) = dimensions_or_fallback(width, height);
        Self {
            identity: identity.into(),
            kind,
            width,
            height,
            created_at: DateTime::<Utc>::default(),
            source_url: String::new(),
            folder_path: String::new(),
            format: None,
        }
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    pub fn with_source_url(mut self, url: impl Into<String>) -> Self {
        self.source_url = url.into();
        self
    }

    pub fn with_folder(mut self, folder: impl Into<String>) -> Self {
        self.folder_path = folder.into();
        self
    }

    pub fn is_video(&self) -> bool {
        self.kind == AssetKind::Video
    }
}

impl HasDimensions for AssetRecord {
    fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

/// Replaces absent or zero dimensions with the fallback pair.
///
/// Both values are replaced together so a half-known size cannot produce a
/// distorted aspect ratio.
pub fn dimensions_or_fallback(width: Option<u32>, height: Option<u32>) -> (u32, u32) {
    match (width, height) {
        (Some(w), Some(h)) if w > 0 && h > 0 => (w, h),
        _ => (FALLBACK_WIDTH, FALLBACK_HEIGHT),
    }
}
