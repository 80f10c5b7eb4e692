use anyhow::{Context, Result};
use reqwest::Url;

use crate::layout::Tile;
use crate::models::{AssetKind, AssetRecord};

pub const DEFAULT_DELIVERY_BASE: &str = "https://res.cloudinary.com";

/// Widest frame a lightbox will ask for.
pub const LIGHTBOX_MAX_WIDTH: u32 = 3000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CropMode {
    /// Crop to exactly the requested box, gravity chosen by the store.
    Fill,
    /// Scale down to fit, never crop.
    Limit,
}

impl CropMode {
    fn as_param(self) -> &'static str {
        match self {
            Self::Fill => "c_fill",
            Self::Limit => "c_limit",
        }
    }
}

/// Builds public delivery URLs. No credentials are involved.
#[derive(Debug, Clone)]
pub struct Delivery {
    base: Url,
    cloud_name: String,
}

impl Delivery {
    /// Delivery through the public CDN host.
    pub fn new(cloud_name: impl Into<String>) -> Result<Self> {
        let base = Url::parse(DEFAULT_DELIVERY_BASE)
            .with_context(|| format!("Invalid delivery base {DEFAULT_DELIVERY_BASE}"))?;
        Ok(Self::with_base(base, cloud_name))
    }

    pub fn with_base(base: Url, cloud_name: impl Into<String>) -> Self {
        Self {
            base,
            cloud_name: cloud_name.into(),
        }
    }

    fn build(&self, kind: AssetKind, transformation: &str, public_id: &str, ext: &str) -> String {
        let mut url = self.base.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .push(&self.cloud_name)
                .push(kind.as_str())
                .push("upload")
                .push(transformation);
            let mut parts = public_id.split('/').peekable();
            while let Some(part) = parts.next() {
                if parts.peek().is_none() {
                    segments.push(&format!("{part}{ext}"));
                } else {
                    segments.push(part);
                }
            }
        }
        url.to_string()
    }

    /// Auto-format, auto-quality rendition cropped or limited to the box.
    pub fn transformed(
        &self,
        public_id: &str,
        kind: AssetKind,
        width: Option<u32>,
        height: Option<u32>,
        mode: CropMode,
    ) -> String {
        let mut transformation = format!("f_auto,q_auto,g_auto,{}", mode.as_param());
        if let Some(w) = width {
            transformation.push_str(&format!(",w_{w}"));
        }
        if let Some(h) = height {
            transformation.push_str(&format!(",h_{h}"));
        }
        self.build(kind, &transformation, public_id, "")
    }

    /// Source for a gallery tile, sized to the tile. Videos get a poster.
    pub fn tile_url(&self, asset: &AssetRecord, tile: &Tile) -> String {
        let width = tile.width.round().max(1.0) as u32;
        let height = tile.height.round().max(1.0) as u32;
        if asset.is_video() {
            return self.poster_url(&asset.identity, width, height);
        }
        self.transformed(
            &asset.identity,
            asset.kind,
            Some(width),
            Some(height),
            CropMode::Fill,
        )
    }

    /// JPEG still of a video, filled to the given box.
    pub fn poster_url(&self, public_id: &str, width: u32, height: u32) -> String {
        let transformation = format!("f_auto,q_auto,g_auto,c_fill,w_{width},h_{height}");
        self.build(AssetKind::Video, &transformation, public_id, ".jpg")
    }

    /// Full-screen frame: 1.5x the viewport width, capped at `LIGHTBOX_MAX_WIDTH`.
    pub fn lightbox_url(&self, asset: &AssetRecord, viewport_width: u32) -> String {
        let width = ((viewport_width as f64 * 1.5).ceil() as u32).min(LIGHTBOX_MAX_WIDTH);
        let transformation = format!("f_auto,q_auto,c_limit,w_{width}");
        self.build(asset.kind, &transformation, &asset.identity, "")
    }
}
