//! Gallery view model: a pager, the justified layout over everything it has
//! loaded, and a lightbox cursor.

pub mod delivery;
pub mod lightbox;

use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use crate::gateway::AssetQuery;
use crate::layout::{GalleryLayout, JustifiedLayout, LayoutCache, Tile};
use crate::models::AssetRecord;
use crate::pager::{AssetPager, LoadOutcome};

pub use delivery::Delivery;
pub use lightbox::Lightbox;

/// One renderable tile.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TileView {
    #[serde(flatten)]
    pub tile: Tile,
    pub identity: String,
    pub src: String,
}

/// Everything a gallery needs for one render.
///
/// Loaded tiles are always present, even when `error` is set: a failed page
/// leaves the earlier ones on screen.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GalleryView {
    pub tiles: Vec<TileView>,
    pub container_height: f64,
    pub loading: bool,
    pub has_more: bool,
    pub error: Option<String>,
}

pub struct GalleryModel {
    pager: AssetPager,
    layout: JustifiedLayout,
    cache: LayoutCache,
    delivery: Option<Delivery>,
    container_width: f64,
    lightbox: Lightbox,
}

impl GalleryModel {
    /// Builds the model without fetching anything.
    pub fn new(pager: AssetPager, layout: JustifiedLayout) -> Self {
        Self {
            pager,
            layout,
            cache: LayoutCache::new(),
            delivery: None,
            container_width: 0.0,
            lightbox: Lightbox::default(),
        }
    }

    /// Builds the model and fetches the first page of the pager's query.
    pub async fn open(pager: AssetPager, layout: JustifiedLayout) -> Self {
        let gallery = Self::new(pager, layout);
        gallery.load_more().await;
        gallery
    }

    /// Switches to `query`. On change the accumulated items are dropped, the
    /// lightbox closes and the first page of the new query is fetched.
    pub async fn set_query(&mut self, query: AssetQuery) -> LoadOutcome {
        if !self.pager.set_query(query) {
            return LoadOutcome::Skipped;
        }
        self.lightbox.close();
        self.pager.load_more().await
    }

    /// Renders tiles through transformed delivery URLs instead of the raw
    /// source URL.
    pub fn with_delivery(mut self, delivery: Delivery) -> Self {
        self.delivery = Some(delivery);
        self
    }

    pub fn pager(&self) -> &AssetPager {
        &self.pager
    }

    pub fn container_width(&self) -> f64 {
        self.container_width
    }

    /// Records a new measured width. Widths are whole pixels.
    pub fn resize(&mut self, width: f64) {
        let width = if width.is_finite() { width.floor().max(0.0) } else { 0.0 };
        if width != self.container_width {
            debug!(width, "Gallery resized");
            self.container_width = width;
        }
    }

    pub async fn load_more(&self) -> LoadOutcome {
        self.pager.load_more().await
    }

    /// Geometry for every loaded item at the current width.
    pub fn layout(&self) -> Arc<GalleryLayout> {
        let items = self.pager.items();
        self.cache
            .get_or_compute(&self.layout, &items, self.container_width)
    }

    pub fn view(&self) -> GalleryView {
        let snapshot = self.pager.snapshot();
        let layout = self
            .cache
            .get_or_compute(&self.layout, &snapshot.items, self.container_width);
        let tiles = layout
            .tiles
            .iter()
            .map(|tile| {
                let asset = &snapshot.items[tile.asset_index];
                TileView {
                    tile: *tile,
                    identity: asset.identity.clone(),
                    src: self.tile_src(asset, tile),
                }
            })
            .collect();

        GalleryView {
            tiles,
            container_height: layout.container_height,
            loading: snapshot.loading,
            has_more: snapshot.has_more,
            error: snapshot.error,
        }
    }

    fn tile_src(&self, asset: &AssetRecord, tile: &Tile) -> String {
        match &self.delivery {
            Some(delivery) => delivery.tile_url(asset, tile),
            None => asset.source_url.clone(),
        }
    }

    /// Frame URL for the asset under the lightbox cursor.
    pub fn lightbox_src(&self, viewport_width: u32) -> Option<String> {
        let index = self.lightbox.current()?;
        let items = self.pager.items();
        let asset = items.get(index)?;
        Some(match &self.delivery {
            Some(delivery) => delivery.lightbox_url(asset, viewport_width),
            None => asset.source_url.clone(),
        })
    }

    /// Tears the model down; pages still in flight are dropped.
    pub fn close(&mut self) {
        self.lightbox.close();
        self.pager.close();
    }

    pub fn lightbox(&self) -> &Lightbox {
        &self.lightbox
    }

    pub fn open_lightbox(&mut self, index: usize) {
        self.lightbox.open(index, self.pager.len());
    }

    pub fn close_lightbox(&mut self) {
        self.lightbox.close();
    }

    pub fn lightbox_prev(&mut self) -> Option<usize> {
        self.lightbox.prev()
    }

    /// Advances the lightbox, requesting the next page when close to the end.
    pub async fn lightbox_next(&mut self) -> Option<usize> {
        let index = self.lightbox.next(self.pager.len());
        let wants_more =
            self.lightbox
                .wants_more(self.pager.len(), self.pager.has_more(), self.pager.loading());
        if wants_more {
            self.pager.load_more().await;
        }
        index
    }
}
