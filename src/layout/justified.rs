use serde::Serialize;

/// Anything the layout engine can measure.
pub trait HasDimensions {
    /// Intrinsic `(width, height)` in pixels.
    fn dimensions(&self) -> (u32, u32);
}

impl HasDimensions for (u32, u32) {
    fn dimensions(&self) -> (u32, u32) {
        *self
    }
}

/// Placement of one asset inside the gallery container.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Tile {
    pub asset_index: usize,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// A closed row of tiles.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RowSpan {
    /// Start index in the asset list (inclusive)
    pub start_index: usize,
    /// End index in the asset list (exclusive)
    pub end_index: usize,
    pub y: f64,
    pub height: f64,
    /// False only for a trailing row that was not stretched to full width.
    pub justified: bool,
}

impl RowSpan {
    pub fn len(&self) -> usize {
        self.end_index - self.start_index
    }

    pub fn is_empty(&self) -> bool {
        self.start_index == self.end_index
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GalleryLayout {
    pub tiles: Vec<Tile>,
    pub rows: Vec<RowSpan>,
    pub container_height: f64,
}

/// Configuration for the justified row packing algorithm.
///
/// Rows are filled until their natural height (the height at which the row
/// exactly spans the container) drops to `target_row_height * tolerance`,
/// then the row is closed at that height.
#[derive(Debug, Clone, PartialEq)]
pub struct JustifiedLayout {
    /// Target row height in pixels (default: 320)
    pub target_row_height: f64,
    /// Gap between tiles and between rows in pixels (default: 16)
    pub gutter: f64,
    /// Multiplier on the target above which a row keeps growing (default: 1.0)
    pub tolerance: f64,
    /// Lower aspect ratio clamp (default: 0.25)
    pub min_aspect: f64,
    /// Upper aspect ratio clamp (default: 4.0)
    pub max_aspect: f64,
}

impl Default for JustifiedLayout {
    fn default() -> Self {
        Self {
            target_row_height: 320.0,
            gutter: 16.0,
            tolerance: 1.0,
            min_aspect: 0.25,
            max_aspect: 4.0,
        }
    }
}

impl JustifiedLayout {
    pub fn new(target_row_height: f64, gutter: f64) -> Self {
        Self {
            target_row_height,
            gutter,
            ..Self::default()
        }
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    fn aspect_ratio<T: HasDimensions>(&self, item: &T) -> f64 {
        let (w, h) = item.dimensions();
        let ar = if w == 0 || h == 0 {
            1.0
        } else {
            w as f64 / h as f64
        };
        ar.clamp(self.min_aspect, self.max_aspect)
    }

    /// Gutter in whole pixels, so tile edges stay on the pixel grid.
    fn gutter_px(&self) -> f64 {
        self.gutter.round().max(0.0)
    }

    fn close_threshold(&self) -> f64 {
        self.target_row_height.max(1.0) * self.tolerance.max(0.0)
    }

    /// Stable fingerprint of the parameters, used as part of cache keys.
    pub fn fingerprint(&self) -> [u64; 5] {
        [
            self.target_row_height.to_bits(),
            self.gutter.to_bits(),
            self.tolerance.to_bits(),
            self.min_aspect.to_bits(),
            self.max_aspect.to_bits(),
        ]
    }

    /// Computes justified tile geometry for `items` in a container of the
    /// given width.
    ///
    /// # Algorithm
    /// 1. Accumulate clamped aspect ratios into a candidate row.
    /// 2. After each item compute the natural row height
    ///    `(width - gutter * (n - 1)) / sum(ar)`; close the row once it is at
    ///    or below the tolerated target.
    /// 3. Lay closed rows out left to right, stretching the last tile so the
    ///    row ends exactly at the container edge.
    /// 4. A trailing row that never closed renders at
    ///    `min(target, natural)` height without stretching.
    ///
    /// An empty list or a non-positive width yields an empty layout.
    pub fn compute<T: HasDimensions>(&self, items: &[T], container_width: f64) -> GalleryLayout {
        if items.is_empty() || !(container_width > 0.0) {
            return GalleryLayout::default();
        }
        let width = container_width.floor();
        if width <= 0.0 {
            return GalleryLayout::default();
        }

        let ratios: Vec<f64> = items.iter().map(|it| self.aspect_ratio(it)).collect();
        let threshold = self.close_threshold();

        let mut out = GalleryLayout {
            tiles: Vec::with_capacity(items.len()),
            rows: Vec::new(),
            container_height: 0.0,
        };
        let mut y = 0.0f64;
        let mut row_start = 0usize;
        let mut ar_sum = 0.0f64;

        let gutter = self.gutter_px();

        for (i, ar) in ratios.iter().enumerate() {
            // No room left for another gutter: close the row without this item.
            let count = i - row_start + 1;
            if count > 1 && width - gutter * (count - 1) as f64 <= 0.0 {
                let natural = self.natural_height(width, count - 1, ar_sum);
                let row_height =
                    self.place_row(&mut out, &ratios, row_start, i, y, natural, width, true);
                y += row_height + gutter;
                row_start = i;
                ar_sum = 0.0;
            }

            ar_sum += ar;
            let count = i - row_start + 1;
            let natural = self.natural_height(width, count, ar_sum);
            if natural <= threshold {
                let row_height =
                    self.place_row(&mut out, &ratios, row_start, i + 1, y, natural, width, true);
                y += row_height + gutter;
                row_start = i + 1;
                ar_sum = 0.0;
            }
        }

        if row_start < ratios.len() {
            let count = ratios.len() - row_start;
            let natural = self.natural_height(width, count, ar_sum);
            let height = self.target_row_height.min(natural);
            let row_height =
                self.place_row(&mut out, &ratios, row_start, ratios.len(), y, height, width, false);
            y += row_height + gutter;
        }

        out.container_height = (y - gutter).max(0.0);
        out
    }

    fn natural_height(&self, width: f64, count: usize, ar_sum: f64) -> f64 {
        let available = width - self.gutter_px() * (count.saturating_sub(1)) as f64;
        available / ar_sum.max(f64::EPSILON)
    }

    /// Places tiles `start..end` at height `height`; returns the rounded row height.
    #[allow(clippy::too_many_arguments)]
    fn place_row(
        &self,
        out: &mut GalleryLayout,
        ratios: &[f64],
        start: usize,
        end: usize,
        y: f64,
        height: f64,
        container_width: f64,
        justified: bool,
    ) -> f64 {
        let row_height = height.round().max(1.0);
        let mut x = 0.0f64;

        for index in start..end {
            let exact_w = height.max(1.0) * ratios[index];
            let left = x.round();
            let tile_width = if justified && index + 1 == end {
                container_width - left
            } else {
                (x + exact_w).round() - left
            };
            out.tiles.push(Tile {
                asset_index: index,
                x: left,
                y,
                width: tile_width.max(1.0),
                height: row_height,
            });
            x += exact_w + self.gutter_px();
        }

        out.rows.push(RowSpan {
            start_index: start,
            end_index: end,
            y,
            height: row_height,
            justified,
        });
        row_height
    }
}
