//! Command implementations behind `main`.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Deserialize;
use tracing::info;

use crate::gallery::{Delivery, GalleryModel};
use crate::gateway::{AssetQuery, DEFAULT_PAGE_SIZE};
use crate::layout::{GalleryLayout, HasDimensions, JustifiedLayout};
use crate::models::{dimensions_or_fallback, AssetKind};
use crate::pager::{AssetPager, HttpPageFetcher, LoadOutcome};
use crate::server::ServeArgs;

#[derive(Parser)]
#[command(name = "cldgallery")]
#[command(about = "Media store gallery gateway and justified layout tools")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the asset list gateway
    Serve(ServeArgs),
    /// Page through a folder via a running gateway and print the layout
    Browse(BrowseArgs),
    /// Lay out assets from a JSON file
    Layout(LayoutArgs),
}

/// Justified layout parameters shared by commands.
#[derive(Args, Debug, Clone)]
pub struct LayoutParams {
    /// Container width in pixels
    #[arg(long, default_value_t = 1200.0)]
    pub width: f64,
    /// Target row height in pixels
    #[arg(long, default_value_t = 320.0)]
    pub row_height: f64,
    /// Gap between tiles in pixels
    #[arg(long, default_value_t = 16.0)]
    pub gutter: f64,
    /// Row closing tolerance as a multiple of the target height
    #[arg(long, default_value_t = 1.0)]
    pub tolerance: f64,
}

impl LayoutParams {
    fn justified(&self) -> JustifiedLayout {
        JustifiedLayout::new(self.row_height, self.gutter).with_tolerance(self.tolerance)
    }
}

#[derive(Args, Debug, Clone)]
pub struct BrowseArgs {
    /// Gateway root URL
    #[arg(long, env = "CLDGALLERY_GATEWAY", default_value = "http://127.0.0.1:8787")]
    pub gateway: String,
    /// Folder to browse
    #[arg(long)]
    pub folder: String,
    /// Comma separated kinds: image, video or all
    #[arg(long, default_value = "image")]
    pub kinds: String,
    #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
    pub page_size: u32,
    /// Only assets directly inside the folder
    #[arg(long)]
    pub no_subfolders: bool,
    /// Maximum number of pages to load; the first is always fetched
    #[arg(long, default_value_t = 3)]
    pub pages: usize,
    /// Open the lightbox at this index and print its frame URL
    #[arg(long)]
    pub lightbox: Option<usize>,
    /// Viewport width used for lightbox frames
    #[arg(long, default_value_t = 1920)]
    pub viewport_width: u32,
    /// Cloud name for transformed tile URLs
    #[arg(long, env = "CLOUDINARY_CLOUD_NAME")]
    pub cloud_name: Option<String>,
    /// Print the full view as JSON instead of a summary
    #[arg(long)]
    pub json: bool,
    #[command(flatten)]
    pub layout: LayoutParams,
}

#[derive(Args, Debug, Clone)]
pub struct LayoutArgs {
    /// JSON array of objects with `width` and `height`
    pub input: PathBuf,
    #[command(flatten)]
    pub layout: LayoutParams,
}

pub async fn browse(args: BrowseArgs) -> Result<()> {
    let kinds = AssetKind::parse_list(&args.kinds).map_err(anyhow::Error::msg)?;
    let query = AssetQuery::new(args.folder.clone())
        .with_kinds(kinds)
        .with_page_size(args.page_size)
        .with_subfolders(!args.no_subfolders);
    let fetcher = HttpPageFetcher::new(&args.gateway, Duration::from_secs(30))
        .context("Failed to build gateway client")?;

    let mut gallery = GalleryModel::open(
        AssetPager::new(Arc::new(fetcher), query),
        args.layout.justified(),
    )
    .await;
    if let Some(cloud) = args.cloud_name.filter(|c| !c.is_empty()) {
        gallery = gallery.with_delivery(Delivery::new(cloud)?);
    }
    gallery.resize(args.layout.width);

    for page in 2..=args.pages {
        match gallery.load_more().await {
            LoadOutcome::Skipped => break,
            outcome => info!(page, ?outcome, "Page fetched"),
        }
    }

    if let Some(index) = args.lightbox {
        gallery.open_lightbox(index);
        while let Some(current) = gallery.lightbox().current() {
            if current >= index {
                break;
            }
            // Stepping past the loaded range pulls in the next page.
            let loaded = gallery.pager().len();
            let stepped = gallery.lightbox_next().await;
            if stepped == Some(current) && gallery.pager().len() == loaded {
                break;
            }
        }
    }
    let frame = gallery.lightbox_src(args.viewport_width);

    let view = gallery.view();
    gallery.close();
    if args.json {
        println!("{}", serde_json::to_string_pretty(&view)?);
        return Ok(());
    }

    let layout = gallery.layout();
    println!(
        "{} assets in {} rows, {}x{} px",
        view.tiles.len(),
        layout.rows.len(),
        gallery.container_width(),
        view.container_height
    );
    for row in &layout.rows {
        println!(
            "  row y={:<6} h={:<4} items {}..{}{}",
            row.y,
            row.height,
            row.start_index,
            row.end_index,
            if row.justified { "" } else { " (unjustified)" }
        );
    }
    if let Some(frame) = frame {
        println!("lightbox: {frame}");
    }
    if view.has_more {
        println!("more available");
    }
    if let Some(err) = view.error {
        println!("error: {err}");
    }
    Ok(())
}

#[derive(Debug, Deserialize)]
struct InputDimensions {
    width: Option<u32>,
    height: Option<u32>,
}

impl HasDimensions for InputDimensions {
    fn dimensions(&self) -> (u32, u32) {
        dimensions_or_fallback(self.width, self.height)
    }
}

/// Reads a JSON dimension list and lays it out.
pub fn layout_file(path: &Path, params: &LayoutParams) -> Result<GalleryLayout> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let items: Vec<InputDimensions> = serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    Ok(params.justified().compute(&items, params.width))
}

pub fn layout(args: LayoutArgs) -> Result<()> {
    let out = layout_file(&args.input, &args.layout)?;
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}
