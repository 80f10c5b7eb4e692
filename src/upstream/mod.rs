//! Read-only client side of the external media store.
//!
//! - `MediaApi` - the two operations the gateway needs
//! - `CloudinaryApi` - HTTP implementation against the Admin API

pub mod cloudinary;

use async_trait::async_trait;
use serde::Deserialize;

use crate::config::Credentials;
use crate::error::GatewayError;
use crate::models::AssetKind;

/// Prefix scoped listing of one resource kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListResources {
    pub kind: AssetKind,
    /// Folder prefix including the trailing slash, e.g. `Demo/`.
    pub prefix: String,
    pub max_results: u32,
    pub cursor: Option<String>,
}

/// Expression search, always sorted newest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub expression: String,
    pub max_results: u32,
    pub cursor: Option<String>,
}

/// A resource exactly as the upstream reports it. Every field is optional
/// because the listing and search endpoints return different shapes.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct UpstreamResource {
    pub public_id: Option<String>,
    pub resource_type: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub created_at: Option<String>,
    pub format: Option<String>,
    pub secure_url: Option<String>,
    pub url: Option<String>,
    pub folder: Option<String>,
    pub asset_folder: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct UpstreamPage {
    #[serde(default)]
    pub resources: Vec<UpstreamResource>,
    #[serde(default)]
    pub next_cursor: Option<String>,
}

#[async_trait]
pub trait MediaApi: Send + Sync {
    async fn list_resources(
        &self,
        credentials: &Credentials,
        request: &ListResources,
    ) -> Result<UpstreamPage, GatewayError>;

    async fn search(
        &self,
        credentials: &Credentials,
        query: &SearchQuery,
    ) -> Result<UpstreamPage, GatewayError>;
}
