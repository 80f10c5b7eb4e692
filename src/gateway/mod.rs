//! Asset List Gateway.
//!
//! Translates a page request into media store calls and normalizes whatever
//! comes back into flat [`AssetRecord`]s plus a continuation cursor.
//!
//! - One kind: prefix listing of `<folder>/`, which always includes nested
//!   folders. When subfolders are excluded the results are post-filtered to
//!   records whose folder equals the requested one, since the store has no
//!   native way to exclude them.
//! - Several kinds: one expression search sorted newest first.
//!
//! The gateway never retries. Upstream status and message are passed through
//! so the operator sees the store's own diagnostic.

pub mod query;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::config::{CredentialProvider, Credentials};
use crate::error::GatewayError;
use crate::models::{AssetKind, AssetRecord, Page};
use crate::upstream::{ListResources, MediaApi, SearchQuery, UpstreamResource};

pub use query::{AssetQuery, DEFAULT_PAGE_SIZE};

#[derive(Clone)]
pub struct AssetGateway {
    api: Arc<dyn MediaApi>,
    credentials: Arc<dyn CredentialProvider>,
}

impl AssetGateway {
    pub fn new(api: Arc<dyn MediaApi>, credentials: Arc<dyn CredentialProvider>) -> Self {
        Self { api, credentials }
    }

    /// Fails with a configuration error when credentials are unavailable.
    pub fn check_configuration(&self) -> Result<(), GatewayError> {
        self.credentials.credentials().map(|_| ())
    }

    /// Lists one page for `query`.
    ///
    /// Configuration is checked before the folder, and both before any
    /// upstream call is made.
    pub async fn list(&self, query: &AssetQuery) -> Result<Page, GatewayError> {
        let credentials = self.credentials.credentials()?;
        if query.folder.is_empty() {
            return Err(GatewayError::BadRequest("Missing ?folder".into()));
        }

        let result = if let [kind] = query.kinds.as_slice() {
            self.list_single(&credentials, query, *kind).await
        } else {
            self.search_many(&credentials, query).await
        };

        match &result {
            Ok(page) => info!(
                folder = %query.folder,
                kinds = %AssetKind::join(&query.kinds),
                page_size = query.page_size,
                items = page.items.len(),
                has_more = page.has_more,
                "Listed assets"
            ),
            Err(err) => warn!(folder = %query.folder, error = %err, "Asset listing failed"),
        }
        result
    }

    async fn list_single(
        &self,
        credentials: &Credentials,
        query: &AssetQuery,
        kind: AssetKind,
    ) -> Result<Page, GatewayError> {
        let request = ListResources {
            kind,
            prefix: format!("{}/", query.folder),
            max_results: query.page_size,
            cursor: query.cursor.clone(),
        };
        let upstream = self.api.list_resources(credentials, &request).await?;

        let items = self.collect(query, upstream.resources, Some(kind));
        Ok(Page::new(items, upstream.next_cursor))
    }

    async fn search_many(
        &self,
        credentials: &Credentials,
        query: &AssetQuery,
    ) -> Result<Page, GatewayError> {
        let search = SearchQuery {
            expression: search_expression(&query.folder, query.include_subfolders, &query.kinds),
            max_results: query.page_size,
            cursor: query.cursor.clone(),
        };
        let upstream = self.api.search(credentials, &search).await?;

        let mut items = self.collect(query, upstream.resources, None);
        // Stable, so records with equal timestamps keep upstream order.
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(Page::new(items, upstream.next_cursor))
    }

    /// Normalizes, applies the subfolder filter and enforces the page size.
    fn collect(
        &self,
        query: &AssetQuery,
        resources: Vec<UpstreamResource>,
        requested: Option<AssetKind>,
    ) -> Vec<AssetRecord> {
        let mut items: Vec<AssetRecord> = resources
            .into_iter()
            .filter_map(|r| normalize(r, requested))
            .filter(|rec| query.include_subfolders || rec.folder_path == query.folder)
            .collect();
        if items.len() > query.page_size as usize {
            warn!(
                returned = items.len(),
                page_size = query.page_size,
                "Media store returned more than requested, truncating"
            );
            items.truncate(query.page_size as usize);
        }
        items
    }
}

/// Converts one upstream record, or drops it when it has no identity.
pub fn normalize(resource: UpstreamResource, requested: Option<AssetKind>) -> Option<AssetRecord> {
    let Some(identity) = resource.public_id.filter(|id| !id.is_empty()) else {
        debug!("Skipping upstream record without public_id");
        return None;
    };

    let kind = resource
        .resource_type
        .as_deref()
        .and_then(|t| t.parse().ok())
        .or(requested)
        .unwrap_or(AssetKind::Image);
    let created_at = resource
        .created_at
        .as_deref()
        .and_then(|ts| DateTime::parse_from_rfc3339(ts).ok())
        .map(|ts| ts.with_timezone(&Utc))
        .unwrap_or_default();
    let folder_path = resource
        .folder
        .or(resource.asset_folder)
        .unwrap_or_else(|| {
            identity
                .rsplit_once('/')
                .map(|(folder, _)| folder.to_string())
                .unwrap_or_default()
        });
    let source_url = resource.secure_url.or(resource.url).unwrap_or_default();

    let mut record = AssetRecord::new(identity, kind, resource.width, resource.height)
        .with_created_at(created_at)
        .with_source_url(source_url)
        .with_folder(folder_path.trim_end_matches('/'));
    record.format = resource.format;
    Some(record)
}

/// Builds the search expression covering `kinds` inside `folder`.
pub fn search_expression(folder: &str, include_subfolders: bool, kinds: &[AssetKind]) -> String {
    let folder = escape_expression(folder);
    let scope = if include_subfolders {
        format!("(folder:\"{folder}\" OR folder:\"{folder}/*\")")
    } else {
        format!("folder:\"{folder}\"")
    };
    let kinds = kinds
        .iter()
        .map(|k| format!("resource_type:{k}"))
        .collect::<Vec<_>>()
        .join(" OR ");
    format!("{scope} AND ({kinds})")
}

fn escape_expression(raw: &str) -> String {
    raw.replace('\\', "\\\\").replace('"', "\\\"")
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::config::ENV_CLOUD_NAME;
    use crate::test_helpers::{gateway_with, resource, FakeMediaApi};

    fn demo_resources() -> Vec<UpstreamResource> {
        vec![
            resource("Demo/a", "image", "2024-03-01T10:00:00Z"),
            resource("Demo/b", "image", "2024-03-02T10:00:00Z"),
            resource("Demo/sub/c", "image", "2024-03-03T10:00:00Z"),
            resource("Demo/clip", "video", "2024-03-04T10:00:00Z"),
            resource("Other/d", "image", "2024-03-05T10:00:00Z"),
        ]
    }

    #[tokio::test]
    async fn test_empty_folder_is_bad_request_without_upstream_call() {
        let api = Arc::new(FakeMediaApi::with_resources(demo_resources()));
        let gateway = gateway_with(api.clone());
        let err = gateway.list(&AssetQuery::new("  ")).await.unwrap_err();
        assert!(matches!(err, GatewayError::BadRequest(_)));
        assert_eq!(err.status().as_u16(), 400);
        assert_eq!(api.calls(), 0);
    }

    #[tokio::test]
    async fn test_missing_credentials_is_configuration_error() {
        let api = Arc::new(FakeMediaApi::with_resources(demo_resources()));
        let mut env = HashMap::new();
        env.insert(ENV_CLOUD_NAME.to_string(), "studio".to_string());
        let gateway = AssetGateway::new(api.clone(), Arc::new(env));

        let err = gateway.list(&AssetQuery::new("Demo")).await.unwrap_err();
        assert!(matches!(err, GatewayError::Configuration(_)));
        assert_eq!(err.status().as_u16(), 400);
        assert!(!err.to_string().contains("studio"));
        assert_eq!(api.calls(), 0);
    }

    #[tokio::test]
    async fn test_single_kind_uses_prefix_listing() {
        let api = Arc::new(FakeMediaApi::with_resources(demo_resources()));
        let gateway = gateway_with(api.clone());
        let page = gateway.list(&AssetQuery::new("Demo")).await.unwrap();

        let ids: Vec<&str> = page.items.iter().map(|r| r.identity.as_str()).collect();
        assert_eq!(ids, vec!["Demo/a", "Demo/b", "Demo/sub/c"]);
        assert_eq!(api.list_calls.load(std::sync::atomic::Ordering::SeqCst), 1);
        assert_eq!(api.calls(), 1);
        let last = api.last_list.lock().clone().unwrap();
        assert_eq!(last.prefix, "Demo/");
        assert_eq!(last.kind, AssetKind::Image);
        assert!(page.next_cursor.is_none());
        assert!(!page.has_more);
    }

    #[tokio::test]
    async fn test_exclude_subfolders_post_filters() {
        let api = Arc::new(FakeMediaApi::with_resources(vec![
            resource("A/one", "image", "2024-01-01T00:00:00Z"),
            resource("A/sub/two", "image", "2024-01-02T00:00:00Z"),
            resource("A/three", "image", "2024-01-03T00:00:00Z"),
        ]));
        let gateway = gateway_with(api);
        let page = gateway
            .list(&AssetQuery::new("A").with_subfolders(false))
            .await
            .unwrap();
        assert_eq!(page.items.len(), 2);
        assert!(page.items.iter().all(|r| r.folder_path == "A"));
    }

    #[tokio::test]
    async fn test_multiple_kinds_use_one_search_sorted_newest_first() {
        let api = Arc::new(FakeMediaApi::with_resources(vec![
            resource("Demo/a", "image", "2024-03-01T10:00:00Z"),
            resource("Demo/clip", "video", "2024-03-04T10:00:00Z"),
            resource("Demo/b", "image", "2024-03-02T10:00:00Z"),
        ]));
        let gateway = gateway_with(api.clone());
        let page = gateway
            .list(&AssetQuery::new("Demo").with_kinds(vec![AssetKind::Image, AssetKind::Video]))
            .await
            .unwrap();

        assert_eq!(api.calls(), 1);
        assert_eq!(api.search_calls.load(std::sync::atomic::Ordering::SeqCst), 1);
        let ids: Vec<&str> = page.items.iter().map(|r| r.identity.as_str()).collect();
        assert_eq!(ids, vec!["Demo/clip", "Demo/b", "Demo/a"]);
        assert!(page.items[0].is_video());
        let expr = api.last_search.lock().clone().unwrap().expression;
        assert!(expr.contains("resource_type:image OR resource_type:video"));
    }

    #[tokio::test]
    async fn test_never_exceeds_page_size_and_follows_cursor() {
        let resources: Vec<_> = (0..7)
            .map(|i| resource(&format!("Demo/{i}"), "image", "2024-01-01T00:00:00Z"))
            .collect();
        let api = Arc::new(FakeMediaApi::with_resources(resources));
        let gateway = gateway_with(api);

        let mut query = AssetQuery::new("Demo").with_page_size(3);
        let mut seen = 0;
        loop {
            let page = gateway.list(&query).await.unwrap();
            assert!(page.items.len() <= 3);
            seen += page.items.len();
            match page.next_cursor {
                Some(cursor) => query = query.with_cursor(Some(cursor)),
                None => break,
            }
        }
        assert_eq!(seen, 7);
    }

    #[tokio::test]
    async fn test_oversized_upstream_page_is_truncated() {
        let resources: Vec<_> = (0..7)
            .map(|i| resource(&format!("Demo/{i}"), "image", "2024-01-01T00:00:00Z"))
            .collect();
        let api = Arc::new(FakeMediaApi::ignoring_limit(resources));
        let gateway = gateway_with(api.clone());

        let page = gateway
            .list(&AssetQuery::new("Demo").with_page_size(3))
            .await
            .unwrap();
        assert_eq!(api.last_list.lock().clone().unwrap().max_results, 3);
        let ids: Vec<&str> = page.items.iter().map(|r| r.identity.as_str()).collect();
        assert_eq!(ids, vec!["Demo/0", "Demo/1", "Demo/2"]);
    }

    #[tokio::test]
    async fn test_multiple_kinds_without_subfolders() {
        let api = Arc::new(FakeMediaApi::ignoring_limit(vec![
            resource("A/one", "image", "2024-01-01T00:00:00Z"),
            resource("A/sub/two", "image", "2024-01-02T00:00:00Z"),
            resource("A/clip", "video", "2024-01-03T00:00:00Z"),
            resource("A/sub/reel", "video", "2024-01-04T00:00:00Z"),
        ]));
        let gateway = gateway_with(api.clone());

        let query = AssetQuery::new("A").with_kinds(vec![AssetKind::Image, AssetKind::Video]);
        let page = gateway
            .list(&query.clone().with_subfolders(false))
            .await
            .unwrap();
        let ids: Vec<&str> = page.items.iter().map(|r| r.identity.as_str()).collect();
        assert_eq!(ids, vec!["A/clip", "A/one"]);
        assert!(page.items.iter().all(|r| r.folder_path == "A"));
        assert_eq!(api.search_calls.load(std::sync::atomic::Ordering::SeqCst), 1);

        let page = gateway.list(&query).await.unwrap();
        assert_eq!(page.items.len(), 4);
        assert_eq!(page.items[0].identity, "A/sub/reel");
    }

    #[tokio::test]
    async fn test_upstream_error_is_propagated() {
        let api = Arc::new(FakeMediaApi::failing(GatewayError::upstream(
            401,
            "Invalid api_key",
        )));
        let gateway = gateway_with(api);
        let err = gateway.list(&AssetQuery::new("Demo")).await.unwrap_err();
        assert_eq!(err.status().as_u16(), 401);
        assert_eq!(err.to_string(), "Invalid api_key");
    }

    #[test]
    fn test_normalize_fills_gaps() {
        let rec = normalize(
            UpstreamResource {
                public_id: Some("Reel/Shots/x".into()),
                url: Some("http://media.test/x".into()),
                ..UpstreamResource::default()
            },
            Some(AssetKind::Video),
        )
        .unwrap();
        assert_eq!(rec.kind, AssetKind::Video);
        assert_eq!((rec.width, rec.height), (1600, 900));
        assert_eq!(rec.folder_path, "Reel/Shots");
        assert_eq!(rec.source_url, "http://media.test/x");
        assert_eq!(rec.created_at, DateTime::<Utc>::default());
    }

    #[test]
    fn test_normalize_prefers_secure_url_and_asset_folder() {
        let rec = normalize(
            UpstreamResource {
                public_id: Some("x".into()),
                secure_url: Some("https://media.test/x".into()),
                url: Some("http://media.test/x".into()),
                asset_folder: Some("Portfolio".into()),
                ..UpstreamResource::default()
            },
            None,
        )
        .unwrap();
        assert_eq!(rec.source_url, "https://media.test/x");
        assert_eq!(rec.folder_path, "Portfolio");
        assert_eq!(rec.kind, AssetKind::Image);
    }

    #[test]
    fn test_normalize_drops_records_without_identity() {
        assert!(normalize(UpstreamResource::default(), None).is_none());
    }

    #[test]
    fn test_search_expression_escapes_and_scopes() {
        let expr = search_expression("My \"Best\"", false, &[AssetKind::Image, AssetKind::Video]);
        assert_eq!(
            expr,
            "folder:\"My \\\"Best\\\"\" AND (resource_type:image OR resource_type:video)"
        );
        let expr = search_expression("BTS", true, &[AssetKind::Video]);
        assert_eq!(
            expr,
            "(folder:\"BTS\" OR folder:\"BTS/*\") AND (resource_type:video)"
        );
    }
}
