//! In-memory fakes shared by unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::config::Credentials;
use crate::error::{GatewayError, PagerError};
use crate::gateway::{AssetGateway, AssetQuery};
use crate::models::{AssetKind, AssetRecord, Page};
use crate::pager::PageFetcher;
use crate::upstream::{ListResources, MediaApi, SearchQuery, UpstreamPage, UpstreamResource};

pub fn test_credentials() -> Credentials {
    Credentials {
        cloud_name: "studio".into(),
        api_key: "key".into(),
        api_secret: "secret".into(),
    }
}

/// Builds an upstream record the way the listing endpoint reports it.
pub fn resource(public_id: &str, kind: &str, created_at: &str) -> UpstreamResource {
    let folder = public_id
        .rsplit_once('/')
        .map(|(folder, _)| folder.to_string())
        .unwrap_or_default();
    UpstreamResource {
        public_id: Some(public_id.to_string()),
        resource_type: Some(kind.to_string()),
        width: Some(1600),
        height: Some(900),
        created_at: Some(created_at.to_string()),
        format: Some(if kind == "video" { "mp4" } else { "jpg" }.to_string()),
        secure_url: Some(format!("https://media.test/{kind}/upload/{public_id}")),
        url: None,
        folder: Some(folder),
        asset_folder: None,
    }
}

/// Media store backed by a fixed resource list.
///
/// Cursors are stringified offsets. Listing filters by prefix and kind;
/// search filters by the `folder:` scopes and `resource_type:` terms present
/// in the expression and returns newest first.
#[derive(Default)]
pub struct FakeMediaApi {
    pub resources: Vec<UpstreamResource>,
    pub fail_with: Option<GatewayError>,
    /// Return everything from the cursor on, ignoring `max_results`.
    pub ignore_limit: bool,
    pub list_calls: AtomicUsize,
    pub search_calls: AtomicUsize,
    pub last_list: Mutex<Option<ListResources>>,
    pub last_search: Mutex<Option<SearchQuery>>,
}

impl FakeMediaApi {
    pub fn with_resources(resources: Vec<UpstreamResource>) -> Self {
        Self {
            resources,
            ..Self::default()
        }
    }

    pub fn failing(err: GatewayError) -> Self {
        Self {
            fail_with: Some(err),
            ..Self::default()
        }
    }

    pub fn ignoring_limit(resources: Vec<UpstreamResource>) -> Self {
        Self {
            resources,
            ignore_limit: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst) + self.search_calls.load(Ordering::SeqCst)
    }

    fn paginate(
        &self,
        matching: Vec<UpstreamResource>,
        max_results: u32,
        cursor: Option<&str>,
    ) -> UpstreamPage {
        let start = cursor.and_then(|c| c.parse::<usize>().ok()).unwrap_or(0);
        let limit = if self.ignore_limit {
            matching.len()
        } else {
            max_results as usize
        };
        let end = (start + limit).min(matching.len());
        UpstreamPage {
            resources: matching.get(start..end).map(<[_]>::to_vec).unwrap_or_default(),
            next_cursor: (end < matching.len()).then(|| end.to_string()),
        }
    }
}

#[async_trait]
impl MediaApi for FakeMediaApi {
    async fn list_resources(
        &self,
        _credentials: &Credentials,
        request: &ListResources,
    ) -> Result<UpstreamPage, GatewayError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_list.lock() = Some(request.clone());
        if let Some(err) = &self.fail_with {
            return Err(err.clone());
        }
        let matching = self
            .resources
            .iter()
            .filter(|r| {
                r.public_id
                    .as_deref()
                    .is_some_and(|id| id.starts_with(&request.prefix))
                    && r.resource_type.as_deref() == Some(request.kind.as_str())
            })
            .cloned()
            .collect();
        Ok(self.paginate(
            matching,
            request.max_results,
            request.cursor.as_deref(),
        ))
    }

    async fn search(
        &self,
        _credentials: &Credentials,
        query: &SearchQuery,
    ) -> Result<UpstreamPage, GatewayError> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_search.lock() = Some(query.clone());
        if let Some(err) = &self.fail_with {
            return Err(err.clone());
        }
        let mut matching: Vec<UpstreamResource> = self
            .resources
            .iter()
            .filter(|r| {
                let kind = r.resource_type.as_deref().unwrap_or_default();
                let folder = r.folder.as_deref().unwrap_or_default();
                query.expression.contains(&format!("resource_type:{kind}"))
                    && in_search_scope(&query.expression, folder)
            })
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(self.paginate(
            matching,
            query.max_results,
            query.cursor.as_deref(),
        ))
    }
}

/// True when `expression` scopes `folder` directly or through an ancestor's `/*`.
fn in_search_scope(expression: &str, folder: &str) -> bool {
    if expression.contains(&format!("folder:\"{folder}\"")) {
        return true;
    }
    folder
        .match_indices('/')
        .map(|(i, _)| &folder[..i])
        .any(|ancestor| expression.contains(&format!("folder:\"{ancestor}/*\"")))
}

/// Gateway over `api` with valid static credentials.
pub fn gateway_with(api: Arc<FakeMediaApi>) -> AssetGateway {
    AssetGateway::new(api, Arc::new(test_credentials()))
}

/// A successful page of small square-ish records.
pub fn scripted_page(ids: &[&str], next: Option<&str>) -> Result<Page, PagerError> {
    Ok(Page::new(
        ids.iter()
            .map(|id| AssetRecord::new(*id, AssetKind::Image, Some(4), Some(3)))
            .collect(),
        next.map(String::from),
    ))
}

/// Serves canned pages keyed by cursor.
pub struct ScriptedFetcher {
    pages: HashMap<Option<String>, Result<Page, PagerError>>,
    pub calls: AtomicUsize,
}

impl ScriptedFetcher {
    pub fn new(pages: Vec<(Option<&str>, Result<Page, PagerError>)>) -> Self {
        Self {
            pages: pages
                .into_iter()
                .map(|(cursor, page)| (cursor.map(String::from), page))
                .collect(),
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl PageFetcher for ScriptedFetcher {
    async fn fetch_page(&self, query: &AssetQuery) -> Result<Page, PagerError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.pages
            .get(&query.cursor)
            .cloned()
            .unwrap_or_else(|| Err(PagerError::transport("no such page")))
    }
}
