use std::time::Duration;

use async_trait::async_trait;

use crate::error::{ErrorBody, PagerError};
use crate::gateway::{AssetGateway, AssetQuery};
use crate::models::Page;

/// Fetches one gateway page. `query.cursor` selects the page.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch_page(&self, query: &AssetQuery) -> Result<Page, PagerError>;
}

/// Calls a gateway's `GET /assets` endpoint over HTTP.
#[derive(Debug, Clone)]
pub struct HttpPageFetcher {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpPageFetcher {
    /// `base_url` is the gateway root, e.g. `http://127.0.0.1:8787`.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: format!("{}/assets", base_url.trim_end_matches('/')),
        })
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn fetch_page(&self, query: &AssetQuery) -> Result<Page, PagerError> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&query.to_params())
            .send()
            .await
            .map_err(|e| PagerError::transport(e.without_url().to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<ErrorBody>()
                .await
                .map(|body| body.error)
                .unwrap_or_else(|_| {
                    status
                        .canonical_reason()
                        .unwrap_or("Unexpected response")
                        .to_string()
                });
            return Err(PagerError::status(status.as_u16(), message));
        }

        response
            .json::<Page>()
            .await
            .map_err(|e| PagerError::transport(e.without_url().to_string()))
    }
}

/// In-process fetching, for embedding the gateway without an HTTP hop.
#[async_trait]
impl PageFetcher for AssetGateway {
    async fn fetch_page(&self, query: &AssetQuery) -> Result<Page, PagerError> {
        self.list(query)
            .await
            .map_err(|e| PagerError::status(e.status().as_u16(), e.to_string()))
    }
}
