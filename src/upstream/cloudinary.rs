use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{ListResources, MediaApi, SearchQuery, UpstreamPage};
use crate::config::Credentials;
use crate::error::GatewayError;

/// Public Admin API endpoint.
pub const DEFAULT_API_BASE: &str = "https://api.cloudinary.com";

/// Status used when the upstream gives us nothing better.
const FALLBACK_STATUS: u16 = 500;

#[derive(Debug, Serialize)]
struct SearchBody<'a> {
    expression: &'a str,
    sort_by: [SortField; 1],
    max_results: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    next_cursor: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct SortField {
    created_at: &'static str,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

/// Admin API client. Stateless apart from the connection pool; credentials
/// are passed per call.
#[derive(Debug, Clone)]
pub struct CloudinaryApi {
    client: reqwest::Client,
    base_url: String,
}

impl CloudinaryApi {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("cldgallery/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self, credentials: &Credentials, path: &str) -> String {
        format!(
            "{}/v1_1/{}/resources/{}",
            self.base_url, credentials.cloud_name, path
        )
    }

    async fn decode(response: reqwest::Response) -> Result<UpstreamPage, GatewayError> {
        let status = response.status();
        let body = response.bytes().await.map_err(transport_error)?;

        if status.is_success() {
            return serde_json::from_slice(&body).map_err(|e| {
                GatewayError::upstream(
                    FALLBACK_STATUS,
                    format!("Malformed media store response: {e}"),
                )
            });
        }

        let message = serde_json::from_slice::<ErrorEnvelope>(&body)
            .map(|env| env.error.message)
            .unwrap_or_default();
        warn!(status = status.as_u16(), %message, "Media store request failed");
        Err(GatewayError::upstream(status.as_u16(), message))
    }
}

fn transport_error(err: reqwest::Error) -> GatewayError {
    let status = err.status().map(|s| s.as_u16()).unwrap_or(FALLBACK_STATUS);
    GatewayError::upstream(status, err.without_url().to_string())
}

#[async_trait]
impl MediaApi for CloudinaryApi {
    async fn list_resources(
        &self,
        credentials: &Credentials,
        request: &ListResources,
    ) -> Result<UpstreamPage, GatewayError> {
        let url = self.endpoint(credentials, &format!("{}/upload", request.kind));
        let mut query = vec![
            ("prefix", request.prefix.clone()),
            ("max_results", request.max_results.to_string()),
        ];
        if let Some(cursor) = &request.cursor {
            query.push(("next_cursor", cursor.clone()));
        }
        debug!(kind = %request.kind, prefix = %request.prefix, "Listing resources");

        let response = self
            .client
            .get(url)
            .basic_auth(&credentials.api_key, Some(&credentials.api_secret))
            .query(&query)
            .send()
            .await
            .map_err(transport_error)?;
        Self::decode(response).await
    }

    async fn search(
        &self,
        credentials: &Credentials,
        query: &SearchQuery,
    ) -> Result<UpstreamPage, GatewayError> {
        let url = self.endpoint(credentials, "search");
        let body = SearchBody {
            expression: &query.expression,
            sort_by: [SortField { created_at: "desc" }],
            max_results: query.max_results,
            next_cursor: query.cursor.as_deref(),
        };
        debug!(expression = %query.expression, "Searching resources");

        let response = self
            .client
            .post(url)
            .basic_auth(&credentials.api_key, Some(&credentials.api_secret))
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;
        Self::decode(response).await
    }
}
