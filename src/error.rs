//! Error taxonomy shared by the gateway and the pager.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Fixed message used when the upstream store fails without a readable body.
pub const UPSTREAM_FALLBACK_MESSAGE: &str = "Media store list failed";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GatewayError {
    /// Credentials or environment are missing. Messages name variables only.
    #[error("{0}")]
    Configuration(String),
    #[error("{0}")]
    BadRequest(String),
    #[error("{message}")]
    Upstream { status: u16, message: String },
}

impl GatewayError {
    pub fn upstream(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        Self::Upstream {
            status,
            message: if message.trim().is_empty() {
                UPSTREAM_FALLBACK_MESSAGE.to_string()
            } else {
                message
            },
        }
    }

    /// HTTP status reported to the caller.
    ///
    /// Upstream statuses are propagated when they are real error codes,
    /// anything else collapses to 500.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Configuration(_) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Upstream { status, .. } => StatusCode::from_u16(*status)
                .ok()
                .filter(|s| s.is_client_error() || s.is_server_error())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        }
    }
}

/// Wire shape of every non-2xx gateway reply.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status();
        (
            status,
            Json(ErrorBody {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}

/// Failure of one pager fetch. Its `Display` is what views show inline.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PagerError {
    #[error("{}", describe_fetch(.status, .message))]
    Fetch { status: Option<u16>, message: String },
}

impl PagerError {
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Fetch {
            status: None,
            message: message.into(),
        }
    }

    pub fn status(status: u16, message: impl Into<String>) -> Self {
        Self::Fetch {
            status: Some(status),
            message: message.into(),
        }
    }
}

fn describe_fetch(status: &Option<u16>, message: &str) -> String {
    match status {
        Some(code) => format!("Asset list failed ({code}): {message}"),
        None => format!("Asset list failed: {message}"),
    }
}
