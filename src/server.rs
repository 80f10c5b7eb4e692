//! HTTP surface of the gateway.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use clap::Args;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::EnvCredentials;
use crate::error::GatewayError;
use crate::gateway::{AssetGateway, AssetQuery};
use crate::models::Page;
use crate::upstream::cloudinary::{CloudinaryApi, DEFAULT_API_BASE};

#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    /// Address to listen on
    #[arg(long, env = "CLDGALLERY_BIND", default_value = "127.0.0.1:8787")]
    pub bind: SocketAddr,
    /// Base URL of the media store Admin API
    #[arg(long, env = "CLDGALLERY_API_BASE", default_value = DEFAULT_API_BASE)]
    pub api_base: String,
    /// Timeout for each upstream request, in seconds
    #[arg(long, env = "CLDGALLERY_UPSTREAM_TIMEOUT", default_value_t = 20)]
    pub upstream_timeout_secs: u64,
}

#[derive(Clone)]
struct AppState {
    gateway: Arc<AssetGateway>,
}

/// Builds the router serving `GET /assets` and `GET /healthz`.
pub fn router(gateway: AssetGateway) -> Router {
    let state = AppState {
        gateway: Arc::new(gateway),
    };
    Router::new()
        .route("/healthz", get(healthz))
        .route("/assets", get(list_assets))
        .with_state(state)
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
}

pub async fn run(args: ServeArgs) -> Result<()> {
    let api = CloudinaryApi::new(
        args.api_base.clone(),
        Duration::from_secs(args.upstream_timeout_secs),
    )
    .context("Failed to build media store client")?;
    let gateway = AssetGateway::new(Arc::new(api), Arc::new(EnvCredentials));

    if let Err(err) = gateway.check_configuration() {
        // Requests will keep answering 400 until the environment is fixed.
        tracing::warn!(error = %err, "Media store credentials are not configured");
    }

    let listener = tokio::net::TcpListener::bind(args.bind)
        .await
        .with_context(|| format!("Failed to bind {}", args.bind))?;
    info!(
        "listening on http://{} (api_base={})",
        args.bind, args.api_base
    );
    axum::serve(listener, router(gateway))
        .await
        .context("Server error")?;
    Ok(())
}

async fn healthz() -> impl IntoResponse {
    "ok"
}

async fn list_assets(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Page>, GatewayError> {
    state.gateway.check_configuration()?;
    let query = AssetQuery::from_params(&params)?;
    let page = state.gateway.list(&query).await?;
    Ok(Json(page))
}
