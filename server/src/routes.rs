// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>

//! HTTP routes and the error-to-status mapping.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use odoh_common::{Error, OBLIVIOUS_DNS_MESSAGE};
use odoh_proxy::ProxyRelay;
use odoh_target::TargetHandler;
use serde::Deserialize;
use tower_http::trace::TraceLayer;
use tracing::{debug, warn};

pub const QUERY_ENDPOINT: &str = "/proxy";
pub const CONFIGS_ENDPOINT: &str = "/.well-known/odohconfigs";
pub const HEALTH_ENDPOINT: &str = "/health";

/// Shared application state.
pub struct AppState {
    pub server_name: String,
    pub target: TargetHandler,
    pub proxy: ProxyRelay,
    /// Encoded `ObliviousDoHConfigs`, fixed for the life of the process.
    configs: Bytes,
}

impl AppState {
    pub fn new(
        server_name: impl Into<String>,
        target: TargetHandler,
        proxy: ProxyRelay,
    ) -> odoh_common::Result<Self> {
        let configs = Bytes::from(target.keys().configs().encode()?);
        Ok(Self {
            server_name: server_name.into(),
            target,
            proxy,
            configs,
        })
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route(HEALTH_ENDPOINT, get(health))
        .route(CONFIGS_ENDPOINT, get(configs))
        .route(QUERY_ENDPOINT, post(query))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Query-string parameters of the query endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct QueryParams {
    #[serde(default)]
    pub targethost: Option<String>,
    #[serde(default)]
    pub targetpath: Option<String>,
}

/// Error returned by the query endpoint.
///
/// The body is only the status reason phrase, so a decryption failure and a
/// malformed message are indistinguishable to the caller.
#[derive(Debug)]
pub enum ApiError {
    Odoh(Error),
    UnsupportedMediaType,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::UnsupportedMediaType => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            Self::Odoh(e) if e.is_client_error() => StatusCode::BAD_REQUEST,
            Self::Odoh(e) if e.is_timeout() => StatusCode::GATEWAY_TIMEOUT,
            Self::Odoh(Error::RelayFailure { .. } | Error::ResolverFailure(_)) => {
                StatusCode::BAD_GATEWAY
            }
            Self::Odoh(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self::Odoh(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            Self::Odoh(e) if status.is_server_error() => {
                warn!(status = status.as_u16(), error = %e, "query failed")
            }
            Self::Odoh(e) => debug!(status = status.as_u16(), error = %e, "query rejected"),
            Self::UnsupportedMediaType => debug!(status = status.as_u16(), "wrong content type"),
        }
        (status, status.canonical_reason().unwrap_or_default()).into_response()
    }
}

async fn index(State(state): State<Arc<AppState>>) -> String {
    format!(
        "ODoH service\n\
         ------------\n\
         Server: {}\n\
         Proxy endpoint: POST {QUERY_ENDPOINT}?targethost=HOST&targetpath=PATH\n\
         Target endpoint: POST {QUERY_ENDPOINT}\n\
         Configs: GET {CONFIGS_ENDPOINT}\n",
        state.server_name
    )
}

pub async fn health() -> &'static str {
    "ok"
}

async fn configs(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "application/octet-stream")],
        state.configs.clone(),
    )
}

/// Proxy when `targethost` is given, target otherwise.
async fn query(
    State(state): State<Arc<AppState>>,
    Query(params): Query<QueryParams>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ApiError> {
    if let Some(content_type) = headers.get(header::CONTENT_TYPE) {
        if !is_oblivious_media_type(content_type) {
            return Err(ApiError::UnsupportedMediaType);
        }
    }

    let target_host = params.targethost.as_deref().filter(|h| !h.is_empty());
    let target_path = params.targetpath.as_deref().filter(|p| !p.is_empty());

    let reply = match (target_host, target_path) {
        (Some(host), path) => state.proxy.relay(host, path, body).await?,
        (None, Some(_)) => return Err(Error::BadRequest("targetpath without targethost").into()),
        (None, None) => Bytes::from(state.target.handle(&body).await?),
    };

    Ok(([(header::CONTENT_TYPE, OBLIVIOUS_DNS_MESSAGE)], reply).into_response())
}

/// Media type match ignoring parameters and case.
fn is_oblivious_media_type(value: &HeaderValue) -> bool {
    value
        .to_str()
        .ok()
        .and_then(|v| v.split(';').next())
        .is_some_and(|essence| essence.trim().eq_ignore_ascii_case(OBLIVIOUS_DNS_MESSAGE))
}
