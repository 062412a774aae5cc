// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>

//! Blind relay: `POST /proxy?targethost=H&targetpath=P` → `POST https://H/P`.

use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;
use odoh_common::{Error, Result};
use tracing::{info, warn};
use url::Url;

use crate::transport::Transport;

/// Target path used when the client gives only `targethost`.
pub const DEFAULT_TARGET_PATH: &str = "/proxy";

/// Forwards encrypted queries without reading them.
///
/// Holds no key material. The body is passed to the transport as-is and the
/// target's reply is returned as-is; nothing here branches on its content.
#[derive(Clone)]
pub struct ProxyRelay {
    transport: Arc<dyn Transport>,
}

impl ProxyRelay {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Build `https://{target_host}{target_path}`.
    ///
    /// `target_host` may carry a port but nothing else: userinfo, paths,
    /// queries and fragments are rejected.
    pub fn target_url(target_host: &str, target_path: Option<&str>) -> Result<Url> {
        if target_host.is_empty() {
            return Err(Error::BadRequest("missing targethost"));
        }

        let mut url = Url::parse(&format!("https://{target_host}"))
            .map_err(|_| Error::BadRequest("invalid targethost"))?;
        if url.host_str().is_none()
            || url.path() != "/"
            || url.query().is_some()
            || url.fragment().is_some()
            || !url.username().is_empty()
            || url.password().is_some()
        {
            return Err(Error::BadRequest("invalid targethost"));
        }

        match target_path.filter(|p| !p.is_empty()) {
            None => url.set_path(DEFAULT_TARGET_PATH),
            Some(path) if path.starts_with('/') => url.set_path(path),
            Some(path) => url.set_path(&format!("/{path}")),
        }
        Ok(url)
    }

    /// Relay `body` to the target and return its reply unmodified.
    pub async fn relay(
        &self,
        target_host: &str,
        target_path: Option<&str>,
        body: Bytes,
    ) -> Result<Bytes> {
        let url = Self::target_url(target_host, target_path)?;

        let started = Instant::now();
        let result = self.transport.post(&url, body).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        match &result {
            Ok(_) => info!(
                target_host = url.host_str().unwrap_or_default(),
                target_path = url.path(),
                elapsed_ms,
                "relayed query"
            ),
            Err(e) => warn!(
                target_host = url.host_str().unwrap_or_default(),
                target_path = url.path(),
                elapsed_ms,
                error = %e,
                "relay failed"
            ),
        }
        result
    }
}
