// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>

//! Outbound HTTP hop from the proxy to a target.
//!
//! One pooled `reqwest::Client` is shared by every in-flight relay. Idle
//! connections per target are bounded so a busy target is not re-handshaked
//! on every query.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use odoh_common::{Error, Result, OBLIVIOUS_DNS_MESSAGE};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use url::Url;

/// POSTs an opaque body and returns the opaque reply.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn post(&self, url: &Url, body: Bytes) -> Result<Bytes>;
}

#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Whole-request deadline (connect, send, read body).
    pub timeout: Duration,
    pub connect_timeout: Duration,
    /// Idle connections kept per target host.
    pub max_idle_per_host: usize,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            connect_timeout: Duration::from_secs(5),
            max_idle_per_host: 1024,
        }
    }
}

/// HTTPS transport backed by a pooled rustls `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct HttpsTransport {
    client: reqwest::Client,
}

impl HttpsTransport {
    pub fn new(config: &TransportConfig) -> reqwest::Result<Self> {
        let client = reqwest::Client::builder()
            .use_rustls_tls()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .pool_max_idle_per_host(config.max_idle_per_host)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpsTransport {
    async fn post(&self, url: &Url, body: Bytes) -> Result<Bytes> {
        let target = url.host_str().unwrap_or_default();

        let response = self
            .client
            .post(url.clone())
            .header(CONTENT_TYPE, OBLIVIOUS_DNS_MESSAGE)
            .header(ACCEPT, OBLIVIOUS_DNS_MESSAGE)
            .body(body)
            .send()
            .await
            .map_err(|e| upstream_error(target, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::RelayFailure {
                target: target.to_string(),
                reason: format!("target returned HTTP {}", status.as_u16()),
            });
        }

        response.bytes().await.map_err(|e| upstream_error(target, e))
    }
}

fn upstream_error(target: &str, err: reqwest::Error) -> Error {
    if err.is_timeout() {
        Error::RelayTimeout {
            target: target.to_string(),
        }
    } else {
        Error::RelayFailure {
            target: target.to_string(),
            reason: err.to_string(),
        }
    }
}
