// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>

//! Per-request flow at the target.
//!
//! ```text
//! Received → Opened → Resolved → Sealed → Responded
//!     └──────────┴─────────┴────────┴──→ Failed
//! ```
//!
//! Each request runs the flow once with its own [`EncryptionContext`]; the
//! only state shared between requests is the immutable [`KeyMaterial`].
//!
//! [`EncryptionContext`]: odoh_common::EncryptionContext

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use odoh_common::{decrypt_query, encrypt_response, Error, KeyMaterial, ObliviousQuery, Result};
use tracing::debug;

use crate::resolver::Resolver;

/// Upper bound on one resolver round trip.
pub const DEFAULT_RESOLVE_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Received,
    Opened,
    Resolved,
    Sealed,
    Responded,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Received => "received",
            Self::Opened => "opened",
            Self::Resolved => "resolved",
            Self::Sealed => "sealed",
            Self::Responded => "responded",
        };
        f.write_str(name)
    }
}

pub struct TargetHandler {
    keys: Arc<KeyMaterial>,
    resolver: Arc<dyn Resolver>,
    resolve_timeout: Duration,
}

impl TargetHandler {
    pub fn new(keys: Arc<KeyMaterial>, resolver: Arc<dyn Resolver>) -> Self {
        Self {
            keys,
            resolver,
            resolve_timeout: DEFAULT_RESOLVE_TIMEOUT,
        }
    }

    pub fn with_resolve_timeout(mut self, timeout: Duration) -> Self {
        self.resolve_timeout = timeout;
        self
    }

    pub fn keys(&self) -> &KeyMaterial {
        &self.keys
    }

    /// Turn an encoded `ODoHQuery` into an encoded `ODoHResponse`.
    ///
    /// Dropping the returned future cancels the resolver call; the plaintext
    /// and context are dropped with it.
    pub async fn handle(&self, body: &[u8]) -> Result<Vec<u8>> {
        let query = ObliviousQuery::decode(body).map_err(|e| failed(Stage::Received, e))?;

        let (plaintext, context) =
            decrypt_query(&self.keys, &query).map_err(|e| failed(Stage::Opened, e))?;
        debug!(stage = %Stage::Opened, "query opened");

        let answer = match tokio::time::timeout(self.resolve_timeout, self.resolver.resolve(&plaintext))
            .await
        {
            Ok(Ok(answer)) => answer,
            Ok(Err(e)) => return Err(failed(Stage::Resolved, e)),
            Err(_) => {
                return Err(failed(
                    Stage::Resolved,
                    Error::ResolverTimeout(self.resolve_timeout),
                ))
            }
        };
        drop(plaintext);
        debug!(stage = %Stage::Resolved, "answer received");

        let response = encrypt_response(context, &answer).map_err(|e| failed(Stage::Sealed, e))?;
        let wire = response.encode().map_err(|e| failed(Stage::Responded, e))?;
        debug!(stage = %Stage::Responded, "response sealed");

        Ok(wire)
    }
}

fn failed(stage: Stage, err: Error) -> Error {
    debug!(stage = %stage, error = %err, "target request failed");
    err
}
