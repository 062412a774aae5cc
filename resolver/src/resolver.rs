// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>

//! DNS resolution collaborator: plaintext query in, plaintext answer out.

use std::net::SocketAddr;
use std::time::Duration;

use async_trait::async_trait;
use hickory_proto::op::Message;
use hickory_proto::serialize::binary::BinDecodable;
use odoh_common::{Error, Result};
use tokio::net::UdpSocket;
use tokio::time::Instant;
use tracing::debug;

/// Largest UDP answer accepted from upstream (EDNS0 ceiling).
const MAX_UDP_ANSWER: usize = 4096;

/// Resolves one DNS wire-format query.
#[async_trait]
pub trait Resolver: Send + Sync {
    async fn resolve(&self, query: &[u8]) -> Result<Vec<u8>>;
}

/// Forwards queries to an upstream recursive resolver over UDP.
#[derive(Debug, Clone)]
pub struct UdpResolver {
    upstream: SocketAddr,
    timeout: Duration,
}

impl UdpResolver {
    pub fn new(upstream: SocketAddr, timeout: Duration) -> Self {
        Self { upstream, timeout }
    }

    pub fn upstream(&self) -> SocketAddr {
        self.upstream
    }
}

#[async_trait]
impl Resolver for UdpResolver {
    async fn resolve(&self, query: &[u8]) -> Result<Vec<u8>> {
        let query_id = Message::from_bytes(query)
            .map_err(|_| Error::ResolverFailure("decrypted query is not a DNS message".into()))?
            .id();

        let bind: SocketAddr = if self.upstream.is_ipv4() {
            ([0u8; 4], 0).into()
        } else {
            ([0u16; 8], 0).into()
        };
        let socket = UdpSocket::bind(bind).await.map_err(upstream_io)?;
        socket.connect(self.upstream).await.map_err(upstream_io)?;
        socket.send(query).await.map_err(upstream_io)?;

        let deadline = Instant::now() + self.timeout;
        let mut buf = vec![0u8; MAX_UDP_ANSWER];
        loop {
            let len = tokio::time::timeout_at(deadline, socket.recv(&mut buf))
                .await
                .map_err(|_| Error::ResolverTimeout(self.timeout))?
                .map_err(upstream_io)?;

            // Stale or spoofed datagrams are dropped; keep waiting for ours
            match Message::from_bytes(&buf[..len]) {
                Ok(answer) if answer.id() == query_id => {
                    buf.truncate(len);
                    return Ok(buf);
                }
                Ok(answer) => {
                    debug!(
                        expected = query_id,
                        got = answer.id(),
                        "ignoring upstream answer with wrong ID"
                    )
                }
                Err(_) => debug!(len, "ignoring non-DNS upstream datagram"),
            }
        }
    }
}

fn upstream_io(err: std::io::Error) -> Error {
    Error::ResolverFailure(err.to_string())
}
