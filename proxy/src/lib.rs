// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// ODoH Proxy: blind relay between clients and targets (RFC 9230 Section 5)
//
// The proxy sees the client's address and the target's name, never the query.
// It holds no key material and never parses, caches or logs relayed bodies.

pub mod relay;
pub mod transport;

pub use relay::{ProxyRelay, DEFAULT_TARGET_PATH};
pub use transport::{HttpsTransport, Transport, TransportConfig};
