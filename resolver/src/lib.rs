// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// ODoH Target: opens sealed queries, resolves them, seals the answers
//
// The target sees the DNS query but only ever talks to the proxy, so it never
// learns which client asked. Peer addresses are deliberately not logged.

pub mod handler;
pub mod resolver;

pub use handler::{Stage, TargetHandler, DEFAULT_RESOLVE_TIMEOUT};
pub use resolver::{Resolver, UdpResolver};
