// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>

//! ODoH HTTP service.
//!
//! One process serves both roles on the same query endpoint:
//!
//! - **Proxy**: `POST /proxy?targethost=H&targetpath=P` relays the sealed
//!   query to `https://H/P` and hands back the target's reply untouched.
//! - **Target**: `POST /proxy` without parameters opens the query with this
//!   instance's key, resolves it and seals the answer.
//!
//! The public key is published at `/.well-known/odohconfigs`.

pub mod config;
pub mod routes;
