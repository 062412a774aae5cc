// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// ODoH server: proxy and target on one query endpoint.
//
// Configuration comes from flags or the environment (see `odoh-server --help`).
// `odoh-server keygen` prints a fresh seed for SEED_SECRET_KEY.

use std::sync::Arc;

use base64::Engine;
use clap::Parser;
use odoh_common::KeyMaterial;
use odoh_proxy::{HttpsTransport, ProxyRelay};
use odoh_server::config::{Args, Command};
use odoh_server::routes::{self, AppState};
use odoh_target::{TargetHandler, UdpResolver};
use rand::RngCore;
use tokio::net::TcpListener;
use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const KEYGEN_SEED_LEN: usize = 32;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    if args.command == Some(Command::Keygen) {
        return keygen();
    }

    init_tracing(args.log_json);

    // An unusable seed aborts startup here
    let keys = Arc::new(args.key_material()?);
    info!(
        public_key = %hex::encode(keys.public_key()),
        seeded = args.seed_secret_key.is_some(),
        "Loaded target key pair"
    );

    let resolver = Arc::new(UdpResolver::new(args.upstream_dns, args.resolver_timeout()));
    let target = TargetHandler::new(keys, resolver).with_resolve_timeout(args.resolver_timeout());
    let transport = Arc::new(HttpsTransport::new(&args.transport_config())?);
    let proxy = ProxyRelay::new(transport);
    let state = Arc::new(AppState::new(args.target_instance_name.clone(), target, proxy)?);

    let addr = args.listen_addr();
    let listener = TcpListener::bind(addr).await?;
    info!(
        addr = %addr,
        server_name = %args.target_instance_name,
        upstream_dns = %args.upstream_dns,
        resolver_timeout_ms = args.resolver_timeout_ms,
        relay_timeout_ms = args.relay_timeout_ms,
        max_idle_per_host = args.max_idle_per_host,
        "ODoH server listening"
    );

    axum::serve(listener, routes::router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::builder()
        .with_default_directive(Level::INFO.into())
        .from_env_lossy();
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

/// Print a random seed and the configs its key pair publishes.
fn keygen() -> anyhow::Result<()> {
    let mut seed = [0u8; KEYGEN_SEED_LEN];
    rand::rngs::OsRng.fill_bytes(&mut seed);
    let keys = KeyMaterial::from_seed(&seed)?;
    let configs = keys.configs().encode()?;

    println!("ODoH Target Key Pair");
    println!("====================");
    println!("Suite: DHKEM(X25519, HKDF-SHA256) / HKDF-SHA256 / ChaCha20Poly1305");
    println!();
    println!("SEED_SECRET_KEY (hex, keep secret):");
    println!("  {}", hex::encode(seed));
    println!();
    println!("Public key (hex):");
    println!("  {}", hex::encode(keys.public_key()));
    println!();
    println!("ODoHConfigs (base64):");
    println!("  {}", base64::engine::general_purpose::STANDARD.encode(&configs));

    seed.fill(0);
    Ok(())
}
