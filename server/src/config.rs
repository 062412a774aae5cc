// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>

//! Command line and environment configuration.
//!
//! Every flag can also be set through the environment variable named next
//! to it; flags win over the environment.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use clap::{Parser, Subcommand};
use odoh_common::{KeyMaterial, Result};
use odoh_proxy::TransportConfig;

/// Connection setup never waits longer than this, even with a long relay timeout.
const MAX_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Parser, Debug)]
#[command(name = "odoh-server", version, about = "Oblivious DNS-over-HTTPS proxy and target")]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Port to listen on
    #[arg(long, env = "PORT", default_value_t = 8080)]
    pub port: u16,

    /// Address to bind
    #[arg(long, env = "LISTEN_ADDR", default_value_t = IpAddr::V4(Ipv4Addr::UNSPECIFIED))]
    pub listen: IpAddr,

    /// Hex-encoded seed for the target key pair; a random key is used when unset
    #[arg(long = "seed", env = "SEED_SECRET_KEY", hide_env_values = true)]
    pub seed_secret_key: Option<String>,

    /// Name shown on the index page
    #[arg(long, env = "TARGET_INSTANCE_NAME", default_value = "localhost")]
    pub target_instance_name: String,

    /// Upstream recursive resolver (UDP)
    #[arg(long, env = "UPSTREAM_DNS", default_value = "1.1.1.1:53")]
    pub upstream_dns: SocketAddr,

    /// Resolver round-trip timeout in milliseconds
    #[arg(long, env = "RESOLVER_TIMEOUT_MS", default_value_t = 5000)]
    pub resolver_timeout_ms: u64,

    /// Proxy-to-target request timeout in milliseconds
    #[arg(long, env = "RELAY_TIMEOUT_MS", default_value_t = 10000)]
    pub relay_timeout_ms: u64,

    /// Idle pooled connections kept per target host
    #[arg(long, env = "MAX_IDLE_PER_HOST", default_value_t = 1024)]
    pub max_idle_per_host: usize,

    /// Emit logs as JSON lines
    #[arg(long, env = "LOG_JSON")]
    pub log_json: bool,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Generate a random seed and print it with the matching ODoH configs
    Keygen,
}

impl Args {
    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.listen, self.port)
    }

    pub fn resolver_timeout(&self) -> Duration {
        Duration::from_millis(self.resolver_timeout_ms)
    }

    pub fn relay_timeout(&self) -> Duration {
        Duration::from_millis(self.relay_timeout_ms)
    }

    pub fn transport_config(&self) -> TransportConfig {
        let timeout = self.relay_timeout();
        TransportConfig {
            timeout,
            connect_timeout: timeout.min(MAX_CONNECT_TIMEOUT),
            max_idle_per_host: self.max_idle_per_host,
        }
    }

    /// Key material from the configured seed, or a fresh random key pair.
    ///
    /// A seed that is set but unusable is an error rather than a silent
    /// fallback to a random key.
    pub fn key_material(&self) -> Result<KeyMaterial> {
        match self.seed_secret_key.as_deref() {
            Some(seed) => KeyMaterial::from_hex_seed(seed),
            None => Ok(KeyMaterial::generate()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use odoh_common::Error;

    fn parse(args: &[&str]) -> Args {
        let mut argv = vec!["odoh-server"];
        argv.extend_from_slice(args);
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn explicit_flags() {
        let args = parse(&[
            "--port",
            "9443",
            "--listen",
            "127.0.0.1",
            "--upstream-dns",
            "9.9.9.9:53",
            "--relay-timeout-ms",
            "2500",
            "--max-idle-per-host",
            "16",
        ]);
        assert_eq!(args.listen_addr(), "127.0.0.1:9443".parse().unwrap());
        assert_eq!(args.upstream_dns, "9.9.9.9:53".parse().unwrap());

        let transport = args.transport_config();
        assert_eq!(transport.timeout, Duration::from_millis(2500));
        assert_eq!(transport.connect_timeout, Duration::from_millis(2500));
        assert_eq!(transport.max_idle_per_host, 16);
    }

    #[test]
    fn connect_timeout_is_capped() {
        let args = parse(&["--relay-timeout-ms", "60000"]);
        assert_eq!(args.transport_config().connect_timeout, MAX_CONNECT_TIMEOUT);
    }

    #[test]
    fn keygen_subcommand() {
        assert_eq!(parse(&["keygen"]).command, Some(Command::Keygen));
    }

    #[test]
    fn seeded_key_is_stable() {
        let args = parse(&["--seed", "000102030405060708090a0b0c0d0e0f"]);
        let a = args.key_material().unwrap();
        let b = args.key_material().unwrap();
        assert_eq!(a.public_key(), b.public_key());
    }

    #[test]
    fn bad_seed_is_rejected() {
        let args = parse(&["--seed", "not-hex"]);
        assert!(matches!(args.key_material(), Err(Error::InvalidSeed(_))));

        let args = parse(&["--seed", "0011"]);
        assert!(matches!(args.key_material(), Err(Error::InvalidSeed(_))));
    }
}
