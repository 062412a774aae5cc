// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>

//! Error taxonomy shared by the proxy and target.

use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("malformed ODoH config: {0}")]
    MalformedConfig(&'static str),

    #[error("malformed ODoH message: {0}")]
    MalformedMessage(&'static str),

    /// Deliberately carries no detail: a bad encapsulated key, a wrong key,
    /// tampered data and an unsupported suite all look the same.
    #[error("decryption failed")]
    DecryptionFailure,

    #[error("encryption failed")]
    EncryptionFailure,

    #[error("HKDF key derivation failed")]
    KeyDerivationFailed,

    #[error("relay to {target} failed: {reason}")]
    RelayFailure { target: String, reason: String },

    #[error("relay to {target} timed out")]
    RelayTimeout { target: String },

    #[error("resolver failed: {0}")]
    ResolverFailure(String),

    #[error("resolver timed out after {0:?}")]
    ResolverTimeout(Duration),

    #[error("bad request: {0}")]
    BadRequest(&'static str),

    #[error("invalid key seed: {0}")]
    InvalidSeed(String),
}

impl Error {
    /// True for errors caused by the request itself (400-class).
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::MalformedConfig(_)
                | Self::MalformedMessage(_)
                | Self::DecryptionFailure
                | Self::BadRequest(_)
        )
    }

    /// True for upstream timeouts (relay or resolver).
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::RelayTimeout { .. } | Self::ResolverTimeout(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_client_errors() {
        assert!(Error::DecryptionFailure.is_client_error());
        assert!(Error::BadRequest("missing targethost").is_client_error());
        assert!(!Error::ResolverFailure("refused".into()).is_client_error());
        assert!(!Error::EncryptionFailure.is_client_error());
    }

    #[test]
    fn decryption_failure_has_no_detail() {
        assert_eq!(Error::DecryptionFailure.to_string(), "decryption failed");
    }

    #[test]
    fn classifies_timeouts() {
        assert!(Error::ResolverTimeout(Duration::from_secs(5)).is_timeout());
        assert!(Error::RelayTimeout { target: "t.example".into() }.is_timeout());
        assert!(!Error::RelayFailure {
            target: "t.example".into(),
            reason: "refused".into()
        }
        .is_timeout());
    }
}
