// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// ODoH Common: Shared key material, wire codecs and HPKE sealing
//
// Cryptographic stack (RFC 9230 / RFC 9180):
//   KEM:       DHKEM(X25519, HKDF-SHA256)  id 0x0020
//   KDF:       HKDF-SHA256                 id 0x0001
//   AEAD:      ChaCha20-Poly1305           id 0x0003
//   RNG:       OsRng

pub mod config;
pub mod crypto;
pub mod error;
pub mod keys;
pub mod message;
pub mod protocol;

pub use config::{ObliviousConfigContents, ObliviousConfigs, ODOH_VERSION};
pub use crypto::{
    decrypt_query, decrypt_response, encrypt_query, encrypt_response, open_query, seal_query,
    EncryptionContext, Suite,
};
pub use error::{Error, Result};
pub use keys::KeyMaterial;
pub use message::{ObliviousQuery, ObliviousResponse};

/// Media type carried by encrypted queries and responses (RFC 9230 Section 4.1).
pub const OBLIVIOUS_DNS_MESSAGE: &str = "application/oblivious-dns-message";
