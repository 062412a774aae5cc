// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Target key material: one X25519 HPKE key pair per target instance.
//
// The key pair is derived with HPKE DeriveKeyPair (RFC 9180 Section 7.1.3)
// from either an operator-supplied seed or 32 bytes of OS randomness.

use std::fmt;

use hpke::{Kem as KemTrait, Serializable};
use rand::RngCore;

use crate::config::{ObliviousConfigContents, ObliviousConfigs};
use crate::crypto::Suite;
use crate::error::{Error, Result};

pub type HpkeKem = hpke::kem::X25519HkdfSha256;
pub type HpkeKdf = hpke::kdf::HkdfSha256;
pub type HpkeAead = hpke::aead::ChaCha20Poly1305;

pub type PrivateKey = <HpkeKem as KemTrait>::PrivateKey;

/// Shortest seed accepted for deterministic key derivation (bytes).
pub const MIN_SEED_LEN: usize = 16;
/// Seed length used when generating a key pair at random (bytes).
const RANDOM_SEED_LEN: usize = 32;

/// The target's HPKE key pair and the suite it is used with.
///
/// Immutable once built. The private key has no public accessor and is
/// omitted from `Debug` output; only [`KeyMaterial::config`] leaves the
/// process.
pub struct KeyMaterial {
    suite: Suite,
    private_key: PrivateKey,
    public_key: Vec<u8>,
}

impl KeyMaterial {
    /// Derive a key pair from a secret seed.
    ///
    /// The same seed always yields the same key pair. Seeds shorter than
    /// [`MIN_SEED_LEN`] are rejected.
    pub fn from_seed(seed: &[u8]) -> Result<Self> {
        if seed.len() < MIN_SEED_LEN {
            return Err(Error::InvalidSeed(format!(
                "need at least {MIN_SEED_LEN} bytes, got {}",
                seed.len()
            )));
        }

        let (private_key, public_key) = HpkeKem::derive_keypair(seed);
        Ok(Self {
            suite: Suite::SUPPORTED,
            private_key,
            public_key: public_key.to_bytes().to_vec(),
        })
    }

    /// Derive a key pair from a hex-encoded seed.
    pub fn from_hex_seed(seed_hex: &str) -> Result<Self> {
        let seed = hex::decode(seed_hex.trim()).map_err(|e| Error::InvalidSeed(e.to_string()))?;
        Self::from_seed(&seed)
    }

    /// Generate a fresh key pair from OS randomness.
    pub fn generate() -> Self {
        let mut seed = [0u8; RANDOM_SEED_LEN];
        rand::rngs::OsRng.fill_bytes(&mut seed);
        let (private_key, public_key) = HpkeKem::derive_keypair(&seed);
        seed.fill(0);

        Self {
            suite: Suite::SUPPORTED,
            private_key,
            public_key: public_key.to_bytes().to_vec(),
        }
    }

    pub fn suite(&self) -> Suite {
        self.suite
    }

    /// Serialized public key (32 bytes for X25519).
    pub fn public_key(&self) -> &[u8] {
        &self.public_key
    }

    pub(crate) fn private_key(&self) -> &PrivateKey {
        &self.private_key
    }

    /// The public half of this key pair as a config entry.
    pub fn config(&self) -> ObliviousConfigContents {
        ObliviousConfigContents {
            suite: self.suite,
            public_key: self.public_key.clone(),
        }
    }

    /// The single-entry config list served at `/.well-known/odohconfigs`.
    pub fn configs(&self) -> ObliviousConfigs {
        ObliviousConfigs::from(vec![self.config()])
    }
}

impl fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyMaterial")
            .field("suite", &self.suite)
            .field("public_key", &hex::encode(&self.public_key))
            .finish_non_exhaustive()
    }
}
