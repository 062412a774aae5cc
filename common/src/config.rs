// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// ODoHConfigs: the target's published public key material (RFC 9230 Section 6).
//
// Wire format:
//   ODoHConfigs:  [2 bytes: total length] [ODoHConfig ...]
//   ODoHConfig:   [2 bytes: version] [2 bytes: length] [contents]
//   contents:     [2 bytes: kemID] [2 bytes: kdfID] [2 bytes: aeadID]
//                 [2 bytes: public key length] [public key]

use bytes::BufMut;
use tracing::debug;

use crate::crypto::Suite;
use crate::error::{Error, Result};
use crate::protocol::{put_prefixed, take_prefixed, take_u16};

/// The only config version this implementation understands.
pub const ODOH_VERSION: u16 = 0x0001;

const TRUNCATED: Error = Error::MalformedConfig("truncated config contents");

/// One target key: algorithm identifiers and the serialized public key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObliviousConfigContents {
    pub suite: Suite,
    pub public_key: Vec<u8>,
}

impl ObliviousConfigContents {
    /// Encode the contents without the version/length header.
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(8 + self.public_key.len());
        out.put_u16(self.suite.kem_id);
        out.put_u16(self.suite.kdf_id);
        out.put_u16(self.suite.aead_id);
        put_prefixed(&mut out, &self.public_key)
            .ok_or(Error::MalformedConfig("public key exceeds 65535 bytes"))?;
        Ok(out)
    }

    /// Decode contents that must span `buf` exactly.
    pub fn decode(buf: &[u8]) -> Result<Self> {
        let mut buf = buf;
        let kem_id = take_u16(&mut buf).ok_or(TRUNCATED)?;
        let kdf_id = take_u16(&mut buf).ok_or(TRUNCATED)?;
        let aead_id = take_u16(&mut buf).ok_or(TRUNCATED)?;
        let public_key = take_prefixed(&mut buf)
            .ok_or(Error::MalformedConfig("public key length overruns config"))?;
        if public_key.is_empty() {
            return Err(Error::MalformedConfig("empty public key"));
        }
        if !buf.is_empty() {
            return Err(Error::MalformedConfig("trailing bytes after public key"));
        }

        Ok(Self {
            suite: Suite {
                kem_id,
                kdf_id,
                aead_id,
            },
            public_key: public_key.to_vec(),
        })
    }
}

/// An ordered list of configs; clients use the first one they support.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObliviousConfigs {
    configs: Vec<ObliviousConfigContents>,
}

impl ObliviousConfigs {
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut entries = Vec::new();
        for config in &self.configs {
            entries.put_u16(ODOH_VERSION);
            put_prefixed(&mut entries, &config.encode()?)
                .ok_or(Error::MalformedConfig("config entry exceeds 65535 bytes"))?;
        }

        let mut out = Vec::with_capacity(2 + entries.len());
        put_prefixed(&mut out, &entries)
            .ok_or(Error::MalformedConfig("config list exceeds 65535 bytes"))?;
        Ok(out)
    }

    /// Parse a config list, skipping entries with unknown versions.
    ///
    /// Never reads past `buf`: any length that disagrees with the buffer is
    /// [`Error::MalformedConfig`].
    pub fn decode(buf: &[u8]) -> Result<Self> {
        let mut buf = buf;
        let mut entries = take_prefixed(&mut buf)
            .ok_or(Error::MalformedConfig("list length overruns buffer"))?;
        if !buf.is_empty() {
            return Err(Error::MalformedConfig("trailing bytes after config list"));
        }

        let mut configs = Vec::new();
        while !entries.is_empty() {
            let version = take_u16(&mut entries)
                .ok_or(Error::MalformedConfig("truncated config version"))?;
            let contents = take_prefixed(&mut entries)
                .ok_or(Error::MalformedConfig("config length overruns list"))?;

            if version != ODOH_VERSION {
                debug!(version, len = contents.len(), "skipping unsupported ODoH config version");
                continue;
            }
            configs.push(ObliviousConfigContents::decode(contents)?);
        }

        Ok(Self { configs })
    }

    pub fn configs(&self) -> &[ObliviousConfigContents] {
        &self.configs
    }

    pub fn is_empty(&self) -> bool {
        self.configs.is_empty()
    }

    /// First entry whose suite this implementation can seal to.
    pub fn first_supported(&self) -> Option<&ObliviousConfigContents> {
        self.configs.iter().find(|c| c.suite.is_supported())
    }
}

impl From<Vec<ObliviousConfigContents>> for ObliviousConfigs {
    fn from(configs: Vec<ObliviousConfigContents>) -> Self {
        Self { configs }
    }
}

impl IntoIterator for ObliviousConfigs {
    type Item = ObliviousConfigContents;
    type IntoIter = std::vec::IntoIter<ObliviousConfigContents>;

    fn into_iter(self) -> Self::IntoIter {
        self.configs.into_iter()
    }
}
