// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Encrypted ODoH messages carried as HTTP bodies.
//
// Wire format:
//   ODoHQuery:     [2 bytes: kemID] [2 bytes: kdfID] [2 bytes: aeadID]
//                  [2 bytes: encapsulated key length] [encapsulated key]
//                  [2 bytes: ciphertext length] [ciphertext]
//   ODoHResponse:  [2 bytes: ciphertext length] [ciphertext]

use bytes::BufMut;

use crate::crypto::Suite;
use crate::error::{Error, Result};
use crate::protocol::{put_prefixed, take_prefixed, take_u16};

/// Message type discriminator bound into query associated data.
pub const QUERY_TYPE: u8 = 0x01;
/// Message type discriminator bound into response associated data.
pub const RESPONSE_TYPE: u8 = 0x02;
/// Associated data for the response direction.
pub const RESPONSE_AAD: [u8; 1] = [RESPONSE_TYPE];

const TRUNCATED: Error = Error::MalformedMessage("truncated query header");

/// An encrypted DNS query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObliviousQuery {
    pub suite: Suite,
    pub encapsulated_key: Vec<u8>,
    pub ciphertext: Vec<u8>,
}

impl ObliviousQuery {
    /// `type || kemID || kdfID || aeadID`, bound into the query seal so a
    /// query cannot be replayed as a response or under another suite.
    pub fn associated_data(suite: &Suite) -> [u8; 7] {
        let kem = suite.kem_id.to_be_bytes();
        let kdf = suite.kdf_id.to_be_bytes();
        let aead = suite.aead_id.to_be_bytes();
        [QUERY_TYPE, kem[0], kem[1], kdf[0], kdf[1], aead[0], aead[1]]
    }

    pub fn aad(&self) -> [u8; 7] {
        Self::associated_data(&self.suite)
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut out =
            Vec::with_capacity(10 + self.encapsulated_key.len() + self.ciphertext.len());
        out.put_u16(self.suite.kem_id);
        out.put_u16(self.suite.kdf_id);
        out.put_u16(self.suite.aead_id);
        put_prefixed(&mut out, &self.encapsulated_key)
            .ok_or(Error::MalformedMessage("encapsulated key exceeds 65535 bytes"))?;
        put_prefixed(&mut out, &self.ciphertext)
            .ok_or(Error::MalformedMessage("ciphertext exceeds 65535 bytes"))?;
        Ok(out)
    }

    /// Decode a query that must span `buf` exactly.
    pub fn decode(buf: &[u8]) -> Result<Self> {
        let mut buf = buf;
        let kem_id = take_u16(&mut buf).ok_or(TRUNCATED)?;
        let kdf_id = take_u16(&mut buf).ok_or(TRUNCATED)?;
        let aead_id = take_u16(&mut buf).ok_or(TRUNCATED)?;

        let encapsulated_key = take_prefixed(&mut buf)
            .ok_or(Error::MalformedMessage("encapsulated key length overruns buffer"))?;
        if encapsulated_key.is_empty() {
            return Err(Error::MalformedMessage("missing encapsulated key"));
        }
        let ciphertext = take_prefixed(&mut buf)
            .ok_or(Error::MalformedMessage("ciphertext length overruns buffer"))?;
        if ciphertext.is_empty() {
            return Err(Error::MalformedMessage("missing ciphertext"));
        }
        if !buf.is_empty() {
            return Err(Error::MalformedMessage("trailing bytes after query"));
        }

        Ok(Self {
            suite: Suite {
                kem_id,
                kdf_id,
                aead_id,
            },
            encapsulated_key: encapsulated_key.to_vec(),
            ciphertext: ciphertext.to_vec(),
        })
    }
}

/// An encrypted DNS answer. Carries no encapsulated key: it is sealed under
/// the context of the query it answers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObliviousResponse {
    pub ciphertext: Vec<u8>,
}

impl ObliviousResponse {
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(2 + self.ciphertext.len());
        put_prefixed(&mut out, &self.ciphertext)
            .ok_or(Error::MalformedMessage("ciphertext exceeds 65535 bytes"))?;
        Ok(out)
    }

    pub fn decode(buf: &[u8]) -> Result<Self> {
        let mut buf = buf;
        let ciphertext = take_prefixed(&mut buf)
            .ok_or(Error::MalformedMessage("ciphertext length overruns buffer"))?;
        if ciphertext.is_empty() {
            return Err(Error::MalformedMessage("missing ciphertext"));
        }
        if !buf.is_empty() {
            return Err(Error::MalformedMessage("trailing bytes after response"));
        }
        Ok(Self {
            ciphertext: ciphertext.to_vec(),
        })
    }
}
