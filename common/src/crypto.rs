// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// HPKE sealing for ODoH queries and responses.
//
// Query direction (client → target):
//   HPKE base mode, info = "odoh query", aad = 0x01 || kemID || kdfID || aeadID
//
// Response direction (target → client):
//   secret = HPKE export("odoh response", 32)
//   key    = HKDF-SHA256(salt = encapsulated key, secret).expand("odoh key", 32)
//   nonce  = HKDF-SHA256(salt = encapsulated key, secret).expand("odoh nonce", 12)
//   ChaCha20-Poly1305, aad = 0x02

use std::fmt;

use chacha20poly1305::aead::generic_array::GenericArray;
use chacha20poly1305::aead::{Aead, KeyInit, Payload};
use chacha20poly1305::ChaCha20Poly1305;
use hkdf::Hkdf;
use hpke::{Deserializable, HpkeError, Kem as KemTrait, OpModeR, OpModeS, Serializable};
use rand::rngs::OsRng;
use sha2::Sha256;

use crate::config::ObliviousConfigContents;
use crate::error::{Error, Result};
use crate::keys::{HpkeAead, HpkeKdf, HpkeKem, KeyMaterial};
use crate::message::{ObliviousQuery, ObliviousResponse, RESPONSE_AAD};

/// `DHKEM(X25519, HKDF-SHA256)` (RFC 9180 Section 7.1).
pub const KEM_X25519_HKDF_SHA256: u16 = 0x0020;
/// `HKDF-SHA256` (RFC 9180 Section 7.2).
pub const KDF_HKDF_SHA256: u16 = 0x0001;
/// `ChaCha20Poly1305` (RFC 9180 Section 7.3).
pub const AEAD_CHACHA20_POLY1305: u16 = 0x0003;

/// Response key size (bytes).
pub const KEY_LEN: usize = 32;
/// Response nonce size (bytes).
pub const NONCE_LEN: usize = 12;
/// Poly1305 authentication tag size (bytes).
pub const TAG_LEN: usize = 16;

/// HPKE info string for the query direction.
const QUERY_INFO: &[u8] = b"odoh query";
/// Exporter context for the response secret.
const RESPONSE_EXPORT_LABEL: &[u8] = b"odoh response";
const RESPONSE_KEY_LABEL: &[u8] = b"odoh key";
const RESPONSE_NONCE_LABEL: &[u8] = b"odoh nonce";

/// KEM/KDF/AEAD identifiers as advertised in configs and carried by queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Suite {
    pub kem_id: u16,
    pub kdf_id: u16,
    pub aead_id: u16,
}

impl Suite {
    /// The only suite this implementation seals and opens.
    pub const SUPPORTED: Suite = Suite {
        kem_id: KEM_X25519_HKDF_SHA256,
        kdf_id: KDF_HKDF_SHA256,
        aead_id: AEAD_CHACHA20_POLY1305,
    };

    pub fn is_supported(&self) -> bool {
        *self == Self::SUPPORTED
    }
}

/// Symmetric state shared by one query and its response.
///
/// Created by [`seal_query`] on the client and [`open_query`] on the target.
/// The response methods take `self`, so a context seals or opens exactly one
/// response and is then gone. Key bytes are wiped on drop.
pub struct EncryptionContext {
    encapsulated_key: Vec<u8>,
    key: [u8; KEY_LEN],
    nonce: [u8; NONCE_LEN],
}

impl EncryptionContext {
    fn derive(encapsulated_key: Vec<u8>, exported: &[u8]) -> Result<Self> {
        let hk = Hkdf::<Sha256>::new(Some(&encapsulated_key), exported);
        let mut key = [0u8; KEY_LEN];
        let mut nonce = [0u8; NONCE_LEN];
        hk.expand(RESPONSE_KEY_LABEL, &mut key)
            .map_err(|_| Error::KeyDerivationFailed)?;
        hk.expand(RESPONSE_NONCE_LABEL, &mut nonce)
            .map_err(|_| Error::KeyDerivationFailed)?;

        Ok(Self {
            encapsulated_key,
            key,
            nonce,
        })
    }

    /// The encapsulated key sent alongside the query ciphertext.
    pub fn encapsulated_key(&self) -> &[u8] {
        &self.encapsulated_key
    }

    /// Seal the DNS answer under the response-direction key.
    pub fn seal_response(self, plaintext: &[u8]) -> Result<Vec<u8>> {
        let cipher = ChaCha20Poly1305::new(GenericArray::from_slice(&self.key));
        cipher
            .encrypt(
                GenericArray::from_slice(&self.nonce),
                Payload {
                    msg: plaintext,
                    aad: &RESPONSE_AAD,
                },
            )
            .map_err(|_| Error::EncryptionFailure)
    }

    /// Open a response sealed by the matching context on the other side.
    pub fn open_response(self, ciphertext: &[u8]) -> Result<Vec<u8>> {
        let cipher = ChaCha20Poly1305::new(GenericArray::from_slice(&self.key));
        cipher
            .decrypt(
                GenericArray::from_slice(&self.nonce),
                Payload {
                    msg: ciphertext,
                    aad: &RESPONSE_AAD,
                },
            )
            .map_err(|_| Error::DecryptionFailure)
    }
}

impl Drop for EncryptionContext {
    fn drop(&mut self) {
        self.key.fill(0);
        self.nonce.fill(0);
    }
}

impl fmt::Debug for EncryptionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncryptionContext")
            .field("encapsulated_key_len", &self.encapsulated_key.len())
            .finish_non_exhaustive()
    }
}

/// Seal a query to the target described by `config`.
///
/// Encapsulation randomness is fresh per call, so identical inputs never
/// produce the same encapsulated key or ciphertext.
pub fn seal_query(
    config: &ObliviousConfigContents,
    aad: &[u8],
    plaintext: &[u8],
) -> Result<(EncryptionContext, Vec<u8>)> {
    if !config.suite.is_supported() {
        return Err(Error::MalformedConfig("unsupported cipher suite"));
    }
    let public_key = <HpkeKem as KemTrait>::PublicKey::from_bytes(&config.public_key)
        .map_err(|_| Error::MalformedConfig("invalid public key"))?;

    let (encapped, mut sender) = hpke::setup_sender::<HpkeAead, HpkeKdf, HpkeKem, _>(
        &OpModeS::Base,
        &public_key,
        QUERY_INFO,
        &mut OsRng,
    )
    .map_err(|_| Error::EncryptionFailure)?;

    let ciphertext = sender
        .seal(plaintext, aad)
        .map_err(|_| Error::EncryptionFailure)?;

    let mut exported = [0u8; KEY_LEN];
    sender
        .export(RESPONSE_EXPORT_LABEL, &mut exported)
        .map_err(|_| Error::EncryptionFailure)?;
    let context = EncryptionContext::derive(encapped.to_bytes().to_vec(), &exported);
    exported.fill(0);

    Ok((context?, ciphertext))
}

/// Open a query with the target's private key.
///
/// Every failure, whichever step produced it, is [`Error::DecryptionFailure`].
pub fn open_query(
    keys: &KeyMaterial,
    encapsulated_key: &[u8],
    aad: &[u8],
    ciphertext: &[u8],
) -> Result<(Vec<u8>, EncryptionContext)> {
    let (plaintext, mut exported) = try_open(keys, encapsulated_key, aad, ciphertext)
        .map_err(|_| Error::DecryptionFailure)?;
    let context = EncryptionContext::derive(encapsulated_key.to_vec(), &exported);
    exported.fill(0);

    Ok((plaintext, context?))
}

fn try_open(
    keys: &KeyMaterial,
    encapsulated_key: &[u8],
    aad: &[u8],
    ciphertext: &[u8],
) -> std::result::Result<(Vec<u8>, [u8; KEY_LEN]), HpkeError> {
    let encapped = <HpkeKem as KemTrait>::EncappedKey::from_bytes(encapsulated_key)?;
    let mut receiver = hpke::setup_receiver::<HpkeAead, HpkeKdf, HpkeKem>(
        &OpModeR::Base,
        keys.private_key(),
        &encapped,
        QUERY_INFO,
    )?;
    let plaintext = receiver.open(ciphertext, aad)?;

    let mut exported = [0u8; KEY_LEN];
    receiver.export(RESPONSE_EXPORT_LABEL, &mut exported)?;
    Ok((plaintext, exported))
}

/// Client side: seal a DNS query into an [`ObliviousQuery`].
pub fn encrypt_query(
    config: &ObliviousConfigContents,
    dns_query: &[u8],
) -> Result<(ObliviousQuery, EncryptionContext)> {
    let aad = ObliviousQuery::associated_data(&config.suite);
    let (context, ciphertext) = seal_query(config, &aad, dns_query)?;
    let query = ObliviousQuery {
        suite: config.suite,
        encapsulated_key: context.encapsulated_key().to_vec(),
        ciphertext,
    };
    Ok((query, context))
}

/// Target side: recover the DNS query and the context for its response.
pub fn decrypt_query(
    keys: &KeyMaterial,
    query: &ObliviousQuery,
) -> Result<(Vec<u8>, EncryptionContext)> {
    if query.suite != keys.suite() {
        return Err(Error::DecryptionFailure);
    }
    open_query(
        keys,
        &query.encapsulated_key,
        &query.aad(),
        &query.ciphertext,
    )
}

/// Target side: seal the DNS answer for the client.
pub fn encrypt_response(context: EncryptionContext, answer: &[u8]) -> Result<ObliviousResponse> {
    Ok(ObliviousResponse {
        ciphertext: context.seal_response(answer)?,
    })
}

/// Client side: open the target's answer.
pub fn decrypt_response(context: EncryptionContext, response: &ObliviousResponse) -> Result<Vec<u8>> {
    context.open_response(&response.ciphertext)
}
