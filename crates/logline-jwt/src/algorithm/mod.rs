//! Signing algorithms.
//!
//! The set of algorithms is closed: HMAC and RSA-PKCS1v1.5, each over SHA-256,
//! SHA-384 or SHA-512. The algorithm used to verify a token is always the one
//! the caller passes in, never the one named in the token header.

mod hmac_sha;
mod rsa_pkcs1;

use std::fmt;
use std::str::FromStr;

use rsa::{RsaPrivateKey, RsaPublicKey};
use serde::{Deserialize, Serialize};

use crate::codec::encode_segment;
use crate::{Error, Result};

pub use hmac_sha::HmacAlgorithm;
pub use rsa_pkcs1::RsaAlgorithm;

/// A JWS signing algorithm.
pub trait SigningAlgorithm {
    /// Registered name, as used in the `alg` header.
    fn name(&self) -> &'static str;

    /// Compute the raw signature bytes over `payload`.
    ///
    /// # Errors
    /// `InvalidKey` when the key shape does not fit the algorithm, or any
    /// key-material parsing error for PEM input.
    fn sign(&self, payload: &str, key: Key<'_>) -> Result<Vec<u8>>;

    /// Check an encoded signature against `payload`.
    ///
    /// # Errors
    /// `BadSignature` when the signature does not verify, including when it is
    /// not valid base64url. Key errors are returned as-is.
    fn verify(&self, payload: &str, signature: &str, key: Key<'_>) -> Result<()>;

    /// Sign `payload` and return the base64url signature segment.
    ///
    /// # Errors
    /// Same as [`SigningAlgorithm::sign`].
    fn sign_encoded(&self, payload: &str, key: Key<'_>) -> Result<String> {
        Ok(encode_segment(&self.sign(payload, key)?))
    }
}

/// Hash function behind an algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HashFunction {
    /// SHA-256
    Sha256,
    /// SHA-384
    Sha384,
    /// SHA-512
    Sha512,
}

impl HashFunction {
    /// Digest size in bits, the numeric suffix of the algorithm names.
    pub const fn bits(self) -> u16 {
        match self {
            HashFunction::Sha256 => 256,
            HashFunction::Sha384 => 384,
            HashFunction::Sha512 => 512,
        }
    }
}

/// Key material handed to an algorithm for one operation.
///
/// HMAC takes `Bytes` or `Text` as the secret. RSA takes `Bytes` or `Text` as
/// PEM, or an already parsed key.
#[derive(Clone, Copy)]
pub enum Key<'a> {
    /// Raw bytes: an HMAC secret or PEM-encoded RSA key material.
    Bytes(&'a [u8]),
    /// A UTF-8 string: an HMAC secret or PEM-encoded RSA key material.
    Text(&'a str),
    /// A parsed RSA private key (signing).
    RsaPrivate(&'a RsaPrivateKey),
    /// A parsed RSA public key (verification).
    RsaPublic(&'a RsaPublicKey),
}

impl Key<'_> {
    pub(crate) fn kind(&self) -> &'static str {
        match self {
            Key::Bytes(_) => "bytes",
            Key::Text(_) => "text",
            Key::RsaPrivate(_) => "RSA private key",
            Key::RsaPublic(_) => "RSA public key",
        }
    }
}

// Never print key material.
impl fmt::Debug for Key<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Key").field(&self.kind()).finish()
    }
}

impl<'a> From<&'a [u8]> for Key<'a> {
    fn from(value: &'a [u8]) -> Self {
        Key::Bytes(value)
    }
}

impl<'a, const N: usize> From<&'a [u8; N]> for Key<'a> {
    fn from(value: &'a [u8; N]) -> Self {
        Key::Bytes(value)
    }
}

impl<'a> From<&'a Vec<u8>> for Key<'a> {
    fn from(value: &'a Vec<u8>) -> Self {
        Key::Bytes(value)
    }
}

impl<'a> From<&'a str> for Key<'a> {
    fn from(value: &'a str) -> Self {
        Key::Text(value)
    }
}

impl<'a> From<&'a String> for Key<'a> {
    fn from(value: &'a String) -> Self {
        Key::Text(value)
    }
}

impl<'a> From<&'a RsaPrivateKey> for Key<'a> {
    fn from(value: &'a RsaPrivateKey) -> Self {
        Key::RsaPrivate(value)
    }
}

impl<'a> From<&'a RsaPublicKey> for Key<'a> {
    fn from(value: &'a RsaPublicKey) -> Self {
        Key::RsaPublic(value)
    }
}

/// The supported algorithms.
#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "&'static str")]
pub enum Algorithm {
    /// HMAC with SHA-256.
    HS256,
    /// HMAC with SHA-384.
    HS384,
    /// HMAC with SHA-512.
    HS512,
    /// RSASSA-PKCS1-v1_5 with SHA-256.
    RS256,
    /// RSASSA-PKCS1-v1_5 with SHA-384.
    RS384,
    /// RSASSA-PKCS1-v1_5 with SHA-512.
    RS512,
}

enum Family {
    Hmac(HmacAlgorithm),
    Rsa(RsaAlgorithm),
}

impl Algorithm {
    /// Every supported algorithm.
    pub const ALL: [Algorithm; 6] = [
        Algorithm::HS256,
        Algorithm::HS384,
        Algorithm::HS512,
        Algorithm::RS256,
        Algorithm::RS384,
        Algorithm::RS512,
    ];

    /// Look up an algorithm by its registered name.
    ///
    /// # Errors
    /// `HashUnavailable` for an HMAC/RSA name with an unsupported digest size
    /// (e.g. `HS1`), `UnsupportedAlgorithm` for anything else.
    pub fn from_name(name: &str) -> Result<Self> {
        if let Some(alg) = Self::ALL.iter().find(|alg| alg.name() == name) {
            return Ok(*alg);
        }

        let known_family = ["HS", "RS"].iter().any(|prefix| {
            name.strip_prefix(prefix)
                .is_some_and(|bits| !bits.is_empty() && bits.bytes().all(|b| b.is_ascii_digit()))
        });

        if known_family {
            Err(Error::HashUnavailable(name.to_string()))
        } else {
            Err(Error::UnsupportedAlgorithm(name.to_string()))
        }
    }

    /// Hash function used by this algorithm.
    pub const fn hash(self) -> HashFunction {
        match self {
            Algorithm::HS256 | Algorithm::RS256 => HashFunction::Sha256,
            Algorithm::HS384 | Algorithm::RS384 => HashFunction::Sha384,
            Algorithm::HS512 | Algorithm::RS512 => HashFunction::Sha512,
        }
    }

    /// Registered name, as used in the `alg` header.
    pub const fn name(self) -> &'static str {
        match self {
            Algorithm::HS256 => "HS256",
            Algorithm::HS384 => "HS384",
            Algorithm::HS512 => "HS512",
            Algorithm::RS256 => "RS256",
            Algorithm::RS384 => "RS384",
            Algorithm::RS512 => "RS512",
        }
    }

    /// True for the symmetric HMAC family.
    pub const fn is_hmac(self) -> bool {
        matches!(self, Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512)
    }

    fn family(self) -> Family {
        if self.is_hmac() {
            Family::Hmac(HmacAlgorithm::new(self.hash()))
        } else {
            Family::Rsa(RsaAlgorithm::new(self.hash()))
        }
    }
}

impl SigningAlgorithm for Algorithm {
    fn name(&self) -> &'static str {
        Algorithm::name(*self)
    }

    fn sign(&self, payload: &str, key: Key<'_>) -> Result<Vec<u8>> {
        match self.family() {
            Family::Hmac(alg) => alg.sign(payload, key),
            Family::Rsa(alg) => alg.sign(payload, key),
        }
    }

    fn verify(&self, payload: &str, signature: &str, key: Key<'_>) -> Result<()> {
        match self.family() {
            Family::Hmac(alg) => alg.verify(payload, signature, key),
            Family::Rsa(alg) => alg.verify(payload, signature, key),
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Algorithm {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_name(s)
    }
}

impl TryFrom<String> for Algorithm {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::from_name(&value)
    }
}

impl From<Algorithm> for &'static str {
    fn from(value: Algorithm) -> Self {
        value.name()
    }
}

impl From<HmacAlgorithm> for Algorithm {
    fn from(value: HmacAlgorithm) -> Self {
        match value.hash() {
            HashFunction::Sha256 => Algorithm::HS256,
            HashFunction::Sha384 => Algorithm::HS384,
            HashFunction::Sha512 => Algorithm::HS512,
        }
    }
}

impl From<RsaAlgorithm> for Algorithm {
    fn from(value: RsaAlgorithm) -> Self {
        match value.hash() {
            HashFunction::Sha256 => Algorithm::RS256,
            HashFunction::Sha384 => Algorithm::RS384,
            HashFunction::Sha512 => Algorithm::RS512,
        }
    }
}
