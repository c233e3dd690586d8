//! HMAC-SHA2 family (HS256, HS384, HS512).

use hmac::digest::KeyInit;
use hmac::{Hmac, Mac};
use sha2::{Sha256, Sha384, Sha512};
use subtle::ConstantTimeEq;
use tracing::trace;

use super::{HashFunction, Key, SigningAlgorithm};
use crate::codec::decode_segment;
use crate::{Error, Result};

/// Keyed-hash MAC signing over a shared secret.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HmacAlgorithm {
    hash: HashFunction,
}

impl HmacAlgorithm {
    /// HMAC using SHA-256.
    pub const HS256: Self = Self::new(HashFunction::Sha256);
    /// HMAC using SHA-384.
    pub const HS384: Self = Self::new(HashFunction::Sha384);
    /// HMAC using SHA-512.
    pub const HS512: Self = Self::new(HashFunction::Sha512);

    /// HMAC over the given hash function.
    pub const fn new(hash: HashFunction) -> Self {
        Self { hash }
    }

    /// The hash function in use.
    pub const fn hash(self) -> HashFunction {
        self.hash
    }

    fn mac(self, payload: &str, key: Key<'_>) -> Result<Vec<u8>> {
        let secret = match key {
            Key::Bytes(bytes) => bytes,
            Key::Text(text) => text.as_bytes(),
            other => {
                return Err(Error::InvalidKey(format!(
                    "{} requires a byte or string secret, got {}",
                    self.name(),
                    other.kind()
                )));
            }
        };

        let payload = payload.as_bytes();
        match self.hash {
            HashFunction::Sha256 => compute::<Hmac<Sha256>>(secret, payload),
            HashFunction::Sha384 => compute::<Hmac<Sha384>>(secret, payload),
            HashFunction::Sha512 => compute::<Hmac<Sha512>>(secret, payload),
        }
    }
}

fn compute<M: Mac + KeyInit>(secret: &[u8], payload: &[u8]) -> Result<Vec<u8>> {
    let mut mac = <M as Mac>::new_from_slice(secret)
        .map_err(|e| Error::InvalidKey(format!("invalid HMAC secret: {e}")))?;
    mac.update(payload);
    Ok(mac.finalize().into_bytes().to_vec())
}

impl SigningAlgorithm for HmacAlgorithm {
    fn name(&self) -> &'static str {
        match self.hash {
            HashFunction::Sha256 => "HS256",
            HashFunction::Sha384 => "HS384",
            HashFunction::Sha512 => "HS512",
        }
    }

    fn sign(&self, payload: &str, key: Key<'_>) -> Result<Vec<u8>> {
        self.mac(payload, key)
    }

    fn verify(&self, payload: &str, signature: &str, key: Key<'_>) -> Result<()> {
        let expected = self.mac(payload, key)?;

        let Ok(supplied) = decode_segment(signature) else {
            trace!(alg = self.name(), "signature segment is not base64url");
            return Err(Error::BadSignature);
        };

        if bool::from(expected.as_slice().ct_eq(supplied.as_slice())) {
            Ok(())
        } else {
            Err(Error::BadSignature)
        }
    }
}
