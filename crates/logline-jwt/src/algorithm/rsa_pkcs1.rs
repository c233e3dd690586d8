//! RSASSA-PKCS1-v1_5 family (RS256, RS384, RS512).

use rsa::pkcs1v15::{Signature, SigningKey, VerifyingKey};
use rsa::signature::{RandomizedSigner, SignatureEncoding, Verifier};
use rsa::{RsaPrivateKey, RsaPublicKey};
use sha2::{Sha256, Sha384, Sha512};
use tracing::trace;

use super::{HashFunction, Key, SigningAlgorithm};
use crate::codec::decode_segment;
use crate::keys::{parse_rsa_private_key_from_pem, parse_rsa_public_key_from_pem};
use crate::{Error, Result};

/// RSA signatures with PKCS#1 v1.5 padding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RsaAlgorithm {
    hash: HashFunction,
}

impl RsaAlgorithm {
    /// RSASSA-PKCS1-v1_5 using SHA-256.
    pub const RS256: Self = Self::new(HashFunction::Sha256);
    /// RSASSA-PKCS1-v1_5 using SHA-384.
    pub const RS384: Self = Self::new(HashFunction::Sha384);
    /// RSASSA-PKCS1-v1_5 using SHA-512.
    pub const RS512: Self = Self::new(HashFunction::Sha512);

    /// RSA over the given hash function.
    pub const fn new(hash: HashFunction) -> Self {
        Self { hash }
    }

    /// The hash function in use.
    pub const fn hash(self) -> HashFunction {
        self.hash
    }

    fn private_key(self, key: Key<'_>) -> Result<RsaPrivateKey> {
        match key {
            Key::Bytes(pem) => parse_rsa_private_key_from_pem(pem),
            Key::Text(pem) => parse_rsa_private_key_from_pem(pem.as_bytes()),
            Key::RsaPrivate(private) => Ok(private.clone()),
            Key::RsaPublic(_) => Err(Error::InvalidKey(format!(
                "{} signing requires a private key",
                self.name()
            ))),
        }
    }

    fn public_key(self, key: Key<'_>) -> Result<RsaPublicKey> {
        match key {
            Key::Bytes(pem) => parse_rsa_public_key_from_pem(pem),
            Key::Text(pem) => parse_rsa_public_key_from_pem(pem.as_bytes()),
            Key::RsaPublic(public) => Ok(public.clone()),
            Key::RsaPrivate(_) => Err(Error::InvalidKey(format!(
                "{} verification requires a public key",
                self.name()
            ))),
        }
    }
}

impl SigningAlgorithm for RsaAlgorithm {
    fn name(&self) -> &'static str {
        match self.hash {
            HashFunction::Sha256 => "RS256",
            HashFunction::Sha384 => "RS384",
            HashFunction::Sha512 => "RS512",
        }
    }

    fn sign(&self, payload: &str, key: Key<'_>) -> Result<Vec<u8>> {
        let private = self.private_key(key)?;
        let payload = payload.as_bytes();

        // The RNG only blinds the private-key operation; PKCS#1 v1.5 output is deterministic.
        let mut rng = rand::thread_rng();
        let signature = match self.hash {
            HashFunction::Sha256 => SigningKey::<Sha256>::new(private).try_sign_with_rng(&mut rng, payload),
            HashFunction::Sha384 => SigningKey::<Sha384>::new(private).try_sign_with_rng(&mut rng, payload),
            HashFunction::Sha512 => SigningKey::<Sha512>::new(private).try_sign_with_rng(&mut rng, payload),
        }
        .map_err(|e| Error::InvalidKey(format!("{} signing failed: {e}", self.name())))?;

        Ok(signature.to_vec())
    }

    fn verify(&self, payload: &str, signature: &str, key: Key<'_>) -> Result<()> {
        let public = self.public_key(key)?;

        let Ok(bytes) = decode_segment(signature) else {
            trace!(alg = self.name(), "signature segment is not base64url");
            return Err(Error::BadSignature);
        };
        let signature = Signature::try_from(bytes.as_slice()).map_err(|_| Error::BadSignature)?;

        let payload = payload.as_bytes();
        let outcome = match self.hash {
            HashFunction::Sha256 => VerifyingKey::<Sha256>::new(public).verify(payload, &signature),
            HashFunction::Sha384 => VerifyingKey::<Sha384>::new(public).verify(payload, &signature),
            HashFunction::Sha512 => VerifyingKey::<Sha512>::new(public).verify(payload, &signature),
        };

        outcome.map_err(|_| Error::BadSignature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PRIVATE_PEM: &str = include_str!("../../testdata/rsa_private_pkcs1.pem");
    const PUBLIC_PEM: &str = include_str!("../../testdata/rsa_public.pem");
    const OTHER_PUBLIC_PEM: &str = include_str!("../../testdata/other_rsa_public.pem");

    const PAYLOAD: &str = "eyJ0eXAiOiJKV1QiLCJhbGciOiJSUzI1NiJ9.eyJmb28iOiJiYXIifQ";

    #[test]
    fn sign_then_verify_with_parsed_keys() {
        let private = parse_rsa_private_key_from_pem(PRIVATE_PEM.as_bytes()).unwrap();
        let public = parse_rsa_public_key_from_pem(PUBLIC_PEM.as_bytes()).unwrap();

        for alg in [RsaAlgorithm::RS256, RsaAlgorithm::RS384, RsaAlgorithm::RS512] {
            let sig = alg.sign_encoded(PAYLOAD, Key::RsaPrivate(&private)).unwrap();
            alg.verify(PAYLOAD, &sig, Key::RsaPublic(&public)).unwrap();
            alg.verify(PAYLOAD, &sig, Key::Text(PUBLIC_PEM)).unwrap();
        }
    }

    #[test]
    fn signature_is_deterministic() {
        let a = RsaAlgorithm::RS256.sign(PAYLOAD, Key::Text(PRIVATE_PEM)).unwrap();
        let b = RsaAlgorithm::RS256.sign(PAYLOAD, Key::Bytes(PRIVATE_PEM.as_bytes())).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 256);
    }

    #[test]
    fn wrong_public_key_is_bad_signature() {
        let sig = RsaAlgorithm::RS256.sign_encoded(PAYLOAD, Key::Text(PRIVATE_PEM)).unwrap();
        let err = RsaAlgorithm::RS256
            .verify(PAYLOAD, &sig, Key::Text(OTHER_PUBLIC_PEM))
            .unwrap_err();
        assert!(matches!(err, Error::BadSignature));
    }

    #[test]
    fn digest_mismatch_is_bad_signature() {
        let sig = RsaAlgorithm::RS256.sign_encoded(PAYLOAD, Key::Text(PRIVATE_PEM)).unwrap();
        let err = RsaAlgorithm::RS512
            .verify(PAYLOAD, &sig, Key::Text(PUBLIC_PEM))
            .unwrap_err();
        assert!(matches!(err, Error::BadSignature));
    }

    #[test]
    fn key_roles_are_enforced() {
        let private = parse_rsa_private_key_from_pem(PRIVATE_PEM.as_bytes()).unwrap();
        let public = parse_rsa_public_key_from_pem(PUBLIC_PEM.as_bytes()).unwrap();

        assert!(matches!(
            RsaAlgorithm::RS256.sign(PAYLOAD, Key::RsaPublic(&public)),
            Err(Error::InvalidKey(_))
        ));
        assert!(matches!(
            RsaAlgorithm::RS256.verify(PAYLOAD, "AAAA", Key::RsaPrivate(&private)),
            Err(Error::InvalidKey(_))
        ));
        // A public PEM cannot be used to sign.
        assert!(RsaAlgorithm::RS256.sign(PAYLOAD, Key::Text(PUBLIC_PEM)).is_err());
    }

    #[test]
    fn garbage_signature_is_bad_signature() {
        for sig in ["", "####", "AAAA"] {
            let err = RsaAlgorithm::RS256
                .verify(PAYLOAD, sig, Key::Text(PUBLIC_PEM))
                .unwrap_err();
            assert!(matches!(err, Error::BadSignature), "{sig:?} gave {err:?}");
        }
    }
}
