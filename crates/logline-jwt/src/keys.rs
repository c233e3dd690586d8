//! RSA key material from PEM.
//!
//! Only the first PEM block is read and its label is not trusted; the DER
//! contents are tried against each accepted structure in turn.

use rsa::pkcs1::{self, DecodeRsaPrivateKey, DecodeRsaPublicKey};
use rsa::pkcs8::PrivateKeyInfo;
use rsa::pkcs8::spki::SubjectPublicKeyInfoRef;
use rsa::{RsaPrivateKey, RsaPublicKey};
use tracing::trace;
use x509_cert::Certificate;
use x509_cert::der::{Decode, Encode};

use crate::{Error, Result};

fn first_block(input: &[u8]) -> Result<pem::Pem> {
    pem::parse(input).map_err(|_| Error::KeyMustBePemEncoded)
}

/// Parse a PEM-encoded PKCS#1 or PKCS#8 RSA private key.
///
/// # Errors
/// `KeyMustBePemEncoded` without a PEM block, `NotRsaPrivateKey` for a PKCS#8
/// key of another family, `KeyParse` when the contents are neither form.
pub fn parse_rsa_private_key_from_pem(pem: &[u8]) -> Result<RsaPrivateKey> {
    let block = first_block(pem)?;
    let der = block.contents();

    if let Ok(key) = RsaPrivateKey::from_pkcs1_der(der) {
        return Ok(key);
    }
    trace!(tag = block.tag(), "not a PKCS#1 private key, trying PKCS#8");

    let info = PrivateKeyInfo::from_der(der)
        .map_err(|e| Error::KeyParse(format!("not a PKCS#1 or PKCS#8 private key: {e}")))?;
    if info.algorithm.oid != pkcs1::ALGORITHM_OID {
        return Err(Error::NotRsaPrivateKey);
    }

    RsaPrivateKey::try_from(info).map_err(|e| Error::KeyParse(e.to_string()))
}

/// Parse a PEM-encoded RSA public key.
///
/// Accepts a PKIX `SubjectPublicKeyInfo`, an X.509 certificate (its embedded
/// key is used), or a bare PKCS#1 `RSAPublicKey`.
///
/// # Errors
/// `KeyMustBePemEncoded` without a PEM block, `NotRsaPublicKey` when the key
/// belongs to another family, `KeyParse` when the contents match no form.
pub fn parse_rsa_public_key_from_pem(pem: &[u8]) -> Result<RsaPublicKey> {
    let block = first_block(pem)?;
    let der = block.contents();

    if let Ok(spki) = SubjectPublicKeyInfoRef::from_der(der) {
        return rsa_from_spki(spki);
    }
    trace!(tag = block.tag(), "not a PKIX public key, trying X.509 certificate");

    match Certificate::from_der(der) {
        Ok(cert) => {
            let spki_der = cert
                .tbs_certificate
                .subject_public_key_info
                .to_der()
                .map_err(|e| Error::KeyParse(e.to_string()))?;
            let spki = SubjectPublicKeyInfoRef::from_der(&spki_der)
                .map_err(|e| Error::KeyParse(e.to_string()))?;
            rsa_from_spki(spki)
        }
        Err(cert_err) => {
            trace!(tag = block.tag(), "not a certificate, trying PKCS#1 public key");
            RsaPublicKey::from_pkcs1_der(der).map_err(|_| {
                Error::KeyParse(format!("not a PKIX public key or certificate: {cert_err}"))
            })
        }
    }
}

fn rsa_from_spki(spki: SubjectPublicKeyInfoRef<'_>) -> Result<RsaPublicKey> {
    if spki.algorithm.oid != pkcs1::ALGORITHM_OID {
        return Err(Error::NotRsaPublicKey);
    }
    RsaPublicKey::try_from(spki).map_err(|e| Error::KeyParse(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rsa::traits::PublicKeyParts;

    const PKCS1_PRIVATE: &str = include_str!("../testdata/rsa_private_pkcs1.pem");
    const PKCS8_PRIVATE: &str = include_str!("../testdata/rsa_private_pkcs8.pem");
    const PKIX_PUBLIC: &str = include_str!("../testdata/rsa_public.pem");
    const PKCS1_PUBLIC: &str = include_str!("../testdata/rsa_public_pkcs1.pem");
    const CERTIFICATE: &str = include_str!("../testdata/rsa_cert.pem");
    const EC_PRIVATE: &str = include_str!("../testdata/ec_private.pem");
    const EC_PUBLIC: &str = include_str!("../testdata/ec_public.pem");

    #[test]
    fn private_key_forms_agree() {
        let pkcs1 = parse_rsa_private_key_from_pem(PKCS1_PRIVATE.as_bytes()).unwrap();
        let pkcs8 = parse_rsa_private_key_from_pem(PKCS8_PRIVATE.as_bytes()).unwrap();
        assert_eq!(pkcs1, pkcs8);
        assert_eq!(pkcs1.size(), 256);
    }

    #[test]
    fn public_key_forms_agree() {
        let pkix = parse_rsa_public_key_from_pem(PKIX_PUBLIC.as_bytes()).unwrap();
        let from_cert = parse_rsa_public_key_from_pem(CERTIFICATE.as_bytes()).unwrap();
        let pkcs1 = parse_rsa_public_key_from_pem(PKCS1_PUBLIC.as_bytes()).unwrap();
        assert_eq!(pkix, from_cert);
        assert_eq!(pkix, pkcs1);

        let private = parse_rsa_private_key_from_pem(PKCS1_PRIVATE.as_bytes()).unwrap();
        assert_eq!(pkix, private.to_public_key());
    }

    #[test]
    fn missing_pem_block() {
        assert!(matches!(
            parse_rsa_private_key_from_pem(b"not a key"),
            Err(Error::KeyMustBePemEncoded)
        ));
        assert!(matches!(
            parse_rsa_public_key_from_pem(b""),
            Err(Error::KeyMustBePemEncoded)
        ));
    }

    #[test]
    fn other_key_families_are_rejected() {
        assert!(matches!(
            parse_rsa_private_key_from_pem(EC_PRIVATE.as_bytes()),
            Err(Error::NotRsaPrivateKey)
        ));
        assert!(matches!(
            parse_rsa_public_key_from_pem(EC_PUBLIC.as_bytes()),
            Err(Error::NotRsaPublicKey)
        ));
    }

    #[test]
    fn roles_are_not_interchangeable() {
        assert!(matches!(
            parse_rsa_private_key_from_pem(PKIX_PUBLIC.as_bytes()),
            Err(Error::KeyParse(_))
        ));
        assert!(matches!(
            parse_rsa_public_key_from_pem(PKCS8_PRIVATE.as_bytes()),
            Err(Error::KeyParse(_))
        ));
    }
}
