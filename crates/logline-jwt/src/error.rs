//! Error types.

use thiserror::Error;

use crate::ValidationErrors;

/// Crate result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by this crate.
#[derive(Debug, Error)]
pub enum Error {
    /// The key's shape does not match what the algorithm requires.
    #[error("the key is invalid or of invalid type: {0}")]
    InvalidKey(String),

    /// The requested hash function is not supported.
    #[error("the hashing algorithm is not available: {0}")]
    HashUnavailable(String),

    /// A signature was present but did not verify.
    #[error("the signature doesn't match")]
    BadSignature,

    /// The wire string is not three well-formed segments.
    #[error("the token is malformed: {0}")]
    TokenMalformed(String),

    /// Input is not valid unpadded base64url.
    #[error("malformed base64url encoding: {0}")]
    MalformedEncoding(#[from] base64::DecodeError),

    /// No PEM block was found in the key material.
    #[error("invalid key: key must be PEM encoded PKCS1 or PKCS8 private key, or PKIX public key")]
    KeyMustBePemEncoded,

    /// The PEM block holds a private key of another family.
    #[error("key is not a valid RSA private key")]
    NotRsaPrivateKey,

    /// The PEM block holds a public key of another family.
    #[error("key is not a valid RSA public key")]
    NotRsaPublicKey,

    /// The PEM block could not be parsed in any accepted form.
    #[error("failed to parse key material: {0}")]
    KeyParse(String),

    /// The algorithm name is not one of the registered names.
    #[error("unsupported JWT algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// The token parsed but failed signature or temporal validation.
    #[error("the token is invalid: {0}")]
    Validation(ValidationErrors),

    /// JSON serialization or parsing error.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// True when the key material itself was rejected, as opposed to a
    /// signature that failed to verify. Points at the caller, not the token.
    pub fn is_key_error(&self) -> bool {
        matches!(
            self,
            Error::InvalidKey(_)
                | Error::KeyMustBePemEncoded
                | Error::NotRsaPrivateKey
                | Error::NotRsaPublicKey
                | Error::KeyParse(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_errors_are_told_apart_from_bad_signatures() {
        assert!(Error::InvalidKey("rsa private key".into()).is_key_error());
        assert!(Error::KeyMustBePemEncoded.is_key_error());
        assert!(Error::NotRsaPublicKey.is_key_error());
        assert!(Error::KeyParse("truncated".into()).is_key_error());
        assert!(!Error::BadSignature.is_key_error());
        assert!(!Error::TokenMalformed("2 segments".into()).is_key_error());
    }
}
