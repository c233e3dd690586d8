//! Tokens and the compact wire format.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::debug;

use crate::algorithm::{Algorithm, Key, SigningAlgorithm};
use crate::codec::{decode_segment, encode_segment};
use crate::validation::{ValidationErrors, Validator, numeric_claim};
use crate::{Error, Result};

/// Token header fields.
pub type Header = Map<String, Value>;

/// Token claims.
pub type Claims = Map<String, Value>;

/// A token being built for signing.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    algorithm: Algorithm,
    header: Header,
    claims: Claims,
}

impl Token {
    /// New token with `{"typ": "JWT", "alg": <name>}` and no claims.
    pub fn new(algorithm: Algorithm) -> Self {
        let mut header = Header::new();
        header.insert("alg".to_string(), Value::from(algorithm.name()));
        header.insert("typ".to_string(), Value::from("JWT"));

        Self {
            algorithm,
            header,
            claims: Claims::new(),
        }
    }

    /// Algorithm the token will be signed with.
    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    /// Header fields.
    pub fn header(&self) -> &Header {
        &self.header
    }

    /// All claims.
    pub fn claims(&self) -> &Claims {
        &self.claims
    }

    /// Look up a claim. `None` means absent; a present null is `Some(Value::Null)`.
    pub fn claim(&self, name: &str) -> Option<&Value> {
        self.claims.get(name)
    }

    /// Insert or overwrite a claim.
    pub fn set_claim(&mut self, name: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.claims.insert(name.into(), value.into());
        self
    }

    /// Insert or overwrite a claim from any serializable value.
    ///
    /// # Errors
    /// `Json` when `value` cannot be represented as JSON.
    pub fn try_set_claim<T>(&mut self, name: impl Into<String>, value: &T) -> Result<&mut Self>
    where
        T: Serialize + ?Sized,
    {
        let value = serde_json::to_value(value)?;
        self.claims.insert(name.into(), value);
        Ok(self)
    }

    /// Remove a claim, returning its value if it was present.
    pub fn remove_claim(&mut self, name: &str) -> Option<Value> {
        self.claims.remove(name)
    }

    /// Set `exp` (Unix seconds).
    pub fn set_expires_at(&mut self, unix_seconds: i64) -> &mut Self {
        self.set_claim("exp", unix_seconds)
    }

    /// Set `nbf` (Unix seconds).
    pub fn set_not_before(&mut self, unix_seconds: i64) -> &mut Self {
        self.set_claim("nbf", unix_seconds)
    }

    /// The `header.claims` string the signature covers.
    ///
    /// # Errors
    /// `Json` if the header or claims cannot be serialized.
    pub fn signing_input(&self) -> Result<String> {
        let header = serde_json::to_vec(&self.header)?;
        let claims = serde_json::to_vec(&self.claims)?;
        Ok(format!("{}.{}", encode_segment(&header), encode_segment(&claims)))
    }

    /// Sign and serialize to `header.claims.signature`.
    ///
    /// # Errors
    /// `Json` on serialization failure, or the algorithm's signing error
    /// (`InvalidKey` or a key-material parsing error).
    pub fn encode<'k>(&self, key: impl Into<Key<'k>>) -> Result<String> {
        let mut wire = self.signing_input()?;
        let signature = self.algorithm.sign_encoded(&wire, key.into())?;
        wire.push('.');
        wire.push_str(&signature);
        Ok(wire)
    }
}

/// The segments of a wire token with header and claims decoded.
pub(crate) struct RawToken<'a> {
    pub(crate) signing_input: &'a str,
    pub(crate) signature: &'a str,
    pub(crate) header: Header,
    pub(crate) claims: Claims,
}

impl<'a> RawToken<'a> {
    pub(crate) fn split(token: &'a str) -> Result<Self> {
        let (header_segment, claims_segment, signature) = segments(token)?;
        let header = decode_object(header_segment, "header")?;
        let claims = decode_object(claims_segment, "claims")?;

        Ok(Self {
            signing_input: &token[..header_segment.len() + 1 + claims_segment.len()],
            signature,
            header,
            claims,
        })
    }
}

fn segments(token: &str) -> Result<(&str, &str, &str)> {
    let parts: Vec<&str> = token.split('.').collect();
    match parts.as_slice() {
        [header, claims, signature] => Ok((*header, *claims, *signature)),
        _ => {
            debug!(segments = parts.len(), "rejecting malformed token");
            Err(Error::TokenMalformed(format!(
                "expected 3 segments, found {}",
                parts.len()
            )))
        }
    }
}

fn decode_object(segment: &str, what: &str) -> Result<Map<String, Value>> {
    let bytes = decode_segment(segment)
        .map_err(|e| Error::TokenMalformed(format!("{what} segment: {e}")))?;
    serde_json::from_slice(&bytes)
        .map_err(|e| Error::TokenMalformed(format!("{what} is not a JSON object: {e}")))
}

/// Decode a token's header without verifying anything.
///
/// Useful for logging or routing. Never use it to pick the algorithm passed
/// to [`parse_token`].
///
/// # Errors
/// `TokenMalformed` when the input is not three segments or the header is not
/// base64url JSON.
pub fn decode_header_unverified(token: &str) -> Result<Header> {
    let (header, _, _) = segments(token)?;
    decode_object(header, "header")
}

/// Parse and validate a token on the system clock with default options.
///
/// See [`Validator::parse`].
///
/// # Errors
/// `TokenMalformed` for structurally invalid input.
pub fn parse_token<'k>(
    token: &str,
    algorithm: Algorithm,
    key: impl Into<Key<'k>>,
) -> Result<ParsedToken> {
    Validator::default().parse(token, algorithm, key)
}

/// A token decoded from the wire, with its validation outcome.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedToken {
    raw: String,
    algorithm: Algorithm,
    header: Header,
    claims: Claims,
    validation: ValidationErrors,
}

impl ParsedToken {
    pub(crate) fn new(
        token: &str,
        algorithm: Algorithm,
        raw: RawToken<'_>,
        validation: ValidationErrors,
    ) -> Self {
        Self {
            raw: token.to_string(),
            algorithm,
            header: raw.header,
            claims: raw.claims,
            validation,
        }
    }

    /// The wire string this token was parsed from.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// The encoded signature segment.
    pub fn signature(&self) -> &str {
        self.raw.rsplit('.').next().unwrap_or_default()
    }

    /// Algorithm the token was verified with.
    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    /// Header fields, including any extras the issuer added.
    pub fn header(&self) -> &Header {
        &self.header
    }

    /// All claims.
    pub fn claims(&self) -> &Claims {
        &self.claims
    }

    /// Look up a claim. `None` means absent; a present null is `Some(Value::Null)`.
    pub fn claim(&self, name: &str) -> Option<&Value> {
        self.claims.get(name)
    }

    /// `exp` as Unix seconds, if present and numeric.
    pub fn expires_at(&self) -> Option<i64> {
        numeric_claim(&self.claims, "exp")
    }

    /// `nbf` as Unix seconds, if present and numeric.
    pub fn not_before(&self) -> Option<i64> {
        numeric_claim(&self.claims, "nbf")
    }

    /// Failed checks; empty when the token is valid.
    pub fn validation(&self) -> ValidationErrors {
        self.validation
    }

    /// True when every check passed.
    pub fn is_valid(&self) -> bool {
        self.validation.is_empty()
    }

    /// The token, if every check passed.
    ///
    /// # Errors
    /// `Validation` carrying the failed checks.
    pub fn into_valid(self) -> Result<Self> {
        if self.is_valid() {
            Ok(self)
        } else {
            Err(Error::Validation(self.validation))
        }
    }

    /// Deserialize the claims into a typed struct.
    ///
    /// # Errors
    /// `Json` when the claims do not match `T`.
    pub fn deserialize_claims<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_value(Value::Object(self.claims.clone()))?)
    }
}
