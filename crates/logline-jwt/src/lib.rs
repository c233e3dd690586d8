//! logline-jwt
//!
//! Compact signed tokens (JWT) for Logline services and clients: build a token,
//! sign it, and parse and validate it on the way back in.
//!
//! - **Algorithms**: HMAC (`HS256`, `HS384`, `HS512`) and RSA-PKCS1v1.5
//!   (`RS256`, `RS384`, `RS512`). The verifying algorithm is always chosen by the
//!   caller; the token's `alg` header is never trusted.
//! - **Keys**: HMAC secrets as bytes or strings; RSA keys as PEM (PKCS#1, PKCS#8,
//!   PKIX, X.509 certificate) or already parsed.
//! - **Validation**: signature, `exp` and `nbf` are checked in one pass and
//!   reported together as a [`ValidationErrors`] bitmask, against an injectable
//!   [`Clock`].
//!
//! ## Quick start
//! ```
//! use logline_jwt::{Algorithm, Token, parse_token};
//!
//! # fn demo() -> Result<(), logline_jwt::Error> {
//! let mut token = Token::new(Algorithm::HS256);
//! token.set_claim("sub", "user-1");
//! let wire = token.encode("super-secret-key")?;
//!
//! let parsed = parse_token(&wire, Algorithm::HS256, "super-secret-key")?.into_valid()?;
//! assert_eq!(parsed.claim("sub").and_then(|v| v.as_str()), Some("user-1"));
//! # Ok(()) }
//! # demo().unwrap();
//! ```

#![forbid(unsafe_code)]

mod algorithm;
mod clock;
mod codec;
mod error;
mod keys;
mod token;
mod validation;

pub use algorithm::{Algorithm, HashFunction, HmacAlgorithm, Key, RsaAlgorithm, SigningAlgorithm};
pub use clock::{Clock, FixedClock, SystemClock};
pub use codec::{decode_segment, encode_segment};
pub use error::{Error, Result};
pub use keys::{parse_rsa_private_key_from_pem, parse_rsa_public_key_from_pem};
pub use token::{Claims, Header, ParsedToken, Token, decode_header_unverified, parse_token};
pub use validation::{ValidationErrors, ValidationOptions, Validator};

pub use rsa::{RsaPrivateKey, RsaPublicKey};
pub use serde_json::Value;
