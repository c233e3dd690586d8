//! Signature and temporal-claim validation.

use std::fmt;
use std::ops::{BitOr, BitOrAssign};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::algorithm::{Algorithm, Key, SigningAlgorithm};
use crate::clock::{Clock, SystemClock};
use crate::token::{ParsedToken, RawToken};
use crate::Result;

/// Bitmask of failed validation checks.
///
/// Checks are independent, so several bits may be set at once. An empty mask
/// means the token is fully valid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ValidationErrors(u32);

impl ValidationErrors {
    /// No check failed.
    pub const NONE: Self = Self(0);
    /// The signature did not verify.
    pub const BAD_SIGNATURE: Self = Self(1);
    /// `exp` is in the past.
    pub const EXPIRED: Self = Self(1 << 1);
    /// `nbf` is in the future.
    pub const NOT_YET_VALID: Self = Self(1 << 2);

    const ALL: [Self; 3] = [Self::BAD_SIGNATURE, Self::EXPIRED, Self::NOT_YET_VALID];

    /// Raw bits.
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Build from raw bits, dropping unknown ones.
    pub const fn from_bits_truncate(bits: u32) -> Self {
        Self(bits & 0b111)
    }

    /// True when no check failed.
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// True when every bit of `other` is set.
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Set the bits of `other`.
    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }

    /// Iterate the single-bit flags that are set.
    pub fn iter(self) -> impl Iterator<Item = Self> {
        Self::ALL.into_iter().filter(move |flag| self.contains(*flag))
    }

    fn describe(self) -> &'static str {
        match self {
            Self::BAD_SIGNATURE => "signature does not verify",
            Self::EXPIRED => "token has expired",
            Self::NOT_YET_VALID => "token is not valid yet",
            _ => "unknown validation failure",
        }
    }
}

impl BitOr for ValidationErrors {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for ValidationErrors {
    fn bitor_assign(&mut self, rhs: Self) {
        self.insert(rhs);
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("the token is valid");
        }
        for (i, flag) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            f.write_str(flag.describe())?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

/// Tunables for temporal checks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationOptions {
    /// Clock skew tolerated on `exp` and `nbf`, in seconds.
    pub leeway_seconds: u64,
}

/// Parses tokens and validates them against an injected clock.
#[derive(Clone)]
pub struct Validator {
    clock: Arc<dyn Clock>,
    options: ValidationOptions,
}

impl Default for Validator {
    fn default() -> Self {
        Self {
            clock: Arc::new(SystemClock),
            options: ValidationOptions::default(),
        }
    }
}

impl fmt::Debug for Validator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Validator")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl Validator {
    /// Validator on the system clock with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `clock` as the source of "now".
    #[must_use]
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// Replace the options.
    #[must_use]
    pub fn with_options(mut self, options: ValidationOptions) -> Self {
        self.options = options;
        self
    }

    /// Current options.
    pub fn options(&self) -> &ValidationOptions {
        &self.options
    }

    /// Parse and validate a token.
    ///
    /// `algorithm` and `key` are always the caller's; the header's `alg` is
    /// not consulted. A token that parses is returned even when validation
    /// fails: check [`ParsedToken::validation`] or call
    /// [`ParsedToken::into_valid`] before trusting it.
    ///
    /// # Errors
    /// `TokenMalformed` when the input is not three segments or the header or
    /// claims segment is not base64url JSON. No signature check is attempted
    /// in that case.
    pub fn parse<'k>(
        &self,
        token: &str,
        algorithm: Algorithm,
        key: impl Into<Key<'k>>,
    ) -> Result<ParsedToken> {
        let raw = RawToken::split(token)?;
        let errors = self.check(&raw, algorithm, key.into());

        if errors.is_empty() {
            debug!(alg = algorithm.name(), "token validated");
        } else {
            debug!(alg = algorithm.name(), errors = errors.bits(), "token failed validation: {errors}");
        }

        Ok(ParsedToken::new(token, algorithm, raw, errors))
    }

    fn check(&self, raw: &RawToken<'_>, algorithm: Algorithm, key: Key<'_>) -> ValidationErrors {
        let mut errors = ValidationErrors::NONE;

        if let Err(e) = algorithm.verify(raw.signing_input, raw.signature, key) {
            if e.is_key_error() {
                warn!(alg = algorithm.name(), "verification key rejected: {e}");
            } else {
                debug!(alg = algorithm.name(), "signature check failed: {e}");
            }
            errors |= ValidationErrors::BAD_SIGNATURE;
        }

        let now = self.clock.now();
        let leeway = i64::try_from(self.options.leeway_seconds).unwrap_or(i64::MAX);

        if let Some(exp) = numeric_claim(&raw.claims, "exp") {
            if now > exp.saturating_add(leeway) {
                errors |= ValidationErrors::EXPIRED;
            }
        }

        if let Some(nbf) = numeric_claim(&raw.claims, "nbf") {
            if now < nbf.saturating_sub(leeway) {
                errors |= ValidationErrors::NOT_YET_VALID;
            }
        }

        errors
    }
}

/// A numeric claim as whole Unix seconds. Fractions are truncated.
#[allow(clippy::cast_possible_truncation)]
pub(crate) fn numeric_claim(claims: &Map<String, Value>, name: &str) -> Option<i64> {
    match claims.get(name)? {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        _ => None,
    }
}
