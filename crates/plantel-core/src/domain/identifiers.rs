//! Semantic newtypes for domain identifiers and ring attributes
//!
//! # Parse-at-Boundaries Pattern
//!
//! Each type:
//! - Validates its input on construction (parse-once pattern)
//! - Trims whitespace before validation (boundary sanitization)
//! - Cannot represent invalid states
//! - Implements serde serialization/deserialization with validation
//!
//! # Types
//!
//! - [`IndividualId`] - opaque bird identifier assigned by the host application
//! - [`RingId`] / [`BatchId`] - ring and batch identifiers, generated on creation
//! - [`RingCode`] - the identifier printed on a ring
//! - [`Personalization`] - short engraved code, rendered as `ABC-123`
//! - [`RingSize`] - inner diameter in tenths of a millimetre

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// UNIFIED IDENTIFIER ERROR
// ============================================================================

/// Unified error type for identifier and attribute validation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IdentifierError {
    /// Identifier is empty or contains only whitespace
    #[error("identifier cannot be empty")]
    Empty,

    /// Identifier exceeds maximum length
    #[error("identifier too long: {actual} characters (max {max})")]
    TooLong {
        /// The maximum allowed length
        max: usize,
        /// The actual length provided
        actual: usize,
    },

    /// Identifier contains invalid characters
    #[error("identifier contains invalid characters: {details}")]
    InvalidCharacters {
        /// Human-readable explanation of what's invalid
        details: String,
    },

    /// Identifier format is invalid
    #[error("invalid identifier format: {details}")]
    InvalidFormat {
        /// Human-readable explanation of format requirements
        details: String,
    },
}

impl IdentifierError {
    /// Create an `Empty` error variant
    #[must_use]
    pub const fn empty() -> Self {
        Self::Empty
    }

    /// Create a `TooLong` error variant
    #[must_use]
    pub const fn too_long(max: usize, actual: usize) -> Self {
        Self::TooLong { max, actual }
    }

    /// Create an `InvalidCharacters` error variant
    #[must_use]
    pub fn invalid_characters(details: impl Into<String>) -> Self {
        Self::InvalidCharacters {
            details: details.into(),
        }
    }

    /// Create an `InvalidFormat` error variant
    #[must_use]
    pub fn invalid_format(details: impl Into<String>) -> Self {
        Self::InvalidFormat {
            details: details.into(),
        }
    }
}

/// Validate an opaque identifier
///
/// Rules:
/// - Must be 1-`max` characters
/// - Cannot contain control characters
fn validate_opaque(s: &str, kind: &str, max: usize) -> Result<(), IdentifierError> {
    if s.is_empty() {
        return Err(IdentifierError::empty());
    }

    let len = s.chars().count();
    if len > max {
        return Err(IdentifierError::too_long(max, len));
    }

    if s.chars().any(char::is_control) {
        return Err(IdentifierError::invalid_characters(format!(
            "{kind} '{}' must not contain control characters",
            s.escape_debug()
        )));
    }

    Ok(())
}

/// Declares an opaque, validated string identifier.
macro_rules! opaque_identifier {
    ($(#[$meta:meta])* $name:ident, $kind:literal, $max:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Maximum allowed length in characters
            pub const MAX_LENGTH: usize = $max;

            /// Parse and validate (trims whitespace first)
            ///
            /// # Errors
            ///
            /// Returns `IdentifierError` if the identifier is empty, too long
            /// or contains control characters.
            pub fn parse(s: impl Into<String>) -> Result<Self, IdentifierError> {
                let s = s.into();
                let trimmed = s.trim();
                validate_opaque(trimmed, $kind, Self::MAX_LENGTH)?;
                Ok(Self(trimmed.to_string()))
            }

            /// Get the identifier as a string slice
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Convert into an owned String
            #[must_use]
            pub fn into_string(self) -> String {
                self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = IdentifierError;

            fn try_from(s: String) -> Result<Self, Self::Error> {
                Self::parse(s)
            }
        }

        impl TryFrom<&str> for $name {
            type Error = IdentifierError;

            fn try_from(s: &str) -> Result<Self, Self::Error> {
                Self::parse(s)
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl std::str::FromStr for $name {
            type Err = IdentifierError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse(s)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

opaque_identifier!(
    /// Identifier of a bird in the breeder's flock.
    ///
    /// Opaque to this crate: the host application assigns it at creation.
    IndividualId,
    "individual id",
    128
);

opaque_identifier!(
    /// Identifier of a ring record.
    RingId,
    "ring id",
    128
);

opaque_identifier!(
    /// Identifier of a ring batch.
    BatchId,
    "batch id",
    128
);

opaque_identifier!(
    /// The identifier printed on a physical ring, e.g. `A-001` or `0042`.
    RingCode,
    "ring code",
    32
);

impl RingId {
    /// Generate a fresh random ring id.
    #[must_use]
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().simple().to_string())
    }
}

impl BatchId {
    /// Generate a fresh random batch id.
    #[must_use]
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().simple().to_string())
    }
}

// ============================================================================
// PERSONALIZATION
// ============================================================================

/// Engraved personalization code.
///
/// Input is reduced to its ASCII alphanumeric characters and uppercased.
/// The display form inserts a hyphen after the third character, so
/// `"abc12"` renders as `"ABC-12"`.
///
/// The six-character limit counts alphanumerics only, so the display form
/// can be seven characters long (`"ABC-123"`). Longer input is rejected,
/// never truncated.
///
/// # Guarantees
///
/// - 1-6 uppercase ASCII alphanumeric characters
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Personalization(String);

impl Personalization {
    /// Maximum number of alphanumeric characters
    pub const MAX_CHARS: usize = 6;

    /// Characters before the display hyphen
    const HYPHEN_AFTER: usize = 3;

    /// Normalize and validate a personalization code.
    ///
    /// # Errors
    ///
    /// Returns `IdentifierError::Empty` if nothing alphanumeric remains and
    /// `IdentifierError::TooLong` past six characters.
    pub fn parse(s: impl AsRef<str>) -> Result<Self, IdentifierError> {
        let normalized: String = s
            .as_ref()
            .chars()
            .filter(char::is_ascii_alphanumeric)
            .map(|c| c.to_ascii_uppercase())
            .collect();

        if normalized.is_empty() {
            return Err(IdentifierError::empty());
        }

        if normalized.len() > Self::MAX_CHARS {
            return Err(IdentifierError::too_long(Self::MAX_CHARS, normalized.len()));
        }

        Ok(Self(normalized))
    }

    /// The normalized characters without the hyphen.
    #[must_use]
    pub fn compact(&self) -> &str {
        &self.0
    }

    /// The display form with the hyphen after the third character.
    #[must_use]
    pub fn display_form(&self) -> String {
        if self.0.len() > Self::HYPHEN_AFTER {
            let (head, tail) = self.0.split_at(Self::HYPHEN_AFTER);
            format!("{head}-{tail}")
        } else {
            self.0.clone()
        }
    }
}

impl TryFrom<String> for Personalization {
    type Error = IdentifierError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(s)
    }
}

impl From<Personalization> for String {
    fn from(value: Personalization) -> Self {
        value.display_form()
    }
}

impl std::fmt::Display for Personalization {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_form())
    }
}

// ============================================================================
// RING SIZE
// ============================================================================

/// Ring inner diameter, stored in tenths of a millimetre.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RingSize(u16);

impl RingSize {
    /// Parse a millimetre value such as `"2.5"`, `"2,5"` or `"3"`.
    ///
    /// # Errors
    ///
    /// Returns `IdentifierError::InvalidFormat` for anything that is not a
    /// positive number with at most one decimal digit.
    pub fn parse(s: impl AsRef<str>) -> Result<Self, IdentifierError> {
        let raw = s.as_ref().trim().replace(',', ".");
        if raw.is_empty() {
            return Err(IdentifierError::empty());
        }

        let (whole, frac) = raw.split_once('.').unwrap_or((raw.as_str(), "0"));
        let invalid =
            || IdentifierError::invalid_format(format!("ring size '{raw}' must look like 2.5"));

        if whole.is_empty()
            || frac.len() != 1
            || !whole.bytes().all(|b| b.is_ascii_digit())
            || !frac.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(invalid());
        }

        let whole: u16 = whole.parse().map_err(|_| invalid())?;
        let frac: u16 = frac.parse().map_err(|_| invalid())?;
        let tenths = whole
            .checked_mul(10)
            .and_then(|w| w.checked_add(frac))
            .ok_or_else(invalid)?;

        if tenths == 0 {
            return Err(invalid());
        }

        Ok(Self(tenths))
    }

    /// Build from tenths of a millimetre.
    #[must_use]
    pub const fn from_tenths(tenths: u16) -> Self {
        Self(tenths)
    }

    /// Size in tenths of a millimetre.
    #[must_use]
    pub const fn tenths(self) -> u16 {
        self.0
    }
}

impl TryFrom<String> for RingSize {
    type Error = IdentifierError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(s)
    }
}

impl From<RingSize> for String {
    fn from(value: RingSize) -> Self {
        value.to_string()
    }
}

impl std::fmt::Display for RingSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.0 / 10, self.0 % 10)
    }
}
