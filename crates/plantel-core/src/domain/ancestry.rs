//! Ancestor path codec
//!
//! An ancestor path is a string over `{f, m}` read from the subject bird
//! outwards: `"f"` is the father, `"fm"` the father's mother, `"ffm"` the
//! father's father's mother. The length of the path is the generation.
//!
//! Paths are validated once, in [`AncestorPath::parse`]. Everything that
//! stores ancestors keys its maps by [`AncestorPath`], so an invalid path
//! cannot reach them.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![forbid(unsafe_code)]

use std::{collections::BTreeSet, sync::LazyLock};

use itertools::Itertools;
use regex::Regex;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use thiserror::Error;

/// Deepest generation a lineage may declare.
pub const MAX_DEPTH: usize = 6;

static PATH_PATTERN: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new("^[fm]{1,6}$").ok());

/// Errors from decoding ancestor paths.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AncestryError {
    /// Path has the wrong alphabet or depth
    #[error("invalid ancestor path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },
}

impl AncestryError {
    /// Create an `InvalidPath` error
    #[must_use]
    pub fn invalid_path(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidPath {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

/// Parental side of a lineage step.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Side {
    Father,
    Mother,
}

impl Side {
    /// The path character for this side.
    #[must_use]
    pub const fn as_char(self) -> char {
        match self {
            Self::Father => 'f',
            Self::Mother => 'm',
        }
    }

    /// Decode a path character.
    #[must_use]
    pub const fn from_char(c: char) -> Option<Self> {
        match c {
            'f' => Some(Self::Father),
            'm' => Some(Self::Mother),
            _ => None,
        }
    }

    /// The other parent.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Father => Self::Mother,
            Self::Mother => Self::Father,
        }
    }

    /// Both sides, father first.
    pub const ALL: [Self; 2] = [Self::Father, Self::Mother];
}

// ============================================================================
// CODEC FUNCTIONS
// ============================================================================

/// Explain why `path` is not a valid ancestor path.
fn validate_path(path: &str) -> Result<(), AncestryError> {
    if path.is_empty() {
        return Err(AncestryError::invalid_path(path, "path cannot be empty"));
    }

    if let Some(bad) = path.chars().find(|c| Side::from_char(*c).is_none()) {
        return Err(AncestryError::invalid_path(
            path,
            format!("unexpected character '{}', only 'f' and 'm' are allowed", bad.escape_debug()),
        ));
    }

    let depth = path.len();
    if depth > MAX_DEPTH {
        return Err(AncestryError::invalid_path(
            path,
            format!("depth {depth} exceeds the maximum of {MAX_DEPTH} generations"),
        ));
    }

    Ok(())
}

/// True iff `path` matches `^[fm]{1,6}$`.
#[must_use]
pub fn is_valid_path(path: &str) -> bool {
    PATH_PATTERN
        .as_ref()
        .map_or_else(|| validate_path(path).is_ok(), |re| re.is_match(path))
}

/// Generation depth of `path`.
///
/// # Errors
///
/// Returns `AncestryError::InvalidPath` if `path` is not valid.
pub fn depth_of(path: &str) -> Result<usize, AncestryError> {
    validate_path(path).map(|()| path.len())
}

/// Side of the first step of `path`.
///
/// # Errors
///
/// Returns `AncestryError::InvalidPath` if `path` is empty or not valid.
pub fn side_of(path: &str) -> Result<Side, AncestryError> {
    AncestorPath::parse(path).map(|p| p.side())
}

/// Every path of exactly `depth` generations, in lexicographic order.
///
/// # Errors
///
/// Returns `AncestryError::InvalidPath` if `depth` is outside `1..=6`.
pub fn all_paths_at_depth(depth: usize) -> Result<BTreeSet<AncestorPath>, AncestryError> {
    check_depth(depth)?;
    Ok(std::iter::repeat(Side::ALL)
        .take(depth)
        .multi_cartesian_product()
        .map(|steps| AncestorPath(steps.into_iter().map(Side::as_char).collect()))
        .collect())
}

/// Every path from generation 1 through `depth`, shallowest first.
///
/// # Errors
///
/// Returns `AncestryError::InvalidPath` if `depth` is outside `1..=6`.
pub fn all_paths_up_to_depth(depth: usize) -> Result<Vec<AncestorPath>, AncestryError> {
    check_depth(depth)?;
    (1..=depth)
        .map(all_paths_at_depth)
        .flatten_ok()
        .collect()
}

/// Number of ancestor slots in a full tree of `depth` generations, `2^(n+1) - 2`.
///
/// # Errors
///
/// Returns `AncestryError::InvalidPath` if `depth` is outside `1..=6`.
pub fn tree_key_count(depth: usize) -> Result<usize, AncestryError> {
    check_depth(depth)?;
    Ok((1_usize << (depth + 1)) - 2)
}

fn check_depth(depth: usize) -> Result<(), AncestryError> {
    if depth == 0 || depth > MAX_DEPTH {
        return Err(AncestryError::invalid_path(
            format!("<depth {depth}>"),
            format!("depth must be between 1 and {MAX_DEPTH}"),
        ));
    }
    Ok(())
}

// ============================================================================
// ANCESTOR PATH
// ============================================================================

/// A validated ancestor path.
///
/// # Guarantees
///
/// - 1-6 characters
/// - Only `f` and `m`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AncestorPath(String);

impl AncestorPath {
    /// Parse and validate a path.
    ///
    /// # Errors
    ///
    /// Returns `AncestryError::InvalidPath` if the path is empty, longer than
    /// six generations or contains anything but `f` and `m`.
    pub fn parse(s: impl Into<String>) -> Result<Self, AncestryError> {
        let s = s.into();
        validate_path(&s)?;
        Ok(Self(s))
    }

    /// The generation-1 path for a side (`"f"` or `"m"`).
    #[must_use]
    pub fn root(side: Side) -> Self {
        Self(side.as_char().to_string())
    }

    /// Generation of this path (1 = parent).
    #[must_use]
    pub fn depth(&self) -> usize {
        self.0.len()
    }

    /// Side of the first step.
    #[must_use]
    pub fn side(&self) -> Side {
        match self.0.as_bytes().first() {
            Some(b'm') => Side::Mother,
            _ => Side::Father,
        }
    }

    /// Side of the last step (the sex of the ancestor this path names).
    #[must_use]
    pub fn last_side(&self) -> Side {
        match self.0.as_bytes().last() {
            Some(b'm') => Side::Mother,
            _ => Side::Father,
        }
    }

    /// Whether this is a generation-1 path.
    #[must_use]
    pub fn is_parent(&self) -> bool {
        self.depth() == 1
    }

    /// Extend the path one generation outwards; `None` beyond the maximum depth.
    #[must_use]
    pub fn child(&self, side: Side) -> Option<Self> {
        (self.depth() < MAX_DEPTH).then(|| {
            let mut next = self.0.clone();
            next.push(side.as_char());
            Self(next)
        })
    }

    /// Drop the outermost step; `None` for generation-1 paths.
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        (self.depth() > 1).then(|| Self(self.0[..self.0.len() - 1].to_string()))
    }

    /// The path seen from the first ancestor on it, `"ffm"` becomes `"fm"`.
    ///
    /// `None` for generation-1 paths.
    #[must_use]
    pub fn relative_to_first(&self) -> Option<Self> {
        (self.depth() > 1).then(|| Self(self.0[1..].to_string()))
    }

    /// Underlying string
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for AncestorPath {
    type Error = AncestryError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(s)
    }
}

impl TryFrom<&str> for AncestorPath {
    type Error = AncestryError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        Self::parse(s)
    }
}

impl From<AncestorPath> for String {
    fn from(value: AncestorPath) -> Self {
        value.0
    }
}

impl std::str::FromStr for AncestorPath {
    type Err = AncestryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl std::fmt::Display for AncestorPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
