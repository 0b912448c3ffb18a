//! Top-level error type for plantel.
//!
//! Errors fall into two groups:
//!
//! - **User-correctable**: malformed paths, bad ring ranges, invalid
//!   identifiers and configuration. These are reported back to the breeder.
//! - **Aborted operations**: state-machine violations and storage failures.
//!   The specific operation is abandoned and no other state changes.

use thiserror::Error;

use crate::{
    domain::{AncestryError, IdentifierError, RepositoryError},
    genealogy::GenealogyError,
    inventory::{InventoryError, RangeError},
};

/// Umbrella error for every fallible operation in the crate.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration value is missing or out of range
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// File system failure while loading configuration
    #[error("io error: {0}")]
    Io(String),

    /// Malformed configuration file
    #[error("parse error: {0}")]
    Parse(String),

    /// Logging could not be initialised
    #[error("logging setup failed: {0}")]
    Logging(String),

    #[error(transparent)]
    Identifier(#[from] IdentifierError),

    #[error(transparent)]
    Ancestry(#[from] AncestryError),

    #[error(transparent)]
    Range(#[from] RangeError),

    #[error(transparent)]
    Genealogy(#[from] GenealogyError),

    #[error(transparent)]
    Inventory(#[from] InventoryError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Result alias using the crate error.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create an invalid configuration error.
    #[must_use]
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Create an io error.
    #[must_use]
    pub fn io_error(msg: impl Into<String>) -> Self {
        Self::Io(msg.into())
    }

    /// Create a parse error.
    #[must_use]
    pub fn parse_error(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    /// Whether the breeder can fix this by correcting their input.
    #[must_use]
    pub const fn is_user_correctable(&self) -> bool {
        match self {
            Self::InvalidConfig(_)
            | Self::Parse(_)
            | Self::Identifier(_)
            | Self::Ancestry(_)
            | Self::Range(_) => true,
            Self::Genealogy(e) => e.is_user_correctable(),
            Self::Inventory(e) => e.is_user_correctable(),
            Self::Io(_) | Self::Logging(_) | Self::Repository(_) => false,
        }
    }
}
