//! Genealogy: ancestor resolution, lineage edits and the merged tree view.
//!
//! Each side of a bird's lineage is sourced independently. At generation 1 a
//! side is either linked to another bird of the flock or declared by hand;
//! deeper generations are manual text keyed by [`AncestorPath`]. When both a
//! link and a manual name exist for the same parent, the link wins.
//!
//! - [`apply_genealogy_edit`] is a pure state transition.
//! - [`GenealogyResolver`] reads links through a [`crate::domain::FlockIndex`]
//!   and persists edits through a [`crate::domain::IndividualGateway`].

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![forbid(unsafe_code)]

mod edit;
mod resolver;

use thiserror::Error;

pub use edit::{apply_genealogy_edit, GenealogyEdit, LineageMode};
pub use resolver::{resolve_ancestor, AncestorTree, AncestorView, GenealogyResolver};

use crate::domain::{AncestorPath, AncestryError, IndividualId, RepositoryError, Side};

/// Errors from lineage edits and ancestor resolution.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GenealogyError {
    #[error(transparent)]
    InvalidPath(#[from] AncestryError),

    /// A manual entry was submitted under the wrong side
    #[error("ancestor path '{path}' does not belong to the {side} side")]
    SideMismatch { path: AncestorPath, side: Side },

    /// A linked chain leads back to a bird already on it
    #[error("cyclic ancestry: '{individual}' reappears at path '{path}'")]
    CyclicAncestry {
        path: AncestorPath,
        individual: IndividualId,
    },

    /// Requested tree depth is out of range
    #[error("tree depth {depth} is out of range (1..={max})")]
    InvalidDepth { depth: usize, max: usize },

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl GenealogyError {
    /// Whether the breeder can fix this by correcting their input.
    #[must_use]
    pub const fn is_user_correctable(&self) -> bool {
        matches!(
            self,
            Self::InvalidPath(_) | Self::SideMismatch { .. } | Self::InvalidDepth { .. }
        )
    }
}
