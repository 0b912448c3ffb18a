//! Ring inventory: batches, range expansion, the ring store and binding.
//!
//! [`RingInventoryStore`] is the only writer of rings and batches.
//! [`BindingCoordinator`] is the only path that writes a ring and a bird
//! together, through [`crate::domain::UnitOfWork`].

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![forbid(unsafe_code)]

mod binding;
mod range;
mod store;

use itertools::Itertools;
use thiserror::Error;

pub use binding::{Binding, BindingCoordinator};
pub use range::{expand_range, RangeError, RingDraft};
pub use store::{BatchRegistration, RingInventoryStore, RingStats};

use crate::domain::{
    BatchId, IdentifierError, IndividualId, RepositoryError, RingCode, RingError, RingGateway,
    RingId, RingItem, RingStatusKind,
};

/// Errors from inventory operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InventoryError {
    /// Ring is not in stock
    #[error("ring {code} is not available (status: {status})")]
    RingNotAvailable {
        ring: RingId,
        code: RingCode,
        status: RingStatusKind,
    },

    #[error("individual '{0}' not found")]
    IndividualNotFound(IndividualId),

    #[error("ring '{0}' not found")]
    RingNotFound(RingId),

    #[error("batch '{0}' not found")]
    BatchNotFound(BatchId),

    /// Codes already present in the inventory
    #[error("ring code already in the inventory: {}", .codes.iter().join(", "))]
    DuplicateCode { codes: Vec<RingCode> },

    /// Change refused because the ring is bound to a bird
    #[error("ring {code} is bound to '{bird}'")]
    RingBound { code: RingCode, bird: IndividualId },

    #[error(transparent)]
    Range(#[from] RangeError),

    #[error(transparent)]
    Identifier(#[from] IdentifierError),

    #[error(transparent)]
    Ring(RingError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl InventoryError {
    /// Map a transition error of the ring `id`.
    #[must_use]
    pub fn from_ring_error(id: &RingId, err: RingError) -> Self {
        match err {
            RingError::NotAvailable { code, status } => Self::RingNotAvailable {
                ring: id.clone(),
                code,
                status,
            },
            other => Self::Ring(other),
        }
    }

    /// Whether the breeder can fix this by correcting their input.
    #[must_use]
    pub const fn is_user_correctable(&self) -> bool {
        matches!(
            self,
            Self::DuplicateCode { .. }
                | Self::Range(_)
                | Self::Identifier(_)
                | Self::Ring(RingError::MissingLossReason)
        )
    }
}

fn not_available(ring: &RingItem) -> InventoryError {
    InventoryError::RingNotAvailable {
        ring: ring.id.clone(),
        code: ring.code.clone(),
        status: ring.kind(),
    }
}

async fn load_ring(rings: &dyn RingGateway, id: &RingId) -> Result<RingItem, InventoryError> {
    rings.get(id).await.map_err(|e| match e {
        RepositoryError::NotFound(_) => InventoryError::RingNotFound(id.clone()),
        other => InventoryError::Repository(other),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_code_lists_codes() {
        let err = InventoryError::DuplicateCode {
            codes: vec![
                RingCode::parse("007").expect("valid code"),
                RingCode::parse("008").expect("valid code"),
            ],
        };
        assert_eq!(err.to_string(), "ring code already in the inventory: 007, 008");
        assert!(err.is_user_correctable());
    }

    #[test]
    fn test_not_available_maps_from_ring_error() {
        let id = RingId::generate();
        let err = InventoryError::from_ring_error(
            &id,
            RingError::NotAvailable {
                code: RingCode::parse("A-001").expect("valid code"),
                status: RingStatusKind::Usada,
            },
        );
        assert!(matches!(err, InventoryError::RingNotAvailable { ring, .. } if ring == id));
        assert!(!InventoryError::RingNotFound(RingId::generate()).is_user_correctable());
    }
}
