//! Binding a ring to a bird, and reporting rings lost.
//!
//! A bind writes two aggregates: the ring becomes `usada` and the bird's
//! display code becomes the ring's code. Both writes go through one
//! [`WorkUnit`] guarded by the ring's expected status, so of two concurrent
//! binds on the same ring exactly one commits.

use std::sync::Arc;

use chrono::Utc;

use super::{load_ring, not_available, InventoryError};
use crate::domain::{
    FlockIndex, Individual, IndividualId, RepositoryError, RingChange, RingCodeUpdate, RingError,
    RingGateway, RingId, RingItem, RingStatusKind, UnitOfWork, WorkUnit,
};

/// Outcome of a successful bind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub ring: RingItem,
    pub individual: Individual,
}

/// Coordinates writes that span a ring and a bird.
#[derive(Clone)]
pub struct BindingCoordinator {
    rings: Arc<dyn RingGateway>,
    flock: Arc<dyn FlockIndex>,
    units: Arc<dyn UnitOfWork>,
}

impl BindingCoordinator {
    #[must_use]
    pub fn new(
        rings: Arc<dyn RingGateway>,
        flock: Arc<dyn FlockIndex>,
        units: Arc<dyn UnitOfWork>,
    ) -> Self {
        Self {
            rings,
            flock,
            units,
        }
    }

    /// Bind a ring in stock to a bird of the flock.
    ///
    /// # Errors
    ///
    /// - `RingNotFound` / `IndividualNotFound` if either side is missing
    /// - `RingNotAvailable` if the ring is not in `estoque`, including when
    ///   another bind committed first
    /// - `Repository` on storage failure
    ///
    /// Nothing is written on error.
    pub async fn bind(
        &self,
        ring_id: &RingId,
        individual_id: &IndividualId,
    ) -> Result<Binding, InventoryError> {
        let ring = load_ring(self.rings.as_ref(), ring_id).await?;
        if !ring.is_available() {
            return Err(not_available(&ring));
        }

        let individual = self.flock.get_by_id(individual_id).await.map_err(|e| match e {
            RepositoryError::NotFound(_) => InventoryError::IndividualNotFound(individual_id.clone()),
            other => InventoryError::Repository(other),
        })?;

        let bound = ring
            .bind(&individual, Utc::now())
            .map_err(|e| InventoryError::from_ring_error(ring_id, e))?;
        let individual = individual.with_ring_code(Some(bound.code.clone()));

        let unit = WorkUnit {
            ring: RingChange::Update {
                ring: bound.clone(),
                expected: RingStatusKind::Estoque,
            },
            ring_code: Some(RingCodeUpdate {
                individual: individual_id.clone(),
                code: Some(bound.code.clone()),
            }),
        };

        match self.units.commit(unit).await {
            Ok(()) => {}
            Err(RepositoryError::ConcurrentModification(_)) => {
                let current = load_ring(self.rings.as_ref(), ring_id).await?;
                tracing::debug!(ring = %current.code, status = %current.kind(), "Lost bind race");
                return Err(not_available(&current));
            }
            Err(RepositoryError::NotFound(_)) => {
                // Either side vanished between the reads and the commit
                load_ring(self.rings.as_ref(), ring_id).await?;
                return Err(InventoryError::IndividualNotFound(individual_id.clone()));
            }
            Err(e) => return Err(e.into()),
        }

        tracing::info!(ring = %bound.code, individual = %individual_id, "Ring bound");

        Ok(Binding {
            ring: bound,
            individual,
        })
    }

    /// Report a ring lost or retired.
    ///
    /// The bird the ring was bound to keeps its display code.
    ///
    /// # Errors
    ///
    /// - `RingNotFound` if the ring is missing
    /// - `Ring(MissingLossReason)` for a blank reason
    /// - `Ring(AlreadyLost)` if the ring is already `perdida`
    /// - `Repository` on storage failure, including a concurrent status change
    pub async fn mark_lost(&self, ring_id: &RingId, reason: &str) -> Result<RingItem, InventoryError> {
        let ring = load_ring(self.rings.as_ref(), ring_id).await?;
        let lost = ring
            .mark_lost(reason, Utc::now())
            .map_err(|e| InventoryError::from_ring_error(ring_id, e))?;

        let unit = WorkUnit::ring_only(RingChange::Update {
            ring: lost.clone(),
            expected: ring.kind(),
        });

        match self.units.commit(unit).await {
            Ok(()) => {}
            Err(RepositoryError::ConcurrentModification(msg)) => {
                let current = load_ring(self.rings.as_ref(), ring_id).await?;
                if current.kind().is_terminal() {
                    return Err(InventoryError::Ring(RingError::AlreadyLost(current.code)));
                }
                return Err(RepositoryError::ConcurrentModification(msg).into());
            }
            Err(RepositoryError::NotFound(_)) => {
                return Err(InventoryError::RingNotFound(ring_id.clone()));
            }
            Err(e) => return Err(e.into()),
        }

        tracing::info!(
            ring = %lost.code,
            previous = %ring.kind(),
            reason = lost.status.lost_reason().unwrap_or_default(),
            "Ring marked lost"
        );

        Ok(lost)
    }
}
