//! The ring inventory store.

use std::{collections::HashSet, sync::Arc};

use chrono::Utc;
use itertools::Itertools;

use super::{
    binding::BindingCoordinator, expand_range, load_ring, RangeError, RingDraft, InventoryError,
};
use crate::{
    config::{BoundRingPolicy, InventoryConfig},
    domain::{
        BatchDraft, BatchId, FlockIndex, IndividualId, RepositoryError, RingBatch, RingChange,
        RingCode, RingCodeUpdate, RingEdit, RingFilter, RingGateway, RingId, RingItem,
        RingStatusKind, UnitOfWork, WorkUnit,
    },
};

/// A registered batch and the rings it expanded to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchRegistration {
    pub batch: RingBatch,
    pub items: Vec<RingItem>,
}

/// Ring counts per status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RingStats {
    pub estoque: usize,
    pub usada: usize,
    pub perdida: usize,
}

impl RingStats {
    #[must_use]
    pub const fn total(&self) -> usize {
        self.estoque + self.usada + self.perdida
    }
}

/// Authoritative set of rings and batches.
pub struct RingInventoryStore {
    rings: Arc<dyn RingGateway>,
    units: Arc<dyn UnitOfWork>,
    flock: Arc<dyn FlockIndex>,
    binding: BindingCoordinator,
    config: InventoryConfig,
}

impl RingInventoryStore {
    /// Create a store over one backend that serves rings, birds and units of work.
    #[must_use]
    pub fn new<B>(backend: Arc<B>, config: InventoryConfig) -> Self
    where
        B: RingGateway + UnitOfWork + FlockIndex + 'static,
    {
        Self::with_gateways(
            Arc::clone(&backend) as Arc<dyn RingGateway>,
            Arc::clone(&backend) as Arc<dyn UnitOfWork>,
            backend,
            config,
        )
    }

    /// Create a store over separate gateways.
    #[must_use]
    pub fn with_gateways(
        rings: Arc<dyn RingGateway>,
        units: Arc<dyn UnitOfWork>,
        flock: Arc<dyn FlockIndex>,
        config: InventoryConfig,
    ) -> Self {
        let binding =
            BindingCoordinator::new(Arc::clone(&rings), Arc::clone(&flock), Arc::clone(&units));
        Self {
            rings,
            units,
            flock,
            binding,
            config,
        }
    }

    /// The coordinator for binds and losses on this store's gateways.
    #[must_use]
    pub const fn binding(&self) -> &BindingCoordinator {
        &self.binding
    }

    #[must_use]
    pub const fn config(&self) -> &InventoryConfig {
        &self.config
    }

    // ========================================================================
    // CREATION
    // ========================================================================

    /// Register a batch, expanding its range into rings in `estoque`.
    ///
    /// A batch with neither bound is stored with no rings. The batch and its
    /// rings are persisted in one call.
    ///
    /// # Errors
    ///
    /// - `Range` if only one bound is given or the range is invalid or too large
    /// - `DuplicateCode` if uniqueness is enforced and a code already exists
    /// - `Repository` on storage failure
    pub async fn register_batch(
        &self,
        draft: BatchDraft,
    ) -> Result<BatchRegistration, InventoryError> {
        let id = BatchId::generate();
        let drafts = match (
            present(draft.start_number.as_deref()),
            present(draft.end_number.as_deref()),
        ) {
            (Some(start), Some(end)) => expand_range(
                start,
                end,
                &draft.attributes(),
                Some(&id),
                self.config.range_ceiling,
            )?,
            (None, None) => Vec::new(),
            (start, end) => {
                return Err(RangeError::InvalidRange {
                    start: start.unwrap_or_default().to_string(),
                    end: end.unwrap_or_default().to_string(),
                    reason: "both start and end numbers are required".to_string(),
                }
                .into());
            }
        };

        // Best-effort: nothing holds these codes until create_batch runs.
        if !drafts.is_empty() {
            let existing: HashSet<RingCode> = self
                .rings
                .list_by_filter(&RingFilter::default())
                .await?
                .into_iter()
                .map(|ring| ring.code)
                .collect();
            let duplicates: Vec<RingCode> = drafts
                .iter()
                .filter(|d| existing.contains(&d.code))
                .map(|d| d.code.clone())
                .collect();
            self.check_duplicates(duplicates)?;
        }

        let now = Utc::now();
        let items: Vec<RingItem> = drafts
            .into_iter()
            .map(|d| d.into_item(RingId::generate(), now))
            .collect();
        let expanded = u32::try_from(items.len()).ok().filter(|n| *n > 0);
        let batch = RingBatch::from_draft(id, draft, expanded, now);

        self.rings.create_batch(&batch, &items).await?;

        tracing::info!(
            batch = %batch.id,
            supplier = %batch.supplier,
            rings = items.len(),
            "Ring batch registered"
        );

        Ok(BatchRegistration { batch, items })
    }

    /// Add a single ring by hand.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateCode` if uniqueness is enforced and the code exists,
    /// or `Repository` on storage failure.
    pub async fn add_ring(&self, draft: RingDraft) -> Result<RingItem, InventoryError> {
        let existing = self.rings.find_by_code(&draft.code).await?;
        if !existing.is_empty() {
            self.check_duplicates(vec![draft.code.clone()])?;
        }

        let ring = draft.into_item(RingId::generate(), Utc::now());
        self.rings.create(&ring).await?;

        tracing::info!(ring = %ring.code, "Ring added");
        Ok(ring)
    }

    fn check_duplicates(&self, duplicates: Vec<RingCode>) -> Result<(), InventoryError> {
        if duplicates.is_empty() {
            return Ok(());
        }
        if self.config.enforce_unique_codes {
            return Err(InventoryError::DuplicateCode { codes: duplicates });
        }
        tracing::warn!(
            codes = %duplicates.iter().join(", "),
            "Accepting duplicate ring codes"
        );
        Ok(())
    }

    // ========================================================================
    // UPDATES
    // ========================================================================

    /// Edit a ring's code, color or personalization. The status never changes.
    ///
    /// A code edit on a `usada` ring follows the bound-ring policy.
    ///
    /// # Errors
    ///
    /// - `RingNotFound` if the ring is missing
    /// - `RingBound` under the `forbid` policy
    /// - `DuplicateCode` if the new code exists and uniqueness is enforced
    /// - `Repository` on storage failure
    pub async fn edit(&self, ring_id: &RingId, edit: &RingEdit) -> Result<RingItem, InventoryError> {
        let ring = load_ring(self.rings.as_ref(), ring_id).await?;
        if edit.is_empty() {
            return Ok(ring);
        }

        let edited = ring.edit(edit);
        let code_changed = edited.code != ring.code;

        if code_changed {
            let clashes = self.rings.find_by_code(&edited.code).await?;
            if clashes.iter().any(|other| other.id != ring.id) {
                self.check_duplicates(vec![edited.code.clone()])?;
            }
        }

        let cascade_to = match (ring.assigned_bird_id(), code_changed) {
            (Some(bird), true) => self.bound_ring_target(&ring, bird).await?,
            _ => None,
        };

        let change = RingChange::Update {
            ring: edited.clone(),
            expected: ring.kind(),
        };
        match cascade_to {
            Some(individual) => {
                self.commit(
                    ring_id,
                    WorkUnit {
                        ring: change,
                        ring_code: Some(RingCodeUpdate {
                            individual,
                            code: Some(edited.code.clone()),
                        }),
                    },
                )
                .await?;
            }
            None => {
                self.rings
                    .update(&edited, ring.kind())
                    .await
                    .map_err(|e| ring_write_error(ring_id, e))?;
            }
        }

        tracing::debug!(ring = %edited.code, previous = %ring.code, "Ring edited");
        Ok(edited)
    }

    /// Hard-delete a ring. Deleting a `usada` ring follows the bound-ring policy.
    ///
    /// # Errors
    ///
    /// - `RingNotFound` if the ring is missing
    /// - `RingBound` under the `forbid` policy
    /// - `Repository` on storage failure
    pub async fn delete(&self, ring_id: &RingId) -> Result<RingItem, InventoryError> {
        let ring = load_ring(self.rings.as_ref(), ring_id).await?;

        let cascade_to = match ring.assigned_bird_id() {
            Some(bird) => self.bound_ring_target(&ring, bird).await?,
            None => None,
        };

        match cascade_to {
            Some(individual) => {
                self.commit(
                    ring_id,
                    WorkUnit {
                        ring: RingChange::Delete {
                            id: ring.id.clone(),
                            expected: ring.kind(),
                        },
                        ring_code: Some(RingCodeUpdate {
                            individual,
                            code: None,
                        }),
                    },
                )
                .await?;
            }
            None => {
                self.rings
                    .delete(ring_id)
                    .await
                    .map_err(|e| ring_write_error(ring_id, e))?;
            }
        }

        tracing::info!(ring = %ring.code, status = %ring.kind(), "Ring deleted");
        Ok(ring)
    }

    /// Report a ring lost. See [`BindingCoordinator::mark_lost`].
    ///
    /// # Errors
    ///
    /// See [`BindingCoordinator::mark_lost`].
    pub async fn mark_lost(&self, ring_id: &RingId, reason: &str) -> Result<RingItem, InventoryError> {
        self.binding.mark_lost(ring_id, reason).await
    }

    /// Apply the bound-ring policy to a change of a `usada` ring.
    ///
    /// Returns the bird whose display code must change with the ring, if any.
    async fn bound_ring_target(
        &self,
        ring: &RingItem,
        bird: &IndividualId,
    ) -> Result<Option<IndividualId>, InventoryError> {
        match self.config.bound_ring_policy {
            BoundRingPolicy::KeepStale => Ok(None),
            BoundRingPolicy::Forbid => Err(InventoryError::RingBound {
                code: ring.code.clone(),
                bird: bird.clone(),
            }),
            BoundRingPolicy::Cascade => match self.flock.get_by_id(bird).await {
                Ok(individual) if individual.ring_code() == Some(&ring.code) => {
                    Ok(Some(bird.clone()))
                }
                Ok(_) => {
                    tracing::debug!(
                        ring = %ring.code,
                        individual = %bird,
                        "Bird shows another ring, display code left alone"
                    );
                    Ok(None)
                }
                Err(RepositoryError::NotFound(_)) => {
                    tracing::warn!(
                        ring = %ring.code,
                        individual = %bird,
                        "Bound bird missing, skipping display code cascade"
                    );
                    Ok(None)
                }
                Err(e) => Err(e.into()),
            },
        }
    }

    async fn commit(&self, ring_id: &RingId, unit: WorkUnit) -> Result<(), InventoryError> {
        self.units
            .commit(unit)
            .await
            .map_err(|e| ring_write_error(ring_id, e))
    }

    // ========================================================================
    // QUERIES
    // ========================================================================

    /// # Errors
    ///
    /// Returns `RingNotFound` if the ring is missing.
    pub async fn get(&self, ring_id: &RingId) -> Result<RingItem, InventoryError> {
        load_ring(self.rings.as_ref(), ring_id).await
    }

    /// # Errors
    ///
    /// Returns `Repository` on storage failure.
    pub async fn find_by_code(&self, code: &RingCode) -> Result<Vec<RingItem>, InventoryError> {
        Ok(self.rings.find_by_code(code).await?)
    }

    /// Rings matching `filter`, ordered by code.
    ///
    /// # Errors
    ///
    /// Returns `Repository` on storage failure.
    pub async fn list(&self, filter: &RingFilter) -> Result<Vec<RingItem>, InventoryError> {
        Ok(self.rings.list_by_filter(filter).await?)
    }

    /// # Errors
    ///
    /// Returns `BatchNotFound` if the batch is missing.
    pub async fn get_batch(&self, id: &BatchId) -> Result<RingBatch, InventoryError> {
        self.rings.get_batch(id).await.map_err(|e| match e {
            RepositoryError::NotFound(_) => InventoryError::BatchNotFound(id.clone()),
            other => other.into(),
        })
    }

    /// # Errors
    ///
    /// Returns `Repository` on storage failure.
    pub async fn list_batches(&self) -> Result<Vec<RingBatch>, InventoryError> {
        Ok(self.rings.list_batches().await?)
    }

    /// Ring counts per status.
    ///
    /// # Errors
    ///
    /// Returns `Repository` on storage failure.
    pub async fn stats(&self) -> Result<RingStats, InventoryError> {
        let counts = self
            .rings
            .list_by_filter(&RingFilter::default())
            .await?
            .iter()
            .counts_by(RingItem::kind);
        let count = |kind| counts.get(&kind).copied().unwrap_or_default();

        Ok(RingStats {
            estoque: count(RingStatusKind::Estoque),
            usada: count(RingStatusKind::Usada),
            perdida: count(RingStatusKind::Perdida),
        })
    }
}

/// A blank bound counts as absent. Any other value is passed on untouched.
fn present(bound: Option<&str>) -> Option<&str> {
    bound.filter(|s| !s.trim().is_empty())
}

fn ring_write_error(ring_id: &RingId, err: RepositoryError) -> InventoryError {
    match err {
        RepositoryError::NotFound(_) => InventoryError::RingNotFound(ring_id.clone()),
        other => InventoryError::Repository(other),
    }
}
