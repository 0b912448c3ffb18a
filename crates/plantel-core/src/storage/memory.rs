//! In-memory backend.
//!
//! Every write takes the single write guard, so a unit of work is validated
//! and applied without interleaving.

use std::collections::HashMap;

use async_trait::async_trait;
use itertools::Itertools;
use tokio::sync::RwLock;

use crate::domain::{
    BatchId, FlockIndex, Individual, IndividualGateway, IndividualId, RepositoryError,
    RepositoryResult, RingBatch, RingChange, RingCode, RingFilter, RingGateway, RingId, RingItem,
    RingStatusKind, UnitOfWork, WorkUnit,
};

#[derive(Debug, Default)]
struct State {
    individuals: HashMap<IndividualId, Individual>,
    rings: HashMap<RingId, RingItem>,
    batches: HashMap<BatchId, RingBatch>,
}

impl State {
    fn check_ring(&self, id: &RingId, expected: RingStatusKind) -> RepositoryResult<()> {
        let ring = self
            .rings
            .get(id)
            .ok_or_else(|| RepositoryError::not_found("ring", id))?;
        if ring.kind() == expected {
            Ok(())
        } else {
            Err(RepositoryError::concurrent_modification(format!(
                "ring '{}' is {}, expected {expected}",
                ring.code,
                ring.kind()
            )))
        }
    }
}

/// Process-local backend for tests and embedded use.
#[derive(Debug, Default)]
pub struct InMemoryBackend {
    state: RwLock<State>,
}

impl InMemoryBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored rings.
    pub async fn ring_count(&self) -> usize {
        self.state.read().await.rings.len()
    }
}

fn sorted_by_code(rings: impl Iterator<Item = RingItem>) -> Vec<RingItem> {
    rings
        .sorted_by(|a, b| a.code.cmp(&b.code).then_with(|| a.id.cmp(&b.id)))
        .collect()
}

#[async_trait]
impl FlockIndex for InMemoryBackend {
    async fn get_by_id(&self, id: &IndividualId) -> RepositoryResult<Individual> {
        self.state
            .read()
            .await
            .individuals
            .get(id)
            .cloned()
            .ok_or_else(|| RepositoryError::not_found("individual", id))
    }
}

#[async_trait]
impl IndividualGateway for InMemoryBackend {
    async fn save(&self, individual: &Individual) -> RepositoryResult<()> {
        self.state
            .write()
            .await
            .individuals
            .insert(individual.id().clone(), individual.clone());
        Ok(())
    }

    async fn save_lineage(&self, individual: &Individual) -> RepositoryResult<Individual> {
        let mut state = self.state.write().await;
        let saved = match state.individuals.get(individual.id()) {
            Some(stored) => individual
                .clone()
                .with_ring_code(stored.ring_code().cloned()),
            None => individual.clone(),
        };
        state
            .individuals
            .insert(saved.id().clone(), saved.clone());
        Ok(saved)
    }
}

#[async_trait]
impl RingGateway for InMemoryBackend {
    async fn create_batch(&self, batch: &RingBatch, items: &[RingItem]) -> RepositoryResult<()> {
        let mut state = self.state.write().await;

        if state.batches.contains_key(&batch.id) {
            return Err(RepositoryError::conflict(format!(
                "batch '{}' already exists",
                batch.id
            )));
        }
        if let Some(clash) = items.iter().find(|ring| state.rings.contains_key(&ring.id)) {
            return Err(RepositoryError::conflict(format!(
                "ring '{}' already exists",
                clash.id
            )));
        }

        state.batches.insert(batch.id.clone(), batch.clone());
        state
            .rings
            .extend(items.iter().map(|ring| (ring.id.clone(), ring.clone())));
        Ok(())
    }

    async fn create(&self, ring: &RingItem) -> RepositoryResult<()> {
        let mut state = self.state.write().await;
        if state.rings.contains_key(&ring.id) {
            return Err(RepositoryError::conflict(format!(
                "ring '{}' already exists",
                ring.id
            )));
        }
        state.rings.insert(ring.id.clone(), ring.clone());
        Ok(())
    }

    async fn update(&self, ring: &RingItem, expected: RingStatusKind) -> RepositoryResult<()> {
        let mut state = self.state.write().await;
        state.check_ring(&ring.id, expected)?;
        state.rings.insert(ring.id.clone(), ring.clone());
        Ok(())
    }

    async fn delete(&self, id: &RingId) -> RepositoryResult<()> {
        self.state
            .write()
            .await
            .rings
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| RepositoryError::not_found("ring", id))
    }

    async fn get(&self, id: &RingId) -> RepositoryResult<RingItem> {
        self.state
            .read()
            .await
            .rings
            .get(id)
            .cloned()
            .ok_or_else(|| RepositoryError::not_found("ring", id))
    }

    async fn find_by_code(&self, code: &RingCode) -> RepositoryResult<Vec<RingItem>> {
        let state = self.state.read().await;
        Ok(sorted_by_code(
            state
                .rings
                .values()
                .filter(|ring| &ring.code == code)
                .cloned(),
        ))
    }

    async fn list_by_filter(&self, filter: &RingFilter) -> RepositoryResult<Vec<RingItem>> {
        let state = self.state.read().await;
        Ok(sorted_by_code(
            state
                .rings
                .values()
                .filter(|ring| filter.matches(ring))
                .cloned(),
        ))
    }

    async fn get_batch(&self, id: &BatchId) -> RepositoryResult<RingBatch> {
        self.state
            .read()
            .await
            .batches
            .get(id)
            .cloned()
            .ok_or_else(|| RepositoryError::not_found("batch", id))
    }

    async fn list_batches(&self) -> RepositoryResult<Vec<RingBatch>> {
        let state = self.state.read().await;
        Ok(state
            .batches
            .values()
            .cloned()
            .sorted_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)))
            .collect())
    }
}

#[async_trait]
impl UnitOfWork for InMemoryBackend {
    async fn commit(&self, unit: WorkUnit) -> RepositoryResult<()> {
        let mut state = self.state.write().await;

        // Validate everything before the first write
        state.check_ring(unit.ring.ring_id(), unit.ring.expected())?;
        if let Some(update) = &unit.ring_code {
            if !state.individuals.contains_key(&update.individual) {
                return Err(RepositoryError::not_found("individual", &update.individual));
            }
        }

        match unit.ring {
            RingChange::Update { ring, .. } => {
                state.rings.insert(ring.id.clone(), ring);
            }
            RingChange::Delete { id, .. } => {
                state.rings.remove(&id);
            }
        }

        if let Some(update) = unit.ring_code {
            if let Some(individual) = state.individuals.remove(&update.individual) {
                state
                    .individuals
                    .insert(update.individual, individual.with_ring_code(update.code));
            }
        }

        Ok(())
    }
}
