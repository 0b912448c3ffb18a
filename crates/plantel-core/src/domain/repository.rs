//! Repository trait interfaces for the persistence boundary.
//!
//! # Gateways
//!
//! - [`FlockIndex`] - read-only lookup of individuals, used to resolve links
//! - [`IndividualGateway`] - persists individuals after lineage edits
//! - [`RingGateway`] - CRUD and filtered listing for rings and batches
//! - [`UnitOfWork`] - applies a ring change and an individual's display code
//!   change together, or neither
//!
//! Implementations live in [`crate::storage`]. Business logic depends on the
//! traits only.
//!
//! # Optimistic checks
//!
//! Ring writes carry the status the caller read. An implementation must
//! refuse the write with `ConcurrentModification` when the stored status no
//! longer matches, so two binds racing for one ring cannot both succeed.

#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![forbid(unsafe_code)]

use async_trait::async_trait;

use crate::domain::{
    aggregates::{Individual, RingBatch, RingItem, RingStatusKind},
    identifiers::{BatchId, IndividualId, RingCode, RingId},
};

// ============================================================================
// SHARED ERROR TYPES
// ============================================================================

/// Common errors across all repository operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RepositoryError {
    /// Entity not found in repository
    #[error("entity not found: {0}")]
    NotFound(String),

    /// Conflict with existing data (duplicate, constraint violation)
    #[error("conflict: {0}")]
    Conflict(String),

    /// Invalid input for domain operation
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Underlying storage failure
    #[error("storage error: {0}")]
    StorageError(String),

    /// Stored state changed since it was read
    #[error("concurrent modification: {0}")]
    ConcurrentModification(String),
}

impl RepositoryError {
    /// Create a not found error
    #[must_use]
    pub fn not_found(entity: &str, id: impl std::fmt::Display) -> Self {
        Self::NotFound(format!("{entity} '{id}'"))
    }

    /// Create a conflict error
    #[must_use]
    pub fn conflict(reason: impl Into<String>) -> Self {
        Self::Conflict(reason.into())
    }

    /// Create an invalid input error
    #[must_use]
    pub fn invalid_input(reason: impl Into<String>) -> Self {
        Self::InvalidInput(reason.into())
    }

    /// Create a storage error
    #[must_use]
    pub fn storage_error(reason: impl Into<String>) -> Self {
        Self::StorageError(reason.into())
    }

    /// Create a concurrent modification error
    #[must_use]
    pub fn concurrent_modification(reason: impl Into<String>) -> Self {
        Self::ConcurrentModification(reason.into())
    }

    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Result type alias for repository operations
pub type RepositoryResult<T> = Result<T, RepositoryError>;

// ============================================================================
// FILTERS AND UNITS OF WORK
// ============================================================================

/// Ring listing filter. Set fields are AND-combined; species compares
/// ASCII case-insensitively.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RingFilter {
    pub status: Option<RingStatusKind>,
    pub year: Option<u16>,
    pub species: Option<String>,
}

impl RingFilter {
    #[must_use]
    pub const fn with_status(mut self, status: RingStatusKind) -> Self {
        self.status = Some(status);
        self
    }

    #[must_use]
    pub const fn with_year(mut self, year: u16) -> Self {
        self.year = Some(year);
        self
    }

    #[must_use]
    pub fn with_species(mut self, species: impl Into<String>) -> Self {
        self.species = Some(species.into());
        self
    }

    /// Whether `ring` passes every set criterion.
    #[must_use]
    pub fn matches(&self, ring: &RingItem) -> bool {
        self.status.map_or(true, |s| ring.kind() == s)
            && self.year.map_or(true, |y| ring.attributes.year == Some(y))
            && self.species.as_deref().map_or(true, |wanted| {
                ring.attributes
                    .species
                    .as_deref()
                    .is_some_and(|species| species.trim().eq_ignore_ascii_case(wanted.trim()))
            })
    }
}

/// Ring side of a unit of work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RingChange {
    /// Replace the stored ring, which must still have status `expected`
    Update {
        ring: RingItem,
        expected: RingStatusKind,
    },
    /// Delete the ring, which must still have status `expected`
    Delete {
        id: RingId,
        expected: RingStatusKind,
    },
}

impl RingChange {
    #[must_use]
    pub const fn ring_id(&self) -> &RingId {
        match self {
            Self::Update { ring, .. } => &ring.id,
            Self::Delete { id, .. } => id,
        }
    }

    #[must_use]
    pub const fn expected(&self) -> RingStatusKind {
        match self {
            Self::Update { expected, .. } | Self::Delete { expected, .. } => *expected,
        }
    }
}

/// New display ring code for an existing individual.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RingCodeUpdate {
    pub individual: IndividualId,
    pub code: Option<RingCode>,
}

/// Writes that must be applied together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkUnit {
    pub ring: RingChange,
    pub ring_code: Option<RingCodeUpdate>,
}

impl WorkUnit {
    /// A unit that only touches the ring.
    #[must_use]
    pub const fn ring_only(ring: RingChange) -> Self {
        Self {
            ring,
            ring_code: None,
        }
    }
}

// ============================================================================
// GATEWAYS
// ============================================================================

/// Read-only lookup of individuals in the breeder's flock.
#[async_trait]
pub trait FlockIndex: Send + Sync {
    /// Load an individual by id.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no individual has this id.
    /// Returns `StorageError` on backend failure.
    async fn get_by_id(&self, id: &IndividualId) -> RepositoryResult<Individual>;

    /// Check whether an individual exists.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failure.
    async fn exists(&self, id: &IndividualId) -> RepositoryResult<bool> {
        match self.get_by_id(id).await {
            Ok(_) => Ok(true),
            Err(RepositoryError::NotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }
}

/// Persistence for individuals.
#[async_trait]
pub trait IndividualGateway: FlockIndex {
    /// Save an individual (create or update).
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failure.
    async fn save(&self, individual: &Individual) -> RepositoryResult<()>;

    /// Save name, parent slots and manual ancestors, keeping the stored
    /// display ring code. A new individual is created with its own ring code.
    ///
    /// Returns the individual as persisted.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failure.
    async fn save_lineage(&self, individual: &Individual) -> RepositoryResult<Individual>;
}

/// Persistence for rings and batches.
#[async_trait]
pub trait RingGateway: Send + Sync {
    /// Persist a batch together with its expanded rings.
    ///
    /// Ring codes are not checked here. Code uniqueness is a separate read
    /// done first by the store, so it is best-effort: two registrations
    /// racing past that read can both write the same code. With a single
    /// writer per inventory this does not happen.
    ///
    /// # Errors
    ///
    /// Returns `Conflict` if the batch or any ring id already exists; in that
    /// case nothing is written.
    async fn create_batch(&self, batch: &RingBatch, items: &[RingItem]) -> RepositoryResult<()>;

    /// Persist a single new ring.
    ///
    /// # Errors
    ///
    /// Returns `Conflict` if the ring id already exists.
    async fn create(&self, ring: &RingItem) -> RepositoryResult<()>;

    /// Replace a stored ring whose status is still `expected`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the ring does not exist and
    /// `ConcurrentModification` if its status changed.
    async fn update(&self, ring: &RingItem, expected: RingStatusKind) -> RepositoryResult<()>;

    /// Hard-delete a ring regardless of its status.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the ring does not exist.
    async fn delete(&self, id: &RingId) -> RepositoryResult<()>;

    /// Load a ring by id.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the ring does not exist.
    async fn get(&self, id: &RingId) -> RepositoryResult<RingItem>;

    /// All rings carrying `code`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failure.
    async fn find_by_code(&self, code: &RingCode) -> RepositoryResult<Vec<RingItem>>;

    /// Rings matching `filter`, ordered by code.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failure.
    async fn list_by_filter(&self, filter: &RingFilter) -> RepositoryResult<Vec<RingItem>>;

    /// Load a batch by id.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the batch does not exist.
    async fn get_batch(&self, id: &BatchId) -> RepositoryResult<RingBatch>;

    /// All batches, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failure.
    async fn list_batches(&self) -> RepositoryResult<Vec<RingBatch>>;
}

/// Atomic application of a [`WorkUnit`].
#[async_trait]
pub trait UnitOfWork: Send + Sync {
    /// Apply every write of `unit`, or none of them.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the ring or individual does not exist,
    /// `ConcurrentModification` if the ring's status is not the expected one.
    async fn commit(&self, unit: WorkUnit) -> RepositoryResult<()>;
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::domain::aggregates::RingAttributes;

    fn ring(species: Option<&str>, year: Option<u16>) -> RingItem {
        RingItem::new(
            RingId::generate(),
            RingCode::parse("001").expect("valid code"),
            None,
            RingAttributes {
                species: species.map(String::from),
                year,
                ..RingAttributes::default()
            },
            Utc::now(),
        )
    }

    #[test]
    fn test_empty_filter_matches_everything() {
        assert!(RingFilter::default().matches(&ring(None, None)));
    }

    #[test]
    fn test_filters_are_and_combined() {
        let r = ring(Some("Canário"), Some(2026));
        let filter = RingFilter::default()
            .with_status(RingStatusKind::Estoque)
            .with_year(2026)
            .with_species("canário");
        // ASCII-only case folding: `á` compares exactly
        assert!(filter.matches(&r));
        assert!(!filter.clone().with_year(2025).matches(&r));
        assert!(!filter.with_status(RingStatusKind::Usada).matches(&r));
    }

    #[test]
    fn test_species_filter_excludes_missing_species() {
        let filter = RingFilter::default().with_species("Canário");
        assert!(!filter.matches(&ring(None, Some(2026))));
    }

    #[test]
    fn test_not_found_helper() {
        let err = RepositoryError::not_found("ring", "abc");
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "entity not found: ring 'abc'");
    }
}
