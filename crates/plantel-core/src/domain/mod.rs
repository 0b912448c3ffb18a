//! # Domain Layer
//!
//! Pure domain model for genealogy and ring inventory, independent of storage.
//!
//! - **`identifiers`** - validated newtypes ([`IndividualId`], [`RingCode`], ...)
//! - **`ancestry`** - the ancestor path codec ([`AncestorPath`], [`Side`])
//! - **`aggregates`** - [`Individual`], [`RingItem`], [`RingBatch`]
//! - **`repository`** - persistence traits implemented in [`crate::storage`]
//!
//! Parse at the boundary, validate once: every map key, id and code inside the
//! domain has already been validated.

pub mod aggregates;
pub mod ancestry;
pub mod identifiers;
pub mod repository;

pub use aggregates::{
    Assignment, BatchDraft, Individual, IndividualError, IndividualRecord, ParentSlot,
    RingAttributes, RingBatch, RingEdit, RingError, RingItem, RingStatus, RingStatusKind,
};
pub use ancestry::{AncestorPath, AncestryError, Side};
pub use identifiers::{
    BatchId, IdentifierError, IndividualId, Personalization, RingCode, RingId, RingSize,
};
pub use repository::{
    FlockIndex, IndividualGateway, RepositoryError, RepositoryResult, RingChange, RingCodeUpdate,
    RingFilter, RingGateway, UnitOfWork, WorkUnit,
};
