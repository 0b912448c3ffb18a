//! # Plantel Core
//!
//! Genealogy and ring inventory for bird breeders - strictly functional Rust
//! with zero unwraps.
//!
//! ## Subsystems
//!
//! - [`domain::ancestry`] - ancestor path codec (`"ffm"` = father's father's mother)
//! - [`genealogy`] - ancestor resolution, lineage edits and the merged tree view
//! - [`inventory`] - ring batches, range expansion, the ring store and binding
//! - [`storage`] - in-memory and `SQLite` backends for the persistence gateways
//!
//! ## Laws (Compiler Enforced)
//!
//! - No `unwrap()` - returns `Result` instead
//! - No `expect()` - returns `Result` instead
//! - No `panic!()` - returns `Result` instead
//! - No `unsafe` - safe Rust only
//!
//! ## Error Handling
//!
//! All fallible operations return `Result<T, E>` with a typed error per layer.
//! The umbrella [`Error`] classifies failures into user-correctable validation
//! errors and aborted operations.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![forbid(unsafe_code)]

pub mod config;
pub mod domain;
mod error;
pub mod genealogy;
pub mod inventory;
pub mod logging;
pub mod storage;

pub use config::{BoundRingPolicy, Config, GenealogyConfig, InventoryConfig};
pub use domain::{
    AncestorPath, AncestryError, BatchId, IdentifierError, Individual, IndividualId,
    Personalization, RepositoryError, RepositoryResult, RingCode, RingId, RingItem, RingSize,
    RingStatus, RingStatusKind, Side,
};
pub use error::{Error, Result};
pub use genealogy::{AncestorTree, AncestorView, GenealogyEdit, GenealogyError, LineageMode};
pub use inventory::{
    BindingCoordinator, InventoryError, RangeError, RingInventoryStore,
};
