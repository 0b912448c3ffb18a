//! # Aggregate Roots
//!
//! Consistency boundaries for the genealogy and ring subsystems.
//!
//! - [`Individual`] - a bird, its declared lineage and the display copy of its ring
//! - [`RingItem`] - one ring and its `estoque -> usada -> perdida` lifecycle
//! - [`RingBatch`] - an immutable lot of rings
//!
//! Transition methods take `&self` and return a new value, so a failed
//! transition leaves the original untouched.

pub mod batch;
pub mod individual;
pub mod ring;

pub use batch::{BatchDraft, RingBatch};
pub use individual::{Individual, IndividualError, IndividualRecord, ParentSlot};
pub use ring::{
    Assignment, RingAttributes, RingEdit, RingError, RingItem, RingStatus, RingStatusKind,
};
