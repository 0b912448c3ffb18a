//! `RingBatch` aggregate: a purchase or production lot of rings.
//!
//! A batch is created once, either with a numeric range that expands into
//! individual rings or as a metadata-only record. There is no batch edit.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![forbid(unsafe_code)]

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{
    aggregates::ring::RingAttributes,
    identifiers::{BatchId, Personalization, RingSize},
};

/// Input for registering a batch.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BatchDraft {
    pub supplier: String,
    pub species: Option<String>,
    pub quantity: Option<u32>,
    pub size_mm: Option<RingSize>,
    pub year: Option<u16>,
    /// Administrative region code
    pub state: String,
    pub color: String,
    pub start_number: Option<String>,
    pub end_number: Option<String>,
    pub engraving_type: String,
    pub personalization: Option<Personalization>,
}

impl BatchDraft {
    /// Attributes every ring of this batch inherits.
    #[must_use]
    pub fn attributes(&self) -> RingAttributes {
        RingAttributes {
            species: self.species.clone(),
            year: self.year,
            state: Some(self.state.clone()),
            color: Some(self.color.clone()),
            size_mm: self.size_mm,
            personalization: self.personalization.clone(),
        }
    }
}

/// Batch aggregate root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RingBatch {
    pub id: BatchId,
    pub supplier: String,
    pub species: Option<String>,
    pub quantity: Option<u32>,
    pub size_mm: Option<RingSize>,
    pub year: Option<u16>,
    pub state: String,
    pub color: String,
    pub start_number: Option<String>,
    pub end_number: Option<String>,
    pub engraving_type: String,
    pub personalization: Option<Personalization>,
    pub created_at: DateTime<Utc>,
}

impl RingBatch {
    /// Create a batch from a draft.
    ///
    /// When the draft has no quantity, `expanded` (the number of rings the
    /// range produced) fills it in.
    #[must_use]
    pub fn from_draft(
        id: BatchId,
        draft: BatchDraft,
        expanded: Option<u32>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            supplier: draft.supplier,
            species: draft.species,
            quantity: draft.quantity.or(expanded),
            size_mm: draft.size_mm,
            year: draft.year,
            state: draft.state,
            color: draft.color,
            start_number: draft.start_number,
            end_number: draft.end_number,
            engraving_type: draft.engraving_type,
            personalization: draft.personalization,
            created_at,
        }
    }

    /// Whether this batch was registered with a numeric range.
    #[must_use]
    pub const fn has_range(&self) -> bool {
        self.start_number.is_some() && self.end_number.is_some()
    }
}
