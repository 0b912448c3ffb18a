//! `RingItem` aggregate root: one physical identification ring.
//!
//! # Invariants
//!
//! 1. Every ring starts in `estoque`.
//! 2. Status transitions are restricted:
//!    - `estoque -> usada` (bound to an individual)
//!    - `estoque -> perdida` and `usada -> perdida` (lost, with a reason)
//!    - `perdida` is terminal
//!    - No `usada -> estoque`
//! 3. Attribute edits never change the status.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![forbid(unsafe_code)]

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use thiserror::Error;

use crate::domain::{
    aggregates::individual::Individual,
    identifiers::{BatchId, IndividualId, Personalization, RingCode, RingId, RingSize},
};

// ============================================================================
// DOMAIN ERRORS
// ============================================================================

/// Errors from ring state transitions.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RingError {
    /// Ring is not in stock
    #[error("ring {code} is not available (status: {status})")]
    NotAvailable {
        code: RingCode,
        status: RingStatusKind,
    },

    /// Ring was already reported lost
    #[error("ring {0} is already lost")]
    AlreadyLost(RingCode),

    /// A loss must say why
    #[error("a loss reason is required")]
    MissingLossReason,
}

// ============================================================================
// STATUS
// ============================================================================

/// Status discriminant, with the string forms used in storage and filters.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum RingStatusKind {
    /// In stock
    Estoque,
    /// Bound to an individual
    Usada,
    /// Lost or retired
    Perdida,
}

impl RingStatusKind {
    /// All kinds in lifecycle order.
    pub const ALL: [Self; 3] = [Self::Estoque, Self::Usada, Self::Perdida];

    /// Check if a transition from self to target is valid
    #[must_use]
    #[allow(clippy::match_same_arms)] // More readable as explicit patterns
    pub const fn can_transition_to(self, target: Self) -> bool {
        match (self, target) {
            (Self::Estoque, Self::Usada | Self::Perdida) => true,
            (Self::Usada, Self::Perdida) => true,
            _ => false,
        }
    }

    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Perdida)
    }
}

/// Who a ring was assigned to, and when.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    pub bird_id: IndividualId,
    pub bird_name: String,
    pub assigned_at: DateTime<Utc>,
}

/// Ring status with the data each state carries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum RingStatus {
    Estoque,
    Usada(Assignment),
    Perdida {
        reason: String,
        lost_at: DateTime<Utc>,
        last_assignment: Option<Assignment>,
    },
}

impl RingStatus {
    #[must_use]
    pub const fn kind(&self) -> RingStatusKind {
        match self {
            Self::Estoque => RingStatusKind::Estoque,
            Self::Usada(_) => RingStatusKind::Usada,
            Self::Perdida { .. } => RingStatusKind::Perdida,
        }
    }

    /// Current assignment, only while `usada`.
    #[must_use]
    pub const fn assignment(&self) -> Option<&Assignment> {
        match self {
            Self::Usada(assignment) => Some(assignment),
            Self::Estoque | Self::Perdida { .. } => None,
        }
    }

    /// Loss reason, only while `perdida`.
    #[must_use]
    pub fn lost_reason(&self) -> Option<&str> {
        match self {
            Self::Perdida { reason, .. } => Some(reason.as_str()),
            Self::Estoque | Self::Usada(_) => None,
        }
    }
}

impl std::fmt::Display for RingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Estoque => write!(f, "estoque"),
            Self::Usada(a) => write!(f, "usada by {}", a.bird_id),
            Self::Perdida { reason, .. } => write!(f, "perdida ({reason})"),
        }
    }
}

// ============================================================================
// ATTRIBUTES
// ============================================================================

/// Descriptive ring attributes shared by a batch and its rings.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RingAttributes {
    pub species: Option<String>,
    pub year: Option<u16>,
    /// Administrative region code, e.g. `SP`
    pub state: Option<String>,
    pub color: Option<String>,
    pub size_mm: Option<RingSize>,
    pub personalization: Option<Personalization>,
}

/// Attribute update for a ring. `None` fields are left unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RingEdit {
    pub code: Option<RingCode>,
    pub color: Option<String>,
    pub personalization: Option<Personalization>,
}

impl RingEdit {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.code.is_none() && self.color.is_none() && self.personalization.is_none()
    }
}

// ============================================================================
// RING ITEM AGGREGATE ROOT
// ============================================================================

/// Ring aggregate root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RingItem {
    pub id: RingId,
    pub code: RingCode,
    pub batch_id: Option<BatchId>,
    pub attributes: RingAttributes,
    pub status: RingStatus,
    pub created_at: DateTime<Utc>,
}

impl RingItem {
    /// Create a new ring in `estoque`.
    #[must_use]
    pub fn new(
        id: RingId,
        code: RingCode,
        batch_id: Option<BatchId>,
        attributes: RingAttributes,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            code,
            batch_id,
            attributes,
            status: RingStatus::Estoque,
            created_at,
        }
    }

    #[must_use]
    pub const fn kind(&self) -> RingStatusKind {
        self.status.kind()
    }

    #[must_use]
    pub const fn is_available(&self) -> bool {
        matches!(self.status, RingStatus::Estoque)
    }

    /// Bound individual, only while `usada`.
    #[must_use]
    pub fn assigned_bird_id(&self) -> Option<&IndividualId> {
        self.status.assignment().map(|a| &a.bird_id)
    }

    // ========================================================================
    // TRANSITIONS
    // ========================================================================

    /// Bind this ring to an individual.
    ///
    /// # Errors
    ///
    /// Returns `RingError::NotAvailable` unless the ring is in `estoque`.
    pub fn bind(&self, bird: &Individual, at: DateTime<Utc>) -> Result<Self, RingError> {
        if !self.kind().can_transition_to(RingStatusKind::Usada) {
            return Err(RingError::NotAvailable {
                code: self.code.clone(),
                status: self.kind(),
            });
        }

        Ok(Self {
            status: RingStatus::Usada(Assignment {
                bird_id: bird.id().clone(),
                bird_name: bird.name().to_string(),
                assigned_at: at,
            }),
            ..self.clone()
        })
    }

    /// Report this ring lost or retired.
    ///
    /// # Errors
    ///
    /// Returns `RingError::MissingLossReason` for a blank reason and
    /// `RingError::AlreadyLost` if the ring is already `perdida`.
    pub fn mark_lost(&self, reason: &str, at: DateTime<Utc>) -> Result<Self, RingError> {
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(RingError::MissingLossReason);
        }

        if !self.kind().can_transition_to(RingStatusKind::Perdida) {
            return Err(RingError::AlreadyLost(self.code.clone()));
        }

        Ok(Self {
            status: RingStatus::Perdida {
                reason: reason.to_string(),
                lost_at: at,
                last_assignment: self.status.assignment().cloned(),
            },
            ..self.clone()
        })
    }

    /// Apply an attribute edit. The status is never touched.
    #[must_use]
    pub fn edit(&self, edit: &RingEdit) -> Self {
        let mut next = self.clone();
        if let Some(code) = &edit.code {
            next.code = code.clone();
        }
        if let Some(color) = &edit.color {
            next.attributes.color = Some(color.clone());
        }
        if let Some(personalization) = &edit.personalization {
            next.attributes.personalization = Some(personalization.clone());
        }
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ring(code: &str) -> RingItem {
        RingItem::new(
            RingId::generate(),
            RingCode::parse(code).expect("valid code"),
            None,
            RingAttributes::default(),
            Utc::now(),
        )
    }

    fn bird(id: &str) -> Individual {
        Individual::new(IndividualId::parse(id).expect("valid id"), "Canário")
    }

    #[test]
    fn test_new_ring_is_in_stock() {
        let r = ring("A-001");
        assert!(r.is_available());
        assert_eq!(r.kind(), RingStatusKind::Estoque);
    }

    #[test]
    fn test_bind_sets_assignment() {
        let bound = ring("A-001").bind(&bird("bird-42"), Utc::now()).expect("bind valid");
        assert_eq!(bound.kind(), RingStatusKind::Usada);
        assert_eq!(bound.assigned_bird_id().map(IndividualId::as_str), Some("bird-42"));
        assert_eq!(
            bound.status.assignment().map(|a| a.bird_name.as_str()),
            Some("Canário")
        );
    }

    #[test]
    fn test_bind_twice_fails() {
        let bound = ring("A-001").bind(&bird("bird-42"), Utc::now()).expect("bind valid");
        let result = bound.bind(&bird("bird-99"), Utc::now());
        assert!(matches!(
            result,
            Err(RingError::NotAvailable {
                status: RingStatusKind::Usada,
                ..
            })
        ));
    }

    #[test]
    fn test_lost_is_terminal() {
        let lost = ring("A-001").mark_lost("caiu da ave", Utc::now()).expect("loss valid");
        assert_eq!(lost.status.lost_reason(), Some("caiu da ave"));
        assert!(matches!(
            lost.bind(&bird("bird-1"), Utc::now()),
            Err(RingError::NotAvailable { .. })
        ));
        assert!(matches!(
            lost.mark_lost("again", Utc::now()),
            Err(RingError::AlreadyLost(_))
        ));
    }

    #[test]
    fn test_loss_from_used_keeps_last_assignment() {
        let bound = ring("A-001").bind(&bird("bird-42"), Utc::now()).expect("bind valid");
        let lost = bound.mark_lost("ave faleceu", Utc::now()).expect("loss valid");
        match &lost.status {
            RingStatus::Perdida {
                last_assignment: Some(a),
                ..
            } => assert_eq!(a.bird_id.as_str(), "bird-42"),
            other => panic!("unexpected status {other:?}"),
        }
    }

    #[test]
    fn test_blank_loss_reason_rejected() {
        assert_eq!(
            ring("A-001").mark_lost("   ", Utc::now()),
            Err(RingError::MissingLossReason)
        );
    }

    #[test]
    fn test_edit_never_changes_status() {
        let bound = ring("A-001").bind(&bird("bird-42"), Utc::now()).expect("bind valid");
        let edit = RingEdit {
            code: Some(RingCode::parse("A-002").expect("valid code")),
            color: Some("azul".to_string()),
            personalization: None,
        };
        let edited = bound.edit(&edit);
        assert_eq!(edited.code.as_str(), "A-002");
        assert_eq!(edited.attributes.color.as_deref(), Some("azul"));
        assert_eq!(edited.status, bound.status);
    }

    #[test]
    fn test_transition_table() {
        use RingStatusKind::{Estoque, Perdida, Usada};
        assert!(Estoque.can_transition_to(Usada));
        assert!(Estoque.can_transition_to(Perdida));
        assert!(Usada.can_transition_to(Perdida));
        assert!(!Usada.can_transition_to(Estoque));
        for target in RingStatusKind::ALL {
            assert!(!Perdida.can_transition_to(target));
        }
    }

    #[test]
    fn test_status_kind_strings() {
        assert_eq!(RingStatusKind::Perdida.to_string(), "perdida");
        assert_eq!("usada".parse::<RingStatusKind>().ok(), Some(RingStatusKind::Usada));
    }
}
