//! `Individual` aggregate: a bird as seen by the genealogy and ring subsystems.
//!
//! # Invariants
//!
//! 1. Each side has exactly one generation-1 source: a flock link, a manual
//!    name, or nothing ([`ParentSlot`]). A link and a stale manual name for the
//!    same parent cannot coexist.
//! 2. Deeper manual ancestors (generation 2 and beyond) are independent text
//!    fields keyed by validated [`AncestorPath`]s.
//! 3. `ring_code` is only a display copy of the bound ring's code.
//!
//! The persisted shape ([`IndividualRecord`]) keeps the legacy parallel
//! fields. Loading a record that has both a link and a manual name for the
//! same parent keeps the link.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![forbid(unsafe_code)]

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{
    ancestry::{AncestorPath, AncestryError, Side},
    identifiers::{IdentifierError, IndividualId, RingCode},
};

/// Errors raised while rebuilding an individual from its persisted record.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IndividualError {
    #[error("invalid identifier in individual record: {0}")]
    Identifier(#[from] IdentifierError),

    #[error(transparent)]
    Ancestry(#[from] AncestryError),
}

/// Source of a generation-1 ancestor.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", content = "value", rename_all = "lowercase")]
pub enum ParentSlot {
    /// Nothing declared
    #[default]
    Unset,
    /// Another bird of the same flock
    Linked(IndividualId),
    /// Free-text external ancestor (may be empty)
    Manual(String),
}

impl ParentSlot {
    /// Linked individual, if any.
    #[must_use]
    pub const fn link(&self) -> Option<&IndividualId> {
        match self {
            Self::Linked(id) => Some(id),
            Self::Unset | Self::Manual(_) => None,
        }
    }

    /// Manual name, if any.
    #[must_use]
    pub fn manual(&self) -> Option<&str> {
        match self {
            Self::Manual(name) => Some(name.as_str()),
            Self::Unset | Self::Linked(_) => None,
        }
    }

    #[must_use]
    pub const fn is_unset(&self) -> bool {
        matches!(self, Self::Unset)
    }
}

/// Individual aggregate root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "IndividualRecord", into = "IndividualRecord")]
pub struct Individual {
    id: IndividualId,
    name: String,
    father: ParentSlot,
    mother: ParentSlot,
    deeper_ancestors: BTreeMap<AncestorPath, String>,
    ring_code: Option<RingCode>,
}

impl Individual {
    /// Create an individual with no declared lineage and no ring.
    #[must_use]
    pub fn new(id: IndividualId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            father: ParentSlot::Unset,
            mother: ParentSlot::Unset,
            deeper_ancestors: BTreeMap::new(),
            ring_code: None,
        }
    }

    // ========================================================================
    // QUERY METHODS
    // ========================================================================

    #[must_use]
    pub const fn id(&self) -> &IndividualId {
        &self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Generation-1 slot for a side.
    #[must_use]
    pub const fn slot(&self, side: Side) -> &ParentSlot {
        match side {
            Side::Father => &self.father,
            Side::Mother => &self.mother,
        }
    }

    /// Flock link for a side.
    #[must_use]
    pub const fn link_id(&self, side: Side) -> Option<&IndividualId> {
        self.slot(side).link()
    }

    #[must_use]
    pub const fn father_link_id(&self) -> Option<&IndividualId> {
        self.link_id(Side::Father)
    }

    #[must_use]
    pub const fn mother_link_id(&self) -> Option<&IndividualId> {
        self.link_id(Side::Mother)
    }

    /// Manual name declared for `path`, if any.
    #[must_use]
    pub fn manual_entry(&self, path: &AncestorPath) -> Option<&str> {
        if path.is_parent() {
            self.slot(path.side()).manual()
        } else {
            self.deeper_ancestors.get(path).map(String::as_str)
        }
    }

    /// Every manual ancestor, generation-1 entries included, ordered by path.
    #[must_use]
    pub fn manual_ancestors(&self) -> BTreeMap<AncestorPath, String> {
        Side::ALL
            .into_iter()
            .filter_map(|side| {
                self.slot(side)
                    .manual()
                    .map(|name| (AncestorPath::root(side), name.to_string()))
            })
            .chain(
                self.deeper_ancestors
                    .iter()
                    .map(|(path, name)| (path.clone(), name.clone())),
            )
            .collect()
    }

    /// Manual ancestors of generation 2 and beyond.
    #[must_use]
    pub const fn deeper_ancestors(&self) -> &BTreeMap<AncestorPath, String> {
        &self.deeper_ancestors
    }

    /// Display copy of the bound ring's code.
    #[must_use]
    pub const fn ring_code(&self) -> Option<&RingCode> {
        self.ring_code.as_ref()
    }

    // ========================================================================
    // CRATE-INTERNAL MUTATORS
    // ========================================================================

    pub(crate) fn with_slot(mut self, side: Side, slot: ParentSlot) -> Self {
        match side {
            Side::Father => self.father = slot,
            Side::Mother => self.mother = slot,
        }
        self
    }

    pub(crate) fn with_deeper_entry(mut self, path: AncestorPath, name: String) -> Self {
        self.deeper_ancestors.insert(path, name);
        self
    }

    pub(crate) fn with_ring_code(self, ring_code: Option<RingCode>) -> Self {
        Self { ring_code, ..self }
    }

    // ========================================================================
    // PERSISTENCE SHAPE
    // ========================================================================

    /// Rebuild from a persisted record, keeping links over stale manual names.
    ///
    /// # Errors
    ///
    /// Returns `IndividualError` if an id, ring code or ancestor path is invalid.
    pub fn from_record(record: IndividualRecord) -> Result<Self, IndividualError> {
        let id = IndividualId::parse(record.id)?;
        let father_link = record.father_link_id.map(IndividualId::parse).transpose()?;
        let mother_link = record.mother_link_id.map(IndividualId::parse).transpose()?;
        let ring_code = record.ring_code.map(RingCode::parse).transpose()?;

        let mut manual: BTreeMap<AncestorPath, String> = record
            .manual_ancestors
            .into_iter()
            .map(|(path, name)| AncestorPath::parse(path).map(|p| (p, name)))
            .collect::<Result<_, _>>()?;

        let mut slot_for = |side: Side, link: Option<IndividualId>| {
            let manual_name = manual.remove(&AncestorPath::root(side));
            match (link, manual_name) {
                (Some(link), Some(_)) => {
                    tracing::debug!(
                        individual = %id,
                        side = %side,
                        "Dropping stale manual parent behind active flock link"
                    );
                    ParentSlot::Linked(link)
                }
                (Some(link), None) => ParentSlot::Linked(link),
                (None, Some(name)) => ParentSlot::Manual(name),
                (None, None) => ParentSlot::Unset,
            }
        };

        let father = slot_for(Side::Father, father_link);
        let mother = slot_for(Side::Mother, mother_link);

        Ok(Self {
            id,
            name: record.name,
            father,
            mother,
            deeper_ancestors: manual,
            ring_code,
        })
    }

    /// The persisted shape of this individual.
    #[must_use]
    pub fn to_record(&self) -> IndividualRecord {
        IndividualRecord {
            id: self.id.to_string(),
            name: self.name.clone(),
            father_link_id: self.father_link_id().map(ToString::to_string),
            mother_link_id: self.mother_link_id().map(ToString::to_string),
            manual_ancestors: self
                .manual_ancestors()
                .into_iter()
                .map(|(path, name)| (path.into(), name))
                .collect(),
            ring_code: self.ring_code.as_ref().map(ToString::to_string),
        }
    }
}

/// Persisted shape of an individual, with the legacy parallel lineage fields.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndividualRecord {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub father_link_id: Option<String>,
    #[serde(default)]
    pub mother_link_id: Option<String>,
    #[serde(default)]
    pub manual_ancestors: BTreeMap<String, String>,
    #[serde(default)]
    pub ring_code: Option<String>,
}

impl TryFrom<IndividualRecord> for Individual {
    type Error = IndividualError;

    fn try_from(record: IndividualRecord) -> Result<Self, Self::Error> {
        Self::from_record(record)
    }
}

impl From<Individual> for IndividualRecord {
    fn from(value: Individual) -> Self {
        value.to_record()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str) -> IndividualRecord {
        IndividualRecord {
            id: id.to_string(),
            name: "Canário".to_string(),
            ..IndividualRecord::default()
        }
    }

    #[test]
    fn test_new_individual_has_no_lineage() {
        let bird = Individual::new(IndividualId::parse("bird-1").expect("valid id"), "Amarelo");
        assert!(bird.slot(Side::Father).is_unset());
        assert!(bird.slot(Side::Mother).is_unset());
        assert!(bird.manual_ancestors().is_empty());
        assert!(bird.ring_code().is_none());
    }

    #[test]
    fn test_record_link_wins_over_stale_manual() {
        let mut rec = record("bird-1");
        rec.father_link_id = Some("bird-x".to_string());
        rec.manual_ancestors.insert("f".to_string(), "Legacy Name".to_string());
        rec.manual_ancestors.insert("ff".to_string(), "Avô".to_string());

        let bird = Individual::from_record(rec).expect("valid record");

        assert_eq!(bird.father_link_id().map(IndividualId::as_str), Some("bird-x"));
        let f = AncestorPath::root(Side::Father);
        assert_eq!(bird.manual_entry(&f), None);
        let ff = AncestorPath::parse("ff").expect("valid path");
        assert_eq!(bird.manual_entry(&ff), Some("Avô"));
    }

    #[test]
    fn test_record_rejects_invalid_path() {
        let mut rec = record("bird-1");
        rec.manual_ancestors.insert("fx".to_string(), "?".to_string());
        assert!(matches!(
            Individual::from_record(rec),
            Err(IndividualError::Ancestry(_))
        ));
    }

    #[test]
    fn test_record_rejects_path_deeper_than_six() {
        let mut rec = record("bird-1");
        rec.manual_ancestors.insert("fffffff".to_string(), "?".to_string());
        assert!(Individual::from_record(rec).is_err());
    }

    #[test]
    fn test_manual_parent_round_trips_through_record() {
        let mut rec = record("bird-1");
        rec.manual_ancestors.insert("m".to_string(), "Canária Y".to_string());
        rec.ring_code = Some("A-001".to_string());

        let bird = Individual::from_record(rec.clone()).expect("valid record");
        assert_eq!(bird.slot(Side::Mother), &ParentSlot::Manual("Canária Y".to_string()));
        assert_eq!(bird.to_record(), rec);
    }

    #[test]
    fn test_serde_uses_record_shape() {
        let json = r#"{"id":"bird-7","name":"Azul","fatherLinkId":"bird-2","manualAncestors":{"m":"Externa"}}"#;
        let bird: Individual = serde_json::from_str(json).expect("deserialize");
        assert_eq!(bird.father_link_id().map(IndividualId::as_str), Some("bird-2"));
        assert_eq!(bird.slot(Side::Mother).manual(), Some("Externa"));
    }
}
