//! Lineage edits.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use super::GenealogyError;
use crate::domain::{AncestorPath, Individual, IndividualId, ParentSlot, Side};

/// How one side of a lineage is sourced.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LineageMode {
    /// Parent is another bird of the flock
    Plantel,
    /// Ancestors are typed in by hand
    Manual,
}

/// A lineage change for one side of an individual.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenealogyEdit {
    pub side: Side,
    pub mode: LineageMode,
    /// Target of a plantel link; `None` clears the side
    pub link_id: Option<IndividualId>,
    /// Manual entries to upsert, all on `side`
    pub manual_entries: BTreeMap<AncestorPath, String>,
}

impl GenealogyEdit {
    /// Link `side` to a bird of the flock, or clear it with `None`.
    #[must_use]
    pub const fn plantel(side: Side, link_id: Option<IndividualId>) -> Self {
        Self {
            side,
            mode: LineageMode::Plantel,
            link_id,
            manual_entries: BTreeMap::new(),
        }
    }

    /// Declare manual ancestors for `side`.
    #[must_use]
    pub fn manual(side: Side, entries: impl IntoIterator<Item = (AncestorPath, String)>) -> Self {
        Self {
            side,
            mode: LineageMode::Manual,
            link_id: None,
            manual_entries: entries.into_iter().collect(),
        }
    }
}

/// Apply a lineage edit, returning the updated individual.
///
/// Plantel mode replaces the generation-1 slot with the link (or clears it)
/// and keeps every deeper manual entry. Manual mode clears the link and
/// upserts the submitted entries; the other side and omitted paths are left
/// alone. Applying the same edit twice yields the same state.
///
/// # Errors
///
/// Returns `GenealogyError::SideMismatch` if a manual entry's path starts on
/// the other side. Nothing is applied in that case.
pub fn apply_genealogy_edit(
    individual: &Individual,
    edit: &GenealogyEdit,
) -> Result<Individual, GenealogyError> {
    match edit.mode {
        LineageMode::Plantel => {
            let slot = edit
                .link_id
                .clone()
                .map_or(ParentSlot::Unset, ParentSlot::Linked);
            Ok(individual.clone().with_slot(edit.side, slot))
        }
        LineageMode::Manual => {
            if let Some(path) = edit.manual_entries.keys().find(|p| p.side() != edit.side) {
                return Err(GenealogyError::SideMismatch {
                    path: path.clone(),
                    side: edit.side,
                });
            }

            let base_slot = match individual.slot(edit.side) {
                ParentSlot::Linked(_) => ParentSlot::Unset,
                other => other.clone(),
            };
            let base = individual.clone().with_slot(edit.side, base_slot);

            Ok(edit
                .manual_entries
                .iter()
                .fold(base, |acc, (path, name)| {
                    if path.is_parent() {
                        acc.with_slot(edit.side, ParentSlot::Manual(name.clone()))
                    } else {
                        acc.with_deeper_entry(path.clone(), name.clone())
                    }
                }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(s: &str) -> AncestorPath {
        AncestorPath::parse(s).expect("valid path")
    }

    fn id(s: &str) -> IndividualId {
        IndividualId::parse(s).expect("valid id")
    }

    fn bird() -> Individual {
        Individual::new(id("bird-1"), "Amarelo")
    }

    #[test]
    fn test_manual_edit_fills_slot_and_deeper_entries() {
        let edit = GenealogyEdit::manual(
            Side::Father,
            [
                (path("f"), "Canário X".to_string()),
                (path("ff"), "Canário XX".to_string()),
            ],
        );
        let updated = apply_genealogy_edit(&bird(), &edit).expect("edit valid");
        assert_eq!(updated.slot(Side::Father).manual(), Some("Canário X"));
        assert_eq!(updated.manual_entry(&path("ff")), Some("Canário XX"));
        assert!(updated.slot(Side::Mother).is_unset());
    }

    #[test]
    fn test_plantel_edit_replaces_parent_keeps_deeper() {
        let manual = GenealogyEdit::manual(
            Side::Father,
            [
                (path("f"), "Legacy".to_string()),
                (path("fm"), "Avó".to_string()),
            ],
        );
        let step1 = apply_genealogy_edit(&bird(), &manual).expect("edit valid");
        let step2 = apply_genealogy_edit(&step1, &GenealogyEdit::plantel(Side::Father, Some(id("bird-x"))))
            .expect("edit valid");

        assert_eq!(step2.father_link_id(), Some(&id("bird-x")));
        assert_eq!(step2.manual_entry(&path("f")), None);
        assert_eq!(step2.manual_entry(&path("fm")), Some("Avó"));
    }

    #[test]
    fn test_plantel_edit_without_link_clears_side() {
        let linked = apply_genealogy_edit(&bird(), &GenealogyEdit::plantel(Side::Mother, Some(id("bird-m"))))
            .expect("edit valid");
        let cleared = apply_genealogy_edit(&linked, &GenealogyEdit::plantel(Side::Mother, None))
            .expect("edit valid");
        assert!(cleared.slot(Side::Mother).is_unset());
    }

    #[test]
    fn test_manual_edit_clears_link() {
        let linked = apply_genealogy_edit(&bird(), &GenealogyEdit::plantel(Side::Father, Some(id("bird-x"))))
            .expect("edit valid");
        let manual = GenealogyEdit::manual(Side::Father, [(path("ff"), "Avô".to_string())]);
        let updated = apply_genealogy_edit(&linked, &manual).expect("edit valid");
        assert_eq!(updated.father_link_id(), None);
        assert!(updated.slot(Side::Father).is_unset());
        assert_eq!(updated.manual_entry(&path("ff")), Some("Avô"));
    }

    #[test]
    fn test_manual_entry_on_other_side_rejected() {
        let edit = GenealogyEdit::manual(Side::Father, [(path("mf"), "Wrong".to_string())]);
        assert!(matches!(
            apply_genealogy_edit(&bird(), &edit),
            Err(GenealogyError::SideMismatch { side: Side::Father, .. })
        ));
    }

    #[test]
    fn test_edit_is_idempotent() {
        let edit = GenealogyEdit::manual(Side::Mother, [(path("m"), String::new())]);
        let once = apply_genealogy_edit(&bird(), &edit).expect("edit valid");
        let twice = apply_genealogy_edit(&once, &edit).expect("edit valid");
        assert_eq!(once, twice);
    }

    #[test]
    fn test_mode_strings() {
        assert_eq!(LineageMode::Plantel.to_string(), "plantel");
        assert_eq!("manual".parse::<LineageMode>().ok(), Some(LineageMode::Manual));
    }
}
