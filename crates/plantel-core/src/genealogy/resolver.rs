//! Ancestor resolution and the merged tree view.

use std::{collections::BTreeMap, sync::Arc};

use itertools::Itertools;

use super::{apply_genealogy_edit, GenealogyEdit, GenealogyError};
use crate::{
    config::GenealogyConfig,
    domain::{
        ancestry::MAX_DEPTH, AncestorPath, FlockIndex, Individual, IndividualGateway,
        IndividualId, RepositoryError, Side,
    },
};

/// What is known about one ancestor slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AncestorView {
    /// A bird of the flock. `record` is `None` when the link dangles.
    Linked {
        id: IndividualId,
        record: Option<Box<Individual>>,
    },
    /// Free-text external ancestor (may be empty)
    Manual(String),
    /// Nothing declared
    Unknown,
}

impl AncestorView {
    #[must_use]
    pub const fn is_linked(&self) -> bool {
        matches!(self, Self::Linked { .. })
    }

    #[must_use]
    pub fn linked_id(&self) -> Option<&IndividualId> {
        match self {
            Self::Linked { id, .. } => Some(id),
            Self::Manual(_) | Self::Unknown => None,
        }
    }

    /// Name to show for this slot, if any.
    #[must_use]
    pub fn display_name(&self) -> Option<&str> {
        match self {
            Self::Linked {
                record: Some(record),
                ..
            } => Some(record.name()),
            Self::Manual(name) => Some(name.as_str()),
            Self::Linked { record: None, .. } | Self::Unknown => None,
        }
    }
}

/// Resolve one ancestor of `individual`.
///
/// At generation 1 a flock link takes precedence over any manual name. Every
/// other path reads the individual's manual entries.
///
/// # Errors
///
/// Returns `GenealogyError::Repository` if the flock lookup fails for any
/// reason other than the linked bird being absent.
pub async fn resolve_ancestor(
    individual: &Individual,
    path: &AncestorPath,
    flock: &dyn FlockIndex,
) -> Result<AncestorView, GenealogyError> {
    if path.is_parent() {
        if let Some(id) = individual.link_id(path.side()) {
            let record = match flock.get_by_id(id).await {
                Ok(record) => Some(Box::new(record)),
                Err(RepositoryError::NotFound(_)) => {
                    tracing::warn!(
                        individual = %individual.id(),
                        link = %id,
                        path = %path,
                        "Dangling flock link"
                    );
                    None
                }
                Err(e) => return Err(e.into()),
            };
            return Ok(AncestorView::Linked {
                id: id.clone(),
                record,
            });
        }
    }

    Ok(individual
        .manual_entry(path)
        .map_or(AncestorView::Unknown, |name| AncestorView::Manual(name.to_string())))
}

// ============================================================================
// TREE
// ============================================================================

/// Merged ancestor tree of one individual, keyed by path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AncestorTree {
    subject: IndividualId,
    depth: usize,
    nodes: BTreeMap<AncestorPath, AncestorView>,
}

impl AncestorTree {
    #[must_use]
    pub const fn subject(&self) -> &IndividualId {
        &self.subject
    }

    #[must_use]
    pub const fn depth(&self) -> usize {
        self.depth
    }

    #[must_use]
    pub fn get(&self, path: &AncestorPath) -> Option<&AncestorView> {
        self.nodes.get(path)
    }

    /// Nodes in breadth-first order: by generation, father side first.
    pub fn iter(&self) -> impl Iterator<Item = (&AncestorPath, &AncestorView)> {
        self.nodes
            .iter()
            .sorted_by(|(a, _), (b, _)| a.depth().cmp(&b.depth()).then_with(|| a.cmp(b)))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// A pending tree node: where it sits in the subject's tree, which record
/// declares it and under which path relative to that record.
struct Frame {
    path: AncestorPath,
    source: Arc<Individual>,
    relative: AncestorPath,
    chain: Vec<IndividualId>,
}

async fn build_tree(
    subject: &Individual,
    depth: usize,
    flock: &dyn FlockIndex,
) -> Result<AncestorTree, GenealogyError> {
    if depth == 0 || depth > MAX_DEPTH {
        return Err(GenealogyError::InvalidDepth {
            depth,
            max: MAX_DEPTH,
        });
    }

    let root = Arc::new(subject.clone());
    let mut frontier: Vec<Frame> = Side::ALL
        .into_iter()
        .map(|side| Frame {
            path: AncestorPath::root(side),
            source: Arc::clone(&root),
            relative: AncestorPath::root(side),
            chain: vec![subject.id().clone()],
        })
        .collect();
    let mut nodes = BTreeMap::new();

    while !frontier.is_empty() {
        let mut next = Vec::with_capacity(frontier.len() * 2);

        for frame in frontier {
            let view = resolve_ancestor(&frame.source, &frame.relative, flock).await?;

            if let Some(id) = view.linked_id() {
                if frame.chain.contains(id) {
                    return Err(GenealogyError::CyclicAncestry {
                        path: frame.path,
                        individual: id.clone(),
                    });
                }
            }

            if frame.path.depth() < depth {
                next.extend(Side::ALL.into_iter().filter_map(|side| {
                    let path = frame.path.child(side)?;
                    match &view {
                        AncestorView::Linked {
                            id,
                            record: Some(record),
                        } => {
                            let mut chain = frame.chain.clone();
                            chain.push(id.clone());
                            Some(Frame {
                                path,
                                source: Arc::new(record.as_ref().clone()),
                                relative: AncestorPath::root(side),
                                chain,
                            })
                        }
                        _ => Some(Frame {
                            path,
                            source: Arc::clone(&frame.source),
                            relative: frame.relative.child(side)?,
                            chain: frame.chain.clone(),
                        }),
                    }
                }));
            }

            nodes.insert(frame.path, view);
        }

        frontier = next;
    }

    tracing::debug!(
        individual = %subject.id(),
        depth,
        nodes = nodes.len(),
        "Resolved ancestor tree"
    );

    Ok(AncestorTree {
        subject: subject.id().clone(),
        depth,
        nodes,
    })
}

// ============================================================================
// RESOLVER
// ============================================================================

/// Reads and edits lineages against the flock.
pub struct GenealogyResolver {
    flock: Arc<dyn FlockIndex>,
    individuals: Arc<dyn IndividualGateway>,
    config: GenealogyConfig,
}

impl GenealogyResolver {
    /// Create a resolver backed by one individual store.
    #[must_use]
    pub fn new<B>(backend: Arc<B>, config: GenealogyConfig) -> Self
    where
        B: IndividualGateway + 'static,
    {
        Self {
            flock: Arc::clone(&backend) as Arc<dyn FlockIndex>,
            individuals: backend,
            config,
        }
    }

    /// Resolve one ancestor of `individual`.
    ///
    /// # Errors
    ///
    /// Returns `GenealogyError::Repository` on lookup failure.
    pub async fn resolve_ancestor(
        &self,
        individual: &Individual,
        path: &AncestorPath,
    ) -> Result<AncestorView, GenealogyError> {
        resolve_ancestor(individual, path, self.flock.as_ref()).await
    }

    /// Build the merged tree to `depth` generations.
    ///
    /// Under a linked ancestor the subtree comes from that bird's own record;
    /// elsewhere it comes from the declaring record's manual entries.
    ///
    /// # Errors
    ///
    /// Returns `InvalidDepth` outside `1..=6`, `CyclicAncestry` when a linked
    /// chain revisits a bird already on it, and `Repository` on lookup failure.
    pub async fn resolve_tree(
        &self,
        individual: &Individual,
        depth: usize,
    ) -> Result<AncestorTree, GenealogyError> {
        build_tree(individual, depth, self.flock.as_ref()).await
    }

    /// Build the merged tree to the configured default depth.
    ///
    /// # Errors
    ///
    /// See [`Self::resolve_tree`].
    pub async fn resolve_tree_default(
        &self,
        individual: &Individual,
    ) -> Result<AncestorTree, GenealogyError> {
        self.resolve_tree(individual, self.config.default_depth).await
    }

    /// Apply a lineage edit and persist the result.
    ///
    /// Only lineage is written. The returned individual carries the ring code
    /// currently stored, which may be newer than the one in `individual`.
    ///
    /// # Errors
    ///
    /// Returns `SideMismatch` for entries on the wrong side, or `Repository`
    /// if saving fails. Nothing is saved on error.
    pub async fn save_edit(
        &self,
        individual: &Individual,
        edit: &GenealogyEdit,
    ) -> Result<Individual, GenealogyError> {
        let edited = apply_genealogy_edit(individual, edit)?;
        let updated = self.individuals.save_lineage(&edited).await?;

        tracing::info!(
            individual = %updated.id(),
            side = %edit.side,
            mode = %edit.mode,
            "Lineage updated"
        );

        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::domain::{ParentSlot, RepositoryResult};

    struct EmptyFlock;

    #[async_trait]
    impl FlockIndex for EmptyFlock {
        async fn get_by_id(&self, id: &IndividualId) -> RepositoryResult<Individual> {
            Err(RepositoryError::not_found("individual", id))
        }
    }

    struct BrokenFlock;

    #[async_trait]
    impl FlockIndex for BrokenFlock {
        async fn get_by_id(&self, _id: &IndividualId) -> RepositoryResult<Individual> {
            Err(RepositoryError::storage_error("offline"))
        }
    }

    fn path(s: &str) -> AncestorPath {
        AncestorPath::parse(s).expect("valid path")
    }

    fn linked_bird() -> Individual {
        Individual::new(IndividualId::parse("bird-1").expect("valid id"), "Amarelo").with_slot(
            Side::Father,
            ParentSlot::Linked(IndividualId::parse("bird-x").expect("valid id")),
        )
    }

    #[tokio::test]
    async fn test_dangling_link_still_resolves_as_linked() {
        let view = resolve_ancestor(&linked_bird(), &path("f"), &EmptyFlock)
            .await
            .expect("resolve");
        assert!(matches!(view, AncestorView::Linked { record: None, .. }));
        assert_eq!(view.display_name(), None);
    }

    #[tokio::test]
    async fn test_storage_failure_propagates() {
        let result = resolve_ancestor(&linked_bird(), &path("f"), &BrokenFlock).await;
        assert!(matches!(result, Err(GenealogyError::Repository(_))));
    }

    #[tokio::test]
    async fn test_unknown_when_nothing_declared() {
        let view = resolve_ancestor(&linked_bird(), &path("m"), &EmptyFlock)
            .await
            .expect("resolve");
        assert_eq!(view, AncestorView::Unknown);
    }

    #[tokio::test]
    async fn test_invalid_depth_rejected() {
        for depth in [0, 7] {
            assert!(matches!(
                build_tree(&linked_bird(), depth, &EmptyFlock).await,
                Err(GenealogyError::InvalidDepth { .. })
            ));
        }
    }

    #[tokio::test]
    async fn test_tree_has_every_slot_to_depth() {
        let tree = build_tree(&linked_bird(), 3, &EmptyFlock)
            .await
            .expect("tree");
        assert_eq!(Ok(tree.len()), crate::domain::ancestry::tree_key_count(3));
        let order: Vec<&str> = tree.iter().map(|(p, _)| p.as_str()).take(4).collect();
        assert_eq!(order, ["f", "m", "ff", "fm"]);
    }
}
