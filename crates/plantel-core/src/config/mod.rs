//! Configuration for plantel-core
//!
//! # Hierarchy
//!
//! 1. Built-in defaults
//! 2. Global config: `<config dir>/plantel/config.toml`
//! 3. Explicit config file passed by the host application
//! 4. Environment variables: `PLANTEL_*`
//!
//! Later sources override earlier ones key by key: a key a file sets wins even
//! when it repeats the default. The result is validated once.

mod load;
mod validate;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

pub use load::{global_config_path, load_config, load_toml_file};

use crate::domain::ancestry::MAX_DEPTH;

// ═══════════════════════════════════════════════════════════════════════════
// TYPES
// ═══════════════════════════════════════════════════════════════════════════

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    pub inventory: InventoryConfig,
    pub genealogy: GenealogyConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct InventoryConfig {
    /// Largest number of rings one range may expand to
    pub range_ceiling: u64,
    /// Reject ring codes already present in the inventory
    pub enforce_unique_codes: bool,
    /// What edits and deletes do to a ring bound to a bird
    pub bound_ring_policy: BoundRingPolicy,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct GenealogyConfig {
    /// Generations shown when no depth is requested
    pub default_depth: usize,
}

/// Handling of code edits and deletes on a `usada` ring.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum BoundRingPolicy {
    /// Allow; the bird keeps its old display code
    #[default]
    KeepStale,
    /// Refuse with `InventoryError::RingBound`
    Forbid,
    /// Allow and rewrite (or clear) the bird's display code in the same unit of work
    Cascade,
}

// ═══════════════════════════════════════════════════════════════════════════
// DEFAULTS
// ═══════════════════════════════════════════════════════════════════════════

impl InventoryConfig {
    pub const DEFAULT_RANGE_CEILING: u64 = 2000;
    pub const MAX_RANGE_CEILING: u64 = 100_000;
}

impl Default for InventoryConfig {
    fn default() -> Self {
        Self {
            range_ceiling: Self::DEFAULT_RANGE_CEILING,
            enforce_unique_codes: true,
            bound_ring_policy: BoundRingPolicy::default(),
        }
    }
}

impl GenealogyConfig {
    pub const DEFAULT_DEPTH: usize = 3;
    /// Deepest generation any tree request may ask for.
    pub const MAX_DEPTH: usize = MAX_DEPTH;
}

impl Default for GenealogyConfig {
    fn default() -> Self {
        Self {
            default_depth: Self::DEFAULT_DEPTH,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// PARTIAL CONFIG
// ═══════════════════════════════════════════════════════════════════════════

/// One config file as read from disk, with `Option<T>` fields.
///
/// Only keys present in the TOML are `Some(value)`; missing keys stay `None`
/// and do not override lower-precedence values.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct PartialConfig {
    #[serde(default)]
    pub inventory: Option<PartialInventoryConfig>,
    #[serde(default)]
    pub genealogy: Option<PartialGenealogyConfig>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct PartialInventoryConfig {
    #[serde(default)]
    pub range_ceiling: Option<u64>,
    #[serde(default)]
    pub enforce_unique_codes: Option<bool>,
    #[serde(default)]
    pub bound_ring_policy: Option<BoundRingPolicy>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct PartialGenealogyConfig {
    #[serde(default)]
    pub default_depth: Option<usize>,
}

// ═══════════════════════════════════════════════════════════════════════════
// MERGE
// ═══════════════════════════════════════════════════════════════════════════

impl Config {
    /// Merge a partial config into this one. Every key it sets wins, even
    /// one set back to its default.
    pub fn merge_partial(&mut self, partial: PartialConfig) {
        if let Some(inventory) = partial.inventory {
            self.inventory.merge_partial(inventory);
        }
        if let Some(genealogy) = partial.genealogy {
            self.genealogy.merge_partial(genealogy);
        }
    }
}

impl InventoryConfig {
    fn merge_partial(&mut self, partial: PartialInventoryConfig) {
        if let Some(range_ceiling) = partial.range_ceiling {
            self.range_ceiling = range_ceiling;
        }
        if let Some(enforce_unique_codes) = partial.enforce_unique_codes {
            self.enforce_unique_codes = enforce_unique_codes;
        }
        if let Some(bound_ring_policy) = partial.bound_ring_policy {
            self.bound_ring_policy = bound_ring_policy;
        }
    }
}

impl GenealogyConfig {
    fn merge_partial(&mut self, partial: PartialGenealogyConfig) {
        if let Some(default_depth) = partial.default_depth {
            self.default_depth = default_depth;
        }
    }
}
