//! Read-only relic lookup consumed by the engine. The engine never mutates
//! loaded relics; write paths live with the CRUD surface outside this crate.

mod memory;

pub use memory::InMemoryRelicRepository;

use crate::error::EngineError;
use crate::model::{Category, EffectType, Quality, Rarity, Relic};

/// Enumeration filter for candidate sourcing. Empty vec means "any".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RelicFilter {
    pub active: Option<bool>,
    pub categories: Vec<Category>,
    pub rarities: Vec<Rarity>,
    pub qualities: Vec<Quality>,
    pub difficulty_range: Option<(u8, u8)>,
    pub effect_types: Vec<EffectType>,
    pub exclude_ids: Vec<String>,
    pub name_substring: Option<String>,
}

impl RelicFilter {
    pub fn active_only() -> Self {
        Self {
            active: Some(true),
            ..Self::default()
        }
    }

    pub fn matches(&self, relic: &Relic) -> bool {
        if let Some(active) = self.active {
            if relic.active != active {
                return false;
            }
        }
        if !self.categories.is_empty() && !self.categories.contains(&relic.category) {
            return false;
        }
        if !self.rarities.is_empty() && !self.rarities.contains(&relic.rarity) {
            return false;
        }
        if !self.qualities.is_empty() && !self.qualities.contains(&relic.quality) {
            return false;
        }
        if let Some((low, high)) = self.difficulty_range {
            if relic.obtainment_difficulty < low || relic.obtainment_difficulty > high {
                return false;
            }
        }
        if !self.effect_types.is_empty() {
            let carries_any = relic
                .active_effects()
                .any(|effect| self.effect_types.contains(&effect.effect_type));
            if !carries_any {
                return false;
            }
        }
        if self.exclude_ids.iter().any(|id| id == &relic.id) {
            return false;
        }
        if let Some(needle) = &self.name_substring {
            let needle = needle.to_ascii_lowercase();
            if !relic.name.to_ascii_lowercase().contains(&needle) {
                return false;
            }
        }
        true
    }
}

/// Lookup capability the engine consumes. Returned relics embed only their
/// active effects; missing ids are reported by absence, never by error.
pub trait RelicRepository: Send + Sync {
    /// Batch lookup preserving the order of `ids`. Ids that do not resolve
    /// are simply absent from the result.
    fn get_relics_by_ids(&self, ids: &[String]) -> Result<Vec<Relic>, EngineError>;

    /// Deterministic enumeration (ascending id) of relics passing `filter`.
    fn list_relics(&self, filter: &RelicFilter) -> Result<Vec<Relic>, EngineError>;

    fn get_relic(&self, id: &str) -> Result<Option<Relic>, EngineError>;
}
