use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::EngineError;
use crate::model::relic::MAX_RELICS_PER_SELECTION;

/// One slot of a build: the join between a build and a relic. Owns its
/// position and optional per-slot condition overrides, nothing else.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildSlot {
    pub relic_id: String,
    pub position: u32,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub condition_overrides: BTreeMap<String, Value>,
}

/// A user-saved ordered selection of at most nine relics.
///
/// Invariants: no duplicate relic, no duplicate position, positions dense
/// `0..n-1` after every insert/remove. Mutators re-establish density.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Build {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub slots: Vec<BuildSlot>,
}

impl Build {
    pub const MAX_SLOTS: usize = MAX_RELICS_PER_SELECTION;

    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            slots: Vec::new(),
        }
    }

    /// Relic ids in position order.
    pub fn relic_ids(&self) -> Vec<String> {
        let mut ordered = self.slots.clone();
        ordered.sort_by_key(|slot| slot.position);
        ordered.into_iter().map(|slot| slot.relic_id).collect()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Inserts a relic at `position` (clamped to the end), shifting later
    /// slots down and renumbering to keep positions dense.
    pub fn insert(&mut self, relic_id: impl Into<String>, position: u32) -> Result<(), EngineError> {
        let relic_id = relic_id.into();
        if self.slots.len() >= Self::MAX_SLOTS {
            return Err(EngineError::InvalidBuildSize {
                reason: format!("build already holds {} slots", Self::MAX_SLOTS),
            });
        }
        if self.slots.iter().any(|slot| slot.relic_id == relic_id) {
            return Err(EngineError::DuplicateRelics {
                ids: vec![relic_id],
            });
        }

        let index = (position as usize).min(self.slots.len());
        self.slots.sort_by_key(|slot| slot.position);
        self.slots.insert(
            index,
            BuildSlot {
                relic_id,
                position: index as u32,
                condition_overrides: BTreeMap::new(),
            },
        );
        self.renumber();
        Ok(())
    }

    pub fn remove(&mut self, relic_id: &str) -> Result<BuildSlot, EngineError> {
        let index = self
            .slots
            .iter()
            .position(|slot| slot.relic_id == relic_id)
            .ok_or_else(|| EngineError::RelicNotFound {
                ids: vec![relic_id.to_string()],
            })?;
        self.slots.sort_by_key(|slot| slot.position);
        let removed = self.slots.remove(index);
        self.renumber();
        Ok(removed)
    }

    /// Checks all invariants on an externally constructed build.
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.slots.len() > Self::MAX_SLOTS {
            return Err(EngineError::InvalidBuildSize {
                reason: format!(
                    "{} slots exceeds the {}-slot limit",
                    self.slots.len(),
                    Self::MAX_SLOTS
                ),
            });
        }

        let mut seen_relics = BTreeSet::new();
        let mut duplicates = Vec::new();
        for slot in &self.slots {
            if !seen_relics.insert(slot.relic_id.as_str()) {
                duplicates.push(slot.relic_id.clone());
            }
        }
        if !duplicates.is_empty() {
            duplicates.sort();
            duplicates.dedup();
            return Err(EngineError::DuplicateRelics { ids: duplicates });
        }

        let mut positions: Vec<u32> = self.slots.iter().map(|slot| slot.position).collect();
        positions.sort_unstable();
        for (expected, actual) in positions.iter().enumerate() {
            if *actual != expected as u32 {
                return Err(EngineError::InvalidBuildSize {
                    reason: format!(
                        "slot positions are not dense: expected {expected}, found {actual}"
                    ),
                });
            }
        }
        Ok(())
    }

    fn renumber(&mut self) {
        for (index, slot) in self.slots.iter_mut().enumerate() {
            slot.position = index as u32;
        }
    }
}
