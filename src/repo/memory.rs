use std::collections::BTreeMap;

use crate::error::EngineError;
use crate::model::Relic;
use crate::repo::{RelicFilter, RelicRepository};

/// BTreeMap-backed repository. Enumeration order is ascending id, which
/// keeps candidate generation and tests deterministic.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRelicRepository {
    relics: BTreeMap<String, Relic>,
}

impl InMemoryRelicRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, relic: Relic) {
        self.relics.insert(relic.id.clone(), relic);
    }

    pub fn len(&self) -> usize {
        self.relics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.relics.is_empty()
    }

    /// Clone with inactive effects stripped, per the repository contract.
    fn load(&self, relic: &Relic) -> Relic {
        let mut loaded = relic.clone();
        loaded.effects.retain(|effect| effect.active);
        loaded
    }
}

impl FromIterator<Relic> for InMemoryRelicRepository {
    fn from_iter<I: IntoIterator<Item = Relic>>(iter: I) -> Self {
        let mut repo = Self::new();
        for relic in iter {
            repo.insert(relic);
        }
        repo
    }
}

impl RelicRepository for InMemoryRelicRepository {
    fn get_relics_by_ids(&self, ids: &[String]) -> Result<Vec<Relic>, EngineError> {
        Ok(ids
            .iter()
            .filter_map(|id| self.relics.get(id).map(|relic| self.load(relic)))
            .collect())
    }

    fn list_relics(&self, filter: &RelicFilter) -> Result<Vec<Relic>, EngineError> {
        Ok(self
            .relics
            .values()
            .filter(|relic| filter.matches(relic))
            .map(|relic| self.load(relic))
            .collect())
    }

    fn get_relic(&self, id: &str) -> Result<Option<Relic>, EngineError> {
        Ok(self.relics.get(id).map(|relic| self.load(relic)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Category, Effect, EffectType, Quality, Rarity, StackingRule};

    fn relic(id: &str, category: Category, difficulty: u8) -> Relic {
        Relic {
            id: id.to_string(),
            name: format!("Relic {id}"),
            description: String::new(),
            category,
            rarity: Rarity::Rare,
            quality: Quality::Polished,
            icon_url: None,
            obtainment_difficulty: difficulty,
            conflicts: Vec::new(),
            active: true,
            effects: vec![Effect {
                id: format!("{id}_fx"),
                name: format!("{id} bonus"),
                description: String::new(),
                effect_type: EffectType::AttackPercentage,
                value: 10.0,
                stacking_rule: StackingRule::Additive,
                priority: 0,
                damage_types: Vec::new(),
                conditions: Vec::new(),
                active: true,
            }],
        }
    }

    #[test]
    fn batch_lookup_preserves_caller_order_and_drops_missing() {
        let repo: InMemoryRelicRepository = [
            relic("zeta", Category::Attack, 3),
            relic("alpha", Category::Attack, 3),
        ]
        .into_iter()
        .collect();

        let loaded = repo
            .get_relics_by_ids(&[
                "zeta".to_string(),
                "ghost".to_string(),
                "alpha".to_string(),
            ])
            .unwrap();
        let ids: Vec<&str> = loaded.iter().map(|relic| relic.id.as_str()).collect();
        assert_eq!(ids, vec!["zeta", "alpha"]);
    }

    #[test]
    fn inactive_effects_are_stripped_on_load() {
        let mut seeded = relic("alpha", Category::Attack, 3);
        seeded.effects[0].active = false;
        let repo: InMemoryRelicRepository = [seeded].into_iter().collect();

        let loaded = repo.get_relic("alpha").unwrap().unwrap();
        assert!(loaded.effects.is_empty());
    }

    #[test]
    fn filter_applies_difficulty_and_category() {
        let repo: InMemoryRelicRepository = [
            relic("easy", Category::Attack, 2),
            relic("hard", Category::Attack, 9),
            relic("shield", Category::Defense, 2),
        ]
        .into_iter()
        .collect();

        let filter = RelicFilter {
            categories: vec![Category::Attack],
            difficulty_range: Some((1, 5)),
            ..RelicFilter::active_only()
        };
        let listed = repo.list_relics(&filter).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, "easy");
    }

    #[test]
    fn enumeration_is_sorted_by_id() {
        let repo: InMemoryRelicRepository = [
            relic("zeta", Category::Attack, 3),
            relic("alpha", Category::Attack, 3),
            relic("mid", Category::Attack, 3),
        ]
        .into_iter()
        .collect();

        let listed = repo.list_relics(&RelicFilter::default()).unwrap();
        let ids: Vec<&str> = listed.iter().map(|relic| relic.id.as_str()).collect();
        assert_eq!(ids, vec!["alpha", "mid", "zeta"]);
    }
}
