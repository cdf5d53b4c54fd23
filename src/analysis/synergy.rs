use serde::{Deserialize, Serialize};

use crate::model::{EffectType, Relic, StackingRule};

pub const SYNERGY_MIN_COUNT: usize = 2;
pub const SYNERGY_COUNT_WEIGHT: f64 = 10.0;
pub const SYNERGY_VALUE_WEIGHT: f64 = 0.1;
pub const SYNERGY_ADDITIVE_WEIGHT: f64 = 5.0;

/// Effects of one type appearing across the selection often enough to
/// reinforce each other.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynergyGroup {
    pub effect_type: EffectType,
    pub count: usize,
    pub total_value: f64,
    pub additive_count: usize,
    pub score: f64,
    pub effect_names: Vec<String>,
}

/// Groups active effects by type; a group forms at two or more members.
/// Score rewards member count, summed value, and additive stacking.
pub fn synergy_groups(relics: &[Relic]) -> Vec<SynergyGroup> {
    let mut groups: Vec<SynergyGroup> = Vec::new();
    for relic in relics {
        for effect in relic.active_effects() {
            let entry = match groups
                .iter_mut()
                .find(|group| group.effect_type == effect.effect_type)
            {
                Some(existing) => existing,
                None => {
                    groups.push(SynergyGroup {
                        effect_type: effect.effect_type,
                        count: 0,
                        total_value: 0.0,
                        additive_count: 0,
                        score: 0.0,
                        effect_names: Vec::new(),
                    });
                    groups.last_mut().expect("group was just pushed")
                }
            };
            entry.count += 1;
            entry.total_value += effect.value;
            if effect.stacking_rule == StackingRule::Additive {
                entry.additive_count += 1;
            }
            entry.effect_names.push(effect.name.clone());
        }
    }

    groups.retain(|group| group.count >= SYNERGY_MIN_COUNT);
    for group in &mut groups {
        group.score = group.count as f64 * SYNERGY_COUNT_WEIGHT
            + group.total_value * SYNERGY_VALUE_WEIGHT
            + group.additive_count as f64 * SYNERGY_ADDITIVE_WEIGHT;
    }
    groups.sort_by(|left, right| {
        right
            .score
            .total_cmp(&left.score)
            .then_with(|| left.effect_type.cmp(&right.effect_type))
    });
    groups
}
