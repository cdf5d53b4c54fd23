//! Candidate combination generation: replacement, addition, synergy pairs,
//! and per-style meta builds, unioned and deduped on the sorted id set.

use std::collections::{BTreeMap, BTreeSet};

use crate::model::{CombatStyle, EffectType, Relic};
use crate::model::relic::MAX_RELICS_PER_SELECTION;

/// Pairwise additions are only generated for small current builds.
pub const PAIRWISE_ADDITION_MAX_CURRENT: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SynergyBucket {
    AttackBoost,
    CriticalFocus,
    WeaponSpecific,
    ConditionalDamage,
    ElementalDamage,
}

impl SynergyBucket {
    pub fn for_effect_type(effect_type: EffectType) -> Option<Self> {
        match effect_type {
            EffectType::AttackMultiplier
            | EffectType::AttackFlat
            | EffectType::AttackPercentage => Some(Self::AttackBoost),
            EffectType::CriticalMultiplier | EffectType::CriticalChance => {
                Some(Self::CriticalFocus)
            }
            EffectType::WeaponSpecific => Some(Self::WeaponSpecific),
            EffectType::ConditionalDamage => Some(Self::ConditionalDamage),
            EffectType::ElementalDamage => Some(Self::ElementalDamage),
            EffectType::Unique => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AttackBoost => "attack_boost",
            Self::CriticalFocus => "critical_focus",
            Self::WeaponSpecific => "weapon_specific",
            Self::ConditionalDamage => "conditional_damage",
            Self::ElementalDamage => "elemental_damage",
        }
    }
}

/// The bucket most of a relic's active effects fall into. Ties resolve to
/// the first bucket in enum order.
pub fn dominant_bucket(relic: &Relic) -> Option<SynergyBucket> {
    let mut counts: BTreeMap<SynergyBucket, usize> = BTreeMap::new();
    for effect in relic.active_effects() {
        if let Some(bucket) = SynergyBucket::for_effect_type(effect.effect_type) {
            *counts.entry(bucket).or_default() += 1;
        }
    }
    counts
        .into_iter()
        .max_by(|a, b| a.1.cmp(&b.1).then_with(|| b.0.cmp(&a.0)))
        .map(|(bucket, _)| bucket)
}

/// Canonical per-style relic lists. Filtered down to candidate-pool
/// membership before evaluation; difficulty comes from the repository.
pub fn meta_relic_ids(style: CombatStyle) -> &'static [&'static str] {
    match style {
        CombatStyle::Melee => &[
            "bladesong_sigil",
            "bloodied_fang",
            "colossus_core",
            "duelists_oath",
            "twilight_prism",
        ],
        CombatStyle::Ranged => &[
            "featherweight_charm",
            "gamblers_die",
            "serpents_coil",
            "stormcallers_eye",
        ],
        CombatStyle::Magic => &[
            "emberheart",
            "runehunters_lens",
            "stormcallers_eye",
            "twilight_prism",
        ],
        CombatStyle::Hybrid => &[
            "bladesong_sigil",
            "executioners_mark",
            "twilight_prism",
            "wolfpack_totem",
        ],
    }
}

#[derive(Debug, Default)]
pub struct GeneratedCandidates {
    /// Deduped, pruned, sorted-id combinations in deterministic order.
    pub combinations: Vec<Vec<String>>,
    pub replacement: usize,
    pub addition: usize,
    pub synergy: usize,
    pub meta: usize,
}

struct CandidateCollector<'a> {
    by_id: BTreeMap<&'a str, &'a Relic>,
    current_sorted: Vec<String>,
    seen: BTreeSet<Vec<String>>,
}

impl<'a> CandidateCollector<'a> {
    fn new(current: &'a [Relic], pool: &'a [Relic]) -> Self {
        let mut by_id = BTreeMap::new();
        for relic in current.iter().chain(pool) {
            by_id.insert(relic.id.as_str(), relic);
        }
        let mut current_sorted: Vec<String> =
            current.iter().map(|relic| relic.id.clone()).collect();
        current_sorted.sort();
        Self {
            by_id,
            current_sorted,
            seen: BTreeSet::new(),
        }
    }

    /// Prunes oversize, duplicate-carrying, conflicting, and already-seen
    /// combinations. Returns true when the combination was kept.
    fn push(&mut self, ids: Vec<String>) -> bool {
        let mut sorted = ids;
        sorted.sort();
        let before = sorted.len();
        sorted.dedup();
        if sorted.len() != before || sorted.is_empty() {
            return false;
        }
        if sorted.len() > MAX_RELICS_PER_SELECTION {
            return false;
        }
        if sorted == self.current_sorted {
            return false;
        }
        let relics: Vec<&Relic> = sorted
            .iter()
            .filter_map(|id| self.by_id.get(id.as_str()).copied())
            .collect();
        if relics.len() != sorted.len() {
            return false;
        }
        for (index, left) in relics.iter().enumerate() {
            for right in &relics[index + 1..] {
                if left.conflicts_with(right) {
                    return false;
                }
            }
        }
        self.seen.insert(sorted)
    }
}

/// Runs all four strategies over the candidate pool.
pub fn generate_candidates(
    current: &[Relic],
    pool: &[Relic],
    style: CombatStyle,
) -> GeneratedCandidates {
    let mut collector = CandidateCollector::new(current, pool);
    let mut generated = GeneratedCandidates::default();

    let current_ids: BTreeSet<&str> = current.iter().map(|relic| relic.id.as_str()).collect();
    let fresh: Vec<&Relic> = pool
        .iter()
        .filter(|relic| !current_ids.contains(relic.id.as_str()))
        .collect();

    // Replacement: substitute every fresh candidate into each slot.
    for slot in 0..current.len() {
        for candidate in &fresh {
            let ids: Vec<String> = current
                .iter()
                .enumerate()
                .map(|(index, relic)| {
                    if index == slot {
                        candidate.id.clone()
                    } else {
                        relic.id.clone()
                    }
                })
                .collect();
            if collector.push(ids) {
                generated.replacement += 1;
            }
        }
    }

    // Addition: singletons whenever there is room, pairs for small builds.
    if current.len() < MAX_RELICS_PER_SELECTION {
        for candidate in &fresh {
            let mut ids: Vec<String> = current.iter().map(|relic| relic.id.clone()).collect();
            ids.push(candidate.id.clone());
            if collector.push(ids) {
                generated.addition += 1;
            }
        }
        if current.len() <= PAIRWISE_ADDITION_MAX_CURRENT {
            for (left_index, left) in fresh.iter().enumerate() {
                for right in &fresh[left_index + 1..] {
                    let mut ids: Vec<String> =
                        current.iter().map(|relic| relic.id.clone()).collect();
                    ids.push(left.id.clone());
                    ids.push(right.id.clone());
                    if collector.push(ids) {
                        generated.addition += 1;
                    }
                }
            }
        }
    }

    // Synergy: pairs within a dominant-bucket group, padded with
    // conflict-free current relics.
    let mut buckets: BTreeMap<SynergyBucket, Vec<&Relic>> = BTreeMap::new();
    for candidate in pool {
        if let Some(bucket) = dominant_bucket(candidate) {
            buckets.entry(bucket).or_default().push(candidate);
        }
    }
    for members in buckets.values().filter(|members| members.len() >= 2) {
        for (left_index, left) in members.iter().enumerate() {
            for right in &members[left_index + 1..] {
                if left.id == right.id {
                    continue;
                }
                let mut picked: Vec<&Relic> = vec![*left, *right];
                for existing in current {
                    if picked.len() >= MAX_RELICS_PER_SELECTION {
                        break;
                    }
                    let clashes = picked.iter().any(|member| member.conflicts_with(existing))
                        || picked.iter().any(|member| member.id == existing.id);
                    if !clashes {
                        picked.push(existing);
                    }
                }
                let ids: Vec<String> = picked.iter().map(|relic| relic.id.clone()).collect();
                if collector.push(ids) {
                    generated.synergy += 1;
                }
            }
        }
    }

    // Meta: the canonical list for the style, restricted to the pool.
    let pool_ids: BTreeSet<&str> = pool.iter().map(|relic| relic.id.as_str()).collect();
    let meta_ids: Vec<String> = meta_relic_ids(style)
        .iter()
        .filter(|id| pool_ids.contains(**id))
        .map(|id| id.to_string())
        .collect();
    if !meta_ids.is_empty() && collector.push(meta_ids) {
        generated.meta += 1;
    }

    generated.combinations = collector.seen.into_iter().collect();
    generated
}
