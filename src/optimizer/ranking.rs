//! Ranks evaluated candidates into user-facing suggestions.

use serde::{Deserialize, Serialize};

use crate::engine::compose::{round_to_3, CompositionResult};
use crate::model::{Rarity, Relic};
use crate::optimizer::OptimizationPreferences;

pub const BASE_CONFIDENCE: f64 = 0.5;
pub const CONFIDENCE_IMPROVEMENT_CAP: f64 = 0.3;
pub const CONDITIONAL_CONFIDENCE_PENALTY: f64 = 0.05;
pub const WARNING_CONFIDENCE_PENALTY: f64 = 0.1;
/// Effects below this value are left out of explanations.
pub const EXPLANATION_VALUE_FLOOR: f64 = 10.0;

#[derive(Debug, Clone)]
pub struct EvaluatedCandidate {
    pub relic_ids: Vec<String>,
    pub relics: Vec<Relic>,
    pub result: CompositionResult,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildSuggestion {
    pub relic_ids: Vec<String>,
    pub relics: Vec<Relic>,
    pub estimated_improvement: f64,
    pub explanation: String,
    pub difficulty_rating: f64,
    pub pros: Vec<String>,
    pub cons: Vec<String>,
    pub confidence: f64,
}

/// Keeps candidates clearing the improvement threshold, sorts them best
/// first, and assembles the suggestion payloads.
pub fn rank_suggestions(
    evaluated: Vec<EvaluatedCandidate>,
    current_multiplier: f64,
    min_improvement: f64,
    preferences: &OptimizationPreferences,
    limit: usize,
) -> Vec<BuildSuggestion> {
    let mut ranked: Vec<(f64, f64, EvaluatedCandidate)> = evaluated
        .into_iter()
        .filter_map(|candidate| {
            let improvement = round_to_3(candidate.result.total_multiplier - current_multiplier);
            if improvement < min_improvement {
                return None;
            }
            let difficulty = average_difficulty(&candidate.relics);
            Some((improvement, difficulty, candidate))
        })
        .collect();

    ranked.sort_by(|left, right| {
        let ordering = right.0.total_cmp(&left.0);
        let ordering = if preferences.prefer_low_difficulty {
            ordering.then_with(|| left.1.total_cmp(&right.1))
        } else {
            ordering
        };
        let ordering = if preferences.prefer_high_rarity {
            ordering.then_with(|| rarity_score(&right.2.relics).cmp(&rarity_score(&left.2.relics)))
        } else {
            ordering
        };
        ordering.then_with(|| left.2.relic_ids.cmp(&right.2.relic_ids))
    });
    ranked.truncate(limit);

    ranked
        .into_iter()
        .map(|(improvement, difficulty, candidate)| {
            build_suggestion(candidate, improvement, difficulty)
        })
        .collect()
}

fn build_suggestion(
    candidate: EvaluatedCandidate,
    improvement: f64,
    difficulty: f64,
) -> BuildSuggestion {
    let explanation = explanation_for(&candidate.result, improvement);
    let confidence = confidence_for(&candidate.result, improvement);
    let pros = pros_for(&candidate, improvement, difficulty);
    let cons = cons_for(&candidate, difficulty);

    BuildSuggestion {
        relic_ids: candidate.relic_ids,
        relics: candidate.relics,
        estimated_improvement: improvement,
        explanation,
        difficulty_rating: difficulty,
        pros,
        cons,
        confidence,
    }
}

fn explanation_for(result: &CompositionResult, improvement: f64) -> String {
    let percent = improvement * 100.0;
    let mut contributors: Vec<(&str, f64)> = result
        .stacking_bonuses
        .iter()
        .flat_map(|bonus| bonus.contributions.iter())
        .filter(|contribution| contribution.value > EXPLANATION_VALUE_FLOOR)
        .map(|contribution| (contribution.effect_name.as_str(), contribution.value))
        .collect();
    contributors.sort_by(|left, right| {
        right
            .1
            .total_cmp(&left.1)
            .then_with(|| left.0.cmp(right.0))
    });
    contributors.dedup_by(|probe, kept| probe.0 == kept.0);
    contributors.truncate(3);

    if contributors.is_empty() {
        format!("+{percent:.1}% attack power over the current build")
    } else {
        let names: Vec<&str> = contributors.iter().map(|(name, _)| *name).collect();
        format!(
            "+{percent:.1}% attack power over the current build, driven by {}",
            names.join(", ")
        )
    }
}

/// Starts at 0.5, rewarded for improvement, penalized for conditional
/// effects and warnings, clamped to [0.1, 1.0].
fn confidence_for(result: &CompositionResult, improvement: f64) -> f64 {
    let mut confidence = BASE_CONFIDENCE;
    confidence += (improvement * 2.0).min(CONFIDENCE_IMPROVEMENT_CAP);
    confidence -= CONDITIONAL_CONFIDENCE_PENALTY * result.conditional_effects.len() as f64;
    if !result.warnings.is_empty() {
        confidence -= WARNING_CONFIDENCE_PENALTY;
    }
    confidence.clamp(0.1, 1.0)
}

fn pros_for(candidate: &EvaluatedCandidate, improvement: f64, difficulty: f64) -> Vec<String> {
    let mut pros = Vec::new();
    if improvement >= 0.5 {
        pros.push("large damage gain".to_string());
    }
    if difficulty <= 3.0 {
        pros.push("easy to obtain".to_string());
    }
    let legendary_count = candidate
        .relics
        .iter()
        .filter(|relic| relic.rarity == Rarity::Legendary)
        .count();
    if legendary_count >= 2 {
        pros.push(format!("{legendary_count} legendary relics"));
    }
    if pros.is_empty() {
        pros.push(format!(
            "raises the total multiplier to {:.3}",
            candidate.result.total_multiplier
        ));
    }
    pros
}

fn cons_for(candidate: &EvaluatedCandidate, difficulty: f64) -> Vec<String> {
    let mut cons = Vec::new();
    if difficulty >= 7.0 {
        cons.push("hard to obtain".to_string());
    }
    if !candidate.result.conditional_effects.is_empty() {
        cons.push(format!(
            "depends on {} conditional effect(s)",
            candidate.result.conditional_effects.len()
        ));
    }
    if !candidate.result.warnings.is_empty() {
        cons.push("composition produced warnings".to_string());
    }
    cons
}

fn average_difficulty(relics: &[Relic]) -> f64 {
    if relics.is_empty() {
        return 0.0;
    }
    let total: u32 = relics
        .iter()
        .map(|relic| u32::from(relic.obtainment_difficulty))
        .sum();
    f64::from(total) / relics.len() as f64
}

fn rarity_score(relics: &[Relic]) -> u32 {
    relics
        .iter()
        .map(|relic| u32::from(relic.rarity.rank()))
        .sum()
}
