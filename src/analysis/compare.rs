use serde::{Deserialize, Serialize};

use crate::engine::compose::ComposeOptions;
use crate::engine::Engine;
use crate::error::EngineError;
use crate::model::CombatContext;
use crate::repo::RelicRepository as _;

pub const MIN_COMPARISON_COMBINATIONS: usize = 2;
pub const MAX_COMPARISON_COMBINATIONS: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonEntry {
    pub index: usize,
    pub relic_ids: Vec<String>,
    pub relic_count: usize,
    pub total_multiplier: f64,
    /// Multiplier per relic; 0 for an empty combination.
    pub efficiency: f64,
    pub total_difficulty: u32,
}

/// Winning indices into `entries`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparisonWinners {
    pub overall: usize,
    pub most_efficient: usize,
    pub easiest_to_build: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonSummary {
    pub min_multiplier: f64,
    pub max_multiplier: f64,
    pub avg_multiplier: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonReport {
    pub entries: Vec<ComparisonEntry>,
    /// Entry indices ranked best first.
    pub ranked_by_damage: Vec<usize>,
    pub ranked_by_efficiency: Vec<usize>,
    pub ranked_by_difficulty: Vec<usize>,
    pub winners: ComparisonWinners,
    pub summary: ComparisonSummary,
}

/// Evaluates 2..=10 combinations and ranks them on damage, efficiency, and
/// difficulty. A failing combination fails the whole comparison.
pub fn compare(
    engine: &Engine,
    combinations: &[Vec<String>],
    context: Option<&CombatContext>,
) -> Result<ComparisonReport, EngineError> {
    if combinations.len() < MIN_COMPARISON_COMBINATIONS
        || combinations.len() > MAX_COMPARISON_COMBINATIONS
    {
        return Err(EngineError::SelectionLimitExceeded {
            count: combinations.len(),
            min: MIN_COMPARISON_COMBINATIONS,
            max: MAX_COMPARISON_COMBINATIONS,
        });
    }

    let options = ComposeOptions {
        force_recalculate: false,
        include_breakdown: false,
    };
    let mut entries = Vec::with_capacity(combinations.len());
    for (index, combination) in combinations.iter().enumerate() {
        let result = engine.compose(combination, context, &options)?;
        let relics = engine.deps().repo.get_relics_by_ids(combination)?;
        let total_difficulty: u32 = relics
            .iter()
            .map(|relic| u32::from(relic.obtainment_difficulty))
            .sum();
        let efficiency = if combination.is_empty() {
            0.0
        } else {
            result.total_multiplier / combination.len() as f64
        };
        entries.push(ComparisonEntry {
            index,
            relic_ids: combination.clone(),
            relic_count: combination.len(),
            total_multiplier: result.total_multiplier,
            efficiency,
            total_difficulty,
        });
    }

    let ranked_by_damage = ranked_indices(&entries, |left, right| {
        right.total_multiplier.total_cmp(&left.total_multiplier)
    });
    let ranked_by_efficiency = ranked_indices(&entries, |left, right| {
        right.efficiency.total_cmp(&left.efficiency)
    });
    let ranked_by_difficulty = ranked_indices(&entries, |left, right| {
        left.total_difficulty.cmp(&right.total_difficulty)
    });

    let winners = ComparisonWinners {
        overall: ranked_by_damage[0],
        most_efficient: ranked_by_efficiency[0],
        easiest_to_build: ranked_by_difficulty[0],
    };

    let multipliers: Vec<f64> = entries.iter().map(|entry| entry.total_multiplier).collect();
    let min_multiplier = multipliers.iter().copied().fold(f64::INFINITY, f64::min);
    let max_multiplier = multipliers
        .iter()
        .copied()
        .fold(f64::NEG_INFINITY, f64::max);
    let avg_multiplier = multipliers.iter().sum::<f64>() / multipliers.len() as f64;

    Ok(ComparisonReport {
        entries,
        ranked_by_damage,
        ranked_by_efficiency,
        ranked_by_difficulty,
        winners,
        summary: ComparisonSummary {
            min_multiplier,
            max_multiplier,
            avg_multiplier,
        },
    })
}

fn ranked_indices<F>(entries: &[ComparisonEntry], compare: F) -> Vec<usize>
where
    F: Fn(&ComparisonEntry, &ComparisonEntry) -> std::cmp::Ordering,
{
    let mut indices: Vec<usize> = (0..entries.len()).collect();
    indices.sort_by(|left, right| {
        compare(&entries[*left], &entries[*right]).then_with(|| left.cmp(right))
    });
    indices
}
