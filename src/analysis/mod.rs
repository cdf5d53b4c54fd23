//! Derived analytics over compositions: synergy grouping, recommendations,
//! performance ratings, and multi-build comparison.

mod compare;
mod synergy;

pub use compare::{compare, ComparisonEntry, ComparisonReport, ComparisonWinners};
pub use synergy::{synergy_groups, SynergyGroup};

use serde::{Deserialize, Serialize};

use crate::engine::compose::{ComposeOptions, CompositionResult};
use crate::engine::Engine;
use crate::error::EngineError;
use crate::model::{CombatContext, Rarity};
use crate::validate::SelectionSummary;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MultiplierTier {
    Poor,
    BelowAverage,
    Average,
    Good,
    Excellent,
    Exceptional,
}

impl MultiplierTier {
    pub fn from_multiplier(multiplier: f64) -> Self {
        if multiplier < 1.2 {
            Self::Poor
        } else if multiplier < 1.5 {
            Self::BelowAverage
        } else if multiplier < 2.0 {
            Self::Average
        } else if multiplier < 2.5 {
            Self::Good
        } else if multiplier < 3.0 {
            Self::Excellent
        } else {
            Self::Exceptional
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DifficultyTier {
    Easy,
    Moderate,
    Hard,
    VeryHard,
}

impl DifficultyTier {
    pub fn from_average(average_difficulty: f64) -> Self {
        if average_difficulty < 3.0 {
            Self::Easy
        } else if average_difficulty < 6.0 {
            Self::Moderate
        } else if average_difficulty < 8.0 {
            Self::Hard
        } else {
            Self::VeryHard
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerformanceRating {
    pub multiplier_tier: MultiplierTier,
    pub difficulty_tier: DifficultyTier,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationArea {
    Performance,
    Difficulty,
    Complexity,
    Rarity,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub area: RecommendationArea,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub composition: CompositionResult,
    pub summary: SelectionSummary,
    pub synergies: Vec<SynergyGroup>,
    pub recommendations: Vec<Recommendation>,
    pub rating: PerformanceRating,
}

/// Full analysis of one selection: composition plus synergy grouping,
/// recommendations, and rating buckets.
pub fn analyze(
    engine: &Engine,
    relic_ids: &[String],
    context: Option<&CombatContext>,
) -> Result<AnalysisReport, EngineError> {
    let bundle = engine.validate(relic_ids, context, false)?;
    let composition = engine.compose(relic_ids, context, &ComposeOptions::default())?;

    let synergies = synergy_groups(&bundle.relics);
    let rating = PerformanceRating {
        multiplier_tier: MultiplierTier::from_multiplier(composition.total_multiplier),
        difficulty_tier: DifficultyTier::from_average(bundle.summary.average_difficulty),
    };
    let recommendations = recommendations_for(&composition, &bundle.summary, rating);

    Ok(AnalysisReport {
        composition,
        summary: bundle.summary,
        synergies,
        recommendations,
        rating,
    })
}

fn recommendations_for(
    composition: &CompositionResult,
    summary: &SelectionSummary,
    rating: PerformanceRating,
) -> Vec<Recommendation> {
    let mut recommendations = Vec::new();

    let performance_message = match rating.multiplier_tier {
        MultiplierTier::Poor | MultiplierTier::BelowAverage => {
            "multiplier is low; add multiplicative or percentage attack effects".to_string()
        }
        MultiplierTier::Average | MultiplierTier::Good => {
            "solid multiplier; a weapon-specific or overwrite effect could push it higher"
                .to_string()
        }
        MultiplierTier::Excellent | MultiplierTier::Exceptional => format!(
            "multiplier {:.3} is near the top of its bracket",
            composition.total_multiplier
        ),
    };
    recommendations.push(Recommendation {
        area: RecommendationArea::Performance,
        message: performance_message,
    });

    let difficulty_message = match rating.difficulty_tier {
        DifficultyTier::Easy => "all relics are easy to obtain".to_string(),
        DifficultyTier::Moderate => "moderate farming effort required".to_string(),
        DifficultyTier::Hard | DifficultyTier::VeryHard => format!(
            "average obtainment difficulty {:.1} is steep; consider cheaper substitutes",
            summary.average_difficulty
        ),
    };
    recommendations.push(Recommendation {
        area: RecommendationArea::Difficulty,
        message: difficulty_message,
    });

    if !composition.conditional_effects.is_empty() {
        recommendations.push(Recommendation {
            area: RecommendationArea::Complexity,
            message: format!(
                "{} conditional effect(s) only pay off when their conditions hold",
                composition.conditional_effects.len()
            ),
        });
    }

    let legendary_count = summary
        .rarity_counts
        .get(&Rarity::Legendary)
        .copied()
        .unwrap_or(0);
    if legendary_count == 0 {
        recommendations.push(Recommendation {
            area: RecommendationArea::Rarity,
            message: "no legendary relics selected; higher rarities carry stronger effects"
                .to_string(),
        });
    }

    recommendations
}
