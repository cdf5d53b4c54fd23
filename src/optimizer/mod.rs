//! Build optimization: candidate generation, budgeted evaluation through
//! the composition engine, and ranking into suggestions.

pub mod candidates;
pub mod ranking;

pub use candidates::{generate_candidates, GeneratedCandidates, SynergyBucket};
pub use ranking::{rank_suggestions, BuildSuggestion, EvaluatedCandidate};

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::engine::compose::ComposeOptions;
use crate::engine::deadline::Deadline;
use crate::engine::Engine;
use crate::error::EngineError;
use crate::model::{Category, CombatContext, CombatStyle, Relic};
use crate::repo::{RelicFilter, RelicRepository as _};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OptimizationConstraints {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_difficulty: Option<u8>,
    #[serde(default)]
    pub allowed_categories: Vec<Category>,
    #[serde(default)]
    pub exclude_relic_ids: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OptimizationPreferences {
    #[serde(default)]
    pub prefer_high_rarity: bool,
    #[serde(default)]
    pub prefer_low_difficulty: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_improvement: Option<f64>,
}

/// What to do when the wall-clock budget expires mid-run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeadlinePolicy {
    /// Surface `OPTIMIZATION_TIMEOUT`.
    #[default]
    Fail,
    /// Return the suggestions accumulated so far.
    ReturnPartial,
}

#[derive(Debug, Clone, Default)]
pub struct OptimizationRequest {
    pub current_ids: Vec<String>,
    pub combat_style: CombatStyle,
    pub constraints: OptimizationConstraints,
    pub preferences: OptimizationPreferences,
    pub context: Option<CombatContext>,
    pub deadline_policy: DeadlinePolicy,
}

impl OptimizationRequest {
    pub fn new(current_ids: Vec<String>, combat_style: CombatStyle) -> Self {
        Self {
            current_ids,
            combat_style,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OptimizationMetadata {
    pub generated: usize,
    pub evaluated: usize,
    pub skipped: usize,
    /// True when the evaluation cap stopped the run before the candidate
    /// list was exhausted.
    pub evaluation_cap_reached: bool,
    /// True when the wall-clock budget expired (only observable under the
    /// return-partial policy).
    pub timed_out: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationOutcome {
    pub suggestions: Vec<BuildSuggestion>,
    pub current_rating: f64,
    pub metadata: OptimizationMetadata,
}

/// Runs the full optimization pipeline for `request`.
pub fn run(engine: &Engine, request: &OptimizationRequest) -> Result<OptimizationOutcome, EngineError> {
    let context = request.context.clone().unwrap_or_default();
    context.validate()?;

    let compose_options = ComposeOptions {
        force_recalculate: false,
        include_breakdown: false,
    };
    let current_rating = if request.current_ids.is_empty() {
        1.0
    } else {
        engine
            .compose(&request.current_ids, Some(&context), &compose_options)?
            .total_multiplier
    };

    let current_relics = engine.deps().repo.get_relics_by_ids(&request.current_ids)?;
    let pool = engine.deps().repo.list_relics(&pool_filter(request))?;
    let generated = generate_candidates(&current_relics, &pool, request.combat_style);

    let deadline = Deadline::after(engine.config().optimization_budget);
    let cap = engine.config().max_evaluations;
    let capped: &[Vec<String>] = &generated.combinations
        [..generated.combinations.len().min(cap)];
    let evaluation_cap_reached = generated.combinations.len() > cap;

    let (evaluated, skipped, timed_out) = if engine.config().parallel_candidates {
        evaluate_parallel(engine, capped, &context, &compose_options, deadline)
    } else {
        evaluate_sequential(engine, capped, &context, &compose_options, deadline)
    };

    if timed_out && request.deadline_policy == DeadlinePolicy::Fail {
        return Err(EngineError::OptimizationTimeout);
    }

    let min_improvement = request
        .preferences
        .min_improvement
        .unwrap_or(engine.config().min_improvement);
    let evaluated_count = evaluated.len();
    let suggestions = rank_suggestions(
        evaluated,
        current_rating,
        min_improvement,
        &request.preferences,
        engine.config().suggestion_limit,
    );

    Ok(OptimizationOutcome {
        suggestions,
        current_rating,
        metadata: OptimizationMetadata {
            generated: generated.combinations.len(),
            evaluated: evaluated_count,
            skipped,
            evaluation_cap_reached,
            timed_out,
        },
    })
}

fn pool_filter(request: &OptimizationRequest) -> RelicFilter {
    RelicFilter {
        active: Some(true),
        categories: request.constraints.allowed_categories.clone(),
        difficulty_range: request
            .constraints
            .max_difficulty
            .map(|max| (1, max)),
        exclude_ids: request.constraints.exclude_relic_ids.clone(),
        ..RelicFilter::default()
    }
}

fn evaluate_sequential(
    engine: &Engine,
    combinations: &[Vec<String>],
    context: &CombatContext,
    options: &ComposeOptions,
    deadline: Deadline,
) -> (Vec<EvaluatedCandidate>, usize, bool) {
    let mut evaluated = Vec::new();
    let mut skipped = 0;
    for combination in combinations {
        if deadline.expired() {
            tracing::warn!(
                evaluated = evaluated.len(),
                remaining = combinations.len() - evaluated.len() - skipped,
                "optimization budget exhausted"
            );
            return (evaluated, skipped, true);
        }
        match evaluate_one(engine, combination, context, options, deadline) {
            Ok(candidate) => evaluated.push(candidate),
            Err(err) => {
                skipped += 1;
                tracing::debug!(combination = ?combination, error = %err, "candidate skipped");
            }
        }
    }
    (evaluated, skipped, false)
}

/// Rayon path: set-equivalent to the sequential loop; candidates that would
/// start after the deadline are dropped the same way.
fn evaluate_parallel(
    engine: &Engine,
    combinations: &[Vec<String>],
    context: &CombatContext,
    options: &ComposeOptions,
    deadline: Deadline,
) -> (Vec<EvaluatedCandidate>, usize, bool) {
    let skipped = AtomicUsize::new(0);
    let timed_out = AtomicBool::new(false);

    let mut evaluated: Vec<(usize, EvaluatedCandidate)> = combinations
        .par_iter()
        .enumerate()
        .filter_map(|(index, combination)| {
            if deadline.expired() {
                timed_out.store(true, Ordering::Relaxed);
                return None;
            }
            match evaluate_one(engine, combination, context, options, deadline) {
                Ok(candidate) => Some((index, candidate)),
                Err(err) => {
                    skipped.fetch_add(1, Ordering::Relaxed);
                    tracing::debug!(combination = ?combination, error = %err, "candidate skipped");
                    None
                }
            }
        })
        .collect();
    evaluated.sort_by_key(|(index, _)| *index);

    (
        evaluated.into_iter().map(|(_, candidate)| candidate).collect(),
        skipped.load(Ordering::Relaxed),
        timed_out.load(Ordering::Relaxed),
    )
}

fn evaluate_one(
    engine: &Engine,
    combination: &[String],
    context: &CombatContext,
    options: &ComposeOptions,
    deadline: Deadline,
) -> Result<EvaluatedCandidate, EngineError> {
    let composition_deadline =
        Deadline::after(engine.config().composition_timeout).earliest(deadline);
    let result =
        engine.compose_with_deadline(combination, Some(context), options, composition_deadline)?;
    let relics: Vec<Relic> = engine.deps().repo.get_relics_by_ids(combination)?;
    Ok(EvaluatedCandidate {
        relic_ids: combination.to_vec(),
        relics,
        result,
    })
}
