//! Engine facade: validation, cached composition, optimization, analysis.

pub mod breakdown;
pub mod compose;
pub mod conditions;
pub mod deadline;
pub mod dispatch;

pub use breakdown::{
    BreakdownOp, BreakdownStep, ConditionalEffectNote, EffectContribution, StackingBonus,
};
pub use compose::{ComposeOptions, CompositionResult};
pub use deadline::Deadline;
pub use dispatch::{DispatchTable, GroupProcessor, RouteTable, ValueRoute};

use std::time::Duration as StdDuration;

use serde_json::json;

use crate::analysis::{self, AnalysisReport, ComparisonReport};
use crate::cache::{composition_key, CompositionCache as _, DEFAULT_TTL_SECONDS};
use crate::deps::EngineDeps;
use crate::error::EngineError;
use crate::model::CombatContext;
use crate::optimizer::{self, OptimizationOutcome, OptimizationRequest};
use crate::validate::{validate_selection, PreprocessBundle};

/// Stamped into every cache entry; bumping it orphans all prior results.
pub const ENGINE_VERSION: &str = "2.1.0";

pub const DEFAULT_COMPOSITION_TIMEOUT: StdDuration = StdDuration::from_secs(5);
pub const DEFAULT_OPTIMIZATION_BUDGET: StdDuration = StdDuration::from_secs(10);
pub const DEFAULT_MAX_EVALUATIONS: usize = 1000;
pub const DEFAULT_MIN_IMPROVEMENT: f64 = 0.05;
pub const DEFAULT_SUGGESTION_LIMIT: usize = 5;

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub composition_timeout: StdDuration,
    pub optimization_budget: StdDuration,
    pub max_evaluations: usize,
    pub min_improvement: f64,
    pub suggestion_limit: usize,
    pub cache_ttl: chrono::Duration,
    /// Evaluate optimization candidates on the rayon pool. Results are
    /// set-equivalent to the sequential path.
    pub parallel_candidates: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            composition_timeout: DEFAULT_COMPOSITION_TIMEOUT,
            optimization_budget: DEFAULT_OPTIMIZATION_BUDGET,
            max_evaluations: DEFAULT_MAX_EVALUATIONS,
            min_improvement: DEFAULT_MIN_IMPROVEMENT,
            suggestion_limit: DEFAULT_SUGGESTION_LIMIT,
            cache_ttl: chrono::Duration::seconds(DEFAULT_TTL_SECONDS),
            parallel_candidates: false,
        }
    }
}

pub struct Engine {
    deps: EngineDeps,
    config: EngineConfig,
    table: DispatchTable,
}

impl Engine {
    pub fn new(deps: EngineDeps) -> Self {
        Self::with_config(deps, EngineConfig::default())
    }

    pub fn with_config(deps: EngineDeps, config: EngineConfig) -> Self {
        Self {
            deps,
            config,
            table: DispatchTable::default(),
        }
    }

    pub fn deps(&self) -> &EngineDeps {
        &self.deps
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn dispatch_table(&self) -> &DispatchTable {
        &self.table
    }

    /// Validates a selection and returns the preprocessing bundle.
    pub fn validate(
        &self,
        relic_ids: &[String],
        context: Option<&CombatContext>,
        strict: bool,
    ) -> Result<PreprocessBundle, EngineError> {
        if let Some(context) = context {
            context.validate()?;
        }
        validate_selection(self.deps.repo.as_ref(), relic_ids, context, strict)
    }

    /// Cached composition under the configured timeout. An empty selection
    /// is the base case: multiplier 1.0 over the context's attack power.
    pub fn compose(
        &self,
        relic_ids: &[String],
        context: Option<&CombatContext>,
        options: &ComposeOptions,
    ) -> Result<CompositionResult, EngineError> {
        self.compose_with_deadline(
            relic_ids,
            context,
            options,
            Deadline::after(self.config.composition_timeout),
        )
    }

    pub(crate) fn compose_with_deadline(
        &self,
        relic_ids: &[String],
        context: Option<&CombatContext>,
        options: &ComposeOptions,
        deadline: Deadline,
    ) -> Result<CompositionResult, EngineError> {
        let default_context = CombatContext::default();
        let context = context.unwrap_or(&default_context);
        context.validate()?;

        if relic_ids.is_empty() {
            return compose::compose_relics(&[], context, options, &self.table, deadline);
        }

        let bundle =
            validate_selection(self.deps.repo.as_ref(), relic_ids, Some(context), false)?;
        let normalized = context.normalized();
        let key = composition_key(relic_ids, &normalized, ENGINE_VERSION)?;

        if !options.force_recalculate {
            if let Some(entry) = self.deps.cache.lookup(&key) {
                match serde_json::from_value::<CompositionResult>(entry.result_snapshot.clone()) {
                    Ok(result) => return Ok(result),
                    Err(err) => {
                        tracing::warn!(%key, error = %err, "cached result failed to decode, recomputing");
                    }
                }
            }
        }

        let result =
            compose::compose_relics(&bundle.relics, context, options, &self.table, deadline)?;

        let mut sorted_ids: Vec<&str> = relic_ids.iter().map(String::as_str).collect();
        sorted_ids.sort_unstable();
        let input_snapshot = json!({ "relic_ids": sorted_ids, "context": normalized });
        match serde_json::to_value(&result) {
            Ok(result_snapshot) => {
                if let Err(err) = self.deps.cache.store(
                    &key,
                    input_snapshot,
                    result_snapshot,
                    ENGINE_VERSION,
                    self.config.cache_ttl,
                ) {
                    tracing::warn!(%key, error = %err, "cache store failed, returning uncached result");
                }
            }
            Err(err) => {
                tracing::warn!(%key, error = %err, "result snapshot serialization failed, skipping cache store");
            }
        }

        Ok(result)
    }

    pub fn optimize(
        &self,
        request: &OptimizationRequest,
    ) -> Result<OptimizationOutcome, EngineError> {
        optimizer::run(self, request)
    }

    pub fn analyze(
        &self,
        relic_ids: &[String],
        context: Option<&CombatContext>,
    ) -> Result<AnalysisReport, EngineError> {
        analysis::analyze(self, relic_ids, context)
    }

    pub fn compare(
        &self,
        combinations: &[Vec<String>],
        context: Option<&CombatContext>,
    ) -> Result<ComparisonReport, EngineError> {
        analysis::compare(self, combinations, context)
    }
}
