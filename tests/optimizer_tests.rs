//! Optimization pipeline over the built-in catalog: candidate coverage,
//! budget handling, constraint filtering, and suggestion invariants.

use std::sync::Arc;
use std::time::Duration;

use reliquary::catalog::seed_repository;
use reliquary::deps::EngineDeps;
use reliquary::engine::{Engine, EngineConfig};
use reliquary::error::EngineError;
use reliquary::model::{Category, CombatStyle};
use reliquary::optimizer::{
    DeadlinePolicy, OptimizationConstraints, OptimizationPreferences, OptimizationRequest,
};

fn catalog_engine() -> Engine {
    let repo = Arc::new(seed_repository().expect("catalog must parse"));
    Engine::new(EngineDeps::new(repo))
}

fn catalog_engine_with(config: EngineConfig) -> Engine {
    let repo = Arc::new(seed_repository().expect("catalog must parse"));
    Engine::with_config(EngineDeps::new(repo), config)
}

fn ids(raw: &[&str]) -> Vec<String> {
    raw.iter().map(|id| id.to_string()).collect()
}

#[test]
fn greenfield_optimization_yields_ranked_suggestions() {
    let engine = catalog_engine();
    let request = OptimizationRequest::new(Vec::new(), CombatStyle::Melee);

    let outcome = engine.optimize(&request).unwrap();
    assert_eq!(outcome.current_rating, 1.0);
    assert!(!outcome.suggestions.is_empty());
    assert!(outcome.suggestions.len() <= 5);
    assert!(outcome.metadata.generated > 0);
    assert!(outcome.metadata.evaluated > 0);

    for pair in outcome.suggestions.windows(2) {
        assert!(pair[0].estimated_improvement >= pair[1].estimated_improvement);
    }
    for suggestion in &outcome.suggestions {
        assert!(suggestion.estimated_improvement >= 0.05);
        assert!(suggestion.relic_ids.len() <= 9);
        assert!((0.1..=1.0).contains(&suggestion.confidence));
        assert!(!suggestion.explanation.is_empty());
        assert!(!suggestion.pros.is_empty());
        for (index, left) in suggestion.relics.iter().enumerate() {
            for right in &suggestion.relics[index + 1..] {
                assert!(!left.conflicts_with(right), "conflicting suggestion");
            }
        }
    }
}

#[test]
fn optimization_is_deterministic() {
    let engine = catalog_engine();
    let request = OptimizationRequest::new(ids(&["wolfpack_totem"]), CombatStyle::Melee);

    let first = engine.optimize(&request).unwrap();
    let second = engine.optimize(&request).unwrap();
    assert_eq!(first.suggestions, second.suggestions);
    assert_eq!(first.current_rating, second.current_rating);
}

#[test]
fn suggestions_improve_on_the_current_build() {
    let engine = catalog_engine();
    let request = OptimizationRequest::new(ids(&["wolfpack_totem"]), CombatStyle::Melee);

    let outcome = engine.optimize(&request).unwrap();
    // 6% additive bonus.
    assert!((outcome.current_rating - 1.06).abs() < 1e-9);
    for suggestion in &outcome.suggestions {
        assert!(suggestion.estimated_improvement >= 0.05);
    }
}

#[test]
fn excluded_relics_never_appear() {
    let engine = catalog_engine();
    let mut request = OptimizationRequest::new(Vec::new(), CombatStyle::Melee);
    request.constraints = OptimizationConstraints {
        max_difficulty: Some(5),
        allowed_categories: Vec::new(),
        exclude_relic_ids: ids(&["bloodied_fang"]),
    };

    let outcome = engine.optimize(&request).unwrap();
    for suggestion in &outcome.suggestions {
        assert!(!suggestion.relic_ids.contains(&"bloodied_fang".to_string()));
        for relic in &suggestion.relics {
            assert!(relic.obtainment_difficulty <= 5);
        }
    }
}

#[test]
fn category_constraint_narrows_the_pool() {
    let engine = catalog_engine();
    let mut request = OptimizationRequest::new(Vec::new(), CombatStyle::Melee);
    request.constraints.allowed_categories = vec![Category::Attack];

    let outcome = engine.optimize(&request).unwrap();
    for suggestion in &outcome.suggestions {
        for relic in &suggestion.relics {
            assert_eq!(relic.category, Category::Attack);
        }
    }
}

#[test]
fn unreachable_improvement_threshold_empties_suggestions() {
    let engine = catalog_engine();
    let mut request = OptimizationRequest::new(Vec::new(), CombatStyle::Melee);
    request.preferences = OptimizationPreferences {
        min_improvement: Some(100.0),
        ..OptimizationPreferences::default()
    };

    let outcome = engine.optimize(&request).unwrap();
    assert!(outcome.suggestions.is_empty());
    assert!(outcome.metadata.evaluated > 0);
}

#[test]
fn exhausted_budget_fails_by_default() {
    let engine = catalog_engine_with(EngineConfig {
        optimization_budget: Duration::ZERO,
        ..EngineConfig::default()
    });
    let request = OptimizationRequest::new(Vec::new(), CombatStyle::Melee);

    assert!(matches!(
        engine.optimize(&request),
        Err(EngineError::OptimizationTimeout)
    ));
}

#[test]
fn exhausted_budget_can_return_partial_results() {
    let engine = catalog_engine_with(EngineConfig {
        optimization_budget: Duration::ZERO,
        ..EngineConfig::default()
    });
    let mut request = OptimizationRequest::new(Vec::new(), CombatStyle::Melee);
    request.deadline_policy = DeadlinePolicy::ReturnPartial;

    let outcome = engine.optimize(&request).unwrap();
    assert!(outcome.metadata.timed_out);
    assert!(outcome.suggestions.is_empty());
}

#[test]
fn evaluation_cap_limits_work() {
    let engine = catalog_engine_with(EngineConfig {
        max_evaluations: 3,
        ..EngineConfig::default()
    });
    let request = OptimizationRequest::new(Vec::new(), CombatStyle::Melee);

    let outcome = engine.optimize(&request).unwrap();
    assert!(outcome.metadata.evaluation_cap_reached);
    assert!(outcome.metadata.evaluated + outcome.metadata.skipped <= 3);
}

#[test]
fn parallel_evaluation_matches_sequential() {
    let sequential = catalog_engine()
        .optimize(&OptimizationRequest::new(Vec::new(), CombatStyle::Melee))
        .unwrap();
    let parallel_engine = catalog_engine_with(EngineConfig {
        parallel_candidates: true,
        ..EngineConfig::default()
    });
    let parallel = parallel_engine
        .optimize(&OptimizationRequest::new(Vec::new(), CombatStyle::Melee))
        .unwrap();

    assert_eq!(sequential.suggestions, parallel.suggestions);
}

#[test]
fn full_build_still_offers_replacements() {
    let engine = catalog_engine();
    // Nine conflict-free catalog relics.
    let current = ids(&[
        "bladesong_sigil",
        "bloodied_fang",
        "colossus_core",
        "emberheart",
        "executioners_mark",
        "gamblers_die",
        "stormcallers_eye",
        "twilight_prism",
        "wolfpack_totem",
    ]);
    let request = OptimizationRequest::new(current.clone(), CombatStyle::Melee);

    let outcome = engine.optimize(&request).unwrap();
    for suggestion in &outcome.suggestions {
        assert!(suggestion.relic_ids.len() <= 9);
        assert_ne!(suggestion.relic_ids, current);
    }
}
