//! End-to-end composition scenarios and algebra over an in-memory fixture
//! repository.

use std::sync::Arc;

use serde_json::json;

use reliquary::deps::EngineDeps;
use reliquary::engine::{BreakdownOp, ComposeOptions, Engine};
use reliquary::error::EngineError;
use reliquary::model::{
    Category, CombatContext, Condition, CountRequirement, DamageType, Effect, EffectType, Quality,
    Rarity, Relic, StackingRule,
};
use reliquary::repo::InMemoryRelicRepository;

fn effect(id: &str, effect_type: EffectType, value: f64, rule: StackingRule) -> Effect {
    Effect {
        id: id.to_string(),
        name: format!("effect {id}"),
        description: String::new(),
        effect_type,
        value,
        stacking_rule: rule,
        priority: 0,
        damage_types: Vec::new(),
        conditions: Vec::new(),
        active: true,
    }
}

fn relic(id: &str, effects: Vec<Effect>) -> Relic {
    Relic {
        id: id.to_string(),
        name: format!("Relic {id}"),
        description: String::new(),
        category: Category::Attack,
        rarity: Rarity::Rare,
        quality: Quality::Polished,
        icon_url: None,
        obtainment_difficulty: 3,
        conflicts: Vec::new(),
        active: true,
        effects,
    }
}

fn engine_of(relics: Vec<Relic>) -> Engine {
    let repo: InMemoryRelicRepository = relics.into_iter().collect();
    Engine::new(EngineDeps::new(Arc::new(repo)))
}

fn ids(raw: &[&str]) -> Vec<String> {
    raw.iter().map(|id| id.to_string()).collect()
}

fn approx_eq(actual: f64, expected: f64, tolerance: f64) {
    assert!(
        (actual - expected).abs() <= tolerance,
        "expected {expected}, got {actual}"
    );
}

#[test]
fn empty_selection_is_the_base_case() {
    let engine = engine_of(Vec::new());
    let result = engine
        .compose(&[], None, &ComposeOptions::default())
        .unwrap();

    assert_eq!(result.total_multiplier, 1.0);
    assert_eq!(result.final_attack_power, 100.0);
    assert_eq!(result.base_multiplier, 1.0);
    assert_eq!(result.damage_by_type[&DamageType::Physical], 100.0);
}

#[test]
fn plain_percentage_ignores_character_level() {
    let engine = engine_of(vec![relic(
        "sigil",
        vec![effect("pct", EffectType::AttackPercentage, 2.0, StackingRule::Additive)],
    )]);
    let mut context = CombatContext::default();
    context.character_level = 50;

    let result = engine
        .compose(&ids(&["sigil"]), Some(&context), &ComposeOptions::default())
        .unwrap();
    // Without the explicit scaling condition the level is irrelevant.
    approx_eq(result.total_multiplier, 1.02, 1e-9);
}

#[test]
fn marked_percentage_scales_with_character_level() {
    let mut scaled = effect("pct", EffectType::AttackPercentage, 2.0, StackingRule::Additive);
    scaled.conditions.push(Condition::EquipmentCount {
        requirement: CountRequirement::CharacterLevel,
        description: String::new(),
    });
    let engine = engine_of(vec![relic("sigil", vec![scaled])]);
    let mut context = CombatContext::default();
    context.character_level = 50;

    let result = engine
        .compose(&ids(&["sigil"]), Some(&context), &ComposeOptions::default())
        .unwrap();
    // 2 * 50 = 100 percent => doubled.
    approx_eq(result.total_multiplier, 2.0, 1e-9);
}

#[test]
fn multiplicative_chain_multiplies() {
    let engine = engine_of(vec![
        relic(
            "first",
            vec![effect("m1", EffectType::AttackMultiplier, 1.2, StackingRule::Multiplicative)],
        ),
        relic(
            "second",
            vec![effect("m2", EffectType::AttackMultiplier, 1.2, StackingRule::Multiplicative)],
        ),
    ]);

    let result = engine
        .compose(&ids(&["first", "second"]), None, &ComposeOptions::default())
        .unwrap();
    approx_eq(result.total_multiplier, 1.44, 1e-9);
}

#[test]
fn weapon_specific_unique_gates_on_weapon() {
    let mut sworn = effect("ws", EffectType::WeaponSpecific, 7.0, StackingRule::Unique);
    sworn.conditions.push(Condition::WeaponType {
        weapon: "straight_sword".to_string(),
        description: String::new(),
    });
    let engine = engine_of(vec![relic("oath", vec![sworn])]);

    let mut sword_context = CombatContext::default();
    sword_context.weapon_type = Some("straight_sword".to_string());
    let with_sword = engine
        .compose(&ids(&["oath"]), Some(&sword_context), &ComposeOptions::default())
        .unwrap();
    approx_eq(with_sword.total_multiplier, 1.07, 1e-9);

    let mut bow_context = CombatContext::default();
    bow_context.weapon_type = Some("bow".to_string());
    let with_bow = engine
        .compose(&ids(&["oath"]), Some(&bow_context), &ComposeOptions::default())
        .unwrap();
    approx_eq(with_bow.total_multiplier, 1.0, 1e-9);
}

#[test]
fn conflicting_pair_is_rejected_with_details() {
    let mut first = relic(
        "alpha",
        vec![effect("a", EffectType::AttackPercentage, 10.0, StackingRule::Additive)],
    );
    first.conflicts.push("beta".to_string());
    let second = relic(
        "beta",
        vec![effect("b", EffectType::AttackPercentage, 10.0, StackingRule::Additive)],
    );
    let engine = engine_of(vec![first, second]);

    let result = engine.compose(&ids(&["alpha", "beta"]), None, &ComposeOptions::default());
    match result {
        Err(EngineError::ConflictingRelics { records }) => {
            assert!(records
                .iter()
                .any(|record| record.relic_id == "alpha"
                    && record.conflicting_ids == vec!["beta"]));
        }
        other => panic!("expected CONFLICTING_RELICS, got {other:?}"),
    }
}

#[test]
fn overwrite_tie_goes_to_smaller_relic_effect_pair() {
    let mut low = effect("fx_low", EffectType::AttackFlat, 30.0, StackingRule::Overwrite);
    low.priority = 5;
    let mut high = effect("fx_high", EffectType::AttackFlat, 50.0, StackingRule::Overwrite);
    high.priority = 5;

    let engine = engine_of(vec![relic("aaa_relic", vec![low]), relic("zzz_relic", vec![high])]);
    let result = engine
        .compose(&ids(&["aaa_relic", "zzz_relic"]), None, &ComposeOptions::default())
        .unwrap();

    // (100 + 30) * 1 * 1
    approx_eq(result.final_attack_power, 130.0, 1e-9);
    approx_eq(result.total_multiplier, 1.3, 1e-9);
}

#[test]
fn overwrite_prefers_higher_priority() {
    let mut weak = effect("fx_weak", EffectType::AttackFlat, 50.0, StackingRule::Overwrite);
    weak.priority = 3;
    let mut strong = effect("fx_strong", EffectType::AttackFlat, 20.0, StackingRule::Overwrite);
    strong.priority = 7;

    let engine = engine_of(vec![relic("one", vec![weak]), relic("two", vec![strong])]);
    let result = engine
        .compose(&ids(&["one", "two"]), None, &ComposeOptions::default())
        .unwrap();
    approx_eq(result.final_attack_power, 120.0, 1e-9);
}

#[test]
fn additive_subgroup_sums() {
    let engine = engine_of(vec![
        relic(
            "first",
            vec![effect("p1", EffectType::AttackPercentage, 10.0, StackingRule::Additive)],
        ),
        relic(
            "second",
            vec![effect("p2", EffectType::AttackPercentage, 15.0, StackingRule::Additive)],
        ),
    ]);

    let result = engine
        .compose(&ids(&["first", "second"]), None, &ComposeOptions::default())
        .unwrap();
    approx_eq(result.total_multiplier, 1.25, 1e-9);

    let bonus = result
        .stacking_bonuses
        .iter()
        .find(|bonus| bonus.effect_type == EffectType::AttackPercentage)
        .expect("percentage stacking record");
    approx_eq(bonus.accumulated, 25.0, 1e-9);
    assert_eq!(bonus.contributions.len(), 2);
}

#[test]
fn critical_multiplier_chain_reaches_the_multiplier_lane() {
    // Multiplicative stacking is itself a numeric lane, so critical
    // multipliers stack there like any other factor.
    let engine = engine_of(vec![
        relic(
            "first",
            vec![effect("c1", EffectType::CriticalMultiplier, 1.2, StackingRule::Multiplicative)],
        ),
        relic(
            "second",
            vec![effect("c2", EffectType::CriticalMultiplier, 1.3, StackingRule::Multiplicative)],
        ),
    ]);
    let result = engine
        .compose(&ids(&["first", "second"]), None, &ComposeOptions::default())
        .unwrap();
    approx_eq(result.total_multiplier, 1.56, 1e-9);
}

#[test]
fn record_only_types_never_move_the_multiplier() {
    let engine = engine_of(vec![
        relic(
            "dice",
            vec![effect("crit", EffectType::CriticalChance, 12.0, StackingRule::Additive)],
        ),
        relic(
            "storm",
            vec![effect("bolt", EffectType::ElementalDamage, 25.0, StackingRule::Additive)],
        ),
    ]);
    let result = engine
        .compose(&ids(&["dice", "storm"]), None, &ComposeOptions::default())
        .unwrap();

    approx_eq(result.total_multiplier, 1.0, 1e-9);
    // Both sub-groups still appear in the stacking trace.
    assert!(result
        .stacking_bonuses
        .iter()
        .any(|bonus| bonus.effect_type == EffectType::CriticalChance));
    assert!(result
        .stacking_bonuses
        .iter()
        .any(|bonus| bonus.effect_type == EffectType::ElementalDamage));
}

#[test]
fn unknown_condition_disables_effect_without_failing() {
    let mut cursed = effect("fx", EffectType::AttackPercentage, 50.0, StackingRule::Additive);
    cursed.conditions.push(Condition::Unknown {
        raw: json!({"type": "moon_phase", "value": "full"}),
    });
    let engine = engine_of(vec![relic("moonstone", vec![cursed])]);

    let result = engine
        .compose(&ids(&["moonstone"]), None, &ComposeOptions::default())
        .unwrap();
    approx_eq(result.total_multiplier, 1.0, 1e-9);
    assert!(result
        .warnings
        .iter()
        .any(|warning| warning.contains("moon_phase")));
}

#[test]
fn inactive_effects_contribute_nothing() {
    let mut dormant = effect("fx", EffectType::AttackPercentage, 50.0, StackingRule::Additive);
    dormant.active = false;
    let engine = engine_of(vec![relic(
        "sleeper",
        vec![
            dormant,
            effect("live", EffectType::AttackPercentage, 10.0, StackingRule::Additive),
        ],
    )]);

    let result = engine
        .compose(&ids(&["sleeper"]), None, &ComposeOptions::default())
        .unwrap();
    approx_eq(result.total_multiplier, 1.1, 1e-9);
}

#[test]
fn inactive_relic_fails_composition() {
    let mut benched = relic(
        "benched",
        vec![effect("fx", EffectType::AttackPercentage, 10.0, StackingRule::Additive)],
    );
    benched.active = false;
    let engine = engine_of(vec![benched]);

    assert!(matches!(
        engine.compose(&ids(&["benched"]), None, &ComposeOptions::default()),
        Err(EngineError::InactiveRelics { .. })
    ));
}

#[test]
fn ten_relics_are_refused() {
    let relics: Vec<Relic> = (0..10)
        .map(|index| {
            relic(
                &format!("relic_{index}"),
                vec![effect("fx", EffectType::AttackPercentage, 5.0, StackingRule::Additive)],
            )
        })
        .collect();
    let selection: Vec<String> = relics.iter().map(|relic| relic.id.clone()).collect();
    let engine = engine_of(relics);

    assert!(matches!(
        engine.compose(&selection, None, &ComposeOptions::default()),
        Err(EngineError::RelicLimitExceeded { count: 10, limit: 9 })
    ));
}

#[test]
fn repeated_composition_is_byte_identical() {
    let mut sworn = effect("ws", EffectType::WeaponSpecific, 7.0, StackingRule::Unique);
    sworn.conditions.push(Condition::WeaponType {
        weapon: "straight_sword".to_string(),
        description: String::new(),
    });
    let engine = engine_of(vec![
        relic(
            "first",
            vec![
                effect("p1", EffectType::AttackPercentage, 10.0, StackingRule::Additive),
                effect("m1", EffectType::AttackMultiplier, 1.2, StackingRule::Multiplicative),
            ],
        ),
        relic("second", vec![sworn]),
    ]);
    let mut context = CombatContext::default();
    context.weapon_type = Some("straight_sword".to_string());

    let options = ComposeOptions {
        force_recalculate: true,
        include_breakdown: true,
    };
    let first = engine
        .compose(&ids(&["first", "second"]), Some(&context), &options)
        .unwrap();
    let second = engine
        .compose(&ids(&["first", "second"]), Some(&context), &options)
        .unwrap();

    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

#[test]
fn permutation_keeps_the_multiplier() {
    let engine = engine_of(vec![
        relic(
            "a",
            vec![effect("p", EffectType::AttackPercentage, 10.0, StackingRule::Additive)],
        ),
        relic(
            "b",
            vec![effect("m", EffectType::AttackMultiplier, 1.5, StackingRule::Multiplicative)],
        ),
        relic(
            "c",
            vec![effect("f", EffectType::AttackFlat, 20.0, StackingRule::Additive)],
        ),
    ]);

    let forward = engine
        .compose(&ids(&["a", "b", "c"]), None, &ComposeOptions::default())
        .unwrap();
    let backward = engine
        .compose(&ids(&["c", "b", "a"]), None, &ComposeOptions::default())
        .unwrap();
    assert_eq!(forward.total_multiplier, backward.total_multiplier);
    // (100 + 20) * 1.1 * 1.5 = 198
    approx_eq(forward.final_attack_power, 198.0, 1e-9);
}

#[test]
fn breakdown_groups_run_in_fixed_order() {
    let mut overwrite = effect("ow", EffectType::AttackFlat, 15.0, StackingRule::Overwrite);
    overwrite.priority = 2;
    let engine = engine_of(vec![relic(
        "omnibus",
        vec![
            effect("mult", EffectType::AttackMultiplier, 1.3, StackingRule::Multiplicative),
            effect("add", EffectType::AttackPercentage, 10.0, StackingRule::Additive),
            overwrite,
        ],
    )]);

    let result = engine
        .compose(&ids(&["omnibus"]), None, &ComposeOptions::default())
        .unwrap();

    let operations: Vec<BreakdownOp> = result
        .breakdown
        .iter()
        .map(|step| step.operation)
        .collect();
    assert_eq!(
        operations,
        vec![
            BreakdownOp::Base,
            BreakdownOp::Add,
            BreakdownOp::Multiply,
            BreakdownOp::Overwrite
        ]
    );
    for (index, step) in result.breakdown.iter().enumerate() {
        assert_eq!(step.step, index + 1);
    }
    // (100 + 15) * 1.1 * 1.3
    approx_eq(result.final_attack_power, 164.45, 1e-9);
}

#[test]
fn conditional_damage_is_annotated_not_applied() {
    let mut banner = effect("cd", EffectType::ConditionalDamage, 50.0, StackingRule::Unique);
    banner.conditions.push(Condition::HealthThreshold {
        max_percentage: 30.0,
        description: String::new(),
    });
    let engine = engine_of(vec![relic("banner", vec![banner])]);

    let mut desperate = CombatContext::default();
    desperate
        .conditions
        .insert("health_percentage".to_string(), json!(25.0));
    let result = engine
        .compose(&ids(&["banner"]), Some(&desperate), &ComposeOptions::default())
        .unwrap();

    approx_eq(result.total_multiplier, 1.0, 1e-9);
    assert_eq!(result.conditional_effects.len(), 1);
    assert!(result.conditional_effects[0].conditions_met);

    let healthy = CombatContext::default();
    let unmet = engine
        .compose(&ids(&["banner"]), Some(&healthy), &ComposeOptions::default())
        .unwrap();
    assert_eq!(unmet.conditional_effects.len(), 1);
    assert!(!unmet.conditional_effects[0].conditions_met);
}

#[test]
fn invalid_context_is_rejected() {
    let engine = engine_of(Vec::new());
    let mut context = CombatContext::default();
    context.character_level = 0;

    assert!(matches!(
        engine.compose(&[], Some(&context), &ComposeOptions::default()),
        Err(EngineError::InvalidCalculationContext { .. })
    ));
}

#[test]
fn timeout_surfaces_calculation_timeout() {
    let repo: InMemoryRelicRepository = vec![relic(
        "sigil",
        vec![effect("p", EffectType::AttackPercentage, 10.0, StackingRule::Additive)],
    )]
    .into_iter()
    .collect();
    let config = reliquary::EngineConfig {
        composition_timeout: std::time::Duration::ZERO,
        ..reliquary::EngineConfig::default()
    };
    let engine = Engine::with_config(EngineDeps::new(Arc::new(repo)), config);

    assert!(matches!(
        engine.compose(&ids(&["sigil"]), None, &ComposeOptions::default()),
        Err(EngineError::CalculationTimeout)
    ));
}
