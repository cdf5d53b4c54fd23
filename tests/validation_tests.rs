//! Validation service contract: failure codes, conflict records, summary
//! statistics, and warning thresholds.

use std::sync::Arc;

use reliquary::deps::EngineDeps;
use reliquary::engine::Engine;
use reliquary::error::EngineError;
use reliquary::model::{
    Category, CombatContext, CombatStyle, Condition, Effect, EffectType, Quality, Rarity, Relic,
    StackingRule,
};
use reliquary::repo::InMemoryRelicRepository;
use reliquary::validate::SelectionWarningKind;

fn effect(id: &str, conditions: Vec<Condition>) -> Effect {
    Effect {
        id: id.to_string(),
        name: format!("effect {id}"),
        description: String::new(),
        effect_type: EffectType::AttackPercentage,
        value: 10.0,
        stacking_rule: StackingRule::Additive,
        priority: 0,
        damage_types: Vec::new(),
        conditions,
        active: true,
    }
}

fn relic(id: &str, difficulty: u8, rarity: Rarity) -> Relic {
    Relic {
        id: id.to_string(),
        name: format!("Relic {id}"),
        description: String::new(),
        category: Category::Attack,
        rarity,
        quality: Quality::Polished,
        icon_url: None,
        obtainment_difficulty: difficulty,
        conflicts: Vec::new(),
        active: true,
        effects: vec![effect(&format!("{id}_fx"), Vec::new())],
    }
}

fn engine_of(relics: Vec<Relic>) -> Engine {
    let repo: InMemoryRelicRepository = relics.into_iter().collect();
    Engine::new(EngineDeps::new(Arc::new(repo)))
}

fn ids(raw: &[&str]) -> Vec<String> {
    raw.iter().map(|id| id.to_string()).collect()
}

#[test]
fn duplicates_are_rejected_with_the_offenders() {
    let engine = engine_of(vec![relic("gem", 3, Rarity::Rare)]);
    match engine.validate(&ids(&["gem", "gem"]), None, false) {
        Err(EngineError::DuplicateRelics { ids }) => assert_eq!(ids, vec!["gem"]),
        other => panic!("expected DUPLICATE_RELICS, got {other:?}"),
    }
}

#[test]
fn validate_keeps_caller_order() {
    let engine = engine_of(vec![
        relic("zeta", 3, Rarity::Rare),
        relic("alpha", 3, Rarity::Rare),
    ]);
    let bundle = engine.validate(&ids(&["zeta", "alpha"]), None, false).unwrap();
    let order: Vec<&str> = bundle.relics.iter().map(|relic| relic.id.as_str()).collect();
    assert_eq!(order, vec!["zeta", "alpha"]);
}

#[test]
fn high_difficulty_warning_fires_over_forty() {
    let engine = engine_of(vec![
        relic("a", 10, Rarity::Rare),
        relic("b", 10, Rarity::Rare),
        relic("c", 10, Rarity::Rare),
        relic("d", 9, Rarity::Rare),
        relic("e", 2, Rarity::Rare),
    ]);
    let bundle = engine
        .validate(&ids(&["a", "b", "c", "d", "e"]), None, false)
        .unwrap();
    assert_eq!(bundle.summary.total_difficulty, 41);
    assert!(bundle
        .warnings
        .iter()
        .any(|warning| warning.kind == SelectionWarningKind::HighDifficulty));
}

#[test]
fn many_legendaries_warning_fires_over_three() {
    let engine = engine_of(vec![
        relic("a", 3, Rarity::Legendary),
        relic("b", 3, Rarity::Legendary),
        relic("c", 3, Rarity::Legendary),
        relic("d", 3, Rarity::Legendary),
    ]);
    let bundle = engine
        .validate(&ids(&["a", "b", "c", "d"]), None, false)
        .unwrap();
    assert!(bundle
        .warnings
        .iter()
        .any(|warning| warning.kind == SelectionWarningKind::ManyLegendaries));
    assert_eq!(bundle.summary.rarity_counts[&Rarity::Legendary], 4);
}

#[test]
fn complex_conditions_warning_counts_heavy_effects() {
    let heavy_conditions = || {
        vec![
            Condition::CombatStyle {
                style: "melee".to_string(),
                description: String::new(),
            },
            Condition::ChainPosition {
                position: 2,
                description: String::new(),
            },
            Condition::EnemyType {
                enemy: "undead".to_string(),
                description: String::new(),
            },
        ]
    };
    let mut relics = Vec::new();
    for index in 0..3 {
        let id = format!("relic_{index}");
        let mut heavy = relic(&id, 2, Rarity::Rare);
        heavy.effects = vec![
            effect(&format!("{id}_fx_a"), heavy_conditions()),
            effect(&format!("{id}_fx_b"), heavy_conditions()),
        ];
        relics.push(heavy);
    }
    let engine = engine_of(relics);
    let bundle = engine
        .validate(&ids(&["relic_0", "relic_1", "relic_2"]), None, false)
        .unwrap();
    // Six effects with three conditions each, above the five-effect bar.
    assert!(bundle
        .warnings
        .iter()
        .any(|warning| warning.kind == SelectionWarningKind::ComplexConditions));
}

#[test]
fn strict_weapon_mismatch_is_an_error() {
    let mut picky = relic("picky", 3, Rarity::Rare);
    picky.effects = vec![effect(
        "picky_fx",
        vec![Condition::WeaponType {
            weapon: "greataxe".to_string(),
            description: String::new(),
        }],
    )];
    let engine = engine_of(vec![picky]);

    let mut context = CombatContext::default();
    context.weapon_type = Some("dagger".to_string());

    let lax = engine
        .validate(&ids(&["picky"]), Some(&context), false)
        .unwrap();
    assert!(lax
        .warnings
        .iter()
        .any(|warning| warning.kind == SelectionWarningKind::WeaponTypeMismatch));

    match engine.validate(&ids(&["picky"]), Some(&context), true) {
        Err(EngineError::WeaponTypeIncompatible { weapon, effects }) => {
            assert_eq!(weapon, "dagger");
            assert_eq!(effects, vec!["effect picky_fx"]);
        }
        other => panic!("expected WEAPON_TYPE_INCOMPATIBLE, got {other:?}"),
    }
}

#[test]
fn strict_mode_checks_relic_structure() {
    let mut broken = relic("broken", 3, Rarity::Rare);
    broken.name = "   ".to_string();
    let engine = engine_of(vec![broken]);

    assert!(engine.validate(&ids(&["broken"]), None, false).is_ok());
    assert!(matches!(
        engine.validate(&ids(&["broken"]), None, true),
        Err(EngineError::InvalidRelicStructure { .. })
    ));
}

#[test]
fn matching_style_condition_raises_no_warning() {
    let mut aligned = relic("aligned", 3, Rarity::Rare);
    aligned.effects = vec![effect(
        "aligned_fx",
        vec![Condition::CombatStyle {
            style: "ranged".to_string(),
            description: String::new(),
        }],
    )];
    let engine = engine_of(vec![aligned]);

    let mut context = CombatContext::default();
    context.combat_style = CombatStyle::Ranged;
    let bundle = engine
        .validate(&ids(&["aligned"]), Some(&context), false)
        .unwrap();
    assert!(bundle.warnings.is_empty());
    assert!(engine
        .validate(&ids(&["aligned"]), Some(&context), true)
        .is_ok());
}

#[test]
fn error_payloads_are_stable() {
    let engine = engine_of(Vec::new());
    let err = engine.validate(&ids(&["ghost"]), None, false).unwrap_err();
    assert_eq!(err.code(), "RELIC_NOT_FOUND");
    let payload = err.to_payload();
    assert_eq!(payload["details"]["relic_ids"][0], "ghost");

    let repeat = engine.validate(&ids(&["ghost"]), None, false).unwrap_err();
    assert_eq!(err.to_payload(), repeat.to_payload());
}
