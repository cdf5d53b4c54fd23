//! Condition evaluation against the combat context. All conditions on an
//! effect must hold; unknown condition kinds never hold.

use crate::model::{CombatContext, Condition, CountRequirement, Effect, EffectType};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConditionCheck {
    pub passed: bool,
    /// Evaluation caveats worth surfacing (unimplemented windows, unknown
    /// tags). Collected even when the effect passes.
    pub notes: Vec<String>,
}

/// Evaluates every condition on `effect` with AND semantics.
pub fn conditions_hold(effect: &Effect, context: &CombatContext) -> ConditionCheck {
    let mut check = ConditionCheck {
        passed: true,
        notes: Vec::new(),
    };
    for condition in &effect.conditions {
        let holds = match condition {
            Condition::WeaponType { weapon, .. } => {
                context.weapon_type.as_deref() == Some(weapon.as_str())
            }
            Condition::CombatStyle { style, .. } => style == context.combat_style.as_str(),
            Condition::HealthThreshold { max_percentage, .. } => context
                .health_percentage()
                .map(|health| health <= *max_percentage)
                .unwrap_or(false),
            Condition::ChainPosition { position, .. } => {
                context.chain_position() == Some(*position)
            }
            Condition::EnemyType { enemy, .. } => context.enemy_type() == Some(enemy.as_str()),
            Condition::TimeBased { window, .. } => {
                // Time windows are not simulated; the condition is documented
                // as always holding.
                check
                    .notes
                    .push(format!("time window '{window}' treated as always active"));
                true
            }
            Condition::EquipmentCount { requirement, .. } => match requirement {
                CountRequirement::AtLeast(count) => context
                    .equipment_count()
                    .map(|equipped| equipped >= *count)
                    .unwrap_or(false),
                // The scaling marker gates nothing itself; the level is
                // always available (defaulted to 1).
                CountRequirement::CharacterLevel => true,
            },
            Condition::Unknown { .. } => {
                check.notes.push(format!(
                    "unrecognized condition '{}' disables effect '{}'",
                    condition.kind_str(),
                    effect.name
                ));
                false
            }
        };
        if !holds {
            check.passed = false;
        }
    }
    check
}

/// The value an effect contributes once its conditions pass. The only
/// value-modifying rule: an `attack_percentage` effect carrying the
/// `equipment_count`/`"character_level"` condition scales by the level.
pub fn effective_value(effect: &Effect, context: &CombatContext) -> f64 {
    if effect.effect_type == EffectType::AttackPercentage && effect.is_level_scaled() {
        effect.value * f64::from(context.character_level)
    } else {
        effect.value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CombatStyle, StackingRule};
    use serde_json::json;

    fn effect_with(conditions: Vec<Condition>) -> Effect {
        Effect {
            id: "fx".to_string(),
            name: "test effect".to_string(),
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

    #[test]
    fn weapon_condition_matches_context() {
        let effect = effect_with(vec![Condition::WeaponType {
            weapon: "straight_sword".to_string(),
            description: String::new(),
        }]);

        let mut context = CombatContext::default();
        assert!(!conditions_hold(&effect, &context).passed);

        context.weapon_type = Some("straight_sword".to_string());
        assert!(conditions_hold(&effect, &context).passed);

        context.weapon_type = Some("bow".to_string());
        assert!(!conditions_hold(&effect, &context).passed);
    }

    #[test]
    fn health_threshold_is_at_or_below() {
        let effect = effect_with(vec![Condition::HealthThreshold {
            max_percentage: 30.0,
            description: String::new(),
        }]);

        let mut context = CombatContext::default();
        assert!(!conditions_hold(&effect, &context).passed);

        context
            .conditions
            .insert("health_percentage".to_string(), json!(30.0));
        assert!(conditions_hold(&effect, &context).passed);

        context
            .conditions
            .insert("health_percentage".to_string(), json!(30.5));
        assert!(!conditions_hold(&effect, &context).passed);
    }

    #[test]
    fn all_conditions_must_hold() {
        let effect = effect_with(vec![
            Condition::CombatStyle {
                style: "melee".to_string(),
                description: String::new(),
            },
            Condition::ChainPosition {
                position: 3,
                description: String::new(),
            },
        ]);

        let mut context = CombatContext::default();
        context.combat_style = CombatStyle::Melee;
        assert!(!conditions_hold(&effect, &context).passed);

        context
            .conditions
            .insert("chain_position".to_string(), json!(3));
        assert!(conditions_hold(&effect, &context).passed);
    }

    #[test]
    fn unknown_condition_disables_with_note() {
        let effect = effect_with(vec![Condition::Unknown {
            raw: json!({"type": "moon_phase", "value": "full"}),
        }]);
        let check = conditions_hold(&effect, &CombatContext::default());
        assert!(!check.passed);
        assert_eq!(check.notes.len(), 1);
    }

    #[test]
    fn level_scaling_multiplies_only_marked_effects() {
        let mut context = CombatContext::default();
        context.character_level = 50;

        let plain = effect_with(Vec::new());
        assert_eq!(effective_value(&plain, &context), 10.0);

        let scaled = effect_with(vec![Condition::EquipmentCount {
            requirement: CountRequirement::CharacterLevel,
            description: String::new(),
        }]);
        assert_eq!(effective_value(&scaled, &context), 500.0);
    }
}
