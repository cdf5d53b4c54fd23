//! The composition core: turns a validated relic list and context into a
//! multiplier, an audit breakdown, and stacking traces.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::engine::breakdown::{
    BreakdownOp, BreakdownStep, CompositionTrace, ConditionalEffectNote, StackingBonus,
};
use crate::engine::deadline::Deadline;
use crate::engine::dispatch::{DispatchTable, EffectSlot};
use crate::error::EngineError;
use crate::model::{CombatContext, DamageType, Relic, StackingRule};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComposeOptions {
    /// Bypass the cache and recompute.
    pub force_recalculate: bool,
    pub include_breakdown: bool,
}

impl Default for ComposeOptions {
    fn default() -> Self {
        Self {
            force_recalculate: false,
            include_breakdown: true,
        }
    }
}

/// The four lanes of the composition formula plus the base.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Accumulator {
    pub base_attack: f64,
    pub flat_bonuses: f64,
    pub percentage_bonuses: f64,
    pub multiplicative_bonuses: f64,
}

impl Accumulator {
    pub fn new(base_attack: f64) -> Self {
        Self {
            base_attack,
            flat_bonuses: 0.0,
            percentage_bonuses: 0.0,
            multiplicative_bonuses: 1.0,
        }
    }

    /// `(base + flat) × (1 + pct/100) × mult` — the engine's closed form.
    pub fn running_total(&self) -> f64 {
        (self.base_attack + self.flat_bonuses)
            * (1.0 + self.percentage_bonuses / 100.0)
            * self.multiplicative_bonuses
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositionResult {
    pub total_multiplier: f64,
    pub base_multiplier: f64,
    pub final_attack_power: f64,
    pub stacking_bonuses: Vec<StackingBonus>,
    pub conditional_effects: Vec<ConditionalEffectNote>,
    pub breakdown: Vec<BreakdownStep>,
    pub damage_by_type: BTreeMap<DamageType, f64>,
    pub warnings: Vec<String>,
}

pub fn round_to_3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

pub fn round_to_2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Runs the fixed-order group pipeline over already-validated relics.
///
/// Processing order is part of the engine contract: relics in caller order,
/// effects in stored order, groups additive → multiplicative → overwrite →
/// unique. The deadline is honored at group boundaries.
pub fn compose_relics(
    relics: &[Relic],
    context: &CombatContext,
    options: &ComposeOptions,
    table: &DispatchTable,
    deadline: Deadline,
) -> Result<CompositionResult, EngineError> {
    deadline.check_composition()?;

    let base_attack = context.base_attack_power();
    let mut acc = Accumulator::new(base_attack);
    let mut trace = CompositionTrace::new(options.include_breakdown);
    trace.step(
        "base attack power",
        BreakdownOp::Base,
        base_attack,
        acc.running_total(),
        None,
        None,
    );

    let slots: Vec<EffectSlot<'_>> = relics
        .iter()
        .flat_map(|relic| {
            relic
                .active_effects()
                .map(move |effect| EffectSlot { relic, effect })
        })
        .collect();

    for rule in StackingRule::PROCESSING_ORDER {
        deadline.check_composition()?;
        let group: Vec<EffectSlot<'_>> = slots
            .iter()
            .copied()
            .filter(|slot| slot.effect.stacking_rule == rule)
            .collect();
        if group.is_empty() {
            continue;
        }
        match table.processor(rule) {
            Some(processor) => {
                processor.process(&group, context, table.routes(), &mut acc, &mut trace);
            }
            None => trace.warn(format!(
                "no processor registered for stacking rule '{}'; {} effect(s) ignored",
                rule.as_str(),
                group.len()
            )),
        }
    }
    deadline.check_composition()?;

    let final_attack_power = round_to_2(acc.running_total());
    let total_multiplier = round_to_3(acc.running_total() / base_attack);

    let mut damage_by_type: BTreeMap<DamageType, f64> =
        DamageType::ALL.iter().map(|kind| (*kind, 0.0)).collect();
    // Typed allocation is future work; everything lands on physical.
    damage_by_type.insert(DamageType::Physical, final_attack_power);

    Ok(CompositionResult {
        total_multiplier,
        base_multiplier: 1.0,
        final_attack_power,
        stacking_bonuses: std::mem::take(&mut trace.stacking_bonuses),
        conditional_effects: std::mem::take(&mut trace.conditional_effects),
        warnings: std::mem::take(&mut trace.warnings),
        breakdown: trace.into_steps(),
        damage_by_type,
    })
}
