//! Two-level dispatch for composition: a stacking-rule registry selects the
//! group processor, and a value-route table tells lane-applying processors
//! which accumulator lane an effect type feeds. New rules and types are
//! added by registering entries, not by growing a switch.

use std::collections::BTreeMap;

use crate::engine::breakdown::{
    BreakdownOp, CompositionTrace, ConditionalEffectNote, EffectContribution, StackingBonus,
};
use crate::engine::compose::Accumulator;
use crate::engine::conditions::{conditions_hold, effective_value};
use crate::model::{CombatContext, Effect, EffectType, Relic, StackingRule};

/// Which accumulator lane an effect type's numeric value feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueRoute {
    Flat,
    Percentage,
    Multiplicative,
    RecordOnly,
}

/// Value → multiplier factor. Multiplier-kind types are used as-is,
/// everything else reads as a percentage.
pub fn conversion_factor(effect_type: EffectType, value: f64) -> f64 {
    match effect_type {
        EffectType::AttackMultiplier | EffectType::CriticalMultiplier => value,
        _ => 1.0 + value / 100.0,
    }
}

#[derive(Debug, Clone)]
pub struct RouteTable {
    routes: BTreeMap<EffectType, ValueRoute>,
}

impl Default for RouteTable {
    fn default() -> Self {
        let mut table = Self {
            routes: BTreeMap::new(),
        };
        table.register(EffectType::AttackFlat, ValueRoute::Flat);
        table.register(EffectType::AttackPercentage, ValueRoute::Percentage);
        table.register(EffectType::AttackMultiplier, ValueRoute::Multiplicative);
        table
    }
}

impl RouteTable {
    pub fn register(&mut self, effect_type: EffectType, route: ValueRoute) {
        self.routes.insert(effect_type, route);
    }

    pub fn route(&self, effect_type: EffectType) -> ValueRoute {
        self.routes
            .get(&effect_type)
            .copied()
            .unwrap_or(ValueRoute::RecordOnly)
    }
}

/// One (relic, effect) pair queued for composition.
#[derive(Debug, Clone, Copy)]
pub struct EffectSlot<'a> {
    pub relic: &'a Relic,
    pub effect: &'a Effect,
}

impl EffectSlot<'_> {
    fn contribution(&self, value: f64) -> EffectContribution {
        EffectContribution {
            relic_id: self.relic.id.clone(),
            relic_name: self.relic.name.clone(),
            effect_id: self.effect.id.clone(),
            effect_name: self.effect.name.clone(),
            value,
        }
    }
}

pub trait GroupProcessor: Send + Sync {
    fn rule(&self) -> StackingRule;

    fn process(
        &self,
        group: &[EffectSlot<'_>],
        context: &CombatContext,
        routes: &RouteTable,
        acc: &mut Accumulator,
        trace: &mut CompositionTrace,
    );
}

/// Registry mapping each stacking rule to its processor, plus the shared
/// route table. Built once at engine construction.
pub struct DispatchTable {
    routes: RouteTable,
    processors: BTreeMap<StackingRule, Box<dyn GroupProcessor>>,
}

impl Default for DispatchTable {
    fn default() -> Self {
        let mut table = Self {
            routes: RouteTable::default(),
            processors: BTreeMap::new(),
        };
        table.register(Box::new(AdditiveProcessor));
        table.register(Box::new(MultiplicativeProcessor));
        table.register(Box::new(OverwriteProcessor));
        table.register(Box::new(UniqueProcessor));
        table
    }
}

impl DispatchTable {
    pub fn register(&mut self, processor: Box<dyn GroupProcessor>) {
        self.processors.insert(processor.rule(), processor);
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    pub fn routes_mut(&mut self) -> &mut RouteTable {
        &mut self.routes
    }

    pub fn processor(&self, rule: StackingRule) -> Option<&dyn GroupProcessor> {
        self.processors.get(&rule).map(Box::as_ref)
    }
}

/// Splits a group into per-effect-type sub-groups in first-seen order,
/// which keeps breakdown ordering stable for a fixed input order.
fn subgroups_by_type<'a, 'b>(
    group: &'b [EffectSlot<'a>],
) -> Vec<(EffectType, Vec<&'b EffectSlot<'a>>)> {
    let mut ordered: Vec<(EffectType, Vec<&EffectSlot>)> = Vec::new();
    for slot in group {
        let effect_type = slot.effect.effect_type;
        match ordered.iter_mut().find(|(kind, _)| *kind == effect_type) {
            Some((_, slots)) => slots.push(slot),
            None => ordered.push((effect_type, vec![slot])),
        }
    }
    ordered
}

/// Filters a sub-group down to passing slots, forwarding evaluation notes.
fn passing_slots<'a, 'b>(
    slots: &[&'b EffectSlot<'a>],
    context: &CombatContext,
    trace: &mut CompositionTrace,
) -> Vec<(&'b EffectSlot<'a>, f64)> {
    let mut passing = Vec::new();
    for slot in slots {
        let check = conditions_hold(slot.effect, context);
        for note in check.notes {
            trace.warn(note);
        }
        if check.passed {
            passing.push((*slot, effective_value(slot.effect, context)));
        }
    }
    passing
}

/// Additive: per effect type, values of passing effects sum. Only the flat
/// and percentage lanes change the outcome; other types are recorded.
pub struct AdditiveProcessor;

impl GroupProcessor for AdditiveProcessor {
    fn rule(&self) -> StackingRule {
        StackingRule::Additive
    }

    fn process(
        &self,
        group: &[EffectSlot<'_>],
        context: &CombatContext,
        routes: &RouteTable,
        acc: &mut Accumulator,
        trace: &mut CompositionTrace,
    ) {
        for (effect_type, slots) in subgroups_by_type(group) {
            let passing = passing_slots(&slots, context, trace);
            if passing.is_empty() {
                continue;
            }
            let sum: f64 = passing.iter().map(|(_, value)| value).sum();
            trace.stacking_bonuses.push(StackingBonus {
                stacking_rule: StackingRule::Additive,
                effect_type,
                contributions: passing
                    .iter()
                    .map(|(slot, value)| slot.contribution(*value))
                    .collect(),
                accumulated: sum,
            });

            let applied = match routes.route(effect_type) {
                ValueRoute::Flat => {
                    acc.flat_bonuses += sum;
                    true
                }
                ValueRoute::Percentage => {
                    acc.percentage_bonuses += sum;
                    true
                }
                ValueRoute::Multiplicative | ValueRoute::RecordOnly => false,
            };
            if applied && sum != 0.0 {
                trace.step(
                    format!(
                        "{} additive bonus from {} effect(s)",
                        effect_type.as_str(),
                        passing.len()
                    ),
                    BreakdownOp::Add,
                    sum,
                    acc.running_total(),
                    None,
                    None,
                );
            }
        }
    }
}

/// Multiplicative: every passing effect converts to a factor and multiplies
/// in, one breakdown step per effect.
pub struct MultiplicativeProcessor;

impl GroupProcessor for MultiplicativeProcessor {
    fn rule(&self) -> StackingRule {
        StackingRule::Multiplicative
    }

    fn process(
        &self,
        group: &[EffectSlot<'_>],
        context: &CombatContext,
        _routes: &RouteTable,
        acc: &mut Accumulator,
        trace: &mut CompositionTrace,
    ) {
        let mut per_type: Vec<(EffectType, Vec<EffectContribution>, f64)> = Vec::new();

        for slot in group {
            let check = conditions_hold(slot.effect, context);
            for note in check.notes {
                trace.warn(note);
            }
            if !check.passed {
                continue;
            }
            let factor =
                conversion_factor(slot.effect.effect_type, effective_value(slot.effect, context));
            acc.multiplicative_bonuses *= factor;
            trace.step(
                format!("{} multiplier", slot.effect.name),
                BreakdownOp::Multiply,
                factor,
                acc.running_total(),
                Some(slot.relic.name.clone()),
                Some(slot.effect.name.clone()),
            );

            let effect_type = slot.effect.effect_type;
            match per_type.iter_mut().find(|(kind, _, _)| *kind == effect_type) {
                Some((_, contributions, product)) => {
                    contributions.push(slot.contribution(factor));
                    *product *= factor;
                }
                None => per_type.push((effect_type, vec![slot.contribution(factor)], factor)),
            }
        }

        for (effect_type, contributions, product) in per_type {
            trace.stacking_bonuses.push(StackingBonus {
                stacking_rule: StackingRule::Multiplicative,
                effect_type,
                contributions,
                accumulated: product,
            });
        }
    }
}

/// Overwrite: per effect type the highest-priority passing effect wins and
/// replaces its lane. Priority ties go to the lexicographically smallest
/// `(relic_id, effect_id)`.
pub struct OverwriteProcessor;

impl GroupProcessor for OverwriteProcessor {
    fn rule(&self) -> StackingRule {
        StackingRule::Overwrite
    }

    fn process(
        &self,
        group: &[EffectSlot<'_>],
        context: &CombatContext,
        routes: &RouteTable,
        acc: &mut Accumulator,
        trace: &mut CompositionTrace,
    ) {
        for (effect_type, slots) in subgroups_by_type(group) {
            let mut passing = passing_slots(&slots, context, trace);
            if passing.is_empty() {
                continue;
            }
            passing.sort_by(|(a, _), (b, _)| {
                b.effect
                    .priority
                    .cmp(&a.effect.priority)
                    .then_with(|| a.relic.id.cmp(&b.relic.id))
                    .then_with(|| a.effect.id.cmp(&b.effect.id))
            });
            let (winner, winning_value) = passing[0];

            trace.stacking_bonuses.push(StackingBonus {
                stacking_rule: StackingRule::Overwrite,
                effect_type,
                contributions: passing
                    .iter()
                    .map(|(slot, value)| slot.contribution(*value))
                    .collect(),
                accumulated: winning_value,
            });

            let (applied, shown_value) = match routes.route(effect_type) {
                ValueRoute::Flat => {
                    acc.flat_bonuses = winning_value;
                    (true, winning_value)
                }
                ValueRoute::Percentage => {
                    acc.percentage_bonuses = winning_value;
                    (true, winning_value)
                }
                ValueRoute::Multiplicative => {
                    let factor = conversion_factor(effect_type, winning_value);
                    acc.multiplicative_bonuses = factor;
                    (true, factor)
                }
                ValueRoute::RecordOnly => (false, winning_value),
            };
            if applied {
                trace.step(
                    format!(
                        "{} overwritten by '{}' (priority {})",
                        effect_type.as_str(),
                        winner.effect.name,
                        winner.effect.priority
                    ),
                    BreakdownOp::Overwrite,
                    shown_value,
                    acc.running_total(),
                    Some(winner.relic.name.clone()),
                    Some(winner.effect.name.clone()),
                );
            }
        }
    }
}

/// Unique: effects never stack among themselves, but distinct unique
/// effects coexist. Conditional damage is annotated only; weapon-specific
/// effects multiply once their (optional) weapon gate passes.
pub struct UniqueProcessor;

impl GroupProcessor for UniqueProcessor {
    fn rule(&self) -> StackingRule {
        StackingRule::Unique
    }

    fn process(
        &self,
        group: &[EffectSlot<'_>],
        context: &CombatContext,
        _routes: &RouteTable,
        acc: &mut Accumulator,
        trace: &mut CompositionTrace,
    ) {
        for slot in group {
            let check = conditions_hold(slot.effect, context);
            for note in check.notes {
                trace.warn(note);
            }

            match slot.effect.effect_type {
                EffectType::ConditionalDamage => {
                    trace.conditional_effects.push(ConditionalEffectNote {
                        relic_name: slot.relic.name.clone(),
                        effect_name: slot.effect.name.clone(),
                        effect_type: slot.effect.effect_type,
                        value: slot.effect.value,
                        conditions_met: check.passed,
                        conditions: slot.effect.condition_descriptions(),
                    });
                }
                EffectType::WeaponSpecific if check.passed => {
                    let factor = conversion_factor(
                        slot.effect.effect_type,
                        effective_value(slot.effect, context),
                    );
                    acc.multiplicative_bonuses *= factor;
                    trace.step(
                        format!("{} weapon bonus", slot.effect.name),
                        BreakdownOp::Multiply,
                        factor,
                        acc.running_total(),
                        Some(slot.relic.name.clone()),
                        Some(slot.effect.name.clone()),
                    );
                    trace.stacking_bonuses.push(StackingBonus {
                        stacking_rule: StackingRule::Unique,
                        effect_type: slot.effect.effect_type,
                        contributions: vec![slot.contribution(factor)],
                        accumulated: factor,
                    });
                }
                _ if check.passed => {
                    trace.stacking_bonuses.push(StackingBonus {
                        stacking_rule: StackingRule::Unique,
                        effect_type: slot.effect.effect_type,
                        contributions: vec![slot.contribution(slot.effect.value)],
                        accumulated: slot.effect.value,
                    });
                }
                _ => {}
            }
        }
    }
}
