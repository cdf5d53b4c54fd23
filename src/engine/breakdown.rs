//! Audit trail of a composition: ordered breakdown steps, stacking-bonus
//! trace records, and annotations for non-numeric conditional effects.

use serde::{Deserialize, Serialize};

use crate::model::{EffectType, StackingRule};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BreakdownOp {
    Base,
    Add,
    Multiply,
    Overwrite,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreakdownStep {
    /// 1-based, monotonic.
    pub step: usize,
    pub description: String,
    pub operation: BreakdownOp,
    pub value: f64,
    pub running_total: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relic_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effect_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectContribution {
    pub relic_id: String,
    pub relic_name: String,
    pub effect_id: String,
    pub effect_name: String,
    pub value: f64,
}

/// One trace record per processed (stacking rule, effect type) sub-group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StackingBonus {
    pub stacking_rule: StackingRule,
    pub effect_type: EffectType,
    pub contributions: Vec<EffectContribution>,
    /// Sum for additive, product for multiplicative, winning value for
    /// overwrite, per-effect value otherwise.
    pub accumulated: f64,
}

/// Annotation for a conditional effect that never feeds the multiplier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionalEffectNote {
    pub relic_name: String,
    pub effect_name: String,
    pub effect_type: EffectType,
    pub value: f64,
    pub conditions_met: bool,
    pub conditions: Vec<String>,
}

/// Collects the full audit trail while groups are processed. Breakdown
/// recording can be switched off; trace records are always kept.
#[derive(Debug, Default)]
pub struct CompositionTrace {
    record_breakdown: bool,
    steps: Vec<BreakdownStep>,
    pub stacking_bonuses: Vec<StackingBonus>,
    pub conditional_effects: Vec<ConditionalEffectNote>,
    pub warnings: Vec<String>,
}

impl CompositionTrace {
    pub fn new(record_breakdown: bool) -> Self {
        Self {
            record_breakdown,
            ..Self::default()
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub fn step(
        &mut self,
        description: impl Into<String>,
        operation: BreakdownOp,
        value: f64,
        running_total: f64,
        relic_name: Option<String>,
        effect_name: Option<String>,
    ) {
        if !self.record_breakdown {
            return;
        }
        self.steps.push(BreakdownStep {
            step: self.steps.len() + 1,
            description: description.into(),
            operation,
            value,
            running_total,
            relic_name,
            effect_name,
        });
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        let message = message.into();
        if !self.warnings.contains(&message) {
            self.warnings.push(message);
        }
    }

    pub fn into_steps(self) -> Vec<BreakdownStep> {
        self.steps
    }

    pub fn steps(&self) -> &[BreakdownStep] {
        &self.steps
    }
}
