//! Selection validation: structural checks, duplicate/limit/conflict
//! detection, and preprocessing into the canonical engine input bundle.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::error::{ConflictRecord, EngineError};
use crate::model::relic::{
    MAX_EFFECT_PRIORITY, MAX_EFFECT_VALUE, MAX_OBTAINMENT_DIFFICULTY, MAX_RELICS_PER_SELECTION,
};
use crate::model::{Category, CombatContext, Condition, Quality, Rarity, Relic};
use crate::repo::RelicRepository;

pub const HIGH_DIFFICULTY_THRESHOLD: u32 = 40;
pub const MANY_LEGENDARIES_THRESHOLD: usize = 3;
pub const COMPLEX_CONDITION_COUNT: usize = 2;
pub const COMPLEX_EFFECTS_THRESHOLD: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionWarningKind {
    HighDifficulty,
    ManyLegendaries,
    ComplexConditions,
    CombatStyleMismatch,
    WeaponTypeMismatch,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionWarning {
    pub kind: SelectionWarningKind,
    pub message: String,
}

/// Aggregate view of a validated selection, returned alongside the relics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SelectionSummary {
    pub category_counts: BTreeMap<Category, usize>,
    pub rarity_counts: BTreeMap<Rarity, usize>,
    pub quality_counts: BTreeMap<Quality, usize>,
    pub total_difficulty: u32,
    pub average_difficulty: f64,
    pub total_effects: usize,
    pub has_conflicts: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreprocessBundle {
    /// Loaded relics in caller-provided order, inactive effects stripped.
    pub relics: Vec<Relic>,
    pub summary: SelectionSummary,
    pub warnings: Vec<SelectionWarning>,
}

/// Validates a selection and preprocesses it into the engine input shape.
///
/// Check order is fixed: empty, limit, duplicates, existence, activity,
/// relic structure (strict only), conflicts, effect structure, context
/// compatibility (strict escalates the latter from warnings to errors).
pub fn validate_selection(
    repo: &dyn RelicRepository,
    relic_ids: &[String],
    context: Option<&CombatContext>,
    strict: bool,
) -> Result<PreprocessBundle, EngineError> {
    if relic_ids.is_empty() {
        return Err(EngineError::EmptyRelicList);
    }
    if relic_ids.len() > MAX_RELICS_PER_SELECTION {
        return Err(EngineError::RelicLimitExceeded {
            count: relic_ids.len(),
            limit: MAX_RELICS_PER_SELECTION,
        });
    }
    let duplicates = find_duplicates(relic_ids);
    if !duplicates.is_empty() {
        return Err(EngineError::DuplicateRelics { ids: duplicates });
    }

    let relics = repo.get_relics_by_ids(relic_ids)?;
    if relics.len() != relic_ids.len() {
        let loaded: BTreeSet<&str> = relics.iter().map(|relic| relic.id.as_str()).collect();
        let missing: Vec<String> = relic_ids
            .iter()
            .filter(|id| !loaded.contains(id.as_str()))
            .cloned()
            .collect();
        return Err(EngineError::RelicNotFound { ids: missing });
    }

    let inactive: Vec<String> = relics
        .iter()
        .filter(|relic| !relic.active)
        .map(|relic| relic.id.clone())
        .collect();
    if !inactive.is_empty() {
        return Err(EngineError::InactiveRelics { ids: inactive });
    }

    if strict {
        for relic in &relics {
            validate_relic_structure(relic)?;
        }
    }

    let conflict_records = detect_conflicts(&relics);
    if !conflict_records.is_empty() {
        return Err(EngineError::ConflictingRelics {
            records: conflict_records,
        });
    }

    for relic in &relics {
        for effect in relic.active_effects() {
            validate_effect_structure(relic, effect)?;
        }
    }

    let mut warnings = summary_warnings(&relics);
    if let Some(context) = context {
        let mismatches = context_mismatches(&relics, context);
        if strict {
            if let Some(error) = mismatches.into_error(context) {
                return Err(error);
            }
        } else {
            warnings.extend(mismatches.into_warnings(context));
        }
    }

    Ok(PreprocessBundle {
        summary: summarize(&relics),
        warnings,
        relics,
    })
}

fn find_duplicates(relic_ids: &[String]) -> Vec<String> {
    let mut seen = BTreeSet::new();
    let mut duplicates = Vec::new();
    for id in relic_ids {
        if !seen.insert(id.as_str()) && !duplicates.contains(id) {
            duplicates.push(id.clone());
        }
    }
    duplicates
}

/// Conflicts are an undirected relation: either side declaring the other
/// forbids joint use. Every offending relic gets its own record.
pub fn detect_conflicts(relics: &[Relic]) -> Vec<ConflictRecord> {
    let mut records = Vec::new();
    for relic in relics {
        let mut conflicting: Vec<String> = relics
            .iter()
            .filter(|other| other.id != relic.id && relic.conflicts_with(other))
            .map(|other| other.id.clone())
            .collect();
        if !conflicting.is_empty() {
            conflicting.sort();
            records.push(ConflictRecord {
                relic_id: relic.id.clone(),
                conflicting_ids: conflicting,
            });
        }
    }
    records
}

fn validate_relic_structure(relic: &Relic) -> Result<(), EngineError> {
    if relic.id.trim().is_empty() {
        return Err(EngineError::InvalidRelicStructure {
            relic_id: relic.id.clone(),
            reason: "blank id".to_string(),
        });
    }
    if relic.name.trim().is_empty() {
        return Err(EngineError::InvalidRelicStructure {
            relic_id: relic.id.clone(),
            reason: "blank name".to_string(),
        });
    }
    if relic.obtainment_difficulty < 1 || relic.obtainment_difficulty > MAX_OBTAINMENT_DIFFICULTY {
        return Err(EngineError::InvalidRelicStructure {
            relic_id: relic.id.clone(),
            reason: format!(
                "obtainment_difficulty {} outside 1..={MAX_OBTAINMENT_DIFFICULTY}",
                relic.obtainment_difficulty
            ),
        });
    }
    Ok(())
}

fn validate_effect_structure(
    relic: &Relic,
    effect: &crate::model::Effect,
) -> Result<(), EngineError> {
    let fail = |reason: String| EngineError::InvalidEffectStructure {
        relic_id: relic.id.clone(),
        effect_id: effect.id.clone(),
        reason,
    };

    if effect.name.trim().is_empty() {
        return Err(fail("blank name".to_string()));
    }
    if !effect.value.is_finite() || effect.value <= 0.0 {
        return Err(fail(format!("value {} must be positive", effect.value)));
    }
    if effect.value > MAX_EFFECT_VALUE {
        return Err(fail(format!(
            "value {} exceeds maximum {MAX_EFFECT_VALUE}",
            effect.value
        )));
    }
    if effect.priority > MAX_EFFECT_PRIORITY {
        return Err(fail(format!(
            "priority {} exceeds maximum {MAX_EFFECT_PRIORITY}",
            effect.priority
        )));
    }
    Ok(())
}

fn summarize(relics: &[Relic]) -> SelectionSummary {
    let mut summary = SelectionSummary::default();
    for relic in relics {
        *summary.category_counts.entry(relic.category).or_default() += 1;
        *summary.rarity_counts.entry(relic.rarity).or_default() += 1;
        *summary.quality_counts.entry(relic.quality).or_default() += 1;
        summary.total_difficulty += u32::from(relic.obtainment_difficulty);
        summary.total_effects += relic.active_effects().count();
        if !relic.conflicts.is_empty() {
            summary.has_conflicts = true;
        }
    }
    if !relics.is_empty() {
        summary.average_difficulty = f64::from(summary.total_difficulty) / relics.len() as f64;
    }
    summary
}

fn summary_warnings(relics: &[Relic]) -> Vec<SelectionWarning> {
    let mut warnings = Vec::new();

    let total_difficulty: u32 = relics
        .iter()
        .map(|relic| u32::from(relic.obtainment_difficulty))
        .sum();
    if total_difficulty > HIGH_DIFFICULTY_THRESHOLD {
        warnings.push(SelectionWarning {
            kind: SelectionWarningKind::HighDifficulty,
            message: format!(
                "total obtainment difficulty {total_difficulty} exceeds {HIGH_DIFFICULTY_THRESHOLD}"
            ),
        });
    }

    let legendary_count = relics
        .iter()
        .filter(|relic| relic.rarity == Rarity::Legendary)
        .count();
    if legendary_count > MANY_LEGENDARIES_THRESHOLD {
        warnings.push(SelectionWarning {
            kind: SelectionWarningKind::ManyLegendaries,
            message: format!(
                "{legendary_count} legendary relics selected, more than {MANY_LEGENDARIES_THRESHOLD}"
            ),
        });
    }

    let complex_effects = relics
        .iter()
        .flat_map(|relic| relic.active_effects())
        .filter(|effect| effect.conditions.len() > COMPLEX_CONDITION_COUNT)
        .count();
    if complex_effects > COMPLEX_EFFECTS_THRESHOLD {
        warnings.push(SelectionWarning {
            kind: SelectionWarningKind::ComplexConditions,
            message: format!(
                "{complex_effects} effects carry more than {COMPLEX_CONDITION_COUNT} conditions"
            ),
        });
    }

    warnings
}

/// Effects whose combat-style or weapon-type condition contradicts the
/// context. Reported, never used to skip evaluation: the engine re-checks
/// conditions during composition.
struct ContextMismatches {
    style_effects: Vec<String>,
    weapon_effects: Vec<String>,
}

impl ContextMismatches {
    fn into_error(self, context: &CombatContext) -> Option<EngineError> {
        if !self.style_effects.is_empty() {
            return Some(EngineError::CombatStyleIncompatible {
                style: context.combat_style.as_str().to_string(),
                effects: self.style_effects,
            });
        }
        if !self.weapon_effects.is_empty() {
            return Some(EngineError::WeaponTypeIncompatible {
                weapon: context.weapon_type.clone().unwrap_or_default(),
                effects: self.weapon_effects,
            });
        }
        None
    }

    fn into_warnings(self, context: &CombatContext) -> Vec<SelectionWarning> {
        let mut warnings = Vec::new();
        for effect in self.style_effects {
            warnings.push(SelectionWarning {
                kind: SelectionWarningKind::CombatStyleMismatch,
                message: format!(
                    "effect '{effect}' requires a combat style other than '{}'",
                    context.combat_style
                ),
            });
        }
        for effect in self.weapon_effects {
            warnings.push(SelectionWarning {
                kind: SelectionWarningKind::WeaponTypeMismatch,
                message: format!(
                    "effect '{effect}' requires a weapon other than '{}'",
                    context.weapon_type.as_deref().unwrap_or("")
                ),
            });
        }
        warnings
    }
}

fn context_mismatches(relics: &[Relic], context: &CombatContext) -> ContextMismatches {
    let mut style_effects = Vec::new();
    let mut weapon_effects = Vec::new();

    for relic in relics {
        for effect in relic.active_effects() {
            for condition in &effect.conditions {
                match condition {
                    Condition::CombatStyle { style, .. }
                        if style != context.combat_style.as_str() =>
                    {
                        style_effects.push(effect.name.clone());
                    }
                    Condition::WeaponType { weapon, .. } => {
                        if let Some(context_weapon) = &context.weapon_type {
                            if weapon != context_weapon {
                                weapon_effects.push(effect.name.clone());
                            }
                        }
                    }
                    _ => {}
                }
            }
        }
    }

    ContextMismatches {
        style_effects,
        weapon_effects,
    }
}
