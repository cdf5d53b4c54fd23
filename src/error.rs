use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

/// One offending relic and the selected ids it conflicts with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictRecord {
    pub relic_id: String,
    pub conflicting_ids: Vec<String>,
}

/// Engine error space. Every variant maps to a stable string code via
/// [EngineError::code]; the transport layer owns the HTTP mapping.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error("relic selection is empty")]
    EmptyRelicList,

    #[error("{count} relics selected, limit is {limit}")]
    RelicLimitExceeded { count: usize, limit: usize },

    #[error("duplicate relic ids in selection: {}", ids.join(", "))]
    DuplicateRelics { ids: Vec<String> },

    #[error("unknown relic ids: {}", ids.join(", "))]
    RelicNotFound { ids: Vec<String> },

    #[error("inactive relics in selection: {}", ids.join(", "))]
    InactiveRelics { ids: Vec<String> },

    #[error("relic '{relic_id}' is structurally invalid: {reason}")]
    InvalidRelicStructure { relic_id: String, reason: String },

    #[error("effect '{effect_id}' on relic '{relic_id}' is structurally invalid: {reason}")]
    InvalidEffectStructure {
        relic_id: String,
        effect_id: String,
        reason: String,
    },

    #[error("selection contains {} conflicting relic pair group(s)", records.len())]
    ConflictingRelics { records: Vec<ConflictRecord> },

    #[error("combat style '{style}' is incompatible with effect(s): {}", effects.join(", "))]
    CombatStyleIncompatible { style: String, effects: Vec<String> },

    #[error("weapon type '{weapon}' is incompatible with effect(s): {}", effects.join(", "))]
    WeaponTypeIncompatible { weapon: String, effects: Vec<String> },

    #[error("invalid calculation context: {reason}")]
    InvalidCalculationContext { reason: String },

    #[error("composition exceeded its deadline")]
    CalculationTimeout,

    #[error("optimization exceeded its deadline")]
    OptimizationTimeout,

    #[error("{count} combinations submitted, comparison accepts {min} through {max}")]
    SelectionLimitExceeded {
        count: usize,
        min: usize,
        max: usize,
    },

    #[error("invalid build: {reason}")]
    InvalidBuildSize { reason: String },

    #[error("unknown combat style '{raw}'")]
    InvalidCombatStyle { raw: String },

    #[error("internal error: {reason}")]
    Internal { reason: String },
}

impl EngineError {
    /// Stable machine-readable identifier. Never changes for a given variant.
    pub fn code(&self) -> &'static str {
        match self {
            Self::EmptyRelicList => "EMPTY_RELIC_LIST",
            Self::RelicLimitExceeded { .. } => "RELIC_LIMIT_EXCEEDED",
            Self::DuplicateRelics { .. } => "DUPLICATE_RELICS",
            Self::RelicNotFound { .. } => "RELIC_NOT_FOUND",
            Self::InactiveRelics { .. } => "INACTIVE_RELICS",
            Self::InvalidRelicStructure { .. } => "INVALID_RELIC_STRUCTURE",
            Self::InvalidEffectStructure { .. } => "INVALID_EFFECT_STRUCTURE",
            Self::ConflictingRelics { .. } => "CONFLICTING_RELICS",
            Self::CombatStyleIncompatible { .. } => "COMBAT_STYLE_INCOMPATIBLE",
            Self::WeaponTypeIncompatible { .. } => "WEAPON_TYPE_INCOMPATIBLE",
            Self::InvalidCalculationContext { .. } => "INVALID_CALCULATION_CONTEXT",
            Self::CalculationTimeout => "CALCULATION_TIMEOUT",
            Self::OptimizationTimeout => "OPTIMIZATION_TIMEOUT",
            Self::SelectionLimitExceeded { .. } => "SELECTION_LIMIT_EXCEEDED",
            Self::InvalidBuildSize { .. } => "INVALID_BUILD_SIZE",
            Self::InvalidCombatStyle { .. } => "INVALID_COMBAT_STYLE",
            Self::Internal { .. } => "INTERNAL",
        }
    }

    /// Structured context a caller needs to fix the request.
    pub fn details(&self) -> Value {
        match self {
            Self::EmptyRelicList | Self::CalculationTimeout | Self::OptimizationTimeout => {
                json!({})
            }
            Self::RelicLimitExceeded { count, limit } => {
                json!({ "count": count, "limit": limit })
            }
            Self::DuplicateRelics { ids }
            | Self::RelicNotFound { ids }
            | Self::InactiveRelics { ids } => json!({ "relic_ids": ids }),
            Self::InvalidRelicStructure { relic_id, reason } => {
                json!({ "relic_id": relic_id, "reason": reason })
            }
            Self::InvalidEffectStructure {
                relic_id,
                effect_id,
                reason,
            } => json!({ "relic_id": relic_id, "effect_id": effect_id, "reason": reason }),
            Self::ConflictingRelics { records } => json!({ "conflicts": records }),
            Self::CombatStyleIncompatible { style, effects } => {
                json!({ "combat_style": style, "effects": effects })
            }
            Self::WeaponTypeIncompatible { weapon, effects } => {
                json!({ "weapon_type": weapon, "effects": effects })
            }
            Self::InvalidCalculationContext { reason } => json!({ "reason": reason }),
            Self::SelectionLimitExceeded { count, min, max } => {
                json!({ "count": count, "min": min, "max": max })
            }
            Self::InvalidBuildSize { reason } => json!({ "reason": reason }),
            Self::InvalidCombatStyle { raw } => {
                json!({ "raw": raw, "allowed": ["melee", "ranged", "magic", "hybrid"] })
            }
            Self::Internal { reason } => json!({ "reason": reason }),
        }
    }

    /// Full error payload: `{code, message, details}`.
    pub fn to_payload(&self) -> Value {
        json!({
            "code": self.code(),
            "message": self.to_string(),
            "details": self.details(),
        })
    }
}
