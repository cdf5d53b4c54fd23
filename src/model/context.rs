use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::EngineError;

pub const MIN_CHARACTER_LEVEL: u32 = 1;
pub const MAX_CHARACTER_LEVEL: u32 = 999;
pub const DEFAULT_ATTACK_POWER: f64 = 100.0;

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum CombatStyle {
    #[default]
    Melee,
    Ranged,
    Magic,
    Hybrid,
}

impl CombatStyle {
    pub const ALL: [CombatStyle; 4] = [Self::Melee, Self::Ranged, Self::Magic, Self::Hybrid];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Melee => "melee",
            Self::Ranged => "ranged",
            Self::Magic => "magic",
            Self::Hybrid => "hybrid",
        }
    }
}

impl fmt::Display for CombatStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for CombatStyle {
    type Err = EngineError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw {
            "melee" => Ok(Self::Melee),
            "ranged" => Ok(Self::Ranged),
            "magic" => Ok(Self::Magic),
            "hybrid" => Ok(Self::Hybrid),
            _ => Err(EngineError::InvalidCombatStyle {
                raw: raw.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BaseStats {
    #[serde(default = "default_attack_power")]
    pub attack_power: f64,
}

impl Default for BaseStats {
    fn default() -> Self {
        Self {
            attack_power: DEFAULT_ATTACK_POWER,
        }
    }
}

fn default_attack_power() -> f64 {
    DEFAULT_ATTACK_POWER
}

fn default_character_level() -> u32 {
    MIN_CHARACTER_LEVEL
}

/// The runtime situation effect conditions are evaluated against.
///
/// `conditions` carries the symbolic lookups (`health_percentage`,
/// `chain_position`, `enemy_type`, `equipment_count`); typed accessors below
/// read them out. Everything is optional except `combat_style`, which
/// defaults to melee.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombatContext {
    #[serde(default)]
    pub combat_style: CombatStyle,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weapon_type: Option<String>,
    #[serde(default = "default_character_level")]
    pub character_level: u32,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub conditions: BTreeMap<String, Value>,
    #[serde(default)]
    pub base_stats: BaseStats,
}

impl Default for CombatContext {
    fn default() -> Self {
        Self {
            combat_style: CombatStyle::default(),
            weapon_type: None,
            character_level: MIN_CHARACTER_LEVEL,
            conditions: BTreeMap::new(),
            base_stats: BaseStats::default(),
        }
    }
}

impl CombatContext {
    pub fn base_attack_power(&self) -> f64 {
        self.base_stats.attack_power
    }

    pub fn health_percentage(&self) -> Option<f64> {
        self.conditions.get("health_percentage").and_then(Value::as_f64)
    }

    pub fn chain_position(&self) -> Option<u64> {
        self.conditions.get("chain_position").and_then(Value::as_u64)
    }

    pub fn enemy_type(&self) -> Option<&str> {
        self.conditions.get("enemy_type").and_then(Value::as_str)
    }

    pub fn equipment_count(&self) -> Option<u64> {
        self.conditions.get("equipment_count").and_then(Value::as_u64)
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        if !(MIN_CHARACTER_LEVEL..=MAX_CHARACTER_LEVEL).contains(&self.character_level) {
            return Err(EngineError::InvalidCalculationContext {
                reason: format!(
                    "character_level {} outside {MIN_CHARACTER_LEVEL}..={MAX_CHARACTER_LEVEL}",
                    self.character_level
                ),
            });
        }
        if !self.base_stats.attack_power.is_finite() || self.base_stats.attack_power <= 0.0 {
            return Err(EngineError::InvalidCalculationContext {
                reason: format!(
                    "base attack power {} must be positive and finite",
                    self.base_stats.attack_power
                ),
            });
        }
        Ok(())
    }

    /// Canonical form hashed into the cache key: defaults applied, keys in
    /// sorted order, absent optionals omitted rather than null.
    pub fn normalized(&self) -> NormalizedContext {
        NormalizedContext {
            base_attack_power: self.base_stats.attack_power,
            character_level: self.character_level,
            combat_style: self.combat_style,
            conditions: self.conditions.clone(),
            weapon_type: self.weapon_type.clone(),
        }
    }
}

/// Cache-key form of a [CombatContext]. Field order here is the canonical
/// key order; serialization keeps it stable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedContext {
    pub base_attack_power: f64,
    pub character_level: u32,
    pub combat_style: CombatStyle,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub conditions: BTreeMap<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weapon_type: Option<String>,
}
