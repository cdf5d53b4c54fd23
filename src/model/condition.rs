use std::fmt;

use serde::de::{Deserializer, Error as DeError};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Requirement attached to an effect. All conditions on an effect must hold
/// for the effect to contribute.
///
/// The wire shape is `{"type": ..., "value": ..., "description": ...}`.
/// Tags we do not recognize (and recognized tags with a malformed value)
/// round-trip unchanged through [Condition::Unknown] and never hold.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    WeaponType {
        weapon: String,
        description: String,
    },
    CombatStyle {
        style: String,
        description: String,
    },
    HealthThreshold {
        max_percentage: f64,
        description: String,
    },
    ChainPosition {
        position: u64,
        description: String,
    },
    EnemyType {
        enemy: String,
        description: String,
    },
    TimeBased {
        window: String,
        description: String,
    },
    EquipmentCount {
        requirement: CountRequirement,
        description: String,
    },
    Unknown {
        raw: Value,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum CountRequirement {
    /// Context must report at least this many equipped pieces.
    AtLeast(u64),
    /// The literal `"character_level"`: marks the owning effect as
    /// level-scaled instead of gating on an equipment count.
    CharacterLevel,
}

pub const CHARACTER_LEVEL_LITERAL: &str = "character_level";

impl Condition {
    pub fn kind_str(&self) -> &str {
        match self {
            Self::WeaponType { .. } => "weapon_type",
            Self::CombatStyle { .. } => "combat_style",
            Self::HealthThreshold { .. } => "health_threshold",
            Self::ChainPosition { .. } => "chain_position",
            Self::EnemyType { .. } => "enemy_type",
            Self::TimeBased { .. } => "time_based",
            Self::EquipmentCount { .. } => "equipment_count",
            Self::Unknown { raw } => raw
                .get("type")
                .and_then(Value::as_str)
                .unwrap_or("unknown"),
        }
    }

    /// Description for breakdown display, falling back to a generated one.
    pub fn display_description(&self) -> String {
        let stored = match self {
            Self::WeaponType { description, .. }
            | Self::CombatStyle { description, .. }
            | Self::HealthThreshold { description, .. }
            | Self::ChainPosition { description, .. }
            | Self::EnemyType { description, .. }
            | Self::TimeBased { description, .. }
            | Self::EquipmentCount { description, .. } => description.as_str(),
            Self::Unknown { raw } => raw
                .get("description")
                .and_then(Value::as_str)
                .unwrap_or(""),
        };
        if !stored.is_empty() {
            return stored.to_string();
        }
        match self {
            Self::WeaponType { weapon, .. } => format!("requires weapon '{weapon}'"),
            Self::CombatStyle { style, .. } => format!("requires combat style '{style}'"),
            Self::HealthThreshold { max_percentage, .. } => {
                format!("requires health at or below {max_percentage}%")
            }
            Self::ChainPosition { position, .. } => format!("requires chain position {position}"),
            Self::EnemyType { enemy, .. } => format!("requires enemy '{enemy}'"),
            Self::TimeBased { window, .. } => format!("time window '{window}'"),
            Self::EquipmentCount { requirement, .. } => match requirement {
                CountRequirement::AtLeast(count) => {
                    format!("requires at least {count} equipped pieces")
                }
                CountRequirement::CharacterLevel => "scales with character level".to_string(),
            },
            Self::Unknown { .. } => format!("unrecognized condition '{}'", self.kind_str()),
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_description())
    }
}

impl Serialize for Condition {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let value = condition_to_value(self);
        value.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Condition {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Value::deserialize(deserializer)?;
        if !raw.is_object() {
            return Err(DeError::custom("condition must be a JSON object"));
        }
        Ok(condition_from_value(raw))
    }
}

fn condition_to_value(condition: &Condition) -> Value {
    let (kind, value, description) = match condition {
        Condition::Unknown { raw } => return raw.clone(),
        Condition::WeaponType {
            weapon,
            description,
        } => ("weapon_type", Value::String(weapon.clone()), description),
        Condition::CombatStyle { style, description } => {
            ("combat_style", Value::String(style.clone()), description)
        }
        Condition::HealthThreshold {
            max_percentage,
            description,
        } => (
            "health_threshold",
            serde_json::json!(max_percentage),
            description,
        ),
        Condition::ChainPosition {
            position,
            description,
        } => ("chain_position", Value::from(*position), description),
        Condition::EnemyType { enemy, description } => {
            ("enemy_type", Value::String(enemy.clone()), description)
        }
        Condition::TimeBased {
            window,
            description,
        } => ("time_based", Value::String(window.clone()), description),
        Condition::EquipmentCount {
            requirement,
            description,
        } => {
            let value = match requirement {
                CountRequirement::AtLeast(count) => Value::from(*count),
                CountRequirement::CharacterLevel => {
                    Value::String(CHARACTER_LEVEL_LITERAL.to_string())
                }
            };
            ("equipment_count", value, description)
        }
    };

    let mut object = Map::new();
    object.insert("type".to_string(), Value::String(kind.to_string()));
    object.insert("value".to_string(), value);
    if !description.is_empty() {
        object.insert(
            "description".to_string(),
            Value::String(description.clone()),
        );
    }
    Value::Object(object)
}

fn condition_from_value(raw: Value) -> Condition {
    let Some(object) = raw.as_object() else {
        return Condition::Unknown { raw };
    };
    let Some(kind) = object.get("type").and_then(Value::as_str) else {
        return Condition::Unknown { raw };
    };
    let value = object.get("value").cloned().unwrap_or(Value::Null);
    let description = object
        .get("description")
        .and_then(Value::as_str)
        .unwrap_or("")
        .to_string();

    match kind {
        "weapon_type" => match value.as_str() {
            Some(weapon) => Condition::WeaponType {
                weapon: weapon.to_string(),
                description,
            },
            None => Condition::Unknown { raw },
        },
        "combat_style" => match value.as_str() {
            Some(style) => Condition::CombatStyle {
                style: style.to_string(),
                description,
            },
            None => Condition::Unknown { raw },
        },
        "health_threshold" => match value.as_f64() {
            Some(max_percentage) => Condition::HealthThreshold {
                max_percentage,
                description,
            },
            None => Condition::Unknown { raw },
        },
        "chain_position" => match value.as_u64() {
            Some(position) => Condition::ChainPosition {
                position,
                description,
            },
            None => Condition::Unknown { raw },
        },
        "enemy_type" => match value.as_str() {
            Some(enemy) => Condition::EnemyType {
                enemy: enemy.to_string(),
                description,
            },
            None => Condition::Unknown { raw },
        },
        "time_based" => match value.as_str() {
            Some(window) => Condition::TimeBased {
                window: window.to_string(),
                description,
            },
            None => Condition::Unknown { raw },
        },
        "equipment_count" => {
            if let Some(count) = value.as_u64() {
                Condition::EquipmentCount {
                    requirement: CountRequirement::AtLeast(count),
                    description,
                }
            } else if value.as_str() == Some(CHARACTER_LEVEL_LITERAL) {
                Condition::EquipmentCount {
                    requirement: CountRequirement::CharacterLevel,
                    description,
                }
            } else {
                Condition::Unknown { raw }
            }
        }
        _ => Condition::Unknown { raw },
    }
}
