use serde::{Deserialize, Serialize};

use crate::model::condition::{Condition, CountRequirement};

/// Hard cap on relics per selection. Enforced before any relic is loaded.
pub const MAX_RELICS_PER_SELECTION: usize = 9;

pub const MAX_EFFECT_VALUE: f64 = 1000.0;
pub const MAX_EFFECT_PRIORITY: u8 = 10;
pub const MAX_OBTAINMENT_DIFFICULTY: u8 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Attack,
    Defense,
    Utility,
    Critical,
    Elemental,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Attack => "attack",
            Self::Defense => "defense",
            Self::Utility => "utility",
            Self::Critical => "critical",
            Self::Elemental => "elemental",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rarity {
    Common,
    Rare,
    Epic,
    Legendary,
}

impl Rarity {
    /// Ordering rank, 1 (common) through 4 (legendary).
    pub fn rank(&self) -> u8 {
        match self {
            Self::Common => 1,
            Self::Rare => 2,
            Self::Epic => 3,
            Self::Legendary => 4,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Common => "common",
            Self::Rare => "rare",
            Self::Epic => "epic",
            Self::Legendary => "legendary",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Quality {
    Delicate,
    Polished,
    Grand,
}

impl Quality {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Delicate => "delicate",
            Self::Polished => "polished",
            Self::Grand => "grand",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectType {
    AttackMultiplier,
    AttackFlat,
    AttackPercentage,
    CriticalMultiplier,
    CriticalChance,
    ElementalDamage,
    ConditionalDamage,
    WeaponSpecific,
    Unique,
}

impl EffectType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AttackMultiplier => "attack_multiplier",
            Self::AttackFlat => "attack_flat",
            Self::AttackPercentage => "attack_percentage",
            Self::CriticalMultiplier => "critical_multiplier",
            Self::CriticalChance => "critical_chance",
            Self::ElementalDamage => "elemental_damage",
            Self::ConditionalDamage => "conditional_damage",
            Self::WeaponSpecific => "weapon_specific",
            Self::Unique => "unique",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StackingRule {
    Additive,
    Multiplicative,
    Overwrite,
    Unique,
}

impl StackingRule {
    /// Processing order within a composition. Lower goes first.
    pub const PROCESSING_ORDER: [StackingRule; 4] = [
        Self::Additive,
        Self::Multiplicative,
        Self::Overwrite,
        Self::Unique,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Additive => "additive",
            Self::Multiplicative => "multiplicative",
            Self::Overwrite => "overwrite",
            Self::Unique => "unique",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DamageType {
    Physical,
    Magical,
    Fire,
    Ice,
    Lightning,
    Dark,
    Holy,
}

impl DamageType {
    pub const ALL: [DamageType; 7] = [
        Self::Physical,
        Self::Magical,
        Self::Fire,
        Self::Ice,
        Self::Lightning,
        Self::Dark,
        Self::Holy,
    ];
}

/// A single stacking contribution attached to a relic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Effect {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub effect_type: EffectType,
    pub value: f64,
    pub stacking_rule: StackingRule,
    /// Used only for overwrite tie-breaking.
    #[serde(default)]
    pub priority: u8,
    #[serde(default)]
    pub damage_types: Vec<DamageType>,
    #[serde(default)]
    pub conditions: Vec<Condition>,
    #[serde(default = "default_active")]
    pub active: bool,
}

impl Effect {
    /// True when this effect's value is scaled by the character level: an
    /// `attack_percentage` effect carrying the `equipment_count` condition
    /// whose value is the literal `"character_level"`.
    pub fn is_level_scaled(&self) -> bool {
        self.effect_type == EffectType::AttackPercentage
            && self.conditions.iter().any(|condition| {
                matches!(
                    condition,
                    Condition::EquipmentCount {
                        requirement: CountRequirement::CharacterLevel,
                        ..
                    }
                )
            })
    }

    pub fn has_weapon_condition(&self) -> bool {
        self.conditions
            .iter()
            .any(|condition| matches!(condition, Condition::WeaponType { .. }))
    }

    pub fn condition_descriptions(&self) -> Vec<String> {
        self.conditions
            .iter()
            .map(Condition::display_description)
            .collect()
    }
}

/// A named, self-contained bundle of effects selectable by the player.
///
/// `conflicts` is stored one-sided; the engine treats the relation as
/// undirected (either side listing the other forbids joint use).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relic {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub category: Category,
    pub rarity: Rarity,
    pub quality: Quality,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,
    pub obtainment_difficulty: u8,
    #[serde(default)]
    pub conflicts: Vec<String>,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default)]
    pub effects: Vec<Effect>,
}

impl Relic {
    pub fn active_effects(&self) -> impl Iterator<Item = &Effect> {
        self.effects.iter().filter(|effect| effect.active)
    }

    pub fn conflicts_with(&self, other: &Relic) -> bool {
        self.conflicts.iter().any(|id| id == &other.id)
            || other.conflicts.iter().any(|id| id == &self.id)
    }
}

fn default_active() -> bool {
    true
}
