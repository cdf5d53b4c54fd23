pub mod build;
pub mod condition;
pub mod context;
pub mod relic;

pub use build::{Build, BuildSlot};
pub use condition::{Condition, CountRequirement};
pub use context::{BaseStats, CombatContext, CombatStyle, NormalizedContext};
pub use relic::{Category, DamageType, Effect, EffectType, Quality, Rarity, Relic, StackingRule};
