//! Built-in relic catalog backing the CLI and test fixtures. Real
//! deployments load relics from the persistence layer instead.

use crate::model::Relic;
use crate::repo::InMemoryRelicRepository;

const CATALOG_JSON: &str = r#"[
  {
    "id": "bladesong_sigil",
    "name": "Bladesong Sigil",
    "description": "A humming sigil that sharpens every swing.",
    "category": "attack",
    "rarity": "rare",
    "quality": "polished",
    "obtainment_difficulty": 3,
    "effects": [
      {
        "id": "bladesong_edge",
        "name": "Singing Edge",
        "effect_type": "attack_percentage",
        "value": 12.0,
        "stacking_rule": "additive"
      }
    ]
  },
  {
    "id": "bloodied_fang",
    "name": "Bloodied Fang",
    "description": "Still warm. Best not to ask.",
    "category": "attack",
    "rarity": "epic",
    "quality": "grand",
    "obtainment_difficulty": 5,
    "effects": [
      {
        "id": "fang_frenzy",
        "name": "Frenzied Bite",
        "effect_type": "attack_multiplier",
        "value": 1.15,
        "stacking_rule": "multiplicative"
      }
    ]
  },
  {
    "id": "colossus_core",
    "name": "Colossus Core",
    "description": "The still-beating heart of a stone giant.",
    "category": "attack",
    "rarity": "legendary",
    "quality": "grand",
    "obtainment_difficulty": 8,
    "conflicts": ["oathbreakers_chain"],
    "effects": [
      {
        "id": "core_might",
        "name": "Titanic Might",
        "effect_type": "attack_flat",
        "value": 40.0,
        "stacking_rule": "additive"
      }
    ]
  },
  {
    "id": "duelists_oath",
    "name": "Duelist's Oath",
    "description": "Sworn to the blade, and only the blade.",
    "category": "attack",
    "rarity": "epic",
    "quality": "polished",
    "obtainment_difficulty": 6,
    "effects": [
      {
        "id": "oath_edge",
        "name": "Sworn Edge",
        "effect_type": "weapon_specific",
        "value": 10.0,
        "stacking_rule": "unique",
        "conditions": [
          {
            "type": "weapon_type",
            "value": "straight_sword",
            "description": "straight swords only"
          }
        ]
      }
    ]
  },
  {
    "id": "emberheart",
    "name": "Emberheart",
    "description": "Warm to the touch, furious in battle.",
    "category": "elemental",
    "rarity": "rare",
    "quality": "polished",
    "obtainment_difficulty": 4,
    "effects": [
      {
        "id": "ember_burst",
        "name": "Ember Burst",
        "effect_type": "elemental_damage",
        "value": 15.0,
        "stacking_rule": "multiplicative",
        "damage_types": ["fire"]
      }
    ]
  },
  {
    "id": "executioners_mark",
    "name": "Executioner's Mark",
    "description": "Marks the condemned for the killing blow.",
    "category": "critical",
    "rarity": "epic",
    "quality": "grand",
    "obtainment_difficulty": 7,
    "effects": [
      {
        "id": "mark_verdict",
        "name": "Final Verdict",
        "effect_type": "critical_multiplier",
        "value": 1.25,
        "stacking_rule": "multiplicative"
      }
    ]
  },
  {
    "id": "featherweight_charm",
    "name": "Featherweight Charm",
    "description": "Light as a feather, quick as a loosed arrow.",
    "category": "utility",
    "rarity": "rare",
    "quality": "delicate",
    "obtainment_difficulty": 2,
    "effects": [
      {
        "id": "charm_quickdraw",
        "name": "Quickdraw",
        "effect_type": "attack_percentage",
        "value": 8.0,
        "stacking_rule": "additive",
        "conditions": [
          {
            "type": "combat_style",
            "value": "ranged",
            "description": "ranged combat only"
          }
        ]
      }
    ]
  },
  {
    "id": "gamblers_die",
    "name": "Gambler's Die",
    "description": "Loaded, probably.",
    "category": "critical",
    "rarity": "rare",
    "quality": "delicate",
    "obtainment_difficulty": 3,
    "effects": [
      {
        "id": "die_luck",
        "name": "Loaded Luck",
        "effect_type": "critical_chance",
        "value": 12.0,
        "stacking_rule": "additive"
      }
    ]
  },
  {
    "id": "last_stand_banner",
    "name": "Last Stand Banner",
    "description": "Raised when retreat stops being an option.",
    "category": "attack",
    "rarity": "legendary",
    "quality": "grand",
    "obtainment_difficulty": 9,
    "effects": [
      {
        "id": "banner_defiance",
        "name": "Defiant Roar",
        "effect_type": "conditional_damage",
        "value": 50.0,
        "stacking_rule": "unique",
        "conditions": [
          {
            "type": "health_threshold",
            "value": 30.0,
            "description": "below 30% health"
          }
        ]
      }
    ]
  },
  {
    "id": "mentors_keepsake",
    "name": "Mentor's Keepsake",
    "description": "Grows alongside its bearer.",
    "category": "utility",
    "rarity": "common",
    "quality": "delicate",
    "obtainment_difficulty": 1,
    "effects": [
      {
        "id": "keepsake_lessons",
        "name": "Hard Lessons",
        "effect_type": "attack_percentage",
        "value": 2.0,
        "stacking_rule": "additive",
        "conditions": [
          {
            "type": "equipment_count",
            "value": "character_level",
            "description": "scales with character level"
          }
        ]
      }
    ]
  },
  {
    "id": "oathbreakers_chain",
    "name": "Oathbreaker's Chain",
    "description": "A broken vow, reforged as a weapon.",
    "category": "attack",
    "rarity": "epic",
    "quality": "polished",
    "obtainment_difficulty": 6,
    "effects": [
      {
        "id": "chain_betrayal",
        "name": "Weight of Betrayal",
        "effect_type": "attack_flat",
        "value": 30.0,
        "stacking_rule": "overwrite",
        "priority": 5
      }
    ]
  },
  {
    "id": "runehunters_lens",
    "name": "Runehunter's Lens",
    "description": "Reveals the seams in dead flesh.",
    "category": "utility",
    "rarity": "rare",
    "quality": "polished",
    "obtainment_difficulty": 4,
    "effects": [
      {
        "id": "lens_insight",
        "name": "Grave Insight",
        "effect_type": "attack_percentage",
        "value": 10.0,
        "stacking_rule": "additive",
        "conditions": [
          {
            "type": "enemy_type",
            "value": "undead",
            "description": "against the undead"
          }
        ]
      }
    ]
  },
  {
    "id": "serpents_coil",
    "name": "Serpent's Coil",
    "description": "Strikes hardest at the end of the lunge.",
    "category": "attack",
    "rarity": "rare",
    "quality": "polished",
    "obtainment_difficulty": 4,
    "effects": [
      {
        "id": "coil_finisher",
        "name": "Coiled Finisher",
        "effect_type": "attack_percentage",
        "value": 15.0,
        "stacking_rule": "additive",
        "conditions": [
          {
            "type": "chain_position",
            "value": 3,
            "description": "third hit of a chain"
          }
        ]
      }
    ]
  },
  {
    "id": "stormcallers_eye",
    "name": "Stormcaller's Eye",
    "description": "It blinked once, during a thunderstorm.",
    "category": "elemental",
    "rarity": "epic",
    "quality": "polished",
    "obtainment_difficulty": 6,
    "effects": [
      {
        "id": "eye_static",
        "name": "Static Charge",
        "effect_type": "elemental_damage",
        "value": 25.0,
        "stacking_rule": "additive",
        "damage_types": ["lightning"]
      }
    ]
  },
  {
    "id": "twilight_prism",
    "name": "Twilight Prism",
    "description": "Splits dying light into killing colors.",
    "category": "elemental",
    "rarity": "legendary",
    "quality": "grand",
    "obtainment_difficulty": 8,
    "effects": [
      {
        "id": "prism_refraction",
        "name": "Killing Refraction",
        "effect_type": "attack_multiplier",
        "value": 1.2,
        "stacking_rule": "multiplicative"
      },
      {
        "id": "prism_spectrum",
        "name": "Wide Spectrum",
        "effect_type": "elemental_damage",
        "value": 20.0,
        "stacking_rule": "additive",
        "damage_types": ["fire", "ice", "lightning"]
      }
    ]
  },
  {
    "id": "vanguards_bulwark",
    "name": "Vanguard's Bulwark",
    "description": "The first into the breach carries it.",
    "category": "defense",
    "rarity": "rare",
    "quality": "polished",
    "obtainment_difficulty": 3,
    "effects": [
      {
        "id": "bulwark_stand",
        "name": "Unbroken Line",
        "effect_type": "unique",
        "value": 10.0,
        "stacking_rule": "unique"
      }
    ]
  },
  {
    "id": "wolfpack_totem",
    "name": "Wolfpack Totem",
    "description": "The pack hunts as one.",
    "category": "attack",
    "rarity": "common",
    "quality": "polished",
    "obtainment_difficulty": 2,
    "effects": [
      {
        "id": "totem_hunt",
        "name": "Pack Hunt",
        "effect_type": "attack_percentage",
        "value": 6.0,
        "stacking_rule": "additive"
      }
    ]
  }
]"#;

pub fn seed_relics() -> Result<Vec<Relic>, serde_json::Error> {
    serde_json::from_str(CATALOG_JSON)
}

pub fn seed_repository() -> Result<InMemoryRelicRepository, serde_json::Error> {
    Ok(seed_relics()?.into_iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CombatStyle;
    use crate::optimizer::candidates::meta_relic_ids;
    use crate::repo::RelicRepository;

    #[test]
    fn catalog_parses() {
        let relics = seed_relics().expect("catalog must parse");
        assert_eq!(relics.len(), 17);
        assert!(relics.iter().all(|relic| relic.active));
        assert!(relics.iter().all(|relic| !relic.effects.is_empty()));
    }

    #[test]
    fn meta_builds_reference_catalog_relics() {
        let repo = seed_repository().expect("catalog must parse");
        for style in CombatStyle::ALL {
            for id in meta_relic_ids(style) {
                assert!(
                    repo.get_relic(id).unwrap().is_some(),
                    "meta relic '{id}' missing from catalog"
                );
            }
        }
    }

    #[test]
    fn conflicts_reference_real_relics() {
        let repo = seed_repository().expect("catalog must parse");
        for relic in seed_relics().unwrap() {
            for conflict in &relic.conflicts {
                assert!(repo.get_relic(conflict).unwrap().is_some());
            }
        }
    }
}
