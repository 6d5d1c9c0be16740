//! D&D 5e class rule data.
//!
//! Hit dice, saving throw proficiencies, weapon and armor proficiencies, and
//! spellcasting shape for all 12 PHB classes.

use crate::character::{Ability, CharacterClass};
use crate::dice::DieType;
use crate::progression::{
    CasterShape, PreparationRate, SpellcastingMode, BARD_SPELLS_KNOWN, RANGER_SPELLS_KNOWN,
    SORCERER_SPELLS_KNOWN, WARLOCK_SPELLS_KNOWN,
};

/// Static rules for a class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassRules {
    pub hit_die: DieType,
    /// Saving throw proficiencies granted by the class.
    pub saving_throws: [Ability; 2],
    /// Number of skills to choose at level 1.
    pub skill_count: usize,
    /// Weapon proficiency entries: categories ("simple weapons") or names.
    pub weapon_proficiencies: &'static [&'static str],
    pub armor_proficiencies: &'static [&'static str],
    pub spellcasting_ability: Option<Ability>,
    pub caster: CasterShape,
    pub spellcasting: SpellcastingMode,
    /// Cantrips known from level 1, 4, and 10.
    pub cantrips_known: [u32; 3],
}

const ALL_ARMOR: &[&str] = &["light armor", "medium armor", "heavy armor", "shields"];
const MEDIUM_ARMOR: &[&str] = &["light armor", "medium armor", "shields"];
const LIGHT_ARMOR: &[&str] = &["light armor"];

const SIMPLE_AND_MARTIAL: &[&str] = &["simple weapons", "martial weapons"];
const SIMPLE: &[&str] = &["simple weapons"];
const ARCANE_STAVES: &[&str] = &[
    "daggers",
    "darts",
    "slings",
    "quarterstaffs",
    "light crossbows",
];
const FINESSE_TRAINED: &[&str] = &[
    "simple weapons",
    "hand crossbows",
    "longswords",
    "rapiers",
    "shortswords",
];

impl CharacterClass {
    /// Get the static rule data for this class.
    pub fn data(&self) -> ClassRules {
        match self {
            CharacterClass::Barbarian => ClassRules {
                hit_die: DieType::D12,
                saving_throws: [Ability::Strength, Ability::Constitution],
                skill_count: 2,
                weapon_proficiencies: SIMPLE_AND_MARTIAL,
                armor_proficiencies: MEDIUM_ARMOR,
                spellcasting_ability: None,
                caster: CasterShape::None,
                spellcasting: SpellcastingMode::None,
                cantrips_known: [0, 0, 0],
            },
            CharacterClass::Bard => ClassRules {
                hit_die: DieType::D8,
                saving_throws: [Ability::Dexterity, Ability::Charisma],
                skill_count: 3,
                weapon_proficiencies: FINESSE_TRAINED,
                armor_proficiencies: LIGHT_ARMOR,
                spellcasting_ability: Some(Ability::Charisma),
                caster: CasterShape::Full,
                spellcasting: SpellcastingMode::Known(&BARD_SPELLS_KNOWN),
                cantrips_known: [2, 3, 4],
            },
            CharacterClass::Cleric => ClassRules {
                hit_die: DieType::D8,
                saving_throws: [Ability::Wisdom, Ability::Charisma],
                skill_count: 2,
                weapon_proficiencies: SIMPLE,
                armor_proficiencies: MEDIUM_ARMOR,
                spellcasting_ability: Some(Ability::Wisdom),
                caster: CasterShape::Full,
                spellcasting: SpellcastingMode::Prepared(PreparationRate::Full),
                cantrips_known: [3, 4, 5],
            },
            CharacterClass::Druid => ClassRules {
                hit_die: DieType::D8,
                saving_throws: [Ability::Intelligence, Ability::Wisdom],
                skill_count: 2,
                weapon_proficiencies: &[
                    "clubs",
                    "daggers",
                    "darts",
                    "javelins",
                    "maces",
                    "quarterstaffs",
                    "scimitars",
                    "sickles",
                    "slings",
                    "spears",
                ],
                armor_proficiencies: MEDIUM_ARMOR,
                spellcasting_ability: Some(Ability::Wisdom),
                caster: CasterShape::Full,
                spellcasting: SpellcastingMode::Prepared(PreparationRate::Full),
                cantrips_known: [2, 3, 4],
            },
            CharacterClass::Fighter => ClassRules {
                hit_die: DieType::D10,
                saving_throws: [Ability::Strength, Ability::Constitution],
                skill_count: 2,
                weapon_proficiencies: SIMPLE_AND_MARTIAL,
                armor_proficiencies: ALL_ARMOR,
                spellcasting_ability: None,
                caster: CasterShape::None,
                spellcasting: SpellcastingMode::None,
                cantrips_known: [0, 0, 0],
            },
            CharacterClass::Monk => ClassRules {
                hit_die: DieType::D8,
                saving_throws: [Ability::Strength, Ability::Dexterity],
                skill_count: 2,
                weapon_proficiencies: &["simple weapons", "shortswords"],
                armor_proficiencies: &[],
                spellcasting_ability: None,
                caster: CasterShape::None,
                spellcasting: SpellcastingMode::None,
                cantrips_known: [0, 0, 0],
            },
            CharacterClass::Paladin => ClassRules {
                hit_die: DieType::D10,
                saving_throws: [Ability::Wisdom, Ability::Charisma],
                skill_count: 2,
                weapon_proficiencies: SIMPLE_AND_MARTIAL,
                armor_proficiencies: ALL_ARMOR,
                spellcasting_ability: Some(Ability::Charisma),
                caster: CasterShape::Half,
                spellcasting: SpellcastingMode::Prepared(PreparationRate::Half),
                cantrips_known: [0, 0, 0],
            },
            CharacterClass::Ranger => ClassRules {
                hit_die: DieType::D10,
                saving_throws: [Ability::Strength, Ability::Dexterity],
                skill_count: 3,
                weapon_proficiencies: SIMPLE_AND_MARTIAL,
                armor_proficiencies: MEDIUM_ARMOR,
                spellcasting_ability: Some(Ability::Wisdom),
                caster: CasterShape::Half,
                spellcasting: SpellcastingMode::Known(&RANGER_SPELLS_KNOWN),
                cantrips_known: [0, 0, 0],
            },
            CharacterClass::Rogue => ClassRules {
                hit_die: DieType::D8,
                saving_throws: [Ability::Dexterity, Ability::Intelligence],
                skill_count: 4,
                weapon_proficiencies: FINESSE_TRAINED,
                armor_proficiencies: LIGHT_ARMOR,
                spellcasting_ability: None,
                caster: CasterShape::None,
                spellcasting: SpellcastingMode::None,
                cantrips_known: [0, 0, 0],
            },
            CharacterClass::Sorcerer => ClassRules {
                hit_die: DieType::D6,
                saving_throws: [Ability::Constitution, Ability::Charisma],
                skill_count: 2,
                weapon_proficiencies: ARCANE_STAVES,
                armor_proficiencies: &[],
                spellcasting_ability: Some(Ability::Charisma),
                caster: CasterShape::Full,
                spellcasting: SpellcastingMode::Known(&SORCERER_SPELLS_KNOWN),
                cantrips_known: [4, 5, 6],
            },
            CharacterClass::Warlock => ClassRules {
                hit_die: DieType::D8,
                saving_throws: [Ability::Wisdom, Ability::Charisma],
                skill_count: 2,
                weapon_proficiencies: SIMPLE,
                armor_proficiencies: LIGHT_ARMOR,
                spellcasting_ability: Some(Ability::Charisma),
                caster: CasterShape::Pact,
                spellcasting: SpellcastingMode::Known(&WARLOCK_SPELLS_KNOWN),
                cantrips_known: [2, 3, 4],
            },
            CharacterClass::Wizard => ClassRules {
                hit_die: DieType::D6,
                saving_throws: [Ability::Intelligence, Ability::Wisdom],
                skill_count: 2,
                weapon_proficiencies: ARCANE_STAVES,
                armor_proficiencies: &[],
                spellcasting_ability: Some(Ability::Intelligence),
                caster: CasterShape::Full,
                spellcasting: SpellcastingMode::Prepared(PreparationRate::Full),
                cantrips_known: [3, 4, 5],
            },
        }
    }

    pub fn is_spellcaster(&self) -> bool {
        self.data().caster != CasterShape::None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_caster_data_is_consistent() {
        for class in CharacterClass::all() {
            let data = class.data();
            assert_eq!(
                data.spellcasting_ability.is_some(),
                data.caster != CasterShape::None,
                "{class}"
            );
            assert_eq!(
                data.spellcasting == SpellcastingMode::None,
                data.caster == CasterShape::None,
                "{class}"
            );
            assert!(data.skill_count > 0);
            assert!(!data.weapon_proficiencies.is_empty());
        }
    }

    #[test]
    fn test_fighter_data() {
        let data = CharacterClass::Fighter.data();
        assert_eq!(data.saving_throws, [Ability::Strength, Ability::Constitution]);
        assert_eq!(data.hit_die, DieType::D10);
        assert!(!CharacterClass::Fighter.is_spellcaster());
    }

    #[test]
    fn test_warlock_is_pact_caster() {
        assert_eq!(CharacterClass::Warlock.data().caster, CasterShape::Pact);
    }

    #[test]
    fn test_armor_training() {
        assert!(CharacterClass::Fighter
            .data()
            .armor_proficiencies
            .contains(&"heavy armor"));
        assert_eq!(CharacterClass::Rogue.data().armor_proficiencies, ["light armor"]);
        assert!(CharacterClass::Wizard.data().armor_proficiencies.is_empty());
    }

    #[test]
    fn test_rogue_gets_4_skills() {
        assert_eq!(CharacterClass::Rogue.data().skill_count, 4);
    }
}
