//! Character records: ability scores, hit points, classes, and the
//! player-character snapshot the progression rules operate on.

use crate::catalog::{ReferenceCatalog, StandardCatalog};
use crate::combat;
use crate::dice::RollSource;
use crate::encounter::ActiveCondition;
use crate::ids::{CharacterId, ItemId};
use crate::progression::{
    self, AbilityScoreImprovement, CapacityExceeded, CapacityKind, HitPointGain,
    HitPointIncrease, SpellSlotTable,
};
use crate::weapons::{self, EquippedWeaponStats, InventoryItem};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use tracing::{debug, info, warn};

// ============================================================================
// Ability Scores
// ============================================================================

/// The six ability scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Ability {
    Strength,
    Dexterity,
    Constitution,
    Intelligence,
    Wisdom,
    Charisma,
}

impl Ability {
    pub fn abbreviation(&self) -> &'static str {
        match self {
            Ability::Strength => "STR",
            Ability::Dexterity => "DEX",
            Ability::Constitution => "CON",
            Ability::Intelligence => "INT",
            Ability::Wisdom => "WIS",
            Ability::Charisma => "CHA",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Ability::Strength => "Strength",
            Ability::Dexterity => "Dexterity",
            Ability::Constitution => "Constitution",
            Ability::Intelligence => "Intelligence",
            Ability::Wisdom => "Wisdom",
            Ability::Charisma => "Charisma",
        }
    }

    pub fn all() -> [Ability; 6] {
        [
            Ability::Strength,
            Ability::Dexterity,
            Ability::Constitution,
            Ability::Intelligence,
            Ability::Wisdom,
            Ability::Charisma,
        ]
    }
}

impl fmt::Display for Ability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.abbreviation())
    }
}

/// Derived bonus for a raw ability score.
pub fn ability_modifier(score: u8) -> i8 {
    // Floor division: 8-9 = -1, 10-11 = 0, 12-13 = +1
    (score as i16 - 10).div_euclid(2) as i8
}

/// Ability scores container. Modifiers are always derived, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbilityScores {
    pub strength: u8,
    pub dexterity: u8,
    pub constitution: u8,
    pub intelligence: u8,
    pub wisdom: u8,
    pub charisma: u8,
}

impl AbilityScores {
    pub fn new(str: u8, dex: u8, con: u8, int: u8, wis: u8, cha: u8) -> Self {
        Self {
            strength: str,
            dexterity: dex,
            constitution: con,
            intelligence: int,
            wisdom: wis,
            charisma: cha,
        }
    }

    pub fn standard_array() -> Self {
        Self::new(15, 14, 13, 12, 10, 8)
    }

    pub fn get(&self, ability: Ability) -> u8 {
        match ability {
            Ability::Strength => self.strength,
            Ability::Dexterity => self.dexterity,
            Ability::Constitution => self.constitution,
            Ability::Intelligence => self.intelligence,
            Ability::Wisdom => self.wisdom,
            Ability::Charisma => self.charisma,
        }
    }

    pub fn set(&mut self, ability: Ability, value: u8) {
        match ability {
            Ability::Strength => self.strength = value,
            Ability::Dexterity => self.dexterity = value,
            Ability::Constitution => self.constitution = value,
            Ability::Intelligence => self.intelligence = value,
            Ability::Wisdom => self.wisdom = value,
            Ability::Charisma => self.charisma = value,
        }
    }

    pub fn modifier(&self, ability: Ability) -> i8 {
        ability_modifier(self.get(ability))
    }
}

impl Default for AbilityScores {
    fn default() -> Self {
        Self::new(10, 10, 10, 10, 10, 10)
    }
}

// ============================================================================
// Hit Points
// ============================================================================

/// Hit points tracking. `0 <= current <= max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "HitPointsRecord")]
pub struct HitPoints {
    current: i32,
    max: i32,
}

#[derive(Deserialize)]
struct HitPointsRecord {
    current: i32,
    max: i32,
}

impl From<HitPointsRecord> for HitPoints {
    fn from(record: HitPointsRecord) -> Self {
        HitPoints::with_current(record.current, record.max)
    }
}

impl HitPoints {
    pub fn new(max: i32) -> Self {
        let max = max.max(0);
        Self { current: max, max }
    }

    /// Clamps `current` into `0..=max`.
    pub fn with_current(current: i32, max: i32) -> Self {
        let max = max.max(0);
        Self {
            current: current.clamp(0, max),
            max,
        }
    }

    pub fn current(&self) -> i32 {
        self.current
    }

    pub fn max(&self) -> i32 {
        self.max
    }

    /// Apply damage, returning how many hit points were actually lost.
    pub fn take_damage(&mut self, amount: u32) -> i32 {
        let old = self.current;
        self.current = self
            .current
            .saturating_sub(amount.min(i32::MAX as u32) as i32)
            .max(0);
        old - self.current
    }

    /// Apply healing, returning how many hit points were actually restored.
    pub fn heal(&mut self, amount: u32) -> i32 {
        let old = self.current;
        self.current = self
            .current
            .saturating_add(amount.min(i32::MAX as u32) as i32)
            .min(self.max);
        self.current - old
    }

    /// Set the current value, clamped into range.
    pub fn set_current(&mut self, value: i32) {
        self.current = value.clamp(0, self.max);
    }

    /// Raise the maximum, raising the current value by the same amount.
    pub fn increase_max(&mut self, amount: i32) {
        self.max = self.max.saturating_add(amount).max(0);
        self.current = self.current.saturating_add(amount).clamp(0, self.max);
    }

    pub fn is_down(&self) -> bool {
        self.current == 0
    }
}

// ============================================================================
// Classes
// ============================================================================

/// D&D character classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CharacterClass {
    Barbarian,
    Bard,
    Cleric,
    Druid,
    Fighter,
    Monk,
    Paladin,
    Ranger,
    Rogue,
    Sorcerer,
    Warlock,
    Wizard,
}

impl CharacterClass {
    pub fn name(&self) -> &'static str {
        match self {
            CharacterClass::Barbarian => "Barbarian",
            CharacterClass::Bard => "Bard",
            CharacterClass::Cleric => "Cleric",
            CharacterClass::Druid => "Druid",
            CharacterClass::Fighter => "Fighter",
            CharacterClass::Monk => "Monk",
            CharacterClass::Paladin => "Paladin",
            CharacterClass::Ranger => "Ranger",
            CharacterClass::Rogue => "Rogue",
            CharacterClass::Sorcerer => "Sorcerer",
            CharacterClass::Warlock => "Warlock",
            CharacterClass::Wizard => "Wizard",
        }
    }

    /// Get all character classes.
    pub fn all() -> &'static [CharacterClass] {
        &[
            CharacterClass::Barbarian,
            CharacterClass::Bard,
            CharacterClass::Cleric,
            CharacterClass::Druid,
            CharacterClass::Fighter,
            CharacterClass::Monk,
            CharacterClass::Paladin,
            CharacterClass::Ranger,
            CharacterClass::Rogue,
            CharacterClass::Sorcerer,
            CharacterClass::Warlock,
            CharacterClass::Wizard,
        ]
    }
}

impl fmt::Display for CharacterClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

// ============================================================================
// Character
// ============================================================================

/// A spell on a character's known or prepared list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnownSpell {
    pub name: String,
    /// Catalog id of the source spell.
    pub source_spell: String,
    /// 0 for cantrips.
    pub level: u8,
}

impl KnownSpell {
    pub fn new(name: impl Into<String>, source_spell: impl Into<String>, level: u8) -> Self {
        Self {
            name: name.into(),
            source_spell: source_spell.into(),
            level,
        }
    }

    pub fn is_cantrip(&self) -> bool {
        self.level == 0
    }
}

/// Why a catalog spell could not be added to a character.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LearnSpellError {
    #[error("Unknown spell: {0}")]
    UnknownSpell(String),
    #[error("{spell} is not on the {class} spell list")]
    NotOnClassList { spell: String, class: CharacterClass },
    #[error("{0} is already known")]
    AlreadyKnown(String),
    #[error(transparent)]
    Capacity(#[from] CapacityExceeded),
}

/// Summary of a level-up, for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelUp {
    pub new_level: u8,
    pub hit_points: HitPointIncrease,
    pub ability_scores: AbilityScores,
}

/// A player character snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Character {
    pub id: CharacterId,
    pub name: String,
    pub class: CharacterClass,
    pub level: u8,
    pub ability_scores: AbilityScores,
    pub hit_points: HitPoints,
    pub spell_slots: SpellSlotTable,
    pub spells: Vec<KnownSpell>,
    pub inventory: Vec<InventoryItem>,
    pub saving_throw_proficiencies: Vec<Ability>,
    pub weapon_proficiencies: Vec<String>,
    #[serde(default)]
    pub armor_proficiencies: Vec<String>,
    pub conditions: Vec<ActiveCondition>,
}

impl Character {
    /// A fresh level 1 character with the standard class defaults applied.
    pub fn new(
        id: CharacterId,
        name: impl Into<String>,
        class: CharacterClass,
        ability_scores: AbilityScores,
    ) -> Self {
        Self::from_catalog(id, name, class, ability_scores, &StandardCatalog)
    }

    /// A fresh level 1 character whose class defaults come from `catalog`.
    pub fn from_catalog<C: ReferenceCatalog + ?Sized>(
        id: CharacterId,
        name: impl Into<String>,
        class: CharacterClass,
        ability_scores: AbilityScores,
        catalog: &C,
    ) -> Self {
        let data = catalog.class_rules(class);
        let con_mod = ability_scores.modifier(Ability::Constitution) as i32;
        let max_hp = (data.hit_die.sides() as i32 + con_mod).max(1);
        Self {
            id,
            name: name.into(),
            class,
            level: 1,
            ability_scores,
            hit_points: HitPoints::new(max_hp),
            spell_slots: SpellSlotTable::for_level(data.caster, 1),
            spells: Vec::new(),
            inventory: Vec::new(),
            saving_throw_proficiencies: data.saving_throws.to_vec(),
            weapon_proficiencies: data
                .weapon_proficiencies
                .iter()
                .map(|p| p.to_string())
                .collect(),
            armor_proficiencies: data
                .armor_proficiencies
                .iter()
                .map(|p| p.to_string())
                .collect(),
            conditions: Vec::new(),
        }
    }

    pub fn proficiency_bonus(&self) -> i8 {
        progression::proficiency_bonus(self.level)
    }

    pub fn modifier(&self, ability: Ability) -> i8 {
        self.ability_scores.modifier(ability)
    }

    pub fn saving_throw_bonus(&self, ability: Ability) -> i32 {
        combat::saving_throw_bonus(
            self.modifier(ability),
            self.saving_throw_proficiencies.contains(&ability),
            self.proficiency_bonus(),
        )
    }

    /// Modifier of the class's spellcasting ability, if the class casts.
    pub fn spellcasting_modifier(&self) -> Option<i8> {
        self.class
            .data()
            .spellcasting_ability
            .map(|ability| self.modifier(ability))
    }

    pub fn spell_save_dc(&self) -> Option<i32> {
        self.spellcasting_modifier()
            .map(|m| combat::spell_save_dc(self.proficiency_bonus(), m))
    }

    pub fn spell_attack_bonus(&self) -> Option<i32> {
        self.spellcasting_modifier()
            .map(|m| combat::spell_attack_bonus(self.proficiency_bonus(), m))
    }

    pub fn cantrip_count(&self) -> u32 {
        self.spells.iter().filter(|s| s.is_cantrip()).count() as u32
    }

    pub fn leveled_spell_count(&self) -> u32 {
        self.spells.iter().filter(|s| !s.is_cantrip()).count() as u32
    }

    /// Check whether one more spell of `spell_level` fits under the class caps.
    pub fn can_add_spell(&self, spell_level: u8) -> Result<(), CapacityExceeded> {
        progression::check_spell_capacity(
            self.class,
            self.level,
            self.spellcasting_modifier().unwrap_or(0),
            self.cantrip_count(),
            self.leveled_spell_count(),
            spell_level,
        )
    }

    pub fn add_spell(&mut self, spell: KnownSpell) -> Result<(), CapacityExceeded> {
        self.can_add_spell(spell.level)?;
        self.spells.push(spell);
        Ok(())
    }

    /// Look `source_spell` up in the catalog and add it with the catalog's
    /// level, provided the class can cast it and a cap has room.
    pub fn learn_spell<C: ReferenceCatalog + ?Sized>(
        &mut self,
        source_spell: &str,
        catalog: &C,
    ) -> Result<KnownSpell, LearnSpellError> {
        let spell = catalog
            .spell(source_spell)
            .ok_or_else(|| LearnSpellError::UnknownSpell(source_spell.to_string()))?;
        if !spell.classes.contains(&self.class) {
            return Err(LearnSpellError::NotOnClassList {
                spell: spell.name.clone(),
                class: self.class,
            });
        }
        if self.spells.iter().any(|s| s.source_spell == spell.id) {
            return Err(LearnSpellError::AlreadyKnown(spell.name.clone()));
        }
        self.can_add_spell(spell.level)?;

        debug!(character = %self.name, spell = %spell.name, level = spell.level, "learned spell");
        let known = KnownSpell::new(spell.name.clone(), spell.id.clone(), spell.level);
        self.spells.push(known.clone());
        Ok(known)
    }

    /// Attune to an inventory item. Returns `Ok(false)` if the item is unknown
    /// or already attuned.
    pub fn attune(&mut self, item_id: ItemId, limit: u32) -> Result<bool, CapacityExceeded> {
        let attuned = self.inventory.iter().filter(|i| i.attuned).count() as u32;
        let Some(item) = self.inventory.iter_mut().find(|i| i.id == item_id) else {
            return Ok(false);
        };
        if item.attuned {
            return Ok(false);
        }
        if attuned >= limit {
            return Err(CapacityExceeded {
                kind: CapacityKind::Attunement,
                current: attuned,
                limit,
            });
        }
        item.attuned = true;
        Ok(true)
    }

    /// Resolve stats for the currently equipped weapon.
    pub fn equipped_weapon_stats<C: ReferenceCatalog + ?Sized>(
        &self,
        catalog: &C,
    ) -> Option<EquippedWeaponStats> {
        let item = weapons::equipped_weapon(&self.inventory)?;
        weapons::resolve_weapon_stats(
            item,
            catalog,
            &self.ability_scores,
            self.proficiency_bonus(),
            &self.weapon_proficiencies,
        )
    }

    /// Advance one level: grow hit points, apply an optional ability score
    /// improvement, and rebuild the spell slot table.
    ///
    /// Returns `None` and changes nothing once the character is at
    /// [`progression::MAX_LEVEL`].
    pub fn level_up<S: RollSource>(
        &mut self,
        method: HitPointGain,
        improvement: Option<AbilityScoreImprovement>,
        rng: &mut S,
    ) -> Option<LevelUp> {
        if self.level >= progression::MAX_LEVEL {
            warn!(character = %self.name, level = self.level, "already at maximum level");
            return None;
        }
        let data = self.class.data();
        if let Some(asi) = improvement {
            self.ability_scores = asi.apply(&self.ability_scores);
        }
        let con_mod = self.modifier(Ability::Constitution);
        let hit_points = progression::hit_point_gain(data.hit_die, con_mod, method, rng);

        self.level += 1;
        self.hit_points.increase_max(hit_points.gain);
        self.spell_slots.rebuild(data.caster, self.level);

        info!(
            character = %self.name,
            level = self.level,
            gain = hit_points.gain,
            "character levelled up"
        );

        Some(LevelUp {
            new_level: self.level,
            hit_points,
            ability_scores: self.ability_scores,
        })
    }
}
