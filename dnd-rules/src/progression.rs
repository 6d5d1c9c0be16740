//! Level-driven rules: proficiency bonus, spell slot tables, spell capacity,
//! hit-point gain, and ability score improvements.

use crate::character::{Ability, AbilityScores, CharacterClass};
use crate::dice::{DieType, RollSource};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

pub const MAX_LEVEL: u8 = 20;

/// Ability scores never rise above this through improvements.
pub const ABILITY_SCORE_CAP: u8 = 20;

/// Proficiency bonus for a character level: +2 at 1, +3 at 5, ... +6 at 17.
pub fn proficiency_bonus(level: u8) -> i8 {
    ((level.clamp(1, MAX_LEVEL) - 1) / 4 + 2) as i8
}

// ============================================================================
// Caster shapes
// ============================================================================

/// How a class gains spell slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CasterShape {
    None,
    Full,
    Half,
    /// A single tier of slots that recharge on a short rest.
    Pact,
}

/// Which cap limits a class's leveled spells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpellcastingMode {
    None,
    /// Prepares `level + mod` (full) or `level / 2 + mod` (half) spells.
    Prepared(PreparationRate),
    /// Learns a fixed number of spells per level, indexed by `level - 1`.
    Known(&'static [u32; 20]),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreparationRate {
    Full,
    Half,
}

impl SpellcastingMode {
    /// Leveled-spell cap. Cantrips are never counted here.
    pub fn leveled_cap(&self, level: u8, ability_modifier: i8) -> u32 {
        let level = level.clamp(1, MAX_LEVEL);
        match self {
            SpellcastingMode::None => 0,
            SpellcastingMode::Prepared(PreparationRate::Full) => {
                (level as i32 + ability_modifier as i32).max(1) as u32
            }
            SpellcastingMode::Prepared(PreparationRate::Half) => {
                (level as i32 / 2 + ability_modifier as i32).max(1) as u32
            }
            SpellcastingMode::Known(table) => table[level as usize - 1],
        }
    }

    fn capacity_kind(&self) -> CapacityKind {
        match self {
            SpellcastingMode::Prepared(_) => CapacityKind::PreparedSpells,
            SpellcastingMode::None | SpellcastingMode::Known(_) => CapacityKind::KnownSpells,
        }
    }
}

pub(crate) static BARD_SPELLS_KNOWN: [u32; 20] = [
    4, 5, 6, 7, 8, 9, 10, 11, 12, 14, 15, 15, 16, 18, 19, 19, 20, 22, 22, 22,
];
pub(crate) static RANGER_SPELLS_KNOWN: [u32; 20] = [
    0, 2, 3, 3, 4, 4, 5, 5, 6, 6, 7, 7, 8, 8, 9, 9, 10, 10, 11, 11,
];
pub(crate) static SORCERER_SPELLS_KNOWN: [u32; 20] = [
    2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 12, 13, 13, 14, 14, 15, 15, 15, 15,
];
pub(crate) static WARLOCK_SPELLS_KNOWN: [u32; 20] = [
    2, 3, 4, 5, 6, 7, 8, 9, 10, 10, 11, 11, 12, 12, 13, 13, 14, 14, 15, 15,
];

// ============================================================================
// Spell slot tables
// ============================================================================

#[rustfmt::skip]
const FULL_CASTER_SLOTS: [[u8; 9]; 20] = [
    [2, 0, 0, 0, 0, 0, 0, 0, 0],
    [3, 0, 0, 0, 0, 0, 0, 0, 0],
    [4, 2, 0, 0, 0, 0, 0, 0, 0],
    [4, 3, 0, 0, 0, 0, 0, 0, 0],
    [4, 3, 2, 0, 0, 0, 0, 0, 0],
    [4, 3, 3, 0, 0, 0, 0, 0, 0],
    [4, 3, 3, 1, 0, 0, 0, 0, 0],
    [4, 3, 3, 2, 0, 0, 0, 0, 0],
    [4, 3, 3, 3, 1, 0, 0, 0, 0],
    [4, 3, 3, 3, 2, 0, 0, 0, 0],
    [4, 3, 3, 3, 2, 1, 0, 0, 0],
    [4, 3, 3, 3, 2, 1, 0, 0, 0],
    [4, 3, 3, 3, 2, 1, 1, 0, 0],
    [4, 3, 3, 3, 2, 1, 1, 0, 0],
    [4, 3, 3, 3, 2, 1, 1, 1, 0],
    [4, 3, 3, 3, 2, 1, 1, 1, 0],
    [4, 3, 3, 3, 2, 1, 1, 1, 1],
    [4, 3, 3, 3, 3, 1, 1, 1, 1],
    [4, 3, 3, 3, 3, 2, 1, 1, 1],
    [4, 3, 3, 3, 3, 2, 2, 1, 1],
];

#[rustfmt::skip]
const HALF_CASTER_SLOTS: [[u8; 9]; 20] = [
    [0, 0, 0, 0, 0, 0, 0, 0, 0],
    [2, 0, 0, 0, 0, 0, 0, 0, 0],
    [3, 0, 0, 0, 0, 0, 0, 0, 0],
    [3, 0, 0, 0, 0, 0, 0, 0, 0],
    [4, 2, 0, 0, 0, 0, 0, 0, 0],
    [4, 2, 0, 0, 0, 0, 0, 0, 0],
    [4, 3, 0, 0, 0, 0, 0, 0, 0],
    [4, 3, 0, 0, 0, 0, 0, 0, 0],
    [4, 3, 2, 0, 0, 0, 0, 0, 0],
    [4, 3, 2, 0, 0, 0, 0, 0, 0],
    [4, 3, 3, 0, 0, 0, 0, 0, 0],
    [4, 3, 3, 0, 0, 0, 0, 0, 0],
    [4, 3, 3, 1, 0, 0, 0, 0, 0],
    [4, 3, 3, 1, 0, 0, 0, 0, 0],
    [4, 3, 3, 2, 0, 0, 0, 0, 0],
    [4, 3, 3, 2, 0, 0, 0, 0, 0],
    [4, 3, 3, 3, 1, 0, 0, 0, 0],
    [4, 3, 3, 3, 1, 0, 0, 0, 0],
    [4, 3, 3, 3, 2, 0, 0, 0, 0],
    [4, 3, 3, 3, 2, 0, 0, 0, 0],
];

/// Pact magic: (slot level, slot count) per character level.
#[rustfmt::skip]
const PACT_SLOTS: [(u8, u8); 20] = [
    (1, 1), (1, 2), (2, 2), (2, 2), (3, 2),
    (3, 2), (4, 2), (4, 2), (5, 2), (5, 2),
    (5, 3), (5, 3), (5, 3), (5, 3), (5, 3),
    (5, 3), (5, 4), (5, 4), (5, 4), (5, 4),
];

/// Maximum slots per tier for a caster shape at a level.
pub fn slot_maximums(shape: CasterShape, level: u8) -> [u8; 9] {
    let index = level.clamp(1, MAX_LEVEL) as usize - 1;
    match shape {
        CasterShape::None => [0; 9],
        CasterShape::Full => FULL_CASTER_SLOTS[index],
        CasterShape::Half => HALF_CASTER_SLOTS[index],
        CasterShape::Pact => {
            let (tier, count) = PACT_SLOTS[index];
            let mut slots = [0; 9];
            slots[tier as usize - 1] = count;
            slots
        }
    }
}

/// One tier of spell slots. `current <= max` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "SlotTierRecord")]
pub struct SlotTier {
    current: u8,
    max: u8,
}

#[derive(Deserialize)]
struct SlotTierRecord {
    current: u8,
    max: u8,
}

impl From<SlotTierRecord> for SlotTier {
    fn from(record: SlotTierRecord) -> Self {
        SlotTier::new(record.current, record.max)
    }
}

impl SlotTier {
    pub fn new(current: u8, max: u8) -> Self {
        Self {
            current: current.min(max),
            max,
        }
    }

    pub fn full(max: u8) -> Self {
        Self { current: max, max }
    }

    pub fn current(&self) -> u8 {
        self.current
    }

    pub fn max(&self) -> u8 {
        self.max
    }

    pub fn used(&self) -> u8 {
        self.max - self.current
    }
}

/// Errors from spending spell slots.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SlotError {
    #[error("Spell slot level must be 1-9, got {0}")]
    InvalidLevel(u8),
    #[error("No level {level} spell slots remaining")]
    NoSlotsRemaining { level: u8 },
}

/// Spell slots for levels 1-9.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SpellSlotTable {
    tiers: [SlotTier; 9],
}

impl SpellSlotTable {
    /// A fully rested table for a caster shape at a level.
    pub fn for_level(shape: CasterShape, level: u8) -> Self {
        Self {
            tiers: slot_maximums(shape, level).map(SlotTier::full),
        }
    }

    /// The tier for a slot level (1-9).
    pub fn tier(&self, level: u8) -> Option<SlotTier> {
        level
            .checked_sub(1)
            .and_then(|i| self.tiers.get(i as usize))
            .copied()
    }

    pub fn tiers(&self) -> &[SlotTier; 9] {
        &self.tiers
    }

    /// True when no tier has any slots at all.
    pub fn is_empty(&self) -> bool {
        self.tiers.iter().all(|t| t.max == 0)
    }

    /// Spend one slot of the given level.
    pub fn expend(&mut self, level: u8) -> Result<(), SlotError> {
        if !(1..=9).contains(&level) {
            return Err(SlotError::InvalidLevel(level));
        }
        let tier = &mut self.tiers[level as usize - 1];
        if tier.current == 0 {
            return Err(SlotError::NoSlotsRemaining { level });
        }
        tier.current -= 1;
        Ok(())
    }

    pub fn long_rest(&mut self) {
        for tier in &mut self.tiers {
            tier.current = tier.max;
        }
    }

    /// Only pact slots come back on a short rest.
    pub fn short_rest(&mut self, shape: CasterShape) {
        if shape == CasterShape::Pact {
            self.long_rest();
        }
    }

    /// Resize to a new level's maximums, keeping spent slots spent.
    pub fn rebuild(&mut self, shape: CasterShape, level: u8) {
        let maximums = slot_maximums(shape, level);
        for (tier, max) in self.tiers.iter_mut().zip(maximums) {
            let used = tier.used();
            *tier = SlotTier::new(max.saturating_sub(used), max);
        }
    }
}

// ============================================================================
// Spell capacity
// ============================================================================

/// The resource a capacity check failed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CapacityKind {
    Cantrips,
    KnownSpells,
    PreparedSpells,
    Attunement,
}

impl fmt::Display for CapacityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CapacityKind::Cantrips => "cantrips known",
            CapacityKind::KnownSpells => "spells known",
            CapacityKind::PreparedSpells => "spells prepared",
            CapacityKind::Attunement => "attuned items",
        };
        f.write_str(name)
    }
}

/// Adding a spell or item would exceed a resource cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("Cannot add more {kind}: {current} of {limit} already used")]
pub struct CapacityExceeded {
    pub kind: CapacityKind,
    pub current: u32,
    pub limit: u32,
}

/// Cantrips known for a class at a level.
pub fn cantrip_cap(class: CharacterClass, level: u8) -> u32 {
    let [first, fourth, tenth] = class.data().cantrips_known;
    match level {
        0..=3 => first,
        4..=9 => fourth,
        _ => tenth,
    }
}

/// Leveled spells a class may know or prepare at a level.
pub fn leveled_spell_cap(class: CharacterClass, level: u8, ability_modifier: i8) -> u32 {
    class.data().spellcasting.leveled_cap(level, ability_modifier)
}

/// Check whether one more spell of `spell_level` fits.
pub fn check_spell_capacity(
    class: CharacterClass,
    level: u8,
    ability_modifier: i8,
    cantrips: u32,
    leveled: u32,
    spell_level: u8,
) -> Result<(), CapacityExceeded> {
    let (kind, current, limit) = if spell_level == 0 {
        (CapacityKind::Cantrips, cantrips, cantrip_cap(class, level))
    } else {
        let mode = class.data().spellcasting;
        (
            mode.capacity_kind(),
            leveled,
            mode.leveled_cap(level, ability_modifier),
        )
    };
    if current >= limit {
        return Err(CapacityExceeded {
            kind,
            current,
            limit,
        });
    }
    Ok(())
}

// ============================================================================
// Hit points
// ============================================================================

/// How hit points are gained on level-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum HitPointGain {
    #[default]
    Average,
    Rolled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HitPointIncrease {
    pub method: HitPointGain,
    /// The hit die face, when rolled.
    pub die_roll: Option<u32>,
    /// Always at least 1.
    pub gain: i32,
}

pub fn hit_point_gain<S: RollSource>(
    hit_die: DieType,
    con_mod: i8,
    method: HitPointGain,
    rng: &mut S,
) -> HitPointIncrease {
    let (die_roll, base) = match method {
        HitPointGain::Average => (None, (hit_die.sides() / 2 + 1) as i32),
        HitPointGain::Rolled => {
            let roll = rng.roll_die(hit_die.sides());
            (Some(roll), roll as i32)
        }
    };
    HitPointIncrease {
        method,
        die_roll,
        gain: (base + con_mod as i32).max(1),
    }
}

// ============================================================================
// Ability score improvements
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AbilityScoreImprovement {
    /// +2 to one ability.
    Single(Ability),
    /// +1 to each of two abilities.
    Pair(Ability, Ability),
}

impl AbilityScoreImprovement {
    /// Apply the improvement. Each increase stops at the cap, and a score
    /// already above the cap is left alone.
    pub fn apply(&self, scores: &AbilityScores) -> AbilityScores {
        let mut improved = *scores;
        let mut raise = |ability: Ability, amount: u8| {
            let old = improved.get(ability);
            let new = old.saturating_add(amount).min(ABILITY_SCORE_CAP).max(old);
            improved.set(ability, new);
        };
        match *self {
            AbilityScoreImprovement::Single(ability) => raise(ability, 2),
            AbilityScoreImprovement::Pair(first, second) => {
                raise(first, 1);
                raise(second, 1);
            }
        }
        improved
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dice::FixedRolls;

    #[test]
    fn test_proficiency_breakpoints() {
        assert_eq!(proficiency_bonus(1), 2);
        assert_eq!(proficiency_bonus(4), 2);
        assert_eq!(proficiency_bonus(5), 3);
        assert_eq!(proficiency_bonus(9), 4);
        assert_eq!(proficiency_bonus(13), 5);
        assert_eq!(proficiency_bonus(17), 6);
        assert_eq!(proficiency_bonus(20), 6);
    }

    #[test]
    fn test_full_caster_level_1() {
        let slots = slot_maximums(CasterShape::Full, 1);
        assert_eq!(slots, [2, 0, 0, 0, 0, 0, 0, 0, 0]);
        assert_eq!(slots.iter().filter(|&&n| n > 0).count(), 1);
    }

    #[test]
    fn test_full_caster_reaches_ninth_at_17() {
        assert_eq!(slot_maximums(CasterShape::Full, 16)[8], 0);
        assert_eq!(slot_maximums(CasterShape::Full, 17)[8], 1);
    }

    #[test]
    fn test_half_caster_starts_at_2() {
        assert_eq!(slot_maximums(CasterShape::Half, 1), [0; 9]);
        assert_eq!(slot_maximums(CasterShape::Half, 2)[0], 2);
        assert_eq!(slot_maximums(CasterShape::Half, 20)[5], 0);
    }

    #[test]
    fn test_pact_slots() {
        assert_eq!(slot_maximums(CasterShape::Pact, 1), [1, 0, 0, 0, 0, 0, 0, 0, 0]);
        assert_eq!(slot_maximums(CasterShape::Pact, 5), [0, 0, 2, 0, 0, 0, 0, 0, 0]);
        assert_eq!(slot_maximums(CasterShape::Pact, 11)[4], 3);
        assert_eq!(slot_maximums(CasterShape::Pact, 17)[4], 4);
        for level in 1..=20 {
            let slots = slot_maximums(CasterShape::Pact, level);
            assert_eq!(slots.iter().filter(|&&n| n > 0).count(), 1);
        }
    }

    #[test]
    fn test_non_caster_all_zero() {
        for level in 1..=20 {
            assert!(SpellSlotTable::for_level(CasterShape::None, level).is_empty());
        }
    }

    #[test]
    fn test_expend_and_rest() {
        let mut table = SpellSlotTable::for_level(CasterShape::Full, 3);
        table.expend(1).unwrap();
        table.expend(2).unwrap();
        table.expend(2).unwrap();
        assert_eq!(table.expend(2), Err(SlotError::NoSlotsRemaining { level: 2 }));
        assert_eq!(table.expend(0), Err(SlotError::InvalidLevel(0)));
        assert_eq!(table.tier(1).map(|t| t.current()), Some(3));

        table.short_rest(CasterShape::Full);
        assert_eq!(table.tier(2).map(|t| t.current()), Some(0));

        table.long_rest();
        assert_eq!(table.tier(2).map(|t| t.current()), Some(2));
    }

    #[test]
    fn test_pact_short_rest() {
        let mut table = SpellSlotTable::for_level(CasterShape::Pact, 3);
        table.expend(2).unwrap();
        table.expend(2).unwrap();
        table.short_rest(CasterShape::Pact);
        assert_eq!(table.tier(2).map(|t| t.current()), Some(2));
    }

    #[test]
    fn test_rebuild_keeps_used_slots() {
        let mut table = SpellSlotTable::for_level(CasterShape::Full, 2);
        table.expend(1).unwrap();
        table.rebuild(CasterShape::Full, 3);
        assert_eq!(table.tier(1), Some(SlotTier::new(3, 4)));
        assert_eq!(table.tier(2), Some(SlotTier::new(2, 2)));
    }

    #[test]
    fn test_deserialize_clamps_current() {
        let tier: SlotTier = serde_json::from_str(r#"{"current":5,"max":2}"#).unwrap();
        assert_eq!(tier.current(), 2);
    }

    #[test]
    fn test_prepared_caps() {
        assert_eq!(leveled_spell_cap(CharacterClass::Cleric, 5, 3), 8);
        assert_eq!(leveled_spell_cap(CharacterClass::Cleric, 1, -2), 1);
        assert_eq!(leveled_spell_cap(CharacterClass::Paladin, 5, 2), 4);
        assert_eq!(leveled_spell_cap(CharacterClass::Paladin, 1, -1), 1);
    }

    #[test]
    fn test_known_caps() {
        assert_eq!(leveled_spell_cap(CharacterClass::Sorcerer, 1, 5), 2);
        assert_eq!(leveled_spell_cap(CharacterClass::Bard, 10, 0), 14);
        assert_eq!(leveled_spell_cap(CharacterClass::Warlock, 20, 0), 15);
        assert_eq!(leveled_spell_cap(CharacterClass::Fighter, 20, 5), 0);
    }

    #[test]
    fn test_capacity_reports_usage() {
        let err = check_spell_capacity(CharacterClass::Sorcerer, 1, 3, 0, 2, 1).unwrap_err();
        assert_eq!(
            err,
            CapacityExceeded {
                kind: CapacityKind::KnownSpells,
                current: 2,
                limit: 2
            }
        );
        assert_eq!(err.to_string(), "Cannot add more spells known: 2 of 2 already used");

        // Cantrips never count against the leveled cap
        assert!(check_spell_capacity(CharacterClass::Sorcerer, 1, 3, 0, 2, 0).is_ok());
        let err = check_spell_capacity(CharacterClass::Sorcerer, 1, 3, 4, 0, 0).unwrap_err();
        assert_eq!(err.kind, CapacityKind::Cantrips);
    }

    #[test]
    fn test_cantrip_cap_breakpoints() {
        assert_eq!(cantrip_cap(CharacterClass::Wizard, 1), 3);
        assert_eq!(cantrip_cap(CharacterClass::Wizard, 4), 4);
        assert_eq!(cantrip_cap(CharacterClass::Wizard, 10), 5);
        assert_eq!(cantrip_cap(CharacterClass::Barbarian, 10), 0);
    }

    #[test]
    fn test_hit_point_gain_average() {
        let mut rng = FixedRolls::default();
        let gain = hit_point_gain(DieType::D10, 2, HitPointGain::Average, &mut rng);
        assert_eq!(gain.gain, 8);
        assert_eq!(gain.die_roll, None);
    }

    #[test]
    fn test_hit_point_gain_minimum_one() {
        let mut rng = FixedRolls::new([1]);
        let gain = hit_point_gain(DieType::D6, -3, HitPointGain::Rolled, &mut rng);
        assert_eq!(gain.die_roll, Some(1));
        assert_eq!(gain.gain, 1);

        let gain = hit_point_gain(DieType::D6, -5, HitPointGain::Average, &mut rng);
        assert_eq!(gain.gain, 1);
    }

    #[test]
    fn test_ability_score_improvement_clamps() {
        let scores = AbilityScores::new(19, 20, 14, 10, 10, 22);
        let single = AbilityScoreImprovement::Single(Ability::Strength).apply(&scores);
        assert_eq!(single.strength, 20);

        let pair = AbilityScoreImprovement::Pair(Ability::Dexterity, Ability::Constitution)
            .apply(&scores);
        assert_eq!(pair.dexterity, 20);
        assert_eq!(pair.constitution, 15);

        let above = AbilityScoreImprovement::Single(Ability::Charisma).apply(&scores);
        assert_eq!(above.charisma, 22);
    }
}
