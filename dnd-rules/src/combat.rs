//! Combat math: attacks, damage, saving throws and spell numbers.
//!
//! Everything here is a pure function of its inputs plus the dice drawn from
//! the supplied [`RollSource`].

use crate::dice::{
    roll_d20_with, saturate, sum_faces, Advantage, D20Roll, DiceExpression, RollSource,
};
use crate::weapons::EquippedWeaponStats;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// Common D&D damage types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DamageType {
    Slashing,
    Piercing,
    Bludgeoning,
    Fire,
    Cold,
    Lightning,
    Thunder,
    Acid,
    Poison,
    Necrotic,
    Radiant,
    Force,
    Psychic,
}

impl DamageType {
    pub fn name(&self) -> &'static str {
        match self {
            DamageType::Slashing => "slashing",
            DamageType::Piercing => "piercing",
            DamageType::Bludgeoning => "bludgeoning",
            DamageType::Fire => "fire",
            DamageType::Cold => "cold",
            DamageType::Lightning => "lightning",
            DamageType::Thunder => "thunder",
            DamageType::Acid => "acid",
            DamageType::Poison => "poison",
            DamageType::Necrotic => "necrotic",
            DamageType::Radiant => "radiant",
            DamageType::Force => "force",
            DamageType::Psychic => "psychic",
        }
    }
}

impl fmt::Display for DamageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// Attacks
// ============================================================================

/// A d20 attack roll and its total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttackRoll {
    pub d20: D20Roll,
    pub attack_bonus: i32,
    pub total: i32,
}

impl AttackRoll {
    /// Natural 20.
    pub fn is_critical(&self) -> bool {
        self.d20.is_natural_20()
    }

    /// Natural 1.
    pub fn is_fumble(&self) -> bool {
        self.d20.is_natural_1()
    }
}

pub fn roll_attack<S: RollSource>(rng: &mut S, attack_bonus: i32, mode: Advantage) -> AttackRoll {
    let d20 = roll_d20_with(rng, mode);
    let total = d20.natural as i32 + attack_bonus;
    AttackRoll {
        d20,
        attack_bonus,
        total,
    }
}

/// A critical always hits and a fumble always misses. Otherwise the total must
/// meet the target's armor class.
pub fn check_hit(attack: &AttackRoll, target_ac: i32) -> bool {
    if attack.is_critical() {
        return true;
    }
    if attack.is_fumble() {
        return false;
    }
    attack.total >= target_ac
}

// ============================================================================
// Damage
// ============================================================================

/// Result of a damage roll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DamageRoll {
    pub expression: DiceExpression,
    pub rolls: Vec<u32>,
    /// The extra set of dice rolled on a critical hit. Empty otherwise.
    pub critical_rolls: Vec<u32>,
    /// Never negative.
    pub total: i32,
}

impl DamageRoll {
    pub fn is_critical(&self) -> bool {
        !self.critical_rolls.is_empty()
    }

    pub fn amount(&self) -> u32 {
        self.total.max(0) as u32
    }
}

/// Roll damage. A critical rolls a second independent set of dice; the flat
/// bonus is added once.
pub fn roll_damage<S: RollSource>(
    rng: &mut S,
    expression: &DiceExpression,
    critical: bool,
) -> DamageRoll {
    let rolls = expression.roll_dice(rng);
    let critical_rolls = if critical {
        expression.roll_dice(rng)
    } else {
        Vec::new()
    };
    let dice = sum_faces(rolls.iter().chain(critical_rolls.iter()));
    let total = saturate(dice + i64::from(expression.bonus)).max(0);
    debug!(%expression, critical, ?rolls, ?critical_rolls, total, "rolled damage");
    DamageRoll {
        expression: *expression,
        rolls,
        critical_rolls,
        total,
    }
}

/// An attack with an equipped weapon: the attack roll and, on a hit, damage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeaponAttack {
    pub attack: AttackRoll,
    pub target_ac: i32,
    pub hit: bool,
    pub damage: Option<DamageRoll>,
}

pub fn attack_with_weapon<S: RollSource>(
    rng: &mut S,
    weapon: &EquippedWeaponStats,
    target_ac: i32,
    mode: Advantage,
) -> WeaponAttack {
    let attack = roll_attack(rng, weapon.attack_bonus, mode);
    let hit = check_hit(&attack, target_ac);
    let damage =
        hit.then(|| roll_damage(rng, &weapon.damage_expression(), attack.is_critical()));
    WeaponAttack {
        attack,
        target_ac,
        hit,
        damage,
    }
}

// ============================================================================
// Saving throws
// ============================================================================

pub fn saving_throw_bonus(ability_modifier: i8, proficient: bool, proficiency_bonus: i8) -> i32 {
    let proficiency = if proficient { proficiency_bonus } else { 0 };
    ability_modifier as i32 + proficiency as i32
}

/// Ties go to the defender.
pub fn saving_throw_succeeds(total: i32, dc: u32) -> bool {
    total >= dc as i32
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavingThrow {
    pub d20: D20Roll,
    pub bonus: i32,
    pub total: i32,
    pub dc: u32,
    pub success: bool,
}

pub fn roll_saving_throw<S: RollSource>(
    rng: &mut S,
    bonus: i32,
    dc: u32,
    mode: Advantage,
) -> SavingThrow {
    let d20 = roll_d20_with(rng, mode);
    let total = d20.natural as i32 + bonus;
    let success = saving_throw_succeeds(total, dc);
    debug!(natural = d20.natural, bonus, dc, success, "saving throw");
    SavingThrow {
        d20,
        bonus,
        total,
        dc,
        success,
    }
}

// ============================================================================
// Spellcasting numbers
// ============================================================================

pub fn spell_save_dc(proficiency_bonus: i8, spellcasting_modifier: i8) -> i32 {
    8 + proficiency_bonus as i32 + spellcasting_modifier as i32
}

pub fn spell_attack_bonus(proficiency_bonus: i8, spellcasting_modifier: i8) -> i32 {
    proficiency_bonus as i32 + spellcasting_modifier as i32
}

/// DC to keep concentration after taking `damage`: half the damage, at least 10.
pub fn concentration_dc(damage: u32) -> u32 {
    (damage / 2).max(10)
}
