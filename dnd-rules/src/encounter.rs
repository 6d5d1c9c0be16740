//! Combatants, conditions and the encounter turn-order state machine.

use crate::catalog::ReferenceCatalog;
use crate::character::{Ability, AbilityScores, Character, HitPoints};
use crate::combat;
use crate::concentration::{Concentration, ConcentrationSave};
use crate::dice::{roll_d20_with, Advantage, RollSource};
use crate::ids::{CharacterId, CombatantId, ConditionId, IdSource};
use crate::weapons::EquippedWeaponStats;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::fmt;
use std::mem;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncounterError {
    #[error("No combatant with id {0} in this encounter")]
    UnknownCombatant(CombatantId),
}

// ============================================================================
// Conditions
// ============================================================================

/// D&D 5e conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConditionKind {
    Blinded,
    Charmed,
    Deafened,
    Frightened,
    Grappled,
    Incapacitated,
    Invisible,
    Paralyzed,
    Petrified,
    Poisoned,
    Prone,
    Restrained,
    Stunned,
    Unconscious,
    Exhaustion(u8),
}

impl ConditionKind {
    pub fn name(&self) -> &'static str {
        match self {
            ConditionKind::Blinded => "Blinded",
            ConditionKind::Charmed => "Charmed",
            ConditionKind::Deafened => "Deafened",
            ConditionKind::Frightened => "Frightened",
            ConditionKind::Grappled => "Grappled",
            ConditionKind::Incapacitated => "Incapacitated",
            ConditionKind::Invisible => "Invisible",
            ConditionKind::Paralyzed => "Paralyzed",
            ConditionKind::Petrified => "Petrified",
            ConditionKind::Poisoned => "Poisoned",
            ConditionKind::Prone => "Prone",
            ConditionKind::Restrained => "Restrained",
            ConditionKind::Stunned => "Stunned",
            ConditionKind::Unconscious => "Unconscious",
            ConditionKind::Exhaustion(_) => "Exhaustion",
        }
    }

    pub fn is_incapacitating(&self) -> bool {
        matches!(
            self,
            ConditionKind::Incapacitated
                | ConditionKind::Paralyzed
                | ConditionKind::Petrified
                | ConditionKind::Stunned
                | ConditionKind::Unconscious
        )
    }

    /// Same condition, ignoring exhaustion level.
    pub fn same_kind(&self, other: &ConditionKind) -> bool {
        mem::discriminant(self) == mem::discriminant(other)
    }
}

impl fmt::Display for ConditionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConditionKind::Exhaustion(level) => write!(f, "Exhaustion ({level})"),
            _ => write!(f, "{}", self.name()),
        }
    }
}

/// Remaining duration of a condition. Stored as an integer where `-1` means
/// indefinite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "i64", into = "i64")]
pub enum ConditionDuration {
    Rounds(u32),
    Indefinite,
}

impl From<i64> for ConditionDuration {
    fn from(value: i64) -> Self {
        if value < 0 {
            ConditionDuration::Indefinite
        } else {
            ConditionDuration::Rounds(value.min(u32::MAX as i64) as u32)
        }
    }
}

impl From<ConditionDuration> for i64 {
    fn from(duration: ConditionDuration) -> Self {
        match duration {
            ConditionDuration::Rounds(n) => n as i64,
            ConditionDuration::Indefinite => -1,
        }
    }
}

impl ConditionDuration {
    /// Count down one round. Returns true when the duration reaches zero.
    fn tick(&mut self) -> bool {
        match self {
            ConditionDuration::Rounds(n) => {
                *n = n.saturating_sub(1);
                *n == 0
            }
            ConditionDuration::Indefinite => false,
        }
    }
}

/// A condition attached to a creature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveCondition {
    pub id: ConditionId,
    pub kind: ConditionKind,
    pub duration: ConditionDuration,
    pub source: Option<String>,
}

impl ActiveCondition {
    pub fn new(id: ConditionId, kind: ConditionKind, duration: ConditionDuration) -> Self {
        Self {
            id,
            kind,
            duration,
            source: None,
        }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

// ============================================================================
// Combatants
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CombatantKind {
    Player,
    Ally,
    Enemy,
}

/// What a combatant needs to roll saves from its own numbers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollProfile {
    pub ability_scores: AbilityScores,
    pub proficiency_bonus: i8,
    pub saving_throws: Vec<Ability>,
}

impl RollProfile {
    pub fn saving_throw_bonus(&self, ability: Ability) -> i32 {
        combat::saving_throw_bonus(
            self.ability_scores.modifier(ability),
            self.saving_throws.contains(&ability),
            self.proficiency_bonus,
        )
    }
}

/// An encounter participant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Combatant {
    pub id: CombatantId,
    pub name: String,
    pub kind: CombatantKind,
    pub hit_points: HitPoints,
    pub armor_class: i32,
    pub initiative: i32,
    pub initiative_bonus: i32,
    pub roll_profile: Option<RollProfile>,
    pub weapon: Option<EquippedWeaponStats>,
    pub conditions: Vec<ActiveCondition>,
    pub concentration: Concentration,
    /// The character this combatant was built from, if any.
    pub character_id: Option<CharacterId>,
}

impl Combatant {
    pub fn new(
        id: CombatantId,
        name: impl Into<String>,
        kind: CombatantKind,
        max_hp: i32,
        armor_class: i32,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            kind,
            hit_points: HitPoints::new(max_hp),
            armor_class,
            initiative: 0,
            initiative_bonus: 0,
            roll_profile: None,
            weapon: None,
            conditions: Vec::new(),
            concentration: Concentration::Idle,
            character_id: None,
        }
    }

    pub fn with_initiative_bonus(mut self, bonus: i32) -> Self {
        self.initiative_bonus = bonus;
        self
    }

    pub fn with_roll_profile(mut self, profile: RollProfile) -> Self {
        self.roll_profile = Some(profile);
        self
    }

    pub fn with_weapon(mut self, weapon: EquippedWeaponStats) -> Self {
        self.weapon = Some(weapon);
        self
    }

    /// Build a player combatant from a character snapshot, resolving its
    /// equipped weapon against `catalog`.
    pub fn from_character<C: ReferenceCatalog + ?Sized>(
        id: CombatantId,
        character: &Character,
        armor_class: i32,
        catalog: &C,
    ) -> Self {
        Self {
            id,
            name: character.name.clone(),
            kind: CombatantKind::Player,
            hit_points: character.hit_points,
            armor_class,
            initiative: 0,
            initiative_bonus: character.modifier(Ability::Dexterity) as i32,
            roll_profile: Some(RollProfile {
                ability_scores: character.ability_scores,
                proficiency_bonus: character.proficiency_bonus(),
                saving_throws: character.saving_throw_proficiencies.clone(),
            }),
            weapon: character.equipped_weapon_stats(catalog),
            conditions: character.conditions.clone(),
            concentration: Concentration::Idle,
            character_id: Some(character.id),
        }
    }

    /// Weapon stats to attack with, falling back to an unarmed strike.
    pub fn attack_profile(&self) -> EquippedWeaponStats {
        self.weapon.clone().unwrap_or_else(|| {
            EquippedWeaponStats::unarmed(
                self.roll_profile.as_ref().map(|p| &p.ability_scores),
                self.roll_profile.as_ref().map_or(0, |p| p.proficiency_bonus),
            )
        })
    }

    /// Apply damage. Returns the DC of the concentration check it triggers.
    pub fn take_damage(&mut self, amount: u32) -> Option<u32> {
        self.hit_points.take_damage(amount);
        self.concentration.take_damage(amount)
    }

    /// Apply healing, returning the new current hit points.
    pub fn heal(&mut self, amount: u32) -> i32 {
        self.hit_points.heal(amount);
        self.hit_points.current()
    }

    pub fn is_down(&self) -> bool {
        self.hit_points.is_down()
    }

    pub fn add_condition(
        &mut self,
        ids: &mut impl IdSource,
        kind: ConditionKind,
        duration: ConditionDuration,
    ) -> ConditionId {
        let condition = ActiveCondition::new(ConditionId::generate(ids), kind, duration);
        let id = condition.id;
        self.conditions.push(condition);
        id
    }

    pub fn remove_condition(&mut self, id: ConditionId) -> Option<ActiveCondition> {
        let index = self.conditions.iter().position(|c| c.id == id)?;
        Some(self.conditions.remove(index))
    }

    pub fn has_condition(&self, kind: ConditionKind) -> bool {
        self.conditions.iter().any(|c| c.kind.same_kind(&kind))
    }

    pub fn saving_throw_bonus(&self, ability: Ability) -> i32 {
        self.roll_profile
            .as_ref()
            .map_or(0, |p| p.saving_throw_bonus(ability))
    }

    pub fn concentration_save(&self) -> ConcentrationSave {
        self.roll_profile
            .as_ref()
            .map(|p| ConcentrationSave {
                constitution_modifier: p.ability_scores.modifier(Ability::Constitution),
                proficiency_bonus: p.proficiency_bonus,
                proficient: p.saving_throws.contains(&Ability::Constitution),
            })
            .unwrap_or_default()
    }

    /// Count every finite condition down one round, removing and returning
    /// those that reach zero.
    pub fn tick_conditions(&mut self) -> Vec<ActiveCondition> {
        let (expired, kept) = mem::take(&mut self.conditions)
            .into_iter()
            .map(|mut c| (c.duration.tick(), c))
            .partition::<Vec<_>, _>(|(expired, _)| *expired);
        self.conditions = kept.into_iter().map(|(_, c)| c).collect();
        expired.into_iter().map(|(_, c)| c).collect()
    }
}

// ============================================================================
// Encounter
// ============================================================================

/// How initiative ties are ordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InitiativeTieBreak {
    /// Higher initiative bonus first, then insertion order.
    #[default]
    HigherBonus,
    /// Insertion order only.
    InsertionOrder,
}

/// One combatant's initiative roll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitiativeRoll {
    pub combatant_id: CombatantId,
    pub natural: u32,
    pub total: i32,
}

/// Result of advancing the turn pointer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnAdvance {
    pub round: u32,
    pub turn_index: usize,
    pub combatant_id: Option<CombatantId>,
    pub new_round: bool,
    /// Conditions that ran out at the round boundary, with their owner.
    pub expired: Vec<(CombatantId, ActiveCondition)>,
}

/// Ordered combatants, a turn pointer and a round counter.
///
/// The turn index is always valid for a non-empty list and 0 for an empty one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "EncounterRecord")]
pub struct Encounter {
    combatants: Vec<Combatant>,
    turn_index: usize,
    round: u32,
}

#[derive(Deserialize)]
struct EncounterRecord {
    combatants: Vec<Combatant>,
    turn_index: usize,
    round: u32,
}

impl From<EncounterRecord> for Encounter {
    fn from(record: EncounterRecord) -> Self {
        let turn_index = if record.turn_index < record.combatants.len() {
            record.turn_index
        } else {
            0
        };
        Self {
            combatants: record.combatants,
            turn_index,
            round: record.round.max(1),
        }
    }
}

impl Default for Encounter {
    fn default() -> Self {
        Self::new()
    }
}

impl Encounter {
    pub fn new() -> Self {
        Self {
            combatants: Vec::new(),
            turn_index: 0,
            round: 1,
        }
    }

    /// Append a combatant. Order is only changed by rolling initiative.
    pub fn add_combatant(&mut self, combatant: Combatant) -> CombatantId {
        let id = combatant.id;
        debug!(combatant = %combatant.name, "added combatant");
        self.combatants.push(combatant);
        id
    }

    pub fn combatants(&self) -> &[Combatant] {
        &self.combatants
    }

    pub fn len(&self) -> usize {
        self.combatants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.combatants.is_empty()
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn turn_index(&self) -> usize {
        self.turn_index
    }

    /// Whose turn it is.
    pub fn current(&self) -> Option<&Combatant> {
        self.combatants.get(self.turn_index)
    }

    pub fn combatant(&self, id: CombatantId) -> Result<&Combatant, EncounterError> {
        self.combatants
            .iter()
            .find(|c| c.id == id)
            .ok_or(EncounterError::UnknownCombatant(id))
    }

    pub fn combatant_mut(&mut self, id: CombatantId) -> Result<&mut Combatant, EncounterError> {
        self.combatants
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or(EncounterError::UnknownCombatant(id))
    }

    /// Remove a combatant, keeping the turn pointer on the same creature when
    /// possible. Removing the current combatant passes the turn to whoever was
    /// next.
    pub fn remove_combatant(&mut self, id: CombatantId) -> Result<Combatant, EncounterError> {
        let index = self
            .combatants
            .iter()
            .position(|c| c.id == id)
            .ok_or(EncounterError::UnknownCombatant(id))?;
        let removed = self.combatants.remove(index);

        if self.combatants.is_empty() {
            self.turn_index = 0;
        } else if index < self.turn_index {
            self.turn_index -= 1;
        } else if self.turn_index >= self.combatants.len() {
            self.turn_index = 0;
        }

        debug!(combatant = %removed.name, turn_index = self.turn_index, "removed combatant");
        Ok(removed)
    }

    /// Roll `1d20 + bonus` for everyone, sort descending and restart the turn
    /// pointer.
    pub fn roll_initiative_for_all<S: RollSource>(
        &mut self,
        rng: &mut S,
        tie_break: InitiativeTieBreak,
    ) -> Vec<InitiativeRoll> {
        let rolls: Vec<InitiativeRoll> = self
            .combatants
            .iter_mut()
            .map(|c| {
                let natural = roll_d20_with(rng, Advantage::Normal).natural;
                c.initiative = natural as i32 + c.initiative_bonus;
                InitiativeRoll {
                    combatant_id: c.id,
                    natural,
                    total: c.initiative,
                }
            })
            .collect();

        match tie_break {
            InitiativeTieBreak::HigherBonus => self
                .combatants
                .sort_by_key(|c| (Reverse(c.initiative), Reverse(c.initiative_bonus))),
            InitiativeTieBreak::InsertionOrder => {
                self.combatants.sort_by_key(|c| Reverse(c.initiative))
            }
        }
        self.turn_index = 0;

        info!(
            order = ?self
                .combatants
                .iter()
                .map(|c| (c.name.as_str(), c.initiative))
                .collect::<Vec<_>>(),
            "initiative rolled"
        );
        rolls
    }

    /// Advance to the next turn. Wrapping past the last combatant starts a new
    /// round and counts every condition down by one.
    pub fn next_turn(&mut self) -> TurnAdvance {
        let mut expired = Vec::new();
        let mut new_round = false;

        if !self.combatants.is_empty() {
            self.turn_index = (self.turn_index + 1) % self.combatants.len();
            if self.turn_index == 0 {
                new_round = true;
                self.round += 1;
                for combatant in &mut self.combatants {
                    let id = combatant.id;
                    expired.extend(combatant.tick_conditions().into_iter().map(|c| (id, c)));
                }
                info!(round = self.round, expired = expired.len(), "new round");
            }
        }

        let combatant_id = self.current().map(|c| c.id);
        debug!(round = self.round, turn_index = self.turn_index, "turn advanced");
        TurnAdvance {
            round: self.round,
            turn_index: self.turn_index,
            combatant_id,
            new_round,
            expired,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::StandardCatalog;
    use crate::character::CharacterClass;
    use crate::dice::FixedRolls;
    use crate::ids::{ItemId, SequentialIds};
    use crate::weapons::{CatalogWeaponRef, EquipmentSlot, InventoryItem, ItemKind, WeaponSource};

    fn goblin(ids: &mut SequentialIds, name: &str) -> Combatant {
        Combatant::new(CombatantId::generate(ids), name, CombatantKind::Enemy, 7, 15)
    }

    fn names(encounter: &Encounter) -> Vec<&str> {
        encounter.combatants().iter().map(|c| c.name.as_str()).collect()
    }

    #[test]
    fn test_condition_duration_serde() {
        assert_eq!(serde_json::to_string(&ConditionDuration::Indefinite).unwrap(), "-1");
        assert_eq!(serde_json::to_string(&ConditionDuration::Rounds(3)).unwrap(), "3");
        let d: ConditionDuration = serde_json::from_str("-1").unwrap();
        assert_eq!(d, ConditionDuration::Indefinite);
        let d: ConditionDuration = serde_json::from_str("2").unwrap();
        assert_eq!(d, ConditionDuration::Rounds(2));
    }

    #[test]
    fn test_tick_conditions() {
        let mut ids = SequentialIds::new();
        let mut c = goblin(&mut ids, "Goblin");
        let short = c.add_condition(&mut ids, ConditionKind::Prone, ConditionDuration::Rounds(1));
        c.add_condition(&mut ids, ConditionKind::Poisoned, ConditionDuration::Rounds(3));
        c.add_condition(&mut ids, ConditionKind::Charmed, ConditionDuration::Indefinite);

        let expired = c.tick_conditions();
        assert_eq!(expired.len(), 1);
        assert_eq!(expired[0].id, short);
        assert!(!c.has_condition(ConditionKind::Prone));
        assert_eq!(c.conditions[0].duration, ConditionDuration::Rounds(2));
        assert_eq!(c.conditions[1].duration, ConditionDuration::Indefinite);
    }

    #[test]
    fn test_remove_condition_and_exhaustion_matching() {
        let mut ids = SequentialIds::new();
        let mut c = goblin(&mut ids, "Goblin");
        let id = c.add_condition(&mut ids, ConditionKind::Exhaustion(2), ConditionDuration::Indefinite);
        assert!(c.has_condition(ConditionKind::Exhaustion(1)));
        assert_eq!(c.remove_condition(id).map(|c| c.kind), Some(ConditionKind::Exhaustion(2)));
        assert!(c.remove_condition(id).is_none());
    }

    #[test]
    fn test_damage_triggers_concentration_check() {
        let mut ids = SequentialIds::new();
        let mut c = goblin(&mut ids, "Shaman");
        assert_eq!(c.take_damage(3), None);
        c.concentration.begin("Hold Person");
        assert_eq!(c.take_damage(2), Some(10));
        assert_eq!(c.hit_points.current(), 2);
        assert_eq!(c.take_damage(10), Some(10));
        assert_eq!(c.hit_points.current(), 0);
        assert_eq!(c.heal(100), 7);
    }

    #[test]
    fn test_remove_current_combatant_passes_turn_to_next() {
        let mut ids = SequentialIds::new();
        let mut encounter = Encounter::new();
        let _a = encounter.add_combatant(goblin(&mut ids, "A"));
        let b = encounter.add_combatant(goblin(&mut ids, "B"));
        let c = encounter.add_combatant(goblin(&mut ids, "C"));

        encounter.next_turn();
        assert_eq!(encounter.turn_index(), 1);
        encounter.remove_combatant(b).unwrap();
        assert_eq!(encounter.current().map(|x| x.id), Some(c));
    }

    #[test]
    fn test_remove_reindexes_pointer() {
        let mut ids = SequentialIds::new();
        let mut encounter = Encounter::new();
        let a = encounter.add_combatant(goblin(&mut ids, "A"));
        let b = encounter.add_combatant(goblin(&mut ids, "B"));
        let c = encounter.add_combatant(goblin(&mut ids, "C"));

        encounter.next_turn();
        encounter.next_turn();
        assert_eq!(encounter.current().map(|x| x.id), Some(c));

        // Earlier entry removed: pointer follows C.
        encounter.remove_combatant(a).unwrap();
        assert_eq!(encounter.turn_index(), 1);
        assert_eq!(encounter.current().map(|x| x.id), Some(c));

        // Last entry removed while current: wrap to the front.
        encounter.remove_combatant(c).unwrap();
        assert_eq!(encounter.turn_index(), 0);
        assert_eq!(encounter.current().map(|x| x.id), Some(b));

        encounter.remove_combatant(b).unwrap();
        assert!(encounter.is_empty());
        assert_eq!(encounter.turn_index(), 0);
        assert!(encounter.current().is_none());

        assert_eq!(
            encounter.remove_combatant(b),
            Err(EncounterError::UnknownCombatant(b))
        );
    }

    #[test]
    fn test_initiative_sorts_descending() {
        let mut ids = SequentialIds::new();
        let mut encounter = Encounter::new();
        encounter.add_combatant(goblin(&mut ids, "Slow"));
        encounter.add_combatant(goblin(&mut ids, "Fast").with_initiative_bonus(3));
        encounter.add_combatant(goblin(&mut ids, "Middle"));
        encounter.next_turn();

        let mut rolls = FixedRolls::new([4, 15, 10]);
        let results = encounter.roll_initiative_for_all(&mut rolls, InitiativeTieBreak::HigherBonus);
        assert_eq!(results.iter().map(|r| r.total).collect::<Vec<_>>(), vec![4, 18, 10]);
        assert_eq!(names(&encounter), vec!["Fast", "Middle", "Slow"]);
        assert_eq!(encounter.turn_index(), 0);
    }

    #[test]
    fn test_initiative_ties() {
        let build = |ids: &mut SequentialIds| {
            let mut encounter = Encounter::new();
            encounter.add_combatant(goblin(ids, "First"));
            encounter.add_combatant(goblin(ids, "Second").with_initiative_bonus(2));
            encounter.add_combatant(goblin(ids, "Third"));
            encounter
        };

        // Everyone totals 12.
        let mut ids = SequentialIds::new();
        let mut by_bonus = build(&mut ids);
        let mut rolls = FixedRolls::new([12, 10, 12]);
        by_bonus.roll_initiative_for_all(&mut rolls, InitiativeTieBreak::HigherBonus);
        assert_eq!(names(&by_bonus), vec!["Second", "First", "Third"]);

        let mut in_order = build(&mut ids);
        let mut rolls = FixedRolls::new([12, 10, 12]);
        in_order.roll_initiative_for_all(&mut rolls, InitiativeTieBreak::InsertionOrder);
        assert_eq!(names(&in_order), vec!["First", "Second", "Third"]);
    }

    #[test]
    fn test_round_wrap_ticks_conditions() {
        let mut ids = SequentialIds::new();
        let mut encounter = Encounter::new();
        let mut a = goblin(&mut ids, "A");
        a.add_condition(&mut ids, ConditionKind::Stunned, ConditionDuration::Rounds(1));
        a.add_condition(&mut ids, ConditionKind::Frightened, ConditionDuration::Indefinite);
        let a = encounter.add_combatant(a);
        let mut b = goblin(&mut ids, "B");
        b.add_condition(&mut ids, ConditionKind::Restrained, ConditionDuration::Rounds(2));
        let b = encounter.add_combatant(b);

        let first = encounter.next_turn();
        assert!(!first.new_round);
        assert_eq!(first.round, 1);
        assert_eq!(first.combatant_id, Some(b));

        let wrap = encounter.next_turn();
        assert!(wrap.new_round);
        assert_eq!(wrap.round, 2);
        assert_eq!(wrap.combatant_id, Some(a));
        assert_eq!(wrap.expired.len(), 1);
        assert_eq!(wrap.expired[0].0, a);
        assert_eq!(wrap.expired[0].1.kind, ConditionKind::Stunned);

        let a_state = encounter.combatant(a).unwrap();
        assert!(a_state.has_condition(ConditionKind::Frightened));
        assert!(!a_state.has_condition(ConditionKind::Stunned));
        assert_eq!(
            encounter.combatant(b).unwrap().conditions[0].duration,
            ConditionDuration::Rounds(1)
        );
    }

    #[test]
    fn test_next_turn_on_empty_encounter() {
        let mut encounter = Encounter::new();
        let advance = encounter.next_turn();
        assert_eq!(advance.round, 1);
        assert_eq!(advance.combatant_id, None);
        assert!(!advance.new_round);
    }

    #[test]
    fn test_deserialize_clamps_turn_index() {
        let json = r#"{"combatants":[],"turn_index":4,"round":0}"#;
        let encounter: Encounter = serde_json::from_str(json).unwrap();
        assert_eq!(encounter.turn_index(), 0);
        assert_eq!(encounter.round(), 1);
    }

    #[test]
    fn test_from_character() {
        let mut ids = SequentialIds::new();
        let mut hero = Character::new(
            CharacterId::generate(&mut ids),
            "Roland",
            CharacterClass::Fighter,
            AbilityScores::new(16, 14, 14, 10, 12, 8),
        );
        hero.inventory.push(
            InventoryItem::new(ItemId::generate(&mut ids), "Longsword")
                .with_kind(ItemKind::Weapon(WeaponSource::Catalog(CatalogWeaponRef::new(
                    "longsword",
                ))))
                .equipped_in(EquipmentSlot::MainHand),
        );

        let combatant =
            Combatant::from_character(CombatantId::generate(&mut ids), &hero, 18, &StandardCatalog);
        assert_eq!(combatant.kind, CombatantKind::Player);
        assert_eq!(combatant.initiative_bonus, 2);
        assert_eq!(combatant.hit_points, hero.hit_points);
        assert_eq!(combatant.character_id, Some(hero.id));
        assert_eq!(combatant.weapon.as_ref().map(|w| w.attack_bonus), Some(5));
        assert_eq!(combatant.saving_throw_bonus(Ability::Constitution), 4);
        assert_eq!(combatant.saving_throw_bonus(Ability::Wisdom), 1);

        let save = combatant.concentration_save();
        assert!(save.proficient);
        assert_eq!(save.bonus(), 4);
    }

    #[test]
    fn test_attack_profile_falls_back_to_unarmed() {
        let mut ids = SequentialIds::new();
        let c = goblin(&mut ids, "Goblin");
        let profile = c.attack_profile();
        assert_eq!(profile.name, "Unarmed Strike");
        assert_eq!(profile.attack_bonus, 0);
    }
}
