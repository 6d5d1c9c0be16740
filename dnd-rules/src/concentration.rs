//! Concentration state machine.
//!
//! ```text
//! Idle --begin--> Concentrating --damage--> PendingCheck --save--> Concentrating
//!                                                        --fail--> Idle
//! ```
//!
//! Every damage event fixes its own DC at the moment it lands. Further damage
//! while a check is pending queues another check; checks resolve oldest first
//! and the first failure drops the rest.

use crate::combat::{self, SavingThrow};
use crate::dice::{Advantage, RollSource};
use serde::{Deserialize, Serialize};
use std::mem;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Concentration {
    #[default]
    Idle,
    Concentrating {
        spell: String,
    },
    PendingCheck {
        spell: String,
        /// Outstanding check DCs, oldest first. Never empty.
        dcs: Vec<u32>,
    },
}

/// What a Constitution save for concentration needs from the combatant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ConcentrationSave {
    pub constitution_modifier: i8,
    pub proficiency_bonus: i8,
    pub proficient: bool,
}

impl ConcentrationSave {
    pub fn bonus(&self) -> i32 {
        combat::saving_throw_bonus(
            self.constitution_modifier,
            self.proficient,
            self.proficiency_bonus,
        )
    }
}

/// How a pending check came out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConcentrationOutcome {
    pub spell: String,
    pub dc: u32,
    /// `None` when the result was forced without rolling.
    pub roll: Option<SavingThrow>,
    pub maintained: bool,
}

impl Concentration {
    /// Start concentrating on `spell`. Returns the spell this replaces, if any.
    pub fn begin(&mut self, spell: impl Into<String>) -> Option<String> {
        let spell = spell.into();
        let previous = self.end();
        debug!(%spell, ?previous, "began concentrating");
        *self = Concentration::Concentrating { spell };
        previous
    }

    pub fn spell(&self) -> Option<&str> {
        match self {
            Concentration::Idle => None,
            Concentration::Concentrating { spell } | Concentration::PendingCheck { spell, .. } => {
                Some(spell)
            }
        }
    }

    pub fn is_concentrating(&self) -> bool {
        !matches!(self, Concentration::Idle)
    }

    /// Record damage. Returns the DC of the check it triggers, if any.
    pub fn take_damage(&mut self, amount: u32) -> Option<u32> {
        if amount == 0 || !self.is_concentrating() {
            return None;
        }
        let dc = combat::concentration_dc(amount);
        self.queue_check(dc);
        Some(dc)
    }

    /// Queue a check at a known DC. Ignored while idle.
    pub fn queue_check(&mut self, dc: u32) -> bool {
        match self {
            Concentration::Idle => false,
            Concentration::Concentrating { spell } => {
                *self = Concentration::PendingCheck {
                    spell: mem::take(spell),
                    dcs: vec![dc],
                };
                true
            }
            Concentration::PendingCheck { dcs, .. } => {
                dcs.push(dc);
                true
            }
        }
    }

    /// DC of the oldest outstanding check.
    pub fn pending_dc(&self) -> Option<u32> {
        match self {
            Concentration::PendingCheck { dcs, .. } => dcs.first().copied(),
            _ => None,
        }
    }

    /// Roll a Constitution save against the oldest outstanding check.
    pub fn resolve_with_roll<S: RollSource>(
        &mut self,
        rng: &mut S,
        save: ConcentrationSave,
        mode: Advantage,
    ) -> Option<ConcentrationOutcome> {
        let dc = self.pending_dc()?;
        let roll = combat::roll_saving_throw(rng, save.bonus(), dc, mode);
        let maintained = roll.success;
        self.settle(maintained, Some(roll))
    }

    /// Settle the oldest outstanding check without rolling.
    pub fn resolve_forced(&mut self, maintained: bool) -> Option<ConcentrationOutcome> {
        self.settle(maintained, None)
    }

    /// Drop concentration. Returns the spell that was being held.
    pub fn end(&mut self) -> Option<String> {
        match mem::take(self) {
            Concentration::Idle => None,
            Concentration::Concentrating { spell } | Concentration::PendingCheck { spell, .. } => {
                Some(spell)
            }
        }
    }

    fn settle(
        &mut self,
        maintained: bool,
        roll: Option<SavingThrow>,
    ) -> Option<ConcentrationOutcome> {
        let Concentration::PendingCheck { spell, mut dcs } = mem::take(self) else {
            return None;
        };
        let dc = dcs.remove(0);

        if maintained {
            debug!(%spell, dc, "concentration maintained");
            *self = if dcs.is_empty() {
                Concentration::Concentrating {
                    spell: spell.clone(),
                }
            } else {
                Concentration::PendingCheck {
                    spell: spell.clone(),
                    dcs,
                }
            };
        } else {
            info!(%spell, dc, "concentration lost");
        }

        Some(ConcentrationOutcome {
            spell,
            dc,
            roll,
            maintained,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dice::FixedRolls;

    fn holding(spell: &str) -> Concentration {
        let mut c = Concentration::default();
        c.begin(spell);
        c
    }

    #[test]
    fn test_damage_while_idle_is_ignored() {
        let mut c = Concentration::default();
        assert_eq!(c.take_damage(30), None);
        assert_eq!(c, Concentration::Idle);
        assert!(c.resolve_forced(false).is_none());
    }

    #[test]
    fn test_zero_damage_does_not_trigger() {
        let mut c = holding("Bless");
        assert_eq!(c.take_damage(0), None);
        assert_eq!(c.pending_dc(), None);
    }

    #[test]
    fn test_successful_save_keeps_spell() {
        let mut c = holding("Hold Person");
        assert_eq!(c.take_damage(24), Some(12));

        let mut rolls = FixedRolls::new([10]);
        let save = ConcentrationSave {
            constitution_modifier: 2,
            proficiency_bonus: 2,
            proficient: false,
        };
        let outcome = c.resolve_with_roll(&mut rolls, save, Advantage::Normal).unwrap();
        assert!(outcome.maintained);
        assert_eq!(outcome.dc, 12);
        assert_eq!(outcome.roll.map(|r| r.total), Some(12));
        assert_eq!(c.spell(), Some("Hold Person"));
        assert_eq!(c.pending_dc(), None);
    }

    #[test]
    fn test_failed_save_clears_concentration() {
        let mut c = holding("Haste");
        c.take_damage(8);

        let mut rolls = FixedRolls::new([4]);
        let save = ConcentrationSave {
            constitution_modifier: 1,
            proficiency_bonus: 3,
            proficient: true,
        };
        let outcome = c.resolve_with_roll(&mut rolls, save, Advantage::Normal).unwrap();
        assert!(!outcome.maintained);
        assert_eq!(outcome.spell, "Haste");
        assert_eq!(c, Concentration::Idle);
    }

    #[test]
    fn test_each_damage_event_queues_its_own_dc() {
        let mut c = holding("Spirit Guardians");
        c.take_damage(30);
        c.take_damage(4);
        assert_eq!(c.pending_dc(), Some(15));

        let first = c.resolve_forced(true).unwrap();
        assert_eq!(first.dc, 15);
        assert_eq!(c.pending_dc(), Some(10));

        let second = c.resolve_forced(true).unwrap();
        assert_eq!(second.dc, 10);
        assert_eq!(
            c,
            Concentration::Concentrating {
                spell: "Spirit Guardians".to_string()
            }
        );
    }

    #[test]
    fn test_failure_drops_remaining_checks() {
        let mut c = holding("Hex");
        c.take_damage(12);
        c.take_damage(40);
        let outcome = c.resolve_forced(false).unwrap();
        assert_eq!(outcome.dc, 10);
        assert!(!c.is_concentrating());
        assert_eq!(c.pending_dc(), None);
    }

    #[test]
    fn test_begin_replaces_previous_spell() {
        let mut c = holding("Bless");
        c.take_damage(10);
        assert_eq!(c.begin("Hunter's Mark"), Some("Bless".to_string()));
        assert_eq!(c.spell(), Some("Hunter's Mark"));
        assert_eq!(c.pending_dc(), None);
    }

    #[test]
    fn test_serde_shape() {
        let c = holding("Bless");
        let json = serde_json::to_value(&c).unwrap();
        assert_eq!(json["state"], "concentrating");
        assert_eq!(json["spell"], "Bless");
        let back: Concentration = serde_json::from_value(json).unwrap();
        assert_eq!(back, c);
    }
}
