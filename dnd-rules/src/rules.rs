//! Intent/Effect rules engine.
//!
//! 1. A caller submits an [`Intent`] (what a combatant wants to do).
//! 2. [`RulesEngine::resolve`] rolls dice against an [`Encounter`] snapshot
//!    and returns a [`Resolution`]: a list of [`Effect`]s plus a narrative.
//! 3. [`apply_effects`] writes those effects back onto the encounter.
//!
//! Resolution never mutates the encounter, so a caller can inspect, log or
//! discard the effects before committing them.

use crate::character::{Ability, Character};
use crate::combat::{self, AttackRoll, DamageRoll, DamageType, SavingThrow};
use crate::concentration::ConcentrationOutcome;
use crate::config::RulesConfig;
use crate::dice::{Advantage, DiceError, DiceExpression, DiceRoll, RandomRolls, RollSource};
use crate::encounter::{
    ActiveCondition, Combatant, ConditionDuration, ConditionKind, Encounter, EncounterError,
    InitiativeRoll,
};
use crate::ids::{CombatantId, ConditionId, IdSource, ItemId, RandomIds};
use crate::progression::CapacityExceeded;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RulesError {
    #[error(transparent)]
    Encounter(#[from] EncounterError),
    #[error(transparent)]
    Dice(#[from] DiceError),
    #[error("Combatant {0} has no concentration check pending")]
    NoPendingCheck(CombatantId),
}

/// What a combatant wants to do.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Intent {
    /// Roll arbitrary dice notation.
    RollDice { notation: String, purpose: String },

    /// Attack a target with the attacker's equipped weapon.
    Attack {
        attacker_id: CombatantId,
        target_id: CombatantId,
        advantage: Advantage,
    },

    /// Deal a known amount of damage.
    Damage {
        target_id: CombatantId,
        amount: u32,
        damage_type: DamageType,
        source: String,
    },

    Heal { target_id: CombatantId, amount: u32 },

    SavingThrow {
        combatant_id: CombatantId,
        ability: Ability,
        dc: u32,
        advantage: Advantage,
    },

    /// Settle the oldest pending concentration check. `forced` skips the roll.
    ConcentrationCheck {
        combatant_id: CombatantId,
        forced: Option<bool>,
        advantage: Advantage,
    },

    BeginConcentration {
        combatant_id: CombatantId,
        spell: String,
    },

    ApplyCondition {
        target_id: CombatantId,
        condition: ConditionKind,
        duration: ConditionDuration,
        source: String,
    },

    RemoveCondition {
        target_id: CombatantId,
        condition_id: ConditionId,
    },
}

/// A concrete state change (or roll record) produced by resolving an intent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Effect {
    DiceRolled {
        roll: DiceRoll,
        purpose: String,
    },

    AttackRolled {
        attacker_id: CombatantId,
        target_id: CombatantId,
        attack: AttackRoll,
        target_ac: i32,
    },

    AttackHit {
        attacker_id: CombatantId,
        target_id: CombatantId,
        critical: bool,
    },

    AttackMissed {
        attacker_id: CombatantId,
        target_id: CombatantId,
    },

    /// The attacker is incapacitated; nothing was rolled.
    AttackPrevented {
        attacker_id: CombatantId,
        condition: ConditionKind,
    },

    DamageRolled {
        target_id: CombatantId,
        roll: DamageRoll,
        damage_type: DamageType,
    },

    /// HP changed (damage or healing). `new_current` is authoritative.
    HpChanged {
        target_id: CombatantId,
        amount: i32,
        new_current: i32,
        new_max: i32,
        dropped_to_zero: bool,
    },

    SavingThrowRolled {
        combatant_id: CombatantId,
        ability: Ability,
        save: SavingThrow,
    },

    /// Damage landed on a concentrating combatant.
    ConcentrationCheckRequired {
        combatant_id: CombatantId,
        spell: String,
        dc: u32,
    },

    ConcentrationStarted {
        combatant_id: CombatantId,
        spell: String,
        replaced: Option<String>,
    },

    ConcentrationMaintained {
        combatant_id: CombatantId,
        spell: String,
        dc: u32,
    },

    ConcentrationBroken {
        combatant_id: CombatantId,
        spell: String,
        dc: u32,
    },

    ConditionApplied {
        target_id: CombatantId,
        condition: ActiveCondition,
    },

    ConditionRemoved {
        target_id: CombatantId,
        condition_id: ConditionId,
        condition: ConditionKind,
    },
}

/// The result of resolving an intent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub effects: Vec<Effect>,
    pub narrative: String,
}

impl Resolution {
    pub fn new(narrative: impl Into<String>) -> Self {
        Self {
            effects: Vec::new(),
            narrative: narrative.into(),
        }
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }

    pub fn with_effects(mut self, effects: impl IntoIterator<Item = Effect>) -> Self {
        self.effects.extend(effects);
        self
    }
}

/// Resolves intents with injected randomness and identifiers.
pub struct RulesEngine {
    config: RulesConfig,
    rolls: Box<dyn RollSource>,
    ids: Box<dyn IdSource>,
}

impl Default for RulesEngine {
    fn default() -> Self {
        Self::new(RulesConfig::default())
    }
}

impl RulesEngine {
    /// An engine backed by the thread RNG and random v4 ids.
    pub fn new(config: RulesConfig) -> Self {
        Self::with_sources(config, RandomRolls::new(), RandomIds)
    }

    pub fn with_sources(
        config: RulesConfig,
        rolls: impl RollSource + 'static,
        ids: impl IdSource + 'static,
    ) -> Self {
        Self {
            config,
            rolls: Box::new(rolls),
            ids: Box::new(ids),
        }
    }

    pub fn config(&self) -> &RulesConfig {
        &self.config
    }

    /// Parse dice notation under the configured malformed-dice policy.
    pub fn parse_dice(&self, notation: &str) -> Result<DiceExpression, DiceError> {
        DiceExpression::parse_with(notation, self.config.malformed_dice)
    }

    /// Roll initiative for everyone using the configured tie-break.
    pub fn roll_initiative(&mut self, encounter: &mut Encounter) -> Vec<InitiativeRoll> {
        encounter.roll_initiative_for_all(&mut self.rolls, self.config.initiative_tie_break)
    }

    /// Attune a character to an item under the configured attunement limit.
    pub fn attune(
        &self,
        character: &mut Character,
        item_id: ItemId,
    ) -> Result<bool, CapacityExceeded> {
        character.attune(item_id, self.config.attunement_limit)
    }

    pub fn resolve(
        &mut self,
        encounter: &Encounter,
        intent: Intent,
    ) -> Result<Resolution, RulesError> {
        debug!(?intent, "resolving intent");
        match intent {
            Intent::RollDice { notation, purpose } => self.resolve_roll_dice(&notation, purpose),
            Intent::Attack {
                attacker_id,
                target_id,
                advantage,
            } => self.resolve_attack(encounter, attacker_id, target_id, advantage),
            Intent::Damage {
                target_id,
                amount,
                damage_type,
                source,
            } => {
                let target = encounter.combatant(target_id)?;
                Ok(Resolution::new(format!(
                    "{} takes {amount} {damage_type} damage from {source}",
                    target.name
                ))
                .with_effects(damage_effects(target, amount)))
            }
            Intent::Heal { target_id, amount } => {
                let target = encounter.combatant(target_id)?;
                let mut hp = target.hit_points;
                let restored = hp.heal(amount);
                Ok(Resolution::new(format!(
                    "{} regains {restored} hit points ({}/{})",
                    target.name,
                    hp.current(),
                    hp.max()
                ))
                .with_effect(Effect::HpChanged {
                    target_id,
                    amount: restored,
                    new_current: hp.current(),
                    new_max: hp.max(),
                    dropped_to_zero: false,
                }))
            }
            Intent::SavingThrow {
                combatant_id,
                ability,
                dc,
                advantage,
            } => {
                let combatant = encounter.combatant(combatant_id)?;
                let bonus = combatant.saving_throw_bonus(ability);
                let save = combat::roll_saving_throw(&mut self.rolls, bonus, dc, advantage);
                let verdict = if save.success { "SUCCESS" } else { "FAILURE" };
                Ok(Resolution::new(format!(
                    "{} makes a DC {dc} {} save: {} - {verdict}",
                    combatant.name,
                    ability.name(),
                    save.total
                ))
                .with_effect(Effect::SavingThrowRolled {
                    combatant_id,
                    ability,
                    save,
                }))
            }
            Intent::ConcentrationCheck {
                combatant_id,
                forced,
                advantage,
            } => self.resolve_concentration_check(encounter, combatant_id, forced, advantage),
            Intent::BeginConcentration {
                combatant_id,
                spell,
            } => {
                let combatant = encounter.combatant(combatant_id)?;
                let replaced = combatant.concentration.spell().map(str::to_string);
                let narrative = match &replaced {
                    Some(old) => format!(
                        "{} drops {old} and concentrates on {spell}",
                        combatant.name
                    ),
                    None => format!("{} concentrates on {spell}", combatant.name),
                };
                Ok(
                    Resolution::new(narrative).with_effect(Effect::ConcentrationStarted {
                        combatant_id,
                        spell,
                        replaced,
                    }),
                )
            }
            Intent::ApplyCondition {
                target_id,
                condition,
                duration,
                source,
            } => {
                let target = encounter.combatant(target_id)?;
                let active =
                    ActiveCondition::new(ConditionId::generate(&mut self.ids), condition, duration)
                        .with_source(source);
                Ok(Resolution::new(format!("{} is now {condition}", target.name))
                    .with_effect(Effect::ConditionApplied {
                        target_id,
                        condition: active,
                    }))
            }
            Intent::RemoveCondition {
                target_id,
                condition_id,
            } => {
                let target = encounter.combatant(target_id)?;
                match target.conditions.iter().find(|c| c.id == condition_id) {
                    Some(active) => Ok(Resolution::new(format!(
                        "{} is no longer {}",
                        target.name, active.kind
                    ))
                    .with_effect(Effect::ConditionRemoved {
                        target_id,
                        condition_id,
                        condition: active.kind,
                    })),
                    None => Ok(Resolution::new(format!(
                        "{} has no such condition",
                        target.name
                    ))),
                }
            }
        }
    }

    fn resolve_roll_dice(
        &mut self,
        notation: &str,
        purpose: String,
    ) -> Result<Resolution, RulesError> {
        let expression = self.parse_dice(notation)?;
        let roll = expression.roll(&mut self.rolls);
        Ok(
            Resolution::new(format!("Rolled {roll} for {purpose}"))
                .with_effect(Effect::DiceRolled { roll, purpose }),
        )
    }

    fn resolve_attack(
        &mut self,
        encounter: &Encounter,
        attacker_id: CombatantId,
        target_id: CombatantId,
        advantage: Advantage,
    ) -> Result<Resolution, RulesError> {
        let attacker = encounter.combatant(attacker_id)?;
        let target = encounter.combatant(target_id)?;

        if let Some(condition) = attacker.conditions.iter().find(|c| c.kind.is_incapacitating()) {
            return Ok(Resolution::new(format!(
                "{} is {} and cannot attack!",
                attacker.name, condition.kind
            ))
            .with_effect(Effect::AttackPrevented {
                attacker_id,
                condition: condition.kind,
            }));
        }

        let weapon = attacker.attack_profile();
        let outcome =
            combat::attack_with_weapon(&mut self.rolls, &weapon, target.armor_class, advantage);

        let mut resolution = Resolution::new(format!(
            "{} attacks {} with {} (roll: {} vs AC {})",
            attacker.name, target.name, weapon.name, outcome.attack.total, target.armor_class
        ))
        .with_effect(Effect::AttackRolled {
            attacker_id,
            target_id,
            attack: outcome.attack.clone(),
            target_ac: target.armor_class,
        });

        let Some(damage) = outcome.damage else {
            resolution.narrative.push_str(" - MISS");
            return Ok(resolution.with_effect(Effect::AttackMissed {
                attacker_id,
                target_id,
            }));
        };

        let critical = outcome.attack.is_critical();
        let amount = damage.amount();
        resolution.narrative.push_str(&format!(
            " - {}! {amount} {} damage",
            if critical { "CRITICAL HIT" } else { "HIT" },
            weapon.damage_type
        ));
        Ok(resolution
            .with_effect(Effect::AttackHit {
                attacker_id,
                target_id,
                critical,
            })
            .with_effect(Effect::DamageRolled {
                target_id,
                roll: damage,
                damage_type: weapon.damage_type,
            })
            .with_effects(damage_effects(target, amount)))
    }

    fn resolve_concentration_check(
        &mut self,
        encounter: &Encounter,
        combatant_id: CombatantId,
        forced: Option<bool>,
        advantage: Advantage,
    ) -> Result<Resolution, RulesError> {
        let combatant = encounter.combatant(combatant_id)?;

        // Settle on a copy; apply_effects replays the verdict.
        let mut concentration = combatant.concentration.clone();
        let outcome = match forced {
            Some(maintained) => concentration.resolve_forced(maintained),
            None => concentration.resolve_with_roll(
                &mut self.rolls,
                combatant.concentration_save(),
                advantage,
            ),
        }
        .ok_or(RulesError::NoPendingCheck(combatant_id))?;

        let ConcentrationOutcome {
            spell,
            dc,
            roll,
            maintained,
        } = outcome;
        let rolled = roll
            .as_ref()
            .map_or_else(|| "no roll".to_string(), |r| format!("rolls {}", r.total));

        let mut resolution = if maintained {
            Resolution::new(format!(
                "{} makes a DC {dc} Constitution save to maintain concentration on {spell}. {rolled} - concentration maintained.",
                combatant.name
            ))
        } else {
            Resolution::new(format!(
                "{} makes a DC {dc} Constitution save to maintain concentration on {spell}. {rolled} - concentration is broken!",
                combatant.name
            ))
        };

        if let Some(save) = roll {
            resolution = resolution.with_effect(Effect::SavingThrowRolled {
                combatant_id,
                ability: Ability::Constitution,
                save,
            });
        }
        Ok(resolution.with_effect(if maintained {
            Effect::ConcentrationMaintained {
                combatant_id,
                spell,
                dc,
            }
        } else {
            Effect::ConcentrationBroken {
                combatant_id,
                spell,
                dc,
            }
        }))
    }
}

/// HP change for `amount` damage, plus a concentration check if one is owed.
fn damage_effects(target: &Combatant, amount: u32) -> Vec<Effect> {
    let mut hp = target.hit_points;
    let was_up = !hp.is_down();
    let lost = hp.take_damage(amount);
    let mut effects = vec![Effect::HpChanged {
        target_id: target.id,
        amount: -lost,
        new_current: hp.current(),
        new_max: hp.max(),
        dropped_to_zero: was_up && hp.is_down(),
    }];
    match target.concentration.spell() {
        Some(spell) if amount > 0 => effects.push(Effect::ConcentrationCheckRequired {
            combatant_id: target.id,
            spell: spell.to_string(),
            dc: combat::concentration_dc(amount),
        }),
        _ => {}
    }
    effects
}

/// Apply all effects to the encounter.
pub fn apply_effects(encounter: &mut Encounter, effects: &[Effect]) {
    for effect in effects {
        apply_effect(encounter, effect);
    }
}

/// Apply a single effect. Effects naming a combatant no longer in the
/// encounter are skipped.
pub fn apply_effect(encounter: &mut Encounter, effect: &Effect) {
    let target_id = match effect {
        Effect::HpChanged { target_id, .. }
        | Effect::ConditionApplied { target_id, .. }
        | Effect::ConditionRemoved { target_id, .. } => *target_id,
        Effect::ConcentrationCheckRequired { combatant_id, .. }
        | Effect::ConcentrationStarted { combatant_id, .. }
        | Effect::ConcentrationMaintained { combatant_id, .. }
        | Effect::ConcentrationBroken { combatant_id, .. } => *combatant_id,
        // Roll records only.
        Effect::DiceRolled { .. }
        | Effect::AttackRolled { .. }
        | Effect::AttackHit { .. }
        | Effect::AttackMissed { .. }
        | Effect::AttackPrevented { .. }
        | Effect::DamageRolled { .. }
        | Effect::SavingThrowRolled { .. } => return,
    };

    let combatant = match encounter.combatant_mut(target_id) {
        Ok(combatant) => combatant,
        Err(err) => {
            warn!(%err, "skipping effect");
            return;
        }
    };

    match effect {
        Effect::HpChanged { new_current, .. } => {
            combatant.hit_points.set_current(*new_current);
        }
        Effect::ConcentrationCheckRequired { dc, .. } => {
            combatant.concentration.queue_check(*dc);
        }
        Effect::ConcentrationStarted { spell, .. } => {
            combatant.concentration.begin(spell.clone());
        }
        Effect::ConcentrationMaintained { .. } => {
            combatant.concentration.resolve_forced(true);
        }
        Effect::ConcentrationBroken { .. } => {
            combatant.concentration.resolve_forced(false);
        }
        Effect::ConditionApplied { condition, .. } => {
            combatant.conditions.push(condition.clone());
        }
        Effect::ConditionRemoved { condition_id, .. } => {
            combatant.remove_condition(*condition_id);
        }
        _ => {}
    }
}
