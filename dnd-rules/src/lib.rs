//! D&D 5e rules-evaluation engine.
//!
//! This crate provides:
//! - Dice parsing and rolling with injectable randomness
//! - Combat math: attacks, damage, saving throws, spell DCs
//! - Character progression: spell slots, spell caps, level-up
//! - The concentration protocol and the encounter turn-order state machine
//! - An Intent/Effect rules engine over encounter snapshots
//!
//! The engine performs no I/O and keeps no ambient state. Callers own the
//! [`Encounter`] and [`Character`] values and pass them into each call.
//!
//! # Quick Start
//!
//! ```
//! use dnd_rules::{
//!     apply_effects, Advantage, Combatant, CombatantKind, Encounter, FixedRolls, Intent,
//!     RulesConfig, RulesEngine, SequentialIds,
//! };
//! use dnd_rules::ids::CombatantId;
//!
//! let mut ids = SequentialIds::new();
//! let mut encounter = Encounter::new();
//! let hero = encounter.add_combatant(Combatant::new(
//!     CombatantId::generate(&mut ids),
//!     "Roland",
//!     CombatantKind::Player,
//!     12,
//!     16,
//! ));
//! let goblin = encounter.add_combatant(Combatant::new(
//!     CombatantId::generate(&mut ids),
//!     "Goblin",
//!     CombatantKind::Enemy,
//!     7,
//!     15,
//! ));
//!
//! let mut engine = RulesEngine::with_sources(
//!     RulesConfig::default(),
//!     FixedRolls::new([18]),
//!     SequentialIds::new(),
//! );
//! let resolution = engine
//!     .resolve(
//!         &encounter,
//!         Intent::Attack {
//!             attacker_id: hero,
//!             target_id: goblin,
//!             advantage: Advantage::Normal,
//!         },
//!     )
//!     .unwrap();
//! apply_effects(&mut encounter, &resolution.effects);
//! assert_eq!(encounter.combatant(goblin).unwrap().hit_points.current(), 6);
//! ```

pub mod catalog;
pub mod character;
pub mod class_data;
pub mod combat;
pub mod concentration;
pub mod config;
pub mod dice;
pub mod encounter;
pub mod ids;
pub mod progression;
pub mod rules;
pub mod weapons;

// Primary public API
pub use catalog::{CatalogSpell, CatalogWeapon, ReferenceCatalog, StandardCatalog, WeaponCategory};
pub use character::{
    ability_modifier, Ability, AbilityScores, Character, CharacterClass, HitPoints, KnownSpell,
    LearnSpellError,
};
pub use class_data::ClassRules;
pub use combat::{AttackRoll, DamageRoll, DamageType, SavingThrow};
pub use concentration::{Concentration, ConcentrationOutcome, ConcentrationSave};
pub use config::RulesConfig;
pub use dice::{
    Advantage, DiceError, DiceExpression, DiceRoll, DieType, FixedRolls, MalformedDice,
    RandomRolls, RollSource,
};
pub use encounter::{
    ActiveCondition, Combatant, CombatantKind, ConditionDuration, ConditionKind, Encounter,
    EncounterError, InitiativeTieBreak, TurnAdvance,
};
pub use ids::{IdSource, RandomIds, SequentialIds};
pub use progression::{
    AbilityScoreImprovement, CapacityExceeded, CapacityKind, CasterShape, HitPointGain,
    SpellSlotTable,
};
pub use rules::{apply_effects, Effect, Intent, Resolution, RulesEngine, RulesError};
pub use weapons::{EquippedWeaponStats, InventoryItem};
