//! Engine policy knobs.

use crate::dice::MalformedDice;
use crate::encounter::InitiativeTieBreak;
use serde::{Deserialize, Serialize};

/// Policy settings for a [`RulesEngine`](crate::rules::RulesEngine).
///
/// Missing fields fall back to their defaults when loaded from JSON:
///
/// ```
/// use dnd_rules::{InitiativeTieBreak, MalformedDice, RulesConfig};
///
/// let config = RulesConfig::from_json(r#"{"malformed_dice": "reject"}"#).unwrap();
/// assert_eq!(config.malformed_dice, MalformedDice::Reject);
/// assert_eq!(config.initiative_tie_break, InitiativeTieBreak::HigherBonus);
/// assert_eq!(config.attunement_limit, 3);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RulesConfig {
    pub malformed_dice: MalformedDice,
    pub initiative_tie_break: InitiativeTieBreak,
    /// Maximum number of attuned items per character.
    pub attunement_limit: u32,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            malformed_dice: MalformedDice::default(),
            initiative_tie_break: InitiativeTieBreak::default(),
            attunement_limit: 3,
        }
    }
}

impl RulesConfig {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn with_malformed_dice(mut self, policy: MalformedDice) -> Self {
        self.malformed_dice = policy;
        self
    }

    pub fn with_initiative_tie_break(mut self, tie_break: InitiativeTieBreak) -> Self {
        self.initiative_tie_break = tie_break;
        self
    }

    pub fn with_attunement_limit(mut self, limit: u32) -> Self {
        self.attunement_limit = limit;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RulesConfig::default();
        assert_eq!(config.malformed_dice, MalformedDice::Zero);
        assert_eq!(config.initiative_tie_break, InitiativeTieBreak::HigherBonus);
        assert_eq!(config.attunement_limit, 3);
    }

    #[test]
    fn test_from_json() {
        let config = RulesConfig::from_json(
            r#"{"initiative_tie_break": "insertion_order", "attunement_limit": 5}"#,
        )
        .unwrap();
        assert_eq!(config.initiative_tie_break, InitiativeTieBreak::InsertionOrder);
        assert_eq!(config.attunement_limit, 5);
        assert_eq!(config.malformed_dice, MalformedDice::Zero);

        assert!(RulesConfig::from_json(r#"{"malformed_dice": "explode"}"#).is_err());
        assert_eq!(RulesConfig::from_json("{}").unwrap(), RulesConfig::default());
    }

    #[test]
    fn test_builders() {
        let config = RulesConfig::default()
            .with_malformed_dice(MalformedDice::Reject)
            .with_attunement_limit(1);
        assert_eq!(config.malformed_dice, MalformedDice::Reject);
        assert_eq!(config.attunement_limit, 1);
    }
}
