//! Identifier types and the injected identifier generator.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Supplies opaque unique ids for newly created records.
pub trait IdSource {
    fn next_uuid(&mut self) -> Uuid;
}

impl<S: IdSource + ?Sized> IdSource for &mut S {
    fn next_uuid(&mut self) -> Uuid {
        (**self).next_uuid()
    }
}

impl<S: IdSource + ?Sized> IdSource for Box<S> {
    fn next_uuid(&mut self) -> Uuid {
        (**self).next_uuid()
    }
}

/// Random v4 ids.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomIds;

impl IdSource for RandomIds {
    fn next_uuid(&mut self) -> Uuid {
        Uuid::new_v4()
    }
}

/// Deterministic ids counting up from 1.
#[derive(Debug, Clone, Default)]
pub struct SequentialIds {
    issued: u128,
}

impl SequentialIds {
    pub fn new() -> Self {
        Self::default()
    }
}

impl IdSource for SequentialIds {
    fn next_uuid(&mut self) -> Uuid {
        self.issued += 1;
        Uuid::from_u128(self.issued)
    }
}

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(pub Uuid);

        impl $name {
            pub fn generate(ids: &mut impl IdSource) -> Self {
                Self(ids.next_uuid())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_type!(
    /// Unique identifier for player characters.
    CharacterId
);
id_type!(
    /// Unique identifier for encounter participants.
    CombatantId
);
id_type!(
    /// Unique identifier for an applied condition.
    ConditionId
);
id_type!(
    /// Unique identifier for an inventory entry.
    ItemId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequential_ids_are_distinct_and_repeatable() {
        let mut a = SequentialIds::new();
        let mut b = SequentialIds::new();
        let first = CombatantId::generate(&mut a);
        let second = CombatantId::generate(&mut a);
        assert_ne!(first, second);
        assert_eq!(first, CombatantId::generate(&mut b));
    }

    #[test]
    fn test_random_ids_are_distinct() {
        let mut ids = RandomIds;
        assert_ne!(ConditionId::generate(&mut ids), ConditionId::generate(&mut ids));
    }
}
