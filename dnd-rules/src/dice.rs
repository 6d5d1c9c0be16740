//! D&D dice rolling system.
//!
//! Supports the `XdY+Z` notation used by weapon and spell data, flat numeric
//! bonuses, and d20 rolls with advantage/disadvantage. All randomness flows
//! through the [`RollSource`] trait so callers can inject a seeded or scripted
//! source.

use rand::rngs::{StdRng, ThreadRng};
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing::{debug, warn};

/// Error type for dice parsing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiceError {
    #[error("No dice specified")]
    Empty,
    #[error("Invalid dice notation: {0}")]
    InvalidNotation(String),
    #[error("Invalid die size: {0}")]
    InvalidDieSize(u32),
    #[error("Too many dice: {0} (at most {max})", max = MAX_DICE_COUNT)]
    TooManyDice(u32),
}

/// Largest dice count an expression may roll.
pub const MAX_DICE_COUNT: u32 = 100;
/// Largest die an expression may name.
pub const MAX_DIE_SIDES: u32 = 1000;

// ============================================================================
// Randomness
// ============================================================================

/// Produces uniformly distributed die faces.
pub trait RollSource {
    /// Roll a single die, returning a value in `[1, sides]`.
    fn roll_die(&mut self, sides: u32) -> u32;
}

impl<S: RollSource + ?Sized> RollSource for &mut S {
    fn roll_die(&mut self, sides: u32) -> u32 {
        (**self).roll_die(sides)
    }
}

impl<S: RollSource + ?Sized> RollSource for Box<S> {
    fn roll_die(&mut self, sides: u32) -> u32 {
        (**self).roll_die(sides)
    }
}

/// A [`RollSource`] backed by any `rand` generator.
#[derive(Debug, Clone)]
pub struct RandomRolls<R = ThreadRng> {
    rng: R,
}

impl RandomRolls<ThreadRng> {
    pub fn new() -> Self {
        Self {
            rng: rand::thread_rng(),
        }
    }
}

impl Default for RandomRolls<ThreadRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl RandomRolls<StdRng> {
    /// Reproducible rolls for replays and tests.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl<R: Rng> RandomRolls<R> {
    pub fn from_rng(rng: R) -> Self {
        Self { rng }
    }
}

impl<R: Rng> RollSource for RandomRolls<R> {
    fn roll_die(&mut self, sides: u32) -> u32 {
        self.rng.gen_range(1..=sides.max(1))
    }
}

/// Replays a scripted sequence of die faces.
///
/// Each value is clamped into `[1, sides]` of the die being rolled. Once the
/// script is exhausted the last value repeats.
#[derive(Debug, Clone, Default)]
pub struct FixedRolls {
    rolls: Vec<u32>,
    next: usize,
}

impl FixedRolls {
    pub fn new(rolls: impl IntoIterator<Item = u32>) -> Self {
        Self {
            rolls: rolls.into_iter().collect(),
            next: 0,
        }
    }

    /// Number of scripted values not yet consumed.
    pub fn remaining(&self) -> usize {
        self.rolls.len().saturating_sub(self.next)
    }
}

impl RollSource for FixedRolls {
    fn roll_die(&mut self, sides: u32) -> u32 {
        let value = self
            .rolls
            .get(self.next)
            .or_else(|| self.rolls.last())
            .copied()
            .unwrap_or(1);
        self.next = self.next.saturating_add(1);
        value.clamp(1, sides.max(1))
    }
}

// ============================================================================
// Die types
// ============================================================================

/// Standard D&D die types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DieType {
    D4,
    D6,
    D8,
    D10,
    D12,
    D20,
    D100,
}

impl DieType {
    pub fn sides(&self) -> u32 {
        match self {
            DieType::D4 => 4,
            DieType::D6 => 6,
            DieType::D8 => 8,
            DieType::D10 => 10,
            DieType::D12 => 12,
            DieType::D20 => 20,
            DieType::D100 => 100,
        }
    }

    pub fn from_sides(sides: u32) -> Option<DieType> {
        match sides {
            4 => Some(DieType::D4),
            6 => Some(DieType::D6),
            8 => Some(DieType::D8),
            10 => Some(DieType::D10),
            12 => Some(DieType::D12),
            20 => Some(DieType::D20),
            100 => Some(DieType::D100),
            _ => None,
        }
    }
}

impl fmt::Display for DieType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "d{}", self.sides())
    }
}

// ============================================================================
// d20 rolls
// ============================================================================

/// Advantage state for d20 rolls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Advantage {
    #[default]
    Normal,
    Advantage,
    Disadvantage,
}

impl Advantage {
    /// Build from the two independent UI toggles. Both set cancel out.
    pub fn from_flags(advantage: bool, disadvantage: bool) -> Advantage {
        match (advantage, disadvantage) {
            (true, false) => Advantage::Advantage,
            (false, true) => Advantage::Disadvantage,
            _ => Advantage::Normal,
        }
    }

    /// Combine two advantage states (advantage + disadvantage = normal).
    pub fn combine(self, other: Advantage) -> Advantage {
        match (self, other) {
            (Advantage::Normal, x) | (x, Advantage::Normal) => x,
            (Advantage::Advantage, Advantage::Disadvantage) => Advantage::Normal,
            (Advantage::Disadvantage, Advantage::Advantage) => Advantage::Normal,
            (Advantage::Advantage, Advantage::Advantage) => Advantage::Advantage,
            (Advantage::Disadvantage, Advantage::Disadvantage) => Advantage::Disadvantage,
        }
    }
}

/// A single d20 roll, possibly made with advantage or disadvantage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct D20Roll {
    pub mode: Advantage,
    /// Every die rolled, in order. Two entries when advantage/disadvantage applied.
    pub rolls: Vec<u32>,
    /// The face that counts.
    pub natural: u32,
}

impl D20Roll {
    pub fn is_natural_20(&self) -> bool {
        self.natural == 20
    }

    pub fn is_natural_1(&self) -> bool {
        self.natural == 1
    }
}

/// Roll a d20 from the two advantage toggles.
pub fn roll_d20<S: RollSource>(rng: &mut S, advantage: bool, disadvantage: bool) -> D20Roll {
    roll_d20_with(rng, Advantage::from_flags(advantage, disadvantage))
}

/// Roll a d20 with a resolved advantage state.
pub fn roll_d20_with<S: RollSource>(rng: &mut S, mode: Advantage) -> D20Roll {
    let first = rng.roll_die(20);
    let (rolls, natural) = match mode {
        Advantage::Normal => (vec![first], first),
        Advantage::Advantage => {
            let second = rng.roll_die(20);
            (vec![first, second], first.max(second))
        }
        Advantage::Disadvantage => {
            let second = rng.roll_die(20);
            (vec![first, second], first.min(second))
        }
    };
    debug!(?mode, ?rolls, natural, "rolled d20");
    D20Roll {
        mode,
        rolls,
        natural,
    }
}

// ============================================================================
// Dice expressions
// ============================================================================

/// What to do with dice notation that does not parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MalformedDice {
    /// Degrade to an all-zero expression.
    #[default]
    Zero,
    /// Surface a [`DiceError`].
    Reject,
}

/// A parsed `<count>d<sides>[+|-<bonus>]` expression.
///
/// A flat number has `count == 0` and `sides == 0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct DiceExpression {
    pub count: u32,
    pub sides: u32,
    pub bonus: i32,
}

impl DiceExpression {
    /// Zero dice of any size collapse to a flat bonus.
    pub fn new(count: u32, sides: u32, bonus: i32) -> Self {
        if count == 0 || sides == 0 {
            Self::flat(bonus)
        } else {
            Self {
                count,
                sides,
                bonus,
            }
        }
    }

    pub fn flat(bonus: i32) -> Self {
        Self {
            count: 0,
            sides: 0,
            bonus,
        }
    }

    /// Parse leniently: malformed input yields the all-zero expression.
    pub fn parse(notation: &str) -> Self {
        match Self::parse_strict(notation) {
            Ok(expr) => expr,
            Err(err) => {
                warn!(notation, %err, "malformed dice expression treated as zero");
                Self::default()
            }
        }
    }

    /// Parse under an explicit policy.
    pub fn parse_with(notation: &str, policy: MalformedDice) -> Result<Self, DiceError> {
        match policy {
            MalformedDice::Zero => Ok(Self::parse(notation)),
            MalformedDice::Reject => Self::parse_strict(notation),
        }
    }

    /// Parse, reporting why the notation is invalid.
    pub fn parse_strict(notation: &str) -> Result<Self, DiceError> {
        let cleaned: String = notation
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_lowercase();
        if cleaned.is_empty() {
            return Err(DiceError::Empty);
        }

        let invalid = || DiceError::InvalidNotation(notation.trim().to_string());

        let Some(d_pos) = cleaned.find('d') else {
            let bonus = parse_signed(&cleaned).ok_or_else(invalid)?;
            return Ok(Self::flat(bonus));
        };

        let count = parse_unsigned(&cleaned[..d_pos]).ok_or_else(invalid)?;
        let rest = &cleaned[d_pos + 1..];
        let (sides_str, bonus) = match rest.find(|c: char| c == '+' || c == '-') {
            Some(pos) => (&rest[..pos], parse_signed(&rest[pos..]).ok_or_else(invalid)?),
            None => (rest, 0),
        };
        let sides = parse_unsigned(sides_str).ok_or_else(invalid)?;
        if sides == 0 || sides > MAX_DIE_SIDES {
            return Err(DiceError::InvalidDieSize(sides));
        }
        if count > MAX_DICE_COUNT {
            return Err(DiceError::TooManyDice(count));
        }

        Ok(Self::new(count, sides, bonus))
    }

    pub fn is_flat(&self) -> bool {
        self.count == 0
    }

    /// Roll only the dice, without the bonus.
    ///
    /// Hand-built expressions beyond the parse limits roll at most
    /// [`MAX_DICE_COUNT`] dice of at most [`MAX_DIE_SIDES`] sides.
    pub fn roll_dice<S: RollSource>(&self, rng: &mut S) -> Vec<u32> {
        let sides = self.sides.min(MAX_DIE_SIDES);
        (0..self.count.min(MAX_DICE_COUNT))
            .map(|_| rng.roll_die(sides))
            .collect()
    }

    pub fn roll<S: RollSource>(&self, rng: &mut S) -> DiceRoll {
        let rolls = self.roll_dice(rng);
        let total = saturate(sum_faces(&rolls) + i64::from(self.bonus));
        debug!(expression = %self, ?rolls, total, "rolled dice");
        DiceRoll {
            expression: *self,
            rolls,
            total,
        }
    }

    pub fn min(&self) -> i32 {
        saturate(i64::from(self.count) + i64::from(self.bonus))
    }

    pub fn max(&self) -> i32 {
        saturate(i64::from(self.count) * i64::from(self.sides) + i64::from(self.bonus))
    }

    /// Expected total, rounded down.
    pub fn average(&self) -> i32 {
        let dice = i64::from(self.count) * (i64::from(self.sides) + 1) / 2;
        saturate(dice + i64::from(self.bonus))
    }
}

/// Sum die faces without overflow.
pub(crate) fn sum_faces<'a>(faces: impl IntoIterator<Item = &'a u32>) -> i64 {
    faces.into_iter().map(|&f| i64::from(f)).sum()
}

/// Clamp a wide total into `i32`.
pub(crate) fn saturate(total: i64) -> i32 {
    total.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}

fn parse_unsigned(s: &str) -> Option<u32> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

fn parse_signed(s: &str) -> Option<i32> {
    let digits = s.strip_prefix(['+', '-']).unwrap_or(s);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

impl FromStr for DiceExpression {
    type Err = DiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DiceExpression::parse_strict(s)
    }
}

impl fmt::Display for DiceExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_flat() {
            return write!(f, "{}", self.bonus);
        }
        write!(f, "{}d{}", self.count, self.sides)?;
        match self.bonus {
            0 => Ok(()),
            b if b > 0 => write!(f, "+{b}"),
            b => write!(f, "{b}"),
        }
    }
}

/// Result of rolling a dice expression.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiceRoll {
    pub expression: DiceExpression,
    pub rolls: Vec<u32>,
    pub total: i32,
}

impl fmt::Display for DiceRoll {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let faces = self
            .rolls
            .iter()
            .map(|r| r.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        match self.expression.bonus {
            0 => write!(f, "[{faces}] = {}", self.total),
            b if b > 0 => write!(f, "[{faces}] + {b} = {}", self.total),
            b => write!(f, "[{faces}] - {} = {}", b.abs(), self.total),
        }
    }
}
