//! Dice types and dice expressions.
//!
//! A weapon's attack count and damage are either fixed numbers or dice
//! expressions such as `D3`, `2D6`, or `D6+1`. This module only describes
//! and parses them; rolling lives with the random source in the mechanics
//! crate. [`DiceExpr::average`] is a heuristic estimate for scoring and is
//! never used in place of a real roll.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// A die type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Die {
    /// Three-sided die (in play, a halved D6).
    D3,
    /// Six-sided die.
    D6,
    /// A die with a custom number of sides.
    Custom(u32),
}

impl Die {
    /// Returns the number of sides on this die.
    pub fn sides(self) -> u32 {
        match self {
            Self::D3 => 3,
            Self::D6 => 6,
            Self::Custom(n) => n,
        }
    }

    /// Build a die from a side count.
    pub fn from_sides(sides: u32) -> Option<Self> {
        match sides {
            0 | 1 => None,
            3 => Some(Self::D3),
            6 => Some(Self::D6),
            n => Some(Self::Custom(n)),
        }
    }

    /// Parse a die from a string like "d6", "D3".
    pub fn from_str_tag(s: &str) -> Option<Self> {
        let s = s.trim().to_lowercase();
        let sides = s.strip_prefix('d')?.parse::<u32>().ok()?;
        Self::from_sides(sides)
    }
}

impl fmt::Display for Die {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "D{}", self.sides())
    }
}

/// A fixed value or `count` dice plus a flat modifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DiceExpr {
    /// Number of dice rolled (0 for a fixed value).
    pub count: u32,
    /// The die rolled, if any.
    pub die: Option<Die>,
    /// Flat value added after rolling (the whole value when fixed).
    pub modifier: i32,
}

impl DiceExpr {
    /// A fixed value with no dice. Values past `i32::MAX` saturate.
    pub fn fixed(value: u32) -> Self {
        Self {
            count: 0,
            die: None,
            modifier: i32::try_from(value).unwrap_or(i32::MAX),
        }
    }

    /// `count` dice of the given type.
    pub fn dice(count: u32, die: Die) -> Self {
        Self {
            count,
            die: Some(die),
            modifier: 0,
        }
    }

    /// Add a flat modifier.
    pub fn with_modifier(mut self, modifier: i32) -> Self {
        self.modifier = modifier;
        self
    }

    /// Parse an expression like "3", "D3", "2D6", "D6+1" or "d3 - 1".
    pub fn parse(input: &str) -> CoreResult<Self> {
        let invalid = || CoreError::InvalidDice(input.to_string());
        let s: String = input
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_uppercase();
        if s.is_empty() {
            return Err(invalid());
        }

        let Some((count_part, rest)) = s.split_once('D') else {
            let value = s.parse::<u32>().map_err(|_| invalid())?;
            i32::try_from(value).map_err(|_| invalid())?;
            return Ok(Self::fixed(value));
        };

        let count = if count_part.is_empty() {
            1
        } else {
            count_part.parse::<u32>().map_err(|_| invalid())?
        };

        let (sides_part, modifier) = match rest.find(['+', '-']) {
            Some(pos) => {
                let (sides, tail) = rest.split_at(pos);
                let magnitude = tail[1..]
                    .parse::<u32>()
                    .ok()
                    .and_then(|m| i32::try_from(m).ok())
                    .ok_or_else(invalid)?;
                let sign = if tail.starts_with('-') { -1 } else { 1 };
                (sides, sign * magnitude)
            }
            None => (rest, 0),
        };

        let sides = sides_part.parse::<u32>().map_err(|_| invalid())?;
        let die = Die::from_sides(sides).ok_or_else(invalid)?;
        if count == 0 {
            return Err(invalid());
        }

        Ok(Self {
            count,
            die: Some(die),
            modifier,
        })
    }

    /// Returns true if the expression involves no dice.
    pub fn is_fixed(&self) -> bool {
        self.die.is_none() || self.count == 0
    }

    /// The smallest value the expression can produce (never below 0).
    pub fn min(&self) -> u32 {
        let dice = if self.is_fixed() { 0 } else { i64::from(self.count) };
        clamp_total(dice + i64::from(self.modifier))
    }

    /// The largest value the expression can produce (never below 0).
    pub fn max(&self) -> u32 {
        let dice = match self.die {
            Some(die) if self.count > 0 => i64::from(self.count).saturating_mul(i64::from(die.sides())),
            _ => 0,
        };
        clamp_total(dice.saturating_add(i64::from(self.modifier)))
    }

    /// Heuristic mean value, e.g. D3 = 2.0, D6+1 = 4.5.
    ///
    /// Only for scoring and estimates; resolution always rolls.
    pub fn average(&self) -> f64 {
        let dice = match self.die {
            Some(die) if self.count > 0 => f64::from(self.count) * (f64::from(die.sides()) + 1.0) / 2.0,
            _ => 0.0,
        };
        (dice + f64::from(self.modifier)).max(0.0)
    }
}

/// Floor a signed total at zero and cap it at `u32::MAX`.
pub fn clamp_total(total: i64) -> u32 {
    u32::try_from(total.max(0)).unwrap_or(u32::MAX)
}

impl Default for DiceExpr {
    fn default() -> Self {
        Self::fixed(1)
    }
}

impl fmt::Display for DiceExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.die {
            Some(die) if self.count > 0 => {
                if self.count > 1 {
                    write!(f, "{}", self.count)?;
                }
                write!(f, "{die}")?;
                match self.modifier {
                    0 => Ok(()),
                    m if m > 0 => write!(f, "+{m}"),
                    m => write!(f, "{m}"),
                }
            }
            _ => write!(f, "{}", self.modifier.max(0)),
        }
    }
}

impl FromStr for DiceExpr {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for DiceExpr {
    type Error = CoreError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<DiceExpr> for String {
    fn from(expr: DiceExpr) -> Self {
        expr.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn die_from_str() {
        assert_eq!(Die::from_str_tag("d6"), Some(Die::D6));
        assert_eq!(Die::from_str_tag("D3"), Some(Die::D3));
        assert_eq!(Die::from_str_tag("d12"), Some(Die::Custom(12)));
        assert_eq!(Die::from_str_tag("d1"), None);
        assert_eq!(Die::from_str_tag("foo"), None);
    }

    #[test]
    fn parse_fixed() {
        let e = DiceExpr::parse("3").unwrap();
        assert!(e.is_fixed());
        assert_eq!(e.min(), 3);
        assert_eq!(e.max(), 3);
    }

    #[test]
    fn parse_dice_forms() {
        assert_eq!(DiceExpr::parse("D3").unwrap(), DiceExpr::dice(1, Die::D3));
        assert_eq!(DiceExpr::parse("2d6").unwrap(), DiceExpr::dice(2, Die::D6));
        assert_eq!(
            DiceExpr::parse("D6 + 1").unwrap(),
            DiceExpr::dice(1, Die::D6).with_modifier(1)
        );
        assert_eq!(
            DiceExpr::parse("d3-1").unwrap(),
            DiceExpr::dice(1, Die::D3).with_modifier(-1)
        );
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(DiceExpr::parse("").is_err());
        assert!(DiceExpr::parse("xD6").is_err());
        assert!(DiceExpr::parse("D").is_err());
        assert!(DiceExpr::parse("0D6").is_err());
        assert!(DiceExpr::parse("D6+").is_err());
        assert!(DiceExpr::parse("-2").is_err());
        assert!(DiceExpr::parse("D6+-5").is_err());
        assert!(DiceExpr::parse("D6--1").is_err());
    }

    #[test]
    fn parse_rejects_values_past_i32() {
        assert!(DiceExpr::parse("2147483648").is_err());
        assert!(DiceExpr::parse("D6+2147483648").is_err());
        assert_eq!(DiceExpr::parse("2147483647").unwrap().max(), 2_147_483_647);
        assert_eq!(DiceExpr::fixed(u32::MAX).modifier, i32::MAX);
    }

    #[test]
    fn bounds_do_not_overflow() {
        let e = DiceExpr::dice(u32::MAX, Die::Custom(u32::MAX)).with_modifier(i32::MAX);
        assert_eq!(e.max(), u32::MAX);
        let e = DiceExpr::dice(1, Die::D6).with_modifier(i32::MIN);
        assert_eq!(e.min(), 0);
    }

    #[test]
    fn averages() {
        assert!((DiceExpr::parse("D3").unwrap().average() - 2.0).abs() < f64::EPSILON);
        assert!((DiceExpr::parse("D6+1").unwrap().average() - 4.5).abs() < f64::EPSILON);
        assert!((DiceExpr::parse("2D6").unwrap().average() - 7.0).abs() < f64::EPSILON);
        assert!((DiceExpr::fixed(2).average() - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn bounds_floor_at_zero() {
        let e = DiceExpr::parse("D3-2").unwrap();
        assert_eq!(e.min(), 0);
        assert_eq!(e.max(), 1);
    }

    #[test]
    fn display_round_trips_text() {
        for text in ["3", "D3", "2D6", "D6+1", "D3-1"] {
            assert_eq!(DiceExpr::parse(text).unwrap().to_string(), text);
        }
    }

    #[test]
    fn serde_uses_text_form() {
        let e: DiceExpr = serde_json::from_str("\"D6+2\"").unwrap();
        assert_eq!(e, DiceExpr::dice(1, Die::D6).with_modifier(2));
        assert_eq!(serde_json::to_string(&e).unwrap(), "\"D6+2\"");
    }
}
