//! Random source and dice rolling.
//!
//! Every die the engine rolls goes through a [`RandomSource`] owned by or
//! injected into the caller. There is no ambient generator: the same seed
//! and the same call sequence always reproduce the same rolls.

pub mod source;

pub use source::{ScriptedDice, SeededDice};

use serde::{Deserialize, Serialize};
use sv_core::DiceExpr;
use sv_core::dice::clamp_total;

/// A stream of die results.
pub trait RandomSource {
    /// Roll one die with `faces` sides, returning 1..=faces.
    fn roll(&mut self, faces: u32) -> u32;

    /// Roll `count` dice with `faces` sides each, in order.
    fn roll_n(&mut self, count: u32, faces: u32) -> Vec<u32> {
        (0..count).map(|_| self.roll(faces)).collect()
    }

    /// Roll one six-sided die.
    fn d6(&mut self) -> u32 {
        self.roll(6)
    }
}

impl<R: RandomSource + ?Sized> RandomSource for &mut R {
    fn roll(&mut self, faces: u32) -> u32 {
        (**self).roll(faces)
    }
}

/// The outcome of rolling a [`DiceExpr`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExprRoll {
    /// Individual die values (empty for fixed expressions).
    pub dice: Vec<u32>,
    /// Sum of the dice plus the modifier, floored at 0.
    pub total: u32,
}

/// Roll a dice expression for real. Fixed values consume no dice.
pub fn roll_expr<R: RandomSource + ?Sized>(expr: &DiceExpr, rng: &mut R) -> ExprRoll {
    let dice = match expr.die {
        Some(die) if expr.count > 0 => rng.roll_n(expr.count, die.sides()),
        _ => Vec::new(),
    };
    let sum: i64 = dice.iter().map(|&d| i64::from(d)).sum::<i64>() + i64::from(expr.modifier);
    ExprRoll {
        total: clamp_total(sum),
        dice,
    }
}
