//! Roll modifiers and the modifier-stacking law.
//!
//! A [`ModifierSet`] is a union of toggles: +1, -1, re-roll ones, re-roll
//! failures. [`apply`] performs at most one re-roll (ones take priority),
//! then adds the net modifier, which is always -1, 0 or +1. The result is
//! deliberately not clamped to the die range: a 7 or a 0 is a valid
//! intermediate value. Auto-fail and auto-success are judged by
//! [`succeeds`] against the unmodified (post-re-roll) value.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::dice::RandomSource;

bitflags! {
    /// Independent modifier toggles, combinable by union.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct ModifierSet: u8 {
        /// +1 to the roll.
        const PLUS_ONE      = 1 << 0;
        /// -1 to the roll.
        const MINUS_ONE     = 1 << 1;
        /// Re-roll an unmodified 1.
        const REROLL_ONES   = 1 << 2;
        /// Re-roll a roll below the threshold.
        const REROLL_FAILED = 1 << 3;
    }
}

impl ModifierSet {
    /// Net modifier, clamped to -1..=1. +1 and -1 together cancel.
    pub fn net(self) -> i32 {
        let mut net = 0;
        if self.contains(Self::PLUS_ONE) {
            net += 1;
        }
        if self.contains(Self::MINUS_ONE) {
            net -= 1;
        }
        net.clamp(-1, 1)
    }

    /// Returns true if any re-roll toggle is set.
    pub fn has_reroll(self) -> bool {
        self.intersects(Self::REROLL_ONES | Self::REROLL_FAILED)
    }
}

/// Which re-roll rule fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RerollKind {
    /// An unmodified 1 was re-rolled.
    Ones,
    /// A roll below the threshold was re-rolled.
    Failed,
}

/// A die result after re-rolls and modifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModifiedRoll {
    /// The first value rolled.
    pub original: u32,
    /// The re-roll rule that fired, if any.
    pub reroll: Option<RerollKind>,
    /// The replacement value, if re-rolled.
    pub reroll_value: Option<u32>,
    /// Net modifier applied (-1, 0 or +1).
    pub modifier: i32,
    /// Unmodified value plus the modifier; may fall outside 1..=6.
    pub modified: i32,
}

impl ModifiedRoll {
    /// The value auto-fail/auto-success rules look at: the re-roll if one happened.
    pub fn unmodified(&self) -> u32 {
        self.reroll_value.unwrap_or(self.original)
    }

    /// Returns true if a re-roll happened.
    pub fn rerolled(&self) -> bool {
        self.reroll_value.is_some()
    }
}

/// Apply re-rolls and the net modifier to a raw die.
///
/// Re-roll ones wins over re-roll failed when the die shows a 1. Re-roll
/// failed compares the raw value with `threshold`. At most one re-roll.
pub fn apply<R: RandomSource + ?Sized>(
    raw: u32,
    mods: ModifierSet,
    threshold: u8,
    rng: &mut R,
) -> ModifiedRoll {
    let reroll = if raw == 1 && mods.contains(ModifierSet::REROLL_ONES) {
        Some(RerollKind::Ones)
    } else if raw < u32::from(threshold) && mods.contains(ModifierSet::REROLL_FAILED) {
        Some(RerollKind::Failed)
    } else {
        None
    };
    let reroll_value = reroll.map(|_| rng.d6());
    let modifier = mods.net();
    let unmodified = reroll_value.unwrap_or(raw);

    ModifiedRoll {
        original: raw,
        reroll,
        reroll_value,
        modifier,
        modified: unmodified as i32 + modifier,
    }
}

/// The kind of check a roll is made for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckKind {
    /// A hit roll: an unmodified 6 always succeeds.
    Hit,
    /// A wound roll.
    Wound,
    /// A saving throw.
    Save,
}

/// Judge a modified roll against a threshold.
///
/// An unmodified 1 always fails. For hit rolls an unmodified 6 always
/// succeeds. Otherwise the modified value must reach the threshold.
pub fn succeeds(roll: &ModifiedRoll, threshold: u8, kind: CheckKind) -> bool {
    let natural = roll.unmodified();
    if natural <= 1 {
        return false;
    }
    if kind == CheckKind::Hit && natural >= 6 {
        return true;
    }
    roll.modified >= i32::from(threshold)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dice::ScriptedDice;
    use proptest::prelude::*;

    fn no_dice() -> ScriptedDice {
        ScriptedDice::default()
    }

    #[test]
    fn plus_and_minus_cancel() {
        let mods = ModifierSet::PLUS_ONE | ModifierSet::MINUS_ONE;
        assert_eq!(mods.net(), 0);
        let roll = apply(4, mods, 4, &mut no_dice());
        assert_eq!(roll.modified, 4);
        assert_eq!(roll.modifier, 0);
    }

    #[test]
    fn modified_value_is_not_clamped() {
        let roll = apply(6, ModifierSet::PLUS_ONE, 3, &mut no_dice());
        assert_eq!(roll.modified, 7);
        let roll = apply(1, ModifierSet::MINUS_ONE, 3, &mut no_dice());
        assert_eq!(roll.modified, 0);
    }

    #[test]
    fn unmodified_one_fails_wound_despite_plus_one_at_two_plus() {
        let roll = apply(1, ModifierSet::PLUS_ONE, 2, &mut no_dice());
        assert_eq!(roll.modified, 2);
        assert!(!succeeds(&roll, 2, CheckKind::Wound));
    }

    #[test]
    fn unmodified_six_hits_despite_minus_one() {
        let roll = apply(6, ModifierSet::MINUS_ONE, 6, &mut no_dice());
        assert_eq!(roll.modified, 5);
        assert!(succeeds(&roll, 6, CheckKind::Hit));
        assert!(!succeeds(&roll, 6, CheckKind::Save));
    }

    #[test]
    fn reroll_ones_takes_priority_and_auto_fail_uses_new_value() {
        let mods = ModifierSet::REROLL_ONES | ModifierSet::REROLL_FAILED;
        let mut rng = ScriptedDice::new([1]);
        let roll = apply(1, mods | ModifierSet::PLUS_ONE, 2, &mut rng);
        assert_eq!(roll.reroll, Some(RerollKind::Ones));
        assert_eq!(roll.unmodified(), 1);
        assert!(!succeeds(&roll, 2, CheckKind::Wound));

        let mut rng = ScriptedDice::new([5]);
        let roll = apply(1, mods, 4, &mut rng);
        assert_eq!(roll.reroll, Some(RerollKind::Ones));
        assert_eq!(roll.original, 1);
        assert_eq!(roll.unmodified(), 5);
        assert!(succeeds(&roll, 4, CheckKind::Wound));
    }

    #[test]
    fn reroll_failed_only_below_threshold() {
        let mut rng = ScriptedDice::new([6]);
        let roll = apply(3, ModifierSet::REROLL_FAILED, 4, &mut rng);
        assert_eq!(roll.reroll, Some(RerollKind::Failed));
        assert_eq!(roll.unmodified(), 6);

        let mut rng = ScriptedDice::new([6]);
        let roll = apply(4, ModifierSet::REROLL_FAILED, 4, &mut rng);
        assert!(!roll.rerolled());
        assert_eq!(rng.remaining(), 1);
    }

    #[test]
    fn reroll_ones_ignores_other_failures() {
        let mut rng = ScriptedDice::new([6]);
        let roll = apply(2, ModifierSet::REROLL_ONES, 4, &mut rng);
        assert!(!roll.rerolled());
        assert!(!succeeds(&roll, 4, CheckKind::Hit));
    }

    fn any_mods() -> impl Strategy<Value = ModifierSet> {
        (0u8..16).prop_map(ModifierSet::from_bits_truncate)
    }

    proptest! {
        #[test]
        fn net_is_always_clamped(mods in any_mods()) {
            prop_assert!((-1..=1).contains(&mods.net()));
        }

        #[test]
        fn unmodified_one_never_succeeds(
            mods in any_mods(),
            threshold in 2u8..=6,
            first in 1u32..=6,
        ) {
            let mut rng = ScriptedDice::new([1]);
            let roll = apply(first, mods, threshold, &mut rng);
            if roll.unmodified() == 1 {
                for kind in [CheckKind::Hit, CheckKind::Wound, CheckKind::Save] {
                    prop_assert!(!succeeds(&roll, threshold, kind));
                }
            }
        }

        #[test]
        fn unmodified_six_always_hits(mods in any_mods(), threshold in 2u8..=6) {
            let mut rng = ScriptedDice::new([6]);
            let roll = apply(6, mods, threshold, &mut rng);
            prop_assert_eq!(roll.unmodified(), 6);
            prop_assert!(succeeds(&roll, threshold, CheckKind::Hit));
        }

        #[test]
        fn at_most_one_reroll(mods in any_mods(), raw in 1u32..=6, threshold in 2u8..=6) {
            let mut rng = ScriptedDice::new([1, 1, 1]);
            apply(raw, mods, threshold, &mut rng);
            prop_assert!(rng.drawn() <= 1);
        }
    }
}
