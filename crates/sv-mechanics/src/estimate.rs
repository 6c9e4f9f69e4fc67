//! Heuristic expected-damage estimates.
//!
//! Uses average dice values and exact per-face probabilities under the
//! same modifier rules the resolver applies. Nothing here rolls a die and
//! resolution never consults an estimate. Overkill is ignored: every
//! unsaved wound is assumed to deal its full damage.

use std::fmt;

use serde::{Deserialize, Serialize};
use sv_core::{Unit, WeaponAbilities, WeaponProfile};

use crate::allocate::{self, AllocationMode};
use crate::catalog::Capabilities;
use crate::combat::Assignment;
use crate::modifier::{CheckKind, ModifiedRoll, ModifierSet, succeeds};
use crate::save::{self, SaveKind, WoundContext};
use crate::wound::wound_threshold;

/// Expected values for one assignment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Estimate {
    /// Expected attacks.
    pub attacks: f64,
    /// Expected hits, including sustained and lethal hits.
    pub hits: f64,
    /// Expected ordinary wounds.
    pub wounds: f64,
    /// Expected mortal wounds from Devastating Wounds.
    pub mortal_wounds: f64,
    /// Expected wounds that get through saves, mortal wounds included.
    pub unsaved: f64,
    /// Expected damage after Feel No Pain.
    pub damage: f64,
}

impl fmt::Display for Estimate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:.2} attacks, {:.2} hits, {:.2} wounds, {:.2} unsaved, {:.2} damage",
            self.attacks, self.hits, self.wounds, self.unsaved, self.damage
        )
    }
}

/// Chance that one die passes, and chance that it is critical.
///
/// `critical_at` is the lowest unmodified value that counts as critical;
/// critical results always pass. Re-rolls follow [`crate::modifier::apply`].
pub fn chance(threshold: u8, mods: ModifierSet, kind: CheckKind, critical_at: u8) -> (f64, f64) {
    let face = |value: u32| -> (f64, f64) {
        let roll = ModifiedRoll {
            original: value,
            reroll: None,
            reroll_value: None,
            modifier: mods.net(),
            modified: value as i32 + mods.net(),
        };
        let critical = value >= u32::from(critical_at);
        let pass = critical || succeeds(&roll, threshold, kind);
        (f64::from(u8::from(pass)), f64::from(u8::from(critical)))
    };

    let mut pass = 0.0;
    let mut critical = 0.0;
    for raw in 1..=6u32 {
        let reroll = (raw == 1 && mods.contains(ModifierSet::REROLL_ONES))
            || (raw < u32::from(threshold) && mods.contains(ModifierSet::REROLL_FAILED));
        if reroll {
            for value in 1..=6 {
                let (p, c) = face(value);
                pass += p / 36.0;
                critical += c / 36.0;
            }
        } else {
            let (p, c) = face(raw);
            pass += p / 6.0;
            critical += c / 6.0;
        }
    }
    (pass, critical)
}

/// Estimate one assignment of `weapon` from `attacker` against `target`.
///
/// Listed models that are unknown or dead are not counted.
pub fn estimate(
    weapon: &WeaponProfile,
    attacker: &Unit,
    target: &Unit,
    assignment: &Assignment,
) -> Estimate {
    let caps = Capabilities::of(weapon);
    let shooters = assignment
        .model_ids
        .iter()
        .filter_map(|id| attacker.model(id))
        .filter(|m| m.is_alive())
        .count() as f64;
    if shooters == 0.0 || target.is_destroyed() {
        return Estimate::default();
    }

    let mut attacks = shooters * weapon.attacks.average();
    if assignment.within_half_range {
        attacks += shooters * f64::from(caps.rapid_fire);
    }
    if caps.has(WeaponAbilities::BLAST) {
        attacks += shooters * f64::from(target.alive_count() as u32 / 5);
    }

    let (p_hit, p_crit_hit) = if caps.has(WeaponAbilities::TORRENT) {
        (1.0, 0.0)
    } else {
        let mut mods = assignment.hit_modifiers;
        if caps.has(WeaponAbilities::HEAVY) && attacker.flags.remained_stationary {
            mods |= ModifierSet::PLUS_ONE;
        }
        if !caps.melee && target.has_stealth() {
            mods |= ModifierSet::MINUS_ONE;
        }
        chance(weapon.skill.clamp(2, 6), mods, CheckKind::Hit, 6)
    };
    let criticals = attacks * p_crit_hit;
    let lethal = if caps.has(WeaponAbilities::LETHAL_HITS) {
        criticals
    } else {
        0.0
    };
    let sustained = caps
        .sustained_hits
        .as_ref()
        .map_or(0.0, |x| criticals * x.average());
    let rolled_hits = attacks * p_hit - lethal + sustained;

    let mut mods = assignment.wound_modifiers;
    if caps.has(WeaponAbilities::LANCE) && attacker.flags.charged_this_turn {
        mods |= ModifierSet::PLUS_ONE;
    }
    if caps.has(WeaponAbilities::TWIN_LINKED) {
        mods |= ModifierSet::REROLL_FAILED;
    }
    let (p_wound, p_crit_wound) = chance(
        wound_threshold(weapon.strength, target.stats.toughness),
        mods,
        CheckKind::Wound,
        caps.critical_wound_threshold(target),
    );
    let (wounds, mortal_wounds) = if caps.has(WeaponAbilities::DEVASTATING_WOUNDS) {
        let mortal = rolled_hits * p_crit_wound;
        (rolled_hits * p_wound - mortal + lethal, mortal)
    } else {
        (rolled_hits * p_wound + lethal, 0.0)
    };

    let saves = save::build(target, weapon, WoundContext::default());
    let p_fail = allocate::current_target(&target.models, AllocationMode::Normal, &[])
        .and_then(|i| saves.entry(i))
        .filter(|e| e.kind != SaveKind::None)
        .map_or(1.0, |e| {
            1.0 - chance(e.threshold, ModifierSet::empty(), CheckKind::Save, 7).0
        });
    let unsaved = wounds * p_fail + mortal_wounds;

    let melta = if assignment.within_half_range {
        f64::from(caps.melta)
    } else {
        0.0
    };
    let per_wound = weapon.damage.average() + melta;
    let kept = target
        .stats
        .feel_no_pain
        .filter(|v| (2..=6).contains(v))
        .map_or(1.0, |v| f64::from(v - 1) / 6.0);

    Estimate {
        attacks,
        hits: rolled_hits + lethal,
        wounds,
        mortal_wounds,
        unsaved,
        damage: unsaved * per_wound * kept,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sv_core::{DiceExpr, Die, StatBlock};

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn units(target_stats: StatBlock) -> (Unit, Unit) {
        let attacker = Unit::new("a", "A", "p1").with_models("a", 2);
        let target = Unit::new("b", "B", "p2")
            .with_stats(target_stats)
            .with_models("b", 5);
        (attacker, target)
    }

    #[test]
    fn plain_chances() {
        assert!(close(chance(4, ModifierSet::empty(), CheckKind::Hit, 6).0, 0.5));
        assert!(close(chance(4, ModifierSet::empty(), CheckKind::Hit, 6).1, 1.0 / 6.0));
        assert!(close(chance(2, ModifierSet::PLUS_ONE, CheckKind::Wound, 6).0, 5.0 / 6.0));
        assert!(close(chance(6, ModifierSet::MINUS_ONE, CheckKind::Hit, 6).0, 1.0 / 6.0));
        assert!(close(chance(3, ModifierSet::empty(), CheckKind::Save, 7).1, 0.0));
    }

    #[test]
    fn rerolls_improve_the_odds() {
        let (p, _) = chance(4, ModifierSet::REROLL_FAILED, CheckKind::Wound, 6);
        assert!(close(p, 0.75));
        let (p, _) = chance(4, ModifierSet::REROLL_ONES, CheckKind::Wound, 6);
        assert!(close(p, 0.5 + 0.5 / 6.0));
    }

    #[test]
    fn anti_makes_low_rolls_critical() {
        let (p, c) = chance(6, ModifierSet::empty(), CheckKind::Wound, 4);
        assert!(close(p, 0.5));
        assert!(close(c, 0.5));
    }

    #[test]
    fn two_bolter_shots() {
        let weapon = WeaponProfile::new("bolter", "Bolter")
            .with_range(24)
            .with_skill(4)
            .with_ap(-1);
        let (attacker, target) = units(StatBlock {
            save: 3,
            ..StatBlock::default()
        });
        let assignment = Assignment::new("b", "bolter").with_models(["a1", "a2"]);
        let e = estimate(&weapon, &attacker, &target, &assignment);
        assert!(close(e.attacks, 2.0));
        assert!(close(e.hits, 1.0));
        assert!(close(e.wounds, 0.5));
        assert!(close(e.unsaved, 0.25));
        assert!(close(e.damage, 0.25));
    }

    #[test]
    fn torrent_and_average_damage() {
        let weapon = WeaponProfile::new("flamer", "Flamer")
            .with_range(12)
            .with_attacks(DiceExpr::dice(1, Die::D6))
            .with_damage(DiceExpr::dice(1, Die::D3))
            .with_special_rules("Torrent");
        let (attacker, target) = units(StatBlock {
            save: 7,
            ..StatBlock::default()
        });
        let assignment = Assignment::new("b", "flamer").with_models(["a1"]);
        let e = estimate(&weapon, &attacker, &target, &assignment);
        assert!(close(e.hits, 3.5));
        assert!(close(e.wounds, 1.75));
        assert!(close(e.unsaved, 1.75));
        assert!(close(e.damage, 3.5));
    }

    #[test]
    fn no_models_means_nothing() {
        let weapon = WeaponProfile::new("bolter", "Bolter");
        let (attacker, target) = units(StatBlock::default());
        let e = estimate(&weapon, &attacker, &target, &Assignment::new("b", "bolter"));
        assert_eq!(e, Estimate::default());
    }
}
