//! The per-assignment attack sequence: attacks, hit, wound, save, damage.

use std::collections::HashSet;

use sv_core::load::NO_SAVE;
use sv_core::{Board, Unit, UnitId, WeaponAbilities, WeaponProfile};
use tracing::{debug, trace};

use crate::allocate::{self, AllocationMode};
use crate::catalog::{Capabilities, WeaponCatalog};
use crate::config::EngineConfig;
use crate::dice::{RandomSource, roll_expr};
use crate::error::{MechError, MechResult};
use crate::modifier::{self, CheckKind, ModifierSet};
use crate::save::{self, SaveKind, WoundContext};
use crate::wound::wound_threshold;

use super::action::{Action, Assignment};
use super::record::{Reroll, RollRecord, Stage};
use super::result::{AssignmentOutcome, Summary};

/// A validated assignment, ready to roll.
#[derive(Debug, Clone)]
pub(crate) struct Prepared {
    index: usize,
    attacker: UnitId,
    target: UnitId,
    weapon: WeaponProfile,
    caps: Capabilities,
    precision: bool,
    models: Vec<usize>,
    within_half_range: bool,
    hit_modifiers: ModifierSet,
    wound_modifiers: ModifierSet,
}

impl Prepared {
    /// The resolved weapon profile.
    pub(crate) fn weapon(&self) -> &WeaponProfile {
        &self.weapon
    }
}

/// Check an assignment against the board and catalog without rolling.
pub(crate) fn prepare(
    catalog: &WeaponCatalog,
    action: &Action,
    board: &Board,
    index: usize,
    assignment: &Assignment,
) -> MechResult<Prepared> {
    let attacker_id = action.attacker_of(assignment);
    if attacker_id.is_empty() {
        return Err(MechError::InvalidAction(format!(
            "assignment {index}: no attacking unit"
        )));
    }
    if assignment.target_unit_id.is_empty() {
        return Err(MechError::InvalidAction(format!(
            "assignment {index}: no target unit"
        )));
    }
    if assignment.weapon_id.is_empty() {
        return Err(MechError::InvalidAction(format!(
            "assignment {index}: no weapon"
        )));
    }

    let attacker = board
        .unit(attacker_id)
        .ok_or_else(|| MechError::UnitNotFound(attacker_id.clone()))?;
    if board.unit(&assignment.target_unit_id).is_none() {
        return Err(MechError::UnitNotFound(assignment.target_unit_id.clone()));
    }
    let weapon = catalog
        .profile_for(&assignment.weapon_id, attacker, Some(board))
        .ok_or_else(|| MechError::WeaponNotFound(assignment.weapon_id.clone()))?
        .clone();

    let mut seen = HashSet::new();
    let mut models = Vec::with_capacity(assignment.model_ids.len());
    for id in &assignment.model_ids {
        let i = attacker.model_index(id).ok_or_else(|| {
            MechError::InvalidAction(format!("model {id} is not part of unit {attacker_id}"))
        })?;
        if !seen.insert(i) {
            return Err(MechError::InvalidAction(format!(
                "model {id} is listed twice in assignment {index}"
            )));
        }
        models.push(i);
    }

    let caps = Capabilities::of(&weapon);
    let precision = caps.precision_for(attacker);
    Ok(Prepared {
        index,
        attacker: attacker_id.clone(),
        target: assignment.target_unit_id.clone(),
        weapon,
        caps,
        precision,
        models,
        within_half_range: assignment.within_half_range,
        hit_modifiers: assignment.hit_modifiers,
        wound_modifiers: assignment.wound_modifiers,
    })
}

/// A hit or wound travelling down the sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Pending {
    /// Came from a critical hit with Precision.
    precise: bool,
}

struct Attacker {
    shooters: u32,
    stationary: bool,
    charged: bool,
}

impl Attacker {
    fn read(unit: &Unit, models: &[usize]) -> Self {
        Self {
            shooters: models
                .iter()
                .filter(|&&i| unit.models.get(i).is_some_and(|m| m.is_alive()))
                .count() as u32,
            stationary: unit.flags.remained_stationary,
            charged: unit.flags.charged_this_turn,
        }
    }
}

/// Run one prepared assignment, appending to `log` and writing the
/// target's models back to `board`.
pub(crate) fn resolve<R: RandomSource + ?Sized>(
    prep: &Prepared,
    board: &mut Board,
    rng: &mut R,
    config: &EngineConfig,
    log: &mut Vec<RollRecord>,
) -> MechResult<AssignmentOutcome> {
    let attacker = board
        .unit(&prep.attacker)
        .map(|u| Attacker::read(u, &prep.models))
        .ok_or_else(|| MechError::UnitNotFound(prep.attacker.clone()))?;
    let mut target = board
        .unit(&prep.target)
        .cloned()
        .ok_or_else(|| MechError::UnitNotFound(prep.target.clone()))?;

    let mut outcome = AssignmentOutcome {
        index: prep.index,
        weapon_id: prep.weapon.id.clone(),
        target_unit_id: prep.target.clone(),
        summary: Summary::default(),
        saves: None,
        target_destroyed: target.is_destroyed(),
    };
    if attacker.shooters == 0 || target.is_destroyed() {
        debug!(assignment = prep.index, "nothing to resolve");
        return Ok(outcome);
    }

    let mut run = Run {
        prep,
        rng,
        log,
        context: format!("{} vs {}", prep.weapon.id, prep.target),
        summary: Summary::default(),
    };

    let attacks = run.attacks(&attacker, &target);
    let (hits, lethal) = run.hits(attacks, &attacker, &target);
    let (wounds, mortals) = run.wounds(&hits, lethal, &attacker, &target);
    outcome.saves = Some(run.saves_and_damage(&wounds, &mortals, config, &mut target));

    let casualties_before = target.casualties;
    target.refresh_status();
    run.summary.casualties = target.casualties.saturating_sub(casualties_before);
    outcome.summary = run.summary;
    outcome.target_destroyed = target.is_destroyed();

    if let Some(slot) = board.unit_mut(&prep.target) {
        *slot = target;
    }
    debug!(assignment = prep.index, summary = %outcome.summary, "assignment resolved");
    Ok(outcome)
}

struct Run<'a, R: ?Sized> {
    prep: &'a Prepared,
    rng: &'a mut R,
    log: &'a mut Vec<RollRecord>,
    context: String,
    summary: Summary,
}

impl<R: RandomSource + ?Sized> Run<'_, R> {
    fn record(&self, stage: Stage) -> RollRecord {
        RollRecord::new(self.prep.index, stage, self.context.clone())
    }

    fn has(&self, ability: WeaponAbilities) -> bool {
        self.prep.caps.has(ability)
    }

    /// Attack count: the weapon's attacks per shooter plus Rapid Fire and Blast.
    fn attacks(&mut self, attacker: &Attacker, target: &Unit) -> u32 {
        let mut record = self.record(Stage::Attacks);
        let mut total: u32 = 0;
        for _ in 0..attacker.shooters {
            let roll = roll_expr(&self.prep.weapon.attacks, self.rng);
            record.dice.extend(&roll.dice);
            total = total.saturating_add(roll.total);
        }

        let mut bonus: u32 = 0;
        if self.prep.within_half_range {
            bonus += self.prep.caps.rapid_fire.saturating_mul(attacker.shooters);
        }
        if self.has(WeaponAbilities::BLAST) {
            bonus = bonus.saturating_add((target.alive_count() as u32 / 5) * attacker.shooters);
        }

        record.successes = total.saturating_add(bonus);
        record.automatic = bonus;
        self.summary.attacks = record.successes;
        debug!(assignment = self.prep.index, attacks = record.successes, "attacks");
        self.log.push(record);
        self.summary.attacks
    }

    /// Hit rolls. Returns ordinary hits and lethal auto-wounds.
    fn hits(&mut self, attacks: u32, attacker: &Attacker, target: &Unit) -> (Vec<Pending>, Vec<Pending>) {
        let mut hits = Vec::new();
        let mut lethal = Vec::new();

        if self.has(WeaponAbilities::TORRENT) {
            hits.resize(attacks as usize, Pending { precise: false });
            let mut record = self.record(Stage::Hit);
            record.successes = attacks;
            record.automatic = attacks;
            self.log.push(record);
            self.summary.hits = attacks;
            debug!(assignment = self.prep.index, hits = attacks, "torrent auto-hits");
            return (hits, lethal);
        }

        let mut mods = self.prep.hit_modifiers;
        if self.has(WeaponAbilities::HEAVY) && attacker.stationary {
            mods |= ModifierSet::PLUS_ONE;
        }
        if !self.prep.caps.melee && target.has_stealth() {
            mods |= ModifierSet::MINUS_ONE;
        }
        let threshold = self.prep.weapon.skill.clamp(2, 6);
        let mut record = self.record(Stage::Hit).with_threshold(threshold).with_modifier(mods.net());
        let mut criticals = 0;

        for _ in 0..attacks {
            let raw = self.rng.d6();
            let roll = modifier::apply(raw, mods, threshold, self.rng);
            if let Some(value) = roll.reroll_value {
                record.rerolls.push(Reroll {
                    index: record.dice.len(),
                    original: raw,
                    value,
                });
            }
            record.dice.push(roll.unmodified());
            trace!(raw, modified = roll.modified, "hit die");

            if !modifier::succeeds(&roll, threshold, CheckKind::Hit) {
                continue;
            }
            record.successes += 1;
            let critical = roll.unmodified() == 6;
            let hit = Pending {
                precise: critical && self.prep.precision,
            };
            if critical {
                criticals += 1;
            }
            if critical && self.has(WeaponAbilities::LETHAL_HITS) {
                lethal.push(hit);
            } else {
                hits.push(hit);
            }
        }
        self.log.push(record);

        if let Some(extra) = self.prep.caps.sustained_hits.clone() {
            let mut record = self.record(Stage::SustainedHits);
            for _ in 0..criticals {
                let roll = roll_expr(&extra, self.rng);
                record.dice.extend(&roll.dice);
                record.successes += roll.total;
            }
            hits.resize(hits.len() + record.successes as usize, Pending { precise: false });
            self.log.push(record);
        }

        self.summary.hits = (hits.len() + lethal.len()) as u32;
        debug!(
            assignment = self.prep.index,
            hits = self.summary.hits,
            criticals,
            lethal = lethal.len(),
            "hit rolls"
        );
        (hits, lethal)
    }

    /// Wound rolls. Returns wounds to save and unsaveable mortal wounds.
    fn wounds(
        &mut self,
        hits: &[Pending],
        lethal: Vec<Pending>,
        attacker: &Attacker,
        target: &Unit,
    ) -> (Vec<Pending>, Vec<Pending>) {
        let threshold = wound_threshold(self.prep.weapon.strength, target.stats.toughness);
        let mut mods = self.prep.wound_modifiers;
        if self.has(WeaponAbilities::LANCE) && attacker.charged {
            mods |= ModifierSet::PLUS_ONE;
        }
        if self.has(WeaponAbilities::TWIN_LINKED) {
            mods |= ModifierSet::REROLL_FAILED;
        }
        let critical_at = u32::from(self.prep.caps.critical_wound_threshold(target));
        let devastating = self.has(WeaponAbilities::DEVASTATING_WOUNDS);

        let mut record = self.record(Stage::Wound).with_threshold(threshold).with_modifier(mods.net());
        record.automatic = lethal.len() as u32;
        record.successes = record.automatic;
        let mut wounds = lethal;
        let mut mortals = Vec::new();

        for hit in hits {
            let raw = self.rng.d6();
            let roll = modifier::apply(raw, mods, threshold, self.rng);
            if let Some(value) = roll.reroll_value {
                record.rerolls.push(Reroll {
                    index: record.dice.len(),
                    original: raw,
                    value,
                });
            }
            record.dice.push(roll.unmodified());
            trace!(raw, modified = roll.modified, "wound die");

            let critical = roll.unmodified() >= critical_at;
            if !critical && !modifier::succeeds(&roll, threshold, CheckKind::Wound) {
                continue;
            }
            record.successes += 1;
            if critical && devastating {
                mortals.push(*hit);
            } else {
                wounds.push(*hit);
            }
        }
        self.log.push(record);

        self.summary.wounds = wounds.len() as u32;
        self.summary.mortal_wounds = mortals.len() as u32;
        debug!(
            assignment = self.prep.index,
            wounds = wounds.len(),
            mortal = mortals.len(),
            "wound rolls"
        );
        (wounds, mortals)
    }

    /// Saving throws and damage, one wound at a time.
    ///
    /// Each wound is saved by the model it would be allocated to at that
    /// moment, and a failed save is allocated before the next wound is
    /// rolled, so a model's death changes the save the next wound faces.
    /// Precise wounds go to the first alive CHARACTER while there is one.
    /// Mortal wounds skip the save. Records come out as Save, Damage, then
    /// Feel No Pain; consecutive saves at the same threshold share a record.
    fn saves_and_damage(
        &mut self,
        wounds: &[Pending],
        mortals: &[Pending],
        config: &EngineConfig,
        target: &mut Unit,
    ) -> save::SaveResolution {
        let context = WoundContext {
            devastating: false,
            precision: wounds.iter().any(|w| w.precise),
            melta: self.melta(),
        };
        let resolution = save::build(target, &self.prep.weapon, context);
        let characters = target.character_indices();
        let first_threshold = allocate::current_target(&target.models, AllocationMode::Normal, &[])
            .and_then(|i| save_threshold(&resolution, i));

        let normal = wounds.iter().map(|w| (*w, true));
        let mortal = mortals.iter().map(|w| (*w, false));
        let order: Vec<(Pending, bool)> = if config.mortal_wounds_after_normal {
            normal.chain(mortal).collect()
        } else {
            mortal.chain(normal).collect()
        };

        let mut saves: Vec<RollRecord> = Vec::new();
        let mut damage = self.record(Stage::Damage);
        let mut fnp = target
            .stats
            .feel_no_pain
            .filter(|v| (2..=6).contains(v))
            .map(|t| self.record(Stage::FeelNoPain).with_threshold(t));

        for (wound, saveable) in order {
            if target.is_destroyed() {
                break;
            }
            let mode = if wound.precise
                && allocate::current_target(&target.models, AllocationMode::Precision, &characters)
                    .is_some()
            {
                AllocationMode::Precision
            } else {
                AllocationMode::Normal
            };

            if saveable {
                let threshold = allocate::current_target(&target.models, mode, &characters)
                    .and_then(|i| save_threshold(&resolution, i));
                if saves.last().is_none_or(|r| r.threshold != threshold) {
                    let mut record = self.record(Stage::Save);
                    record.threshold = threshold;
                    saves.push(record);
                }
                if let (Some(threshold), Some(record)) = (threshold, saves.last_mut()) {
                    let raw = self.rng.d6();
                    let roll = modifier::apply(raw, ModifierSet::empty(), threshold, self.rng);
                    record.dice.push(raw);
                    trace!(raw, threshold, "save die");
                    if modifier::succeeds(&roll, threshold, CheckKind::Save) {
                        record.successes += 1;
                        continue;
                    }
                }
                self.summary.failed_saves += 1;
            }

            self.inflict(mode, target, &characters, &mut damage, fnp.as_mut());
        }

        if saves.is_empty() {
            let mut record = self.record(Stage::Save);
            record.threshold = first_threshold;
            saves.push(record);
        }
        self.summary.damage_applied = damage.successes;
        debug!(
            assignment = self.prep.index,
            failed = self.summary.failed_saves,
            damage = damage.successes,
            "saves and damage"
        );
        self.log.extend(saves);
        self.log.push(damage);
        self.log.extend(fnp);
        resolution
    }

    fn melta(&self) -> u32 {
        if self.prep.within_half_range {
            self.prep.caps.melta
        } else {
            0
        }
    }

    /// Roll damage for one wound, apply Feel No Pain, and allocate the rest.
    fn inflict(
        &mut self,
        mode: AllocationMode,
        target: &mut Unit,
        characters: &[usize],
        damage: &mut RollRecord,
        fnp: Option<&mut RollRecord>,
    ) {
        let roll = roll_expr(&self.prep.weapon.damage, self.rng);
        damage.dice.extend(&roll.dice);
        let mut amount = roll.total.saturating_add(self.melta());

        if let Some(fnp) = fnp {
            let threshold = u32::from(fnp.threshold.unwrap_or(NO_SAVE));
            let mut ignored = 0;
            for _ in 0..amount {
                let die = self.rng.d6();
                fnp.dice.push(die);
                if die >= threshold {
                    ignored += 1;
                }
            }
            fnp.successes += ignored;
            amount -= ignored;
        }

        let allocation = allocate::allocate(&mut target.models, amount, mode, characters);
        trace!(amount, applied = allocation.damage_applied, ?mode, "damage");
        damage.successes += allocation.damage_applied;
    }
}

/// The save roll needed by the model at `index`, or `None` when it has none.
fn save_threshold(resolution: &save::SaveResolution, index: usize) -> Option<u8> {
    resolution
        .entry(index)
        .filter(|e| e.kind != SaveKind::None)
        .map(|e| e.threshold)
}
