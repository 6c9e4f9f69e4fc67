//! Save resolution: armor versus invulnerable, per model.
//!
//! Armor is the unit's save, improved by one for cover and worsened by the
//! weapon's AP, never better than 2+; past 6+ it is no save at all.
//! Invulnerable saves ignore AP and come from the model, the datasheet, or
//! a granted effect, whichever is best. The lower threshold wins.

use serde::{Deserialize, Serialize};
use sv_core::load::NO_SAVE;
use sv_core::{MAX_AP, ModelId, Unit, WeaponAbilities, WeaponProfile};

/// Which save a model rolls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SaveKind {
    /// Armor save (including any cover bonus).
    Armor,
    /// Invulnerable save.
    Invulnerable,
    /// No save is possible.
    None,
}

/// Special circumstances of the incoming wounds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WoundContext {
    /// The wounds are mortal wounds from Devastating Wounds: unsaveable.
    pub devastating: bool,
    /// The wounds may be allocated to CHARACTER models.
    pub precision: bool,
    /// Extra damage per wound from Melta.
    pub melta: u32,
}

/// The save one model needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveRequirement {
    /// Position of the model in unit order.
    pub model_index: usize,
    /// The model's id.
    pub model_id: ModelId,
    /// Chosen save type.
    pub kind: SaveKind,
    /// Roll needed; [`NO_SAVE`] when `kind` is [`SaveKind::None`].
    pub threshold: u8,
    /// The model benefits from cover.
    pub has_cover: bool,
    /// The model is a CHARACTER.
    pub is_character: bool,
}

/// Per-model save requirements against one weapon.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveResolution {
    /// One entry per alive model, in unit order.
    pub entries: Vec<SaveRequirement>,
    /// The wound context the entries were built for.
    pub context: WoundContext,
}

impl SaveResolution {
    /// The entry for the model at `model_index`, if it is alive.
    pub fn entry(&self, model_index: usize) -> Option<&SaveRequirement> {
        self.entries.iter().find(|e| e.model_index == model_index)
    }

    /// Returns true when no model can save.
    pub fn is_unsaveable(&self) -> bool {
        self.entries.iter().all(|e| e.kind == SaveKind::None)
    }
}

/// Armor save after cover and AP. Returns [`NO_SAVE`] when nothing is left.
pub fn armor_save(base: u8, ap: i32, cover: bool) -> u8 {
    if base == 0 || base >= NO_SAVE {
        return NO_SAVE;
    }
    let value = i32::from(base) - i32::from(cover) + ap.saturating_abs().min(MAX_AP);
    if value > 6 {
        NO_SAVE
    } else {
        value.max(2) as u8
    }
}

/// The best invulnerable save available to the model at `model_index`.
///
/// Sources: the model's own value, the datasheet value, and a granted
/// `effect_invuln`. Zero or out-of-range values mean "none".
pub fn invulnerable_save(unit: &Unit, model_index: usize) -> Option<u8> {
    let model = unit.models.get(model_index).and_then(|m| m.invulnerable);
    [model, unit.stats.invulnerable, unit.flags.invulnerable]
        .into_iter()
        .flatten()
        .filter(|v| (2..NO_SAVE).contains(v))
        .min()
}

/// Pick the better of an armor and an optional invulnerable save.
pub fn choose(armor: u8, invulnerable: Option<u8>) -> (SaveKind, u8) {
    match invulnerable {
        Some(inv) if inv < armor => (SaveKind::Invulnerable, inv),
        _ if armor < NO_SAVE => (SaveKind::Armor, armor),
        _ => (SaveKind::None, NO_SAVE),
    }
}

/// Build per-model save requirements for wounds from `weapon` against `target`.
pub fn build(target: &Unit, weapon: &WeaponProfile, context: WoundContext) -> SaveResolution {
    let has_cover = target.flags.cover && !weapon.has(WeaponAbilities::IGNORES_COVER);

    let entries = target
        .models
        .iter()
        .enumerate()
        .filter(|(_, m)| m.is_alive())
        .map(|(index, model)| {
            let (kind, threshold) = if context.devastating {
                (SaveKind::None, NO_SAVE)
            } else {
                let armor = armor_save(target.stats.save, weapon.ap, has_cover);
                choose(armor, invulnerable_save(target, index))
            };
            SaveRequirement {
                model_index: index,
                model_id: model.id.clone(),
                kind,
                threshold,
                has_cover,
                is_character: target.is_character_model(index),
            }
        })
        .collect();

    SaveResolution { entries, context }
}
