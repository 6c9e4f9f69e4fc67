//! Units, models, stat blocks, and transient effect flags.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ids::{ModelId, UnitId, WeaponId};
use crate::keyword::{KeywordSet, STEALTH};
use crate::weapon::WeaponProfile;

/// Lifecycle status of a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitStatus {
    /// On the board and able to act.
    #[default]
    Active,
    /// Held off the board.
    Reserves,
    /// Every model has been removed.
    Destroyed,
}

impl fmt::Display for UnitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Active => write!(f, "active"),
            Self::Reserves => write!(f, "reserves"),
            Self::Destroyed => write!(f, "destroyed"),
        }
    }
}

/// The datasheet characteristics shared by a unit's models.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatBlock {
    /// Toughness.
    pub toughness: u32,
    /// Armor save threshold (2-6; 7 means no armor save).
    pub save: u8,
    /// Wound capacity of each model.
    pub wounds: u32,
    /// Leadership threshold.
    pub leadership: u8,
    /// Objective control.
    pub objective_control: u32,
    /// Innate invulnerable save, if the datasheet grants one.
    #[serde(default)]
    pub invulnerable: Option<u8>,
    /// Feel No Pain threshold, if the datasheet grants one.
    #[serde(default)]
    pub feel_no_pain: Option<u8>,
}

impl Default for StatBlock {
    fn default() -> Self {
        Self {
            toughness: 4,
            save: 3,
            wounds: 1,
            leadership: 6,
            objective_control: 1,
            invulnerable: None,
            feel_no_pain: None,
        }
    }
}

/// Transient effect flags, set by the stratagem/ability subsystem.
///
/// The engine only reads these. Whoever grants an effect clears it again
/// through [`UnitFlags::clear`] at the end of the relevant phase.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitFlags {
    /// A granted invulnerable save.
    #[serde(rename = "effect_invuln", default)]
    pub invulnerable: Option<u8>,
    /// The unit is treated as being in cover.
    #[serde(rename = "effect_cover", default)]
    pub cover: bool,
    /// Ranged attacks against the unit suffer -1 to hit.
    #[serde(rename = "effect_stealth", default)]
    pub stealth: bool,
    /// The unit's melee weapons gain Precision.
    #[serde(rename = "effect_precision_melee", default)]
    pub precision_melee: bool,
    /// The unit failed a battle-shock test.
    #[serde(default)]
    pub battle_shocked: bool,
    /// The unit made a charge move this turn.
    #[serde(default)]
    pub charged_this_turn: bool,
    /// The unit did not move this turn.
    #[serde(default)]
    pub remained_stationary: bool,
}

impl UnitFlags {
    /// Reset every transient flag.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Returns true if no flag is set.
    pub fn is_clear(&self) -> bool {
        *self == Self::default()
    }
}

/// A single model within a unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Model {
    /// Identifier, unique within the unit.
    pub id: ModelId,
    /// False once the model has been removed.
    pub alive: bool,
    /// Wound capacity.
    pub max_wounds: u32,
    /// Remaining wounds (never above `max_wounds`).
    pub wounds: u32,
    /// Keywords that replace the unit's for this model (e.g. an attached leader).
    #[serde(default)]
    pub keywords: Option<KeywordSet>,
    /// Per-model invulnerable save.
    #[serde(default)]
    pub invulnerable: Option<u8>,
}

impl Model {
    /// A healthy model with the given wound capacity.
    pub fn new(id: impl Into<ModelId>, max_wounds: u32) -> Self {
        let max_wounds = max_wounds.max(1);
        Self {
            id: id.into(),
            alive: true,
            max_wounds,
            wounds: max_wounds,
            keywords: None,
            invulnerable: None,
        }
    }

    /// Give the model its own keyword set.
    pub fn with_keywords(mut self, keywords: KeywordSet) -> Self {
        self.keywords = Some(keywords);
        self
    }

    /// Give the model its own invulnerable save.
    pub fn with_invulnerable(mut self, save: u8) -> Self {
        self.invulnerable = Some(save);
        self
    }

    /// Returns true while the model has wounds left.
    pub fn is_alive(&self) -> bool {
        self.alive && self.wounds > 0
    }

    /// Returns true if the model has lost at least one wound but lives.
    pub fn is_wounded(&self) -> bool {
        self.is_alive() && self.wounds < self.max_wounds
    }

    /// Remove up to `amount` wounds. Returns the wounds actually removed.
    ///
    /// A model reaching zero wounds dies; a dead model takes nothing.
    pub fn take_damage(&mut self, amount: u32) -> u32 {
        if !self.is_alive() {
            return 0;
        }
        let applied = amount.min(self.wounds);
        self.wounds -= applied;
        if self.wounds == 0 {
            self.alive = false;
        }
        applied
    }
}

/// A unit of one or more models.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Unit {
    /// Board identifier.
    pub id: UnitId,
    /// Display name.
    pub name: String,
    /// Owning side.
    pub owner: String,
    /// Lifecycle status.
    #[serde(default)]
    pub status: UnitStatus,
    /// Unit keywords (apply to every model without its own override).
    #[serde(default)]
    pub keywords: KeywordSet,
    /// Characteristics.
    pub stats: StatBlock,
    /// Models in unit order.
    pub models: Vec<Model>,
    /// Weapons carried by the unit (override catalog entries of the same id).
    #[serde(default)]
    pub weapons: Vec<WeaponProfile>,
    /// Transient effect flags.
    #[serde(default)]
    pub flags: UnitFlags,
    /// Number of models removed so far.
    #[serde(default)]
    pub casualties: u32,
}

impl Unit {
    /// Create an empty unit with default stats.
    pub fn new(id: impl Into<UnitId>, name: impl Into<String>, owner: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            owner: owner.into(),
            status: UnitStatus::Active,
            keywords: KeywordSet::new(),
            stats: StatBlock::default(),
            models: Vec::new(),
            weapons: Vec::new(),
            flags: UnitFlags::default(),
            casualties: 0,
        }
    }

    /// Set the stat block.
    pub fn with_stats(mut self, stats: StatBlock) -> Self {
        self.stats = stats;
        self
    }

    /// Set the unit keywords.
    pub fn with_keywords(mut self, keywords: KeywordSet) -> Self {
        self.keywords = keywords;
        self
    }

    /// Append a model.
    pub fn with_model(mut self, model: Model) -> Self {
        self.models.push(model);
        self
    }

    /// Append `count` models named `{prefix}{n}`, each with the stat block's wounds.
    pub fn with_models(mut self, prefix: &str, count: usize) -> Self {
        let start = self.models.len();
        for n in 0..count {
            let id = format!("{prefix}{}", start + n + 1);
            self.models.push(Model::new(id, self.stats.wounds));
        }
        self
    }

    /// Attach a weapon profile.
    pub fn with_weapon(mut self, weapon: WeaponProfile) -> Self {
        self.weapons.push(weapon);
        self
    }

    /// Set the transient flags.
    pub fn with_flags(mut self, flags: UnitFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Look up a model by id.
    pub fn model(&self, id: &ModelId) -> Option<&Model> {
        self.models.iter().find(|m| &m.id == id)
    }

    /// Position of a model in unit order.
    pub fn model_index(&self, id: &ModelId) -> Option<usize> {
        self.models.iter().position(|m| &m.id == id)
    }

    /// A weapon the unit carries, by id.
    pub fn weapon(&self, id: &WeaponId) -> Option<&WeaponProfile> {
        self.weapons.iter().find(|w| &w.id == id)
    }

    /// Models still in play.
    pub fn alive_models(&self) -> impl Iterator<Item = &Model> {
        self.models.iter().filter(|m| m.is_alive())
    }

    /// Number of models still in play.
    pub fn alive_count(&self) -> usize {
        self.alive_models().count()
    }

    /// Returns true when no model remains.
    pub fn is_destroyed(&self) -> bool {
        self.alive_count() == 0
    }

    /// Keywords in effect for the model at `index`.
    pub fn keywords_for(&self, index: usize) -> &KeywordSet {
        self.models
            .get(index)
            .and_then(|m| m.keywords.as_ref())
            .unwrap_or(&self.keywords)
    }

    /// Returns true if the model at `index` counts as a CHARACTER.
    pub fn is_character_model(&self, index: usize) -> bool {
        self.keywords_for(index).is_character()
    }

    /// Indices of every CHARACTER model, alive or not, in unit order.
    ///
    /// A CHARACTER unit makes every model eligible; otherwise only models
    /// whose own keywords include CHARACTER (attached leaders) qualify.
    pub fn character_indices(&self) -> Vec<usize> {
        (0..self.models.len())
            .filter(|&i| self.is_character_model(i))
            .collect()
    }

    /// Returns true if the unit's keywords, or those of any alive model,
    /// include `keyword`. A destroyed attached leader no longer counts.
    pub fn has_keyword(&self, keyword: &str) -> bool {
        self.keywords.contains(keyword)
            || self
                .models
                .iter()
                .filter(|m| m.is_alive())
                .filter_map(|m| m.keywords.as_ref())
                .any(|k| k.contains(keyword))
    }

    /// Returns true if ranged attacks against the unit suffer -1 to hit.
    pub fn has_stealth(&self) -> bool {
        self.flags.stealth || self.keywords.contains(STEALTH)
    }

    /// Update the casualty count and status after models were removed.
    pub fn refresh_status(&mut self) {
        self.casualties = self.models.iter().filter(|m| !m.is_alive()).count() as u32;
        if self.is_destroyed() && !self.models.is_empty() {
            self.status = UnitStatus::Destroyed;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keyword::CHARACTER;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn damage_conserves_wounds(max in 1u32..10, hits in proptest::collection::vec(0u32..6, 0..8)) {
            let mut m = Model::new("m", max);
            let mut removed = 0;
            for h in hits {
                removed += m.take_damage(h);
            }
            prop_assert!(m.wounds <= m.max_wounds);
            prop_assert_eq!(removed + m.wounds, max);
            prop_assert_eq!(m.is_alive(), m.wounds > 0);
        }
    }

    #[test]
    fn model_damage_never_goes_negative() {
        let mut m = Model::new("m1", 3);
        assert_eq!(m.take_damage(2), 2);
        assert!(m.is_wounded());
        assert_eq!(m.take_damage(5), 1);
        assert!(!m.is_alive());
        assert_eq!(m.wounds, 0);
        assert_eq!(m.take_damage(1), 0);
    }

    #[test]
    fn zero_capacity_is_raised_to_one() {
        let m = Model::new("m1", 0);
        assert_eq!(m.max_wounds, 1);
        assert!(m.is_alive());
    }

    #[test]
    fn character_indices_unit_level() {
        let unit = Unit::new("u", "Captain", "p1")
            .with_keywords(KeywordSet::new().with(CHARACTER))
            .with_models("c", 1);
        assert_eq!(unit.character_indices(), vec![0]);
    }

    #[test]
    fn character_indices_attached_leader() {
        let unit = Unit::new("u", "Squad", "p1")
            .with_keywords(KeywordSet::new().with("INFANTRY"))
            .with_models("m", 3)
            .with_model(
                Model::new("leader", 4)
                    .with_keywords(KeywordSet::new().with("INFANTRY").with(CHARACTER)),
            );
        assert_eq!(unit.character_indices(), vec![3]);
        assert!(unit.has_keyword("character"));
    }

    #[test]
    fn dead_leader_keywords_stop_counting() {
        let mut unit = Unit::new("u", "Squad", "p1")
            .with_models("m", 2)
            .with_model(Model::new("leader", 1).with_keywords(KeywordSet::new().with(CHARACTER)));
        unit.models[2].take_damage(1);
        assert!(!unit.has_keyword("character"));
        assert_eq!(unit.character_indices(), vec![2]);
    }

    #[test]
    fn with_models_numbering_continues() {
        let unit = Unit::new("u", "U", "p1").with_models("m", 2).with_models("m", 1);
        let ids: Vec<&str> = unit.models.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["m1", "m2", "m3"]);
    }

    #[test]
    fn flags_clear() {
        let mut flags = UnitFlags {
            invulnerable: Some(4),
            cover: true,
            charged_this_turn: true,
            ..UnitFlags::default()
        };
        assert!(!flags.is_clear());
        flags.clear();
        assert!(flags.is_clear());
    }

    #[test]
    fn flags_use_conventional_names() {
        let json = r#"{"effect_invuln":5,"effect_cover":true,"charged_this_turn":true}"#;
        let flags: UnitFlags = serde_json::from_str(json).unwrap();
        assert_eq!(flags.invulnerable, Some(5));
        assert!(flags.cover);
        assert!(flags.charged_this_turn);
        assert!(!flags.stealth);
    }

    #[test]
    fn refresh_status_marks_destroyed() {
        let mut unit = Unit::new("u", "U", "p1").with_models("m", 2);
        for m in &mut unit.models {
            m.take_damage(1);
        }
        unit.refresh_status();
        assert_eq!(unit.casualties, 2);
        assert_eq!(unit.status, UnitStatus::Destroyed);
    }
}
