//! Action payloads: who shoots what, with which models.

use serde::{Deserialize, Serialize};
use sv_core::{CoreError, ModelId, UnitId, WeaponId};

use crate::error::MechResult;
use crate::modifier::ModifierSet;

/// One weapon fired by some of a unit's models at one target.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    /// The attacking unit; falls back to the action's actor when empty.
    #[serde(default)]
    pub attacker_unit_id: UnitId,
    /// The unit being attacked.
    #[serde(default)]
    pub target_unit_id: UnitId,
    /// The weapon used.
    #[serde(default)]
    pub weapon_id: WeaponId,
    /// The attacking models. Empty means the assignment does nothing.
    #[serde(default)]
    pub model_ids: Vec<ModelId>,
    /// The target is within half the weapon's range (Rapid Fire, Melta).
    #[serde(default)]
    pub within_half_range: bool,
    /// Extra hit modifiers from abilities or stratagems.
    #[serde(default)]
    pub hit_modifiers: ModifierSet,
    /// Extra wound modifiers from abilities or stratagems.
    #[serde(default)]
    pub wound_modifiers: ModifierSet,
}

impl Assignment {
    /// Fire `weapon` at `target`.
    pub fn new(target: impl Into<UnitId>, weapon: impl Into<WeaponId>) -> Self {
        Self {
            target_unit_id: target.into(),
            weapon_id: weapon.into(),
            ..Self::default()
        }
    }

    /// Set the attacking unit explicitly.
    pub fn with_attacker(mut self, attacker: impl Into<UnitId>) -> Self {
        self.attacker_unit_id = attacker.into();
        self
    }

    /// Add attacking models.
    pub fn with_models<I, M>(mut self, models: I) -> Self
    where
        I: IntoIterator<Item = M>,
        M: Into<ModelId>,
    {
        self.model_ids.extend(models.into_iter().map(Into::into));
        self
    }

    /// Mark the target as within half range.
    pub fn within_half_range(mut self) -> Self {
        self.within_half_range = true;
        self
    }

    /// Add hit modifiers.
    pub fn with_hit_modifiers(mut self, mods: ModifierSet) -> Self {
        self.hit_modifiers |= mods;
        self
    }

    /// Add wound modifiers.
    pub fn with_wound_modifiers(mut self, mods: ModifierSet) -> Self {
        self.wound_modifiers |= mods;
        self
    }
}

/// An ordered list of assignments made by one acting unit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    /// The acting unit.
    #[serde(default)]
    pub actor_unit_id: UnitId,
    /// Assignments, resolved in this order.
    #[serde(default)]
    pub assignments: Vec<Assignment>,
}

impl Action {
    /// An action with no assignments yet.
    pub fn new(actor: impl Into<UnitId>) -> Self {
        Self {
            actor_unit_id: actor.into(),
            assignments: Vec::new(),
        }
    }

    /// Append an assignment.
    pub fn with_assignment(mut self, assignment: Assignment) -> Self {
        self.assignments.push(assignment);
        self
    }

    /// Parse an action from JSON.
    pub fn from_json(json: &str) -> MechResult<Self> {
        Ok(serde_json::from_str(json).map_err(CoreError::from)?)
    }

    /// The attacking unit for an assignment.
    pub fn attacker_of<'a>(&'a self, assignment: &'a Assignment) -> &'a UnitId {
        if assignment.attacker_unit_id.is_empty() {
            &self.actor_unit_id
        } else {
            &assignment.attacker_unit_id
        }
    }
}
