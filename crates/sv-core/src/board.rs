use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::ids::{UnitId, WeaponId};
use crate::unit::Unit;
use crate::weapon::WeaponProfile;

/// A snapshot of every unit in play.
///
/// Resolution mutates model wounds and casualty bookkeeping in place; the
/// host serializes access so only one resolution touches a board at a time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Board {
    units: BTreeMap<UnitId, Unit>,
}

impl Board {
    /// Create an empty board.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a unit. Fails if the id is already taken.
    pub fn insert(&mut self, unit: Unit) -> CoreResult<()> {
        if self.units.contains_key(&unit.id) {
            return Err(CoreError::DuplicateUnit(unit.id));
        }
        self.units.insert(unit.id.clone(), unit);
        Ok(())
    }

    /// Builder form of [`Board::insert`] for fixtures; a duplicate replaces the earlier unit.
    pub fn with_unit(mut self, unit: Unit) -> Self {
        self.units.insert(unit.id.clone(), unit);
        self
    }

    /// Look up a unit.
    pub fn unit(&self, id: &UnitId) -> Option<&Unit> {
        self.units.get(id)
    }

    /// Look up a unit for mutation.
    pub fn unit_mut(&mut self, id: &UnitId) -> Option<&mut Unit> {
        self.units.get_mut(id)
    }

    /// Iterate over units in id order.
    pub fn units(&self) -> impl Iterator<Item = &Unit> {
        self.units.values()
    }

    /// Number of units on the board.
    pub fn len(&self) -> usize {
        self.units.len()
    }

    /// Returns true if the board has no units.
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// The first unit-carried weapon with the given id, in unit id order.
    pub fn weapon(&self, id: &WeaponId) -> Option<&WeaponProfile> {
        self.units.values().find_map(|u| u.weapon(id))
    }

    /// Reset a unit's transient flags. Returns false if the unit is unknown.
    ///
    /// This is the host's phase-end hook; resolution never expires flags.
    pub fn clear_transient_flags(&mut self, id: &UnitId) -> bool {
        match self.units.get_mut(id) {
            Some(unit) => {
                unit.flags.clear();
                true
            }
            None => false,
        }
    }

    /// Reset the transient flags of every unit.
    pub fn clear_all_transient_flags(&mut self) {
        for unit in self.units.values_mut() {
            unit.flags.clear();
        }
    }
}
