//! Weapon catalog and capability resolution.
//!
//! The catalog holds static weapon profiles. Units on a live board may
//! carry their own profiles; those shadow catalog entries with the same
//! id. Capability queries classify a profile's normalized keywords into
//! the booleans and parameters the attack pipeline branches on.

use std::collections::BTreeMap;

use sv_core::load::weapons_from_json;
use sv_core::{Board, DiceExpr, Unit, WeaponAbilities, WeaponId, WeaponProfile};

use crate::error::{MechError, MechResult};

/// The capabilities of one weapon, ready for the pipeline.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Capabilities {
    /// Boolean keyword flags.
    pub abilities: WeaponAbilities,
    /// The weapon is a melee weapon.
    pub melee: bool,
    /// Extra hits per critical hit.
    pub sustained_hits: Option<DiceExpr>,
    /// Extra attacks per model within half range.
    pub rapid_fire: u32,
    /// Extra damage per wound within half range.
    pub melta: u32,
    /// Anti pairs: target keyword and critical-wound threshold.
    pub anti: Vec<(String, u8)>,
}

impl Capabilities {
    /// Classify a profile.
    pub fn of(profile: &WeaponProfile) -> Self {
        Self {
            abilities: profile.abilities(),
            melee: profile.is_melee(),
            sustained_hits: profile.sustained_hits().cloned(),
            rapid_fire: profile.rapid_fire(),
            melta: profile.melta(),
            anti: profile
                .anti()
                .map(|(keyword, threshold)| (keyword.to_string(), threshold))
                .collect(),
        }
    }

    /// Returns true if every flag in `ability` is present.
    pub fn has(&self, ability: WeaponAbilities) -> bool {
        self.abilities.contains(ability)
    }

    /// Precision from the weapon itself, or granted to the bearer's melee weapons.
    pub fn precision_for(&self, bearer: &Unit) -> bool {
        self.has(WeaponAbilities::PRECISION) || (self.melee && bearer.flags.precision_melee)
    }

    /// The unmodified wound roll that counts as critical against `target`.
    ///
    /// Anti keywords are matched against the whole unit: wound rolls come
    /// before allocation, so an alive attached CHARACTER makes Anti-Character
    /// apply to every wound rolled against the unit.
    pub fn critical_wound_threshold(&self, target: &Unit) -> u8 {
        self.anti
            .iter()
            .filter(|(keyword, _)| target.has_keyword(keyword))
            .map(|&(_, threshold)| threshold)
            .min()
            .unwrap_or(6)
            .clamp(2, 6)
    }
}

/// Static weapon profiles, keyed by id.
#[derive(Debug, Clone, Default)]
pub struct WeaponCatalog {
    weapons: BTreeMap<WeaponId, WeaponProfile>,
}

impl WeaponCatalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a catalog from profiles; later duplicates replace earlier ones.
    pub fn from_profiles(profiles: impl IntoIterator<Item = WeaponProfile>) -> Self {
        let mut catalog = Self::new();
        for p in profiles {
            catalog.insert(p);
        }
        catalog
    }

    /// Load a catalog from JSON (see [`sv_core::load::weapons_from_json`]).
    pub fn from_json(json: &str) -> MechResult<Self> {
        Ok(Self::from_profiles(weapons_from_json(json)?))
    }

    /// Add or replace a profile.
    pub fn insert(&mut self, profile: WeaponProfile) {
        self.weapons.insert(profile.id.clone(), profile);
    }

    /// A catalog profile by id, ignoring any board.
    pub fn get(&self, id: &WeaponId) -> Option<&WeaponProfile> {
        self.weapons.get(id)
    }

    /// Number of profiles.
    pub fn len(&self) -> usize {
        self.weapons.len()
    }

    /// Returns true if the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.weapons.is_empty()
    }

    /// Iterate over profiles in id order.
    pub fn iter(&self) -> impl Iterator<Item = &WeaponProfile> {
        self.weapons.values()
    }

    /// Resolve a profile: a board-carried weapon first, then the catalog.
    pub fn profile<'a>(&'a self, id: &WeaponId, board: Option<&'a Board>) -> Option<&'a WeaponProfile> {
        board.and_then(|b| b.weapon(id)).or_else(|| self.get(id))
    }

    /// Resolve a profile for a specific bearer: its own weapons, then the
    /// rest of the board, then the catalog.
    pub fn profile_for<'a>(
        &'a self,
        id: &WeaponId,
        bearer: &'a Unit,
        board: Option<&'a Board>,
    ) -> Option<&'a WeaponProfile> {
        bearer.weapon(id).or_else(|| self.profile(id, board))
    }

    /// Capabilities of a weapon.
    pub fn capabilities(&self, id: &WeaponId, board: Option<&Board>) -> MechResult<Capabilities> {
        self.profile(id, board)
            .map(Capabilities::of)
            .ok_or_else(|| MechError::WeaponNotFound(id.clone()))
    }

    fn has(&self, id: &WeaponId, board: Option<&Board>, ability: WeaponAbilities) -> bool {
        self.profile(id, board).is_some_and(|p| p.has(ability))
    }

    /// Heavy: +1 to hit when stationary.
    pub fn is_heavy(&self, id: &WeaponId, board: Option<&Board>) -> bool {
        self.has(id, board, WeaponAbilities::HEAVY)
    }

    /// Assault.
    pub fn is_assault(&self, id: &WeaponId, board: Option<&Board>) -> bool {
        self.has(id, board, WeaponAbilities::ASSAULT)
    }

    /// Pistol.
    pub fn is_pistol(&self, id: &WeaponId, board: Option<&Board>) -> bool {
        self.has(id, board, WeaponAbilities::PISTOL)
    }

    /// Torrent: skips the hit roll.
    pub fn is_torrent(&self, id: &WeaponId, board: Option<&Board>) -> bool {
        self.has(id, board, WeaponAbilities::TORRENT)
    }

    /// Lance: +1 to wound after charging.
    pub fn is_lance(&self, id: &WeaponId, board: Option<&Board>) -> bool {
        self.has(id, board, WeaponAbilities::LANCE)
    }

    /// Twin-linked: re-roll failed wounds.
    pub fn is_twin_linked(&self, id: &WeaponId, board: Option<&Board>) -> bool {
        self.has(id, board, WeaponAbilities::TWIN_LINKED)
    }

    /// Lethal Hits.
    pub fn has_lethal_hits(&self, id: &WeaponId, board: Option<&Board>) -> bool {
        self.has(id, board, WeaponAbilities::LETHAL_HITS)
    }

    /// Sustained Hits.
    pub fn has_sustained_hits(&self, id: &WeaponId, board: Option<&Board>) -> bool {
        self.has(id, board, WeaponAbilities::SUSTAINED_HITS)
    }

    /// Devastating Wounds.
    pub fn has_devastating_wounds(&self, id: &WeaponId, board: Option<&Board>) -> bool {
        self.has(id, board, WeaponAbilities::DEVASTATING_WOUNDS)
    }

    /// Returns true for melee weapons.
    pub fn is_melee(&self, id: &WeaponId, board: Option<&Board>) -> bool {
        self.profile(id, board).is_some_and(WeaponProfile::is_melee)
    }

    /// Precision, inherent or granted.
    ///
    /// With a board, a melee weapon also counts when any unit carrying it
    /// has the `effect_precision_melee` flag.
    pub fn has_precision(&self, id: &WeaponId, board: Option<&Board>) -> bool {
        if self.has(id, board, WeaponAbilities::PRECISION) {
            return true;
        }
        let Some(board) = board else {
            return false;
        };
        self.is_melee(id, Some(board))
            && board
                .units()
                .any(|u| u.flags.precision_melee && u.weapon(id).is_some())
    }
}
