//! Resolution results and summary counts.

use std::fmt;

use serde::{Deserialize, Serialize};
use sv_core::{UnitId, WeaponId};

use crate::error::{FailureKind, MechError};
use crate::save::SaveResolution;

use super::record::RollRecord;

/// Aggregate counts for one assignment or a whole action.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    /// Attacks made.
    pub attacks: u32,
    /// Successful hits, including sustained and lethal hits.
    pub hits: u32,
    /// Ordinary wounds, including lethal-hit auto-wounds.
    pub wounds: u32,
    /// Mortal wounds from Devastating Wounds.
    pub mortal_wounds: u32,
    /// Saves failed.
    pub failed_saves: u32,
    /// Wounds removed from models.
    pub damage_applied: u32,
    /// Models killed.
    pub casualties: u32,
}

impl Summary {
    /// Add another summary's counts to this one.
    pub fn absorb(&mut self, other: &Summary) {
        self.attacks += other.attacks;
        self.hits += other.hits;
        self.wounds += other.wounds;
        self.mortal_wounds += other.mortal_wounds;
        self.failed_saves += other.failed_saves;
        self.damage_applied += other.damage_applied;
        self.casualties += other.casualties;
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} attacks, {} hits, {} wounds",
            self.attacks, self.hits, self.wounds
        )?;
        if self.mortal_wounds > 0 {
            write!(f, " (+{} mortal)", self.mortal_wounds)?;
        }
        write!(
            f,
            ", {} failed saves, {} damage, {} casualties",
            self.failed_saves, self.damage_applied, self.casualties
        )
    }
}

/// What one assignment did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentOutcome {
    /// Position of the assignment within the action.
    pub index: usize,
    /// The weapon used.
    pub weapon_id: WeaponId,
    /// The unit attacked.
    pub target_unit_id: UnitId,
    /// Counts for this assignment.
    pub summary: Summary,
    /// Save requirements the target rolled against, if any save stage ran.
    pub saves: Option<SaveResolution>,
    /// The target had no models left afterwards.
    pub target_destroyed: bool,
}

/// The outcome of resolving an action.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionResult {
    /// False if the action was rejected; nothing was rolled or changed.
    pub success: bool,
    /// Why the action was rejected.
    pub reason: Option<String>,
    /// Category of the rejection.
    pub failure: Option<FailureKind>,
    /// Every roll batch, in order.
    pub log: Vec<RollRecord>,
    /// Totals across all assignments.
    pub summary: Summary,
    /// Per-assignment outcomes, in order.
    pub assignments: Vec<AssignmentOutcome>,
}

impl ResolutionResult {
    /// A rejected action.
    pub fn failure(error: &MechError) -> Self {
        Self {
            success: false,
            reason: Some(error.to_string()),
            failure: Some(error.kind()),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absorb_adds_counts() {
        let mut total = Summary::default();
        let one = Summary {
            attacks: 4,
            hits: 3,
            wounds: 2,
            mortal_wounds: 1,
            failed_saves: 1,
            damage_applied: 3,
            casualties: 1,
        };
        total.absorb(&one);
        total.absorb(&one);
        assert_eq!(total.attacks, 8);
        assert_eq!(total.mortal_wounds, 2);
        assert_eq!(total.casualties, 2);
    }

    #[test]
    fn summary_display() {
        let s = Summary {
            attacks: 2,
            hits: 1,
            wounds: 1,
            failed_saves: 1,
            damage_applied: 1,
            casualties: 1,
            ..Summary::default()
        };
        assert_eq!(
            s.to_string(),
            "2 attacks, 1 hits, 1 wounds, 1 failed saves, 1 damage, 1 casualties"
        );
    }

    #[test]
    fn failure_carries_reason_and_kind() {
        let r = ResolutionResult::failure(&MechError::UnitNotFound(UnitId::new("ghost")));
        assert!(!r.success);
        assert_eq!(r.reason.as_deref(), Some("unit not found: ghost"));
        assert_eq!(r.failure, Some(FailureKind::NotFound));
        assert!(r.log.is_empty());
    }
}
