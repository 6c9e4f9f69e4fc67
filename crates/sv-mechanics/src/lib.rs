//! Combat resolution engine for Salvo.
//!
//! Resolves attack actions through the fixed Hit → Wound → Save → Damage
//! sequence: dice flow through an injected [`RandomSource`], modifiers
//! follow the stacking law in [`modifier`], weapon keywords are classified
//! by the [`WeaponCatalog`], saves are chosen by [`save`], and wounds are
//! removed by [`allocate`]. Every roll batch is recorded as a
//! [`RollRecord`] so a seeded resolution can be replayed exactly.

pub mod allocate;
pub mod catalog;
pub mod combat;
pub mod config;
pub mod dice;
pub mod error;
pub mod estimate;
pub mod modifier;
pub mod save;
pub mod wound;

pub use allocate::{Allocation, AllocationMode};
pub use catalog::{Capabilities, WeaponCatalog};
pub use combat::{
    Action, Assignment, AssignmentOutcome, CombatEngine, ResolutionResult, RollRecord, Stage,
    Summary,
};
pub use config::EngineConfig;
pub use dice::{RandomSource, ScriptedDice, SeededDice};
pub use error::{FailureKind, MechError, MechResult};
pub use estimate::Estimate;
pub use modifier::{CheckKind, ModifiedRoll, ModifierSet};
pub use save::{SaveKind, SaveRequirement, SaveResolution, WoundContext};
