//! Core types for Salvo, a tabletop wargame combat-resolution engine.
//!
//! This crate defines the typed data model the engine operates on: units
//! and their models, stat blocks, transient effect flags, weapon profiles
//! with a structured keyword set, dice expressions, and the [`Board`]
//! snapshot. Loosely-typed JSON records are converted into these types
//! exactly once, at the [`load`] boundary.

/// The board snapshot: every unit in play, keyed by id.
pub mod board;
/// Dice types and dice expressions ("D3+1", "2D6").
pub mod dice;
/// Error types used throughout the crate.
pub mod error;
/// String identifiers for units, models, and weapons.
pub mod ids;
/// Case-insensitive keyword sets for units and models.
pub mod keyword;
/// Typed-coercion boundary for loosely-typed JSON records.
pub mod load;
/// Units, models, stat blocks, and transient effect flags.
pub mod unit;
/// Weapon profiles and the weapon keyword enumeration.
pub mod weapon;

/// Re-export the board snapshot.
pub use board::Board;
/// Re-export dice types.
pub use dice::{DiceExpr, Die};
/// Re-export error types.
pub use error::{CoreError, CoreResult};
/// Re-export identifier types.
pub use ids::{ModelId, UnitId, WeaponId};
/// Re-export keyword types.
pub use keyword::KeywordSet;
/// Re-export unit types.
pub use unit::{Model, StatBlock, Unit, UnitFlags, UnitStatus};
/// Re-export weapon types.
pub use weapon::{MAX_AP, WeaponAbilities, WeaponKeyword, WeaponProfile, WeaponRange};
