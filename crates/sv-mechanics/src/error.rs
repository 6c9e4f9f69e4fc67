//! Error types for the combat engine.

use serde::{Deserialize, Serialize};
use sv_core::{CoreError, UnitId, WeaponId};

/// Errors that can occur while preparing or resolving an action.
#[derive(Debug, thiserror::Error)]
pub enum MechError {
    /// A weapon id matched neither the attacker, the board, nor the catalog.
    #[error("weapon not found: {0}")]
    WeaponNotFound(WeaponId),

    /// A unit id in an assignment is not on the board.
    #[error("unit not found: {0}")]
    UnitNotFound(UnitId),

    /// An assignment is malformed (missing ids, unknown or repeated models).
    #[error("invalid action: {0}")]
    InvalidAction(String),

    /// Catalog or board data could not be loaded.
    #[error("load error: {0}")]
    Load(#[from] CoreError),
}

/// Broad category of a [`MechError`], for callers deciding how to react.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Something referenced does not exist.
    NotFound,
    /// The action itself is malformed.
    InvalidAction,
    /// Input data was unreadable.
    Load,
}

impl MechError {
    /// The failure category.
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::WeaponNotFound(_) | Self::UnitNotFound(_) => FailureKind::NotFound,
            Self::InvalidAction(_) => FailureKind::InvalidAction,
            Self::Load(_) => FailureKind::Load,
        }
    }
}

/// Convenience result type for engine operations.
pub type MechResult<T> = Result<T, MechError>;
