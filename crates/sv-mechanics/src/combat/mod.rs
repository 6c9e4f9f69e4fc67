//! Action resolution against a board.
//!
//! [`CombatEngine`] validates every assignment of an action up front, then
//! resolves them in order through the attack sequence in `pipeline`,
//! mutating only the wound and casualty fields of target units.

pub mod action;
mod pipeline;
pub mod record;
pub mod result;

pub use action::{Action, Assignment};
pub use record::{Reroll, RollRecord, Stage};
pub use result::{AssignmentOutcome, ResolutionResult, Summary};

use sv_core::Board;
use tracing::{info, warn};

use crate::catalog::WeaponCatalog;
use crate::config::EngineConfig;
use crate::dice::{RandomSource, SeededDice};
use crate::error::{MechError, MechResult};
use crate::estimate::{self, Estimate};

/// Resolves actions using a weapon catalog and a configuration.
#[derive(Debug, Clone)]
pub struct CombatEngine<'a> {
    catalog: &'a WeaponCatalog,
    config: EngineConfig,
}

impl<'a> CombatEngine<'a> {
    /// An engine over `catalog` with the default configuration.
    pub fn new(catalog: &'a WeaponCatalog) -> Self {
        Self {
            catalog,
            config: EngineConfig::default(),
        }
    }

    /// Replace the configuration.
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// The active configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The weapon catalog.
    pub fn catalog(&self) -> &WeaponCatalog {
        self.catalog
    }

    /// Resolve an action. Rejected actions come back with `success: false`
    /// and a reason; the board is untouched in that case.
    pub fn resolve<R: RandomSource + ?Sized>(
        &self,
        action: &Action,
        board: &mut Board,
        rng: &mut R,
    ) -> ResolutionResult {
        match self.try_resolve(action, board, rng) {
            Ok(result) => result,
            Err(e) => {
                warn!(actor = %action.actor_unit_id, error = %e, "action rejected");
                ResolutionResult::failure(&e)
            }
        }
    }

    /// Resolve an action with a fresh [`SeededDice`] from the configured seed.
    pub fn resolve_seeded(&self, action: &Action, board: &mut Board) -> ResolutionResult {
        let mut rng = SeededDice::new(self.config.seed);
        self.resolve(action, board, &mut rng)
    }

    /// Expected outcome of each assignment, without rolling or mutating.
    pub fn estimate(&self, action: &Action, board: &Board) -> MechResult<Vec<Estimate>> {
        action
            .assignments
            .iter()
            .enumerate()
            .map(|(i, a)| {
                let prep = pipeline::prepare(self.catalog, action, board, i, a)?;
                let attacker = board
                    .unit(action.attacker_of(a))
                    .ok_or_else(|| MechError::UnitNotFound(action.attacker_of(a).clone()))?;
                let target = board
                    .unit(&a.target_unit_id)
                    .ok_or_else(|| MechError::UnitNotFound(a.target_unit_id.clone()))?;
                Ok(estimate::estimate(prep.weapon(), attacker, target, a))
            })
            .collect()
    }

    /// Resolve an action, returning validation errors directly.
    pub fn try_resolve<R: RandomSource + ?Sized>(
        &self,
        action: &Action,
        board: &mut Board,
        rng: &mut R,
    ) -> MechResult<ResolutionResult> {
        let prepared = action
            .assignments
            .iter()
            .enumerate()
            .map(|(i, a)| pipeline::prepare(self.catalog, action, board, i, a))
            .collect::<MechResult<Vec<_>>>()?;

        let mut log = Vec::new();
        let mut summary = Summary::default();
        let mut assignments = Vec::with_capacity(prepared.len());
        for prep in &prepared {
            let outcome = pipeline::resolve(prep, board, rng, &self.config, &mut log)?;
            summary.absorb(&outcome.summary);
            assignments.push(outcome);
        }

        let max = self.config.max_log_records;
        if max > 0 && log.len() > max {
            log.drain(..log.len() - max);
        }

        info!(
            actor = %action.actor_unit_id,
            assignments = assignments.len(),
            summary = %summary,
            "action resolved"
        );
        Ok(ResolutionResult {
            success: true,
            reason: None,
            failure: None,
            log,
            summary,
            assignments,
        })
    }
}
