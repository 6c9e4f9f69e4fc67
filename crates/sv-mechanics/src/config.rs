//! Configuration for the combat engine.

/// Configuration for a [`CombatEngine`](crate::CombatEngine).
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Seed used by [`CombatEngine::resolve_seeded`](crate::CombatEngine::resolve_seeded).
    pub seed: u64,
    /// Maximum roll records kept per result (oldest dropped first). 0 = unlimited.
    pub max_log_records: usize,
    /// Allocate mortal wounds from Devastating Wounds after ordinary failed saves.
    pub mortal_wounds_after_normal: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            max_log_records: 0,
            mortal_wounds_after_normal: true,
        }
    }
}

impl EngineConfig {
    /// Set the RNG seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set the roll-record cap (0 = unlimited).
    pub fn with_max_log_records(mut self, max: usize) -> Self {
        self.max_log_records = max;
        self
    }

    /// Choose whether mortal wounds are allocated after ordinary damage.
    pub fn with_mortal_wounds_after_normal(mut self, after: bool) -> Self {
        self.mortal_wounds_after_normal = after;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let cfg = EngineConfig::default();
        assert_eq!(cfg.seed, 42);
        assert_eq!(cfg.max_log_records, 0);
        assert!(cfg.mortal_wounds_after_normal);
    }

    #[test]
    fn builder_chain() {
        let cfg = EngineConfig::default()
            .with_seed(7)
            .with_max_log_records(50)
            .with_mortal_wounds_after_normal(false);
        assert_eq!(cfg.seed, 7);
        assert_eq!(cfg.max_log_records, 50);
        assert!(!cfg.mortal_wounds_after_normal);
    }
}
