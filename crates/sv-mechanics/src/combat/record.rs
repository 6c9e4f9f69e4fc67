//! The audit log: one record per roll batch.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Which part of the sequence a record belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Rolling the number of attacks.
    Attacks,
    /// Hit rolls.
    Hit,
    /// Extra hits from critical hits.
    SustainedHits,
    /// Wound rolls.
    Wound,
    /// Saving throws.
    Save,
    /// Damage rolls and allocation.
    Damage,
    /// Feel No Pain rolls against incoming damage.
    FeelNoPain,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Attacks => "attacks",
            Self::Hit => "hit",
            Self::SustainedHits => "sustained_hits",
            Self::Wound => "wound",
            Self::Save => "save",
            Self::Damage => "damage",
            Self::FeelNoPain => "feel_no_pain",
        };
        write!(f, "{s}")
    }
}

/// A die that was re-rolled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reroll {
    /// Position of the die in [`RollRecord::dice`].
    pub index: usize,
    /// The value before the re-roll.
    pub original: u32,
    /// The value kept.
    pub value: u32,
}

/// One batch of dice, as rolled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollRecord {
    /// Position of the assignment within the action.
    pub assignment: usize,
    /// The stage this batch belongs to.
    pub stage: Stage,
    /// Free-form context, e.g. `"bolter vs squad-b"`.
    pub context: String,
    /// Die values kept, before modifiers.
    pub dice: Vec<u32>,
    /// The roll needed, if the batch was tested against one.
    pub threshold: Option<u8>,
    /// Net modifier applied to each die.
    pub modifier: i32,
    /// Dice that passed, or the total produced for attack and damage rolls.
    pub successes: u32,
    /// Results granted without a roll (torrent hits, lethal hits, fixed bonuses).
    pub automatic: u32,
    /// Re-rolls that happened.
    pub rerolls: Vec<Reroll>,
}

impl RollRecord {
    /// An empty record for `stage`.
    pub fn new(assignment: usize, stage: Stage, context: impl Into<String>) -> Self {
        Self {
            assignment,
            stage,
            context: context.into(),
            dice: Vec::new(),
            threshold: None,
            modifier: 0,
            successes: 0,
            automatic: 0,
            rerolls: Vec::new(),
        }
    }

    /// Set the threshold.
    pub fn with_threshold(mut self, threshold: u8) -> Self {
        self.threshold = Some(threshold);
        self
    }

    /// Set the net modifier.
    pub fn with_modifier(mut self, modifier: i32) -> Self {
        self.modifier = modifier;
        self
    }
}

impl fmt::Display for RollRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} {} {}", self.assignment, self.stage, self.context)?;
        if let Some(t) = self.threshold {
            write!(f, " {t}+")?;
        }
        if self.modifier != 0 {
            write!(f, " ({:+})", self.modifier)?;
        }
        let dice: Vec<String> = self.dice.iter().map(u32::to_string).collect();
        write!(f, ": [{}] -> {}", dice.join(", "), self.successes)?;
        if self.automatic > 0 {
            write!(f, " ({} auto)", self.automatic)?;
        }
        for r in &self.rerolls {
            write!(f, " r{}:{}>{}", r.index, r.original, r.value)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_hit_batch() {
        let mut record = RollRecord::new(0, Stage::Hit, "bolter vs squad-b")
            .with_threshold(3)
            .with_modifier(1);
        record.dice = vec![4, 2, 6];
        record.successes = 2;
        record.rerolls.push(Reroll {
            index: 0,
            original: 1,
            value: 4,
        });
        insta::assert_snapshot!(record.to_string(), @"#0 hit bolter vs squad-b 3+ (+1): [4, 2, 6] -> 2 r0:1>4");
    }

    #[test]
    fn display_automatic_batch() {
        let mut record = RollRecord::new(1, Stage::Hit, "flamer vs squad-b");
        record.successes = 5;
        record.automatic = 5;
        insta::assert_snapshot!(record.to_string(), @"#1 hit flamer vs squad-b: [] -> 5 (5 auto)");
    }

    #[test]
    fn serializes_stage_in_snake_case() {
        let json = serde_json::to_string(&Stage::FeelNoPain).unwrap();
        assert_eq!(json, "\"feel_no_pain\"");
    }
}
