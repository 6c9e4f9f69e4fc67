//! Weapon profiles and the structured weapon keyword set.
//!
//! Weapon data arrives with two overlapping sources of rules: an explicit
//! keyword list and a free-text special-rules string ("lance, twin-linked").
//! Both are normalized into [`WeaponKeyword`] values when the profile is
//! built, so resolution code only ever branches on typed capabilities.

use std::fmt;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::dice::DiceExpr;
use crate::error::CoreError;
use crate::ids::WeaponId;
use crate::keyword::KeywordSet;

/// Largest AP magnitude a profile can carry. Anything past it already
/// removes every armor save.
pub const MAX_AP: i32 = 6;

bitflags! {
    /// Boolean view of a weapon's keywords.
    ///
    /// Parameterized keywords (Sustained Hits X, Rapid Fire X, Melta X,
    /// Anti-X Y+) set their flag here and keep their parameter on the
    /// [`WeaponKeyword`] itself.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct WeaponAbilities: u32 {
        /// +1 to hit if the bearer remained stationary.
        const HEAVY              = 1 << 0;
        /// May shoot after advancing.
        const ASSAULT            = 1 << 1;
        /// May shoot while engaged.
        const PISTOL             = 1 << 2;
        /// Hits automatically; the hit roll is skipped.
        const TORRENT            = 1 << 3;
        /// +1 to wound if the bearer charged this turn.
        const LANCE              = 1 << 4;
        /// Critical hits may be allocated to CHARACTER models.
        const PRECISION          = 1 << 5;
        /// Critical hits wound automatically.
        const LETHAL_HITS        = 1 << 6;
        /// Critical hits score extra hits.
        const SUSTAINED_HITS     = 1 << 7;
        /// Critical wounds become mortal wounds.
        const DEVASTATING_WOUNDS = 1 << 8;
        /// Failed wound rolls may be re-rolled.
        const TWIN_LINKED        = 1 << 9;
        /// Extra attacks against large units.
        const BLAST              = 1 << 10;
        /// Extra attacks within half range.
        const RAPID_FIRE         = 1 << 11;
        /// Extra damage within half range.
        const MELTA              = 1 << 12;
        /// The target gains no benefit from cover.
        const IGNORES_COVER      = 1 << 13;
        /// The bearer risks harm when firing.
        const HAZARDOUS          = 1 << 14;
        /// Lower critical-wound threshold against a keyword.
        const ANTI               = 1 << 15;
    }
}

/// A single weapon keyword, with its parameter where it has one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum WeaponKeyword {
    /// Heavy.
    Heavy,
    /// Assault.
    Assault,
    /// Pistol.
    Pistol,
    /// Torrent.
    Torrent,
    /// Lance.
    Lance,
    /// Precision.
    Precision,
    /// Lethal Hits.
    LethalHits,
    /// Sustained Hits X: X extra hits per critical hit.
    SustainedHits(DiceExpr),
    /// Devastating Wounds.
    DevastatingWounds,
    /// Twin-linked.
    TwinLinked,
    /// Blast.
    Blast,
    /// Rapid Fire X: X extra attacks within half range.
    RapidFire(u32),
    /// Melta X: X extra damage within half range.
    Melta(u32),
    /// Ignores Cover.
    IgnoresCover,
    /// Hazardous.
    Hazardous,
    /// Anti-KEYWORD Y+: wound rolls of Y+ against KEYWORD are critical.
    Anti {
        /// The target keyword, upper-cased.
        keyword: String,
        /// Unmodified wound roll at or above which the wound is critical.
        threshold: u8,
    },
}

impl WeaponKeyword {
    /// The boolean flag this keyword contributes.
    pub fn ability(&self) -> WeaponAbilities {
        match self {
            Self::Heavy => WeaponAbilities::HEAVY,
            Self::Assault => WeaponAbilities::ASSAULT,
            Self::Pistol => WeaponAbilities::PISTOL,
            Self::Torrent => WeaponAbilities::TORRENT,
            Self::Lance => WeaponAbilities::LANCE,
            Self::Precision => WeaponAbilities::PRECISION,
            Self::LethalHits => WeaponAbilities::LETHAL_HITS,
            Self::SustainedHits(_) => WeaponAbilities::SUSTAINED_HITS,
            Self::DevastatingWounds => WeaponAbilities::DEVASTATING_WOUNDS,
            Self::TwinLinked => WeaponAbilities::TWIN_LINKED,
            Self::Blast => WeaponAbilities::BLAST,
            Self::RapidFire(_) => WeaponAbilities::RAPID_FIRE,
            Self::Melta(_) => WeaponAbilities::MELTA,
            Self::IgnoresCover => WeaponAbilities::IGNORES_COVER,
            Self::Hazardous => WeaponAbilities::HAZARDOUS,
            Self::Anti { .. } => WeaponAbilities::ANTI,
        }
    }

    /// Parse a single keyword, case-insensitively.
    ///
    /// Accepts "Sustained Hits 2", "sustained hits D3", "rapid fire 1",
    /// "melta 2", "anti-infantry 4+", "twin-linked", "twin_linked" and the
    /// plain keywords. A missing Sustained Hits / Rapid Fire / Melta value
    /// defaults to 1. Returns `None` for anything unrecognized.
    pub fn parse(text: &str) -> Option<Self> {
        let lower = text.trim().to_lowercase();
        if lower.is_empty() {
            return None;
        }

        if let Some(rest) = lower
            .strip_prefix("anti-")
            .or_else(|| lower.strip_prefix("anti "))
        {
            let mut parts = rest.split_whitespace();
            let keyword = parts.next()?;
            let threshold = parts
                .next()
                .map(|t| t.trim_end_matches('+'))
                .and_then(|t| t.parse::<u8>().ok())
                .filter(|t| (2..=6).contains(t))?;
            return Some(Self::Anti {
                keyword: KeywordSet::normalize(keyword),
                threshold,
            });
        }

        let words: Vec<&str> = lower
            .split(|c: char| c.is_whitespace() || c == '-' || c == '_')
            .filter(|w| !w.is_empty())
            .collect();

        match words.as_slice() {
            ["heavy"] => Some(Self::Heavy),
            ["assault"] => Some(Self::Assault),
            ["pistol"] => Some(Self::Pistol),
            ["torrent"] => Some(Self::Torrent),
            ["lance"] => Some(Self::Lance),
            ["precision"] => Some(Self::Precision),
            ["lethal", "hits"] => Some(Self::LethalHits),
            ["devastating", "wounds"] => Some(Self::DevastatingWounds),
            ["twin", "linked"] => Some(Self::TwinLinked),
            ["blast"] => Some(Self::Blast),
            ["ignores", "cover"] => Some(Self::IgnoresCover),
            ["hazardous"] => Some(Self::Hazardous),
            ["sustained", "hits"] => Some(Self::SustainedHits(DiceExpr::fixed(1))),
            ["sustained", "hits", x] => DiceExpr::parse(x).ok().map(Self::SustainedHits),
            ["rapid", "fire"] => Some(Self::RapidFire(1)),
            ["rapid", "fire", x] => x.parse().ok().map(Self::RapidFire),
            ["melta"] => Some(Self::Melta(1)),
            ["melta", x] => x.parse().ok().map(Self::Melta),
            _ => None,
        }
    }
}

impl fmt::Display for WeaponKeyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Heavy => write!(f, "Heavy"),
            Self::Assault => write!(f, "Assault"),
            Self::Pistol => write!(f, "Pistol"),
            Self::Torrent => write!(f, "Torrent"),
            Self::Lance => write!(f, "Lance"),
            Self::Precision => write!(f, "Precision"),
            Self::LethalHits => write!(f, "Lethal Hits"),
            Self::SustainedHits(x) => write!(f, "Sustained Hits {x}"),
            Self::DevastatingWounds => write!(f, "Devastating Wounds"),
            Self::TwinLinked => write!(f, "Twin-linked"),
            Self::Blast => write!(f, "Blast"),
            Self::RapidFire(x) => write!(f, "Rapid Fire {x}"),
            Self::Melta(x) => write!(f, "Melta {x}"),
            Self::IgnoresCover => write!(f, "Ignores Cover"),
            Self::Hazardous => write!(f, "Hazardous"),
            Self::Anti { keyword, threshold } => write!(f, "Anti-{keyword} {threshold}+"),
        }
    }
}

impl TryFrom<String> for WeaponKeyword {
    type Error = CoreError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s).ok_or(CoreError::InvalidField {
            field: "keyword",
            value: s,
        })
    }
}

impl From<WeaponKeyword> for String {
    fn from(k: WeaponKeyword) -> Self {
        k.to_string()
    }
}

/// Split a free-text special-rules string into keywords.
///
/// Entries are separated by commas or semicolons; unrecognized entries
/// are skipped.
pub fn parse_special_rules(text: &str) -> Vec<WeaponKeyword> {
    text.split([',', ';'])
        .filter_map(WeaponKeyword::parse)
        .collect()
}

/// How far a weapon reaches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeaponRange {
    /// A close-combat weapon.
    Melee,
    /// A ranged weapon with a maximum range in inches.
    Ranged(u32),
}

impl fmt::Display for WeaponRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Melee => write!(f, "Melee"),
            Self::Ranged(inches) => write!(f, "{inches}\""),
        }
    }
}

/// The static profile of a weapon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeaponProfile {
    /// Catalog identifier.
    pub id: WeaponId,
    /// Display name.
    pub name: String,
    /// Melee or ranged reach.
    pub range: WeaponRange,
    /// Attacks per model.
    pub attacks: DiceExpr,
    /// Ballistic/weapon skill: the unmodified hit roll needed (2-6).
    pub skill: u8,
    /// Strength, compared against the target's toughness.
    pub strength: u32,
    /// Armor penetration, stored as zero or negative, never below `-MAX_AP`.
    pub ap: i32,
    /// Damage per unsaved wound.
    pub damage: DiceExpr,
    /// The original free-text special rules, kept for display.
    #[serde(default)]
    pub special_rules: String,
    /// Normalized keywords from both the explicit list and the free text.
    #[serde(default)]
    pub keywords: Vec<WeaponKeyword>,
}

impl WeaponProfile {
    /// A 1-attack melee profile (skill 4+, S4, AP0, D1) to refine with builders.
    pub fn new(id: impl Into<WeaponId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            range: WeaponRange::Melee,
            attacks: DiceExpr::fixed(1),
            skill: 4,
            strength: 4,
            ap: 0,
            damage: DiceExpr::fixed(1),
            special_rules: String::new(),
            keywords: Vec::new(),
        }
    }

    /// Set a ranged reach in inches.
    pub fn with_range(mut self, inches: u32) -> Self {
        self.range = WeaponRange::Ranged(inches);
        self
    }

    /// Set the attack count.
    pub fn with_attacks(mut self, attacks: DiceExpr) -> Self {
        self.attacks = attacks;
        self
    }

    /// Set the skill threshold.
    pub fn with_skill(mut self, skill: u8) -> Self {
        self.skill = skill;
        self
    }

    /// Set the strength.
    pub fn with_strength(mut self, strength: u32) -> Self {
        self.strength = strength;
        self
    }

    /// Set armor penetration. Either sign is accepted and stored negative;
    /// the magnitude is capped at [`MAX_AP`].
    pub fn with_ap(mut self, ap: i32) -> Self {
        self.ap = -ap.saturating_abs().min(MAX_AP);
        self
    }

    /// Set the damage expression.
    pub fn with_damage(mut self, damage: DiceExpr) -> Self {
        self.damage = damage;
        self
    }

    /// Add one keyword, ignoring duplicates.
    pub fn with_keyword(mut self, keyword: WeaponKeyword) -> Self {
        self.add_keyword(keyword);
        self
    }

    /// Record free-text special rules and merge the keywords they name.
    pub fn with_special_rules(mut self, text: &str) -> Self {
        for keyword in parse_special_rules(text) {
            self.add_keyword(keyword);
        }
        if !self.special_rules.is_empty() && !text.trim().is_empty() {
            self.special_rules.push_str(", ");
        }
        self.special_rules.push_str(text.trim());
        self
    }

    /// Add a keyword unless an equal one is present.
    pub fn add_keyword(&mut self, keyword: WeaponKeyword) {
        if !self.keywords.contains(&keyword) {
            self.keywords.push(keyword);
        }
    }

    /// Returns true for close-combat weapons.
    pub fn is_melee(&self) -> bool {
        self.range == WeaponRange::Melee
    }

    /// Union of the flags of every keyword.
    pub fn abilities(&self) -> WeaponAbilities {
        self.keywords
            .iter()
            .fold(WeaponAbilities::empty(), |acc, k| acc | k.ability())
    }

    /// Returns true if the weapon carries the given flag(s).
    pub fn has(&self, ability: WeaponAbilities) -> bool {
        self.abilities().contains(ability)
    }

    /// The Sustained Hits value, if any.
    pub fn sustained_hits(&self) -> Option<&DiceExpr> {
        self.keywords.iter().find_map(|k| match k {
            WeaponKeyword::SustainedHits(x) => Some(x),
            _ => None,
        })
    }

    /// The Rapid Fire bonus (0 if absent).
    pub fn rapid_fire(&self) -> u32 {
        self.keywords
            .iter()
            .filter_map(|k| match k {
                WeaponKeyword::RapidFire(x) => Some(*x),
                _ => None,
            })
            .max()
            .unwrap_or(0)
    }

    /// The Melta bonus (0 if absent).
    pub fn melta(&self) -> u32 {
        self.keywords
            .iter()
            .filter_map(|k| match k {
                WeaponKeyword::Melta(x) => Some(*x),
                _ => None,
            })
            .max()
            .unwrap_or(0)
    }

    /// The Anti keyword pairs carried by this weapon.
    pub fn anti(&self) -> impl Iterator<Item = (&str, u8)> {
        self.keywords.iter().filter_map(|k| match k {
            WeaponKeyword::Anti { keyword, threshold } => Some((keyword.as_str(), *threshold)),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dice::Die;

    #[test]
    fn parse_plain_keywords() {
        assert_eq!(WeaponKeyword::parse("HEAVY"), Some(WeaponKeyword::Heavy));
        assert_eq!(WeaponKeyword::parse(" torrent "), Some(WeaponKeyword::Torrent));
        assert_eq!(WeaponKeyword::parse("Lethal Hits"), Some(WeaponKeyword::LethalHits));
        assert_eq!(WeaponKeyword::parse("twin-linked"), Some(WeaponKeyword::TwinLinked));
        assert_eq!(WeaponKeyword::parse("twin_linked"), Some(WeaponKeyword::TwinLinked));
        assert_eq!(
            WeaponKeyword::parse("devastating-wounds"),
            Some(WeaponKeyword::DevastatingWounds)
        );
        assert_eq!(WeaponKeyword::parse("bayonet charge"), None);
        assert_eq!(WeaponKeyword::parse(""), None);
    }

    #[test]
    fn parse_parameterized_keywords() {
        assert_eq!(
            WeaponKeyword::parse("Sustained Hits 2"),
            Some(WeaponKeyword::SustainedHits(DiceExpr::fixed(2)))
        );
        assert_eq!(
            WeaponKeyword::parse("sustained hits d3"),
            Some(WeaponKeyword::SustainedHits(DiceExpr::dice(1, Die::D3)))
        );
        assert_eq!(
            WeaponKeyword::parse("sustained hits"),
            Some(WeaponKeyword::SustainedHits(DiceExpr::fixed(1)))
        );
        assert_eq!(WeaponKeyword::parse("Rapid Fire 2"), Some(WeaponKeyword::RapidFire(2)));
        assert_eq!(WeaponKeyword::parse("melta 4"), Some(WeaponKeyword::Melta(4)));
        assert_eq!(
            WeaponKeyword::parse("Anti-Infantry 4+"),
            Some(WeaponKeyword::Anti {
                keyword: "INFANTRY".to_string(),
                threshold: 4
            })
        );
        assert_eq!(WeaponKeyword::parse("anti-vehicle 9+"), None);
    }

    #[test]
    fn special_rules_combinations() {
        let keywords = parse_special_rules("lance, twin-linked; mystery rule");
        assert_eq!(keywords, vec![WeaponKeyword::Lance, WeaponKeyword::TwinLinked]);
    }

    #[test]
    fn profile_merges_text_and_explicit_keywords() {
        let w = WeaponProfile::new("power_lance", "Power lance")
            .with_keyword(WeaponKeyword::Lance)
            .with_special_rules("Lance, Precision");
        assert_eq!(w.keywords.len(), 2);
        assert!(w.has(WeaponAbilities::LANCE | WeaponAbilities::PRECISION));
        assert!(!w.has(WeaponAbilities::TORRENT));
        assert_eq!(w.special_rules, "Lance, Precision");
    }

    #[test]
    fn ap_stored_negative() {
        assert_eq!(WeaponProfile::new("a", "A").with_ap(2).ap, -2);
        assert_eq!(WeaponProfile::new("a", "A").with_ap(-2).ap, -2);
    }

    #[test]
    fn ap_magnitude_is_capped() {
        assert_eq!(WeaponProfile::new("a", "A").with_ap(-9).ap, -MAX_AP);
        assert_eq!(WeaponProfile::new("a", "A").with_ap(i32::MIN).ap, -MAX_AP);
        assert_eq!(WeaponProfile::new("a", "A").with_ap(i32::MAX).ap, -MAX_AP);
    }

    #[test]
    fn parameter_accessors() {
        let w = WeaponProfile::new("m", "Meltagun")
            .with_range(12)
            .with_special_rules("melta 2, rapid fire 1, anti-vehicle 4+, sustained hits 1");
        assert!(!w.is_melee());
        assert_eq!(w.melta(), 2);
        assert_eq!(w.rapid_fire(), 1);
        assert_eq!(w.sustained_hits(), Some(&DiceExpr::fixed(1)));
        assert_eq!(w.anti().collect::<Vec<_>>(), vec![("VEHICLE", 4)]);
    }

    #[test]
    fn keyword_display_parses_back() {
        for k in [
            WeaponKeyword::TwinLinked,
            WeaponKeyword::SustainedHits(DiceExpr::dice(1, Die::D3)),
            WeaponKeyword::Anti {
                keyword: "MONSTER".to_string(),
                threshold: 2,
            },
        ] {
            assert_eq!(WeaponKeyword::parse(&k.to_string()), Some(k));
        }
    }
}
