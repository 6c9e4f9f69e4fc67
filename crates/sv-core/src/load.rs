//! Conversion of loosely-typed JSON records into the typed model.
//!
//! Board and catalog files in the wild mix representations: an invulnerable
//! save may be `4`, `"4"` or `"4+"`, AP may be `1` or `-1`, keywords may be
//! a list or one comma-separated string, and weapon rules may sit in a
//! free-text string. Every such variation is resolved here, once, so the
//! engine never type-checks at resolution time.

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::board::Board;
use crate::dice::DiceExpr;
use crate::error::{CoreError, CoreResult};
use crate::ids::{ModelId, UnitId, WeaponId};
use crate::keyword::KeywordSet;
use crate::unit::{Model, StatBlock, Unit, UnitFlags, UnitStatus};
use crate::weapon::{MAX_AP, WeaponKeyword, WeaponProfile, WeaponRange};

/// Threshold value meaning "no save of this kind".
pub const NO_SAVE: u8 = 7;

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum Loose {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl Loose {
    fn describe(&self) -> String {
        match self {
            Self::Bool(b) => b.to_string(),
            Self::Int(n) => n.to_string(),
            Self::Float(x) => x.to_string(),
            Self::Text(s) => format!("\"{s}\""),
        }
    }

    fn as_integer(&self, field: &'static str) -> CoreResult<i64> {
        let invalid = || CoreError::InvalidField {
            field,
            value: self.describe(),
        };
        match self {
            Self::Int(n) => Ok(*n),
            Self::Float(x) if x.fract() == 0.0 => Ok(*x as i64),
            Self::Text(s) => s
                .trim()
                .trim_end_matches(['+', '"'])
                .trim()
                .parse::<i64>()
                .map_err(|_| invalid()),
            _ => Err(invalid()),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum LooseList {
    One(String),
    Many(Vec<String>),
}

impl LooseList {
    fn items(&self) -> Vec<String> {
        match self {
            Self::One(s) => s
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
            Self::Many(v) => v.clone(),
        }
    }
}

/// Save-like threshold: `None` when absent, 0, "-", or 7+.
fn threshold(field: &'static str, value: Option<&Loose>) -> CoreResult<Option<u8>> {
    let Some(value) = value else {
        return Ok(None);
    };
    if let Loose::Text(s) = value {
        let t = s.trim();
        if t.is_empty() || t == "-" || t.eq_ignore_ascii_case("none") {
            return Ok(None);
        }
    }
    match value.as_integer(field)? {
        0 => Ok(None),
        n if n < 0 => Err(CoreError::InvalidField {
            field,
            value: value.describe(),
        }),
        n if n >= i64::from(NO_SAVE) => Ok(None),
        n => Ok(Some((n as u8).max(2))),
    }
}

fn number(field: &'static str, value: &Loose) -> CoreResult<u32> {
    let n = value.as_integer(field)?;
    u32::try_from(n).map_err(|_| CoreError::InvalidField {
        field,
        value: value.describe(),
    })
}

fn number_or(field: &'static str, value: Option<&Loose>, default: u32) -> CoreResult<u32> {
    value.map_or(Ok(default), |v| number(field, v))
}

fn boolean(field: &'static str, value: &Loose) -> CoreResult<bool> {
    match value {
        Loose::Bool(b) => Ok(*b),
        Loose::Int(n) => Ok(*n != 0),
        Loose::Text(s) => match s.trim().to_lowercase().as_str() {
            "true" | "yes" | "1" => Ok(true),
            "false" | "no" | "0" | "" => Ok(false),
            _ => Err(CoreError::InvalidField {
                field,
                value: value.describe(),
            }),
        },
        Loose::Float(_) => Err(CoreError::InvalidField {
            field,
            value: value.describe(),
        }),
    }
}

fn dice(field: &'static str, value: &Loose) -> CoreResult<DiceExpr> {
    match value {
        Loose::Text(s) => DiceExpr::parse(s),
        other => {
            let n = number(field, other)?;
            if i32::try_from(n).is_err() {
                return Err(CoreError::InvalidField {
                    field,
                    value: other.describe(),
                });
            }
            Ok(DiceExpr::fixed(n))
        }
    }
}

fn range(value: Option<&Loose>) -> CoreResult<WeaponRange> {
    match value {
        None => Ok(WeaponRange::Melee),
        Some(Loose::Text(s)) if s.trim().eq_ignore_ascii_case("melee") => Ok(WeaponRange::Melee),
        Some(v) => match number("range", v)? {
            0 => Ok(WeaponRange::Melee),
            inches => Ok(WeaponRange::Ranged(inches)),
        },
    }
}

fn keywords(list: Option<&LooseList>) -> KeywordSet {
    list.map(|l| l.items().into_iter().collect())
        .unwrap_or_default()
}

#[derive(Debug, Deserialize)]
struct RawWeapon {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    range: Option<Loose>,
    #[serde(default, alias = "a")]
    attacks: Option<Loose>,
    #[serde(default, alias = "bs", alias = "ws")]
    skill: Option<Loose>,
    #[serde(default, alias = "s")]
    strength: Option<Loose>,
    #[serde(default)]
    ap: Option<Loose>,
    #[serde(default, alias = "d")]
    damage: Option<Loose>,
    #[serde(default, alias = "abilities")]
    special_rules: Option<String>,
    #[serde(default)]
    keywords: Option<LooseList>,
}

impl RawWeapon {
    fn into_profile(self, fallback_id: Option<&str>) -> CoreResult<WeaponProfile> {
        let id = self
            .id
            .clone()
            .or_else(|| fallback_id.map(str::to_string))
            .or_else(|| self.name.clone())
            .ok_or(CoreError::MissingField {
                field: "id",
                record: "weapon".to_string(),
            })?;
        let missing = |field: &'static str| CoreError::MissingField {
            field,
            record: format!("weapon {id}"),
        };

        let attacks = dice("attacks", self.attacks.as_ref().ok_or_else(|| missing("attacks"))?)?;
        let skill = match &self.skill {
            // Torrent weapons are often listed with "N/A" skill.
            Some(Loose::Text(s)) if s.trim().eq_ignore_ascii_case("n/a") => NO_SAVE - 1,
            other => threshold("skill", other.as_ref())?.ok_or_else(|| missing("skill"))?,
        };
        let strength = number("strength", self.strength.as_ref().ok_or_else(|| missing("strength"))?)?;
        let ap = match &self.ap {
            Some(v) => i32::try_from(v.as_integer("ap")?)
                .ok()
                .filter(|ap| (-MAX_AP..=MAX_AP).contains(ap))
                .ok_or_else(|| CoreError::InvalidField {
                    field: "ap",
                    value: v.describe(),
                })?,
            None => 0,
        };
        let damage = match &self.damage {
            Some(v) => dice("damage", v)?,
            None => DiceExpr::fixed(1),
        };

        let mut profile = WeaponProfile::new(WeaponId::new(id.clone()), self.name.unwrap_or(id))
            .with_attacks(attacks)
            .with_skill(skill)
            .with_strength(strength)
            .with_ap(ap)
            .with_damage(damage);
        profile.range = range(self.range.as_ref())?;

        for entry in self.keywords.as_ref().map(LooseList::items).unwrap_or_default() {
            if let Some(keyword) = WeaponKeyword::parse(&entry) {
                profile.add_keyword(keyword);
            }
        }
        if let Some(text) = self.special_rules.as_deref() {
            profile = profile.with_special_rules(text);
        }
        Ok(profile)
    }
}

#[derive(Debug, Deserialize)]
struct RawStats {
    #[serde(default, alias = "t")]
    toughness: Option<Loose>,
    #[serde(default, alias = "sv")]
    save: Option<Loose>,
    #[serde(default, alias = "w")]
    wounds: Option<Loose>,
    #[serde(default, alias = "ld")]
    leadership: Option<Loose>,
    #[serde(default, alias = "oc")]
    objective_control: Option<Loose>,
    #[serde(default, alias = "invuln", alias = "invulnerable_save")]
    invulnerable: Option<Loose>,
    #[serde(default, alias = "fnp")]
    feel_no_pain: Option<Loose>,
}

impl RawStats {
    fn into_stats(self) -> CoreResult<StatBlock> {
        let defaults = StatBlock::default();
        Ok(StatBlock {
            toughness: number_or("toughness", self.toughness.as_ref(), defaults.toughness)?.max(1),
            save: threshold("save", self.save.as_ref())?.unwrap_or(NO_SAVE),
            wounds: number_or("wounds", self.wounds.as_ref(), defaults.wounds)?.max(1),
            leadership: threshold("leadership", self.leadership.as_ref())?
                .unwrap_or(defaults.leadership),
            objective_control: number_or(
                "objective_control",
                self.objective_control.as_ref(),
                defaults.objective_control,
            )?,
            invulnerable: threshold("invulnerable", self.invulnerable.as_ref())?,
            feel_no_pain: threshold("feel_no_pain", self.feel_no_pain.as_ref())?,
        })
    }
}

#[derive(Debug, Deserialize)]
struct RawModel {
    id: String,
    #[serde(default, alias = "max_wounds")]
    wounds: Option<Loose>,
    #[serde(default, alias = "current_wounds", alias = "remaining_wounds")]
    current: Option<Loose>,
    #[serde(default)]
    alive: Option<Loose>,
    #[serde(default)]
    keywords: Option<LooseList>,
    #[serde(default, alias = "invuln")]
    invulnerable: Option<Loose>,
}

impl RawModel {
    fn into_model(self, default_wounds: u32) -> CoreResult<Model> {
        let max_wounds = number_or("wounds", self.wounds.as_ref(), default_wounds)?.max(1);
        let current = number_or("current_wounds", self.current.as_ref(), max_wounds)?.min(max_wounds);
        let alive = match &self.alive {
            Some(v) => boolean("alive", v)?,
            None => true,
        };

        let mut model = Model::new(ModelId::new(self.id), max_wounds);
        model.wounds = if alive { current } else { 0 };
        model.alive = alive && current > 0;
        model.keywords = self.keywords.as_ref().map(|l| keywords(Some(l)));
        model.invulnerable = threshold("invulnerable", self.invulnerable.as_ref())?;
        Ok(model)
    }
}

#[derive(Debug, Deserialize)]
struct RawUnit {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default, alias = "side", alias = "player")]
    owner: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    keywords: Option<LooseList>,
    stats: RawStats,
    #[serde(default)]
    models: Vec<RawModel>,
    #[serde(default)]
    weapons: Vec<RawWeapon>,
    #[serde(default)]
    flags: BTreeMap<String, Loose>,
}

impl RawUnit {
    fn into_unit(self, fallback_id: Option<&str>) -> CoreResult<Unit> {
        let id = self
            .id
            .or_else(|| fallback_id.map(str::to_string))
            .ok_or(CoreError::MissingField {
                field: "id",
                record: "unit".to_string(),
            })?;
        let stats = self.stats.into_stats()?;
        let default_wounds = stats.wounds;

        let mut unit = Unit::new(UnitId::new(id.clone()), self.name.unwrap_or_else(|| id.clone()), self.owner.unwrap_or_default())
            .with_stats(stats)
            .with_keywords(keywords(self.keywords.as_ref()));
        unit.status = match self.status.as_deref().map(str::trim) {
            Some(s) if s.eq_ignore_ascii_case("reserves") => UnitStatus::Reserves,
            Some(s) if s.eq_ignore_ascii_case("destroyed") => UnitStatus::Destroyed,
            _ => UnitStatus::Active,
        };
        for raw in self.models {
            unit.models.push(raw.into_model(default_wounds)?);
        }
        for raw in self.weapons {
            unit.weapons.push(raw.into_profile(None)?);
        }
        unit.flags = flags(&self.flags)?;
        unit.refresh_status();
        Ok(unit)
    }
}

/// Read the conventional flag names; keys owned by other subsystems are ignored.
fn flags(raw: &BTreeMap<String, Loose>) -> CoreResult<UnitFlags> {
    let mut flags = UnitFlags::default();
    for (key, value) in raw {
        match key.as_str() {
            "effect_invuln" => flags.invulnerable = threshold("effect_invuln", Some(value))?,
            "effect_cover" => flags.cover = boolean("effect_cover", value)?,
            "effect_stealth" => flags.stealth = boolean("effect_stealth", value)?,
            "effect_precision_melee" => {
                flags.precision_melee = boolean("effect_precision_melee", value)?;
            }
            "battle_shocked" => flags.battle_shocked = boolean("battle_shocked", value)?,
            "charged_this_turn" => flags.charged_this_turn = boolean("charged_this_turn", value)?,
            "remained_stationary" => {
                flags.remained_stationary = boolean("remained_stationary", value)?;
            }
            _ => {}
        }
    }
    Ok(flags)
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawCollection<T> {
    Map(BTreeMap<String, T>),
    List(Vec<T>),
}

/// Load a board from JSON: an object keyed by unit id, or a list of units.
pub fn board_from_json(json: &str) -> CoreResult<Board> {
    let raw: RawCollection<RawUnit> = serde_json::from_str(json)?;
    let mut board = Board::new();
    match raw {
        RawCollection::Map(map) => {
            for (key, unit) in map {
                board.insert(unit.into_unit(Some(&key))?)?;
            }
        }
        RawCollection::List(list) => {
            for unit in list {
                board.insert(unit.into_unit(None)?)?;
            }
        }
    }
    Ok(board)
}

/// Load weapon profiles from JSON: an object keyed by weapon id, or a list.
pub fn weapons_from_json(json: &str) -> CoreResult<Vec<WeaponProfile>> {
    let raw: RawCollection<RawWeapon> = serde_json::from_str(json)?;
    match raw {
        RawCollection::Map(map) => map
            .into_iter()
            .map(|(key, w)| w.into_profile(Some(&key)))
            .collect(),
        RawCollection::List(list) => list.into_iter().map(|w| w.into_profile(None)).collect(),
    }
}
