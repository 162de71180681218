//! Pace table: miles per day against per-turn resource cost.
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::constants::{EXTRA_HANDS_PER_SUPPLY, STANDARD_CREW};
use crate::ledger::Effects;

const DEFAULT_PACING_DATA: &str = include_str!("../assets/data/pacing.json");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PaceId {
    Easy,
    #[default]
    Normal,
    Push,
}

impl PaceId {
    pub const ALL: [Self; 3] = [Self::Easy, Self::Normal, Self::Push];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Easy => "easy",
            Self::Normal => "normal",
            Self::Push => "push",
        }
    }
}

impl fmt::Display for PaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaceId {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "easy" => Ok(Self::Easy),
            "normal" => Ok(Self::Normal),
            "push" => Ok(Self::Push),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaceCfg {
    pub id: PaceId,
    pub name: String,
    #[serde(default)]
    pub desc: String,
    pub miles_per_day: u32,
    /// Applied through the ledger once per turn.
    #[serde(default)]
    pub effects: Effects,
    /// Passive supply use per turn for a standard crew.
    #[serde(default = "default_supply_drain")]
    pub supply_drain: i32,
}

const fn default_supply_drain() -> i32 {
    1
}

impl PaceCfg {
    /// Supplies consumed per turn by `crew` hands at this pace.
    #[must_use]
    pub fn supply_drain_for(&self, crew: i32) -> i32 {
        let extra_hands = (crew - STANDARD_CREW).max(0);
        self.supply_drain + extra_hands / EXTRA_HANDS_PER_SUPPLY
    }
}

/// Errors raised when the pace table cannot drive a run.
#[derive(Debug, Error)]
pub enum PacingError {
    #[error("pace table is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("pace table has no entry for {0}")]
    MissingPace(PaceId),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct PacingConfig {
    #[serde(default)]
    pub pace: Vec<PaceCfg>,
}

impl PacingConfig {
    /// Load pacing data from JSON. Every [`PaceId`] must have an entry.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed or a pace is missing.
    pub fn from_json(json: &str) -> Result<Self, PacingError> {
        let cfg: Self = serde_json::from_str(json)?;
        if let Some(missing) = PaceId::ALL.into_iter().find(|pace| cfg.get(*pace).is_none()) {
            return Err(PacingError::MissingPace(missing));
        }
        Ok(cfg)
    }

    /// The built-in pace table.
    ///
    /// # Errors
    ///
    /// Returns an error if the embedded asset is invalid.
    pub fn load_from_static() -> Result<Self, PacingError> {
        Self::from_json(DEFAULT_PACING_DATA)
    }

    #[must_use]
    pub fn get(&self, pace: PaceId) -> Option<&PaceCfg> {
        self.pace.iter().find(|cfg| cfg.id == pace)
    }

    /// Pace settings for `pace`, falling back to the first configured pace.
    #[must_use]
    pub fn get_pace_safe(&self, pace: PaceId) -> PaceCfg {
        self.get(pace)
            .cloned()
            .or_else(|| self.pace.first().cloned())
            .unwrap_or_else(|| PaceCfg {
                id: pace,
                name: pace.as_str().to_string(),
                desc: String::new(),
                miles_per_day: 0,
                effects: Effects::new(),
                supply_drain: default_supply_drain(),
            })
    }
}
