//! Outfit configuration: the choices made before the drive leaves San Antonio.
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{
    EXTRA_CREW_MAX, EXTRA_HORSES_MAX, EXTRA_SUPPLIES_MAX, HERD_CONDITION_BY_HEAD_PER_HAND,
    HERD_SIZE_MAX, HERD_SIZE_MIN, PERCENT_MAX, SPARE_PARTS_MAX, STANDARD_CREW, STANDARD_HERD,
    STANDARD_HORSES, STANDARD_SUPPLIES,
};
use crate::ledger::{Ledger, ResourceKey};

/// Errors raised when an outfit falls outside what the trail store offers.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum OutfitError {
    #[error("{field} must be between {min} and {max} (got {value})")]
    OutOfRange {
        field: &'static str,
        min: i32,
        max: i32,
        value: i32,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Armament {
    #[default]
    Unarmed,
    Sidearms,
    Rifles,
}

impl Armament {
    /// Starting ammunition, or `None` when the outfit carries no guns.
    #[must_use]
    pub const fn starting_ammo(self) -> Option<i32> {
        match self {
            Self::Unarmed => None,
            Self::Sidearms => Some(40),
            Self::Rifles => Some(80),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum WageTier {
    Low,
    #[default]
    Standard,
    High,
}

impl WageTier {
    #[must_use]
    pub const fn starting_morale(self) -> i32 {
        match self {
            Self::Low => 45,
            Self::Standard => 55,
            Self::High => 65,
        }
    }
}

/// Everything the outfit screen lets the player pick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutfitConfig {
    pub herd_size: i32,
    #[serde(default)]
    pub extra_crew: i32,
    #[serde(default)]
    pub extra_horses: i32,
    #[serde(default)]
    pub extra_supplies: i32,
    /// Seeds `ammo`. No built-in rule reads it; catalog effects can spend it.
    #[serde(default)]
    pub armament: Armament,
    /// Seeds `spareParts`, on the same terms as `armament`.
    #[serde(default)]
    pub spare_parts: i32,
    #[serde(default)]
    pub wage_tier: WageTier,
}

impl Default for OutfitConfig {
    fn default() -> Self {
        Self {
            herd_size: STANDARD_HERD,
            extra_crew: 0,
            extra_horses: 0,
            extra_supplies: 0,
            armament: Armament::Unarmed,
            spare_parts: 0,
            wage_tier: WageTier::Standard,
        }
    }
}

impl OutfitConfig {
    /// Check every field against the store limits.
    ///
    /// # Errors
    ///
    /// Returns the first field outside its allowed range.
    pub fn validate(&self) -> Result<(), OutfitError> {
        check("herd_size", self.herd_size, HERD_SIZE_MIN, HERD_SIZE_MAX)?;
        check("extra_crew", self.extra_crew, 0, EXTRA_CREW_MAX)?;
        check("extra_horses", self.extra_horses, 0, EXTRA_HORSES_MAX)?;
        check("extra_supplies", self.extra_supplies, 0, EXTRA_SUPPLIES_MAX)?;
        check("spare_parts", self.spare_parts, 0, SPARE_PARTS_MAX)?;
        Ok(())
    }

    #[must_use]
    pub const fn crew(&self) -> i32 {
        STANDARD_CREW + self.extra_crew
    }

    #[must_use]
    pub const fn horses(&self) -> i32 {
        STANDARD_HORSES + self.extra_horses
    }

    /// Starting herd condition from the head-per-hand table.
    #[must_use]
    pub fn starting_herd_condition(&self) -> i32 {
        let head_per_hand = self.herd_size / self.crew().max(1);
        HERD_CONDITION_BY_HEAD_PER_HAND
            .iter()
            .find(|(ceiling, _)| head_per_hand <= *ceiling)
            .map_or(0, |(_, condition)| *condition)
    }

    /// Build the starting ledger. Herd, crew and horse ceilings are the
    /// starting counts; nothing on the trail adds head or hands. `ammo` and
    /// `spareParts` are tracked only when the outfit carries them, and only
    /// event effects move them.
    ///
    /// # Errors
    ///
    /// Returns an error if the outfit fails [`OutfitConfig::validate`].
    pub fn seed_ledger(&self) -> Result<Ledger, OutfitError> {
        self.validate()?;
        let mut ledger = Ledger::new()
            .with_resource(ResourceKey::Herd, self.herd_size, self.herd_size)
            .with_resource(ResourceKey::Crew, self.crew(), self.crew())
            .with_resource(ResourceKey::Horses, self.horses(), self.horses())
            .with_resource(
                ResourceKey::Supplies,
                STANDARD_SUPPLIES + self.extra_supplies,
                PERCENT_MAX,
            )
            .with_resource(
                ResourceKey::Morale,
                self.wage_tier.starting_morale(),
                PERCENT_MAX,
            )
            .with_resource(
                ResourceKey::HerdCondition,
                self.starting_herd_condition(),
                PERCENT_MAX,
            );
        if let Some(ammo) = self.armament.starting_ammo() {
            ledger.track(ResourceKey::Ammo, ammo, PERCENT_MAX);
        }
        if self.spare_parts > 0 {
            ledger.track(ResourceKey::SpareParts, self.spare_parts, SPARE_PARTS_MAX);
        }
        Ok(ledger)
    }
}

const fn check(field: &'static str, value: i32, min: i32, max: i32) -> Result<(), OutfitError> {
    if value < min || value > max {
        return Err(OutfitError::OutOfRange {
            field,
            min,
            max,
            value,
        });
    }
    Ok(())
}
