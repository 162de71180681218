//! Bounded resource ledger.
//!
//! Every resource the drive tracks lives here with its own ceiling. All
//! mutation goes through [`Ledger::set`] and [`Ledger::delta`], both of which
//! saturate at `0..=max`; nothing outside those bounds is ever stored.
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Floor shared by every resource.
pub const RESOURCE_MIN: i32 = 0;

/// Closed set of resource keys the simulation understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ResourceKey {
    Herd,
    Crew,
    Horses,
    Supplies,
    Morale,
    HerdCondition,
    Ammo,
    SpareParts,
}

impl ResourceKey {
    pub const ALL: [Self; 8] = [
        Self::Herd,
        Self::Crew,
        Self::Horses,
        Self::Supplies,
        Self::Morale,
        Self::HerdCondition,
        Self::Ammo,
        Self::SpareParts,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Herd => "herd",
            Self::Crew => "crew",
            Self::Horses => "horses",
            Self::Supplies => "supplies",
            Self::Morale => "morale",
            Self::HerdCondition => "herdCondition",
            Self::Ammo => "ammo",
            Self::SpareParts => "spareParts",
        }
    }
}

impl fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceKey {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|key| key.as_str() == s)
            .ok_or(())
    }
}

/// Signed resource deltas keyed by resource name.
///
/// Keys stay as strings so catalog data can mention resources a given outfit
/// does not track; those entries are skipped when applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct Effects(BTreeMap<String, i32>);

impl Effects {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn from_pairs(pairs: &[(ResourceKey, i32)]) -> Self {
        Self(
            pairs
                .iter()
                .map(|(key, amount)| (key.as_str().to_string(), *amount))
                .collect(),
        )
    }

    /// Delta for a key, zero when absent.
    #[must_use]
    pub fn get(&self, key: ResourceKey) -> i32 {
        self.0.get(key.as_str()).copied().unwrap_or(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, i32)> {
        self.0.iter().map(|(key, amount)| (key.as_str(), *amount))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Value and ceiling for one tracked resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceSlot {
    pub value: i32,
    pub max: i32,
}

/// Resource vector owned by a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(from = "RawLedger")]
pub struct Ledger {
    slots: BTreeMap<ResourceKey, ResourceSlot>,
}

/// Wire shape of [`Ledger`]; every slot is re-tracked on the way in.
#[derive(Deserialize)]
struct RawLedger {
    #[serde(default)]
    slots: BTreeMap<ResourceKey, ResourceSlot>,
}

impl From<RawLedger> for Ledger {
    fn from(raw: RawLedger) -> Self {
        let mut ledger = Self::new();
        for (key, slot) in raw.slots {
            ledger.track(key, slot.value, slot.max);
        }
        ledger
    }
}

impl Ledger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`Ledger::track`].
    #[must_use]
    pub fn with_resource(mut self, key: ResourceKey, value: i32, max: i32) -> Self {
        self.track(key, value, max);
        self
    }

    /// Start tracking `key` with the given ceiling. This is the only way bounds
    /// are created; the starting value is clamped like any other write.
    pub fn track(&mut self, key: ResourceKey, value: i32, max: i32) {
        let max = max.max(RESOURCE_MIN);
        self.slots.insert(
            key,
            ResourceSlot {
                value: value.clamp(RESOURCE_MIN, max),
                max,
            },
        );
    }

    #[must_use]
    pub fn tracks(&self, key: ResourceKey) -> bool {
        self.slots.contains_key(&key)
    }

    /// Current value, or zero for an untracked resource.
    #[must_use]
    pub fn get(&self, key: ResourceKey) -> i32 {
        self.slots.get(&key).map_or(0, |slot| slot.value)
    }

    #[must_use]
    pub fn max(&self, key: ResourceKey) -> Option<i32> {
        self.slots.get(&key).map(|slot| slot.max)
    }

    /// Store `value` clamped into bounds. Returns `false` for untracked keys.
    pub fn set(&mut self, key: ResourceKey, value: i32) -> bool {
        let Some(slot) = self.slots.get_mut(&key) else {
            return false;
        };
        slot.value = value.clamp(RESOURCE_MIN, slot.max);
        true
    }

    /// Add a signed amount and clamp. Returns the change that actually landed,
    /// or `None` when the key is untracked.
    pub fn delta(&mut self, key: ResourceKey, amount: i32) -> Option<i32> {
        let slot = self.slots.get_mut(&key)?;
        let before = slot.value;
        slot.value = before.saturating_add(amount).clamp(RESOURCE_MIN, slot.max);
        Some(slot.value - before)
    }

    /// Apply every entry of an effect map. Unknown and untracked keys are skipped.
    pub fn apply(&mut self, effects: &Effects) {
        for (name, amount) in effects.iter() {
            match name.parse::<ResourceKey>() {
                Ok(key) => {
                    if self.delta(key, amount).is_none() {
                        log::debug!("ledger skip: {key} is not tracked by this outfit");
                    }
                }
                Err(()) => log::warn!("ledger skip: unknown resource key {name:?}"),
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (ResourceKey, ResourceSlot)> + '_ {
        self.slots.iter().map(|(key, slot)| (*key, *slot))
    }
}
