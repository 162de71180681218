use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use thiserror::Error;

use crate::catalog::Event;
use crate::constants::{
    DAYS_PER_TURN, FAIL_CREW_AT_OR_BELOW, FAIL_HERD_AT_OR_BELOW, FAIL_HORSES_AT_OR_BELOW,
    START_DAY, TOTAL_DAYS, TOTAL_DISTANCE_MILES,
};
use crate::ledger::{Ledger, ResourceKey, ResourceSlot};
use crate::outfit::{OutfitConfig, OutfitError};
use crate::pacing::PaceId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum GamePhase {
    #[default]
    Configuring,
    Traveling,
    EventPresented,
    ResultShown,
    Terminal,
}

impl GamePhase {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Configuring => "configuring",
            Self::Traveling => "traveling",
            Self::EventPresented => "event_presented",
            Self::ResultShown => "result_shown",
            Self::Terminal => "terminal",
        }
    }
}

impl fmt::Display for GamePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which count dropped through its floor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollapseCause {
    Crew,
    Herd,
    Horses,
}

impl CollapseCause {
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Crew => "crew",
            Self::Herd => "herd",
            Self::Horses => "horses",
        }
    }

    #[must_use]
    pub const fn resource(self) -> ResourceKey {
        match self {
            Self::Crew => ResourceKey::Crew,
            Self::Herd => ResourceKey::Herd,
            Self::Horses => ResourceKey::Horses,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Ending {
    Failed { cause: CollapseCause },
    Delivered,
    SoldEarly,
}

impl Ending {
    #[must_use]
    pub const fn survived(self) -> bool {
        !matches!(self, Self::Failed { .. })
    }
}

impl fmt::Display for Ending {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Failed { cause } => write!(f, "failed ({})", cause.key()),
            Self::Delivered => f.write_str("delivered"),
            Self::SoldEarly => f.write_str("sold early"),
        }
    }
}

/// One line of the decision log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    /// Event title as shown to the player.
    pub event: String,
    pub choice: String,
    pub day: u32,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CampaignError {
    #[error("{field} must be at least 1 (got {value})")]
    Zero { field: &'static str, value: u32 },
    #[error("start_day ({start_day}) must not be after total_days ({total_days})")]
    StartAfterEnd { start_day: u32, total_days: u32 },
}

/// Campaign length and the floors that end a drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CampaignCfg {
    pub total_days: u32,
    pub days_per_turn: u32,
    pub total_distance: u32,
    pub start_day: u32,
    pub fail_crew_at_or_below: i32,
    pub fail_herd_at_or_below: i32,
    pub fail_horses_at_or_below: i32,
}

impl Default for CampaignCfg {
    fn default() -> Self {
        Self {
            total_days: TOTAL_DAYS,
            days_per_turn: DAYS_PER_TURN,
            total_distance: TOTAL_DISTANCE_MILES,
            start_day: START_DAY,
            fail_crew_at_or_below: FAIL_CREW_AT_OR_BELOW,
            fail_herd_at_or_below: FAIL_HERD_AT_OR_BELOW,
            fail_horses_at_or_below: FAIL_HORSES_AT_OR_BELOW,
        }
    }
}

impl CampaignCfg {
    /// # Errors
    ///
    /// Returns an error when a length is zero or the drive would start after it ends.
    pub fn validate(&self) -> Result<(), CampaignError> {
        for (field, value) in [
            ("total_days", self.total_days),
            ("days_per_turn", self.days_per_turn),
            ("total_distance", self.total_distance),
        ] {
            if value == 0 {
                return Err(CampaignError::Zero { field, value });
            }
        }
        if self.start_day > self.total_days {
            return Err(CampaignError::StartAfterEnd {
                start_day: self.start_day,
                total_days: self.total_days,
            });
        }
        Ok(())
    }

    /// Day the calendar stops at: one past the last campaign day.
    #[must_use]
    pub const fn last_day(&self) -> u32 {
        self.total_days + 1
    }

    /// First floor breached, checked crew, then herd, then horses.
    #[must_use]
    pub fn collapse(&self, ledger: &Ledger) -> Option<CollapseCause> {
        if ledger.get(ResourceKey::Crew) <= self.fail_crew_at_or_below {
            Some(CollapseCause::Crew)
        } else if ledger.get(ResourceKey::Herd) <= self.fail_herd_at_or_below {
            Some(CollapseCause::Herd)
        } else if ledger.get(ResourceKey::Horses) <= self.fail_horses_at_or_below {
            Some(CollapseCause::Horses)
        } else {
            None
        }
    }
}

/// Everything one playthrough owns.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunState {
    pub seed: u64,
    pub campaign: CampaignCfg,
    pub phase: GamePhase,
    pub day: u32,
    pub turn: u32,
    pub distance: u32,
    pub pace: PaceId,
    pub outfit: OutfitConfig,
    pub ledger: Ledger,
    pub start_herd: i32,
    pub start_crew: i32,
    pub current_event: Option<Event>,
    pub result_text: String,
    pub decisions: Vec<Decision>,
    pub used_events: BTreeSet<String>,
    pub game_over: bool,
    pub survived: bool,
    pub early_sale: bool,
    pub ending: Option<Ending>,
}

impl RunState {
    /// A run waiting on the outfit screen.
    #[must_use]
    pub fn configuring(seed: u64, campaign: CampaignCfg) -> Self {
        Self {
            seed,
            campaign,
            phase: GamePhase::Configuring,
            day: campaign.start_day,
            turn: 0,
            distance: 0,
            pace: PaceId::Normal,
            outfit: OutfitConfig::default(),
            ledger: Ledger::new(),
            start_herd: 0,
            start_crew: 0,
            current_event: None,
            result_text: String::new(),
            decisions: Vec::new(),
            used_events: BTreeSet::new(),
            game_over: false,
            survived: false,
            early_sale: false,
            ending: None,
        }
    }

    /// A fresh run on the trail with the ledger seeded from `outfit`.
    ///
    /// # Errors
    ///
    /// Returns an error when the outfit is outside the store limits.
    pub fn outfitted(
        seed: u64,
        campaign: CampaignCfg,
        outfit: OutfitConfig,
    ) -> Result<Self, OutfitError> {
        let ledger = outfit.seed_ledger()?;
        let mut state = Self::configuring(seed, campaign);
        state.start_herd = ledger.get(ResourceKey::Herd);
        state.start_crew = ledger.get(ResourceKey::Crew);
        state.outfit = outfit;
        state.ledger = ledger;
        state.phase = GamePhase::Traveling;
        Ok(state)
    }

    /// Distance covered as a fraction of the trail.
    #[must_use]
    pub fn distance_fraction(&self) -> f64 {
        if self.campaign.total_distance == 0 {
            return 1.0;
        }
        (f64::from(self.distance) / f64::from(self.campaign.total_distance)).min(1.0)
    }

    #[must_use]
    pub const fn arrived(&self) -> bool {
        self.distance >= self.campaign.total_distance
    }

    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self.phase, GamePhase::Terminal)
    }

    /// Enter the terminal phase and mirror the ending into the flags.
    pub(crate) fn finish(&mut self, ending: Ending) {
        self.phase = GamePhase::Terminal;
        self.game_over = true;
        self.survived = ending.survived();
        self.ending = Some(ending);
        self.current_event = None;
        log::info!(
            "drive over on day {} after {} turns: {ending} ({} head, {} mi)",
            self.day,
            self.turn,
            self.ledger.get(ResourceKey::Herd),
            self.distance
        );
    }

    #[must_use]
    pub fn snapshot(&self) -> RunSnapshot {
        RunSnapshot {
            seed: self.seed,
            phase: self.phase,
            day: self.day.min(self.campaign.total_days),
            turn: self.turn,
            distance: self.distance,
            total_distance: self.campaign.total_distance,
            pace: self.pace,
            resources: self.ledger.iter().collect(),
            current_event: self.current_event.as_ref().map(EventView::from),
            result_text: self.result_text.clone(),
            decisions: self.decisions.clone(),
            game_over: self.game_over,
            survived: self.survived,
            early_sale: self.early_sale,
            ending: self.ending,
        }
    }
}

/// What a presented event looks like to a renderer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventView {
    pub id: String,
    pub title: String,
    pub text: String,
    pub choices: Vec<String>,
}

impl From<&Event> for EventView {
    fn from(event: &Event) -> Self {
        Self {
            id: event.id.clone(),
            title: event.title.clone(),
            text: event.text.clone(),
            choices: event
                .choice_labels()
                .into_iter()
                .map(str::to_string)
                .collect(),
        }
    }
}

/// Read-only copy of a run for display or logging. The day is capped at the
/// campaign length, matching what the HUD shows.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSnapshot {
    pub seed: u64,
    pub phase: GamePhase,
    pub day: u32,
    pub turn: u32,
    pub distance: u32,
    pub total_distance: u32,
    pub pace: PaceId,
    pub resources: BTreeMap<ResourceKey, ResourceSlot>,
    pub current_event: Option<EventView>,
    pub result_text: String,
    pub decisions: Vec<Decision>,
    pub game_over: bool,
    pub survived: bool,
    pub early_sale: bool,
    pub ending: Option<Ending>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outfitted_run_starts_traveling() {
        let state = RunState::outfitted(7, CampaignCfg::default(), OutfitConfig::default()).unwrap();
        assert_eq!(state.phase, GamePhase::Traveling);
        assert_eq!((state.day, state.turn, state.distance), (1, 0, 0));
        assert_eq!(state.start_herd, 2_500);
        assert_eq!(state.start_crew, 12);
        assert_eq!(state.pace, PaceId::Normal);
        assert!(!state.game_over);
    }

    #[test]
    fn collapse_checks_floors_in_order() {
        let cfg = CampaignCfg::default();
        let mut ledger = OutfitConfig::default().seed_ledger().unwrap();
        assert_eq!(cfg.collapse(&ledger), None);

        ledger.set(ResourceKey::Horses, 5);
        assert_eq!(cfg.collapse(&ledger), Some(CollapseCause::Horses));
        ledger.set(ResourceKey::Herd, 100);
        assert_eq!(cfg.collapse(&ledger), Some(CollapseCause::Herd));
        ledger.set(ResourceKey::Crew, 2);
        assert_eq!(cfg.collapse(&ledger), Some(CollapseCause::Crew));

        ledger.set(ResourceKey::Crew, 3);
        ledger.set(ResourceKey::Herd, 101);
        ledger.set(ResourceKey::Horses, 6);
        assert_eq!(cfg.collapse(&ledger), None);
    }

    #[test]
    fn finish_sets_flags_from_ending() {
        let mut state =
            RunState::outfitted(1, CampaignCfg::default(), OutfitConfig::default()).unwrap();
        state.finish(Ending::Failed {
            cause: CollapseCause::Herd,
        });
        assert!(state.is_terminal());
        assert!(state.game_over);
        assert!(!state.survived);

        let mut state =
            RunState::outfitted(1, CampaignCfg::default(), OutfitConfig::default()).unwrap();
        state.finish(Ending::SoldEarly);
        assert!(state.survived);
    }

    #[test]
    fn campaign_rejects_zero_lengths() {
        assert!(CampaignCfg::default().validate().is_ok());
        let cfg = CampaignCfg {
            days_per_turn: 0,
            ..CampaignCfg::default()
        };
        assert_eq!(
            cfg.validate(),
            Err(CampaignError::Zero {
                field: "days_per_turn",
                value: 0
            })
        );
        let cfg = CampaignCfg {
            start_day: 80,
            ..CampaignCfg::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(CampaignError::StartAfterEnd { .. })
        ));
    }

    #[test]
    fn snapshot_serializes_with_tagged_ending() {
        let mut state =
            RunState::outfitted(3, CampaignCfg::default(), OutfitConfig::default()).unwrap();
        state.finish(Ending::Failed {
            cause: CollapseCause::Crew,
        });
        let json = serde_json::to_value(state.snapshot()).unwrap();
        assert_eq!(json["phase"], "terminal");
        assert_eq!(json["ending"]["type"], "failed");
        assert_eq!(json["ending"]["cause"], "crew");
        assert_eq!(json["resources"]["herd"]["value"], 2_500);
    }
}
