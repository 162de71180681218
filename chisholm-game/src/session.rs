use thiserror::Error;

use crate::catalog::EventCatalog;
use crate::ledger::ResourceKey;
use crate::outfit::{OutfitConfig, OutfitError};
use crate::pacing::{PaceId, PacingConfig};
use crate::resolver::{Resolution, resolve_choice};
use crate::result::{Grade, RunSummary, grade_for};
use crate::rng::RngBundle;
use crate::selector::{EventPool, eligible_pool};
use crate::state::{CampaignCfg, CampaignError, Decision, Ending, GamePhase, RunSnapshot, RunState};
use crate::turn::{TurnContext, TurnReport, advance_turn};

/// A player action the drive could not take.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ActionError {
    #[error("cannot {action} while {phase}")]
    WrongPhase {
        action: &'static str,
        phase: GamePhase,
    },
    #[error("choice {index} is out of range ({available} available)")]
    BadChoice { index: usize, available: usize },
    #[error(transparent)]
    Outfit(#[from] OutfitError),
}

/// Owns one drive: its state, its random streams and the data it plays against.
/// Every action either completes or returns an error with the state untouched.
#[derive(Debug, Clone)]
pub struct DriveSession {
    catalog: EventCatalog,
    pacing: PacingConfig,
    rngs: RngBundle,
    state: RunState,
}

impl DriveSession {
    /// A session on the outfit screen with the default campaign.
    #[must_use]
    pub fn new(seed: u64, catalog: EventCatalog, pacing: PacingConfig) -> Self {
        Self {
            catalog,
            pacing,
            rngs: RngBundle::from_user_seed(seed),
            state: RunState::configuring(seed, CampaignCfg::default()),
        }
    }

    /// # Errors
    ///
    /// Returns an error if the campaign settings are unusable.
    pub fn with_campaign(
        seed: u64,
        catalog: EventCatalog,
        pacing: PacingConfig,
        campaign: CampaignCfg,
    ) -> Result<Self, CampaignError> {
        campaign.validate()?;
        let mut session = Self::new(seed, catalog, pacing);
        session.state = RunState::configuring(seed, campaign);
        Ok(session)
    }

    fn require(&self, action: &'static str, phase: GamePhase) -> Result<(), ActionError> {
        if self.state.phase == phase {
            Ok(())
        } else {
            Err(ActionError::WrongPhase {
                action,
                phase: self.state.phase,
            })
        }
    }

    /// Confirm the outfit and hit the trail.
    ///
    /// # Errors
    ///
    /// Wrong phase, or an outfit outside the store limits.
    pub fn start(&mut self, outfit: OutfitConfig) -> Result<(), ActionError> {
        self.require("start", GamePhase::Configuring)?;
        self.state = RunState::outfitted(self.state.seed, self.state.campaign, outfit)?;
        log::info!(
            "drive started: seed {} herd {} crew {}",
            self.state.seed,
            self.state.start_herd,
            self.state.start_crew
        );
        Ok(())
    }

    /// # Errors
    ///
    /// Pace only changes between turns.
    pub fn set_pace(&mut self, pace: PaceId) -> Result<(), ActionError> {
        self.require("set pace", GamePhase::Traveling)?;
        self.state.pace = pace;
        Ok(())
    }

    /// # Errors
    ///
    /// Only a traveling drive can advance.
    pub fn advance_turn(&mut self) -> Result<TurnReport, ActionError> {
        self.require("advance", GamePhase::Traveling)?;
        let ctx = TurnContext::new(&self.catalog, &self.pacing);
        Ok(advance_turn(&mut self.state, &ctx, &mut self.rngs))
    }

    /// Answer the presented event with option `index`.
    ///
    /// # Errors
    ///
    /// Wrong phase, or `index` past the last option.
    pub fn choose(&mut self, index: usize) -> Result<Resolution, ActionError> {
        self.require("choose", GamePhase::EventPresented)?;
        let Some(event) = self.state.current_event.as_ref() else {
            return Err(ActionError::WrongPhase {
                action: "choose",
                phase: self.state.phase,
            });
        };
        let Some(choice) = event.choices.get(index) else {
            return Err(ActionError::BadChoice {
                index,
                available: event.choices.len(),
            });
        };

        let resolution = resolve_choice(&event.id, choice, self.rngs.outcomes());
        let decision = Decision {
            event: event.title.clone(),
            choice: choice.text.clone(),
            day: self.state.day,
        };
        self.state.decisions.push(decision);
        self.state.ledger.apply(&resolution.effects);
        if resolution.early_end {
            self.state.early_sale = true;
        }
        self.state.result_text.clone_from(&resolution.result);
        self.state.phase = GamePhase::ResultShown;
        Ok(resolution)
    }

    /// Dismiss the result. Failure is checked first, then arrival or a sale.
    ///
    /// # Errors
    ///
    /// Only a shown result can be dismissed.
    pub fn continue_on(&mut self) -> Result<Option<Ending>, ActionError> {
        self.require("continue", GamePhase::ResultShown)?;
        self.state.current_event = None;
        self.state.result_text.clear();

        let ending = if let Some(cause) = self.state.campaign.collapse(&self.state.ledger) {
            Some(Ending::Failed { cause })
        } else if self.state.early_sale {
            Some(Ending::SoldEarly)
        } else if self.state.arrived() {
            Some(Ending::Delivered)
        } else {
            None
        };
        match ending {
            Some(ending) => self.state.finish(ending),
            None => self.state.phase = GamePhase::Traveling,
        }
        Ok(ending)
    }

    /// Back to the outfit screen. The random streams restart from the seed,
    /// so the same actions replay the same drive.
    pub fn restart(&mut self) {
        let seed = self.state.seed;
        let campaign = self.state.campaign;
        self.rngs = RngBundle::from_user_seed(seed);
        self.state = RunState::configuring(seed, campaign);
    }

    /// Restart under a different seed.
    pub fn reseed(&mut self, seed: u64) {
        self.state.seed = seed;
        self.restart();
    }

    /// Events the next turn could draw from, without drawing.
    #[must_use]
    pub fn upcoming_pool(&self) -> EventPool<'_> {
        let campaign = self.state.campaign;
        let next_day = (self.state.day + campaign.days_per_turn).min(campaign.last_day());
        eligible_pool(
            next_day,
            campaign.total_days,
            &self.state.used_events,
            &self.catalog,
        )
    }

    #[must_use]
    pub const fn state(&self) -> &RunState {
        &self.state
    }

    #[must_use]
    pub fn snapshot(&self) -> RunSnapshot {
        self.state.snapshot()
    }

    #[must_use]
    pub const fn phase(&self) -> GamePhase {
        self.state.phase
    }

    #[must_use]
    pub const fn catalog(&self) -> &EventCatalog {
        &self.catalog
    }

    /// Current grade; an F until the drive has survived to its end.
    #[must_use]
    pub fn grade(&self) -> Grade {
        grade_for(
            self.state.ledger.get(ResourceKey::Herd),
            self.state.start_herd,
            self.state.survived,
        )
    }

    /// End-screen summary, or `None` while the drive is still going.
    #[must_use]
    pub fn summary(&self) -> Option<RunSummary> {
        self.state
            .is_terminal()
            .then(|| RunSummary::from_state(&self.state))
    }

    /// Apply a closure to the mutable run state.
    pub fn with_state_mut<R>(&mut self, f: impl FnOnce(&mut RunState) -> R) -> R {
        f(&mut self.state)
    }

    /// Consume the session, returning the run state.
    #[must_use]
    pub fn into_state(self) -> RunState {
        self.state
    }
}
