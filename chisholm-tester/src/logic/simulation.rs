use anyhow::{Context, Result};
use chisholm_game::{
    DataLoader, DriveSession, Ending, EventCatalog, GamePhase, Grade, OutfitConfig, PacingConfig,
    ResourceKey, RunSummary, StaticDataLoader,
};
use serde::Serialize;

use crate::logic::policy::{GameplayStrategy, PlayerPolicy, PolicyDecision, effects_summary};

/// Shared data every simulated drive plays against.
#[derive(Debug, Clone)]
pub struct TesterAssets {
    pub catalog: EventCatalog,
    pub pacing: PacingConfig,
}

impl TesterAssets {
    /// # Errors
    ///
    /// Returns an error if the embedded assets fail to load.
    pub fn load_default() -> Result<Self> {
        let loader = StaticDataLoader;
        Ok(Self {
            catalog: loader.load_catalog().context("loading event catalog")?,
            pacing: loader.load_pacing().context("loading pace table")?,
        })
    }
}

/// Configuration for a simulated drive.
#[derive(Debug, Clone, Copy)]
pub struct SimulationConfig {
    pub seed: u64,
    pub strategy: GameplayStrategy,
    pub outfit: OutfitConfig,
    pub max_turns: u32,
}

impl SimulationConfig {
    #[must_use]
    pub fn new(strategy: GameplayStrategy, seed: u64) -> Self {
        Self {
            seed,
            strategy,
            outfit: OutfitConfig::default(),
            max_turns: 100,
        }
    }

    #[must_use]
    pub fn with_outfit(mut self, outfit: OutfitConfig) -> Self {
        self.outfit = outfit;
        self
    }

    #[must_use]
    pub fn with_max_turns(mut self, max_turns: u32) -> Self {
        self.max_turns = max_turns;
        self
    }
}

/// One answered event.
#[derive(Debug, Clone, Serialize)]
pub struct DecisionRecord {
    pub day: u32,
    pub event_id: String,
    pub event_title: String,
    pub choice_index: usize,
    pub choice_label: String,
    pub rationale: Option<String>,
    pub effects: String,
    pub result: String,
}

/// Everything the reports need from one drive.
#[derive(Debug, Clone, Serialize)]
pub struct DriveRecord {
    pub seed: u64,
    pub strategy: String,
    pub policy_name: String,
    /// `None` when the turn cap stopped the drive first.
    pub ending: Option<Ending>,
    pub grade: Grade,
    pub herd_start: i32,
    pub herd_delivered: i32,
    pub delivered_fraction: f64,
    pub payout: i64,
    pub turns: u32,
    pub days: u32,
    pub distance: u32,
    pub events_seen: usize,
    pub repeat_events: usize,
    pub quiet_turns: u32,
    pub decisions: Vec<DecisionRecord>,
}

impl DriveRecord {
    #[must_use]
    pub fn survived(&self) -> bool {
        self.ending.is_some_and(Ending::survived)
    }
}

/// Drives one [`DriveSession`] with a scripted policy.
pub struct SimulationSession {
    session: DriveSession,
    policy: Box<dyn PlayerPolicy + Send>,
    config: SimulationConfig,
    decisions: Vec<DecisionRecord>,
    quiet_turns: u32,
    repeat_events: usize,
}

impl SimulationSession {
    /// # Errors
    ///
    /// Returns an error if the outfit is rejected.
    pub fn new(config: SimulationConfig, assets: &TesterAssets) -> Result<Self> {
        let mut session =
            DriveSession::new(config.seed, assets.catalog.clone(), assets.pacing.clone());
        session
            .start(config.outfit)
            .with_context(|| format!("starting drive for seed {}", config.seed))?;
        Ok(Self {
            session,
            policy: config.strategy.create_policy(config.seed),
            config,
            decisions: Vec::new(),
            quiet_turns: 0,
            repeat_events: 0,
        })
    }

    /// Play one full turn: pace, travel, and any event through to its result.
    ///
    /// # Errors
    ///
    /// Returns an error if the session refuses an action, which means the
    /// harness and the state machine disagree.
    pub fn play_turn(&mut self) -> Result<()> {
        let pace = self.policy.pick_pace(self.session.state());
        self.session.set_pace(pace)?;
        let report = self.session.advance_turn()?;
        if report.is_quiet() {
            self.quiet_turns += 1;
        }
        if report.repeat_event {
            self.repeat_events += 1;
        }
        if self.session.phase() != GamePhase::EventPresented {
            return Ok(());
        }

        let Some(event) = self.session.state().current_event.clone() else {
            return Ok(());
        };
        let PolicyDecision {
            choice_index,
            rationale,
        } = self.policy.pick_choice(self.session.state(), &event);
        let choice_index = choice_index.min(event.choices.len().saturating_sub(1));
        let resolution = self.session.choose(choice_index)?;
        log::debug!(
            "seed {} day {}: {} -> option {choice_index}",
            self.config.seed,
            self.session.state().day,
            event.id
        );
        self.decisions.push(DecisionRecord {
            day: self.session.state().day,
            event_id: event.id.clone(),
            event_title: event.title.clone(),
            choice_index,
            choice_label: event
                .choices
                .get(choice_index)
                .map_or_else(String::new, |choice| choice.text.clone()),
            rationale,
            effects: effects_summary(&resolution.effects),
            result: resolution.result,
        });
        self.session.continue_on()?;
        Ok(())
    }

    /// # Errors
    ///
    /// Propagates any error from [`SimulationSession::play_turn`].
    pub fn run(mut self) -> Result<DriveRecord> {
        while self.session.phase() == GamePhase::Traveling
            && self.session.state().turn < self.config.max_turns
        {
            self.play_turn()?;
        }
        Ok(self.into_record())
    }

    fn into_record(self) -> DriveRecord {
        let state = self.session.state();
        let summary = RunSummary::from_state(state);
        let herd = state.ledger.get(ResourceKey::Herd);
        let delivered_fraction = if state.start_herd > 0 && state.survived {
            f64::from(herd) / f64::from(state.start_herd)
        } else {
            0.0
        };
        DriveRecord {
            seed: self.config.seed,
            strategy: self.config.strategy.key().to_string(),
            policy_name: self.policy.name().to_string(),
            ending: state.ending,
            grade: summary.grade,
            herd_start: state.start_herd,
            herd_delivered: summary.delivered,
            delivered_fraction,
            payout: summary.payout,
            turns: state.turn,
            days: summary.day,
            distance: state.distance,
            events_seen: state.used_events.len(),
            repeat_events: self.repeat_events,
            quiet_turns: self.quiet_turns,
            decisions: self.decisions,
        }
    }
}

/// Play one seeded drive to its end or to the turn cap.
///
/// # Errors
///
/// Returns an error if the outfit is rejected or the session refuses an action.
pub fn simulate_drive(assets: &TesterAssets, config: SimulationConfig) -> Result<DriveRecord> {
    SimulationSession::new(config, assets)?.run()
}
