//! Chisholm Trail drive engine
//!
//! Platform-agnostic simulation core for a turn-based cattle drive from San
//! Antonio to Abilene. This crate provides the phase state machine, the
//! resource ledger, weighted event selection and the turn engine, without UI
//! or platform-specific dependencies.

pub mod attrition;
pub mod catalog;
pub mod constants;
pub mod draw;
pub mod ledger;
pub mod outfit;
pub mod pacing;
pub mod resolver;
pub mod result;
pub mod rng;
pub mod selector;
pub mod session;
pub mod state;
pub mod trail;
pub mod turn;

// Re-export commonly used types
pub use attrition::{AttritionHit, AttritionHits, AttritionRule, TRAIL_ATTRITION, apply_attrition};
pub use catalog::{CatalogError, Choice, ChoiceKind, Event, EventCatalog, Outcome};
pub use draw::{DecisionTrace, Weighted, draw_index, pick_weighted, pick_weighted_traced};
pub use ledger::{Effects, Ledger, ResourceKey, ResourceSlot};
pub use outfit::{Armament, OutfitConfig, OutfitError, WageTier};
pub use pacing::{PaceCfg, PaceId, PacingConfig, PacingError};
pub use resolver::{Resolution, resolve_choice};
pub use result::{Grade, RunSummary, grade_for};
pub use rng::RngBundle;
pub use selector::{EventPick, EventPool, eligible_pool, select_event};
pub use session::{ActionError, DriveSession};
pub use state::{
    CampaignCfg, CampaignError, CollapseCause, Decision, Ending, EventView, GamePhase,
    RunSnapshot, RunState,
};
pub use trail::{LANDMARKS, Landmark, Status, outlook, progress_phrase, status_of};
pub use turn::{TurnContext, TurnReport, advance_turn};

use thiserror::Error;

/// Trait for abstracting data loading operations.
/// Platform-specific implementations should provide this.
pub trait DataLoader {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Load and validate the event catalog.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog cannot be loaded or fails validation.
    fn load_catalog(&self) -> Result<EventCatalog, Self::Error>;

    /// Load the pace table.
    ///
    /// # Errors
    ///
    /// Returns an error if the pacing configuration cannot be loaded or parsed.
    fn load_pacing(&self) -> Result<PacingConfig, Self::Error>;
}

#[derive(Debug, Error)]
pub enum StaticDataError {
    #[error("embedded event catalog is invalid: {0}")]
    Catalog(#[from] CatalogError),
    #[error("embedded pacing table is invalid: {0}")]
    Pacing(#[from] PacingError),
}

/// Serves the data assets compiled into this crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticDataLoader;

impl DataLoader for StaticDataLoader {
    type Error = StaticDataError;

    fn load_catalog(&self) -> Result<EventCatalog, Self::Error> {
        Ok(EventCatalog::load_from_static()?)
    }

    fn load_pacing(&self) -> Result<PacingConfig, Self::Error> {
        Ok(PacingConfig::load_from_static()?)
    }
}

/// Builds drive sessions from whatever data source `L` provides.
pub struct DriveEngine<L>
where
    L: DataLoader,
{
    data_loader: L,
}

impl<L> DriveEngine<L>
where
    L: DataLoader,
{
    pub const fn new(data_loader: L) -> Self {
        Self { data_loader }
    }

    /// A new session waiting on the outfit screen.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog or pacing data cannot be loaded.
    pub fn create_session(&self, seed: u64) -> Result<DriveSession, L::Error> {
        let catalog = self.data_loader.load_catalog()?;
        let pacing = self.data_loader.load_pacing()?;
        Ok(DriveSession::new(seed, catalog, pacing))
    }

    /// A session already on the trail with `outfit`.
    ///
    /// # Errors
    ///
    /// Returns an error if data loading fails or the outfit is rejected.
    pub fn start_drive(
        &self,
        seed: u64,
        outfit: OutfitConfig,
    ) -> Result<DriveSession, EngineError<L::Error>> {
        let mut session = self.create_session(seed).map_err(EngineError::Data)?;
        session.start(outfit)?;
        Ok(session)
    }
}

#[derive(Debug, Error)]
pub enum EngineError<E> {
    #[error("failed to load drive data: {0}")]
    Data(#[source] E),
    #[error(transparent)]
    Action(#[from] ActionError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    struct CountingLoader {
        loads: Cell<u32>,
        catalog_json: &'static str,
    }

    impl DataLoader for CountingLoader {
        type Error = StaticDataError;

        fn load_catalog(&self) -> Result<EventCatalog, Self::Error> {
            self.loads.set(self.loads.get() + 1);
            Ok(EventCatalog::from_json(self.catalog_json)?)
        }

        fn load_pacing(&self) -> Result<PacingConfig, Self::Error> {
            Ok(PacingConfig::load_from_static()?)
        }
    }

    #[test]
    fn static_loader_serves_builtin_data() {
        let engine = DriveEngine::new(StaticDataLoader);
        let session = engine.create_session(5).unwrap();
        assert_eq!(session.phase(), GamePhase::Configuring);
        assert_eq!(session.catalog().len(), 16);
    }

    #[test]
    fn engine_uses_custom_loader() {
        let loader = CountingLoader {
            loads: Cell::new(0),
            catalog_json: r#"{"events": [{"id": "only", "title": "Only", "text": "",
                "phase_min": 0.0, "phase_max": 1.0,
                "choices": [{"text": "Go", "effects": {}, "result": "Gone."}]}]}"#,
        };
        let engine = DriveEngine::new(loader);
        let mut session = engine.start_drive(8, OutfitConfig::default()).unwrap();
        assert_eq!(engine.data_loader.loads.get(), 1);
        session.advance_turn().unwrap();
        assert_eq!(
            session.state().current_event.as_ref().map(|e| e.id.as_str()),
            Some("only")
        );
    }

    #[test]
    fn loader_and_outfit_errors_surface() {
        let broken = DriveEngine::new(CountingLoader {
            loads: Cell::new(0),
            catalog_json: r#"{"events": []}"#,
        });
        assert!(matches!(
            broken.create_session(1),
            Err(StaticDataError::Catalog(CatalogError::Empty))
        ));

        let engine = DriveEngine::new(StaticDataLoader);
        let outfit = OutfitConfig {
            herd_size: 10,
            ..OutfitConfig::default()
        };
        assert!(matches!(
            engine.start_drive(1, outfit),
            Err(EngineError::Action(ActionError::Outfit(_)))
        ));
    }
}
