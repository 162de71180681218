//! The turn engine: one press of "drive on".
use serde::Serialize;

use crate::attrition::{AttritionHits, AttritionRule, TRAIL_ATTRITION, apply_attrition};
use crate::catalog::EventCatalog;
use crate::ledger::ResourceKey;
use crate::pacing::{PaceId, PacingConfig};
use crate::rng::RngBundle;
use crate::selector::select_event;
use crate::state::{Ending, GamePhase, RunState};

/// Static inputs a turn reads but never changes.
#[derive(Debug, Clone, Copy)]
pub struct TurnContext<'a> {
    pub catalog: &'a EventCatalog,
    pub pacing: &'a PacingConfig,
    pub attrition: &'a [AttritionRule],
}

impl<'a> TurnContext<'a> {
    #[must_use]
    pub const fn new(catalog: &'a EventCatalog, pacing: &'a PacingConfig) -> Self {
        Self {
            catalog,
            pacing,
            attrition: &TRAIL_ATTRITION,
        }
    }
}

/// What happened during one turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TurnReport {
    pub turn: u32,
    pub day: u32,
    pub pace: PaceId,
    pub miles: u32,
    /// Passive supply drain, on top of the pace's own supply effect.
    pub supply_drain: i32,
    pub attrition: AttritionHits,
    pub ending: Option<Ending>,
    pub event_id: Option<String>,
    pub repeat_event: bool,
}

impl TurnReport {
    #[must_use]
    pub const fn is_quiet(&self) -> bool {
        self.ending.is_none() && self.event_id.is_none()
    }
}

/// Advance `state` by one turn. Callers gate on [`GamePhase::Traveling`].
///
/// Order: clock and distance, pace effects, supply drain, attrition,
/// failure, arrival, then event selection.
pub fn advance_turn(state: &mut RunState, ctx: &TurnContext<'_>, rngs: &mut RngBundle) -> TurnReport {
    let campaign = state.campaign;
    let pace = ctx.pacing.get_pace_safe(state.pace);

    state.turn += 1;
    state.day = (state.day + campaign.days_per_turn).min(campaign.last_day());
    let before = state.distance;
    let leg = pace.miles_per_day.saturating_mul(campaign.days_per_turn);
    state.distance = before.saturating_add(leg).min(campaign.total_distance);

    state.ledger.apply(&pace.effects);
    let supply_drain = pace.supply_drain_for(state.ledger.get(ResourceKey::Crew));
    state.ledger.delta(ResourceKey::Supplies, -supply_drain);

    let attrition = apply_attrition(&mut state.ledger, ctx.attrition, rngs.attrition());

    let mut report = TurnReport {
        turn: state.turn,
        day: state.day,
        pace: state.pace,
        miles: state.distance.saturating_sub(before),
        supply_drain,
        attrition,
        ending: None,
        event_id: None,
        repeat_event: false,
    };

    if let Some(cause) = campaign.collapse(&state.ledger) {
        let ending = Ending::Failed { cause };
        state.finish(ending);
        report.ending = Some(ending);
        return report;
    }
    if state.arrived() {
        state.finish(Ending::Delivered);
        report.ending = Some(Ending::Delivered);
        return report;
    }

    if let Some(pick) = select_event(
        state.day,
        campaign.total_days,
        &state.used_events,
        ctx.catalog,
        rngs.events(),
    ) {
        state.used_events.insert(pick.event.id.clone());
        report.event_id = Some(pick.event.id.clone());
        report.repeat_event = pick.repeat;
        state.current_event = Some(pick.event.clone());
        state.phase = GamePhase::EventPresented;
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Choice, Event};
    use crate::ledger::Effects;
    use crate::outfit::OutfitConfig;
    use crate::state::{CampaignCfg, CollapseCause};

    fn quiet_catalog() -> EventCatalog {
        EventCatalog::new(vec![Event {
            id: "late".to_string(),
            title: "Late".to_string(),
            text: String::new(),
            phase_min: 0.99,
            phase_max: 1.0,
            weight: 1,
            choices: vec![Choice::fixed("Ok", Effects::new(), "Ok.")],
        }])
        .unwrap()
    }

    fn open_catalog() -> EventCatalog {
        EventCatalog::new(vec![Event {
            id: "anytime".to_string(),
            title: "Anytime".to_string(),
            text: String::new(),
            phase_min: 0.0,
            phase_max: 1.0,
            weight: 1,
            choices: vec![Choice::fixed("Ok", Effects::new(), "Ok.")],
        }])
        .unwrap()
    }

    fn fresh() -> RunState {
        RunState::outfitted(9, CampaignCfg::default(), OutfitConfig::default()).unwrap()
    }

    #[test]
    fn normal_turn_moves_clock_and_costs_resources() {
        let catalog = quiet_catalog();
        let pacing = PacingConfig::load_from_static().unwrap();
        let ctx = TurnContext::new(&catalog, &pacing);
        let mut rngs = RngBundle::from_user_seed(9);
        let mut state = fresh();

        let report = advance_turn(&mut state, &ctx, &mut rngs);
        assert_eq!((state.turn, state.day, state.distance), (1, 6, 75));
        assert_eq!(report.miles, 75);
        assert_eq!(state.ledger.get(ResourceKey::HerdCondition), 59);
        assert_eq!(state.ledger.get(ResourceKey::Morale), 54);
        assert_eq!(state.ledger.get(ResourceKey::Supplies), 60);
        assert_eq!(state.ledger.get(ResourceKey::Herd), 2_500);
        assert!(report.is_quiet());
        assert_eq!(state.phase, GamePhase::Traveling);
    }

    #[test]
    fn failure_beats_arrival() {
        let catalog = quiet_catalog();
        let pacing = PacingConfig::load_from_static().unwrap();
        let ctx = TurnContext::new(&catalog, &pacing);
        let mut rngs = RngBundle::from_user_seed(1);
        let mut state = fresh();
        state.distance = 790;
        state.ledger.set(ResourceKey::Horses, 5);

        let report = advance_turn(&mut state, &ctx, &mut rngs);
        assert_eq!(
            report.ending,
            Some(Ending::Failed {
                cause: CollapseCause::Horses
            })
        );
        assert_eq!(state.distance, 800);
        assert!(!state.survived);
        assert!(state.current_event.is_none());
    }

    #[test]
    fn failure_skips_event_selection() {
        let catalog = open_catalog();
        let pacing = PacingConfig::load_from_static().unwrap();
        let ctx = TurnContext::new(&catalog, &pacing);
        let mut rngs = RngBundle::from_user_seed(5);
        let mut state = fresh();
        state.distance = 0;
        state.ledger.set(ResourceKey::Horses, 5);

        let report = advance_turn(&mut state, &ctx, &mut rngs);
        assert_eq!(
            report.ending,
            Some(Ending::Failed {
                cause: CollapseCause::Horses
            })
        );
        assert!(!state.arrived());
        assert!(report.event_id.is_none());
        assert!(state.current_event.is_none());
        assert!(state.used_events.is_empty());
        assert!(state.is_terminal());
    }

    #[test]
    fn distance_past_the_railhead_reports_no_miles() {
        let catalog = quiet_catalog();
        let pacing = PacingConfig::load_from_static().unwrap();
        let ctx = TurnContext::new(&catalog, &pacing);
        let mut rngs = RngBundle::from_user_seed(6);
        let mut state = fresh();
        state.distance = state.campaign.total_distance + 40;

        let report = advance_turn(&mut state, &ctx, &mut rngs);
        assert_eq!(report.miles, 0);
        assert_eq!(report.ending, Some(Ending::Delivered));
    }

    #[test]
    fn arrival_beats_event_selection() {
        let catalog = EventCatalog::load_from_static().unwrap();
        let pacing = PacingConfig::load_from_static().unwrap();
        let ctx = TurnContext::new(&catalog, &pacing);
        let mut rngs = RngBundle::from_user_seed(2);
        let mut state = fresh();
        state.distance = 780;
        state.day = 51;

        let report = advance_turn(&mut state, &ctx, &mut rngs);
        assert_eq!(report.ending, Some(Ending::Delivered));
        assert_eq!(report.miles, 20);
        assert!(state.survived);
        assert!(state.used_events.is_empty());
    }

    #[test]
    fn day_and_distance_saturate() {
        let catalog = quiet_catalog();
        let pacing = PacingConfig::load_from_static().unwrap();
        let ctx = TurnContext::new(&catalog, &pacing);
        let mut rngs = RngBundle::from_user_seed(3);
        let mut state = fresh();
        state.day = 69;

        advance_turn(&mut state, &ctx, &mut rngs);
        assert_eq!(state.day, 71);
    }

    #[test]
    fn presented_event_is_marked_used() {
        let catalog = EventCatalog::load_from_static().unwrap();
        let pacing = PacingConfig::load_from_static().unwrap();
        let ctx = TurnContext::new(&catalog, &pacing);
        let mut rngs = RngBundle::from_user_seed(4);
        let mut state = fresh();

        let report = advance_turn(&mut state, &ctx, &mut rngs);
        // Day 6 of 70 sits inside the early river crossing window.
        let id = report.event_id.expect("early trail always has an event");
        assert!(state.used_events.contains(&id));
        assert_eq!(state.phase, GamePhase::EventPresented);
        assert_eq!(state.current_event.as_ref().map(|e| e.id.as_str()), Some(id.as_str()));
    }
}
