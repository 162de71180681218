//! Picks the next trail event from progress and history.
use rand::Rng;
use std::collections::BTreeSet;

use crate::catalog::{Event, EventCatalog};
use crate::constants::EVENT_POOL_ID;
use crate::draw::{DecisionTrace, pick_weighted_traced};

/// Events a draw would choose from at one point of the drive.
#[derive(Debug, Clone, PartialEq)]
pub struct EventPool<'a> {
    pub progress: f64,
    /// Candidates in catalog order.
    pub events: Vec<&'a Event>,
    /// Every in-window event has already been seen.
    pub repeats: bool,
}

impl EventPool<'_> {
    #[must_use]
    pub fn is_quiet(&self) -> bool {
        self.events.is_empty()
    }
}

/// A selected event plus how it was chosen.
#[derive(Debug, Clone, PartialEq)]
pub struct EventPick<'a> {
    pub event: &'a Event,
    pub repeat: bool,
    pub trace: DecisionTrace,
}

/// Fraction of the campaign elapsed at `day`. May exceed 1 on the final turn.
#[must_use]
pub fn progress(day: u32, total_days: u32) -> f64 {
    if total_days == 0 {
        return 1.0;
    }
    f64::from(day) / f64::from(total_days)
}

/// Unused in-window events, or every in-window event when none are fresh.
/// Pure: answers "what could fire next" without touching any state.
#[must_use]
pub fn eligible_pool<'a>(
    day: u32,
    total_days: u32,
    used: &BTreeSet<String>,
    catalog: &'a EventCatalog,
) -> EventPool<'a> {
    let progress = progress(day, total_days);
    let in_window: Vec<&Event> = catalog
        .events()
        .iter()
        .filter(|event| event.in_window(progress))
        .collect();
    let fresh: Vec<&Event> = in_window
        .iter()
        .copied()
        .filter(|event| !used.contains(&event.id))
        .collect();
    if fresh.is_empty() {
        EventPool {
            progress,
            repeats: !in_window.is_empty(),
            events: in_window,
        }
    } else {
        EventPool {
            progress,
            events: fresh,
            repeats: false,
        }
    }
}

/// Draw the next event, or `None` for a quiet turn. Does not mark anything used.
pub fn select_event<'a, R>(
    day: u32,
    total_days: u32,
    used: &BTreeSet<String>,
    catalog: &'a EventCatalog,
    rng: &mut R,
) -> Option<EventPick<'a>>
where
    R: Rng + ?Sized,
{
    let pool = eligible_pool(day, total_days, used, catalog);
    if pool.is_quiet() {
        log::debug!("quiet turn at progress {:.3}", pool.progress);
        return None;
    }
    let (event, trace) = pick_weighted_traced(EVENT_POOL_ID, &pool.events, rng)?;
    log::debug!(
        "event pick {} (roll {}/{}, repeat={}, pool={:?})",
        trace.chosen_id,
        trace.roll,
        trace.total_weight,
        pool.repeats,
        trace.candidates
    );
    Some(EventPick {
        event: *event,
        repeat: pool.repeats,
        trace,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Choice;
    use crate::ledger::Effects;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    fn event(id: &str, min: f64, max: f64, weight: u32) -> Event {
        Event {
            id: id.to_string(),
            title: id.to_uppercase(),
            text: String::new(),
            phase_min: min,
            phase_max: max,
            weight,
            choices: vec![Choice::fixed("Go on", Effects::new(), "On you go.")],
        }
    }

    fn catalog() -> EventCatalog {
        EventCatalog::new(vec![
            event("early", 0.0, 0.3, 1),
            event("middle", 0.2, 0.6, 3),
            event("late", 0.7, 1.0, 1),
        ])
        .unwrap()
    }

    #[test]
    fn pool_respects_window_and_history() {
        let catalog = catalog();
        let mut used = BTreeSet::new();

        let pool = eligible_pool(18, 70, &used, &catalog);
        let ids: Vec<&str> = pool.events.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, ["early", "middle"]);
        assert!(!pool.repeats);

        used.insert("middle".to_string());
        let pool = eligible_pool(18, 70, &used, &catalog);
        assert_eq!(pool.events.len(), 1);
        assert_eq!(pool.events[0].id, "early");

        used.insert("early".to_string());
        let pool = eligible_pool(18, 70, &used, &catalog);
        assert_eq!(pool.events.len(), 2, "falls back to repeats");
        assert!(pool.repeats);
    }

    #[test]
    fn gap_between_windows_is_quiet() {
        let catalog = catalog();
        let mut rng = ChaCha20Rng::seed_from_u64(3);
        // 46/70 sits between "middle" and "late".
        assert!(eligible_pool(46, 70, &BTreeSet::new(), &catalog).is_quiet());
        assert!(select_event(46, 70, &BTreeSet::new(), &catalog, &mut rng).is_none());
        // Past the finish nothing is in window.
        assert!(select_event(71, 70, &BTreeSet::new(), &catalog, &mut rng).is_none());
    }

    #[test]
    fn unused_event_always_wins_over_used() {
        let catalog = catalog();
        let used = BTreeSet::from(["early".to_string()]);
        let mut rng = ChaCha20Rng::seed_from_u64(4);
        for _ in 0..1_000 {
            let pick = select_event(16, 70, &used, &catalog, &mut rng).unwrap();
            assert_eq!(pick.event.id, "middle");
            assert!(!pick.repeat);
        }
    }

    #[test]
    fn picks_never_leave_the_window() {
        let catalog = EventCatalog::load_from_static().unwrap();
        let mut rng = ChaCha20Rng::seed_from_u64(5);
        let used = BTreeSet::new();
        for day in (1..=71).step_by(5) {
            let p = progress(day, 70);
            for _ in 0..50 {
                if let Some(pick) = select_event(day, 70, &used, &catalog, &mut rng) {
                    assert!(pick.event.in_window(p), "{} at {p}", pick.event.id);
                    assert_eq!(pick.trace.chosen_id, pick.event.id);
                    assert_eq!(pick.trace.pool_id, EVENT_POOL_ID);
                }
            }
        }
    }

    #[test]
    fn weights_bias_the_draw() {
        let catalog = catalog();
        let mut rng = ChaCha20Rng::seed_from_u64(6);
        let trials = 20_000;
        let middle = (0..trials)
            .filter(|_| {
                select_event(18, 70, &BTreeSet::new(), &catalog, &mut rng)
                    .is_some_and(|pick| pick.event.id == "middle")
            })
            .count();
        let share = middle as f64 / f64::from(trials);
        assert!((share - 0.75).abs() < 0.02, "share {share}");
    }
}
