//! Turns a chosen option into effects and narration.
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::catalog::{Choice, ChoiceKind};
use crate::constants::OUTCOME_POOL_PREFIX;
use crate::draw::{DecisionTrace, pick_weighted_traced};
use crate::ledger::Effects;

/// What a choice came to this time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub effects: Effects,
    pub result: String,
    /// Choice flag or outcome flag.
    pub early_end: bool,
    /// Index of the drawn outcome; `None` for fixed choices.
    pub outcome_index: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace: Option<DecisionTrace>,
}

/// Resolve `choice` from `event_id`. Branching choices are drawn fresh on every call.
///
/// A branching choice with no drawable outcome resolves to nothing; catalog
/// validation rules that out for loaded data.
pub fn resolve_choice<R>(event_id: &str, choice: &Choice, rng: &mut R) -> Resolution
where
    R: Rng + ?Sized,
{
    match &choice.kind {
        ChoiceKind::Fixed { effects, result } => Resolution {
            effects: effects.clone(),
            result: result.clone(),
            early_end: choice.early_end,
            outcome_index: None,
            trace: None,
        },
        ChoiceKind::Branching { outcomes } => {
            let pool_id = format!("{OUTCOME_POOL_PREFIX}{event_id}");
            let Some((outcome, trace)) = pick_weighted_traced(&pool_id, outcomes, rng) else {
                log::warn!("{pool_id}: no drawable outcome for {:?}", choice.text);
                return Resolution {
                    effects: Effects::new(),
                    result: String::new(),
                    early_end: choice.early_end,
                    outcome_index: None,
                    trace: None,
                };
            };
            let index = outcomes
                .iter()
                .position(|candidate| std::ptr::eq(candidate, outcome));
            log::debug!(
                "{pool_id}: outcome {index:?} (roll {}/{})",
                trace.roll,
                trace.total_weight
            );
            Resolution {
                effects: outcome.effects.clone(),
                result: outcome.result.clone(),
                early_end: choice.early_end || outcome.early_end,
                outcome_index: index,
                trace: Some(trace),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{EventCatalog, Outcome};
    use crate::ledger::ResourceKey;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    fn outcome(weight: u32, herd: i32, result: &str, early_end: bool) -> Outcome {
        Outcome {
            weight,
            effects: Effects::from_pairs(&[(ResourceKey::Herd, herd)]),
            result: result.to_string(),
            early_end,
        }
    }

    #[test]
    fn fixed_choice_resolves_verbatim() {
        let choice = Choice::fixed(
            "Wait for the river to drop",
            Effects::from_pairs(&[(ResourceKey::Supplies, -5)]),
            "Three days lost.",
        );
        let mut rng = ChaCha20Rng::seed_from_u64(1);
        let resolution = resolve_choice("river", &choice, &mut rng);
        assert_eq!(resolution.effects.get(ResourceKey::Supplies), -5);
        assert_eq!(resolution.result, "Three days lost.");
        assert!(!resolution.early_end);
        assert_eq!(resolution.outcome_index, None);
        assert!(resolution.trace.is_none());
    }

    #[test]
    fn early_end_comes_from_choice_or_outcome() {
        let mut rng = ChaCha20Rng::seed_from_u64(2);
        let flagged_choice = Choice::fixed("Sell", Effects::new(), "Sold.").ending_early();
        assert!(resolve_choice("buyer", &flagged_choice, &mut rng).early_end);

        let flagged_outcome = Choice::branching(
            "Haggle",
            vec![outcome(1, 0, "He walks away.", false), outcome(1, 0, "Deal.", true)],
        );
        let mut saw_sale = false;
        let mut saw_walk = false;
        for _ in 0..200 {
            let resolution = resolve_choice("buyer", &flagged_outcome, &mut rng);
            match resolution.outcome_index {
                Some(0) => {
                    assert!(!resolution.early_end);
                    saw_walk = true;
                }
                Some(1) => {
                    assert!(resolution.early_end);
                    saw_sale = true;
                }
                other => panic!("unexpected outcome {other:?}"),
            }
        }
        assert!(saw_sale && saw_walk);
    }

    #[test]
    fn outcomes_follow_their_weights() {
        let choice = Choice::branching(
            "Swim them across",
            vec![
                outcome(3, 0, "Clean crossing.", false),
                outcome(1, -80, "Cattle lost in the current.", false),
            ],
        );
        let mut rng = ChaCha20Rng::seed_from_u64(3);
        let trials = 20_000;
        let losses = (0..trials)
            .filter(|_| resolve_choice("river", &choice, &mut rng).effects.get(ResourceKey::Herd) < 0)
            .count();
        let share = losses as f64 / f64::from(trials);
        assert!((share - 0.25).abs() < 0.015, "share {share}");
    }

    #[test]
    fn builtin_buyer_sells_either_way_when_fixed() {
        let catalog = EventCatalog::load_from_static().unwrap();
        let buyer = catalog.get("buyer").unwrap();
        let mut rng = ChaCha20Rng::seed_from_u64(4);
        let resolution = resolve_choice(&buyer.id, &buyer.choices[0], &mut rng);
        assert!(resolution.early_end);
        let trace_pool = resolve_choice(&buyer.id, &buyer.choices[1], &mut rng)
            .trace
            .map(|trace| trace.pool_id);
        assert_eq!(trace_pool.as_deref(), Some("chisholm.outcomes.buyer"));
    }
}
