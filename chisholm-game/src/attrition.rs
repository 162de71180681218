//! Stochastic per-turn losses driven by how worn the outfit is.
use rand::Rng;
use serde::Serialize;
use smallvec::SmallVec;

use crate::constants::{
    DESERTION_CHANCE, STARVING_HERD_CONDITION, STARVING_HERD_LOSS_BASE, STARVING_HERD_LOSS_SPREAD,
    SULLEN_MORALE, WORN_HERD_CONDITION, WORN_HERD_LOSS_CHANCE, WORN_HERD_LOSS_SPREAD,
};
use crate::ledger::{Ledger, ResourceKey};

/// Size of a loss: `base` plus a uniform draw from `1..=spread` (none when spread is 0).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LossRoll {
    pub base: i32,
    pub spread: i32,
}

impl LossRoll {
    fn roll<R: Rng + ?Sized>(self, rng: &mut R) -> i32 {
        if self.spread <= 0 {
            return self.base;
        }
        self.base + rng.gen_range(1..=self.spread)
    }
}

/// "While `watch` sits in `[floor, below)`, take `loss` from `target` with `chance`."
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AttritionRule {
    pub name: &'static str,
    pub watch: ResourceKey,
    pub below: i32,
    /// Lower edge of the band; lets a milder rule stand aside for a harsher one.
    pub floor: Option<i32>,
    /// 1.0 means the loss always lands and no chance roll is drawn.
    pub chance: f32,
    pub target: ResourceKey,
    pub loss: LossRoll,
}

impl AttritionRule {
    fn triggered_by(&self, ledger: &Ledger) -> bool {
        if !ledger.tracks(self.watch) {
            return false;
        }
        let level = ledger.get(self.watch);
        level < self.below && self.floor.is_none_or(|floor| level >= floor)
    }
}

/// Trail attrition, evaluated in this order every turn.
pub const TRAIL_ATTRITION: [AttritionRule; 3] = [
    AttritionRule {
        name: "herd_starving",
        watch: ResourceKey::HerdCondition,
        below: STARVING_HERD_CONDITION,
        floor: None,
        chance: 1.0,
        target: ResourceKey::Herd,
        loss: LossRoll {
            base: STARVING_HERD_LOSS_BASE,
            spread: STARVING_HERD_LOSS_SPREAD,
        },
    },
    AttritionRule {
        name: "herd_worn",
        watch: ResourceKey::HerdCondition,
        below: WORN_HERD_CONDITION,
        floor: Some(STARVING_HERD_CONDITION),
        chance: WORN_HERD_LOSS_CHANCE,
        target: ResourceKey::Herd,
        loss: LossRoll {
            base: 0,
            spread: WORN_HERD_LOSS_SPREAD,
        },
    },
    AttritionRule {
        name: "crew_desertion",
        watch: ResourceKey::Morale,
        below: SULLEN_MORALE,
        floor: None,
        chance: DESERTION_CHANCE,
        target: ResourceKey::Crew,
        loss: LossRoll { base: 1, spread: 0 },
    },
];

/// One loss that landed this turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AttritionHit {
    pub rule: &'static str,
    pub target: ResourceKey,
    /// Amount actually removed after clamping.
    pub lost: i32,
}

pub type AttritionHits = SmallVec<[AttritionHit; 3]>;

/// Evaluate `rules` in order. Triggers are read from the ledger as it stood
/// before any rule fired, so no rule sees another rule's loss.
pub fn apply_attrition<R>(ledger: &mut Ledger, rules: &[AttritionRule], rng: &mut R) -> AttritionHits
where
    R: Rng + ?Sized,
{
    let before = ledger.clone();
    let mut hits = AttritionHits::new();
    for rule in rules {
        if !rule.triggered_by(&before) {
            continue;
        }
        if rule.chance < 1.0 && rng.r#gen::<f32>() >= rule.chance {
            continue;
        }
        let amount = rule.loss.roll(rng);
        let Some(applied) = ledger.delta(rule.target, -amount) else {
            continue;
        };
        log::debug!(
            "attrition {}: {} -{} ({} -> {})",
            rule.name,
            rule.target,
            -applied,
            before.get(rule.target),
            ledger.get(rule.target)
        );
        hits.push(AttritionHit {
            rule: rule.name,
            target: rule.target,
            lost: -applied,
        });
    }
    hits
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    fn ledger(condition: i32, morale: i32) -> Ledger {
        Ledger::new()
            .with_resource(ResourceKey::Herd, 2_500, 2_500)
            .with_resource(ResourceKey::Crew, 12, 12)
            .with_resource(ResourceKey::Morale, morale, 100)
            .with_resource(ResourceKey::HerdCondition, condition, 100)
    }

    #[test]
    fn healthy_outfit_loses_nothing() {
        let mut rng = ChaCha20Rng::seed_from_u64(11);
        for _ in 0..200 {
            let mut book = ledger(60, 55);
            let hits = apply_attrition(&mut book, &TRAIL_ATTRITION, &mut rng);
            assert!(hits.is_empty());
            assert_eq!(book, ledger(60, 55));
        }
    }

    #[test]
    fn starving_herd_always_loses_21_to_60_head() {
        let mut rng = ChaCha20Rng::seed_from_u64(12);
        for _ in 0..500 {
            let mut book = ledger(10, 55);
            let hits = apply_attrition(&mut book, &TRAIL_ATTRITION, &mut rng);
            assert_eq!(hits.len(), 1, "worn rule stands aside below 20");
            assert_eq!(hits[0].rule, "herd_starving");
            assert!((21..=60).contains(&hits[0].lost), "lost {}", hits[0].lost);
            assert_eq!(book.get(ResourceKey::Herd), 2_500 - hits[0].lost);
        }
    }

    #[test]
    fn worn_herd_loses_sometimes_and_lightly() {
        let mut rng = ChaCha20Rng::seed_from_u64(13);
        let trials = 4_000;
        let mut hit_count = 0;
        for _ in 0..trials {
            let mut book = ledger(30, 55);
            let hits = apply_attrition(&mut book, &TRAIL_ATTRITION, &mut rng);
            for hit in &hits {
                assert_eq!(hit.rule, "herd_worn");
                assert!((1..=15).contains(&hit.lost));
                hit_count += 1;
            }
        }
        let rate = f64::from(hit_count) / f64::from(trials);
        assert!((rate - 0.4).abs() < 0.03, "rate {rate}");
    }

    #[test]
    fn sullen_crew_deserts_one_at_a_time() {
        let mut rng = ChaCha20Rng::seed_from_u64(14);
        let trials = 4_000;
        let mut deserted = 0;
        for _ in 0..trials {
            let mut book = ledger(60, 10);
            let hits = apply_attrition(&mut book, &TRAIL_ATTRITION, &mut rng);
            if let Some(hit) = hits.first() {
                assert_eq!(hit.target, ResourceKey::Crew);
                assert_eq!(hit.lost, 1);
                assert_eq!(book.get(ResourceKey::Crew), 11);
                deserted += 1;
            }
        }
        let rate = f64::from(deserted) / f64::from(trials);
        assert!((rate - 0.3).abs() < 0.03, "rate {rate}");
    }

    #[test]
    fn losses_saturate_at_zero() {
        let mut rng = ChaCha20Rng::seed_from_u64(15);
        let mut book = ledger(5, 55);
        book.set(ResourceKey::Herd, 10);
        let hits = apply_attrition(&mut book, &TRAIL_ATTRITION, &mut rng);
        assert_eq!(hits[0].lost, 10);
        assert_eq!(book.get(ResourceKey::Herd), 0);
    }

    #[test]
    fn untracked_watch_never_fires() {
        let mut rng = ChaCha20Rng::seed_from_u64(16);
        let mut book = Ledger::new().with_resource(ResourceKey::Herd, 500, 500);
        assert!(apply_attrition(&mut book, &TRAIL_ATTRITION, &mut rng).is_empty());
    }
}
