//! Weighted random selection shared by event selection and outcome resolution.
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Anything that can sit in a weighted pool.
pub trait Weighted {
    /// Relative selection weight. Catalog validation guarantees this is > 0.
    fn weight(&self) -> u32;

    /// Identifier recorded in decision traces.
    fn trace_id(&self) -> String;
}

impl<T: Weighted + ?Sized> Weighted for &T {
    fn weight(&self) -> u32 {
        (**self).weight()
    }

    fn trace_id(&self) -> String {
        (**self).trace_id()
    }
}

/// Result of one weighted draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Draw {
    pub index: usize,
    pub roll: u32,
    pub total: u32,
}

/// Explainability telemetry for a weighted draw.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionTrace {
    /// Identifier for the selection pool (e.g., `chisholm.events`).
    pub pool_id: String,
    pub roll: u32,
    pub total_weight: u32,
    /// Candidates in pool order with their weights.
    pub candidates: Vec<(String, u32)>,
    pub chosen_id: String,
}

/// Draw an index from `weights` with probability `w_i / sum(w)`.
///
/// The roll is uniform in `[0, total)`; items are walked in order and the
/// first one whose cumulative weight exceeds the roll wins. Returns `None`
/// for an empty pool or a zero total.
pub fn draw_index<R>(weights: &[u32], rng: &mut R) -> Option<Draw>
where
    R: Rng + ?Sized,
{
    let total = weights
        .iter()
        .try_fold(0_u32, |acc, weight| acc.checked_add(*weight))?;
    if total == 0 {
        return None;
    }
    let roll = rng.gen_range(0..total);
    let mut remaining = roll;
    for (index, weight) in weights.iter().enumerate() {
        if remaining < *weight {
            return Some(Draw { index, roll, total });
        }
        remaining -= *weight;
    }
    None
}

/// Pick one item from a weighted pool.
pub fn pick_weighted<'a, T, R>(items: &'a [T], rng: &mut R) -> Option<(&'a T, Draw)>
where
    T: Weighted,
    R: Rng + ?Sized,
{
    let weights: Vec<u32> = items.iter().map(|item| item.weight()).collect();
    let draw = draw_index(&weights, rng)?;
    items.get(draw.index).map(|item| (item, draw))
}

/// Pick one item and record a [`DecisionTrace`] for it.
pub fn pick_weighted_traced<'a, T, R>(
    pool_id: &str,
    items: &'a [T],
    rng: &mut R,
) -> Option<(&'a T, DecisionTrace)>
where
    T: Weighted,
    R: Rng + ?Sized,
{
    let (chosen, draw) = pick_weighted(items, rng)?;
    let trace = DecisionTrace {
        pool_id: pool_id.to_string(),
        roll: draw.roll,
        total_weight: draw.total,
        candidates: items
            .iter()
            .map(|item| (item.trace_id(), item.weight()))
            .collect(),
        chosen_id: chosen.trace_id(),
    };
    Some((chosen, trace))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    struct Item(&'static str, u32);

    impl Weighted for Item {
        fn weight(&self) -> u32 {
            self.1
        }

        fn trace_id(&self) -> String {
            self.0.to_string()
        }
    }

    #[test]
    fn empty_and_zero_pools_draw_nothing() {
        let mut rng = ChaCha20Rng::seed_from_u64(1);
        assert!(draw_index(&[], &mut rng).is_none());
        assert!(draw_index(&[0, 0], &mut rng).is_none());
        assert!(draw_index(&[u32::MAX, 1], &mut rng).is_none());
    }

    #[test]
    fn zero_weight_items_are_never_chosen() {
        let mut rng = ChaCha20Rng::seed_from_u64(2);
        for _ in 0..500 {
            let draw = draw_index(&[0, 3, 0], &mut rng).unwrap();
            assert_eq!(draw.index, 1);
        }
    }

    #[test]
    fn frequencies_converge_to_weight_share() {
        let weights = [5_u32, 3, 2];
        let mut counts = [0_u32; 3];
        let mut rng = ChaCha20Rng::seed_from_u64(0x5EED);
        let trials = 100_000;
        for _ in 0..trials {
            let draw = draw_index(&weights, &mut rng).unwrap();
            counts[draw.index] += 1;
        }
        for (count, weight) in counts.iter().zip(weights) {
            let observed = f64::from(*count) / f64::from(trials);
            let expected = f64::from(weight) / 10.0;
            assert!(
                (observed - expected).abs() < 0.01,
                "expected {expected} got {observed}"
            );
        }
    }

    #[test]
    fn roll_maps_to_first_crossing_item() {
        // Rolls 0..4 land on the first item, 5..7 on the second, 8..9 on the third.
        let weights = [5_u32, 3, 2];
        let mut rng = ChaCha20Rng::seed_from_u64(9);
        for _ in 0..200 {
            let draw = draw_index(&weights, &mut rng).unwrap();
            let expected = match draw.roll {
                0..=4 => 0,
                5..=7 => 1,
                _ => 2,
            };
            assert_eq!(draw.index, expected);
            assert_eq!(draw.total, 10);
        }
    }

    #[test]
    fn traced_pick_records_pool_and_choice() {
        let items = [Item("a", 1), Item("b", 50)];
        let mut rng = ChaCha20Rng::seed_from_u64(3);
        let (chosen, trace) = pick_weighted_traced("test.pool", &items, &mut rng).unwrap();
        assert_eq!(trace.pool_id, "test.pool");
        assert_eq!(trace.chosen_id, chosen.0);
        assert_eq!(trace.total_weight, 51);
        assert_eq!(
            trace.candidates,
            vec![("a".to_string(), 1), ("b".to_string(), 50)]
        );
        assert!(trace.roll < 51);
    }
}
