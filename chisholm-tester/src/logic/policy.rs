use std::fmt;
use std::str::FromStr;

use chisholm_game::{Choice, ChoiceKind, Effects, Event, PaceId, ResourceKey, RunState};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;

/// Decision returned by a [`PlayerPolicy`]
#[derive(Debug, Clone)]
pub struct PolicyDecision {
    pub choice_index: usize,
    pub rationale: Option<String>,
}

impl PolicyDecision {
    #[must_use]
    pub fn new(choice_index: usize, rationale: Option<String>) -> Self {
        Self {
            choice_index,
            rationale,
        }
    }
}

/// Policy interface for automated play strategies.
pub trait PlayerPolicy {
    /// Name used for logging/debug output.
    fn name(&self) -> &'static str;

    /// Pace to drive at for the coming turn.
    fn pick_pace(&mut self, state: &RunState) -> PaceId;

    /// Select an option for the presented event.
    fn pick_choice(&mut self, state: &RunState, event: &Event) -> PolicyDecision;
}

/// Built-in gameplay strategies for automated runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GameplayStrategy {
    Cautious,
    Hard,
    Steady,
    Random,
}

impl GameplayStrategy {
    pub const ALL: [Self; 4] = [Self::Cautious, Self::Hard, Self::Steady, Self::Random];

    #[must_use]
    pub fn key(self) -> &'static str {
        match self {
            GameplayStrategy::Cautious => "cautious",
            GameplayStrategy::Hard => "hard",
            GameplayStrategy::Steady => "steady",
            GameplayStrategy::Random => "random",
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            GameplayStrategy::Cautious => "Cautious",
            GameplayStrategy::Hard => "Hard Driver",
            GameplayStrategy::Steady => "Steady",
            GameplayStrategy::Random => "Random",
        }
    }

    #[must_use]
    pub fn description(self) -> &'static str {
        match self {
            GameplayStrategy::Cautious => {
                "Lowest expected losses; rests the herd at easy pace when it wears down"
            }
            GameplayStrategy::Hard => "Pushes every turn and gambles on the best morale swing",
            GameplayStrategy::Steady => "Normal pace, always the first option",
            GameplayStrategy::Random => "Seeded random pace and options",
        }
    }

    #[must_use]
    pub fn create_policy(self, seed: u64) -> Box<dyn PlayerPolicy + Send> {
        match self {
            GameplayStrategy::Cautious => Box::new(CautiousPolicy),
            GameplayStrategy::Hard => Box::new(HardPolicy),
            GameplayStrategy::Steady => Box::new(SteadyPolicy),
            GameplayStrategy::Random => Box::new(RandomPolicy::new(seed)),
        }
    }
}

impl fmt::Display for GameplayStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for GameplayStrategy {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|strategy| strategy.key() == wanted)
            .ok_or(())
    }
}

struct CautiousPolicy;
struct HardPolicy;
struct SteadyPolicy;

struct RandomPolicy {
    rng: ChaCha20Rng,
}

impl RandomPolicy {
    fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha20Rng::seed_from_u64(seed),
        }
    }
}

impl PlayerPolicy for CautiousPolicy {
    fn name(&self) -> &'static str {
        "Cautious"
    }

    fn pick_pace(&mut self, state: &RunState) -> PaceId {
        let condition = state.ledger.get(ResourceKey::HerdCondition);
        let morale = state.ledger.get(ResourceKey::Morale);
        if condition < 45 || morale < 30 {
            PaceId::Easy
        } else {
            PaceId::Normal
        }
    }

    fn pick_choice(&mut self, _state: &RunState, event: &Event) -> PolicyDecision {
        let (idx, risk) = event
            .choices
            .iter()
            .enumerate()
            .map(|(idx, choice)| (idx, expected_risk(choice)))
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .unwrap_or((0, 0.0));
        PolicyDecision::new(idx, Some(format!("risk {risk:.1}")))
    }
}

impl PlayerPolicy for HardPolicy {
    fn name(&self) -> &'static str {
        "Hard Driver"
    }

    fn pick_pace(&mut self, _state: &RunState) -> PaceId {
        PaceId::Push
    }

    fn pick_choice(&mut self, _state: &RunState, event: &Event) -> PolicyDecision {
        // Never settles for the trail buyer.
        let (idx, morale) = event
            .choices
            .iter()
            .enumerate()
            .filter(|(_, choice)| !choice.may_end_early())
            .map(|(idx, choice)| (idx, expected_delta(choice, ResourceKey::Morale)))
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .unwrap_or((0, 0.0));
        PolicyDecision::new(idx, Some(format!("morale {morale:+.1}")))
    }
}

impl PlayerPolicy for SteadyPolicy {
    fn name(&self) -> &'static str {
        "Steady"
    }

    fn pick_pace(&mut self, _state: &RunState) -> PaceId {
        PaceId::Normal
    }

    fn pick_choice(&mut self, _state: &RunState, _event: &Event) -> PolicyDecision {
        PolicyDecision::new(0, None)
    }
}

impl PlayerPolicy for RandomPolicy {
    fn name(&self) -> &'static str {
        "Random"
    }

    fn pick_pace(&mut self, _state: &RunState) -> PaceId {
        PaceId::ALL[self.rng.gen_range(0..PaceId::ALL.len())]
    }

    fn pick_choice(&mut self, _state: &RunState, event: &Event) -> PolicyDecision {
        let idx = self.rng.gen_range(0..event.choices.len().max(1));
        PolicyDecision::new(idx, Some("random".to_string()))
    }
}

/// Expected change to `key`, averaging weighted outcomes.
#[must_use]
pub fn expected_delta(choice: &Choice, key: ResourceKey) -> f64 {
    match &choice.kind {
        ChoiceKind::Fixed { effects, .. } => f64::from(effects.get(key)),
        ChoiceKind::Branching { outcomes } => {
            let total: u32 = outcomes.iter().map(|outcome| outcome.weight).sum();
            if total == 0 {
                return 0.0;
            }
            let weighted: f64 = outcomes
                .iter()
                .map(|outcome| f64::from(outcome.weight) * f64::from(outcome.effects.get(key)))
                .sum();
            weighted / f64::from(total)
        }
    }
}

/// Per-unit cost of losing each resource, roughly in "supply points".
const LOSS_COSTS: [(ResourceKey, f64); 6] = [
    (ResourceKey::Herd, 0.2),
    (ResourceKey::Crew, 8.0),
    (ResourceKey::Horses, 1.5),
    (ResourceKey::Supplies, 1.0),
    (ResourceKey::Morale, 0.7),
    (ResourceKey::HerdCondition, 1.0),
];

/// Expected cost of a choice: losses count fully, gains offset half as much.
#[must_use]
pub fn expected_risk(choice: &Choice) -> f64 {
    LOSS_COSTS
        .iter()
        .map(|(key, cost)| {
            let delta = expected_delta(choice, *key);
            if delta < 0.0 {
                -delta * cost
            } else {
                -delta * cost * 0.5
            }
        })
        .sum()
}

/// `herd-40 morale+2`, in key order.
#[must_use]
pub fn effects_summary(effects: &Effects) -> String {
    effects
        .iter()
        .map(|(key, value)| format!("{key}{value:+}"))
        .collect::<Vec<_>>()
        .join(" ")
}
