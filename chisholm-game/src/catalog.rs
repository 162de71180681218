//! Event catalog: the static, validated table of narrative events.
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

use crate::draw::Weighted;
use crate::ledger::Effects;

const DEFAULT_EVENTS_DATA: &str = include_str!("../assets/data/events.json");

const fn default_weight() -> u32 {
    1
}

/// Errors raised when catalog data violates its invariants.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("event catalog is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("event catalog is empty")]
    Empty,
    #[error("event id {0:?} appears more than once")]
    DuplicateId(String),
    #[error("event {event:?} must weigh more than zero")]
    ZeroEventWeight { event: String },
    #[error("event {event:?} has no choices")]
    NoChoices { event: String },
    #[error("event {event:?} window [{min}, {max}] is not inside 0 <= min <= max")]
    BadWindow { event: String, min: f64, max: f64 },
    #[error("event {event:?} choice {choice} has an outcome list that is empty")]
    NoOutcomes { event: String, choice: usize },
    #[error("event {event:?} choice {choice} outcome {outcome} must weigh more than zero")]
    ZeroOutcomeWeight {
        event: String,
        choice: usize,
        outcome: usize,
    },
    #[error("event {event:?} total weight overflows")]
    WeightOverflow { event: String },
}

/// One concretely-resolved branch of a choice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outcome {
    #[serde(default = "default_weight")]
    pub weight: u32,
    #[serde(default)]
    pub effects: Effects,
    #[serde(default)]
    pub result: String,
    #[serde(default)]
    pub early_end: bool,
}

impl Weighted for Outcome {
    fn weight(&self) -> u32 {
        self.weight
    }

    fn trace_id(&self) -> String {
        self.result.chars().take(24).collect()
    }
}

/// How a choice turns into an effect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChoiceKind {
    /// Always the same effect and narration.
    Fixed { effects: Effects, result: String },
    /// One of several weighted outcomes, drawn per play.
    Branching { outcomes: Vec<Outcome> },
}

/// A player-selectable option within an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawChoice", into = "RawChoice")]
pub struct Choice {
    pub text: String,
    pub kind: ChoiceKind,
    /// Choosing this option ends the drive with a sale, whatever the outcome.
    pub early_end: bool,
}

impl Choice {
    #[must_use]
    pub fn fixed(text: impl Into<String>, effects: Effects, result: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            kind: ChoiceKind::Fixed {
                effects,
                result: result.into(),
            },
            early_end: false,
        }
    }

    #[must_use]
    pub fn branching(text: impl Into<String>, outcomes: Vec<Outcome>) -> Self {
        Self {
            text: text.into(),
            kind: ChoiceKind::Branching { outcomes },
            early_end: false,
        }
    }

    #[must_use]
    pub const fn ending_early(mut self) -> Self {
        self.early_end = true;
        self
    }

    /// True when any way this choice can play out ends the drive with a sale.
    #[must_use]
    pub fn may_end_early(&self) -> bool {
        self.early_end
            || matches!(&self.kind, ChoiceKind::Branching { outcomes }
                if outcomes.iter().any(|outcome| outcome.early_end))
    }
}

/// Wire shape of a choice: either `effects`/`result` or `outcomes`.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawChoice {
    text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    effects: Option<Effects>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    result: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    outcomes: Option<Vec<Outcome>>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    early_end: bool,
}

impl TryFrom<RawChoice> for Choice {
    type Error = String;

    fn try_from(raw: RawChoice) -> Result<Self, Self::Error> {
        let kind = match (raw.outcomes, raw.effects, raw.result) {
            (Some(_), Some(_), _) | (Some(_), _, Some(_)) => {
                return Err(format!(
                    "choice {:?} mixes outcomes with a fixed effect/result",
                    raw.text
                ));
            }
            (Some(outcomes), None, None) => ChoiceKind::Branching { outcomes },
            (None, effects, result) => ChoiceKind::Fixed {
                effects: effects.unwrap_or_default(),
                result: result.unwrap_or_default(),
            },
        };
        Ok(Self {
            text: raw.text,
            kind,
            early_end: raw.early_end,
        })
    }
}

impl From<Choice> for RawChoice {
    fn from(choice: Choice) -> Self {
        let (effects, result, outcomes) = match choice.kind {
            ChoiceKind::Fixed { effects, result } => (Some(effects), Some(result), None),
            ChoiceKind::Branching { outcomes } => (None, None, Some(outcomes)),
        };
        Self {
            text: choice.text,
            effects,
            result,
            outcomes,
            early_end: choice.early_end,
        }
    }
}

/// A phase-gated, weighted narrative event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    pub title: String,
    pub text: String,
    /// Earliest progress fraction (0 = start, 1 = finish) at which the event may fire.
    pub phase_min: f64,
    pub phase_max: f64,
    #[serde(default = "default_weight")]
    pub weight: u32,
    pub choices: Vec<Choice>,
}

impl Event {
    /// Whether the eligibility window contains `progress` (inclusive on both ends).
    #[must_use]
    pub fn in_window(&self, progress: f64) -> bool {
        progress >= self.phase_min && progress <= self.phase_max
    }

    #[must_use]
    pub fn choice_labels(&self) -> Vec<&str> {
        self.choices.iter().map(|choice| choice.text.as_str()).collect()
    }
}

impl Weighted for Event {
    fn weight(&self) -> u32 {
        self.weight
    }

    fn trace_id(&self) -> String {
        self.id.clone()
    }
}

/// Immutable, validated collection of events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawCatalog")]
pub struct EventCatalog {
    events: Vec<Event>,
}

#[derive(Deserialize)]
struct RawCatalog {
    events: Vec<Event>,
}

impl TryFrom<RawCatalog> for EventCatalog {
    type Error = CatalogError;

    fn try_from(raw: RawCatalog) -> Result<Self, Self::Error> {
        Self::new(raw.events)
    }
}

impl EventCatalog {
    /// Validate and wrap a list of events.
    ///
    /// # Errors
    ///
    /// Returns the first invariant violation found, in catalog order.
    pub fn new(events: Vec<Event>) -> Result<Self, CatalogError> {
        validate(&events)?;
        Ok(Self { events })
    }

    /// Parse and validate catalog JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or any event breaks a catalog invariant.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let raw: RawCatalog = serde_json::from_str(json)?;
        Self::new(raw.events)
    }

    /// The trail's built-in event table.
    ///
    /// # Errors
    ///
    /// Returns an error if the embedded asset fails validation.
    pub fn load_from_static() -> Result<Self, CatalogError> {
        Self::from_json(DEFAULT_EVENTS_DATA)
    }

    #[must_use]
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Event> {
        self.events.iter().find(|event| event.id == id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

fn validate(events: &[Event]) -> Result<(), CatalogError> {
    if events.is_empty() {
        return Err(CatalogError::Empty);
    }
    let mut seen = HashSet::new();
    let mut total_weight = 0_u32;
    for event in events {
        if !seen.insert(event.id.as_str()) {
            return Err(CatalogError::DuplicateId(event.id.clone()));
        }
        if event.weight == 0 {
            return Err(CatalogError::ZeroEventWeight {
                event: event.id.clone(),
            });
        }
        total_weight =
            total_weight
                .checked_add(event.weight)
                .ok_or_else(|| CatalogError::WeightOverflow {
                    event: event.id.clone(),
                })?;
        let window_ok = event.phase_min.is_finite()
            && event.phase_max.is_finite()
            && event.phase_min >= 0.0
            && event.phase_min <= event.phase_max;
        if !window_ok {
            return Err(CatalogError::BadWindow {
                event: event.id.clone(),
                min: event.phase_min,
                max: event.phase_max,
            });
        }
        if event.choices.is_empty() {
            return Err(CatalogError::NoChoices {
                event: event.id.clone(),
            });
        }
        for (choice_idx, choice) in event.choices.iter().enumerate() {
            validate_choice(event, choice_idx, choice)?;
        }
    }
    Ok(())
}

fn validate_choice(event: &Event, choice_idx: usize, choice: &Choice) -> Result<(), CatalogError> {
    let ChoiceKind::Branching { outcomes } = &choice.kind else {
        return Ok(());
    };
    if outcomes.is_empty() {
        return Err(CatalogError::NoOutcomes {
            event: event.id.clone(),
            choice: choice_idx,
        });
    }
    let mut total = 0_u32;
    for (outcome_idx, outcome) in outcomes.iter().enumerate() {
        if outcome.weight == 0 {
            return Err(CatalogError::ZeroOutcomeWeight {
                event: event.id.clone(),
                choice: choice_idx,
                outcome: outcome_idx,
            });
        }
        total = total
            .checked_add(outcome.weight)
            .ok_or_else(|| CatalogError::WeightOverflow {
                event: event.id.clone(),
            })?;
    }
    Ok(())
}
