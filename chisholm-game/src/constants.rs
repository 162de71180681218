//! Centralized balance and tuning constants for the trail-drive simulation.
//!
//! These values define the deterministic math for the core simulation.
//! Keeping them together means a balance change is a reviewed code change
//! rather than an edit to a JSON asset.

use crate::result::Grade;

// Campaign -----------------------------------------------------------------
pub(crate) const TOTAL_DAYS: u32 = 70;
pub(crate) const DAYS_PER_TURN: u32 = 5;
pub(crate) const TOTAL_DISTANCE_MILES: u32 = 800;
pub(crate) const START_DAY: u32 = 1;

// Failure thresholds (at or below ends the drive) ---------------------------
pub(crate) const FAIL_CREW_AT_OR_BELOW: i32 = 2;
pub(crate) const FAIL_HERD_AT_OR_BELOW: i32 = 100;
pub(crate) const FAIL_HORSES_AT_OR_BELOW: i32 = 5;

// Ledger bounds ------------------------------------------------------------
pub(crate) const PERCENT_MAX: i32 = 100;
pub(crate) const SPARE_PARTS_MAX: i32 = 10;

// Standard outfit ----------------------------------------------------------
pub(crate) const STANDARD_HERD: i32 = 2_500;
pub(crate) const STANDARD_CREW: i32 = 12;
pub(crate) const STANDARD_HORSES: i32 = 60;
pub(crate) const STANDARD_SUPPLIES: i32 = 65;
pub(crate) const HERD_SIZE_MIN: i32 = 1_000;
pub(crate) const HERD_SIZE_MAX: i32 = 3_500;
pub(crate) const EXTRA_CREW_MAX: i32 = 8;
pub(crate) const EXTRA_HORSES_MAX: i32 = 40;
pub(crate) const EXTRA_SUPPLIES_MAX: i32 = 35;

/// Head of cattle per hand, mapped to a starting herd-condition rating.
/// First row whose ceiling is >= the ratio wins; the last row catches all.
pub(crate) const HERD_CONDITION_BY_HEAD_PER_HAND: [(i32, i32); 6] = [
    (150, 70),
    (180, 65),
    (220, 60),
    (250, 50),
    (280, 40),
    (i32::MAX, 30),
];

// Supply drain -------------------------------------------------------------
/// Every this many hands above the standard crew costs one more supply per turn.
pub(crate) const EXTRA_HANDS_PER_SUPPLY: i32 = 6;

// Attrition ----------------------------------------------------------------
pub(crate) const STARVING_HERD_CONDITION: i32 = 20;
pub(crate) const STARVING_HERD_LOSS_BASE: i32 = 20;
pub(crate) const STARVING_HERD_LOSS_SPREAD: i32 = 40;
pub(crate) const WORN_HERD_CONDITION: i32 = 35;
pub(crate) const WORN_HERD_LOSS_CHANCE: f32 = 0.4;
pub(crate) const WORN_HERD_LOSS_SPREAD: i32 = 15;
pub(crate) const SULLEN_MORALE: i32 = 15;
pub(crate) const DESERTION_CHANCE: f32 = 0.3;

// Market -------------------------------------------------------------------
pub(crate) const ABILENE_PRICE_PER_HEAD: i64 = 40;
pub(crate) const TRAIL_BUYER_PRICE_PER_HEAD: i64 = 30;

/// Delivered-fraction cutoffs for letter grades, best first.
pub(crate) const GRADE_CUTOFFS: [(f64, Grade); 4] = [
    (0.95, Grade::A),
    (0.88, Grade::B),
    (0.80, Grade::C),
    (0.70, Grade::D),
];

// Selection pools ----------------------------------------------------------
pub(crate) const EVENT_POOL_ID: &str = "chisholm.events";
pub(crate) const OUTCOME_POOL_PREFIX: &str = "chisholm.outcomes.";
