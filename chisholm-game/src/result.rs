//! End-of-drive grading and summary.
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::{ABILENE_PRICE_PER_HEAD, GRADE_CUTOFFS, TRAIL_BUYER_PRICE_PER_HEAD};
use crate::ledger::ResourceKey;
use crate::state::{Decision, Ending, RunState};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Grade {
    A,
    B,
    C,
    D,
    F,
}

impl Grade {
    pub const ALL: [Self; 5] = [Self::A, Self::B, Self::C, Self::D, Self::F];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
            Self::D => "D",
            Self::F => "F",
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Grade by the share of the starting herd still on hand. Any failed drive is an F.
#[must_use]
pub fn grade_for(herd: i32, start_herd: i32, survived: bool) -> Grade {
    if !survived || start_herd <= 0 {
        return Grade::F;
    }
    let fraction = f64::from(herd) / f64::from(start_herd);
    GRADE_CUTOFFS
        .iter()
        .find(|(cutoff, _)| fraction >= *cutoff)
        .map_or(Grade::F, |(_, grade)| *grade)
}

/// Everything the end screen shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub headline: String,
    pub narrative: String,
    pub ending: Option<Ending>,
    pub grade: Grade,
    pub started: i32,
    pub delivered: i32,
    pub lost: i32,
    /// Rounded percentage of the starting herd delivered.
    pub delivered_pct: i32,
    pub hands_lost: i32,
    pub price_per_head: i64,
    pub payout: i64,
    pub day: u32,
    pub turns: u32,
    pub distance: u32,
    pub decisions: Vec<Decision>,
}

impl RunSummary {
    #[must_use]
    pub fn from_state(state: &RunState) -> Self {
        let herd = state.ledger.get(ResourceKey::Herd);
        let crew = state.ledger.get(ResourceKey::Crew);
        let grade = grade_for(herd, state.start_herd, state.survived);
        let delivered_pct = percent_of(herd, state.start_herd);

        let (headline, price_per_head) = match (state.survived, state.early_sale) {
            (false, _) => ("THE TRAIL WINS", 0),
            (true, true) => ("SOLD ON THE TRAIL", TRAIL_BUYER_PRICE_PER_HEAD),
            (true, false) => ("ABILENE", ABILENE_PRICE_PER_HEAD),
        };
        let delivered = if state.survived { herd } else { 0 };
        let payout = i64::from(delivered) * price_per_head;
        let narrative = match (state.survived, state.early_sale) {
            (false, _) => "The herd scattered. The trail won.".to_string(),
            (true, true) => format!(
                "Sold {} head at ${price_per_head}. Total: ${}.",
                group_thousands(i64::from(herd)),
                group_thousands(payout)
            ),
            (true, false) => format!(
                "Delivered {} head ({delivered_pct}%) to Abilene. At ${price_per_head}/head: ${}.",
                group_thousands(i64::from(herd)),
                group_thousands(payout)
            ),
        };

        Self {
            headline: headline.to_string(),
            narrative,
            ending: state.ending,
            grade,
            started: state.start_herd,
            delivered,
            lost: (state.start_herd - herd).max(0),
            delivered_pct,
            hands_lost: (state.start_crew - crew).max(0),
            price_per_head,
            payout,
            day: state.day.min(state.campaign.total_days),
            turns: state.turn,
            distance: state.distance,
            decisions: state.decisions.clone(),
        }
    }
}

fn percent_of(part: i32, whole: i32) -> i32 {
    if whole <= 0 {
        return 0;
    }
    let scaled = (i64::from(part) * 200 + i64::from(whole)) / (i64::from(whole) * 2);
    i32::try_from(scaled).unwrap_or(i32::MAX)
}

/// `2500000` -> `"2,500,000"`.
#[must_use]
pub fn group_thousands(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if value < 0 {
        out.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
