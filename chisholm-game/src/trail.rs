//! Display helpers for the trail HUD: landmarks, flavor text and status bands.
use serde::Serialize;

use crate::ledger::{Ledger, ResourceKey};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Landmark {
    pub name: &'static str,
    /// Position along the trail as a distance fraction.
    pub at: f64,
}

pub const LANDMARKS: [Landmark; 5] = [
    Landmark { name: "Austin", at: 0.15 },
    Landmark { name: "Waco", at: 0.30 },
    Landmark { name: "Red River", at: 0.45 },
    Landmark { name: "Indian Territory", at: 0.55 },
    Landmark { name: "Wichita", at: 0.75 },
];

/// Landmarks already behind the herd.
pub fn passed_landmarks(distance_fraction: f64) -> impl Iterator<Item = &'static Landmark> {
    LANDMARKS.iter().filter(move |mark| mark.at <= distance_fraction)
}

#[must_use]
pub fn next_landmark(distance_fraction: f64) -> Option<&'static Landmark> {
    LANDMARKS.iter().find(|mark| mark.at > distance_fraction)
}

const PHRASES: [(f64, &str); 6] = [
    (0.15, "Eight hundred miles of dust and trouble ahead."),
    (0.30, "Days blur. Dust, cattle, sky. Repeat."),
    (0.50, "Indian Territory looms. Crew gets quiet at night."),
    (0.70, "Past halfway. Kansas might be real."),
    (0.85, "Grass is changing. Shorter. Cooler nights."),
    (0.95, "Scout says he can smell Abilene. He's lying. Not by much."),
];

/// Flavor line for a calendar fraction (day over total days).
#[must_use]
pub fn progress_phrase(day_fraction: f64) -> &'static str {
    PHRASES
        .iter()
        .find(|(below, _)| day_fraction < *below)
        .map_or("The railhead is close. You can almost hear the train.", |(_, phrase)| *phrase)
}

/// Trail boss mood: rounded mean of morale and herd condition.
#[must_use]
pub fn outlook(ledger: &Ledger) -> i32 {
    let sum = ledger.get(ResourceKey::Morale) + ledger.get(ResourceKey::HerdCondition);
    (sum + 1).div_euclid(2)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Good,
    Fair,
    Poor,
    Critical,
}

/// Band a resource for the HUD. Counts use fixed warning lines, percentages use
/// 60/40/20.
#[must_use]
pub fn status_of(key: ResourceKey, value: i32) -> Status {
    let count_bands = match key {
        ResourceKey::Herd => Some((2_000, 1_500)),
        ResourceKey::Crew => Some((9, 6)),
        ResourceKey::Horses => Some((40, 20)),
        _ => None,
    };
    if let Some((good_above, fair_above)) = count_bands {
        return if value > good_above {
            Status::Good
        } else if value > fair_above {
            Status::Fair
        } else {
            Status::Critical
        };
    }
    match value {
        60.. => Status::Good,
        40..=59 => Status::Fair,
        20..=39 => Status::Poor,
        _ => Status::Critical,
    }
}
