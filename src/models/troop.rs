//! Troop model.
//!
//! A troop is a camping group that gets one weekly schedule. It carries
//! a ranked preference list (index 0 = most wanted), its head-count, the
//! commissioner responsible for it, and optional day-specific requests.
//!
//! # Size Categories
//!
//! | Category | Scouts |
//! |----------|--------|
//! | ExtraSmall | ..=5 |
//! | Small | 6..=10 |
//! | Medium | 11..=15 |
//! | Large | 16..=24 |
//! | Split | 25.. |

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::Day;

/// A troop attending camp for the week.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Troop {
    /// Unique troop name.
    pub name: String,
    /// Campsite the troop is staying at.
    pub campsite: String,
    /// Ranked activity names (index 0 = top choice).
    pub preferences: Vec<String>,
    /// Number of scouts.
    pub scouts: u32,
    /// Number of adult leaders.
    pub adults: u32,
    /// Assigned commissioner (empty if none).
    pub commissioner: String,
    /// Activities the troop wants on a particular day.
    pub day_requests: BTreeMap<Day, Vec<String>>,
}

impl Troop {
    /// Creates a troop with 10 scouts and 2 adults and no preferences.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            campsite: String::new(),
            preferences: Vec::new(),
            scouts: 10,
            adults: 2,
            commissioner: String::new(),
            day_requests: BTreeMap::new(),
        }
    }

    /// Sets the campsite.
    pub fn with_campsite(mut self, campsite: impl Into<String>) -> Self {
        self.campsite = campsite.into();
        self
    }

    /// Sets the ranked preference list.
    pub fn with_preferences<I, S>(mut self, preferences: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.preferences = preferences.into_iter().map(Into::into).collect();
        self
    }

    /// Sets scout and adult head-counts.
    pub fn with_size(mut self, scouts: u32, adults: u32) -> Self {
        self.scouts = scouts;
        self.adults = adults;
        self
    }

    /// Sets the commissioner.
    pub fn with_commissioner(mut self, commissioner: impl Into<String>) -> Self {
        self.commissioner = commissioner.into();
        self
    }

    /// Requests `activity` on `day`.
    pub fn with_day_request(mut self, day: Day, activity: impl Into<String>) -> Self {
        self.day_requests
            .entry(day)
            .or_default()
            .push(activity.into());
        self
    }

    /// Total people (scouts + adults).
    #[inline]
    pub fn size(&self) -> u32 {
        self.scouts + self.adults
    }

    /// Zero-based preference rank of `activity`, or `None` if not ranked.
    pub fn rank_of(&self, activity: &str) -> Option<usize> {
        self.preferences.iter().position(|p| p == activity)
    }

    /// Whether `activity` is among the first `n` preferences.
    pub fn is_top_n(&self, activity: &str, n: usize) -> bool {
        self.rank_of(activity).is_some_and(|r| r < n)
    }

    /// Size category by scout count.
    pub fn size_category(&self) -> SizeCategory {
        match self.scouts {
            0..=5 => SizeCategory::ExtraSmall,
            6..=10 => SizeCategory::Small,
            11..=15 => SizeCategory::Medium,
            16..=24 => SizeCategory::Large,
            _ => SizeCategory::Split,
        }
    }

    /// Troops of 25 or more scouts are scheduled as separate groups.
    pub fn needs_split(&self) -> bool {
        self.size_category() == SizeCategory::Split
    }

    /// The day requested for `activity`, if any.
    pub fn requested_day(&self, activity: &str) -> Option<Day> {
        self.day_requests
            .iter()
            .find(|(_, acts)| acts.iter().any(|a| a == activity))
            .map(|(day, _)| *day)
    }
}

/// Troop size bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SizeCategory {
    ExtraSmall,
    Small,
    Medium,
    Large,
    Split,
}
