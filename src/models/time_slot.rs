//! Weekly time grid.
//!
//! A camp week has five days. Monday, Tuesday, Wednesday and Friday
//! have three bookable slots; Thursday has two. That gives 14 slots
//! per week, each addressable by a dense index `0..14`.
//!
//! # Grid
//!
//! | Day | Slots | Indices |
//! |-----|-------|---------|
//! | Monday | 1, 2, 3 | 0..3 |
//! | Tuesday | 1, 2, 3 | 3..6 |
//! | Wednesday | 1, 2, 3 | 6..9 |
//! | Thursday | 1, 2 | 9..11 |
//! | Friday | 1, 2, 3 | 11..14 |

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::InvalidTimeSlot;

/// Number of slots in one week.
pub const SLOTS_PER_WEEK: usize = 14;

/// A camp day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Day {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
}

impl Day {
    /// All days in week order.
    pub const ALL: [Day; 5] = [
        Day::Monday,
        Day::Tuesday,
        Day::Wednesday,
        Day::Thursday,
        Day::Friday,
    ];

    /// Number of bookable slots on this day.
    pub const fn slot_count(self) -> u8 {
        match self {
            Day::Thursday => 2,
            _ => 3,
        }
    }

    /// Position of the day in the week (Monday = 0).
    pub const fn ordinal(self) -> usize {
        self as usize
    }

    /// Index of this day's first slot in the week grid.
    const fn first_index(self) -> usize {
        match self {
            Day::Monday => 0,
            Day::Tuesday => 3,
            Day::Wednesday => 6,
            Day::Thursday => 9,
            Day::Friday => 11,
        }
    }

    /// The slots of this day in order.
    pub fn slots(self) -> impl Iterator<Item = TimeSlot> {
        (1..=self.slot_count()).map(move |slot| TimeSlot { day: self, slot })
    }

    /// Last day of the week.
    pub const fn last() -> Day {
        Day::Friday
    }

    /// Three-letter abbreviation.
    pub const fn short(self) -> &'static str {
        match self {
            Day::Monday => "Mon",
            Day::Tuesday => "Tue",
            Day::Wednesday => "Wed",
            Day::Thursday => "Thu",
            Day::Friday => "Fri",
        }
    }
}

impl fmt::Display for Day {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

/// Activity zone, used to group activities for clustering metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Zone {
    Delta,
    Beach,
    OutdoorSkills,
    Tower,
    OffCamp,
    Campsite,
}

impl Zone {
    /// All zones.
    pub const ALL: [Zone; 6] = [
        Zone::Delta,
        Zone::Beach,
        Zone::OutdoorSkills,
        Zone::Tower,
        Zone::OffCamp,
        Zone::Campsite,
    ];
}

/// One bookable period: a (day, slot-number) pair.
///
/// Slot numbers are 1-based. Values outside the grid (e.g. Thursday
/// slot 3) cannot be constructed, deserialized ones included.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "RawTimeSlot")]
pub struct TimeSlot {
    day: Day,
    slot: u8,
}

#[derive(Deserialize)]
struct RawTimeSlot {
    day: Day,
    slot: u8,
}

impl TryFrom<RawTimeSlot> for TimeSlot {
    type Error = InvalidTimeSlot;

    fn try_from(raw: RawTimeSlot) -> Result<Self, Self::Error> {
        TimeSlot::new(raw.day, raw.slot).ok_or(InvalidTimeSlot {
            day: raw.day,
            slot: raw.slot,
        })
    }
}

impl TimeSlot {
    /// Creates a slot, or `None` if `slot` does not exist on `day`.
    pub fn new(day: Day, slot: u8) -> Option<Self> {
        (1..=day.slot_count())
            .contains(&slot)
            .then_some(Self { day, slot })
    }

    /// All 14 slots in week order.
    pub fn all() -> impl Iterator<Item = TimeSlot> {
        Day::ALL.into_iter().flat_map(Day::slots)
    }

    /// Slot with the given dense index.
    pub fn from_index(index: usize) -> Option<Self> {
        TimeSlot::all().nth(index)
    }

    /// The day.
    #[inline]
    pub fn day(&self) -> Day {
        self.day
    }

    /// The 1-based slot number within the day.
    #[inline]
    pub fn number(&self) -> u8 {
        self.slot
    }

    /// Dense week index in `0..SLOTS_PER_WEEK`.
    #[inline]
    pub fn index(&self) -> usize {
        self.day.first_index() + (self.slot as usize - 1)
    }

    /// The following slot on the same day, if any.
    pub fn next_in_day(&self) -> Option<TimeSlot> {
        TimeSlot::new(self.day, self.slot + 1)
    }

    /// The preceding slot on the same day, if any.
    pub fn prev_in_day(&self) -> Option<TimeSlot> {
        self.slot
            .checked_sub(1)
            .and_then(|s| TimeSlot::new(self.day, s))
    }

    /// The `count` consecutive slots starting here, or `None` if the
    /// span would run past the end of the day.
    pub fn span(&self, count: usize) -> Option<Vec<TimeSlot>> {
        let last = self.slot as usize + count.saturating_sub(1);
        if count == 0 || last > self.day.slot_count() as usize {
            return None;
        }
        Some(
            (self.slot..=last as u8)
                .map(|slot| TimeSlot { day: self.day, slot })
                .collect(),
        )
    }

    /// Whether this is the last slot of its day.
    pub fn is_last_of_day(&self) -> bool {
        self.slot == self.day.slot_count()
    }
}

impl fmt::Display for TimeSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.day.short(), self.slot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_week_has_fourteen_slots() {
        assert_eq!(TimeSlot::all().count(), SLOTS_PER_WEEK);
    }

    #[test]
    fn test_thursday_has_no_third_slot() {
        assert!(TimeSlot::new(Day::Thursday, 3).is_none());
        assert!(TimeSlot::new(Day::Thursday, 2).is_some());
        assert!(TimeSlot::new(Day::Monday, 0).is_none());
        assert!(TimeSlot::new(Day::Friday, 4).is_none());
    }

    #[test]
    fn test_dense_index_matches_order() {
        for (i, slot) in TimeSlot::all().enumerate() {
            assert_eq!(slot.index(), i);
            assert_eq!(TimeSlot::from_index(i), Some(slot));
        }
        assert!(TimeSlot::from_index(SLOTS_PER_WEEK).is_none());
    }

    #[test]
    fn test_next_and_prev_stay_in_day() {
        let wed3 = TimeSlot::new(Day::Wednesday, 3).unwrap();
        assert!(wed3.next_in_day().is_none());
        assert_eq!(wed3.prev_in_day(), TimeSlot::new(Day::Wednesday, 2));

        let mon1 = TimeSlot::new(Day::Monday, 1).unwrap();
        assert!(mon1.prev_in_day().is_none());
    }

    #[test]
    fn test_span_respects_day_boundary() {
        let thu2 = TimeSlot::new(Day::Thursday, 2).unwrap();
        assert!(thu2.span(2).is_none());
        assert_eq!(thu2.span(1).unwrap(), vec![thu2]);

        let mon1 = TimeSlot::new(Day::Monday, 1).unwrap();
        assert_eq!(mon1.span(3).unwrap().len(), 3);
        assert!(mon1.span(4).is_none());
        assert!(mon1.span(0).is_none());
    }

    #[test]
    fn test_deserialize_checks_the_grid() {
        let ok: TimeSlot = serde_json::from_str(r#"{"day":"Thursday","slot":2}"#).unwrap();
        assert_eq!(ok, TimeSlot::new(Day::Thursday, 2).unwrap());
        assert_eq!(ok.index(), 10);

        for bad in [
            r#"{"day":"Thursday","slot":3}"#,
            r#"{"day":"Friday","slot":4}"#,
            r#"{"day":"Monday","slot":0}"#,
        ] {
            let err = serde_json::from_str::<TimeSlot>(bad).unwrap_err();
            assert!(err.to_string().contains("has no slot"), "{bad}: {err}");
        }
    }

    #[test]
    fn test_display() {
        let slot = TimeSlot::new(Day::Tuesday, 2).unwrap();
        assert_eq!(slot.to_string(), "Tue-2");
    }
}
