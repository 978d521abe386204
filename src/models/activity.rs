//! Activity model.
//!
//! An activity is something a troop does for one or more consecutive
//! slots of a single day. It belongs to a zone, may need a staff role,
//! and may refuse to share a slot with specific other activities.
//!
//! # Duration Model
//!
//! Durations are expressed in slots. A 1.5-slot activity (e.g. Sailing)
//! books two whole slots; the half is what lets two sessions overlap
//! in their middle slot (see `RuleTables::staggered_start`).

use serde::{Deserialize, Serialize};

use super::Zone;

/// An activity offered at camp.
///
/// Activities are keyed by `name`; two activities with the same name
/// are the same activity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    /// Unique activity name.
    pub name: String,
    /// Nominal duration.
    pub duration: SlotDuration,
    /// Zone the activity takes place in.
    pub zone: Zone,
    /// Staff role running it (`None` = unstaffed).
    pub staff: Option<String>,
    /// Activities that may never share a slot with this one.
    pub conflicts_with: Vec<String>,
}

impl Activity {
    /// Creates a one-slot, unstaffed activity.
    pub fn new(name: impl Into<String>, zone: Zone) -> Self {
        Self {
            name: name.into(),
            duration: SlotDuration::One,
            zone,
            staff: None,
            conflicts_with: Vec::new(),
        }
    }

    /// Sets the duration.
    pub fn with_duration(mut self, duration: SlotDuration) -> Self {
        self.duration = duration;
        self
    }

    /// Sets the staff role.
    pub fn with_staff(mut self, staff: impl Into<String>) -> Self {
        self.staff = Some(staff.into());
        self
    }

    /// Adds an activity this one may not run alongside.
    pub fn with_conflict(mut self, other: impl Into<String>) -> Self {
        self.conflicts_with.push(other.into());
        self
    }

    /// Whether this activity lists `other` as a direct conflict.
    pub fn conflicts(&self, other: &str) -> bool {
        self.conflicts_with.iter().any(|c| c == other)
    }

    /// Whether the activity needs a staff member.
    pub fn is_staffed(&self) -> bool {
        self.staff.is_some()
    }
}

/// Duration of an activity in slots.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SlotDuration {
    #[default]
    One,
    OneAndHalf,
    Two,
    Three,
}

impl SlotDuration {
    /// Whole slots booked (1.5 rounds up).
    pub const fn slots(self) -> usize {
        match self {
            SlotDuration::One => 1,
            SlotDuration::OneAndHalf | SlotDuration::Two => 2,
            SlotDuration::Three => 3,
        }
    }

    /// Nominal length in slots.
    pub fn as_f32(self) -> f32 {
        match self {
            SlotDuration::One => 1.0,
            SlotDuration::OneAndHalf => 1.5,
            SlotDuration::Two => 2.0,
            SlotDuration::Three => 3.0,
        }
    }

    /// Whether more than one slot is booked.
    pub const fn is_multi_slot(self) -> bool {
        self.slots() > 1
    }
}
