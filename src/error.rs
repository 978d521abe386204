//! Error types.

use thiserror::Error;

use crate::models::{Day, TimeSlot};
use crate::validation::ValidationError;

/// Why a placement was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlacementError {
    #[error("troop '{troop}' is already busy at {slot}")]
    TroopBusy { troop: String, slot: TimeSlot },

    #[error("'{activity}' is not available at {slot}")]
    ActivityUnavailable { activity: String, slot: TimeSlot },

    #[error("'{activity}' needs {slots} slots and would run past the end of {day}")]
    CrossesDayBoundary {
        activity: String,
        slots: usize,
        day: Day,
    },

    #[error("troop '{troop}' already has '{activity}' this week")]
    AlreadyScheduled { troop: String, activity: String },

    #[error("'{activity}' may not start in slot 2 on {day}")]
    BeachSlot { activity: String, day: Day },

    #[error("'{activity}' breaks wet/dry sequencing on {day}")]
    WetDrySequence { activity: String, day: Day },

    #[error("'{activity}' exceeds the accuracy limit on {day}")]
    AccuracyLimit { activity: String, day: Day },

    #[error("'{activity}' conflicts with '{other}' on {day}")]
    SameDayConflict {
        activity: String,
        other: String,
        day: Day,
    },

    #[error("'{activity}' belongs on {expected}, not {day}")]
    CommissionerDay {
        activity: String,
        expected: Day,
        day: Day,
    },

    #[error("troop '{troop}' has no movable entry starting at {slot}")]
    NothingToMove { troop: String, slot: TimeSlot },

    #[error("no candidate slot left for '{activity}' in troop '{troop}'")]
    NoCandidateSlot { troop: String, activity: String },

    #[error("unknown activity '{0}'")]
    UnknownActivity(String),

    #[error("unknown troop '{0}'")]
    UnknownTroop(String),
}

/// A (day, slot) pair outside the weekly grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("{day} has no slot {slot}")]
pub struct InvalidTimeSlot {
    pub day: Day,
    pub slot: u8,
}

/// Why a planning run could not start.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlanError {
    #[error("invalid input: {} problem(s), first: {}", .0.len(), first_message(.0))]
    InvalidInput(Vec<ValidationError>),
}

fn first_message(errors: &[ValidationError]) -> &str {
    errors.first().map(|e| e.message.as_str()).unwrap_or("-")
}
