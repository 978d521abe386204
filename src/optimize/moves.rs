//! Reversible schedule moves.
//!
//! Optimizers never edit entries in place. A [`Move`] removes and
//! re-adds spans through the schedule's checked API; applying it yields
//! an [`AppliedMove`] that can put everything back exactly.
//!
//! # Move Kinds
//!
//! | Move | Effect |
//! |------|--------|
//! | `Replace` | drop the troop's span covering `slot` (if any), start `add` there |
//! | `Relocate` | move the span starting at `from` to a free `to` |
//! | `Exchange` | swap two single-slot entries of one troop |

use std::sync::Arc;

use crate::error::PlacementError;
use crate::models::{Activity, Schedule, ScheduleEntry, TimeSlot, Troop};
use crate::scheduler::{ConstraintChecker, Strictness};

/// A candidate change to one troop's week.
#[derive(Debug, Clone)]
pub enum Move {
    Replace {
        troop: String,
        slot: TimeSlot,
        add: Arc<Activity>,
    },
    Relocate {
        troop: String,
        from: TimeSlot,
        to: TimeSlot,
    },
    Exchange {
        troop: String,
        a: TimeSlot,
        b: TimeSlot,
    },
}

/// Record of an applied move.
#[must_use = "an applied move should be kept or reverted"]
#[derive(Debug, Clone)]
pub struct AppliedMove {
    troop: Arc<Troop>,
    removed: Vec<(TimeSlot, Arc<Activity>)>,
    added: Vec<TimeSlot>,
}

impl AppliedMove {
    /// Undoes the move.
    pub fn revert(self, schedule: &mut Schedule) {
        undo(schedule, &self.troop, &self.added, &self.removed);
    }

    /// Start slots of the spans the move created.
    pub fn added_slots(&self) -> &[TimeSlot] {
        &self.added
    }
}

fn undo(
    schedule: &mut Schedule,
    troop: &Arc<Troop>,
    added: &[TimeSlot],
    removed: &[(TimeSlot, Arc<Activity>)],
) {
    for &slot in added {
        schedule.remove_at(&troop.name, slot);
    }
    for (slot, activity) in removed {
        schedule.restore(*slot, activity, troop);
    }
}

impl Move {
    /// Troop the move changes.
    pub fn troop(&self) -> &str {
        match self {
            Move::Replace { troop, .. } | Move::Relocate { troop, .. } | Move::Exchange { troop, .. } => {
                troop
            }
        }
    }

    /// Applies the move under `strictness`. On failure the schedule is
    /// left unchanged.
    pub fn apply(
        &self,
        schedule: &mut Schedule,
        strictness: Strictness,
    ) -> Result<AppliedMove, PlacementError> {
        let troop = schedule
            .troop(self.troop())
            .cloned()
            .ok_or_else(|| PlacementError::UnknownTroop(self.troop().to_string()))?;
        let checker = ConstraintChecker::new();
        let mut removed = Vec::new();
        let mut added = Vec::new();

        let result = match self {
            Move::Replace { slot, add, .. } => {
                take(schedule, &troop, *slot, &mut removed);
                checker
                    .place(schedule, &troop, add, *slot, strictness)
                    .map(|_| added.push(*slot))
            }
            Move::Relocate { from, to, .. } => {
                match take_start(schedule, &troop, *from, &mut removed) {
                    Some(activity) => checker
                        .place(schedule, &troop, &activity, *to, strictness)
                        .map(|_| added.push(*to)),
                    None => Err(PlacementError::NothingToMove {
                        troop: troop.name.clone(),
                        slot: *from,
                    }),
                }
            }
            Move::Exchange { a, b, .. } => {
                let first = take_start(schedule, &troop, *a, &mut removed);
                let second = take_start(schedule, &troop, *b, &mut removed);
                match (first, second) {
                    (Some(act_a), Some(act_b)) => checker
                        .place(schedule, &troop, &act_a, *b, strictness)
                        .map(|_| added.push(*b))
                        .and_then(|_| {
                            checker
                                .place(schedule, &troop, &act_b, *a, strictness)
                                .map(|_| added.push(*a))
                        }),
                    _ => Err(PlacementError::NothingToMove {
                        troop: troop.name.clone(),
                        slot: *a,
                    }),
                }
            }
        };

        match result {
            Ok(()) => Ok(AppliedMove {
                troop,
                removed,
                added,
            }),
            Err(err) => {
                undo(schedule, &troop, &added, &removed);
                Err(err)
            }
        }
    }
}

/// Removes the troop's span covering `slot`, remembering it.
fn take(
    schedule: &mut Schedule,
    troop: &Troop,
    slot: TimeSlot,
    removed: &mut Vec<(TimeSlot, Arc<Activity>)>,
) -> Option<Arc<Activity>> {
    let entry = schedule.entry_at(&troop.name, slot)?;
    let (start, activity) = (entry.start(), Arc::clone(entry.activity()));
    schedule.remove_at(&troop.name, slot)?;
    removed.push((start, Arc::clone(&activity)));
    Some(activity)
}

/// Like [`take`], but only if `slot` starts a span.
fn take_start(
    schedule: &mut Schedule,
    troop: &Troop,
    slot: TimeSlot,
    removed: &mut Vec<(TimeSlot, Arc<Activity>)>,
) -> Option<Arc<Activity>> {
    if !schedule.entry_at(&troop.name, slot)?.is_start() {
        return None;
    }
    take(schedule, troop, slot, removed)
}

/// Whether an optimizer may move this entry: a single-slot span start
/// that is neither mandatory nor pinned by a day request.
pub(crate) fn is_movable(schedule: &Schedule, entry: &ScheduleEntry) -> bool {
    entry.is_start()
        && schedule.effective_slots(entry.activity(), entry.troop()) == 1
        && !schedule.rules().is_mandatory(entry.name())
        && entry.troop().requested_day(entry.name()).is_none()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{act, camp_catalog, camp_rules, slot, troop};
    use crate::models::Day;

    fn setup() -> Schedule {
        let catalog = camp_catalog();
        let mut schedule = Schedule::new(camp_rules());
        let t1 = troop("T1", 10, 2);
        for (day, n, name) in [
            (Day::Monday, 1, "Gaga Ball"),
            (Day::Monday, 2, "Tie Dye"),
            (Day::Tuesday, 1, "Canoe Snorkel"),
            (Day::Wednesday, 3, "Archery"),
        ] {
            schedule.add_entry(slot(day, n), &act(&catalog, name), &t1).unwrap();
        }
        schedule
    }

    #[test]
    fn test_replace_apply_revert() {
        let catalog = camp_catalog();
        let mut schedule = setup();
        let before = schedule.placements();

        let mv = Move::Replace {
            troop: "T1".into(),
            slot: slot(Day::Monday, 1),
            add: act(&catalog, "9 Square"),
        };
        let applied = mv.apply(&mut schedule, Strictness::Standard).unwrap();
        assert_eq!(schedule.entry_at("T1", slot(Day::Monday, 1)).unwrap().name(), "9 Square");
        applied.revert(&mut schedule);
        assert_eq!(schedule.placements(), before);
    }

    #[test]
    fn test_relocate_multi_slot_span() {
        let mut schedule = setup();
        let before = schedule.placements();

        let mv = Move::Relocate {
            troop: "T1".into(),
            from: slot(Day::Tuesday, 1),
            to: slot(Day::Friday, 1),
        };
        let applied = mv.apply(&mut schedule, Strictness::Standard).unwrap();
        assert!(schedule.is_troop_free(slot(Day::Tuesday, 2), "T1"));
        assert!(!schedule.is_troop_free(slot(Day::Friday, 2), "T1"));
        applied.revert(&mut schedule);
        assert_eq!(schedule.placements(), before);
    }

    #[test]
    fn test_exchange_and_failed_exchange_leaves_schedule_unchanged() {
        let mut schedule = setup();
        let before = schedule.placements();

        let ok = Move::Exchange {
            troop: "T1".into(),
            a: slot(Day::Monday, 1),
            b: slot(Day::Wednesday, 3),
        };
        let applied = ok.apply(&mut schedule, Strictness::Standard).unwrap();
        assert_eq!(schedule.entry_at("T1", slot(Day::Monday, 1)).unwrap().name(), "Archery");
        applied.revert(&mut schedule);
        assert_eq!(schedule.placements(), before);

        // Canoe Snorkel cannot start in Wednesday slot 3 (two slots).
        let bad = Move::Exchange {
            troop: "T1".into(),
            a: slot(Day::Tuesday, 1),
            b: slot(Day::Wednesday, 3),
        };
        assert!(bad.apply(&mut schedule, Strictness::Standard).is_err());
        assert_eq!(schedule.placements(), before);
    }

    #[test]
    fn test_relocate_from_continuation_is_rejected() {
        let mut schedule = setup();
        let before = schedule.placements();
        let mv = Move::Relocate {
            troop: "T1".into(),
            from: slot(Day::Tuesday, 2),
            to: slot(Day::Friday, 1),
        };
        assert!(mv.apply(&mut schedule, Strictness::Standard).is_err());
        assert_eq!(schedule.placements(), before);
    }

    #[test]
    fn test_is_movable() {
        let schedule = setup();
        let gaga = schedule.entry_at("T1", slot(Day::Monday, 1)).unwrap();
        let snorkel = schedule.entry_at("T1", slot(Day::Tuesday, 1)).unwrap();
        assert!(is_movable(&schedule, gaga));
        assert!(!is_movable(&schedule, snorkel));
    }
}
