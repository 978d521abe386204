//! Layered placement checks.
//!
//! [`ConstraintChecker::can_schedule`] decides whether a troop may start
//! an activity in a slot. Rules are checked in a fixed order and the
//! first failure is returned:
//!
//! | # | Rule | Kind | Skipped by |
//! |---|------|------|-----------|
//! | 1 | Troop free over the whole span | hard | - |
//! | 2 | Span fits in the day | hard | - |
//! | 3 | Once per week | hard | - |
//! | 4 | Exclusivity and carve-outs | hard | - |
//! | 5 | Beach-slot rule | soft | Relaxed |
//! | 6 | Same-day conflict pairs | hard | - |
//! | 7 | Wet/dry sequencing | soft | Relaxed |
//! | 8 | Accuracy limit (hard pair always) | soft | Relaxed |
//! | 9 | Commissioner day | soft | Standard, Relaxed |
//!
//! Rules 1, 2 and 4 are the schedule's own occupancy checks
//! ([`Schedule::check_placement`]).

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::PlacementError;
use crate::models::{Activity, Day, EntryId, RuleTables, Schedule, TimeSlot, Troop};

/// How many soft rules a placement must respect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Strictness {
    /// Every rule.
    Strict,
    /// Every rule except commissioner-day clustering.
    Standard,
    /// Hard rules only.
    Relaxed,
}

/// Stateless placement checker reading rules from the schedule.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConstraintChecker;

impl ConstraintChecker {
    pub fn new() -> Self {
        Self
    }

    /// Whether `troop` may start `activity` at `slot`.
    pub fn can_schedule(
        &self,
        schedule: &Schedule,
        troop: &Troop,
        activity: &Activity,
        slot: TimeSlot,
        strictness: Strictness,
    ) -> Result<(), PlacementError> {
        let rules = schedule.rules();
        let name = activity.name.as_str();

        if !schedule.is_troop_free(slot, &troop.name) {
            return Err(PlacementError::TroopBusy {
                troop: troop.name.clone(),
                slot,
            });
        }
        if name != rules.repeatable_filler && schedule.has_activity(&troop.name, name) {
            return Err(PlacementError::AlreadyScheduled {
                troop: troop.name.clone(),
                activity: name.to_string(),
            });
        }
        schedule.check_placement(slot, activity, troop)?;

        let relaxed = strictness == Strictness::Relaxed;
        if !relaxed {
            self.check_beach_slot(rules, troop, name, slot)?;
        }
        self.check_same_day(schedule, troop, name, slot.day())?;
        self.check_accuracy(schedule, troop, name, slot.day(), relaxed)?;
        if !relaxed {
            self.check_wet_dry(schedule, troop, activity, slot)?;
        }
        if strictness == Strictness::Strict {
            if let Some(expected) = rules.commissioner_day(&troop.commissioner, name) {
                if expected != slot.day() {
                    return Err(PlacementError::CommissionerDay {
                        activity: name.to_string(),
                        expected,
                        day: slot.day(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Checks and places in one step.
    pub fn place(
        &self,
        schedule: &mut Schedule,
        troop: &Arc<Troop>,
        activity: &Arc<Activity>,
        slot: TimeSlot,
        strictness: Strictness,
    ) -> Result<EntryId, PlacementError> {
        self.can_schedule(schedule, troop, activity, slot, strictness)?;
        schedule.add_entry(slot, activity, troop)
    }

    /// Soft rules (beach slot, wet/dry, accuracy) the placement would
    /// break. Used to record what a relaxed placement gave up.
    pub fn soft_breaches(
        &self,
        schedule: &Schedule,
        troop: &Troop,
        activity: &Activity,
        slot: TimeSlot,
    ) -> Vec<PlacementError> {
        let rules = schedule.rules();
        let name = activity.name.as_str();
        [
            self.check_beach_slot(rules, troop, name, slot),
            self.check_wet_dry(schedule, troop, activity, slot),
            self.check_accuracy(schedule, troop, name, slot.day(), false),
        ]
        .into_iter()
        .filter_map(Result::err)
        .collect()
    }

    fn check_beach_slot(
        &self,
        rules: &RuleTables,
        troop: &Troop,
        name: &str,
        slot: TimeSlot,
    ) -> Result<(), PlacementError> {
        if breaks_beach_slot(rules, troop, name, slot) {
            return Err(PlacementError::BeachSlot {
                activity: name.to_string(),
                day: slot.day(),
            });
        }
        Ok(())
    }

    fn check_same_day(
        &self,
        schedule: &Schedule,
        troop: &Troop,
        name: &str,
        day: Day,
    ) -> Result<(), PlacementError> {
        let rules = schedule.rules();
        for s in day.slots() {
            if let Some(e) = schedule.entry_at(&troop.name, s) {
                if rules.same_day_conflict(name, e.name()) {
                    return Err(PlacementError::SameDayConflict {
                        activity: name.to_string(),
                        other: e.name().to_string(),
                        day,
                    });
                }
            }
        }
        Ok(())
    }

    fn check_accuracy(
        &self,
        schedule: &Schedule,
        troop: &Troop,
        name: &str,
        day: Day,
        hard_only: bool,
    ) -> Result<(), PlacementError> {
        let rules = schedule.rules();
        if !rules.is_accuracy(name) {
            return Ok(());
        }
        for s in day.slots() {
            let Some(e) = schedule.entry_at(&troop.name, s) else {
                continue;
            };
            let other = e.name();
            let hard = rules.is_hard_accuracy_pair(name, other);
            if hard || (!hard_only && other != name && rules.is_accuracy(other)) {
                return Err(PlacementError::AccuracyLimit {
                    activity: name.to_string(),
                    day,
                });
            }
        }
        Ok(())
    }

    fn check_wet_dry(
        &self,
        schedule: &Schedule,
        troop: &Troop,
        activity: &Activity,
        slot: TimeSlot,
    ) -> Result<(), PlacementError> {
        let rules = schedule.rules();
        let day = slot.day();
        let span = rules.effective_slots(activity, troop);
        let mut names = day_names(schedule, &troop.name, day);
        for offset in 0..span {
            let idx = slot.number() as usize - 1 + offset;
            if let Some(cell) = names.get_mut(idx) {
                *cell = Some(activity.name.as_str());
            }
        }
        if breaks_wet_dry(rules, &names) {
            return Err(PlacementError::WetDrySequence {
                activity: activity.name.clone(),
                day,
            });
        }
        Ok(())
    }
}

/// Activity name in each slot of the troop's day (`None` = free).
pub(crate) fn day_names<'a>(schedule: &'a Schedule, troop: &str, day: Day) -> Vec<Option<&'a str>> {
    day.slots()
        .map(|s| schedule.entry_at(troop, s).map(|e| e.name()))
        .collect()
}

/// Whether a beach-slot activity starts in slot 2 on a non-exception
/// day without being a top-5 preference.
pub(crate) fn breaks_beach_slot(rules: &RuleTables, troop: &Troop, name: &str, slot: TimeSlot) -> bool {
    rules.is_beach_slot(name)
        && slot.number() == 2
        && slot.day() != rules.beach_slot_exception_day
        && !troop.is_top_n(name, 5)
}

/// Whether a day's sequence puts a wet activity next to a tower/ODS
/// activity, or runs wet → dry → wet.
pub(crate) fn breaks_wet_dry(rules: &RuleTables, names: &[Option<&str>]) -> bool {
    let wet = |n: Option<&str>| n.is_some_and(|n| rules.is_wet(n));
    let tower = |n: Option<&str>| n.is_some_and(|n| rules.is_tower_ods(n));
    let dry = |n: Option<&str>| n.is_some_and(|n| rules.is_tower_ods(n) || rules.is_accuracy(n));

    let adjacent = names.windows(2).any(|w| {
        // A multi-slot activity is never adjacent to itself.
        w[0] != w[1] && ((wet(w[0]) && tower(w[1])) || (tower(w[0]) && wet(w[1])))
    });
    let sandwich = names
        .windows(3)
        .any(|w| wet(w[0]) && dry(w[1]) && wet(w[2]));
    adjacent || sandwich
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{act, camp_catalog, camp_rules, slot, troop, troop_with_prefs};

    fn checker() -> ConstraintChecker {
        ConstraintChecker::new()
    }

    #[test]
    fn test_once_per_week() {
        let catalog = camp_catalog();
        let mut schedule = Schedule::new(camp_rules());
        let t1 = troop("T1", 10, 2);
        let gaga = act(&catalog, "Gaga Ball");
        checker()
            .place(&mut schedule, &t1, &gaga, slot(Day::Monday, 1), Strictness::Standard)
            .unwrap();
        let err = checker()
            .can_schedule(&schedule, &t1, &gaga, slot(Day::Tuesday, 1), Strictness::Relaxed)
            .unwrap_err();
        assert!(matches!(err, PlacementError::AlreadyScheduled { .. }));

        // Free time repeats.
        let free = act(&catalog, "Campsite Free Time");
        for n in 1..=3 {
            checker()
                .place(&mut schedule, &t1, &free, slot(Day::Wednesday, n), Strictness::Standard)
                .unwrap();
        }
    }

    #[test]
    fn test_beach_slot_rule() {
        let catalog = camp_catalog();
        let schedule = Schedule::new(camp_rules());
        let swim = act(&catalog, "Troop Swim");
        let plain = troop("T1", 10, 2);

        let err = checker()
            .can_schedule(&schedule, &plain, &swim, slot(Day::Monday, 2), Strictness::Standard)
            .unwrap_err();
        assert!(matches!(err, PlacementError::BeachSlot { .. }));
        // Thursday is the exception day.
        assert!(checker()
            .can_schedule(&schedule, &plain, &swim, slot(Day::Thursday, 2), Strictness::Standard)
            .is_ok());
        // Relaxed ignores it.
        assert!(checker()
            .can_schedule(&schedule, &plain, &swim, slot(Day::Monday, 2), Strictness::Relaxed)
            .is_ok());
        // Top-5 preference is exempt.
        let fan = troop_with_prefs("T2", "", &["Troop Swim"]);
        assert!(checker()
            .can_schedule(&schedule, &fan, &swim, slot(Day::Monday, 2), Strictness::Standard)
            .is_ok());
    }

    #[test]
    fn test_same_day_conflict_is_hard() {
        let catalog = camp_catalog();
        let mut schedule = Schedule::new(camp_rules());
        let t1 = troop("T1", 10, 2);
        checker()
            .place(
                &mut schedule,
                &t1,
                &act(&catalog, "Troop Canoe"),
                slot(Day::Tuesday, 1),
                Strictness::Standard,
            )
            .unwrap();
        let err = checker()
            .can_schedule(
                &schedule,
                &t1,
                &act(&catalog, "Nature Canoe"),
                slot(Day::Tuesday, 3),
                Strictness::Relaxed,
            )
            .unwrap_err();
        assert!(matches!(err, PlacementError::SameDayConflict { .. }));
    }

    #[test]
    fn test_wet_next_to_tower() {
        let catalog = camp_catalog();
        let mut schedule = Schedule::new(camp_rules());
        let t1 = troop("T1", 10, 2);
        checker()
            .place(
                &mut schedule,
                &t1,
                &act(&catalog, "Troop Swim"),
                slot(Day::Monday, 1),
                Strictness::Standard,
            )
            .unwrap();
        let tower = act(&catalog, "Climbing Tower");
        let err = checker()
            .can_schedule(&schedule, &t1, &tower, slot(Day::Monday, 2), Strictness::Standard)
            .unwrap_err();
        assert!(matches!(err, PlacementError::WetDrySequence { .. }));
        assert!(checker()
            .can_schedule(&schedule, &t1, &tower, slot(Day::Monday, 3), Strictness::Standard)
            .is_ok());
        assert!(checker()
            .can_schedule(&schedule, &t1, &tower, slot(Day::Monday, 2), Strictness::Relaxed)
            .is_ok());
    }

    #[test]
    fn test_wet_dry_wet_sandwich() {
        let rules = RuleTables::default();
        assert!(breaks_wet_dry(
            &rules,
            &[Some("Troop Swim"), Some("Archery"), Some("Troop Kayak")]
        ));
        assert!(!breaks_wet_dry(
            &rules,
            &[Some("Troop Swim"), Some("Gaga Ball"), Some("Troop Kayak")]
        ));
        // Continuation of a two-slot wet activity is not a neighbour.
        assert!(!breaks_wet_dry(
            &rules,
            &[Some("Canoe Snorkel"), Some("Canoe Snorkel"), None]
        ));
    }

    #[test]
    fn test_accuracy_limit() {
        let catalog = camp_catalog();
        let mut schedule = Schedule::new(camp_rules());
        let t1 = troop("T1", 10, 2);
        checker()
            .place(
                &mut schedule,
                &t1,
                &act(&catalog, "Troop Rifle"),
                slot(Day::Friday, 1),
                Strictness::Standard,
            )
            .unwrap();

        // Hard pair refused even relaxed.
        let err = checker()
            .can_schedule(
                &schedule,
                &t1,
                &act(&catalog, "Troop Shotgun"),
                slot(Day::Friday, 3),
                Strictness::Relaxed,
            )
            .unwrap_err();
        assert!(matches!(err, PlacementError::AccuracyLimit { .. }));

        // Archery is soft.
        let archery = act(&catalog, "Archery");
        assert!(checker()
            .can_schedule(&schedule, &t1, &archery, slot(Day::Friday, 3), Strictness::Standard)
            .is_err());
        assert!(checker()
            .can_schedule(&schedule, &t1, &archery, slot(Day::Friday, 3), Strictness::Relaxed)
            .is_ok());
        let breaches = checker().soft_breaches(&schedule, &t1, &archery, slot(Day::Friday, 3));
        assert_eq!(breaches.len(), 1);
    }

    #[test]
    fn test_commissioner_day_only_when_strict() {
        let catalog = camp_catalog();
        let schedule = Schedule::new(camp_rules());
        let t1 = Arc::new(troop_with_prefs("T1", "Commissioner A", &[]));
        let delta = act(&catalog, "Delta");

        let err = checker()
            .can_schedule(&schedule, &t1, &delta, slot(Day::Monday, 1), Strictness::Strict)
            .unwrap_err();
        assert!(matches!(
            err,
            PlacementError::CommissionerDay {
                expected: Day::Tuesday,
                ..
            }
        ));
        assert!(checker()
            .can_schedule(&schedule, &t1, &delta, slot(Day::Tuesday, 1), Strictness::Strict)
            .is_ok());
        assert!(checker()
            .can_schedule(&schedule, &t1, &delta, slot(Day::Monday, 1), Strictness::Standard)
            .is_ok());
    }

    #[test]
    fn test_boundary_and_exclusivity_come_from_schedule() {
        let catalog = camp_catalog();
        let mut schedule = Schedule::new(camp_rules());
        let err = checker()
            .can_schedule(
                &schedule,
                &troop("T1", 10, 2),
                &act(&catalog, "Itasca State Park"),
                slot(Day::Thursday, 2),
                Strictness::Relaxed,
            )
            .unwrap_err();
        assert!(matches!(err, PlacementError::CrossesDayBoundary { .. }));

        let archery = act(&catalog, "Archery");
        checker()
            .place(&mut schedule, &troop("T1", 10, 2), &archery, slot(Day::Monday, 1), Strictness::Relaxed)
            .unwrap();
        let err = checker()
            .can_schedule(&schedule, &troop("T2", 10, 2), &archery, slot(Day::Monday, 1), Strictness::Relaxed)
            .unwrap_err();
        assert!(matches!(err, PlacementError::ActivityUnavailable { .. }));
    }
}
