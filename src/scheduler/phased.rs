//! Phased constraint scheduler.
//!
//! Builds a full week for every registered troop in four phases, most
//! constrained work first:
//!
//! | Phase | Work |
//! |-------|------|
//! | 1. Foundation | communal activity, weekly exclusive, three-slot top-5 picks |
//! | 2. Core | top-5 preferences, rank by rank, with the fallback ladder |
//! | 3. Integrated | day requests, then ranks 6–20 ordered by staff load |
//! | 4. Cleanup | fill empty slots, zone consolidation, violation monitor |
//!
//! # Fallback Ladder
//!
//! Top-5 and mandatory placements that fail directly try, in order:
//! 1. **Swap**: move a safe-swap entry out of the way.
//! 2. **Force**: drop the troop's own lower-priority entries.
//! 3. **Emergency**: place with soft rules relaxed, recording what broke.
//! 4. **Displace**: move another troop's exclusive entry elsewhere.
//!
//! Anything still unplaced is reported as an [`UnmetPreference`].

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::constraints::{ConstraintChecker, Strictness};
use crate::error::PlacementError;
use crate::models::{Activity, ActivityCatalog, Exclusivity, Schedule, TimeSlot, Troop};
use crate::monitor::{MonitorConfig, MonitorReport, ViolationMonitor};
use crate::optimize::moves::is_movable;
use crate::optimize::{ClusteringConfig, ClusteringOptimizer, StaffLoad};

const TOP_TIER: usize = 5;
const PREFERENCE_DEPTH: usize = 20;

/// A preference (or day request) the scheduler could not honour.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnmetPreference {
    pub troop: String,
    pub activity: String,
    /// Zero-based preference rank, if the activity was ranked.
    pub rank: Option<usize>,
    pub reason: String,
}

/// A soft rule broken by an emergency placement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SoftViolation {
    pub troop: String,
    pub activity: String,
    pub slot: TimeSlot,
    pub reason: String,
}

/// How often each fallback rung succeeded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FallbackStats {
    pub swaps: usize,
    pub forced: usize,
    pub emergency: usize,
    pub displaced: usize,
}

/// Outcome of a scheduling run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchedulingReport {
    pub unmet_preferences: Vec<UnmetPreference>,
    pub soft_violations: Vec<SoftViolation>,
    pub fallbacks: FallbackStats,
    /// Cleanup monitor pass.
    pub monitor: Option<MonitorReport>,
}

/// Places activities for every troop registered on a schedule.
#[derive(Debug, Clone)]
pub struct ConstraintScheduler<'a> {
    catalog: &'a ActivityCatalog,
    checker: ConstraintChecker,
    clustering: ClusteringConfig,
    monitor: MonitorConfig,
}

impl<'a> ConstraintScheduler<'a> {
    pub fn new(catalog: &'a ActivityCatalog) -> Self {
        Self {
            catalog,
            checker: ConstraintChecker::new(),
            clustering: ClusteringConfig::default(),
            monitor: MonitorConfig::default(),
        }
    }

    pub fn with_clustering(mut self, config: ClusteringConfig) -> Self {
        self.clustering = config;
        self
    }

    pub fn with_monitor(mut self, config: MonitorConfig) -> Self {
        self.monitor = config;
        self
    }

    /// Runs all four phases in place.
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn run(&self, schedule: &mut Schedule) -> SchedulingReport {
        let mut report = SchedulingReport::default();
        let troops: Vec<Arc<Troop>> = schedule.troops().to_vec();

        self.foundation(schedule, &troops, &mut report);
        self.core(schedule, &troops, &mut report);
        self.integrated(schedule, &troops, &mut report);
        self.cleanup(schedule, &troops, &mut report);

        report
            .unmet_preferences
            .retain(|u| !schedule.has_activity(&u.troop, &u.activity));
        info!(
            troops = troops.len(),
            entries = schedule.len(),
            empty = schedule.empty_slot_count(),
            unmet = report.unmet_preferences.len(),
            soft = report.soft_violations.len(),
            "scheduling finished"
        );
        report
    }

    fn foundation(&self, schedule: &mut Schedule, troops: &[Arc<Troop>], report: &mut SchedulingReport) {
        let rules = Arc::clone(schedule.rules());

        if let Some(communal) = self.catalog.get(&rules.communal_activity).cloned() {
            for troop in troops {
                let mut slots: Vec<TimeSlot> = rules.communal_day.slots().collect();
                // Join the busiest communal slot, later slots breaking ties.
                slots.sort_by_key(|s| {
                    let held = schedule
                        .entries_in_slot(*s)
                        .filter(|e| e.name() == communal.name)
                        .count();
                    (std::cmp::Reverse(held), std::cmp::Reverse(s.number()))
                });
                self.place_required(schedule, troop, &communal, &slots, report);
            }
        }

        if let Some(exclusive) = self.catalog.get(&rules.weekly_exclusive).cloned() {
            for troop in troops {
                let slots = self.candidate_slots(schedule, troop, &exclusive, None);
                self.place_required(schedule, troop, &exclusive, &slots, report);
            }
        }

        for troop in troops {
            for name in troop.preferences.iter().take(TOP_TIER) {
                let Some(act) = self.catalog.get(name).cloned() else {
                    continue;
                };
                if schedule.effective_slots(&act, troop) >= 3 {
                    let slots = self.candidate_slots(schedule, troop, &act, None);
                    self.place_required(schedule, troop, &act, &slots, report);
                }
            }
        }
    }

    fn core(&self, schedule: &mut Schedule, troops: &[Arc<Troop>], report: &mut SchedulingReport) {
        let rules = Arc::clone(schedule.rules());

        for rank in 0..TOP_TIER {
            // Troops with a commissioner day for this pick go first.
            let (mut order, rest): (Vec<&Arc<Troop>>, Vec<&Arc<Troop>>) = troops.iter().partition(|t| {
                t.preferences
                    .get(rank)
                    .is_some_and(|a| rules.commissioner_day(&t.commissioner, a).is_some())
            });
            order.extend(rest);

            for troop in order {
                let Some(act) = self.ranked(schedule, troop, rank, report) else {
                    continue;
                };
                let slots = self.candidate_slots(schedule, troop, &act, None);
                self.place_required(schedule, troop, &act, &slots, report);
            }
        }
    }

    fn integrated(&self, schedule: &mut Schedule, troops: &[Arc<Troop>], report: &mut SchedulingReport) {
        let rules = Arc::clone(schedule.rules());
        let mut load = StaffLoad::from_schedule(schedule);

        for troop in troops {
            for (day, names) in &troop.day_requests {
                for name in names {
                    if schedule.has_activity(&troop.name, name) {
                        continue;
                    }
                    let Some(act) = self.catalog.get(name).cloned() else {
                        report.unmet_preferences.push(unmet(
                            troop,
                            name,
                            PlacementError::UnknownActivity(name.clone()),
                        ));
                        continue;
                    };
                    let slots: Vec<TimeSlot> = day.slots().collect();
                    match self.place_direct(schedule, troop, &act, &slots) {
                        Ok(slot) => {
                            if rules.staff_zone(name).is_some() {
                                load.add(&span_of(schedule, troop, &act, slot));
                            }
                        }
                        Err(err) => {
                            if !self.emergency(schedule, troop, &act, &slots, report) {
                                warn!(troop = %troop.name, activity = %name, %day, "day request not met");
                                report.unmet_preferences.push(unmet(troop, name, err));
                            }
                        }
                    }
                }
            }
        }

        for rank in TOP_TIER..PREFERENCE_DEPTH {
            for troop in troops {
                let Some(act) = self.ranked(schedule, troop, rank, report) else {
                    continue;
                };
                let slots = self.candidate_slots(schedule, troop, &act, Some(&load));
                match self.place_direct(schedule, troop, &act, &slots) {
                    Ok(slot) => {
                        if rules.staff_zone(&act.name).is_some() {
                            load.add(&span_of(schedule, troop, &act, slot));
                        }
                    }
                    Err(err) => {
                        debug!(troop = %troop.name, activity = %act.name, rank, %err, "preference skipped");
                    }
                }
            }
        }
    }

    fn cleanup(&self, schedule: &mut Schedule, troops: &[Arc<Troop>], report: &mut SchedulingReport) {
        for troop in troops {
            for slot in schedule.free_slots(&troop.name) {
                if !schedule.is_troop_free(slot, &troop.name) {
                    continue;
                }
                match fill_slot(schedule, self.catalog, troop, slot) {
                    Some(soft) => report.soft_violations.extend(soft),
                    None => warn!(troop = %troop.name, %slot, "slot left empty"),
                }
            }
        }

        let swaps = ClusteringOptimizer::new(self.clustering.clone()).consolidate(schedule);
        debug!(swaps, "zone consolidation");

        let monitor = ViolationMonitor::new(Arc::clone(schedule.rules())).with_config(self.monitor.clone());
        report.monitor = Some(monitor.fix_all(schedule, self.catalog));
    }

    /// The troop's preference at `rank`, if it still needs placing.
    fn ranked(
        &self,
        schedule: &Schedule,
        troop: &Troop,
        rank: usize,
        report: &mut SchedulingReport,
    ) -> Option<Arc<Activity>> {
        let name = troop.preferences.get(rank)?;
        if schedule.has_activity(&troop.name, name) {
            return None;
        }
        match self.catalog.get(name) {
            Some(act) => Some(Arc::clone(act)),
            None => {
                report.unmet_preferences.push(unmet(
                    troop,
                    name,
                    PlacementError::UnknownActivity(name.clone()),
                ));
                None
            }
        }
    }

    /// Requested day first, then the commissioner day, then the rest of
    /// the week (least staff-loaded first when `load` is given and the
    /// activity is staffed).
    fn candidate_slots(
        &self,
        schedule: &Schedule,
        troop: &Troop,
        activity: &Activity,
        load: Option<&StaffLoad>,
    ) -> Vec<TimeSlot> {
        let rules = schedule.rules();
        let mut days = Vec::new();
        if let Some(day) = troop.requested_day(&activity.name) {
            days.push(day);
        }
        if let Some(day) = rules.commissioner_day(&troop.commissioner, &activity.name) {
            if !days.contains(&day) {
                days.push(day);
            }
        }
        let mut rest: Vec<TimeSlot> = TimeSlot::all().filter(|s| !days.contains(&s.day())).collect();
        if let Some(load) = load {
            if rules.staff_zone(&activity.name).is_some() {
                load.order_by_load(&mut rest);
            }
        }
        days.iter().flat_map(|d| d.slots()).chain(rest).collect()
    }

    /// First legal slot among `slots`; Strict first when the activity
    /// has a commissioner day.
    fn place_direct(
        &self,
        schedule: &mut Schedule,
        troop: &Arc<Troop>,
        activity: &Arc<Activity>,
        slots: &[TimeSlot],
    ) -> Result<TimeSlot, PlacementError> {
        let levels: &[Strictness] = if schedule
            .rules()
            .commissioner_day(&troop.commissioner, &activity.name)
            .is_some()
        {
            &[Strictness::Strict, Strictness::Standard]
        } else {
            &[Strictness::Standard]
        };

        let mut last = None;
        for &level in levels {
            for &slot in slots {
                match self.checker.place(schedule, troop, activity, slot, level) {
                    Ok(_) => return Ok(slot),
                    Err(err) => last = Some(err),
                }
            }
        }
        Err(last.unwrap_or_else(|| PlacementError::NoCandidateSlot {
            troop: troop.name.clone(),
            activity: activity.name.clone(),
        }))
    }

    /// Direct placement, then the fallback ladder.
    fn place_required(
        &self,
        schedule: &mut Schedule,
        troop: &Arc<Troop>,
        activity: &Arc<Activity>,
        slots: &[TimeSlot],
        report: &mut SchedulingReport,
    ) -> bool {
        if schedule.has_activity(&troop.name, &activity.name) {
            return true;
        }
        let err = match self.place_direct(schedule, troop, activity, slots) {
            Ok(_) => return true,
            Err(err) => err,
        };

        if self.swap(schedule, troop, activity, slots) {
            report.fallbacks.swaps += 1;
            return true;
        }
        if self.force(schedule, troop, activity, slots) {
            report.fallbacks.forced += 1;
            return true;
        }
        if self.emergency(schedule, troop, activity, slots, report) {
            report.fallbacks.emergency += 1;
            return true;
        }
        if self.displace(schedule, troop, activity, slots) {
            report.fallbacks.displaced += 1;
            return true;
        }

        warn!(troop = %troop.name, activity = %activity.name, %err, "could not place required activity");
        report
            .unmet_preferences
            .push(unmet(troop, &activity.name, err));
        false
    }

    /// Moves a safe-swap entry out of a candidate slot.
    fn swap(&self, schedule: &mut Schedule, troop: &Arc<Troop>, activity: &Arc<Activity>, slots: &[TimeSlot]) -> bool {
        for &slot in slots {
            let blockers: Vec<(Arc<Troop>, Arc<Activity>, TimeSlot)> = schedule
                .entries_in_slot(slot)
                .filter(|e| is_movable(schedule, e) && schedule.rules().is_safe_swap(e.name()))
                .map(|e| (Arc::clone(e.troop()), Arc::clone(e.activity()), e.start()))
                .collect();

            for (other, held, start) in blockers {
                schedule.remove_at(&other.name, start);
                if self
                    .checker
                    .can_schedule(schedule, troop, activity, slot, Strictness::Standard)
                    .is_ok()
                {
                    if let Some(to) = self.relocate(schedule, &other, &held, start, &[Strictness::Standard]) {
                        if self
                            .checker
                            .place(schedule, troop, activity, slot, Strictness::Standard)
                            .is_ok()
                        {
                            debug!(troop = %troop.name, activity = %activity.name, moved = %held.name, %to, "swap");
                            return true;
                        }
                        schedule.remove_at(&other.name, to);
                    }
                }
                schedule.restore(start, &held, &other);
            }
        }
        false
    }

    /// Drops the troop's own lower-priority entries to make room.
    fn force(&self, schedule: &mut Schedule, troop: &Arc<Troop>, activity: &Arc<Activity>, slots: &[TimeSlot]) -> bool {
        let rules = Arc::clone(schedule.rules());
        let rank = troop.rank_of(&activity.name);
        let len = schedule.effective_slots(activity, troop);

        for &slot in slots {
            let Some(span) = slot.span(len) else {
                continue;
            };
            let mut owned: Vec<(TimeSlot, Arc<Activity>)> = Vec::new();
            let mut allowed = true;
            for &s in &span {
                let Some(e) = schedule.entry_at(&troop.name, s) else {
                    continue;
                };
                if owned.iter().any(|(start, _)| *start == e.start()) {
                    continue;
                }
                let lower = match (rank, troop.rank_of(e.name())) {
                    (_, None) => true,
                    (Some(ours), Some(theirs)) => theirs > ours,
                    (None, Some(_)) => false,
                };
                if rules.is_mandatory(e.name()) || !lower {
                    allowed = false;
                    break;
                }
                owned.push((e.start(), Arc::clone(e.activity())));
            }
            if !allowed || owned.is_empty() {
                continue;
            }

            for (start, _) in &owned {
                schedule.remove_at(&troop.name, *start);
            }
            if self
                .checker
                .place(schedule, troop, activity, slot, Strictness::Standard)
                .is_ok()
            {
                debug!(troop = %troop.name, activity = %activity.name, dropped = owned.len(), "forced");
                return true;
            }
            for (start, held) in &owned {
                schedule.restore(*start, held, troop);
            }
        }
        false
    }

    /// Places with soft rules relaxed, recording each one broken.
    fn emergency(
        &self,
        schedule: &mut Schedule,
        troop: &Arc<Troop>,
        activity: &Arc<Activity>,
        slots: &[TimeSlot],
        report: &mut SchedulingReport,
    ) -> bool {
        for &slot in slots {
            if self
                .checker
                .can_schedule(schedule, troop, activity, slot, Strictness::Relaxed)
                .is_err()
            {
                continue;
            }
            let breaches = self.checker.soft_breaches(schedule, troop, activity, slot);
            if self
                .checker
                .place(schedule, troop, activity, slot, Strictness::Relaxed)
                .is_err()
            {
                continue;
            }
            for breach in breaches {
                warn!(troop = %troop.name, activity = %activity.name, %slot, %breach, "emergency placement");
                report.soft_violations.push(SoftViolation {
                    troop: troop.name.clone(),
                    activity: activity.name.clone(),
                    slot,
                    reason: breach.to_string(),
                });
            }
            return true;
        }
        false
    }

    /// Moves another troop's exclusive entry to another slot.
    fn displace(&self, schedule: &mut Schedule, troop: &Arc<Troop>, activity: &Arc<Activity>, slots: &[TimeSlot]) -> bool {
        let rules = Arc::clone(schedule.rules());
        let len = schedule.effective_slots(activity, troop);

        for &slot in slots {
            let Some(span) = slot.span(len) else {
                continue;
            };
            if span.iter().any(|s| !schedule.is_troop_free(*s, &troop.name)) {
                continue;
            }
            let mut blockers: Vec<(Arc<Troop>, Arc<Activity>, TimeSlot)> = Vec::new();
            for &s in &span {
                for e in schedule.entries_in_slot(s) {
                    let exclusive = !matches!(rules.exclusivity(e.name()), Exclusivity::Shared)
                        || rules.is_staffed_beach(e.name());
                    let known = blockers
                        .iter()
                        .any(|(t, _, start)| t.name == e.troop().name && *start == e.start());
                    if exclusive && !known && !rules.is_mandatory(e.name()) {
                        blockers.push((Arc::clone(e.troop()), Arc::clone(e.activity()), e.start()));
                    }
                }
            }

            for (other, held, start) in blockers {
                schedule.remove_at(&other.name, start);
                if self
                    .checker
                    .place(schedule, troop, activity, slot, Strictness::Standard)
                    .is_ok()
                {
                    let levels = [Strictness::Standard, Strictness::Relaxed];
                    if let Some(to) = self.relocate(schedule, &other, &held, start, &levels) {
                        debug!(
                            troop = %troop.name,
                            activity = %activity.name,
                            displaced = %other.name,
                            %to,
                            "displaced"
                        );
                        return true;
                    }
                    schedule.remove_at(&troop.name, slot);
                }
                schedule.restore(start, &held, &other);
            }
        }
        false
    }

    /// Places `activity` for `troop` anywhere but `avoid`.
    fn relocate(
        &self,
        schedule: &mut Schedule,
        troop: &Arc<Troop>,
        activity: &Arc<Activity>,
        avoid: TimeSlot,
        levels: &[Strictness],
    ) -> Option<TimeSlot> {
        for &level in levels {
            for to in TimeSlot::all().filter(|&s| s != avoid) {
                if self.checker.place(schedule, troop, activity, to, level).is_ok() {
                    return Some(to);
                }
            }
        }
        None
    }
}

fn unmet(troop: &Troop, activity: &str, err: PlacementError) -> UnmetPreference {
    UnmetPreference {
        troop: troop.name.clone(),
        activity: activity.to_string(),
        rank: troop.rank_of(activity),
        reason: err.to_string(),
    }
}

fn span_of(schedule: &Schedule, troop: &Troop, activity: &Activity, slot: TimeSlot) -> Vec<TimeSlot> {
    slot.span(schedule.effective_slots(activity, troop))
        .unwrap_or_default()
}

/// Fills one empty slot for a troop.
///
/// Tries, in order: the troop's remaining preferences then the filler
/// list under Standard rules, the same under Relaxed rules, the
/// repeatable filler, and finally any catalog activity. The communal
/// activity is never used as filler. Returns the soft rules broken, or
/// `None` if nothing fits.
pub(crate) fn fill_slot(
    schedule: &mut Schedule,
    catalog: &ActivityCatalog,
    troop: &Arc<Troop>,
    slot: TimeSlot,
) -> Option<Vec<SoftViolation>> {
    let checker = ConstraintChecker::new();
    let rules = Arc::clone(schedule.rules());
    let communal = rules.communal_activity.as_str();
    let ranked: Vec<&str> = troop
        .preferences
        .iter()
        .chain(&rules.filler_activities)
        .map(String::as_str)
        .filter(|n| *n != communal)
        .collect();

    for level in [Strictness::Standard, Strictness::Relaxed] {
        for name in &ranked {
            if let Some(soft) = try_fill(&checker, schedule, catalog, troop, name, slot, level) {
                return Some(soft);
            }
        }
    }
    if let Some(soft) = try_fill(
        &checker,
        schedule,
        catalog,
        troop,
        &rules.repeatable_filler,
        slot,
        Strictness::Relaxed,
    ) {
        return Some(soft);
    }
    for act in catalog.iter().filter(|a| a.name != communal) {
        if let Some(soft) = try_fill(&checker, schedule, catalog, troop, &act.name, slot, Strictness::Relaxed) {
            return Some(soft);
        }
    }
    None
}

fn try_fill(
    checker: &ConstraintChecker,
    schedule: &mut Schedule,
    catalog: &ActivityCatalog,
    troop: &Arc<Troop>,
    name: &str,
    slot: TimeSlot,
    level: Strictness,
) -> Option<Vec<SoftViolation>> {
    let act = catalog.get(name)?;
    checker.can_schedule(schedule, troop, act, slot, level).ok()?;
    let breaches = match level {
        Strictness::Relaxed => checker.soft_breaches(schedule, troop, act, slot),
        _ => Vec::new(),
    };
    checker.place(schedule, troop, act, slot, level).ok()?;
    Some(
        breaches
            .into_iter()
            .map(|b| SoftViolation {
                troop: troop.name.clone(),
                activity: name.to_string(),
                slot,
                reason: b.to_string(),
            })
            .collect(),
    )
}
