//! Violation monitor and fixer.
//!
//! [`ViolationMonitor::check`] is a stateless battery of checks over a
//! finished (or in-progress) schedule. [`ViolationMonitor::fix_all`]
//! repeatedly checks and remediates auto-fixable violations until a
//! pass makes no progress or the pass budget runs out.
//!
//! # Checks
//!
//! | Kind | Severity | Fix |
//! |------|----------|-----|
//! | EmptySlot | Critical | fill the slot |
//! | ExclusiveArea | Critical (High for staffed-beach cap) | drop the later holder, refill |
//! | MissingMandatory | High | replace a non-mandatory entry |
//! | ActivityConflict | High | drop the duplicate / conflicting entry, refill |
//! | SameDayConflict | High | exchange within the troop |
//! | AccuracyLimit | High (hard pair) / Medium | exchange within the troop |
//! | BeachSlot | Medium | exchange within the troop |
//! | WetDry | Medium | exchange within the troop |
//! | StaffOverload | Low | none (staff balancer's job) |

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::models::{
    ActivityCatalog, Day, Exclusivity, RuleTables, Schedule, ScheduleEntry, TimeSlot, Troop,
};
use crate::optimize::moves::{is_movable, Move};
use crate::scheduler::{breaks_beach_slot, breaks_wet_dry, day_names, fill_slot, Strictness};

/// How bad a violation is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// Penalty weight used to compare repair attempts.
    pub const fn weight(self) -> u32 {
        match self {
            Severity::Low => 1,
            Severity::Medium => 3,
            Severity::High => 10,
            Severity::Critical => 50,
        }
    }
}

/// What rule a violation breaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ViolationKind {
    BeachSlot,
    WetDry,
    MissingMandatory,
    ExclusiveArea,
    ActivityConflict,
    StaffOverload,
    EmptySlot,
    AccuracyLimit,
    SameDayConflict,
}

/// A detected rule breach.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Violation {
    pub kind: ViolationKind,
    pub severity: Severity,
    /// Troop to act on, if the breach belongs to one.
    pub troop: Option<String>,
    pub activity: Option<String>,
    pub slot: Option<TimeSlot>,
    pub message: String,
    pub auto_fixable: bool,
}

impl Violation {
    fn new(kind: ViolationKind, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            kind,
            severity,
            troop: None,
            activity: None,
            slot: None,
            message: message.into(),
            auto_fixable: true,
        }
    }

    fn troop(mut self, troop: &str) -> Self {
        self.troop = Some(troop.to_string());
        self
    }

    fn activity(mut self, activity: &str) -> Self {
        self.activity = Some(activity.to_string());
        self
    }

    fn at(mut self, slot: TimeSlot) -> Self {
        self.slot = Some(slot);
        self
    }

    fn manual(mut self) -> Self {
        self.auto_fixable = false;
        self
    }
}

fn holders<'a>(entries: &[&'a ScheduleEntry], pred: impl Fn(&ScheduleEntry) -> bool) -> Vec<&'a ScheduleEntry> {
    entries.iter().copied().filter(|x| pred(x)).collect()
}

/// Total penalty weight of `violations`.
pub fn penalty(violations: &[Violation]) -> u32 {
    violations.iter().map(|v| v.severity.weight()).sum()
}

/// Monitor settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Maximum check-and-fix passes.
    pub max_passes: usize,
    /// Staffed entries per slot above which a slot is overloaded.
    pub staff_overload_threshold: usize,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            max_passes: 5,
            staff_overload_threshold: 15,
        }
    }
}

impl MonitorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_passes(mut self, passes: usize) -> Self {
        self.max_passes = passes;
        self
    }

    pub fn with_staff_overload_threshold(mut self, threshold: usize) -> Self {
        self.staff_overload_threshold = threshold;
        self
    }
}

/// Outcome of [`ViolationMonitor::fix_all`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitorReport {
    /// Violations found before fixing.
    pub initial_violations: usize,
    /// Successful fixes.
    pub fixed: usize,
    /// Passes run.
    pub passes: usize,
    /// What is left.
    pub remaining: Vec<Violation>,
}

impl MonitorReport {
    /// Remaining violations per kind.
    pub fn counts_by_kind(&self) -> BTreeMap<ViolationKind, usize> {
        let mut counts = BTreeMap::new();
        for v in &self.remaining {
            *counts.entry(v.kind).or_insert(0) += 1;
        }
        counts
    }

    /// Whether nothing above `Low` remains.
    pub fn is_clean(&self) -> bool {
        self.remaining.iter().all(|v| v.severity == Severity::Low)
    }
}

/// Checks schedules against a set of rules and repairs what it can.
#[derive(Debug, Clone)]
pub struct ViolationMonitor {
    rules: Arc<RuleTables>,
    config: MonitorConfig,
}

impl ViolationMonitor {
    pub fn new(rules: Arc<RuleTables>) -> Self {
        Self {
            rules,
            config: MonitorConfig::default(),
        }
    }

    pub fn with_config(mut self, config: MonitorConfig) -> Self {
        self.config = config;
        self
    }

    /// Runs every check.
    pub fn check(&self, schedule: &Schedule) -> Vec<Violation> {
        let mut out = Vec::new();
        for troop in schedule.troops() {
            self.check_troop(schedule, troop, &mut out);
        }
        for slot in TimeSlot::all() {
            self.check_slot(schedule, slot, &mut out);
        }
        out
    }

    fn check_troop(&self, schedule: &Schedule, troop: &Troop, out: &mut Vec<Violation>) {
        let rules = &*self.rules;
        let name = troop.name.as_str();

        for slot in schedule.free_slots(name) {
            out.push(
                Violation::new(
                    ViolationKind::EmptySlot,
                    Severity::Critical,
                    format!("{name} has nothing at {slot}"),
                )
                .troop(name)
                .at(slot),
            );
        }

        let starts = schedule.starts_for_troop(name);
        for (_, e) in &starts {
            if breaks_beach_slot(rules, troop, e.name(), e.slot()) {
                out.push(
                    Violation::new(
                        ViolationKind::BeachSlot,
                        Severity::Medium,
                        format!("{name}: {} starts in slot 2 on {}", e.name(), e.slot().day()),
                    )
                    .troop(name)
                    .activity(e.name())
                    .at(e.slot()),
                );
            }
        }

        let mut seen = BTreeSet::new();
        for (_, e) in &starts {
            if !seen.insert(e.name()) && e.name() != rules.repeatable_filler {
                out.push(
                    Violation::new(
                        ViolationKind::ActivityConflict,
                        Severity::High,
                        format!("{name} has {} more than once", e.name()),
                    )
                    .troop(name)
                    .activity(e.name())
                    .at(e.slot()),
                );
            }
        }

        for mandatory in &rules.mandatory_activities {
            if !schedule.has_activity(name, mandatory) {
                out.push(
                    Violation::new(
                        ViolationKind::MissingMandatory,
                        Severity::High,
                        format!("{name} is missing {mandatory}"),
                    )
                    .troop(name)
                    .activity(mandatory),
                );
            }
        }
        let communal = rules.communal_activity.as_str();
        if let Some((_, e)) = starts
            .iter()
            .find(|(_, e)| e.name() == communal && e.slot().day() != rules.communal_day)
        {
            out.push(
                Violation::new(
                    ViolationKind::MissingMandatory,
                    Severity::High,
                    format!("{name} has {communal} off {}", rules.communal_day),
                )
                .troop(name)
                .activity(communal)
                .at(e.slot()),
            );
        }

        for day in Day::ALL {
            self.check_day(schedule, troop, day, out);
        }
    }

    fn check_day(&self, schedule: &Schedule, troop: &Troop, day: Day, out: &mut Vec<Violation>) {
        let rules = &*self.rules;
        let name = troop.name.as_str();
        let names = day_names(schedule, name, day);
        let first = day.slots().next();

        if breaks_wet_dry(rules, &names) {
            let mut v = Violation::new(
                ViolationKind::WetDry,
                Severity::Medium,
                format!("{name}: wet/dry sequencing broken on {day}"),
            )
            .troop(name);
            v.slot = first;
            out.push(v);
        }

        // Distinct activities of the day, in slot order.
        let mut acts: Vec<(&str, TimeSlot)> = Vec::new();
        for (n, slot) in names.iter().zip(day.slots()) {
            if let Some(n) = *n {
                if !acts.iter().any(|(a, _)| *a == n) {
                    acts.push((n, slot));
                }
            }
        }

        let accuracy: Vec<&(&str, TimeSlot)> =
            acts.iter().filter(|(a, _)| rules.is_accuracy(a)).collect();
        if accuracy.len() > 1 {
            let hard = accuracy.iter().enumerate().any(|(i, (a, _))| {
                accuracy[i + 1..]
                    .iter()
                    .any(|(b, _)| rules.is_hard_accuracy_pair(a, b))
            });
            let (act, slot) = accuracy[accuracy.len() - 1];
            out.push(
                Violation::new(
                    ViolationKind::AccuracyLimit,
                    if hard { Severity::High } else { Severity::Medium },
                    format!("{name}: {} accuracy activities on {day}", accuracy.len()),
                )
                .troop(name)
                .activity(act)
                .at(*slot),
            );
        }

        for (i, (a, _)) in acts.iter().enumerate() {
            for (b, slot) in &acts[i + 1..] {
                if rules.same_day_conflict(a, b) {
                    out.push(
                        Violation::new(
                            ViolationKind::SameDayConflict,
                            Severity::High,
                            format!("{name}: {a} and {b} on the same day ({day})"),
                        )
                        .troop(name)
                        .activity(b)
                        .at(*slot),
                    );
                }
            }
        }
    }

    fn check_slot(&self, schedule: &Schedule, slot: TimeSlot, out: &mut Vec<Violation>) {
        let rules = &*self.rules;
        let entries: Vec<&ScheduleEntry> = schedule.entries_in_slot(slot).collect();
        let mut reported: BTreeSet<String> = BTreeSet::new();

        for e in &entries {
            let (key, breach, offender) = match rules.exclusivity(e.name()) {
                Exclusivity::Shared => continue,
                Exclusivity::Solo => {
                    let h = holders(&entries, |x| x.name() == e.name());
                    let troops: BTreeSet<&str> = h.iter().map(|x| x.troop().name.as_str()).collect();
                    (e.name().to_string(), troops.len() > 1, h.last().copied())
                }
                Exclusivity::Exclusive { area, members } => {
                    let h = holders(&entries, |x| members.iter().any(|m| m == x.name()));
                    let troops: BTreeSet<&str> = h.iter().map(|x| x.troop().name.as_str()).collect();
                    (format!("area:{area}"), troops.len() > 1, h.last().copied())
                }
                Exclusivity::PairedSmallGroup {
                    max_troops,
                    max_size,
                } => {
                    let h = holders(&entries, |x| x.name() == e.name());
                    let too_big = h.len() > 1 && h.iter().any(|x| x.troop().size() > max_size);
                    (e.name().to_string(), h.len() > max_troops || too_big, h.last().copied())
                }
                Exclusivity::HeadToHead { max_troops } => {
                    let h = holders(&entries, |x| x.name() == e.name());
                    (e.name().to_string(), h.len() > max_troops, h.last().copied())
                }
                Exclusivity::StaggeredStart => {
                    let h = holders(&entries, |x| x.name() == e.name());
                    let clash = h
                        .iter()
                        .enumerate()
                        .any(|(i, x)| h[i + 1..].iter().any(|y| y.start() == x.start()));
                    (e.name().to_string(), clash, h.last().copied())
                }
                Exclusivity::CapacityPooled {
                    pool,
                    members,
                    capacity,
                } => {
                    let h = holders(&entries, |x| members.iter().any(|m| m == x.name()));
                    let people: u32 = h.iter().map(|x| x.troop().size()).sum();
                    (format!("pool:{pool}"), people > capacity, h.last().copied())
                }
            };
            if breach && reported.insert(key.clone()) {
                let mut v = Violation::new(
                    ViolationKind::ExclusiveArea,
                    Severity::Critical,
                    format!("{key} over its limit at {slot}"),
                )
                .at(slot);
                if let Some(o) = offender {
                    v = v.troop(&o.troop().name).activity(o.name());
                }
                out.push(v);
            }
        }

        let beach: Vec<&&ScheduleEntry> = entries
            .iter()
            .filter(|e| rules.is_staffed_beach(e.name()))
            .collect();
        if beach.len() > rules.max_staffed_beach_per_slot {
            let mut v = Violation::new(
                ViolationKind::ExclusiveArea,
                Severity::High,
                format!(
                    "{} staffed beach activities at {slot} (cap {})",
                    beach.len(),
                    rules.max_staffed_beach_per_slot
                ),
            )
            .at(slot);
            if let Some(o) = beach.last() {
                v = v.troop(&o.troop().name).activity(o.name());
            }
            out.push(v);
        }

        for (i, a) in entries.iter().enumerate() {
            for b in &entries[i + 1..] {
                if a.troop().name != b.troop().name
                    && (a.activity().conflicts(b.name()) || b.activity().conflicts(a.name()))
                {
                    out.push(
                        Violation::new(
                            ViolationKind::ActivityConflict,
                            Severity::High,
                            format!("{} and {} share {slot}", a.name(), b.name()),
                        )
                        .troop(&b.troop().name)
                        .activity(b.name())
                        .at(slot),
                    );
                }
            }
        }

        let staffed = entries
            .iter()
            .filter(|e| rules.staff_zone(e.name()).is_some())
            .count();
        if staffed > self.config.staff_overload_threshold {
            out.push(
                Violation::new(
                    ViolationKind::StaffOverload,
                    Severity::Low,
                    format!("{staffed} staffed activities at {slot}"),
                )
                .at(slot)
                .manual(),
            );
        }
    }

    /// Checks and repairs until no progress, returning what remains.
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn fix_all(&self, schedule: &mut Schedule, catalog: &ActivityCatalog) -> MonitorReport {
        let initial_violations = self.check(schedule).len();
        let mut fixed = 0;
        let mut passes = 0;

        while passes < self.config.max_passes {
            let fixable: Vec<Violation> = self
                .check(schedule)
                .into_iter()
                .filter(|v| v.auto_fixable)
                .collect();
            if fixable.is_empty() {
                break;
            }
            passes += 1;
            let mut progress = false;
            for v in &fixable {
                if self.fix(schedule, catalog, v) {
                    debug!(kind = ?v.kind, message = %v.message, "fixed violation");
                    fixed += 1;
                    progress = true;
                }
            }
            if !progress {
                break;
            }
        }

        let remaining = self.check(schedule);
        info!(
            initial_violations,
            fixed,
            passes,
            remaining = remaining.len(),
            "violation monitor finished"
        );
        MonitorReport {
            initial_violations,
            fixed,
            passes,
            remaining,
        }
    }

    fn fix(&self, schedule: &mut Schedule, catalog: &ActivityCatalog, v: &Violation) -> bool {
        let Some(troop) = v.troop.as_deref().and_then(|t| schedule.troop(t)).cloned() else {
            return false;
        };
        match v.kind {
            ViolationKind::EmptySlot => match v.slot {
                Some(slot) if schedule.is_troop_free(slot, &troop.name) => {
                    fill_slot(schedule, catalog, &troop, slot).is_some()
                }
                _ => false,
            },
            ViolationKind::MissingMandatory => v
                .activity
                .as_deref()
                .is_some_and(|a| self.place_mandatory(schedule, catalog, &troop, a, v.slot)),
            ViolationKind::ExclusiveArea | ViolationKind::ActivityConflict => {
                self.evict_and_refill(schedule, catalog, &troop, v)
            }
            ViolationKind::BeachSlot
            | ViolationKind::WetDry
            | ViolationKind::AccuracyLimit
            | ViolationKind::SameDayConflict => self.repair_by_exchange(schedule, catalog, &troop, v),
            ViolationKind::StaffOverload => false,
        }
    }

    /// Puts a missing (or misplaced) mandatory activity in.
    fn place_mandatory(
        &self,
        schedule: &mut Schedule,
        catalog: &ActivityCatalog,
        troop: &Arc<Troop>,
        activity: &str,
        misplaced_at: Option<TimeSlot>,
    ) -> bool {
        if misplaced_at.is_none() && schedule.has_activity(&troop.name, activity) {
            return false;
        }
        let Some(act) = catalog.get(activity).cloned() else {
            return false;
        };
        let rules = schedule.rules().clone();
        let days: Vec<Day> = if activity == rules.communal_activity {
            vec![rules.communal_day]
        } else {
            let mut days = Vec::new();
            if let Some(d) = rules.commissioner_day(&troop.commissioner, activity) {
                days.push(d);
            }
            let rest: Vec<Day> = Day::ALL.into_iter().filter(|d| !days.contains(d)).collect();
            days.extend(rest);
            days
        };

        let misplaced = misplaced_at.and_then(|s| schedule.remove_at(&troop.name, s));
        if misplaced_at.is_some() && misplaced.is_none() {
            return false;
        }

        for strictness in [Strictness::Standard, Strictness::Relaxed] {
            for day in &days {
                for slot in day.slots() {
                    if schedule
                        .entry_at(&troop.name, slot)
                        .is_some_and(|e| rules.is_mandatory(e.name()))
                    {
                        continue;
                    }
                    let mv = Move::Replace {
                        troop: troop.name.clone(),
                        slot,
                        add: Arc::clone(&act),
                    };
                    if let Ok(applied) = mv.apply(schedule, strictness) {
                        // Keep it; the freed slots are refilled on a later pass.
                        drop(applied);
                        return true;
                    }
                }
            }
        }

        if let Some(placement) = misplaced {
            schedule.restore(placement.slot, &act, troop);
        }
        false
    }

    /// Drops the offending span and refills the freed slots.
    fn evict_and_refill(
        &self,
        schedule: &mut Schedule,
        catalog: &ActivityCatalog,
        troop: &Arc<Troop>,
        v: &Violation,
    ) -> bool {
        let Some(slot) = v.slot else {
            return false;
        };
        let Some(entry) = schedule.entry_at(&troop.name, slot) else {
            return false;
        };
        if Some(entry.name()) != v.activity.as_deref() || self.rules.is_mandatory(entry.name()) {
            return false;
        }
        let start = entry.start();
        let len = schedule.effective_slots(entry.activity(), troop);
        schedule.remove_at(&troop.name, slot);
        for s in start.span(len).unwrap_or_default() {
            if !schedule.is_troop_free(s, &troop.name) {
                continue;
            }
            match fill_slot(schedule, catalog, troop, s) {
                Some(soft) if !soft.is_empty() => {
                    debug!(troop = %troop.name, slot = %s, broken = soft.len(), "refilled with soft breaches");
                }
                Some(_) => {}
                None => warn!(troop = %troop.name, slot = %s, "slot left empty after eviction"),
            }
        }
        true
    }

    /// Tries exchanges (then filler replacement) that lower the total
    /// penalty.
    fn repair_by_exchange(
        &self,
        schedule: &mut Schedule,
        catalog: &ActivityCatalog,
        troop: &Arc<Troop>,
        v: &Violation,
    ) -> bool {
        let Some(slot) = v.slot else {
            return false;
        };
        let before = penalty(&self.check(schedule));
        let targets: Vec<TimeSlot> = match v.kind {
            ViolationKind::BeachSlot => vec![slot],
            _ => slot.day().slots().collect(),
        };
        let starts: Vec<TimeSlot> = schedule
            .starts_for_troop(&troop.name)
            .into_iter()
            .filter(|(_, e)| is_movable(schedule, e))
            .map(|(_, e)| e.slot())
            .collect();

        let mut candidates = Vec::new();
        for &a in targets.iter().filter(|s| starts.contains(s)) {
            for &b in starts.iter().filter(|b| b.day() != a.day()) {
                candidates.push(Move::Exchange {
                    troop: troop.name.clone(),
                    a,
                    b,
                });
            }
        }
        for &a in targets.iter().filter(|s| starts.contains(s)) {
            let keep = schedule
                .entry_at(&troop.name, a)
                .is_some_and(|e| troop.is_top_n(e.name(), 10));
            if keep {
                continue;
            }
            for filler in &self.rules.filler_activities {
                if let Some(act) = catalog.get(filler) {
                    candidates.push(Move::Replace {
                        troop: troop.name.clone(),
                        slot: a,
                        add: Arc::clone(act),
                    });
                }
            }
        }

        for mv in candidates {
            let Ok(applied) = mv.apply(schedule, Strictness::Standard) else {
                continue;
            };
            if penalty(&self.check(schedule)) < before {
                return true;
            }
            applied.revert(schedule);
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{act, camp_catalog, camp_rules, slot, troop};

    fn full_week(schedule: &mut Schedule, catalog: &ActivityCatalog, name: &str) -> Arc<Troop> {
        let t = troop(name, 10, 2);
        schedule.add_troop(Arc::clone(&t));
        let free = act(catalog, "Campsite Free Time");
        for s in TimeSlot::all() {
            if schedule.is_troop_free(s, name) {
                schedule.add_entry(s, &free, &t).unwrap();
            }
        }
        t
    }

    #[test]
    fn test_empty_and_missing_mandatory_detected() {
        let mut schedule = Schedule::new(camp_rules());
        schedule.add_troop(troop("T1", 10, 2));
        let monitor = ViolationMonitor::new(camp_rules());
        let found = monitor.check(&schedule);
        assert_eq!(
            found
                .iter()
                .filter(|v| v.kind == ViolationKind::EmptySlot)
                .count(),
            14
        );
        assert_eq!(
            found
                .iter()
                .filter(|v| v.kind == ViolationKind::MissingMandatory)
                .count(),
            2
        );
    }

    #[test]
    fn test_double_booking_detected_under_camp_rules() {
        let catalog = camp_catalog();
        let mut schedule = Schedule::new(Arc::new(RuleTables::permissive()));
        let s = slot(Day::Monday, 1);
        let archery = act(&catalog, "Archery");
        schedule.add_entry(s, &archery, &troop("T1", 10, 2)).unwrap();
        schedule.add_entry(s, &archery, &troop("T2", 10, 2)).unwrap();

        let found = ViolationMonitor::new(camp_rules()).check(&schedule);
        let excl: Vec<_> = found
            .iter()
            .filter(|v| v.kind == ViolationKind::ExclusiveArea)
            .collect();
        assert_eq!(excl.len(), 1);
        assert_eq!(excl[0].severity, Severity::Critical);
        assert_eq!(excl[0].troop.as_deref(), Some("T2"));
    }

    #[test]
    fn test_shared_unlisted_activity_detected() {
        let catalog = camp_catalog();
        let mut schedule = Schedule::new(Arc::new(RuleTables::permissive()));
        let s = slot(Day::Monday, 1);
        let gaga = act(&catalog, "Gaga Ball");
        schedule.add_entry(s, &gaga, &troop("T1", 10, 2)).unwrap();
        schedule.add_entry(s, &gaga, &troop("T2", 10, 2)).unwrap();
        schedule
            .add_entry(s, &act(&catalog, "Campsite Free Time"), &troop("T3", 10, 2))
            .unwrap();
        schedule
            .add_entry(s, &act(&catalog, "Campsite Free Time"), &troop("T4", 10, 2))
            .unwrap();

        let found = ViolationMonitor::new(camp_rules()).check(&schedule);
        let excl: Vec<_> = found
            .iter()
            .filter(|v| v.kind == ViolationKind::ExclusiveArea)
            .collect();
        assert_eq!(excl.len(), 1);
        assert_eq!(excl[0].activity.as_deref(), Some("Gaga Ball"));
        assert_eq!(excl[0].troop.as_deref(), Some("T2"));
    }

    #[test]
    fn test_single_oversized_troop_breaks_pool() {
        let catalog = camp_catalog();
        let mut schedule = Schedule::new(Arc::new(RuleTables::permissive()));
        schedule
            .add_entry(slot(Day::Tuesday, 1), &act(&catalog, "Troop Canoe"), &troop("Big", 24, 4))
            .unwrap();
        schedule
            .add_entry(slot(Day::Tuesday, 2), &act(&catalog, "Troop Canoe"), &troop("Fits", 22, 4))
            .unwrap();

        let found = ViolationMonitor::new(camp_rules()).check(&schedule);
        let excl: Vec<_> = found
            .iter()
            .filter(|v| v.kind == ViolationKind::ExclusiveArea)
            .collect();
        assert_eq!(excl.len(), 1);
        assert_eq!(excl[0].troop.as_deref(), Some("Big"));
        assert_eq!(excl[0].slot, Some(slot(Day::Tuesday, 1)));
    }

    #[test]
    fn test_sequence_checks() {
        let catalog = camp_catalog();
        let mut schedule = Schedule::new(Arc::new(RuleTables::permissive()));
        let t1 = troop("T1", 10, 2);
        for (n, name) in [(1, "Troop Swim"), (2, "Troop Rifle"), (3, "Troop Kayak")] {
            schedule.add_entry(slot(Day::Tuesday, n), &act(&catalog, name), &t1).unwrap();
        }
        schedule
            .add_entry(slot(Day::Wednesday, 1), &act(&catalog, "Troop Shotgun"), &t1)
            .unwrap();
        schedule
            .add_entry(slot(Day::Wednesday, 2), &act(&catalog, "Archery"), &t1)
            .unwrap();
        schedule
            .add_entry(slot(Day::Thursday, 1), &act(&catalog, "Troop Canoe"), &t1)
            .unwrap();
        schedule
            .add_entry(slot(Day::Thursday, 2), &act(&catalog, "Nature Canoe"), &t1)
            .unwrap();
        schedule
            .add_entry(slot(Day::Friday, 2), &act(&catalog, "Water Polo"), &t1)
            .unwrap();

        let found = ViolationMonitor::new(camp_rules()).check(&schedule);
        let kinds: BTreeSet<ViolationKind> = found.iter().map(|v| v.kind).collect();
        assert!(kinds.contains(&ViolationKind::WetDry));
        assert!(kinds.contains(&ViolationKind::AccuracyLimit));
        assert!(kinds.contains(&ViolationKind::SameDayConflict));
        assert!(kinds.contains(&ViolationKind::BeachSlot));
        let accuracy = found
            .iter()
            .find(|v| v.kind == ViolationKind::AccuracyLimit)
            .unwrap();
        assert_eq!(accuracy.severity, Severity::Medium);
    }

    #[test]
    fn test_fix_all_fills_and_places_mandatory() {
        let catalog = camp_catalog();
        let mut schedule = Schedule::new(camp_rules());
        schedule.add_troop(troop("T1", 10, 2));
        let monitor = ViolationMonitor::new(camp_rules()).with_config(MonitorConfig::new().with_max_passes(10));

        let report = monitor.fix_all(&mut schedule, &catalog);
        assert!(report.fixed > 0);
        assert_eq!(schedule.empty_slot_count(), 0);
        assert!(schedule.has_activity("T1", "Reflection"));
        assert!(schedule.has_activity("T1", "Super Troop"));
        assert!(report
            .remaining
            .iter()
            .all(|v| v.kind != ViolationKind::EmptySlot && v.kind != ViolationKind::MissingMandatory));

        // Running again changes nothing.
        let before = schedule.placements();
        let again = monitor.fix_all(&mut schedule, &catalog);
        assert_eq!(schedule.placements(), before);
        assert_eq!(again.fixed, 0);
    }

    #[test]
    fn test_misplaced_communal_is_moved() {
        let catalog = camp_catalog();
        let mut schedule = Schedule::new(camp_rules());
        let t1 = troop("T1", 10, 2);
        schedule
            .add_entry(slot(Day::Monday, 1), &act(&catalog, "Reflection"), &t1)
            .unwrap();
        full_week(&mut schedule, &catalog, "T1");

        let monitor = ViolationMonitor::new(camp_rules());
        assert!(monitor
            .check(&schedule)
            .iter()
            .any(|v| v.kind == ViolationKind::MissingMandatory && v.slot.is_some()));
        monitor.fix_all(&mut schedule, &catalog);
        let reflection: Vec<_> = schedule
            .starts_for_troop("T1")
            .into_iter()
            .filter(|(_, e)| e.name() == "Reflection")
            .map(|(_, e)| e.slot().day())
            .collect();
        assert_eq!(reflection, vec![Day::Friday]);
    }

    #[test]
    fn test_report_counts() {
        let report = MonitorReport {
            initial_violations: 3,
            fixed: 1,
            passes: 1,
            remaining: vec![
                Violation::new(ViolationKind::EmptySlot, Severity::Critical, "a"),
                Violation::new(ViolationKind::EmptySlot, Severity::Critical, "b"),
                Violation::new(ViolationKind::StaffOverload, Severity::Low, "c").manual(),
            ],
        };
        assert_eq!(report.counts_by_kind()[&ViolationKind::EmptySlot], 2);
        assert!(!report.is_clean());
        assert_eq!(penalty(&report.remaining), 101);
    }
}
