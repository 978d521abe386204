//! Zone clustering.
//!
//! Staff running one zone (the beach, the outdoor-skills area) work best
//! when that zone's sessions sit on a few adjacent days. Clustering
//! measures how concentrated each zone's activities are across the whole
//! camp and swaps entries within troops to pull them onto fewer days.
//!
//! # Zone Score
//!
//! For one zone, count its entries per day over every troop and let
//! `p_d` be day `d`'s share:
//!
//! ```text
//! score = 1 − H(p) / log2(max(2, days used)) + 0.1 × (adjacent day pairs used)
//! ```
//!
//! capped at 1.0. Zones with fewer than two entries score 1.0. Camp
//! efficiency is the mean score over zones that have entries.
//! [`troop_efficiency`] applies the same score to one troop's entries.
//!
//! # Strategies
//!
//! The iteration budget is split in thirds:
//! 1. **Zone consolidation**: move entries toward the zone's dominant day.
//! 2. **Cross-zone exchange**: swap two entries when the camp scores
//!    higher afterwards.
//! 3. **Type clustering**: same as 1, grouping by activity category.
//!
//! Each iteration commits only the best legal move found.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::moves::{is_movable, Move};
use crate::models::{Day, Schedule, ScheduleEntry, TimeSlot, Troop, Zone};
use crate::scheduler::Strictness;

/// Clustering settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusteringConfig {
    /// Total iterations across the three strategies.
    pub max_iterations: usize,
    /// Smallest efficiency gain worth committing.
    pub min_improvement: f64,
}

impl Default for ClusteringConfig {
    fn default() -> Self {
        Self {
            max_iterations: 30,
            min_improvement: 0.005,
        }
    }
}

impl ClusteringConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_iterations(mut self, iterations: usize) -> Self {
        self.max_iterations = iterations;
        self
    }
}

/// Concentration score of one group's per-day entry counts.
pub fn distribution_score(per_day: &[usize; 5]) -> f64 {
    let total: usize = per_day.iter().sum();
    if total < 2 {
        return 1.0;
    }
    let days_used = per_day.iter().filter(|&&n| n > 0).count();
    let entropy: f64 = per_day
        .iter()
        .filter(|&&n| n > 0)
        .map(|&n| {
            let p = n as f64 / total as f64;
            -p * p.log2()
        })
        .sum();
    let max_entropy = (days_used.max(2) as f64).log2();
    let adjacent = per_day
        .windows(2)
        .filter(|w| w[0] > 0 && w[1] > 0)
        .count();
    (1.0 - entropy / max_entropy + 0.1 * adjacent as f64).min(1.0)
}

/// The day holding most of a group's entries; ties go to the earlier day.
pub(crate) fn dominant_day(per_day: &[usize; 5]) -> Option<Day> {
    Day::ALL
        .into_iter()
        .filter(|d| per_day[d.ordinal()] > 0)
        .max_by_key(|d| (per_day[d.ordinal()], std::cmp::Reverse(d.ordinal())))
}

fn count_by<'a, K, I, F>(entries: I, key: F) -> BTreeMap<K, [usize; 5]>
where
    K: Ord,
    I: Iterator<Item = &'a ScheduleEntry>,
    F: Fn(&ScheduleEntry) -> Option<K>,
{
    let mut counts: BTreeMap<K, [usize; 5]> = BTreeMap::new();
    for e in entries {
        if let Some(k) = key(e) {
            counts.entry(k).or_default()[e.slot().day().ordinal()] += 1;
        }
    }
    counts
}

/// Per-day entry counts of every zone, over all troops.
pub(crate) fn zone_day_counts(schedule: &Schedule) -> BTreeMap<Zone, [usize; 5]> {
    count_by(schedule.entries().map(|(_, e)| e), |e| Some(e.activity().zone))
}

/// Per-day entry counts of every activity category, over all troops.
pub(crate) fn category_day_counts(schedule: &Schedule) -> BTreeMap<String, [usize; 5]> {
    let rules = schedule.rules();
    count_by(schedule.entries().map(|(_, e)| e), |e| rules.category_of(e.name()).map(str::to_string))
}

fn mean_score<K>(counts: &BTreeMap<K, [usize; 5]>) -> f64 {
    if counts.is_empty() {
        return 1.0;
    }
    counts.values().map(distribution_score).sum::<f64>() / counts.len() as f64
}

/// Mean zone score over one troop's own entries.
pub fn troop_efficiency(schedule: &Schedule, troop: &str) -> f64 {
    mean_score(&count_by(schedule.entries_for_troop(troop), |e| {
        Some(e.activity().zone)
    }))
}

/// Mean camp-wide zone score over zones with entries (1.0 if none).
pub fn clustering_efficiency(schedule: &Schedule) -> f64 {
    mean_score(&zone_day_counts(schedule))
}

/// Mean camp-wide activity-category score (1.0 if none).
pub fn category_efficiency(schedule: &Schedule) -> f64 {
    mean_score(&category_day_counts(schedule))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Strategy {
    ZoneConsolidation,
    CrossZone,
    TypeClustering,
}

/// Outcome of a clustering run.
#[derive(Debug, Clone, PartialEq)]
pub struct ClusteringSummary {
    pub initial_efficiency: f64,
    pub final_efficiency: f64,
    pub swaps: usize,
}

/// Pulls each zone's activities onto fewer days.
#[derive(Debug, Clone, Default)]
pub struct ClusteringOptimizer {
    config: ClusteringConfig,
}

impl ClusteringOptimizer {
    pub fn new(config: ClusteringConfig) -> Self {
        Self { config }
    }

    /// Runs all three strategies in place.
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn optimize(&self, schedule: &mut Schedule) -> ClusteringSummary {
        let initial_efficiency = clustering_efficiency(schedule);
        let budget = (self.config.max_iterations / 3).max(1);
        let mut swaps = 0;
        for strategy in [
            Strategy::ZoneConsolidation,
            Strategy::CrossZone,
            Strategy::TypeClustering,
        ] {
            swaps += self.run_strategy(schedule, strategy, budget);
        }
        let final_efficiency = clustering_efficiency(schedule);
        info!(
            initial_efficiency,
            final_efficiency, swaps, "clustering finished"
        );
        ClusteringSummary {
            initial_efficiency,
            final_efficiency,
            swaps,
        }
    }

    /// Zone consolidation only, as used during initial scheduling.
    pub fn consolidate(&self, schedule: &mut Schedule) -> usize {
        self.run_strategy(schedule, Strategy::ZoneConsolidation, self.config.max_iterations)
    }

    fn run_strategy(&self, schedule: &mut Schedule, strategy: Strategy, budget: usize) -> usize {
        let mut swaps = 0;
        for _ in 0..budget {
            if !self.step(schedule, strategy) {
                break;
            }
            swaps += 1;
        }
        swaps
    }

    /// Commits the best improving move of `strategy`, if any.
    fn step(&self, schedule: &mut Schedule, strategy: Strategy) -> bool {
        let troops: Vec<String> = schedule.troops().iter().map(|t| t.name.clone()).collect();
        let base_zone = clustering_efficiency(schedule);
        let base_cat = category_efficiency(schedule);
        let groups = match strategy {
            Strategy::ZoneConsolidation => Groups::Zones(zone_day_counts(schedule)),
            Strategy::TypeClustering => Groups::Categories(category_day_counts(schedule)),
            Strategy::CrossZone => Groups::Ungrouped,
        };
        let mut best: Option<(f64, Move)> = None;

        for troop in &troops {
            for mv in self.candidates(schedule, troop, &groups) {
                let Ok(applied) = mv.apply(schedule, Strictness::Standard) else {
                    continue;
                };
                let zone_gain = clustering_efficiency(schedule) - base_zone;
                let gain = match strategy {
                    Strategy::ZoneConsolidation | Strategy::CrossZone => zone_gain,
                    Strategy::TypeClustering if zone_gain >= 0.0 => category_efficiency(schedule) - base_cat,
                    Strategy::TypeClustering => f64::NEG_INFINITY,
                };
                applied.revert(schedule);
                if gain > self.config.min_improvement && best.as_ref().map_or(true, |(g, _)| gain > *g) {
                    best = Some((gain, mv));
                }
            }
        }

        let Some((gain, mv)) = best else {
            return false;
        };
        match mv.apply(schedule, Strictness::Standard) {
            Ok(_) => {
                debug!(troop = mv.troop(), gain, ?strategy, "clustering swap");
                true
            }
            Err(_) => false,
        }
    }

    fn candidates(&self, schedule: &Schedule, troop: &str, groups: &Groups) -> Vec<Move> {
        let movable: Vec<(TimeSlot, Zone, Option<String>)> = schedule
            .starts_for_troop(troop)
            .into_iter()
            .filter(|(_, e)| is_movable(schedule, e))
            .map(|(_, e)| {
                let cat = schedule.rules().category_of(e.name()).map(str::to_string);
                (e.slot(), e.activity().zone, cat)
            })
            .collect();

        let free = schedule.free_slots(troop);
        let mut moves = Vec::new();
        match groups {
            Groups::Zones(counts) => {
                for (zone, days) in counts {
                    push_toward_dominant(&mut moves, troop, days, &movable, &free, |(_, z, _)| z == zone);
                }
            }
            Groups::Categories(counts) => {
                for (cat, days) in counts {
                    push_toward_dominant(&mut moves, troop, days, &movable, &free, |(_, _, c)| {
                        c.as_deref() == Some(cat.as_str())
                    });
                }
            }
            Groups::Ungrouped => {
                for (i, (a, za, _)) in movable.iter().enumerate() {
                    for (b, zb, _) in &movable[i + 1..] {
                        if za != zb && a.day() != b.day() {
                            moves.push(Move::Exchange {
                                troop: troop.to_string(),
                                a: *a,
                                b: *b,
                            });
                        }
                    }
                }
            }
        }
        moves
    }
}

/// Camp-wide per-day counts a strategy steers by.
enum Groups {
    Zones(BTreeMap<Zone, [usize; 5]>),
    Categories(BTreeMap<String, [usize; 5]>),
    Ungrouped,
}

/// Adds relocations and exchanges bringing the troop's off-day members
/// of a group onto the group's camp-wide dominant day.
fn push_toward_dominant<F>(
    moves: &mut Vec<Move>,
    troop: &str,
    days: &[usize; 5],
    movable: &[(TimeSlot, Zone, Option<String>)],
    free: &[TimeSlot],
    in_group: F,
) where
    F: Fn(&(TimeSlot, Zone, Option<String>)) -> bool,
{
    if days.iter().sum::<usize>() < 2 || days.iter().filter(|&&n| n > 0).count() < 2 {
        return;
    }
    let Some(dominant) = dominant_day(days) else {
        return;
    };

    for member in movable.iter().filter(|m| in_group(m) && m.0.day() != dominant) {
        for &to in free.iter().filter(|s| s.day() == dominant) {
            moves.push(Move::Relocate {
                troop: troop.to_string(),
                from: member.0,
                to,
            });
        }
        for other in movable
            .iter()
            .filter(|o| o.0.day() == dominant && !in_group(o))
        {
            moves.push(Move::Exchange {
                troop: troop.to_string(),
                a: member.0,
                b: other.0,
            });
        }
    }
}

/// Troops whose own entries cluster below `threshold`.
pub fn poorly_clustered(schedule: &Schedule, threshold: f64) -> Vec<&Troop> {
    schedule
        .troops()
        .iter()
        .filter(|t| troop_efficiency(schedule, &t.name) < threshold)
        .map(|t| t.as_ref())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{act, camp_catalog, camp_rules, camp_troops, slot, troop};
    use crate::scheduler::ConstraintScheduler;

    #[test]
    fn test_distribution_score() {
        assert!((distribution_score(&[0, 0, 0, 0, 0]) - 1.0).abs() < 1e-10);
        assert!((distribution_score(&[1, 0, 0, 0, 0]) - 1.0).abs() < 1e-10);
        assert!((distribution_score(&[3, 0, 0, 0, 0]) - 1.0).abs() < 1e-10);

        // Even split over two days: entropy is maximal, adjacency adds 0.1.
        assert!((distribution_score(&[1, 1, 0, 0, 0]) - 0.1).abs() < 1e-10);
        assert!(distribution_score(&[1, 0, 1, 0, 0]).abs() < 1e-10);
        assert!((distribution_score(&[1, 1, 1, 1, 1]) - 0.4).abs() < 1e-10);

        let h = -(0.75f64 * 0.75f64.log2() + 0.25 * 0.25f64.log2());
        assert!((distribution_score(&[3, 1, 0, 0, 0]) - (1.0 - h + 0.1)).abs() < 1e-10);
    }

    #[test]
    fn test_dominant_day_prefers_earlier_on_tie() {
        assert_eq!(dominant_day(&[0, 0, 0, 0, 0]), None);
        assert_eq!(dominant_day(&[1, 1, 0, 0, 1]), Some(Day::Monday));
        assert_eq!(dominant_day(&[0, 1, 2, 0, 2]), Some(Day::Wednesday));
    }

    #[test]
    fn test_efficiency_is_camp_wide() {
        let catalog = camp_catalog();
        let mut schedule = Schedule::new(camp_rules());
        for (i, (day, name)) in [
            (Day::Monday, "Orienteering"),
            (Day::Tuesday, "Knots and Lashings"),
            (Day::Wednesday, "GPS & Geocaching"),
            (Day::Friday, "Chopped!"),
        ]
        .into_iter()
        .enumerate()
        {
            let t = troop(&format!("T{}", i + 1), 10, 2);
            schedule.add_entry(slot(day, 1), &act(&catalog, name), &t).unwrap();
        }

        // Each troop alone is perfectly clustered; the zone as a whole is not.
        assert!((troop_efficiency(&schedule, "T1") - 1.0).abs() < 1e-10);
        assert!((clustering_efficiency(&schedule) - 0.2).abs() < 1e-10);
        assert_eq!(zone_day_counts(&schedule)[&Zone::OutdoorSkills], [1, 1, 1, 0, 1]);
    }

    #[test]
    fn test_consolidation_pulls_zone_together_across_troops() {
        let catalog = camp_catalog();
        let mut schedule = Schedule::new(camp_rules());
        for (i, (day, name)) in [
            (Day::Monday, "Orienteering"),
            (Day::Tuesday, "Knots and Lashings"),
            (Day::Wednesday, "GPS & Geocaching"),
            (Day::Friday, "Chopped!"),
        ]
        .into_iter()
        .enumerate()
        {
            let t = troop(&format!("T{}", i + 1), 10, 2);
            schedule.add_entry(slot(day, 1), &act(&catalog, name), &t).unwrap();
        }
        let before_eff = clustering_efficiency(&schedule);
        let before = schedule.placements().len();

        let swaps = ClusteringOptimizer::default().consolidate(&mut schedule);
        assert!(swaps >= 1);
        assert!(clustering_efficiency(&schedule) > before_eff);
        assert_eq!(schedule.placements().len(), before);
        assert!(zone_day_counts(&schedule)[&Zone::OutdoorSkills][Day::Monday.ordinal()] >= 2);
        assert_eq!(
            schedule.entry_at("T1", slot(Day::Monday, 1)).map(|e| e.name()),
            Some("Orienteering")
        );
    }

    #[test]
    fn test_optimize_never_lowers_efficiency() {
        let catalog = camp_catalog();
        let mut schedule = Schedule::new(camp_rules());
        let t1 = troop("T1", 10, 2);
        for (day, n, name) in [
            (Day::Monday, 1, "Tie Dye"),
            (Day::Tuesday, 3, "Hemp Craft"),
            (Day::Thursday, 1, "Orienteering"),
            (Day::Friday, 2, "Chopped!"),
            (Day::Wednesday, 2, "Gaga Ball"),
        ] {
            schedule.add_entry(slot(day, n), &act(&catalog, name), &t1).unwrap();
        }
        let summary = ClusteringOptimizer::default().optimize(&mut schedule);
        assert!(summary.final_efficiency >= summary.initial_efficiency - 1e-10);
        assert_eq!(schedule.placements().len(), 5);
    }

    #[test]
    fn test_optimize_full_schedule_keeps_every_entry() {
        let catalog = camp_catalog();
        let mut schedule = Schedule::new(camp_rules()).with_troops(camp_troops().into_iter().map(std::sync::Arc::new));
        ConstraintScheduler::new(&catalog).run(&mut schedule);
        let len = schedule.len();
        let starts = schedule.placements().len();

        let summary = ClusteringOptimizer::default().optimize(&mut schedule);
        assert!(summary.final_efficiency >= summary.initial_efficiency - 1e-10);
        assert_eq!(schedule.len(), len);
        assert_eq!(schedule.placements().len(), starts);
        assert_eq!(schedule.empty_slot_count(), 0);
    }

    #[test]
    fn test_poorly_clustered() {
        let catalog = camp_catalog();
        let mut schedule = Schedule::new(camp_rules());
        let t1 = troop("T1", 10, 2);
        let t2 = troop("T2", 10, 2);
        schedule
            .add_entry(slot(Day::Monday, 1), &act(&catalog, "Orienteering"), &t1)
            .unwrap();
        schedule
            .add_entry(slot(Day::Friday, 1), &act(&catalog, "Chopped!"), &t1)
            .unwrap();
        schedule
            .add_entry(slot(Day::Wednesday, 1), &act(&catalog, "Knots and Lashings"), &t2)
            .unwrap();
        schedule
            .add_entry(slot(Day::Wednesday, 2), &act(&catalog, "GPS & Geocaching"), &t2)
            .unwrap();

        assert!(troop_efficiency(&schedule, "T1").abs() < 1e-10);
        assert!((troop_efficiency(&schedule, "T2") - 1.0).abs() < 1e-10);
        let names: Vec<&str> = poorly_clustered(&schedule, 0.5).iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["T1"]);
    }
}
