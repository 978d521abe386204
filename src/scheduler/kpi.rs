//! Schedule quality metrics (KPIs).
//!
//! Computes camp-level performance indicators from a finished schedule.
//!
//! # Metrics
//!
//! | Metric | Definition |
//! |--------|-----------|
//! | Tier satisfaction | satisfied preferences in the tier / (troops × 5) |
//! | Violation count | Monitor violations above `Low` severity |
//! | Staff variance | Population variance of staffed entries per slot |
//! | Clustering efficiency | Mean camp-wide zone clustering, 0..1 |
//! | Empty slots | Troop-slots with nothing scheduled |
//!
//! A troop listing fewer than five preferences in a tier cannot reach
//! 1.0 there. With no troops every tier is 1.0.

use serde::{Deserialize, Serialize};

use crate::models::Schedule;
use crate::monitor::{Severity, ViolationMonitor};
use crate::optimize::{clustering_efficiency, StaffLoad};

/// Preference tiers as zero-based rank ranges.
pub const TIERS: [(usize, usize); 4] = [(0, 5), (5, 10), (10, 15), (15, 20)];

/// Schedule performance indicators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleKpi {
    /// Fraction of top-5 preferences scheduled (0.0..1.0).
    pub top5_satisfaction: f64,
    /// Fraction of rank 6–10 preferences scheduled.
    pub top6_10_satisfaction: f64,
    /// Fraction of rank 11–15 preferences scheduled.
    pub top11_15_satisfaction: f64,
    /// Fraction of rank 16–20 preferences scheduled.
    pub top16_20_satisfaction: f64,
    /// Violations of severity Medium or worse.
    pub violation_count: usize,
    pub staff_variance: f64,
    pub clustering_efficiency: f64,
    pub empty_slots: usize,
    pub troop_count: usize,
}

impl ScheduleKpi {
    /// Computes KPIs under the schedule's own rules.
    pub fn calculate(schedule: &Schedule) -> Self {
        let [top5, top6_10, top11_15, top16_20] = TIERS.map(|(lo, hi)| tier_satisfaction(schedule, lo, hi));
        let violation_count = ViolationMonitor::new(schedule.rules().clone())
            .check(schedule)
            .iter()
            .filter(|v| v.severity > Severity::Low)
            .count();

        Self {
            top5_satisfaction: top5,
            top6_10_satisfaction: top6_10,
            top11_15_satisfaction: top11_15,
            top16_20_satisfaction: top16_20,
            violation_count,
            staff_variance: StaffLoad::from_schedule(schedule).variance(),
            clustering_efficiency: clustering_efficiency(schedule),
            empty_slots: schedule.empty_slot_count(),
            troop_count: schedule.troops().len(),
        }
    }

    /// Satisfaction per tier, best tier first.
    pub fn tier_satisfaction(&self) -> [f64; 4] {
        [
            self.top5_satisfaction,
            self.top6_10_satisfaction,
            self.top11_15_satisfaction,
            self.top16_20_satisfaction,
        ]
    }

    /// Whether the schedule meets the given quality thresholds.
    pub fn meets_thresholds(&self, min_top5: f64, max_violations: usize) -> bool {
        self.top5_satisfaction >= min_top5 && self.violation_count <= max_violations && self.empty_slots == 0
    }
}

fn tier_satisfaction(schedule: &Schedule, lo: usize, hi: usize) -> f64 {
    let troops = schedule.troops();
    if troops.is_empty() {
        return 1.0;
    }
    let satisfied: usize = troops
        .iter()
        .map(|t| {
            t.preferences
                .iter()
                .skip(lo)
                .take(hi - lo)
                .filter(|name| schedule.has_activity(&t.name, name))
                .count()
        })
        .sum();
    satisfied as f64 / (troops.len() * (hi - lo)) as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::fixtures::{act, camp_catalog, camp_rules, slot, troop_with_prefs};
    use crate::models::Day;

    #[test]
    fn test_kpi_empty_camp() {
        let schedule = Schedule::new(camp_rules());
        let kpi = ScheduleKpi::calculate(&schedule);
        assert!((kpi.top5_satisfaction - 1.0).abs() < 1e-10);
        assert_eq!(kpi.violation_count, 0);
        assert_eq!(kpi.empty_slots, 0);
        assert_eq!(kpi.troop_count, 0);
        assert!((kpi.clustering_efficiency - 1.0).abs() < 1e-10);
    }

    #[test]
    fn test_kpi_tier_satisfaction() {
        let catalog = camp_catalog();
        let t1 = Arc::new(troop_with_prefs(
            "T1",
            "Commissioner A",
            &[
                "Archery",
                "Tie Dye",
                "Gaga Ball",
                "9 Square",
                "Fishing",
                "Dr. DNA",
                "Loon Lore",
            ],
        ));
        let mut schedule = Schedule::new(camp_rules()).with_troops([Arc::clone(&t1)]);
        schedule
            .add_entry(slot(Day::Monday, 1), &act(&catalog, "Archery"), &t1)
            .unwrap();
        schedule
            .add_entry(slot(Day::Monday, 2), &act(&catalog, "Tie Dye"), &t1)
            .unwrap();
        schedule
            .add_entry(slot(Day::Monday, 3), &act(&catalog, "Dr. DNA"), &t1)
            .unwrap();

        let kpi = ScheduleKpi::calculate(&schedule);
        assert!((kpi.top5_satisfaction - 0.4).abs() < 1e-10);
        // Two of the five rank 6-10 places are unused, so one hit is 0.2.
        assert!((kpi.top6_10_satisfaction - 0.2).abs() < 1e-10);
        assert!(kpi.top11_15_satisfaction.abs() < 1e-10);
        assert!(kpi.top16_20_satisfaction.abs() < 1e-10);
        assert_eq!(kpi.empty_slots, 11);
        // Eleven empty slots plus two missing mandatory activities.
        assert_eq!(kpi.violation_count, 13);
        assert!(!kpi.meets_thresholds(0.0, 100));
    }
}
