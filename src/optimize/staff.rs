//! Staff-load balancing.
//!
//! Staffed activities (those mapped to a staff area in
//! `RuleTables::staff_zones`) load the slot they run in. A flat load
//! profile across the 14 slots means no staff area is swamped while
//! another idles.
//!
//! # Algorithm
//!
//! While the variance of per-slot load exceeds the target and cycles
//! remain:
//! 1. Mark slots at or above `overload_ratio × mean` as overloaded and
//!    at or below `underload_ratio × mean` as underloaded.
//! 2. For each (overloaded, underloaded) pair, scan the overloaded
//!    slot's staffed entries (safe-swap activities first) for one that
//!    can legally move: relocate if the troop is free in the
//!    underloaded slot, else exchange with the troop's unstaffed entry
//!    there.
//! 3. Keep the first move that lowers the variance.
//!
//! Stops early when a cycle finds no improving move.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::moves::{is_movable, Move};
use crate::models::{Schedule, TimeSlot, SLOTS_PER_WEEK};
use crate::scheduler::Strictness;

/// Staffed entries per slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaffLoad {
    loads: [usize; SLOTS_PER_WEEK],
}

impl StaffLoad {
    /// Counts staffed entries (continuations included) in every slot.
    pub fn from_schedule(schedule: &Schedule) -> Self {
        let mut loads = [0; SLOTS_PER_WEEK];
        for (_, entry) in schedule.entries() {
            if schedule.rules().staff_zone(entry.name()).is_some() {
                loads[entry.slot().index()] += 1;
            }
        }
        Self { loads }
    }

    /// Load of one slot.
    pub fn get(&self, slot: TimeSlot) -> usize {
        self.loads[slot.index()]
    }

    /// Adds one unit of load to each slot.
    pub fn add(&mut self, slots: &[TimeSlot]) {
        for s in slots {
            self.loads[s.index()] += 1;
        }
    }

    /// Mean load over all 14 slots.
    pub fn mean(&self) -> f64 {
        self.loads.iter().sum::<usize>() as f64 / SLOTS_PER_WEEK as f64
    }

    /// Population variance over all 14 slots, empty slots included.
    pub fn variance(&self) -> f64 {
        let mean = self.mean();
        self.loads
            .iter()
            .map(|&l| (l as f64 - mean).powi(2))
            .sum::<f64>()
            / SLOTS_PER_WEEK as f64
    }

    /// Highest single-slot load.
    pub fn peak(&self) -> usize {
        self.loads.iter().copied().max().unwrap_or(0)
    }

    /// `slots` ordered by ascending load, stable.
    pub fn order_by_load(&self, slots: &mut [TimeSlot]) {
        slots.sort_by_key(|s| self.get(*s));
    }
}

/// Staff balancer settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StaffBalanceConfig {
    /// Maximum balancing cycles.
    pub max_cycles: usize,
    /// Stop once variance is at or below this.
    pub target_variance: f64,
    /// Slots at or above `mean × overload_ratio` are overloaded.
    pub overload_ratio: f64,
    /// Slots at or below `mean × underload_ratio` are underloaded.
    pub underload_ratio: f64,
}

impl Default for StaffBalanceConfig {
    fn default() -> Self {
        Self {
            max_cycles: 10,
            target_variance: 1.0,
            overload_ratio: 1.3,
            underload_ratio: 0.7,
        }
    }
}

impl StaffBalanceConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_cycles(mut self, cycles: usize) -> Self {
        self.max_cycles = cycles;
        self
    }

    pub fn with_target_variance(mut self, variance: f64) -> Self {
        self.target_variance = variance;
        self
    }
}

/// Outcome of a balancing run.
#[derive(Debug, Clone, PartialEq)]
pub struct StaffBalanceSummary {
    pub initial_variance: f64,
    pub final_variance: f64,
    pub moves: usize,
    pub cycles: usize,
}

/// Flattens per-slot staff load.
#[derive(Debug, Clone, Default)]
pub struct StaffBalanceOptimizer {
    config: StaffBalanceConfig,
}

impl StaffBalanceOptimizer {
    pub fn new(config: StaffBalanceConfig) -> Self {
        Self { config }
    }

    /// Runs the balancer in place.
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn optimize(&self, schedule: &mut Schedule) -> StaffBalanceSummary {
        let initial_variance = StaffLoad::from_schedule(schedule).variance();
        let mut moves = 0;
        let mut cycles = 0;

        while cycles < self.config.max_cycles {
            let load = StaffLoad::from_schedule(schedule);
            if load.variance() <= self.config.target_variance {
                break;
            }
            cycles += 1;
            if !self.balance_once(schedule, &load) {
                break;
            }
            moves += 1;
        }

        let final_variance = StaffLoad::from_schedule(schedule).variance();
        info!(
            initial_variance,
            final_variance, moves, cycles, "staff balancing finished"
        );
        StaffBalanceSummary {
            initial_variance,
            final_variance,
            moves,
            cycles,
        }
    }

    fn balance_once(&self, schedule: &mut Schedule, load: &StaffLoad) -> bool {
        let mean = load.mean();
        let mut over: Vec<TimeSlot> = TimeSlot::all()
            .filter(|s| load.get(*s) as f64 >= mean * self.config.overload_ratio)
            .collect();
        let mut under: Vec<TimeSlot> = TimeSlot::all()
            .filter(|s| (load.get(*s) as f64) <= mean * self.config.underload_ratio)
            .collect();
        over.sort_by_key(|s| std::cmp::Reverse(load.get(*s)));
        under.sort_by_key(|s| load.get(*s));

        let before = load.variance();
        for &from in &over {
            for &to in &under {
                for mv in self.candidates(schedule, from, to) {
                    let Ok(applied) = mv.apply(schedule, Strictness::Standard) else {
                        continue;
                    };
                    let after = StaffLoad::from_schedule(schedule).variance();
                    if after < before {
                        debug!(troop = mv.troop(), %from, %to, before, after, "staff move");
                        return true;
                    }
                    applied.revert(schedule);
                }
            }
        }
        false
    }

    fn candidates(&self, schedule: &Schedule, from: TimeSlot, to: TimeSlot) -> Vec<Move> {
        let rules = schedule.rules();
        let mut entries: Vec<_> = schedule
            .entries_in_slot(from)
            .filter(|e| rules.staff_zone(e.name()).is_some() && is_movable(schedule, e))
            .collect();
        entries.sort_by_key(|e| !rules.is_safe_swap(e.name()));

        entries
            .into_iter()
            .filter_map(|e| {
                let troop = e.troop().name.clone();
                match schedule.entry_at(&troop, to) {
                    None => Some(Move::Relocate { troop, from, to }),
                    Some(other)
                        if rules.staff_zone(other.name()).is_none()
                            && is_movable(schedule, other) =>
                    {
                        Some(Move::Exchange {
                            troop,
                            a: from,
                            b: to,
                        })
                    }
                    Some(_) => None,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{act, camp_catalog, camp_rules, slot, troop};
    use crate::models::Day;

    #[test]
    fn test_load_and_variance() {
        let catalog = camp_catalog();
        let mut schedule = Schedule::new(camp_rules());
        schedule
            .add_entry(slot(Day::Monday, 1), &act(&catalog, "Archery"), &troop("T1", 10, 2))
            .unwrap();
        schedule
            .add_entry(slot(Day::Monday, 1), &act(&catalog, "Tie Dye"), &troop("T2", 10, 2))
            .unwrap();
        schedule
            .add_entry(slot(Day::Monday, 1), &act(&catalog, "Gaga Ball"), &troop("T3", 10, 2))
            .unwrap();

        let load = StaffLoad::from_schedule(&schedule);
        assert_eq!(load.get(slot(Day::Monday, 1)), 2);
        assert_eq!(load.peak(), 2);
        let mean = 2.0 / 14.0;
        let expected = ((2.0 - mean) * (2.0 - mean) + 13.0 * mean * mean) / 14.0;
        assert!((load.variance() - expected).abs() < 1e-10);
    }

    #[test]
    fn test_balancer_spreads_load() {
        let catalog = camp_catalog();
        let mut schedule = Schedule::new(camp_rules());
        let mon1 = slot(Day::Monday, 1);
        for (i, name) in ["Archery", "Tie Dye", "Troop Rifle", "Dr. DNA", "Orienteering"]
            .iter()
            .enumerate()
        {
            schedule
                .add_entry(mon1, &act(&catalog, name), &troop(&format!("T{i}"), 10, 2))
                .unwrap();
        }
        let before = schedule.placements().len();

        let summary = StaffBalanceOptimizer::new(StaffBalanceConfig::new().with_target_variance(0.0))
            .optimize(&mut schedule);
        assert!(summary.final_variance < summary.initial_variance);
        assert!(summary.moves > 0);
        assert_eq!(schedule.placements().len(), before);
        assert!(StaffLoad::from_schedule(&schedule).get(mon1) < 5);
    }

    #[test]
    fn test_balanced_schedule_is_untouched() {
        let mut schedule = Schedule::new(camp_rules());
        let summary = StaffBalanceOptimizer::default().optimize(&mut schedule);
        assert_eq!(summary.moves, 0);
        assert_eq!(summary.cycles, 0);
    }
}
