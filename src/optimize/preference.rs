//! Simulated-annealing preference optimizer.
//!
//! # Score
//!
//! ```text
//! score = Σ tier_weight × tier_satisfaction
//!       + violation_weight × violations
//!       + staff_weight × max(0, staff_target − staff_variance)
//!       + clustering_weight × clustering_efficiency
//! ```
//!
//! Tier weights default to 10 / 5 / 2 / 1 for ranks 1–5 / 6–10 / 11–15 /
//! 16–20, violations to −50, staff to 2 and clustering to 1.5.
//!
//! # Algorithm
//!
//! Each iteration builds up to four candidate moves (preference
//! improvement, constraint fix, staff balance, clustering), then for each
//! one applies it, scores the schedule and reverts. A candidate is
//! accepted if it improves the score, or with probability `exp(Δ/T)`
//! otherwise. The best accepted candidate is committed when it is within
//! `tolerance` of the current score. Temperature falls linearly from
//! `initial_temperature` to `min_temperature`. The best schedule seen is
//! restored at the end.

use std::sync::Arc;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::clustering::{dominant_day, zone_day_counts};
use super::moves::{is_movable, Move};
use super::staff::StaffLoad;
use crate::models::{ActivityCatalog, Day, Schedule, TimeSlot};
use crate::monitor::{ViolationKind, ViolationMonitor};
use crate::scheduler::{ScheduleKpi, Strictness, TIERS};

/// Score weights.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreferenceWeights {
    /// Per tier, best tier first.
    pub tiers: [f64; 4],
    /// Per violation (negative).
    pub violation: f64,
    /// Reward per unit of staff variance below `staff_target`.
    pub staff: f64,
    pub staff_target: f64,
    pub clustering: f64,
}

impl Default for PreferenceWeights {
    fn default() -> Self {
        Self {
            tiers: [10.0, 5.0, 2.0, 1.0],
            violation: -50.0,
            staff: 2.0,
            staff_target: 2.0,
            clustering: 1.5,
        }
    }
}

impl PreferenceWeights {
    /// Scores a KPI summary.
    pub fn score(&self, kpi: &ScheduleKpi) -> f64 {
        let tiers: f64 = self
            .tiers
            .iter()
            .zip(kpi.tier_satisfaction())
            .map(|(w, s)| w * s)
            .sum();
        tiers
            + self.violation * kpi.violation_count as f64
            + self.staff * (self.staff_target - kpi.staff_variance).max(0.0)
            + self.clustering * kpi.clustering_efficiency
    }
}

/// Annealing settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreferenceConfig {
    pub max_iterations: usize,
    pub initial_temperature: f64,
    pub min_temperature: f64,
    /// Relative slack for committing a non-improving move.
    pub tolerance: f64,
    /// RNG seed; `None` draws one from the thread RNG.
    pub seed: Option<u64>,
    pub weights: PreferenceWeights,
}

impl Default for PreferenceConfig {
    fn default() -> Self {
        Self {
            max_iterations: 200,
            initial_temperature: 1.0,
            min_temperature: 0.01,
            tolerance: 0.01,
            seed: None,
            weights: PreferenceWeights::default(),
        }
    }
}

impl PreferenceConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_iterations(mut self, iterations: usize) -> Self {
        self.max_iterations = iterations;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_temperature(mut self, initial: f64) -> Self {
        self.initial_temperature = initial;
        self
    }

    pub fn with_weights(mut self, weights: PreferenceWeights) -> Self {
        self.weights = weights;
        self
    }
}

/// Outcome of an annealing run.
#[derive(Debug, Clone, PartialEq)]
pub struct PreferenceSummary {
    pub initial_score: f64,
    pub final_score: f64,
    pub iterations: usize,
    /// Moves committed.
    pub accepted: usize,
    /// Commits that set a new best.
    pub improvements: usize,
}

/// Improves preference satisfaction by simulated annealing.
#[derive(Debug, Clone)]
pub struct PreferenceOptimizer {
    config: PreferenceConfig,
    rng: ChaCha8Rng,
}

impl PreferenceOptimizer {
    pub fn new(config: PreferenceConfig) -> Self {
        let seed = config.seed.unwrap_or_else(|| rand::rng().random());
        Self {
            config,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Uses `rng` instead of the configured seed.
    pub fn with_rng(mut self, rng: ChaCha8Rng) -> Self {
        self.rng = rng;
        self
    }

    /// Score of `schedule` under the configured weights.
    pub fn score(&self, schedule: &Schedule) -> f64 {
        self.config.weights.score(&ScheduleKpi::calculate(schedule))
    }

    /// Runs the annealer in place.
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn optimize(&mut self, schedule: &mut Schedule, catalog: &ActivityCatalog) -> PreferenceSummary {
        let initial_score = self.score(schedule);
        let mut current = initial_score;
        let mut best_score = initial_score;
        let mut best = schedule.clone();
        let mut accepted = 0;
        let mut improvements = 0;
        let max = self.config.max_iterations;

        for it in 0..max {
            let progress = it as f64 / max as f64;
            let temperature = (self.config.initial_temperature * (1.0 - progress)).max(self.config.min_temperature);

            let candidates = [
                self.preference_move(schedule, catalog),
                self.constraint_move(schedule),
                self.staff_move(schedule),
                self.clustering_move(schedule),
            ];

            let mut chosen: Option<(Move, f64)> = None;
            for mv in candidates.into_iter().flatten() {
                let Ok(applied) = mv.apply(schedule, Strictness::Standard) else {
                    continue;
                };
                let score = self.score(schedule);
                applied.revert(schedule);

                let delta = score - current;
                let accept = delta > 0.0 || self.rng.random::<f64>() < (delta / temperature).exp();
                if accept && chosen.as_ref().is_none_or(|(_, s)| score > *s) {
                    chosen = Some((mv, score));
                }
            }

            let Some((mv, score)) = chosen else {
                continue;
            };
            if score <= current - self.config.tolerance * current.abs() {
                continue;
            }
            if mv.apply(schedule, Strictness::Standard).is_err() {
                continue;
            }
            debug!(iteration = it, troop = mv.troop(), from = current, to = score, "move committed");
            current = score;
            accepted += 1;
            if score > best_score {
                best_score = score;
                best = schedule.clone();
                improvements += 1;
            }
        }

        if best_score > current {
            *schedule = best;
            current = best_score;
        }
        info!(
            initial_score,
            final_score = current,
            accepted,
            improvements,
            "preference optimization finished"
        );
        PreferenceSummary {
            initial_score,
            final_score: current,
            iterations: max,
            accepted,
            improvements,
        }
    }

    fn pick<T: Copy>(&mut self, items: &[T]) -> Option<T> {
        if items.is_empty() {
            None
        } else {
            Some(items[self.rng.random_range(0..items.len())])
        }
    }

    /// Replace a worse-ranked safe-swap entry with a missing top-20
    /// preference.
    fn preference_move(&mut self, schedule: &Schedule, catalog: &ActivityCatalog) -> Option<Move> {
        let troops = schedule.troops();
        if troops.is_empty() {
            return None;
        }
        let troop = Arc::clone(&troops[self.rng.random_range(0..troops.len())]);
        let depth = TIERS[TIERS.len() - 1].1;
        let missing: Vec<usize> = troop
            .preferences
            .iter()
            .take(depth)
            .enumerate()
            .filter(|(_, name)| !schedule.has_activity(&troop.name, name) && catalog.contains(name))
            .map(|(rank, _)| rank)
            .collect();
        let rank = self.pick(&missing)?;
        let name = &troop.preferences[rank];

        let targets: Vec<TimeSlot> = schedule
            .starts_for_troop(&troop.name)
            .into_iter()
            .filter(|(_, e)| is_movable(schedule, e) && schedule.rules().is_safe_swap(e.name()))
            .filter(|(_, e)| troop.rank_of(e.name()).is_none_or(|r| r > rank))
            .map(|(_, e)| e.slot())
            .collect();
        let slot = self.pick(&targets)?;
        Some(Move::Replace {
            troop: troop.name.clone(),
            slot,
            add: Arc::clone(catalog.get(name)?),
        })
    }

    /// Exchange an entry implicated in a soft violation with another day.
    fn constraint_move(&mut self, schedule: &Schedule) -> Option<Move> {
        let violations: Vec<(String, TimeSlot)> = ViolationMonitor::new(Arc::clone(schedule.rules()))
            .check(schedule)
            .into_iter()
            .filter(|v| {
                matches!(
                    v.kind,
                    ViolationKind::BeachSlot
                        | ViolationKind::WetDry
                        | ViolationKind::AccuracyLimit
                        | ViolationKind::SameDayConflict
                )
            })
            .filter_map(|v| Some((v.troop?, v.slot?)))
            .collect();
        if violations.is_empty() {
            return None;
        }
        let (troop, slot) = violations[self.rng.random_range(0..violations.len())].clone();

        let starts = self.movable_starts(schedule, &troop);
        let a = if starts.contains(&slot) {
            slot
        } else {
            let same_day: Vec<TimeSlot> = starts.iter().copied().filter(|s| s.day() == slot.day()).collect();
            self.pick(&same_day)?
        };
        let others: Vec<TimeSlot> = starts.into_iter().filter(|s| s.day() != a.day()).collect();
        let b = self.pick(&others)?;
        Some(Move::Exchange { troop, a, b })
    }

    /// Move a staffed entry out of the busiest slot toward the quietest.
    fn staff_move(&mut self, schedule: &Schedule) -> Option<Move> {
        let load = StaffLoad::from_schedule(schedule);
        let from = TimeSlot::all().max_by_key(|s| (load.get(*s), std::cmp::Reverse(s.index())))?;
        let to = TimeSlot::all().min_by_key(|s| (load.get(*s), s.index()))?;
        if load.get(from) <= load.get(to) + 1 {
            return None;
        }

        let rules = schedule.rules();
        let troops: Vec<String> = schedule
            .entries_in_slot(from)
            .filter(|e| rules.staff_zone(e.name()).is_some() && is_movable(schedule, e))
            .map(|e| e.troop().name.clone())
            .collect();
        if troops.is_empty() {
            return None;
        }
        let troop = troops[self.rng.random_range(0..troops.len())].clone();
        match schedule.entry_at(&troop, to) {
            None => Some(Move::Relocate { troop, from, to }),
            Some(e) if is_movable(schedule, e) => Some(Move::Exchange { troop, a: from, b: to }),
            Some(_) => None,
        }
    }

    /// Move a zone's lone entry on some day onto the zone's busiest day.
    fn clustering_move(&mut self, schedule: &Schedule) -> Option<Move> {
        let counts = zone_day_counts(schedule);
        let mut lone: Vec<(usize, TimeSlot, Day)> = Vec::new();
        for (idx, troop) in schedule.troops().iter().enumerate() {
            for (_, e) in schedule.starts_for_troop(&troop.name) {
                if !is_movable(schedule, e) {
                    continue;
                }
                let Some(per_day) = counts.get(&e.activity().zone) else {
                    continue;
                };
                let day = e.slot().day();
                match dominant_day(per_day) {
                    Some(dominant) if per_day[day.ordinal()] == 1 && dominant != day => {
                        lone.push((idx, e.slot(), dominant));
                    }
                    _ => {}
                }
            }
        }
        let (idx, from, dominant) = self.pick(&lone)?;

        let troop = Arc::clone(&schedule.troops()[idx]);
        let entry = schedule.entry_at(&troop.name, from)?;
        let zone = entry.activity().zone;
        let open: Vec<TimeSlot> = dominant
            .slots()
            .filter(|&s| schedule.is_troop_free(s, &troop.name))
            .filter(|&s| schedule.is_activity_available(s, entry.activity(), &troop))
            .collect();
        if let Some(to) = self.pick(&open) {
            return Some(Move::Relocate {
                troop: troop.name.clone(),
                from,
                to,
            });
        }
        let partners: Vec<TimeSlot> = self
            .movable_starts(schedule, &troop.name)
            .into_iter()
            .filter(|s| s.day() == dominant)
            .filter(|&s| schedule.entry_at(&troop.name, s).is_some_and(|e| e.activity().zone != zone))
            .collect();
        let b = self.pick(&partners)?;
        Some(Move::Exchange {
            troop: troop.name.clone(),
            a: from,
            b,
        })
    }

    fn movable_starts(&self, schedule: &Schedule, troop: &str) -> Vec<TimeSlot> {
        schedule
            .starts_for_troop(troop)
            .into_iter()
            .filter(|(_, e)| is_movable(schedule, e))
            .map(|(_, e)| e.slot())
            .collect()
    }
}
