//! End-to-end planning pipeline.
//!
//! [`Planner::plan`] validates the input, runs the phased scheduler,
//! the three optimizers, and a final violation-monitor pass, then
//! summarizes the result.
//!
//! ```text
//! validate → ConstraintScheduler → PreferenceOptimizer
//!          → StaffBalanceOptimizer → ClusteringOptimizer
//!          → ViolationMonitor::fix_all → ScheduleKpi
//! ```

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::PlanError;
use crate::models::{ActivityCatalog, RuleTables, Schedule, Troop};
use crate::monitor::{MonitorConfig, MonitorReport, Violation, ViolationMonitor};
use crate::optimize::{
    ClusteringConfig, ClusteringOptimizer, ClusteringSummary, PreferenceConfig, PreferenceOptimizer,
    PreferenceSummary, StaffBalanceConfig, StaffBalanceOptimizer, StaffBalanceSummary,
};
use crate::scheduler::{ConstraintScheduler, FallbackStats, ScheduleKpi, SoftViolation, UnmetPreference};
use crate::validation::validate_input;

/// Pipeline settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    pub rules: RuleTables,
    pub preference: PreferenceConfig,
    pub staff: StaffBalanceConfig,
    pub clustering: ClusteringConfig,
    pub monitor: MonitorConfig,
    pub run_preference: bool,
    pub run_staff: bool,
    pub run_clustering: bool,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            rules: RuleTables::default(),
            preference: PreferenceConfig::default(),
            staff: StaffBalanceConfig::default(),
            clustering: ClusteringConfig::default(),
            monitor: MonitorConfig::default(),
            run_preference: true,
            run_staff: true,
            run_clustering: true,
        }
    }
}

impl PlannerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rules(mut self, rules: RuleTables) -> Self {
        self.rules = rules;
        self
    }

    /// Seeds the preference optimizer.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.preference.seed = Some(seed);
        self
    }

    pub fn with_preference(mut self, config: PreferenceConfig) -> Self {
        self.preference = config;
        self
    }

    pub fn with_staff(mut self, config: StaffBalanceConfig) -> Self {
        self.staff = config;
        self
    }

    pub fn with_clustering(mut self, config: ClusteringConfig) -> Self {
        self.clustering = config;
        self
    }

    pub fn with_monitor(mut self, config: MonitorConfig) -> Self {
        self.monitor = config;
        self
    }

    /// Enables or disables all three optimizers.
    pub fn with_optimizers(mut self, enabled: bool) -> Self {
        self.run_preference = enabled;
        self.run_staff = enabled;
        self.run_clustering = enabled;
        self
    }
}

/// What a planning run produced besides the schedule.
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Preferences and day requests still missing at the end.
    pub unmet_preferences: Vec<UnmetPreference>,
    pub soft_violations: Vec<SoftViolation>,
    pub fallbacks: FallbackStats,
    /// Final monitor pass.
    pub monitor: MonitorReport,
    pub remaining_violations: Vec<Violation>,
    pub kpi: ScheduleKpi,
    pub preference: Option<PreferenceSummary>,
    pub staff: Option<StaffBalanceSummary>,
    pub clustering: Option<ClusteringSummary>,
}

/// A finished plan.
#[derive(Debug, Clone)]
pub struct PlanOutcome {
    pub schedule: Schedule,
    pub report: RunReport,
}

/// Runs the full pipeline.
#[derive(Debug, Clone, Default)]
pub struct Planner {
    config: PlannerConfig,
}

impl Planner {
    pub fn new(config: PlannerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    /// Plans a week for `troops`.
    ///
    /// # Errors
    /// [`PlanError::InvalidInput`] if validation fails; nothing is
    /// scheduled in that case.
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn plan(&self, troops: &[Troop], catalog: &ActivityCatalog) -> Result<PlanOutcome, PlanError> {
        let config = &self.config;
        validate_input(troops, catalog, &config.rules).map_err(PlanError::InvalidInput)?;
        for troop in troops.iter().filter(|t| t.needs_split()) {
            warn!(troop = %troop.name, scouts = troop.scouts, "troop is large enough to split");
        }
        info!(troops = troops.len(), activities = catalog.len(), "planning started");

        let rules = Arc::new(config.rules.clone());
        let mut schedule = Schedule::new(Arc::clone(&rules)).with_troops(troops.iter().cloned().map(Arc::new));

        let scheduling = ConstraintScheduler::new(catalog)
            .with_clustering(config.clustering.clone())
            .with_monitor(config.monitor.clone())
            .run(&mut schedule);

        let preference = config
            .run_preference
            .then(|| PreferenceOptimizer::new(config.preference.clone()).optimize(&mut schedule, catalog));
        let staff = config
            .run_staff
            .then(|| StaffBalanceOptimizer::new(config.staff.clone()).optimize(&mut schedule));
        let clustering = config
            .run_clustering
            .then(|| ClusteringOptimizer::new(config.clustering.clone()).optimize(&mut schedule));

        let monitor = ViolationMonitor::new(rules)
            .with_config(config.monitor.clone())
            .fix_all(&mut schedule, catalog);
        let kpi = ScheduleKpi::calculate(&schedule);
        let unmet_preferences: Vec<UnmetPreference> = scheduling
            .unmet_preferences
            .into_iter()
            .filter(|u| !schedule.has_activity(&u.troop, &u.activity))
            .collect();

        info!(
            top5 = kpi.top5_satisfaction,
            violations = kpi.violation_count,
            empty = kpi.empty_slots,
            unmet = unmet_preferences.len(),
            "planning finished"
        );
        Ok(PlanOutcome {
            schedule,
            report: RunReport {
                unmet_preferences,
                soft_violations: scheduling.soft_violations,
                fallbacks: scheduling.fallbacks,
                remaining_violations: monitor.remaining.clone(),
                monitor,
                kpi,
                preference,
                staff,
                clustering,
            },
        })
    }
}
