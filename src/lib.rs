//! Weekly camp activity scheduler.
//!
//! Assigns activities to troops across a fixed 14-slot week (three slots
//! Monday to Wednesday and Friday, two on Thursday), honouring ranked
//! troop preferences and a dense set of camp rules: exclusive areas with
//! sharing carve-outs, multi-slot spans, beach-slot and wet/dry
//! sequencing, accuracy limits, commissioner days, and staffing.
//!
//! # Modules
//!
//! - **`models`**: Domain types: `TimeSlot`, `Activity`, `ActivityCatalog`,
//!   `Troop`, `RuleTables`, `Schedule`
//! - **`validation`**: Input integrity checks (duplicate troops, unknown
//!   activities, impossible limits)
//! - **`scheduler`**: Layered `ConstraintChecker`, the phased
//!   `ConstraintScheduler`, and `ScheduleKpi`
//! - **`optimize`**: Reversible moves plus preference (simulated
//!   annealing), staff-balance, and clustering optimizers
//! - **`monitor`**: Violation detection and auto-remediation
//! - **`planner`**: The end-to-end pipeline
//!
//! # Example
//!
//! ```no_run
//! use camp_schedule::models::{ActivityCatalog, Troop};
//! use camp_schedule::planner::{Planner, PlannerConfig};
//!
//! let troops = vec![Troop::new("Troop 101").with_preferences(["Archery", "Sailing"])];
//! let outcome = Planner::new(PlannerConfig::new().with_seed(1))
//!     .plan(&troops, &ActivityCatalog::camp_default())
//!     .unwrap();
//! for placement in outcome.schedule.placements() {
//!     println!("{} {} {}", placement.troop, placement.slot, placement.activity);
//! }
//! ```

pub mod error;
pub mod models;
pub mod monitor;
pub mod optimize;
pub mod planner;
pub mod scheduler;
pub mod validation;

#[cfg(test)]
mod fixtures;

pub use error::{InvalidTimeSlot, PlacementError, PlanError};
pub use planner::{PlanOutcome, Planner, PlannerConfig, RunReport};
