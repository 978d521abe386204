//! Constraint checking, phased scheduling and KPI evaluation.
//!
//! # Algorithm
//!
//! `ConstraintScheduler` builds each troop's week greedily in four
//! phases, most constrained placements first, with a fallback ladder
//! for activities that must not be dropped. It is not optimal; the
//! optimizers in [`crate::optimize`] improve on it afterwards.
//!
//! # KPI
//!
//! `ScheduleKpi` reports preference satisfaction per tier, violation
//! count, staff-load variance and clustering efficiency.

mod constraints;
mod kpi;
mod phased;

pub use constraints::{ConstraintChecker, Strictness};
pub use kpi::{ScheduleKpi, TIERS};
pub use phased::{ConstraintScheduler, FallbackStats, SchedulingReport, SoftViolation, UnmetPreference};

pub(crate) use constraints::{breaks_beach_slot, breaks_wet_dry, day_names};
pub(crate) use phased::fill_slot;
