//! Post-scheduling optimizers.
//!
//! Three local-search passes refine a complete schedule. Each works
//! through reversible [`Move`]s so a rejected candidate leaves the
//! schedule exactly as it was.
//!
//! | Optimizer | Objective | Search |
//! |-----------|-----------|--------|
//! | [`PreferenceOptimizer`] | weighted preference/violation/staff/clustering score | simulated annealing |
//! | [`StaffBalanceOptimizer`] | per-slot staff-load variance | first-improvement |
//! | [`ClusteringOptimizer`] | zone and category clustering | best-improvement |
//!
//! Mandatory activities and multi-slot spans are never moved.

mod clustering;
pub(crate) mod moves;
mod preference;
mod staff;

pub use clustering::{
    category_efficiency, clustering_efficiency, distribution_score, poorly_clustered, troop_efficiency,
    ClusteringConfig, ClusteringOptimizer, ClusteringSummary,
};
pub use moves::{AppliedMove, Move};
pub use preference::{PreferenceConfig, PreferenceOptimizer, PreferenceSummary, PreferenceWeights};
pub use staff::{StaffBalanceConfig, StaffBalanceOptimizer, StaffBalanceSummary, StaffLoad};
