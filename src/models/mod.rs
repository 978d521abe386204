//! Camp scheduling domain models.
//!
//! Provides the core data types for a weekly camp program: the slot
//! grid, activities and their catalog, troops, the rule registry, and
//! the schedule itself.
//!
//! # Domain Mappings
//!
//! | camp-schedule | Timetabling | Meaning |
//! |---------------|-------------|---------|
//! | Troop | Class/Group | Who is scheduled |
//! | Activity | Lesson | What they do |
//! | TimeSlot | Period | When |
//! | Zone | Building | Where, for clustering |
//! | RuleTables | Constraint set | Camp-specific rules |

mod activity;
mod catalog;
mod rules;
mod schedule;
mod time_slot;
mod troop;

pub use activity::{Activity, SlotDuration};
pub use catalog::ActivityCatalog;
pub use rules::{CapacityPool, DayGroup, Exclusivity, PairedLimit, RuleTables, SizeExtension};
pub use schedule::{EntryId, Placement, Schedule, ScheduleEntry};
pub use time_slot::{Day, TimeSlot, Zone, SLOTS_PER_WEEK};
pub use troop::{SizeCategory, Troop};
