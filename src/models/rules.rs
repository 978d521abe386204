//! Constraint-rule registry.
//!
//! Every component reads camp rules from one [`RuleTables`] value shared
//! through an `Arc`. The tables are plain serde data so an external
//! loader can replace any of them; `Default` reproduces the standard
//! camp configuration.
//!
//! # Exclusivity Lookup
//!
//! [`RuleTables::exclusivity`] classifies an activity in this order:
//!
//! | Order | Table | Class |
//! |-------|-------|-------|
//! | 1 | `shared_activities` | [`Exclusivity::Shared`] |
//! | 2 | `paired_small_group` | [`Exclusivity::PairedSmallGroup`] |
//! | 3 | `head_to_head` | [`Exclusivity::HeadToHead`] |
//! | 4 | `staggered_start` | [`Exclusivity::StaggeredStart`] |
//! | 5 | `capacity_pools` | [`Exclusivity::CapacityPooled`] |
//! | 6 | `exclusive_areas` | [`Exclusivity::Exclusive`] |
//! | - | (unlisted) | [`Exclusivity::Solo`], or `Shared` when `exclusive_by_default` is off |
//!
//! The staffed-beach cap and explicit `conflicts_with` pairs apply on
//! top of whichever class matches.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use super::{Activity, Day, Troop};

/// How many troops may hold an activity in the same slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exclusivity<'a> {
    /// Unlimited.
    Shared,
    /// At most one troop doing this activity.
    Solo,
    /// At most one troop across all activities of `area`.
    Exclusive {
        area: &'a str,
        members: &'a [String],
    },
    /// Up to `max_troops` if every troop has at most `max_size` people,
    /// otherwise exclusive.
    PairedSmallGroup { max_troops: usize, max_size: u32 },
    /// Up to `max_troops` (troops play each other).
    HeadToHead { max_troops: usize },
    /// Exclusive per slot, except that two sessions on one day may
    /// overlap in a slot if their start slots differ.
    StaggeredStart,
    /// Total people across `members` in one slot stays within `capacity`.
    CapacityPooled {
        pool: &'a str,
        members: &'a [String],
        capacity: u32,
    },
}

/// Limits for a paired small-group activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairedLimit {
    /// Troops allowed to share a slot.
    pub max_troops: usize,
    /// Largest troop (scouts + adults) allowed to share.
    pub max_size: u32,
}

/// A set of activities sharing one people capacity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapacityPool {
    /// Activities drawing on the pool.
    pub activities: Vec<String>,
    /// Maximum people per slot.
    pub capacity: u32,
}

/// Duration override for large troops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeExtension {
    /// Troops with more scouts than this get the extended duration.
    pub scouts_over: u32,
    /// Slots booked when extended.
    pub slots: usize,
}

/// Activity groups a commissioner runs on a fixed day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DayGroup {
    Delta,
    SuperTroop,
    Archery,
    TowerOds,
}

/// The camp rule tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleTables {
    /// Activities any number of troops may do in one slot.
    pub shared_activities: BTreeSet<String>,
    /// Whether activities in no table are one troop per slot.
    pub exclusive_by_default: bool,
    /// Area name → activities; one troop per area per slot.
    pub exclusive_areas: BTreeMap<String, Vec<String>>,
    /// Activities two small troops may share.
    pub paired_small_group: BTreeMap<String, PairedLimit>,
    /// Activities several troops play against each other.
    pub head_to_head: BTreeMap<String, usize>,
    /// Activities whose sessions may overlap with staggered starts.
    pub staggered_start: BTreeSet<String>,
    /// Pool name → pooled activities and capacity.
    pub capacity_pools: BTreeMap<String, CapacityPool>,
    /// Activities needing beach staff.
    pub staffed_beach: BTreeSet<String>,
    /// Maximum staffed-beach activities per slot.
    pub max_staffed_beach_per_slot: usize,
    /// Waterfront activities that may not start in slot 2.
    pub beach_slot_activities: BTreeSet<String>,
    /// Day on which slot 2 is allowed for beach-slot activities.
    pub beach_slot_exception_day: Day,
    /// Activities that leave a troop wet.
    pub wet_activities: BTreeSet<String>,
    /// Tower and outdoor-skills activities (no wet neighbours).
    pub tower_ods_activities: BTreeSet<String>,
    /// Accuracy activities (at most one per day).
    pub accuracy_activities: BTreeSet<String>,
    /// Accuracy pair that may never share a day.
    pub accuracy_hard_pair: (String, String),
    /// Pairs a troop may not do on the same day.
    pub same_day_conflicts: Vec<(String, String)>,
    /// Size-dependent duration overrides.
    pub size_extended: BTreeMap<String, SizeExtension>,
    /// Activity → staff area, for load balancing.
    pub staff_zones: BTreeMap<String, String>,
    /// Activities cheap to move when making room.
    pub safe_swap_activities: BTreeSet<String>,
    /// Category → activities, for type clustering.
    pub activity_categories: BTreeMap<String, Vec<String>>,
    /// Commissioner → day each activity group runs.
    pub commissioner_days: BTreeMap<String, BTreeMap<DayGroup, Day>>,
    /// Activity every troop does together.
    pub communal_activity: String,
    /// Day of the communal activity.
    pub communal_day: Day,
    /// Once-a-week activity placed on the commissioner's day.
    pub weekly_exclusive: String,
    /// Fill order for empty slots.
    pub filler_activities: Vec<String>,
    /// Filler that may repeat within a week.
    pub repeatable_filler: String,
    /// Activities every troop must have.
    pub mandatory_activities: Vec<String>,
}

fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| (*s).to_string()).collect()
}

fn name_set(list: &[&str]) -> BTreeSet<String> {
    list.iter().map(|s| (*s).to_string()).collect()
}

impl Default for RuleTables {
    fn default() -> Self {
        let mut exclusive_areas = BTreeMap::new();
        exclusive_areas.insert(
            "Outdoor Skills".to_string(),
            names(&[
                "Knots and Lashings",
                "Orienteering",
                "GPS & Geocaching",
                "Ultimate Survivor",
                "What's Cooking",
                "Chopped!",
            ]),
        );
        exclusive_areas.insert("Tower".to_string(), names(&["Climbing Tower"]));
        exclusive_areas.insert(
            "Rifle Range".to_string(),
            names(&["Troop Rifle", "Troop Shotgun"]),
        );
        exclusive_areas.insert("Archery".to_string(), names(&["Archery"]));
        exclusive_areas.insert(
            "Handicrafts".to_string(),
            names(&[
                "Tie Dye",
                "Hemp Craft",
                "Woggle Neckerchief Slide",
                "Monkey's Fist",
            ]),
        );
        exclusive_areas.insert(
            "Nature Center".to_string(),
            names(&["Dr. DNA", "Loon Lore"]),
        );
        for single in [
            "Delta",
            "Super Troop",
            "Sailing",
            "Greased Watermelon",
            "Troop Swim",
            "Fishing",
            "History Center",
            "Trading Post",
            "Sauna",
            "Shower House",
            "Disc Golf",
            "Underwater Obstacle Course",
            "Troop Kayak",
        ] {
            exclusive_areas.insert(single.to_string(), names(&[single]));
        }

        let mut paired_small_group = BTreeMap::new();
        paired_small_group.insert(
            "Aqua Trampoline".to_string(),
            PairedLimit {
                max_troops: 2,
                max_size: 16,
            },
        );

        let mut head_to_head = BTreeMap::new();
        head_to_head.insert("Water Polo".to_string(), 2);

        let mut capacity_pools = BTreeMap::new();
        capacity_pools.insert(
            "Canoe".to_string(),
            CapacityPool {
                activities: names(&[
                    "Troop Canoe",
                    "Canoe Snorkel",
                    "Float for Floats",
                    "Nature Canoe",
                ]),
                capacity: 26,
            },
        );

        let beach_slot = [
            "Water Polo",
            "Greased Watermelon",
            "Aqua Trampoline",
            "Troop Swim",
            "Underwater Obstacle Course",
            "Troop Canoe",
            "Troop Kayak",
            "Canoe Snorkel",
            "Nature Canoe",
            "Float for Floats",
        ];
        let mut wet: Vec<&str> = beach_slot.to_vec();
        wet.extend(["Sailing", "Sauna"]);

        let mut size_extended = BTreeMap::new();
        size_extended.insert(
            "Climbing Tower".to_string(),
            SizeExtension {
                scouts_over: 15,
                slots: 2,
            },
        );

        let mut staff_zones = BTreeMap::new();
        for (zone, acts) in [
            ("Tower", &["Climbing Tower"][..]),
            ("Rifle", &["Troop Rifle", "Troop Shotgun"][..]),
            ("Archery", &["Archery"][..]),
            (
                "ODS",
                &[
                    "Knots and Lashings",
                    "Orienteering",
                    "GPS & Geocaching",
                    "Ultimate Survivor",
                    "What's Cooking",
                    "Chopped!",
                ][..],
            ),
            (
                "Handicrafts",
                &[
                    "Tie Dye",
                    "Hemp Craft",
                    "Woggle Neckerchief Slide",
                    "Monkey's Fist",
                ][..],
            ),
            (
                "Beach",
                &[
                    "Aqua Trampoline",
                    "Troop Canoe",
                    "Troop Kayak",
                    "Canoe Snorkel",
                    "Float for Floats",
                    "Greased Watermelon",
                    "Underwater Obstacle Course",
                    "Troop Swim",
                    "Water Polo",
                    "Nature Canoe",
                    "Sailing",
                ][..],
            ),
        ] {
            for act in acts {
                staff_zones.insert((*act).to_string(), zone.to_string());
            }
        }

        let mut activity_categories = BTreeMap::new();
        let mut water = names(&beach_slot);
        water.push("Sailing".to_string());
        activity_categories.insert("water".to_string(), water);
        activity_categories.insert(
            "tower".to_string(),
            names(&["Climbing Tower", "Knots and Lashings"]),
        );
        activity_categories.insert(
            "shooting".to_string(),
            names(&["Troop Rifle", "Troop Shotgun"]),
        );
        activity_categories.insert("archery".to_string(), names(&["Archery"]));
        activity_categories.insert(
            "crafts".to_string(),
            names(&[
                "Tie Dye",
                "Hemp Craft",
                "Woggle Neckerchief Slide",
                "Monkey's Fist",
            ]),
        );
        activity_categories.insert("nature".to_string(), names(&["Dr. DNA", "Fishing"]));
        activity_categories.insert(
            "outdoor".to_string(),
            names(&["Orienteering", "GPS & Geocaching", "Ultimate Survivor"]),
        );
        activity_categories.insert(
            "cooking".to_string(),
            names(&["What's Cooking", "Chopped!"]),
        );

        let mut commissioner_days = BTreeMap::new();
        for (name, delta, archery, tower_ods) in [
            ("Commissioner A", Day::Tuesday, Day::Wednesday, Day::Thursday),
            ("Commissioner B", Day::Wednesday, Day::Friday, Day::Monday),
            ("Commissioner C", Day::Thursday, Day::Monday, Day::Tuesday),
        ] {
            let mut days = BTreeMap::new();
            days.insert(DayGroup::Delta, delta);
            days.insert(DayGroup::SuperTroop, delta);
            days.insert(DayGroup::Archery, archery);
            days.insert(DayGroup::TowerOds, tower_ods);
            commissioner_days.insert(name.to_string(), days);
        }

        Self {
            shared_activities: name_set(&["Reflection", "Campsite Free Time"]),
            exclusive_by_default: true,
            exclusive_areas,
            paired_small_group,
            head_to_head,
            staggered_start: name_set(&["Sailing"]),
            capacity_pools,
            staffed_beach: name_set(&[
                "Aqua Trampoline",
                "Troop Canoe",
                "Troop Kayak",
                "Canoe Snorkel",
                "Float for Floats",
                "Greased Watermelon",
                "Underwater Obstacle Course",
                "Troop Swim",
                "Water Polo",
                "Nature Canoe",
                "Sailing",
            ]),
            max_staffed_beach_per_slot: 4,
            beach_slot_activities: name_set(&beach_slot),
            beach_slot_exception_day: Day::Thursday,
            wet_activities: name_set(&wet),
            tower_ods_activities: name_set(&[
                "Climbing Tower",
                "Knots and Lashings",
                "Orienteering",
                "GPS & Geocaching",
                "Ultimate Survivor",
                "What's Cooking",
                "Chopped!",
            ]),
            accuracy_activities: name_set(&["Archery", "Troop Rifle", "Troop Shotgun"]),
            accuracy_hard_pair: ("Troop Rifle".to_string(), "Troop Shotgun".to_string()),
            same_day_conflicts: [
                ("Trading Post", "Campsite Free Time"),
                ("Trading Post", "Shower House"),
                ("Aqua Trampoline", "Water Polo"),
                ("Aqua Trampoline", "Greased Watermelon"),
                ("Water Polo", "Greased Watermelon"),
                ("Troop Canoe", "Canoe Snorkel"),
                ("Troop Canoe", "Nature Canoe"),
                ("Troop Canoe", "Float for Floats"),
                ("Canoe Snorkel", "Nature Canoe"),
                ("Canoe Snorkel", "Float for Floats"),
                ("Nature Canoe", "Float for Floats"),
            ]
            .iter()
            .map(|(a, b)| ((*a).to_string(), (*b).to_string()))
            .collect(),
            size_extended,
            staff_zones,
            safe_swap_activities: name_set(&[
                "Gaga Ball",
                "9 Square",
                "Fishing",
                "Trading Post",
                "Campsite Free Time",
                "Dr. DNA",
                "Loon Lore",
            ]),
            activity_categories,
            commissioner_days,
            communal_activity: "Reflection".to_string(),
            communal_day: Day::Friday,
            weekly_exclusive: "Super Troop".to_string(),
            filler_activities: names(&[
                "Super Troop",
                "Aqua Trampoline",
                "Climbing Tower",
                "Archery",
                "Water Polo",
                "Troop Rifle",
                "Gaga Ball",
                "9 Square",
                "Troop Swim",
                "Sailing",
                "Trading Post",
                "GPS & Geocaching",
                "Disc Golf",
                "Hemp Craft",
                "Dr. DNA",
                "Loon Lore",
                "Fishing",
                "Campsite Free Time",
            ]),
            repeatable_filler: "Campsite Free Time".to_string(),
            mandatory_activities: names(&["Reflection", "Super Troop"]),
        }
    }
}

impl RuleTables {
    /// Creates the default camp tables.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates tables with no restrictions: everything shared, no
    /// sequencing rules, no commissioner days.
    pub fn permissive() -> Self {
        Self {
            shared_activities: BTreeSet::new(),
            exclusive_by_default: false,
            exclusive_areas: BTreeMap::new(),
            paired_small_group: BTreeMap::new(),
            head_to_head: BTreeMap::new(),
            staggered_start: BTreeSet::new(),
            capacity_pools: BTreeMap::new(),
            staffed_beach: BTreeSet::new(),
            max_staffed_beach_per_slot: usize::MAX,
            beach_slot_activities: BTreeSet::new(),
            beach_slot_exception_day: Day::Thursday,
            wet_activities: BTreeSet::new(),
            tower_ods_activities: BTreeSet::new(),
            accuracy_activities: BTreeSet::new(),
            accuracy_hard_pair: (String::new(), String::new()),
            same_day_conflicts: Vec::new(),
            size_extended: BTreeMap::new(),
            staff_zones: BTreeMap::new(),
            safe_swap_activities: BTreeSet::new(),
            activity_categories: BTreeMap::new(),
            commissioner_days: BTreeMap::new(),
            ..Self::default()
        }
    }

    /// Sets the per-slot staffed-beach cap.
    pub fn with_max_staffed_beach_per_slot(mut self, cap: usize) -> Self {
        self.max_staffed_beach_per_slot = cap;
        self
    }

    /// Sets the day on which beach-slot activities may use slot 2.
    pub fn with_beach_slot_exception_day(mut self, day: Day) -> Self {
        self.beach_slot_exception_day = day;
        self
    }

    /// Adds an exclusive area.
    pub fn with_exclusive_area<I, S>(mut self, area: impl Into<String>, activities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclusive_areas
            .insert(area.into(), activities.into_iter().map(Into::into).collect());
        self
    }

    /// Sets a commissioner's day for an activity group.
    pub fn with_commissioner_day(
        mut self,
        commissioner: impl Into<String>,
        group: DayGroup,
        day: Day,
    ) -> Self {
        self.commissioner_days
            .entry(commissioner.into())
            .or_default()
            .insert(group, day);
        self
    }

    /// Classifies `activity` for slot sharing.
    pub fn exclusivity(&self, activity: &str) -> Exclusivity<'_> {
        if self.shared_activities.contains(activity) {
            return Exclusivity::Shared;
        }
        if let Some(limit) = self.paired_small_group.get(activity) {
            return Exclusivity::PairedSmallGroup {
                max_troops: limit.max_troops,
                max_size: limit.max_size,
            };
        }
        if let Some(&max_troops) = self.head_to_head.get(activity) {
            return Exclusivity::HeadToHead { max_troops };
        }
        if self.staggered_start.contains(activity) {
            return Exclusivity::StaggeredStart;
        }
        if let Some((pool, p)) = self
            .capacity_pools
            .iter()
            .find(|(_, p)| p.activities.iter().any(|a| a == activity))
        {
            return Exclusivity::CapacityPooled {
                pool,
                members: &p.activities,
                capacity: p.capacity,
            };
        }
        match self.exclusive_area(activity) {
            Some((area, members)) => Exclusivity::Exclusive { area, members },
            None if self.exclusive_by_default => Exclusivity::Solo,
            None => Exclusivity::Shared,
        }
    }

    /// The exclusive area containing `activity`.
    pub fn exclusive_area(&self, activity: &str) -> Option<(&str, &[String])> {
        self.exclusive_areas
            .iter()
            .find(|(_, acts)| acts.iter().any(|a| a == activity))
            .map(|(area, acts)| (area.as_str(), acts.as_slice()))
    }

    /// Slots `activity` occupies for `troop`.
    pub fn effective_slots(&self, activity: &Activity, troop: &Troop) -> usize {
        match self.size_extended.get(&activity.name) {
            Some(ext) if troop.scouts > ext.scouts_over => ext.slots.max(activity.duration.slots()),
            _ => activity.duration.slots(),
        }
    }

    /// Whether `a` and `b` may not share a troop's day.
    pub fn same_day_conflict(&self, a: &str, b: &str) -> bool {
        self.same_day_conflicts
            .iter()
            .any(|(x, y)| (x == a && y == b) || (x == b && y == a))
    }

    /// Whether `a` and `b` are the accuracy pair that never shares a day.
    pub fn is_hard_accuracy_pair(&self, a: &str, b: &str) -> bool {
        let (x, y) = &self.accuracy_hard_pair;
        (x == a && y == b) || (x == b && y == a)
    }

    /// Whether the activity needs beach staff.
    pub fn is_staffed_beach(&self, activity: &str) -> bool {
        self.staffed_beach.contains(activity)
    }

    /// Whether the activity is barred from starting in slot 2.
    pub fn is_beach_slot(&self, activity: &str) -> bool {
        self.beach_slot_activities.contains(activity)
    }

    pub fn is_wet(&self, activity: &str) -> bool {
        self.wet_activities.contains(activity)
    }

    pub fn is_tower_ods(&self, activity: &str) -> bool {
        self.tower_ods_activities.contains(activity)
    }

    pub fn is_accuracy(&self, activity: &str) -> bool {
        self.accuracy_activities.contains(activity)
    }

    pub fn is_safe_swap(&self, activity: &str) -> bool {
        self.safe_swap_activities.contains(activity)
    }

    pub fn is_mandatory(&self, activity: &str) -> bool {
        self.mandatory_activities.iter().any(|a| a == activity)
    }

    /// Staff area used for load balancing.
    pub fn staff_zone(&self, activity: &str) -> Option<&str> {
        self.staff_zones.get(activity).map(String::as_str)
    }

    /// Type category for clustering.
    pub fn category_of(&self, activity: &str) -> Option<&str> {
        self.activity_categories
            .iter()
            .find(|(_, acts)| acts.iter().any(|a| a == activity))
            .map(|(cat, _)| cat.as_str())
    }

    /// Commissioner day-group of `activity`.
    pub fn day_group(&self, activity: &str) -> Option<DayGroup> {
        match activity {
            "Delta" => Some(DayGroup::Delta),
            "Archery" => Some(DayGroup::Archery),
            a if a == self.weekly_exclusive => Some(DayGroup::SuperTroop),
            a if self.is_tower_ods(a) => Some(DayGroup::TowerOds),
            _ => None,
        }
    }

    /// Day the commissioner runs `activity`, if mapped.
    pub fn commissioner_day(&self, commissioner: &str, activity: &str) -> Option<Day> {
        let group = self.day_group(activity)?;
        self.commissioner_days.get(commissioner)?.get(&group).copied()
    }

    /// All activity names the tables refer to.
    pub fn referenced_activities(&self) -> BTreeSet<&str> {
        let mut out: BTreeSet<&str> = BTreeSet::new();
        out.extend(self.shared_activities.iter().map(String::as_str));
        out.extend(self.exclusive_areas.values().flatten().map(String::as_str));
        out.extend(self.paired_small_group.keys().map(String::as_str));
        out.extend(self.head_to_head.keys().map(String::as_str));
        out.extend(self.staggered_start.iter().map(String::as_str));
        out.extend(
            self.capacity_pools
                .values()
                .flat_map(|p| p.activities.iter())
                .map(String::as_str),
        );
        out.extend(self.staffed_beach.iter().map(String::as_str));
        out.extend(self.filler_activities.iter().map(String::as_str));
        out.extend(self.mandatory_activities.iter().map(String::as_str));
        out.insert(self.communal_activity.as_str());
        out.insert(self.weekly_exclusive.as_str());
        out.insert(self.repeatable_filler.as_str());
        out.retain(|s| !s.is_empty());
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{SlotDuration, Zone};

    #[test]
    fn test_exclusivity_classes() {
        let rules = RuleTables::default();
        assert_eq!(rules.exclusivity("Reflection"), Exclusivity::Shared);
        assert_eq!(rules.exclusivity("Campsite Free Time"), Exclusivity::Shared);
        assert_eq!(rules.exclusivity("Gaga Ball"), Exclusivity::Solo);
        assert_eq!(rules.exclusivity("Itasca State Park"), Exclusivity::Solo);
        assert_eq!(
            rules.exclusivity("Aqua Trampoline"),
            Exclusivity::PairedSmallGroup {
                max_troops: 2,
                max_size: 16
            }
        );
        assert_eq!(
            rules.exclusivity("Water Polo"),
            Exclusivity::HeadToHead { max_troops: 2 }
        );
        assert_eq!(rules.exclusivity("Sailing"), Exclusivity::StaggeredStart);
        assert!(matches!(
            rules.exclusivity("Nature Canoe"),
            Exclusivity::CapacityPooled { capacity: 26, .. }
        ));
        assert!(matches!(
            rules.exclusivity("Troop Shotgun"),
            Exclusivity::Exclusive {
                area: "Rifle Range",
                ..
            }
        ));
    }

    #[test]
    fn test_unlisted_activity_exclusive_unless_disabled() {
        let rules = RuleTables::default();
        assert_eq!(rules.exclusivity("Basket Weaving"), Exclusivity::Solo);

        let open = RuleTables {
            exclusive_by_default: false,
            ..RuleTables::default()
        };
        assert_eq!(open.exclusivity("Basket Weaving"), Exclusivity::Shared);
        assert_eq!(open.exclusivity("Archery"), rules.exclusivity("Archery"));
    }

    #[test]
    fn test_effective_slots_for_large_troop() {
        let rules = RuleTables::default();
        let tower = Activity::new("Climbing Tower", Zone::Tower);
        assert_eq!(rules.effective_slots(&tower, &Troop::new("s").with_size(15, 2)), 1);
        assert_eq!(rules.effective_slots(&tower, &Troop::new("l").with_size(16, 2)), 2);

        let snorkel = Activity::new("Canoe Snorkel", Zone::Beach).with_duration(SlotDuration::Two);
        assert_eq!(rules.effective_slots(&snorkel, &Troop::new("s")), 2);
    }

    #[test]
    fn test_same_day_conflict_is_symmetric() {
        let rules = RuleTables::default();
        assert!(rules.same_day_conflict("Troop Canoe", "Nature Canoe"));
        assert!(rules.same_day_conflict("Nature Canoe", "Troop Canoe"));
        assert!(!rules.same_day_conflict("Troop Canoe", "Archery"));
        assert!(rules.is_hard_accuracy_pair("Troop Shotgun", "Troop Rifle"));
        assert!(!rules.is_hard_accuracy_pair("Archery", "Troop Rifle"));
    }

    #[test]
    fn test_commissioner_days() {
        let rules = RuleTables::default();
        assert_eq!(
            rules.commissioner_day("Commissioner A", "Delta"),
            Some(Day::Tuesday)
        );
        assert_eq!(
            rules.commissioner_day("Commissioner B", "Archery"),
            Some(Day::Friday)
        );
        assert_eq!(
            rules.commissioner_day("Commissioner C", "Orienteering"),
            Some(Day::Tuesday)
        );
        assert_eq!(
            rules.commissioner_day("Commissioner A", "Super Troop"),
            Some(Day::Tuesday)
        );
        assert_eq!(rules.commissioner_day("Commissioner A", "Gaga Ball"), None);
        assert_eq!(rules.commissioner_day("Nobody", "Delta"), None);
    }

    #[test]
    fn test_builders() {
        let rules = RuleTables::permissive()
            .with_exclusive_area("Range", ["A", "B"])
            .with_commissioner_day("X", DayGroup::Archery, Day::Monday)
            .with_max_staffed_beach_per_slot(2)
            .with_beach_slot_exception_day(Day::Friday);
        assert_eq!(rules.exclusive_area("B").map(|(a, _)| a), Some("Range"));
        assert_eq!(rules.commissioner_day("X", "Archery"), Some(Day::Monday));
        assert_eq!(rules.max_staffed_beach_per_slot, 2);
        assert_eq!(rules.beach_slot_exception_day, Day::Friday);
        assert_eq!(rules.exclusivity("Sailing"), Exclusivity::Shared);
    }

    #[test]
    fn test_serde_roundtrip_with_partial_input() {
        let rules = RuleTables::default();
        let json = serde_json::to_string(&rules).unwrap();
        let back: RuleTables = serde_json::from_str(&json).unwrap();
        assert_eq!(back, rules);

        let partial: RuleTables =
            serde_json::from_str(r#"{"max_staffed_beach_per_slot": 3}"#).unwrap();
        assert_eq!(partial.max_staffed_beach_per_slot, 3);
        assert_eq!(partial.communal_activity, "Reflection");
    }

    #[test]
    fn test_category_and_staff_zone() {
        let rules = RuleTables::default();
        assert_eq!(rules.category_of("Tie Dye"), Some("crafts"));
        assert_eq!(rules.category_of("Sailing"), Some("water"));
        assert_eq!(rules.staff_zone("Chopped!"), Some("ODS"));
        assert_eq!(rules.staff_zone("Gaga Ball"), None);
    }
}
