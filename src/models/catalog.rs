//! Activity catalog.
//!
//! Name-keyed lookup of every activity offered, with the built-in camp
//! program available through [`ActivityCatalog::camp_default`].

use std::collections::BTreeMap;
use std::sync::Arc;

use super::{Activity, SlotDuration, Zone};

/// All activities offered at camp, keyed by name.
#[derive(Debug, Clone, Default)]
pub struct ActivityCatalog {
    activities: BTreeMap<String, Arc<Activity>>,
}

impl ActivityCatalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an activity, replacing any with the same name.
    pub fn with_activity(mut self, activity: Activity) -> Self {
        self.insert(activity);
        self
    }

    /// Adds an activity, returning the one it replaced.
    pub fn insert(&mut self, activity: Activity) -> Option<Arc<Activity>> {
        self.activities
            .insert(activity.name.clone(), Arc::new(activity))
    }

    /// Looks up an activity by name.
    pub fn get(&self, name: &str) -> Option<&Arc<Activity>> {
        self.activities.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.activities.contains_key(name)
    }

    /// Activities in name order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Activity>> {
        self.activities.values()
    }

    pub fn len(&self) -> usize {
        self.activities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.activities.is_empty()
    }

    /// The standard camp program.
    pub fn camp_default() -> Self {
        use SlotDuration::{OneAndHalf, Three, Two};
        use Zone::{Beach, Campsite, Delta, OffCamp, OutdoorSkills, Tower};

        const BEACH_STAFF: &str = "Beach Staff";
        const NATURE: &str = "Nature Director";
        const CRAFTS: &str = "Handicrafts Director";
        const SHOOTING: &str = "Shooting Sports Director";
        const ODS: &str = "Outdoor Skills Director";
        const COMMISSIONER: &str = "Commissioner";

        let mut catalog = Self::new();
        for name in [
            "9 Square",
            "Gaga Ball",
            "Fishing",
            "Sauna",
            "Shower House",
            "Trading Post",
        ] {
            catalog.insert(Activity::new(name, Beach));
        }
        for name in [
            "Aqua Trampoline",
            "Troop Canoe",
            "Troop Kayak",
            "Greased Watermelon",
            "Water Polo",
        ] {
            catalog.insert(Activity::new(name, Beach).with_staff(BEACH_STAFF));
        }
        for name in ["Canoe Snorkel", "Float for Floats"] {
            catalog.insert(
                Activity::new(name, Beach)
                    .with_duration(Two)
                    .with_staff(BEACH_STAFF),
            );
        }
        catalog.insert(
            Activity::new("Underwater Obstacle Course", Beach)
                .with_staff(BEACH_STAFF)
                .with_conflict("Troop Swim"),
        );
        catalog.insert(
            Activity::new("Troop Swim", Beach)
                .with_staff(BEACH_STAFF)
                .with_conflict("Underwater Obstacle Course"),
        );
        catalog.insert(
            Activity::new("Sailing", Beach)
                .with_duration(OneAndHalf)
                .with_staff("Boats Director"),
        );
        for name in [
            "Nature Canoe",
            "Dr. DNA",
            "Loon Lore",
            "Ecosystem in a Jar",
            "Nature Salad",
            "Nature Bingo",
        ] {
            catalog.insert(Activity::new(name, Beach).with_staff(NATURE));
        }
        for name in [
            "Hemp Craft",
            "Monkey's Fist",
            "Tie Dye",
            "Woggle Neckerchief Slide",
        ] {
            catalog.insert(Activity::new(name, Beach).with_staff(CRAFTS));
        }
        catalog.insert(Activity::new("Archery", Beach).with_staff(COMMISSIONER));
        catalog.insert(
            Activity::new("Troop Rifle", Beach)
                .with_staff(SHOOTING)
                .with_conflict("Troop Shotgun"),
        );
        catalog.insert(
            Activity::new("Troop Shotgun", Beach)
                .with_staff(SHOOTING)
                .with_conflict("Troop Rifle"),
        );
        catalog.insert(Activity::new("Climbing Tower", Tower).with_staff("Climbing Tower Director"));
        for name in [
            "Chopped!",
            "GPS & Geocaching",
            "Knots and Lashings",
            "Orienteering",
            "Ultimate Survivor",
            "What's Cooking",
        ] {
            catalog.insert(Activity::new(name, OutdoorSkills).with_staff(ODS));
        }
        catalog.insert(Activity::new("Delta", Delta).with_staff(COMMISSIONER));
        catalog.insert(Activity::new("Super Troop", Beach).with_staff(COMMISSIONER));
        catalog.insert(
            Activity::new("Back of the Moon", OffCamp)
                .with_duration(Three)
                .with_staff("Staff"),
        );
        for name in ["Itasca State Park", "Tamarac Wildlife Refuge"] {
            catalog.insert(Activity::new(name, OffCamp).with_duration(Three));
        }
        catalog.insert(Activity::new("Disc Golf", OffCamp));
        catalog.insert(Activity::new("History Center", OffCamp));
        catalog.insert(Activity::new("Campsite Free Time", Campsite));
        catalog.insert(Activity::new("Reflection", Campsite).with_staff(COMMISSIONER));
        catalog
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_camp_default_catalog() {
        let catalog = ActivityCatalog::camp_default();
        assert_eq!(catalog.len(), 45);

        let sailing = catalog.get("Sailing").unwrap();
        assert_eq!(sailing.duration, SlotDuration::OneAndHalf);
        assert_eq!(sailing.staff.as_deref(), Some("Boats Director"));

        let itasca = catalog.get("Itasca State Park").unwrap();
        assert_eq!(itasca.duration, SlotDuration::Three);
        assert_eq!(itasca.zone, Zone::OffCamp);
        assert!(!itasca.is_staffed());

        assert!(catalog.get("Troop Rifle").unwrap().conflicts("Troop Shotgun"));
        assert_eq!(catalog.get("Reflection").unwrap().zone, Zone::Campsite);
        assert!(catalog.get("Basket Weaving").is_none());
    }

    #[test]
    fn test_insert_replaces_by_name() {
        let mut catalog = ActivityCatalog::new().with_activity(Activity::new("A", Zone::Beach));
        let old = catalog.insert(Activity::new("A", Zone::Tower));
        assert_eq!(old.map(|a| a.zone), Some(Zone::Beach));
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.get("A").unwrap().zone, Zone::Tower);
    }

    #[test]
    fn test_every_rule_activity_is_in_catalog() {
        let catalog = ActivityCatalog::camp_default();
        let rules = crate::models::RuleTables::default();
        for name in rules.referenced_activities() {
            assert!(catalog.contains(name), "missing {name}");
        }
    }
}
