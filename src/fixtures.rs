//! Shared test fixtures.

use std::sync::Arc;

use crate::models::{Activity, ActivityCatalog, Day, RuleTables, TimeSlot, Troop};

pub fn camp_rules() -> Arc<RuleTables> {
    Arc::new(RuleTables::default())
}

pub fn camp_catalog() -> ActivityCatalog {
    ActivityCatalog::camp_default()
}

pub fn slot(day: Day, n: u8) -> TimeSlot {
    TimeSlot::new(day, n).unwrap()
}

pub fn act(catalog: &ActivityCatalog, name: &str) -> Arc<Activity> {
    Arc::clone(catalog.get(name).unwrap())
}

pub fn troop(name: &str, scouts: u32, adults: u32) -> Arc<Troop> {
    Arc::new(Troop::new(name).with_size(scouts, adults))
}

/// A troop with a ranked preference list and commissioner.
pub fn troop_with_prefs(name: &str, commissioner: &str, prefs: &[&str]) -> Troop {
    Troop::new(name)
        .with_size(10, 2)
        .with_commissioner(commissioner)
        .with_preferences(prefs.iter().copied())
}

/// Three troops with realistic, overlapping preferences.
pub fn camp_troops() -> Vec<Troop> {
    vec![
        troop_with_prefs(
            "Troop 101",
            "Commissioner A",
            &[
                "Aqua Trampoline",
                "Climbing Tower",
                "Archery",
                "Sailing",
                "Troop Rifle",
                "Water Polo",
                "Tie Dye",
                "Gaga Ball",
                "GPS & Geocaching",
                "Delta",
                "Fishing",
                "Troop Swim",
                "Hemp Craft",
                "Dr. DNA",
                "Disc Golf",
            ],
        ),
        troop_with_prefs(
            "Troop 202",
            "Commissioner B",
            &[
                "Climbing Tower",
                "Troop Canoe",
                "Archery",
                "Itasca State Park",
                "Knots and Lashings",
                "Gaga Ball",
                "9 Square",
                "Loon Lore",
                "Delta",
                "Trading Post",
                "Orienteering",
                "Troop Shotgun",
                "Monkey's Fist",
            ],
        ),
        troop_with_prefs(
            "Troop 303",
            "Commissioner C",
            &[
                "Sailing",
                "Archery",
                "Aqua Trampoline",
                "Troop Swim",
                "Climbing Tower",
                "Delta",
                "Chopped!",
                "Fishing",
                "Tie Dye",
                "Water Polo",
                "Troop Kayak",
                "Ultimate Survivor",
            ],
        ),
    ]
}
