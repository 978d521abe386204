//! Schedule (solution) model.
//!
//! A schedule assigns activities to troops in the weekly slot grid. It
//! is stored as a dense arena of entries with two indices:
//!
//! - troop → one entry id per slot (occupancy, O(1) `is_troop_free`)
//! - slot → entry ids (everything happening in a slot)
//!
//! A multi-slot activity is a *span*: a start entry plus one
//! continuation entry per extra slot, all sharing the same `start`.
//! Spans are created and destroyed as a whole.
//!
//! # Invariants
//!
//! After every successful mutation:
//! - a troop holds at most one entry per slot;
//! - exclusive activities never exceed their sharing limit in a slot;
//! - spans never cross a day boundary;
//! - staffed-beach entries per slot stay within the cap.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::error;

use super::{Activity, Exclusivity, RuleTables, TimeSlot, Troop, SLOTS_PER_WEEK};
use crate::error::PlacementError;

/// Handle to an entry in a [`Schedule`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntryId(usize);

/// One troop doing one activity in one slot.
#[derive(Debug, Clone)]
pub struct ScheduleEntry {
    slot: TimeSlot,
    activity: Arc<Activity>,
    troop: Arc<Troop>,
    start: TimeSlot,
}

impl ScheduleEntry {
    /// Creates a start entry.
    pub fn new(slot: TimeSlot, activity: Arc<Activity>, troop: Arc<Troop>) -> Self {
        Self {
            slot,
            activity,
            troop,
            start: slot,
        }
    }

    fn continuation(slot: TimeSlot, start: &ScheduleEntry) -> Self {
        Self {
            slot,
            activity: Arc::clone(&start.activity),
            troop: Arc::clone(&start.troop),
            start: start.slot,
        }
    }

    #[inline]
    pub fn slot(&self) -> TimeSlot {
        self.slot
    }

    #[inline]
    pub fn activity(&self) -> &Arc<Activity> {
        &self.activity
    }

    #[inline]
    pub fn troop(&self) -> &Arc<Troop> {
        &self.troop
    }

    /// First slot of the span this entry belongs to.
    #[inline]
    pub fn start(&self) -> TimeSlot {
        self.start
    }

    /// Whether this entry begins its span.
    #[inline]
    pub fn is_start(&self) -> bool {
        self.slot == self.start
    }

    /// Activity name shortcut.
    #[inline]
    pub fn name(&self) -> &str {
        &self.activity.name
    }

    /// Placement describing this entry's span.
    pub fn placement(&self) -> Placement {
        Placement {
            troop: self.troop.name.clone(),
            slot: self.start,
            activity: self.activity.name.clone(),
        }
    }
}

/// A span start, as a plain serializable record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Placement {
    /// Troop name.
    pub troop: String,
    /// Start slot.
    pub slot: TimeSlot,
    /// Activity name.
    pub activity: String,
}

/// A weekly camp schedule.
#[derive(Debug, Clone)]
pub struct Schedule {
    rules: Arc<RuleTables>,
    entries: Vec<Option<ScheduleEntry>>,
    free: Vec<usize>,
    troops: Vec<Arc<Troop>>,
    troop_index: HashMap<String, usize>,
    occupancy: Vec<[Option<EntryId>; SLOTS_PER_WEEK]>,
    slot_entries: Vec<Vec<EntryId>>,
}

impl Schedule {
    /// Creates an empty schedule governed by `rules`.
    pub fn new(rules: Arc<RuleTables>) -> Self {
        Self {
            rules,
            entries: Vec::new(),
            free: Vec::new(),
            troops: Vec::new(),
            troop_index: HashMap::new(),
            occupancy: Vec::new(),
            slot_entries: vec![Vec::new(); SLOTS_PER_WEEK],
        }
    }

    /// Registers the troops to be scheduled.
    pub fn with_troops<I>(mut self, troops: I) -> Self
    where
        I: IntoIterator<Item = Arc<Troop>>,
    {
        for troop in troops {
            self.add_troop(troop);
        }
        self
    }

    /// Registers a troop; no-op if one with the same name exists.
    pub fn add_troop(&mut self, troop: Arc<Troop>) -> usize {
        if let Some(&idx) = self.troop_index.get(&troop.name) {
            return idx;
        }
        let idx = self.troops.len();
        self.troop_index.insert(troop.name.clone(), idx);
        self.troops.push(troop);
        self.occupancy.push([None; SLOTS_PER_WEEK]);
        idx
    }

    /// The rule tables in force.
    pub fn rules(&self) -> &Arc<RuleTables> {
        &self.rules
    }

    /// Registered troops in registration order.
    pub fn troops(&self) -> &[Arc<Troop>] {
        &self.troops
    }

    /// Looks up a registered troop by name.
    pub fn troop(&self, name: &str) -> Option<&Arc<Troop>> {
        self.troop_index.get(name).map(|&i| &self.troops[i])
    }

    /// Slots `activity` occupies for `troop`.
    pub fn effective_slots(&self, activity: &Activity, troop: &Troop) -> usize {
        self.rules.effective_slots(activity, troop)
    }

    // ---- queries ----

    /// Entry by id.
    pub fn get(&self, id: EntryId) -> Option<&ScheduleEntry> {
        self.entries.get(id.0).and_then(Option::as_ref)
    }

    /// Id of the troop's entry at `slot`.
    pub fn entry_id_at(&self, troop: &str, slot: TimeSlot) -> Option<EntryId> {
        let idx = *self.troop_index.get(troop)?;
        self.occupancy[idx][slot.index()]
    }

    /// The troop's entry at `slot` (start or continuation).
    pub fn entry_at(&self, troop: &str, slot: TimeSlot) -> Option<&ScheduleEntry> {
        self.entry_id_at(troop, slot).and_then(|id| self.get(id))
    }

    /// Whether the troop has nothing at `slot`, including continuations.
    pub fn is_troop_free(&self, slot: TimeSlot, troop: &str) -> bool {
        self.entry_id_at(troop, slot).is_none()
    }

    /// The troop's entries in slot order, continuations included.
    pub fn entries_for_troop<'a>(
        &'a self,
        troop: &str,
    ) -> impl Iterator<Item = &'a ScheduleEntry> + 'a {
        let row = self.troop_index.get(troop).map(|&i| &self.occupancy[i]);
        row.into_iter()
            .flat_map(|row| row.iter())
            .filter_map(move |id| id.and_then(|id| self.get(id)))
    }

    /// Every entry at `slot`.
    pub fn entries_in_slot(&self, slot: TimeSlot) -> impl Iterator<Item = &ScheduleEntry> {
        self.slot_entries[slot.index()]
            .iter()
            .filter_map(move |&id| self.get(id))
    }

    /// Every entry with its id.
    pub fn entries(&self) -> impl Iterator<Item = (EntryId, &ScheduleEntry)> {
        self.entries
            .iter()
            .enumerate()
            .filter_map(|(i, e)| e.as_ref().map(|e| (EntryId(i), e)))
    }

    /// Span starts with their ids.
    pub fn starts(&self) -> impl Iterator<Item = (EntryId, &ScheduleEntry)> {
        self.entries().filter(|(_, e)| e.is_start())
    }

    /// The troop's span starts in slot order.
    pub fn starts_for_troop(&self, troop: &str) -> Vec<(EntryId, &ScheduleEntry)> {
        let Some(&idx) = self.troop_index.get(troop) else {
            return Vec::new();
        };
        self.occupancy[idx]
            .iter()
            .flatten()
            .filter_map(|&id| self.get(id).map(|e| (id, e)))
            .filter(|(_, e)| e.is_start())
            .collect()
    }

    /// All span starts as sorted placements.
    pub fn placements(&self) -> Vec<Placement> {
        let mut out: Vec<Placement> = self.starts().map(|(_, e)| e.placement()).collect();
        out.sort();
        out
    }

    /// Whether the troop has `activity` anywhere this week.
    pub fn has_activity(&self, troop: &str, activity: &str) -> bool {
        self.entries_for_troop(troop).any(|e| e.name() == activity)
    }

    /// Number of span starts of `activity` for the troop.
    pub fn activity_count(&self, troop: &str, activity: &str) -> usize {
        self.starts_for_troop(troop)
            .iter()
            .filter(|(_, e)| e.name() == activity)
            .count()
    }

    /// Slots where the troop has nothing.
    pub fn free_slots(&self, troop: &str) -> Vec<TimeSlot> {
        TimeSlot::all()
            .filter(|&s| self.is_troop_free(s, troop))
            .collect()
    }

    /// Empty troop-slots across all registered troops.
    pub fn empty_slot_count(&self) -> usize {
        self.occupancy
            .iter()
            .map(|row| row.iter().filter(|id| id.is_none()).count())
            .sum()
    }

    /// Number of live entries, continuations included.
    pub fn len(&self) -> usize {
        self.entries.len() - self.free.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // ---- availability ----

    /// Whether `activity` can be held by `troop` at `slot`, considering
    /// only what other troops are doing there.
    pub fn is_activity_available(&self, slot: TimeSlot, activity: &Activity, troop: &Troop) -> bool {
        self.available_in(slot, slot, activity, troop)
    }

    /// Availability at `slot` for a span beginning at `start`.
    fn available_in(&self, slot: TimeSlot, start: TimeSlot, activity: &Activity, troop: &Troop) -> bool {
        let others: Vec<&ScheduleEntry> = self
            .entries_in_slot(slot)
            .filter(|e| e.troop.name != troop.name)
            .collect();

        let class_ok = match self.rules.exclusivity(&activity.name) {
            Exclusivity::Shared => true,
            Exclusivity::Solo => !others.iter().any(|e| e.activity.name == activity.name),
            Exclusivity::Exclusive { members, .. } => {
                !others.iter().any(|e| members.iter().any(|m| *m == e.activity.name))
            }
            Exclusivity::PairedSmallGroup {
                max_troops,
                max_size,
            } => {
                let holders: Vec<&&ScheduleEntry> =
                    others.iter().filter(|e| e.activity.name == activity.name).collect();
                holders.is_empty()
                    || (holders.len() < max_troops
                        && troop.size() <= max_size
                        && holders.iter().all(|e| e.troop.size() <= max_size))
            }
            Exclusivity::HeadToHead { max_troops } => {
                others
                    .iter()
                    .filter(|e| e.activity.name == activity.name)
                    .count()
                    < max_troops
            }
            Exclusivity::StaggeredStart => !others
                .iter()
                .any(|e| e.activity.name == activity.name && e.start == start),
            Exclusivity::CapacityPooled {
                members, capacity, ..
            } => {
                let people: u32 = others
                    .iter()
                    .filter(|e| members.iter().any(|m| *m == e.activity.name))
                    .map(|e| e.troop.size())
                    .sum();
                people + troop.size() <= capacity
            }
        };
        if !class_ok {
            return false;
        }

        if self.rules.is_staffed_beach(&activity.name) {
            let staffed = others
                .iter()
                .filter(|e| self.rules.is_staffed_beach(&e.activity.name))
                .count();
            if staffed >= self.rules.max_staffed_beach_per_slot {
                return false;
            }
        }

        !others
            .iter()
            .any(|e| activity.conflicts(&e.activity.name) || e.activity.conflicts(&activity.name))
    }

    // ---- mutation ----

    /// Places `activity` for `troop` starting at `slot`.
    ///
    /// Checks every slot the span will cover before writing anything.
    pub fn add_entry(
        &mut self,
        slot: TimeSlot,
        activity: &Arc<Activity>,
        troop: &Arc<Troop>,
    ) -> Result<EntryId, PlacementError> {
        let span = self.check_placement(slot, activity, troop)?;
        Ok(self.commit(&span, activity, troop))
    }

    /// Runs the occupancy checks of [`add_entry`](Self::add_entry)
    /// without writing, returning the slots the span would cover.
    pub fn check_placement(
        &self,
        slot: TimeSlot,
        activity: &Activity,
        troop: &Troop,
    ) -> Result<Vec<TimeSlot>, PlacementError> {
        let count = self.effective_slots(activity, troop);
        let span = slot
            .span(count)
            .ok_or_else(|| PlacementError::CrossesDayBoundary {
                activity: activity.name.clone(),
                slots: count,
                day: slot.day(),
            })?;

        for &s in &span {
            if !self.is_troop_free(s, &troop.name) {
                return Err(PlacementError::TroopBusy {
                    troop: troop.name.clone(),
                    slot: s,
                });
            }
        }
        for &s in &span {
            if !self.available_in(s, slot, activity, troop) {
                return Err(PlacementError::ActivityUnavailable {
                    activity: activity.name.clone(),
                    slot: s,
                });
            }
        }
        Ok(span)
    }

    /// Places a span without checking availability.
    ///
    /// Only for restoring a span that was just removed from `slot`, its
    /// start. Fails if the span no longer fits the troop's week.
    pub(crate) fn reinsert(
        &mut self,
        slot: TimeSlot,
        activity: &Arc<Activity>,
        troop: &Arc<Troop>,
    ) -> Result<EntryId, PlacementError> {
        let count = self.effective_slots(activity, troop);
        let span = slot
            .span(count)
            .ok_or_else(|| PlacementError::CrossesDayBoundary {
                activity: activity.name.clone(),
                slots: count,
                day: slot.day(),
            })?;
        if let Some(&busy) = span.iter().find(|&&s| !self.is_troop_free(s, &troop.name)) {
            return Err(PlacementError::TroopBusy {
                troop: troop.name.clone(),
                slot: busy,
            });
        }
        Ok(self.commit(&span, activity, troop))
    }

    /// Puts back a span taken out during a trial change.
    ///
    /// The troop's slots must still be free; a failure here means the
    /// caller lost track of what it removed.
    pub(crate) fn restore(&mut self, slot: TimeSlot, activity: &Arc<Activity>, troop: &Arc<Troop>) {
        if let Err(err) = self.reinsert(slot, activity, troop) {
            error!(troop = %troop.name, activity = %activity.name, %slot, %err, "span lost on restore");
            debug_assert!(false, "{} lost {} at {slot}: {err}", troop.name, activity.name);
        }
    }

    fn commit(&mut self, span: &[TimeSlot], activity: &Arc<Activity>, troop: &Arc<Troop>) -> EntryId {
        let troop_idx = self.add_troop(Arc::clone(troop));
        let head = ScheduleEntry::new(span[0], Arc::clone(activity), Arc::clone(troop));
        let mut pending = Vec::with_capacity(span.len());
        for &s in &span[1..] {
            pending.push(ScheduleEntry::continuation(s, &head));
        }
        let head_id = self.alloc(head, troop_idx);
        for entry in pending {
            self.alloc(entry, troop_idx);
        }
        head_id
    }

    fn alloc(&mut self, entry: ScheduleEntry, troop_idx: usize) -> EntryId {
        let slot_index = entry.slot.index();
        let id = match self.free.pop() {
            Some(i) => {
                self.entries[i] = Some(entry);
                EntryId(i)
            }
            None => {
                self.entries.push(Some(entry));
                EntryId(self.entries.len() - 1)
            }
        };
        self.occupancy[troop_idx][slot_index] = Some(id);
        self.slot_entries[slot_index].push(id);
        id
    }

    /// Removes the whole span `id` belongs to.
    pub fn remove_entry(&mut self, id: EntryId) -> Option<Placement> {
        let entry = self.get(id)?;
        let troop = entry.troop.name.clone();
        let start = entry.start;
        let placement = entry.placement();
        let troop_idx = *self.troop_index.get(&troop)?;

        let mut cursor = Some(start);
        while let Some(s) = cursor {
            let Some(eid) = self.occupancy[troop_idx][s.index()] else {
                break;
            };
            if self.get(eid).map(|e| e.start) != Some(start) {
                break;
            }
            self.occupancy[troop_idx][s.index()] = None;
            self.slot_entries[s.index()].retain(|&x| x != eid);
            self.entries[eid.0] = None;
            self.free.push(eid.0);
            cursor = s.next_in_day();
        }
        Some(placement)
    }

    /// Removes the troop's span covering `slot`.
    pub fn remove_at(&mut self, troop: &str, slot: TimeSlot) -> Option<Placement> {
        let id = self.entry_id_at(troop, slot)?;
        self.remove_entry(id)
    }
}
