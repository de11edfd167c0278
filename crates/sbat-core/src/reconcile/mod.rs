//! Change detection
//!
//! Compares one fetch cycle's results against cumulative and previous-cycle
//! state to compute which slots are genuinely new. Two gates guard against
//! duplicate alerts:
//!
//! 1. A center is reported only if it has at least one (center, date) key
//!    never seen before in this poll session.
//! 2. The cycle is reported only if its key set differs from the previous
//!    cycle's.
//!
//! "New relative to all history" and "new relative to last cycle" are
//! different conditions; both must hold for a notification to fire.
//!
//! The caller only reconciles clean cycles. A cycle with any failed partition
//! must leave the state untouched so the next cycle re-attempts with the same
//! baseline, and no false "nothing new" conclusion is drawn from partial data.

use std::collections::{HashMap, HashSet};

use crate::types::{Center, Slot, SlotKey};

/// Per-session observation state
///
/// `all_seen` is monotonic for the lifetime of a poll session; `previous_cycle`
/// is replaced wholesale after every clean cycle. Both reset to empty when the
/// operator starts a new session.
#[derive(Debug, Clone, Default)]
pub struct ObservationState {
    all_seen: HashSet<SlotKey>,
    previous_cycle: HashSet<SlotKey>,
}

impl ObservationState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct (center, date) keys observed this session
    pub fn seen_count(&self) -> usize {
        self.all_seen.len()
    }

    pub fn all_seen(&self) -> &HashSet<SlotKey> {
        &self.all_seen
    }

    pub fn previous_cycle(&self) -> &HashSet<SlotKey> {
        &self.previous_cycle
    }
}

/// Reconcile one clean fetch cycle against the observation state.
///
/// Returns the centers with genuinely new slots, carrying the full slot
/// records so callers can pass fields through to the notification payload.
/// Updates `state` unconditionally (a clean cycle always becomes the new
/// baseline, news or not). Slots without a usable date are excluded from key
/// computation but do not invalidate the rest of the cycle.
pub fn reconcile(
    cycle: &HashMap<Center, Vec<Slot>>,
    state: &mut ObservationState,
) -> HashMap<Center, Vec<Slot>> {
    let mut current_run_keys: HashSet<SlotKey> = HashSet::new();
    let mut first_time_centers: HashMap<Center, Vec<Slot>> = HashMap::new();

    for (center, slots) in cycle {
        let center_keys: HashSet<SlotKey> = slots
            .iter()
            .filter_map(|slot| slot.date())
            .map(|date| SlotKey::new(center.name.clone(), date))
            .collect();

        if center_keys.iter().any(|key| !state.all_seen.contains(key)) {
            first_time_centers.insert(center.clone(), slots.clone());
        }

        current_run_keys.extend(center_keys);
    }

    let changed_since_last_cycle = !current_run_keys.is_subset(&state.previous_cycle);

    let newly_reported = if changed_since_last_cycle {
        first_time_centers
    } else {
        HashMap::new()
    };

    state.all_seen.extend(current_run_keys.iter().cloned());
    state.previous_cycle = current_run_keys;

    newly_reported
}
