//! Queue entry store
//!
//! The store is the single source of truth for every entry ever created and
//! not yet removed. It remembers insertion order so that entries sharing a
//! check-in instant still rank deterministically.

use crate::types::{CustomerId, QueueEntry, QueueStatus};
use std::collections::HashMap;

#[derive(Debug, Clone)]
struct Slot {
    sequence: u64,
    entry: QueueEntry,
}

/// Mapping from customer id to entry, plus insertion order
#[derive(Debug, Default, Clone)]
pub struct EntryStore {
    slots: HashMap<CustomerId, Slot>,
    next_sequence: u64,
}

impl EntryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an entry under its own id, returning any entry it replaced
    pub fn insert(&mut self, entry: QueueEntry) -> Option<QueueEntry> {
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        self.slots
            .insert(entry.id, Slot { sequence, entry })
            .map(|slot| slot.entry)
    }

    pub fn get(&self, id: &CustomerId) -> Option<&QueueEntry> {
        self.slots.get(id).map(|slot| &slot.entry)
    }

    pub fn get_mut(&mut self, id: &CustomerId) -> Option<&mut QueueEntry> {
        self.slots.get_mut(id).map(|slot| &mut slot.entry)
    }

    pub fn remove(&mut self, id: &CustomerId) -> Option<QueueEntry> {
        self.slots.remove(id).map(|slot| slot.entry)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// All entries, in no particular order
    pub fn iter(&self) -> impl Iterator<Item = &QueueEntry> {
        self.slots.values().map(|slot| &slot.entry)
    }

    /// All entries in the order they were inserted
    pub fn entries_in_insertion_order(&self) -> Vec<&QueueEntry> {
        let mut slots: Vec<&Slot> = self.slots.values().collect();
        slots.sort_by_key(|slot| slot.sequence);
        slots.into_iter().map(|slot| &slot.entry).collect()
    }

    pub fn count_with_status(&self, status: QueueStatus) -> usize {
        self.iter().filter(|entry| entry.status == status).count()
    }

    /// Ids of waiting entries ordered by check-in time, ties broken by
    /// insertion order
    pub fn waiting_in_queue_order(&self) -> Vec<CustomerId> {
        let mut waiting: Vec<&Slot> = self
            .slots
            .values()
            .filter(|slot| slot.entry.is_waiting())
            .collect();
        waiting.sort_by(|a, b| {
            a.entry
                .check_in_time
                .cmp(&b.entry.check_in_time)
                .then(a.sequence.cmp(&b.sequence))
        });
        waiting.into_iter().map(|slot| slot.entry.id).collect()
    }

    /// Find the first entry filed under a key that differs from its own id
    pub fn find_misfiled(&self) -> Option<(CustomerId, CustomerId)> {
        self.slots
            .iter()
            .find(|(key, slot)| **key != slot.entry.id)
            .map(|(key, slot)| (*key, slot.entry.id))
    }

    #[cfg(test)]
    pub(crate) fn insert_under_key(&mut self, key: CustomerId, entry: QueueEntry) {
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        self.slots.insert(key, Slot { sequence, entry });
    }
}
