use std::collections::HashMap;

use crate::{EventId, EventRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// First observation of this fingerprint.
    Inserted,
    /// Already known; only `last_seen` was refreshed.
    Refreshed,
}

/// Deduplicating accumulator keyed by event fingerprint.
///
/// Records keep the order in which their fingerprint was first observed, so
/// a stable sort later on keeps ties in discovery order.
#[derive(Debug, Clone, Default)]
pub struct MergeStore {
    records: Vec<EventRecord>,
    index: HashMap<EventId, usize>,
}

impl MergeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts an unseen record, or refreshes `last_seen` of the stored one.
    /// All other fields of a stored record stay frozen at first observation.
    pub fn merge(&mut self, record: EventRecord) -> MergeOutcome {
        match self.index.get(record.id()) {
            Some(&slot) => {
                self.records[slot].touch(record.last_seen());
                MergeOutcome::Refreshed
            }
            None => {
                self.index.insert(record.id().clone(), self.records.len());
                self.records.push(record);
                MergeOutcome::Inserted
            }
        }
    }

    /// Seeds the store with records from a previous run. Ids are recomputed
    /// from the identity fields before merging.
    pub fn carry_forward(&mut self, records: impl IntoIterator<Item = EventRecord>) -> usize {
        let mut inserted = 0;
        for record in records {
            if self.merge(record.rekey()) == MergeOutcome::Inserted {
                inserted += 1;
            }
        }
        inserted
    }

    pub fn get(&self, id: &EventId) -> Option<&EventRecord> {
        self.index.get(id).map(|&slot| &self.records[slot])
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &EventRecord> {
        self.records.iter()
    }

    pub fn into_records(self) -> Vec<EventRecord> {
        self.records
    }
}
