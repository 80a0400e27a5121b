//! Per-session memo cache keyed by raw node identity.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use crate::error::Result;
use crate::node::{NodeId, SharedNode};

#[derive(Clone)]
pub(crate) enum MemoEntry {
    /// Resolution started; every requester awaits the same future.
    InFlight(SharedNode),
    /// Final outcome, failures included.
    Ready(Result<NodeId>),
}

/// Compute-if-absent table of resolutions.
///
/// The entry is inserted under the lock before the computation is first
/// polled, so concurrent requesters observe it as in flight.
#[derive(Default)]
pub(crate) struct MemoCache {
    entries: Mutex<HashMap<NodeId, MemoEntry>>,
}

impl MemoCache {
    /// Return the entry for `id`, creating it with `start` if absent.
    /// The flag is true when this call created it.
    pub(crate) fn get_or_start(
        &self,
        id: NodeId,
        start: impl FnOnce() -> MemoEntry,
    ) -> (MemoEntry, bool) {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(entry) = entries.get(&id) {
            return (entry.clone(), false);
        }
        let entry = start();
        entries.insert(id, entry.clone());
        (entry, true)
    }

    pub(crate) fn settle(&self, id: NodeId, result: Result<NodeId>) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, MemoEntry::Ready(result));
    }

    pub(crate) fn contains(&self, id: NodeId) -> bool {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&id)
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}
