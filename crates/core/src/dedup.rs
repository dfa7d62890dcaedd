use crate::domain::GroupId;
use crate::errors::StoreError;
use crate::ports::RecordStore;
use std::collections::HashSet;
use tracing::debug;

/// Two-tier "already imported" check for one run: the identifiers persisted in the
/// store (fetched once, on first use) plus the identifiers emitted earlier in the run.
pub struct Deduplicator<'a> {
    store: &'a dyn RecordStore,
    known: Option<HashSet<GroupId>>,
    seen: HashSet<GroupId>,
}

impl<'a> Deduplicator<'a> {
    pub fn new(store: &'a dyn RecordStore) -> Self {
        Self {
            store,
            known: None,
            seen: HashSet::new(),
        }
    }

    /// Identifiers already in the store; queried once per run, then cached
    pub fn known_ids(&mut self) -> Result<&HashSet<GroupId>, StoreError> {
        if self.known.is_none() {
            let ids = self.store.list_known_identifiers()?;
            debug!(count = ids.len(), "loaded known group identifiers");
            self.known = Some(ids);
        }
        Ok(self.known.get_or_insert_with(HashSet::new))
    }

    pub fn is_duplicate(&mut self, id: &GroupId) -> Result<bool, StoreError> {
        if self.seen.contains(id) {
            return Ok(true);
        }
        Ok(self.known_ids()?.contains(id))
    }

    pub fn mark_seen(&mut self, id: GroupId) {
        self.seen.insert(id);
    }

    /// Number of identifiers marked during this run
    pub fn seen_this_run(&self) -> usize {
        self.seen.len()
    }
}
