//! Client-local vote guard
//!
//! Remembers which polls were voted on from this client so the UI can lock
//! them. This is UX state only: it is not authoritative, anyone can clear it,
//! and the API performs no matching deduplication.

use crate::id::RecordId;
use crate::store::{LocalStore, StoreResult};

#[derive(Debug, Clone)]
pub struct VoteGuard {
    store: LocalStore,
}

impl VoteGuard {
    pub fn new(store: LocalStore) -> Self {
        Self { store }
    }

    pub fn has_voted(&self, poll_id: &RecordId) -> StoreResult<bool> {
        self.store.has_voted(poll_id.as_str())
    }

    /// Returns false when the poll was already recorded
    pub fn record(&self, poll_id: &RecordId) -> StoreResult<bool> {
        self.store.record_vote(poll_id.as_str())
    }

    pub fn voted(&self) -> StoreResult<Vec<String>> {
        self.store.voted_polls()
    }
}
