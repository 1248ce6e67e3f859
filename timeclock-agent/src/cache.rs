//! Typed view over the durable store: the single-slot session snapshot, the
//! cached employee identity, and the pending-sync queue.
//!
//! Pure storage; every policy decision (when to adopt, discard, or enqueue)
//! lives in `reconcile`, `sync` and `workday`.

use serde_json::Value;

use crate::error::StoreError;
use crate::session::{EmployeeIdentity, LocalSessionSnapshot, PendingSyncEntry};
use crate::store::KeyValueStore;

const EMPLOYEE_KEY: &str = "employee";
const SNAPSHOT_KEY: &str = "current_session";
const PENDING_KEY: &str = "pending_sync";

pub struct SessionCache<S> {
    store: S,
}

impl<S: KeyValueStore> SessionCache<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub async fn employee(&self) -> Result<Option<EmployeeIdentity>, StoreError> {
        decode(self.store.get(EMPLOYEE_KEY).await?)
    }

    pub async fn set_employee(&self, identity: &EmployeeIdentity) -> Result<(), StoreError> {
        self.store
            .set(EMPLOYEE_KEY, serde_json::to_value(identity)?)
            .await
    }

    pub async fn clear_employee(&self) -> Result<(), StoreError> {
        self.store.remove(EMPLOYEE_KEY).await
    }

    pub async fn snapshot(&self) -> Result<Option<LocalSessionSnapshot>, StoreError> {
        decode(self.store.get(SNAPSHOT_KEY).await?)
    }

    pub async fn put_snapshot(&self, snapshot: &LocalSessionSnapshot) -> Result<(), StoreError> {
        self.store
            .set(SNAPSHOT_KEY, serde_json::to_value(snapshot)?)
            .await
    }

    pub async fn clear_snapshot(&self) -> Result<(), StoreError> {
        self.store.remove(SNAPSHOT_KEY).await
    }

    /// Queue contents in enqueue (FIFO) order.
    pub async fn pending_entries(&self) -> Result<Vec<PendingSyncEntry>, StoreError> {
        Ok(decode(self.store.get(PENDING_KEY).await?)?.unwrap_or_default())
    }

    /// Appends an entry at the back of the queue.
    pub async fn enqueue_pending(&self, entry: &PendingSyncEntry) -> Result<(), StoreError> {
        let mut entries = self.pending_entries().await?;
        entries.push(entry.clone());
        self.write_pending(entries).await
    }

    /// Removes the first entry equal to `entry`. A no-op when absent.
    pub async fn remove_pending(&self, entry: &PendingSyncEntry) -> Result<(), StoreError> {
        let mut entries = self.pending_entries().await?;
        if let Some(pos) = entries.iter().position(|e| e == entry) {
            entries.remove(pos);
            self.write_pending(entries).await?;
        }
        Ok(())
    }

    /// Replaces the first entry equal to `old` with `new`, in place. Used by
    /// the sync engine to upgrade a placeholder ref to a confirmed id
    /// without losing the entry's queue position.
    pub async fn replace_pending(
        &self,
        old: &PendingSyncEntry,
        new: &PendingSyncEntry,
    ) -> Result<(), StoreError> {
        let mut entries = self.pending_entries().await?;
        if let Some(pos) = entries.iter().position(|e| e == old) {
            entries[pos] = new.clone();
            self.write_pending(entries).await?;
        }
        Ok(())
    }

    async fn write_pending(&self, entries: Vec<PendingSyncEntry>) -> Result<(), StoreError> {
        self.store
            .set(PENDING_KEY, serde_json::to_value(entries)?)
            .await
    }
}

fn decode<T: serde::de::DeserializeOwned>(value: Option<Value>) -> Result<Option<T>, StoreError> {
    match value {
        Some(value) => Ok(Some(serde_json::from_value(value)?)),
        None => Ok(None),
    }
}
