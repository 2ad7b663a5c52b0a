//! In-memory `DocumentStore` with snapshot-based live listeners.
//!
//! Every mutation re-broadcasts the full matching result set to each
//! registered listener, mirroring the snapshot (not diff) contract of the
//! real backend. Listener registration is keyed; the guard handed to the
//! subscriber removes the key on drop.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::mpsc;
use tracing::debug;
use uuid::Uuid;

use domains::{
    AppError, DocumentFields, DocumentSnapshot, DocumentStore, DocumentSubscription, EqFilter,
    ListenerGuard, Result,
};

struct ListenerEntry {
    filter: Option<EqFilter>,
    tx: mpsc::UnboundedSender<Result<DocumentSnapshot>>,
}

pub struct MemoryDocumentStore {
    /// Collection label, used only for logging.
    name: String,
    docs: DashMap<String, DocumentFields>,
    listeners: Arc<DashMap<u64, ListenerEntry>>,
    next_listener_id: AtomicU64,
    /// Single-shot write-failure injection for tests.
    fail_next_write: Mutex<Option<String>>,
}

impl MemoryDocumentStore {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            docs: DashMap::new(),
            listeners: Arc::new(DashMap::new()),
            next_listener_id: AtomicU64::new(0),
            fail_next_write: Mutex::new(None),
        }
    }

    /// Makes the next mutating call fail with a write error carrying `msg`.
    pub fn fail_next_write(&self, msg: impl Into<String>) {
        *self.fail_next_write.lock().expect("injection lock poisoned") = Some(msg.into());
    }

    /// Number of currently attached listeners.
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    pub fn document_count(&self) -> usize {
        self.docs.len()
    }

    fn take_injected_failure(&self) -> Result<()> {
        match self.fail_next_write.lock().expect("injection lock poisoned").take() {
            Some(msg) => Err(AppError::Write(msg)),
            None => Ok(()),
        }
    }

    fn matching(&self, filter: Option<&EqFilter>) -> DocumentSnapshot {
        self.docs
            .iter()
            .filter(|entry| filter.map_or(true, |f| f.matches(entry.value())))
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect()
    }

    fn broadcast(&self) {
        for entry in self.listeners.iter() {
            let snapshot = self.matching(entry.value().filter.as_ref());
            // A closed receiver just means the guard has not run yet; the
            // registry entry goes away with it.
            let _ = entry.value().tx.send(Ok(snapshot));
        }
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn insert(&self, doc: DocumentFields) -> Result<String> {
        self.take_injected_failure()?;
        let id = Uuid::new_v4().to_string();
        self.docs.insert(id.clone(), doc);
        debug!(collection = %self.name, %id, "document inserted");
        self.broadcast();
        Ok(id)
    }

    async fn set(&self, id: &str, doc: DocumentFields) -> Result<()> {
        self.take_injected_failure()?;
        self.docs.insert(id.to_string(), doc);
        debug!(collection = %self.name, %id, "document set");
        self.broadcast();
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<DocumentFields>> {
        Ok(self.docs.get(id).map(|entry| entry.value().clone()))
    }

    async fn update_fields(&self, id: &str, fields: DocumentFields) -> Result<()> {
        self.take_injected_failure()?;
        match self.docs.get_mut(id) {
            Some(mut entry) => {
                for (name, value) in fields {
                    entry.value_mut().insert(name, value);
                }
            }
            None => return Err(AppError::Write(format!("no document to update at {id}"))),
        }
        debug!(collection = %self.name, %id, "document patched");
        self.broadcast();
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.take_injected_failure()?;
        // Deleting a missing id is a no-op, as in the real store.
        self.docs.remove(id);
        debug!(collection = %self.name, %id, "document deleted");
        self.broadcast();
        Ok(())
    }

    fn subscribe(&self, filter: Option<EqFilter>) -> Result<DocumentSubscription> {
        let (tx, rx) = mpsc::unbounded_channel();
        let initial = self.matching(filter.as_ref());
        let _ = tx.send(Ok(initial));

        let listener_id = self.next_listener_id.fetch_add(1, Ordering::Relaxed);
        self.listeners.insert(listener_id, ListenerEntry { filter, tx });

        let registry = Arc::clone(&self.listeners);
        let guard = ListenerGuard::new(move || {
            registry.remove(&listener_id);
        });
        debug!(collection = %self.name, listener_id, "listener attached");
        Ok(DocumentSubscription::new(rx, guard))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: serde_json::Value) -> DocumentFields {
        value.as_object().cloned().expect("object")
    }

    #[tokio::test]
    async fn subscribe_emits_the_initial_snapshot_immediately() {
        let store = MemoryDocumentStore::new("lost-items");
        store.set("a", doc(json!({"state": "Wisconsin"}))).await.unwrap();

        let mut sub = store.subscribe(None).unwrap();
        let snapshot = sub.recv().await.unwrap().unwrap();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].0, "a");
    }

    #[tokio::test]
    async fn mutations_rebroadcast_filtered_snapshots() {
        let store = MemoryDocumentStore::new("lost-items");
        let mut sub = store
            .subscribe(Some(EqFilter::new("state", "Wisconsin")))
            .unwrap();
        assert!(sub.recv().await.unwrap().unwrap().is_empty());

        store.set("wi", doc(json!({"state": "Wisconsin"}))).await.unwrap();
        store.set("il", doc(json!({"state": "Illinois"}))).await.unwrap();

        let after_first = sub.recv().await.unwrap().unwrap();
        assert_eq!(after_first.len(), 1);
        let after_second = sub.recv().await.unwrap().unwrap();
        assert_eq!(after_second.len(), 1);
        assert_eq!(after_second[0].0, "wi");
    }

    #[tokio::test]
    async fn dropping_the_subscription_detaches_the_listener() {
        let store = MemoryDocumentStore::new("lost-items");
        let sub = store.subscribe(None).unwrap();
        assert_eq!(store.listener_count(), 1);
        drop(sub);
        assert_eq!(store.listener_count(), 0);
    }

    #[tokio::test]
    async fn update_fields_patches_without_clobbering() {
        let store = MemoryDocumentStore::new("lost-items");
        store
            .set("a", doc(json!({"itemName": "Keys", "status": "Lost"})))
            .await
            .unwrap();
        store
            .update_fields("a", doc(json!({"status": "Found"})))
            .await
            .unwrap();

        let stored = store.get("a").await.unwrap().unwrap();
        assert_eq!(stored["itemName"], json!("Keys"));
        assert_eq!(stored["status"], json!("Found"));
    }

    #[tokio::test]
    async fn update_of_a_missing_document_is_a_write_error() {
        let store = MemoryDocumentStore::new("lost-items");
        let err = store.update_fields("ghost", DocumentFields::new()).await.unwrap_err();
        assert!(matches!(err, AppError::Write(_)));
    }

    #[tokio::test]
    async fn injected_failure_applies_to_exactly_one_write() {
        let store = MemoryDocumentStore::new("lost-items");
        store.fail_next_write("simulated outage");
        let err = store.set("a", DocumentFields::new()).await.unwrap_err();
        assert!(matches!(err, AppError::Write(msg) if msg == "simulated outage"));
        store.set("a", DocumentFields::new()).await.unwrap();
    }
}
