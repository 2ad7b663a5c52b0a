//! # Lost-Item Repository
//!
//! Stateless façade over the Document Store: CRUD plus live query
//! subscriptions for lost-item records, scoped by equality predicates
//! (state, owner) or by document id. The store applies its own security
//! rules server-side; this component only stamps `ownerId` on create.

use std::cmp::Ordering;
use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;
use tokio::sync::oneshot;
use tracing::{debug, warn};
use uuid::Uuid;

use domains::{
    field, AppError, AuthGateway, DocumentFields, DocumentSnapshot, DocumentStore, DocumentSubscription,
    EqFilter, ItemStatus, LostItemRecord, NewLostItem, PostedDate, Result,
};

/// Live sequence of full lost-item snapshots, newest first. Malformed
/// documents are dropped per-emission; dropping the subscription detaches
/// the store-side listener.
#[derive(Debug)]
pub struct ItemSubscription {
    inner: DocumentSubscription,
}

impl ItemSubscription {
    pub async fn recv(&mut self) -> Option<Result<Vec<LostItemRecord>>> {
        let event = self.inner.recv().await?;
        Some(event.map(decode_snapshot))
    }
}

fn decode_snapshot(snapshot: DocumentSnapshot) -> Vec<LostItemRecord> {
    let mut items: Vec<LostItemRecord> = snapshot
        .iter()
        .filter_map(|(id, doc)| match LostItemRecord::from_document(id, doc) {
            Ok(record) => Some(record),
            Err(err) => {
                // Point recovery: one bad document never fails the stream.
                warn!(%id, error = %err, "dropping malformed lost-item document from snapshot");
                None
            }
        })
        .collect();
    items.sort_by(newest_first);
    items
}

/// Newest first by the underlying posting timestamp. Records carrying only a
/// legacy pre-formatted date string have no reliable chronology and sort
/// after all timestamped records (descending by string among themselves);
/// records with no date at all come last.
fn newest_first(a: &LostItemRecord, b: &LostItemRecord) -> Ordering {
    match (&a.date_posted, &b.date_posted) {
        (PostedDate::Timestamp(x), PostedDate::Timestamp(y)) => y.cmp(x),
        (PostedDate::Timestamp(_), _) => Ordering::Less,
        (_, PostedDate::Timestamp(_)) => Ordering::Greater,
        (PostedDate::Legacy(x), PostedDate::Legacy(y)) => y.cmp(x),
        (PostedDate::Legacy(_), PostedDate::Unset) => Ordering::Less,
        (PostedDate::Unset, PostedDate::Legacy(_)) => Ordering::Greater,
        (PostedDate::Unset, PostedDate::Unset) => Ordering::Equal,
    }
}

pub struct LostItemRepository {
    docs: Arc<dyn DocumentStore>,
    auth: Arc<dyn AuthGateway>,
}

impl LostItemRepository {
    pub fn new(docs: Arc<dyn DocumentStore>, auth: Arc<dyn AuthGateway>) -> Self {
        Self { docs, auth }
    }

    fn document_for(&self, draft: &NewLostItem) -> Result<DocumentFields> {
        let user = self.auth.current_user().ok_or(AppError::Unauthenticated)?;
        let record = LostItemRecord {
            id: String::new(),
            owner_id: user.uid,
            item_name: draft.item_name.clone(),
            location: draft.location.clone(),
            description: draft.description.clone(),
            additional_info: draft.additional_info.clone(),
            city: draft.city.clone(),
            state: draft.state.clone(),
            status: ItemStatus::Lost,
            date_posted: PostedDate::Timestamp(Utc::now()),
            user_name: user.display_name.unwrap_or_else(|| "Anonymous".to_string()),
            image_url: String::new(),
            storage_path: String::new(),
            latitude: draft.latitude,
            longitude: draft.longitude,
            contact_info: draft.contact_info.clone(),
        };
        Ok(record.to_document())
    }

    /// Writes a new report with identity, display name, posting time, and
    /// the `Lost` default status stamped in. Fails `Unauthenticated` when no
    /// one is signed in.
    pub async fn submit(&self, draft: &NewLostItem) -> Result<String> {
        let doc = self.document_for(draft)?;
        let id = self.docs.insert(doc).await?;
        debug!(%id, "submitted lost-item report");
        Ok(id)
    }

    /// Fire-and-forget submission. Returns the pre-generated id immediately;
    /// the write outcome arrives later on the receiver, so a synchronous
    /// return does not guarantee durability.
    pub fn submit_detached(&self, draft: &NewLostItem) -> Result<(String, oneshot::Receiver<Result<()>>)> {
        let doc = self.document_for(draft)?;
        let id = Uuid::new_v4().to_string();
        let (done_tx, done_rx) = oneshot::channel();
        let docs = Arc::clone(&self.docs);
        let item_id = id.clone();
        tokio::spawn(async move {
            let outcome = docs.set(&item_id, doc).await;
            if let Err(err) = &outcome {
                warn!(%item_id, error = %err, "background lost-item write failed");
            }
            let _ = done_tx.send(outcome);
        });
        Ok((id, done_rx))
    }

    /// Live view of the whole collection.
    pub fn stream_all(&self) -> Result<ItemSubscription> {
        Ok(ItemSubscription { inner: self.docs.subscribe(None)? })
    }

    /// Live view pre-filtered by exact `state` equality at the store.
    pub fn stream_by_state(&self, state: &str) -> Result<ItemSubscription> {
        let filter = EqFilter::new(field::STATE, state);
        Ok(ItemSubscription { inner: self.docs.subscribe(Some(filter))? })
    }

    /// Live view of one user's own posts.
    pub fn stream_by_owner(&self, owner_id: &str) -> Result<ItemSubscription> {
        let filter = EqFilter::new(field::OWNER_ID, owner_id);
        Ok(ItemSubscription { inner: self.docs.subscribe(Some(filter))? })
    }

    /// One-shot fetch by document id.
    pub async fn get_by_id(&self, id: &str) -> Result<LostItemRecord> {
        let doc = self
            .docs
            .get(id)
            .await?
            .ok_or_else(|| AppError::NotFound("lost item".to_string(), id.to_string()))?;
        LostItemRecord::from_document(id, &doc)
    }

    /// Patches the status field only; all other fields stay untouched.
    pub async fn update_status(&self, id: &str, status: ItemStatus) -> Result<()> {
        let mut fields = DocumentFields::new();
        fields.insert(field::STATUS.into(), Value::from(status.as_str()));
        self.docs.update_fields(id, fields).await
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        self.docs.delete(id).await
    }

    /// Callback-style deletion, for call sites that want the listener shape
    /// instead of awaiting a future. The outcome is delivered exactly once.
    pub fn delete_in_background(&self, id: String, on_done: impl FnOnce(Result<()>) + Send + 'static) {
        let docs = Arc::clone(&self.docs);
        tokio::spawn(async move {
            on_done(docs.delete(&id).await);
        });
    }
}
