//! # Owner Items View-Model
//!
//! The "my posts" screen: a live owner-scoped list projected into a
//! display shape, with optimistic mark-as-found and delete operations.
//! Loading and error are independent signals, so the last-known list can
//! stay visible under an error banner.
//!
//! Optimistic policy: the local mutation is applied immediately and ROLLED
//! BACK if the background call fails, with the error signal set either way.

use std::sync::{Arc, Mutex};

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::warn;

use domains::{ItemStatus, LostItemRecord};

use crate::media::LostItemMediaManager;
use crate::repository::LostItemRepository;

/// Display projection of one owned report. `kind` mirrors the stored status
/// and feeds the Lost/Found tab filter.
#[derive(Debug, Clone, PartialEq)]
pub struct OwnerItemView {
    pub id: String,
    pub item_name: String,
    pub location: String,
    pub date_posted: String,
    pub user: String,
    pub kind: ItemStatus,
    pub image_url: String,
    pub city: String,
    pub state: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl OwnerItemView {
    fn project(record: &LostItemRecord) -> Self {
        Self {
            id: record.id.clone(),
            item_name: record.item_name.clone(),
            location: record.location.clone(),
            date_posted: record.date_posted.display(),
            user: record.user_name.clone(),
            kind: record.status,
            image_url: record.image_url.clone(),
            city: record.city.clone(),
            state: record.state.clone(),
            latitude: record.latitude,
            longitude: record.longitude,
        }
    }
}

pub struct OwnerItemsViewModel {
    repo: Arc<LostItemRepository>,
    media: Arc<LostItemMediaManager>,
    items_tx: Arc<watch::Sender<Vec<OwnerItemView>>>,
    loading_tx: Arc<watch::Sender<bool>>,
    error_tx: Arc<watch::Sender<Option<String>>>,
    reader: Mutex<Option<JoinHandle<()>>>,
}

impl OwnerItemsViewModel {
    pub fn new(repo: Arc<LostItemRepository>, media: Arc<LostItemMediaManager>) -> Self {
        let (items_tx, _) = watch::channel(Vec::new());
        let (loading_tx, _) = watch::channel(false);
        let (error_tx, _) = watch::channel(None);
        Self {
            repo,
            media,
            items_tx: Arc::new(items_tx),
            loading_tx: Arc::new(loading_tx),
            error_tx: Arc::new(error_tx),
            reader: Mutex::new(None),
        }
    }

    pub fn items(&self) -> watch::Receiver<Vec<OwnerItemView>> {
        self.items_tx.subscribe()
    }

    pub fn loading(&self) -> watch::Receiver<bool> {
        self.loading_tx.subscribe()
    }

    pub fn error(&self) -> watch::Receiver<Option<String>> {
        self.error_tx.subscribe()
    }

    /// Subscribes to the caller's own posts.
    pub async fn load(&self, owner_id: &str) {
        let previous = self.reader.lock().expect("reader lock poisoned").take();
        if let Some(handle) = previous {
            handle.abort();
            let _ = handle.await;
        }

        self.loading_tx.send_replace(true);
        self.error_tx.send_replace(None);

        let mut subscription = match self.repo.stream_by_owner(owner_id) {
            Ok(sub) => sub,
            Err(err) => {
                self.error_tx.send_replace(Some(err.to_string()));
                self.loading_tx.send_replace(false);
                return;
            }
        };

        let items_tx = Arc::clone(&self.items_tx);
        let loading_tx = Arc::clone(&self.loading_tx);
        let error_tx = Arc::clone(&self.error_tx);
        let handle = tokio::spawn(async move {
            while let Some(event) = subscription.recv().await {
                match event {
                    Ok(records) => {
                        let views = records.iter().map(OwnerItemView::project).collect();
                        items_tx.send_replace(views);
                        loading_tx.send_replace(false);
                    }
                    Err(err) => {
                        error_tx.send_replace(Some(err.to_string()));
                        loading_tx.send_replace(false);
                        break;
                    }
                }
            }
        });
        *self.reader.lock().expect("reader lock poisoned") = Some(handle);
    }

    /// Relabels the item as found right away, then patches the status in the
    /// background. The relabel is reverted if the patch fails.
    pub fn mark_as_found(&self, item_id: &str) {
        let mut previous: Option<ItemStatus> = None;
        self.items_tx.send_modify(|items| {
            if let Some(item) = items.iter_mut().find(|item| item.id == item_id) {
                previous = Some(item.kind);
                item.kind = ItemStatus::Found;
            }
        });
        let Some(previous) = previous else {
            return;
        };

        let repo = Arc::clone(&self.repo);
        let items_tx = Arc::clone(&self.items_tx);
        let error_tx = Arc::clone(&self.error_tx);
        let item_id = item_id.to_string();
        tokio::spawn(async move {
            match repo.update_status(&item_id, ItemStatus::Found).await {
                Ok(()) => {
                    error_tx.send_replace(None);
                }
                Err(err) => {
                    warn!(%item_id, error = %err, "mark-as-found failed; reverting optimistic relabel");
                    items_tx.send_modify(|items| {
                        if let Some(item) = items.iter_mut().find(|item| item.id == item_id) {
                            item.kind = previous;
                        }
                    });
                    error_tx.send_replace(Some(err.to_string()));
                }
            }
        });
    }

    /// Removes the item from view right away, then deletes it (document and
    /// photo) in the background. The entry is restored if the delete fails.
    pub fn delete_post(&self, item_id: &str) {
        let mut removed: Option<(usize, OwnerItemView)> = None;
        self.items_tx.send_modify(|items| {
            if let Some(position) = items.iter().position(|item| item.id == item_id) {
                removed = Some((position, items.remove(position)));
            }
        });
        let Some((position, item)) = removed else {
            return;
        };

        let media = Arc::clone(&self.media);
        let items_tx = Arc::clone(&self.items_tx);
        let error_tx = Arc::clone(&self.error_tx);
        let item_id = item_id.to_string();
        tokio::spawn(async move {
            match media.delete(&item_id).await {
                Ok(()) => {
                    error_tx.send_replace(None);
                }
                Err(err) => {
                    warn!(%item_id, error = %err, "delete failed; restoring optimistically removed item");
                    items_tx.send_modify(|items| {
                        let at = position.min(items.len());
                        items.insert(at, item);
                    });
                    error_tx.send_replace(Some(err.to_string()));
                }
            }
        });
    }
}

impl Drop for OwnerItemsViewModel {
    fn drop(&mut self) {
        if let Some(handle) = self.reader.lock().expect("reader lock poisoned").take() {
            handle.abort();
        }
    }
}
