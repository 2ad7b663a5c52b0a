//! # Item Detail View-Model
//!
//! One-shot fetch of a single report into a loading/error/data tri-state.
//! No caching: repeated loads with the same id hit the store again.

use std::sync::Arc;

use tokio::sync::watch;

use domains::LostItemRecord;

use crate::repository::LostItemRepository;

#[derive(Debug, Clone, PartialEq)]
pub enum DetailState {
    Loading,
    Ready(LostItemRecord),
    Error(String),
}

pub struct ItemDetailViewModel {
    repo: Arc<LostItemRepository>,
    state_tx: Arc<watch::Sender<DetailState>>,
}

impl ItemDetailViewModel {
    pub fn new(repo: Arc<LostItemRepository>) -> Self {
        let (state_tx, _) = watch::channel(DetailState::Loading);
        Self { repo, state_tx: Arc::new(state_tx) }
    }

    pub fn state(&self) -> watch::Receiver<DetailState> {
        self.state_tx.subscribe()
    }

    /// Fetches the record once. A missing document and a fetch failure both
    /// surface as `Error`.
    pub async fn load_item(&self, item_id: &str) {
        self.state_tx.send_replace(DetailState::Loading);
        match self.repo.get_by_id(item_id).await {
            Ok(item) => self.state_tx.send_replace(DetailState::Ready(item)),
            Err(err) => self.state_tx.send_replace(DetailState::Error(err.to_string())),
        };
    }
}
