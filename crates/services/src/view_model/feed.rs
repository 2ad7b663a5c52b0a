//! # Feed View-Model
//!
//! Drives the campus-wide feed: a live, filterable view of all reports.
//! Every (re)subscription passes through `Loading`, and the previous
//! subscription is torn down before the next one is opened so at most one
//! listener is ever active for this view.

use std::sync::{Arc, Mutex};

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;

use domains::LostItemRecord;

use crate::repository::{ItemSubscription, LostItemRepository};

/// Tri-state of the feed screen. An error discards the previously shown
/// list; retry re-triggers the original load.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedState {
    Loading,
    Ready(Vec<LostItemRecord>),
    Error(String),
}

pub struct FeedViewModel {
    repo: Arc<LostItemRepository>,
    state_tx: Arc<watch::Sender<FeedState>>,
    reader: Mutex<Option<JoinHandle<()>>>,
}

impl FeedViewModel {
    pub fn new(repo: Arc<LostItemRepository>) -> Self {
        let (state_tx, _) = watch::channel(FeedState::Loading);
        Self { repo, state_tx: Arc::new(state_tx), reader: Mutex::new(None) }
    }

    /// Observe the feed state. The receiver always holds the latest value.
    pub fn state(&self) -> watch::Receiver<FeedState> {
        self.state_tx.subscribe()
    }

    /// Subscribes to the unfiltered feed.
    pub async fn load(&self) {
        self.start(None, None).await;
    }

    /// Returns to the unfiltered view.
    pub async fn refresh(&self) {
        self.start(None, None).await;
    }

    /// Re-subscribes pre-filtered by exact state equality, with an extra
    /// client-side case-insensitive trimmed city match when `city` is
    /// non-blank.
    pub async fn filter_by_location(&self, city: &str, state: &str) {
        let city = if city.trim().is_empty() { None } else { Some(city.to_string()) };
        self.start(Some(state.to_string()), city).await;
    }

    async fn start(&self, state_filter: Option<String>, city_filter: Option<String>) {
        // Cancel before resubscribe: the old listener must be gone before a
        // new one is opened, so the store never sees two for this view.
        let previous = self.reader.lock().expect("reader lock poisoned").take();
        if let Some(handle) = previous {
            handle.abort();
            let _ = handle.await;
        }

        self.state_tx.send_replace(FeedState::Loading);

        let subscription = match &state_filter {
            Some(state) => self.repo.stream_by_state(state),
            None => self.repo.stream_all(),
        };
        let mut subscription = match subscription {
            Ok(sub) => sub,
            Err(err) => {
                self.state_tx.send_replace(FeedState::Error(err.to_string()));
                return;
            }
        };

        debug!(state = ?state_filter, city = ?city_filter, "feed subscription opened");

        let state_tx = Arc::clone(&self.state_tx);
        let handle = tokio::spawn(async move {
            while let Some(event) = subscription.recv().await {
                match event {
                    Ok(items) => {
                        let items = apply_city_filter(items, city_filter.as_deref());
                        state_tx.send_replace(FeedState::Ready(items));
                    }
                    Err(err) => {
                        state_tx.send_replace(FeedState::Error(err.to_string()));
                        break;
                    }
                }
            }
        });
        *self.reader.lock().expect("reader lock poisoned") = Some(handle);
    }
}

impl Drop for FeedViewModel {
    fn drop(&mut self) {
        if let Some(handle) = self.reader.lock().expect("reader lock poisoned").take() {
            handle.abort();
        }
    }
}

fn apply_city_filter(items: Vec<LostItemRecord>, city: Option<&str>) -> Vec<LostItemRecord> {
    match city {
        Some(city) => {
            let wanted = city.trim();
            items
                .into_iter()
                .filter(|item| item.city.trim().eq_ignore_ascii_case(wanted))
                .collect()
        }
        None => items,
    }
}
