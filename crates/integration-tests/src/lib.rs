//! Shared fixtures for the black-box test suites: a fully wired core over
//! the in-memory adapters, plus helpers for drafts, photos, and waiting on
//! watch-channel state with a deadline.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;

use auth_adapters::SessionAuthGateway;
use domains::{AuthUser, NewLostItem, PhotoUpload};
use services::{LostItemMediaManager, LostItemRepository};
use storage_adapters::{MemoryBlobStore, MemoryDocumentStore};

pub const DEADLINE: Duration = Duration::from_secs(5);

pub struct TestEnv {
    pub docs: Arc<MemoryDocumentStore>,
    pub blobs: Arc<MemoryBlobStore>,
    pub auth: Arc<SessionAuthGateway>,
    pub repo: Arc<LostItemRepository>,
    pub media: Arc<LostItemMediaManager>,
}

impl TestEnv {
    /// A wired core with `user-1` ("Sam") already signed in.
    pub fn signed_in() -> Self {
        let env = Self::signed_out();
        env.auth.sign_in(user("user-1", "Sam"));
        env
    }

    pub fn signed_out() -> Self {
        let docs = Arc::new(MemoryDocumentStore::new("lost-items"));
        let blobs = Arc::new(MemoryBlobStore::new("mem://pinpoint"));
        let auth = Arc::new(SessionAuthGateway::new());
        let repo = Arc::new(LostItemRepository::new(docs.clone(), auth.clone()));
        let media = Arc::new(LostItemMediaManager::new(docs.clone(), blobs.clone(), auth.clone()));
        Self { docs, blobs, auth, repo, media }
    }
}

pub fn user(uid: &str, name: &str) -> AuthUser {
    AuthUser { uid: uid.to_string(), display_name: Some(name.to_string()), email: None }
}

pub fn draft(item_name: &str, city: &str, state: &str) -> NewLostItem {
    NewLostItem {
        item_name: item_name.to_string(),
        location: "somewhere on campus".to_string(),
        description: "a description".to_string(),
        city: city.to_string(),
        state: state.to_string(),
        contact_info: "N/A".to_string(),
        ..Default::default()
    }
}

pub fn photo() -> PhotoUpload {
    PhotoUpload::jpeg(Bytes::from_static(b"jpeg-bytes"))
}

/// Polls `probe` until it returns true or the deadline passes.
pub async fn wait_until(probe: impl Fn() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + DEADLINE;
    while tokio::time::Instant::now() < deadline {
        if probe() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    probe()
}
