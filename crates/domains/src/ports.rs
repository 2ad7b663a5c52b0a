//! # Core Ports
//!
//! Contracts the PinPoint core holds against its external collaborators:
//! the Document Store, the Blob Store, and the Authentication Service.
//! Adapters (and test fakes) implement these traits; constructor injection
//! replaces the ambient client singletons of the original design.

use async_trait::async_trait;
use bytes::Bytes;
use mime::Mime;
use serde_json::Value;
use tokio::sync::mpsc;

use crate::error::Result;
use crate::models::{AuthUser, DocumentFields};

/// One full result set of a live query: every matching document with its id.
/// Emissions are snapshots, never diffs.
pub type DocumentSnapshot = Vec<(String, DocumentFields)>;

/// Exact-match predicate applied store-side to queries and subscriptions.
#[derive(Debug, Clone, PartialEq)]
pub struct EqFilter {
    pub field: String,
    pub value: Value,
}

impl EqFilter {
    pub fn new(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self { field: field.into(), value: value.into() }
    }

    pub fn matches(&self, doc: &DocumentFields) -> bool {
        doc.get(&self.field) == Some(&self.value)
    }
}

/// Detaches a store-side listener when dropped. Holding the guard is what
/// keeps the subscription alive; the owning view-model drops it on teardown
/// or when replacing the subscription, on every exit path.
pub struct ListenerGuard {
    detach: Option<Box<dyn FnOnce() + Send>>,
}

impl ListenerGuard {
    pub fn new(detach: impl FnOnce() + Send + 'static) -> Self {
        Self { detach: Some(Box::new(detach)) }
    }

    /// For mocks and fakes that have nothing to detach.
    pub fn noop() -> Self {
        Self { detach: None }
    }
}

impl Drop for ListenerGuard {
    fn drop(&mut self) {
        if let Some(detach) = self.detach.take() {
            detach();
        }
    }
}

impl std::fmt::Debug for ListenerGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerGuard").finish_non_exhaustive()
    }
}

/// A live, cancellable subscription to a document query. Receives the full
/// matching snapshot on subscribe and again after every store mutation; a
/// store-side failure arrives as an `Err` event. Dropping the subscription
/// detaches the listener.
#[derive(Debug)]
pub struct DocumentSubscription {
    rx: mpsc::UnboundedReceiver<Result<DocumentSnapshot>>,
    _guard: ListenerGuard,
}

impl DocumentSubscription {
    pub fn new(rx: mpsc::UnboundedReceiver<Result<DocumentSnapshot>>, guard: ListenerGuard) -> Self {
        Self { rx, _guard: guard }
    }

    /// Next emission, or `None` once the store side has closed the channel.
    pub async fn recv(&mut self) -> Option<Result<DocumentSnapshot>> {
        self.rx.recv().await
    }
}

/// Data persistence contract for lost-item documents: a schemaless collection
/// with point reads, equality-filtered live queries, field-level patching,
/// and full deletes.
#[cfg_attr(feature = "testing", mockall::automock)]
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Writes a new document under a store-assigned id and returns the id.
    async fn insert(&self, doc: DocumentFields) -> Result<String>;

    /// Writes a document at a caller-chosen id, replacing any existing body.
    async fn set(&self, id: &str, doc: DocumentFields) -> Result<()>;

    async fn get(&self, id: &str) -> Result<Option<DocumentFields>>;

    /// Patches only the given fields; other fields are left untouched.
    /// Fails when the document does not exist.
    async fn update_fields(&self, id: &str, fields: DocumentFields) -> Result<()>;

    /// Removes a document. Deleting a missing id is a no-op, as in the
    /// backing store.
    async fn delete(&self, id: &str) -> Result<()>;

    /// Opens a live query, optionally pre-filtered by field equality.
    /// The current snapshot is emitted immediately.
    fn subscribe(&self, filter: Option<EqFilter>) -> Result<DocumentSubscription>;
}

/// Hierarchical path-addressed binary object storage.
#[cfg_attr(feature = "testing", mockall::automock)]
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn upload(&self, path: &str, data: Bytes, content_type: &Mime) -> Result<()>;

    /// Resolves a durable, publicly fetchable URL for an uploaded path.
    async fn resolve_url(&self, path: &str) -> Result<String>;

    async fn delete(&self, path: &str) -> Result<()>;
}

/// Read-only view of the Authentication Service. The core never collects
/// credentials; it only asks who is currently signed in.
#[cfg_attr(feature = "testing", mockall::automock)]
pub trait AuthGateway: Send + Sync {
    fn current_user(&self) -> Option<AuthUser>;
}
