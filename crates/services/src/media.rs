//! # Media Manager
//!
//! The only component running multi-step, partially-failable workflows:
//! "upload blob, then write metadata" on create and "delete metadata after
//! blob cleanup" on removal. Owns the blob path convention and performs the
//! client-side ownership check before any destructive action.

use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;
use tracing::{debug, info, warn};
use uuid::Uuid;

use domains::{
    field, AppError, AuthGateway, AuthUser, BlobStore, DocumentFields, DocumentStore, ItemStatus,
    LostItemRecord, NewLostItem, PhotoUpload, PostedDate, Result,
};

pub struct LostItemMediaManager {
    docs: Arc<dyn DocumentStore>,
    blobs: Arc<dyn BlobStore>,
    auth: Arc<dyn AuthGateway>,
}

impl LostItemMediaManager {
    pub fn new(docs: Arc<dyn DocumentStore>, blobs: Arc<dyn BlobStore>, auth: Arc<dyn AuthGateway>) -> Self {
        Self { docs, blobs, auth }
    }

    fn require_user(&self) -> Result<AuthUser> {
        self.auth.current_user().ok_or(AppError::Unauthenticated)
    }

    /// Blob path for an item photo: `users/{owner}/lost-items/{item}/{file}`.
    /// The filename is stamped with the current time so a replacement never
    /// collides with the photo it supersedes.
    fn photo_path(owner_id: &str, item_id: &str) -> String {
        format!(
            "users/{owner_id}/lost-items/{item_id}/image_{}.jpg",
            Utc::now().timestamp_millis()
        )
    }

    async fn fetch_owned(&self, item_id: &str, caller: &AuthUser) -> Result<DocumentFields> {
        let doc = self
            .docs
            .get(item_id)
            .await?
            .ok_or_else(|| AppError::NotFound("lost item".to_string(), item_id.to_string()))?;
        let owner = doc.get(field::OWNER_ID).and_then(Value::as_str).unwrap_or_default();
        if owner != caller.uid {
            return Err(AppError::Unauthorized(format!(
                "item {item_id} is not owned by the caller"
            )));
        }
        Ok(doc)
    }

    /// Best-effort blob removal. The metadata operation that follows is the
    /// contract that matters to the caller, so a failure here is logged and
    /// swallowed.
    async fn cleanup_blob(&self, item_id: &str, path: &str) {
        if path.is_empty() {
            return;
        }
        if let Err(err) = self.blobs.delete(path).await {
            warn!(%item_id, %path, error = %err, "best-effort blob cleanup failed");
        }
    }

    /// Creates a report with a photo: upload first, resolve the fetch URL,
    /// then write the metadata document at a client-generated id.
    ///
    /// An upload failure aborts before any document write. A document-write
    /// failure after a successful upload leaves an orphaned blob behind; no
    /// compensating delete is run.
    pub async fn create_with_photo(&self, photo: PhotoUpload, draft: &NewLostItem) -> Result<String> {
        let user = self.require_user()?;
        let item_id = Uuid::new_v4().to_string();
        let path = Self::photo_path(&user.uid, &item_id);

        self.blobs.upload(&path, photo.data, &photo.content_type).await?;
        let url = self.blobs.resolve_url(&path).await?;

        let record = LostItemRecord {
            id: item_id.clone(),
            owner_id: user.uid.clone(),
            item_name: draft.item_name.clone(),
            location: draft.location.clone(),
            description: draft.description.clone(),
            additional_info: draft.additional_info.clone(),
            city: draft.city.clone(),
            state: draft.state.clone(),
            status: ItemStatus::Lost,
            date_posted: PostedDate::Timestamp(Utc::now()),
            user_name: user.display_name.clone().unwrap_or_else(|| "Unknown".to_string()),
            image_url: url,
            storage_path: path.clone(),
            latitude: draft.latitude,
            longitude: draft.longitude,
            contact_info: draft.contact_info.clone(),
        };

        if let Err(err) = self.docs.set(&item_id, record.to_document()).await {
            warn!(%item_id, %path, error = %err, "metadata write failed after upload; blob orphaned");
            return Err(err);
        }
        info!(%item_id, "created lost-item report with photo");
        Ok(item_id)
    }

    /// Swaps the item photo: ownership is verified before anything is
    /// touched, the old blob is removed best-effort, then the new photo is
    /// uploaded and `imageUrl`/`storagePath` are patched together.
    pub async fn replace_photo(&self, item_id: &str, photo: PhotoUpload) -> Result<String> {
        let user = self.require_user()?;
        let doc = self.fetch_owned(item_id, &user).await?;

        let old_path = doc.get(field::STORAGE_PATH).and_then(Value::as_str).unwrap_or_default();
        self.cleanup_blob(item_id, old_path).await;

        let path = Self::photo_path(&user.uid, item_id);
        self.blobs.upload(&path, photo.data, &photo.content_type).await?;
        let url = self.blobs.resolve_url(&path).await?;

        let mut fields = DocumentFields::new();
        fields.insert(field::IMAGE_URL.into(), Value::from(url.clone()));
        fields.insert(field::STORAGE_PATH.into(), Value::from(path));
        self.docs.update_fields(item_id, fields).await?;

        debug!(%item_id, "replaced lost-item photo");
        Ok(url)
    }

    /// Deletes a report and its photo. The document delete runs last so a
    /// blob failure never leaves a document pointing at a removed image;
    /// document deletion is the authoritative step.
    pub async fn delete(&self, item_id: &str) -> Result<()> {
        let user = self.require_user()?;
        let doc = self.fetch_owned(item_id, &user).await?;

        let path = doc.get(field::STORAGE_PATH).and_then(Value::as_str).unwrap_or_default();
        self.cleanup_blob(item_id, path).await;

        self.docs.delete(item_id).await?;
        info!(%item_id, "deleted lost-item report");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use domains::{MockAuthGateway, MockBlobStore, MockDocumentStore};
    use serde_json::json;

    fn owner() -> MockAuthGateway {
        let mut auth = MockAuthGateway::new();
        auth.expect_current_user().returning(|| {
            Some(AuthUser {
                uid: "owner-1".into(),
                display_name: Some("Sam".into()),
                email: None,
            })
        });
        auth
    }

    fn photo() -> PhotoUpload {
        PhotoUpload::jpeg(Bytes::from_static(b"jpeg-bytes"))
    }

    fn stored_doc(owner_id: &str) -> DocumentFields {
        json!({
            "ownerId": owner_id,
            "itemName": "Umbrella",
            "imageUrl": "mem://old",
            "storagePath": "users/owner-1/lost-items/item-1/image_1.jpg",
        })
        .as_object()
        .cloned()
        .unwrap()
    }

    #[tokio::test]
    async fn create_uploads_before_writing_metadata() {
        let mut blobs = MockBlobStore::new();
        blobs
            .expect_upload()
            .withf(|path, _, _| path.starts_with("users/owner-1/lost-items/"))
            .returning(|_, _, _| Ok(()));
        blobs.expect_resolve_url().returning(|path| Ok(format!("mem://{path}")));

        let mut docs = MockDocumentStore::new();
        docs.expect_set()
            .withf(|_, doc| {
                let url = doc[field::IMAGE_URL].as_str().unwrap();
                let path = doc[field::STORAGE_PATH].as_str().unwrap();
                url.ends_with(path)
                    && doc[field::OWNER_ID] == json!("owner-1")
                    && doc[field::STATUS] == json!("Lost")
            })
            .returning(|_, _| Ok(()));

        let manager =
            LostItemMediaManager::new(Arc::new(docs), Arc::new(blobs), Arc::new(owner()));
        let id = manager.create_with_photo(photo(), &NewLostItem::default()).await.unwrap();
        assert!(!id.is_empty());
    }

    #[tokio::test]
    async fn create_aborts_without_a_document_when_upload_fails() {
        let mut blobs = MockBlobStore::new();
        blobs
            .expect_upload()
            .returning(|_, _, _| Err(AppError::Upload("network down".into())));

        // No expectations: any document write would fail the test.
        let docs = MockDocumentStore::new();

        let manager =
            LostItemMediaManager::new(Arc::new(docs), Arc::new(blobs), Arc::new(owner()));
        let err = manager.create_with_photo(photo(), &NewLostItem::default()).await.unwrap_err();
        assert!(matches!(err, AppError::Upload(_)));
    }

    #[tokio::test]
    async fn create_does_not_roll_back_the_blob_when_the_write_fails() {
        let mut blobs = MockBlobStore::new();
        blobs.expect_upload().returning(|_, _, _| Ok(()));
        blobs.expect_resolve_url().returning(|path| Ok(format!("mem://{path}")));
        // The orphaned blob stays: delete must never be called.
        blobs.expect_delete().never();

        let mut docs = MockDocumentStore::new();
        docs.expect_set().returning(|_, _| Err(AppError::Write("quota exceeded".into())));

        let manager =
            LostItemMediaManager::new(Arc::new(docs), Arc::new(blobs), Arc::new(owner()));
        let err = manager.create_with_photo(photo(), &NewLostItem::default()).await.unwrap_err();
        assert!(matches!(err, AppError::Write(_)));
    }

    #[tokio::test]
    async fn replace_rejects_a_non_owner_before_touching_anything() {
        let mut docs = MockDocumentStore::new();
        docs.expect_get().returning(|_| Ok(Some(stored_doc("someone-else"))));
        docs.expect_update_fields().never();

        let mut blobs = MockBlobStore::new();
        blobs.expect_upload().never();
        blobs.expect_delete().never();

        let manager =
            LostItemMediaManager::new(Arc::new(docs), Arc::new(blobs), Arc::new(owner()));
        let err = manager.replace_photo("item-1", photo()).await.unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn replace_survives_a_failing_old_blob_delete() {
        let mut docs = MockDocumentStore::new();
        docs.expect_get().returning(|_| Ok(Some(stored_doc("owner-1"))));
        docs.expect_update_fields()
            .withf(|id, fields| {
                id == "item-1"
                    && fields.contains_key(field::IMAGE_URL)
                    && fields.contains_key(field::STORAGE_PATH)
            })
            .returning(|_, _| Ok(()));

        let mut blobs = MockBlobStore::new();
        blobs
            .expect_delete()
            .returning(|_| Err(AppError::Upload("old blob already gone".into())));
        blobs.expect_upload().returning(|_, _, _| Ok(()));
        blobs.expect_resolve_url().returning(|path| Ok(format!("mem://{path}")));

        let manager =
            LostItemMediaManager::new(Arc::new(docs), Arc::new(blobs), Arc::new(owner()));
        let url = manager.replace_photo("item-1", photo()).await.unwrap();
        assert!(url.starts_with("mem://users/owner-1/lost-items/item-1/"));
    }

    #[tokio::test]
    async fn delete_removes_the_document_even_when_blob_cleanup_fails() {
        let mut docs = MockDocumentStore::new();
        docs.expect_get().returning(|_| Ok(Some(stored_doc("owner-1"))));
        docs.expect_delete().withf(|id| id == "item-1").returning(|_| Ok(()));

        let mut blobs = MockBlobStore::new();
        blobs.expect_delete().returning(|_| Err(AppError::Upload("transient".into())));

        let manager =
            LostItemMediaManager::new(Arc::new(docs), Arc::new(blobs), Arc::new(owner()));
        manager.delete("item-1").await.unwrap();
    }

    #[tokio::test]
    async fn delete_of_a_missing_item_fails_not_found() {
        let mut docs = MockDocumentStore::new();
        docs.expect_get().returning(|_| Ok(None));
        docs.expect_delete().never();

        let blobs = MockBlobStore::new();
        let manager =
            LostItemMediaManager::new(Arc::new(docs), Arc::new(blobs), Arc::new(owner()));
        let err = manager.delete("gone").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(..)));
    }

    #[tokio::test]
    async fn every_workflow_requires_authentication() {
        let mut auth = MockAuthGateway::new();
        auth.expect_current_user().returning(|| None);
        let manager = LostItemMediaManager::new(
            Arc::new(MockDocumentStore::new()),
            Arc::new(MockBlobStore::new()),
            Arc::new(auth),
        );

        assert!(matches!(
            manager.create_with_photo(photo(), &NewLostItem::default()).await,
            Err(AppError::Unauthenticated)
        ));
        assert!(matches!(
            manager.replace_photo("item-1", photo()).await,
            Err(AppError::Unauthenticated)
        ));
        assert!(matches!(manager.delete("item-1").await, Err(AppError::Unauthenticated)));
    }
}
