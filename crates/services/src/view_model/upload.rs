//! # Upload View-Model
//!
//! Drives the report-submission screen: client-side validation of the
//! required fields happens here, before any store call, and the photo
//! workflow is delegated to the media manager.

use std::sync::Arc;

use tokio::sync::watch;

use domains::{AppError, NewLostItem, PhotoUpload, Result};

use crate::media::LostItemMediaManager;
use crate::view_model::map::Coordinate;

/// Submission outcome signals. `event_id` bumps on every terminal event so
/// the UI can distinguish a repeat of the same message from a new one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UploadState {
    pub error: Option<String>,
    pub success_msg: Option<String>,
    pub event_id: u64,
    pub is_uploading: bool,
}

pub struct UploadViewModel {
    media: Arc<LostItemMediaManager>,
    state_tx: Arc<watch::Sender<UploadState>>,
    location_tx: Arc<watch::Sender<Option<Coordinate>>>,
}

impl UploadViewModel {
    pub fn new(media: Arc<LostItemMediaManager>) -> Self {
        let (state_tx, _) = watch::channel(UploadState::default());
        let (location_tx, _) = watch::channel(None);
        Self { media, state_tx: Arc::new(state_tx), location_tx: Arc::new(location_tx) }
    }

    pub fn state(&self) -> watch::Receiver<UploadState> {
        self.state_tx.subscribe()
    }

    pub fn selected_location(&self) -> watch::Receiver<Option<Coordinate>> {
        self.location_tx.subscribe()
    }

    /// The map picker reported a tap.
    pub fn on_map_click(&self, position: Coordinate) {
        self.location_tx.send_replace(Some(position));
    }

    fn fail(&self, message: &str) {
        self.state_tx.send_modify(|state| {
            state.success_msg = None;
            state.error = Some(message.to_string());
            state.is_uploading = false;
            state.event_id += 1;
        });
    }

    /// Validates and submits a new report. Validation failures surface
    /// immediately and block the network call entirely.
    pub async fn submit(&self, photo: Option<PhotoUpload>, draft: NewLostItem) {
        let photo = match validate(photo, &draft) {
            Ok(photo) => photo,
            Err(AppError::Validation(message)) => {
                self.fail(&message);
                return;
            }
            Err(err) => {
                self.fail(&err.to_string());
                return;
            }
        };

        self.state_tx.send_modify(|state| {
            state.is_uploading = true;
            state.error = None;
            state.success_msg = None;
        });

        match self.media.create_with_photo(photo, &draft).await {
            Ok(_) => self.state_tx.send_modify(|state| {
                state.is_uploading = false;
                state.success_msg = Some("Successfully created lost item!".to_string());
                state.error = None;
                state.event_id += 1;
            }),
            Err(err) => self.fail(&err.to_string()),
        }
    }
}

/// Client-side gate run before any store call. The messages are shown to the
/// user verbatim.
fn validate(photo: Option<PhotoUpload>, draft: &NewLostItem) -> Result<PhotoUpload> {
    let required = [
        &draft.item_name,
        &draft.location,
        &draft.description,
        &draft.city,
        &draft.state,
    ];
    if required.iter().any(|value| value.trim().is_empty()) {
        return Err(AppError::Validation("Make sure all fields are filled out!".to_string()));
    }
    photo.ok_or_else(|| AppError::Validation("Please take a photo of the item!".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> NewLostItem {
        NewLostItem {
            item_name: "Umbrella".into(),
            location: "Union South".into(),
            description: "Red".into(),
            city: "Madison".into(),
            state: "Wisconsin".into(),
            ..Default::default()
        }
    }

    fn photo() -> PhotoUpload {
        PhotoUpload::jpeg(bytes::Bytes::from_static(b"jpeg-bytes"))
    }

    #[test]
    fn blank_fields_fail_before_the_photo_check() {
        let mut missing_name = draft();
        missing_name.item_name = " ".into();
        let err = validate(None, &missing_name).unwrap_err();
        assert!(matches!(
            err,
            AppError::Validation(msg) if msg == "Make sure all fields are filled out!"
        ));
    }

    #[test]
    fn a_photo_is_required() {
        let err = validate(None, &draft()).unwrap_err();
        assert!(matches!(
            err,
            AppError::Validation(msg) if msg == "Please take a photo of the item!"
        ));
    }

    #[test]
    fn a_complete_draft_with_photo_passes() {
        assert!(validate(Some(photo()), &draft()).is_ok());
    }
}
