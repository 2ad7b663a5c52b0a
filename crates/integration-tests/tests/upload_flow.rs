//! Submission-screen validation and outcome signaling. Validation failures
//! must block the store and blob calls entirely.

use integration_tests::{draft, photo, TestEnv};
use services::{Coordinate, UploadViewModel};

#[tokio::test]
async fn a_blank_required_field_blocks_the_submission() {
    let env = TestEnv::signed_in();
    let vm = UploadViewModel::new(env.media.clone());

    let mut empty_city = draft("Backpack", "Madison", "Wisconsin");
    empty_city.city = "   ".to_string();
    vm.submit(Some(photo()), empty_city).await;

    let state = vm.state().borrow().clone();
    assert_eq!(state.error.as_deref(), Some("Make sure all fields are filled out!"));
    assert!(state.success_msg.is_none());
    assert!(!state.is_uploading);
    assert_eq!(env.docs.document_count(), 0);
    assert_eq!(env.blobs.blob_count(), 0);
}

#[tokio::test]
async fn a_missing_photo_blocks_the_submission() {
    let env = TestEnv::signed_in();
    let vm = UploadViewModel::new(env.media.clone());

    vm.submit(None, draft("Backpack", "Madison", "Wisconsin")).await;

    let state = vm.state().borrow().clone();
    assert_eq!(state.error.as_deref(), Some("Please take a photo of the item!"));
    assert_eq!(env.docs.document_count(), 0);
    assert_eq!(env.blobs.blob_count(), 0);
}

#[tokio::test]
async fn a_valid_submission_reports_success() {
    let env = TestEnv::signed_in();
    let vm = UploadViewModel::new(env.media.clone());

    vm.submit(Some(photo()), draft("Backpack", "Madison", "Wisconsin")).await;

    let state = vm.state().borrow().clone();
    assert_eq!(state.success_msg.as_deref(), Some("Successfully created lost item!"));
    assert!(state.error.is_none());
    assert!(!state.is_uploading);
    assert_eq!(env.docs.document_count(), 1);
    assert_eq!(env.blobs.blob_count(), 1);
}

#[tokio::test]
async fn a_backend_failure_surfaces_in_the_error_signal() {
    let env = TestEnv::signed_in();
    let vm = UploadViewModel::new(env.media.clone());

    env.docs.fail_next_write("quota exceeded");
    vm.submit(Some(photo()), draft("Backpack", "Madison", "Wisconsin")).await;

    let state = vm.state().borrow().clone();
    assert!(state.error.as_deref().unwrap().contains("quota exceeded"));
    assert!(state.success_msg.is_none());
    assert!(!state.is_uploading);
}

#[tokio::test]
async fn every_terminal_event_bumps_the_event_id() {
    let env = TestEnv::signed_in();
    let vm = UploadViewModel::new(env.media.clone());

    vm.submit(None, draft("Backpack", "Madison", "Wisconsin")).await;
    let first = vm.state().borrow().event_id;

    // The same message again must still read as a fresh event.
    vm.submit(None, draft("Backpack", "Madison", "Wisconsin")).await;
    let second = vm.state().borrow().event_id;
    assert!(second > first);
}

#[tokio::test]
async fn map_taps_update_the_selected_location() {
    let env = TestEnv::signed_in();
    let vm = UploadViewModel::new(env.media.clone());
    assert!(vm.selected_location().borrow().is_none());

    vm.on_map_click(Coordinate::new(43.0731, -89.4012));
    assert_eq!(*vm.selected_location().borrow(), Some(Coordinate::new(43.0731, -89.4012)));
}
