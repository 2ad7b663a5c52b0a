//! Feed view-model behavior: location filtering, refresh, and the error
//! path of a failing stream.

use std::sync::Arc;
use std::time::Duration;

use domains::{AppError, DocumentSubscription, ListenerGuard, MockAuthGateway, MockDocumentStore};
use integration_tests::{draft, TestEnv, DEADLINE};
use services::{FeedState, FeedViewModel, LostItemRepository};
use tokio::sync::mpsc;
use tokio::time::timeout;

async fn ready_items(state: &mut tokio::sync::watch::Receiver<FeedState>) -> Vec<String> {
    let snapshot = timeout(DEADLINE, state.wait_for(|s| matches!(s, FeedState::Ready(_))))
        .await
        .expect("feed deadline")
        .expect("feed channel closed");
    match &*snapshot {
        FeedState::Ready(items) => items.iter().map(|item| item.item_name.clone()).collect(),
        _ => unreachable!(),
    }
}

#[tokio::test]
async fn filter_matches_state_exactly_and_city_loosely() {
    let env = TestEnv::signed_in();
    env.repo.submit(&draft("Backpack", "Madison", "Wisconsin")).await.unwrap();
    env.repo.submit(&draft("Scarf", "  MADISON  ", "Wisconsin")).await.unwrap();
    env.repo.submit(&draft("Umbrella", "Chicago", "Illinois")).await.unwrap();
    env.repo.submit(&draft("Gloves", "Milwaukee", "Wisconsin")).await.unwrap();

    let feed = FeedViewModel::new(env.repo.clone());
    let mut state = feed.state();

    feed.filter_by_location("Madison", "Wisconsin").await;
    let mut names = ready_items(&mut state).await;
    names.sort();
    assert_eq!(names, vec!["Backpack", "Scarf"]);
}

#[tokio::test]
async fn blank_city_keeps_every_record_in_the_state() {
    let env = TestEnv::signed_in();
    env.repo.submit(&draft("Umbrella", "Chicago", "Illinois")).await.unwrap();
    env.repo.submit(&draft("Hat", "Evanston", "Illinois")).await.unwrap();
    env.repo.submit(&draft("Backpack", "Madison", "Wisconsin")).await.unwrap();

    let feed = FeedViewModel::new(env.repo.clone());
    let mut state = feed.state();

    feed.filter_by_location("", "Illinois").await;
    let mut names = ready_items(&mut state).await;
    names.sort();
    assert_eq!(names, vec!["Hat", "Umbrella"]);
}

#[tokio::test]
async fn refresh_returns_to_the_unfiltered_view() {
    let env = TestEnv::signed_in();
    env.repo.submit(&draft("Backpack", "Madison", "Wisconsin")).await.unwrap();
    env.repo.submit(&draft("Umbrella", "Chicago", "Illinois")).await.unwrap();

    let feed = FeedViewModel::new(env.repo.clone());
    let mut state = feed.state();

    feed.filter_by_location("Madison", "Wisconsin").await;
    assert_eq!(ready_items(&mut state).await.len(), 1);

    feed.refresh().await;
    let names = ready_items(&mut state).await;
    assert_eq!(names.len(), 2);
}

#[tokio::test]
async fn the_feed_tracks_live_additions() {
    let env = TestEnv::signed_in();
    let feed = FeedViewModel::new(env.repo.clone());
    let mut state = feed.state();

    feed.load().await;
    assert!(ready_items(&mut state).await.is_empty());

    env.repo.submit(&draft("Backpack", "Madison", "Wisconsin")).await.unwrap();
    let names = timeout(DEADLINE, state.wait_for(|s| {
        matches!(s, FeedState::Ready(items) if !items.is_empty())
    }))
    .await
    .expect("feed deadline")
    .expect("feed channel closed");
    drop(names);
}

#[tokio::test]
async fn a_failing_stream_surfaces_as_error_and_discards_the_list() {
    let mut docs = MockDocumentStore::new();
    docs.expect_subscribe().returning(|_| {
        let (tx, rx) = mpsc::unbounded_channel();
        tx.send(Ok(Vec::new())).unwrap();
        let tx_bg = tx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            let _ = tx_bg.send(Err(AppError::Read("listener torn down".into())));
        });
        Ok(DocumentSubscription::new(rx, ListenerGuard::noop()))
    });
    let mut auth = MockAuthGateway::new();
    auth.expect_current_user().returning(|| None);

    let repo = Arc::new(LostItemRepository::new(Arc::new(docs), Arc::new(auth)));
    let feed = FeedViewModel::new(repo);
    let mut state = feed.state();

    feed.load().await;
    let error = timeout(DEADLINE, state.wait_for(|s| matches!(s, FeedState::Error(_))))
        .await
        .expect("feed deadline")
        .expect("feed channel closed");
    match &*error {
        FeedState::Error(message) => assert!(message.contains("listener torn down")),
        _ => unreachable!(),
    }
}
