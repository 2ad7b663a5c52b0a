//! # PinPoint Binary
//!
//! Assembles the core against the in-memory adapters and runs a short demo
//! pass: sign in, post two reports with photos, then observe the live feed
//! with and without a location filter. No device or cloud dependency.

use std::sync::Arc;

use anyhow::Context;
use bytes::Bytes;
use tracing::info;
use tracing_subscriber::EnvFilter;

use auth_adapters::SessionAuthGateway;
use configs::PinPointConfig;
use domains::{AuthUser, NewLostItem, PhotoUpload};
use services::{FeedState, FeedViewModel, LostItemMediaManager, LostItemRepository};
use storage_adapters::{MemoryBlobStore, MemoryDocumentStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    configs::load_dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cfg = PinPointConfig::load().context("loading configuration")?;

    // Explicitly constructed client handles, injected everywhere.
    let docs = Arc::new(MemoryDocumentStore::new(cfg.collection.clone()));
    let blobs = Arc::new(MemoryBlobStore::new(cfg.blob_url_prefix.clone()));
    let auth = Arc::new(SessionAuthGateway::new());

    auth.sign_in(AuthUser {
        uid: "demo-user".to_string(),
        display_name: Some("Demo User".to_string()),
        email: Some("demo@example.edu".to_string()),
    });

    let repo = Arc::new(LostItemRepository::new(docs.clone(), auth.clone()));
    let media = Arc::new(LostItemMediaManager::new(docs.clone(), blobs.clone(), auth.clone()));

    let madison = NewLostItem {
        item_name: "Black Backpack".to_string(),
        location: "Memorial Union Terrace".to_string(),
        description: "Laptop stickers on the front pocket".to_string(),
        city: "Madison".to_string(),
        state: cfg.default_state.clone(),
        latitude: 43.0766,
        longitude: -89.4004,
        contact_info: "demo@example.edu".to_string(),
        ..Default::default()
    };
    let chicago = NewLostItem {
        item_name: "Umbrella".to_string(),
        location: "Millennium Park".to_string(),
        description: "Red, wooden handle".to_string(),
        city: "Chicago".to_string(),
        state: "Illinois".to_string(),
        contact_info: "demo@example.edu".to_string(),
        ..Default::default()
    };

    let first = media
        .create_with_photo(PhotoUpload::jpeg(Bytes::from_static(b"backpack-photo")), &madison)
        .await
        .context("posting first report")?;
    let second = media
        .create_with_photo(PhotoUpload::jpeg(Bytes::from_static(b"umbrella-photo")), &chicago)
        .await
        .context("posting second report")?;
    info!(%first, %second, "seeded demo reports");

    let feed = FeedViewModel::new(repo);
    let mut state = feed.state();

    feed.load().await;
    let snapshot = state
        .wait_for(|s| matches!(s, FeedState::Ready(_)))
        .await
        .context("waiting for the feed")?;
    print_feed("all reports", &snapshot);
    drop(snapshot);

    feed.filter_by_location("Madison", &cfg.default_state).await;
    let snapshot = state
        .wait_for(|s| matches!(s, FeedState::Ready(_)))
        .await
        .context("waiting for the filtered feed")?;
    print_feed("Madison only", &snapshot);

    Ok(())
}

fn print_feed(label: &str, state: &FeedState) {
    if let FeedState::Ready(items) = state {
        println!("== {label} ({} item(s))", items.len());
        for item in items {
            println!(
                "  [{}] {} - {}, {} ({}) posted {}",
                item.status, item.item_name, item.city, item.state, item.user_name,
                item.date_posted.display()
            );
        }
    }
}
