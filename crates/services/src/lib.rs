//! pinpoint/crates/services/src/lib.rs
//!
//! Use-case orchestration for PinPoint: the lost-item repository, the media
//! manager's multi-step photo workflows, and the view-model state machines
//! the UI observes.

pub mod media;
pub mod repository;
pub mod view_model;

pub use media::LostItemMediaManager;
pub use repository::{ItemSubscription, LostItemRepository};
pub use view_model::detail::{DetailState, ItemDetailViewModel};
pub use view_model::feed::{FeedState, FeedViewModel};
pub use view_model::map::{Coordinate, MapState, MapViewModel, MarkerMode};
pub use view_model::owner::{OwnerItemView, OwnerItemsViewModel};
pub use view_model::upload::{UploadState, UploadViewModel};
