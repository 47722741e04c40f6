//! Data model shared by the crawler and the storage layer
//!
//! - `ListingPage` / `RemotePost`: one decoded page of the remote listing
//! - `StoredAsset`: an image committed to content-addressed storage

mod asset;
mod post;

pub use asset::{extension_from_url, StoredAsset};
pub use post::{ListingPage, RemotePost};
