//! Backend API client and wire types.
//!
//! The backend merges SAM.gov, USASpending.gov and Grants.gov results and
//! optionally ranks them with an AI model. This module only speaks its
//! REST contract:
//!
//! - [`client`] - `ApiClient` with one method per endpoint
//! - [`types`] - serde models for items, profiles and responses

mod client;
mod types;

pub use client::{ApiClient, ApiError, FeedQuery};
pub use types::{
    default_profile, FeedItem, FeedResponse, Source, SourceId, SourceType, UnknownSource,
    UserProfile,
};
