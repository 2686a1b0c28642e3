//! Remote video data API collaborator: typed response models and the
//! `reqwest`-backed implementation of the boundary trait.

pub mod client;
pub mod models;

pub use client::{HttpVideoApi, classify_status, endpoint_cost};
pub use models::{ChannelInfo, Comment, SearchResult, Transcript, VideoMetadata};
