//! Durable storage for the vidway gateway: a pluggable key-value interface,
//! its file-backed implementation, and JSON repositories for sessions and
//! resources.

pub mod json_resource_repository;
pub mod json_session_repository;
pub mod paths;
pub mod storage;

pub use crate::json_resource_repository::JsonResourceRepository;
pub use crate::json_session_repository::JsonSessionRepository;
pub use crate::storage::{FileKvStore, KeyValueStore};
