//! Pluggable durable storage.

pub mod kv;

pub use kv::{FileKvStore, KeyValueStore};
