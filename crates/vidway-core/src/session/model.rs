//! Session domain model.
//!
//! A session is a named, durable grouping of the resource records produced
//! across multiple gateway calls.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::resource::ResourceUri;

/// A named, time-ordered container of resource records.
///
/// A session tracks:
/// - The URIs of every resource created within it, in creation order
/// - The search queries issued under it (deduplicated)
/// - The video ids those calls surfaced (deduplicated)
/// - Timestamps for creation and last update (RFC 3339)
///
/// `resource_refs` is append-only; the order of entries is the order the
/// resources were created, never the order they were last read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Unique session identifier (UUID format).
    pub id: String,
    /// Human-readable session title.
    pub title: String,
    /// Timestamp when the session was created (RFC 3339).
    pub created_at: String,
    /// Timestamp when the session was last updated (RFC 3339).
    pub updated_at: String,
    /// URIs of resources created within this session, in creation order.
    #[serde(default)]
    pub resource_refs: Vec<ResourceUri>,
    /// Search queries issued within this session.
    #[serde(default)]
    pub search_queries: Vec<String>,
    /// Video ids surfaced by calls within this session.
    #[serde(default)]
    pub video_ids: Vec<String>,
}

impl Session {
    /// Creates a new session with a fresh UUID and current timestamps.
    pub fn new(title: impl Into<String>) -> Self {
        let now = Utc::now().to_rfc3339();
        Self {
            id: Uuid::new_v4().to_string(),
            title: title.into(),
            created_at: now.clone(),
            updated_at: now,
            resource_refs: Vec::new(),
            search_queries: Vec::new(),
            video_ids: Vec::new(),
        }
    }

    /// Appends a resource URI and refreshes `updated_at`.
    pub fn add_resource(&mut self, uri: ResourceUri) {
        self.resource_refs.push(uri);
        self.touch();
    }

    /// Records a search query, skipping duplicates.
    pub fn add_search_query(&mut self, query: impl Into<String>) {
        let query = query.into();
        if !self.search_queries.contains(&query) {
            self.search_queries.push(query);
            self.touch();
        }
    }

    /// Records video ids, skipping duplicates and preserving first-seen
    /// order.
    pub fn add_video_ids<I, S>(&mut self, ids: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut changed = false;
        for id in ids {
            let id = id.into();
            if !self.video_ids.contains(&id) {
                self.video_ids.push(id);
                changed = true;
            }
        }
        if changed {
            self.touch();
        }
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now().to_rfc3339();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::{ResourceKind, ResourceUri};

    #[test]
    fn test_new_session_has_unique_id() {
        let a = Session::new("one");
        let b = Session::new("two");
        assert_ne!(a.id, b.id);
        assert!(a.resource_refs.is_empty());
    }

    #[test]
    fn test_add_resource_preserves_order() {
        let mut session = Session::new("ordering");
        let first = ResourceUri::new(ResourceKind::Search, "s1");
        let second = ResourceUri::new(ResourceKind::Detail, "d1");
        session.add_resource(first.clone());
        session.add_resource(second.clone());
        assert_eq!(session.resource_refs, vec![first, second]);
    }

    #[test]
    fn test_add_search_query_deduplicates() {
        let mut session = Session::new("queries");
        session.add_search_query("rust");
        session.add_search_query("rust");
        session.add_search_query("tokio");
        assert_eq!(session.search_queries, vec!["rust", "tokio"]);
    }

    #[test]
    fn test_add_video_ids_deduplicates_preserving_order() {
        let mut session = Session::new("videos");
        session.add_video_ids(["a", "b"]);
        session.add_video_ids(["b", "c"]);
        assert_eq!(session.video_ids, vec!["a", "b", "c"]);
    }
}
