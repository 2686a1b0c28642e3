//! Resource domain model.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::uri::{ResourceKind, ResourceUri};

/// A durably stored, URI-addressable result of a prior call.
///
/// The URI is assigned at creation and never changes. A resource created
/// within a session belongs to exactly that session; otherwise it is
/// session-less and reachable only by direct URI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub uri: ResourceUri,
    pub kind: ResourceKind,
    /// The stored payload, opaque to the store.
    pub payload: Value,
    /// Owning session, if the resource was created in a session context.
    pub session_id: Option<String>,
    /// Timestamp when the resource was created (RFC 3339).
    pub created_at: String,
}

impl Resource {
    /// Creates a resource with a fresh random identifier.
    pub fn new(kind: ResourceKind, payload: Value, session_id: Option<String>) -> Self {
        Self {
            uri: ResourceUri::new(kind, Uuid::new_v4().to_string()),
            kind,
            payload,
            session_id,
            created_at: Utc::now().to_rfc3339(),
        }
    }
}
