//! Session repository trait.
//!
//! Defines the interface for session persistence operations.

use async_trait::async_trait;

use super::model::Session;
use crate::error::Result;

/// An abstract repository for managing session persistence.
///
/// This trait decouples the gateway's session logic from the specific
/// storage mechanism (file-backed key-value store, embedded database,
/// remote KV). Implementations must make every successful `save` durable
/// before returning.
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Finds a session by its ID.
    ///
    /// Returns `Ok(None)` when no such session exists.
    async fn find_by_id(&self, session_id: &str) -> Result<Option<Session>>;

    /// Saves a session to storage.
    async fn save(&self, session: &Session) -> Result<()>;

    /// Deletes a session from storage. Deleting a missing session is not an
    /// error.
    async fn delete(&self, session_id: &str) -> Result<()>;

    /// Lists all stored sessions, most recently updated first.
    async fn list_all(&self) -> Result<Vec<Session>>;

    /// Gets the ID of the currently active session, if one is set.
    async fn get_active_session_id(&self) -> Result<Option<String>>;

    /// Sets the ID of the currently active session.
    async fn set_active_session_id(&self, session_id: &str) -> Result<()>;
}
