//! JSON-backed SessionRepository implementation.

use std::sync::Arc;

use async_trait::async_trait;

use vidway_core::error::{GatewayError, Result};
use vidway_core::session::{Session, SessionRepository};

use crate::storage::KeyValueStore;

const SESSIONS_PREFIX: &str = "sessions";
const ACTIVE_SESSION_KEY: &str = "active_session";

/// Stores sessions as individual JSON records in a key-value store.
///
/// Layout:
/// - `sessions/{id}` - one record per session
/// - `active_session` - the active session pointer
pub struct JsonSessionRepository {
    store: Arc<dyn KeyValueStore>,
}

impl JsonSessionRepository {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    fn session_key(session_id: &str) -> String {
        format!("{SESSIONS_PREFIX}/{session_id}")
    }
}

#[async_trait]
impl SessionRepository for JsonSessionRepository {
    async fn find_by_id(&self, session_id: &str) -> Result<Option<Session>> {
        match self.store.get(&Self::session_key(session_id)).await? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    async fn save(&self, session: &Session) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(session)?;
        self.store.put(&Self::session_key(&session.id), &bytes).await
    }

    async fn delete(&self, session_id: &str) -> Result<()> {
        self.store.delete(&Self::session_key(session_id)).await
    }

    async fn list_all(&self) -> Result<Vec<Session>> {
        let keys = self.store.list_keys(SESSIONS_PREFIX).await?;
        let mut sessions = Vec::with_capacity(keys.len());

        for key in keys {
            let Some(bytes) = self.store.get(&key).await? else {
                continue;
            };
            match serde_json::from_slice::<Session>(&bytes) {
                Ok(session) => sessions.push(session),
                Err(e) => {
                    tracing::warn!(key = %key, error = %e, "skipping unreadable session record");
                }
            }
        }

        // Most recently updated first.
        sessions.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(sessions)
    }

    async fn get_active_session_id(&self) -> Result<Option<String>> {
        match self.store.get(ACTIVE_SESSION_KEY).await? {
            Some(bytes) => {
                let id = String::from_utf8(bytes).map_err(|e| {
                    GatewayError::storage(format!("active session pointer is not UTF-8: {e}"))
                })?;
                let id = id.trim().to_string();
                Ok((!id.is_empty()).then_some(id))
            }
            None => Ok(None),
        }
    }

    async fn set_active_session_id(&self, session_id: &str) -> Result<()> {
        self.store
            .put(ACTIVE_SESSION_KEY, session_id.as_bytes())
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::FileKvStore;
    use tempfile::TempDir;

    fn repository(temp_dir: &TempDir) -> JsonSessionRepository {
        let store = Arc::new(FileKvStore::new(temp_dir.path()).unwrap());
        JsonSessionRepository::new(store)
    }

    #[tokio::test]
    async fn test_save_and_find_by_id() {
        let temp_dir = TempDir::new().unwrap();
        let repository = repository(&temp_dir);

        let session = Session::new("test session");
        repository.save(&session).await.unwrap();

        let loaded = repository.find_by_id(&session.id).await.unwrap().unwrap();
        assert_eq!(loaded, session);
    }

    #[tokio::test]
    async fn test_find_missing_session_is_none() {
        let temp_dir = TempDir::new().unwrap();
        let repository = repository(&temp_dir);
        assert!(repository.find_by_id("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_all_sorted_by_updated_at_desc() {
        let temp_dir = TempDir::new().unwrap();
        let repository = repository(&temp_dir);

        let mut first = Session::new("first");
        first.updated_at = "2024-01-01T00:00:00Z".to_string();
        let mut second = Session::new("second");
        second.updated_at = "2024-06-01T00:00:00Z".to_string();
        repository.save(&first).await.unwrap();
        repository.save(&second).await.unwrap();

        let sessions = repository.list_all().await.unwrap();
        assert_eq!(sessions.len(), 2);
        assert_eq!(sessions[0].title, "second");
        assert_eq!(sessions[1].title, "first");
    }

    #[tokio::test]
    async fn test_delete() {
        let temp_dir = TempDir::new().unwrap();
        let repository = repository(&temp_dir);

        let session = Session::new("to delete");
        repository.save(&session).await.unwrap();
        repository.delete(&session.id).await.unwrap();

        assert!(repository.find_by_id(&session.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_active_session_id() {
        let temp_dir = TempDir::new().unwrap();
        let repository = repository(&temp_dir);

        assert_eq!(repository.get_active_session_id().await.unwrap(), None);

        repository.set_active_session_id("session-1").await.unwrap();
        assert_eq!(
            repository.get_active_session_id().await.unwrap(),
            Some("session-1".to_string())
        );
    }

    #[tokio::test]
    async fn test_records_survive_reopening_the_store() {
        let temp_dir = TempDir::new().unwrap();
        let session = Session::new("durable");

        {
            let repository = repository(&temp_dir);
            repository.save(&session).await.unwrap();
            repository.set_active_session_id(&session.id).await.unwrap();
        }

        // A fresh repository over the same directory sees the records.
        let reopened = repository(&temp_dir);
        assert!(reopened.find_by_id(&session.id).await.unwrap().is_some());
        assert_eq!(
            reopened.get_active_session_id().await.unwrap(),
            Some(session.id.clone())
        );
    }
}
