//! Session and resource store service.
//!
//! Composes the session and resource repositories into the durable,
//! URI-addressable store the orchestrator writes into. Every mutating call
//! persists before returning success; writes within one session are
//! serialized so `resource_refs` keeps creation order, while writes across
//! different sessions proceed concurrently.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::Mutex;

use vidway_core::error::{GatewayError, Result};
use vidway_core::resource::{Resource, ResourceKind, ResourceRepository, ResourceUri};
use vidway_core::session::{Session, SessionRepository};

/// Durable, addressable persistence of call results keyed by session.
pub struct SessionService {
    sessions: Arc<dyn SessionRepository>,
    resources: Arc<dyn ResourceRepository>,
    /// Per-session write locks; entries are created on first use.
    session_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl SessionService {
    pub fn new(
        sessions: Arc<dyn SessionRepository>,
        resources: Arc<dyn ResourceRepository>,
    ) -> Self {
        Self {
            sessions,
            resources,
            session_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Creates a new session, persists it, and makes it active.
    pub async fn create_session(&self, title: impl Into<String>) -> Result<Session> {
        let session = Session::new(title);
        self.sessions.save(&session).await?;
        self.sessions.set_active_session_id(&session.id).await?;
        tracing::info!(session_id = %session.id, title = %session.title, "created session");
        Ok(session)
    }

    /// Returns the active session, or `None` when no pointer is set or the
    /// pointed-at session no longer exists.
    pub async fn get_active_session(&self) -> Result<Option<Session>> {
        match self.sessions.get_active_session_id().await? {
            Some(id) => self.sessions.find_by_id(&id).await,
            None => Ok(None),
        }
    }

    /// Makes an existing session the active one.
    pub async fn switch_active(&self, session_id: &str) -> Result<()> {
        if self.sessions.find_by_id(session_id).await?.is_none() {
            return Err(GatewayError::not_found("session", session_id));
        }
        self.sessions.set_active_session_id(session_id).await?;
        tracing::info!(session_id, "switched active session");
        Ok(())
    }

    /// Returns the active session, creating one with `default_title` if
    /// none exists yet.
    pub async fn ensure_active_session(&self, default_title: &str) -> Result<Session> {
        if let Some(session) = self.get_active_session().await? {
            return Ok(session);
        }
        self.create_session(default_title).await
    }

    /// Lists all sessions, most recently updated first.
    pub async fn list_sessions(&self) -> Result<Vec<Session>> {
        self.sessions.list_all().await
    }

    /// Deletes a session and the resources it owns.
    pub async fn delete_session(&self, session_id: &str) -> Result<()> {
        let lock = self.session_lock(session_id).await;
        let _guard = lock.lock().await;

        let Some(session) = self.sessions.find_by_id(session_id).await? else {
            return Ok(());
        };

        for uri in &session.resource_refs {
            self.resources.delete(uri).await?;
        }
        self.sessions.delete(session_id).await?;

        // An empty pointer reads back as no active session.
        if self.sessions.get_active_session_id().await?.as_deref() == Some(session_id) {
            self.sessions.set_active_session_id("").await?;
        }
        tracing::info!(session_id, "deleted session");
        Ok(())
    }

    /// Stores a payload as a new resource, linking it into `session_id`
    /// when one is given.
    ///
    /// The resource record is persisted first, then the session's
    /// `resource_refs`; only after both writes succeed is the URI returned.
    pub async fn put_resource(
        &self,
        session_id: Option<&str>,
        kind: ResourceKind,
        payload: Value,
    ) -> Result<ResourceUri> {
        let Some(session_id) = session_id else {
            let resource = Resource::new(kind, payload, None);
            self.resources.save(&resource).await?;
            return Ok(resource.uri);
        };

        let lock = self.session_lock(session_id).await;
        let _guard = lock.lock().await;

        let mut session = self
            .sessions
            .find_by_id(session_id)
            .await?
            .ok_or_else(|| GatewayError::not_found("session", session_id))?;

        let resource = Resource::new(kind, payload, Some(session_id.to_string()));
        self.resources.save(&resource).await?;

        session.add_resource(resource.uri.clone());
        self.sessions.save(&session).await?;

        tracing::debug!(session_id, uri = %resource.uri, "stored resource");
        Ok(resource.uri)
    }

    /// Reads a resource payload by URI string.
    ///
    /// `vidway://session/{id}` returns the session record itself as JSON;
    /// other kinds return the stored payload.
    pub async fn read_resource(&self, uri: &str) -> Result<Value> {
        let uri = ResourceUri::parse(uri)?;

        if uri.kind() == ResourceKind::Session {
            let session = self
                .sessions
                .find_by_id(uri.id())
                .await?
                .ok_or_else(|| GatewayError::not_found("session", uri.id().to_string()))?;
            return Ok(serde_json::to_value(&session)?);
        }

        let resource = self
            .resources
            .find_by_uri(&uri)
            .await?
            .ok_or_else(|| GatewayError::not_found("resource", uri.to_string()))?;
        Ok(resource.payload)
    }

    /// Lists a session's resource URIs in creation order.
    pub async fn list_resources(&self, session_id: &str) -> Result<Vec<ResourceUri>> {
        let session = self
            .sessions
            .find_by_id(session_id)
            .await?
            .ok_or_else(|| GatewayError::not_found("session", session_id))?;
        Ok(session.resource_refs)
    }

    /// Records a search query and the video ids it surfaced.
    pub async fn record_search<I, S>(&self, session_id: &str, query: &str, video_ids: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let lock = self.session_lock(session_id).await;
        let _guard = lock.lock().await;

        let mut session = self
            .sessions
            .find_by_id(session_id)
            .await?
            .ok_or_else(|| GatewayError::not_found("session", session_id))?;
        session.add_search_query(query);
        session.add_video_ids(video_ids);
        self.sessions.save(&session).await
    }

    /// Records video ids surfaced by a detail fetch.
    pub async fn record_video_ids<I, S>(&self, session_id: &str, video_ids: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let lock = self.session_lock(session_id).await;
        let _guard = lock.lock().await;

        let mut session = self
            .sessions
            .find_by_id(session_id)
            .await?
            .ok_or_else(|| GatewayError::not_found("session", session_id))?;
        session.add_video_ids(video_ids);
        self.sessions.save(&session).await
    }

    async fn session_lock(&self, session_id: &str) -> Arc<Mutex<()>> {
        let mut locks = self.session_locks.lock().await;
        locks
            .entry(session_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;
    use vidway_infrastructure::{FileKvStore, JsonResourceRepository, JsonSessionRepository};

    fn service(temp_dir: &TempDir) -> SessionService {
        let store: Arc<dyn vidway_infrastructure::KeyValueStore> =
            Arc::new(FileKvStore::new(temp_dir.path()).unwrap());
        SessionService::new(
            Arc::new(JsonSessionRepository::new(store.clone())),
            Arc::new(JsonResourceRepository::new(store)),
        )
    }

    #[tokio::test]
    async fn test_create_session_becomes_active() {
        let temp_dir = TempDir::new().unwrap();
        let service = service(&temp_dir);

        let session = service.create_session("analysis").await.unwrap();
        let active = service.get_active_session().await.unwrap().unwrap();
        assert_eq!(active.id, session.id);
    }

    #[tokio::test]
    async fn test_switch_active_rejects_unknown_session() {
        let temp_dir = TempDir::new().unwrap();
        let service = service(&temp_dir);

        let err = service.switch_active("nope").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_resource_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let service = service(&temp_dir);

        let session = service.create_session("round trip").await.unwrap();
        let payload = json!({"items": ["a", "b"]});
        let uri = service
            .put_resource(Some(&session.id), ResourceKind::Search, payload.clone())
            .await
            .unwrap();

        let loaded = service.read_resource(&uri.to_string()).await.unwrap();
        assert_eq!(loaded, payload);
    }

    #[tokio::test]
    async fn test_sessionless_resource_reachable_by_uri_only() {
        let temp_dir = TempDir::new().unwrap();
        let service = service(&temp_dir);

        let uri = service
            .put_resource(None, ResourceKind::Artifact, json!("blob"))
            .await
            .unwrap();
        assert_eq!(
            service.read_resource(&uri.to_string()).await.unwrap(),
            json!("blob")
        );
    }

    #[tokio::test]
    async fn test_list_resources_preserves_creation_order() {
        let temp_dir = TempDir::new().unwrap();
        let service = service(&temp_dir);

        let session = service.create_session("ordering").await.unwrap();
        let first = service
            .put_resource(Some(&session.id), ResourceKind::Search, json!(1))
            .await
            .unwrap();
        let second = service
            .put_resource(Some(&session.id), ResourceKind::Detail, json!(2))
            .await
            .unwrap();
        let third = service
            .put_resource(Some(&session.id), ResourceKind::Artifact, json!(3))
            .await
            .unwrap();

        let listed = service.list_resources(&session.id).await.unwrap();
        assert_eq!(listed, vec![first, second, third]);
    }

    #[tokio::test]
    async fn test_read_resource_rejects_malformed_uri() {
        let temp_dir = TempDir::new().unwrap();
        let service = service(&temp_dir);

        let err = service.read_resource("not-a-uri").await.unwrap_err();
        assert!(matches!(err, GatewayError::InvalidUri(_)));
    }

    #[tokio::test]
    async fn test_read_session_uri_returns_session_record() {
        let temp_dir = TempDir::new().unwrap();
        let service = service(&temp_dir);

        let session = service.create_session("overview").await.unwrap();
        let value = service
            .read_resource(&format!("vidway://session/{}", session.id))
            .await
            .unwrap();
        assert_eq!(value["title"], json!("overview"));
    }

    #[tokio::test]
    async fn test_delete_session_removes_owned_resources_and_pointer() {
        let temp_dir = TempDir::new().unwrap();
        let service = service(&temp_dir);

        let session = service.create_session("doomed").await.unwrap();
        let uri = service
            .put_resource(Some(&session.id), ResourceKind::Search, json!(1))
            .await
            .unwrap();

        service.delete_session(&session.id).await.unwrap();

        assert!(service.get_active_session().await.unwrap().is_none());
        let err = service.read_resource(&uri.to_string()).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_record_search_deduplicates() {
        let temp_dir = TempDir::new().unwrap();
        let service = service(&temp_dir);

        let session = service.create_session("searches").await.unwrap();
        service
            .record_search(&session.id, "rust", ["v1", "v2"])
            .await
            .unwrap();
        service
            .record_search(&session.id, "rust", ["v2", "v3"])
            .await
            .unwrap();

        let reloaded = service.get_active_session().await.unwrap().unwrap();
        assert_eq!(reloaded.search_queries, vec!["rust"]);
        assert_eq!(reloaded.video_ids, vec!["v1", "v2", "v3"]);
    }

    #[tokio::test]
    async fn test_concurrent_appends_to_one_session_all_land() {
        let temp_dir = TempDir::new().unwrap();
        let service = Arc::new(service(&temp_dir));

        let session = service.create_session("contended").await.unwrap();
        let tasks: Vec<_> = (0..8)
            .map(|i| {
                let service = service.clone();
                let session_id = session.id.clone();
                tokio::spawn(async move {
                    service
                        .put_resource(Some(&session_id), ResourceKind::Detail, json!(i))
                        .await
                        .unwrap()
                })
            })
            .collect();
        for task in tasks {
            task.await.unwrap();
        }

        let listed = service.list_resources(&session.id).await.unwrap();
        assert_eq!(listed.len(), 8);
    }
}
