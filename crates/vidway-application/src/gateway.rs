//! Typed gateway facade.
//!
//! Thin, session-aware wrappers over the orchestrator for the common
//! endpoints. Each method builds the canonical parameter map, declares the
//! resource kind recorded on fresh fetches, and parses the raw payload into
//! the typed models.

use std::path::Path;
use std::sync::Arc;

use vidway_api::{ChannelInfo, Comment, HttpVideoApi, SearchResult, VideoMetadata};
use vidway_core::api::VideoDataApi;
use vidway_core::config::GatewayConfig;
use vidway_core::error::Result;
use vidway_core::resource::ResourceKind;
use vidway_infrastructure::{FileKvStore, JsonResourceRepository, JsonSessionRepository, paths};

use crate::orchestrator::{ApiRequest, RequestOrchestrator};
use crate::session_service::SessionService;

const MAX_RESULTS_LIMIT: u32 = 50;

/// The assembled gateway: orchestrator plus session store.
pub struct VideoGateway {
    orchestrator: RequestOrchestrator,
    sessions: Arc<SessionService>,
}

impl VideoGateway {
    /// Assembles a gateway from an API boundary, a session service, and
    /// configuration.
    pub fn new(
        api: Arc<dyn VideoDataApi>,
        sessions: Arc<SessionService>,
        config: &GatewayConfig,
    ) -> Self {
        Self {
            orchestrator: RequestOrchestrator::new(api, sessions.clone(), config),
            sessions,
        }
    }

    /// Opens a gateway backed by file storage and the HTTP API client.
    ///
    /// Storage lands in `config.storage.data_dir`, defaulting to
    /// `~/.vidway`.
    pub fn open(api_key: impl Into<String>, config: &GatewayConfig) -> Result<Self> {
        let data_dir = match &config.storage.data_dir {
            Some(dir) => dir.clone(),
            None => paths::default_data_dir()?,
        };
        Self::open_at(api_key, config, data_dir)
    }

    /// Opens a gateway with file storage rooted at `data_dir`.
    pub fn open_at(
        api_key: impl Into<String>,
        config: &GatewayConfig,
        data_dir: impl AsRef<Path>,
    ) -> Result<Self> {
        let store: Arc<dyn vidway_infrastructure::KeyValueStore> =
            Arc::new(FileKvStore::new(data_dir)?);
        let sessions = Arc::new(SessionService::new(
            Arc::new(JsonSessionRepository::new(store.clone())),
            Arc::new(JsonResourceRepository::new(store)),
        ));
        let api = Arc::new(HttpVideoApi::new(api_key));
        Ok(Self::new(api, sessions, config))
    }

    /// The session/resource store this gateway records into.
    pub fn sessions(&self) -> &Arc<SessionService> {
        &self.sessions
    }

    /// The underlying orchestrator, for direct calls and stats.
    pub fn orchestrator(&self) -> &RequestOrchestrator {
        &self.orchestrator
    }

    /// Searches for videos. Within a session, the query and the surfaced
    /// video ids are recorded alongside the search resource.
    pub async fn search_videos(
        &self,
        query: &str,
        max_results: u32,
        session: Option<&str>,
    ) -> Result<Vec<SearchResult>> {
        let request = ApiRequest::new("search")
            .with_param("part", "snippet")
            .with_param("type", "video")
            .with_param("q", query)
            .with_param("maxResults", max_results.min(MAX_RESULTS_LIMIT).to_string())
            .with_resource_kind(ResourceKind::Search);

        let payload = self.orchestrator.call(request, session).await?;
        let results = SearchResult::from_response(&payload);

        if let Some(session_id) = session {
            let video_ids: Vec<String> = results.iter().map(|r| r.video_id.clone()).collect();
            self.sessions
                .record_search(session_id, query, video_ids)
                .await?;
        }

        Ok(results)
    }

    /// Fetches detailed metadata for a batch of videos.
    pub async fn video_details(
        &self,
        video_ids: &[String],
        session: Option<&str>,
    ) -> Result<Vec<VideoMetadata>> {
        let request = ApiRequest::new("videos")
            .with_param("part", "snippet,statistics,contentDetails")
            .with_param("id", video_ids.join(","))
            .with_resource_kind(ResourceKind::Detail);

        let payload = self.orchestrator.call(request, session).await?;
        let videos = VideoMetadata::from_response(&payload);

        if let Some(session_id) = session {
            let ids: Vec<String> = videos.iter().map(|v| v.video_id.clone()).collect();
            self.sessions.record_video_ids(session_id, ids).await?;
        }

        Ok(videos)
    }

    /// Fetches channel information.
    pub async fn channel_info(
        &self,
        channel_id: &str,
        session: Option<&str>,
    ) -> Result<Option<ChannelInfo>> {
        let request = ApiRequest::new("channels")
            .with_param("part", "snippet,statistics")
            .with_param("id", channel_id)
            .with_resource_kind(ResourceKind::Detail);

        let payload = self.orchestrator.call(request, session).await?;
        Ok(ChannelInfo::from_response(&payload).into_iter().next())
    }

    /// Fetches top-level comments for a video.
    pub async fn video_comments(
        &self,
        video_id: &str,
        max_results: u32,
        session: Option<&str>,
    ) -> Result<Vec<Comment>> {
        let request = ApiRequest::new("commentThreads")
            .with_param("part", "snippet")
            .with_param("videoId", video_id)
            .with_param("maxResults", max_results.min(MAX_RESULTS_LIMIT).to_string())
            .with_resource_kind(ResourceKind::Detail);

        let payload = self.orchestrator.call(request, session).await?;
        Ok(Comment::from_response(&payload))
    }
}
