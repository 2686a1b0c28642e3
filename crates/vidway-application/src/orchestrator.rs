//! Quota-aware request orchestrator.
//!
//! Resolves every external call through one path: response cache, quota
//! reservation, rate limiting, retried fetch, cache population, and the
//! session resource hook. Concurrent identical cache misses collapse into a
//! single in-flight call.

use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use serde_json::Value;
use tokio::sync::broadcast;

use vidway_core::api::{ApiParams, VideoDataApi};
use vidway_core::cache::{ResponseCache, cache_key};
use vidway_core::config::GatewayConfig;
use vidway_core::error::{GatewayError, Result};
use vidway_core::quota::{QuotaLedger, QuotaSnapshot};
use vidway_core::rate::RateLimiter;
use vidway_core::resource::ResourceKind;
use vidway_core::retry::RetryPolicy;

use crate::session_service::SessionService;

/// One logical external call.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub endpoint: String,
    pub params: ApiParams,
    /// Cache TTL override; `None` uses the orchestrator default.
    pub ttl: Option<Duration>,
    /// When set, a successful fresh fetch is appended to the session
    /// context as a resource of this kind. Cache hits and single-flight
    /// joins never append.
    pub resource_kind: Option<ResourceKind>,
}

impl ApiRequest {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            params: ApiParams::new(),
            ttl: None,
            resource_kind: None,
        }
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    pub fn with_resource_kind(mut self, kind: ResourceKind) -> Self {
        self.resource_kind = Some(kind);
        self
    }
}

/// Aggregated orchestrator counters.
#[derive(Debug, Clone)]
pub struct OrchestratorStats {
    pub quota: QuotaSnapshot,
    pub cache_entries: usize,
    pub rate_tokens_available: f64,
}

type CallOutcome = Result<Value>;

struct Inner {
    api: Arc<dyn VideoDataApi>,
    cache: ResponseCache,
    quota: QuotaLedger,
    rate: RateLimiter,
    retry: RetryPolicy,
    sessions: Arc<SessionService>,
    inflight: StdMutex<HashMap<String, broadcast::Sender<CallOutcome>>>,
}

/// Mediates every call to the external data API.
#[derive(Clone)]
pub struct RequestOrchestrator {
    inner: Arc<Inner>,
}

impl RequestOrchestrator {
    pub fn new(
        api: Arc<dyn VideoDataApi>,
        sessions: Arc<SessionService>,
        config: &GatewayConfig,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                api,
                cache: ResponseCache::new(config.cache.ttl()),
                quota: QuotaLedger::new(config.quota.capacity, config.quota.window()),
                rate: RateLimiter::new(config.rate.tokens_per_second, config.rate.bucket_size),
                retry: RetryPolicy {
                    max_attempts: config.retry.max_attempts,
                    base_delay: config.retry.base_delay(),
                    max_delay: config.retry.max_delay(),
                    per_attempt_timeout: config.retry.per_attempt_timeout(),
                },
                sessions,
                inflight: StdMutex::new(HashMap::new()),
            }),
        }
    }

    /// Resolves one logical call.
    ///
    /// A cache hit returns immediately and charges nothing. On a miss the
    /// call reserves quota (fatal if exhausted, never refunded), waits for a
    /// rate token, fetches with bounded retries, populates the cache, and -
    /// when `session` is given and the request declares a resource kind -
    /// appends the result to that session.
    ///
    /// Concurrent calls that miss on the same cache key share one
    /// underlying fetch and one quota debit. The fetch runs on its own task,
    /// so a caller that abandons the call does not cancel it for the
    /// remaining waiters, and its quota debit stands.
    pub async fn call(&self, request: ApiRequest, session: Option<&str>) -> Result<Value> {
        let key = cache_key(&request.endpoint, &request.params);

        if let Some(hit) = self.inner.cache.get(&key).await {
            tracing::debug!(endpoint = %request.endpoint, "cache hit");
            return Ok(hit);
        }

        let mut rx = {
            let mut inflight = self.inner.inflight.lock().expect("inflight lock poisoned");
            if let Some(tx) = inflight.get(&key) {
                tracing::debug!(endpoint = %request.endpoint, "joining in-flight call");
                tx.subscribe()
            } else {
                let (tx, rx) = broadcast::channel(1);
                inflight.insert(key.clone(), tx);

                let inner = self.inner.clone();
                let session_ctx = session.map(str::to_string);
                tokio::spawn(async move {
                    let outcome = inner
                        .fetch_and_record(&request, &key, session_ctx.as_deref())
                        .await;
                    // The cache is already populated at this point, so a
                    // newcomer between remove and send either hits the cache
                    // or starts a legitimately fresh call.
                    let tx = inner
                        .inflight
                        .lock()
                        .expect("inflight lock poisoned")
                        .remove(&key);
                    if let Some(tx) = tx {
                        let _ = tx.send(outcome);
                    }
                });
                rx
            }
        };

        match rx.recv().await {
            Ok(outcome) => outcome,
            Err(_) => Err(GatewayError::internal(
                "in-flight call terminated without a result",
            )),
        }
    }

    /// Drops the cached response for a request, forcing the next call to
    /// fetch.
    pub async fn invalidate(&self, endpoint: &str, params: &ApiParams) {
        self.inner.cache.invalidate(&cache_key(endpoint, params)).await;
    }

    /// Current quota, cache, and rate counters.
    pub async fn stats(&self) -> OrchestratorStats {
        OrchestratorStats {
            quota: self.inner.quota.snapshot(),
            cache_entries: self.inner.cache.len().await,
            rate_tokens_available: self.inner.rate.available().await,
        }
    }
}

impl Inner {
    async fn fetch_and_record(
        &self,
        request: &ApiRequest,
        key: &str,
        session: Option<&str>,
    ) -> CallOutcome {
        let cost = self.api.cost(&request.endpoint);
        self.quota.reserve(cost)?;

        self.rate.acquire(1.0).await;

        let api = self.api.clone();
        let endpoint = request.endpoint.clone();
        let params = request.params.clone();
        // Quota reserved above is not refunded if this fails: the debit
        // models charges that occur on attempt, not on success.
        let value = self
            .retry
            .execute(|| {
                let api = api.clone();
                let endpoint = endpoint.clone();
                let params = params.clone();
                async move { api.fetch(&endpoint, &params).await }
            })
            .await?;

        self.cache.put(key, value.clone(), request.ttl).await;

        if let (Some(session_id), Some(kind)) = (session, request.resource_kind) {
            self.sessions
                .put_resource(Some(session_id), kind, value.clone())
                .await?;
        }

        Ok(value)
    }
}
