//! External video data API boundary.
//!
//! The gateway never talks to the remote service directly; it goes through
//! the [`VideoDataApi`] trait, which also declares the quota cost of each
//! endpoint. Failures cross this boundary already tagged as transient or
//! permanent, so retry classification never inspects free-text messages.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::error::GatewayError;

/// An error returned by the external data API collaborator.
///
/// The two variants are the complete retry classification: `Transient`
/// failures (network timeouts, 5xx-equivalents, remote throttling) may be
/// retried; `Permanent` failures (bad input, not-found, authorization) must
/// not be.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApiError {
    #[error("transient: {0}")]
    Transient(String),
    #[error("permanent: {0}")]
    Permanent(String),
}

impl ApiError {
    pub fn transient(message: impl Into<String>) -> Self {
        Self::Transient(message.into())
    }

    pub fn permanent(message: impl Into<String>) -> Self {
        Self::Permanent(message.into())
    }

    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient(_))
    }
}

impl From<ApiError> for GatewayError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Transient(message) => GatewayError::Transient(message),
            ApiError::Permanent(message) => GatewayError::Permanent(message),
        }
    }
}

/// Request parameters, keyed in sorted order.
///
/// A `BTreeMap` keeps parameter iteration deterministic, which the cache key
/// derivation relies on.
pub type ApiParams = BTreeMap<String, String>;

/// The boundary with the remote video data API.
///
/// Implementations perform one logical remote call per `fetch` invocation
/// and report its quota cost through `cost`. They do not retry, cache, or
/// rate-limit; that is the orchestrator's job.
#[async_trait]
pub trait VideoDataApi: Send + Sync {
    /// Fetches `endpoint` with the given parameters.
    async fn fetch(&self, endpoint: &str, params: &ApiParams) -> Result<Value, ApiError>;

    /// Quota units charged for one call to `endpoint`.
    fn cost(&self, endpoint: &str) -> u64;
}
