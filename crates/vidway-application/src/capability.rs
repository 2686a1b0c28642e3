//! Analysis capability negotiation.
//!
//! Content-analysis collaborators (transcription, object detection,
//! sentiment, visualization rendering) are optional. Instead of probing for
//! them and catching load failures, each collaborator reports its capability
//! set at registration, and callers query the registry. Analysis runs
//! outside the orchestrator's cache/retry path.

use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use vidway_core::error::{GatewayError, Result};

/// A kind of content analysis a collaborator may offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisKind {
    Transcription,
    ObjectDetection,
    Sentiment,
    Visualization,
}

impl AnalysisKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisKind::Transcription => "transcription",
            AnalysisKind::ObjectDetection => "object_detection",
            AnalysisKind::Sentiment => "sentiment",
            AnalysisKind::Visualization => "visualization",
        }
    }
}

impl fmt::Display for AnalysisKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Input handed to an analyzer.
#[derive(Debug, Clone)]
pub enum AnalysisInput {
    Bytes(Vec<u8>),
    Path(PathBuf),
}

/// A content-analysis collaborator.
#[async_trait]
pub trait Analyzer: Send + Sync {
    /// Stable name for logs and diagnostics.
    fn name(&self) -> &str;

    /// The analysis kinds this collaborator can perform.
    fn capabilities(&self) -> &[AnalysisKind];

    /// Runs one analysis. Only called with a kind from `capabilities`.
    async fn analyze(&self, kind: AnalysisKind, input: AnalysisInput) -> Result<Value>;
}

/// Registry of available analyzers, queried by capability.
#[derive(Default)]
pub struct CapabilityRegistry {
    analyzers: Vec<Arc<dyn Analyzer>>,
}

impl CapabilityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a collaborator and its advertised capabilities.
    pub fn register(&mut self, analyzer: Arc<dyn Analyzer>) {
        tracing::info!(
            name = analyzer.name(),
            capabilities = ?analyzer.capabilities(),
            "registered analyzer"
        );
        self.analyzers.push(analyzer);
    }

    /// All kinds some registered analyzer supports.
    pub fn available_kinds(&self) -> BTreeSet<AnalysisKind> {
        self.analyzers
            .iter()
            .flat_map(|a| a.capabilities().iter().copied())
            .collect()
    }

    pub fn supports(&self, kind: AnalysisKind) -> bool {
        self.analyzers
            .iter()
            .any(|a| a.capabilities().contains(&kind))
    }

    /// Routes an analysis to the first analyzer supporting `kind`.
    pub async fn analyze(&self, kind: AnalysisKind, input: AnalysisInput) -> Result<Value> {
        let analyzer = self
            .analyzers
            .iter()
            .find(|a| a.capabilities().contains(&kind))
            .ok_or_else(|| GatewayError::not_found("analyzer", kind.as_str()))?;
        analyzer.analyze(kind, input).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct FixedAnalyzer {
        name: &'static str,
        capabilities: Vec<AnalysisKind>,
    }

    #[async_trait]
    impl Analyzer for FixedAnalyzer {
        fn name(&self) -> &str {
            self.name
        }

        fn capabilities(&self) -> &[AnalysisKind] {
            &self.capabilities
        }

        async fn analyze(&self, kind: AnalysisKind, _input: AnalysisInput) -> Result<Value> {
            Ok(json!({"analyzer": self.name, "kind": kind.as_str()}))
        }
    }

    #[tokio::test]
    async fn test_routes_to_supporting_analyzer() {
        let mut registry = CapabilityRegistry::new();
        registry.register(Arc::new(FixedAnalyzer {
            name: "speech",
            capabilities: vec![AnalysisKind::Transcription],
        }));
        registry.register(Arc::new(FixedAnalyzer {
            name: "vision",
            capabilities: vec![AnalysisKind::ObjectDetection, AnalysisKind::Visualization],
        }));

        let result = registry
            .analyze(AnalysisKind::ObjectDetection, AnalysisInput::Bytes(vec![]))
            .await
            .unwrap();
        assert_eq!(result["analyzer"], json!("vision"));

        assert!(registry.supports(AnalysisKind::Transcription));
        assert!(!registry.supports(AnalysisKind::Sentiment));
        assert_eq!(registry.available_kinds().len(), 3);
    }

    #[tokio::test]
    async fn test_unsupported_kind_is_not_found() {
        let registry = CapabilityRegistry::new();
        let err = registry
            .analyze(AnalysisKind::Sentiment, AnalysisInput::Bytes(vec![]))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }
}
