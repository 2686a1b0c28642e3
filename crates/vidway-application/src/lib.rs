//! Application services for the vidway gateway: the request orchestrator,
//! the session/resource store, analysis capability negotiation, and the
//! typed facade that wires them together.

pub mod capability;
pub mod gateway;
pub mod orchestrator;
pub mod session_service;

pub use capability::{AnalysisInput, AnalysisKind, Analyzer, CapabilityRegistry};
pub use gateway::VideoGateway;
pub use orchestrator::{ApiRequest, OrchestratorStats, RequestOrchestrator};
pub use session_service::SessionService;
