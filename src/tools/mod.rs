pub mod llm;
pub mod structured;
pub mod tavily;

use crate::error::ExternalCallError;
use crate::models::{GenerationRequest, ReasoningRequest, ResearchOutcome};
use async_trait::async_trait;
use serde_json::Value;

pub use llm::RigReasoner;
pub use structured::OpenAiStructuredClient;

/// A multi-round reasoning call, optionally augmented with web search.
#[async_trait]
pub trait ReasoningClient: Send + Sync {
    async fn invoke(&self, request: ReasoningRequest) -> Result<ResearchOutcome, ExternalCallError>;
}

/// A single generation call constrained to a JSON schema.
#[async_trait]
pub trait StructuredGenerator: Send + Sync {
    async fn generate(&self, request: GenerationRequest) -> Result<Value, ExternalCallError>;
}
