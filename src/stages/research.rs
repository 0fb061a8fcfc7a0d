use crate::error::ExternalCallError;
use crate::models::{ReasoningRequest, ResearchOutcome, SearchSettings};
use crate::tools::ReasoningClient;
use std::sync::Arc;
use tracing::{info, instrument};

/// Upper bound on reasoning/tool-call rounds per research session.
pub const RESEARCH_MAX_ROUNDS: usize = 5;
pub const SEARCH_MAX_RESULTS: u32 = 5;
pub const SEARCH_TIME_RANGE: &str = "month";

const RESEARCH_INSTRUCTION: &str = r#"You are a research assistant that checks written content for freshness, originality and sourcing.

Use the web_search tool to:
- Verify the claims, statistics and dates in the content against current sources
- Find newer data that supersedes anything outdated
- Find competing articles on the same topic and note what they cover that this content does not

Finish with a concise research summary: which claims are current, which are outdated or unsupported, and how the content compares to what already ranks for the topic. Mention the sources you relied on."#;

/// First phase: an agentic research session over the submitted content.
pub struct ResearchStage {
    client: Arc<dyn ReasoningClient>,
    model: String,
}

impl ResearchStage {
    pub fn new(client: Arc<dyn ReasoningClient>, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }

    fn request_for(&self, content: &str) -> ReasoningRequest {
        ReasoningRequest {
            model: self.model.clone(),
            system_instruction: RESEARCH_INSTRUCTION.to_string(),
            prompt: format!("Research the following content:\n\n{}", content),
            search: Some(SearchSettings {
                max_results: SEARCH_MAX_RESULTS,
                time_range: SEARCH_TIME_RANGE.to_string(),
            }),
            max_rounds: RESEARCH_MAX_ROUNDS,
        }
    }

    /// Runs until the model answers or the round cap is hit. Whatever
    /// narrative and steps exist at that point are returned; only a failed
    /// call is an error.
    #[instrument(skip_all)]
    pub async fn run(&self, content: &str) -> Result<ResearchOutcome, ExternalCallError> {
        let start_time = std::time::Instant::now();
        info!("Starting research");

        let outcome = self.client.invoke(self.request_for(content)).await?;

        info!(
            steps = outcome.steps.len(),
            narrative_chars = outcome.narrative.chars().count(),
            "Research finished in {:?}",
            start_time.elapsed()
        );
        Ok(outcome)
    }
}
