use crate::config::AppConfig;
use crate::error::AnalyzeError;
use crate::models::AnalysisResponse;
use crate::schema::validate_verdict;
use crate::stages::{extract_sources, ResearchStage, SynthesisInput, SynthesisStage};
use crate::tools::llm::GatewaySettings;
use crate::tools::{OpenAiStructuredClient, RigReasoner};
use std::sync::Arc;
use tracing::{info, instrument};

/// Research, then evidence extraction, then synthesis, then validation.
/// Strictly sequential; nothing is shared between runs.
pub struct ContentPipeline {
    research: ResearchStage,
    synthesis: SynthesisStage,
}

impl ContentPipeline {
    pub fn new(research: ResearchStage, synthesis: SynthesisStage) -> Self {
        Self {
            research,
            synthesis,
        }
    }

    /// Production wiring: rig-driven research and structured generation
    /// through the configured gateway.
    pub fn from_config(config: &AppConfig) -> Self {
        let gateway = GatewaySettings {
            api_key: config.gateway_api_key.clone().unwrap_or_default(),
            base_url: config.gateway_base_url.clone(),
        };
        let reasoner = RigReasoner::new(gateway.clone(), config.tavily_api_key.clone());
        let generator = OpenAiStructuredClient::new(gateway);

        Self::new(
            ResearchStage::new(Arc::new(reasoner), config.research_model.clone()),
            SynthesisStage::new(Arc::new(generator), config.synthesis_model.clone()),
        )
    }

    /// `content` must already be trimmed and non-empty.
    #[instrument(skip_all, fields(content_chars = content.chars().count()))]
    pub async fn analyze(&self, content: &str) -> Result<AnalysisResponse, AnalyzeError> {
        let research = self.research.run(content).await?;

        let sources = extract_sources(&research.steps);
        info!("Extracted {} sources from {} steps", sources.len(), research.steps.len());

        let candidate = self
            .synthesis
            .run(SynthesisInput {
                narrative: &research.narrative,
                sources: &sources,
                content,
            })
            .await?;

        let verdict = validate_verdict(&candidate)?;
        info!(score = verdict.content_score, "Analysis validated");

        Ok(AnalysisResponse::new(verdict, sources))
    }
}
