use crate::error::ExternalCallError;
use crate::models::{ReasoningRequest, ResearchOutcome};
use crate::tools::tavily::{SearchRecorder, TavilySearch};
use crate::tools::ReasoningClient;
use async_trait::async_trait;
use rig::completion::{Prompt, PromptError};
use rig::prelude::*;
use rig::providers::openai;
use rig::tool::Tool;
use tracing::{info, instrument, warn};

type LLMAgent = rig::agent::Agent<openai::CompletionModel>;

/// Endpoint and credential for the OpenAI-compatible model gateway.
#[derive(Debug, Clone)]
pub struct GatewaySettings {
    pub api_key: String,
    pub base_url: String,
}

fn client(gateway: &GatewaySettings) -> openai::Client {
    openai::Client::from_url(&gateway.api_key, &gateway.base_url)
}

pub fn get_llm(gateway: &GatewaySettings, model: &str, preamble: &str) -> LLMAgent {
    client(gateway).agent(model).preamble(preamble).build()
}

pub fn get_llm_with_tool<T: Tool + Clone + 'static>(
    gateway: &GatewaySettings,
    model: &str,
    preamble: &str,
    tool: T,
) -> LLMAgent {
    client(gateway)
        .agent(model)
        .preamble(preamble)
        .tool(tool)
        .build()
}

/// Reasoning client backed by a rig agent. Search calls made by the agent are
/// captured as research steps.
#[derive(Debug, Clone)]
pub struct RigReasoner {
    gateway: GatewaySettings,
    tavily_api_key: Option<String>,
}

impl RigReasoner {
    pub fn new(gateway: GatewaySettings, tavily_api_key: Option<String>) -> Self {
        Self {
            gateway,
            tavily_api_key,
        }
    }
}

#[async_trait]
impl ReasoningClient for RigReasoner {
    #[instrument(skip(self, request), fields(model = %request.model, max_rounds = request.max_rounds))]
    async fn invoke(&self, request: ReasoningRequest) -> Result<ResearchOutcome, ExternalCallError> {
        let recorder = SearchRecorder::default();
        let agent = match request.search.clone() {
            Some(settings) => {
                let search = TavilySearch::new(self.tavily_api_key.clone(), settings, recorder.clone());
                get_llm_with_tool(&self.gateway, &request.model, &request.system_instruction, search)
            }
            None => get_llm(&self.gateway, &request.model, &request.system_instruction),
        };

        let result = agent
            .prompt(request.prompt.as_str())
            .multi_turn(request.max_rounds)
            .await;

        let narrative = match result {
            Ok(text) => text,
            Err(PromptError::MaxDepthError { max_depth, .. }) => {
                warn!("Research hit the {} round cap before a final answer", max_depth);
                String::new()
            }
            Err(PromptError::CompletionError(e)) => {
                return Err(ExternalCallError::Api(e.to_string()));
            }
            Err(e) => return Err(ExternalCallError::Other(e.to_string())),
        };

        let steps = recorder.take_steps();
        info!("Reasoning finished after {} tool calls", steps.len());
        Ok(ResearchOutcome { narrative, steps })
    }
}
