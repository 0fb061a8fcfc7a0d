use crate::models::{SearchSettings, Step, TavilySearchRequest, ToolResult};
use parking_lot::Mutex;
use rig::completion::ToolDefinition;
use rig::tool::Tool;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, warn};

const TAVILY_URL: &str = "https://api.tavily.com/search";

#[derive(Debug)]
pub struct TavilyError(String);

impl std::fmt::Display for TavilyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Tavily error: {}", self.0)
    }
}

impl std::error::Error for TavilyError {}

/// Collects the raw payload of every search call made during one research
/// session. Each call becomes its own [`Step`].
#[derive(Debug, Clone, Default)]
pub struct SearchRecorder {
    steps: Arc<Mutex<Vec<Step>>>,
}

impl SearchRecorder {
    pub fn record(&self, tool_name: &str, payload: Value) {
        self.steps.lock().push(Step {
            tool_results: vec![ToolResult {
                tool_name: tool_name.to_string(),
                payload,
            }],
        });
    }

    pub fn take_steps(&self) -> Vec<Step> {
        std::mem::take(&mut *self.steps.lock())
    }
}

#[derive(Debug, Clone)]
pub struct TavilySearch {
    api_key: Option<String>,
    settings: SearchSettings,
    recorder: SearchRecorder,
    http: reqwest::Client,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TavilySearchArgs {
    pub query: String,
}

impl TavilySearch {
    pub fn new(api_key: Option<String>, settings: SearchSettings, recorder: SearchRecorder) -> Self {
        Self {
            api_key,
            settings,
            recorder,
            http: reqwest::Client::new(),
        }
    }

    fn request_for(&self, query: String) -> TavilySearchRequest {
        TavilySearchRequest {
            query,
            max_results: self.settings.max_results,
            time_range: self.settings.time_range.clone(),
            search_depth: "advanced".to_string(),
            include_raw_content: false,
        }
    }

    async fn search(&self, query: String) -> Result<Value, TavilyError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| TavilyError("TAVILY_API_KEY not set".to_string()))?;

        let response = self
            .http
            .post(TAVILY_URL)
            .bearer_auth(api_key)
            .json(&self.request_for(query))
            .send()
            .await
            .map_err(|e| TavilyError(format!("Request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TavilyError(format!("Search returned {}", status)));
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| TavilyError(format!("Failed to parse response: {}", e)))
    }
}

impl Tool for TavilySearch {
    const NAME: &'static str = "web_search";

    type Error = TavilyError;
    type Args = TavilySearchArgs;
    type Output = Value;

    async fn definition(&self, _prompt: String) -> ToolDefinition {
        ToolDefinition {
            name: Self::NAME.to_string(),
            description: "Search the web for recent articles, statistics and competing content on a topic".to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "The search query"
                    }
                },
                "required": ["query"]
            }),
        }
    }

    /// Search failures are handed back to the model as an `error` payload so
    /// the research session can carry on with what it has.
    async fn call(&self, args: Self::Args) -> Result<Self::Output, Self::Error> {
        debug!(query_chars = args.query.chars().count(), "Searching");
        let payload = match self.search(args.query).await {
            Ok(payload) => payload,
            Err(e) => {
                warn!("Search failed: {}", e);
                json!({ "error": e.to_string() })
            }
        };
        self.recorder.record(Self::NAME, payload.clone());
        Ok(payload)
    }
}
