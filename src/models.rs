use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisRequest {
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeuristicRequest {
    #[serde(default)]
    pub fields: HashMap<String, String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Impact {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    pub title: String,
    pub impact: Impact,
    pub recommendation: String,
}

/// The part of an analysis produced by the synthesis call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentVerdict {
    pub content_score: f64,
    pub suggestions: Vec<Suggestion>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResponse {
    pub content_score: f64,
    pub suggestions: Vec<Suggestion>,
    pub sources: Vec<String>,
}

impl AnalysisResponse {
    pub fn new(verdict: ContentVerdict, sources: Vec<String>) -> Self {
        Self {
            content_score: verdict.content_score,
            suggestions: verdict.suggestions,
            sources,
        }
    }
}

/// Raw payload returned by a tool during a research step. The payload shape
/// belongs to the external tool and is never trusted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    pub tool_name: String,
    pub payload: Value,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Step {
    pub tool_results: Vec<ToolResult>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResearchOutcome {
    pub narrative: String,
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchSettings {
    pub max_results: u32,
    pub time_range: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReasoningRequest {
    pub model: String,
    pub system_instruction: String,
    pub prompt: String,
    pub search: Option<SearchSettings>,
    pub max_rounds: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub model: String,
    pub system_instruction: String,
    pub prompt: String,
    pub schema_name: String,
    pub schema: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TavilySearchRequest {
    pub query: String,
    pub max_results: u32,
    pub time_range: String,
    pub search_depth: String,
    pub include_raw_content: bool,
}
