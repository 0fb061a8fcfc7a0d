use crate::error::ExternalCallError;
use crate::models::GenerationRequest;
use crate::tools::llm::GatewaySettings;
use crate::tools::StructuredGenerator;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, instrument};

/// Schema-constrained generation through an OpenAI-compatible
/// `chat/completions` endpoint with `response_format: json_schema`.
#[derive(Debug, Clone)]
pub struct OpenAiStructuredClient {
    gateway: GatewaySettings,
    http: reqwest::Client,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
    #[serde(default)]
    refusal: Option<String>,
}

impl OpenAiStructuredClient {
    pub fn new(gateway: GatewaySettings) -> Self {
        Self {
            gateway,
            http: reqwest::Client::new(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.gateway.base_url)
    }

    fn body(request: &GenerationRequest) -> Value {
        json!({
            "model": request.model,
            "messages": [
                ChatMessage { role: "system", content: &request.system_instruction },
                ChatMessage { role: "user", content: &request.prompt },
            ],
            "response_format": {
                "type": "json_schema",
                "json_schema": {
                    "name": request.schema_name,
                    "strict": true,
                    "schema": request.schema,
                }
            }
        })
    }
}

#[async_trait]
impl StructuredGenerator for OpenAiStructuredClient {
    #[instrument(skip(self, request), fields(model = %request.model))]
    async fn generate(&self, request: GenerationRequest) -> Result<Value, ExternalCallError> {
        let response = self
            .http
            .post(self.endpoint())
            .bearer_auth(&self.gateway.api_key)
            .json(&Self::body(&request))
            .send()
            .await
            .map_err(|e| ExternalCallError::Api(format!("Request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(ExternalCallError::Api(format!(
                "Generation API error ({}): {}",
                status, error_text
            )));
        }

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| ExternalCallError::Api(format!("Failed to parse response: {}", e)))?;

        let message = completion
            .choices
            .into_iter()
            .next()
            .map(|c| c.message)
            .ok_or_else(|| ExternalCallError::Other("Completion had no choices".to_string()))?;

        if let Some(refusal) = message.refusal {
            return Err(ExternalCallError::Other(format!("Model refused: {}", refusal)));
        }

        let content = message
            .content
            .ok_or_else(|| ExternalCallError::Other("Completion had no content".to_string()))?;
        debug!("Structured output: {} chars", content.len());

        serde_json::from_str(&content)
            .map_err(|e| ExternalCallError::Other(format!("Output is not JSON: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_requests_strict_json_schema() {
        let request = GenerationRequest {
            model: "gpt-4o-mini".to_string(),
            system_instruction: "system".to_string(),
            prompt: "prompt".to_string(),
            schema_name: "content_analysis".to_string(),
            schema: json!({ "type": "object" }),
        };

        let body = OpenAiStructuredClient::body(&request);
        assert_eq!(body["response_format"]["type"], "json_schema");
        assert_eq!(body["response_format"]["json_schema"]["strict"], true);
        assert_eq!(body["response_format"]["json_schema"]["name"], "content_analysis");
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "prompt");
    }

    #[test]
    fn endpoint_joins_base_url() {
        let client = OpenAiStructuredClient::new(GatewaySettings {
            api_key: "k".to_string(),
            base_url: "https://gateway.example/v1".to_string(),
        });
        assert_eq!(client.endpoint(), "https://gateway.example/v1/chat/completions");
    }
}
