use crate::error::ExternalCallError;
use crate::models::GenerationRequest;
use crate::schema::{analysis_schema, SCHEMA_NAME};
use crate::tools::StructuredGenerator;
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, instrument};

/// Content longer than this many characters is cut before it goes into the
/// synthesis prompt.
pub const MAX_CONTENT_CHARS: usize = 6000;
pub const TRUNCATION_MARKER: &str = "[Content truncated]";

const SYNTHESIS_INSTRUCTION: &str = r#"You are a content quality analyst. Score content from 0 to 100 and give actionable suggestions.

Scoring rubric:
- Freshness: are claims, statistics and dates current according to the research?
- Originality: how unique is the content compared to the competing content found during research?
- Readability: is the structure clear, scannable and well organized for readers and search engines?

Each suggestion needs a short title, an impact of high, medium or low, and a concrete recommendation. Prefer the listed sources when recommending citations."#;

#[derive(Debug, Clone, Copy)]
pub struct SynthesisInput<'a> {
    pub narrative: &'a str,
    pub sources: &'a [String],
    pub content: &'a str,
}

/// Returns the first [`MAX_CONTENT_CHARS`] characters and whether anything was cut.
fn truncate_content(content: &str) -> (&str, bool) {
    match content.char_indices().nth(MAX_CONTENT_CHARS) {
        Some((byte_idx, _)) => (&content[..byte_idx], true),
        None => (content, false),
    }
}

pub fn build_prompt(input: SynthesisInput<'_>) -> String {
    let (content, truncated) = truncate_content(input.content);

    let mut prompt = format!("Research findings:\n{}\n\n", input.narrative);

    if !input.sources.is_empty() {
        prompt.push_str(&format!(
            "Sources found during research (most relevant first):\n- {}\n\n",
            input.sources.join("\n- ")
        ));
    }

    prompt.push_str("Content to analyze:\n");
    prompt.push_str(content);
    if truncated {
        prompt.push_str("\n\n");
        prompt.push_str(TRUNCATION_MARKER);
    }
    prompt
}

/// Second phase: turns research into a scored verdict through a
/// schema-constrained generation call. The returned value is not yet
/// validated.
pub struct SynthesisStage {
    generator: Arc<dyn StructuredGenerator>,
    model: String,
}

impl SynthesisStage {
    pub fn new(generator: Arc<dyn StructuredGenerator>, model: impl Into<String>) -> Self {
        Self {
            generator,
            model: model.into(),
        }
    }

    fn request_for(&self, input: SynthesisInput<'_>) -> GenerationRequest {
        GenerationRequest {
            model: self.model.clone(),
            system_instruction: SYNTHESIS_INSTRUCTION.to_string(),
            prompt: build_prompt(input),
            schema_name: SCHEMA_NAME.to_string(),
            schema: analysis_schema(),
        }
    }

    #[instrument(skip_all, fields(sources = input.sources.len()))]
    pub async fn run(&self, input: SynthesisInput<'_>) -> Result<Value, ExternalCallError> {
        let start_time = std::time::Instant::now();
        info!("Starting synthesis");

        let output = self.generator.generate(self.request_for(input)).await?;

        info!("Synthesis finished in {:?}", start_time.elapsed());
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use serde_json::json;

    fn input<'a>(content: &'a str, sources: &'a [String]) -> SynthesisInput<'a> {
        SynthesisInput {
            narrative: "No such study exists.",
            sources,
            content,
        }
    }

    #[test]
    fn long_content_is_marked_truncated() {
        let content = "a".repeat(MAX_CONTENT_CHARS + 1);
        let prompt = build_prompt(input(&content, &[]));
        assert!(prompt.contains(TRUNCATION_MARKER));
        assert!(!prompt.contains(&content));
        assert!(prompt.contains(&content[..MAX_CONTENT_CHARS]));
    }

    #[test]
    fn content_at_bound_is_not_truncated() {
        for len in [0, 10, MAX_CONTENT_CHARS] {
            let content = "b".repeat(len);
            let prompt = build_prompt(input(&content, &[]));
            assert!(!prompt.contains(TRUNCATION_MARKER), "marked at length {}", len);
            assert!(prompt.ends_with(&content));
        }
    }

    #[test]
    fn truncation_counts_characters_not_bytes() {
        let content = "é".repeat(MAX_CONTENT_CHARS);
        assert_eq!(truncate_content(&content), (content.as_str(), false));

        let longer = format!("{}ü", content);
        let (kept, truncated) = truncate_content(&longer);
        assert!(truncated);
        assert_eq!(kept.chars().count(), MAX_CONTENT_CHARS);
    }

    #[test]
    fn sources_hint_only_when_present() {
        let prompt = build_prompt(input("text", &[]));
        assert!(!prompt.contains("Sources found during research"));

        let sources = vec![
            "https://nasa.gov/moon-facts".to_string(),
            "https://b.example".to_string(),
        ];
        let prompt = build_prompt(input("text", &sources));
        assert!(prompt.contains("- https://nasa.gov/moon-facts\n- https://b.example"));
        assert!(prompt.contains("No such study exists."));
    }

    struct CapturingGenerator {
        seen: Mutex<Vec<GenerationRequest>>,
    }

    #[async_trait]
    impl StructuredGenerator for CapturingGenerator {
        async fn generate(&self, request: GenerationRequest) -> Result<Value, ExternalCallError> {
            self.seen.lock().push(request);
            Ok(json!({ "contentScore": 50, "suggestions": [] }))
        }
    }

    #[tokio::test]
    async fn hands_schema_to_generator() {
        let generator = Arc::new(CapturingGenerator {
            seen: Mutex::new(vec![]),
        });
        let stage = SynthesisStage::new(generator.clone(), "synth-model");

        let output = stage.run(input("text", &[])).await.unwrap();
        assert_eq!(output["contentScore"], 50);

        let seen = generator.seen.lock();
        assert_eq!(seen[0].model, "synth-model");
        assert_eq!(seen[0].schema_name, SCHEMA_NAME);
        assert_eq!(seen[0].schema, analysis_schema());
    }
}
