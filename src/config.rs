use std::env;
use std::path::PathBuf;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalyzerMode {
    Research,
    Heuristic,
}

impl AnalyzerMode {
    fn parse(raw: &str) -> anyhow::Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "" | "research" => Ok(AnalyzerMode::Research),
            "heuristic" => Ok(AnalyzerMode::Heuristic),
            other => anyhow::bail!("Unknown ANALYZER_MODE: {}", other),
        }
    }
}

/// Process-wide settings, read once at startup and never mutated.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub gateway_api_key: Option<String>,
    pub gateway_base_url: String,
    pub analyze_secret: Option<String>,
    pub tavily_api_key: Option<String>,
    pub research_model: String,
    pub synthesis_model: String,
    pub mode: AnalyzerMode,
    pub bind_addr: String,
    pub static_dir: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            gateway_api_key: None,
            gateway_base_url: DEFAULT_BASE_URL.to_string(),
            analyze_secret: None,
            tavily_api_key: None,
            research_model: DEFAULT_MODEL.to_string(),
            synthesis_model: DEFAULT_MODEL.to_string(),
            mode: AnalyzerMode::Research,
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            static_dir: None,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let defaults = Self::default();
        Ok(Self {
            gateway_api_key: non_empty_var("AI_GATEWAY_API_KEY"),
            gateway_base_url: non_empty_var("AI_GATEWAY_BASE_URL")
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or(defaults.gateway_base_url),
            analyze_secret: non_empty_var("ANALYZE_SECRET"),
            tavily_api_key: non_empty_var("TAVILY_API_KEY"),
            research_model: non_empty_var("RESEARCH_MODEL").unwrap_or(defaults.research_model),
            synthesis_model: non_empty_var("SYNTHESIS_MODEL").unwrap_or(defaults.synthesis_model),
            mode: AnalyzerMode::parse(&non_empty_var("ANALYZER_MODE").unwrap_or_default())?,
            bind_addr: non_empty_var("BIND_ADDR").unwrap_or(defaults.bind_addr),
            static_dir: non_empty_var("STATIC_DIR").map(PathBuf::from),
        })
    }
}

/// Empty and whitespace-only values count as unset.
fn non_empty_var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_modes() {
        assert_eq!(AnalyzerMode::parse("").unwrap(), AnalyzerMode::Research);
        assert_eq!(AnalyzerMode::parse(" Heuristic ").unwrap(), AnalyzerMode::Heuristic);
        assert!(AnalyzerMode::parse("both").is_err());
    }

    #[test]
    fn defaults_have_no_credentials() {
        let config = AppConfig::default();
        assert!(config.gateway_api_key.is_none());
        assert!(config.analyze_secret.is_none());
        assert_eq!(config.gateway_base_url, DEFAULT_BASE_URL);
    }
}
