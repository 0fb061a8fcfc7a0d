//! Deterministic scorer used when the service runs without the LLM pipeline.
//! Looks only at the submitted field text; never calls out.

use crate::error::AnalyzeError;
use crate::models::{AnalysisResponse, Impact, Suggestion};
use crate::schema::{MAX_SCORE, MIN_SCORE};
use std::collections::{HashMap, HashSet};

const TITLE_CHARS: (usize, usize) = (30, 60);
const DESCRIPTION_CHARS: (usize, usize) = (120, 160);
const MIN_BODY_WORDS: usize = 300;
const MAX_AVG_SENTENCE_WORDS: f64 = 25.0;
const MAX_YEAR_AGE: i32 = 2;
const MAX_REPEATED_SENTENCE_RATIO: f64 = 0.3;

pub struct HeuristicScorer {
    current_year: i32,
}

impl HeuristicScorer {
    pub fn new(current_year: i32) -> Self {
        Self { current_year }
    }

    pub fn score(&self, fields: &HashMap<String, String>) -> Result<AnalysisResponse, AnalyzeError> {
        if fields.values().all(|v| v.trim().is_empty()) {
            return Err(AnalyzeError::InvalidInput(
                "fields must contain at least one non-empty value".to_string(),
            ));
        }

        let mut suggestions = Vec::new();
        let field = |name: &str| fields.get(name).map(|v| v.trim()).unwrap_or("");

        check_length(&mut suggestions, "title", field("title"), TITLE_CHARS);
        check_length(&mut suggestions, "description", field("description"), DESCRIPTION_CHARS);

        let body = body_text(fields);
        let words = body.split_whitespace().count();
        if words < MIN_BODY_WORDS {
            suggestions.push(suggestion(
                "Expand the content",
                Impact::High,
                format!(
                    "The content has {} words. Aim for at least {} to cover the topic in depth.",
                    words, MIN_BODY_WORDS
                ),
            ));
        }

        let sentences = sentences(&body);
        if !sentences.is_empty() {
            let avg = words as f64 / sentences.len() as f64;
            if avg > MAX_AVG_SENTENCE_WORDS {
                suggestions.push(suggestion(
                    "Shorten sentences",
                    Impact::Low,
                    format!(
                        "Sentences average {:.0} words. Split long sentences to stay under {}.",
                        avg, MAX_AVG_SENTENCE_WORDS
                    ),
                ));
            }
        }

        let all_text = fields.values().map(String::as_str).collect::<Vec<_>>().join(" ");
        match newest_year(&all_text, self.current_year) {
            None => suggestions.push(suggestion(
                "Add dated facts",
                Impact::High,
                "No year is mentioned. Add recent statistics or dates so readers can judge freshness."
                    .to_string(),
            )),
            Some(year) if year < self.current_year - MAX_YEAR_AGE => suggestions.push(suggestion(
                "Update outdated references",
                Impact::High,
                format!(
                    "The newest year mentioned is {}. Refresh facts and statistics with current data.",
                    year
                ),
            )),
            Some(_) => {}
        }

        if repeated_ratio(&sentences) > MAX_REPEATED_SENTENCE_RATIO {
            suggestions.push(suggestion(
                "Remove repeated passages",
                Impact::Medium,
                "Many sentences appear more than once. Rewrite them to add original insight."
                    .to_string(),
            ));
        }

        let penalty: f64 = suggestions.iter().map(|s| impact_penalty(s.impact)).sum();
        Ok(AnalysisResponse {
            content_score: (MAX_SCORE - penalty).clamp(MIN_SCORE, MAX_SCORE),
            suggestions,
            sources: Vec::new(),
        })
    }
}

fn impact_penalty(impact: Impact) -> f64 {
    match impact {
        Impact::High => 25.0,
        Impact::Medium => 15.0,
        Impact::Low => 5.0,
    }
}

fn suggestion(title: &str, impact: Impact, recommendation: String) -> Suggestion {
    Suggestion {
        title: title.to_string(),
        impact,
        recommendation,
    }
}

fn check_length(out: &mut Vec<Suggestion>, name: &str, value: &str, (min, max): (usize, usize)) {
    let len = value.chars().count();
    if len == 0 {
        out.push(suggestion(
            &format!("Add a {}", name),
            Impact::Medium,
            format!("Provide a {} between {} and {} characters.", name, min, max),
        ));
    } else if len < min || len > max {
        out.push(suggestion(
            &format!("Adjust {} length", name),
            Impact::Medium,
            format!(
                "The {} is {} characters. Keep it between {} and {}.",
                name, len, min, max
            ),
        ));
    }
}

/// Every field except the title and description, in key order.
fn body_text(fields: &HashMap<String, String>) -> String {
    let mut keys: Vec<&String> = fields
        .keys()
        .filter(|k| k.as_str() != "title" && k.as_str() != "description")
        .collect();
    keys.sort();
    keys.iter()
        .map(|k| fields[*k].trim())
        .filter(|v| !v.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn sentences(text: &str) -> Vec<String> {
    text.split(['.', '!', '?'])
        .map(|s| s.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

fn repeated_ratio(sentences: &[String]) -> f64 {
    if sentences.is_empty() {
        return 0.0;
    }
    let unique: HashSet<&String> = sentences.iter().collect();
    (sentences.len() - unique.len()) as f64 / sentences.len() as f64
}

/// Newest plausible four-digit year (1900 through next year).
fn newest_year(text: &str, current_year: i32) -> Option<i32> {
    text.split(|c: char| !c.is_ascii_digit())
        .filter(|token| token.len() == 4)
        .filter_map(|token| token.parse::<i32>().ok())
        .filter(|year| (1900..=current_year + 1).contains(year))
        .max()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn long_body(year: i32) -> String {
        (0..40)
            .map(|i| format!("Fact number {} about gardening was confirmed by a survey in {}.", i, year))
            .collect::<Vec<_>>()
            .join(" ")
    }

    #[test]
    fn rejects_all_blank_fields() {
        let scorer = HeuristicScorer::new(2026);
        assert!(matches!(
            scorer.score(&fields(&[("content", "   ")])),
            Err(AnalyzeError::InvalidInput(_))
        ));
        assert!(scorer.score(&HashMap::new()).is_err());
    }

    #[test]
    fn well_formed_page_scores_full_marks() {
        let scorer = HeuristicScorer::new(2026);
        let result = scorer
            .score(&fields(&[
                ("title", "A practical guide to raised bed gardening"),
                ("description", "d".repeat(140).as_str()),
                ("content", long_body(2025).as_str()),
            ]))
            .unwrap();
        assert_eq!(result.content_score, 100.0);
        assert!(result.suggestions.is_empty());
        assert!(result.sources.is_empty());
    }

    #[test]
    fn thin_stale_content_loses_points() {
        let scorer = HeuristicScorer::new(2026);
        let result = scorer
            .score(&fields(&[("content", "Prices rose in 2019.")]))
            .unwrap();

        let titles: Vec<&str> = result.suggestions.iter().map(|s| s.title.as_str()).collect();
        assert!(titles.contains(&"Add a title"));
        assert!(titles.contains(&"Add a description"));
        assert!(titles.contains(&"Expand the content"));
        assert!(titles.contains(&"Update outdated references"));
        assert_eq!(result.content_score, 100.0 - 15.0 - 15.0 - 25.0 - 25.0);
    }

    #[test]
    fn score_never_goes_negative() {
        let scorer = HeuristicScorer::new(2026);
        let repeated = "This sentence goes on and on and on and on and on and on and on and on and on and on and on and on and on and on. ".repeat(5);
        let result = scorer.score(&fields(&[("content", repeated.as_str())])).unwrap();
        assert_eq!(result.suggestions.len(), 6);
        assert_eq!(result.content_score, 0.0);
    }

    #[test]
    fn finds_newest_plausible_year() {
        assert_eq!(newest_year("in 1999 and 2024, ref #12345", 2026), Some(2024));
        assert_eq!(newest_year("model 3000 and 1850", 2026), None);
        assert_eq!(newest_year("no years", 2026), None);
    }

    #[test]
    fn counts_repeated_sentences() {
        let s = sentences("One. Two! one. Three?");
        assert_eq!(s.len(), 4);
        assert!((repeated_ratio(&s) - 0.25).abs() < f64::EPSILON);
    }
}
