//! Contract for the analysis produced by the synthesis stage.
//!
//! The same contract is used twice: [`analysis_schema`] is handed to the
//! structured generation call to steer the model, and [`validate_verdict`]
//! gates whatever came back before it can reach a caller.

use crate::error::SchemaViolation;
use crate::models::{ContentVerdict, Impact, Suggestion};
use serde_json::{json, Map, Value};

pub const SCHEMA_NAME: &str = "content_analysis";
pub const MIN_SCORE: f64 = 0.0;
pub const MAX_SCORE: f64 = 100.0;

/// JSON Schema for [`ContentVerdict`], in the strict subset accepted by
/// structured-output endpoints.
pub fn analysis_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "contentScore": {
                "type": "number",
                "minimum": MIN_SCORE,
                "maximum": MAX_SCORE,
                "description": "Overall score from 0 to 100 covering freshness, originality and readability"
            },
            "suggestions": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "title": { "type": "string" },
                        "impact": { "type": "string", "enum": ["high", "medium", "low"] },
                        "recommendation": { "type": "string" }
                    },
                    "required": ["title", "impact", "recommendation"],
                    "additionalProperties": false
                }
            }
        },
        "required": ["contentScore", "suggestions"],
        "additionalProperties": false
    })
}

/// Checks a candidate against the contract and returns it in exactly the
/// verdict shape. Unknown extra fields are dropped; out-of-range scores are
/// rejected rather than clamped.
pub fn validate_verdict(candidate: &Value) -> Result<ContentVerdict, SchemaViolation> {
    let root = candidate
        .as_object()
        .ok_or_else(|| SchemaViolation::new("$", "expected an object"))?;

    let content_score = validate_score(root)?;

    let raw_suggestions = root
        .get("suggestions")
        .ok_or_else(|| SchemaViolation::new("suggestions", "missing"))?
        .as_array()
        .ok_or_else(|| SchemaViolation::new("suggestions", "expected an array"))?;

    let suggestions = raw_suggestions
        .iter()
        .enumerate()
        .map(|(i, item)| validate_suggestion(i, item))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ContentVerdict {
        content_score,
        suggestions,
    })
}

fn validate_score(root: &Map<String, Value>) -> Result<f64, SchemaViolation> {
    let raw = root
        .get("contentScore")
        .ok_or_else(|| SchemaViolation::new("contentScore", "missing"))?;
    let score = raw
        .as_f64()
        .ok_or_else(|| SchemaViolation::new("contentScore", "expected a number"))?;
    if !(MIN_SCORE..=MAX_SCORE).contains(&score) {
        return Err(SchemaViolation::new(
            "contentScore",
            format!("{} is outside [{}, {}]", score, MIN_SCORE, MAX_SCORE),
        ));
    }
    Ok(score)
}

fn validate_suggestion(index: usize, item: &Value) -> Result<Suggestion, SchemaViolation> {
    let path = |field: &str| format!("suggestions[{}].{}", index, field);

    let obj = item
        .as_object()
        .ok_or_else(|| SchemaViolation::new(format!("suggestions[{}]", index), "expected an object"))?;

    let string_field = |field: &str| -> Result<String, SchemaViolation> {
        obj.get(field)
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| SchemaViolation::new(path(field), "expected a string"))
    };

    let title = string_field("title")?;
    let recommendation = string_field("recommendation")?;
    let impact = match string_field("impact")?.as_str() {
        "high" => Impact::High,
        "medium" => Impact::Medium,
        "low" => Impact::Low,
        other => {
            return Err(SchemaViolation::new(
                path("impact"),
                format!("`{}` is not one of high, medium, low", other),
            ))
        }
    };

    Ok(Suggestion {
        title,
        impact,
        recommendation,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn suggestion() -> Value {
        json!({
            "title": "Cite a current source",
            "impact": "high",
            "recommendation": "Replace the 1950s study with a recent reference."
        })
    }

    #[test]
    fn accepts_conformant_verdict() {
        let verdict = validate_verdict(&json!({
            "contentScore": 35,
            "suggestions": [suggestion()]
        }))
        .unwrap();

        assert_eq!(verdict.content_score, 35.0);
        assert_eq!(verdict.suggestions.len(), 1);
        assert_eq!(verdict.suggestions[0].impact, Impact::High);
    }

    #[test]
    fn accepts_real_scores_and_bounds() {
        for score in [json!(0), json!(100), json!(72.5)] {
            let candidate = json!({ "contentScore": score.clone(), "suggestions": [] });
            assert!(validate_verdict(&candidate).is_ok(), "rejected {}", score);
        }
    }

    #[test]
    fn rejects_out_of_range_score() {
        for score in [json!(150), json!(-1), json!(100.01)] {
            let err = validate_verdict(&json!({ "contentScore": score, "suggestions": [] }))
                .unwrap_err();
            assert_eq!(err.field, "contentScore");
        }
    }

    #[test]
    fn rejects_non_numeric_score() {
        let err = validate_verdict(&json!({ "contentScore": "35", "suggestions": [] })).unwrap_err();
        assert_eq!(err.field, "contentScore");
    }

    #[test]
    fn names_offending_suggestion_field() {
        let mut bad = suggestion();
        bad["impact"] = json!("critical");
        let err = validate_verdict(&json!({
            "contentScore": 50,
            "suggestions": [suggestion(), bad]
        }))
        .unwrap_err();
        assert_eq!(err.field, "suggestions[1].impact");

        let err = validate_verdict(&json!({
            "contentScore": 50,
            "suggestions": [{ "title": "x", "impact": "low" }]
        }))
        .unwrap_err();
        assert_eq!(err.field, "suggestions[0].recommendation");
    }

    #[test]
    fn rejects_wrong_top_level_shapes() {
        assert_eq!(validate_verdict(&json!([1, 2])).unwrap_err().field, "$");
        assert_eq!(
            validate_verdict(&json!({ "contentScore": 10 })).unwrap_err().field,
            "suggestions"
        );
        assert_eq!(
            validate_verdict(&json!({ "contentScore": 10, "suggestions": {} }))
                .unwrap_err()
                .field,
            "suggestions"
        );
    }

    #[test]
    fn drops_unknown_fields() {
        let verdict = validate_verdict(&json!({
            "contentScore": 80,
            "suggestions": [],
            "reasoning": "extra"
        }))
        .unwrap();
        assert_eq!(verdict.content_score, 80.0);
    }

    #[test]
    fn schema_requires_every_field() {
        let schema = analysis_schema();
        assert_eq!(schema["required"], json!(["contentScore", "suggestions"]));
        assert_eq!(schema["properties"]["contentScore"]["maximum"], json!(100.0));
    }
}
