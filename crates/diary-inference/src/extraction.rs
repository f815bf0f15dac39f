//! Structured event extraction from voice-note transcripts.

use std::sync::Arc;

use serde_json::Value as JsonValue;
use tracing::{debug, warn};

use diary_core::defaults::DEFAULT_EVENT_CATEGORY;
use diary_core::{Error, EventExtraction, GenerationBackend, Importance, Result};

/// System prompt sent ahead of every transcript.
pub const EXTRACTION_SYSTEM_PROMPT: &str = r#"You are an AI assistant parsing daily life voice notes. Extract meaningful structured data.
Return ONLY a raw JSON object (no markdown formatting).
Structure:
{ "summary": "Concise 1-sentence summary", "category": "One of: Work, Personal, Health, Finance, Idea, Shopping, Social, Other", "importance": "Low/Medium/High", "entities": { "people": ["names..."], "money": ["amounts..."], "dates": ["times/dates..."], "locations": ["places..."] } }"#;

/// Parse a model response into an [`EventExtraction`].
///
/// With `json_mode` the response is expected to be a bare JSON object and is
/// parsed directly. Otherwise, or when direct parsing fails, markdown fences are
/// stripped and the text between the first `{` and the last `}` is parsed.
/// Missing fields take their defaults.
pub fn parse_extraction(response: &str, json_mode: bool) -> Result<EventExtraction> {
    let trimmed = response.trim();

    let direct = if json_mode {
        serde_json::from_str::<JsonValue>(trimmed).ok()
    } else {
        None
    };

    let value = match direct {
        Some(v) => v,
        None => {
            let body = strip_code_fences(trimmed);
            let start = body.find('{');
            let end = body.rfind('}');
            let slice = match (start, end) {
                (Some(s), Some(e)) if s < e => &body[s..=e],
                _ => {
                    return Err(Error::Inference(
                        "No JSON object found in model response".to_string(),
                    ))
                }
            };
            serde_json::from_str::<JsonValue>(slice)
                .map_err(|e| Error::Inference(format!("Invalid extraction JSON: {}", e)))?
        }
    };

    let object = value.as_object().ok_or_else(|| {
        Error::Inference("Extraction response is not a JSON object".to_string())
    })?;

    let text_field = |key: &str| object.get(key).and_then(JsonValue::as_str);

    Ok(EventExtraction {
        summary: text_field("summary").unwrap_or_default().to_string(),
        category: text_field("category")
            .filter(|c| !c.is_empty())
            .unwrap_or(DEFAULT_EVENT_CATEGORY)
            .to_string(),
        importance: text_field("importance")
            .filter(|i| !i.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| Importance::default().to_string()),
        entities: object
            .get("entities")
            .filter(|e| !e.is_null())
            .cloned()
            .unwrap_or_else(|| JsonValue::Object(Default::default())),
    })
}

/// Remove a surrounding ```` ``` ```` / ```` ```json ```` fence if present.
fn strip_code_fences(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    // Drop the info string on the opening fence line.
    let rest = match rest.find('\n') {
        Some(idx) => &rest[idx + 1..],
        None => rest,
    };
    rest.trim_end().strip_suffix("```").unwrap_or(rest).trim()
}

/// Runs the extraction prompt against a generation backend.
#[derive(Clone)]
pub struct EventExtractor {
    backend: Arc<dyn GenerationBackend>,
}

impl EventExtractor {
    pub fn new(backend: Arc<dyn GenerationBackend>) -> Self {
        Self { backend }
    }

    pub fn model_name(&self) -> &str {
        self.backend.model_name()
    }

    /// Extract structured fields from a transcript.
    ///
    /// Generation errors and unparseable responses are both returned as
    /// errors; parse failures are additionally logged with
    /// `op="extract_parse"`.
    pub async fn extract(&self, transcript: &str) -> Result<EventExtraction> {
        let response = self
            .backend
            .generate_with_system(EXTRACTION_SYSTEM_PROMPT, transcript)
            .await?;

        match parse_extraction(&response, self.backend.json_mode()) {
            Ok(extraction) => {
                debug!(
                    subsystem = "inference",
                    component = "extraction",
                    op = "extract_parse",
                    category = %extraction.category,
                    importance = %extraction.importance,
                    "Parsed extraction"
                );
                Ok(extraction)
            }
            Err(e) => {
                warn!(
                    subsystem = "inference",
                    component = "extraction",
                    op = "extract_parse",
                    parse_failure = true,
                    model = %self.backend.model_name(),
                    response_len = response.len(),
                    error = %e,
                    "Failed to parse extraction response"
                );
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockGenerationBackend;
    use serde_json::json;

    #[test]
    fn test_fenced_response_applies_defaults() {
        let parsed =
            parse_extraction("```json\n{\"summary\":\"x\",\"category\":\"Work\"}\n```", false)
                .unwrap();
        assert_eq!(parsed.summary, "x");
        assert_eq!(parsed.category, "Work");
        assert_eq!(parsed.importance, "Low");
        assert_eq!(parsed.entities, json!({}));
    }

    #[test]
    fn test_prose_around_object_is_sliced() {
        let parsed = parse_extraction(
            "Sure! Here it is: {\"summary\":\"Paid rent\",\"importance\":\"High\",\"entities\":{\"money\":[\"$900\"]}} Hope that helps.",
            false,
        )
        .unwrap();
        assert_eq!(parsed.summary, "Paid rent");
        assert_eq!(parsed.category, "Other");
        assert_eq!(parsed.importance, "High");
        assert_eq!(parsed.entities["money"][0], "$900");
    }

    #[test]
    fn test_json_mode_falls_back_to_slice() {
        let parsed = parse_extraction("```\n{\"summary\":\"a\"}\n```", true).unwrap();
        assert_eq!(parsed.summary, "a");
    }

    #[test]
    fn test_no_object_is_error() {
        assert!(parse_extraction("I could not understand the audio.", false).is_err());
        assert!(parse_extraction("} backwards {", false).is_err());
        assert!(parse_extraction("[1, 2]", true).is_err());
    }

    #[test]
    fn test_null_entities_default_to_empty_object() {
        let parsed = parse_extraction(r#"{"entities": null}"#, true).unwrap();
        assert_eq!(parsed.entities, json!({}));
        assert_eq!(parsed.summary, "");
    }

    #[test]
    fn test_strip_code_fences_passthrough() {
        assert_eq!(strip_code_fences("{\"a\":1}"), "{\"a\":1}");
        assert_eq!(strip_code_fences("```json\n{}\n```"), "{}");
    }

    #[tokio::test]
    async fn test_extractor_sends_system_prompt() {
        let backend = Arc::new(MockGenerationBackend::new(
            r#"{"summary":"Lunch with Sam","category":"Social","importance":"Medium"}"#,
        ));
        let extractor = EventExtractor::new(backend.clone());

        let extraction = extractor.extract("had lunch with sam today").await.unwrap();
        assert_eq!(extraction.category, "Social");

        let calls = backend.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, EXTRACTION_SYSTEM_PROMPT);
        assert_eq!(calls[0].1, "had lunch with sam today");
    }

    #[tokio::test]
    async fn test_extractor_propagates_parse_failure() {
        let extractor =
            EventExtractor::new(Arc::new(MockGenerationBackend::new("not json at all")));
        let err = extractor.extract("something happened").await.unwrap_err();
        assert!(matches!(err, Error::Inference(_)));
    }
}
