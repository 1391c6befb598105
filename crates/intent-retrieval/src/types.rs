//! Result and status types returned by the retrieval engine.

use intent_cache::CacheStats;
use intent_types::{Intent, Language};
use intent_vector::IndexStats;
use serde::Serialize;

/// Best fuzzy candidate offered when nothing matched confidently.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Suggestion {
    /// Example phrase of the candidate intent
    pub text: String,
    pub action: String,
    pub score: f32,
}

/// Uniform outcome of one `query()` call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResult {
    /// True only when an intent matched above the primary threshold
    pub success: bool,

    /// Localized text for the user
    pub response: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched_intent: Option<Intent>,

    /// Score of the matched intent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,

    pub execution_time_ms: u64,

    /// Language the response is written in
    pub language: Language,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<Suggestion>,

    /// Whether an action handler actually ran
    pub action_executed: bool,
}

impl QueryResult {
    /// Failed result carrying only a message.
    pub fn failure(response: String, language: Language) -> Self {
        Self {
            success: false,
            response,
            matched_intent: None,
            confidence: None,
            execution_time_ms: 0,
            language,
            suggestion: None,
            action_executed: false,
        }
    }

    /// Failed result that offers a fuzzy suggestion.
    pub fn suggested(response: String, language: Language, suggestion: Suggestion) -> Self {
        Self {
            suggestion: Some(suggestion),
            ..Self::failure(response, language)
        }
    }

    /// Successful match.
    pub fn matched(
        response: String,
        language: Language,
        intent: Intent,
        confidence: f32,
        action_executed: bool,
    ) -> Self {
        Self {
            success: true,
            response,
            matched_intent: Some(intent),
            confidence: Some(confidence),
            execution_time_ms: 0,
            language,
            suggestion: None,
            action_executed,
        }
    }

    pub(crate) fn with_elapsed(mut self, elapsed_ms: u64) -> Self {
        self.execution_time_ms = elapsed_ms;
        self
    }
}

/// Engine lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineState {
    Uninitialized,
    Ready,
    Disposed,
}

impl EngineState {
    pub fn as_str(&self) -> &'static str {
        match self {
            EngineState::Uninitialized => "uninitialized",
            EngineState::Ready => "ready",
            EngineState::Disposed => "disposed",
        }
    }
}

/// Engine diagnostics.
#[derive(Debug, Clone, Serialize)]
pub struct EngineStats {
    pub state: EngineState,
    /// Templates in the catalog
    pub templates: usize,
    /// Intents the catalog currently flattens to
    pub catalog_intents: usize,
    /// Intents in the live index; lags the catalog until reinitialize
    pub indexed_intents: usize,
    pub model_id: String,
    pub dimension: Option<usize>,
    pub metric: &'static str,
    /// Whether the last initialization was served from the cache
    pub loaded_from_cache: bool,
    pub queries_served: u64,
    pub index: IndexStats,
    /// `None` when caching is disabled
    pub cache: Option<CacheStats>,
    pub detection_memo_entries: usize,
    pub actions: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_serializes_camel_case() {
        let result = QueryResult::matched(
            "ok".to_string(),
            Language::En,
            Intent::new(0, "check points", "getUserPoints"),
            0.9,
            true,
        )
        .with_elapsed(3);

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["executionTimeMs"], 3);
        assert_eq!(json["matchedIntent"]["action"], "getUserPoints");
        assert_eq!(json["actionExecuted"], true);
        assert!(json.get("suggestion").is_none());
    }

    #[test]
    fn test_suggested_is_unsuccessful() {
        let suggestion = Suggestion {
            text: "check points".to_string(),
            action: "getUserPoints".to_string(),
            score: 0.5,
        };
        let result = QueryResult::suggested("maybe".to_string(), Language::En, suggestion);
        assert!(!result.success);
        assert!(result.matched_intent.is_none());
        assert_eq!(result.suggestion.unwrap().score, 0.5);
    }
}
