//! Query intent analysis.
//!
//! Rewrites one search query into up to three sharper queries with the help of a
//! [`TextModel`]. The analyzer never fails outward: a missing backend, a transport
//! error, or an unusable model reply all degrade to searching the original query.

use std::sync::{Arc, RwLock};

use chrono::Datelike;
use serde::{Deserialize, Deserializer, Serialize};

use crate::data_models::{AnalysisStrategy, SearchIntentAnalysis};
use crate::gemini::{GeminiClient, TextModel};

pub const MAX_ENHANCED_QUERIES: usize = 3;
pub const MAX_ADDITIONAL_TOPICS: usize = 5;
pub const MAX_RESEARCH_SUGGESTIONS: usize = 5;
const DEFAULT_REASONING: &str = "AI analysis completed";

/// Externally visible state of the model backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase", tag = "state", content = "reason")]
pub enum AiReadiness {
    Disabled,
    Pending,
    Ready,
    Failed(String),
}

enum BackendState {
    Disabled,
    Pending,
    Ready(Arc<dyn TextModel>),
    Failed(String),
}

pub struct IntentAnalyzer {
    state: RwLock<BackendState>,
}

impl IntentAnalyzer {
    /// No credential: every analysis is `basic`.
    pub fn disabled() -> Self {
        Self::with_state(BackendState::Disabled)
    }

    /// Credential present but the backend is not initialised yet.
    pub fn pending() -> Self {
        Self::with_state(BackendState::Pending)
    }

    pub fn ready(model: Arc<dyn TextModel>) -> Self {
        Self::with_state(BackendState::Ready(model))
    }

    fn with_state(state: BackendState) -> Self {
        Self {
            state: RwLock::new(state),
        }
    }

    /// Builds a Gemini-backed analyzer, or a disabled one when no key is configured.
    pub fn from_gemini_config(api_key: Option<&str>, model: &str) -> Self {
        let Some(api_key) = api_key.filter(|key| !key.trim().is_empty()) else {
            tracing::warn!("GEMINI_API_KEY not found, AI query enhancement disabled");
            return Self::disabled();
        };
        let analyzer = Self::pending();
        analyzer.init(
            GeminiClient::new(api_key, model).map(|client| Arc::new(client) as Arc<dyn TextModel>),
        );
        analyzer
    }

    /// Completes initialisation with the outcome of building the backend.
    pub fn init(&self, backend: anyhow::Result<Arc<dyn TextModel>>) {
        let next = match backend {
            Ok(model) => {
                tracing::info!("AI backend ready");
                BackendState::Ready(model)
            }
            Err(e) => {
                tracing::error!(error = %format!("{e:#}"), "AI backend failed to initialise");
                BackendState::Failed(format!("{e:#}"))
            }
        };
        *self.state.write().unwrap_or_else(|e| e.into_inner()) = next;
    }

    pub fn readiness(&self) -> AiReadiness {
        match &*self.state.read().unwrap_or_else(|e| e.into_inner()) {
            BackendState::Disabled => AiReadiness::Disabled,
            BackendState::Pending => AiReadiness::Pending,
            BackendState::Ready(_) => AiReadiness::Ready,
            BackendState::Failed(reason) => AiReadiness::Failed(reason.clone()),
        }
    }

    fn model(&self) -> Option<Arc<dyn TextModel>> {
        match &*self.state.read().unwrap_or_else(|e| e.into_inner()) {
            BackendState::Ready(model) => Some(Arc::clone(model)),
            _ => None,
        }
    }

    pub async fn analyze(
        &self,
        original_query: &str,
        podcast_description: Option<&str>,
        context: Option<&str>,
    ) -> SearchIntentAnalysis {
        let Some(model) = self.model() else {
            tracing::info!(readiness = ?self.readiness(), "AI not available, using original query");
            return SearchIntentAnalysis::degraded(original_query, AnalysisStrategy::Basic);
        };

        let prompt = build_analysis_prompt(original_query, podcast_description, context);
        tracing::debug!("sending analysis prompt to model");

        match model.generate(&prompt).await {
            Ok(text) => {
                let analysis = parse_analysis(&text, original_query);
                tracing::info!(
                    strategy = %analysis.strategy,
                    enhanced_queries = analysis.enhanced_queries.len(),
                    additional_topics = analysis.additional_topics.len(),
                    "intent analysis complete"
                );
                analysis
            }
            Err(e) => {
                tracing::error!(error = %format!("{e:#}"), "AI analysis failed");
                SearchIntentAnalysis::degraded(original_query, AnalysisStrategy::Fallback)
            }
        }
    }

    /// Up to five research questions for a podcast topic. Empty when the model is
    /// unavailable or its reply is unusable.
    pub async fn research_suggestions(&self, topic: &str) -> Vec<String> {
        let Some(model) = self.model() else {
            return Vec::new();
        };
        let prompt = build_suggestions_prompt(topic);
        match model.generate(&prompt).await {
            Ok(text) => parse_suggestions(&text),
            Err(e) => {
                tracing::error!(error = %format!("{e:#}"), "research suggestions failed");
                Vec::new()
            }
        }
    }
}

pub fn build_analysis_prompt(
    original_query: &str,
    podcast_description: Option<&str>,
    context: Option<&str>,
) -> String {
    let year = chrono::Utc::now().year();
    let description = match podcast_description.filter(|d| !d.trim().is_empty()) {
        Some(d) => format!("Description: {d}"),
        None => "No description provided".to_string(),
    };
    let context = match context.filter(|c| !c.trim().is_empty()) {
        Some(c) => format!("\nAdditional Context: {c}"),
        None => String::new(),
    };

    format!(
        r#"You are an intelligent search assistant for a podcast generator. Analyze the user's search query and enhance it to retrieve the most relevant, comprehensive and up-to-date information.

ORIGINAL QUERY: "{original_query}"

PODCAST CONTEXT:
{description}{context}

YOUR TASK:
1. Restate the search intent
2. Generate 2-3 enhanced search queries that will retrieve more relevant information
3. Identify up to 5 related topics that would enrich the podcast content

REQUIREMENTS:
- Enhanced queries should be specific and targeted
- If the topic is time-sensitive, include recency terms (e.g. "{year}", "latest", "recent")
- Consider different angles: news, analysis, statistics, expert opinions
- Keep queries concise and searchable

RESPONSE FORMAT (JSON):
{{
  "enhancedQueries": ["query1", "query2", "query3"],
  "additionalTopics": ["topic1", "topic2"],
  "reasoning": "Brief explanation of your strategy"
}}

Respond ONLY with a single valid JSON object, no additional text."#
    )
}

fn build_suggestions_prompt(topic: &str) -> String {
    format!(
        r#"Generate 5 specific research questions or topics to explore for a podcast about: "{topic}"

Return them as a JSON array of strings. Example: ["question1", "question2"]

Respond ONLY with valid JSON."#
    )
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ModelAnalysis {
    #[serde(default)]
    enhanced_queries: Vec<String>,
    #[serde(default, deserialize_with = "lenient_strings")]
    additional_topics: Vec<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    reasoning: Option<String>,
}

// Null or mistyped optional fields decode as empty.
fn lenient_strings<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Array(items) => items
            .into_iter()
            .filter_map(|item| item.as_str().map(str::to_string))
            .collect(),
        _ => Vec::new(),
    })
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(value.as_str().map(str::to_string))
}

/// Interprets a model reply. Anything short of a JSON object with at least one
/// non-empty enhanced query is a `parse-error` on the original query.
pub fn parse_analysis(text: &str, original_query: &str) -> SearchIntentAnalysis {
    let Some(json) = extract_balanced(text, '{', '}') else {
        tracing::warn!(raw = %text, "no JSON object in model response");
        return SearchIntentAnalysis::degraded(original_query, AnalysisStrategy::ParseError);
    };

    let parsed: ModelAnalysis = match serde_json::from_str(json) {
        Ok(parsed) => parsed,
        Err(e) => {
            tracing::warn!(error = %e, raw = %text, "failed to decode model response");
            return SearchIntentAnalysis::degraded(original_query, AnalysisStrategy::ParseError);
        }
    };

    let enhanced_queries = non_empty(parsed.enhanced_queries, MAX_ENHANCED_QUERIES);
    if enhanced_queries.is_empty() {
        tracing::warn!(raw = %text, "model response has no enhanced queries");
        return SearchIntentAnalysis::degraded(original_query, AnalysisStrategy::ParseError);
    }

    SearchIntentAnalysis {
        enhanced_queries,
        additional_topics: non_empty(parsed.additional_topics, MAX_ADDITIONAL_TOPICS),
        strategy: AnalysisStrategy::AiEnhanced,
        reasoning: Some(
            parsed
                .reasoning
                .filter(|r| !r.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_REASONING.to_string()),
        ),
    }
}

fn parse_suggestions(text: &str) -> Vec<String> {
    extract_balanced(text, '[', ']')
        .and_then(|json| serde_json::from_str::<Vec<String>>(json).ok())
        .map(|items| non_empty(items, MAX_RESEARCH_SUGGESTIONS))
        .unwrap_or_default()
}

fn non_empty(items: Vec<String>, limit: usize) -> Vec<String> {
    items
        .into_iter()
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
        .take(limit)
        .collect()
}

/// First balanced `open ... close` span of `text`, starting at the first `open`.
/// Delimiters inside JSON string literals are ignored.
pub fn extract_balanced(text: &str, open: char, close: char) -> Option<&str> {
    let start = text.find(open)?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            c if c == open => depth += 1,
            c if c == close => {
                depth -= 1;
                if depth == 0 {
                    let end = start + offset + ch.len_utf8();
                    return Some(&text[start..end]);
                }
            }
            _ => {}
        }
    }
    None
}

#[test]
fn test_extract_balanced_nested_and_strings() {
    let text = r#"Sure! {"a": {"b": "}"}, "c": [1]} trailing {"x": 1}"#;
    assert_eq!(
        extract_balanced(text, '{', '}'),
        Some(r#"{"a": {"b": "}"}, "c": [1]}"#)
    );
    assert_eq!(extract_balanced("no json here", '{', '}'), None);
    assert_eq!(extract_balanced("{ unclosed", '{', '}'), None);
    assert_eq!(
        extract_balanced(r#"```json ["q1", "q]2"] ```"#, '[', ']'),
        Some(r#"["q1", "q]2"]"#)
    );
}

#[test]
fn test_extract_balanced_escaped_quote() {
    let text = r#"{"a": "say \"}\" loudly"}"#;
    assert_eq!(extract_balanced(text, '{', '}'), Some(text));
}
