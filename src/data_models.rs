use serde::{Deserialize, Serialize};

/// One normalized hit from the upstream provider. `link` is the identity key.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    pub title: String,
    pub link: String,
    pub snippet: String,
    pub display_link: String,
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
}

impl SearchResult {
    pub fn new(title: String, link: String, snippet: String) -> SearchResult {
        let host = host_or_raw(&link);
        SearchResult {
            title,
            snippet,
            display_link: host.clone(),
            source: host,
            link,
            date: None,
        }
    }
}

/// Host component of `link`, or the raw string when it does not parse as a URL.
pub fn host_or_raw(link: &str) -> String {
    reqwest::Url::parse(link)
        .ok()
        .and_then(|url| url.host_str().map(str::to_string))
        .unwrap_or_else(|| link.to_string())
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum AnalysisStrategy {
    Basic,
    AiEnhanced,
    Fallback,
    ParseError,
}

impl AnalysisStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisStrategy::Basic => "basic",
            AnalysisStrategy::AiEnhanced => "ai-enhanced",
            AnalysisStrategy::Fallback => "fallback",
            AnalysisStrategy::ParseError => "parse-error",
        }
    }
}

impl std::fmt::Display for AnalysisStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SearchIntentAnalysis {
    pub enhanced_queries: Vec<String>,
    pub additional_topics: Vec<String>,
    pub strategy: AnalysisStrategy,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
}

impl SearchIntentAnalysis {
    /// Analysis that searches for the original query only.
    pub fn degraded(original_query: &str, strategy: AnalysisStrategy) -> SearchIntentAnalysis {
        SearchIntentAnalysis {
            enhanced_queries: vec![original_query.to_string()],
            additional_topics: Vec::new(),
            strategy,
            reasoning: None,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AiEnhancement {
    pub enhanced_queries: Vec<String>,
    pub additional_topics: Vec<String>,
    pub search_strategy: AnalysisStrategy,
}

impl From<SearchIntentAnalysis> for AiEnhancement {
    fn from(analysis: SearchIntentAnalysis) -> Self {
        AiEnhancement {
            enhanced_queries: analysis.enhanced_queries,
            additional_topics: analysis.additional_topics,
            search_strategy: analysis.strategy,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    pub original_query: String,
    pub results: Vec<SearchResult>,
    /// Unique results found before truncation.
    pub total_results: usize,
    pub cached: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_enhancement: Option<AiEnhancement>,
}
