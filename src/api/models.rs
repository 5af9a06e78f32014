use serde::{Deserialize, Serialize};

use crate::cache::CacheStats;
use crate::intent_analyzer::AiReadiness;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntelligentSearchBody {
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub podcast_description: Option<String>,
    #[serde(default)]
    pub context: Option<String>,
    #[serde(default)]
    pub num_results: Option<usize>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BasicSearchBody {
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub num_results: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct ResearchSuggestionsBody {
    #[serde(default)]
    pub topic: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ApiSuccess<T> {
    pub success: bool,
    pub data: T,
    pub timestamp: String,
}

impl<T> ApiSuccess<T> {
    pub fn new(data: T) -> Self {
        ApiSuccess {
            success: true,
            data,
            timestamp: now_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub message: String,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Serialize)]
pub struct ApiFailure {
    pub success: bool,
    pub error: ErrorDetail,
    pub timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl ApiFailure {
    pub fn new(message: impl Into<String>, kind: impl Into<String>) -> Self {
        ApiFailure {
            success: false,
            error: ErrorDetail {
                message: message.into(),
                kind: kind.into(),
            },
            timestamp: now_rfc3339(),
            path: None,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitedResponse {
    pub success: bool,
    pub error: ErrorDetail,
    pub retry_after: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: String,
    pub ai: AiReadiness,
    pub search_provider_configured: bool,
    pub cache: CacheStats,
}

pub fn now_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339()
}
