use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::{StatusCode, Uri};
use axum::response::IntoResponse;
use serde_json::{Value, json};

use crate::data_models::SearchResponse;
use crate::orchestrator::{DEFAULT_NUM_RESULTS, IntelligentSearchRequest};

use super::AppState;
use super::error::ApiError;
use super::models::{
    ApiFailure, ApiSuccess, BasicSearchBody, HealthResponse, IntelligentSearchBody,
    ResearchSuggestionsBody, now_rfc3339,
};

fn required(value: Option<String>, message: &str) -> Result<String, ApiError> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| ApiError::Validation(message.to_string()))
}

/// Shortens free text for log lines without splitting a character.
fn preview(text: Option<&str>, max_chars: usize) -> String {
    match text {
        Some(t) if t.chars().count() > max_chars => {
            format!("{}...", t.chars().take(max_chars).collect::<String>())
        }
        Some(t) => t.to_string(),
        None => String::new(),
    }
}

pub async fn root_handler() -> Json<Value> {
    Json(json!({
        "message": "AI-Powered Podcast Search Backend",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running",
        "endpoints": {
            "health": "/api/health",
            "search": "/api/search/intelligent (POST)",
            "basicSearch": "/api/search/basic (POST)",
            "researchSuggestions": "/api/research/suggestions (POST)"
        }
    }))
}

pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let orchestrator = &state.orchestrator;
    Json(HealthResponse {
        status: "ok",
        timestamp: now_rfc3339(),
        ai: orchestrator.analyzer().readiness(),
        search_provider_configured: orchestrator.provider_configured(),
        cache: orchestrator.cache().stats(),
    })
}

pub async fn intelligent_search_handler(
    State(state): State<AppState>,
    body: Result<Json<IntelligentSearchBody>, JsonRejection>,
) -> Result<Json<ApiSuccess<SearchResponse>>, ApiError> {
    let Json(body) = body?;
    let query = required(body.query, "Query parameter is required")?;

    tracing::info!(
        query = %query,
        description = %preview(body.podcast_description.as_deref(), 100),
        context = %preview(body.context.as_deref(), 50),
        "intelligent search request"
    );

    let response = state
        .orchestrator
        .intelligent_search(IntelligentSearchRequest {
            query,
            podcast_description: body.podcast_description,
            context: body.context,
            num_results: body.num_results.unwrap_or(DEFAULT_NUM_RESULTS),
        })
        .await?;

    Ok(Json(ApiSuccess::new(response)))
}

pub async fn basic_search_handler(
    State(state): State<AppState>,
    body: Result<Json<BasicSearchBody>, JsonRejection>,
) -> Result<Json<ApiSuccess<SearchResponse>>, ApiError> {
    let Json(body) = body?;
    let query = required(body.query, "Query parameter is required")?;

    tracing::info!(query = %query, "basic search request");

    let response = state
        .orchestrator
        .basic_search(&query, body.num_results.unwrap_or(DEFAULT_NUM_RESULTS))
        .await?;

    Ok(Json(ApiSuccess::new(response)))
}

pub async fn research_suggestions_handler(
    State(state): State<AppState>,
    body: Result<Json<ResearchSuggestionsBody>, JsonRejection>,
) -> Result<Json<ApiSuccess<Vec<String>>>, ApiError> {
    let Json(body) = body?;
    let topic = required(body.topic, "Topic parameter is required")?;

    let suggestions = state
        .orchestrator
        .analyzer()
        .research_suggestions(&topic)
        .await;

    Ok(Json(ApiSuccess::new(suggestions)))
}

pub async fn not_found_handler(uri: Uri) -> impl IntoResponse {
    let mut body = ApiFailure::new("Endpoint not found", "NotFound");
    body.path = Some(uri.path().to_string());
    (StatusCode::NOT_FOUND, Json(body))
}

#[test]
fn test_preview_truncates_on_char_boundary() {
    assert_eq!(preview(Some("héllo wörld"), 5), "héllo...");
    assert_eq!(preview(Some("short"), 50), "short");
    assert_eq!(preview(None, 5), "");
}
