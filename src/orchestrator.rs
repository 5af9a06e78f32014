//! Search orchestration: intent analysis, parallel fan-out, dedup, truncation,
//! caching of basic searches, and fallback from intelligent to basic search.

use std::collections::HashSet;
use std::sync::Arc;

use futures::future::try_join_all;

use crate::cache::{ResultCache, cache_key};
use crate::data_models::{AiEnhancement, SearchResponse, SearchResult};
use crate::error::{Result, SearchError};
use crate::intent_analyzer::IntentAnalyzer;
use crate::search_client::SearchProvider;

pub const MAX_RESULTS: usize = 10;
pub const DEFAULT_NUM_RESULTS: usize = 5;
const BASIC_MODE: &str = "basic";

/// Clamps a requested result count into `1..=MAX_RESULTS`.
pub fn clamp_num_results(requested: usize) -> usize {
    requested.clamp(1, MAX_RESULTS)
}

/// Keeps the first occurrence of every `link`, preserving order.
pub fn deduplicate_results(results: Vec<SearchResult>) -> Vec<SearchResult> {
    let mut seen: HashSet<String> = HashSet::with_capacity(results.len());
    results
        .into_iter()
        .filter(|result| seen.insert(result.link.clone()))
        .collect()
}

/// Per-query share of the requested total, rounded up.
pub fn per_query_count(num_results: usize, query_count: usize) -> usize {
    num_results.div_ceil(query_count.max(1))
}

#[derive(Debug, Clone, Default)]
pub struct IntelligentSearchRequest {
    pub query: String,
    pub podcast_description: Option<String>,
    pub context: Option<String>,
    pub num_results: usize,
}

pub struct SearchOrchestrator {
    provider: Arc<dyn SearchProvider>,
    analyzer: Arc<IntentAnalyzer>,
    cache: Arc<ResultCache<SearchResponse>>,
}

impl SearchOrchestrator {
    pub fn new(
        provider: Arc<dyn SearchProvider>,
        analyzer: Arc<IntentAnalyzer>,
        cache: Arc<ResultCache<SearchResponse>>,
    ) -> Self {
        Self {
            provider,
            analyzer,
            cache,
        }
    }

    pub fn analyzer(&self) -> &IntentAnalyzer {
        &self.analyzer
    }

    pub fn cache(&self) -> &ResultCache<SearchResponse> {
        &self.cache
    }

    pub fn provider_configured(&self) -> bool {
        self.provider.is_configured()
    }

    /// Single upstream call, cached by (mode, query, count).
    pub async fn basic_search(&self, query: &str, num_results: usize) -> Result<SearchResponse> {
        let num_results = clamp_num_results(num_results);
        let key = cache_key(BASIC_MODE, query, num_results);

        if let Some(cached) = self.cache.get(&key) {
            tracing::info!(query, "returning cached results");
            return Ok(SearchResponse {
                cached: true,
                ..cached
            });
        }

        tracing::info!(query, num_results, "performing basic search");
        let results = self
            .provider
            .search(query, num_results)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, kind = e.kind(), "basic search failed");
                SearchError::failed(e)
            })?;

        let (results, total_results) = aggregate(results, num_results);
        let response = SearchResponse {
            original_query: query.to_string(),
            results,
            total_results,
            cached: false,
            ai_enhancement: None,
        };
        self.cache.set(key, response.clone());
        Ok(response)
    }

    /// Analyze, fan out, aggregate. Any failure along the way falls back to
    /// `basic_search`; only a failure there reaches the caller.
    pub async fn intelligent_search(
        &self,
        request: IntelligentSearchRequest,
    ) -> Result<SearchResponse> {
        let num_results = clamp_num_results(request.num_results);
        match self.try_intelligent_search(&request, num_results).await {
            Ok(response) => Ok(response),
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    "intelligent search failed, falling back to basic search"
                );
                self.basic_search(&request.query, num_results).await
            }
        }
    }

    async fn try_intelligent_search(
        &self,
        request: &IntelligentSearchRequest,
        num_results: usize,
    ) -> Result<SearchResponse> {
        let analysis = self
            .analyzer
            .analyze(
                &request.query,
                request.podcast_description.as_deref(),
                request.context.as_deref(),
            )
            .await;

        let per_query = per_query_count(num_results, analysis.enhanced_queries.len());
        tracing::info!(
            strategy = %analysis.strategy,
            queries = analysis.enhanced_queries.len(),
            per_query,
            "fanning out searches"
        );

        // all-or-nothing: the first failing query fails the whole fan-out
        let per_query_results = try_join_all(
            analysis
                .enhanced_queries
                .iter()
                .map(|query| self.provider.search(query, per_query)),
        )
        .await?;

        let merged: Vec<SearchResult> = per_query_results.into_iter().flatten().collect();
        let (results, total_results) = aggregate(merged, num_results);
        tracing::info!(returned = results.len(), total_results, "aggregated results");

        Ok(SearchResponse {
            original_query: request.query.clone(),
            results,
            total_results,
            cached: false,
            ai_enhancement: Some(AiEnhancement::from(analysis)),
        })
    }
}

/// Dedup then truncate; the second value is the unique count before truncation.
fn aggregate(results: Vec<SearchResult>, num_results: usize) -> (Vec<SearchResult>, usize) {
    let mut unique = deduplicate_results(results);
    let total = unique.len();
    unique.truncate(num_results);
    (unique, total)
}
