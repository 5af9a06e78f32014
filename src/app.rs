//! Process wiring: builds the shared components once, owns the background
//! tasks, and tears them down on shutdown.

use std::sync::Arc;

use anyhow::Result;
use axum::Router;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::api::rate_limiter::{RATE_WINDOW, RateLimiter};
use crate::api::{AppState, create_router};
use crate::cache::ResultCache;
use crate::config::Config;
use crate::intent_analyzer::IntentAnalyzer;
use crate::orchestrator::SearchOrchestrator;
use crate::search_client::{SearchProvider, SerpApiClient};

pub struct App {
    state: AppState,
    shutdown: CancellationToken,
    tasks: Vec<JoinHandle<()>>,
}

impl App {
    /// Builds the production components from `config`. Must run inside a tokio runtime.
    pub fn init(config: &Config) -> Result<App> {
        let provider: Arc<dyn SearchProvider> = Arc::new(SerpApiClient::from_env()?);
        let analyzer = Arc::new(IntentAnalyzer::from_gemini_config(
            config.gemini_api_key.as_deref(),
            &config.gemini_model,
        ));
        Ok(Self::with_components(config, provider, analyzer))
    }

    /// Same wiring as [`App::init`] with caller-supplied backends.
    pub fn with_components(
        config: &Config,
        provider: Arc<dyn SearchProvider>,
        analyzer: Arc<IntentAnalyzer>,
    ) -> App {
        let cache = Arc::new(ResultCache::new(config.cache_ttl()));
        let orchestrator = Arc::new(SearchOrchestrator::new(
            provider,
            analyzer,
            Arc::clone(&cache),
        ));
        let rate_limiter = Arc::new(RateLimiter::new(
            config.max_requests_per_minute,
            RATE_WINDOW,
        ));

        let shutdown = CancellationToken::new();
        let tasks = vec![
            cache.spawn_sweeper(config.cache_check_period(), shutdown.clone()),
            cache.spawn_stats_reporter(config.cache_stats_period(), shutdown.clone()),
            rate_limiter.spawn_cleanup(shutdown.clone()),
        ];

        tracing::info!(ttl_secs = config.cache_ttl_secs, "cache initialized");

        App {
            state: AppState {
                orchestrator,
                rate_limiter,
            },
            shutdown,
            tasks,
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn router(&self) -> Router {
        create_router(self.state.clone())
    }

    /// Cancels the background tasks and waits for them to finish.
    pub async fn shutdown(self) {
        self.shutdown.cancel();
        for task in self.tasks {
            if let Err(e) = task.await {
                tracing::warn!(error = %e, "background task ended abnormally");
            }
        }
        tracing::info!("background tasks stopped");
    }
}
