use axum::http::{Method, header};
use axum::{
    Router, middleware,
    routing::{get, post},
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::orchestrator::SearchOrchestrator;

pub mod error;
pub mod handlers;
pub mod models;
pub mod rate_limiter;

use rate_limiter::RateLimiter;

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<SearchOrchestrator>,
    pub rate_limiter: Arc<RateLimiter>,
}

pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    Router::new()
        .route("/", get(handlers::root_handler))
        .route("/api/health", get(handlers::health_handler))
        .route(
            "/api/search/intelligent",
            post(handlers::intelligent_search_handler),
        )
        .route("/api/search/basic", post(handlers::basic_search_handler))
        .route(
            "/api/research/suggestions",
            post(handlers::research_suggestions_handler),
        )
        .fallback(handlers::not_found_handler)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limiter::rate_limit,
        ))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}
