pub mod api;
pub mod app;
pub mod cache;
pub mod config;
pub mod data_models;
pub mod error;
pub mod gemini;
pub mod intent_analyzer;
pub mod orchestrator;
pub mod search_client;
