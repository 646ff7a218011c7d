//! HTTP facade over the analysis workflow

mod handlers;
mod response;

pub use response::{
    ApiError, GoldDataResponse, LimitResponse, QueryRequest, QueryResponse, TrendResponse,
};

use crate::summary::SummaryCache;
use crate::workflow::AnalysisWorkflow;
use axum::Router;
use axum::routing::{get, post};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub workflow: Arc<AnalysisWorkflow>,
    pub summary: Arc<SummaryCache>,
}

impl AppState {
    pub fn new(workflow: Arc<AnalysisWorkflow>, summary: Arc<SummaryCache>) -> Self {
        Self { workflow, summary }
    }
}

/// Build the API router with tracing and permissive CORS
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .route("/trend", get(handlers::trend))
        .route("/lower-limit", get(handlers::lower_limit))
        .route("/upper-limit", get(handlers::upper_limit))
        .route("/query", post(handlers::query))
        .route("/gold-data", get(handlers::gold_data))
        .route("/getGoldData", get(handlers::gold_data))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
