use super::AppState;
use super::response::{
    ApiError, GoldDataResponse, LimitResponse, QueryRequest, QueryResponse, TrendResponse,
};
use crate::analysis::AnalysisMode;
use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use serde_json::{Value, json};
use tracing::warn;

const SERVICE_NAME: &str = "Gold Crash Expert API";

pub(super) async fn root() -> Json<Value> {
    Json(json!({
        "name": "GOLDUSD CRASH EXPERT API",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Expert in market trends and strong support/resistance levels",
        "endpoints": {
            "GET /trend": "Get current gold market trend for this week",
            "GET /lower-limit": "Get strong lower crash limit (support) for this week",
            "GET /upper-limit": "Get strong upper crash limit (resistance) for this week",
            "POST /query": "Ask any question about gold market analysis",
            "GET /gold-data": "Get trend and both limits (cached, refreshed hourly)",
            "GET /getGoldData": "Alias of /gold-data",
            "GET /health": "Health check"
        }
    }))
}

pub(super) async fn health() -> Json<Value> {
    Json(json!({ "status": "healthy", "service": SERVICE_NAME }))
}

pub(super) async fn trend(State(state): State<AppState>) -> Result<Json<TrendResponse>, ApiError> {
    let result = state.workflow.run(AnalysisMode::Trend, None).await?;
    Ok(Json(TrendResponse {
        trend: result.trend(),
        raw_response: result.raw_response,
    }))
}

pub(super) async fn lower_limit(
    State(state): State<AppState>,
) -> Result<Json<LimitResponse>, ApiError> {
    limit(&state, AnalysisMode::LowerLimit).await
}

pub(super) async fn upper_limit(
    State(state): State<AppState>,
) -> Result<Json<LimitResponse>, ApiError> {
    limit(&state, AnalysisMode::UpperLimit).await
}

async fn limit(state: &AppState, mode: AnalysisMode) -> Result<Json<LimitResponse>, ApiError> {
    let result = state.workflow.run(mode, None).await?;
    Ok(Json(LimitResponse {
        limit: result.limit(),
        raw_response: result.raw_response,
    }))
}

pub(super) async fn query(
    State(state): State<AppState>,
    payload: Result<Json<QueryRequest>, JsonRejection>,
) -> Result<Json<QueryResponse>, ApiError> {
    let Json(request) = payload.map_err(|rejection| ApiError::bad_request(rejection.body_text()))?;

    let result = state
        .workflow
        .run(AnalysisMode::General, Some(request.query.as_str()))
        .await?;
    Ok(Json(QueryResponse {
        answer: result.raw_response,
    }))
}

pub(super) async fn gold_data(
    State(state): State<AppState>,
) -> Result<Json<GoldDataResponse>, ApiError> {
    let summary = state.summary.get().await.map_err(|e| {
        warn!(error = %e, "Summary unavailable");
        ApiError::new(StatusCode::SERVICE_UNAVAILABLE, "Summary data unavailable")
    })?;

    Ok(Json(GoldDataResponse {
        cache_age_minutes: summary.age_minutes(),
        symbol: summary.symbol,
        trend: summary.trend,
        lower_limit: summary.lower_limit,
        upper_limit: summary.upper_limit,
        timestamp: summary.timestamp,
    }))
}
