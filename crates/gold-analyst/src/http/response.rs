//! Request/response bodies and the API error type

use crate::analysis::{PriceLevel, Trend};
use crate::error::AnalystError;
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

#[derive(Debug, Serialize)]
pub struct TrendResponse {
    pub trend: Option<Trend>,
    pub raw_response: String,
}

#[derive(Debug, Serialize)]
pub struct LimitResponse {
    pub limit: Option<PriceLevel>,
    pub raw_response: String,
}

#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    pub query: String,
}

#[derive(Debug, Serialize)]
pub struct QueryResponse {
    pub answer: String,
}

#[derive(Debug, Serialize)]
pub struct GoldDataResponse {
    pub symbol: String,
    pub trend: Option<Trend>,
    pub lower_limit: Option<PriceLevel>,
    pub upper_limit: Option<PriceLevel>,
    pub timestamp: DateTime<Utc>,
    pub cache_age_minutes: i64,
}

/// Error returned to API callers as `{"detail": ...}`
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    detail: String,
}

impl ApiError {
    pub fn new(status: StatusCode, detail: impl Into<String>) -> Self {
        Self {
            status,
            detail: detail.into(),
        }
    }

    pub fn bad_request(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, detail)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl From<AnalystError> for ApiError {
    fn from(err: AnalystError) -> Self {
        let status = match &err {
            AnalystError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            AnalystError::DataUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            AnalystError::CompletionUnavailable(_) => StatusCode::BAD_GATEWAY,
            // Absorbed by the workflow; reaching here is a bug
            AnalystError::NewsUnavailable(_)
            | AnalystError::IntelligenceUnavailable(_)
            | AnalystError::ConfigError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, err.public_message())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "detail": self.detail }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (AnalystError::InvalidRequest("Query cannot be empty".into()), StatusCode::BAD_REQUEST),
            (AnalystError::data_unavailable("GC=F", "down"), StatusCode::SERVICE_UNAVAILABLE),
            (AnalystError::CompletionUnavailable("timeout".into()), StatusCode::BAD_GATEWAY),
            (AnalystError::ConfigError("bad".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, expected) in cases {
            assert_eq!(ApiError::from(err).status(), expected);
        }
    }

    #[test]
    fn test_null_fields_serialize() {
        let body = serde_json::to_value(TrendResponse {
            trend: None,
            raw_response: "unclear".to_string(),
        })
        .unwrap();
        assert_eq!(body, json!({ "trend": null, "raw_response": "unclear" }));

        let body = serde_json::to_value(LimitResponse {
            limit: PriceLevel::new(2645.5),
            raw_response: "LIMIT: $2645.5".to_string(),
        })
        .unwrap();
        assert_eq!(body["limit"], "$2645.50");
    }
}
