//! Recent news headlines for a topic

use crate::error::{AnalystError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::NonZeroU32;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

#[cfg(test)]
use mockall::automock;

type SharedRateLimiter = Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>;

/// Default NewsAPI endpoint
pub const NEWS_API_BASE: &str = "https://newsapi.org/v2";

/// NewsAPI developer tier allows 100 requests per day; stay well under a burst
const DEFAULT_REQUESTS_PER_MINUTE: u32 = 30;

/// Source of recent news for a topic
#[cfg_attr(test, automock)]
#[async_trait]
pub trait NewsSource: Send + Sync {
    /// Fetch articles about `topic` published since `since`
    ///
    /// Fails with [`AnalystError::NewsUnavailable`] on transport errors or
    /// quota exhaustion.
    async fn fetch(&self, topic: &str, since: DateTime<Utc>) -> Result<NewsDigest>;
}

/// A single headline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsItem {
    pub title: String,
    pub source: String,
    pub published_at: DateTime<Utc>,
    pub snippet: String,
}

/// Headlines ordered most recent first
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewsDigest {
    pub items: Vec<NewsItem>,
}

impl NewsDigest {
    /// Keep items published at or after `since`, newest first, at most `max` of them
    pub fn from_items(mut items: Vec<NewsItem>, since: DateTime<Utc>, max: usize) -> Self {
        items.retain(|item| item.published_at >= since);
        items.sort_by(|a, b| b.published_at.cmp(&a.published_at));
        items.truncate(max);
        Self { items }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }
}

impl fmt::Display for NewsDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.items.is_empty() {
            return writeln!(f, "No recent news available.");
        }

        for (i, item) in self.items.iter().enumerate() {
            writeln!(
                f,
                "{}. [{}] {} ({})",
                i + 1,
                item.published_at.format("%Y-%m-%d %H:%M UTC"),
                item.title,
                item.source
            )?;
            if !item.snippet.is_empty() {
                writeln!(f, "   {}", item.snippet)?;
            }
        }
        Ok(())
    }
}

/// NewsAPI `/everything` article
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NewsApiArticle {
    source: NewsApiSource,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    description: Option<String>,
    published_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct NewsApiSource {
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NewsApiResponse {
    #[serde(default)]
    articles: Vec<NewsApiArticle>,
}

#[derive(Debug, Deserialize)]
struct NewsApiErrorBody {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl NewsApiArticle {
    fn into_item(self) -> Option<NewsItem> {
        let title = self.title?.trim().to_string();
        // Takedowns come back as "[Removed]" placeholders
        if title.is_empty() || title == "[Removed]" {
            return None;
        }

        Some(NewsItem {
            title,
            source: self.source.name.unwrap_or_else(|| "unknown".to_string()),
            published_at: self.published_at,
            snippet: self.description.unwrap_or_default().trim().to_string(),
        })
    }
}

/// NewsAPI client with client-side rate limiting
pub struct NewsApiClient {
    client: Client,
    api_key: String,
    base_url: String,
    max_articles: usize,
    rate_limiter: SharedRateLimiter,
}

impl NewsApiClient {
    /// Create a new NewsAPI client
    ///
    /// # Arguments
    /// * `client` - Shared HTTP client
    /// * `api_key` - NewsAPI key
    /// * `max_articles` - Cap on articles per digest
    pub fn new(client: Client, api_key: impl Into<String>, max_articles: usize) -> Self {
        let quota = Quota::per_minute(
            NonZeroU32::new(DEFAULT_REQUESTS_PER_MINUTE).unwrap_or(NonZeroU32::MIN),
        );

        Self {
            client,
            api_key: api_key.into(),
            base_url: NEWS_API_BASE.to_string(),
            max_articles: max_articles.max(1),
            rate_limiter: Arc::new(RateLimiter::direct(quota)),
        }
    }

    /// Point the client at a different NewsAPI-compatible endpoint
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }
}

#[async_trait]
impl NewsSource for NewsApiClient {
    #[instrument(skip(self), fields(since = %since.format("%Y-%m-%d")))]
    async fn fetch(&self, topic: &str, since: DateTime<Utc>) -> Result<NewsDigest> {
        self.rate_limiter.until_ready().await;

        let page_size = self.max_articles.to_string();
        let from = since.format("%Y-%m-%dT%H:%M:%S").to_string();

        let response = self
            .client
            .get(format!("{}/everything", self.base_url))
            .header("X-Api-Key", &self.api_key)
            .query(&[
                ("q", topic),
                ("from", from.as_str()),
                ("sortBy", "publishedAt"),
                ("language", "en"),
                ("pageSize", page_size.as_str()),
            ])
            .send()
            .await
            .map_err(|e| AnalystError::NewsUnavailable(format!("NewsAPI request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<NewsApiErrorBody>(&body).ok();
            let code = detail.as_ref().and_then(|d| d.code.as_deref()).unwrap_or("unknown");

            if status.as_u16() == 429 || code == "rateLimited" {
                warn!("NewsAPI quota exhausted");
                return Err(AnalystError::NewsUnavailable(
                    "NewsAPI rate limit exceeded".to_string(),
                ));
            }

            let message = detail
                .as_ref()
                .and_then(|d| d.message.clone())
                .unwrap_or(body);
            return Err(AnalystError::NewsUnavailable(format!(
                "NewsAPI error {status} ({code}): {message}"
            )));
        }

        let payload: NewsApiResponse = response.json().await.map_err(|e| {
            AnalystError::NewsUnavailable(format!("Failed to parse NewsAPI response: {e}"))
        })?;

        let items: Vec<NewsItem> = payload
            .articles
            .into_iter()
            .filter_map(NewsApiArticle::into_item)
            .collect();

        let digest = NewsDigest::from_items(items, since, self.max_articles);
        debug!(articles = digest.len(), "Fetched news digest");
        Ok(digest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::Router;
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::get;
    use chrono::{Duration, TimeZone};
    use serde_json::json;
    use tokio::net::TcpListener;

    fn item(title: &str, hours_ago: i64) -> NewsItem {
        let now = Utc.with_ymd_and_hms(2026, 10, 17, 12, 0, 0).unwrap();
        NewsItem {
            title: title.to_string(),
            source: "Reuters".to_string(),
            published_at: now - Duration::hours(hours_ago),
            snippet: format!("{title} snippet"),
        }
    }

    #[test]
    fn test_digest_filters_sorts_and_caps() {
        let since = Utc.with_ymd_and_hms(2026, 10, 10, 12, 0, 0).unwrap();
        let items = vec![
            item("older", 30),
            item("too old", 24 * 8),
            item("newest", 1),
            item("middle", 5),
        ];

        let digest = NewsDigest::from_items(items, since, 2);
        let titles: Vec<_> = digest.items.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, ["newest", "middle"]);
    }

    #[test]
    fn test_digest_display() {
        let since = Utc.with_ymd_and_hms(2026, 10, 10, 0, 0, 0).unwrap();
        let digest = NewsDigest::from_items(vec![item("Gold hits record", 2)], since, 10);
        let text = digest.to_string();

        assert!(text.starts_with("1. [2026-10-17 10:00 UTC] Gold hits record (Reuters)"));
        assert!(text.contains("   Gold hits record snippet"));
        assert_eq!(NewsDigest::default().to_string(), "No recent news available.\n");
    }

    #[test]
    fn test_article_conversion() {
        let body = r#"{
            "status": "ok",
            "totalResults": 3,
            "articles": [
                {"source": {"id": null, "name": "Kitco"}, "title": "Gold steadies", "description": " Prices hold above support. ", "publishedAt": "2026-10-17T08:30:00Z"},
                {"source": {"id": null, "name": "[Removed]"}, "title": "[Removed]", "description": null, "publishedAt": "2026-10-17T08:00:00Z"},
                {"source": {"id": null, "name": null}, "title": "Dollar slips", "publishedAt": "2026-10-16T22:15:00Z"}
            ]
        }"#;

        let payload: NewsApiResponse = serde_json::from_str(body).unwrap();
        let items: Vec<NewsItem> = payload
            .articles
            .into_iter()
            .filter_map(NewsApiArticle::into_item)
            .collect();

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].source, "Kitco");
        assert_eq!(items[0].snippet, "Prices hold above support.");
        assert_eq!(items[1].source, "unknown");
        assert_eq!(items[1].snippet, "");
    }

    #[test]
    fn test_error_body_parsing() {
        let body = r#"{"status":"error","code":"rateLimited","message":"You have made too many requests"}"#;
        let detail: NewsApiErrorBody = serde_json::from_str(body).unwrap();
        assert_eq!(detail.code.as_deref(), Some("rateLimited"));
    }

    /// Serve `body` with `status` at `/everything` on an ephemeral port
    async fn newsapi_stub(status: StatusCode, body: String) -> String {
        let app = Router::new().route(
            "/everything",
            get(move |headers: HeaderMap| {
                let body = body.clone();
                async move {
                    if headers.get("X-Api-Key").is_none() {
                        return (StatusCode::UNAUTHORIZED, String::new());
                    }
                    (status, body)
                }
            }),
        );
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn client(base_url: &str, max_articles: usize) -> NewsApiClient {
        NewsApiClient::new(Client::new(), "test-key", max_articles).with_base_url(base_url)
    }

    async fn fetch_error(status: StatusCode, body: &str) -> String {
        let base = newsapi_stub(status, body.to_string()).await;
        let err = client(&base, 5)
            .fetch("gold market", Utc::now() - Duration::days(7))
            .await
            .unwrap_err();
        match err {
            AnalystError::NewsUnavailable(msg) => msg,
            other => panic!("expected NewsUnavailable, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_fetch_filters_and_caps_digest() {
        let now = Utc::now();
        let at = |hours: i64| (now - Duration::hours(hours)).to_rfc3339();
        let body = json!({
            "status": "ok",
            "articles": [
                {"source": {"name": "Kitco"}, "title": "Gold steadies", "publishedAt": at(3)},
                {"source": {"name": "Reuters"}, "title": "Dollar slips", "publishedAt": at(1)},
                {"source": {"name": "[Removed]"}, "title": "[Removed]", "publishedAt": at(2)},
                {"source": {"name": "FT"}, "title": "Last month's rally", "publishedAt": at(24 * 30)},
                {"source": {"name": "Bloomberg"}, "title": "ETF outflows", "publishedAt": at(5)}
            ]
        });
        let base = newsapi_stub(StatusCode::OK, body.to_string()).await;

        let digest = client(&base, 2)
            .fetch("gold market", now - Duration::days(7))
            .await
            .unwrap();

        let titles: Vec<_> = digest.items.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, ["Dollar slips", "Gold steadies"]);
    }

    #[tokio::test]
    async fn test_http_429_is_unavailable() {
        let msg = fetch_error(StatusCode::TOO_MANY_REQUESTS, "slow down").await;
        assert_eq!(msg, "NewsAPI rate limit exceeded");
    }

    #[tokio::test]
    async fn test_rate_limited_code_is_unavailable() {
        let body = r#"{"status":"error","code":"rateLimited","message":"You have made too many requests"}"#;
        let msg = fetch_error(StatusCode::BAD_REQUEST, body).await;
        assert_eq!(msg, "NewsAPI rate limit exceeded");
    }

    #[tokio::test]
    async fn test_other_status_is_unavailable() {
        let body = r#"{"status":"error","code":"apiKeyInvalid","message":"Your API key is invalid"}"#;
        let msg = fetch_error(StatusCode::UNAUTHORIZED, body).await;
        assert!(msg.contains("apiKeyInvalid"), "{msg}");
        assert!(msg.contains("Your API key is invalid"), "{msg}");

        let msg = fetch_error(StatusCode::INTERNAL_SERVER_ERROR, "upstream down").await;
        assert!(msg.contains("(unknown): upstream down"), "{msg}");
    }

    #[tokio::test]
    async fn test_malformed_body_is_unavailable() {
        let msg = fetch_error(StatusCode::OK, "<html>not json</html>").await;
        assert!(msg.starts_with("Failed to parse NewsAPI response"), "{msg}");
    }

    #[tokio::test]
    #[ignore = "requires NEWS_API_KEY and network access"]
    async fn test_fetch_live() {
        let key = std::env::var("NEWS_API_KEY").unwrap();
        let client = NewsApiClient::new(Client::new(), key, 5);
        let digest = client
            .fetch("gold market", Utc::now() - Duration::days(7))
            .await
            .unwrap();
        assert!(digest.len() <= 5);
    }
}
