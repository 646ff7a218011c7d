//! Gold analysis HTTP server
//!
//! # Usage
//!
//! ```bash
//! export OPENAI_API_KEY="sk-..."
//! export PERPLEXITY_API_KEY="pplx-..."
//! export NEWS_API_KEY="..."
//!
//! cargo run --bin gold-server -p gold-analyst -- --port 8000
//! ```

use anyhow::Context;
use clap::Parser;
use gold_analyst::http::{self, AppState};
use gold_analyst::{
    AnalysisWorkflow, AnalystConfig, ApiCredentials, NewsApiClient, SearchIntelligence,
    SummaryCache, YahooMarketData,
};
use gold_llm::providers::{OpenAIConfig, OpenAIProvider};
use gold_utils::{LogFormat, init_tracing};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

const DEFAULT_LOG_FILTER: &str = "info,gold_analyst=info";

/// How often the background task checks for an expired summary
const SUMMARY_CHECK_INTERVAL: Duration = Duration::from_secs(60);

/// Gold market analysis API
#[derive(Debug, Parser)]
#[command(name = "gold-server", version, about)]
struct Args {
    /// Address to bind
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    host: String,

    /// Port to listen on
    #[arg(long, env = "PORT", default_value_t = 8000)]
    port: u16,

    /// Emit logs as JSON lines
    #[arg(long, env = "LOG_JSON")]
    log_json: bool,

    /// Disable the background summary refresh
    #[arg(long, env = "NO_REFRESH")]
    no_refresh: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(
        DEFAULT_LOG_FILTER,
        if args.log_json {
            LogFormat::Json
        } else {
            LogFormat::Pretty
        },
    );

    // Missing credentials or bad settings stop the process here
    let config = AnalystConfig::from_env().context("invalid configuration")?;
    let credentials = ApiCredentials::from_env().context("missing API credentials")?;

    let http_client = reqwest::Client::builder()
        .timeout(config.provider_timeout)
        .build()
        .context("failed to build HTTP client")?;

    let market = YahooMarketData::new()?;
    let news = NewsApiClient::new(
        http_client,
        credentials.news_api_key.clone(),
        config.news_max_articles,
    );
    let intelligence = SearchIntelligence::perplexity(
        credentials.perplexity_api_key.clone(),
        config.intelligence_model.clone(),
        &config.display_symbol,
        config.provider_timeout,
    )?;

    let mut llm_config = OpenAIConfig::new(credentials.openai_api_key.clone())
        .with_timeout(config.completion_timeout);
    if let Some(api_base) = &credentials.openai_api_base {
        llm_config = llm_config.with_api_base(api_base);
    }
    let llm = OpenAIProvider::with_config(llm_config).context("failed to create LLM provider")?;

    info!(
        model = %config.model,
        api_base = %llm.config().api_base,
        gold = %config.gold_symbol,
        dollar_index = %config.dollar_index_symbol,
        "Configuration loaded"
    );

    let summary_ttl = config.summary_ttl;
    let display_symbol = config.display_symbol.clone();
    let workflow = Arc::new(
        AnalysisWorkflow::builder()
            .market(Arc::new(market))
            .news(Arc::new(news))
            .intelligence(Arc::new(intelligence))
            .llm(Arc::new(llm))
            .config(config)
            .build()?,
    );

    let summary = Arc::new(SummaryCache::new(
        Arc::clone(&workflow),
        display_symbol,
        summary_ttl,
    ));
    if args.no_refresh {
        warn!("Background summary refresh disabled");
    } else {
        Arc::clone(&summary).spawn_refresher(SUMMARY_CHECK_INTERVAL);
    }

    let app = http::router(AppState::new(workflow, summary));
    let listener = tokio::net::TcpListener::bind((args.host.as_str(), args.port))
        .await
        .with_context(|| format!("failed to bind {}:{}", args.host, args.port))?;
    info!(address = %listener.local_addr()?, "Gold analysis API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
