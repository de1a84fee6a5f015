use anyhow::{Context, Result};
use blogwire::config::Config;
use blogwire::feed::{CacheProvider, FeedFetcher, MemoryCache, NoCache};
use blogwire::ingest::Ingestor;
use blogwire::ratelimit::RateLimiter;
use blogwire::server::{self, AppState};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "blogwire")]
#[command(about = "Serve a blog feed as JSON behind a per-client rate limit")]
struct Args {
    /// Path to the TOML config file (optional; defaults apply if missing)
    #[arg(long, value_name = "FILE", default_value = "blogwire.toml")]
    config: PathBuf,

    /// Override the listen address
    #[arg(long, value_name = "ADDR")]
    bind: Option<String>,

    /// Override the upstream feed URL
    #[arg(long, value_name = "URL")]
    feed_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let mut config = Config::load(&args.config)
        .with_context(|| format!("Failed to load config '{}'", args.config.display()))?;
    if let Some(bind) = args.bind {
        config.bind_addr = bind;
    }
    if let Some(feed_url) = args.feed_url {
        config.feed_url = feed_url;
    }
    config.validate().context("Invalid configuration")?;

    let http_client = reqwest::Client::builder()
        .user_agent(concat!("blogwire/", env!("CARGO_PKG_VERSION")))
        .redirect(reqwest::redirect::Policy::limited(5))
        .pool_max_idle_per_host(4)
        .pool_idle_timeout(Duration::from_secs(30))
        .tcp_keepalive(Duration::from_secs(60))
        .build()
        .context("Failed to create HTTP client")?;

    let cache: Arc<dyn CacheProvider> = if config.cache_capacity == 0 {
        Arc::new(NoCache)
    } else {
        Arc::new(MemoryCache::new(config.cache_capacity))
    };
    let fetcher = FeedFetcher::new(http_client, config.feed_url.clone(), config.fetch_timeout())
        .with_cache(cache, config.revalidate());
    let ingestor = Ingestor::new(fetcher, config.extract);
    let limiter = RateLimiter::new(config.rate_limit.max_requests, config.rate_limit_window());

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr))?;

    tracing::info!(
        feed_url = %config.feed_url,
        max_requests = config.rate_limit.max_requests,
        window_secs = config.rate_limit.window_secs,
        "Starting blogwire"
    );

    server::serve(listener, AppState::new(ingestor, limiter))
        .await
        .context("Server error")?;
    Ok(())
}
