//! HTTP delivery of extracted posts.
//!
//! ```text
//! GET /api/blog   -> {"posts": [...]}   (rate limited per client)
//! GET /health     -> "ok"               (not rate limited)
//! ```

mod handlers;
mod rate_limit;

pub use handlers::PostsResponse;

use crate::ingest::Ingestor;
use crate::ratelimit::{default_identity, ClientIdentity, RateLimiter};
use axum::{middleware, routing::get, Router};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Everything a request handler needs.
#[derive(Clone)]
pub struct AppState {
    pub ingestor: Arc<Ingestor>,
    pub limiter: Arc<RateLimiter>,
    pub identity: ClientIdentity,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("ingestor", &self.ingestor)
            .field("limiter", &self.limiter)
            .finish_non_exhaustive()
    }
}

impl AppState {
    /// State keyed on `X-Forwarded-For`.
    pub fn new(ingestor: Ingestor, limiter: RateLimiter) -> Self {
        Self::with_identity(ingestor, limiter, default_identity())
    }

    pub fn with_identity(ingestor: Ingestor, limiter: RateLimiter, identity: ClientIdentity) -> Self {
        Self {
            ingestor: Arc::new(ingestor),
            limiter: Arc::new(limiter),
            identity,
        }
    }
}

/// Builds the application router.
pub fn create_router(state: AppState) -> Router {
    let api = Router::new()
        .route("/blog", get(handlers::list_posts))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit::enforce,
        ));

    Router::new()
        .nest("/api", api)
        .route("/health", get(handlers::health))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Serves until Ctrl-C.
pub async fn serve(listener: TcpListener, state: AppState) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        tracing::info!(addr = %addr, "Listening");
    }
    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to install Ctrl-C handler");
        // Without a signal handler, never trigger shutdown
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
