use super::AppState;
use crate::post::BlogPost;
use axum::{extract::State, response::IntoResponse, Json};
use serde::Serialize;

/// Body of `GET /api/blog`.
#[derive(Debug, Clone, Serialize)]
pub struct PostsResponse {
    pub posts: Vec<BlogPost>,
}

/// Fetches the feed and returns its posts.
///
/// Upstream failures are logged by the ingestor and yield an empty list,
/// so this always answers 200.
pub async fn list_posts(State(state): State<AppState>) -> impl IntoResponse {
    let posts = state.ingestor.fetch_posts().await;
    tracing::debug!(count = posts.len(), "Serving posts");
    Json(PostsResponse { posts })
}

pub async fn health() -> &'static str {
    "ok"
}
