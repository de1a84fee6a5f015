//! The ingestion pipeline: fetch the feed, parse it, extract every item.
//!
//! [`Ingestor::fetch_posts`] is the only entry point the delivery layer uses.
//! It never fails: an upstream outage, a broken document or a panic while
//! extracting all degrade to an empty list, with the cause logged.

use crate::config::ExtractConfig;
use crate::extract::{
    estimate_reading_time, extract_summary, extract_thumbnail, fallback_description,
    to_plain_text,
};
use crate::feed::{parse, FeedFetcher, FetchError, ParseError, RawItem};
use crate::post::{BlogPost, PublishedAt};
use futures::FutureExt;
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::panic::AssertUnwindSafe;
use thiserror::Error;

/// Failures inside the pipeline. Never surfaced past [`Ingestor::fetch_posts`].
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("feed fetch failed: {0}")]
    Fetch(#[from] FetchError),
    #[error("feed parse failed: {0}")]
    Parse(#[from] ParseError),
}

/// Composes fetcher, parser and extractor into a list of posts.
#[derive(Debug, Clone)]
pub struct Ingestor {
    fetcher: FeedFetcher,
    extract: ExtractConfig,
}

impl Ingestor {
    pub fn new(fetcher: FeedFetcher, extract: ExtractConfig) -> Self {
        Self { fetcher, extract }
    }

    /// Fetches and extracts the current posts.
    ///
    /// Returns an empty `Vec` if the fetch fails, the document cannot be
    /// parsed, the feed has no items, or anything in the pipeline panics.
    pub async fn fetch_posts(&self) -> Vec<BlogPost> {
        match AssertUnwindSafe(self.try_fetch_posts()).catch_unwind().await {
            Ok(Ok(posts)) => posts,
            Ok(Err(e)) => {
                tracing::warn!(
                    url = %self.fetcher.url(),
                    error = %e,
                    "Feed ingestion failed, serving no posts"
                );
                Vec::new()
            }
            Err(_) => {
                tracing::error!(
                    url = %self.fetcher.url(),
                    "Feed ingestion panicked, serving no posts"
                );
                Vec::new()
            }
        }
    }

    /// Like [`fetch_posts`](Self::fetch_posts) but reports why it failed.
    pub async fn try_fetch_posts(&self) -> Result<Vec<BlogPost>, IngestError> {
        let document = self.fetcher.fetch().await?;
        let items = parse(&document)?;

        if items.is_empty() {
            tracing::warn!(url = %self.fetcher.url(), "Feed contains no items");
            return Ok(Vec::new());
        }

        let posts = build_posts(items, &self.extract);
        tracing::info!(url = %self.fetcher.url(), posts = posts.len(), "Ingested feed");
        Ok(posts)
    }
}

/// Builds posts from parsed items, keeping the first item for each link.
pub fn build_posts(items: Vec<RawItem>, extract: &ExtractConfig) -> Vec<BlogPost> {
    let mut seen_links = HashSet::new();
    let total = items.len();

    let posts: Vec<BlogPost> = items
        .into_iter()
        .filter(|item| item.link.is_empty() || seen_links.insert(item.link.clone()))
        .map(|item| build_post(item, extract))
        .collect();

    let duplicates = total - posts.len();
    if duplicates > 0 {
        tracing::debug!(duplicates = duplicates, "Dropped items with duplicate links");
    }

    posts
}

/// Builds one post from one feed item.
///
/// The description is the first body paragraph, or the feed's own
/// description when the body has none.
pub fn build_post(item: RawItem, extract: &ExtractConfig) -> BlogPost {
    let summary = extract_summary(&item.content, extract.description_max_chars);
    let description = if summary.is_empty() {
        fallback_description(&item.description, extract.description_max_chars)
    } else {
        summary
    };

    let guid = generate_guid(&item.guid, &item.link, &item.title, &item.pub_date);

    BlogPost {
        thumbnail: extract_thumbnail(&item.content, &item.description),
        content: to_plain_text(&item.content),
        reading_time: estimate_reading_time(&item.content, extract.words_per_minute),
        pub_date: PublishedAt::parse(&item.pub_date),
        title: item.title,
        link: item.link,
        description,
        categories: item.categories,
        guid,
        author: item.author,
    }
}

/// Feed guid if present, else the link, else a hash of the item's identity.
fn generate_guid(existing: &str, link: &str, title: &str, pub_date: &str) -> String {
    let existing = existing.trim();
    if !existing.is_empty() {
        return existing.to_string();
    }
    if !link.is_empty() {
        return link.to_string();
    }

    let input = format!("{}|{}|{}", link, title, pub_date);
    let hash = Sha256::digest(input.as_bytes());
    format!("{:x}", hash)
}
