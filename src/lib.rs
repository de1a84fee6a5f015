//! Fetches a blog's RSS/Atom feed, extracts summaries, thumbnails and
//! reading times, and serves the posts over HTTP behind a per-client
//! fixed-window rate limit.

pub mod config;
pub mod extract;
pub mod feed;
pub mod ingest;
pub mod post;
pub mod ratelimit;
pub mod server;
pub mod util;
