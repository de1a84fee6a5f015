//! Feed retrieval and parsing.
//!
//! - `parser` - RSS/RDF via `quick-xml`, Atom via `feed-rs`, into [`RawItem`]s
//! - `fetcher` - one bounded HTTP GET of the configured feed URL
//! - [`cache`] - the [`CacheProvider`] capability behind the fetcher's
//!   staleness window
//!
//! # Example
//!
//! ```ignore
//! use blogwire::feed::{parse, FeedFetcher};
//!
//! let fetcher = FeedFetcher::new(client, "https://blog.example.com/rss.xml", timeout);
//! let items = parse(&fetcher.fetch().await?)?;
//! ```

pub mod cache;
mod fetcher;
mod parser;

pub use cache::{CacheProvider, MemoryCache, NoCache};
pub use fetcher::{FeedFetcher, FetchError, DEFAULT_REVALIDATE};
pub use parser::{parse, ParseError, RawItem};
