//! Display-ready post records produced by the ingestion pipeline.

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};

/// Estimated time to read a post. Always at least one minute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadingTime {
    pub minutes: u32,
}

impl ReadingTime {
    /// Builds a reading time, flooring at one minute.
    pub fn from_minutes(minutes: u32) -> Self {
        Self {
            minutes: minutes.max(1),
        }
    }
}

/// Publication time of a post.
///
/// Feeds in the wild emit dates in every format imaginable. A date that
/// parses as RFC 2822 or RFC 3339 is normalized to UTC; anything else is kept
/// verbatim so nothing is silently dropped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PublishedAt {
    Parsed(DateTime<Utc>),
    Raw(String),
}

impl PublishedAt {
    /// Parses a feed date string.
    ///
    /// # Examples
    ///
    /// ```
    /// use blogwire::post::PublishedAt;
    ///
    /// assert!(matches!(
    ///     PublishedAt::parse("Tue, 10 Jun 2025 04:00:00 GMT"),
    ///     PublishedAt::Parsed(_)
    /// ));
    /// assert_eq!(
    ///     PublishedAt::parse("last tuesday"),
    ///     PublishedAt::Raw("last tuesday".to_string())
    /// );
    /// ```
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        DateTime::parse_from_rfc2822(trimmed)
            .or_else(|_| DateTime::parse_from_rfc3339(trimmed))
            .map(|dt: DateTime<FixedOffset>| PublishedAt::Parsed(dt.with_timezone(&Utc)))
            .unwrap_or_else(|_| PublishedAt::Raw(raw.to_string()))
    }

    /// Returns the parsed timestamp, if the feed's date was understood.
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            PublishedAt::Parsed(dt) => Some(*dt),
            PublishedAt::Raw(_) => None,
        }
    }
}

/// One post, built fresh from a feed item on every pipeline run.
///
/// Serialized with camelCase keys (`pubDate`, `readingTime`) to match the
/// delivery endpoint's JSON contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogPost {
    pub title: String,
    /// Source URL. Also the dedupe key within one feed.
    pub link: String,
    pub pub_date: PublishedAt,
    /// Bounded summary: first body paragraph, or the feed description.
    pub description: String,
    pub thumbnail: Option<String>,
    pub categories: Vec<String>,
    /// Plain-text body.
    pub content: String,
    pub reading_time: ReadingTime,
    pub guid: String,
    pub author: String,
}
