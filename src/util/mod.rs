//! Utility functions for common operations.
//!
//! This module provides reusable utilities for:
//!
//! - **URL validation**: Scheme and host checks for the configured feed URL
//! - **Text processing**: Unicode-safe truncation and whitespace normalization
//!
//! # Examples
//!
//! ```
//! use blogwire::util::{collapse_whitespace, truncate_chars, validate_feed_url};
//!
//! // Validate a feed URL
//! let url = validate_feed_url("https://example.com/feed.xml").unwrap();
//!
//! // Normalize whitespace left behind by tag stripping
//! assert_eq!(collapse_whitespace("  Hello \n world "), "Hello world");
//!
//! // Bound a summary
//! assert_eq!(truncate_chars("Long article title", 4), "Long...");
//! ```

mod text;
mod url_validator;

pub use text::{collapse_whitespace, truncate_chars};
pub use url_validator::{validate_feed_url, UrlValidationError};
