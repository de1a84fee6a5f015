//! Pure extraction of display-ready fields from untrusted post HTML.
//!
//! Each function takes a feed item's HTML and returns one field of a
//! [`BlogPost`](crate::post::BlogPost):
//!
//! - [`extract_summary`] / [`fallback_description`] - bounded summary text
//! - [`extract_thumbnail`] - representative image URL
//! - [`estimate_reading_time`] - minutes to read, at least one
//! - [`to_plain_text`] - the whole body without markup
//!
//! None of them perform I/O, and identical input always yields identical
//! output. A "no match" is never an error: summary extraction yields an
//! empty string and thumbnail extraction yields `None`, and the caller applies
//! the documented fallback.

pub mod markup;
mod reading_time;
mod summary;
mod thumbnail;

pub use reading_time::estimate_reading_time;
pub use summary::{extract_summary, fallback_description, to_plain_text};
pub use thumbnail::extract_thumbnail;

/// Default reading speed used for reading-time estimates.
pub const DEFAULT_WORDS_PER_MINUTE: usize = 200;

/// Default summary length, in characters, before the ellipsis.
pub const DEFAULT_DESCRIPTION_MAX_CHARS: usize = 200;
