//! Per-client fixed-window rate limiting for the delivery endpoint.
//!
//! - [`RateLimiter`] counts requests and returns a [`Decision`]
//! - [`RateLimitStore`] holds the counters; it is owned and injected, never global
//! - [`Clock`] supplies time, so tests can move windows forward with [`ManualClock`]
//! - [`ClientIdentity`] maps request headers to a client key
//!
//! # Example
//!
//! ```
//! use blogwire::ratelimit::RateLimiter;
//! use chrono::TimeDelta;
//!
//! let limiter = RateLimiter::new(2, TimeDelta::seconds(60));
//! assert!(limiter.admit("198.51.100.2").is_allowed());
//! assert!(limiter.admit("198.51.100.2").is_allowed());
//! assert!(!limiter.admit("198.51.100.2").is_allowed());
//! ```

mod clock;
mod identity;
mod limiter;

pub use clock::{Clock, ManualClock, SystemClock};
pub use identity::{default_identity, forwarded_for, ClientIdentity, UNKNOWN_CLIENT};
pub use limiter::{Decision, RateLimitEntry, RateLimitStore, RateLimiter};
