use super::clock::{Clock, SystemClock};
use chrono::{DateTime, TimeDelta, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Request count for one client in its current window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitEntry {
    pub count: u32,
    pub window_reset_at: DateTime<Utc>,
}

/// Shared per-client counters.
///
/// The whole admit step runs under this store's single lock, so two
/// requests from the same client can never both observe the same count.
/// Passing one store to several limiters makes them share quotas.
#[derive(Debug, Default)]
pub struct RateLimitStore {
    entries: Mutex<HashMap<String, RateLimitEntry>>,
}

impl RateLimitStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of tracked clients, expired or not.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of one client's entry.
    pub fn get(&self, client_id: &str) -> Option<RateLimitEntry> {
        self.lock().get(client_id).copied()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, RateLimitEntry>> {
        // Entries are plain counters; a panic mid-update cannot leave them invalid
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Outcome of [`RateLimiter::admit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow {
        limit: u32,
        remaining: u32,
        reset_at: DateTime<Utc>,
    },
    Reject {
        limit: u32,
        reset_at: DateTime<Utc>,
    },
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow { .. })
    }

    pub fn limit(&self) -> u32 {
        match self {
            Decision::Allow { limit, .. } | Decision::Reject { limit, .. } => *limit,
        }
    }

    /// Requests left in the window; zero when rejected.
    pub fn remaining(&self) -> u32 {
        match self {
            Decision::Allow { remaining, .. } => *remaining,
            Decision::Reject { .. } => 0,
        }
    }

    /// When the client's current window ends.
    pub fn reset_at(&self) -> DateTime<Utc> {
        match self {
            Decision::Allow { reset_at, .. } | Decision::Reject { reset_at, .. } => *reset_at,
        }
    }
}

/// Fixed-window request counter keyed by client identity.
///
/// Each client may make `max_requests` requests per `window`. The window
/// starts at the client's first request and restarts with the first request
/// after it has ended.
#[derive(Clone)]
pub struct RateLimiter {
    store: Arc<RateLimitStore>,
    clock: Arc<dyn Clock>,
    max_requests: u32,
    window: TimeDelta,
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter")
            .field("max_requests", &self.max_requests)
            .field("window", &self.window)
            .field("clients", &self.store.len())
            .finish()
    }
}

impl RateLimiter {
    /// Creates a limiter with its own store and the system clock.
    pub fn new(max_requests: u32, window: TimeDelta) -> Self {
        Self::with_parts(
            Arc::new(RateLimitStore::new()),
            Arc::new(SystemClock),
            max_requests,
            window,
        )
    }

    /// Creates a limiter over an existing store and clock.
    pub fn with_parts(
        store: Arc<RateLimitStore>,
        clock: Arc<dyn Clock>,
        max_requests: u32,
        window: TimeDelta,
    ) -> Self {
        Self {
            store,
            clock,
            max_requests,
            window,
        }
    }

    pub fn max_requests(&self) -> u32 {
        self.max_requests
    }

    pub fn store(&self) -> &Arc<RateLimitStore> {
        &self.store
    }

    /// Current time on this limiter's clock.
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Counts one request from `client_id` and decides whether to serve it.
    ///
    /// Expired entries of *all* clients are purged first, which bounds the
    /// store to clients seen within the last window.
    pub fn admit(&self, client_id: &str) -> Decision {
        let now = self.clock.now();
        let mut entries = self.store.lock();

        let before = entries.len();
        entries.retain(|_, entry| entry.window_reset_at >= now);
        let purged = before - entries.len();
        if purged > 0 {
            tracing::trace!(purged = purged, "Purged expired rate limit entries");
        }

        let window = self.window;
        let entry = entries
            .entry(client_id.to_string())
            .or_insert_with(|| RateLimitEntry {
                count: 0,
                window_reset_at: now + window,
            });

        if now > entry.window_reset_at {
            entry.count = 0;
            entry.window_reset_at = now + window;
        }

        entry.count = entry.count.saturating_add(1);

        if entry.count > self.max_requests {
            Decision::Reject {
                limit: self.max_requests,
                reset_at: entry.window_reset_at,
            }
        } else {
            Decision::Allow {
                limit: self.max_requests,
                remaining: self.max_requests - entry.count,
                reset_at: entry.window_reset_at,
            }
        }
    }
}
