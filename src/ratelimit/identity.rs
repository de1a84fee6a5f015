use axum::http::HeaderMap;
use std::sync::Arc;

/// Bucket shared by every request that carries no client address.
pub const UNKNOWN_CLIENT: &str = "unknown";

/// Derives the rate-limit key for a request from its headers.
///
/// Deployments behind a different proxy, or with an authenticated identity,
/// can supply their own function.
pub type ClientIdentity = Arc<dyn Fn(&HeaderMap) -> String + Send + Sync>;

/// The default identity: the first address in `X-Forwarded-For`.
///
/// The header is trusted as set by the fronting proxy. Requests without it
/// all share the [`UNKNOWN_CLIENT`] bucket, and clients behind one proxy
/// share that proxy's address.
pub fn forwarded_for(headers: &HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|addr| !addr.is_empty())
        .unwrap_or(UNKNOWN_CLIENT)
        .to_string()
}

/// [`forwarded_for`] as a [`ClientIdentity`].
pub fn default_identity() -> ClientIdentity {
    Arc::new(forwarded_for)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static(value));
        headers
    }

    #[test]
    fn test_first_forwarded_address_wins() {
        assert_eq!(forwarded_for(&headers("203.0.113.7, 10.0.0.1")), "203.0.113.7");
        assert_eq!(forwarded_for(&headers("  198.51.100.2 ")), "198.51.100.2");
    }

    #[test]
    fn test_missing_header_is_unknown() {
        assert_eq!(forwarded_for(&HeaderMap::new()), UNKNOWN_CLIENT);
    }

    #[test]
    fn test_empty_header_is_unknown() {
        assert_eq!(forwarded_for(&headers("")), UNKNOWN_CLIENT);
        assert_eq!(forwarded_for(&headers(" , 10.0.0.1")), UNKNOWN_CLIENT);
    }

    #[test]
    fn test_custom_identity_is_pluggable() {
        let by_api_key: ClientIdentity = Arc::new(|headers: &HeaderMap| {
            headers
                .get("x-api-key")
                .and_then(|v| v.to_str().ok())
                .unwrap_or(UNKNOWN_CLIENT)
                .to_string()
        });
        let mut map = HeaderMap::new();
        map.insert("x-api-key", HeaderValue::from_static("team-a"));
        assert_eq!(by_api_key(&map), "team-a");
    }
}
