// OAuth 2 access token cache

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use std::sync::Arc;

use crate::clock::{Clock, SystemClock};

/// Safety margin subtracted from every token lifetime (seconds)
pub const EXPIRY_BUFFER_SECS: i64 = 300;

/// Cached token with its effective expiry
#[derive(Debug, Clone)]
struct CacheEntry {
    token: String,
    expires_at: DateTime<Utc>,
}

/// Thread-safe cache of bearer tokens keyed by client id
pub struct TokenCache {
    entries: Arc<DashMap<String, CacheEntry>>,
    clock: Arc<dyn Clock>,
}

impl TokenCache {
    /// Create an empty cache backed by the system clock
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
            clock,
        }
    }

    fn cache_key(client_id: &str) -> String {
        format!("pstn-transfer:tokencache:{}", client_id)
    }

    /// Get a token that has not yet reached its effective expiry
    pub fn get(&self, client_id: &str) -> Option<String> {
        let entry = self.entries.get(&Self::cache_key(client_id))?;
        if !entry.token.is_empty() && self.clock.now() < entry.expires_at {
            Some(entry.token.clone())
        } else {
            None
        }
    }

    /// Cache a token for `expires_in_secs` minus the safety buffer
    ///
    /// Tokens living 300 seconds or less are not cached at all.
    pub fn set(&self, client_id: &str, token: &str, expires_in_secs: i64) {
        if expires_in_secs <= EXPIRY_BUFFER_SECS {
            tracing::debug!(
                expires_in = expires_in_secs,
                "Token lifetime too short to cache"
            );
            return;
        }

        let expires_at = self.clock.now() + Duration::seconds(expires_in_secs - EXPIRY_BUFFER_SECS);
        self.entries.insert(
            Self::cache_key(client_id),
            CacheEntry {
                token: token.to_string(),
                expires_at,
            },
        );
        tracing::debug!(expires_at = %expires_at.to_rfc3339(), "Cached access token");
    }

    /// Drop any cached token for this client
    pub fn clear(&self, client_id: &str) {
        self.entries.remove(&Self::cache_key(client_id));
    }
}

impl Default for TokenCache {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for TokenCache {
    fn clone(&self) -> Self {
        Self {
            entries: Arc::clone(&self.entries),
            clock: Arc::clone(&self.clock),
        }
    }
}
