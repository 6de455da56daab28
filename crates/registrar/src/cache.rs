//! Ephemeral code cache adapters.
//!
//! Verification challenges live in a shared keyed store with per-key
//! expiry, never in process memory: every service instance must observe
//! the same codes. Entries are `{answer, issued_at}` JSON; expiry is
//! enforced both by the backend TTL and by an `issued_at` check on read,
//! so a stale read can never pass for a live challenge.
//!
//! Reads do not consume the entry. A code stays replayable until its
//! lifetime elapses; see the service tests that pin this behavior down.

use async_trait::async_trait;
use redis::AsyncCommands;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::sync::RwLock;

use themis_common::CacheError;

/// Cached challenge record.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredCode {
    answer: String,
    /// Unix seconds at issue time
    issued_at: i64,
}

/// Keyed ephemeral store with per-key expiry.
#[async_trait]
pub trait CodeCache: Send + Sync {
    /// Store `answer` under `key`, replacing any live challenge.
    async fn put(&self, key: &str, answer: &str, issued_at: i64) -> Result<(), CacheError>;

    /// Fetch the live answer for `key`.
    ///
    /// Absent and expired are both [`CacheError::Expired`].
    async fn get(&self, key: &str) -> Result<String, CacheError>;
}

/// Redis-backed cache used in production.
pub struct RedisCodeCache {
    redis: redis::aio::ConnectionManager,
    ttl_secs: u64,
}

impl RedisCodeCache {
    pub fn new(redis: redis::aio::ConnectionManager, ttl_secs: u64) -> Self {
        Self { redis, ttl_secs }
    }
}

#[async_trait]
impl CodeCache for RedisCodeCache {
    async fn put(&self, key: &str, answer: &str, issued_at: i64) -> Result<(), CacheError> {
        let stored = StoredCode {
            answer: answer.to_string(),
            issued_at,
        };
        let value =
            serde_json::to_string(&stored).map_err(|e| CacheError::Backend(e.to_string()))?;

        let mut conn = self.redis.clone();
        conn.set_ex::<_, _, ()>(key, value, self.ttl_secs)
            .await
            .map_err(|e| CacheError::Backend(e.to_string()))
    }

    async fn get(&self, key: &str) -> Result<String, CacheError> {
        let mut conn = self.redis.clone();
        let value: Option<String> = conn
            .get(key)
            .await
            .map_err(|e| CacheError::Backend(e.to_string()))?;

        let Some(value) = value else {
            return Err(CacheError::Expired);
        };

        let stored: StoredCode =
            serde_json::from_str(&value).map_err(|e| CacheError::Backend(e.to_string()))?;

        let now = chrono::Utc::now().timestamp();
        if now > stored.issued_at + self.ttl_secs as i64 {
            return Err(CacheError::Expired);
        }

        Ok(stored.answer)
    }
}

/// In-memory cache for development and tests.
///
/// Same contract as [`RedisCodeCache`], including the `issued_at` expiry
/// check, which lets tests simulate the passage of time by backdating
/// the issue timestamp.
pub struct MemoryCodeCache {
    ttl_secs: u64,
    entries: RwLock<HashMap<String, StoredCode>>,
}

impl MemoryCodeCache {
    pub fn new(ttl_secs: u64) -> Self {
        Self {
            ttl_secs,
            entries: RwLock::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl CodeCache for MemoryCodeCache {
    async fn put(&self, key: &str, answer: &str, issued_at: i64) -> Result<(), CacheError> {
        let mut entries = self.entries.write().await;
        entries.insert(
            key.to_string(),
            StoredCode {
                answer: answer.to_string(),
                issued_at,
            },
        );
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<String, CacheError> {
        let entries = self.entries.read().await;
        let stored = entries.get(key).ok_or(CacheError::Expired)?;

        let now = chrono::Utc::now().timestamp();
        if now > stored.issued_at + self.ttl_secs as i64 {
            return Err(CacheError::Expired);
        }

        Ok(stored.answer.clone())
    }
}
