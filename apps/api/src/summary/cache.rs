//! Session cache for completed summaries, keyed by contact id.
//!
//! A convenience layer only: reads and writes never fail from the caller's
//! point of view. Storage or serialization problems are logged and swallowed.
//! Entries are overwritten on every successful generation and never
//! invalidated when the contact changes.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::summary::models::PartialSummary;

const KEY_PREFIX: &str = "ai-summary-cache:";

#[async_trait]
pub trait SummaryCache: Send + Sync {
    async fn get(&self, contact_id: &str) -> Option<PartialSummary>;
    async fn set(&self, contact_id: &str, summary: &PartialSummary);
}

// ────────────────────────────────────────────────────────────────────────────
// In-process cache: the session is the lifetime of the service
// ────────────────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct InMemorySummaryCache {
    entries: RwLock<HashMap<String, PartialSummary>>,
}

impl InMemorySummaryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SummaryCache for InMemorySummaryCache {
    async fn get(&self, contact_id: &str) -> Option<PartialSummary> {
        self.entries.read().await.get(contact_id).cloned()
    }

    async fn set(&self, contact_id: &str, summary: &PartialSummary) {
        self.entries
            .write()
            .await
            .insert(contact_id.to_string(), summary.clone());
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Redis cache: session lifetime is the key TTL
// ────────────────────────────────────────────────────────────────────────────

pub struct RedisSummaryCache {
    client: redis::Client,
    ttl_secs: u64,
}

impl RedisSummaryCache {
    pub fn new(client: redis::Client, ttl_secs: u64) -> Self {
        Self { client, ttl_secs }
    }

    fn key(contact_id: &str) -> String {
        format!("{KEY_PREFIX}{contact_id}")
    }
}

#[async_trait]
impl SummaryCache for RedisSummaryCache {
    async fn get(&self, contact_id: &str) -> Option<PartialSummary> {
        let mut conn = match self.client.get_multiplexed_async_connection().await {
            Ok(conn) => conn,
            Err(e) => {
                warn!("Summary cache unavailable, skipping read: {e}");
                return None;
            }
        };

        let raw: Option<String> = match redis::cmd("GET")
            .arg(Self::key(contact_id))
            .query_async(&mut conn)
            .await
        {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Summary cache read failed for {contact_id}: {e}");
                return None;
            }
        };

        let raw = raw?;
        match serde_json::from_str(&raw) {
            Ok(summary) => Some(summary),
            Err(e) => {
                debug!("Discarding unreadable cache entry for {contact_id}: {e}");
                None
            }
        }
    }

    async fn set(&self, contact_id: &str, summary: &PartialSummary) {
        let raw = match serde_json::to_string(summary) {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Could not serialize summary for {contact_id}: {e}");
                return;
            }
        };

        let mut conn = match self.client.get_multiplexed_async_connection().await {
            Ok(conn) => conn,
            Err(e) => {
                warn!("Summary cache unavailable, skipping write: {e}");
                return;
            }
        };

        let result: redis::RedisResult<()> = redis::cmd("SET")
            .arg(Self::key(contact_id))
            .arg(raw)
            .arg("EX")
            .arg(self.ttl_secs)
            .query_async(&mut conn)
            .await;

        if let Err(e) = result {
            warn!("Summary cache write failed for {contact_id}: {e}");
        }
    }
}
