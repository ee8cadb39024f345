//! File-backed cache of the full property catalog.
//!
//! The cache is a single JSON document `{ properties, timestamp, expiresAt }`
//! (timestamps in epoch milliseconds). It is read and replaced wholesale; there
//! is no per-property invalidation and no locking between concurrent writers.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::errors::AppError;
use crate::models::Property;

/// How long a written catalog stays valid.
pub const CACHE_TTL: Duration = Duration::from_secs(5 * 60);

/// On-disk cache document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry {
    pub properties: Vec<Property>,
    pub timestamp: i64,
    pub expires_at: i64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CacheEntryRef<'a> {
    properties: &'a [Property],
    timestamp: i64,
    expires_at: i64,
}

/// Cache validity report for the status endpoint.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStatus {
    pub valid: bool,
    pub property_count: usize,
    pub timestamp: Option<i64>,
    pub expires_at: Option<i64>,
    pub ttl_seconds: u64,
}

/// Whole-catalog cache stored in a single file.
pub struct PropertyCache {
    path: PathBuf,
    ttl: Duration,
}

impl PropertyCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ttl: CACHE_TTL,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Return the cached catalog, or `None` when absent, expired or unreadable.
    pub async fn read(&self) -> Option<Vec<Property>> {
        self.read_entry().await.map(|entry| entry.properties)
    }

    /// Return the full cache entry if it is still valid.
    pub async fn read_entry(&self) -> Option<CacheEntry> {
        self.read_entry_at(now_millis()).await
    }

    async fn read_entry_at(&self, now: i64) -> Option<CacheEntry> {
        let bytes = match fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                tracing::warn!("Failed to read property cache {:?}: {}", self.path, e);
                return None;
            }
        };

        let entry: CacheEntry = match serde_json::from_slice(&bytes) {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!("Ignoring malformed property cache {:?}: {}", self.path, e);
                return None;
            }
        };

        if now > entry.expires_at {
            tracing::debug!("Property cache expired at {}", entry.expires_at);
            if let Err(e) = fs::remove_file(&self.path).await {
                if e.kind() != std::io::ErrorKind::NotFound {
                    tracing::warn!("Failed to remove expired property cache: {}", e);
                }
            }
            return None;
        }

        Some(entry)
    }

    /// Replace the cached catalog. Returns the write timestamp.
    pub async fn write(&self, properties: &[Property]) -> Result<i64, AppError> {
        self.write_at(properties, now_millis()).await
    }

    async fn write_at(&self, properties: &[Property], now: i64) -> Result<i64, AppError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await.map_err(|e| {
                    AppError::Internal(format!("Failed to create cache directory: {}", e))
                })?;
            }
        }

        let entry = CacheEntryRef {
            properties,
            timestamp: now,
            expires_at: now + self.ttl.as_millis() as i64,
        };
        let json = serde_json::to_vec(&entry)
            .map_err(|e| AppError::Internal(format!("Failed to encode property cache: {}", e)))?;

        fs::write(&self.path, json)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to write property cache: {}", e)))?;

        tracing::info!("Cached {} properties until {}", properties.len(), entry.expires_at);
        Ok(now)
    }

    /// Whether a read would currently return a catalog.
    pub async fn is_valid(&self) -> bool {
        self.read_entry().await.is_some()
    }

    /// Cached properties whose ids are in `ids`, in catalog order. Never fetches.
    pub async fn get_by_ids(&self, ids: &[i64]) -> Vec<Property> {
        match self.read().await {
            Some(properties) => properties
                .into_iter()
                .filter(|p| ids.contains(&p.id))
                .collect(),
            None => Vec::new(),
        }
    }

    pub async fn status(&self) -> CacheStatus {
        let entry = self.read_entry().await;
        CacheStatus {
            valid: entry.is_some(),
            property_count: entry.as_ref().map(|e| e.properties.len()).unwrap_or(0),
            timestamp: entry.as_ref().map(|e| e.timestamp),
            expires_at: entry.as_ref().map(|e| e.expires_at),
            ttl_seconds: self.ttl.as_secs(),
        }
    }
}

fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn property(id: i64, name: &str) -> Property {
        let mut p = Property::with_id(id);
        p.name = Some(name.to_string());
        p
    }

    #[tokio::test]
    async fn test_write_then_read_returns_same_catalog() {
        let temp_dir = TempDir::new().unwrap();
        let cache = PropertyCache::new(temp_dir.path().join("nested/cache.json"));
        let catalog = vec![property(1, "Cabin"), property(2, "Loft")];

        assert!(cache.read().await.is_none());
        cache.write(&catalog).await.unwrap();

        assert_eq!(cache.read().await.unwrap(), catalog);
        assert!(cache.is_valid().await);
    }

    #[tokio::test]
    async fn test_expired_entry_is_removed() {
        let temp_dir = TempDir::new().unwrap();
        let cache = PropertyCache::new(temp_dir.path().join("cache.json"));
        let written_at = now_millis() - CACHE_TTL.as_millis() as i64 - 1_000;

        cache.write_at(&[property(1, "Cabin")], written_at).await.unwrap();
        assert!(cache.path().exists());

        assert!(cache.read().await.is_none());
        assert!(!cache.path().exists());
        assert!(!cache.is_valid().await);
    }

    #[tokio::test]
    async fn test_entry_valid_until_expiry_instant() {
        let temp_dir = TempDir::new().unwrap();
        let cache = PropertyCache::new(temp_dir.path().join("cache.json"));
        let written_at = 1_700_000_000_000;

        cache.write_at(&[property(1, "Cabin")], written_at).await.unwrap();
        let expires_at = written_at + CACHE_TTL.as_millis() as i64;

        assert!(cache.read_entry_at(expires_at).await.is_some());
        assert!(cache.read_entry_at(expires_at + 1).await.is_none());
    }

    #[tokio::test]
    async fn test_second_write_replaces_catalog() {
        let temp_dir = TempDir::new().unwrap();
        let cache = PropertyCache::new(temp_dir.path().join("cache.json"));

        cache.write(&[property(1, "Cabin"), property(2, "Loft")]).await.unwrap();
        cache.write(&[property(3, "Villa")]).await.unwrap();

        let cached = cache.read().await.unwrap();
        assert_eq!(cached, vec![property(3, "Villa")]);
    }

    #[tokio::test]
    async fn test_malformed_cache_is_absent() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("cache.json");
        tokio::fs::write(&path, b"{ not json").await.unwrap();

        let cache = PropertyCache::new(&path);
        assert!(cache.read().await.is_none());
        assert!(!cache.status().await.valid);
    }

    #[tokio::test]
    async fn test_get_by_ids_filters_in_catalog_order() {
        let temp_dir = TempDir::new().unwrap();
        let cache = PropertyCache::new(temp_dir.path().join("cache.json"));

        assert!(cache.get_by_ids(&[1, 2]).await.is_empty());

        cache
            .write(&[property(1, "A"), property(2, "B"), property(3, "C"), property(4, "D")])
            .await
            .unwrap();

        let ids: Vec<i64> = cache
            .get_by_ids(&[4, 2, 99])
            .await
            .into_iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(ids, vec![2, 4]);
    }

    #[tokio::test]
    async fn test_status_reports_count_and_bounds() {
        let temp_dir = TempDir::new().unwrap();
        let cache = PropertyCache::new(temp_dir.path().join("cache.json"));

        let empty = cache.status().await;
        assert!(!empty.valid);
        assert_eq!(empty.property_count, 0);
        assert_eq!(empty.ttl_seconds, 300);

        let written_at = cache.write(&[property(1, "A")]).await.unwrap();
        let status = cache.status().await;
        assert!(status.valid);
        assert_eq!(status.property_count, 1);
        assert_eq!(status.timestamp, Some(written_at));
        assert_eq!(status.expires_at, Some(written_at + 300_000));
    }
}
