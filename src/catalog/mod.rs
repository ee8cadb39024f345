//! Catalog loading: paginated upstream fetch plus the cache-or-fetch read path.

use serde::Serialize;

use crate::cache::PropertyCache;
use crate::errors::AppError;
use crate::models::Property;
use crate::ownerrez::OwnerRezClient;

/// Page size requested from the upstream catalog endpoint.
pub const PAGE_SIZE: usize = 1000;

/// Where a catalog snapshot came from.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CatalogOrigin {
    Cache,
    Upstream,
}

/// A full catalog snapshot.
#[derive(Debug, Clone)]
pub struct Catalog {
    pub properties: Vec<Property>,
    /// Epoch milliseconds at which the snapshot was written to the cache
    pub fetched_at: i64,
    pub origin: CatalogOrigin,
}

/// Fetch the complete catalog, following pages until a short page.
///
/// A catalog whose size is an exact multiple of `page_size` costs one extra
/// request that returns no items.
pub async fn fetch_catalog(
    client: &OwnerRezClient,
    page_size: usize,
) -> Result<Vec<Property>, AppError> {
    let mut properties = Vec::new();
    let mut offset = 0;

    loop {
        let page = client.list_properties(offset, page_size).await?;
        let received = page.items.len();
        tracing::debug!("Fetched {} properties at offset {}", received, offset);
        properties.extend(page.items);

        if received < page_size {
            break;
        }
        offset += received;
    }

    Ok(properties)
}

/// Return the cached catalog, fetching and caching it on a miss.
///
/// Concurrent misses each fetch and write; the last write wins.
pub async fn load_catalog(
    cache: &PropertyCache,
    client: &OwnerRezClient,
) -> Result<Catalog, AppError> {
    if let Some(entry) = cache.read_entry().await {
        return Ok(Catalog {
            properties: entry.properties,
            fetched_at: entry.timestamp,
            origin: CatalogOrigin::Cache,
        });
    }

    tracing::info!("Property cache miss, fetching catalog from OwnerRez");
    let properties = fetch_catalog(client, PAGE_SIZE).await?;

    let fetched_at = match cache.write(&properties).await {
        Ok(written_at) => written_at,
        Err(e) => {
            tracing::warn!("Failed to cache catalog at {:?}: {}", cache.path(), e);
            chrono::Utc::now().timestamp_millis()
        }
    };

    Ok(Catalog {
        properties,
        fetched_at,
        origin: CatalogOrigin::Upstream,
    })
}
