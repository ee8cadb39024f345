//! Property catalog and detail endpoints.

use axum::extract::{Path, Query, State};
use serde::{Deserialize, Serialize};

use super::{success, ApiResult};
use crate::cache::CacheStatus;
use crate::catalog::{self, CatalogOrigin};
use crate::errors::AppError;
use crate::models::{Property, PropertyDetail};
use crate::resolver::{self, DateRange};
use crate::search::{self, Location};
use crate::AppState;

/// Full catalog response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogResponse {
    pub properties: Vec<Property>,
    pub total: usize,
    pub cached: bool,
    pub fetched_at: i64,
}

/// GET /api/properties - Cached catalog, fetched and cached on a miss.
pub async fn list_properties(State(state): State<AppState>) -> ApiResult<CatalogResponse> {
    let catalog = catalog::load_catalog(&state.cache, &state.client).await?;

    success(CatalogResponse {
        total: catalog.properties.len(),
        cached: catalog.origin == CatalogOrigin::Cache,
        fetched_at: catalog.fetched_at,
        properties: catalog.properties,
    })
}

/// GET /api/properties/cache-status - Cache validity and bounds.
pub async fn cache_status(State(state): State<AppState>) -> ApiResult<CacheStatus> {
    success(state.cache.status().await)
}

/// Query parameters for the id filter.
#[derive(Debug, Deserialize)]
pub struct ByIdsQuery {
    /// Comma separated property ids.
    #[serde(default)]
    pub ids: String,
}

/// GET /api/properties/by-ids?ids=1,2 - Cached properties with the given ids.
pub async fn properties_by_ids(
    State(state): State<AppState>,
    Query(params): Query<ByIdsQuery>,
) -> ApiResult<Vec<Property>> {
    let ids = parse_ids(&params.ids)?;
    success(state.cache.get_by_ids(&ids).await)
}

fn parse_ids(raw: &str) -> Result<Vec<i64>, AppError> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<i64>()
                .map_err(|_| AppError::Validation(format!("Invalid property id '{}'", s)))
        })
        .collect()
}

/// GET /api/properties/locations - Locations present in the catalog.
pub async fn list_locations(State(state): State<AppState>) -> ApiResult<Vec<Location>> {
    let catalog = catalog::load_catalog(&state.cache, &state.client).await?;
    success(search::derive_locations(&catalog.properties))
}

/// Query parameters for the detail endpoint.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailQuery {
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
}

/// GET /api/properties/:id - Merged property, priced when a stay range is given.
pub async fn get_property(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(params): Query<DetailQuery>,
) -> ApiResult<PropertyDetail> {
    let range = DateRange::from_params(params.start_date.as_deref(), params.end_date.as_deref())?;

    let detail = resolver::resolve_property(&state.client, &state.repo, id, range).await?;
    success(detail)
}
