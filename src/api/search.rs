//! Property search endpoint.

use axum::extract::{Query, State};
use serde::{Deserialize, Serialize};

use super::{success, ApiResult};
use crate::catalog;
use crate::errors::AppError;
use crate::models::Property;
use crate::ownerrez::UpstreamSearchQuery;
use crate::resolver::DateRange;
use crate::search::{PropertyFilter, SearchPage};
use crate::AppState;

/// Search query parameters.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertySearchQuery {
    /// Keyword query.
    pub q: Option<String>,
    /// City, state or country.
    pub location: Option<String>,
    pub min_bedrooms: Option<u32>,
    pub max_bedrooms: Option<u32>,
    pub min_bathrooms: Option<f64>,
    pub min_bathrooms_full: Option<u32>,
    pub min_bathrooms_half: Option<u32>,
    /// Minimum guest capacity.
    pub guests: Option<u32>,
    pub pets: Option<bool>,
    pub children: Option<bool>,
    pub active: Option<bool>,
    pub min_rate: Option<f64>,
    pub max_rate: Option<f64>,
    /// Comma separated tag ids to require.
    pub include_tags: Option<String>,
    /// Comma separated tag ids to exclude.
    pub exclude_tags: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    /// Offset for pagination (default: 0).
    #[serde(default)]
    pub offset: usize,
    /// Maximum number of results (default: 20).
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    20
}

/// Maximum number of search results allowed.
const MAX_SEARCH_LIMIT: usize = 100;

impl PropertySearchQuery {
    /// Whether a filter is set that only the upstream search can evaluate.
    fn needs_upstream(&self) -> bool {
        is_set(&self.start_date)
            || is_set(&self.end_date)
            || self.min_rate.is_some()
            || self.max_rate.is_some()
            || self.max_bedrooms.is_some()
            || self.min_bathrooms_full.is_some()
            || self.min_bathrooms_half.is_some()
            || self.children.is_some()
            || is_set(&self.include_tags)
            || is_set(&self.exclude_tags)
    }

    /// Filters the upstream search cannot evaluate, applied to its results.
    /// It has no total bathroom filter.
    fn upstream_post_filter(&self) -> PropertyFilter {
        PropertyFilter {
            min_bathrooms: self.min_bathrooms,
            ..PropertyFilter::default()
        }
    }

    fn catalog_filter(&self) -> PropertyFilter {
        PropertyFilter {
            q: self.q.clone(),
            location: self.location.clone(),
            min_bedrooms: self.min_bedrooms,
            min_bathrooms: self.min_bathrooms,
            guests: self.guests,
            pets: self.pets,
            active: self.active,
        }
    }

    fn upstream_query(&self, range: Option<DateRange>, limit: usize) -> UpstreamSearchQuery {
        // The upstream keyword search has no separate location field
        let q = match (self.q.as_deref(), self.location.as_deref()) {
            (Some(q), Some(loc)) => Some(format!("{} {}", q, loc)),
            (q, loc) => q.or(loc).map(str::to_string),
        };

        UpstreamSearchQuery {
            q,
            rate_min: self.min_rate,
            rate_max: self.max_rate,
            bedrooms_min: self.min_bedrooms,
            bedrooms_max: self.max_bedrooms,
            bathrooms_full_min: self.min_bathrooms_full,
            bathrooms_half_min: self.min_bathrooms_half,
            guests_min: self.guests,
            pets_allowed: self.pets,
            children_allowed: self.children,
            active: self.active,
            include_tag_ids: self.include_tags.clone().filter(|t| !t.trim().is_empty()),
            exclude_tag_ids: self.exclude_tags.clone().filter(|t| !t.trim().is_empty()),
            availability_start_date: range.map(|r| r.start),
            availability_end_date: range.map(|r| r.end),
            offset: self.offset,
            limit,
        }
    }
}

fn is_set(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.trim().is_empty())
}

/// Which backend answered a search.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SearchSource {
    Catalog,
    Ownerrez,
}

/// Search results with pagination metadata.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    #[serde(flatten)]
    pub page: SearchPage,
    pub source: SearchSource,
}

/// GET /api/properties/search - Filtered, paginated property search.
pub async fn search_properties(
    State(state): State<AppState>,
    Query(params): Query<PropertySearchQuery>,
) -> ApiResult<SearchResponse> {
    let limit = params.limit.min(MAX_SEARCH_LIMIT);

    if is_set(&params.start_date) != is_set(&params.end_date) {
        return Err(AppError::Validation(
            "startDate and endDate must be supplied together".to_string(),
        ));
    }
    let range = DateRange::from_params(params.start_date.as_deref(), params.end_date.as_deref())?;

    if params.needs_upstream() {
        let query = params.upstream_query(range, limit);
        let page = state.client.search_properties(&query).await?;

        let filter = params.upstream_post_filter();
        let received = page.items.len();
        let results: Vec<Property> = page
            .items
            .into_iter()
            .filter(|p| filter.matches(p))
            .collect();
        let dropped = received - results.len();
        if dropped > 0 {
            tracing::debug!("Dropped {} upstream results failing local filters", dropped);
        }

        let total = page
            .count
            .map(|c| (c as usize).saturating_sub(dropped))
            .unwrap_or(params.offset + results.len());

        return success(SearchResponse {
            page: SearchPage {
                results,
                total,
                limit,
                offset: params.offset,
            },
            source: SearchSource::Ownerrez,
        });
    }

    let catalog = catalog::load_catalog(&state.cache, &state.client).await?;
    state
        .search
        .sync(catalog.fetched_at, &catalog.properties)
        .await?;

    let page = state.search.search_catalog(
        &catalog.properties,
        &params.catalog_filter(),
        params.offset,
        limit,
    )?;

    success(SearchResponse {
        page,
        source: SearchSource::Catalog,
    })
}
