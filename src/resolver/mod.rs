//! Property merge resolver.
//!
//! Reconciles one property across OwnerRez and the local store. OwnerRez is
//! the listing source of truth: its fields form the top level of the result and
//! local fields are only ever added under `localData`. Only "found in neither
//! source" fails the request; every other failure degrades into a diagnostic.

pub mod pricing;
pub mod thumbnails;

use chrono::NaiveDate;
use serde_json::{json, Map, Value};

use crate::db::Repository;
use crate::errors::AppError;
use crate::models::{
    LocalProperty, MergeSource, MergedProperty, Property, PropertyDetail, Thumbnails,
};
use crate::ownerrez::OwnerRezClient;

/// A validated stay range, `start < end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// Parse optional `YYYY-MM-DD` query values. A range is produced only when
    /// both ends are given; a lone date is validated and otherwise ignored.
    pub fn from_params(start: Option<&str>, end: Option<&str>) -> Result<Option<Self>, AppError> {
        let start = non_empty(start)
            .map(|s| parse_date("startDate", s))
            .transpose()?;
        let end = non_empty(end).map(|s| parse_date("endDate", s)).transpose()?;

        match (start, end) {
            (Some(start), Some(end)) => {
                if start >= end {
                    return Err(AppError::Validation(
                        "startDate must be before endDate".to_string(),
                    ));
                }
                Ok(Some(Self { start, end }))
            }
            _ => Ok(None),
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

fn parse_date(name: &str, value: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| {
        AppError::Validation(format!(
            "{} must be a date in YYYY-MM-DD format, got '{}'",
            name, value
        ))
    })
}

/// Combine the outcomes of the two lookups according to source priority.
pub fn merge(
    id: i64,
    upstream: Result<Property, String>,
    local: Option<LocalProperty>,
) -> Result<MergedProperty, AppError> {
    match (upstream, local) {
        (Ok(property), Some(local)) => Ok(MergedProperty::Upstream {
            property,
            local_data: Some(local.data),
            source: MergeSource::OwnerrezMergedLocal,
        }),
        (Ok(property), None) => Ok(MergedProperty::Upstream {
            property,
            local_data: None,
            source: MergeSource::OwnerrezOnly,
        }),
        (Err(upstream_error), Some(local)) => Ok(MergedProperty::LocalOnly {
            local,
            thumbnails: Thumbnails::default(),
            owner_rez_data: None,
            owner_rez_error: Some(upstream_error),
            source: MergeSource::LocalOnly,
        }),
        (Err(upstream_error), None) => Err(AppError::NotFound {
            message: format!("Property {} not found", id),
            details: Some(json!({ "ownerRezError": upstream_error })),
        }),
    }
}

/// A store failure can hide a local-only record, so report it alongside the
/// upstream diagnostic.
fn with_local_error(details: Option<Value>, local_error: Option<String>) -> Option<Value> {
    let Some(local_error) = local_error else {
        return details;
    };
    let mut details = match details {
        Some(Value::Object(map)) => map,
        _ => Map::new(),
    };
    details.insert("localError".to_string(), Value::String(local_error));
    Some(Value::Object(details))
}

/// Resolve a property for the detail view, optionally pricing a stay.
pub async fn resolve_property(
    client: &OwnerRezClient,
    repo: &Repository,
    id: i64,
    range: Option<DateRange>,
) -> Result<PropertyDetail, AppError> {
    let upstream = client.get_property(id).await.map_err(|e| {
        tracing::warn!("OwnerRez lookup for property {} failed: {}", id, e);
        e.message()
    });

    let (local, local_error) = match repo.get_local_property(id).await {
        Ok(local) => (local, None),
        Err(e) => {
            tracing::warn!("Local lookup for property {} failed: {}", id, e);
            (None, Some(e.message()))
        }
    };

    let mut property = match merge(id, upstream, local) {
        Ok(property) => property,
        Err(AppError::NotFound { message, details }) => {
            return Err(AppError::NotFound {
                message,
                details: with_local_error(details, local_error),
            });
        }
        Err(e) => return Err(e),
    };
    thumbnails::backfill(&mut property);

    let (pricing, pricing_error) = match range {
        Some(range) => match client.get_pricing(id, range.start, range.end).await {
            Ok(days) => (Some(pricing::summarize(range.start, range.end, days)), None),
            Err(e) => {
                tracing::warn!("Pricing lookup for property {} failed: {}", id, e);
                (None, Some(e.message()))
            }
        },
        None => (None, None),
    };

    tracing::debug!(
        property_id = id,
        source = ?property.source(),
        "Resolved property"
    );

    Ok(PropertyDetail {
        property,
        pricing,
        pricing_error,
        local_error,
    })
}
