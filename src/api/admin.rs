//! Admin endpoints for local property records.

use axum::{
    extract::{Path, State},
    Json,
};

use super::{success, ApiResponse, ApiResult};
use crate::errors::AppError;
use crate::models::{
    validate_listing_fields, CreateLocalPropertyRequest, LocalProperty,
    UpdateLocalPropertyRequest,
};
use crate::AppState;

/// GET /api/admin/properties - List all local records.
pub async fn list_local_properties(
    State(state): State<AppState>,
) -> ApiResult<Vec<LocalProperty>> {
    success(state.repo.list_local_properties().await?)
}

/// POST /api/admin/properties - Create a local record for an upstream property.
pub async fn create_local_property(
    State(state): State<AppState>,
    Json(request): Json<CreateLocalPropertyRequest>,
) -> ApiResult<LocalProperty> {
    if request.owner_rez_id <= 0 {
        return Err(AppError::Validation(
            "ownerRezId must be a positive integer".to_string(),
        ));
    }
    let status = validate_listing_fields(request.status.as_deref(), request.images.as_deref())
        .map_err(AppError::Validation)?
        .unwrap_or_default();

    let local = state.repo.create_local_property(&request, status).await?;
    tracing::info!(
        owner_rez_id = local.owner_rez_id,
        status = local.data.status.as_str(),
        "Created local property record"
    );

    Ok(ApiResponse::created(local))
}

/// PUT /api/admin/properties/:id - Update a local record.
///
/// Structural changes under `ownerRez` are pushed upstream first; if that push
/// fails nothing is written locally.
pub async fn update_local_property(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(request): Json<UpdateLocalPropertyRequest>,
) -> ApiResult<LocalProperty> {
    let status = validate_listing_fields(request.status.as_deref(), request.images.as_deref())
        .map_err(AppError::Validation)?;

    if state.repo.get_local_property(id).await?.is_none() {
        return Err(AppError::not_found(format!(
            "Local record for property {} not found",
            id
        )));
    }

    let pushed_upstream = match request.owner_rez.as_ref().filter(|c| !c.is_empty()) {
        Some(changes) => {
            state.client.update_property(id, changes).await?;
            true
        }
        None => false,
    };

    let mut local = state
        .repo
        .update_local_property(id, &request, status)
        .await?;

    if pushed_upstream {
        local.data.last_synced_with_owner_rez = Some(state.repo.mark_synced(id).await?);
        tracing::info!(owner_rez_id = id, "Pushed property changes to OwnerRez");
    }

    success(local)
}
