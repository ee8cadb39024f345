//! Database repository for local property records.

use chrono::Utc;
use serde::{de::DeserializeOwned, Serialize};
use sqlx::{Row, SqlitePool};

use crate::errors::AppError;
use crate::models::{
    CreateLocalPropertyRequest, ListingStatus, LocalData, LocalProperty,
    UpdateLocalPropertyRequest,
};

const SELECT_COLUMNS: &str = "SELECT owner_rez_id, description, amenities, house_rules, pricing, availability, cancellation_policy, pet_policy, smoking_policy, owner, status, verified, images, last_synced_with_owner_rez, created_at, updated_at FROM local_properties";

/// Database repository for local property records.
#[derive(Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// List all local records ordered by upstream id.
    pub async fn list_local_properties(&self) -> Result<Vec<LocalProperty>, AppError> {
        let rows = sqlx::query(&format!("{} ORDER BY owner_rez_id", SELECT_COLUMNS))
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.iter().map(local_from_row).collect())
    }

    /// Get the local record for an upstream property id.
    pub async fn get_local_property(
        &self,
        owner_rez_id: i64,
    ) -> Result<Option<LocalProperty>, AppError> {
        let row = sqlx::query(&format!("{} WHERE owner_rez_id = ?", SELECT_COLUMNS))
            .bind(owner_rez_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(local_from_row))
    }

    /// Create a local record. Fails with a conflict if one already exists for the id.
    pub async fn create_local_property(
        &self,
        request: &CreateLocalPropertyRequest,
        status: ListingStatus,
    ) -> Result<LocalProperty, AppError> {
        if self.get_local_property(request.owner_rez_id).await?.is_some() {
            return Err(already_exists(request.owner_rez_id));
        }

        let now = Utc::now().to_rfc3339();
        let local = LocalProperty {
            owner_rez_id: request.owner_rez_id,
            data: LocalData {
                description: request.description.clone(),
                amenities: request.amenities.clone().unwrap_or_default(),
                house_rules: request.house_rules.clone().unwrap_or_default(),
                pricing: request.pricing.clone(),
                availability: request.availability.clone(),
                cancellation_policy: request.cancellation_policy.clone(),
                pet_policy: request.pet_policy.clone(),
                smoking_policy: request.smoking_policy.clone(),
                owner: request.owner.clone(),
                status,
                verified: request.verified.unwrap_or(false),
                images: request.images.clone().unwrap_or_default(),
                last_synced_with_owner_rez: None,
                created_at: now.clone(),
                updated_at: now,
            },
        };

        let data = &local.data;
        sqlx::query(
            "INSERT INTO local_properties (owner_rez_id, description, amenities, house_rules, pricing, availability, cancellation_policy, pet_policy, smoking_policy, owner, status, verified, images, last_synced_with_owner_rez, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
        )
        .bind(local.owner_rez_id)
        .bind(&data.description)
        .bind(to_json(&data.amenities)?)
        .bind(to_json(&data.house_rules)?)
        .bind(to_json_opt(&data.pricing)?)
        .bind(to_json_opt(&data.availability)?)
        .bind(&data.cancellation_policy)
        .bind(&data.pet_policy)
        .bind(&data.smoking_policy)
        .bind(to_json_opt(&data.owner)?)
        .bind(data.status.as_str())
        .bind(data.verified as i32)
        .bind(to_json(&data.images)?)
        .bind(&data.last_synced_with_owner_rez)
        .bind(&data.created_at)
        .bind(&data.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match e {
            // A concurrent create won the race past the existence check
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                already_exists(local.owner_rez_id)
            }
            other => other.into(),
        })?;

        Ok(local)
    }

    /// Apply a partial update to a local record.
    pub async fn update_local_property(
        &self,
        owner_rez_id: i64,
        request: &UpdateLocalPropertyRequest,
        status: Option<ListingStatus>,
    ) -> Result<LocalProperty, AppError> {
        let existing = self
            .get_local_property(owner_rez_id)
            .await?
            .ok_or_else(|| {
                AppError::not_found(format!("Local record for property {} not found", owner_rez_id))
            })?;

        let old = existing.data;
        let data = LocalData {
            description: request.description.clone().or(old.description),
            amenities: request.amenities.clone().unwrap_or(old.amenities),
            house_rules: request.house_rules.clone().unwrap_or(old.house_rules),
            pricing: request.pricing.clone().or(old.pricing),
            availability: request.availability.clone().or(old.availability),
            cancellation_policy: request
                .cancellation_policy
                .clone()
                .or(old.cancellation_policy),
            pet_policy: request.pet_policy.clone().or(old.pet_policy),
            smoking_policy: request.smoking_policy.clone().or(old.smoking_policy),
            owner: request.owner.clone().or(old.owner),
            status: status.unwrap_or(old.status),
            verified: request.verified.unwrap_or(old.verified),
            images: request.images.clone().unwrap_or(old.images),
            last_synced_with_owner_rez: old.last_synced_with_owner_rez,
            created_at: old.created_at,
            updated_at: Utc::now().to_rfc3339(),
        };

        sqlx::query(
            "UPDATE local_properties SET description = ?, amenities = ?, house_rules = ?, pricing = ?, availability = ?, cancellation_policy = ?, pet_policy = ?, smoking_policy = ?, owner = ?, status = ?, verified = ?, images = ?, updated_at = ? WHERE owner_rez_id = ?"
        )
        .bind(&data.description)
        .bind(to_json(&data.amenities)?)
        .bind(to_json(&data.house_rules)?)
        .bind(to_json_opt(&data.pricing)?)
        .bind(to_json_opt(&data.availability)?)
        .bind(&data.cancellation_policy)
        .bind(&data.pet_policy)
        .bind(&data.smoking_policy)
        .bind(to_json_opt(&data.owner)?)
        .bind(data.status.as_str())
        .bind(data.verified as i32)
        .bind(to_json(&data.images)?)
        .bind(&data.updated_at)
        .bind(owner_rez_id)
        .execute(&self.pool)
        .await?;

        Ok(LocalProperty { owner_rez_id, data })
    }

    /// Record that the local record was just pushed to OwnerRez.
    pub async fn mark_synced(&self, owner_rez_id: i64) -> Result<String, AppError> {
        let now = Utc::now().to_rfc3339();
        let result = sqlx::query(
            "UPDATE local_properties SET last_synced_with_owner_rez = ? WHERE owner_rez_id = ?",
        )
        .bind(&now)
        .bind(owner_rez_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!(
                "Local record for property {} not found",
                owner_rez_id
            )));
        }
        Ok(now)
    }
}

// Helper functions for row conversion

fn local_from_row(row: &sqlx::sqlite::SqliteRow) -> LocalProperty {
    let verified: i32 = row.get("verified");
    let status: String = row.get("status");

    LocalProperty {
        owner_rez_id: row.get("owner_rez_id"),
        data: LocalData {
            description: row.get("description"),
            amenities: parse_json(row.get("amenities")).unwrap_or_default(),
            house_rules: parse_json(row.get("house_rules")).unwrap_or_default(),
            pricing: parse_json(row.get("pricing")),
            availability: parse_json(row.get("availability")),
            cancellation_policy: row.get("cancellation_policy"),
            pet_policy: row.get("pet_policy"),
            smoking_policy: row.get("smoking_policy"),
            owner: parse_json(row.get("owner")),
            status: ListingStatus::parse(&status).unwrap_or_default(),
            verified: verified != 0,
            images: parse_json(row.get("images")).unwrap_or_default(),
            last_synced_with_owner_rez: row.get("last_synced_with_owner_rez"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        },
    }
}

fn already_exists(owner_rez_id: i64) -> AppError {
    AppError::Conflict(format!(
        "Local record for property {} already exists",
        owner_rez_id
    ))
}

fn parse_json<T: DeserializeOwned>(raw: Option<String>) -> Option<T> {
    raw.and_then(|s| serde_json::from_str(&s).ok())
}

fn to_json<T: Serialize>(value: &T) -> Result<String, AppError> {
    Ok(serde_json::to_string(value)?)
}

fn to_json_opt<T: Serialize>(value: &Option<T>) -> Result<Option<String>, AppError> {
    value.as_ref().map(to_json).transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_database;
    use crate::models::{OwnerContact, PropertyImage};
    use tempfile::TempDir;

    async fn repo() -> (Repository, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let pool = init_database(&temp_dir.path().join("test.sqlite"))
            .await
            .unwrap();
        (Repository::new(pool), temp_dir)
    }

    fn create_request(id: i64) -> CreateLocalPropertyRequest {
        CreateLocalPropertyRequest {
            owner_rez_id: id,
            description: Some("Cozy cabin by the creek".to_string()),
            amenities: Some(vec!["wifi".to_string(), "hot tub".to_string()]),
            house_rules: None,
            pricing: None,
            availability: None,
            cancellation_policy: Some("moderate".to_string()),
            pet_policy: None,
            smoking_policy: None,
            owner: Some(OwnerContact {
                name: "Pat Doe".to_string(),
                email: Some("pat@example.com".to_string()),
                phone: None,
            }),
            status: None,
            verified: None,
            images: Some(vec![PropertyImage {
                url: "https://res.cloudinary.com/demo/image/upload/v1/cabin.jpg".to_string(),
                public_id: Some("cabin".to_string()),
                alt: Some("Front porch".to_string()),
                is_primary: true,
                uploaded_at: None,
            }]),
        }
    }

    #[tokio::test]
    async fn test_create_and_get_local_property() {
        let (repo, _dir) = repo().await;

        assert!(repo.get_local_property(42).await.unwrap().is_none());

        let created = repo
            .create_local_property(&create_request(42), ListingStatus::Draft)
            .await
            .unwrap();
        let fetched = repo.get_local_property(42).await.unwrap().unwrap();

        assert_eq!(fetched, created);
        assert_eq!(fetched.data.amenities, vec!["wifi", "hot tub"]);
        assert_eq!(fetched.data.owner.unwrap().name, "Pat Doe");
        assert!(fetched.data.images[0].is_primary);
    }

    #[tokio::test]
    async fn test_create_duplicate_conflicts() {
        let (repo, _dir) = repo().await;

        repo.create_local_property(&create_request(7), ListingStatus::Draft)
            .await
            .unwrap();
        let err = repo
            .create_local_property(&create_request(7), ListingStatus::Active)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_concurrent_creates_yield_one_conflict() {
        let (repo, _dir) = repo().await;
        let request = create_request(9);

        let (first, second) = tokio::join!(
            repo.create_local_property(&request, ListingStatus::Draft),
            repo.create_local_property(&request, ListingStatus::Draft)
        );

        let results = [first, second];
        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(results
            .iter()
            .any(|r| matches!(r, Err(AppError::Conflict(_)))));
        assert_eq!(repo.list_local_properties().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_update_keeps_unspecified_fields() {
        let (repo, _dir) = repo().await;
        repo.create_local_property(&create_request(5), ListingStatus::Draft)
            .await
            .unwrap();

        let request = UpdateLocalPropertyRequest {
            description: Some("Renovated cabin".to_string()),
            ..UpdateLocalPropertyRequest::default()
        };
        let updated = repo
            .update_local_property(5, &request, Some(ListingStatus::Active))
            .await
            .unwrap();

        assert_eq!(updated.data.description.as_deref(), Some("Renovated cabin"));
        assert_eq!(updated.data.status, ListingStatus::Active);
        assert_eq!(updated.data.cancellation_policy.as_deref(), Some("moderate"));
        assert_eq!(repo.get_local_property(5).await.unwrap().unwrap(), updated);
    }

    #[tokio::test]
    async fn test_update_and_sync_missing_record() {
        let (repo, _dir) = repo().await;

        let err = repo
            .update_local_property(1, &UpdateLocalPropertyRequest::default(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound { .. }));

        let err = repo.mark_synced(1).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_mark_synced_and_list() {
        let (repo, _dir) = repo().await;
        repo.create_local_property(&create_request(9), ListingStatus::Draft)
            .await
            .unwrap();
        repo.create_local_property(&create_request(3), ListingStatus::Draft)
            .await
            .unwrap();

        let synced_at = repo.mark_synced(9).await.unwrap();

        let all = repo.list_local_properties().await.unwrap();
        assert_eq!(all.iter().map(|l| l.owner_rez_id).collect::<Vec<_>>(), vec![3, 9]);
        assert_eq!(
            all[1].data.last_synced_with_owner_rez.as_deref(),
            Some(synced_at.as_str())
        );
    }
}
