//! Local property augmentation records.
//!
//! These hold everything the booking platform does not: descriptions, house
//! rules, policies, owner contact and the image gallery.

use serde::{Deserialize, Serialize};

/// Lifecycle state of a local listing.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ListingStatus {
    #[default]
    Draft,
    Active,
    Inactive,
    Maintenance,
}

impl ListingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ListingStatus::Draft => "draft",
            ListingStatus::Active => "active",
            ListingStatus::Inactive => "inactive",
            ListingStatus::Maintenance => "maintenance",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(ListingStatus::Draft),
            "active" => Some(ListingStatus::Active),
            "inactive" => Some(ListingStatus::Inactive),
            "maintenance" => Some(ListingStatus::Maintenance),
            _ => None,
        }
    }
}

/// Local pricing overrides.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LocalPricing {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_rate: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cleaning_fee: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub security_deposit: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weekly_discount: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub monthly_discount: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
}

/// Stay-length and booking-window rules.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityPolicy {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_nights: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_nights: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub advance_notice_days: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instant_book: Option<bool>,
}

/// Owner contact record.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct OwnerContact {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

/// An image hosted on the media service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PropertyImage {
    pub url: String,
    /// Storage identifier on the media host
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
    #[serde(default)]
    pub is_primary: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uploaded_at: Option<String>,
}

/// Local-only fields of a property, i.e. everything except the upstream key.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LocalData {
    pub description: Option<String>,
    pub amenities: Vec<String>,
    pub house_rules: Vec<String>,
    pub pricing: Option<LocalPricing>,
    pub availability: Option<AvailabilityPolicy>,
    pub cancellation_policy: Option<String>,
    pub pet_policy: Option<String>,
    pub smoking_policy: Option<String>,
    pub owner: Option<OwnerContact>,
    pub status: ListingStatus,
    pub verified: bool,
    pub images: Vec<PropertyImage>,
    pub last_synced_with_owner_rez: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl LocalData {
    /// The primary image, falling back to the first one in the gallery.
    pub fn primary_image(&self) -> Option<&PropertyImage> {
        self.images
            .iter()
            .find(|img| img.is_primary)
            .or_else(|| self.images.first())
    }
}

/// A local property record keyed by the upstream property id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LocalProperty {
    pub owner_rez_id: i64,
    #[serde(flatten)]
    pub data: LocalData,
}

/// Request body for creating a local property record.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateLocalPropertyRequest {
    pub owner_rez_id: i64,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub amenities: Option<Vec<String>>,
    #[serde(default)]
    pub house_rules: Option<Vec<String>>,
    #[serde(default)]
    pub pricing: Option<LocalPricing>,
    #[serde(default)]
    pub availability: Option<AvailabilityPolicy>,
    #[serde(default)]
    pub cancellation_policy: Option<String>,
    #[serde(default)]
    pub pet_policy: Option<String>,
    #[serde(default)]
    pub smoking_policy: Option<String>,
    #[serde(default)]
    pub owner: Option<OwnerContact>,
    /// One of draft, active, inactive, maintenance (default: draft)
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub verified: Option<bool>,
    #[serde(default)]
    pub images: Option<Vec<PropertyImage>>,
}

/// Request body for updating a local property record.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateLocalPropertyRequest {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub amenities: Option<Vec<String>>,
    #[serde(default)]
    pub house_rules: Option<Vec<String>>,
    #[serde(default)]
    pub pricing: Option<LocalPricing>,
    #[serde(default)]
    pub availability: Option<AvailabilityPolicy>,
    #[serde(default)]
    pub cancellation_policy: Option<String>,
    #[serde(default)]
    pub pet_policy: Option<String>,
    #[serde(default)]
    pub smoking_policy: Option<String>,
    #[serde(default)]
    pub owner: Option<OwnerContact>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub verified: Option<bool>,
    #[serde(default)]
    pub images: Option<Vec<PropertyImage>>,
    /// Structural changes forwarded to OwnerRez before the local write
    #[serde(default)]
    pub owner_rez: Option<serde_json::Map<String, serde_json::Value>>,
}

/// Validate the status string and image gallery shared by create and update.
pub fn validate_listing_fields(
    status: Option<&str>,
    images: Option<&[PropertyImage]>,
) -> Result<Option<ListingStatus>, String> {
    let status = match status {
        Some(s) => Some(ListingStatus::parse(s).ok_or_else(|| {
            format!(
                "Invalid status '{}': expected draft, active, inactive or maintenance",
                s
            )
        })?),
        None => None,
    };

    if let Some(images) = images {
        if images.iter().any(|img| img.url.trim().is_empty()) {
            return Err("Image url is required".to_string());
        }
        if images.iter().filter(|img| img.is_primary).count() > 1 {
            return Err("Only one image can be marked as primary".to_string());
        }
    }

    Ok(status)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image(url: &str, is_primary: bool) -> PropertyImage {
        PropertyImage {
            url: url.to_string(),
            public_id: None,
            alt: None,
            is_primary,
            uploaded_at: None,
        }
    }

    #[test]
    fn test_status_round_trip_strings() {
        for status in [
            ListingStatus::Draft,
            ListingStatus::Active,
            ListingStatus::Inactive,
            ListingStatus::Maintenance,
        ] {
            assert_eq!(ListingStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(ListingStatus::parse("archived"), None);
    }

    #[test]
    fn test_validate_listing_fields() {
        assert_eq!(
            validate_listing_fields(Some("active"), None),
            Ok(Some(ListingStatus::Active))
        );
        assert!(validate_listing_fields(Some("archived"), None).is_err());
        assert!(validate_listing_fields(None, Some(&[image(" ", false)])).is_err());
        assert!(validate_listing_fields(
            None,
            Some(&[image("https://a", true), image("https://b", true)])
        )
        .is_err());
        assert_eq!(
            validate_listing_fields(None, Some(&[image("https://a", true)])),
            Ok(None)
        );
    }

    #[test]
    fn test_local_property_flattens_data() {
        let local = LocalProperty {
            owner_rez_id: 42,
            data: LocalData {
                description: Some("Quiet cabin".to_string()),
                amenities: vec!["wifi".to_string()],
                house_rules: vec![],
                pricing: None,
                availability: None,
                cancellation_policy: None,
                pet_policy: None,
                smoking_policy: None,
                owner: None,
                status: ListingStatus::Draft,
                verified: false,
                images: vec![],
                last_synced_with_owner_rez: None,
                created_at: "2024-01-01T00:00:00Z".to_string(),
                updated_at: "2024-01-01T00:00:00Z".to_string(),
            },
        };

        let value = serde_json::to_value(&local).unwrap();
        assert_eq!(value["ownerRezId"], 42);
        assert_eq!(value["status"], "draft");
        assert_eq!(value["houseRules"], serde_json::json!([]));
        assert!(value["lastSyncedWithOwnerRez"].is_null());
    }
}
