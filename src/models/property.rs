//! Property model mirroring the OwnerRez property resource.

use serde::{Deserialize, Serialize};

/// Postal address of a property as reported by OwnerRez.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Address {
    pub street1: Option<String>,
    pub street2: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub postal_code: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    #[serde(default)]
    pub is_default: bool,
}

/// A property from the upstream catalog. The upstream system is the source of
/// truth for these fields; fields not modelled here are carried through untouched.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Property {
    pub id: i64,
    pub name: Option<String>,
    pub active: Option<bool>,
    pub bedrooms: Option<u32>,
    pub bathrooms: Option<f64>,
    pub bathrooms_full: Option<u32>,
    pub bathrooms_half: Option<u32>,
    pub max_guests: Option<u32>,
    pub max_pets: Option<u32>,
    pub property_type: Option<String>,
    pub check_in: Option<String>,
    pub check_out: Option<String>,
    pub address: Option<Address>,
    pub thumbnail_url: Option<String>,
    pub thumbnail_url_medium: Option<String>,
    pub thumbnail_url_large: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Property {
    /// Create a property with only an id set.
    #[cfg(test)]
    pub fn with_id(id: i64) -> Self {
        Self {
            id,
            name: None,
            active: None,
            bedrooms: None,
            bathrooms: None,
            bathrooms_full: None,
            bathrooms_half: None,
            max_guests: None,
            max_pets: None,
            property_type: None,
            check_in: None,
            check_out: None,
            address: None,
            thumbnail_url: None,
            thumbnail_url_medium: None,
            thumbnail_url_large: None,
            extra: serde_json::Map::new(),
        }
    }

    pub fn thumbnails(&self) -> Thumbnails {
        Thumbnails {
            thumbnail_url: self.thumbnail_url.clone(),
            thumbnail_url_medium: self.thumbnail_url_medium.clone(),
            thumbnail_url_large: self.thumbnail_url_large.clone(),
        }
    }

    pub fn set_thumbnails(&mut self, thumbnails: Thumbnails) {
        self.thumbnail_url = thumbnails.thumbnail_url;
        self.thumbnail_url_medium = thumbnails.thumbnail_url_medium;
        self.thumbnail_url_large = thumbnails.thumbnail_url_large;
    }

    /// Effective bathroom count, counting half baths as 0.5 when no total is given.
    pub fn bathroom_count(&self) -> Option<f64> {
        self.bathrooms.or_else(|| match (self.bathrooms_full, self.bathrooms_half) {
            (None, None) => None,
            (full, half) => Some(full.unwrap_or(0) as f64 + half.unwrap_or(0) as f64 * 0.5),
        })
    }
}

/// The three thumbnail variants (small, medium, large) of a listing.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Thumbnails {
    pub thumbnail_url: Option<String>,
    pub thumbnail_url_medium: Option<String>,
    pub thumbnail_url_large: Option<String>,
}

impl Thumbnails {
    pub fn is_complete(&self) -> bool {
        self.thumbnail_url.is_some()
            && self.thumbnail_url_medium.is_some()
            && self.thumbnail_url_large.is_some()
    }
}

/// One page of a paginated OwnerRez listing.
#[derive(Debug, Clone, Deserialize)]
pub struct Page<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
    #[serde(default)]
    pub count: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_fields_pass_through() {
        let raw = serde_json::json!({
            "id": 42,
            "name": "Lakeside Cabin",
            "bedrooms": 3,
            "key": "abc123",
            "tags": [{ "id": 1, "name": "lake" }]
        });

        let property: Property = serde_json::from_value(raw).unwrap();
        assert_eq!(property.id, 42);
        assert_eq!(property.bedrooms, Some(3));
        assert!(property.thumbnail_url.is_none());
        assert_eq!(property.extra["key"], "abc123");

        let back = serde_json::to_value(&property).unwrap();
        assert_eq!(back["tags"][0]["name"], "lake");
        assert_eq!(back["name"], "Lakeside Cabin");
    }

    #[test]
    fn test_bathroom_count_from_full_and_half() {
        let mut property = Property::with_id(1);
        assert_eq!(property.bathroom_count(), None);

        property.bathrooms_full = Some(2);
        property.bathrooms_half = Some(1);
        assert_eq!(property.bathroom_count(), Some(2.5));

        property.bathrooms = Some(3.0);
        assert_eq!(property.bathroom_count(), Some(3.0));
    }
}
