//! OwnerRez API client.
//!
//! Thin typed wrapper over the booking platform's v2 REST API. Every call uses
//! HTTP Basic auth and fails with [`AppError::Upstream`] on a non-success status.

use chrono::NaiveDate;
use reqwest::{Method, RequestBuilder, Response};
use serde::{de::DeserializeOwned, Serialize};

use crate::config::OwnerRezConfig;
use crate::errors::AppError;
use crate::models::{Page, PricingDay, PricingPayload, Property};

/// Query for the upstream property search endpoint.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct UpstreamSearchQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub q: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate_min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate_max: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bedrooms_min: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bedrooms_max: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bathrooms_full_min: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bathrooms_half_min: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guests_min: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pets_allowed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub children_allowed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
    /// Comma separated tag ids
    #[serde(skip_serializing_if = "Option::is_none")]
    pub include_tag_ids: Option<String>,
    /// Comma separated tag ids
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclude_tag_ids: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub availability_start_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub availability_end_date: Option<NaiveDate>,
    pub offset: usize,
    pub limit: usize,
}

/// Client for the OwnerRez v2 API.
pub struct OwnerRezClient {
    http: reqwest::Client,
    base_url: String,
    username: String,
    token: String,
}

impl OwnerRezClient {
    pub fn new(config: &OwnerRezConfig) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("rental-backend/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            username: config.username.clone(),
            token: config.token.clone(),
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http
            .request(method, format!("{}{}", self.base_url, path))
            .basic_auth(&self.username, Some(&self.token))
    }

    /// Fetch one page of the property catalog.
    pub async fn list_properties(
        &self,
        offset: usize,
        limit: usize,
    ) -> Result<Page<Property>, AppError> {
        let response = self
            .request(Method::GET, "/v2/properties")
            .query(&[
                ("offset", offset.to_string()),
                ("limit", limit.to_string()),
                ("include_tags", "true".to_string()),
                ("include_fields", "true".to_string()),
                ("include_listing_numbers", "true".to_string()),
            ])
            .send()
            .await?;
        decode(response).await
    }

    /// Fetch a single property by id.
    pub async fn get_property(&self, id: i64) -> Result<Property, AppError> {
        let response = self
            .request(Method::GET, &format!("/v2/properties/{}", id))
            .send()
            .await?;
        decode(response).await
    }

    /// Apply a partial update to a property and return the updated record.
    pub async fn update_property<B: Serialize + ?Sized>(
        &self,
        id: i64,
        changes: &B,
    ) -> Result<Property, AppError> {
        let response = self
            .request(Method::PATCH, &format!("/v2/properties/{}", id))
            .json(changes)
            .send()
            .await?;
        decode(response).await
    }

    /// Fetch the nightly pricing schedule for a stay.
    pub async fn get_pricing(
        &self,
        id: i64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PricingDay>, AppError> {
        let response = self
            .request(Method::GET, "/v2/propertypricing")
            .query(&[
                ("property_id", id.to_string()),
                ("start_date", start.to_string()),
                ("end_date", end.to_string()),
            ])
            .send()
            .await?;
        let payload: PricingPayload = decode(response).await?;
        Ok(payload.into_days())
    }

    /// Run a filtered search on the upstream side.
    pub async fn search_properties(
        &self,
        query: &UpstreamSearchQuery,
    ) -> Result<Page<Property>, AppError> {
        let response = self
            .request(Method::GET, "/v2/propertysearch")
            .query(query)
            .send()
            .await?;
        decode(response).await
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, AppError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        let message = upstream_message(&body).unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("Unknown error")
                .to_string()
        });
        tracing::warn!(status = status.as_u16(), "OwnerRez request failed: {}", message);
        return Err(AppError::Upstream {
            status: Some(status.as_u16()),
            message,
        });
    }

    response.json::<T>().await.map_err(|e| AppError::Upstream {
        status: Some(status.as_u16()),
        message: format!("Invalid response body: {}", e),
    })
}

/// Extract a readable message from an OwnerRez error body.
fn upstream_message(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(value) = serde_json::from_str::<serde_json::Value>(trimmed) {
        if let Some(messages) = value.get("messages").and_then(|m| m.as_array()) {
            let joined: Vec<&str> = messages.iter().filter_map(|m| m.as_str()).collect();
            if !joined.is_empty() {
                return Some(joined.join("; "));
            }
        }
        if let Some(message) = value.get("message").and_then(|m| m.as_str()) {
            return Some(message.to_string());
        }
    }

    Some(trimmed.to_string())
}
