//! In-process stand-in for the OwnerRez API used by tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};

use crate::config::OwnerRezConfig;
use crate::ownerrez::OwnerRezClient;

#[derive(Default)]
struct MockState {
    catalog: Vec<Value>,
    fail_catalog: bool,
    fail_updates: bool,
    pricing: Option<Vec<Value>>,
    catalog_requests: usize,
    property_requests: usize,
    pricing_requests: usize,
    search_queries: Vec<HashMap<String, String>>,
    updates: Vec<(i64, Value)>,
}

type Shared = Arc<Mutex<MockState>>;

/// A mock OwnerRez server bound to an ephemeral port.
#[derive(Clone)]
pub struct MockUpstream {
    state: Shared,
    pub base_url: String,
}

impl MockUpstream {
    pub async fn start() -> Self {
        let state: Shared = Arc::new(Mutex::new(MockState::default()));

        let app = Router::new()
            .route("/v2/properties", get(list_properties))
            .route(
                "/v2/properties/{id}",
                get(get_property).patch(update_property),
            )
            .route("/v2/propertypricing", get(pricing))
            .route("/v2/propertysearch", get(search))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind mock upstream");
        let addr = listener.local_addr().expect("Failed to get addr");

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            state,
            base_url: format!("http://{}", addr),
        }
    }

    pub fn config(&self) -> OwnerRezConfig {
        OwnerRezConfig {
            base_url: self.base_url.clone(),
            username: "test-user".to_string(),
            token: "test-token".to_string(),
            timeout: Duration::from_secs(5),
        }
    }

    pub fn client(&self) -> OwnerRezClient {
        OwnerRezClient::new(&self.config()).expect("Failed to build client")
    }

    pub fn property_json(id: i64) -> Value {
        json!({
            "id": id,
            "name": format!("Property {}", id),
            "active": true,
            "bedrooms": 2,
            "bathrooms": 1.0,
            "max_guests": 4,
            "max_pets": 0,
            "property_type": "house",
            "check_in": "16:00",
            "check_out": "10:00",
            "address": {
                "street1": "1 Main St",
                "city": "Asheville",
                "state": "NC",
                "country": "US",
                "postal_code": "28801",
                "is_default": true
            },
            "key": format!("key-{}", id)
        })
    }

    pub fn set_catalog(&self, catalog: Vec<Value>) {
        self.state.lock().unwrap().catalog = catalog;
    }

    pub fn fail_catalog(&self, fail: bool) {
        self.state.lock().unwrap().fail_catalog = fail;
    }

    pub fn fail_updates(&self, fail: bool) {
        self.state.lock().unwrap().fail_updates = fail;
    }

    pub fn set_pricing(&self, days: Option<Vec<Value>>) {
        self.state.lock().unwrap().pricing = days;
    }

    pub fn catalog_requests(&self) -> usize {
        self.state.lock().unwrap().catalog_requests
    }

    pub fn property_requests(&self) -> usize {
        self.state.lock().unwrap().property_requests
    }

    pub fn pricing_requests(&self) -> usize {
        self.state.lock().unwrap().pricing_requests
    }

    pub fn search_queries(&self) -> Vec<HashMap<String, String>> {
        self.state.lock().unwrap().search_queries.clone()
    }

    pub fn updates(&self) -> Vec<(i64, Value)> {
        self.state.lock().unwrap().updates.clone()
    }
}

fn error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "messages": [message] }))).into_response()
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("Basic "))
}

async fn list_properties(
    State(state): State<Shared>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    if !authorized(&headers) {
        return error(StatusCode::UNAUTHORIZED, "Unauthorized");
    }

    let mut state = state.lock().unwrap();
    state.catalog_requests += 1;
    if state.fail_catalog {
        return error(StatusCode::SERVICE_UNAVAILABLE, "Down for maintenance");
    }

    let offset: usize = params
        .get("offset")
        .and_then(|s| s.parse().ok())
        .unwrap_or(0);
    let limit: usize = params
        .get("limit")
        .and_then(|s| s.parse().ok())
        .unwrap_or(100);
    let items: Vec<Value> = state
        .catalog
        .iter()
        .skip(offset)
        .take(limit)
        .cloned()
        .collect();

    Json(json!({ "items": items, "count": state.catalog.len() })).into_response()
}

async fn get_property(State(state): State<Shared>, Path(id): Path<i64>) -> Response {
    let mut state = state.lock().unwrap();
    state.property_requests += 1;

    match state.catalog.iter().find(|p| p["id"] == id) {
        Some(property) => Json(property.clone()).into_response(),
        None => error(StatusCode::NOT_FOUND, "Property not found"),
    }
}

async fn update_property(
    State(state): State<Shared>,
    Path(id): Path<i64>,
    Json(changes): Json<serde_json::Map<String, Value>>,
) -> Response {
    let mut state = state.lock().unwrap();
    if state.fail_updates {
        return error(StatusCode::INTERNAL_SERVER_ERROR, "Update rejected");
    }
    state.updates.push((id, Value::Object(changes.clone())));

    match state.catalog.iter_mut().find(|p| p["id"] == id) {
        Some(Value::Object(property)) => {
            for (key, value) in changes {
                property.insert(key, value);
            }
            Json(Value::Object(property.clone())).into_response()
        }
        _ => error(StatusCode::NOT_FOUND, "Property not found"),
    }
}

async fn pricing(State(state): State<Shared>) -> Response {
    let mut state = state.lock().unwrap();
    state.pricing_requests += 1;

    match &state.pricing {
        Some(days) => Json(days.clone()).into_response(),
        None => error(StatusCode::INTERNAL_SERVER_ERROR, "Pricing unavailable"),
    }
}

async fn search(
    State(state): State<Shared>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let mut state = state.lock().unwrap();
    state.search_queries.push(params);

    Json(json!({ "items": state.catalog, "count": state.catalog.len() })).into_response()
}
