//! Rental Catalog Backend
//!
//! REST backend mirroring the OwnerRez property catalog through a file-backed
//! cache and merging it with locally stored listing data in SQLite.

mod api;
mod auth;
mod cache;
mod catalog;
mod config;
mod db;
mod errors;
mod models;
mod ownerrez;
mod resolver;
mod search;

use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, put},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use cache::PropertyCache;
use config::Config;
use db::Repository;
use ownerrez::OwnerRezClient;
use search::SearchIndex;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub client: Arc<OwnerRezClient>,
    pub cache: Arc<PropertyCache>,
    pub repo: Arc<Repository>,
    pub search: Arc<SearchIndex>,
    pub config: Arc<Config>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_env()?;

    // Initialize logging
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Rental Catalog Backend");
    tracing::info!("Database path: {:?}", config.db_path);
    tracing::info!("Cache path: {:?}", config.cache_path);
    tracing::info!("OwnerRez API: {}", config.ownerrez.base_url);
    tracing::info!("Bind address: {}", config.bind_addr);

    if config.api_psk.is_none() {
        tracing::warn!("No API PSK configured (RENTAL_API_PSK). Admin routes are open!");
    }
    if config.ownerrez.username.is_empty() || config.ownerrez.token.is_empty() {
        tracing::warn!("OwnerRez credentials are not configured (OWNERREZ_USERNAME, OWNERREZ_TOKEN)");
    }

    let pool = db::init_database(&config.db_path).await?;

    let state = AppState {
        client: Arc::new(OwnerRezClient::new(&config.ownerrez)?),
        cache: Arc::new(PropertyCache::new(&config.cache_path)),
        repo: Arc::new(Repository::new(pool)),
        search: Arc::new(SearchIndex::new()?),
        config: Arc::new(config.clone()),
    };

    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the application router with all routes.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let psk = state.config.api_psk.clone();

    let property_routes = Router::new()
        .route("/properties", get(api::list_properties))
        .route("/properties/cache-status", get(api::cache_status))
        .route("/properties/by-ids", get(api::properties_by_ids))
        .route("/properties/locations", get(api::list_locations))
        .route("/properties/search", get(api::search_properties))
        .route("/properties/{id}", get(api::get_property));

    let admin_routes = Router::new()
        .route(
            "/admin/properties",
            get(api::list_local_properties).post(api::create_local_property),
        )
        .route("/admin/properties/{id}", put(api::update_local_property))
        .layer(middleware::from_fn(move |req, next| {
            auth::require_admin_key(psk.clone(), req, next)
        }));

    let health_routes = Router::new().route("/health", get(health_check));

    Router::new()
        .nest("/api", property_routes.merge(admin_routes))
        .merge(health_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}

#[cfg(test)]
mod test_support;
