//! Tow truck pricing and route-cost engine.
//!
//! Pure pricing lives under [`pricing`]; route, geocoding and payment
//! collaborators sit behind the traits in [`ports`].

pub mod cache;
pub mod config;
pub mod error;
pub mod notifications;
pub mod ports;
pub mod pricing;

use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::cache::{AppCache, CacheStats};
use crate::config::Config;
use crate::notifications::NotificationLimiter;
use crate::ports::{AcceptingPaymentProcessor, CoordinateGeocoder, GreatCircleRouteProvider};
use crate::pricing::QuoteService;

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub quotes: Arc<QuoteService>,
}

impl AppState {
    /// Wire the built-in collaborators from configuration
    pub fn from_config(config: Config) -> Self {
        let quotes = QuoteService::new(
            Arc::new(GreatCircleRouteProvider::new(config.road_factor)),
            Arc::new(CoordinateGeocoder),
            Arc::new(AcceptingPaymentProcessor),
            AppCache::new(config.route_cache_capacity, config.route_cache_ttl),
            NotificationLimiter::new(config.notification_cooldown),
            config.currency,
        );

        Self {
            quotes: Arc::new(quotes),
        }
    }
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn cache_stats(State(state): State<AppState>) -> Json<CacheStats> {
    Json(state.quotes.cache().stats())
}

/// Build the application router
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/cache/stats", get(cache_stats))
        .merge(pricing::router())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
