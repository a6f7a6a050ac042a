//! In-memory caching using moka
//!
//! Route and reverse-geocoding lookups are the slow, external part of a quote.
//! Both are keyed by coordinates rounded to six decimals. Issued quotes are
//! kept as bookings, keyed by quote id, until they are paid or expire.

use moka::future::Cache;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::info;
use uuid::Uuid;

use crate::ports::Route;
use crate::pricing::models::GeoPoint;
use crate::pricing::services::Booking;

/// How many route TTLs an unpaid quote stays payable
const BOOKING_TTL_FACTOR: u32 = 6;

/// Application cache holding resolved routes and addresses
#[derive(Clone)]
pub struct AppCache {
    /// Routes ("from->to" -> Route)
    pub routes: Cache<String, Arc<Route>>,
    /// Reverse-geocoded addresses ("lat,lng" -> address)
    pub addresses: Cache<String, Arc<String>>,
    /// Issued quotes awaiting or holding payment (quote id -> booking)
    pub bookings: Cache<Uuid, Arc<Mutex<Booking>>>,
}

impl AppCache {
    /// Create a new cache instance with the given capacity and TTL
    pub fn new(capacity: u64, ttl: Duration) -> Self {
        Self {
            routes: Cache::builder()
                .max_capacity(capacity)
                .time_to_live(ttl)
                .build(),

            // Addresses barely change; keep them four times as long
            addresses: Cache::builder()
                .max_capacity(capacity)
                .time_to_live(ttl * 4)
                .time_to_idle(ttl)
                .build(),

            bookings: Cache::builder()
                .max_capacity(capacity)
                .time_to_live(ttl * BOOKING_TTL_FACTOR)
                .build(),
        }
    }

    /// Get cache statistics for monitoring
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            routes_size: self.routes.entry_count(),
            addresses_size: self.addresses.entry_count(),
            bookings_size: self.bookings.entry_count(),
        }
    }

    /// Invalidate all caches
    pub fn invalidate_all(&self) {
        self.routes.invalidate_all();
        self.addresses.invalidate_all();
        self.bookings.invalidate_all();
        info!("All caches invalidated");
    }

    /// Generate cache key for a point
    pub fn point_key(point: GeoPoint) -> String {
        format!("{:.6},{:.6}", point.lat, point.lng)
    }

    /// Generate cache key for a directed route
    pub fn route_key(from: GeoPoint, to: GeoPoint) -> String {
        format!("{}->{}", Self::point_key(from), Self::point_key(to))
    }
}

impl Default for AppCache {
    fn default() -> Self {
        Self::new(1000, Duration::from_secs(10 * 60))
    }
}

/// Cache statistics for monitoring endpoint
#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    pub routes_size: u64,
    pub addresses_size: u64,
    pub bookings_size: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_key_is_directional() {
        let a = GeoPoint::new(19.4326, -99.1332);
        let b = GeoPoint::new(19.0433, -98.1981);
        assert_eq!(
            AppCache::route_key(a, b),
            "19.432600,-99.133200->19.043300,-98.198100"
        );
        assert_ne!(AppCache::route_key(a, b), AppCache::route_key(b, a));
    }

    #[tokio::test]
    async fn test_cache_roundtrip_and_invalidate() {
        let cache = AppCache::default();
        let key = AppCache::point_key(GeoPoint::new(1.0, 2.0));
        cache
            .addresses
            .insert(key.clone(), Arc::new("Somewhere".to_string()))
            .await;

        assert_eq!(
            cache.addresses.get(&key).await.as_deref().map(String::as_str),
            Some("Somewhere")
        );

        cache.invalidate_all();
        assert!(cache.addresses.get(&key).await.is_none());
    }
}
