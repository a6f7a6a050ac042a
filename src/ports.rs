//! Traits describing the external collaborators and the built-in implementations.
//!
//! The pricing core never talks to these; the quote service resolves distance,
//! tolls and addresses through them and hands plain values to the engine.

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use crate::pricing::models::{GeoPoint, TollEvent};

/// Mean Earth radius in kilometres.
pub const EARTH_RADIUS_KM: f64 = 6371.0088;

#[derive(thiserror::Error, Debug)]
/// Errors that can occur while talking to collaborator backends.
pub enum PortError {
    /// No route could be computed between the two points.
    #[error("Route unavailable: {0}")]
    RouteUnavailable(String),
    /// Coordinates or query did not resolve to an address.
    #[error("Address not found")]
    AddressNotFound,
    /// Payment was rejected by the processor.
    #[error("Payment declined: {0}")]
    PaymentDeclined(String),
    /// Internal provider error.
    #[error("Internal error: {0}")]
    Internal(String),
}

#[derive(Debug, Clone, Serialize)]
/// Route between two points as reported by a route provider.
pub struct Route {
    /// Total road distance.
    pub distance_km: f64,
    /// Polyline of the route, possibly just the endpoints.
    pub geometry: Vec<GeoPoint>,
    /// Tolls encountered along the route.
    pub tolls: Vec<TollEvent>,
}

#[derive(Debug, Clone, Serialize)]
/// Ranked address suggestion returned from a forward geocoding query.
pub struct AddressSuggestion {
    /// Human-readable address.
    pub label: String,
    /// Location of the address.
    pub location: GeoPoint,
}

#[derive(Debug, Clone, Serialize)]
/// Confirmation of a processed payment.
pub struct PaymentReceipt {
    /// Processor transaction reference.
    pub transaction_id: Uuid,
    /// Charged amount.
    #[serde(with = "rust_decimal::serde::str")]
    pub amount: Decimal,
    /// Currency code of the charge.
    pub currency: String,
}

#[async_trait]
/// Trait for route computation backends.
pub trait RouteProvider: Send + Sync {
    /// Compute a route from `from` to `to`.
    ///
    /// # Errors
    ///
    /// Returns a [`PortError`] when no route can be produced.
    async fn route(&self, from: GeoPoint, to: GeoPoint) -> Result<Route, PortError>;
}

#[async_trait]
/// Trait for reverse and forward geocoding backends.
pub trait Geocoder: Send + Sync {
    /// Human-readable address for coordinates.
    async fn reverse(&self, point: GeoPoint) -> Result<String, PortError>;

    /// Ranked suggestions for a free-text query.
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<AddressSuggestion>, PortError>;
}

#[async_trait]
/// Trait for payment backends.
pub trait PaymentProcessor: Send + Sync {
    /// Charge `amount` and report success or failure.
    async fn charge(&self, amount: Decimal, currency: &str) -> Result<PaymentReceipt, PortError>;
}

/// Great-circle distance between two points in kilometres.
pub fn haversine_km(from: GeoPoint, to: GeoPoint) -> f64 {
    let lat1 = from.lat.to_radians();
    let lat2 = to.lat.to_radians();
    let delta_lat = (to.lat - from.lat).to_radians();
    let delta_lng = (to.lng - from.lng).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (delta_lng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().asin();
    EARTH_RADIUS_KM * c
}

fn valid_point(point: &GeoPoint) -> bool {
    point.lat.is_finite()
        && point.lng.is_finite()
        && (-90.0..=90.0).contains(&point.lat)
        && (-180.0..=180.0).contains(&point.lng)
}

/// Offline route estimate: great-circle distance scaled by a road factor. Reports no tolls.
#[derive(Debug, Clone)]
pub struct GreatCircleRouteProvider {
    road_factor: f64,
}

impl GreatCircleRouteProvider {
    pub fn new(road_factor: f64) -> Self {
        Self { road_factor }
    }
}

#[async_trait]
impl RouteProvider for GreatCircleRouteProvider {
    async fn route(&self, from: GeoPoint, to: GeoPoint) -> Result<Route, PortError> {
        if !valid_point(&from) || !valid_point(&to) {
            return Err(PortError::RouteUnavailable(format!(
                "invalid coordinates {:?} -> {:?}",
                from, to
            )));
        }
        Ok(Route {
            distance_km: haversine_km(from, to) * self.road_factor,
            geometry: vec![from, to],
            tolls: Vec::new(),
        })
    }
}

/// Geocoder that renders coordinates as the address and parses `lat, lng` queries.
#[derive(Debug, Clone, Default)]
pub struct CoordinateGeocoder;

impl CoordinateGeocoder {
    fn parse(query: &str) -> Option<GeoPoint> {
        let (lat, lng) = query.split_once(',')?;
        let point = GeoPoint::new(lat.trim().parse().ok()?, lng.trim().parse().ok()?);
        valid_point(&point).then_some(point)
    }
}

#[async_trait]
impl Geocoder for CoordinateGeocoder {
    async fn reverse(&self, point: GeoPoint) -> Result<String, PortError> {
        if !valid_point(&point) {
            return Err(PortError::AddressNotFound);
        }
        Ok(format!("{:.6}, {:.6}", point.lat, point.lng))
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<AddressSuggestion>, PortError> {
        let suggestions = Self::parse(query)
            .map(|location| AddressSuggestion {
                label: format!("{:.6}, {:.6}", location.lat, location.lng),
                location,
            })
            .into_iter()
            .take(limit)
            .collect();
        Ok(suggestions)
    }
}

/// Processor that approves every positive amount.
#[derive(Debug, Clone, Default)]
pub struct AcceptingPaymentProcessor;

#[async_trait]
impl PaymentProcessor for AcceptingPaymentProcessor {
    async fn charge(&self, amount: Decimal, currency: &str) -> Result<PaymentReceipt, PortError> {
        if amount <= Decimal::ZERO {
            return Err(PortError::PaymentDeclined(format!(
                "amount must be positive, got {}",
                amount
            )));
        }
        Ok(PaymentReceipt {
            transaction_id: Uuid::new_v4(),
            amount,
            currency: currency.to_string(),
        })
    }
}
