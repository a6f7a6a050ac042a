//! Request DTOs for pricing API endpoints.

use rust_decimal::Decimal;
use serde::Deserialize;

use super::catalog::TruckClassId;
use super::formatter::ExportFormat;
use super::models::{GeoPoint, ServiceType, TollEvent, VehicleProfile};

/// Free-text classification input. Any other field routes the body to a profile.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClassifyText {
    pub text: String,
}

/// Request to classify a vehicle: bare text or a full profile
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ClassifyRequest {
    Text(ClassifyText),
    Vehicle(VehicleProfile),
}

/// Request to aggregate toll events
#[derive(Debug, Deserialize)]
pub struct AggregateTollsRequest {
    pub events: Vec<TollEvent>,
}

/// Request to calculate a cost breakdown
#[derive(Debug, Deserialize)]
pub struct CalculateCostRequest {
    pub distance_km: f64,
    pub truck_class: String,
    #[serde(default)]
    pub requires_maneuver: bool,
    #[serde(default, with = "rust_decimal::serde::str")]
    pub toll_total: Decimal,
    #[serde(default)]
    pub requires_invoice: bool,
}

/// Request for a full quote between two points
#[derive(Debug, Default, Deserialize)]
pub struct QuoteRequest {
    /// Scopes notification cooldowns to one customer session
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub issue_description: String,
    #[serde(default)]
    pub pickup: Option<GeoPoint>,
    #[serde(default)]
    pub drop: Option<GeoPoint>,
    #[serde(default)]
    pub vehicle: VehicleProfile,
    /// Explicit class picked by the customer
    #[serde(default)]
    pub truck_class: Option<TruckClassId>,
    #[serde(default)]
    pub accept_suggestion: bool,
    #[serde(default)]
    pub requires_maneuver: bool,
    #[serde(default)]
    pub requires_invoice: bool,
    #[serde(default)]
    pub service_type: ServiceType,
    /// Toll fees entered by hand, added to those the route reports
    #[serde(default)]
    pub manual_tolls: Vec<TollEvent>,
}

/// Request to pay an issued quote
#[derive(Debug, Default, Deserialize)]
pub struct PayRequest {
    #[serde(default)]
    pub session_id: Option<String>,
}

/// Query string for export endpoints
#[derive(Debug, Default, Deserialize)]
pub struct ExportQuery {
    #[serde(default)]
    pub format: ExportFormat,
}
