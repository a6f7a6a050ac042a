//! Response DTOs for pricing API endpoints.

use serde::Serialize;

use super::calculators::CostBreakdown;
use super::catalog::{TruckClass, TruckClassId};
use super::formatter::LineItem;

/// Response listing the truck catalog
#[derive(Debug, Serialize)]
pub struct TruckCatalogResponse {
    pub currency: String,
    pub trucks: Vec<&'static TruckClass>,
}

/// Response for vehicle classification
#[derive(Debug, Serialize)]
pub struct ClassifyResponse {
    pub truck_class: TruckClassId,
    pub name: &'static str,
    pub max_weight_kg: u32,
}

/// Response for cost calculation
#[derive(Debug, Serialize)]
pub struct CostResponse {
    pub currency: String,
    pub breakdown: CostBreakdown,
    /// Primary itemization, rounded to cents
    pub line_items: Vec<LineItem>,
    /// Informational service-fee/IVA split of the same total
    pub display_line_items: Vec<LineItem>,
    pub estimated_hours: u32,
}

/// Generic pricing error response
#[derive(Debug, Serialize)]
pub struct PricingErrorResponse {
    pub error_type: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}
