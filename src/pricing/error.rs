//! Typed failures raised by the pricing core.

use serde_json::json;

use super::catalog;

/// Pricing calculation error types
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PricingError {
    #[error("Invalid distance: {distance_km} km (must be finite and non-negative)")]
    InvalidDistance { distance_km: f64 },

    #[error("Unknown truck class '{0}' (expected one of A, B, C, D)")]
    UnknownTruckClass(String),

    #[error("Declared weight {weight_kg} kg exceeds the largest truck capacity of {max_kg} kg")]
    WeightExceedsCapacity { weight_kg: f64, max_kg: u32 },

    #[error("Invalid declared weight: {0} kg")]
    InvalidWeight(f64),

    #[error("Invalid toll amount: {0}")]
    InvalidTollAmount(String),

    #[error("Amount out of range while computing {0}")]
    AmountOverflow(&'static str),
}

impl PricingError {
    /// Stable machine-readable code used in API error bodies.
    pub fn error_type(&self) -> &'static str {
        match self {
            PricingError::InvalidDistance { .. } => "invalid_distance",
            PricingError::UnknownTruckClass(_) => "unknown_truck_class",
            PricingError::WeightExceedsCapacity { .. } => "weight_exceeds_capacity",
            PricingError::InvalidWeight(_) => "invalid_weight",
            PricingError::InvalidTollAmount(_) => "invalid_toll_amount",
            PricingError::AmountOverflow(_) => "amount_overflow",
        }
    }

    /// Offending input, for the `details` field of error bodies.
    pub fn details(&self) -> serde_json::Value {
        match self {
            PricingError::InvalidDistance { distance_km } => json!({ "distance_km": distance_km }),
            PricingError::UnknownTruckClass(class) => json!({
                "truck_class": class,
                "expected": catalog::all().iter().map(|t| t.id).collect::<Vec<_>>(),
            }),
            PricingError::WeightExceedsCapacity { weight_kg, max_kg } => {
                json!({ "weight_kg": weight_kg, "max_kg": max_kg })
            }
            PricingError::InvalidWeight(weight_kg) => json!({ "weight_kg": weight_kg }),
            PricingError::InvalidTollAmount(amount) => json!({ "amount": amount }),
            PricingError::AmountOverflow(field) => json!({ "field": field }),
        }
    }
}
