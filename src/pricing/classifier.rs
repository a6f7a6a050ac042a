//! Truck class inference from a vehicle description.
//!
//! Text matching walks [`CLASS_RULES`] top to bottom and stops at the first rule
//! with a keyword contained in the lower-cased descriptor. Unmatched text falls
//! back to class A. A declared weight, when present, replaces the text result
//! with the smallest class able to carry it.

use serde::Serialize;

use super::catalog::{self, TruckClassId};
use super::error::PricingError;
use super::models::VehicleProfile;

/// A keyword rule mapping descriptor text to a truck class.
#[derive(Debug, Clone, Copy)]
pub struct ClassRule {
    pub keywords: &'static [&'static str],
    pub class: TruckClassId,
}

/// Ordered rule table; earlier rules win on overlapping keywords.
pub const CLASS_RULES: [ClassRule; 3] = [
    ClassRule {
        keywords: &["truck", "camion", "camión"],
        class: TruckClassId::D,
    },
    ClassRule {
        keywords: &["van", "minivan"],
        class: TruckClassId::C,
    },
    ClassRule {
        keywords: &["pickup", "suv"],
        class: TruckClassId::B,
    },
];

pub const DEFAULT_CLASS: TruckClassId = TruckClassId::A;

/// Infer a class from free text. Never fails.
pub fn classify_text(descriptor: &str) -> TruckClassId {
    let lowered = descriptor.to_lowercase();
    CLASS_RULES
        .iter()
        .find(|rule| rule.keywords.iter().any(|kw| lowered.contains(kw)))
        .map(|rule| rule.class)
        .unwrap_or(DEFAULT_CLASS)
}

/// Smallest class whose maximum weight covers `weight_kg`.
///
/// # Errors
///
/// [`PricingError::InvalidWeight`] for negative or non-finite weights,
/// [`PricingError::WeightExceedsCapacity`] above the largest class.
pub fn class_for_weight(weight_kg: f64) -> Result<TruckClassId, PricingError> {
    if !weight_kg.is_finite() || weight_kg < 0.0 {
        return Err(PricingError::InvalidWeight(weight_kg));
    }

    catalog::all()
        .iter()
        .find(|truck| f64::from(truck.max_weight_kg) >= weight_kg)
        .map(|truck| truck.id)
        .ok_or(PricingError::WeightExceedsCapacity {
            weight_kg,
            max_kg: catalog::largest().max_weight_kg,
        })
}

/// Classify a vehicle profile, letting a declared weight override the text match.
pub fn classify(vehicle: &VehicleProfile) -> Result<TruckClassId, PricingError> {
    match vehicle.declared_weight_kg {
        Some(weight) => class_for_weight(weight),
        None => Ok(classify_text(&vehicle.descriptor())),
    }
}

/// Truck choice for a request: an inferred suggestion plus the customer's own pick.
///
/// A vehicle change only refreshes the suggestion; it never replaces a class the
/// customer chose explicitly. The suggestion becomes the choice only through
/// [`TruckSelection::accept_suggestion`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TruckSelection {
    suggested: Option<TruckClassId>,
    chosen: Option<TruckClassId>,
}

impl TruckSelection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Refresh the suggestion from a changed vehicle.
    pub fn vehicle_changed(&mut self, vehicle: &VehicleProfile) -> Result<TruckClassId, PricingError> {
        let suggestion = classify(vehicle)?;
        self.suggested = Some(suggestion);
        Ok(suggestion)
    }

    pub fn choose(&mut self, class: TruckClassId) {
        self.chosen = Some(class);
    }

    pub fn clear_choice(&mut self) {
        self.chosen = None;
    }

    /// Adopt the current suggestion as the customer's choice.
    pub fn accept_suggestion(&mut self) -> Option<TruckClassId> {
        if let Some(suggestion) = self.suggested {
            self.chosen = Some(suggestion);
        }
        self.chosen
    }

    pub fn suggested(&self) -> Option<TruckClassId> {
        self.suggested
    }

    pub fn chosen(&self) -> Option<TruckClassId> {
        self.chosen
    }

    /// True when the customer's pick differs from what the vehicle suggests.
    pub fn overrides_suggestion(&self) -> bool {
        matches!((self.chosen, self.suggested), (Some(c), Some(s)) if c != s)
    }

    /// Class used for pricing: explicit choice, then suggestion, then A.
    pub fn effective(&self) -> TruckClassId {
        self.chosen.or(self.suggested).unwrap_or(DEFAULT_CLASS)
    }
}
