//! Domain models shared by the pricing core and its collaborators.

use serde::{Deserialize, Serialize};

/// A WGS84 coordinate pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// True when both axes differ by no more than `tolerance` degrees.
    pub fn approx_eq(&self, other: &GeoPoint, tolerance: f64) -> bool {
        (self.lat - other.lat).abs() <= tolerance && (self.lng - other.lng).abs() <= tolerance
    }
}

/// A toll charge detected on a route segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TollEvent {
    pub amount: f64,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub location: Option<GeoPoint>,
}

impl TollEvent {
    pub fn new(amount: f64) -> Self {
        Self {
            amount,
            label: None,
            location: None,
        }
    }

    pub fn labeled(amount: f64, label: impl Into<String>) -> Self {
        Self {
            amount,
            label: Some(label.into()),
            location: None,
        }
    }

    pub fn at(mut self, location: GeoPoint) -> Self {
        self.location = Some(location);
        self
    }
}

/// Vehicle to be towed, as described by the customer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VehicleProfile {
    #[serde(default)]
    pub make: String,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub color: String,
    /// Free-text body category such as "SUV" or "van".
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub declared_weight_kg: Option<f64>,
}

impl VehicleProfile {
    pub fn with_model(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..Self::default()
        }
    }

    /// Text the classifier matches keywords against.
    pub fn descriptor(&self) -> String {
        match &self.category {
            Some(category) => format!("{} {}", category, self.model),
            None => self.model.clone(),
        }
    }
}

/// Kind of towing service requested.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceType {
    #[default]
    Standard,
    Flatbed,
    Emergency,
}

impl ServiceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceType::Standard => "standard",
            ServiceType::Flatbed => "flatbed",
            ServiceType::Emergency => "emergency",
        }
    }
}
