//! Tow truck classes and their tariffs.
//!
//! The set is closed: four classes, ordered by ascending capacity, fixed at
//! compile time. Rates and maximum weight strictly increase from A to D.

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::error::PricingError;

/// Identifier of a tow truck class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TruckClassId {
    A,
    B,
    C,
    D,
}

impl TruckClassId {
    pub fn as_str(&self) -> &'static str {
        match self {
            TruckClassId::A => "A",
            TruckClassId::B => "B",
            TruckClassId::C => "C",
            TruckClassId::D => "D",
        }
    }
}

impl fmt::Display for TruckClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TruckClassId {
    type Err = PricingError;

    /// Accepts the class letter in either case, surrounding whitespace ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "A" | "a" => Ok(TruckClassId::A),
            "B" | "b" => Ok(TruckClassId::B),
            "C" | "c" => Ok(TruckClassId::C),
            "D" | "d" => Ok(TruckClassId::D),
            other => Err(PricingError::UnknownTruckClass(other.to_string())),
        }
    }
}

/// Tariff and capacity of a single truck class.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TruckClass {
    pub id: TruckClassId,
    pub name: &'static str,
    pub capacity: &'static str,
    pub max_weight_kg: u32,
    #[serde(with = "rust_decimal::serde::str")]
    pub per_km: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub maneuver_charge: Decimal,
}

static TRUCK_CLASSES: [TruckClass; 4] = [
    TruckClass {
        id: TruckClassId::A,
        name: "Tipo A",
        capacity: "hasta 2000kg",
        max_weight_kg: 2000,
        per_km: dec!(25),
        maneuver_charge: dec!(500),
    },
    TruckClass {
        id: TruckClassId::B,
        name: "Tipo B",
        capacity: "hasta 3000kg",
        max_weight_kg: 3000,
        per_km: dec!(35),
        maneuver_charge: dec!(750),
    },
    TruckClass {
        id: TruckClassId::C,
        name: "Tipo C",
        capacity: "hasta 4000kg",
        max_weight_kg: 4000,
        per_km: dec!(45),
        maneuver_charge: dec!(1000),
    },
    TruckClass {
        id: TruckClassId::D,
        name: "Tipo D",
        capacity: "hasta 8000kg",
        max_weight_kg: 8000,
        per_km: dec!(60),
        maneuver_charge: dec!(1500),
    },
];

/// All truck classes ordered by ascending capacity.
pub fn all() -> &'static [TruckClass] {
    &TRUCK_CLASSES
}

/// Tariff for a known class id.
pub fn truck(id: TruckClassId) -> &'static TruckClass {
    match id {
        TruckClassId::A => &TRUCK_CLASSES[0],
        TruckClassId::B => &TRUCK_CLASSES[1],
        TruckClassId::C => &TRUCK_CLASSES[2],
        TruckClassId::D => &TRUCK_CLASSES[3],
    }
}

/// Resolve a class id string to its tariff.
///
/// # Errors
///
/// Returns [`PricingError::UnknownTruckClass`] when the id is not one of A-D.
pub fn lookup(class_id: &str) -> Result<&'static TruckClass, PricingError> {
    class_id.parse::<TruckClassId>().map(truck)
}

/// The largest class, used as the capacity ceiling for weight-based selection.
pub fn largest() -> &'static TruckClass {
    &TRUCK_CLASSES[TRUCK_CLASSES.len() - 1]
}
