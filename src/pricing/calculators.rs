//! Core pricing calculation functions.
//!
//! Pure functions for quote math - no I/O, no clock, no shared state.
//! Everything is computed at full `Decimal` precision; rounding is left to
//! the formatting layer.

use rust_decimal::prelude::*;
use rust_decimal_macros::dec;
use serde::Serialize;

use super::catalog::{self, TruckClass, TruckClassId};
use super::error::PricingError;

/// IVA applied when the customer requests an invoice.
pub const INVOICE_TAX_RATE: Decimal = dec!(0.16);

/// Service fee share used by the display decomposition.
pub const SERVICE_FEE_RATE: Decimal = dec!(0.10);

/// Average road speed used for the travel time estimate.
pub const AVERAGE_SPEED_KMH: Decimal = dec!(50);

/// Round to specified decimal places, ties away from zero.
///
/// # Examples
/// ```
/// use rust_decimal_macros::dec;
/// use towquote_web::pricing::round_money;
///
/// assert_eq!(round_money(dec!(2.5), 0), dec!(3));
/// assert_eq!(round_money(dec!(-2.5), 0), dec!(-3));
/// assert_eq!(round_money(dec!(1.005), 2), dec!(1.01));
/// ```
pub fn round_money(amount: Decimal, places: u32) -> Decimal {
    amount.round_dp_with_strategy(places, RoundingStrategy::MidpointAwayFromZero)
}

/// Validate a route distance and convert it to a decimal.
///
/// # Errors
///
/// Returns [`PricingError::InvalidDistance`] for negative, non-finite or
/// unrepresentable values. Negative distances are never clamped.
pub fn distance_km(distance: f64) -> Result<Decimal, PricingError> {
    if !distance.is_finite() || distance < 0.0 {
        return Err(PricingError::InvalidDistance {
            distance_km: distance,
        });
    }
    // also catches -0.0
    if distance == 0.0 {
        return Ok(Decimal::ZERO);
    }
    Decimal::try_from(distance).map_err(|_| PricingError::InvalidDistance {
        distance_km: distance,
    })
}

/// Alternate partition of a total used by the customer-facing breakdown.
///
/// Informational only: it splits the already computed total into a 10% service
/// fee and 16% IVA of the toll-free amount, which does not match the primary
/// engine's tax rule. It is never used to derive `total`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DisplayBreakdown {
    #[serde(with = "rust_decimal::serde::str")]
    pub base_cost: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub core_service: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub service_fee: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub tax: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub toll_total: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub total: Decimal,
}

/// Split `total` into core service, service fee, IVA and tolls for display.
pub fn display_breakdown(total: Decimal, toll_total: Decimal) -> DisplayBreakdown {
    let base_cost = total - toll_total;
    let service_fee = base_cost * SERVICE_FEE_RATE;
    let tax = base_cost * INVOICE_TAX_RATE;

    DisplayBreakdown {
        base_cost,
        core_service: base_cost - service_fee - tax,
        service_fee,
        tax,
        toll_total,
        total,
    }
}

/// Itemized result of one pricing computation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CostBreakdown {
    #[serde(with = "rust_decimal::serde::str")]
    pub distance_km: Decimal,
    pub truck_class: TruckClassId,
    pub requires_maneuver: bool,
    pub requires_invoice: bool,
    #[serde(with = "rust_decimal::serde::str")]
    pub base_service_cost: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub maneuver_cost: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub toll_total: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub subtotal: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub tax: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub total: Decimal,
    pub display: DisplayBreakdown,
}

/// Price a tow for an already validated distance and resolved truck.
pub fn price_tow(
    distance: Decimal,
    truck: &TruckClass,
    requires_maneuver: bool,
    toll_total: Decimal,
    requires_invoice: bool,
) -> Result<CostBreakdown, PricingError> {
    if distance.is_sign_negative() && !distance.is_zero() {
        return Err(PricingError::InvalidDistance {
            distance_km: distance.to_f64().unwrap_or(f64::NAN),
        });
    }
    if toll_total.is_sign_negative() && !toll_total.is_zero() {
        return Err(PricingError::InvalidTollAmount(toll_total.to_string()));
    }

    let base_service_cost = distance
        .checked_mul(truck.per_km)
        .ok_or(PricingError::AmountOverflow("base service cost"))?;
    let maneuver_cost = if requires_maneuver {
        truck.maneuver_charge
    } else {
        Decimal::ZERO
    };
    let subtotal = base_service_cost
        .checked_add(maneuver_cost)
        .and_then(|sum| sum.checked_add(toll_total))
        .ok_or(PricingError::AmountOverflow("subtotal"))?;
    let tax = if requires_invoice {
        subtotal
            .checked_mul(INVOICE_TAX_RATE)
            .ok_or(PricingError::AmountOverflow("tax"))?
    } else {
        Decimal::ZERO
    };
    let total = subtotal
        .checked_add(tax)
        .ok_or(PricingError::AmountOverflow("total"))?;

    Ok(CostBreakdown {
        distance_km: distance,
        truck_class: truck.id,
        requires_maneuver,
        requires_invoice,
        base_service_cost,
        maneuver_cost,
        toll_total,
        subtotal,
        tax,
        total,
        display: display_breakdown(total, toll_total),
    })
}

/// Compute the itemized cost of a tow.
///
/// ```text
/// base     = distance * per_km
/// maneuver = requires_maneuver ? maneuver_charge : 0
/// subtotal = base + maneuver + tolls
/// tax      = requires_invoice ? subtotal * 0.16 : 0
/// total    = subtotal + tax
/// ```
///
/// # Errors
///
/// `InvalidDistance`, `UnknownTruckClass` or `InvalidTollAmount` for bad inputs,
/// `AmountOverflow` when the result does not fit in a `Decimal`.
pub fn compute_cost(
    distance: f64,
    truck_class: &str,
    requires_maneuver: bool,
    toll_total: Decimal,
    requires_invoice: bool,
) -> Result<CostBreakdown, PricingError> {
    let distance = distance_km(distance)?;
    let truck = catalog::lookup(truck_class)?;
    price_tow(distance, truck, requires_maneuver, toll_total, requires_invoice)
}

/// Whole hours needed to drive `distance` at [`AVERAGE_SPEED_KMH`], rounded up.
pub fn estimated_hours(distance: Decimal) -> u32 {
    (distance / AVERAGE_SPEED_KMH)
        .ceil()
        .to_u32()
        .unwrap_or(u32::MAX)
}
