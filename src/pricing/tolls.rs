//! Reduction of detected toll events into a single charge.
//!
//! Overlapping route segments can report the same toll plaza twice. An event is
//! dropped when an earlier counted event carries the same label and a location
//! within [`LOCATION_TOLERANCE_DEG`] (or both have no location). Unlabelled
//! events cannot be identified and are always counted.

use rust_decimal::Decimal;
use serde::Serialize;

use super::error::PricingError;
use super::models::TollEvent;

/// Roughly 11 m of latitude.
pub const LOCATION_TOLERANCE_DEG: f64 = 1e-4;

/// Summed toll charge.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TollSummary {
    #[serde(with = "rust_decimal::serde::str")]
    pub total: Decimal,
    pub count: usize,
}

impl TollSummary {
    pub fn empty() -> Self {
        Self {
            total: Decimal::ZERO,
            count: 0,
        }
    }
}

/// Convert a toll amount into money, rejecting negative and non-finite values.
pub fn toll_amount(amount: f64) -> Result<Decimal, PricingError> {
    if !amount.is_finite() || amount < 0.0 {
        return Err(PricingError::InvalidTollAmount(amount.to_string()));
    }
    if amount == 0.0 {
        return Ok(Decimal::ZERO);
    }
    Decimal::try_from(amount).map_err(|_| PricingError::InvalidTollAmount(amount.to_string()))
}

fn is_duplicate(event: &TollEvent, counted: &TollEvent) -> bool {
    let (Some(label), Some(other_label)) = (&event.label, &counted.label) else {
        return false;
    };
    if label != other_label {
        return false;
    }
    match (&event.location, &counted.location) {
        (None, None) => true,
        (Some(a), Some(b)) => a.approx_eq(b, LOCATION_TOLERANCE_DEG),
        _ => false,
    }
}

/// Sum toll events, counting duplicates once.
///
/// Every amount is validated before deduplication, so a bad duplicate still fails.
/// A sum that does not fit in a `Decimal` is rejected as an invalid amount.
pub fn aggregate_tolls(events: &[TollEvent]) -> Result<TollSummary, PricingError> {
    let amounts = events
        .iter()
        .map(|event| toll_amount(event.amount))
        .collect::<Result<Vec<_>, _>>()?;

    let mut counted: Vec<&TollEvent> = Vec::with_capacity(events.len());
    let mut total = Decimal::ZERO;

    for (event, amount) in events.iter().zip(amounts) {
        if counted.iter().any(|prev| is_duplicate(event, prev)) {
            tracing::debug!("Skipping duplicate toll event: {:?}", event.label);
            continue;
        }
        total = total.checked_add(amount).ok_or_else(|| {
            PricingError::InvalidTollAmount(format!("running total overflowed at {}", amount))
        })?;
        counted.push(event);
    }

    Ok(TollSummary {
        total,
        count: counted.len(),
    })
}
