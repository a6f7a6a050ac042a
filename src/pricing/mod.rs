//! Pricing engine for tow truck quotes.
//!
//! The core (catalog, classifier, tolls, calculators, formatter) is pure and
//! synchronous. [`services::QuoteService`] combines it with the route,
//! geocoding and payment ports to produce full quotes.

pub mod calculators;
pub mod catalog;
pub mod classifier;
pub mod document;
pub mod error;
pub mod formatter;
pub mod models;
pub mod requests;
pub mod responses;
pub mod routes;
pub mod services;
pub mod tolls;

// Re-export commonly used items
pub use calculators::{compute_cost, round_money, CostBreakdown};
pub use classifier::{classify, TruckSelection};
pub use error::PricingError;
pub use formatter::{format_breakdown, ExportFormat, LineItem};
pub use routes::router;
pub use services::{Booking, PaymentConfirmation, Quote, QuoteError, QuoteService};
pub use tolls::{aggregate_tolls, TollSummary};
