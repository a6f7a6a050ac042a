//! Quote service functions with collaborator access.
//!
//! These functions resolve routes, tolls and addresses through the ports and
//! cache, then hand plain values to the pure pricing functions.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::cache::AppCache;
use crate::notifications::{Notice, NoticeKind, NotificationLimiter};
use crate::ports::{Geocoder, PaymentProcessor, PaymentReceipt, PortError, Route, RouteProvider};

use super::calculators::{distance_km, estimated_hours, price_tow, round_money, CostBreakdown};
use super::catalog;
use super::classifier::TruckSelection;
use super::error::PricingError;
use super::formatter::{format_breakdown, format_display_breakdown, money_text, LineItem};
use super::models::{GeoPoint, ServiceType, TollEvent, VehicleProfile};
use super::requests::QuoteRequest;
use super::tolls::{aggregate_tolls, TollSummary};

const ANONYMOUS_SESSION: &str = "anonymous";

/// Quote service error types
#[derive(Debug, thiserror::Error)]
pub enum QuoteError {
    #[error(transparent)]
    Pricing(#[from] PricingError),

    #[error(transparent)]
    Port(#[from] PortError),

    #[error("Missing {0} location")]
    MissingLocation(&'static str),

    #[error("Quote {0} not found")]
    UnknownQuote(Uuid),

    #[error("Quote {0} has already been paid")]
    AlreadyPaid(Uuid),

    /// The processor refused the charge; carries the notice to show, if any.
    #[error("Payment failed: {source}")]
    PaymentFailed {
        source: PortError,
        notice: Option<Notice>,
    },
}

/// A priced tow request
#[derive(Debug, Clone, Serialize)]
pub struct Quote {
    pub id: Uuid,
    pub currency: String,
    pub requester: String,
    pub issue_description: String,
    pub service_type: ServiceType,
    pub pickup: GeoPoint,
    pub drop: GeoPoint,
    pub pickup_address: String,
    pub drop_address: String,
    pub vehicle: VehicleProfile,
    pub truck_selection: TruckSelection,
    pub truck_name: &'static str,
    pub tolls: TollSummary,
    pub breakdown: CostBreakdown,
    pub line_items: Vec<LineItem>,
    pub display_line_items: Vec<LineItem>,
    pub estimated_hours: u32,
    pub notices: Vec<Notice>,
}

/// Payment state of a quote
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BookingStatus {
    Pending,
    Paid { receipt: PaymentReceipt },
}

/// A quote awaiting or holding payment
#[derive(Debug, Clone, Serialize)]
pub struct Booking {
    pub quote: Quote,
    pub status: BookingStatus,
}

impl Booking {
    pub fn new(quote: Quote) -> Self {
        Self {
            quote,
            status: BookingStatus::Pending,
        }
    }

    pub fn is_paid(&self) -> bool {
        matches!(self.status, BookingStatus::Paid { .. })
    }
}

/// Result of a successful payment
#[derive(Debug, Clone, Serialize)]
pub struct PaymentConfirmation {
    pub receipt: PaymentReceipt,
    pub notice: Option<Notice>,
}

/// Orchestrates collaborators and the pricing core into quotes
pub struct QuoteService {
    routes: Arc<dyn RouteProvider>,
    geocoder: Arc<dyn Geocoder>,
    payments: Arc<dyn PaymentProcessor>,
    cache: AppCache,
    notices: NotificationLimiter,
    currency: String,
}

impl QuoteService {
    pub fn new(
        routes: Arc<dyn RouteProvider>,
        geocoder: Arc<dyn Geocoder>,
        payments: Arc<dyn PaymentProcessor>,
        cache: AppCache,
        notices: NotificationLimiter,
        currency: impl Into<String>,
    ) -> Self {
        Self {
            routes,
            geocoder,
            payments,
            cache,
            notices,
            currency: currency.into(),
        }
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    pub fn cache(&self) -> &AppCache {
        &self.cache
    }

    /// Resolve a route, trying the cache first
    async fn resolve_route(&self, from: GeoPoint, to: GeoPoint) -> Result<Arc<Route>, PortError> {
        let key = AppCache::route_key(from, to);
        if let Some(cached) = self.cache.routes.get(&key).await {
            debug!("Cache HIT for route: {}", key);
            return Ok(cached);
        }

        debug!("Cache MISS for route: {}", key);
        let route = Arc::new(self.routes.route(from, to).await?);
        self.cache.routes.insert(key, route.clone()).await;
        Ok(route)
    }

    /// Reverse-geocode a point; falls back to the raw coordinates on failure
    async fn resolve_address(&self, point: GeoPoint) -> String {
        let key = AppCache::point_key(point);
        if let Some(cached) = self.cache.addresses.get(&key).await {
            return (*cached).clone();
        }

        match self.geocoder.reverse(point).await {
            Ok(address) => {
                self.cache
                    .addresses
                    .insert(key, Arc::new(address.clone()))
                    .await;
                address
            }
            Err(e) => {
                warn!("Reverse geocoding failed for {}: {}", key, e);
                key
            }
        }
    }

    /// Price a tow between two points.
    ///
    /// Missing locations are rejected before any collaborator is called.
    pub async fn quote(&self, request: QuoteRequest) -> Result<Quote, QuoteError> {
        let pickup = request.pickup.ok_or(QuoteError::MissingLocation("pickup"))?;
        let drop = request.drop.ok_or(QuoteError::MissingLocation("drop-off"))?;
        let session = request
            .session_id
            .as_deref()
            .unwrap_or(ANONYMOUS_SESSION)
            .to_string();

        let mut selection = TruckSelection::new();
        let has_vehicle_info = !request.vehicle.descriptor().trim().is_empty()
            || request.vehicle.declared_weight_kg.is_some();
        if has_vehicle_info {
            selection.vehicle_changed(&request.vehicle)?;
        }
        if let Some(class) = request.truck_class {
            selection.choose(class);
        } else if request.accept_suggestion {
            selection.accept_suggestion();
        }

        let route = self.resolve_route(pickup, drop).await?;
        let distance = distance_km(route.distance_km)?;

        let toll_events: Vec<TollEvent> = route
            .tolls
            .iter()
            .chain(request.manual_tolls.iter())
            .cloned()
            .collect();
        let tolls = aggregate_tolls(&toll_events)?;

        let truck = catalog::truck(selection.effective());
        let breakdown = price_tow(
            distance,
            truck,
            request.requires_maneuver,
            tolls.total,
            request.requires_invoice,
        )?;

        let (pickup_address, drop_address) =
            tokio::join!(self.resolve_address(pickup), self.resolve_address(drop));

        let mut notices = Vec::new();
        notices.extend(self.notices.filter(
            &session,
            Notice {
                kind: NoticeKind::RouteCalculated,
                title: "Route Calculated".to_string(),
                description: format!("Total route distance: {} km", money_text(distance)),
            },
        ));
        if let (Some(suggested), None) = (selection.suggested(), request.truck_class) {
            notices.extend(self.notices.filter(
                &session,
                Notice {
                    kind: NoticeKind::TruckSuggested,
                    title: "Tow truck class updated".to_string(),
                    description: format!(
                        "Tow truck class {} was selected automatically based on the vehicle model",
                        suggested
                    ),
                },
            ));
        }

        let quote = Quote {
            id: Uuid::new_v4(),
            currency: self.currency.clone(),
            requester: request.username,
            issue_description: request.issue_description,
            service_type: request.service_type,
            pickup,
            drop,
            pickup_address,
            drop_address,
            vehicle: request.vehicle,
            truck_selection: selection,
            truck_name: truck.name,
            tolls,
            line_items: format_breakdown(&breakdown),
            display_line_items: format_display_breakdown(&breakdown.display),
            estimated_hours: estimated_hours(breakdown.distance_km),
            breakdown,
            notices,
        };

        self.cache
            .bookings
            .insert(quote.id, Arc::new(Mutex::new(Booking::new(quote.clone()))))
            .await;

        info!(
            "Quote {} priced: class {} over {} km, total {} {}",
            quote.id,
            quote.breakdown.truck_class,
            money_text(quote.breakdown.distance_km),
            money_text(quote.breakdown.total),
            quote.currency
        );

        Ok(quote)
    }

    /// Charge the authoritative total of a booking once.
    pub async fn confirm_payment(
        &self,
        booking: &mut Booking,
        session_id: Option<&str>,
    ) -> Result<PaymentConfirmation, QuoteError> {
        if booking.is_paid() {
            warn!("Rejected second payment for quote {}", booking.quote.id);
            return Err(QuoteError::AlreadyPaid(booking.quote.id));
        }

        // Charge what the customer was shown
        let total = round_money(booking.quote.breakdown.total, 2);
        let session = session_id.unwrap_or(ANONYMOUS_SESSION);
        let receipt = match self.payments.charge(total, &booking.quote.currency).await {
            Ok(receipt) => receipt,
            Err(e) => {
                warn!("Payment for quote {} failed: {}", booking.quote.id, e);
                let notice = self.notices.filter(
                    session,
                    Notice {
                        kind: NoticeKind::Payment,
                        title: "Payment Error".to_string(),
                        description: e.to_string(),
                    },
                );
                return Err(QuoteError::PaymentFailed { source: e, notice });
            }
        };

        info!(
            "Quote {} paid: {} {} (transaction {})",
            booking.quote.id,
            money_text(receipt.amount),
            receipt.currency,
            receipt.transaction_id
        );
        booking.status = BookingStatus::Paid {
            receipt: receipt.clone(),
        };

        let notice = self.notices.filter(
            session,
            Notice {
                kind: NoticeKind::Payment,
                title: "Payment Successful".to_string(),
                description: "Tow truck request confirmed!".to_string(),
            },
        );

        Ok(PaymentConfirmation { receipt, notice })
    }

    /// Pay a quote issued by this service, looked up by id.
    ///
    /// The booking stays locked for the whole charge, so concurrent calls for
    /// one quote are serialized and only the first one charges.
    pub async fn pay(
        &self,
        quote_id: Uuid,
        session_id: Option<&str>,
    ) -> Result<PaymentConfirmation, QuoteError> {
        let booking = self
            .cache
            .bookings
            .get(&quote_id)
            .await
            .ok_or(QuoteError::UnknownQuote(quote_id))?;
        let mut booking = booking.lock().await;
        self.confirm_payment(&mut booking, session_id).await
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::notifications::ManualClock;
    use crate::ports::{AcceptingPaymentProcessor, CoordinateGeocoder};
    use crate::pricing::catalog::TruckClassId;
    use async_trait::async_trait;
    use chrono::Duration;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Route provider returning a fixed route and counting calls
    pub(crate) struct FixedRouteProvider {
        pub route: Route,
        pub calls: AtomicUsize,
    }

    impl FixedRouteProvider {
        pub(crate) fn new(distance_km: f64, tolls: Vec<TollEvent>) -> Self {
            Self {
                route: Route {
                    distance_km,
                    geometry: Vec::new(),
                    tolls,
                },
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl RouteProvider for FixedRouteProvider {
        async fn route(&self, _from: GeoPoint, _to: GeoPoint) -> Result<Route, PortError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.route.clone())
        }
    }

    struct FailingGeocoder;

    #[async_trait]
    impl Geocoder for FailingGeocoder {
        async fn reverse(&self, _point: GeoPoint) -> Result<String, PortError> {
            Err(PortError::AddressNotFound)
        }

        async fn search(
            &self,
            _query: &str,
            _limit: usize,
        ) -> Result<Vec<crate::ports::AddressSuggestion>, PortError> {
            Ok(Vec::new())
        }
    }

    struct DecliningProcessor;

    #[async_trait]
    impl PaymentProcessor for DecliningProcessor {
        async fn charge(&self, _amount: Decimal, _currency: &str) -> Result<PaymentReceipt, PortError> {
            Err(PortError::PaymentDeclined("card rejected".to_string()))
        }
    }

    pub(crate) fn service_with(
        routes: Arc<dyn RouteProvider>,
        geocoder: Arc<dyn Geocoder>,
        payments: Arc<dyn PaymentProcessor>,
    ) -> QuoteService {
        QuoteService::new(
            routes,
            geocoder,
            payments,
            AppCache::default(),
            NotificationLimiter::with_clock(Duration::milliseconds(3000), ManualClock::start()),
            "MXN",
        )
    }

    fn request() -> QuoteRequest {
        QuoteRequest {
            username: "Ana".to_string(),
            pickup: Some(GeoPoint::new(19.4326, -99.1332)),
            drop: Some(GeoPoint::new(19.0433, -98.1981)),
            vehicle: VehicleProfile::with_model("Hilux Pickup"),
            requires_maneuver: true,
            ..QuoteRequest::default()
        }
    }

    #[tokio::test]
    async fn test_quote_end_to_end() {
        let routes = Arc::new(FixedRouteProvider::new(
            100.0,
            vec![TollEvent::labeled(80.0, "Caseta San Marcos")],
        ));
        let service = service_with(
            routes.clone(),
            Arc::new(CoordinateGeocoder),
            Arc::new(AcceptingPaymentProcessor),
        );

        let quote = service.quote(request()).await.unwrap();

        assert_eq!(quote.truck_selection.effective(), TruckClassId::B);
        assert_eq!(quote.truck_name, "Tipo B");
        assert_eq!(quote.tolls.total, dec!(80));
        assert_eq!(quote.breakdown.total, dec!(4330));
        assert_eq!(quote.line_items.last().unwrap().amount_text(), "4330.00");
        assert_eq!(quote.estimated_hours, 2);
        assert_eq!(quote.pickup_address, "19.432600, -99.133200");
        assert_eq!(quote.currency, "MXN");
        assert_eq!(quote.notices.len(), 2);
        assert_eq!(routes.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_quote_reuses_cached_route_and_suppresses_notices() {
        let routes = Arc::new(FixedRouteProvider::new(10.0, Vec::new()));
        let service = service_with(
            routes.clone(),
            Arc::new(CoordinateGeocoder),
            Arc::new(AcceptingPaymentProcessor),
        );

        let first = service.quote(request()).await.unwrap();
        let second = service.quote(request()).await.unwrap();

        assert_eq!(routes.calls.load(Ordering::SeqCst), 1);
        assert_eq!(first.breakdown, second.breakdown);
        assert!(!first.notices.is_empty());
        assert!(second.notices.is_empty());
    }

    #[tokio::test]
    async fn test_quote_explicit_class_wins() {
        let service = service_with(
            Arc::new(FixedRouteProvider::new(100.0, Vec::new())),
            Arc::new(CoordinateGeocoder),
            Arc::new(AcceptingPaymentProcessor),
        );

        let quote = service
            .quote(QuoteRequest {
                truck_class: Some(TruckClassId::D),
                ..request()
            })
            .await
            .unwrap();

        assert_eq!(quote.truck_selection.suggested(), Some(TruckClassId::B));
        assert_eq!(quote.breakdown.truck_class, TruckClassId::D);
        assert!(quote.truck_selection.overrides_suggestion());
        assert!(quote
            .notices
            .iter()
            .all(|notice| notice.kind != NoticeKind::TruckSuggested));
    }

    #[tokio::test]
    async fn test_quote_merges_and_dedupes_manual_tolls() {
        let service = service_with(
            Arc::new(FixedRouteProvider::new(
                50.0,
                vec![TollEvent::labeled(80.0, "Caseta")],
            )),
            Arc::new(CoordinateGeocoder),
            Arc::new(AcceptingPaymentProcessor),
        );

        let quote = service
            .quote(QuoteRequest {
                manual_tolls: vec![TollEvent::labeled(80.0, "Caseta"), TollEvent::new(25.5)],
                ..request()
            })
            .await
            .unwrap();

        assert_eq!(quote.tolls.count, 2);
        assert_eq!(quote.tolls.total, dec!(105.5));
    }

    #[tokio::test]
    async fn test_quote_missing_location() {
        let routes = Arc::new(FixedRouteProvider::new(10.0, Vec::new()));
        let service = service_with(
            routes.clone(),
            Arc::new(CoordinateGeocoder),
            Arc::new(AcceptingPaymentProcessor),
        );

        let result = service
            .quote(QuoteRequest {
                drop: None,
                ..request()
            })
            .await;

        assert!(matches!(result, Err(QuoteError::MissingLocation("drop-off"))));
        assert_eq!(routes.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_quote_rejects_invalid_route_distance() {
        let service = service_with(
            Arc::new(FixedRouteProvider::new(-3.0, Vec::new())),
            Arc::new(CoordinateGeocoder),
            Arc::new(AcceptingPaymentProcessor),
        );

        let result = service.quote(request()).await;
        assert!(matches!(
            result,
            Err(QuoteError::Pricing(PricingError::InvalidDistance { .. }))
        ));
    }

    #[tokio::test]
    async fn test_quote_overweight_vehicle() {
        let service = service_with(
            Arc::new(FixedRouteProvider::new(10.0, Vec::new())),
            Arc::new(CoordinateGeocoder),
            Arc::new(AcceptingPaymentProcessor),
        );
        let mut req = request();
        req.vehicle.declared_weight_kg = Some(12000.0);

        assert!(matches!(
            service.quote(req).await,
            Err(QuoteError::Pricing(PricingError::WeightExceedsCapacity { .. }))
        ));
    }

    #[tokio::test]
    async fn test_quote_geocoder_failure_falls_back_to_coordinates() {
        let service = service_with(
            Arc::new(FixedRouteProvider::new(10.0, Vec::new())),
            Arc::new(FailingGeocoder),
            Arc::new(AcceptingPaymentProcessor),
        );

        let quote = service.quote(request()).await.unwrap();
        assert_eq!(quote.drop_address, "19.043300,-98.198100");
    }

    #[tokio::test]
    async fn test_confirm_payment_once() {
        let service = service_with(
            Arc::new(FixedRouteProvider::new(100.0, Vec::new())),
            Arc::new(CoordinateGeocoder),
            Arc::new(AcceptingPaymentProcessor),
        );
        let mut booking = Booking::new(service.quote(request()).await.unwrap());

        let confirmation = service.confirm_payment(&mut booking, None).await.unwrap();
        assert_eq!(
            confirmation.receipt.amount,
            booking.quote.line_items.last().unwrap().amount
        );
        assert!(confirmation.notice.is_some());
        assert!(booking.is_paid());

        let again = service.confirm_payment(&mut booking, None).await;
        assert!(matches!(again, Err(QuoteError::AlreadyPaid(id)) if id == booking.quote.id));
    }

    #[tokio::test]
    async fn test_confirm_payment_declined_keeps_booking_pending() {
        let service = service_with(
            Arc::new(FixedRouteProvider::new(100.0, Vec::new())),
            Arc::new(CoordinateGeocoder),
            Arc::new(DecliningProcessor),
        );
        let mut booking = Booking::new(service.quote(request()).await.unwrap());

        let result = service.confirm_payment(&mut booking, Some("s1")).await;
        match result {
            Err(QuoteError::PaymentFailed {
                source: PortError::PaymentDeclined(_),
                notice: Some(notice),
            }) => {
                assert_eq!(notice.kind, NoticeKind::Payment);
                assert_eq!(notice.title, "Payment Error");
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(!booking.is_paid());

        // Retrying inside the cooldown is still declined but stays quiet
        let retry = service.confirm_payment(&mut booking, Some("s1")).await;
        assert!(matches!(
            retry,
            Err(QuoteError::PaymentFailed { notice: None, .. })
        ));
    }

    #[tokio::test]
    async fn test_payment_charges_rounded_total() {
        let service = service_with(
            Arc::new(FixedRouteProvider::new(0.333, Vec::new())),
            Arc::new(CoordinateGeocoder),
            Arc::new(AcceptingPaymentProcessor),
        );
        let quote = service
            .quote(QuoteRequest {
                truck_class: Some(TruckClassId::C),
                requires_maneuver: false,
                ..request()
            })
            .await
            .unwrap();
        assert!(quote.breakdown.total.scale() > 2);

        let shown = quote.line_items.last().unwrap().amount;
        let confirmation = service.pay(quote.id, None).await.unwrap();
        assert_eq!(confirmation.receipt.amount, shown);
        assert_ne!(confirmation.receipt.amount, quote.breakdown.total);
    }

    #[tokio::test]
    async fn test_pay_by_id_charges_once() {
        let service = service_with(
            Arc::new(FixedRouteProvider::new(100.0, Vec::new())),
            Arc::new(CoordinateGeocoder),
            Arc::new(AcceptingPaymentProcessor),
        );
        let quote = service.quote(request()).await.unwrap();

        assert!(service.pay(quote.id, Some("s1")).await.is_ok());
        assert!(matches!(
            service.pay(quote.id, Some("s1")).await,
            Err(QuoteError::AlreadyPaid(id)) if id == quote.id
        ));
    }

    #[tokio::test]
    async fn test_pay_unknown_quote() {
        let service = service_with(
            Arc::new(FixedRouteProvider::new(100.0, Vec::new())),
            Arc::new(CoordinateGeocoder),
            Arc::new(AcceptingPaymentProcessor),
        );
        let id = Uuid::new_v4();
        assert!(matches!(
            service.pay(id, None).await,
            Err(QuoteError::UnknownQuote(missing)) if missing == id
        ));
    }
}
