//! Pricing API route handlers

use axum::{
    extract::{Path, Query, State},
    http::header,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use uuid::Uuid;

use crate::error::Result;
use crate::AppState;

use super::calculators::{compute_cost, estimated_hours};
use super::catalog;
use super::classifier::{classify as classify_vehicle, classify_text};
use super::document::ServiceRequestDocument;
use super::formatter::{export_line_items, format_breakdown, format_display_breakdown, ExportFormat};
use super::requests::{
    AggregateTollsRequest, CalculateCostRequest, ClassifyRequest, ExportQuery, PayRequest,
    QuoteRequest,
};
use super::responses::{ClassifyResponse, CostResponse, TruckCatalogResponse};
use super::services::{PaymentConfirmation, Quote};
use super::tolls::{aggregate_tolls, TollSummary};

/// Routes under `/api/pricing`
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/pricing/trucks", get(list_trucks))
        .route("/api/pricing/classify", post(classify))
        .route("/api/pricing/tolls/aggregate", post(aggregate))
        .route("/api/pricing/cost", post(calculate_cost))
        .route("/api/pricing/cost/export", post(export_cost))
        .route("/api/pricing/quote", post(create_quote))
        .route("/api/pricing/quote/document", post(quote_document))
        .route("/api/pricing/quote/:id/pay", post(pay_quote))
}

fn attachment(format: ExportFormat, file_name: String, body: String) -> Response {
    (
        [
            (header::CONTENT_TYPE, format.content_type().to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", file_name),
            ),
        ],
        body,
    )
        .into_response()
}

/// Truck catalog
async fn list_trucks(State(state): State<AppState>) -> Json<TruckCatalogResponse> {
    Json(TruckCatalogResponse {
        currency: state.quotes.currency().to_string(),
        trucks: catalog::all().iter().collect(),
    })
}

/// Infer a truck class from text or a vehicle profile
async fn classify(Json(req): Json<ClassifyRequest>) -> Result<Json<ClassifyResponse>> {
    let class = match &req {
        ClassifyRequest::Text(body) => classify_text(&body.text),
        ClassifyRequest::Vehicle(vehicle) => classify_vehicle(vehicle)?,
    };
    let truck = catalog::truck(class);

    Ok(Json(ClassifyResponse {
        truck_class: class,
        name: truck.name,
        max_weight_kg: truck.max_weight_kg,
    }))
}

/// Sum detected tolls
async fn aggregate(Json(req): Json<AggregateTollsRequest>) -> Result<Json<TollSummary>> {
    Ok(Json(aggregate_tolls(&req.events)?))
}

fn cost_response(state: &AppState, req: &CalculateCostRequest) -> Result<CostResponse> {
    let breakdown = compute_cost(
        req.distance_km,
        &req.truck_class,
        req.requires_maneuver,
        req.toll_total,
        req.requires_invoice,
    )?;

    Ok(CostResponse {
        currency: state.quotes.currency().to_string(),
        line_items: format_breakdown(&breakdown),
        display_line_items: format_display_breakdown(&breakdown.display),
        estimated_hours: estimated_hours(breakdown.distance_km),
        breakdown,
    })
}

/// Itemized cost for a known distance
async fn calculate_cost(
    State(state): State<AppState>,
    Json(req): Json<CalculateCostRequest>,
) -> Result<Json<CostResponse>> {
    Ok(Json(cost_response(&state, &req)?))
}

/// Itemized cost as a CSV or text file
async fn export_cost(
    State(state): State<AppState>,
    Query(query): Query<ExportQuery>,
    Json(req): Json<CalculateCostRequest>,
) -> Result<Response> {
    let cost = cost_response(&state, &req)?;
    let body = export_line_items(&cost.line_items, query.format);
    let file_name = format!("quote-{}.{}", Utc::now().timestamp_millis(), query.format);
    Ok(attachment(query.format, file_name, body))
}

/// Full quote between two points
async fn create_quote(
    State(state): State<AppState>,
    Json(req): Json<QuoteRequest>,
) -> Result<Json<Quote>> {
    Ok(Json(state.quotes.quote(req).await?))
}

/// Charge the total of an issued quote
async fn pay_quote(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<PayRequest>,
) -> Result<Json<PaymentConfirmation>> {
    Ok(Json(state.quotes.pay(id, req.session_id.as_deref()).await?))
}

/// Service request sheet for a fresh quote
async fn quote_document(
    State(state): State<AppState>,
    Query(query): Query<ExportQuery>,
    Json(req): Json<QuoteRequest>,
) -> Result<Response> {
    let quote = state.quotes.quote(req).await?;
    let document = ServiceRequestDocument::from_quote(&quote, Utc::now());
    Ok(attachment(
        query.format,
        document.file_name(query.format),
        document.render(query.format),
    ))
}
