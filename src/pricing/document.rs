//! Downloadable service request sheet.
//!
//! One row per line; CSV output is prefixed with a BOM and quotes rows that
//! contain delimiters. The cost section reuses the quote's line items so the
//! sheet always agrees with the on-screen breakdown.

use chrono::{DateTime, Utc};

use super::formatter::{csv_escape, ExportFormat, CSV_BOM};
use super::models::GeoPoint;
use super::services::Quote;

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "Yes"
    } else {
        "No"
    }
}

fn coordinates(point: &GeoPoint) -> String {
    format!("Coordinates: {:.6}, {:.6}", point.lat, point.lng)
}

/// Rendered rows of a service request sheet
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceRequestDocument {
    rows: Vec<String>,
    generated_at: DateTime<Utc>,
}

impl ServiceRequestDocument {
    pub fn from_quote(quote: &Quote, generated_at: DateTime<Utc>) -> Self {
        let vehicle = &quote.vehicle;
        let year = vehicle.year.map(|y| y.to_string()).unwrap_or_default();

        let mut rows = vec![
            "SERVICE REQUEST INFORMATION".to_string(),
            format!("Generated on: {}", generated_at.format("%Y-%m-%d %H:%M:%S UTC")),
            format!("Quote ID: {}", quote.id),
            String::new(),
            "USER INFORMATION".to_string(),
            format!("Name: {}", quote.requester),
            String::new(),
            "LOCATION DETAILS".to_string(),
            "Pickup Location".to_string(),
            format!("Complete Address: {}", quote.pickup_address),
            coordinates(&quote.pickup),
            String::new(),
            "Drop-off Location".to_string(),
            format!("Complete Address: {}", quote.drop_address),
            coordinates(&quote.drop),
            String::new(),
            "VEHICLE DETAILS".to_string(),
            format!("Make: {}", vehicle.make),
            format!("Model: {}", vehicle.model),
            format!("Year: {}", year),
            format!("Color: {}", vehicle.color),
            String::new(),
            "SERVICE DETAILS".to_string(),
            format!("Service Type: {}", quote.service_type.as_str()),
            format!(
                "Tow Truck Type: {} ({})",
                quote.breakdown.truck_class, quote.truck_name
            ),
            format!(
                "Requires Special Maneuver: {}",
                yes_no(quote.breakdown.requires_maneuver)
            ),
            format!("Requires Invoice: {}", yes_no(quote.breakdown.requires_invoice)),
            format!("Issue Description: {}", quote.issue_description),
            String::new(),
            "COST DETAILS".to_string(),
        ];

        rows.extend(
            quote
                .line_items
                .iter()
                .map(|item| format!("{}: {}", item.label, item.amount_text())),
        );
        rows.push(format!("Currency: {}", quote.currency));
        rows.push(format!("Estimated Time: {} hr", quote.estimated_hours));

        Self { rows, generated_at }
    }

    pub fn rows(&self) -> &[String] {
        &self.rows
    }

    pub fn render(&self, format: ExportFormat) -> String {
        match format {
            ExportFormat::Csv => {
                let body: Vec<String> = self.rows.iter().map(|row| csv_escape(row)).collect();
                format!("{}{}", CSV_BOM, body.join("\n"))
            }
            ExportFormat::Txt => self.rows.join("\n"),
        }
    }

    /// `service-request-<unix millis>.<ext>`
    pub fn file_name(&self, format: ExportFormat) -> String {
        format!(
            "service-request-{}.{}",
            self.generated_at.timestamp_millis(),
            format.extension()
        )
    }
}
