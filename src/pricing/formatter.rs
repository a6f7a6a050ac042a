//! Ordered, rounded line items for display and flat-file export.
//!
//! The order is fixed: distance, base service, maneuver, tolls, tax, total.
//! Maneuver, tolls and tax only appear when non-zero. CSV and plain-text exports
//! carry the same rows in the same order and differ only in delimiter and escaping.

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::calculators::{round_money, CostBreakdown, DisplayBreakdown};

pub const LABEL_DISTANCE: &str = "Distance (km)";
pub const LABEL_BASE_SERVICE: &str = "Base service cost";
pub const LABEL_MANEUVER: &str = "Maneuver charge";
pub const LABEL_TOLLS: &str = "Toll charges";
pub const LABEL_TAX: &str = "Tax (IVA 16%)";
pub const LABEL_TOTAL: &str = "Total";

pub const LABEL_CORE_SERVICE: &str = "Core service";
pub const LABEL_SERVICE_FEE: &str = "Service fee (10%)";

/// UTF-8 byte order mark, so spreadsheet tools detect the encoding.
pub const CSV_BOM: &str = "\u{feff}";

/// One labelled amount, already rounded to cents.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineItem {
    pub label: &'static str,
    #[serde(with = "rust_decimal::serde::str")]
    pub amount: Decimal,
}

impl LineItem {
    fn rounded(label: &'static str, amount: Decimal) -> Self {
        Self {
            label,
            amount: round_money(amount, 2),
        }
    }

    /// Amount with exactly two decimals.
    pub fn amount_text(&self) -> String {
        money_text(self.amount)
    }
}

/// Two-decimal rendering of an amount, rounding ties away from zero.
pub fn money_text(amount: Decimal) -> String {
    let mut rounded = round_money(amount, 2);
    rounded.rescale(2);
    rounded.to_string()
}

/// Line items for the primary breakdown.
pub fn format_breakdown(breakdown: &CostBreakdown) -> Vec<LineItem> {
    let mut items = vec![
        LineItem::rounded(LABEL_DISTANCE, breakdown.distance_km),
        LineItem::rounded(LABEL_BASE_SERVICE, breakdown.base_service_cost),
    ];

    let optional = [
        (LABEL_MANEUVER, breakdown.maneuver_cost),
        (LABEL_TOLLS, breakdown.toll_total),
        (LABEL_TAX, breakdown.tax),
    ];
    items.extend(
        optional
            .into_iter()
            .filter(|(_, amount)| *amount > Decimal::ZERO)
            .map(|(label, amount)| LineItem::rounded(label, amount)),
    );

    items.push(LineItem::rounded(LABEL_TOTAL, breakdown.total));
    items
}

/// Line items for the informational display decomposition.
pub fn format_display_breakdown(display: &DisplayBreakdown) -> Vec<LineItem> {
    let mut items = vec![
        LineItem::rounded(LABEL_CORE_SERVICE, display.core_service),
        LineItem::rounded(LABEL_SERVICE_FEE, display.service_fee),
        LineItem::rounded(LABEL_TAX, display.tax),
    ];
    if display.toll_total > Decimal::ZERO {
        items.push(LineItem::rounded(LABEL_TOLLS, display.toll_total));
    }
    items.push(LineItem::rounded(LABEL_TOTAL, display.total));
    items
}

/// Flat-file export variant. Parsed case-insensitively; `text` is accepted for `txt`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum ExportFormat {
    #[default]
    Csv,
    Txt,
}

impl ExportFormat {
    pub fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "text/csv; charset=utf-8",
            ExportFormat::Txt => "text/plain; charset=utf-8",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Txt => "txt",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl TryFrom<String> for ExportFormat {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "txt" | "text" => Ok(ExportFormat::Txt),
            other => Err(format!("Unsupported export format: {}", other)),
        }
    }
}

/// Quote a CSV field when it contains a delimiter, quote or line break.
pub fn csv_escape(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Render line items as `label,amount` rows or `label: amount` lines.
pub fn export_line_items(items: &[LineItem], format: ExportFormat) -> String {
    let rows: Vec<String> = items
        .iter()
        .map(|item| match format {
            ExportFormat::Csv => format!("{},{}", csv_escape(item.label), item.amount_text()),
            ExportFormat::Txt => format!("{}: {}", item.label, item.amount_text()),
        })
        .collect();
    rows.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pricing::calculators::{compute_cost, price_tow};
    use crate::pricing::catalog::{self, TruckClassId};
    use rust_decimal_macros::dec;

    fn labels(items: &[LineItem]) -> Vec<&'static str> {
        items.iter().map(|item| item.label).collect()
    }

    #[test]
    fn test_format_full_breakdown_order() {
        let cost = compute_cost(100.0, "B", true, dec!(80), true).unwrap();
        let items = format_breakdown(&cost);

        assert_eq!(
            labels(&items),
            vec![
                LABEL_DISTANCE,
                LABEL_BASE_SERVICE,
                LABEL_MANEUVER,
                LABEL_TOLLS,
                LABEL_TAX,
                LABEL_TOTAL
            ]
        );
        assert_eq!(items[4].amount, dec!(692.80));
        assert_eq!(items[5].amount_text(), "5022.80");
    }

    #[test]
    fn test_format_omits_zero_lines() {
        let cost = compute_cost(10.0, "A", false, Decimal::ZERO, false).unwrap();
        let items = format_breakdown(&cost);

        assert_eq!(
            labels(&items),
            vec![LABEL_DISTANCE, LABEL_BASE_SERVICE, LABEL_TOTAL]
        );
        assert_eq!(items[2].amount_text(), "250.00");
    }

    #[test]
    fn test_format_rounds_half_away_from_zero() {
        // 0.333 km * 45 = 14.985
        let truck = catalog::truck(TruckClassId::C);
        let cost = price_tow(dec!(0.333), truck, false, Decimal::ZERO, false).unwrap();
        let items = format_breakdown(&cost);

        assert_eq!(items[0].amount_text(), "0.33");
        assert_eq!(items[1].amount, dec!(14.99));
        // Engine keeps full precision
        assert_eq!(cost.base_service_cost, dec!(14.985));
    }

    #[test]
    fn test_format_display_breakdown() {
        let cost = compute_cost(100.0, "B", true, dec!(80), false).unwrap();
        let items = format_display_breakdown(&cost.display);

        assert_eq!(
            labels(&items),
            vec![
                LABEL_CORE_SERVICE,
                LABEL_SERVICE_FEE,
                LABEL_TAX,
                LABEL_TOLLS,
                LABEL_TOTAL
            ]
        );
        assert_eq!(items[0].amount_text(), "3145.00");
        assert_eq!(items[4].amount_text(), "4330.00");
    }

    #[test]
    fn test_export_variants_share_content() {
        let cost = compute_cost(100.0, "B", true, dec!(80), false).unwrap();
        let items = format_breakdown(&cost);

        let csv = export_line_items(&items, ExportFormat::Csv);
        let txt = export_line_items(&items, ExportFormat::Txt);

        assert_eq!(
            csv,
            "Distance (km),100.00\nBase service cost,3500.00\nManeuver charge,750.00\nToll charges,80.00\nTotal,4330.00"
        );
        assert_eq!(
            txt,
            "Distance (km): 100.00\nBase service cost: 3500.00\nManeuver charge: 750.00\nToll charges: 80.00\nTotal: 4330.00"
        );
    }

    #[test]
    fn test_csv_escape() {
        assert_eq!(csv_escape("plain"), "plain");
        assert_eq!(csv_escape("a,b"), "\"a,b\"");
        assert_eq!(csv_escape("say \"hi\""), "\"say \"\"hi\"\"\"");
    }

    #[test]
    fn test_export_format_parse() {
        assert_eq!("CSV".parse::<ExportFormat>(), Ok(ExportFormat::Csv));
        assert_eq!("txt".parse::<ExportFormat>(), Ok(ExportFormat::Txt));
        assert!("pdf".parse::<ExportFormat>().is_err());
    }

    #[test]
    fn test_export_format_deserialize() {
        let format: ExportFormat = serde_json::from_str(r#""TXT""#).unwrap();
        assert_eq!(format, ExportFormat::Txt);
        let format: ExportFormat = serde_json::from_str(r#""text""#).unwrap();
        assert_eq!(format, ExportFormat::Txt);
        assert!(serde_json::from_str::<ExportFormat>(r#""pdf""#).is_err());
        assert_eq!(serde_json::to_string(&ExportFormat::Csv).unwrap(), r#""csv""#);
    }
}
