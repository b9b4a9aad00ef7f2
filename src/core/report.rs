//! Display-ready view of an allocation result.

use crate::core::allocation::{AllocationResult, Category, PurchaseLine};
use serde::Serialize;

/// Rounds to 2 decimal places. Exact halves go to the even cent, so 10.125
/// becomes 10.12 and 0.375 becomes 0.38.
pub fn round_cents(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportLine {
    #[serde(rename = "Category")]
    pub category: &'static str,
    #[serde(rename = "Sector")]
    pub sector: String,
    #[serde(rename = "Symbol")]
    pub symbol: String,
    #[serde(rename = "Price")]
    pub price: f64,
    #[serde(rename = "Quantity")]
    pub quantity: u64,
    #[serde(rename = "Remaining Budget")]
    pub remaining_budget: f64,
}

impl From<&PurchaseLine> for ReportLine {
    fn from(line: &PurchaseLine) -> Self {
        ReportLine {
            category: line.category.label(),
            sector: line.sector.clone(),
            symbol: line.symbol.clone(),
            price: round_cents(line.price),
            quantity: line.quantity,
            remaining_budget: round_cents(line.remaining_budget),
        }
    }
}

/// Rounded copy of an [`AllocationResult`]. Totals are computed from the
/// unrounded prices before rounding.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AllocationReport {
    pub lines: Vec<ReportLine>,
    pub total_spent: f64,
    pub remaining_budget: f64,
}

impl AllocationReport {
    pub fn spent_in(result: &AllocationResult, category: Category) -> f64 {
        round_cents(
            result
                .lines
                .iter()
                .filter(|l| l.category == category)
                .map(PurchaseLine::cost)
                .sum(),
        )
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.lines)
    }
}

impl From<&AllocationResult> for AllocationReport {
    fn from(result: &AllocationResult) -> Self {
        AllocationReport {
            lines: result.lines.iter().map(ReportLine::from).collect(),
            total_spent: round_cents(result.total_spent()),
            remaining_budget: round_cents(result.remaining_budget),
        }
    }
}
